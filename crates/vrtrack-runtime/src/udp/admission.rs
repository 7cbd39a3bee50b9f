//! Sequence-number admission.

use std::time::Duration;

use tokio::time::Instant;

use super::state::UdpConnectionState;

/// What to do with an inbound packet.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Admission {
    /// In order; process it.
    Accept,
    /// The peer restarted after going quiet; reset the baseline, then process.
    Reconnect,
    /// Older than the last accepted packet; drop it.
    Reject {
        /// Last accepted sequence number.
        last: i64,
    },
}

/// Decide whether packet `number`, received at `now`, is admitted.
///
/// A packet numbered 0 after more than `reconnect_idle` of silence is a
/// reconnect. Otherwise anything lower than the last accepted number is
/// rejected; equal numbers pass.
pub fn admit(
    state: &UdpConnectionState,
    number: i64,
    now: Instant,
    reconnect_idle: Duration,
) -> Admission {
    let idle = now.saturating_duration_since(state.last_packet);
    if idle > reconnect_idle && number == 0 {
        Admission::Reconnect
    } else if number < state.last_packet_num {
        Admission::Reject {
            last: state.last_packet_num,
        }
    } else {
        Admission::Accept
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const IDLE: Duration = Duration::from_millis(5000);

    fn state_at(last: i64, at: Instant) -> UdpConnectionState {
        let mut s = UdpConnectionState::new("10.0.0.2:6969".parse().unwrap(), at);
        s.last_packet_num = last;
        s
    }

    #[test]
    fn first_packet_zero_is_accepted() {
        let t0 = Instant::now();
        assert_eq!(admit(&state_at(-1, t0), 0, t0, IDLE), Admission::Accept);
    }

    #[test]
    fn lower_number_is_rejected() {
        let t0 = Instant::now();
        assert_eq!(
            admit(&state_at(6, t0), 4, t0, IDLE),
            Admission::Reject { last: 6 }
        );
    }

    #[test]
    fn reconnect_needs_idle_and_zero() {
        let t0 = Instant::now();
        let s = state_at(50, t0);
        assert_eq!(admit(&s, 0, t0 + Duration::from_millis(5001), IDLE), Admission::Reconnect);
        assert_eq!(
            admit(&s, 0, t0 + Duration::from_millis(5000), IDLE),
            Admission::Reject { last: 50 }
        );
        assert_eq!(
            admit(&s, 1, t0 + Duration::from_millis(9000), IDLE),
            Admission::Reject { last: 50 }
        );
    }

    proptest! {
        #[test]
        fn without_idle_admission_is_monotonic(last in -1_i64..1000, number in 0_i64..1000) {
            let t0 = Instant::now();
            let verdict = admit(&state_at(last, t0), number, t0, IDLE);
            if number >= last {
                prop_assert_eq!(verdict, Admission::Accept);
            } else {
                prop_assert_eq!(verdict, Admission::Reject { last });
            }
        }
    }
}
