//! UDP server configuration derived from settings.

use std::collections::HashSet;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use vrtrack_core::StartupError;
use vrtrack_runtime::ConnectionOptions;
use vrtrack_settings::VrtrackSettings;

/// Resolved UDP server configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UdpServerConfig {
    /// Socket address to bind.
    pub bind: SocketAddr,
    /// Receive buffer size; longer datagrams are truncated by the OS.
    pub max_datagram_size: usize,
    /// Peers whose datagrams are dropped unread.
    pub ignored: HashSet<IpAddr>,
    /// Options for every connection actor.
    pub connection: ConnectionOptions,
}

impl UdpServerConfig {
    /// Resolve from loaded settings.
    pub fn from_settings(settings: &VrtrackSettings) -> Result<Self, StartupError> {
        let host: IpAddr = settings
            .server
            .host
            .parse()
            .map_err(|_| invalid("server.host", &settings.server.host))?;
        let ignored = settings
            .server
            .ignored_addresses
            .iter()
            .map(|raw| raw.parse().map_err(|_| invalid("server.ignoredAddresses", raw)))
            .collect::<Result<HashSet<IpAddr>, _>>()?;

        Ok(Self {
            bind: SocketAddr::new(host, settings.server.udp_port),
            max_datagram_size: settings.server.max_datagram_size,
            ignored,
            connection: ConnectionOptions {
                inbox_capacity: settings.runtime.connection_inbox_capacity,
                action_capacity: settings.runtime.action_queue_capacity,
                reconnect_idle: Duration::from_millis(settings.runtime.reconnect_idle_ms),
                heartbeat_interval: Some(Duration::from_millis(
                    settings.runtime.heartbeat_interval_ms,
                )),
            },
        })
    }

    /// Whether datagrams from `address` are processed at all.
    pub fn accepts(&self, address: IpAddr) -> bool {
        let broadcast = match address {
            IpAddr::V4(v4) => v4.is_broadcast(),
            IpAddr::V6(_) => false,
        };
        !broadcast && !address.is_unspecified() && !self.ignored.contains(&address)
    }
}

fn invalid(key: &str, value: &str) -> StartupError {
    StartupError::InvalidSetting {
        key: key.to_owned(),
        message: format!("`{value}` is not an IP address"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn defaults_resolve() {
        let config = UdpServerConfig::from_settings(&VrtrackSettings::default()).unwrap();
        assert_eq!(config.bind, "0.0.0.0:6969".parse().unwrap());
        assert_eq!(config.max_datagram_size, 2048);
        assert_eq!(config.connection, ConnectionOptions::default());
    }

    #[test]
    fn bad_host_is_a_startup_error() {
        let mut settings = VrtrackSettings::default();
        settings.server.host = "not-an-ip".into();
        assert_matches!(
            UdpServerConfig::from_settings(&settings),
            Err(StartupError::InvalidSetting { key, .. }) if key == "server.host"
        );
    }

    #[test]
    fn filtering() {
        let mut settings = VrtrackSettings::default();
        settings.server.ignored_addresses = vec!["10.0.0.9".into()];
        let config = UdpServerConfig::from_settings(&settings).unwrap();

        assert!(config.accepts("10.0.0.8".parse().unwrap()));
        assert!(!config.accepts("10.0.0.9".parse().unwrap()));
        assert!(!config.accepts("255.255.255.255".parse().unwrap()));
        assert!(!config.accepts("0.0.0.0".parse().unwrap()));
        assert!(!config.accepts("::".parse().unwrap()));
    }
}
