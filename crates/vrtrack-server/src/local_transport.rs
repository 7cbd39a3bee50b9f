//! Local pipe transports for the driver and feeder processes.
//!
//! Only the path resolution and the platform check live here; both pipes
//! are Windows named pipes, so enabling either elsewhere fails at startup.

use std::path::PathBuf;

use vrtrack_core::StartupError;
use vrtrack_settings::InputSettings;

/// A local pipe input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LocalTransport {
    /// Pipe from the VR driver.
    Driver,
    /// Pipe from the feeder application.
    Feeder,
}

impl LocalTransport {
    /// Name used in logs and errors.
    pub fn name(self) -> &'static str {
        match self {
            Self::Driver => "driver",
            Self::Feeder => "feeder",
        }
    }

    fn pipe_name(self) -> &'static str {
        match self {
            Self::Driver => "vrtrack-driver",
            Self::Feeder => "vrtrack-feeder",
        }
    }
}

/// Pipe path for `transport` on this host.
pub fn pipe_path(transport: LocalTransport) -> Result<PathBuf, StartupError> {
    pipe_path_for(transport, std::env::consts::OS)
}

fn pipe_path_for(transport: LocalTransport, os: &str) -> Result<PathBuf, StartupError> {
    if os == "windows" {
        Ok(PathBuf::from(format!(r"\\.\pipe\{}", transport.pipe_name())))
    } else {
        Err(StartupError::UnsupportedPlatform {
            transport: transport.name().to_owned(),
            platform: os.to_owned(),
        })
    }
}

/// Resolve every enabled input, failing on the first unsupported one.
pub fn enabled_transports(inputs: &InputSettings) -> Result<Vec<(LocalTransport, PathBuf)>, StartupError> {
    [
        (LocalTransport::Driver, inputs.driver_pipe),
        (LocalTransport::Feeder, inputs.feeder_pipe),
    ]
    .into_iter()
    .filter(|(_, enabled)| *enabled)
    .map(|(transport, _)| pipe_path(transport).map(|path| (transport, path)))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn windows_paths() {
        assert_eq!(
            pipe_path_for(LocalTransport::Driver, "windows").unwrap(),
            PathBuf::from(r"\\.\pipe\vrtrack-driver")
        );
    }

    #[test]
    fn other_platforms_fail_fast() {
        let err = pipe_path_for(LocalTransport::Feeder, "linux").unwrap_err();
        assert_matches!(
            &err,
            StartupError::UnsupportedPlatform { transport, platform }
                if transport == "feeder" && platform == "linux"
        );
        assert_eq!(err.severity(), vrtrack_core::Severity::Fatal);
    }

    #[test]
    fn disabled_inputs_need_no_pipe() {
        let inputs = InputSettings {
            driver_pipe: false,
            feeder_pipe: false,
        };
        assert!(enabled_transports(&inputs).unwrap().is_empty());
    }

    #[cfg(not(windows))]
    #[test]
    fn enabled_input_fails_off_windows() {
        let inputs = InputSettings {
            driver_pipe: true,
            feeder_pipe: false,
        };
        assert_matches!(
            enabled_transports(&inputs),
            Err(StartupError::UnsupportedPlatform { .. })
        );
    }
}
