//! # vrtrack
//!
//! Tracker server binary: loads settings, restores tracker configuration,
//! binds the UDP tracker socket and runs until interrupted.

#![deny(unsafe_code)]

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use vrtrack_runtime::{ConfigContext, FileConfigStore, Registry};
use vrtrack_server::datafeed::FeedHub;
use vrtrack_server::local_transport::enabled_transports;
use vrtrack_server::{ShutdownCoordinator, UdpServerConfig, UdpTrackerServer};
use vrtrack_settings::VrtrackSettings;

/// Motion tracker aggregation server.
#[derive(Parser, Debug)]
#[command(name = "vrtrack", about = "Motion tracker aggregation server")]
struct Cli {
    /// Settings file (defaults to `~/.vrtrack/settings.json`).
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Host to bind the UDP socket on.
    #[arg(long)]
    host: Option<String>,

    /// UDP port for tracker firmware.
    #[arg(long)]
    port: Option<u16>,

    /// Log level filter (`RUST_LOG` still wins).
    #[arg(long)]
    log_level: Option<String>,
}

impl Cli {
    fn load_settings(&self) -> Result<VrtrackSettings> {
        let path = self
            .settings
            .clone()
            .unwrap_or_else(vrtrack_settings::settings_path);
        let mut settings = vrtrack_settings::load_settings_from_path(&path)
            .with_context(|| format!("Failed to load settings from {}", path.display()))?;
        self.apply(&mut settings);
        settings.validate().context("Invalid settings")?;
        Ok(settings)
    }

    fn apply(&self, settings: &mut VrtrackSettings) {
        if let Some(host) = &self.host {
            settings.server.host.clone_from(host);
        }
        if let Some(port) = self.port {
            settings.server.udp_port = port;
        }
        if let Some(level) = &self.log_level {
            settings.logging.level.clone_from(level);
        }
    }
}

/// Everything started by [`start`].
struct Running {
    registry: Registry,
    shutdown: ShutdownCoordinator,
    feeds: FeedHub,
    udp_addr: SocketAddr,
}

async fn start(settings: &VrtrackSettings) -> Result<Running> {
    for (transport, path) in enabled_transports(&settings.inputs)? {
        tracing::info!(transport = transport.name(), path = %path.display(), "local transport enabled");
    }

    let store = Arc::new(FileConfigStore::new(settings.store.config_path()));
    let config = ConfigContext::load(
        store,
        Duration::from_millis(settings.runtime.config_debounce_ms),
        settings.runtime.action_queue_capacity,
    )
    .await
    .context("Failed to load tracker configuration")?;
    let registry = Registry::new(config, settings.runtime.action_queue_capacity);

    let udp_config = UdpServerConfig::from_settings(settings)?;
    let server = UdpTrackerServer::bind(udp_config, registry.clone())
        .await
        .context("Failed to bind UDP socket")?;
    let udp_addr = server
        .local_addr()
        .context("Failed to read bound UDP address")?;

    let shutdown = ShutdownCoordinator::new();
    shutdown.track(tokio::spawn(server.run(shutdown.token())));
    let feeds = FeedHub::new(
        registry.clone(),
        settings.runtime.feed_queue_capacity,
        shutdown.token(),
    );

    Ok(Running {
        registry,
        shutdown,
        feeds,
        udp_addr,
    })
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = cli.load_settings()?;
    vrtrack_core::logging::init_subscriber(&settings.logging.level);

    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to build tokio runtime")?
        .block_on(run(settings))
}

async fn run(settings: VrtrackSettings) -> Result<()> {
    let running = start(&settings).await?;
    tracing::info!(address = %running.udp_addr, "vrtrack listening for trackers");

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for ctrl-c")?;

    tracing::info!(feed_sessions = running.feeds.session_count().await, "Shutting down...");
    running
        .shutdown
        .graceful_shutdown(&running.registry, None)
        .await;
    tracing::info!("Shutdown complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_settings(dir: &std::path::Path) -> VrtrackSettings {
        let mut settings = VrtrackSettings::default();
        settings.server.host = "127.0.0.1".into();
        settings.server.udp_port = 0;
        settings.store.dir = dir.to_path_buf();
        settings
    }

    #[test]
    fn cli_defaults_leave_settings_alone() {
        let cli = Cli::parse_from(["vrtrack"]);
        let mut settings = VrtrackSettings::default();
        cli.apply(&mut settings);
        assert_eq!(settings, VrtrackSettings::default());
        assert!(cli.settings.is_none());
    }

    #[test]
    fn cli_flags_override_settings() {
        let cli = Cli::parse_from([
            "vrtrack",
            "--host",
            "127.0.0.1",
            "--port",
            "7000",
            "--log-level",
            "debug",
        ]);
        let mut settings = VrtrackSettings::default();
        cli.apply(&mut settings);
        assert_eq!(settings.server.host, "127.0.0.1");
        assert_eq!(settings.server.udp_port, 7000);
        assert_eq!(settings.logging.level, "debug");
    }

    #[test]
    fn settings_file_is_read_from_flag() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"server":{"udpPort":7100}}"#).unwrap();
        let cli = Cli::parse_from(["vrtrack", "--settings", path.to_str().unwrap()]);
        let settings = cli.load_settings().unwrap();
        assert_eq!(settings.server.udp_port, 7100);
    }

    #[tokio::test]
    async fn starts_and_shuts_down() {
        let dir = tempfile::tempdir().unwrap();
        let running = start(&test_settings(dir.path())).await.unwrap();
        assert!(running.udp_addr.port() > 0);
        assert_eq!(running.feeds.session_count().await, 0);

        running
            .shutdown
            .graceful_shutdown(&running.registry, Some(Duration::from_secs(1)))
            .await;
        assert!(running.shutdown.is_shutting_down());
        assert!(running.registry.is_destroyed());
    }

    #[cfg(not(windows))]
    #[tokio::test]
    async fn pipe_inputs_fail_fast_off_windows() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = test_settings(dir.path());
        settings.inputs.driver_pipe = true;
        assert!(start(&settings).await.is_err());
    }
}
