// # zonesync - DNS challenge round-trip
//
// A thin integration layer over zonesync-core. It runs the flow an ACME
// client performs for a DNS-01 challenge:
//
// 1. Append a `_zonesync-challenge` TXT record
// 2. Wait (interruptible with SIGINT/SIGTERM)
// 3. List the zone
// 4. Delete the appended record
// 5. List the zone again
//
// All DNS logic lives in zonesync-core; this binary only wires it up.
//
// ## Configuration
//
// All configuration is done via environment variables:
//
// - `ZONESYNC_CONFIG`: Path to a JSON configuration file (optional)
// - `ZONESYNC_PROJECT`: GleSYS project name (if no config file)
// - `ZONESYNC_API_KEY`: GleSYS API key (if no config file)
// - `ZONESYNC_BASE_URL`: API base URL (optional)
// - `ZONESYNC_ZONE`: Zone to operate on (overrides the config file)
// - `ZONESYNC_WAIT_SECS`: Seconds to wait before deleting (default: 60)
// - `ZONESYNC_LOG_LEVEL`: trace, debug, info, warn, error (default: info)
//
// ## Example
//
// ```bash
// export ZONESYNC_PROJECT=cl12345
// export ZONESYNC_API_KEY=your_key
// export ZONESYNC_ZONE=example.com
//
// zonesync
// ```

use anyhow::{Context, Result};
use std::env;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;
use zonesync_core::{
    DesiredRecord, ProviderConfig, ReconcileObserver, SyncEngine, TracingObserver,
    TransportRegistry, ZoneRecord, ZoneSyncConfig,
};

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

const CHALLENGE_NAME: &str = "_zonesync-challenge";
const CHALLENGE_VALUE: &str = "Zgu7tw287LB-LpXyTHYLeROag9-4CLHnM77zvTEvH6o";
const CHALLENGE_TTL: Duration = Duration::from_secs(300);

/// Exit codes for different termination scenarios
///
/// - 0: Flow completed
/// - 1: Configuration or startup error
/// - 2: Runtime error (provider call failed)
#[derive(Debug, Clone, Copy)]
enum ZonesyncExitCode {
    Success = 0,
    ConfigError = 1,
    RuntimeError = 2,
}

impl From<ZonesyncExitCode> for ExitCode {
    fn from(code: ZonesyncExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Application configuration
#[derive(Debug)]
struct Config {
    config_file: Option<String>,
    project: Option<String>,
    api_key: Option<String>,
    base_url: Option<String>,
    zone: Option<String>,
    wait_secs: u64,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        let wait_secs = match env::var("ZONESYNC_WAIT_SECS") {
            Ok(s) => s
                .trim()
                .parse()
                .with_context(|| format!("ZONESYNC_WAIT_SECS must be a number. Got: {}", s))?,
            Err(_) => 60,
        };

        Ok(Self {
            config_file: env::var("ZONESYNC_CONFIG").ok(),
            project: env::var("ZONESYNC_PROJECT").ok(),
            api_key: env::var("ZONESYNC_API_KEY").ok(),
            base_url: env::var("ZONESYNC_BASE_URL").ok(),
            zone: env::var("ZONESYNC_ZONE").ok(),
            wait_secs,
            log_level: env::var("ZONESYNC_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// Validate the environment-level settings
    fn validate(&self) -> Result<()> {
        if self.config_file.is_none() {
            if self.project.as_ref().is_none_or(|p| p.is_empty()) {
                anyhow::bail!(
                    "ZONESYNC_PROJECT is required without ZONESYNC_CONFIG. \
                    Set it via: export ZONESYNC_PROJECT=cl12345"
                );
            }
            if self.api_key.as_ref().is_none_or(|k| k.is_empty()) {
                anyhow::bail!(
                    "ZONESYNC_API_KEY is required without ZONESYNC_CONFIG. \
                    Set it via: export ZONESYNC_API_KEY=your_key"
                );
            }
        }

        if self.wait_secs > 3600 {
            anyhow::bail!(
                "ZONESYNC_WAIT_SECS must be at most 3600 seconds. Got: {}",
                self.wait_secs
            );
        }

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "ZONESYNC_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }

        Ok(())
    }

    /// Build the library configuration
    ///
    /// A config file is loaded first; environment variables override it.
    fn to_zonesync_config(&self) -> Result<ZoneSyncConfig> {
        let mut config = match &self.config_file {
            Some(path) => ZoneSyncConfig::from_file(path)
                .with_context(|| format!("Failed to load ZONESYNC_CONFIG {}", path))?,
            None => {
                let mut provider = ProviderConfig::glesys(
                    self.project.clone().unwrap_or_default(),
                    self.api_key.clone().unwrap_or_default(),
                );
                if let (ProviderConfig::Glesys { base_url, .. }, Some(url)) =
                    (&mut provider, &self.base_url)
                {
                    *base_url = url.clone();
                }
                ZoneSyncConfig::new(provider)
            }
        };

        if self.zone.is_some() {
            config.zone = self.zone.clone();
        }
        if config.zone.is_none() {
            anyhow::bail!(
                "ZONESYNC_ZONE is required. Set it via: export ZONESYNC_ZONE=example.com"
            );
        }

        config.validate()?;
        Ok(config)
    }

    fn log_level(&self) -> Level {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        }
    }
}

fn main() -> ExitCode {
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return ZonesyncExitCode::ConfigError.into();
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {:#}", e);
        return ZonesyncExitCode::ConfigError.into();
    }

    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.log_level())
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return ZonesyncExitCode::ConfigError.into();
    }

    let zonesync_config = match config.to_zonesync_config() {
        Ok(c) => c,
        Err(e) => {
            error!("Configuration error: {:#}", e);
            return ZonesyncExitCode::ConfigError.into();
        }
    };

    let registry = TransportRegistry::new();

    #[cfg(feature = "glesys")]
    {
        info!("Registering GleSYS transport");
        zonesync_provider_glesys::register(&registry);
    }

    let (engine, mut events) = match SyncEngine::from_config(&zonesync_config, &registry) {
        Ok(built) => built,
        Err(e) => {
            error!("Failed to create engine: {}", e);
            return ZonesyncExitCode::ConfigError.into();
        }
    };

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return ZonesyncExitCode::RuntimeError.into();
        }
    };

    let zone = zonesync_config.zone.unwrap_or_default();
    let wait = Duration::from_secs(config.wait_secs);

    rt.block_on(async move {
        let forwarder = tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                TracingObserver.on_event(&event);
            }
        });

        let code = match run_challenge(&engine, &zone, wait).await {
            Ok(()) => ZonesyncExitCode::Success,
            Err(e) => {
                error!("Challenge flow failed: {:#}", e);
                ZonesyncExitCode::RuntimeError
            }
        };

        // Closing the channel lets the forwarder drain and stop
        drop(engine);
        if let Err(e) = forwarder.await {
            warn!("Event forwarder stopped abnormally: {}", e);
        }
        code
    })
    .into()
}

/// Append, wait, list, delete, list
async fn run_challenge(engine: &SyncEngine, zone: &str, wait: Duration) -> Result<()> {
    info!(
        "Using {} transport for zone {}",
        engine.transport_name(),
        zone
    );

    let challenge = DesiredRecord::new(CHALLENGE_NAME, "TXT", CHALLENGE_VALUE, CHALLENGE_TTL);
    let appended = engine
        .append_records(zone, &[challenge])
        .await
        .context("append failed")?;
    log_records("after append", &appended);

    info!("Waiting {:?} before cleanup", wait);
    tokio::select! {
        _ = tokio::time::sleep(wait) => {}
        received = wait_for_shutdown_signal() => match received {
            Ok(name) => warn!("Received {}, cleaning up early", name),
            Err(e) => warn!("{}", e),
        },
    }

    let all = engine.get_records(zone).await.context("list failed")?;
    log_records("zone", &all);

    let to_delete: Vec<DesiredRecord> = appended.into_iter().map(|r| r.record).collect();
    let deleted = engine
        .delete_records(zone, &to_delete)
        .await
        .context("delete failed")?;
    log_records("after delete", &deleted);

    let all = engine.get_records(zone).await.context("list failed")?;
    log_records("zone", &all);

    info!("Done");
    Ok(())
}

fn log_records(title: &str, records: &[ZoneRecord]) {
    info!("{}: {} record(s)", title, records.len());
    for (i, r) in records.iter().enumerate() {
        info!("  [{}] #{} {}", i, r.id, r.record);
    }
}

/// Wait for SIGTERM or SIGINT
#[cfg(unix)]
async fn wait_for_shutdown_signal() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}

/// Wait for CTRL-C
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown_signal() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to wait for CTRL-C: {}", e))?;
    Ok("SIGINT")
}
