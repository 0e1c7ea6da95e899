//! ==============================================================================
//! config.rs - runtime configuration loader
//! ==============================================================================
//!
//! purpose:
//!     defines the schema for `sentinel.toml`.
//!     loads configuration from file or falls back to defaults.
//!
//! structure:
//!     - DashboardConfig: tick interval, window size, preload, rng seed
//!     - ParameterPageConfig: detail page interval, window, which pages run
//!     - StorageConfig: where the shared snapshot slot lives
//!     - ServerConfig: bind address for the dashboard surface
//!     - LoggingConfig: default log level, per-tick reading logs
//!     - LiveConfig: initial live mode
//!
//! ==============================================================================

use anyhow::Context;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::sync::{FileStore, MemoryStore, SnapshotStore, SNAPSHOT_KEY};

/// Root configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct SentinelConfig {
    #[serde(default)]
    pub dashboard: DashboardConfig,
    #[serde(default)]
    pub parameter_page: ParameterPageConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub live: LiveConfig,
    /// file this config came from, if any
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DashboardConfig {
    pub interval_ms: u64,
    pub capacity: usize,
    pub preload_points: usize,
    pub seed: Option<u64>,
}

impl DashboardConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self { interval_ms: 4000, capacity: 12, preload_points: 6, seed: None }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ParameterPageConfig {
    pub interval_ms: u64,
    pub capacity: usize,
    /// page keys, e.g. "ph", "temperature", "metals"
    pub pages: Vec<String>,
    pub seed: Option<u64>,
}

impl ParameterPageConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl Default for ParameterPageConfig {
    fn default() -> Self {
        let pages = ["ph", "tds", "turbidity", "temperature", "do", "metals"];
        Self {
            interval_ms: 5000,
            capacity: 10,
            pages: pages.iter().map(|p| p.to_string()).collect(),
            seed: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Memory,
    File,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// directory for the file backend
    pub dir: PathBuf,
    pub key: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Memory,
            dir: PathBuf::from("data"),
            key: SNAPSHOT_KEY.to_string(),
        }
    }
}

impl StorageConfig {
    /// open the configured snapshot store
    pub fn open(&self) -> anyhow::Result<Arc<dyn SnapshotStore>> {
        Ok(match self.backend {
            StorageBackend::Memory => Arc::new(MemoryStore::new()),
            StorageBackend::File => Arc::new(
                FileStore::open(&self.dir)
                    .with_context(|| format!("Failed to open storage dir {}", self.dir.display()))?,
            ),
        })
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind: "0.0.0.0:3000".to_string() }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub show_readings: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), show_readings: true }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LiveConfig {
    pub enabled: bool,
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl SentinelConfig {
    /// Load configuration from file
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::parse(&content).map(|mut config| {
            config.source = Some(path.to_path_buf());
            config
        })
    }

    pub fn parse(content: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(content).context("Failed to parse config")?;
        config.validate()?;
        Ok(config)
    }

    /// reject values the tick loops cannot run with
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.dashboard.interval_ms == 0 {
            anyhow::bail!("dashboard.interval_ms must be at least 1");
        }
        if self.parameter_page.interval_ms == 0 {
            anyhow::bail!("parameter_page.interval_ms must be at least 1");
        }
        Ok(())
    }

    /// Load with default fallback
    ///
    /// runs before logging is up, so problems are returned as warnings for
    /// the caller to log.
    pub fn load_or_default() -> (Self, Vec<String>) {
        let paths = [
            PathBuf::from("config").join("sentinel.toml"),
            PathBuf::from("..").join("config").join("sentinel.toml"),
        ];

        let mut warnings = Vec::new();
        for path in &paths {
            if path.exists() {
                match Self::load(path) {
                    Ok(config) => return (config, warnings),
                    Err(e) => warnings.push(format!("Failed to load {}: {:#}", path.display(), e)),
                }
            }
        }

        warnings.push("No config file found - using defaults".to_string());
        (Self::default(), warnings)
    }

    /// Log configuration summary
    pub fn log_summary(&self) {
        let source = self
            .source
            .as_ref()
            .map_or_else(|| "defaults".to_string(), |p| p.display().to_string());
        tracing::info!("[CONFIG] source: {}", source);
        tracing::info!(
            "[CONFIG] dashboard: {}ms tick, {} points, {} preloaded",
            self.dashboard.interval_ms,
            self.dashboard.capacity,
            self.dashboard.preload_points
        );
        tracing::info!(
            "[CONFIG] parameter pages: {}ms tick, {} points, pages {:?}",
            self.parameter_page.interval_ms,
            self.parameter_page.capacity,
            self.parameter_page.pages
        );
        tracing::info!("[CONFIG] storage: {:?} key={}", self.storage.backend, self.storage.key);
        tracing::info!("[CONFIG] live mode: {}", if self.live.enabled { "ON" } else { "OFF" });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = SentinelConfig::parse("").unwrap();
        assert_eq!(config.dashboard.interval(), Duration::from_millis(4000));
        assert_eq!(config.dashboard.capacity, 12);
        assert_eq!(config.parameter_page.interval(), Duration::from_millis(5000));
        assert_eq!(config.parameter_page.capacity, 10);
        assert_eq!(config.parameter_page.pages.len(), 6);
        assert_eq!(config.storage.key, "aquaReadings");
        assert!(config.live.enabled);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = SentinelConfig::parse(
            r#"
            [dashboard]
            seed = 42

            [storage]
            backend = "file"
            dir = "/tmp/aqua"

            [live]
            enabled = false
            "#,
        )
        .unwrap();
        assert_eq!(config.dashboard.seed, Some(42));
        assert_eq!(config.dashboard.capacity, 12);
        assert_eq!(config.storage.backend, StorageBackend::File);
        assert_eq!(config.storage.key, SNAPSHOT_KEY);
        assert!(!config.live.enabled);
    }

    #[test]
    fn bad_backend_is_rejected() {
        assert!(SentinelConfig::parse("[storage]\nbackend = \"s3\"").is_err());
    }

    #[test]
    fn zero_interval_is_rejected() {
        let err = SentinelConfig::parse("[dashboard]\ninterval_ms = 0\n").unwrap_err();
        assert!(err.to_string().contains("dashboard.interval_ms"), "{err:#}");
        let err = SentinelConfig::parse("[parameter_page]\ninterval_ms = 0\n").unwrap_err();
        assert!(err.to_string().contains("parameter_page.interval_ms"), "{err:#}");
        assert!(SentinelConfig::parse("[dashboard]\ninterval_ms = 1\n").is_ok());
    }

    #[test]
    fn zero_interval_fails_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sentinel.toml");
        std::fs::write(&path, "[parameter_page]\ninterval_ms = 0\n").unwrap();
        assert!(SentinelConfig::load(&path).is_err());
    }

    #[test]
    fn load_records_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sentinel.toml");
        std::fs::write(&path, "[server]\nbind = \"127.0.0.1:8080\"\n").unwrap();
        let config = SentinelConfig::load(&path).unwrap();
        assert_eq!(config.server.bind, "127.0.0.1:8080");
        assert_eq!(config.source.as_deref(), Some(path.as_path()));
    }

    #[test]
    fn file_backend_opens_directory() {
        let dir = tempfile::tempdir().unwrap();
        let storage = StorageConfig {
            backend: StorageBackend::File,
            dir: dir.path().join("snapshots"),
            key: SNAPSHOT_KEY.to_string(),
        };
        let store = storage.open().unwrap();
        store.write("aquaReadings", "{}").unwrap();
        assert!(dir.path().join("snapshots/aquaReadings.json").exists());
    }
}
