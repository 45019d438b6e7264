//! Application state for the `rxbus` binary.
//!
//! Resolves the data directory and loads the bus configuration once; demos
//! build their own bus from it so each run starts from an empty bus.

use std::path::{Path, PathBuf};

use rxbus_core::EventBus;
use rxbus_infra::config::load_bus_config_file;
use rxbus_infra::filesystem::{config_path, resolve_data_dir};
use rxbus_types::BusConfig;

/// Resolved configuration shared by all commands.
#[derive(Debug, Clone)]
pub struct AppState {
    pub data_dir: PathBuf,
    pub config_path: PathBuf,
    pub config: BusConfig,
}

impl AppState {
    /// Load configuration from `config_override` or `{data_dir}/config.toml`.
    pub async fn init(config_override: Option<&Path>) -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();
        let config_path = match config_override {
            Some(path) => path.to_path_buf(),
            None => config_path(&data_dir),
        };
        let config = load_bus_config_file(&config_path).await;
        tracing::debug!(?config, path = %config_path.display(), "loaded bus config");

        Ok(Self {
            data_dir,
            config_path,
            config,
        })
    }

    /// A fresh bus built from the loaded configuration.
    pub fn new_bus(&self) -> EventBus {
        EventBus::new(self.config.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn init_with_override_reads_that_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("bus.toml");
        tokio::fs::write(&path, "channel_capacity = 32\n").await.unwrap();

        let state = AppState::init(Some(&path)).await.unwrap();
        assert_eq!(state.config_path, path);
        assert_eq!(state.config.channel_capacity, 32);
        assert_eq!(state.new_bus().config().channel_capacity, 32);
    }

    #[tokio::test]
    async fn init_with_missing_override_uses_defaults() {
        let tmp = TempDir::new().unwrap();
        let state = AppState::init(Some(&tmp.path().join("absent.toml")))
            .await
            .unwrap();
        assert_eq!(state.config, BusConfig::default());
    }
}
