//! Bus configuration loader.
//!
//! Reads `config.toml` from the data directory (`~/.rxbus/` by default) and
//! deserializes it into [`BusConfig`]. Falls back to defaults when the file
//! is missing or malformed.

use std::path::Path;

use rxbus_types::BusConfig;

use crate::filesystem::config_path;

/// Load bus configuration from `{data_dir}/config.toml`.
pub async fn load_bus_config(data_dir: &Path) -> BusConfig {
    load_bus_config_file(&config_path(data_dir)).await
}

/// Load bus configuration from an explicit file path.
///
/// - If the file does not exist, returns [`BusConfig::default()`].
/// - If the file exists but fails to read or parse, logs a warning and
///   returns the default.
pub async fn load_bus_config_file(config_path: &Path) -> BusConfig {
    let content = match tokio::fs::read_to_string(config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config file at {}, using defaults", config_path.display());
            return BusConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return BusConfig::default();
        }
    };

    match toml::from_str::<BusConfig>(&content) {
        Ok(config) => {
            if config.is_capacity_clamped() {
                tracing::warn!(
                    "channel_capacity = {} in {} is out of range, using {}",
                    config.channel_capacity,
                    config_path.display(),
                    config.effective_capacity()
                );
            }
            config
        }
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            BusConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rxbus_types::MAX_CHANNEL_CAPACITY;
    use tempfile::TempDir;

    #[tokio::test]
    async fn load_bus_config_missing_file_returns_default() {
        let tmp = TempDir::new().unwrap();
        let config = load_bus_config(tmp.path()).await;
        assert_eq!(config, BusConfig::default());
    }

    #[tokio::test]
    async fn load_bus_config_valid_toml_returns_parsed() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(
            tmp.path().join("config.toml"),
            r#"
channel_capacity = 64
log_events = true
"#,
        )
        .await
        .unwrap();

        let config = load_bus_config(tmp.path()).await;
        assert_eq!(config.channel_capacity, 64);
        assert!(config.log_events);
    }

    #[tokio::test]
    async fn load_bus_config_invalid_toml_returns_default() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(tmp.path().join("config.toml"), "this is not { valid toml !!!")
            .await
            .unwrap();

        let config = load_bus_config(tmp.path()).await;
        assert_eq!(config, BusConfig::default());
    }

    #[tokio::test]
    async fn load_bus_config_file_reads_explicit_path() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("custom.toml");
        tokio::fs::write(&path, "channel_capacity = 8\n").await.unwrap();

        let config = load_bus_config_file(&path).await;
        assert_eq!(config.channel_capacity, 8);
        assert!(!config.log_events);
    }

    #[tokio::test]
    async fn zero_capacity_is_kept_but_floored_at_use() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(tmp.path().join("config.toml"), "channel_capacity = 0\n")
            .await
            .unwrap();

        let config = load_bus_config(tmp.path()).await;
        assert_eq!(config.channel_capacity, 0);
        assert_eq!(config.effective_capacity(), 1);
    }

    #[tokio::test]
    async fn oversized_capacity_is_kept_but_capped_at_use() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(
            tmp.path().join("config.toml"),
            "channel_capacity = 9223372036854775807\n",
        )
        .await
        .unwrap();

        let config = load_bus_config(tmp.path()).await;
        assert!(config.is_capacity_clamped());
        assert_eq!(config.effective_capacity(), MAX_CHANNEL_CAPACITY);
    }
}
