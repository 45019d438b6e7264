//! Data directory layout for rxbus.

use std::path::{Path, PathBuf};

/// Environment variable that overrides the data directory.
pub const DATA_DIR_ENV: &str = "RXBUS_DATA_DIR";

/// Resolve the data directory from environment or platform defaults.
///
/// Priority:
/// 1. `RXBUS_DATA_DIR` environment variable
/// 2. `~/.rxbus` under the user's home directory
/// 3. `.rxbus` in the current directory
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        return PathBuf::from(dir);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".rxbus");
    }

    PathBuf::from(".rxbus")
}

/// Path of the config file inside a data directory.
pub fn config_path(data_dir: &Path) -> PathBuf {
    data_dir.join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_path_is_inside_data_dir() {
        let path = config_path(Path::new("/tmp/rxbus"));
        assert_eq!(path, PathBuf::from("/tmp/rxbus/config.toml"));
    }

    #[test]
    fn test_resolve_data_dir_from_env() {
        // SAFETY: This test is the only one touching the variable and restores it immediately.
        unsafe {
            std::env::set_var(DATA_DIR_ENV, "/tmp/test-rxbus");
        }
        let dir = resolve_data_dir();
        assert_eq!(dir, PathBuf::from("/tmp/test-rxbus"));
        unsafe {
            std::env::remove_var(DATA_DIR_ENV);
        }
    }
}
