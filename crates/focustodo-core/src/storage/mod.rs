mod config;
pub mod database;
pub mod migrations;

pub use config::{Config, NotificationsConfig, ScheduleConfig};
pub use database::{Database, FocusRecord};

use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// File name of the SQLite database inside the data directory.
pub const DATABASE_FILE: &str = "focustodo.db";
/// File name of the TOML configuration inside the data directory.
pub const CONFIG_FILE: &str = "config.toml";

/// Returns the directory holding `config.toml` and `focustodo.db`, creating it
/// if needed.
///
/// Resolution order:
/// - `explicit` when given;
/// - `FOCUSTODO_DATA_DIR` when set;
/// - `~/.config/focustodo-dev/` when `FOCUSTODO_ENV=dev`;
/// - `~/.config/focustodo/` otherwise.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir(explicit: Option<&Path>) -> Result<PathBuf, ConfigError> {
    let dir = match explicit {
        Some(dir) => dir.to_path_buf(),
        None => match std::env::var_os("FOCUSTODO_DATA_DIR") {
            Some(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => {
                let base_dir = dirs::home_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join(".config");
                let env =
                    std::env::var("FOCUSTODO_ENV").unwrap_or_else(|_| "production".to_string());
                if env == "dev" {
                    base_dir.join("focustodo-dev")
                } else {
                    base_dir.join("focustodo")
                }
            }
        },
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_dir_is_created() {
        let root = tempfile::tempdir().unwrap();
        let wanted = root.path().join("nested").join("data");
        let dir = data_dir(Some(&wanted)).unwrap();
        assert_eq!(dir, wanted);
        assert!(wanted.is_dir());
    }
}
