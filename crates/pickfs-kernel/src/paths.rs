//! XDG Base Directory paths for pickfs.
//!
//! pickfs keeps no documents on disk. The only files it touches are its
//! configuration and the console history:
//!
//! | Purpose | XDG Variable | Default | pickfs Path |
//! |---------|--------------|---------|-------------|
//! | Config | `$XDG_CONFIG_HOME` | `~/.config` | `$XDG_CONFIG_HOME/pickfs/config.toml` |
//! | History | `$XDG_DATA_HOME` | `~/.local/share` | `$XDG_DATA_HOME/pickfs/history.txt` |

use std::path::PathBuf;

use directories::BaseDirs;

/// Get the config directory.
///
/// Uses `$XDG_CONFIG_HOME/pickfs` or falls back to `~/.config/pickfs`.
pub fn config_dir() -> PathBuf {
    BaseDirs::new()
        .map(|d| d.config_dir().to_path_buf())
        .unwrap_or_else(|| home_fallback().join(".config"))
        .join("pickfs")
}

/// Get the data directory.
///
/// Uses `$XDG_DATA_HOME/pickfs` or falls back to `~/.local/share/pickfs`.
pub fn data_dir() -> PathBuf {
    BaseDirs::new()
        .map(|d| d.data_dir().to_path_buf())
        .unwrap_or_else(|| home_fallback().join(".local").join("share"))
        .join("pickfs")
}

/// The default configuration file.
pub fn config_file() -> PathBuf {
    config_dir().join("config.toml")
}

/// Console line history.
pub fn history_file() -> PathBuf {
    data_dir().join("history.txt")
}

/// Fallback home directory when BaseDirs fails.
fn home_fallback() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| std::env::temp_dir())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_are_under_pickfs() {
        assert!(config_dir().ends_with("pickfs"));
        assert!(data_dir().ends_with("pickfs"));
    }

    #[test]
    fn files_live_in_their_dirs() {
        assert!(config_file().starts_with(config_dir()));
        assert!(config_file().ends_with("config.toml"));
        assert!(history_file().starts_with(data_dir()));
    }
}
