//! Configuration loading and data folder resolution

use crate::{Error, Result};
use std::path::PathBuf;

/// Environment variable naming the data folder
pub const DATA_DIR_ENV: &str = "LODGE_DATA_DIR";

/// Resolve the data folder (database, receipts) by priority:
/// 1. Command-line argument (highest priority)
/// 2. `LODGE_DATA_DIR` environment variable
/// 3. `data_dir` key in the TOML config file
/// 4. OS-dependent compiled default (fallback)
pub fn resolve_data_dir(cli_arg: Option<&str>) -> Result<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Ok(PathBuf::from(path));
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(DATA_DIR_ENV) {
        if !path.is_empty() {
            return Ok(PathBuf::from(path));
        }
    }

    // Priority 3: TOML config file
    if let Ok(config_path) = find_config_file() {
        if let Ok(toml_content) = std::fs::read_to_string(&config_path) {
            if let Ok(config) = toml::from_str::<toml::Value>(&toml_content) {
                if let Some(data_dir) = config.get("data_dir").and_then(|v| v.as_str()) {
                    return Ok(PathBuf::from(data_dir));
                }
            }
        }
    }

    // Priority 4: OS-dependent compiled default
    Ok(default_data_dir())
}

/// Locate the platform config file, if one exists
fn find_config_file() -> Result<PathBuf> {
    if cfg!(target_os = "linux") {
        // Try ~/.config/lodge/config.toml first, then /etc/lodge/config.toml
        if let Some(path) = dirs::config_dir().map(|d| d.join("lodge").join("config.toml")) {
            if path.exists() {
                return Ok(path);
            }
        }
        let system_config = PathBuf::from("/etc/lodge/config.toml");
        if system_config.exists() {
            return Ok(system_config);
        }
        Err(Error::Config("No config file found".to_string()))
    } else {
        let path = dirs::config_dir()
            .map(|d| d.join("lodge").join("config.toml"))
            .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))?;
        if path.exists() {
            Ok(path)
        } else {
            Err(Error::Config(format!("Config file not found: {:?}", path)))
        }
    }
}

/// OS-dependent default data folder
fn default_data_dir() -> PathBuf {
    if cfg!(target_os = "linux") {
        // ~/.local/share/lodge (or /var/lib/lodge for system-wide installs)
        dirs::data_local_dir()
            .map(|d| d.join("lodge"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/lodge"))
    } else if cfg!(target_os = "macos") {
        dirs::data_dir()
            .map(|d| d.join("lodge"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/lodge"))
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir()
            .map(|d| d.join("lodge"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\lodge"))
    } else {
        PathBuf::from("./lodge_data")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    #[cfg(target_os = "linux")]
    use tempfile::TempDir;

    #[test]
    #[serial]
    fn test_cli_arg_wins_over_env() {
        std::env::set_var(DATA_DIR_ENV, "/tmp/lodge-env");
        let resolved = resolve_data_dir(Some("/tmp/lodge-cli")).unwrap();
        std::env::remove_var(DATA_DIR_ENV);
        assert_eq!(resolved, PathBuf::from("/tmp/lodge-cli"));
    }

    #[test]
    #[serial]
    fn test_env_var_used_when_no_cli_arg() {
        std::env::set_var(DATA_DIR_ENV, "/tmp/lodge-env");
        let resolved = resolve_data_dir(None).unwrap();
        std::env::remove_var(DATA_DIR_ENV);
        assert_eq!(resolved, PathBuf::from("/tmp/lodge-env"));
    }

    #[test]
    #[serial]
    #[cfg(target_os = "linux")]
    fn test_config_file_data_dir_used_when_no_cli_or_env() {
        let config_home = TempDir::new().unwrap();
        let lodge_dir = config_home.path().join("lodge");
        std::fs::create_dir_all(&lodge_dir).unwrap();
        std::fs::write(
            lodge_dir.join("config.toml"),
            "data_dir = \"/tmp/lodge-from-toml\"\n",
        )
        .unwrap();

        // dirs::config_dir() follows XDG_CONFIG_HOME on Linux.
        let saved_config_home = std::env::var("XDG_CONFIG_HOME").ok();
        std::env::remove_var(DATA_DIR_ENV);
        std::env::set_var("XDG_CONFIG_HOME", config_home.path());

        let resolved = resolve_data_dir(None);

        match saved_config_home {
            Some(v) => std::env::set_var("XDG_CONFIG_HOME", v),
            None => std::env::remove_var("XDG_CONFIG_HOME"),
        }

        assert_eq!(resolved.unwrap(), PathBuf::from("/tmp/lodge-from-toml"));
    }

    #[test]
    #[serial]
    fn test_fallback_resolves_somewhere() {
        std::env::remove_var(DATA_DIR_ENV);
        let resolved = resolve_data_dir(None).unwrap();
        assert!(!resolved.as_os_str().is_empty());
    }
}
