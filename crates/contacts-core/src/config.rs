//! Application configuration
//!
//! Configuration is loaded from:
//! 1. Default values
//! 2. Config file (~/.config/contacts/config.toml)
//! 3. Environment variables (CONTACTS_* prefix)
//!
//! Environment variables take precedence over config file values.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable prefix
const ENV_PREFIX: &str = "CONTACTS";

/// Keys accepted by [`Config::set`]
pub const KEYS: &[&str] = &["addressbook", "editor", "log_file"];

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding one vCard file per contact
    #[serde(default = "default_addressbook")]
    pub addressbook: PathBuf,

    /// Editor command for editing contacts (falls back to $EDITOR)
    #[serde(default)]
    pub editor: Option<String>,

    /// Write log output to this file instead of stderr
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            addressbook: default_addressbook(),
            editor: None,
            log_file: None,
        }
    }
}

impl Config {
    /// Load configuration from default location and environment
    ///
    /// Order of precedence (highest to lowest):
    /// 1. Environment variables (CONTACTS_ADDRESSBOOK, CONTACTS_EDITOR)
    /// 2. Config file (~/.config/contacts/config.toml or CONTACTS_CONFIG)
    /// 3. Default values
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::config_file_path())
    }

    /// Load configuration, reading the file given on the command line if any
    pub fn load_with_cli_override(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from_path(path),
            None => Self::load(),
        }
    }

    /// Load configuration from a specific path
    ///
    /// Environment variables are still applied as overrides.
    /// If the file doesn't exist, defaults are used.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        config.expand_paths();
        Ok(config)
    }

    /// Load configuration from a TOML string (useful for testing)
    pub fn load_from_str(toml_content: &str) -> Result<Self> {
        let mut config: Config =
            toml::from_str(toml_content).context("Failed to parse config TOML")?;
        config.apply_env_overrides();
        config.expand_paths();
        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        // CONTACTS_ADDRESSBOOK
        if let Ok(val) = std::env::var(format!("{}_ADDRESSBOOK", ENV_PREFIX)) {
            if !val.is_empty() {
                self.addressbook = PathBuf::from(val);
            }
        }

        // CONTACTS_EDITOR
        if let Ok(val) = std::env::var(format!("{}_EDITOR", ENV_PREFIX)) {
            self.editor = if val.is_empty() { None } else { Some(val) };
        }
    }

    fn expand_paths(&mut self) {
        self.addressbook = expand_home(&self.addressbook);
        if let Some(log_file) = &self.log_file {
            self.log_file = Some(expand_home(log_file));
        }
    }

    /// Change one setting by key
    ///
    /// An empty value clears the optional settings.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let value = value.trim();
        match key {
            "addressbook" => {
                if value.is_empty() {
                    bail!("addressbook cannot be empty");
                }
                self.addressbook = expand_home(Path::new(value));
            }
            "editor" => {
                self.editor = if value.is_empty() {
                    None
                } else {
                    Some(value.to_string())
                };
            }
            "log_file" => {
                self.log_file = if value.is_empty() {
                    None
                } else {
                    Some(expand_home(Path::new(value)))
                };
            }
            _ => bail!("Unknown config key '{}'. Valid keys: {}", key, KEYS.join(", ")),
        }
        Ok(())
    }

    /// Save configuration to the default file
    pub fn save(&self) -> Result<()> {
        self.save_to_path(&Self::config_file_path())
    }

    /// Save configuration to a specific file
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {:?}", path))?;
        Ok(())
    }

    /// Get the config file path
    ///
    /// Can be overridden with CONTACTS_CONFIG environment variable
    pub fn config_file_path() -> PathBuf {
        if let Ok(path) = std::env::var(format!("{}_CONFIG", ENV_PREFIX)) {
            if !path.is_empty() {
                return PathBuf::from(path);
            }
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("contacts")
            .join("config.toml")
    }
}

/// Get the default address book directory
fn default_addressbook() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("contacts")
}

/// Replace a leading `~` or `$HOME` with the home directory
pub fn expand_home(path: &Path) -> PathBuf {
    let Some(text) = path.to_str() else {
        return path.to_path_buf();
    };
    let rest = if text == "~" || text == "$HOME" {
        ""
    } else if let Some(rest) = text.strip_prefix("~/") {
        rest
    } else if let Some(rest) = text.strip_prefix("$HOME/") {
        rest
    } else {
        return path.to_path_buf();
    };

    match dirs::home_dir() {
        Some(home) if rest.is_empty() => home,
        Some(home) => home.join(rest),
        None => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;
    use tempfile::TempDir;

    // Mutex to serialize tests that touch environment variables
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    /// Guard that locks env access and saves/restores env vars
    struct EnvGuard<'a> {
        _lock: std::sync::MutexGuard<'a, ()>,
        saved: Vec<(String, Option<String>)>,
    }

    impl<'a> EnvGuard<'a> {
        fn new(vars: &[&str]) -> Self {
            let lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
            let saved = vars
                .iter()
                .map(|&name| (name.to_string(), env::var(name).ok()))
                .collect();
            for name in vars {
                env::remove_var(name);
            }
            Self { _lock: lock, saved }
        }
    }

    impl Drop for EnvGuard<'_> {
        fn drop(&mut self) {
            for (name, value) in &self.saved {
                match value {
                    Some(v) => env::set_var(name, v),
                    None => env::remove_var(name),
                }
            }
        }
    }

    const ENV_VARS: &[&str] = &["CONTACTS_ADDRESSBOOK", "CONTACTS_EDITOR", "CONTACTS_CONFIG"];

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.addressbook.ends_with("contacts"));
        assert!(config.editor.is_none());
        assert!(config.log_file.is_none());
    }

    #[test]
    fn test_env_override_addressbook() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();
        env::set_var("CONTACTS_ADDRESSBOOK", "/tmp/contacts-test");
        config.apply_env_overrides();

        assert_eq!(config.addressbook, PathBuf::from("/tmp/contacts-test"));
    }

    #[test]
    fn test_env_override_editor() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();
        env::set_var("CONTACTS_EDITOR", "vim");
        config.apply_env_overrides();
        assert_eq!(config.editor, Some("vim".to_string()));

        // Empty string clears it
        env::set_var("CONTACTS_EDITOR", "");
        config.apply_env_overrides();
        assert!(config.editor.is_none());
    }

    #[test]
    fn test_env_beats_file() {
        let _guard = EnvGuard::new(ENV_VARS);

        env::set_var("CONTACTS_ADDRESSBOOK", "/from/env");
        let config = Config::load_from_str("addressbook = \"/from/file\"").unwrap();
        assert_eq!(config.addressbook, PathBuf::from("/from/env"));
    }

    #[test]
    fn test_load_from_str() {
        let _guard = EnvGuard::new(ENV_VARS);

        let toml = r#"
            addressbook = "/custom/book"
            editor = "nano -w"
            log_file = "/tmp/contacts.log"
        "#;

        let config = Config::load_from_str(toml).unwrap();
        assert_eq!(config.addressbook, PathBuf::from("/custom/book"));
        assert_eq!(config.editor.as_deref(), Some("nano -w"));
        assert_eq!(config.log_file, Some(PathBuf::from("/tmp/contacts.log")));
    }

    #[test]
    fn test_home_expansion() {
        let _guard = EnvGuard::new(ENV_VARS);
        let Some(home) = dirs::home_dir() else {
            return;
        };

        let config = Config::load_from_str("addressbook = \"~/cards\"").unwrap();
        assert_eq!(config.addressbook, home.join("cards"));

        let config = Config::load_from_str("addressbook = \"$HOME/cards\"").unwrap();
        assert_eq!(config.addressbook, home.join("cards"));

        assert_eq!(expand_home(Path::new("~")), home);
        assert_eq!(expand_home(Path::new("/abs/~")), PathBuf::from("/abs/~"));
    }

    #[test]
    fn test_load_from_path_missing_file() {
        let _guard = EnvGuard::new(ENV_VARS);

        let path = PathBuf::from("/nonexistent/config.toml");
        let config = Config::load_from_path(&path).unwrap();
        // Should return defaults when file doesn't exist
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_from_path_invalid_file() {
        let _guard = EnvGuard::new(ENV_VARS);
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "addressbook = [").unwrap();

        assert!(Config::load_from_path(&path).is_err());
    }

    #[test]
    fn test_save_and_reload() {
        let _guard = EnvGuard::new(ENV_VARS);
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");

        let config = Config {
            addressbook: PathBuf::from("/data/book"),
            editor: Some("vi".to_string()),
            log_file: None,
        };
        config.save_to_path(&path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("addressbook"));
        assert!(!content.contains("log_file"));

        let loaded = Config::load_with_cli_override(Some(path.as_path())).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_config_file_path_override() {
        let _guard = EnvGuard::new(ENV_VARS);

        assert!(Config::config_file_path().ends_with("contacts/config.toml"));

        env::set_var("CONTACTS_CONFIG", "/etc/contacts.toml");
        assert_eq!(
            Config::config_file_path(),
            PathBuf::from("/etc/contacts.toml")
        );
    }

    #[test]
    fn test_set() {
        let mut config = Config::default();

        config.set("addressbook", "/other/book").unwrap();
        assert_eq!(config.addressbook, PathBuf::from("/other/book"));

        config.set("editor", "hx").unwrap();
        assert_eq!(config.editor.as_deref(), Some("hx"));
        config.set("editor", "").unwrap();
        assert!(config.editor.is_none());

        config.set("log_file", "/tmp/c.log").unwrap();
        assert_eq!(config.log_file, Some(PathBuf::from("/tmp/c.log")));

        assert!(config.set("addressbook", " ").is_err());
        assert!(config.set("colour", "red").is_err());
    }
}
