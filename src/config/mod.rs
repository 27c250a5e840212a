//! Configuration module for the mockup service

use serde::Deserialize;
use config::{Config, ConfigError, Environment, File};
use std::path::{Path, PathBuf};

use crate::domain::{Background, StatusBarStyle};
use crate::engine::{LayoutOptions, DEFAULT_OUTPUT};

/// Main application settings
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub assets: AssetSettings,
    pub defaults: DefaultSettings,
    pub output: OutputSettings,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
    /// Timeout for fetching screenshot URLs, in seconds
    pub fetch_timeout_secs: u64,
}

/// Device frame assets
#[derive(Debug, Clone, Deserialize)]
pub struct AssetSettings {
    pub path: PathBuf,
}

/// Canvas defaults used when a request leaves a field out
#[derive(Debug, Clone, Deserialize)]
pub struct DefaultSettings {
    pub width: u32,
    pub height: u32,
    pub background: String,
    pub status_bar: String,
    pub padding_x: f64,
    pub padding_y: f64,
}

/// CLI output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputSettings {
    pub path: PathBuf,
}

impl Settings {
    /// Load configuration from files and environment variables
    ///
    /// Configuration priority (highest to lowest):
    /// 1. Environment variables (prefixed with MOCKUP_)
    /// 2. config/local.toml (gitignored)
    /// 3. config/default.toml
    pub fn load() -> Result<Self, ConfigError> {
        let config_dir = std::env::var("CONFIG_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config"));

        Settings::load_from(&config_dir, environment())
    }

    /// Load from `config_dir` with `env` as the top layer
    pub fn load_from(config_dir: &Path, env: Environment) -> Result<Self, ConfigError> {
        let defaults = Settings::default();

        let builder = Config::builder()
            // Built-in defaults so every key is present
            .set_default("server.host", defaults.server.host)?
            .set_default("server.port", i64::from(defaults.server.port))?
            .set_default("server.fetch_timeout_secs", defaults.server.fetch_timeout_secs as i64)?
            .set_default("assets.path", defaults.assets.path.to_string_lossy().to_string())?
            .set_default("defaults.width", i64::from(defaults.defaults.width))?
            .set_default("defaults.height", i64::from(defaults.defaults.height))?
            .set_default("defaults.background", defaults.defaults.background)?
            .set_default("defaults.status_bar", defaults.defaults.status_bar)?
            .set_default("defaults.padding_x", defaults.defaults.padding_x)?
            .set_default("defaults.padding_y", defaults.defaults.padding_y)?
            .set_default("output.path", defaults.output.path.to_string_lossy().to_string())?
            // Start with default configuration
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Add local overrides (gitignored)
            .add_source(File::from(config_dir.join("local.toml")).required(false))
            // Add environment variables (MOCKUP_SERVER__PORT, etc.)
            .add_source(env);

        builder.build()?.try_deserialize()
    }
}

/// `MOCKUP_` prefixed variables, `__` between nested keys
fn environment() -> Environment {
    Environment::with_prefix("MOCKUP")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

impl DefaultSettings {
    /// Layout options built from these defaults
    pub fn layout_options(&self) -> Result<LayoutOptions, String> {
        let background = self
            .background
            .parse::<Background>()
            .map_err(|e| format!("defaults.background: {e}"))?;
        let status_bar =
            StatusBarStyle::parse(&self.status_bar).map_err(|e| format!("defaults.status_bar: {e}"))?;

        Ok(LayoutOptions {
            width: self.width,
            height: self.height,
            background,
            status_bar,
            padding_x: self.padding_x,
            padding_y: self.padding_y,
        })
    }
}

impl Default for Settings {
    fn default() -> Self {
        let layout = LayoutOptions::default();
        Settings {
            server: ServerSettings {
                host: "0.0.0.0".to_string(),
                port: 8080,
                workers: None,
                fetch_timeout_secs: 30,
            },
            assets: AssetSettings {
                path: PathBuf::from("assets/devices"),
            },
            defaults: DefaultSettings {
                width: layout.width,
                height: layout.height,
                background: "transparent".to_string(),
                status_bar: "none".to_string(),
                padding_x: layout.padding_x,
                padding_y: layout.padding_y,
            },
            output: OutputSettings {
                path: PathBuf::from(DEFAULT_OUTPUT),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_match_layout_defaults() {
        let options = Settings::default().defaults.layout_options().unwrap();
        assert_eq!(options, LayoutOptions::default());
    }

    #[test]
    fn test_invalid_defaults_are_reported() {
        let mut defaults = Settings::default().defaults;
        defaults.background = "not-a-color".to_string();
        let err = defaults.layout_options().unwrap_err();
        assert!(err.starts_with("defaults.background"));

        let mut defaults = Settings::default().defaults;
        defaults.status_bar = "purple".to_string();
        assert!(defaults.layout_options().unwrap_err().starts_with("defaults.status_bar"));
    }

    /// Process environment replaced by `vars`
    fn env_with(vars: &[(&str, &str)]) -> Environment {
        let source = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<config::Map<_, _>>();
        environment().source(Some(source))
    }

    #[test]
    fn test_load_without_files_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let settings = Settings::load_from(dir.path(), env_with(&[])).unwrap();
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.server.fetch_timeout_secs, 30);
        assert_eq!(settings.defaults.layout_options().unwrap(), LayoutOptions::default());
    }

    #[test]
    fn test_load_with_file_overrides() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("default.toml"),
            "[defaults]\nwidth = 1920\nbackground = \"#ffffff\"\n",
        )
        .unwrap();

        let settings = Settings::load_from(dir.path(), env_with(&[])).unwrap();
        assert_eq!(settings.defaults.width, 1920);
        assert_eq!(settings.defaults.height, 720);
        assert_eq!(settings.defaults.background, "#ffffff");
        assert_eq!(settings.server.port, 8080);
    }

    #[test]
    fn test_local_file_overrides_default_file() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("default.toml"),
            "[server]\nport = 9000\n\n[defaults]\nwidth = 1920\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("local.toml"), "[server]\nport = 9100\n").unwrap();

        let settings = Settings::load_from(dir.path(), env_with(&[])).unwrap();
        assert_eq!(settings.server.port, 9100);
        assert_eq!(settings.defaults.width, 1920);
    }

    #[test]
    fn test_environment_overrides_files() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("default.toml"), "[server]\nport = 9000\n").unwrap();
        std::fs::write(dir.path().join("local.toml"), "[defaults]\nwidth = 1920\n").unwrap();

        let env = env_with(&[
            ("MOCKUP_SERVER__PORT", "7000"),
            ("MOCKUP_DEFAULTS__WIDTH", "640"),
            ("MOCKUP_DEFAULTS__PADDING_X", "0.5"),
            ("MOCKUP_DEFAULTS__STATUS_BAR", "dark"),
            ("OTHER_SERVER__PORT", "1"),
        ]);
        let settings = Settings::load_from(dir.path(), env).unwrap();
        assert_eq!(settings.server.port, 7000);
        assert_eq!(settings.defaults.width, 640);
        assert_eq!(settings.defaults.padding_x, 0.5);
        assert_eq!(settings.defaults.status_bar, "dark");
    }
}
