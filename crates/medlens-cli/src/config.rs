//! Configuration file support

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Configuration for medlens
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Model to use for analysis
    pub model: Option<String>,
    /// Color theme ("dark" or "light")
    pub theme: Option<String>,
    /// API keys (alternative to environment variables)
    #[serde(default)]
    pub api_keys: ApiKeys,
}

/// API key configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiKeys {
    pub google: Option<String>,
}

impl Config {
    /// Get the config directory
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("medlens")
    }

    /// Get the config file path
    pub fn config_path() -> PathBuf {
        // Check for MEDLENS_CONFIG_PATH env var first
        if let Ok(path) = std::env::var("MEDLENS_CONFIG_PATH") {
            return PathBuf::from(path);
        }
        Self::config_dir().join("config.toml")
    }

    /// Load config from file
    pub fn load() -> Self {
        let path = Self::config_path();
        if !path.exists() {
            return Self::default();
        }

        match fs::read_to_string(&path) {
            Ok(content) => Self::parse(&content),
            Err(e) => {
                eprintln!("Warning: Failed to read config file: {}", e);
                Self::default()
            }
        }
    }

    /// Parse config content, falling back to defaults on bad TOML
    fn parse(content: &str) -> Self {
        match toml::from_str(content) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Warning: Failed to parse config file: {}", e);
                Self::default()
            }
        }
    }

    /// Save config to file
    pub fn save(&self) -> std::io::Result<()> {
        let path = Self::config_path();
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }

        let content = toml::to_string_pretty(self).map_err(std::io::Error::other)?;
        fs::write(path, content)
    }

    /// Create a default config file if it doesn't exist
    pub fn init() -> std::io::Result<PathBuf> {
        let path = Self::config_path();
        if path.exists() {
            return Ok(path);
        }

        let default_config = Config {
            model: Some("gemini-2.0-flash-exp".to_string()),
            theme: Some("dark".to_string()),
            api_keys: ApiKeys::default(),
        };

        default_config.save()?;
        Ok(path)
    }

    /// Get the Google API key, checking config then env
    pub fn get_api_key(&self) -> Option<String> {
        if let Some(key) = self.api_keys.google.clone() {
            return Some(key);
        }

        std::env::var("GOOGLE_API_KEY")
            .or_else(|_| std::env::var("GEMINI_API_KEY"))
            .ok()
    }
}

/// Generate example config content
pub fn example_config() -> &'static str {
    r#"# medlens configuration file
# Place at ~/.config/medlens/config.toml (Linux/Mac) or %APPDATA%\medlens\config.toml (Windows)

# Model to use for analysis
model = "gemini-2.0-flash-exp"

# Color theme ("dark" or "light")
theme = "dark"

# API key (optional - can also use GOOGLE_API_KEY or GEMINI_API_KEY env vars)
# It's recommended to use environment variables instead for security
[api_keys]
# google = "..."
"#
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let config = Config::parse(
            r#"
model = "gemini-2.5-pro"
theme = "light"

[api_keys]
google = "test-key"
"#,
        );
        assert_eq!(config.model.as_deref(), Some("gemini-2.5-pro"));
        assert_eq!(config.theme.as_deref(), Some("light"));
        assert_eq!(config.api_keys.google.as_deref(), Some("test-key"));
    }

    #[test]
    fn test_parse_partial_config() {
        let config = Config::parse(r#"model = "gemini-2.0-flash-exp""#);
        assert_eq!(config.model.as_deref(), Some("gemini-2.0-flash-exp"));
        assert!(config.theme.is_none());
        assert!(config.api_keys.google.is_none());
    }

    #[test]
    fn test_parse_invalid_toml_falls_back_to_default() {
        let config = Config::parse("model = [not toml");
        assert!(config.model.is_none());
    }

    #[test]
    fn test_example_config_parses() {
        let config = Config::parse(example_config());
        assert_eq!(config.model.as_deref(), Some("gemini-2.0-flash-exp"));
        assert_eq!(config.theme.as_deref(), Some("dark"));
    }

    #[test]
    fn test_config_key_wins_over_env() {
        let config = Config {
            api_keys: ApiKeys {
                google: Some("from-config".to_string()),
            },
            ..Default::default()
        };
        assert_eq!(config.get_api_key().as_deref(), Some("from-config"));
    }
}
