use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::types::Config;
use crate::director::is_addressable;
use crate::{contract, logging};

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{path}': {source}")]
    ParseError {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Config validation failed: {message}")]
    ValidationError { message: String },
}

impl Config {
    /// Returns the path to the configuration file.
    ///
    /// Uses `~/.config/stagehand/config.toml` on Unix/macOS, or the
    /// equivalent on other platforms via `dirs::config_dir()`.
    /// Falls back to the current directory if config_dir is unavailable.
    pub fn config_path() -> PathBuf {
        let config_dir = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        config_dir.join("stagehand").join("config.toml")
    }

    /// Loads configuration from the default config file.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    /// Loads configuration from `path`.
    ///
    /// - If the file doesn't exist, returns `Config::default()`.
    /// - If the file exists, parses it as TOML and validates.
    /// - Returns an error if reading, parsing, or validation fails.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// Checks:
    /// - The scheme is a valid URL scheme
    /// - Scene and query parameter tokens are non-empty, contain no control
    ///   characters, and are unique
    /// - No scene is `.` or `..`, which URL paths normalize away
    pub fn validate(&self) -> Result<(), ConfigError> {
        let scheme = &self.director.scheme;
        if !is_valid_scheme(scheme) {
            return Err(ConfigError::ValidationError {
                message: format!("Invalid URL scheme '{}'", scheme),
            });
        }

        if self.director.scenes.is_empty() {
            return Err(ConfigError::ValidationError {
                message: "At least one scene must be configured".to_string(),
            });
        }

        if let Some(scene) = self
            .director
            .scenes
            .iter()
            .find(|scene| !is_addressable(scene.raw_value()))
        {
            return Err(ConfigError::ValidationError {
                message: format!("Scene '{}' cannot appear in a URL path", scene),
            });
        }

        validate_tokens(
            "scene",
            self.director.scenes.iter().map(|scene| scene.raw_value()),
        )?;
        validate_tokens(
            "query parameter",
            self.director
                .query_parameters
                .iter()
                .map(|parameter| parameter.raw_value()),
        )?;

        Ok(())
    }

    /// Install the log gate and the contract violation policy for this
    /// process. Both can only be set once; later calls are ignored with a
    /// warning.
    pub fn apply(&self) {
        if !logging::set_enabled(self.logging.enabled) {
            tracing::warn!(
                enabled = self.logging.enabled,
                "Log gate already set; ignoring configured value"
            );
        }
        if !contract::set_policy(self.contracts.on_violation) {
            tracing::warn!(
                policy = ?self.contracts.on_violation,
                "Violation policy already set; ignoring configured value"
            );
        }
    }
}

/// RFC 3986: ALPHA *( ALPHA / DIGIT / "+" / "-" / "." )
fn is_valid_scheme(scheme: &str) -> bool {
    let mut chars = scheme.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

fn validate_tokens<'a>(
    kind: &str,
    tokens: impl Iterator<Item = &'a str>,
) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    for token in tokens {
        if token.is_empty() {
            return Err(ConfigError::ValidationError {
                message: format!("Empty {} token", kind),
            });
        }
        if token.chars().any(char::is_control) {
            return Err(ConfigError::ValidationError {
                message: format!("Invalid {} token '{}'", kind, token),
            });
        }
        if !seen.insert(token) {
            return Err(ConfigError::ValidationError {
                message: format!("Duplicate {} token '{}'", kind, token),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::director::{QueryParameter, Scene};

    #[test]
    fn default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn scheme_must_start_with_letter() {
        assert!(is_valid_scheme("stagehand"));
        assert!(is_valid_scheme("com.example.app+v2"));
        assert!(!is_valid_scheme("1app"));
        assert!(!is_valid_scheme("my app"));
        assert!(!is_valid_scheme(""));
    }

    #[test]
    fn dot_segment_scenes_rejected() {
        let mut config = Config::default();
        config.director.scenes.push(Scene::new(".."));
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError { .. })
        ));
    }

    #[test]
    fn control_characters_rejected_in_tokens() {
        let mut config = Config::default();
        config.director.query_parameters = vec![QueryParameter::new("q\n")];
        assert!(config.validate().is_err());
    }

    #[test]
    fn delimiters_and_non_ascii_tokens_are_accepted() {
        let mut config = Config::default();
        config.director.scenes.push(Scene::new("café"));
        config.director.scenes.push(Scene::new("a/b"));
        config.director.query_parameters = vec![QueryParameter::new("sort by")];
        assert!(config.validate().is_ok());
    }

    #[test]
    fn duplicate_query_parameters_rejected() {
        let mut config = Config::default();
        config.director.query_parameters =
            vec![QueryParameter::new("q"), QueryParameter::new("q")];
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("Duplicate query parameter token 'q'"));
    }

    #[test]
    fn empty_scene_list_rejected() {
        let mut config = Config::default();
        config.director.scenes.clear();
        assert!(config.validate().is_err());
    }
}
