use serde::{Deserialize, Serialize};

use crate::contract::ViolationPolicy;
use crate::director::{QueryParameter, Scene};

/// Root configuration container.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub contracts: ContractConfig,
    #[serde(default)]
    pub director: DirectorConfig,
}

/// Log gate and default tracing filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Whether core log lines are built and forwarded at all (default: true).
    #[serde(default = "default_logging_enabled")]
    pub enabled: bool,
    /// `EnvFilter` directive used when `RUST_LOG` is unset (default: "info").
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

/// How developer contract violations are handled.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContractConfig {
    /// "panic" or "report" (default: panic in debug builds, report otherwise).
    #[serde(default)]
    pub on_violation: ViolationPolicy,
}

/// URL scheme and the scenes and query parameters the router recognizes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectorConfig {
    /// The app's URL scheme (e.g., "stagehand").
    #[serde(default = "default_scheme")]
    pub scheme: String,
    /// Scene tokens (e.g., ["home", "favorites"]).
    #[serde(default = "default_scenes")]
    pub scenes: Vec<Scene>,
    /// Query parameter tokens (e.g., ["q"]).
    #[serde(default)]
    pub query_parameters: Vec<QueryParameter>,
}

fn default_logging_enabled() -> bool {
    true
}

fn default_log_filter() -> String {
    "info".to_string()
}

fn default_scheme() -> String {
    "stagehand".to_string()
}

fn default_scenes() -> Vec<Scene> {
    vec![Scene::new("home"), Scene::new("favorites")]
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: default_logging_enabled(),
            filter: default_log_filter(),
        }
    }
}

impl Default for DirectorConfig {
    fn default() -> Self {
        Self {
            scheme: default_scheme(),
            scenes: default_scenes(),
            query_parameters: Vec::new(),
        }
    }
}
