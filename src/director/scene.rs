use std::fmt;

use serde::{Deserialize, Serialize};

/// A navigable destination, identified by its raw string token.
///
/// Applications define their own scenes, e.g. `Scene::new("home")`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Scene(String);

impl Scene {
    pub fn new(raw_value: impl Into<String>) -> Self {
        Self(raw_value.into())
    }

    pub fn raw_value(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Scene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Scene {
    fn from(raw_value: &str) -> Self {
        Self::new(raw_value)
    }
}

impl From<String> for Scene {
    fn from(raw_value: String) -> Self {
        Self(raw_value)
    }
}
