use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A recognized URL query key, identified by its raw string token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueryParameter(String);

/// Recognized query parameters and their raw values.
pub type QueryMap = BTreeMap<QueryParameter, String>;

impl QueryParameter {
    pub fn new(raw_value: impl Into<String>) -> Self {
        Self(raw_value.into())
    }

    pub fn raw_value(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QueryParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for QueryParameter {
    fn from(raw_value: &str) -> Self {
        Self::new(raw_value)
    }
}

impl From<String> for QueryParameter {
    fn from(raw_value: String) -> Self {
        Self(raw_value)
    }
}
