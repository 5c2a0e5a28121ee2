//! Deployment mode selected once at process start.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Startup-fixed flag distinguishing development from production behavior.
///
/// Only the exact value `production` selects production. Anything else in
/// `NODE_ENV` (unset, `test`, `staging`, `Production`) is development.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentMode {
    #[default]
    Development,
    Production,
}

impl DeploymentMode {
    /// Derive the mode from the raw `NODE_ENV` value.
    #[must_use]
    pub fn from_node_env(value: Option<&str>) -> Self {
        if value == Some("production") {
            Self::Production
        } else {
            Self::Development
        }
    }

    #[must_use]
    pub const fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
        }
    }
}

impl fmt::Display for DeploymentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
