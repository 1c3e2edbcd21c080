//! Runtime mode classification.
//!
//! The mode decides whether mail goes through a configured SMTP host or a
//! disposable test account, and whether configured addresses are honoured.

use serde::{Deserialize, Serialize};
use std::fmt;

pub const MODE_ENV_VAR: &str = "NODE_ENV";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RuntimeMode {
    Development,
    Production,
    DevTest,
    Unspecified,
}

impl RuntimeMode {
    /// Classify a raw mode string. Total: anything unrecognised, including a
    /// missing or empty value, is `Unspecified`.
    pub fn classify(value: Option<&str>) -> Self {
        match value {
            Some("development") => Self::Development,
            Some("production") => Self::Production,
            Some("devTest") => Self::DevTest,
            _ => Self::Unspecified,
        }
    }

    /// Read and classify `NODE_ENV` from the process environment.
    pub fn from_env() -> Self {
        Self::classify(std::env::var(MODE_ENV_VAR).ok().as_deref())
    }

    pub fn is_deployment_mode(self) -> bool {
        matches!(self, Self::Development | Self::Production)
    }

    pub fn is_test_mode(self) -> bool {
        self == Self::DevTest
    }

    /// True when neither a deployment nor the test mode is active, i.e. mail
    /// should go through a throwaway test account.
    pub fn uses_disposable_account(self) -> bool {
        !self.is_deployment_mode() && !self.is_test_mode()
    }

    pub fn is_production(self) -> bool {
        self == Self::Production
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::DevTest => "devTest",
            Self::Unspecified => "unspecified",
        }
    }
}

impl Default for RuntimeMode {
    fn default() -> Self {
        Self::Unspecified
    }
}

impl fmt::Display for RuntimeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
