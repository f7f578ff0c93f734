//! Environment configuration for different deployment stages

use std::env;

use super::ConfigError;

/// Application environment configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    /// Production environment
    Production,
    /// Staging environment
    Staging,
    /// Development environment (local emulators, readable logs)
    Development,
}

impl Environment {
    /// Creates an Environment from the `APP_ENV` environment variable, defaulting to development
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidEnvironment`] if `APP_ENV` contains an unknown value
    pub fn from_env() -> Result<Self, ConfigError> {
        let env = env::var("APP_ENV")
            .unwrap_or_else(|_| "development".to_string())
            .trim()
            .to_lowercase();

        match env.as_str() {
            "production" => Ok(Self::Production),
            "staging" => Ok(Self::Staging),
            "development" => Ok(Self::Development),
            _ => Err(ConfigError::InvalidEnvironment(env)),
        }
    }

    /// Whether to serve the generated `OpenAPI` document
    #[must_use]
    pub const fn show_api_docs(&self) -> bool {
        matches!(self, Self::Development | Self::Staging)
    }

    /// Whether logs are emitted as JSON lines for the log pipeline
    #[must_use]
    pub const fn json_logs(&self) -> bool {
        matches!(self, Self::Production | Self::Staging)
    }
}
