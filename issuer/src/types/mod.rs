mod config;
mod environment;
mod error;
mod extractors;

pub use config::{
    AppConfig, AzureConfig, ConfigError, S3Config, ServerConfig, StorageConfig, StorageProvider,
};
pub use environment::Environment;
pub use error::AppError;
pub use extractors::JsonBody;
