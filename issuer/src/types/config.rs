//! Process configuration, loaded once at startup

use std::env;
use std::fmt;
use std::path::PathBuf;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use strum::{Display, EnumString};
use thiserror::Error;
use url::Url;

use super::Environment;

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_STATIC_DIR: &str = "public";
const DEFAULT_S3_REGION: &str = "us-east-1";

/// Errors that prevent the service from starting
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// One or more required variables are unset or empty
    #[error("Missing one or more required environment variables: {}", .0.join(", "))]
    Missing(Vec<&'static str>),

    /// `APP_ENV` holds an unknown value
    #[error("Invalid environment: {0}")]
    InvalidEnvironment(String),

    /// `STORAGE_PROVIDER` holds an unknown value
    #[error("Invalid storage provider: {0}")]
    InvalidProvider(String),

    /// The Azure account key is not Base64
    #[error("AZURE_STORAGE_ACCOUNT_KEY is not valid base64: {0}")]
    InvalidAccountKey(String),

    /// A variable holds a value that cannot be parsed
    #[error("Invalid value for {name}: {value}")]
    InvalidValue {
        /// Variable name
        name: &'static str,
        /// Offending value
        value: String,
    },
}

/// Which storage service signs upload URLs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum StorageProvider {
    /// Azure Blob Storage, shared access signatures
    Azure,
    /// S3-compatible storage, SigV4 presigned URLs
    S3,
}

/// Azure Blob Storage account settings
#[derive(Clone, PartialEq, Eq)]
pub struct AzureConfig {
    /// Storage account name
    pub account_name: String,
    /// Decoded account key
    pub account_key: Vec<u8>,
    /// Container receiving uploads
    pub container: String,
    /// Blob endpoint, `https://{account}.blob.core.windows.net` unless overridden
    pub endpoint: Url,
}

impl fmt::Debug for AzureConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AzureConfig")
            .field("account_name", &self.account_name)
            .field("account_key", &"<redacted>")
            .field("container", &self.container)
            .field("endpoint", &self.endpoint.as_str())
            .finish()
    }
}

/// S3-compatible storage settings
#[derive(Clone, PartialEq, Eq)]
pub struct S3Config {
    /// Access key id
    pub access_key_id: String,
    /// Secret access key
    pub secret_access_key: String,
    /// Bucket receiving uploads
    pub bucket: String,
    /// Signing region
    pub region: String,
    /// Endpoint override (LocalStack, `MinIO`, R2, ...)
    pub endpoint_url: Option<String>,
}

impl fmt::Debug for S3Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("S3Config")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .field("endpoint_url", &self.endpoint_url)
            .finish()
    }
}

/// Storage backend configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageConfig {
    /// Azure Blob Storage
    Azure(AzureConfig),
    /// S3-compatible storage
    S3(S3Config),
}

impl StorageConfig {
    /// Loads the storage configuration from the process environment
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] naming every missing variable, or the first invalid one
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Loads the storage configuration through `lookup`, which maps a variable name to its value
    ///
    /// Empty values count as missing.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] naming every missing variable, or the first invalid one
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let provider = match lookup("STORAGE_PROVIDER") {
            Some(value) => value
                .trim()
                .parse::<StorageProvider>()
                .map_err(|_| ConfigError::InvalidProvider(value))?,
            None => StorageProvider::Azure,
        };

        match provider {
            StorageProvider::Azure => {
                let [account_name, account_key, container] = require(
                    &lookup,
                    [
                        "AZURE_STORAGE_ACCOUNT_NAME",
                        "AZURE_STORAGE_ACCOUNT_KEY",
                        "AZURE_STORAGE_CONTAINER",
                    ],
                )?;

                let account_key = STANDARD
                    .decode(account_key.trim())
                    .map_err(|e| ConfigError::InvalidAccountKey(e.to_string()))?;

                let endpoint = match lookup("AZURE_STORAGE_ENDPOINT") {
                    Some(value) => parse_url("AZURE_STORAGE_ENDPOINT", &value)?,
                    None => parse_url(
                        "AZURE_STORAGE_ACCOUNT_NAME",
                        &format!("https://{account_name}.blob.core.windows.net"),
                    )?,
                };

                Ok(Self::Azure(AzureConfig {
                    account_name,
                    account_key,
                    container,
                    endpoint,
                }))
            }
            StorageProvider::S3 => {
                let [access_key_id, secret_access_key, bucket] = require(
                    &lookup,
                    ["S3_ACCESS_KEY_ID", "S3_SECRET_ACCESS_KEY", "S3_BUCKET_NAME"],
                )?;

                let endpoint_url = lookup("S3_ENDPOINT_URL");
                if let Some(value) = &endpoint_url {
                    parse_url("S3_ENDPOINT_URL", value)?;
                }

                Ok(Self::S3(S3Config {
                    access_key_id,
                    secret_access_key,
                    bucket,
                    region: lookup("S3_REGION").unwrap_or_else(|| DEFAULT_S3_REGION.to_string()),
                    endpoint_url,
                }))
            }
        }
    }

    /// The provider this configuration selects
    #[must_use]
    pub const fn provider(&self) -> StorageProvider {
        match self {
            Self::Azure(_) => StorageProvider::Azure,
            Self::S3(_) => StorageProvider::S3,
        }
    }
}

/// Listener and static asset settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// TCP port to listen on
    pub port: u16,
    /// Directory holding the browser UI
    pub static_dir: PathBuf,
}

impl ServerConfig {
    /// Reads `PORT` and `STATIC_DIR`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if `PORT` is not a valid port number
    pub fn from_env() -> Result<Self, ConfigError> {
        let port = match env::var("PORT") {
            Ok(value) => value.trim().parse().map_err(|_| ConfigError::InvalidValue {
                name: "PORT",
                value,
            })?,
            Err(_) => DEFAULT_PORT,
        };

        let static_dir = env::var("STATIC_DIR")
            .map_or_else(|_| PathBuf::from(DEFAULT_STATIC_DIR), PathBuf::from);

        Ok(Self { port, static_dir })
    }
}

/// Everything the issuer needs to start, validated up front
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Deployment stage
    pub environment: Environment,
    /// Listener settings
    pub server: ServerConfig,
    /// Storage backend settings
    pub storage: StorageConfig,
}

impl AppConfig {
    /// Loads and validates the whole configuration
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] encountered
    pub fn from_env(environment: Environment) -> Result<Self, ConfigError> {
        Ok(Self {
            environment,
            server: ServerConfig::from_env()?,
            storage: StorageConfig::from_env()?,
        })
    }
}

fn require<F, const N: usize>(
    lookup: &F,
    names: [&'static str; N],
) -> Result<[String; N], ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let values = names.map(lookup);
    let missing: Vec<&'static str> = names
        .iter()
        .zip(&values)
        .filter(|(_, value)| value.is_none())
        .map(|(name, _)| *name)
        .collect();

    if !missing.is_empty() {
        return Err(ConfigError::Missing(missing));
    }

    Ok(values.map(Option::unwrap_or_default))
}

fn parse_url(name: &'static str, value: &str) -> Result<Url, ConfigError> {
    Url::parse(value.trim()).map_err(|_| ConfigError::InvalidValue {
        name,
        value: value.to_string(),
    })
}
