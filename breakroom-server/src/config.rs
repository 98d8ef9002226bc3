//! Runtime configuration loaded from environment variables
//!
//! - `SECRET_KEY`: HMAC key for session tokens (required)
//! - `CORS_ORIGIN`: public origin of the site, also the base for absolute
//!   URLs in Open Graph tags (default: https://www.prosaurus.com)
//! - `PRODUCTION`: `true`/`1` enables production cookie settings
//! - `COOKIE_DOMAIN`: session cookie domain in production (default: .prosaurus.com)
//! - `TEST_API_KEY`: shared key for test reporters (unset = open)
//! - `DIST_DIR`: built frontend directory (default: dist)
//! - `S3_BUCKET`, `AWS_REGION`, `S3_PUBLIC_URL`: upload storage

use std::path::PathBuf;

use thiserror::Error;

/// Default public origin when `CORS_ORIGIN` is unset
pub const DEFAULT_PUBLIC_ORIGIN: &str = "https://www.prosaurus.com";

/// Origins always allowed by CORS in addition to the configured one
pub const FIXED_ORIGINS: [&str; 2] = ["https://prosaurus.com", "https://www.prosaurus.com"];

const DEFAULT_COOKIE_DOMAIN: &str = ".prosaurus.com";
const MIN_RECOMMENDED_SECRET_LEN: usize = 32;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("invalid {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

/// Object storage settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    pub bucket: String,
    pub region: String,
    /// Base URL objects are publicly reachable at; defaults to the bucket's
    /// virtual-hosted S3 endpoint
    pub public_url: Option<String>,
}

impl StorageConfig {
    /// Public URL of an object key.
    pub fn object_url(&self, key: &str) -> String {
        match &self.public_url {
            Some(base) => format!("{}/{}", base.trim_end_matches('/'), key),
            None => format!("https://{}.s3.{}.amazonaws.com/{}", self.bucket, self.region, key),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            bucket: "prosaurus-uploads".to_string(),
            region: "us-east-1".to_string(),
            public_url: None,
        }
    }
}

/// Application configuration shared by handlers
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub public_origin: String,
    pub secret_key: String,
    pub production: bool,
    pub cookie_domain: Option<String>,
    pub test_api_key: Option<String>,
    pub dist_dir: PathBuf,
    pub storage: StorageConfig,
}

impl AppConfig {
    /// Config with defaults and the given signing key.
    pub fn new(secret_key: impl Into<String>) -> Self {
        Self {
            public_origin: DEFAULT_PUBLIC_ORIGIN.to_string(),
            secret_key: secret_key.into(),
            production: false,
            cookie_domain: None,
            test_api_key: None,
            dist_dir: PathBuf::from("dist"),
            storage: StorageConfig::default(),
        }
    }

    /// Load from process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup (environment, test fixtures).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let secret_key = get("SECRET_KEY").ok_or(ConfigError::Missing("SECRET_KEY"))?;
        if secret_key.len() < MIN_RECOMMENDED_SECRET_LEN {
            tracing::warn!(
                len = secret_key.len(),
                "SECRET_KEY is shorter than {} bytes",
                MIN_RECOMMENDED_SECRET_LEN
            );
        }

        let production = match get("PRODUCTION") {
            None => false,
            Some(v) => parse_bool(&v).ok_or_else(|| ConfigError::Invalid {
                var: "PRODUCTION",
                reason: format!("expected true/false, got '{}'", v),
            })?,
        };

        let public_origin = get("CORS_ORIGIN")
            .map(|o| o.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_PUBLIC_ORIGIN.to_string());

        let cookie_domain = get("COOKIE_DOMAIN")
            .or_else(|| production.then(|| DEFAULT_COOKIE_DOMAIN.to_string()));

        let defaults = StorageConfig::default();
        let storage = StorageConfig {
            bucket: get("S3_BUCKET").unwrap_or(defaults.bucket),
            region: get("AWS_REGION").unwrap_or(defaults.region),
            public_url: get("S3_PUBLIC_URL"),
        };

        Ok(Self {
            public_origin,
            secret_key,
            production,
            cookie_domain,
            test_api_key: get("TEST_API_KEY"),
            dist_dir: get("DIST_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("dist")),
            storage,
        })
    }

    /// Origins accepted by CORS: the configured one plus the fixed site origins.
    pub fn allowed_origins(&self) -> Vec<String> {
        let mut origins = vec![self.public_origin.clone()];
        for fixed in FIXED_ORIGINS {
            if !origins.iter().any(|o| o == fixed) {
                origins.push(fixed.to_string());
            }
        }
        origins
    }

    /// Session cookies are `Secure` on https origins and in production.
    pub fn secure_cookies(&self) -> bool {
        self.production || self.public_origin.starts_with("https")
    }

    /// Cookie domain; only applied in production.
    pub fn session_cookie_domain(&self) -> Option<&str> {
        if self.production {
            self.cookie_domain.as_deref()
        } else {
            None
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
