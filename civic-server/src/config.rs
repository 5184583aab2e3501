//! Server configuration - environment loading
//!
//! Configuration is loaded from environment variables:
//! - `DATABASE_URL`: Postgres connection string (required)
//! - `FRONTEND_URL`: Origin of the deployed frontend, added to the CORS allow-list
//! - `CORS_EXTRA_ORIGINS`: Comma-separated additional origins
//! - `CLOUDINARY_CLOUD_NAME`, `CLOUDINARY_API_KEY`, `CLOUDINARY_API_SECRET`: media CDN
//! - `APP_ENV`: `production` hides error details from responses
//! - `HOST` / `PORT`: bind address (default 0.0.0.0:5000)

use std::net::SocketAddr;

use crate::http::cors::AllowedOrigins;

/// Origins always present in the allow-list: the hosted frontend and local dev servers.
const DEFAULT_ORIGINS: [&str; 3] = [
    "https://team-code-orbit-xfrontend.vercel.app",
    "http://localhost:5173",
    "http://localhost:3000",
];

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 5000;

/// Configuration errors. Missing `DATABASE_URL` is fatal at startup.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("DATABASE_URL is required")]
    MissingDatabaseUrl,

    #[error("invalid value for {key}: '{value}'")]
    Invalid { key: &'static str, value: String },
}

/// Media CDN credentials.
///
/// Uploads are handled by route collaborators; the server only reports
/// whether the credentials are usable.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct MediaConfig {
    pub cloud_name: Option<String>,
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
}

impl MediaConfig {
    /// All three credentials present.
    pub fn is_complete(&self) -> bool {
        self.cloud_name.is_some() && self.api_key.is_some() && self.api_secret.is_some()
    }

    /// Log whether uploads can work. Never fails startup.
    pub fn log_status(&self) {
        if self.is_complete() {
            tracing::info!(
                cloud_name = self.cloud_name.as_deref().unwrap_or_default(),
                "Media CDN configured"
            );
        } else {
            tracing::warn!("Media CDN credentials not fully configured. Image uploads may fail.");
        }
    }
}

// Hand-written so the secret never reaches logs.
impl std::fmt::Debug for MediaConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaConfig")
            .field("cloud_name", &self.cloud_name)
            .field("api_key", &self.api_key.as_ref().map(|_| "<set>"))
            .field("api_secret", &self.api_secret.as_ref().map(|_| "<set>"))
            .finish()
    }
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to
    pub bind_addr: SocketAddr,

    /// Postgres connection string. `None` fails startup and every connect attempt.
    pub database_url: Option<String>,

    /// Origins that receive CORS allow headers
    pub allowed_origins: AllowedOrigins,

    pub media: MediaConfig,

    /// Hide error details (`stack`) from responses
    pub production: bool,
}

impl ServerConfig {
    /// Create config from process environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create config from an arbitrary key lookup (for testing)
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_owned()).filter(|v| !v.is_empty());

        let host = var("HOST").unwrap_or_else(|| DEFAULT_HOST.to_owned());
        let port = match var("PORT") {
            Some(raw) => raw.parse::<u16>().map_err(|_| ConfigError::Invalid {
                key: "PORT",
                value: raw.clone(),
            })?,
            None => DEFAULT_PORT,
        };
        let bind_addr = format!("{}:{}", host, port)
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::Invalid {
                key: "HOST",
                value: host.clone(),
            })?;

        let mut origins: Vec<String> = Vec::new();
        if let Some(frontend) = var("FRONTEND_URL") {
            origins.push(frontend);
        }
        if let Some(extra) = var("CORS_EXTRA_ORIGINS") {
            origins.extend(
                extra
                    .split(',')
                    .map(str::trim)
                    .filter(|o| !o.is_empty())
                    .map(str::to_owned),
            );
        }
        origins.extend(DEFAULT_ORIGINS.iter().map(|o| (*o).to_owned()));

        let production = var("APP_ENV")
            .map(|env| env.eq_ignore_ascii_case("production"))
            .unwrap_or(false);

        Ok(Self {
            bind_addr,
            database_url: var("DATABASE_URL"),
            allowed_origins: AllowedOrigins::new(origins),
            media: MediaConfig {
                cloud_name: var("CLOUDINARY_CLOUD_NAME"),
                api_key: var("CLOUDINARY_API_KEY"),
                api_secret: var("CLOUDINARY_API_SECRET"),
            },
            production,
        })
    }

    /// The connection string, or the startup-fatal configuration error.
    pub fn require_database_url(&self) -> Result<&str, ConfigError> {
        self.database_url
            .as_deref()
            .ok_or(ConfigError::MissingDatabaseUrl)
    }
}
