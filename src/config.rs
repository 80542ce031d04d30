use std::net::IpAddr;
use std::time::Duration;

use axum::http::HeaderValue;

pub const DEFAULT_DEV_TENANT: &str = "tenant-admin";

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: Option<String>,
    pub users_container: String,
    pub tenant_source: TenantSource,
    pub host: IpAddr,
    pub port: u16,
    pub store_timeout: Duration,
    pub request_timeout: Duration,
    pub max_body_size: usize,
    pub cors_origins: Vec<HeaderValue>,
    pub log_level: String,
    pub log_format: LogFormat,
}

/// Where the trusted tenant of a request comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum TenantSource {
    /// Development stub: every request belongs to this tenant.
    Static(String),
    /// `tid` claim of an HS256 bearer token.
    Jwt { secret: String },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LogFormat {
    Text,
    Json,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|url| !url.trim().is_empty());

        let users_container = env_or("USERS_API_CONTAINER", "users");

        let tenant_source = match std::env::var("JWT_SECRET").ok() {
            Some(secret) if !secret.is_empty() => TenantSource::Jwt { secret },
            _ => TenantSource::Static(env_or("DEV_TENANT_ID", DEFAULT_DEV_TENANT)),
        };

        let host: IpAddr = env_or("USERS_API_HOST", "0.0.0.0")
            .parse()
            .map_err(|e| format!("Invalid USERS_API_HOST: {e}"))?;

        // Azure Functions custom handlers are told their port through this variable.
        let port_raw = std::env::var("USERS_API_PORT")
            .or_else(|_| std::env::var("FUNCTIONS_CUSTOMHANDLER_PORT"))
            .unwrap_or_else(|_| "8080".to_string());
        let port: u16 = port_raw
            .parse()
            .map_err(|e| format!("Invalid USERS_API_PORT: {e}"))?;

        let store_timeout_ms: u64 = env_or("USERS_API_STORE_TIMEOUT_MS", "5000")
            .parse()
            .map_err(|e| format!("Invalid USERS_API_STORE_TIMEOUT_MS: {e}"))?;

        let request_timeout_secs: u64 = env_or("USERS_API_REQUEST_TIMEOUT_SECS", "30")
            .parse()
            .map_err(|e| format!("Invalid USERS_API_REQUEST_TIMEOUT_SECS: {e}"))?;

        let max_body_size: usize = env_or("USERS_API_MAX_BODY_SIZE", "65536")
            .parse()
            .map_err(|e| format!("Invalid USERS_API_MAX_BODY_SIZE: {e}"))?;

        let cors_origins: Vec<HeaderValue> = env_or("USERS_API_CORS_ORIGINS", "")
            .split(',')
            .filter(|s| !s.trim().is_empty())
            .map(|s| {
                s.trim()
                    .parse()
                    .map_err(|e| format!("Invalid USERS_API_CORS_ORIGINS entry '{s}': {e}"))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let log_level = env_or("USERS_API_LOG_LEVEL", "info");

        let log_format = match env_or("USERS_API_LOG_FORMAT", "text").as_str() {
            "json" => LogFormat::Json,
            "text" => LogFormat::Text,
            other => return Err(format!("Invalid USERS_API_LOG_FORMAT: {other}")),
        };

        Ok(Config {
            database_url,
            users_container,
            tenant_source,
            host,
            port,
            store_timeout: Duration::from_millis(store_timeout_ms),
            request_timeout: Duration::from_secs(request_timeout_secs),
            max_body_size,
            cors_origins,
            log_level,
            log_format,
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
