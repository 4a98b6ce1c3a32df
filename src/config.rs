// config.rs
use std::env;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024; // 5MB
pub const MAX_TOKEN_TTL_DAYS: i64 = 3650;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Mongo,
    Memory,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub storage_backend: StorageBackend,
    pub database_url: Option<String>,
    pub database_name: String,
    pub jwt_secret: String,
    pub token_ttl_days: i64,
    pub uploads_dir: PathBuf,
    pub max_upload_bytes: usize,
    pub admin_username: String,
    pub admin_password: String,
    pub cors_origin: String,
    pub seed_demo_data: bool,
    pub bcrypt_cost: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            host: "0.0.0.0".to_string(),
            port: 8080,
            storage_backend: StorageBackend::Mongo,
            database_url: None,
            database_name: "league".to_string(),
            jwt_secret: "change-me-league-secret".to_string(),
            token_ttl_days: 7,
            uploads_dir: PathBuf::from("uploads"),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            admin_username: "admin".to_string(),
            admin_password: "admin".to_string(),
            cors_origin: "*".to_string(),
            seed_demo_data: true,
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }
}

impl AppConfig {
    /// Reads settings from the environment, keeping the default for any
    /// variable that is missing or does not parse.
    pub fn from_env() -> Self {
        let mut config = AppConfig::default();

        if let Ok(host) = env::var("HOST") {
            config.host = host;
        }
        config.port = parsed_var("PORT", config.port);

        if let Ok(backend) = env::var("STORAGE_BACKEND") {
            match parse_backend(&backend) {
                Some(b) => config.storage_backend = b,
                None => tracing::warn!(value = %backend, "Unknown STORAGE_BACKEND, using mongo"),
            }
        }

        config.database_url = env::var("DATABASE_URL").ok().filter(|u| !u.trim().is_empty());
        if let Ok(name) = env::var("DATABASE_NAME") {
            config.database_name = name;
        }

        match env::var("JWT_SECRET") {
            Ok(secret) if !secret.is_empty() => config.jwt_secret = secret,
            _ => tracing::warn!("JWT_SECRET not set, using the development secret"),
        }
        config.token_ttl_days =
            bounded_ttl_days(parsed_var("TOKEN_TTL_DAYS", config.token_ttl_days));

        if let Ok(dir) = env::var("UPLOADS_DIR") {
            config.uploads_dir = PathBuf::from(dir);
        }
        config.max_upload_bytes = parsed_var("MAX_UPLOAD_BYTES", config.max_upload_bytes);

        if let Ok(username) = env::var("ADMIN_USERNAME") {
            config.admin_username = username;
        }
        if let Ok(password) = env::var("ADMIN_PASSWORD") {
            config.admin_password = password;
        }
        if let Ok(origin) = env::var("CORS_ORIGIN") {
            config.cors_origin = origin;
        }
        if let Ok(raw) = env::var("SEED_DEMO_DATA") {
            match parse_bool(&raw) {
                Some(v) => config.seed_demo_data = v,
                None => tracing::warn!(value = %raw, "Invalid SEED_DEMO_DATA, using default"),
            }
        }
        config.bcrypt_cost = parsed_var("BCRYPT_COST", config.bcrypt_cost);

        config
    }

    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid HOST '{}': {}", self.host, e))?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Log level for the subscriber, read before the rest of the config so
/// that config warnings are not lost.
pub fn log_level_from_env() -> tracing::Level {
    env::var("LOG_LEVEL")
        .ok()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(tracing::Level::INFO)
}

fn parsed_var<T: std::str::FromStr + Copy + std::fmt::Display>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(value = %raw, "Invalid {}, using default {}", name, default);
            default
        }),
        Err(_) => default,
    }
}

/// Keeps the token lifetime between one day and [`MAX_TOKEN_TTL_DAYS`].
pub fn bounded_ttl_days(days: i64) -> i64 {
    let bounded = days.clamp(1, MAX_TOKEN_TTL_DAYS);
    if bounded != days {
        tracing::warn!(value = days, "TOKEN_TTL_DAYS out of range, using {}", bounded);
    }
    bounded
}

fn parse_backend(raw: &str) -> Option<StorageBackend> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "mongo" | "mongodb" => Some(StorageBackend::Mongo),
        "memory" | "mem" => Some(StorageBackend::Memory),
        _ => None,
    }
}

pub(crate) fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
