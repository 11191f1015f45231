use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use sqlx::postgres::PgConnectOptions;

const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash-preview-05-20";

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing, never at first request.
#[derive(Debug, Clone)]
pub struct Config {
    pub gemini: GeminiConfig,
    pub store: StoreBackend,
    pub db_max_connections: u32,
    pub response_shape: ResponseShape,
    pub static_dir: PathBuf,
    pub port: u16,
    pub rust_log: String,
}

#[derive(Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub api_base: String,
    pub model: String,
    pub timeout: Duration,
}

// Hand-written so the key never ends up in logs.
impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &"<redacted>")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Where posts are persisted.
#[derive(Clone)]
pub enum StoreBackend {
    Postgres(PgConnectOptions),
    /// In-process store; contents are lost on restart.
    Memory,
}

// sqlx's derived Debug for the connect options prints the password.
impl std::fmt::Debug for StoreBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreBackend::Postgres(_) => f.write_str("Postgres(<connection options redacted>)"),
            StoreBackend::Memory => f.write_str("Memory"),
        }
    }
}

/// What `POST /generate` returns on success.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseShape {
    /// The upstream envelope, untouched.
    Envelope,
    /// The parsed content plus the stored post.
    Content,
}

impl FromStr for ResponseShape {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "envelope" => Ok(ResponseShape::Envelope),
            "content" => Ok(ResponseShape::Content),
            other => bail!("unknown response shape '{other}' (expected 'envelope' or 'content')"),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let api_key = require_env("GEMINI_API_KEY")?;
        if api_key.trim().is_empty() {
            bail!("Required environment variable 'GEMINI_API_KEY' is empty");
        }

        let timeout_secs: u64 = env_or("GEMINI_TIMEOUT_SECS", "60")
            .parse()
            .context("GEMINI_TIMEOUT_SECS must be a whole number of seconds")?;

        Ok(Config {
            gemini: GeminiConfig {
                api_key,
                api_base: env_or("GEMINI_API_BASE", DEFAULT_GEMINI_API_BASE),
                model: env_or("GEMINI_MODEL", DEFAULT_GEMINI_MODEL),
                timeout: Duration::from_secs(timeout_secs),
            },
            store: store_backend_from_env()?,
            db_max_connections: env_or("DB_MAX_CONNECTIONS", "10")
                .parse()
                .context("DB_MAX_CONNECTIONS must be a positive integer")?,
            response_shape: env_or("GENERATE_RESPONSE", "envelope").parse()?,
            static_dir: PathBuf::from(env_or("STATIC_DIR", "static")),
            port: env_or("PORT", "8080")
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: env_or("RUST_LOG", "info"),
        })
    }
}

fn store_backend_from_env() -> Result<StoreBackend> {
    match env_or("STORE_BACKEND", "postgres").trim().to_ascii_lowercase().as_str() {
        "memory" => Ok(StoreBackend::Memory),
        "postgres" => {
            if let Ok(url) = std::env::var("DATABASE_URL") {
                let options = PgConnectOptions::from_str(&url)
                    .context("DATABASE_URL is not a valid PostgreSQL connection string")?;
                return Ok(StoreBackend::Postgres(options));
            }

            let port: u16 = env_or("DB_PORT", "5432")
                .parse()
                .context("DB_PORT must be a valid port number")?;

            Ok(StoreBackend::Postgres(
                PgConnectOptions::new()
                    .host(&env_or("DB_HOST", "localhost"))
                    .port(port)
                    .username(&require_env("DB_USER")?)
                    .password(&require_env("DB_PASSWORD")?)
                    .database(&require_env("DB_NAME")?),
            ))
        }
        other => bail!("STORE_BACKEND must be 'postgres' or 'memory', got '{other}'"),
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
