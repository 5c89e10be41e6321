//! Environment-driven configuration.
//!
//! Values are read from the process environment after loading an
//! optional `.env` file.  Every setting has a default so the binary
//! starts with no configuration at all.

use crate::calculators::{default_research_cutover, EngineSettings};
use chrono::NaiveDate;
use std::env;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use thiserror::Error;

/// Top-level configuration for the service.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    /// Directory holding one JSON file per policy record.
    pub policy_dir: PathBuf,
    pub engine: EngineSettings,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let host = env::var("INCENTIVE_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("INCENTIVE_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;
        let policy_dir =
            PathBuf::from(env::var("INCENTIVE_POLICY_DIR").unwrap_or_else(|_| "policies".to_string()));
        let log_level = env::var("INCENTIVE_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let research_policy_cutover = match env::var("INCENTIVE_POLICY_CUTOVER") {
            Ok(raw) => NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
                .map_err(|source| ConfigError::InvalidCutover { value: raw, source })?,
            Err(_) => default_research_cutover(),
        };

        Ok(Self {
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            policy_dir,
            engine: EngineSettings {
                research_policy_cutover,
            },
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("INCENTIVE_PORT must be a valid u16")]
    InvalidPort,
    #[error("INCENTIVE_HOST must parse to an IPv4 or IPv6 address")]
    InvalidHost {
        #[source]
        source: std::net::AddrParseError,
    },
    #[error("INCENTIVE_POLICY_CUTOVER '{value}' is not a YYYY-MM-DD date")]
    InvalidCutover {
        value: String,
        #[source]
        source: chrono::ParseError,
    },
}
