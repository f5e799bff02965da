use std::env;
use std::time::Duration;

use chrono::FixedOffset;

use crate::models::Station;

pub const DEFAULT_KMA_SNOW_URL: &str = "https://apihub.kma.go.kr/api/typ01/url/kma_snow1.php";
pub const DEFAULT_STATIONS: &str = "140=군산,886=군산산단";

const MIN_TIMEOUT_SECS: u64 = 3;
const MAX_TIMEOUT_SECS: u64 = 15;
const MIN_WORKERS: usize = 2;
const MAX_WORKERS: usize = 10;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable {0}")]
    Missing(&'static str),
    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },
    #[error("Invalid station table entry: {0}")]
    InvalidStation(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub kma_url: String,
    pub auth_key: String,
    pub request_timeout_secs: u64,
    pub fetch_workers: usize,
    pub utc_offset: FixedOffset,
    pub stations: Vec<Station>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let utc_offset_hours: i32 = parse_var("UTC_OFFSET_HOURS", 9)?;
        let utc_offset = utc_offset_from_hours(utc_offset_hours).ok_or(ConfigError::InvalidValue {
            name: "UTC_OFFSET_HOURS",
            value: utc_offset_hours.to_string(),
        })?;

        Ok(Config {
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            server_port: parse_var("SERVER_PORT", 8080)?,
            kma_url: env::var("KMA_SNOW_URL").unwrap_or_else(|_| DEFAULT_KMA_SNOW_URL.to_string()),
            auth_key: env::var("KMA_AUTH_KEY").map_err(|_| ConfigError::Missing("KMA_AUTH_KEY"))?,
            request_timeout_secs: clamp_timeout_secs(parse_var("REQUEST_TIMEOUT_SECS", 5)?),
            fetch_workers: clamp_workers(parse_var("FETCH_WORKERS", MAX_WORKERS)?),
            utc_offset,
            stations: parse_stations(
                &env::var("STATIONS").unwrap_or_else(|_| DEFAULT_STATIONS.to_string()),
            )?,
        })
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn parse_var<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { name, value }),
        Err(_) => Ok(default),
    }
}

pub fn clamp_timeout_secs(secs: u64) -> u64 {
    secs.clamp(MIN_TIMEOUT_SECS, MAX_TIMEOUT_SECS)
}

pub fn clamp_workers(workers: usize) -> usize {
    workers.clamp(MIN_WORKERS, MAX_WORKERS)
}

pub fn utc_offset_from_hours(hours: i32) -> Option<FixedOffset> {
    FixedOffset::east_opt(hours.checked_mul(3600)?)
}

/// Parse a `code=name,code=name` station table, keeping its order
pub fn parse_stations(value: &str) -> Result<Vec<Station>, ConfigError> {
    let mut stations: Vec<Station> = Vec::new();

    for entry in value.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let (code, name) = entry
            .split_once('=')
            .ok_or_else(|| ConfigError::InvalidStation(entry.to_string()))?;
        let (code, name) = (code.trim(), name.trim());

        if code.is_empty() || name.is_empty() || stations.iter().any(|s| s.code == code) {
            return Err(ConfigError::InvalidStation(entry.to_string()));
        }
        stations.push(Station::new(code, name));
    }

    if stations.is_empty() {
        return Err(ConfigError::InvalidStation(value.to_string()));
    }
    Ok(stations)
}
