//! Service configuration from environment variables

use crate::db::{ParseSideError, Side};
use crate::line::DEFAULT_API_BASE;
use chrono_tz::Tz;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_TIMEZONE: Tz = chrono_tz::Asia::Taipei;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;
const DEFAULT_DB_BUSY_TIMEOUT_MS: u64 = 5000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has invalid value {value:?}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
    #[error("WHEREABOUTS_INITIAL_SIDE: {0}")]
    Side(#[from] ParseSideError),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub channel_secret: String,
    pub channel_access_token: String,
    pub db_path: PathBuf,
    pub port: u16,
    /// Reference timezone for deciding what "today" is
    pub timezone: Tz,
    /// Side stored on the very first day
    pub initial_side: Side,
    pub api_base: String,
    pub http_timeout: Duration,
    pub db_busy_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let channel_secret = get("CHANNEL_SECRET").ok_or(ConfigError::Missing("CHANNEL_SECRET"))?;
        let channel_access_token =
            get("CHANNEL_ACCESS_TOKEN").ok_or(ConfigError::Missing("CHANNEL_ACCESS_TOKEN"))?;

        let db_path = get("WHEREABOUTS_DB_PATH").map_or_else(
            || {
                let home = get("HOME").unwrap_or_else(|| "/tmp".to_string());
                PathBuf::from(home).join(".whereabouts").join("whereabouts.db")
            },
            PathBuf::from,
        );

        let port = match get("PORT") {
            Some(p) => p.trim().parse::<u16>().map_err(|e: std::num::ParseIntError| {
                ConfigError::Invalid {
                    name: "PORT",
                    value: p.clone(),
                    reason: e.to_string(),
                }
            })?,
            None => DEFAULT_PORT,
        };

        let timezone = match get("WHEREABOUTS_TIMEZONE") {
            Some(tz) => tz.trim().parse::<Tz>().map_err(|e| ConfigError::Invalid {
                name: "WHEREABOUTS_TIMEZONE",
                value: tz.clone(),
                reason: e.to_string(),
            })?,
            None => DEFAULT_TIMEZONE,
        };

        let initial_side = match get("WHEREABOUTS_INITIAL_SIDE") {
            Some(s) => s.parse::<Side>()?,
            None => Side::Right,
        };

        let api_base = get("LINE_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.to_string());

        let http_timeout = Duration::from_secs(parse_u64(
            &get,
            "WHEREABOUTS_HTTP_TIMEOUT_SECS",
            DEFAULT_HTTP_TIMEOUT_SECS,
        )?);
        let db_busy_timeout = Duration::from_millis(parse_u64(
            &get,
            "WHEREABOUTS_DB_BUSY_TIMEOUT_MS",
            DEFAULT_DB_BUSY_TIMEOUT_MS,
        )?);

        Ok(Self {
            channel_secret,
            channel_access_token,
            db_path,
            port,
            timezone,
            initial_side,
            api_base,
            http_timeout,
            db_busy_timeout,
        })
    }
}

fn parse_u64(
    get: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: u64,
) -> Result<u64, ConfigError> {
    let Some(raw) = get(name) else {
        return Ok(default);
    };
    match raw.trim().parse::<u64>() {
        Ok(0) => Err(ConfigError::Invalid {
            name,
            value: raw,
            reason: "must be greater than zero".to_string(),
        }),
        Ok(n) => Ok(n),
        Err(e) => Err(ConfigError::Invalid {
            name,
            value: raw,
            reason: e.to_string(),
        }),
    }
}
