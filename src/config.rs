use anyhow::{Context, Result, anyhow};
use chrono::FixedOffset;
use std::env;
use std::str::FromStr;
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,
    pub api_prefix: String,
    pub log_dir: String,

    // Rate limiting
    pub rate_check_in_per_min: u32,
    pub rate_protected_per_min: u32,

    /// Offset, in minutes east of UTC, that decides which calendar day a
    /// check-in belongs to.
    pub attendance_utc_offset_minutes: i32,
    pub branch_cache_ttl_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup; `from_env` passes the process
    /// environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |key: &str| lookup(key).with_context(|| format!("{key} must be set"));

        let config = Self {
            server_addr: required("SERVER_ADDR")?,
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            api_prefix: lookup("API_PREFIX").unwrap_or_else(|| "/api".to_string()),
            log_dir: lookup("LOG_DIR").unwrap_or_else(|| "logs".to_string()),

            rate_check_in_per_min: parse_or(&lookup, "RATE_CHECK_IN_PER_MIN", 30)?,
            rate_protected_per_min: parse_or(&lookup, "RATE_PROTECTED_PER_MIN", 1000)?,

            attendance_utc_offset_minutes: parse_or(&lookup, "ATTENDANCE_UTC_OFFSET_MINUTES", 0)?,
            branch_cache_ttl_secs: parse_or(&lookup, "BRANCH_CACHE_TTL_SECS", 300)?,
        };

        // fail at startup rather than on the first check-in
        config.day_offset()?;
        Ok(config)
    }

    pub fn day_offset(&self) -> Result<FixedOffset> {
        FixedOffset::east_opt(self.attendance_utc_offset_minutes * 60).ok_or_else(|| {
            anyhow!(
                "ATTENDANCE_UTC_OFFSET_MINUTES={} is not a valid UTC offset",
                self.attendance_utc_offset_minutes
            )
        })
    }

    pub fn branch_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.branch_cache_ttl_secs)
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key}={raw} is not valid")),
        None => Ok(default),
    }
}
