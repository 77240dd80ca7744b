use std::env;

use anyhow::{Context, bail};
use dotenvy::dotenv;

use crate::approval::service::ApprovalPolicy;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,

    // Rate limiting
    pub rate_protected_per_min: u32,

    pub api_prefix: String,

    // Leave passes
    pub uploads_dir: String,
    pub uploads_url_prefix: String,

    pub log_dir: String,

    pub rejection_short_circuits: bool,
    pub enforce_date_order: bool,
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} has an invalid value '{raw}'")),
        None => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup; `from_env` passes the
    /// process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let required = |key: &str| lookup(key).with_context(|| format!("{key} must be set"));

        let rate_protected_per_min = parse_or(&lookup, "RATE_PROTECTED_PER_MIN", 1000u32)?;
        if rate_protected_per_min == 0 {
            bail!("RATE_PROTECTED_PER_MIN must be greater than zero");
        }

        Ok(Self {
            server_addr: required("SERVER_ADDR")?,
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            rate_protected_per_min,
            api_prefix: lookup("API_PREFIX").unwrap_or_else(|| "/api".to_string()),
            uploads_dir: lookup("UPLOADS_DIR").unwrap_or_else(|| "uploads".to_string()),
            uploads_url_prefix: lookup("UPLOADS_URL_PREFIX")
                .unwrap_or_else(|| "/uploads".to_string()),
            log_dir: lookup("LOG_DIR").unwrap_or_else(|| "logs".to_string()),
            rejection_short_circuits: parse_or(&lookup, "REJECTION_SHORT_CIRCUITS", true)?,
            enforce_date_order: parse_or(&lookup, "ENFORCE_DATE_ORDER", true)?,
        })
    }

    pub fn approval_policy(&self) -> ApprovalPolicy {
        ApprovalPolicy {
            rejection_short_circuits: self.rejection_short_circuits,
            enforce_date_order: self.enforce_date_order,
        }
    }
}
