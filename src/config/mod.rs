//! Configuration module for the reviewer backend.
//!
//! All configuration is loaded from environment variables (optionally seeded
//! from a `.env` file) with sensible defaults.

use std::env;
use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::models::{MemberRole, MemberStatus};
use crate::review::EligibilityRuleSet;

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to SQLite database file
    pub db_path: PathBuf,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    pub log_format: LogFormat,
    /// Reviewer eligibility rules, fixed for the process lifetime
    pub rules: EligibilityRuleSet,
}

/// A configuration value that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    pub var: &'static str,
    pub reason: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}: {}", self.var, self.reason)
    }
}

impl std::error::Error for ConfigError {}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let db_path = lookup("PRR_DB_PATH")
            .unwrap_or_else(|| "./data/reviewers.sqlite".to_string())
            .into();

        let bind_addr_raw =
            lookup("PRR_BIND_ADDR").unwrap_or_else(|| "127.0.0.1:8080".to_string());
        let bind_addr = bind_addr_raw.parse().map_err(|e| ConfigError {
            var: "PRR_BIND_ADDR",
            reason: format!("{:?}: {}", bind_addr_raw, e),
        })?;

        let log_level = lookup("PRR_LOG_LEVEL").unwrap_or_else(|| "info".to_string());

        let log_format = match lookup("PRR_LOG_FORMAT").as_deref().map(str::trim) {
            None | Some("") | Some("text") => LogFormat::Text,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(ConfigError {
                    var: "PRR_LOG_FORMAT",
                    reason: format!("expected text or json, got {:?}", other),
                })
            }
        };

        let allow_reuse = match lookup("PRR_ALLOWED_REUSE_TO_REASSIGN") {
            None => false,
            Some(raw) => parse_bool(&raw).ok_or_else(|| ConfigError {
                var: "PRR_ALLOWED_REUSE_TO_REASSIGN",
                reason: format!("expected a boolean, got {:?}", raw),
            })?,
        };

        let statuses = parse_list::<MemberStatus>(
            "PRR_ALLOWED_STATUSES_TO_REASSIGN",
            lookup("PRR_ALLOWED_STATUSES_TO_REASSIGN"),
            "active",
        )?;
        let roles = parse_list::<MemberRole>(
            "PRR_ALLOWED_ROLES_TO_REASSIGN",
            lookup("PRR_ALLOWED_ROLES_TO_REASSIGN"),
            "default",
        )?;

        Ok(Self {
            db_path,
            bind_addr,
            log_level,
            log_format,
            rules: EligibilityRuleSet::new(allow_reuse, statuses, roles),
        })
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse a comma separated list. An explicitly empty value yields an empty
/// list, which makes every candidate ineligible.
fn parse_list<T>(
    var: &'static str,
    raw: Option<String>,
    default: &str,
) -> Result<Vec<T>, ConfigError>
where
    T: std::str::FromStr<Err = String>,
{
    let raw = raw.unwrap_or_else(|| default.to_string());
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<T>().map_err(|reason| ConfigError { var, reason }))
        .collect()
}
