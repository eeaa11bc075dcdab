use std::env;
use std::time::Duration;

use crate::error::BridgeError;

/// Bridge configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    /// How long a kernel round trip may take before it is reported as failed
    pub commit_timeout: Duration,
    /// Buffered shell events per grid instance
    pub report_channel_capacity: usize,
    /// Default `tracing` filter when `RUST_LOG` is unset
    pub log_filter: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            commit_timeout: Duration::from_millis(10_000),
            report_channel_capacity: 64,
            log_filter: "endogrid=info".to_string(),
        }
    }
}

impl BridgeConfig {
    /// Load configuration from environment variables, reading `.env` first
    pub fn from_env() -> Result<Self, BridgeError> {
        dotenvy::dotenv().ok();
        Self::from_vars(|name| env::var(name).ok())
    }

    /// Load configuration from any variable source
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, BridgeError> {
        let defaults = Self::default();

        let commit_timeout = match lookup("ENDOGRID_COMMIT_TIMEOUT_MS") {
            Some(value) => Duration::from_millis(parse_number(
                "ENDOGRID_COMMIT_TIMEOUT_MS",
                &value,
            )?),
            None => defaults.commit_timeout,
        };
        let report_channel_capacity = match lookup("ENDOGRID_REPORT_CHANNEL_CAPACITY") {
            Some(value) => {
                let capacity = parse_number("ENDOGRID_REPORT_CHANNEL_CAPACITY", &value)?;
                if capacity == 0 {
                    return Err(BridgeError::Config(
                        "ENDOGRID_REPORT_CHANNEL_CAPACITY must be at least 1".to_string(),
                    ));
                }
                capacity as usize
            }
            None => defaults.report_channel_capacity,
        };
        let log_filter = lookup("ENDOGRID_LOG").unwrap_or(defaults.log_filter);

        Ok(Self {
            commit_timeout,
            report_channel_capacity,
            log_filter,
        })
    }
}

fn parse_number(name: &str, value: &str) -> Result<u64, BridgeError> {
    value
        .trim()
        .parse()
        .map_err(|e| BridgeError::Config(format!("{} = {:?}: {}", name, value, e)))
}
