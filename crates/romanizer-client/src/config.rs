//! Client configuration and validation.
//!
//! # Design
//! - Defaults mirror the cadence the web client has always used so servers see
//!   the same request rate regardless of front end.
//! - Validation is explicit and reports the offending field.

use std::time::Duration;

use thiserror::Error;
use url::Url;

/// Timeout applied to each HTTP request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
/// Delay between track status polls.
pub const DEFAULT_HYDRATION_INTERVAL: Duration = Duration::from_millis(3_000);
/// Status polls allowed before pending slots are timed out.
pub const DEFAULT_HYDRATION_MAX_ATTEMPTS: u32 = 30;
/// Delay between job status polls.
pub const DEFAULT_PRIMING_INTERVAL: Duration = Duration::from_millis(2_000);

/// Structured errors emitted during configuration validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Field contained an invalid value.
    #[error("invalid value for '{field}': {reason}")]
    InvalidField {
        /// Field that failed validation.
        field: &'static str,
        /// Human-readable reason for the failure.
        reason: &'static str,
        /// Offending value when available.
        value: Option<String>,
    },
}

/// Polling cadence for page hydration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HydrationSettings {
    /// Delay between polls.
    pub interval: Duration,
    /// Poll budget before pending slots are force-failed.
    pub max_attempts: u32,
}

impl Default for HydrationSettings {
    fn default() -> Self {
        Self {
            interval: DEFAULT_HYDRATION_INTERVAL,
            max_attempts: DEFAULT_HYDRATION_MAX_ATTEMPTS,
        }
    }
}

/// Polling cadence for background job progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrimingSettings {
    /// Delay between polls.
    pub interval: Duration,
}

impl Default for PrimingSettings {
    fn default() -> Self {
        Self {
            interval: DEFAULT_PRIMING_INTERVAL,
        }
    }
}

/// Top-level configuration for talking to a Romanizer backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Backend origin, e.g. `http://127.0.0.1:5000/`.
    pub base_url: Url,
    /// Per-request timeout.
    pub request_timeout: Duration,
    /// Track page hydration cadence.
    pub hydration: HydrationSettings,
    /// Job progress cadence.
    pub priming: PrimingSettings,
}

impl ClientConfig {
    /// Build a configuration for `base_url` with default cadences.
    #[must_use]
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            hydration: HydrationSettings::default(),
            priming: PrimingSettings::default(),
        }
    }

    /// Check every field for values the coordinators cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidField`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !matches!(self.base_url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidField {
                field: "base_url",
                reason: "scheme must be http or https",
                value: Some(self.base_url.to_string()),
            });
        }
        if self.base_url.cannot_be_a_base() {
            return Err(ConfigError::InvalidField {
                field: "base_url",
                reason: "must be an absolute base URL",
                value: Some(self.base_url.to_string()),
            });
        }
        ensure_positive("request_timeout", self.request_timeout)?;
        ensure_positive("hydration.interval", self.hydration.interval)?;
        ensure_positive("priming.interval", self.priming.interval)?;
        if self.hydration.max_attempts == 0 {
            return Err(ConfigError::InvalidField {
                field: "hydration.max_attempts",
                reason: "must be at least 1",
                value: Some("0".to_string()),
            });
        }
        Ok(())
    }
}

fn ensure_positive(field: &'static str, value: Duration) -> Result<(), ConfigError> {
    if value.is_zero() {
        return Err(ConfigError::InvalidField {
            field,
            reason: "must be greater than zero",
            value: Some(format!("{value:?}")),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> ClientConfig {
        ClientConfig::new(Url::parse("http://127.0.0.1:5000/").expect("static url"))
    }

    #[test]
    fn defaults_match_web_client_cadence() {
        let config = base();
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert_eq!(config.hydration.interval, Duration::from_millis(3_000));
        assert_eq!(config.hydration.max_attempts, 30);
        assert_eq!(config.priming.interval, Duration::from_millis(2_000));
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn validate_rejects_zero_values() {
        let mut config = base();
        config.hydration.max_attempts = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidField { field: "hydration.max_attempts", .. })
        ));

        let mut config = base();
        config.priming.interval = Duration::ZERO;
        let err = config.validate().expect_err("zero interval rejected");
        assert_eq!(
            err.to_string(),
            "invalid value for 'priming.interval': must be greater than zero"
        );
    }

    #[test]
    fn validate_rejects_non_http_scheme() {
        let config = ClientConfig::new(Url::parse("ftp://example.com/").expect("static url"));
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidField { field: "base_url", .. })
        ));
    }
}
