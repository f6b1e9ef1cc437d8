use std::time::Duration;

use anyhow::{bail, Context, Result};

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub server_host: String,
    pub server_port: u16,
    /// Longest a single request may take before it is answered with 408.
    pub server_request_timeout: Duration,
    /// How long open connections may keep draining after a shutdown signal.
    pub server_shutdown_timeout: Duration,
    /// Gym occupancy endpoint.
    pub scrape_url: String,
    /// Sent as `Namespace` in the scrape request body.
    pub scrape_gym_name: String,
    pub scrape_gym_id: i64,
    pub scrape_period: Duration,
    /// HTTP timeout of a single scrape.
    pub scrape_timeout: Duration,
    /// How far back from the newest reading the recent cache remembers.
    pub recent_retention: Duration,
    /// How often the recent cache is reloaded from the database.
    pub refresh_period: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            database_url: required("DATABASE_URL")?,
            server_host: optional("SERVER_HOST", "0.0.0.0"),
            server_port: optional("SERVER_PORT", "8080")
                .parse()
                .context("SERVER_PORT must be a valid port number")?,
            server_request_timeout: secs(
                "SERVER_REQUEST_TIMEOUT_SECS",
                &optional("SERVER_REQUEST_TIMEOUT_SECS", "10"),
            )?,
            server_shutdown_timeout: secs(
                "SERVER_SHUTDOWN_TIMEOUT_SECS",
                &optional("SERVER_SHUTDOWN_TIMEOUT_SECS", "10"),
            )?,
            scrape_url: required("SCRAPE_URL")?,
            scrape_gym_name: required("SCRAPE_GYM_NAME")?,
            scrape_gym_id: required("SCRAPE_GYM_ID")?
                .parse()
                .context("SCRAPE_GYM_ID must be an integer")?,
            scrape_period: secs("SCRAPE_PERIOD_SECS", &optional("SCRAPE_PERIOD_SECS", "300"))?,
            scrape_timeout: secs("SCRAPE_TIMEOUT_SECS", &optional("SCRAPE_TIMEOUT_SECS", "10"))?,
            // one week
            recent_retention: secs(
                "RECENT_RETENTION_SECS",
                &optional("RECENT_RETENTION_SECS", "604800"),
            )?,
            refresh_period: secs("REFRESH_PERIOD_SECS", &optional("REFRESH_PERIOD_SECS", "3600"))?,
        })
    }
}

/// Parse a strictly positive number of seconds.
fn secs(key: &str, raw: &str) -> Result<Duration> {
    let n: u64 = raw
        .trim()
        .parse()
        .with_context(|| format!("{key} must be a positive integer, got: {raw:?}"))?;
    if n == 0 {
        bail!("{key} must be a positive integer, got: {raw:?}");
    }
    Ok(Duration::from_secs(n))
}

fn required(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("missing required env var: {key}"))
}

fn optional(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secs_parses_positive_integers() {
        assert_eq!(secs("X", "300").unwrap(), Duration::from_secs(300));
        assert_eq!(secs("X", " 7 ").unwrap(), Duration::from_secs(7));
    }

    #[test]
    fn secs_rejects_zero() {
        let err = secs("REFRESH_PERIOD_SECS", "0").unwrap_err();
        assert!(err.to_string().contains("REFRESH_PERIOD_SECS must be a positive integer"));
    }

    #[test]
    fn secs_rejects_negative_and_garbage() {
        assert!(secs("X", "-5").is_err());
        assert!(secs("X", "1h").is_err());
        assert!(secs("X", "").is_err());
    }

    #[test]
    fn optional_falls_back_to_default() {
        assert_eq!(
            optional("SPUTNIK_TEST_SURELY_UNSET_VARIABLE", "fallback"),
            "fallback"
        );
    }

    #[test]
    fn required_names_the_missing_variable() {
        let err = required("SPUTNIK_TEST_SURELY_UNSET_VARIABLE").unwrap_err();
        assert!(err
            .to_string()
            .contains("missing required env var: SPUTNIK_TEST_SURELY_UNSET_VARIABLE"));
    }
}
