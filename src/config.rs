use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Runtime configuration, read once at startup. The original client
/// shipped as two near-identical builds; everything that differed between
/// them (map origin, data source, whether registration is live) is an
/// environment variable here.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub listen_address: String,
    pub butter_base_url: String,
    /// Coordinate the initial position fetch is centred on.
    pub default_lat: f64,
    pub default_lon: f64,
    pub gtfs_id: String,
    pub notify_endpoint: String,
    /// Build and log trigger payloads without calling the backend.
    pub notify_dry_run: bool,
    pub login_url: String,
    pub credential_store_path: String,
    pub request_timeout: Duration,
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1:?}")]
    Invalid(&'static str, String),
}

fn parse_var<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(value) => value.parse().map_err(|_| ConfigError::Invalid(key, value)),
        Err(_) => Ok(default),
    }
}

fn string_var(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

impl AppConfig {
    pub fn from_env() -> Result<AppConfig, ConfigError> {
        Ok(AppConfig {
            listen_address: string_var("LISTEN_ADDRESS", "127.0.0.1:8080"),
            butter_base_url: string_var("BUTTER_BASE_URL", "https://butter.takoyaki3.com/v1/"),
            default_lat: parse_var("DEFAULT_LAT", 26.223_3)?,
            default_lon: parse_var("DEFAULT_LON", 127.691_028)?,
            gtfs_id: string_var("GTFS_ID", "yanbaru-expressbus"),
            notify_endpoint: string_var(
                "NOTIFY_ENDPOINT",
                "https://mfp6wj7mv6mf45q6o3tse7v4oe0gzgrp.lambda-url.ap-northeast-1.on.aws/",
            ),
            notify_dry_run: parse_var("NOTIFY_DRY_RUN", false)?,
            login_url: string_var("LOGIN_URL", "https://takoyaki3-auth.web.app"),
            credential_store_path: string_var("CREDENTIAL_STORE_PATH", ".credential"),
            request_timeout: Duration::from_secs(parse_var("REQUEST_TIMEOUT_SECS", 10)?),
        })
    }
}

#[cfg(test)]
mod test {

    use super::*;

    #[test]
    fn test_defaults_apply_without_env() {
        let config = AppConfig::from_env().unwrap();
        assert_eq!(config.gtfs_id, "yanbaru-expressbus");
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert!(!config.notify_dry_run);
    }

    #[test]
    fn test_invalid_number_is_reported() {
        // A key no other code reads; the environment is process-wide
        env::set_var("BUS_NOTIFY_TEST_BAD_NUMBER", "not-a-number");
        let result: Result<f64, _> = parse_var("BUS_NOTIFY_TEST_BAD_NUMBER", 0.0);

        assert!(matches!(
            result,
            Err(ConfigError::Invalid("BUS_NOTIFY_TEST_BAD_NUMBER", _))
        ));
    }
}
