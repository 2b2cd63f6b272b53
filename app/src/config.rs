//! Application configuration, loaded from the environment.

use serde::Deserialize;

fn default_api_base_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

/// Runtime configuration for the attendance tracker client
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Base URL of the remote attendance API
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Per-request timeout for remote calls
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Check patients in immediately when registering walk-ins
    #[serde(default)]
    pub check_in_on_register: bool,
}

impl AppConfig {
    /// Load configuration from `ATTENDANCE_`-prefixed environment variables,
    /// honoring a local `.env` file when present
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenv::dotenv().ok();
        envy::prefixed("ATTENDANCE_").from_env()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
            check_in_on_register: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.api_base_url, "http://localhost:3000");
        assert_eq!(config.request_timeout_secs, 30);
        assert!(!config.check_in_on_register);
    }
}
