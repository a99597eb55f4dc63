//! Telemetry endpoint and invocation defaults.
//!
//! Centralized static configuration: where reports go, where local state lives,
//! and the environment variables the reporter honours.

use std::path::PathBuf;
use std::time::Duration;

/// Collection endpoint used when none is configured
pub const DEFAULT_TELEMETRY_URL: &str = "https://check.percona.com/v1/telemetry/GenericReport";

/// State file used when none is configured
pub const DEFAULT_CONFIG_FILE_PATH: &str = "/usr/local/percona/telemetry_uuid";

/// Connect timeout used when none is configured
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(10);

pub const PRODUCT_FAMILY_ENV: &str = "PERCONA_PRODUCT_FAMILY";
pub const PRODUCT_VERSION_ENV: &str = "PERCONA_PRODUCT_VERSION";
pub const OPERATING_SYSTEM_ENV: &str = "PERCONA_OPERATING_SYSTEM";
pub const DEPLOYMENT_METHOD_ENV: &str = "PERCONA_DEPLOYMENT_METHOD";
pub const INSTANCE_ID_ENV: &str = "PERCONA_INSTANCE_ID";
pub const CONFIG_FILE_PATH_ENV: &str = "PERCONA_TELEMETRY_CONFIG_FILE_PATH";
pub const TELEMETRY_URL_ENV: &str = "PERCONA_TELEMETRY_URL";
pub const SEND_TIMEOUT_ENV: &str = "PERCONA_SEND_TIMEOUT";
pub const LOG_LEVEL_ENV: &str = "PERCONA_TELEMETRY_LOG_LEVEL";

/// Master switch; any value other than empty or `0` disables reporting
pub const TELEMETRY_DISABLE_ENV: &str = "PERCONA_TELEMETRY_DISABLE";

/// Default state file path
#[inline]
pub fn default_config_file_path() -> PathBuf {
    PathBuf::from(DEFAULT_CONFIG_FILE_PATH)
}

/// Check the master disable switch in the process environment.
pub fn telemetry_disabled() -> bool {
    disable_switch_set(std::env::var(TELEMETRY_DISABLE_ENV).ok().as_deref())
}

fn disable_switch_set(value: Option<&str>) -> bool {
    match value.map(str::trim) {
        None | Some("") | Some("0") => false,
        Some(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_url() {
        assert!(DEFAULT_TELEMETRY_URL.starts_with("https://"));
        assert!(DEFAULT_TELEMETRY_URL.ends_with("/GenericReport"));
    }

    #[test]
    fn test_default_timeout() {
        assert_eq!(DEFAULT_SEND_TIMEOUT, Duration::from_secs(10));
    }

    #[test]
    fn test_default_config_file_path() {
        let path = default_config_file_path();
        assert!(path.to_string_lossy().contains("telemetry_uuid"));
    }

    #[test]
    fn test_disable_switch_values() {
        assert!(!disable_switch_set(None));
        assert!(!disable_switch_set(Some("")));
        assert!(!disable_switch_set(Some("0")));
        assert!(!disable_switch_set(Some(" 0 ")));
        assert!(disable_switch_set(Some("1")));
        assert!(disable_switch_set(Some("yes")));
        assert!(disable_switch_set(Some("false")));
    }
}
