//! Configuration for the deployer service.

use std::env;

/// Deployer service configuration.
///
/// Built once at startup from the environment and passed into the
/// reconciler; nothing reads environment variables mid-flow.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port.
    pub port: u16,
    /// GitHub token for API calls (repository and file mutations).
    pub github_token: Option<String>,
    /// Shared secret compared against the `secret` field of task requests.
    pub student_secret: Option<String>,
    /// GitHub account that owns the reconciled repositories.
    pub owner: String,
    /// Timeout for the outbound evaluation callback, in seconds.
    pub notify_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(7860),
            github_token: env::var("GITHUB_TOKEN").ok().filter(|s| !s.is_empty()),
            student_secret: env::var("STUDENT_SECRET").ok().filter(|s| !s.is_empty()),
            owner: env::var("GITHUB_OWNER").unwrap_or_else(|_| "23f2004617-oss".to_string()),
            notify_timeout_secs: env::var("NOTIFY_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_default_config() {
        env::remove_var("PORT");
        env::remove_var("GITHUB_TOKEN");
        env::remove_var("STUDENT_SECRET");
        env::remove_var("GITHUB_OWNER");
        env::remove_var("NOTIFY_TIMEOUT_SECS");

        let config = Config::default();
        assert_eq!(config.port, 7860);
        assert!(config.github_token.is_none());
        assert!(config.student_secret.is_none());
        assert_eq!(config.owner, "23f2004617-oss");
        assert_eq!(config.notify_timeout_secs, 10);
    }

    #[test]
    #[serial]
    fn test_config_from_env() {
        env::set_var("PORT", "9000");
        env::set_var("GITHUB_TOKEN", "ghp_test");
        env::set_var("STUDENT_SECRET", "s3cret");
        env::set_var("GITHUB_OWNER", "some-org");
        env::set_var("NOTIFY_TIMEOUT_SECS", "5");

        let config = Config::default();
        assert_eq!(config.port, 9000);
        assert_eq!(config.github_token, Some("ghp_test".to_string()));
        assert_eq!(config.student_secret, Some("s3cret".to_string()));
        assert_eq!(config.owner, "some-org");
        assert_eq!(config.notify_timeout_secs, 5);

        env::remove_var("PORT");
        env::remove_var("GITHUB_TOKEN");
        env::remove_var("STUDENT_SECRET");
        env::remove_var("GITHUB_OWNER");
        env::remove_var("NOTIFY_TIMEOUT_SECS");
    }

    #[test]
    #[serial]
    fn test_empty_values_treated_as_unset() {
        env::set_var("GITHUB_TOKEN", "");
        env::set_var("STUDENT_SECRET", "");

        let config = Config::default();
        assert!(config.github_token.is_none());
        assert!(config.student_secret.is_none());

        env::remove_var("GITHUB_TOKEN");
        env::remove_var("STUDENT_SECRET");
    }
}
