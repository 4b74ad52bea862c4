//! Server configuration, from code or from the environment.

use gatehouse_session::SessionConfig;

/// Set to `True` when the deployment terminates HTTPS.
pub const ENV_HTTPS: &str = "HTTPS";
/// Listen address, e.g. `0.0.0.0:8080`.
pub const ENV_BIND: &str = "GATEHOUSE_BIND";
/// Session lifetime in seconds; `0` disables expiry. Capped at [`MAX_SESSION_TTL_SECS`].
pub const ENV_SESSION_TTL: &str = "GATEHOUSE_SESSION_TTL_SECS";

/// Longest accepted session lifetime: one year.
pub const MAX_SESSION_TTL_SECS: u64 = 365 * 24 * 60 * 60;

/// Listen address used when none is configured.
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";

/// Errors reading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An environment variable held a value that couldn't be parsed.
    #[error("invalid value for {var}: {value:?}")]
    InvalidVar { var: &'static str, value: String },
}

/// Everything the server needs at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address to bind the listener to.
    pub bind_addr: String,

    /// Session lifetime and cookie security.
    pub session: SessionConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            session: SessionConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Sets the bind address.
    pub fn with_bind_addr(mut self, addr: impl Into<String>) -> Self {
        self.bind_addr = addr.into();
        self
    }

    /// Sets the session lifetime. `None` disables expiry.
    pub fn with_session_ttl_secs(mut self, ttl_secs: Option<u64>) -> Self {
        self.session.ttl_secs = ttl_secs;
        self
    }

    /// Marks cookies secure and cross-site (HTTPS deployments).
    pub fn with_secure_cookies(mut self, secure: bool) -> Self {
        self.session.secure_cookies = secure;
        self
    }

    /// Reads the configuration from process environment variables.
    ///
    /// Unset variables keep their defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads the configuration through `lookup`, which maps a variable
    /// name to its value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup(ENV_HTTPS) {
            config.session.secure_cookies = parse_flag(ENV_HTTPS, value)?;
        }
        if let Some(value) = lookup(ENV_BIND) {
            if value.trim().is_empty() {
                return Err(ConfigError::InvalidVar { var: ENV_BIND, value });
            }
            config.bind_addr = value;
        }
        if let Some(value) = lookup(ENV_SESSION_TTL) {
            let secs = match value.trim().parse::<u64>() {
                Ok(secs) if secs <= MAX_SESSION_TTL_SECS => secs,
                _ => {
                    return Err(ConfigError::InvalidVar {
                        var: ENV_SESSION_TTL,
                        value,
                    });
                }
            };
            config.session.ttl_secs = (secs > 0).then_some(secs);
        }

        Ok(config)
    }
}

fn parse_flag(var: &'static str, value: String) -> Result<bool, ConfigError> {
    match value.trim() {
        "True" | "true" | "1" => Ok(true),
        "False" | "false" | "0" | "" => Ok(false),
        _ => Err(ConfigError::InvalidVar { var, value }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn from_vars(vars: &[(&str, &str)]) -> Result<ServerConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|name| map.get(name).cloned())
    }

    #[test]
    fn test_from_lookup_empty_env_uses_defaults() {
        let config = from_vars(&[]).unwrap();
        assert_eq!(config, ServerConfig::default());
        assert!(!config.session.secure_cookies);
    }

    #[test]
    fn test_from_lookup_https_true_enables_secure_cookies() {
        for value in ["True", "true", "1"] {
            let config = from_vars(&[(ENV_HTTPS, value)]).unwrap();
            assert!(config.session.secure_cookies, "{value} should enable");
        }
    }

    #[test]
    fn test_from_lookup_https_false_keeps_lax_cookies() {
        for value in ["False", "false", "0", ""] {
            let config = from_vars(&[(ENV_HTTPS, value)]).unwrap();
            assert!(!config.session.secure_cookies, "{value} should disable");
        }
    }

    #[test]
    fn test_from_lookup_https_garbage_returns_error() {
        let result = from_vars(&[(ENV_HTTPS, "yes please")]);
        assert!(matches!(
            result,
            Err(ConfigError::InvalidVar { var: ENV_HTTPS, .. })
        ));
    }

    #[test]
    fn test_from_lookup_ttl_zero_disables_expiry() {
        let config = from_vars(&[(ENV_SESSION_TTL, "0")]).unwrap();
        assert_eq!(config.session.ttl_secs, None);
    }

    #[test]
    fn test_from_lookup_ttl_and_bind() {
        let config = from_vars(&[
            (ENV_SESSION_TTL, "3600"),
            (ENV_BIND, "0.0.0.0:9000"),
        ])
        .unwrap();
        assert_eq!(config.session.ttl_secs, Some(3600));
        assert_eq!(config.bind_addr, "0.0.0.0:9000");
    }

    #[test]
    fn test_from_lookup_bad_ttl_returns_error() {
        let result = from_vars(&[(ENV_SESSION_TTL, "-5")]);
        assert!(matches!(
            result,
            Err(ConfigError::InvalidVar { var: ENV_SESSION_TTL, .. })
        ));
    }

    #[test]
    fn test_from_lookup_ttl_above_max_returns_error() {
        for value in ["31536001", "18446744073709551615"] {
            let result = from_vars(&[(ENV_SESSION_TTL, value)]);
            assert!(
                matches!(result, Err(ConfigError::InvalidVar { var: ENV_SESSION_TTL, .. })),
                "{value} should be rejected"
            );
        }
    }

    #[test]
    fn test_from_lookup_ttl_at_max_is_accepted() {
        let max = MAX_SESSION_TTL_SECS.to_string();
        let config = from_vars(&[(ENV_SESSION_TTL, max.as_str())]).unwrap();
        assert_eq!(config.session.ttl_secs, Some(MAX_SESSION_TTL_SECS));
    }

    #[test]
    fn test_builder_setters() {
        let config = ServerConfig::default()
            .with_bind_addr("127.0.0.1:0")
            .with_session_ttl_secs(None)
            .with_secure_cookies(true);
        assert_eq!(config.bind_addr, "127.0.0.1:0");
        assert_eq!(config.session.ttl_secs, None);
        assert!(config.session.secure_cookies);
    }
}
