//! API Configuration Module
//!
//! Configuration is loaded from environment variables with development
//! defaults. The command TTL set here is stamped onto every command at
//! enqueue time; changing it later affects only new commands.

// ============================================================================
// API CONFIGURATION
// ============================================================================

/// API configuration for binding, dispatch TTL, and CORS.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Interface to bind the HTTP listener to.
    pub bind_host: String,

    /// Port to bind the HTTP listener to.
    pub port: u16,

    /// Seconds a queued command may wait before it expires undelivered.
    pub command_ttl_secs: i64,

    /// Allowed CORS origins (comma-separated in env var).
    /// Empty means allow all origins (dev mode).
    pub cors_origins: Vec<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_host: "0.0.0.0".to_string(),
            port: 8080,
            command_ttl_secs: 30,
            cors_origins: Vec::new(), // Empty = allow all
        }
    }
}

impl ApiConfig {
    /// Create ApiConfig from environment variables.
    ///
    /// Environment variables:
    /// - `RELAY_BIND`: bind interface (default: 0.0.0.0)
    /// - `PORT` / `RELAY_PORT`: listener port (default: 8080)
    /// - `RELAY_COMMAND_TTL_SECS`: command delivery TTL (default: 30)
    /// - `RELAY_CORS_ORIGINS`: comma-separated allowed origins (empty = allow all)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let bind_host = std::env::var("RELAY_BIND").unwrap_or(defaults.bind_host);

        let port = std::env::var("PORT")
            .ok()
            .or_else(|| std::env::var("RELAY_PORT").ok())
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.port);

        let command_ttl_secs = std::env::var("RELAY_COMMAND_TTL_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .filter(|ttl| *ttl > 0)
            .unwrap_or(defaults.command_ttl_secs);

        let cors_origins = std::env::var("RELAY_CORS_ORIGINS")
            .ok()
            .map(|s| {
                s.split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Self {
            bind_host,
            port,
            command_ttl_secs,
            cors_origins,
        }
    }

    /// Check if running in production mode (strict CORS).
    pub fn is_production(&self) -> bool {
        !self.cors_origins.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ApiConfig::default();
        assert_eq!(config.bind_host, "0.0.0.0");
        assert_eq!(config.port, 8080);
        assert_eq!(config.command_ttl_secs, 30);
        assert!(config.cors_origins.is_empty());
        assert!(!config.is_production());
    }

    #[test]
    fn test_is_production() {
        let mut config = ApiConfig::default();
        config.cors_origins = vec!["https://ops.relay.sh".to_string()];
        assert!(config.is_production());
    }
}
