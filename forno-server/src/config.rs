//! Server configuration

use std::time::Duration;

use crate::error::BoxError;

/// Server configuration, loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection URL
    pub database_url: String,
    /// HTTP port
    pub http_port: u16,
    /// Environment: development | staging | production
    pub environment: String,
    /// JWT secret for admin authentication
    pub jwt_secret: String,
    /// Stripe secret key
    pub stripe_secret_key: String,
    /// Stripe webhook signing secret
    pub stripe_webhook_secret: String,
    /// ISO currency code used for payment intents
    pub stripe_currency: String,
    /// Google Geocoding API key; geolocation is unavailable without it
    pub geocoding_api_key: Option<String>,
    /// Record every accepted status change in order_status_history
    pub order_history_enabled: bool,
    /// TTL applied to catalog reads
    pub cache_default_ttl: Duration,
    /// Entry bound enforced by the background sweep
    pub cache_max_entries: usize,
    /// Interval between cache sweeps
    pub cache_sweep_interval: Duration,
    /// Directory for daily-rolling log files (stdout when unset)
    pub log_dir: Option<String>,
    /// Emit JSON log lines
    pub log_json: bool,
    /// Behind a reverse proxy that appends the client address to
    /// X-Forwarded-For; when false the header is ignored
    pub trust_proxy: bool,
    /// Bootstrap admin created when admin_users is empty
    pub admin_username: Option<String>,
    pub admin_password: Option<String>,
}

impl Config {
    /// Require a secret env var: must be set and non-empty in non-development environments.
    fn require_secret(name: &str, environment: &str) -> Result<String, BoxError> {
        Self::secret_from(std::env::var(name).ok(), name, environment)
    }

    fn secret_from(
        value: Option<String>,
        name: &str,
        environment: &str,
    ) -> Result<String, BoxError> {
        let val = match value {
            Some(v) => v,
            None => {
                if environment != "development" {
                    return Err(format!("{name} must be set in {environment} environment").into());
                }
                format!("dev-{name}-not-for-production")
            }
        };
        if val.is_empty() && environment != "development" {
            return Err(format!("{name} must not be empty in {environment} environment").into());
        }
        Ok(val)
    }

    fn parse_or<T: std::str::FromStr>(name: &str, default: T) -> T {
        std::env::var(name)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    fn flag(name: &str, default: bool) -> bool {
        match std::env::var(name) {
            Ok(v) => parse_flag(&v).unwrap_or(default),
            Err(_) => default,
        }
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, BoxError> {
        let environment = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into());

        Ok(Self {
            database_url: std::env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set")?,
            http_port: Self::parse_or("HTTP_PORT", 8080),
            environment: environment.clone(),
            jwt_secret: Self::require_secret("JWT_SECRET", &environment)?,
            stripe_secret_key: Self::require_secret("STRIPE_SECRET_KEY", &environment)?,
            stripe_webhook_secret: Self::require_secret("STRIPE_WEBHOOK_SECRET", &environment)?,
            stripe_currency: std::env::var("STRIPE_CURRENCY").unwrap_or_else(|_| "eur".into()),
            geocoding_api_key: std::env::var("GEOCODING_API_KEY")
                .ok()
                .filter(|s| !s.is_empty()),
            order_history_enabled: Self::flag("ORDER_HISTORY_ENABLED", true),
            cache_default_ttl: Duration::from_secs(Self::parse_or("CACHE_DEFAULT_TTL_SECS", 300)),
            cache_max_entries: Self::parse_or("CACHE_MAX_ENTRIES", 1000),
            cache_sweep_interval: Duration::from_secs(Self::parse_or("CACHE_SWEEP_SECS", 60)),
            log_dir: std::env::var("LOG_DIR").ok().filter(|s| !s.is_empty()),
            log_json: std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json")),
            trust_proxy: Self::flag("TRUST_PROXY", false),
            admin_username: std::env::var("ADMIN_USERNAME").ok().filter(|s| !s.is_empty()),
            admin_password: std::env::var("ADMIN_PASSWORD").ok().filter(|s| !s.is_empty()),
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_defaults_in_development() {
        let val = Config::secret_from(None, "JWT_SECRET", "development").unwrap();
        assert_eq!(val, "dev-JWT_SECRET-not-for-production");
    }

    #[test]
    fn test_secret_required_outside_development() {
        assert!(Config::secret_from(None, "JWT_SECRET", "production").is_err());
        assert!(Config::secret_from(Some(String::new()), "JWT_SECRET", "staging").is_err());
        assert_eq!(
            Config::secret_from(Some("s3cret".into()), "JWT_SECRET", "production").unwrap(),
            "s3cret"
        );
    }

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag("TRUE"), Some(true));
        assert_eq!(parse_flag(" off "), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }
}
