//! Application state

use std::sync::Arc;

use sqlx::PgPool;

use crate::auth::RateLimiter;
use crate::cache::TtlCache;
use crate::config::Config;
use crate::error::BoxError;
use crate::geo::{Geocoder, GoogleGeocoder};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// PostgreSQL connection pool
    pub pool: PgPool,
    /// JWT secret for admin authentication
    pub jwt_secret: String,
    /// Stripe secret key
    pub stripe_secret_key: String,
    /// Stripe webhook signing secret
    pub stripe_webhook_secret: String,
    pub stripe_currency: String,
    /// Record accepted status changes in order_status_history
    pub order_history_enabled: bool,
    /// Catalog, zone and settings reads (JSON values)
    pub cache: TtlCache<serde_json::Value>,
    /// None when no geocoding key is configured
    pub geocoder: Option<Arc<dyn Geocoder>>,
    /// Outbound HTTP client (Stripe, geocoding)
    pub http: reqwest::Client,
    /// Rate limiter for the admin login route
    pub rate_limiter: RateLimiter,
    /// Take the client IP from X-Forwarded-For
    pub trust_proxy: bool,
}

impl AppState {
    /// Connect, run migrations and bootstrap the first admin account
    pub async fn new(config: &Config) -> Result<Self, BoxError> {
        let pool = PgPool::connect(&config.database_url).await?;

        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("Database migrations applied");

        let state = Self::with_pool(config, pool)?;
        state.bootstrap_admin(config).await?;
        Ok(state)
    }

    /// Build state around an existing pool (no I/O)
    pub fn with_pool(config: &Config, pool: PgPool) -> Result<Self, BoxError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("forno-server/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let geocoder: Option<Arc<dyn Geocoder>> = match &config.geocoding_api_key {
            Some(key) => Some(Arc::new(GoogleGeocoder::new(http.clone(), key.clone()))),
            None => {
                tracing::warn!("GEOCODING_API_KEY not set, delivery quotes use the fallback fee");
                None
            }
        };

        Ok(Self {
            pool,
            jwt_secret: config.jwt_secret.clone(),
            stripe_secret_key: config.stripe_secret_key.clone(),
            stripe_webhook_secret: config.stripe_webhook_secret.clone(),
            stripe_currency: config.stripe_currency.to_lowercase(),
            order_history_enabled: config.order_history_enabled,
            cache: TtlCache::new(config.cache_default_ttl, config.cache_max_entries),
            geocoder,
            http,
            rate_limiter: RateLimiter::new(),
            trust_proxy: config.trust_proxy,
        })
    }

    /// Replace the geocoder (tests, alternative providers)
    pub fn with_geocoder(mut self, geocoder: Arc<dyn Geocoder>) -> Self {
        self.geocoder = Some(geocoder);
        self
    }

    async fn bootstrap_admin(&self, config: &Config) -> Result<(), BoxError> {
        let (Some(username), Some(password)) = (&config.admin_username, &config.admin_password)
        else {
            return Ok(());
        };
        if crate::db::admins::count(&self.pool).await? > 0 {
            return Ok(());
        }
        let hash = crate::util::hash_password(password).map_err(|e| format!("hash: {e}"))?;
        crate::db::admins::create(&self.pool, username, &hash, shared::util::now_millis()).await?;
        tracing::info!(username = %username, "Bootstrap admin account created");
        Ok(())
    }
}
