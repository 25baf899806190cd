use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;

use crate::config::ServerConfig;
use crate::dataset::Datasets;
use crate::rate_limit::RateLimiter;
use crate::settings::SettingsCache;
use crate::store::{CredentialStore, Database, RequestLogStore, SettingsStore};

/// Shared application state: the service objects constructed once at startup
/// and handed to every handler.
pub struct ServerState {
    /// Server configuration
    pub config: Arc<ServerConfig>,

    /// The five category stores (immutable after load)
    pub datasets: Datasets,

    /// Typed settings cache over the durability log
    pub settings: SettingsCache,

    /// Admin identities and bearer tokens
    pub credentials: CredentialStore,

    /// Append-only observability log
    pub request_log: RequestLogStore,

    /// Per-tier token buckets
    pub rate_limiter: RateLimiter,

    /// Prometheus render handle, when metrics are enabled
    pub metrics: Option<PrometheusHandle>,
}

impl ServerState {
    /// Assemble the state: bootstrap the settings cache from the store,
    /// then size the rate-limit tiers from the resulting values.
    pub fn new(config: ServerConfig, db: &Database, datasets: Datasets) -> anyhow::Result<Self> {
        let settings = SettingsCache::bootstrap(SettingsStore::new(db))?;
        let rate_limiter = RateLimiter::from_settings(&settings);

        Ok(Self {
            config: Arc::new(config),
            datasets,
            settings,
            credentials: CredentialStore::new(db),
            request_log: RequestLogStore::new(db),
            rate_limiter,
            metrics: None,
        })
    }

    pub fn with_metrics(mut self, handle: Option<PrometheusHandle>) -> Self {
        self.metrics = handle;
        self
    }
}
