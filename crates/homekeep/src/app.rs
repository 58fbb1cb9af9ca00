use std::sync::Arc;

use anyhow::{Context, Result};
use hk_config::HomeConfig;
use hk_core::StampZone;
use hk_list::{ListService, RecordStore};
use hk_pool::{DevicePoller, HttpStatusSource, PollerConfig, RetryPolicy, StatusLog};
use hk_web::AppState;

/// Storage handles and settings shared by every command.
pub(crate) struct AppContext {
    pub config: HomeConfig,
    pub zone: StampZone,
    pub list: Arc<ListService>,
    pub pool_log: Arc<StatusLog>,
}

impl AppContext {
    pub fn new(config: HomeConfig) -> Result<Self> {
        let zone = config.time.zone().context("Invalid time.zone")?;
        let items_path = config.storage.items_path();
        let pool_log_path = config.storage.pool_log_path();
        tracing::debug!(
            items = %items_path.display(),
            pool_log = %pool_log_path.display(),
            %zone,
            "storage resolved"
        );

        Ok(Self {
            list: Arc::new(ListService::new(RecordStore::new(items_path), zone)),
            pool_log: Arc::new(StatusLog::new(pool_log_path)),
            zone,
            config,
        })
    }

    pub fn app_state(&self) -> AppState {
        AppState {
            list: Arc::clone(&self.list),
            pool_log: Arc::clone(&self.pool_log),
            dashboard_limit: self.config.pool.dashboard_limit,
        }
    }

    pub fn poller_config(&self) -> PollerConfig {
        let pool = &self.config.pool;
        let retry = match pool.backoff_max() {
            Some(max_delay) => RetryPolicy::Backoff { max_delay },
            None => RetryPolicy::Fixed,
        };
        PollerConfig {
            interval: pool.interval(),
            timeout: pool.timeout(),
            retry,
        }
    }

    /// `None` when no `pool.status_url` is configured.
    pub fn build_poller(&self) -> Result<Option<DevicePoller>> {
        let Some(url) = self.config.pool.status_url.as_deref() else {
            return Ok(None);
        };
        let source = HttpStatusSource::new(url, self.config.pool.timeout())
            .with_context(|| format!("Failed to set up status source for {url}"))?;
        Ok(Some(DevicePoller::new(
            Box::new(source),
            Arc::clone(&self.pool_log),
            self.poller_config(),
            self.zone,
        )))
    }
}
