//! Live interceptor handle for hot reload.
//!
//! Each call loads one snapshot and keeps it until the call finishes, so a
//! reload never switches strategy in the middle of a call.

use std::sync::Arc;

use arc_swap::ArcSwap;
use tokio::sync::mpsc;

use crate::config::RouterFileConfig;
use crate::error::RouteError;
use crate::routing::interceptor::RouteInterceptor;
use crate::strategy::RoutingStrategy;

/// Atomically swappable [`RouteInterceptor`].
#[derive(Debug)]
pub struct SharedInterceptor {
    current: ArcSwap<RouteInterceptor>,
    custom: Option<Arc<dyn RoutingStrategy>>,
}

impl SharedInterceptor {
    pub fn new(interceptor: RouteInterceptor) -> Self {
        Self {
            current: ArcSwap::from_pointee(interceptor),
            custom: None,
        }
    }

    /// Build from a file config. `custom` is reused on every reload.
    pub fn from_config(
        config: &RouterFileConfig,
        custom: Option<Arc<dyn RoutingStrategy>>,
    ) -> Result<Self, RouteError> {
        let interceptor = build(config, custom.clone())?;
        Ok(Self {
            current: ArcSwap::from_pointee(interceptor),
            custom,
        })
    }

    /// The interceptor to use for one call.
    pub fn load(&self) -> Arc<RouteInterceptor> {
        self.current.load_full()
    }

    /// Rebuild from `config` and swap it in. On error the current interceptor stays.
    pub fn apply(&self, config: &RouterFileConfig) -> Result<(), RouteError> {
        let next = build(config, self.custom.clone())?;
        self.current.store(Arc::new(next));
        Ok(())
    }

    /// Apply updates until the sender side closes.
    pub async fn follow(self: Arc<Self>, mut updates: mpsc::UnboundedReceiver<RouterFileConfig>) {
        while let Some(config) = updates.recv().await {
            match self.apply(&config) {
                Ok(()) => tracing::info!(
                    strategy = %config.router.strategy,
                    shard_count = config.router.shard_count,
                    table_count = config.router.table_count,
                    "Routing configuration reloaded"
                ),
                Err(e) => {
                    tracing::error!(error = %e, "Rejected routing configuration, keeping current")
                }
            }
        }
        tracing::debug!("Config update channel closed");
    }
}

fn build(
    config: &RouterFileConfig,
    custom: Option<Arc<dyn RoutingStrategy>>,
) -> Result<RouteInterceptor, RouteError> {
    Ok(RouteInterceptor::with_custom(config.router.clone(), custom)?
        .with_metrics(config.observability.metrics_enabled))
}
