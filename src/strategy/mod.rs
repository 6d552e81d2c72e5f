//! Routing strategy subsystem.
//!
//! # Data Flow
//! ```text
//! Extracted key (string)
//!     → RoutingStrategy::decide:
//!         - modulo.rs (numeric key mod shard/table count)
//!         - hash.rs (stable string hash mod shard/table count)
//!         - custom (user supplied)
//!     → RoutingDecision (padded shard index, optional table index)
//!     → RoutingStrategy::route stores it in RoutingContext
//! ```
//!
//! # Design Decisions
//! - Strategies are stateless apart from the shared config snapshot
//! - Strategy selected once when the interceptor is built
//! - `Time` is recognized but rejected at build time

pub mod hash;
pub mod modulo;

use std::fmt;
use std::sync::Arc;

use crate::config::{IndexFormat, RoutingConfig, StrategyKind};
use crate::error::RouteError;
use crate::routing::context::{RoutingContext, RoutingDecision};

pub use hash::HashStrategy;
pub use modulo::ModStrategy;

/// Turns a raw routing key into a shard/table placement.
pub trait RoutingStrategy: Send + Sync + fmt::Debug {
    /// Label used in logs and metrics.
    fn name(&self) -> &'static str;

    /// Compute the decision for `raw_key` without touching the context.
    fn decide(&self, raw_key: &str) -> Result<RoutingDecision, RouteError>;

    fn shard_count(&self) -> u32;

    fn table_count(&self) -> u32;

    fn index_format(&self) -> IndexFormat {
        IndexFormat::default()
    }

    /// Compute the decision and store it in the current context.
    fn route(&self, raw_key: &str) -> Result<RoutingDecision, RouteError> {
        let decision = self.decide(raw_key)?;
        tracing::debug!(
            strategy = self.name(),
            shard = %decision.shard_index,
            table = ?decision.table_index,
            "Routing decision stored"
        );
        RoutingContext::set(decision.clone());
        Ok(decision)
    }

    /// Set an already-known shard index. Padding applies, the base offset does not.
    fn set_shard(&self, index: u32) {
        RoutingContext::set_shard_index(self.index_format().shard(u64::from(index)));
    }

    /// Set an already-known table index. Padding applies, the base offset does not.
    fn set_table(&self, index: u32) {
        RoutingContext::set_table_index(self.index_format().table(u64::from(index)));
    }

    fn clear(&self) {
        RoutingContext::clear();
    }
}

/// Format residues into a decision using the configured bases and widths.
pub(crate) fn place(
    config: &RoutingConfig,
    shard_offset: u64,
    table_offset: Option<u64>,
) -> RoutingDecision {
    let format = config.index_format;
    RoutingDecision {
        shard_index: format.shard(shard_offset + u64::from(format.shard_base)),
        table_index: table_offset.map(|t| format.table(t + u64::from(format.table_base))),
    }
}

/// Build the strategy selected by `config.strategy`.
///
/// `custom` is only consulted for [`StrategyKind::Custom`].
pub fn build_strategy(
    config: Arc<RoutingConfig>,
    custom: Option<Arc<dyn RoutingStrategy>>,
) -> Result<Arc<dyn RoutingStrategy>, RouteError> {
    if config.shard_count == 0 {
        return Err(RouteError::Configuration(
            "shard_count must be greater than 0".to_string(),
        ));
    }

    match config.strategy {
        StrategyKind::Mod => Ok(Arc::new(ModStrategy::new(config))),
        StrategyKind::Hash => Ok(Arc::new(HashStrategy::new(config))),
        StrategyKind::Time => Err(RouteError::Configuration(
            "specify a correct routing policy: 'time' has no implementation".to_string(),
        )),
        StrategyKind::Custom => custom.ok_or_else(|| {
            RouteError::Configuration(
                "strategy 'custom' selected but no custom strategy supplied".to_string(),
            )
        }),
    }
}
