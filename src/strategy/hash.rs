//! Hash routing strategy.
//!
//! Accepts any key. The hash is the 31-multiplier string hash over UTF-16
//! code units with the upper half folded into the lower half; it depends
//! only on the key, so a layout is stable across processes and restarts.

use std::sync::Arc;

use crate::config::{IndexFormat, RoutingConfig};
use crate::error::RouteError;
use crate::routing::context::RoutingDecision;
use crate::strategy::{place, RoutingStrategy};

/// Routes by `stable_hash(key) mod count`.
#[derive(Debug, Clone)]
pub struct HashStrategy {
    config: Arc<RoutingConfig>,
}

impl HashStrategy {
    pub fn new(config: Arc<RoutingConfig>) -> Self {
        Self { config }
    }
}

/// Deterministic across processes and platforms.
pub fn stable_hash(key: &str) -> u32 {
    let h = key
        .encode_utf16()
        .fold(0i32, |h, unit| h.wrapping_mul(31).wrapping_add(i32::from(unit)));
    let h = h as u32;
    h ^ (h >> 16)
}

impl RoutingStrategy for HashStrategy {
    fn name(&self) -> &'static str {
        "hash"
    }

    fn decide(&self, raw_key: &str) -> Result<RoutingDecision, RouteError> {
        let h = u64::from(stable_hash(raw_key));
        let shard = h % u64::from(self.config.shard_count);
        let table = self
            .config
            .splits_tables()
            .then(|| h % u64::from(self.config.table_count));

        Ok(place(&self.config, shard, table))
    }

    fn shard_count(&self) -> u32 {
        self.config.shard_count
    }

    fn table_count(&self) -> u32 {
        self.config.table_count
    }

    fn index_format(&self) -> IndexFormat {
        self.config.index_format
    }
}
