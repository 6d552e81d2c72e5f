//! Modulo routing strategy.

use std::sync::Arc;

use crate::config::{IndexFormat, RoutingConfig};
use crate::error::RouteError;
use crate::routing::context::RoutingDecision;
use crate::strategy::{place, RoutingStrategy};

/// Parses the key as a base-10 integer.
///
/// `shard = key mod shard_count + shard_base`, `table = key mod table_count + table_base`.
/// Negative keys use the euclidean remainder so they stay in range.
#[derive(Debug, Clone)]
pub struct ModStrategy {
    config: Arc<RoutingConfig>,
}

impl ModStrategy {
    pub fn new(config: Arc<RoutingConfig>) -> Self {
        Self { config }
    }
}

impl RoutingStrategy for ModStrategy {
    fn name(&self) -> &'static str {
        "mod"
    }

    fn decide(&self, raw_key: &str) -> Result<RoutingDecision, RouteError> {
        let key: i64 = raw_key.parse().map_err(|_| RouteError::KeyFormat {
            key: raw_key.to_string(),
            expected: "i64",
        })?;

        let shard = key.rem_euclid(i64::from(self.config.shard_count)) as u64;
        let table = self
            .config
            .splits_tables()
            .then(|| key.rem_euclid(i64::from(self.config.table_count)) as u64);

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
