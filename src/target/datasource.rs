//! Data source lookup keyed by the current shard index.

use std::collections::BTreeMap;

use crate::config::{DataSourceConfig, DataSourcesConfig};
use crate::routing::context::RoutingContext;

/// Named data source descriptors plus the default used without a decision.
#[derive(Debug, Clone)]
pub struct DataSourceRegistry {
    prefix: String,
    default: String,
    sources: BTreeMap<String, DataSourceConfig>,
}

impl DataSourceRegistry {
    pub fn from_config(config: &DataSourcesConfig) -> Self {
        Self {
            prefix: config.prefix.clone(),
            default: config.default.clone(),
            sources: config.sources.clone(),
        }
    }

    /// Name of the data source for the current call: prefix + shard index,
    /// or the default when no shard is routed.
    pub fn lookup_key(&self) -> String {
        match RoutingContext::shard_index() {
            Some(shard) => format!("{}{}", self.prefix, shard),
            None => self.default.clone(),
        }
    }

    /// Descriptor for the current call.
    ///
    /// An unknown lookup key falls back to the default data source.
    pub fn current(&self) -> Option<(&str, &DataSourceConfig)> {
        let key = self.lookup_key();
        if let Some((name, source)) = self.sources.get_key_value(&key) {
            return Some((name.as_str(), source));
        }
        if key != self.default {
            tracing::warn!(
                lookup_key = %key,
                default = %self.default,
                "No data source for shard, using default"
            );
        }
        self.sources
            .get_key_value(&self.default)
            .map(|(name, source)| (name.as_str(), source))
    }

    pub fn get(&self, name: &str) -> Option<&DataSourceConfig> {
        self.sources.get(name)
    }

    pub fn default_name(&self) -> &str {
        &self.default
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sources.keys().map(String::as_str)
    }
}
