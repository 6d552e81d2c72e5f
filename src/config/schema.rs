//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the router.
//! All types derive Serde traits for deserialization from config files.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Root configuration file.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RouterFileConfig {
    /// Shard/table routing settings.
    pub router: RoutingConfig,

    /// Physical data source descriptors.
    pub datasources: DataSourcesConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Routing settings shared read-only by every strategy instance.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Number of physical databases. Must be > 0.
    pub shard_count: u32,

    /// Number of physical tables per logical table. 0 disables table routing.
    pub table_count: u32,

    /// Default routing attribute when a call site declares none.
    pub routing_key: String,

    /// Strategy used to turn a key into indices.
    pub strategy: StrategyKind,

    /// Numbering offsets and padding widths.
    pub index_format: IndexFormat,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            shard_count: 1,
            table_count: 0,
            routing_key: String::new(),
            strategy: StrategyKind::default(),
            index_format: IndexFormat::default(),
        }
    }
}

impl RoutingConfig {
    /// Convenience constructor with the default index format.
    pub fn new(
        shard_count: u32,
        table_count: u32,
        routing_key: impl Into<String>,
        strategy: StrategyKind,
    ) -> Self {
        Self {
            shard_count,
            table_count,
            routing_key: routing_key.into(),
            strategy,
            index_format: IndexFormat::default(),
        }
    }

    /// Whether table-level routing applies.
    pub fn splits_tables(&self) -> bool {
        self.table_count > 0
    }
}

/// Routing strategy selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    Mod,
    #[default]
    Hash,
    Time,
    Custom,
}

impl StrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::Mod => "mod",
            StrategyKind::Hash => "hash",
            StrategyKind::Time => "time",
            StrategyKind::Custom => "custom",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mod" => Ok(StrategyKind::Mod),
            "hash" => Ok(StrategyKind::Hash),
            "time" => Ok(StrategyKind::Time),
            "custom" => Ok(StrategyKind::Custom),
            other => Err(format!("unknown routing strategy: {}", other)),
        }
    }
}

/// How computed indices are numbered and rendered.
///
/// The defaults give 1-based, 2-digit shards (`01`, `02`) and 0-based,
/// 3-digit tables (`000`, `001`), matching data sources named `db01` and
/// tables named `order_000`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct IndexFormat {
    /// Added to `key mod shard_count`.
    pub shard_base: u32,

    /// Added to `key mod table_count`.
    pub table_base: u32,

    /// Zero-padding width of the shard index.
    pub shard_width: usize,

    /// Zero-padding width of the table index.
    pub table_width: usize,
}

impl Default for IndexFormat {
    fn default() -> Self {
        Self {
            shard_base: 1,
            table_base: 0,
            shard_width: 2,
            table_width: 3,
        }
    }
}

impl IndexFormat {
    pub fn shard(&self, index: u64) -> String {
        format!("{:0width$}", index, width = self.shard_width)
    }

    pub fn table(&self, index: u64) -> String {
        format!("{:0width$}", index, width = self.table_width)
    }
}

/// Physical data source descriptors, keyed by lookup name (`db01`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct DataSourcesConfig {
    /// Prefix joined with the shard index to form a lookup name.
    pub prefix: String,

    /// Name of the data source used when no decision is active.
    pub default: String,

    /// Named data sources.
    pub sources: BTreeMap<String, DataSourceConfig>,
}

impl Default for DataSourcesConfig {
    fn default() -> Self {
        Self {
            prefix: "db".to_string(),
            default: "db00".to_string(),
            sources: BTreeMap::new(),
        }
    }
}

/// Connection descriptor for one physical database.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DataSourceConfig {
    /// Connection URL.
    pub url: String,

    #[serde(default)]
    pub username: String,

    #[serde(default, skip_serializing)]
    pub password: String,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Record routing counters through the `metrics` facade.
    pub metrics_enabled: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: true,
        }
    }
}
