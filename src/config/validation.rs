//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check referential integrity (every shard has a data source)
//! - Validate value ranges (shard_count > 0, padding widths, highest index
//!   fits its padding width)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first; missing shard sources
//!   are listed up to a cap and summarized beyond it
//! - Validation is pure function: RouterFileConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use thiserror::Error;

use crate::config::schema::{DataSourcesConfig, RouterFileConfig, RoutingConfig, StrategyKind};

/// Missing shard sources listed individually before the rest are summarized.
const MAX_LISTED_MISSING_SHARDS: u64 = 8;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("router.shard_count must be greater than 0")]
    ZeroShardCount,

    #[error("router.strategy '{0}' has no built-in implementation")]
    UnsupportedStrategy(StrategyKind),

    #[error("router.index_format.{field} must be between 1 and 20")]
    InvalidWidth { field: &'static str },

    #[error("datasources.default '{0}' is not defined in datasources.sources")]
    MissingDefaultSource(String),

    #[error("{field} index {highest} (base {base}, count {count}) exceeds {width} digits")]
    IndexOutOfRange {
        field: &'static str,
        base: u32,
        count: u32,
        highest: u64,
        width: usize,
    },

    #[error("shard {shard} maps to data source '{name}', which is not defined")]
    MissingShardSource { shard: u64, name: String },

    #[error("{0} more shards have no data source defined")]
    MoreMissingShardSources(u64),
}

/// Validate a full configuration file.
pub fn validate_config(config: &RouterFileConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = validate_routing(&config.router);
    if config.router.shard_count > 0 {
        errors.extend(validate_datasources(&config.router, &config.datasources));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Checks that apply to the routing section alone.
///
/// `Custom` is accepted here: whether a custom strategy is actually supplied
/// is only known when the strategy is built.
pub fn validate_routing(config: &RoutingConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if config.shard_count == 0 {
        errors.push(ValidationError::ZeroShardCount);
    }
    if config.strategy == StrategyKind::Time {
        errors.push(ValidationError::UnsupportedStrategy(config.strategy));
    }
    if !(1..=20).contains(&config.index_format.shard_width) {
        errors.push(ValidationError::InvalidWidth { field: "shard_width" });
    }
    if !(1..=20).contains(&config.index_format.table_width) {
        errors.push(ValidationError::InvalidWidth { field: "table_width" });
    }
    let format = config.index_format;
    errors.extend(check_range(
        "shard",
        format.shard_base,
        config.shard_count,
        format.shard_width,
    ));
    errors.extend(check_range(
        "table",
        format.table_base,
        config.table_count,
        format.table_width,
    ));
    if config.routing_key.trim().is_empty() {
        tracing::warn!("router.routing_key is blank; every call site must declare its own key");
    }

    errors
}

/// The highest index a section can produce must render within its width.
fn check_range(
    field: &'static str,
    base: u32,
    count: u32,
    width: usize,
) -> Option<ValidationError> {
    if count == 0 || !(1..=20).contains(&width) {
        return None;
    }
    let highest = u64::from(base) + u64::from(count) - 1;
    // 10^20 exceeds u64, so any u64 index fits 20 digits
    let fits = match 10u64.checked_pow(width as u32) {
        Some(limit) => highest < limit,
        None => true,
    };
    if fits {
        None
    } else {
        Some(ValidationError::IndexOutOfRange {
            field,
            base,
            count,
            highest,
            width,
        })
    }
}

/// Data sources are optional; when any are declared the default and every
/// shard must resolve to one of them.
fn validate_datasources(
    router: &RoutingConfig,
    datasources: &DataSourcesConfig,
) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    if datasources.sources.is_empty() {
        return errors;
    }

    if !datasources.sources.contains_key(&datasources.default) {
        errors.push(ValidationError::MissingDefaultSource(datasources.default.clone()));
    }

    let format = router.index_format;
    let first = u64::from(format.shard_base);
    let shards = first..first + u64::from(router.shard_count);

    // Count declared names that are shard names so the scan below can stop
    // once every missing shard has been seen.
    let declared = datasources
        .sources
        .keys()
        .filter_map(|name| name.strip_prefix(datasources.prefix.as_str()))
        .filter_map(|rest| {
            rest.parse::<u64>()
                .ok()
                .filter(|&shard| format.shard(shard) == rest)
        })
        .filter(|shard| shards.contains(shard))
        .count() as u64;
    let missing = u64::from(router.shard_count) - declared;

    let mut listed = 0;
    for shard in shards {
        if listed == missing || listed == MAX_LISTED_MISSING_SHARDS {
            break;
        }
        let name = format!("{}{}", datasources.prefix, format.shard(shard));
        if !datasources.sources.contains_key(&name) {
            errors.push(ValidationError::MissingShardSource { shard, name });
            listed += 1;
        }
    }
    if missing > listed {
        errors.push(ValidationError::MoreMissingShardSources(missing - listed));
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::DataSourceConfig;

    fn source(url: &str) -> DataSourceConfig {
        DataSourceConfig {
            url: url.to_string(),
            username: String::new(),
            password: String::new(),
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&RouterFileConfig::default()).is_ok());
    }

    #[test]
    fn test_reports_all_errors() {
        let mut config = RouterFileConfig::default();
        config.router.shard_count = 0;
        config.router.strategy = StrategyKind::Time;
        config.router.index_format.table_width = 0;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::ZeroShardCount,
                ValidationError::UnsupportedStrategy(StrategyKind::Time),
                ValidationError::InvalidWidth { field: "table_width" },
            ]
        );
    }

    #[test]
    fn test_shard_sources_must_exist() {
        let mut config = RouterFileConfig::default();
        config.router.shard_count = 2;
        config.datasources.sources.insert("db00".into(), source("mysql://a"));
        config.datasources.sources.insert("db01".into(), source("mysql://b"));

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::MissingShardSource {
                shard: 2,
                name: "db02".into()
            }]
        );

        config.datasources.sources.insert("db02".into(), source("mysql://c"));
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_large_base_is_reported_not_overflowed() {
        let mut config = RouterFileConfig::default();
        config.router.shard_count = 2;
        config.router.index_format.shard_base = u32::MAX;
        config.datasources.sources.insert("db00".into(), source("mysql://a"));

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors[0],
            ValidationError::IndexOutOfRange {
                field: "shard",
                base: u32::MAX,
                count: 2,
                highest: u64::from(u32::MAX) + 1,
                width: 2,
            }
        );
        assert_eq!(
            errors[1],
            ValidationError::MissingShardSource {
                shard: u64::from(u32::MAX),
                name: "db4294967295".into()
            }
        );
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn test_table_range_checked_against_width() {
        let mut config = RouterFileConfig::default();
        config.router.table_count = 1000;
        assert!(validate_config(&config).is_ok());

        config.router.index_format.table_base = 1;
        assert_eq!(
            validate_config(&config).unwrap_err(),
            vec![ValidationError::IndexOutOfRange {
                field: "table",
                base: 1,
                count: 1000,
                highest: 1000,
                width: 3,
            }]
        );
    }

    #[test]
    fn test_missing_shards_are_capped() {
        let mut config = RouterFileConfig::default();
        config.router.shard_count = u32::MAX;
        config.router.index_format.shard_width = 10;
        config.datasources.default = "db0000000001".into();
        config.datasources.sources.insert("db0000000001".into(), source("mysql://a"));

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 9);
        assert_eq!(
            errors[0],
            ValidationError::MissingShardSource {
                shard: 2,
                name: "db0000000002".into()
            }
        );
        assert_eq!(
            errors[8],
            ValidationError::MoreMissingShardSources(u64::from(u32::MAX) - 1 - 8)
        );
    }

    #[test]
    fn test_default_source_must_exist() {
        let mut config = RouterFileConfig::default();
        config.datasources.default = "main".into();
        config.datasources.sources.insert("db01".into(), source("mysql://b"));

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors, vec![ValidationError::MissingDefaultSource("main".into())]);
    }
}
