//! Shard and table routing for data-access calls.

pub mod config;
pub mod error;
pub mod observability;
pub mod routing;
pub mod strategy;
pub mod target;

pub use config::schema::{RouterFileConfig, RoutingConfig, StrategyKind};
pub use error::RouteError;
pub use routing::{RouteArgs, RouteInterceptor, RoutingContext, RoutingDecision};
pub use strategy::RoutingStrategy;
