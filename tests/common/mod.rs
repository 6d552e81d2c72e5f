//! Shared fixtures for routing integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use db_router::{RouteInterceptor, RoutingConfig, StrategyKind};
use serde::Serialize;

/// Argument type carrying the routing attribute.
#[derive(Debug, Clone, Serialize)]
pub struct UserOrder {
    pub user_id: String,
    pub sku: String,
}

impl UserOrder {
    pub fn new(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            sku: "sku-1".to_string(),
        }
    }
}

/// Error type of the wrapped "data layer" operation.
#[derive(Debug, PartialEq, Eq)]
pub enum DaoError {
    Route(db_router::RouteError),
    Sql(String),
}

impl From<db_router::RouteError> for DaoError {
    fn from(e: db_router::RouteError) -> Self {
        DaoError::Route(e)
    }
}

/// Counts how often the wrapped operation actually ran.
#[derive(Debug, Clone, Default)]
pub struct CallCounter(Arc<AtomicUsize>);

impl CallCounter {
    pub fn hit(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

pub fn mod_interceptor(shards: u32, tables: u32, routing_key: &str) -> RouteInterceptor {
    let config = RoutingConfig::new(shards, tables, routing_key, StrategyKind::Mod);
    RouteInterceptor::from_config(config).unwrap()
}
