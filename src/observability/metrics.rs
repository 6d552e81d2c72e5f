//! Routing metrics.
//!
//! # Metrics
//! - `db_router_routes_total` (counter): successful routes by strategy, shard
//! - `db_router_route_failures_total` (counter): rejected calls by error kind
//!
//! Recorded through the `metrics` facade; without an installed recorder the
//! calls are no-ops.

use metrics::counter;

pub const ROUTES_TOTAL: &str = "db_router_routes_total";
pub const ROUTE_FAILURES_TOTAL: &str = "db_router_route_failures_total";

pub fn record_route(strategy: &'static str, shard: &str) {
    counter!(ROUTES_TOTAL, "strategy" => strategy, "shard" => shard.to_string()).increment(1);
}

pub fn record_route_failure(kind: &'static str) {
    counter!(ROUTE_FAILURES_TOTAL, "kind" => kind).increment(1);
}
