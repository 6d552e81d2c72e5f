//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Routing subsystems produce:
//!     → logging.rs (structured log events, one span per intercepted call)
//!     → metrics.rs (route and failure counters)
//! ```
//!
//! # Design Decisions
//! - Every intercepted call gets a `call_id` span field
//! - Metrics are opt-in per interceptor (`observability.metrics_enabled`)

pub mod logging;
pub mod metrics;
