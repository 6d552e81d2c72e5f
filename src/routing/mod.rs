//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Intercepted call (declared key, arguments, operation)
//!     → interceptor.rs (resolve routing attribute)
//!     → extractor.rs (read attribute value from arguments)
//!     → strategy (key → shard/table decision)
//!     → context.rs (store decision for this call)
//!     → operation runs, reads context
//!     → interceptor.rs clears context
//! ```
//!
//! # Design Decisions
//! - Fail fast: no operation runs without a decision
//! - Context is affine to the calling thread or task, never shared
//! - Interceptor is immutable; reload swaps a whole new one (shared.rs)

pub mod context;
pub mod extractor;
pub mod interceptor;
pub mod shared;

pub use context::{RoutingContext, RoutingDecision};
pub use extractor::{extract, RouteArg, RouteArgs};
pub use interceptor::{BoundRoute, RouteInterceptor};
pub use shared::SharedInterceptor;
