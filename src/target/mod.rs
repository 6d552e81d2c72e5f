//! Physical target resolution.
//!
//! # Data Flow
//! ```text
//! RoutingContext (shard "02", table "001")
//!     → datasource.rs: "db" + "02" → DataSourceConfig for db02
//!     → table.rs: "order" → "order_001" (split tables only)
//!
//! No active decision:
//!     → datasource.rs: configured default data source
//!     → table.rs: logical table name unchanged
//! ```
//!
//! # Design Decisions
//! - Read-only consumers of the context; never write a decision
//! - Never fall back to shard/table 0, only to the configured default
//! - No connections are opened here; descriptors only

pub mod datasource;
pub mod table;

pub use datasource::DataSourceRegistry;
pub use table::physical_table;
