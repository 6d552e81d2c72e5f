//! Physical table naming.
//!
//! Table rewriting is opt-in per call site: a data access object working on a
//! table that is not split keeps its logical name even while a table index
//! is routed for another table in the same call.

use crate::routing::context::RoutingContext;

/// `logical_<table index>` when `split_table` is set and a table index is
/// routed, else `logical`.
pub fn physical_table(logical: &str, split_table: bool) -> String {
    match RoutingContext::table_index() {
        Some(index) if split_table => format!("{}_{}", logical, index),
        _ => logical.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::context::RoutingDecision;

    #[test]
    fn test_physical_table() {
        RoutingContext::clear();
        assert_eq!(physical_table("user_order", true), "user_order");

        RoutingContext::set(RoutingDecision::new("01", Some("003".into())));
        assert_eq!(physical_table("user_order", true), "user_order_003");

        RoutingContext::set(RoutingDecision::new("01", None));
        assert_eq!(physical_table("user_order", true), "user_order");
        RoutingContext::clear();
    }

    #[test]
    fn test_unsplit_table_keeps_logical_name() {
        RoutingContext::set(RoutingDecision::new("02", Some("001".into())));
        assert_eq!(physical_table("user_profile", false), "user_profile");
        assert_eq!(physical_table("user_order", true), "user_order_001");
        RoutingContext::clear();
    }
}
