//! Routing error definitions.
//!
//! Every variant is a local-input error: retrying the same call with the same
//! arguments fails the same way, so nothing at this layer retries.

use thiserror::Error;

/// Errors raised while resolving a route for an intercepted call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    /// No routing key could be resolved, or the configured strategy is unusable.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// An argument could not be introspected for the routing attribute.
    #[error("[{type_name}.{attribute}] this value can't be read")]
    AttributeExtraction {
        type_name: String,
        attribute: String,
    },

    /// Every argument was inspected and none carried a non-blank value.
    #[error("no non-blank value found for routing attribute '{attribute}'")]
    MissingRoutingValue { attribute: String },

    /// The key value does not fit the strategy's expected representation.
    #[error("{key} can't be converted to {expected} type")]
    KeyFormat { key: String, expected: &'static str },
}

impl RouteError {
    /// Short label used for logs and failure metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            RouteError::Configuration(_) => "configuration",
            RouteError::AttributeExtraction { .. } | RouteError::MissingRoutingValue { .. } => {
                "attribute_extraction"
            }
            RouteError::KeyFormat { .. } => "key_format",
        }
    }

    /// True for both extraction variants.
    pub fn is_extraction(&self) -> bool {
        self.kind() == "attribute_extraction"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = RouteError::KeyFormat {
            key: "abc".into(),
            expected: "i64",
        };
        assert_eq!(err.to_string(), "abc can't be converted to i64 type");

        let err = RouteError::AttributeExtraction {
            type_name: "Order".into(),
            attribute: "user_id".into(),
        };
        assert_eq!(err.to_string(), "[Order.user_id] this value can't be read");
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(RouteError::Configuration("x".into()).kind(), "configuration");
        assert!(RouteError::MissingRoutingValue { attribute: "id".into() }.is_extraction());
        assert!(!RouteError::Configuration("x".into()).is_extraction());
    }
}
