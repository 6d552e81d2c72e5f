//! Route interception.
//!
//! # Responsibilities
//! - Resolve the effective routing attribute (declared or configured default)
//! - Extract the key, run the strategy, run the wrapped operation
//! - Clear the routing context on every exit path
//!
//! # Design Decisions
//! - Cleanup is a drop guard, so it also runs on panic and on cancellation
//!   of an async operation
//! - The guard is armed before the strategy runs; a failed route leaves no
//!   decision behind
//! - A nested call restores the outer call's decision when it unwinds
//! - Router errors convert into the caller's error type via `From`; the
//!   operation's own result is passed through untouched

use std::future::Future;
use std::sync::Arc;

use tracing::Instrument;
use uuid::Uuid;

use crate::config::RoutingConfig;
use crate::error::RouteError;
use crate::observability::metrics;
use crate::routing::context::{ContextSnapshot, RoutingContext};
use crate::routing::extractor::{extract, RouteArgs};
use crate::strategy::{build_strategy, RoutingStrategy};
use crate::target::physical_table;

/// Clears the context when dropped.
struct RouteGuard<'a> {
    strategy: &'a dyn RoutingStrategy,
    previous: Option<ContextSnapshot>,
}

impl<'a> RouteGuard<'a> {
    fn arm(strategy: &'a dyn RoutingStrategy) -> Self {
        Self {
            strategy,
            previous: RoutingContext::snapshot(),
        }
    }
}

impl Drop for RouteGuard<'_> {
    fn drop(&mut self) {
        self.strategy.clear();
        if let Some(previous) = self.previous.take() {
            RoutingContext::restore(previous);
        }
    }
}

/// Wraps data-access calls with shard/table routing.
#[derive(Debug, Clone)]
pub struct RouteInterceptor {
    config: Arc<RoutingConfig>,
    strategy: Arc<dyn RoutingStrategy>,
    metrics_enabled: bool,
}

impl RouteInterceptor {
    /// Pair a config with an already-built strategy.
    pub fn new(config: Arc<RoutingConfig>, strategy: Arc<dyn RoutingStrategy>) -> Self {
        Self {
            config,
            strategy,
            metrics_enabled: false,
        }
    }

    /// Build the strategy named by `config.strategy`.
    pub fn from_config(config: RoutingConfig) -> Result<Self, RouteError> {
        Self::with_custom(config, None)
    }

    /// Like [`from_config`](Self::from_config), supplying the implementation
    /// used when `config.strategy` is `Custom`.
    pub fn with_custom(
        config: RoutingConfig,
        custom: Option<Arc<dyn RoutingStrategy>>,
    ) -> Result<Self, RouteError> {
        let config = Arc::new(config);
        let strategy = build_strategy(config.clone(), custom)?;
        tracing::info!(
            strategy = strategy.name(),
            shard_count = config.shard_count,
            table_count = config.table_count,
            routing_key = %config.routing_key,
            "Route interceptor ready"
        );
        Ok(Self::new(config, strategy))
    }

    pub fn with_metrics(mut self, enabled: bool) -> Self {
        self.metrics_enabled = enabled;
        self
    }

    pub fn config(&self) -> &RoutingConfig {
        &self.config
    }

    pub fn strategy(&self) -> &Arc<dyn RoutingStrategy> {
        &self.strategy
    }

    /// The attribute a call site will route on.
    pub fn resolve_key(&self, declared: Option<&str>) -> Result<String, RouteError> {
        match declared.map(str::trim).filter(|k| !k.is_empty()) {
            Some(key) => Ok(key.to_string()),
            None if !self.config.routing_key.trim().is_empty() => {
                Ok(self.config.routing_key.trim().to_string())
            }
            None => Err(RouteError::Configuration(
                "no routing key available".to_string(),
            )),
        }
    }

    /// Resolve a call site's key once, at setup time.
    ///
    /// The bound route does not rewrite table names until
    /// [`BoundRoute::split_table`] opts in.
    pub fn bind(&self, declared: Option<&str>) -> Result<BoundRoute, RouteError> {
        let attribute = self.resolve_key(declared)?;
        Ok(BoundRoute {
            interceptor: self.clone(),
            attribute,
            split_table: false,
        })
    }

    /// Route, run `operation`, clear.
    pub fn wrap<T, E, F>(
        &self,
        declared: Option<&str>,
        args: &RouteArgs,
        operation: F,
    ) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
        E: From<RouteError>,
    {
        let attribute = self.resolve_key(declared).map_err(|e| self.rejected(e))?;
        self.run(&attribute, args, operation)
    }

    /// Async variant of [`wrap`](Self::wrap).
    ///
    /// The operation runs in its own task-local context scope. Dropping the
    /// returned future before completion still clears the decision.
    pub async fn wrap_async<T, E, F, Fut>(
        &self,
        declared: Option<&str>,
        args: &RouteArgs,
        operation: F,
    ) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<RouteError>,
    {
        let attribute = self.resolve_key(declared).map_err(|e| self.rejected(e))?;
        self.run_async(&attribute, args, operation).await
    }

    fn run<T, E, F>(&self, attribute: &str, args: &RouteArgs, operation: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
        E: From<RouteError>,
    {
        let span = tracing::debug_span!(
            "route",
            call_id = %Uuid::new_v4(),
            attribute = %attribute
        );
        let _entered = span.enter();

        let _guard = self.enter(attribute, args)?;
        operation()
    }

    async fn run_async<T, E, F, Fut>(
        &self,
        attribute: &str,
        args: &RouteArgs,
        operation: F,
    ) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<RouteError>,
    {
        let span = tracing::debug_span!(
            "route",
            call_id = %Uuid::new_v4(),
            attribute = %attribute
        );

        RoutingContext::scope(
            async move {
                let _guard = self.enter(attribute, args)?;
                operation().await
            }
            .instrument(span),
        )
        .await
    }

    /// Extract and route; the returned guard owns cleanup.
    fn enter(&self, attribute: &str, args: &RouteArgs) -> Result<RouteGuard<'_>, RouteError> {
        let guard = RouteGuard::arm(self.strategy.as_ref());

        let decision = extract(attribute, args)
            .and_then(|key| self.strategy.route(&key))
            .map_err(|e| self.rejected(e))?;

        if self.metrics_enabled {
            metrics::record_route(self.strategy.name(), &decision.shard_index);
        }
        Ok(guard)
    }

    fn rejected(&self, err: RouteError) -> RouteError {
        tracing::warn!(error = %err, kind = err.kind(), "Routing rejected call");
        if self.metrics_enabled {
            metrics::record_route_failure(err.kind());
        }
        err
    }
}

/// A call site whose routing attribute was resolved up front.
#[derive(Debug, Clone)]
pub struct BoundRoute {
    interceptor: RouteInterceptor,
    attribute: String,
    split_table: bool,
}

impl BoundRoute {
    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    /// Opt this call site in to table-name rewriting.
    pub fn split_table(mut self, split: bool) -> Self {
        self.split_table = split;
        self
    }

    pub fn splits_table(&self) -> bool {
        self.split_table
    }

    /// Physical name of `logical` for the call currently running.
    pub fn table(&self, logical: &str) -> String {
        physical_table(logical, self.split_table)
    }

    pub fn call<T, E, F>(&self, args: &RouteArgs, operation: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
        E: From<RouteError>,
    {
        self.interceptor.run(&self.attribute, args, operation)
    }

    pub async fn call_async<T, E, F, Fut>(&self, args: &RouteArgs, operation: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<RouteError>,
    {
        self.interceptor.run_async(&self.attribute, args, operation).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StrategyKind;
    use crate::route_args;
    use crate::routing::context::RoutingDecision;
    use serde::Serialize;
    use std::cell::Cell;

    #[derive(Serialize)]
    struct Order {
        user_id: String,
    }

    fn interceptor(routing_key: &str) -> RouteInterceptor {
        RouteInterceptor::from_config(RoutingConfig::new(4, 8, routing_key, StrategyKind::Mod))
            .unwrap()
    }

    #[test]
    fn test_resolve_key_precedence() {
        let i = interceptor("user_id");
        assert_eq!(i.resolve_key(Some("order_id")).unwrap(), "order_id");
        assert_eq!(i.resolve_key(Some("  ")).unwrap(), "user_id");
        assert_eq!(i.resolve_key(None).unwrap(), "user_id");

        let bare = interceptor("");
        assert_eq!(
            bare.resolve_key(None),
            Err(RouteError::Configuration("no routing key available".into()))
        );
        assert!(bare.bind(Some("")).is_err());
        assert_eq!(bare.bind(Some("user_id")).unwrap().attribute(), "user_id");
    }

    #[test]
    fn test_wrap_exposes_decision_then_clears() {
        let i = interceptor("user_id");
        let order = Order { user_id: "17".into() };

        let seen = i
            .wrap(None, &route_args![&order], || Ok::<_, RouteError>(RoutingContext::get()))
            .unwrap();

        assert_eq!(seen, Some(RoutingDecision::new("02", Some("001".into()))));
        assert_eq!(RoutingContext::get(), None);
    }

    #[test]
    fn test_failures_skip_operation() {
        let i = interceptor("");
        let calls = Cell::new(0);

        let result: Result<(), RouteError> = i.wrap(None, &route_args![&"17", &"x"], || {
            calls.set(calls.get() + 1);
            Ok(())
        });
        assert!(matches!(result, Err(RouteError::Configuration(_))));

        let result: Result<(), RouteError> =
            interceptor("user_id").wrap(None, &route_args![&"abc"], || {
                calls.set(calls.get() + 1);
                Ok(())
            });
        assert!(matches!(result, Err(RouteError::KeyFormat { .. })));

        assert_eq!(calls.get(), 0);
        assert_eq!(RoutingContext::get(), None);
    }

    #[test]
    fn test_nested_call_restores_outer_decision() {
        let i = interceptor("user_id");

        let (inner, outer_after) = i
            .wrap(None, &route_args![&"1"], || {
                let inner = i.wrap(None, &route_args![&"2"], || {
                    Ok::<_, RouteError>(RoutingContext::get())
                })?;
                Ok::<_, RouteError>((inner, RoutingContext::get()))
            })
            .unwrap();

        assert_eq!(inner, Some(RoutingDecision::new("03", Some("002".into()))));
        assert_eq!(outer_after, Some(RoutingDecision::new("02", Some("001".into()))));
        assert_eq!(RoutingContext::get(), None);
    }

    #[test]
    fn test_panic_in_operation_still_clears() {
        let i = interceptor("user_id");
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _: Result<(), RouteError> = i.wrap(None, &route_args![&"5"], || panic!("boom"));
        }));
        assert!(result.is_err());
        assert_eq!(RoutingContext::get(), None);
    }

    #[test]
    fn test_bound_route_table_split_is_opt_in() {
        let i = interceptor("user_id");
        let order = Order { user_id: "17".into() };
        let plain = i.bind(None).unwrap();
        let split = i.bind(None).unwrap().split_table(true);
        assert!(!plain.splits_table());

        let tables = split
            .call(&route_args![&order], || {
                Ok::<_, RouteError>((plain.table("user_profile"), split.table("user_order")))
            })
            .unwrap();

        assert_eq!(tables, ("user_profile".to_string(), "user_order_001".to_string()));
        assert_eq!(split.table("user_order"), "user_order");
    }

    #[tokio::test]
    async fn test_bound_route_async() {
        let route = interceptor("user_id").bind(None).unwrap();
        let order = Order { user_id: "6".into() };

        let seen = route
            .call_async(&route_args![&order], || async {
                tokio::task::yield_now().await;
                Ok::<_, RouteError>(RoutingContext::get())
            })
            .await
            .unwrap();

        assert_eq!(seen, Some(RoutingDecision::new("03", Some("006".into()))));
        assert_eq!(RoutingContext::get(), None);
    }
}
