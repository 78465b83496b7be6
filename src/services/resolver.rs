//! Reference resolver
//!
//! Replaces every `$<id>` token in an expression with the evaluated value of
//! the referenced transaction, recursively. Lookups go through the
//! [`TransactionLookup`] seam, one batch per expression level, and are scoped
//! to a single owner: another owner's transaction is reported exactly like a
//! missing one.

use async_trait::async_trait;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use tracing::{debug, warn};

use crate::error::EvaluationError;
use crate::models::expression::{reference_ids, reference_regex};
use crate::models::OwnerId;

use super::arithmetic;

/// Default cap on nested reference levels
pub const DEFAULT_MAX_REFERENCE_DEPTH: usize = 50;

/// A referenced transaction as seen by the resolver
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferencedTransaction {
    /// The id exactly as it appeared in the reference token
    pub id: String,

    /// The referenced transaction's own expression
    pub expression: String,
}

/// Batch lookup of transactions by id, scoped to an owner
///
/// Implementations must omit ids that do not exist or that belong to
/// another owner. Each returned `id` must match the requested id verbatim.
#[async_trait]
pub trait TransactionLookup: Send + Sync {
    async fn find_by_ids_for_owner(
        &self,
        ids: &[String],
        owner_id: &OwnerId,
    ) -> Result<Vec<ReferencedTransaction>, EvaluationError>;
}

/// The ids currently being resolved, outermost first
///
/// Models the recursion stack: an id is pushed before its expression is
/// resolved and popped once that resolution finishes, whatever the outcome.
#[derive(Debug, Default)]
pub struct ResolutionContext {
    in_flight: Vec<String>,
}

impl ResolutionContext {
    pub fn contains(&self, id: &str) -> bool {
        self.in_flight.iter().any(|entry| entry == id)
    }

    pub fn depth(&self) -> usize {
        self.in_flight.len()
    }

    fn enter(&mut self, id: &str) {
        self.in_flight.push(id.to_string());
    }

    fn leave(&mut self) {
        self.in_flight.pop();
    }

    /// Every id in flight followed by the revisited `id`, e.g. `X -> A -> B -> A`
    fn cycle_path(&self, id: &str) -> Vec<String> {
        let mut path = self.in_flight.clone();
        path.push(id.to_string());
        path
    }
}

type ResolveFuture<'b> =
    Pin<Box<dyn Future<Output = Result<String, EvaluationError>> + Send + 'b>>;

/// Resolves `$id` tokens against a transaction lookup
pub struct ReferenceResolver<'a> {
    lookup: &'a dyn TransactionLookup,
    max_depth: usize,
}

impl<'a> ReferenceResolver<'a> {
    /// Create a resolver with the default depth cap
    pub fn new(lookup: &'a dyn TransactionLookup) -> Self {
        Self {
            lookup,
            max_depth: DEFAULT_MAX_REFERENCE_DEPTH,
        }
    }

    /// Override the maximum number of nested reference levels
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Substitute every reference token in `expression` with its numeric value
    ///
    /// An expression without tokens is returned unchanged and the lookup is
    /// never called.
    pub async fn resolve_references(
        &self,
        expression: &str,
        owner_id: &OwnerId,
    ) -> Result<String, EvaluationError> {
        let mut context = ResolutionContext::default();
        self.resolve_level(expression, owner_id, &mut context).await
    }

    fn resolve_level<'b>(
        &'b self,
        expression: &'b str,
        owner_id: &'b OwnerId,
        context: &'b mut ResolutionContext,
    ) -> ResolveFuture<'b> {
        Box::pin(async move {
            let ids: Vec<String> = reference_ids(expression)
                .into_iter()
                .map(str::to_string)
                .collect();
            if ids.is_empty() {
                return Ok(expression.to_string());
            }

            if let Some(id) = ids.iter().find(|id| context.contains(id)) {
                return Err(EvaluationError::CircularReference {
                    path: context.cycle_path(id),
                });
            }

            if context.depth() >= self.max_depth {
                return Err(EvaluationError::MaxDepthExceeded {
                    id: ids[0].clone(),
                    max_depth: self.max_depth,
                });
            }

            let found: HashMap<String, String> = self
                .lookup
                .find_by_ids_for_owner(&ids, owner_id)
                .await?
                .into_iter()
                .map(|txn| (txn.id, txn.expression))
                .collect();

            if let Some(missing) = ids.iter().find(|id| !found.contains_key(*id)) {
                warn!(reference = %missing, owner = %owner_id, "Transaction reference not found");
                return Err(EvaluationError::ReferenceNotFound(missing.clone()));
            }

            let mut values: HashMap<&str, String> = HashMap::with_capacity(ids.len());
            for id in &ids {
                let sub_expression = &found[id];

                context.enter(id);
                let resolved = self
                    .resolve_level(sub_expression, owner_id, &mut *context)
                    .await;
                context.leave();

                let value = arithmetic::evaluate(&resolved?).map_err(|err| {
                    debug!(reference = %id, error = %err, "Failed to evaluate referenced expression");
                    err
                })?;
                values.insert(id.as_str(), value.to_string());
            }

            let substituted = reference_regex().replace_all(expression, |caps: &regex::Captures| {
                values
                    .get(&caps[1])
                    .cloned()
                    .unwrap_or_else(|| caps[0].to_string())
            });
            Ok(substituted.into_owned())
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Mutex;

    /// In-memory lookup that records every batch it is asked for
    pub(crate) struct MemoryLookup {
        owner: OwnerId,
        expressions: HashMap<String, String>,
        pub calls: Mutex<Vec<Vec<String>>>,
    }

    impl MemoryLookup {
        pub fn new(owner: OwnerId, entries: &[(&str, &str)]) -> Self {
            Self {
                owner,
                expressions: entries
                    .iter()
                    .map(|(id, expr)| (id.to_string(), expr.to_string()))
                    .collect(),
                calls: Mutex::new(Vec::new()),
            }
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl TransactionLookup for MemoryLookup {
        async fn find_by_ids_for_owner(
            &self,
            ids: &[String],
            owner_id: &OwnerId,
        ) -> Result<Vec<ReferencedTransaction>, EvaluationError> {
            self.calls.lock().unwrap().push(ids.to_vec());
            if *owner_id != self.owner {
                return Ok(Vec::new());
            }
            Ok(ids
                .iter()
                .filter_map(|id| {
                    self.expressions.get(id).map(|expr| ReferencedTransaction {
                        id: id.clone(),
                        expression: expr.clone(),
                    })
                })
                .collect())
        }
    }

    struct FailingLookup;

    #[async_trait]
    impl TransactionLookup for FailingLookup {
        async fn find_by_ids_for_owner(
            &self,
            _ids: &[String],
            _owner_id: &OwnerId,
        ) -> Result<Vec<ReferencedTransaction>, EvaluationError> {
            Err(EvaluationError::Lookup("store unavailable".into()))
        }
    }

    #[tokio::test]
    async fn test_no_tokens_skips_lookup() {
        let owner = OwnerId::new();
        let lookup = MemoryLookup::new(owner, &[]);
        let resolver = ReferenceResolver::new(&lookup);

        let resolved = resolver.resolve_references("100 + 50", &owner).await.unwrap();
        assert_eq!(resolved, "100 + 50");
        assert_eq!(lookup.call_count(), 0);
    }

    #[tokio::test]
    async fn test_single_reference() {
        let owner = OwnerId::new();
        let lookup = MemoryLookup::new(owner, &[("tx-123", "50")]);
        let resolver = ReferenceResolver::new(&lookup);

        let resolved = resolver
            .resolve_references("100 + $tx-123", &owner)
            .await
            .unwrap();
        assert_eq!(resolved, "100 + 50");
    }

    #[tokio::test]
    async fn test_nested_references() {
        let owner = OwnerId::new();
        let lookup = MemoryLookup::new(owner, &[("a", "$b * 2"), ("b", "10 + 0.5")]);
        let resolver = ReferenceResolver::new(&lookup);

        let resolved = resolver.resolve_references("$a + 1", &owner).await.unwrap();
        assert_eq!(resolved, "21 + 1");
        assert_eq!(lookup.call_count(), 2);
    }

    #[tokio::test]
    async fn test_negative_values_substitute_cleanly() {
        let owner = OwnerId::new();
        let lookup = MemoryLookup::new(owner, &[("rent", "-1200")]);
        let resolver = ReferenceResolver::new(&lookup);

        let resolved = resolver
            .resolve_references("100 - $rent", &owner)
            .await
            .unwrap();
        assert_eq!(resolved, "100 - -1200");
        assert_eq!(arithmetic::evaluate(&resolved).unwrap(), 1300.0);
    }

    #[tokio::test]
    async fn test_siblings_share_a_leaf_without_false_cycle() {
        let owner = OwnerId::new();
        let lookup = MemoryLookup::new(
            owner,
            &[("tx-123", "5"), ("tx-456", "7"), ("a", "$c"), ("b", "$c * 2"), ("c", "3")],
        );
        let resolver = ReferenceResolver::new(&lookup);

        let flat = resolver
            .resolve_references("$tx-123 + $tx-456 + $tx-123", &owner)
            .await
            .unwrap();
        assert_eq!(flat, "5 + 7 + 5");

        let diamond = resolver.resolve_references("$a + $b", &owner).await.unwrap();
        assert_eq!(diamond, "3 + 6");
    }

    #[tokio::test]
    async fn test_one_lookup_per_level() {
        let owner = OwnerId::new();
        let lookup = MemoryLookup::new(owner, &[("a", "1"), ("b", "2")]);
        let resolver = ReferenceResolver::new(&lookup);

        resolver
            .resolve_references("$a + $b + $a", &owner)
            .await
            .unwrap();
        let calls = lookup.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0], vec!["a".to_string(), "b".to_string()]);
    }

    #[tokio::test]
    async fn test_prefix_ids_do_not_collide() {
        let owner = OwnerId::new();
        let lookup = MemoryLookup::new(owner, &[("tx-1", "1"), ("tx-12", "12")]);
        let resolver = ReferenceResolver::new(&lookup);

        let resolved = resolver
            .resolve_references("$tx-1 + $tx-12", &owner)
            .await
            .unwrap();
        assert_eq!(resolved, "1 + 12");
    }

    #[tokio::test]
    async fn test_circular_reference() {
        let owner = OwnerId::new();
        let lookup = MemoryLookup::new(owner, &[("A", "$B"), ("B", "$A")]);
        let resolver = ReferenceResolver::new(&lookup);

        let err = resolver.resolve_references("$A", &owner).await.unwrap_err();
        assert_eq!(
            err,
            EvaluationError::CircularReference {
                path: vec!["A".into(), "B".into(), "A".into()]
            }
        );
        assert_eq!(err.to_string(), "Circular reference detected: A -> B -> A");
    }

    #[tokio::test]
    async fn test_direct_self_reference_is_a_cycle() {
        let owner = OwnerId::new();
        let lookup = MemoryLookup::new(owner, &[("A", "$A + 1")]);
        let resolver = ReferenceResolver::new(&lookup);

        let err = resolver.resolve_references("$A", &owner).await.unwrap_err();
        assert_eq!(err.to_string(), "Circular reference detected: A -> A");
    }

    #[tokio::test]
    async fn test_cycle_path_includes_the_ids_leading_into_the_loop() {
        let owner = OwnerId::new();
        let lookup = MemoryLookup::new(owner, &[("X", "$A"), ("A", "$B"), ("B", "$A")]);
        let resolver = ReferenceResolver::new(&lookup);

        let err = resolver.resolve_references("$X", &owner).await.unwrap_err();
        assert_eq!(
            err,
            EvaluationError::CircularReference {
                path: vec!["X".into(), "A".into(), "B".into(), "A".into()]
            }
        );
        assert_eq!(err.to_string(), "Circular reference detected: X -> A -> B -> A");
    }

    #[tokio::test]
    async fn test_missing_reference() {
        let owner = OwnerId::new();
        let lookup = MemoryLookup::new(owner, &[("a", "1")]);
        let resolver = ReferenceResolver::new(&lookup);

        let err = resolver
            .resolve_references("$a + $nope", &owner)
            .await
            .unwrap_err();
        assert_eq!(err, EvaluationError::ReferenceNotFound("nope".into()));
    }

    #[tokio::test]
    async fn test_other_owner_is_not_found() {
        let owner = OwnerId::new();
        let lookup = MemoryLookup::new(owner, &[("a", "1")]);
        let resolver = ReferenceResolver::new(&lookup);

        let err = resolver
            .resolve_references("$a", &OwnerId::new())
            .await
            .unwrap_err();
        assert_eq!(err, EvaluationError::ReferenceNotFound("a".into()));
    }

    #[tokio::test]
    async fn test_depth_cap() {
        let owner = OwnerId::new();
        let chain = [("t0", "$t1"), ("t1", "$t2"), ("t2", "$t3"), ("t3", "$t4"), ("t4", "1")];
        let lookup = MemoryLookup::new(owner, &chain);

        let shallow = ReferenceResolver::new(&lookup).with_max_depth(3);
        let err = shallow.resolve_references("$t0", &owner).await.unwrap_err();
        assert_eq!(
            err,
            EvaluationError::MaxDepthExceeded {
                id: "t3".into(),
                max_depth: 3
            }
        );

        let deep = ReferenceResolver::new(&lookup);
        assert_eq!(deep.max_depth(), DEFAULT_MAX_REFERENCE_DEPTH);
        assert_eq!(deep.resolve_references("$t0", &owner).await.unwrap(), "1");
    }

    #[tokio::test]
    async fn test_invalid_sub_expression_propagates_unmodified() {
        let owner = OwnerId::new();
        let lookup = MemoryLookup::new(owner, &[("bad", "2 + @")]);
        let resolver = ReferenceResolver::new(&lookup);

        let err = resolver.resolve_references("$bad", &owner).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Cannot evaluate expression \"2 + @\": Unsafe characters in expression: 2 + @"
        );
    }

    #[tokio::test]
    async fn test_lookup_failure_propagates() {
        let resolver = ReferenceResolver::new(&FailingLookup);
        let err = resolver
            .resolve_references("$a", &OwnerId::new())
            .await
            .unwrap_err();
        assert!(matches!(err, EvaluationError::Lookup(_)));
    }
}
