//! The association repository seam.
//!
//! [`AssociationApi`] abstracts the framework service behind a trait so the
//! reconciliation engine can run against a mock in tests. The batch fan-out
//! and retry logic live here as default methods; implementations only supply
//! the per-item call and the publish side effect.

use async_trait::async_trait;
use futures::future::join_all;
use std::time::Instant;
use tracing::{info, warn};

use crate::error::Result;
use crate::types::{ApiResponse, AssociationUpdate, BatchRequestResult};

/// Client-side view of the framework service's association operations.
#[async_trait]
pub trait AssociationApi: Send + Sync {
    /// Replace one term's associations with the complete set in `update`.
    ///
    /// The remote contract is "set associations to exactly this list"; an
    /// empty set deletes all associations for the term in this call's
    /// context. Does not mutate any local state.
    async fn replace_term_associations(&self, update: &AssociationUpdate) -> Result<ApiResponse>;

    /// Ask the service to refresh the framework's live view.
    ///
    /// `reason` is log context only and never reaches the wire.
    async fn publish_framework(
        &self,
        framework_code: &str,
        reason: &str,
        channel_id: Option<&str>,
    ) -> Result<ApiResponse>;

    /// Issue every update concurrently and capture one result per update.
    ///
    /// One failing update never aborts or blocks its siblings; results come
    /// back in input order. After all calls settle, the framework is
    /// published once per non-empty batch (using the first update's
    /// framework code), best-effort: a publish failure is logged and never
    /// surfaced. `Err` is reserved for a total transport-level failure of
    /// the whole fan-out.
    async fn batch_replace_associations(
        &self,
        updates: &[AssociationUpdate],
        channel_id: Option<&str>,
    ) -> Result<Vec<BatchRequestResult>> {
        run_batch(self, updates, channel_id).await
    }

    /// Re-run previously failed updates.
    ///
    /// Identical semantics to [`Self::batch_replace_associations`]; callers
    /// merge the outcomes into their prior result set with
    /// [`merge_batch_results`].
    async fn retry_batch(
        &self,
        failed_inputs: &[AssociationUpdate],
        channel_id: Option<&str>,
    ) -> Result<Vec<BatchRequestResult>> {
        info!(count = failed_inputs.len(), "Retrying failed association updates");
        self.batch_replace_associations(failed_inputs, channel_id)
            .await
    }
}

/// Shared fan-out implementation behind the default batch methods.
pub(crate) async fn run_batch<A: AssociationApi + ?Sized>(
    api: &A,
    updates: &[AssociationUpdate],
    channel_id: Option<&str>,
) -> Result<Vec<BatchRequestResult>> {
    if updates.is_empty() {
        return Ok(Vec::new());
    }

    let batch_id = uuid::Uuid::new_v4();
    info!(
        batch_id = %batch_id,
        count = updates.len(),
        "Dispatching association batch"
    );

    let calls = updates.iter().map(|update| async move {
        let start = Instant::now();
        match api.replace_term_associations(update).await {
            Ok(response) => BatchRequestResult::success(
                update.clone(),
                response,
                start.elapsed().as_millis() as u64,
            ),
            Err(e) => {
                warn!(
                    term = %update.from_term_code,
                    error = %e,
                    "Association update failed"
                );
                BatchRequestResult::failure(
                    update.clone(),
                    e.to_string(),
                    start.elapsed().as_millis() as u64,
                )
            }
        }
    });

    let results = join_all(calls).await;

    // Publish is sequenced strictly after the fan-out settles and must not
    // fail a batch that otherwise succeeded.
    let framework_code = &updates[0].framework_code;
    if let Err(e) = api
        .publish_framework(framework_code, "association updates", channel_id)
        .await
    {
        warn!(
            framework = %framework_code,
            error = %e,
            "Post-batch publish failed"
        );
    }

    let failures = results.iter().filter(|r| !r.success).count();
    info!(
        batch_id = %batch_id,
        total = results.len(),
        failures,
        "Association batch settled"
    );

    Ok(results)
}

/// Merge fresh batch outcomes into a prior result set.
///
/// An entry of `prev` whose input matches a fresh outcome (by stable
/// serialization of the input) is replaced in place; untouched entries keep
/// their order; fresh outcomes with no prior counterpart are appended.
pub fn merge_batch_results(
    prev: &[BatchRequestResult],
    fresh: Vec<BatchRequestResult>,
) -> Vec<BatchRequestResult> {
    let mut fresh: Vec<Option<BatchRequestResult>> = fresh.into_iter().map(Some).collect();

    let mut merged = Vec::with_capacity(prev.len());
    for old in prev {
        let key = input_key(&old.input);
        let replacement = fresh
            .iter_mut()
            .find(|slot| {
                slot.as_ref()
                    .map_or(false, |r| input_key(&r.input) == key)
            })
            .and_then(Option::take);
        merged.push(replacement.unwrap_or_else(|| old.clone()));
    }

    merged.extend(fresh.into_iter().flatten());
    merged
}

fn input_key(input: &AssociationUpdate) -> String {
    serde_json::to_string(input).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockApi;

    fn update(term: &str) -> AssociationUpdate {
        AssociationUpdate {
            from_term_code: term.to_string(),
            framework_code: "fw-1".to_string(),
            category_code: "cat-a".to_string(),
            associations: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_batch_captures_partial_failure() {
        let api = MockApi::new().with_failure_for("t2");
        let updates = vec![update("t1"), update("t2"), update("t3")];

        let results = api
            .batch_replace_associations(&updates, None)
            .await
            .unwrap();

        assert_eq!(results.len(), 3);
        assert!(results[0].success);
        assert!(!results[1].success);
        assert!(results[2].success);
        assert_eq!(results[1].input.from_term_code, "t2");
        assert!(results[1].error.is_some());

        // Publish still runs exactly once after the fan-out settles.
        assert_eq!(api.publish_count(), 1);
    }

    #[tokio::test]
    async fn test_empty_batch_skips_publish() {
        let api = MockApi::new();
        let results = api.batch_replace_associations(&[], None).await.unwrap();

        assert!(results.is_empty());
        assert_eq!(api.publish_count(), 0);
    }

    #[tokio::test]
    async fn test_publish_failure_does_not_fail_batch() {
        let api = MockApi::new().with_publish_failure();
        let updates = vec![update("t1"), update("t2")];

        let results = api
            .batch_replace_associations(&updates, None)
            .await
            .unwrap();

        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.success));
        assert_eq!(api.publish_count(), 1);
    }

    #[tokio::test]
    async fn test_retry_delegates_to_batch() {
        let api = MockApi::new();
        let results = api.retry_batch(&[update("t1")], None).await.unwrap();

        assert_eq!(results.len(), 1);
        assert!(results[0].success);
        assert_eq!(api.call_count(), 1);
    }

    #[test]
    fn test_merge_replaces_matching_entry_in_place() {
        let prev = vec![
            BatchRequestResult::failure(update("t1"), "boom", 1),
            BatchRequestResult::success(update("t2"), ApiResponse::ok(), 1),
            BatchRequestResult::failure(update("t3"), "boom", 1),
        ];
        let fresh = vec![
            BatchRequestResult::success(update("t3"), ApiResponse::ok(), 2),
            BatchRequestResult::success(update("t1"), ApiResponse::ok(), 2),
        ];

        let merged = merge_batch_results(&prev, fresh);

        assert_eq!(merged.len(), 3);
        assert_eq!(merged[0].input.from_term_code, "t1");
        assert!(merged[0].success);
        assert_eq!(merged[1].input.from_term_code, "t2");
        assert_eq!(merged[2].input.from_term_code, "t3");
        assert!(merged[2].success);
    }

    #[test]
    fn test_merge_appends_unmatched_fresh_entries() {
        let prev = vec![BatchRequestResult::failure(update("t1"), "boom", 1)];
        let fresh = vec![
            BatchRequestResult::success(update("t1"), ApiResponse::ok(), 2),
            BatchRequestResult::success(update("t9"), ApiResponse::ok(), 2),
        ];

        let merged = merge_batch_results(&prev, fresh);

        assert_eq!(merged.len(), 2);
        assert!(merged[0].success);
        assert_eq!(merged[1].input.from_term_code, "t9");
    }
}
