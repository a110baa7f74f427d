//! Mock association repository for testing.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;

use crate::api::{run_batch, AssociationApi};
use crate::error::{ClientError, Result};
use crate::types::{ApiResponse, AssociationUpdate, BatchRequestResult};

/// Mock association repository for testing.
///
/// Records every update it receives; failures can be scripted per term
/// code, for the publish step, or for the batch as a whole.
pub struct MockApi {
    updates: Mutex<Vec<AssociationUpdate>>,
    fail_term_codes: Mutex<HashSet<String>>,
    total_failure: AtomicBool,
    fail_publish: AtomicBool,
    call_count: AtomicU32,
    publish_count: AtomicU32,
    response: ApiResponse,
}

impl MockApi {
    /// Create a mock that accepts every update.
    pub fn new() -> Self {
        Self {
            updates: Mutex::new(Vec::new()),
            fail_term_codes: Mutex::new(HashSet::new()),
            total_failure: AtomicBool::new(false),
            fail_publish: AtomicBool::new(false),
            call_count: AtomicU32::new(0),
            publish_count: AtomicU32::new(0),
            response: ApiResponse::ok(),
        }
    }

    /// Fail every update for the given term code.
    pub fn with_failure_for(self, term_code: impl Into<String>) -> Self {
        self.fail_term_codes
            .lock()
            .unwrap()
            .insert(term_code.into());
        self
    }

    /// Fail whole batches instead of individual updates.
    pub fn with_total_failure(self) -> Self {
        self.total_failure.store(true, Ordering::SeqCst);
        self
    }

    /// Fail the post-batch publish call.
    pub fn with_publish_failure(self) -> Self {
        self.fail_publish.store(true, Ordering::SeqCst);
        self
    }

    /// Set the envelope returned for successful updates.
    pub fn with_response(mut self, response: ApiResponse) -> Self {
        self.response = response;
        self
    }

    /// Stop failing scripted updates, batches, and publishes.
    pub fn clear_failures(&self) {
        self.fail_term_codes.lock().unwrap().clear();
        self.total_failure.store(false, Ordering::SeqCst);
        self.fail_publish.store(false, Ordering::SeqCst);
    }

    /// Every update received so far, in arrival order.
    pub fn recorded_updates(&self) -> Vec<AssociationUpdate> {
        self.updates.lock().unwrap().clone()
    }

    /// Number of term update calls received.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Number of publish calls received.
    pub fn publish_count(&self) -> u32 {
        self.publish_count.load(Ordering::SeqCst)
    }
}

impl Default for MockApi {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AssociationApi for MockApi {
    async fn replace_term_associations(&self, update: &AssociationUpdate) -> Result<ApiResponse> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.updates.lock().unwrap().push(update.clone());

        if self
            .fail_term_codes
            .lock()
            .unwrap()
            .contains(&update.from_term_code)
        {
            return Err(ClientError::RequestFailed {
                status: 500,
                message: format!("scripted failure for {}", update.from_term_code),
            });
        }

        Ok(self.response.clone())
    }

    async fn publish_framework(
        &self,
        _framework_code: &str,
        _reason: &str,
        _channel_id: Option<&str>,
    ) -> Result<ApiResponse> {
        self.publish_count.fetch_add(1, Ordering::SeqCst);

        if self.fail_publish.load(Ordering::SeqCst) {
            return Err(ClientError::Network("publish unavailable".to_string()));
        }

        Ok(ApiResponse::ok())
    }

    async fn batch_replace_associations(
        &self,
        updates: &[AssociationUpdate],
        channel_id: Option<&str>,
    ) -> Result<Vec<BatchRequestResult>> {
        if self.total_failure.load(Ordering::SeqCst) {
            return Err(ClientError::Network("connection reset by peer".to_string()));
        }
        run_batch(self, updates, channel_id).await
    }
}
