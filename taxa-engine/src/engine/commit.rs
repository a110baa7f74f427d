//! Commit and retry: pushing staged association sets to the service.

use std::sync::Arc;

use tracing::{debug, warn};

use taxa_client::{merge_batch_results, AssociationUpdate, BatchRequestResult};
use taxa_model::{Association, SaveMode, WorkingAssociation};

use crate::reconcile::{build_associations_from_checked, merge_by_identifier};
use crate::store::TermStore;

use super::AssociationEngine;

impl<S: TermStore> AssociationEngine<S> {
    /// Commit every staged association set, plus any still-checked
    /// selections for the current source term, as one concurrent batch.
    ///
    /// Merge-mode entries are unioned with the term's persisted set before
    /// sending; replace-mode entries go verbatim. Each successful update is
    /// applied back into the store; failed ones are not, and stay visible
    /// in [`Self::batch_results`] for retry. Once the batch settles with
    /// results, the working list, checked map, and edit target are cleared.
    /// A transport-level failure of the whole batch instead synthesizes a
    /// failed result per update and leaves all staged state intact.
    pub async fn handle_batch_save_associations(&mut self) {
        let Some(framework_code) = self.store.framework_code().map(str::to_string) else {
            warn!("Commit skipped: store has no framework code");
            return;
        };

        self.batch_loading = true;
        self.batch_results = None;

        let mut entries = self.working.clone();
        if let Some(staged) = self.stage_current_selection() {
            entries.retain(|e| !(e.code == staged.code && e.category_code == staged.category_code));
            entries.push(staged);
        }

        if entries.is_empty() {
            self.batch_loading = false;
            return;
        }

        let updates: Vec<AssociationUpdate> = entries
            .iter()
            .map(|entry| AssociationUpdate {
                from_term_code: entry.code.clone(),
                framework_code: framework_code.clone(),
                category_code: entry.category_code.clone(),
                associations: self.payload_for(entry),
            })
            .collect();

        let channel = self.store.channel_id().map(str::to_string);
        let api = Arc::clone(&self.api);

        match api
            .batch_replace_associations(&updates, channel.as_deref())
            .await
        {
            Ok(results) => {
                for result in &results {
                    if result.success {
                        self.apply_update(&result.input);
                    }
                }

                let settled = !results.is_empty();
                self.batch_results = Some(results);
                if settled {
                    self.working.clear();
                    self.checked.clear();
                    self.edit_target = None;
                }
            }
            Err(e) => {
                warn!(error = %e, "Association batch failed as a whole");
                self.batch_results = Some(
                    updates
                        .iter()
                        .map(|update| BatchRequestResult::failure(update.clone(), e.to_string(), 0))
                        .collect(),
                );
            }
        }

        self.batch_loading = false;
    }

    /// Re-submit previously failed updates and fold the outcomes into the
    /// existing result list.
    ///
    /// Retried entries are replaced in place without reordering their
    /// siblings; successes are applied to the store the same way first-pass
    /// successes are. A transport-level failure synthesizes failed results
    /// for the retried inputs only.
    pub async fn handle_retry_batch_requests(&mut self, failed_inputs: Vec<AssociationUpdate>) {
        if failed_inputs.is_empty() {
            return;
        }

        self.batch_loading = true;

        let channel = self.store.channel_id().map(str::to_string);
        let api = Arc::clone(&self.api);

        let fresh = match api.retry_batch(&failed_inputs, channel.as_deref()).await {
            Ok(results) => results,
            Err(e) => {
                warn!(error = %e, "Association retry failed as a whole");
                failed_inputs
                    .iter()
                    .map(|update| BatchRequestResult::failure(update.clone(), e.to_string(), 0))
                    .collect()
            }
        };

        for result in &fresh {
            if result.success {
                self.apply_update(&result.input);
            }
        }

        self.batch_results = match self.batch_results.take() {
            Some(prev) => Some(merge_batch_results(&prev, fresh)),
            None => Some(fresh),
        };

        self.batch_loading = false;
    }

    /// Fold the current checked selections into one working entry for the
    /// selected term, if they build to anything.
    fn stage_current_selection(&self) -> Option<WorkingAssociation> {
        if !self.checked.values().any(|codes| !codes.is_empty()) {
            return None;
        }
        let category = self.selected_category()?;
        let term = self.selected_term()?;

        let built = build_associations_from_checked(self.store.categories(), &self.checked);
        if built.is_empty() {
            return None;
        }

        let mode = self.mode_for(&term.code, &category.code);
        Some(WorkingAssociation::new(term, category, built, mode))
    }

    /// The outbound association set for one staged entry.
    fn payload_for(&self, entry: &WorkingAssociation) -> Vec<Association> {
        match entry.mode {
            SaveMode::Replace => entry.associations.clone(),
            SaveMode::Merge => merge_by_identifier(
                self.persisted_associations(&entry.category_code, &entry.code),
                &entry.associations,
            ),
        }
    }

    fn persisted_associations(&self, category_code: &str, term_code: &str) -> &[Association] {
        self.store
            .categories()
            .iter()
            .find(|c| c.code == category_code)
            .and_then(|c| c.terms.iter().find(|t| t.code == term_code))
            .map(|t| t.associations.as_slice())
            .unwrap_or(&[])
    }

    /// Write a committed association set back into the store, resolving the
    /// term's current position by code.
    fn apply_update(&mut self, input: &AssociationUpdate) {
        let position = self
            .store
            .categories()
            .iter()
            .position(|c| c.code == input.category_code)
            .and_then(|category_index| {
                self.store.categories()[category_index]
                    .terms
                    .iter()
                    .position(|t| t.code == input.from_term_code)
                    .map(|term_index| (category_index, term_index))
            });

        match position {
            Some((category_index, term_index)) => {
                self.store.update_term_associations(
                    category_index,
                    term_index,
                    input.associations.clone(),
                );
            }
            None => debug!(
                term = %input.from_term_code,
                category = %input.category_code,
                "Committed term no longer present in store"
            ),
        }
    }
}
