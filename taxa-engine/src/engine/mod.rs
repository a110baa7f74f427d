//! The association reconciliation engine.
//!
//! Tracks one editing session over a [`TermStore`] category tree: which
//! source (category, term) pair is being edited, which target category is
//! open, which target terms are checked, and which association sets are
//! staged for commit. All handlers run to completion and leave the engine
//! in a renderable state; only the commit/retry pair suspends, and only at
//! the network calls.

mod commit;

use std::sync::Arc;

use tracing::debug;

use taxa_client::{AssociationApi, BatchRequestResult};
use taxa_model::{
    all_terms_with_categories, CategorizedTerm, Category, SaveMode, Term, WorkingAssociation,
};

use crate::reconcile::{build_associations_from_checked, merge_associations};
use crate::store::TermStore;
use crate::types::{AssociationDetail, CheckedTermCodesMap, EditTarget, FieldChange};

/// Association editing session over a category tree.
///
/// The selection model mirrors the editing surface: one source (category,
/// term) pair whose associations are being built, and one open target
/// category whose terms are being checked. Checked codes accumulate per
/// target category; [`Self::handle_save_associations`] banks them into the
/// working list; [`Self::handle_batch_save_associations`] commits every
/// working entry concurrently through the [`AssociationApi`].
pub struct AssociationEngine<S: TermStore> {
    store: S,
    api: Arc<dyn AssociationApi>,

    selected_category_code: Option<String>,
    selected_term_code: Option<String>,
    selected_available_category_code: Option<String>,

    checked: CheckedTermCodesMap,
    working: Vec<WorkingAssociation>,
    edit_target: Option<EditTarget>,

    batch_loading: bool,
    batch_results: Option<Vec<BatchRequestResult>>,

    modal_open: bool,
    modal: AssociationDetail,
}

impl<S: TermStore> AssociationEngine<S> {
    /// Create an engine over the given store and repository.
    ///
    /// Seeds the selection with the first category that has terms, its
    /// first term, and the first other category as the open target. The
    /// checked map starts empty; persisted associations only hydrate it
    /// through navigation or the edit flow.
    pub fn new(store: S, api: Arc<dyn AssociationApi>) -> Self {
        let first_category = store.categories().iter().find(|c| !c.terms.is_empty());
        let selected_category_code = first_category.map(|c| c.code.clone());
        let selected_term_code = first_category
            .and_then(|c| c.terms.first())
            .map(|t| t.code.clone());
        let selected_available_category_code = store
            .categories()
            .iter()
            .filter(|c| !c.terms.is_empty())
            .find(|c| Some(&c.code) != selected_category_code.as_ref())
            .map(|c| c.code.clone());

        Self {
            store,
            api,
            selected_category_code,
            selected_term_code,
            selected_available_category_code,
            checked: CheckedTermCodesMap::new(),
            working: Vec::new(),
            edit_target: None,
            batch_loading: false,
            batch_results: None,
            modal_open: false,
            modal: AssociationDetail::default(),
        }
    }

    // ==================== Selection ====================

    /// Route a normalized selector change to the matching handler.
    pub fn handle_field_change(&mut self, change: &FieldChange) {
        match change.name.as_str() {
            "category" => self.handle_category_change(&change.value),
            "term" => self.handle_term_change(&change.value),
            _ => debug!(field = %change.name, "Ignoring unknown field change"),
        }
    }

    /// Select the source category.
    ///
    /// Resets the source term to that category's first term and reopens the
    /// first other category as the target. Checked and working state are
    /// left untouched.
    pub fn handle_category_change(&mut self, category_code: &str) {
        self.selected_category_code = Some(category_code.to_string());

        self.selected_term_code = self
            .store
            .categories()
            .iter()
            .find(|c| c.code == category_code)
            .and_then(|c| c.terms.first())
            .map(|t| t.code.clone());

        self.selected_available_category_code = self
            .store
            .categories()
            .iter()
            .filter(|c| !c.terms.is_empty())
            .find(|c| c.code != category_code)
            .map(|c| c.code.clone());
    }

    /// Select the source term.
    ///
    /// If no checkbox work is pending anywhere, the checked map is
    /// rehydrated from the term's persisted associations, one entry per
    /// available category. Pending work is never discarded by navigation;
    /// initial load pulls from persisted state, mid-edit navigation keeps
    /// local state.
    pub fn handle_term_change(&mut self, term_code: &str) {
        self.selected_term_code = Some(term_code.to_string());

        if self.checked.values().any(|codes| !codes.is_empty()) {
            return;
        }

        let Some(term) = self
            .selected_category()
            .and_then(|c| c.terms.iter().find(|t| t.code == term_code))
        else {
            return;
        };

        let mut rehydrated = CheckedTermCodesMap::new();
        for category in self.available_categories() {
            rehydrated.insert(
                category.code.clone(),
                term.associations
                    .iter()
                    .filter(|a| a.category == category.code)
                    .map(|a| a.code.clone())
                    .collect(),
            );
        }
        self.checked = rehydrated;
    }

    /// Open a target category. Checked lists of other categories persist.
    pub fn handle_available_category_click(&mut self, category_code: &str) {
        self.selected_available_category_code = Some(category_code.to_string());
    }

    /// Flip one term's membership in the open target category's checked
    /// list.
    pub fn handle_toggle_term(&mut self, term_code: &str) {
        let Some(category_code) = self.selected_available_category_code.clone() else {
            return;
        };

        let codes = self.checked.entry(category_code).or_default();
        match codes.iter().position(|code| code == term_code) {
            Some(index) => {
                codes.remove(index);
            }
            None => codes.push(term_code.to_string()),
        }
    }

    // ==================== Staging ====================

    /// Bank the current checked selections into the working list for the
    /// selected source term.
    ///
    /// An existing working entry for the same (term, category) absorbs the
    /// built set, deduplicated on (code, category), keeping its position
    /// and save mode; otherwise a new entry is appended. The checked map is
    /// cleared only when something was actually staged.
    pub fn handle_save_associations(&mut self) {
        let Some((category, term)) = self
            .selected_category()
            .zip(self.selected_term())
            .map(|(c, t)| (c.clone(), t.clone()))
        else {
            return;
        };

        let built = build_associations_from_checked(self.store.categories(), &self.checked);
        if built.is_empty() {
            return;
        }

        let existing = self
            .working
            .iter()
            .position(|w| w.code == term.code && w.category_code == category.code);

        match existing {
            Some(index) => {
                let entry = &mut self.working[index];
                entry.associations = merge_associations(&entry.associations, &built);
            }
            None => {
                let mode = self.mode_for(&term.code, &category.code);
                self.working
                    .push(WorkingAssociation::new(&term, &category, built, mode));
            }
        }

        self.checked.clear();
    }

    /// Re-enter the selection state for an already-persisted association
    /// set so it can be revised.
    ///
    /// The term becomes the source selection, the first other category
    /// opens as the target, and the checked map is rebuilt from the term's
    /// persisted associations grouped by target category. The pair is
    /// marked as the edit target and any entry already staged for it
    /// switches to replace mode, so the commit replaces instead of merges
    /// and unchecked targets actually get removed.
    pub fn handle_edit_association(&mut self, entry: &CategorizedTerm) {
        self.selected_category_code = Some(entry.category_code.clone());
        self.selected_term_code = Some(entry.term.code.clone());

        self.selected_available_category_code = self
            .store
            .categories()
            .iter()
            .filter(|c| !c.terms.is_empty())
            .find(|c| c.code != entry.category_code)
            .map(|c| c.code.clone());

        let mut rehydrated = CheckedTermCodesMap::new();
        for association in &entry.term.associations {
            rehydrated
                .entry(association.category.clone())
                .or_default()
                .push(association.code.clone());
        }
        self.checked = rehydrated;

        self.edit_target = Some(EditTarget {
            term_code: entry.term.code.clone(),
            category_code: entry.category_code.clone(),
        });

        // A working entry staged before the edit began commits as a
        // replacement too.
        if let Some(staged) = self
            .working
            .iter_mut()
            .find(|w| w.code == entry.term.code && w.category_code == entry.category_code)
        {
            staged.mode = SaveMode::Replace;
        }
    }

    /// Abandon all checked and working state. No network calls.
    pub fn handle_clear_all_associations(&mut self) {
        self.checked.clear();
        self.working.clear();
        self.edit_target = None;
    }

    /// Save mode a freshly staged entry gets for this (term, category).
    fn mode_for(&self, term_code: &str, category_code: &str) -> SaveMode {
        let editing = self.edit_target.as_ref().map_or(false, |target| {
            target.term_code == term_code && target.category_code == category_code
        });
        if editing {
            SaveMode::Replace
        } else {
            SaveMode::Merge
        }
    }

    // ==================== Detail modal ====================

    /// Open the detail view for a term's associations into one category.
    pub fn handle_chip_click(&mut self, term: &Term, category: Option<&Category>) {
        let associations = term
            .associations
            .iter()
            .filter(|a| Some(a.category.as_str()) == category.map(|c| c.code.as_str()))
            .cloned()
            .collect();

        self.modal = AssociationDetail {
            term: Some(term.clone()),
            category: category.cloned(),
            associations,
        };
        self.modal_open = true;
    }

    /// Close the detail view; the payload stays in place.
    pub fn handle_close_modal(&mut self) {
        self.modal_open = false;
    }

    // ==================== Read models ====================

    /// Whether any checked or working state would be lost by navigating
    /// away. Wizard hosts gate step navigation on this.
    pub fn has_unsaved_associations(&self) -> bool {
        self.checked.values().any(|codes| !codes.is_empty()) || !self.working.is_empty()
    }

    /// Categories that can act as association sources (those with terms).
    pub fn categories_with_terms(&self) -> Vec<&Category> {
        self.store
            .categories()
            .iter()
            .filter(|c| !c.terms.is_empty())
            .collect()
    }

    /// The selected source category.
    pub fn selected_category(&self) -> Option<&Category> {
        let code = self.selected_category_code.as_deref()?;
        self.store
            .categories()
            .iter()
            .filter(|c| !c.terms.is_empty())
            .find(|c| c.code == code)
    }

    /// The selected source term.
    pub fn selected_term(&self) -> Option<&Term> {
        let code = self.selected_term_code.as_deref()?;
        self.selected_category()?
            .terms
            .iter()
            .find(|t| t.code == code)
    }

    /// Categories offered as association targets: every category with
    /// terms except the selected source category.
    pub fn available_categories(&self) -> Vec<&Category> {
        self.store
            .categories()
            .iter()
            .filter(|c| !c.terms.is_empty())
            .filter(|c| Some(c.code.as_str()) != self.selected_category_code.as_deref())
            .collect()
    }

    /// The open target category.
    pub fn selected_available_category(&self) -> Option<&Category> {
        let code = self.selected_available_category_code.as_deref()?;
        self.available_categories()
            .into_iter()
            .find(|c| c.code == code)
    }

    /// Terms listed in the open target category.
    pub fn terms_in_available_category(&self) -> &[Term] {
        self.selected_available_category()
            .map(|c| c.terms.as_slice())
            .unwrap_or(&[])
    }

    /// Checked term codes in the open target category.
    pub fn checked_term_codes(&self) -> &[String] {
        let Some(code) = self.selected_available_category_code.as_deref() else {
            return &[];
        };
        self.checked.get(code).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The full checked map across target categories.
    pub fn checked_map(&self) -> &CheckedTermCodesMap {
        &self.checked
    }

    /// Staged association sets awaiting commit.
    pub fn working_associations(&self) -> &[WorkingAssociation] {
        &self.working
    }

    /// Every term holding at least one persisted association, annotated
    /// with its owning category.
    pub fn all_terms_with_associations(&self) -> Vec<CategorizedTerm> {
        all_terms_with_categories(self.store.categories())
            .into_iter()
            .filter(|entry| !entry.term.associations.is_empty())
            .collect()
    }

    /// Whether a commit or retry is in flight.
    pub fn batch_loading(&self) -> bool {
        self.batch_loading
    }

    /// Outcomes of the last commit or retry, one per update.
    pub fn batch_results(&self) -> Option<&[BatchRequestResult]> {
        self.batch_results.as_deref()
    }

    /// The (term, category) pair currently being revised, if any.
    pub fn edit_target(&self) -> Option<&EditTarget> {
        self.edit_target.as_ref()
    }

    /// Whether the detail view is open.
    pub fn modal_open(&self) -> bool {
        self.modal_open
    }

    /// Payload of the detail view.
    pub fn modal_detail(&self) -> &AssociationDetail {
        &self.modal
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Mutable access to the underlying store, for tree refreshes.
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }
}
