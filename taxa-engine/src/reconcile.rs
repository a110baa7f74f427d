//! Pure association-set construction and merging.
//!
//! Everything here is a total function over borrowed data; the engine calls
//! these to turn checkbox state into association lists and to reconcile
//! staged sets with already-persisted ones.

use taxa_model::{Association, Category};

use crate::types::CheckedTermCodesMap;

/// Materialize a checked-selection map into an association list.
///
/// Each checked code resolves against its target category in `categories`,
/// taking name, identifier, description, status, and index from the
/// authoritative tree rather than from whatever the selection UI knew.
/// Unknown category codes and term codes are skipped. Output order is
/// category-code order, then store term order within a category.
pub fn build_associations_from_checked(
    categories: &[Category],
    checked: &CheckedTermCodesMap,
) -> Vec<Association> {
    let mut associations = Vec::new();

    for (category_code, checked_codes) in checked {
        if checked_codes.is_empty() {
            continue;
        }
        let Some(category) = categories.iter().find(|c| &c.code == category_code) else {
            continue;
        };

        for term in &category.terms {
            if checked_codes.iter().any(|code| code == &term.code) {
                associations.push(Association {
                    name: term.name.clone(),
                    identifier: term.identifier.clone(),
                    code: term.code.clone(),
                    category: category_code.clone(),
                    status: term.status.clone(),
                    description: term.description.clone(),
                    index: term.index,
                });
            }
        }
    }

    associations
}

/// Union of an existing and an incoming association list, deduplicated by
/// (target code, target category).
///
/// Existing entries keep their position and win conflicts; non-duplicate
/// incoming entries are appended in their own order.
pub fn merge_associations(existing: &[Association], incoming: &[Association]) -> Vec<Association> {
    let mut merged = existing.to_vec();
    for candidate in incoming {
        let duplicate = merged
            .iter()
            .any(|a| a.code == candidate.code && a.category == candidate.category);
        if !duplicate {
            merged.push(candidate.clone());
        }
    }
    merged
}

/// Union of persisted and staged associations, deduplicated by target
/// identifier, persisted entries first.
///
/// This is the additive commit payload: links a term already holds are never
/// dropped just because the current staging round didn't re-check them.
pub fn merge_by_identifier(persisted: &[Association], staged: &[Association]) -> Vec<Association> {
    let mut merged = persisted.to_vec();
    for candidate in staged {
        if !merged.iter().any(|a| a.identifier == candidate.identifier) {
            merged.push(candidate.clone());
        }
    }
    merged
}
