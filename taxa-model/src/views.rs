//! Pure read-model helpers over the category tree.
//!
//! Missing or malformed input yields an empty collection, never a panic;
//! the category tree is fed by an external collaborator and may be absent
//! or partially loaded at any point.

use std::collections::BTreeMap;

use crate::types::{Association, CategorizedTerm, Category, Framework, Term, LIVE_STATUS};

/// Categories of a framework that are in Live status.
pub fn live_categories(framework: Option<&Framework>) -> Vec<&Category> {
    match framework {
        Some(framework) => framework.categories.iter().filter(|c| c.is_live()).collect(),
        None => Vec::new(),
    }
}

/// Terms of a category that are in Live status.
pub fn live_terms(category: Option<&Category>) -> Vec<&Term> {
    match category {
        Some(category) => category.terms.iter().filter(|t| t.is_live()).collect(),
        None => Vec::new(),
    }
}

/// Group a flat association list into synthetic display categories, one per
/// distinct target category, ordered by category code.
///
/// Each association is materialized as a `Term` under its target category so
/// detail views can render the groups with ordinary term components. This is
/// a display shape only, not a persistence model.
pub fn group_associations_by_category(associations: &[Association]) -> Vec<Category> {
    let mut grouped: BTreeMap<&str, Vec<&Association>> = BTreeMap::new();
    for association in associations {
        if association.category.is_empty() {
            continue;
        }
        grouped
            .entry(association.category.as_str())
            .or_default()
            .push(association);
    }

    grouped
        .into_iter()
        .map(|(code, group)| Category {
            identifier: code.to_string(),
            name: capitalize(code),
            code: code.to_string(),
            status: LIVE_STATUS.to_string(),
            description: None,
            terms: group.into_iter().map(association_as_term).collect(),
            index: None,
        })
        .collect()
}

/// Flatten all terms across categories, annotating each with its owning
/// category.
pub fn all_terms_with_categories(categories: &[Category]) -> Vec<CategorizedTerm> {
    categories
        .iter()
        .flat_map(|category| {
            category.terms.iter().map(|term| {
                let mut term = term.clone();
                term.category = Some(category.code.clone());
                CategorizedTerm {
                    term,
                    category_name: category.name.clone(),
                    category_code: category.code.clone(),
                }
            })
        })
        .collect()
}

fn association_as_term(association: &Association) -> Term {
    Term {
        name: association.name.clone(),
        code: association.code.clone(),
        identifier: association.identifier.clone(),
        status: association.status.clone(),
        description: association.description.clone(),
        label: None,
        associations: Vec::new(),
        index: association.index,
        category: Some(association.category.clone()),
    }
}

fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
