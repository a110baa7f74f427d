//! Engine-side value types.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use taxa_model::{Association, Category, Term};

/// Checked term codes per target category, keyed by category code.
///
/// Ordered keys keep commit payloads deterministic for a given selection
/// regardless of the order categories were toggled in.
pub type CheckedTermCodesMap = BTreeMap<String, Vec<String>>;

/// A normalized selector change from the hosting surface.
///
/// Hosts translate whatever event shape their toolkit produces into this
/// pair; the engine only ever branches on the field name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldChange {
    /// Field name, e.g. "category" or "term"
    pub name: String,
    /// Newly selected value (a code)
    pub value: String,
}

impl FieldChange {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// The term whose persisted association set is being revised.
///
/// While set, a staged entry for exactly this (term, category) pair commits
/// with replace semantics, so unchecked targets actually get removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditTarget {
    /// Source term code
    pub term_code: String,
    /// Code of the source term's category
    pub category_code: String,
}

/// Payload behind the read-only association detail view.
#[derive(Debug, Clone, Default)]
pub struct AssociationDetail {
    /// The term whose associations are shown
    pub term: Option<Term>,
    /// The target category the view is filtered to
    pub category: Option<Category>,
    /// The term's associations within that category
    pub associations: Vec<Association>,
}
