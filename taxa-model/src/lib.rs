//! Domain model for taxonomy frameworks.
//!
//! A framework holds sibling categories; categories own terms; terms hold
//! denormalized association edges pointing at terms in other categories.
//! This crate defines those value types plus the pure read-model helpers
//! shared by the editing engine and presentation adapters.

pub mod types;
pub mod views;

// Re-export main types
pub use types::{
    Association, CategorizedTerm, Category, Framework, SaveMode, Term, WorkingAssociation,
    LIVE_STATUS,
};
pub use views::{
    all_terms_with_categories, group_associations_by_category, live_categories, live_terms,
};
