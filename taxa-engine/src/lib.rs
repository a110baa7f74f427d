//! Association reconciliation engine for taxonomy editing sessions
//!
//! Sits between an editing surface and the framework service: the engine
//! tracks selection and checkbox state, stages association sets per term,
//! and commits them as concurrent batches with per-item failure capture
//! and retry. The category tree itself stays with the host behind the
//! [`TermStore`] trait.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use taxa_client::FrameworkClient;
//! use taxa_engine::{AssociationEngine, InMemoryStore};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Arc::new(FrameworkClient::from_env()?);
//! let framework = client.get_framework("fw-competencies").await?;
//!
//! let store = InMemoryStore::from_framework(&framework);
//! let mut engine = AssociationEngine::new(store, client);
//!
//! // Check a target term for the seeded source term, stage, commit.
//! engine.handle_toggle_term("t5");
//! engine.handle_save_associations();
//! engine.handle_batch_save_associations().await;
//!
//! for result in engine.batch_results().unwrap_or(&[]) {
//!     println!("{}: {}", result.input.from_term_code, result.success);
//! }
//! # Ok(())
//! # }
//! ```

pub mod engine;
pub mod reconcile;
pub mod store;
pub mod types;

// Re-export main types
pub use engine::AssociationEngine;
pub use reconcile::{build_associations_from_checked, merge_associations, merge_by_identifier};
pub use store::{InMemoryStore, TermStore};
pub use types::{AssociationDetail, CheckedTermCodesMap, EditTarget, FieldChange};
