//! Rust client for the framework service association API
//!
//! # Example
//!
//! ```rust,no_run
//! use taxa_client::{AssociationApi, FrameworkClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! // Connection parameters come from TAXA_* environment variables
//! let client = FrameworkClient::from_env()?;
//!
//! // Fetch the framework hierarchy
//! let framework = client.get_framework("fw-competencies").await?;
//! println!("{} categories", framework.categories.len());
//!
//! // Issue association updates as a batch; one result per update,
//! // failures captured instead of thrown
//! let results = client.batch_replace_associations(&[], None).await?;
//! for result in &results {
//!     println!("{}: {}", result.input.from_term_code, result.success);
//! }
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod mock;
pub mod types;

// Re-export main types
pub use api::{merge_batch_results, AssociationApi};
pub use client::FrameworkClient;
pub use config::ClientConfig;
pub use error::{ClientError, Result};
pub use mock::MockApi;
pub use types::{ApiResponse, AssociationUpdate, BatchRequestResult, ResponseParams};
