//! Access to the category tree the engine reconciles against.

use tracing::debug;

use taxa_model::{Association, Category, Framework};

/// The engine's window onto the hosting application's category tree.
///
/// The engine never owns the tree. Hosts keep it wherever suits them (a
/// fetched snapshot, a binding into a UI store) and expose it through this
/// trait; the engine reads the tree to resolve selections and writes back
/// committed association sets by position.
pub trait TermStore {
    /// Code of the framework the tree belongs to, when known.
    ///
    /// Commits are refused while this is `None`.
    fn framework_code(&self) -> Option<&str>;

    /// Channel identifier forwarded to the service on mutating calls.
    fn channel_id(&self) -> Option<&str>;

    /// The category tree, in service order.
    fn categories(&self) -> &[Category];

    /// Overwrite the associations of the term at the given position.
    ///
    /// Positions index into [`Self::categories`] and the category's `terms`.
    /// Out-of-range positions are ignored.
    fn update_term_associations(
        &mut self,
        category_index: usize,
        term_index: usize,
        associations: Vec<Association>,
    );
}

/// Self-contained [`TermStore`] over an owned category tree.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    framework_code: Option<String>,
    channel_id: Option<String>,
    categories: Vec<Category>,
}

impl InMemoryStore {
    /// Create a store over the given categories.
    pub fn new(categories: Vec<Category>) -> Self {
        Self {
            framework_code: None,
            channel_id: None,
            categories,
        }
    }

    /// Build a store from a fetched framework, keeping its code and channel.
    pub fn from_framework(framework: &Framework) -> Self {
        Self {
            framework_code: Some(framework.code.clone()),
            channel_id: framework.channel.clone(),
            categories: framework.categories.clone(),
        }
    }

    /// Set the framework code.
    pub fn with_framework_code(mut self, code: impl Into<String>) -> Self {
        self.framework_code = Some(code.into());
        self
    }

    /// Set the channel identifier.
    pub fn with_channel_id(mut self, channel_id: impl Into<String>) -> Self {
        self.channel_id = Some(channel_id.into());
        self
    }
}

impl TermStore for InMemoryStore {
    fn framework_code(&self) -> Option<&str> {
        self.framework_code.as_deref()
    }

    fn channel_id(&self) -> Option<&str> {
        self.channel_id.as_deref()
    }

    fn categories(&self) -> &[Category] {
        &self.categories
    }

    fn update_term_associations(
        &mut self,
        category_index: usize,
        term_index: usize,
        associations: Vec<Association>,
    ) {
        let Some(term) = self
            .categories
            .get_mut(category_index)
            .and_then(|category| category.terms.get_mut(term_index))
        else {
            debug!(
                category_index,
                term_index, "Skipping association write to unknown position"
            );
            return;
        };
        term.associations = associations;
    }
}
