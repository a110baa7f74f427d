//! Core domain types for taxonomy frameworks.

use serde::{Deserialize, Serialize};

/// Status value the framework service assigns to published entities.
///
/// Other statuses (Draft, Retired) pass through untouched; this crate only
/// ever branches on Live.
pub const LIVE_STATUS: &str = "Live";

/// A directed association edge from a source term to a target term in
/// another category.
///
/// Associations are stored denormalized on the source term. The identity of
/// an edge is (source term code, target identifier, target category).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Association {
    /// Display name of the target term
    pub name: String,
    /// Identifier of the target term
    pub identifier: String,
    /// Code of the target term
    pub code: String,
    /// Code of the category the target term lives in
    pub category: String,
    /// Status of the target term
    pub status: String,
    /// Description of the target term
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Sort index of the target term
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<u32>,
}

/// A leaf taxonomy node. Belongs to exactly one category but may hold
/// associations pointing into many other categories.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Term {
    /// Display name
    pub name: String,
    /// Unique code within the owning category
    pub code: String,
    /// Service-assigned identifier
    pub identifier: String,
    /// Status, e.g. "Live" or "Draft"
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Committed association edges, keyed by target identifier + category
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub associations: Vec<Association>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<u32>,
    /// Code of the owning category, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl Term {
    /// Whether the term is in Live status.
    pub fn is_live(&self) -> bool {
        self.status == LIVE_STATUS
    }
}

/// A named grouping of terms within a framework.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    /// Service-assigned identifier
    pub identifier: String,
    /// Display name
    pub name: String,
    /// Unique code within the framework
    pub code: String,
    /// Status, e.g. "Live" or "Draft"
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Terms owned by this category
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub terms: Vec<Term>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<u32>,
}

impl Category {
    /// Whether the category is in Live status.
    pub fn is_live(&self) -> bool {
        self.status == LIVE_STATUS
    }
}

/// Top-level taxonomy container holding categories.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Framework {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Unique framework code
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Identifier of the owning channel
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<Category>,
}

/// How a staged association set is reconciled with the persisted set at
/// commit time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaveMode {
    /// Union with the persisted set, deduplicated by target identifier.
    /// The safe default for "add more associations" flows.
    #[default]
    Merge,
    /// Send the staged set verbatim; persisted entries not present in it
    /// are dropped. Used when revising an existing association set.
    Replace,
}

/// A staged, not-yet-committed association set for one term.
///
/// Holds the source term's identity plus the set its associations should
/// become. The merge policy travels with the entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkingAssociation {
    /// Source term code
    pub code: String,
    /// Source term display name
    pub name: String,
    /// Source term identifier
    pub identifier: String,
    /// Code of the source term's category
    #[serde(rename = "categoryCode")]
    pub category_code: String,
    /// Name of the source term's category
    #[serde(rename = "categoryName")]
    pub category_name: String,
    /// The staged association set
    pub associations: Vec<Association>,
    /// Reconciliation policy applied at commit time
    #[serde(default)]
    pub mode: SaveMode,
}

impl WorkingAssociation {
    /// Stage an association set for a term.
    pub fn new(
        term: &Term,
        category: &Category,
        associations: Vec<Association>,
        mode: SaveMode,
    ) -> Self {
        Self {
            code: term.code.clone(),
            name: term.name.clone(),
            identifier: term.identifier.clone(),
            category_code: category.code.clone(),
            category_name: category.name.clone(),
            associations,
            mode,
        }
    }
}

/// A term annotated with its owning category, as produced by flattening a
/// category tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategorizedTerm {
    #[serde(flatten)]
    pub term: Term,
    #[serde(rename = "categoryName")]
    pub category_name: String,
    #[serde(rename = "categoryCode")]
    pub category_code: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_term_deserializes_without_optional_fields() {
        let term: Term = serde_json::from_str(
            r#"{"name": "Mathematics", "code": "math", "identifier": "t-1", "status": "Live"}"#,
        )
        .unwrap();

        assert_eq!(term.code, "math");
        assert!(term.associations.is_empty());
        assert!(term.is_live());
    }

    #[test]
    fn test_unknown_status_passes_through() {
        let term: Term = serde_json::from_str(
            r#"{"name": "Old", "code": "old", "identifier": "t-2", "status": "Retired"}"#,
        )
        .unwrap();

        assert!(!term.is_live());
        assert_eq!(term.status, "Retired");
    }

    #[test]
    fn test_save_mode_defaults_to_merge() {
        assert_eq!(SaveMode::default(), SaveMode::Merge);

        let json = r#"{
            "code": "t1", "name": "One", "identifier": "t1-id",
            "categoryCode": "cat-a", "categoryName": "Subjects",
            "associations": []
        }"#;
        let staged: WorkingAssociation = serde_json::from_str(json).unwrap();
        assert_eq!(staged.mode, SaveMode::Merge);
    }

    #[test]
    fn test_categorized_term_flattens_term_fields() {
        let term = Term {
            name: "Algebra".to_string(),
            code: "algebra".to_string(),
            identifier: "t-3".to_string(),
            status: LIVE_STATUS.to_string(),
            description: None,
            label: None,
            associations: Vec::new(),
            index: None,
            category: Some("math".to_string()),
        };
        let categorized = CategorizedTerm {
            term,
            category_name: "Mathematics".to_string(),
            category_code: "math".to_string(),
        };

        let value = serde_json::to_value(&categorized).unwrap();
        assert_eq!(value["code"], "algebra");
        assert_eq!(value["categoryCode"], "math");
        assert_eq!(value["categoryName"], "Mathematics");
    }
}
