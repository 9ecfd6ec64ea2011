//! Document bookkeeping fields
//!
//! Creation and update timestamps plus the soft-delete flag the query
//! layer filters on. Channel deletion itself happens outside this service,
//! so nothing here ever sets the flag.

use bson::DateTime;
use serde::{Deserialize, Serialize};

/// Bookkeeping fields shared by all persisted documents
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct Metadata {
    /// Set externally when a document is retired; reads skip such rows
    #[serde(default)]
    pub is_deleted: bool,

    /// When the document was last updated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime>,

    /// When the document was created
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime>,
}

impl Metadata {
    /// Fresh metadata for a document being created now
    pub fn new() -> Self {
        Self {
            is_deleted: false,
            updated_at: Some(DateTime::now()),
            created_at: Some(DateTime::now()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_live_and_timestamped() {
        let metadata = Metadata::new();
        assert!(!metadata.is_deleted);
        assert!(metadata.created_at.is_some());
        assert!(metadata.updated_at.is_some());
    }

    #[test]
    fn test_deserializes_without_flag() {
        // Rows written before the flag existed default to live
        let metadata: Metadata = serde_json::from_str("{}").unwrap();
        assert!(!metadata.is_deleted);
    }
}
