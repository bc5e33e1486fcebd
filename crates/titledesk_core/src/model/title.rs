//! Catalog title record.

use serde::{Deserialize, Serialize};

/// Opaque identifier assigned by the remote catalog.
pub type TitleId = String;

/// One catalog entry as the client sees it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TitleRecord {
    pub id: TitleId,
    pub title: String,
}

impl TitleRecord {
    pub fn new(id: impl Into<TitleId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
        }
    }
}
