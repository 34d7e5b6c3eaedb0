//! Metadata Marker - The @factory Tag
//!
//! Two attributes, nothing else. The marker carries no behavior;
//! all decision logic lives in the scanner and validator.

use serde::{Deserialize, Serialize};

/// Build-time marker attached to a class-like declaration.
///
/// `target` names the supertype (class or interface) whose factory the
/// marked class is grouped into; `id` is the dispatch key the generated
/// factory resolves at runtime. Ids are intended to be unique within the
/// group named by `target`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FactoryMarker {
    #[serde(rename = "type")]
    pub target: String,
    pub id: String,
}

impl FactoryMarker {
    pub fn new(target: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            id: id.into(),
        }
    }
}
