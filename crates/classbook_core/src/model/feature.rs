//! Feature documents, records and inputs.

use super::{Collection, NamedDocument};
use crate::codec::{encode, DocumentKey, Identifier};
use serde::{Deserialize, Serialize};

/// Body of a document in the `features` collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureDocument {
    pub name: String,
    #[serde(default)]
    pub desc: Option<String>,
}

impl NamedDocument for FeatureDocument {
    const COLLECTION: Collection = Collection::Features;

    fn name(&self) -> &str {
        &self.name
    }
}

/// Merge payload for upserting a feature by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FeaturePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,
}

/// API-facing feature record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feature {
    pub id: Identifier,
    pub name: String,
    pub desc: Option<String>,
}

impl Feature {
    pub fn from_document(key: DocumentKey, document: FeatureDocument) -> Self {
        Self {
            id: encode(key),
            name: document.name,
            desc: document.desc,
        }
    }
}

/// Mutation input for `createFeature`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureInput {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub desc: Option<String>,
}
