//! Job documents, records and inputs.
//!
//! # Invariants
//! - A specialization never exposes a specializations list (`None`).
//! - A non-specialization always exposes one, possibly empty.
//! - `base` points at another job or is absent for root jobs.

use super::{Collection, NamedDocument};
use crate::codec::{encode, DocumentKey, Identifier};
use serde::{Deserialize, Serialize};

/// Leveled reference from a job to a feature, as persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredFeatureRef {
    pub feature: DocumentKey,
    pub level: i64,
}

/// Body of a document in the `jobs` collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobDocument {
    pub name: String,
    #[serde(default)]
    pub is_specialization: bool,
    #[serde(default)]
    pub base: Option<DocumentKey>,
    #[serde(default)]
    pub features: Vec<StoredFeatureRef>,
}

impl NamedDocument for JobDocument {
    const COLLECTION: Collection = Collection::Jobs;

    fn name(&self) -> &str {
        &self.name
    }
}

/// Merge payload for upserting a job by name.
///
/// `None` fields are left out of the payload and keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_specialization: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base: Option<DocumentKey>,
}

/// API-facing feature reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureRef {
    pub feature: Identifier,
    pub level: i64,
}

/// API-facing job record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: Identifier,
    pub name: String,
    pub is_specialization: bool,
    pub base: Option<Identifier>,
    pub features: Vec<FeatureRef>,
    pub specializations: Option<Vec<Identifier>>,
}

impl Job {
    /// Shapes a stored job into its API record.
    ///
    /// `specializations` holds the keys of jobs whose `base` is `key`; it is
    /// dropped entirely when the job is itself a specialization.
    pub fn from_document(
        key: DocumentKey,
        document: JobDocument,
        specializations: Vec<DocumentKey>,
    ) -> Self {
        let specializations = if document.is_specialization {
            None
        } else {
            Some(specializations.into_iter().map(encode).collect())
        };

        Self {
            id: encode(key),
            name: document.name,
            is_specialization: document.is_specialization,
            base: document.base.map(encode),
            features: document
                .features
                .into_iter()
                .map(|feature_ref| FeatureRef {
                    feature: encode(feature_ref.feature),
                    level: feature_ref.level,
                })
                .collect(),
            specializations,
        }
    }
}

/// Mutation input for `createJob` and `updateJob`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobInput {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub is_specialization: Option<bool>,
    #[serde(default)]
    pub base: Option<Identifier>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document(is_specialization: bool) -> JobDocument {
        JobDocument {
            name: "Rogue".to_string(),
            is_specialization,
            base: None,
            features: Vec::new(),
        }
    }

    #[test]
    fn specialization_never_exposes_specializations() {
        let child = DocumentKey::generate();
        let job = Job::from_document(DocumentKey::generate(), document(true), vec![child]);
        assert_eq!(job.specializations, None);
    }

    #[test]
    fn root_job_exposes_empty_specializations() {
        let job = Job::from_document(DocumentKey::generate(), document(false), Vec::new());
        assert_eq!(job.specializations, Some(Vec::new()));
    }

    #[test]
    fn missing_optional_fields_deserialize_to_defaults() {
        let parsed: JobDocument = serde_json::from_str(r#"{"name":"Fighter"}"#).unwrap();
        assert!(!parsed.is_specialization);
        assert_eq!(parsed.base, None);
        assert!(parsed.features.is_empty());
    }

    #[test]
    fn empty_patch_serializes_to_empty_object() {
        let value = serde_json::to_value(JobPatch::default()).unwrap();
        assert_eq!(value, serde_json::json!({}));
    }
}
