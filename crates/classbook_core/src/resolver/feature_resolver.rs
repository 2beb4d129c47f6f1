//! Feature queries and mutations.

use super::{required_name, ResolverResult};
use crate::db::Store;
use crate::model::feature::{Feature, FeatureDocument, FeatureInput, FeaturePatch};
use crate::repo::document_repo::{DocumentRepository, SqliteDocumentRepository};

/// Resolver for feature operations.
pub struct FeatureResolver<'store> {
    store: &'store Store,
}

impl<'store> FeatureResolver<'store> {
    pub fn new(store: &'store Store) -> Self {
        Self { store }
    }

    /// Resolves `createFeature`: upsert by name. An omitted `desc` keeps the
    /// stored description of an existing feature.
    pub fn create_feature(&self, input: &FeatureInput) -> ResolverResult<Feature> {
        let name = required_name(input.name.as_deref())?;

        let session = self.store.session()?;
        let repo = SqliteDocumentRepository::<FeatureDocument>::new(&session);
        let patch = FeaturePatch {
            desc: input.desc.clone(),
        };
        let upserted = repo.upsert_by_name(&name, &patch)?;
        Ok(Feature::from_document(
            upserted.document.key,
            upserted.document.value,
        ))
    }

    /// Resolves `features`: every stored feature in insertion order.
    pub fn features(&self) -> ResolverResult<Vec<Feature>> {
        let session = self.store.session()?;
        let repo = SqliteDocumentRepository::<FeatureDocument>::new(&session);
        Ok(repo
            .find_all()?
            .into_iter()
            .map(|document| Feature::from_document(document.key, document.value))
            .collect())
    }
}
