//! Job queries and mutations.
//!
//! # Invariants
//! - `specializations` is derived from the `base` references of other jobs,
//!   so it can never go stale when a job is re-based.
//! - `updateJob` replaces the `JobInput` fields wholesale and keeps the
//!   job's feature references.
//! - A job never names itself as its own base.

use super::{required_name, ResolverError, ResolverResult};
use crate::codec::{decode, DocumentKey, Identifier};
use crate::db::Store;
use crate::model::feature::FeatureDocument;
use crate::model::job::{Job, JobDocument, JobInput, JobPatch, StoredFeatureRef};
use crate::repo::document_repo::{Document, DocumentRepository, SqliteDocumentRepository};
use std::collections::{BTreeSet, HashMap};

const BASE_FIELD: &str = "base";

/// Which jobs a `jobs` query selects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobLookup {
    All,
    ById(Identifier),
    ByIds(Vec<Identifier>),
}

/// Typed arguments of the `jobs` query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobsQuery {
    pub lookup: JobLookup,
    /// Keep only jobs that are not specializations.
    pub roots_only: bool,
}

impl JobsQuery {
    /// Folds raw query arguments: `ids` wins over `id`, neither means all.
    pub fn from_args(
        id: Option<Identifier>,
        ids: Option<Vec<Identifier>>,
        base: Option<bool>,
    ) -> Self {
        let lookup = match (ids, id) {
            (Some(ids), _) => JobLookup::ByIds(ids),
            (None, Some(id)) => JobLookup::ById(id),
            (None, None) => JobLookup::All,
        };
        Self {
            lookup,
            roots_only: base.unwrap_or(false),
        }
    }
}

/// Resolver for job operations.
pub struct JobResolver<'store> {
    store: &'store Store,
}

impl<'store> JobResolver<'store> {
    pub fn new(store: &'store Store) -> Self {
        Self { store }
    }

    /// Resolves the `jobs` query.
    ///
    /// `ById` fails with `NotFound` for a missing job; `ByIds` silently omits
    /// missing ones.
    pub fn jobs(&self, query: &JobsQuery) -> ResolverResult<Vec<Job>> {
        let session = self.store.session()?;
        let repo = SqliteDocumentRepository::<JobDocument>::new(&session);

        let (documents, children) = match &query.lookup {
            JobLookup::All => {
                let all = repo.find_all()?;
                let children = children_by_base(&all);
                (all, children)
            }
            JobLookup::ById(id) => {
                let found = vec![repo.find_by_id(decode(id)?)?];
                let children = children_of(&repo, &found)?;
                (found, children)
            }
            JobLookup::ByIds(ids) => {
                let keys = ids
                    .iter()
                    .map(decode)
                    .collect::<Result<BTreeSet<_>, _>>()?;
                let found = repo.find_by_ids(&keys)?;
                let children = children_of(&repo, &found)?;
                (found, children)
            }
        };

        Ok(documents
            .into_iter()
            .filter(|document| !query.roots_only || !document.value.is_specialization)
            .map(|document| shape(document, &children))
            .collect())
    }

    /// Resolves `createJob`: upsert by name, merging into an existing job.
    pub fn create_job(&self, input: &JobInput) -> ResolverResult<Job> {
        let name = required_name(input.name.as_deref())?;
        let base = input.base.as_ref().map(decode).transpose()?;

        let session = self.store.session()?;
        let repo = SqliteDocumentRepository::<JobDocument>::new(&session);

        if let Some(base_key) = base {
            let base_job = repo.find_by_id(base_key)?;
            if base_job.value.name == name {
                return Err(self_base_error());
            }
        }

        let patch = JobPatch {
            is_specialization: input.is_specialization,
            base,
        };
        let upserted = repo.upsert_by_name(&name, &patch)?;
        shape_job(&repo, upserted.document)
    }

    /// Resolves `updateJob`: replaces name, specialization flag and base.
    ///
    /// Absent `isSpecialization` becomes `false` and absent `base` clears
    /// the base. Fails with `NotFound` without writing when `id` is unknown.
    pub fn update_job(&self, id: &Identifier, input: &JobInput) -> ResolverResult<Job> {
        let key = decode(id)?;
        let name = required_name(input.name.as_deref())?;
        let base = input.base.as_ref().map(decode).transpose()?;
        if base == Some(key) {
            return Err(self_base_error());
        }
        let is_specialization = input.is_specialization.unwrap_or(false);

        let session = self.store.session()?;
        let repo = SqliteDocumentRepository::<JobDocument>::new(&session);

        if let Some(base_key) = base {
            repo.find_by_id(base_key)?;
        }

        let updated = repo.edit_by_id(key, |job| {
            job.name = name.clone();
            job.is_specialization = is_specialization;
            job.base = base;
        })?;
        shape_job(&repo, updated)
    }

    /// Records `feature_id` at `level` on a job, replacing the level when the
    /// feature is already attached.
    pub fn attach_feature(
        &self,
        job_id: &Identifier,
        feature_id: &Identifier,
        level: i64,
    ) -> ResolverResult<Job> {
        let job_key = decode(job_id)?;
        let feature_key = decode(feature_id)?;
        if level < 0 {
            return Err(ResolverError::InvalidArgument(format!(
                "level must not be negative, got {level}"
            )));
        }

        let session = self.store.session()?;
        SqliteDocumentRepository::<FeatureDocument>::new(&session).find_by_id(feature_key)?;

        let repo = SqliteDocumentRepository::<JobDocument>::new(&session);
        let updated = repo.edit_by_id(job_key, |job| {
            match job
                .features
                .iter_mut()
                .find(|feature_ref| feature_ref.feature == feature_key)
            {
                Some(existing) => existing.level = level,
                None => job.features.push(StoredFeatureRef {
                    feature: feature_key,
                    level,
                }),
            }
        })?;
        shape_job(&repo, updated)
    }
}

fn shape_job<R: DocumentRepository<JobDocument>>(
    repo: &R,
    document: Document<JobDocument>,
) -> ResolverResult<Job> {
    let children = children_of(repo, std::slice::from_ref(&document))?;
    Ok(shape(document, &children))
}

fn shape(
    document: Document<JobDocument>,
    children: &HashMap<DocumentKey, Vec<DocumentKey>>,
) -> Job {
    let specializations = children.get(&document.key).cloned().unwrap_or_default();
    Job::from_document(document.key, document.value, specializations)
}

/// Loads the specializations of every non-specialization in `jobs` with a
/// single reference query.
fn children_of<R: DocumentRepository<JobDocument>>(
    repo: &R,
    jobs: &[Document<JobDocument>],
) -> ResolverResult<HashMap<DocumentKey, Vec<DocumentKey>>> {
    let roots: BTreeSet<DocumentKey> = jobs
        .iter()
        .filter(|job| !job.value.is_specialization)
        .map(|job| job.key)
        .collect();
    let referencing = repo.find_referencing(BASE_FIELD, &roots)?;
    Ok(children_by_base(&referencing))
}

fn children_by_base(jobs: &[Document<JobDocument>]) -> HashMap<DocumentKey, Vec<DocumentKey>> {
    let mut children: HashMap<DocumentKey, Vec<DocumentKey>> = HashMap::new();
    for job in jobs {
        if let Some(base) = job.value.base {
            children.entry(base).or_default().push(job.key);
        }
    }
    children
}

fn self_base_error() -> ResolverError {
    ResolverError::InvalidArgument("a job cannot be its own base".to_string())
}
