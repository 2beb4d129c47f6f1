//! Operation dispatch by name with a partial-failure response envelope.
//!
//! # Responsibility
//! - Parse typed operations from JSON requests.
//! - Route each operation to its resolver.
//! - Collect results and errors so one failing operation never hides the
//!   results of its siblings.
//!
//! # Invariants
//! - `data` has exactly one entry per requested operation, `null` on failure.
//! - Every `null` produced by a failure has a matching entry in `errors`.
//! - Logged events carry operation names and error kinds, never payloads.

use crate::codec::Identifier;
use crate::db::Store;
use crate::dice::RandomDie;
use crate::model::feature::FeatureInput;
use crate::model::job::JobInput;
use crate::resolver::{
    dice, ErrorKind, FeatureResolver, JobResolver, JobsQuery, ResolverError, ResolverResult,
};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Instant;

/// One field requested from a `dice` result.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "field", rename_all = "camelCase")]
pub enum DiceSelection {
    RollOnce,
    #[serde(rename_all = "camelCase")]
    Roll {
        num_rolls: i64,
        #[serde(default)]
        drop: i64,
    },
    #[serde(rename_all = "camelCase")]
    RollSum {
        num_rolls: i64,
        #[serde(default)]
        drop: i64,
    },
}

impl DiceSelection {
    fn field_name(&self) -> &'static str {
        match self {
            Self::RollOnce => "rollOnce",
            Self::Roll { .. } => "roll",
            Self::RollSum { .. } => "rollSum",
        }
    }
}

/// A typed API operation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum Operation {
    #[serde(rename_all = "camelCase")]
    Dice {
        #[serde(default)]
        num_sides: Option<i64>,
        #[serde(default)]
        select: Vec<DiceSelection>,
    },
    Jobs {
        #[serde(default)]
        id: Option<Identifier>,
        #[serde(default)]
        ids: Option<Vec<Identifier>>,
        #[serde(default)]
        base: Option<bool>,
    },
    Features,
    CreateJob {
        #[serde(default)]
        input: JobInput,
    },
    UpdateJob {
        id: Identifier,
        #[serde(default)]
        input: JobInput,
    },
    CreateFeature {
        #[serde(default)]
        input: FeatureInput,
    },
    #[serde(rename_all = "camelCase")]
    AttachFeature {
        job_id: Identifier,
        feature_id: Identifier,
        level: i64,
    },
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Dice { .. } => "dice",
            Self::Jobs { .. } => "jobs",
            Self::Features => "features",
            Self::CreateJob { .. } => "createJob",
            Self::UpdateJob { .. } => "updateJob",
            Self::CreateFeature { .. } => "createFeature",
            Self::AttachFeature { .. } => "attachFeature",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Request {
    pub operations: Vec<Operation>,
}

/// Position of a failed value inside `data`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PathSegment {
    Index(usize),
    Field(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorEntry {
    pub path: Vec<PathSegment>,
    pub kind: ErrorKind,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    pub data: Vec<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ErrorEntry>,
}

impl Response {
    fn rejected(kind: ErrorKind, message: String) -> Self {
        Self {
            data: Vec::new(),
            errors: vec![ErrorEntry {
                path: Vec::new(),
                kind,
                message,
            }],
        }
    }
}

/// Parses and executes a JSON request.
///
/// A request that does not parse is rejected as a whole with a single
/// `INVALID_ARGUMENT` error and empty `data`.
pub fn execute_json(store: &Store, raw: &str) -> Response {
    match serde_json::from_str::<Request>(raw) {
        Ok(request) => execute(store, &request),
        Err(err) => {
            warn!(
                "event=request_parse module=api status=error error_code=invalid_request line={} column={}",
                err.line(),
                err.column()
            );
            Response::rejected(ErrorKind::InvalidArgument, format!("invalid request: {err}"))
        }
    }
}

/// Executes every operation of `request` independently.
pub fn execute(store: &Store, request: &Request) -> Response {
    let mut data = Vec::with_capacity(request.operations.len());
    let mut errors = Vec::new();

    for (index, operation) in request.operations.iter().enumerate() {
        let started_at = Instant::now();
        let path = vec![
            PathSegment::Index(index),
            PathSegment::Field(operation.name().to_string()),
        ];

        match run_operation(store, operation, &path, &mut errors) {
            Ok(value) => {
                info!(
                    "event=operation module=api status=ok op={} duration_ms={}",
                    operation.name(),
                    started_at.elapsed().as_millis()
                );
                data.push(value);
            }
            Err(err) => {
                warn!(
                    "event=operation module=api status=error op={} error_code={} retryable={} duration_ms={}",
                    operation.name(),
                    err.kind().as_str(),
                    err.kind().is_retryable(),
                    started_at.elapsed().as_millis()
                );
                errors.push(error_entry(path, &err));
                data.push(Value::Null);
            }
        }
    }

    Response { data, errors }
}

fn run_operation(
    store: &Store,
    operation: &Operation,
    path: &[PathSegment],
    errors: &mut Vec<ErrorEntry>,
) -> ResolverResult<Value> {
    match operation {
        Operation::Dice { num_sides, select } => {
            let die = dice(*num_sides)?;
            Ok(resolve_dice(&die, select, path, errors))
        }
        Operation::Jobs { id, ids, base } => {
            let query = JobsQuery::from_args(id.clone(), ids.clone(), *base);
            to_value(JobResolver::new(store).jobs(&query)?)
        }
        Operation::Features => to_value(FeatureResolver::new(store).features()?),
        Operation::CreateJob { input } => to_value(JobResolver::new(store).create_job(input)?),
        Operation::UpdateJob { id, input } => {
            to_value(JobResolver::new(store).update_job(id, input)?)
        }
        Operation::CreateFeature { input } => {
            to_value(FeatureResolver::new(store).create_feature(input)?)
        }
        Operation::AttachFeature {
            job_id,
            feature_id,
            level,
        } => to_value(JobResolver::new(store).attach_feature(job_id, feature_id, *level)?),
    }
}

/// Resolves each dice selection on its own; a failing selection becomes
/// `null` with its own error entry.
fn resolve_dice(
    die: &RandomDie,
    select: &[DiceSelection],
    path: &[PathSegment],
    errors: &mut Vec<ErrorEntry>,
) -> Value {
    let mut fields = Map::new();
    fields.insert("numSides".to_string(), Value::from(die.num_sides()));

    for selection in select {
        let resolved: ResolverResult<Value> = match selection {
            DiceSelection::RollOnce => Ok(Value::from(die.roll_once())),
            DiceSelection::Roll { num_rolls, drop } => die
                .roll(*num_rolls, *drop)
                .map(Value::from)
                .map_err(ResolverError::from),
            DiceSelection::RollSum { num_rolls, drop } => die
                .roll_sum(*num_rolls, *drop)
                .map(Value::from)
                .map_err(ResolverError::from),
        };

        let value = resolved.unwrap_or_else(|err| {
            let mut field_path = path.to_vec();
            field_path.push(PathSegment::Field(selection.field_name().to_string()));
            errors.push(error_entry(field_path, &err));
            Value::Null
        });
        fields.insert(selection.field_name().to_string(), value);
    }

    Value::Object(fields)
}

fn to_value<T: Serialize>(value: T) -> ResolverResult<Value> {
    serde_json::to_value(value)
        .map_err(|err| ResolverError::InvalidData(format!("unencodable result: {err}")))
}

fn error_entry(path: Vec<PathSegment>, err: &ResolverError) -> ErrorEntry {
    ErrorEntry {
        path,
        kind: err.kind(),
        message: err.to_string(),
    }
}
