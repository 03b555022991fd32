//! The validation/command pipeline fronting every mutating operation.
//!
//! Each endpoint: parse typed parameters → run its validation array
//! concurrently → resolve the target entity id → build the command →
//! dispatch to the entity actor → shape the reply. Queries follow the
//! same shape minus dispatch, ending in a bounded read-only actor call.

pub mod branches;
pub mod directory_versions;
pub mod organizations;
pub mod owners;
pub mod references;
pub mod repositories;
pub mod validations;

use std::future::Future;

use futures::future::{join_all, BoxFuture};
use grace_actors::EventMetadata;
use serde::Serialize;
use serde_json::Value;

use crate::domains::entity::GraceReturnValue;
use crate::errors::{ErrorKind, GraceError};

/// One validation: parameters in, unit or an error code out.
pub type Validation<'a> = BoxFuture<'a, Result<(), GraceError>>;

/// Run all validations concurrently; succeeds iff every one passed.
///
/// On failure the error reported is the earliest in declaration order,
/// not the first to finish.
pub async fn all_pass(validations: Vec<Validation<'_>>) -> Result<(), GraceError> {
    let results = join_all(validations).await;
    match first_error(&results) {
        Some(error) => Err(error.clone()),
        None => Ok(()),
    }
}

/// Earliest error in declaration order.
pub fn first_error<'r>(results: &'r [Result<(), GraceError>]) -> Option<&'r GraceError> {
    results.iter().find_map(|result| result.as_ref().err())
}

/// The shaped reply of a pipeline run: the 200/400/500 analog.
#[derive(Debug)]
pub enum PipelineOutcome {
    /// Accepted: the enriched return value.
    Ok(GraceReturnValue),
    /// Rejected (validation or actor-surface error) with the parameter
    /// snapshot for diagnostics.
    Rejected {
        error: GraceError,
        correlation_id: String,
        parameters: Value,
    },
    /// A dependency or internal failure; the actor may be poisoned.
    Faulted {
        error: GraceError,
        correlation_id: String,
    },
}

impl PipelineOutcome {
    pub fn status_code(&self) -> u16 {
        match self {
            PipelineOutcome::Ok(_) => 200,
            PipelineOutcome::Rejected { .. } => 400,
            PipelineOutcome::Faulted { .. } => 500,
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, PipelineOutcome::Ok(_))
    }

    pub fn ok_value(&self) -> Option<&GraceReturnValue> {
        match self {
            PipelineOutcome::Ok(value) => Some(value),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&GraceError> {
        match self {
            PipelineOutcome::Ok(_) => None,
            PipelineOutcome::Rejected { error, .. } | PipelineOutcome::Faulted { error, .. } => {
                Some(error)
            }
        }
    }
}

/// Shared endpoint skeleton.
pub async fn execute<P, F>(
    metadata: &EventMetadata,
    parameters: &P,
    validations: Vec<Validation<'_>>,
    dispatch: F,
) -> PipelineOutcome
where
    P: Serialize,
    F: Future<Output = Result<GraceReturnValue, GraceError>>,
{
    if !metadata.has_correlation_id() {
        return rejected(GraceError::MissingCorrelationId, metadata, parameters);
    }
    if let Err(error) = all_pass(validations).await {
        return rejected(error, metadata, parameters);
    }
    match dispatch.await {
        Ok(value) => PipelineOutcome::Ok(value),
        Err(error) if matches!(error.kind(), ErrorKind::Dependency | ErrorKind::Internal) => {
            PipelineOutcome::Faulted {
                error,
                correlation_id: metadata.correlation_id.clone(),
            }
        }
        Err(error) => rejected(error, metadata, parameters),
    }
}

fn rejected<P: Serialize>(
    error: GraceError,
    metadata: &EventMetadata,
    parameters: &P,
) -> PipelineOutcome {
    PipelineOutcome::Rejected {
        error,
        correlation_id: metadata.correlation_id.clone(),
        parameters: serde_json::to_value(parameters).unwrap_or(Value::Null),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok_validation() -> Validation<'static> {
        Box::pin(async { Ok(()) })
    }

    fn failing(error: GraceError) -> Validation<'static> {
        Box::pin(async { Err(error) })
    }

    #[tokio::test]
    async fn all_pass_requires_every_validation() {
        assert!(all_pass(vec![ok_validation(), ok_validation()]).await.is_ok());
        assert!(all_pass(vec![]).await.is_ok());
        assert!(all_pass(vec![ok_validation(), failing(GraceError::OwnerDoesNotExist)])
            .await
            .is_err());
    }

    #[tokio::test]
    async fn first_error_is_declaration_order_not_completion_order() {
        // The slow validation is declared first; its error must win.
        let slow: Validation<'static> = Box::pin(async {
            tokio::time::sleep(std::time::Duration::from_millis(30)).await;
            Err(GraceError::OwnerDoesNotExist)
        });
        let fast = failing(GraceError::BranchDoesNotExist);

        let error = all_pass(vec![slow, fast]).await.unwrap_err();
        assert_eq!(error, GraceError::OwnerDoesNotExist);
    }

    #[tokio::test]
    async fn execute_rejects_missing_correlation_id() {
        let metadata = EventMetadata::new("");
        let outcome = execute(&metadata, &serde_json::json!({}), vec![], async {
            Ok(GraceReturnValue::default())
        })
        .await;

        assert_eq!(outcome.status_code(), 400);
        assert_eq!(outcome.error(), Some(&GraceError::MissingCorrelationId));
    }

    #[tokio::test]
    async fn execute_maps_dependency_failures_to_faulted() {
        let metadata = EventMetadata::new("c-1");
        let outcome = execute(&metadata, &serde_json::json!({}), vec![], async {
            Err(GraceError::StorageUnavailable {
                detail: "down".into(),
            })
        })
        .await;

        assert_eq!(outcome.status_code(), 500);
    }

    #[tokio::test]
    async fn execute_keeps_parameter_snapshot_on_rejection() {
        let metadata = EventMetadata::new("c-2");
        let parameters = serde_json::json!({"owner_name": "bad name"});
        let outcome = execute(
            &metadata,
            &parameters,
            vec![failing(GraceError::InvalidEntityName {
                name: "bad name".into(),
            })],
            async { Ok(GraceReturnValue::default()) },
        )
        .await;

        match outcome {
            PipelineOutcome::Rejected {
                parameters: snapshot,
                correlation_id,
                ..
            } => {
                assert_eq!(snapshot["owner_name"], "bad name");
                assert_eq!(correlation_id, "c-2");
            }
            other => panic!("expected rejection, got {other:?}"),
        }
    }
}
