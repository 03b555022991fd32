//! Reference endpoints: lifecycle only - references are immutable once
//! created apart from (un)deletion.

use grace_actors::EventMetadata;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{execute, validations, PipelineOutcome, Validation};
use crate::context::ServerContext;
use crate::domains::reference::commands::ReferenceCommand;
use crate::domains::reference::models::ReferenceDto;
use crate::errors::GraceError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteReferenceParameters {
    pub owner_id: Uuid,
    pub organization_id: Uuid,
    pub repository_id: Uuid,
    pub reference_id: Uuid,
    pub delete_reason: String,
}

pub async fn delete_logical(
    ctx: &ServerContext,
    parameters: DeleteReferenceParameters,
    metadata: EventMetadata,
) -> PipelineOutcome {
    let validation_set: Vec<Validation> = vec![
        Box::pin(validations::not_empty_uuid("referenceId", parameters.reference_id)),
        Box::pin(validations::reference_exists(ctx, parameters.reference_id)),
    ];
    let dispatch = async {
        let value = ctx
            .reference(parameters.reference_id)
            .handle(
                ReferenceCommand::DeleteLogical {
                    delete_reason: parameters.delete_reason.clone(),
                },
                metadata.clone(),
            )
            .await?;
        Ok(value
            .with_property("OwnerId", parameters.owner_id.to_string())
            .with_property("OrganizationId", parameters.organization_id.to_string()))
    };
    execute(&metadata, &parameters, validation_set, dispatch).await
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceParameters {
    pub owner_id: Uuid,
    pub organization_id: Uuid,
    pub repository_id: Uuid,
    pub reference_id: Uuid,
}

pub async fn delete_physical(
    ctx: &ServerContext,
    parameters: ReferenceParameters,
    metadata: EventMetadata,
) -> PipelineOutcome {
    let validation_set: Vec<Validation> = vec![Box::pin(validations::reference_exists(
        ctx,
        parameters.reference_id,
    ))];
    let dispatch = async {
        ctx.reference(parameters.reference_id)
            .handle(ReferenceCommand::DeletePhysical, metadata.clone())
            .await
    };
    execute(&metadata, &parameters, validation_set, dispatch).await
}

pub async fn undelete(
    ctx: &ServerContext,
    parameters: ReferenceParameters,
    metadata: EventMetadata,
) -> PipelineOutcome {
    let validation_set: Vec<Validation> = vec![Box::pin(validations::reference_exists(
        ctx,
        parameters.reference_id,
    ))];
    let dispatch = async {
        ctx.reference(parameters.reference_id)
            .handle(ReferenceCommand::Undelete, metadata.clone())
            .await
    };
    execute(&metadata, &parameters, validation_set, dispatch).await
}

/// Query: current reference dto.
pub async fn get(ctx: &ServerContext, reference_id: Uuid) -> Result<ReferenceDto, GraceError> {
    ctx.reference(reference_id).get().await
}
