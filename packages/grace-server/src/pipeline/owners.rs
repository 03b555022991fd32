//! Owner endpoints.

use grace_actors::EventMetadata;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{execute, validations, PipelineOutcome, Validation};
use crate::context::ServerContext;
use crate::domains::owner::commands::OwnerCommand;
use crate::domains::owner::models::{OwnerDto, OwnerType, SearchVisibility};
use crate::errors::GraceError;
use crate::resolve;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOwnerParameters {
    pub owner_id: Uuid,
    pub owner_name: String,
    pub owner_type: OwnerType,
}

/// Common target selector for non-create owner operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OwnerParameters {
    pub owner_id: Option<Uuid>,
    pub owner_name: Option<String>,
}

pub async fn create(
    ctx: &ServerContext,
    parameters: CreateOwnerParameters,
    metadata: EventMetadata,
) -> PipelineOutcome {
    let validations: Vec<Validation> = vec![
        Box::pin(validations::not_empty_uuid("ownerId", parameters.owner_id)),
        Box::pin(validations::valid_entity_name(parameters.owner_name.clone())),
    ];
    let dispatch = async {
        // Create uses the client-supplied id verbatim.
        let command = OwnerCommand::Create {
            owner_id: parameters.owner_id,
            owner_name: parameters.owner_name.clone(),
            owner_type: parameters.owner_type,
        };
        let value = ctx.owner(parameters.owner_id).handle(command, metadata.clone()).await?;
        ctx.deps()
            .cache
            .put_exists(format!("Owner:{}", parameters.owner_id), parameters.owner_id);
        resolve::remember_owner_name(ctx, &parameters.owner_name, parameters.owner_id);
        Ok(value)
    };
    execute(&metadata, &parameters, validations, dispatch).await
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetOwnerNameParameters {
    pub owner_id: Option<Uuid>,
    pub owner_name: Option<String>,
    pub new_name: String,
}

pub async fn set_name(
    ctx: &ServerContext,
    parameters: SetOwnerNameParameters,
    metadata: EventMetadata,
) -> PipelineOutcome {
    let validations: Vec<Validation> = vec![Box::pin(validations::valid_entity_name(
        parameters.new_name.clone(),
    ))];
    let dispatch = async {
        let owner_id = resolve::resolve_owner_id(
            ctx,
            parameters.owner_id,
            parameters.owner_name.as_deref(),
        )
        .await?
        .ok_or(GraceError::OwnerDoesNotExist)?;
        let command = OwnerCommand::SetName {
            owner_name: parameters.new_name.clone(),
        };
        let value = ctx.owner(owner_id).handle(command, metadata.clone()).await?;
        resolve::remember_owner_name(ctx, &parameters.new_name, owner_id);
        Ok(value)
    };
    execute(&metadata, &parameters, validations, dispatch).await
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetOwnerTypeParameters {
    pub owner_id: Option<Uuid>,
    pub owner_name: Option<String>,
    pub owner_type: OwnerType,
}

pub async fn set_type(
    ctx: &ServerContext,
    parameters: SetOwnerTypeParameters,
    metadata: EventMetadata,
) -> PipelineOutcome {
    let dispatch = async {
        let owner_id = resolve::resolve_owner_id(
            ctx,
            parameters.owner_id,
            parameters.owner_name.as_deref(),
        )
        .await?
        .ok_or(GraceError::OwnerDoesNotExist)?;
        ctx.owner(owner_id)
            .handle(
                OwnerCommand::SetType {
                    owner_type: parameters.owner_type,
                },
                metadata.clone(),
            )
            .await
    };
    execute(&metadata, &parameters, vec![], dispatch).await
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetOwnerDescriptionParameters {
    pub owner_id: Option<Uuid>,
    pub owner_name: Option<String>,
    pub description: String,
}

pub async fn set_description(
    ctx: &ServerContext,
    parameters: SetOwnerDescriptionParameters,
    metadata: EventMetadata,
) -> PipelineOutcome {
    let dispatch = async {
        let owner_id = resolve::resolve_owner_id(
            ctx,
            parameters.owner_id,
            parameters.owner_name.as_deref(),
        )
        .await?
        .ok_or(GraceError::OwnerDoesNotExist)?;
        ctx.owner(owner_id)
            .handle(
                OwnerCommand::SetDescription {
                    description: parameters.description.clone(),
                },
                metadata.clone(),
            )
            .await
    };
    execute(&metadata, &parameters, vec![], dispatch).await
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetOwnerSearchVisibilityParameters {
    pub owner_id: Option<Uuid>,
    pub owner_name: Option<String>,
    pub search_visibility: SearchVisibility,
}

pub async fn set_search_visibility(
    ctx: &ServerContext,
    parameters: SetOwnerSearchVisibilityParameters,
    metadata: EventMetadata,
) -> PipelineOutcome {
    let dispatch = async {
        let owner_id = resolve::resolve_owner_id(
            ctx,
            parameters.owner_id,
            parameters.owner_name.as_deref(),
        )
        .await?
        .ok_or(GraceError::OwnerDoesNotExist)?;
        ctx.owner(owner_id)
            .handle(
                OwnerCommand::SetSearchVisibility {
                    search_visibility: parameters.search_visibility,
                },
                metadata.clone(),
            )
            .await
    };
    execute(&metadata, &parameters, vec![], dispatch).await
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteOwnerParameters {
    pub owner_id: Option<Uuid>,
    pub owner_name: Option<String>,
    pub delete_reason: String,
}

pub async fn delete_logical(
    ctx: &ServerContext,
    parameters: DeleteOwnerParameters,
    metadata: EventMetadata,
) -> PipelineOutcome {
    let dispatch = async {
        let owner_id = resolve::resolve_owner_id(
            ctx,
            parameters.owner_id,
            parameters.owner_name.as_deref(),
        )
        .await?
        .ok_or(GraceError::OwnerDoesNotExist)?;
        let value = ctx
            .owner(owner_id)
            .handle(
                OwnerCommand::DeleteLogical {
                    delete_reason: parameters.delete_reason.clone(),
                },
                metadata.clone(),
            )
            .await?;
        ctx.deps().cache.invalidate(&format!("Owner:{owner_id}"));
        Ok(value)
    };
    execute(&metadata, &parameters, vec![], dispatch).await
}

pub async fn delete_physical(
    ctx: &ServerContext,
    parameters: OwnerParameters,
    metadata: EventMetadata,
) -> PipelineOutcome {
    let dispatch = async {
        let owner_id = resolve::resolve_owner_id(
            ctx,
            parameters.owner_id,
            parameters.owner_name.as_deref(),
        )
        .await?
        .ok_or(GraceError::OwnerDoesNotExist)?;
        let value = ctx
            .owner(owner_id)
            .handle(OwnerCommand::DeletePhysical, metadata.clone())
            .await?;
        ctx.deps().cache.invalidate(&format!("Owner:{owner_id}"));
        Ok(value)
    };
    execute(&metadata, &parameters, vec![], dispatch).await
}

pub async fn undelete(
    ctx: &ServerContext,
    parameters: OwnerParameters,
    metadata: EventMetadata,
) -> PipelineOutcome {
    let dispatch = async {
        let owner_id = resolve::resolve_owner_id(
            ctx,
            parameters.owner_id,
            parameters.owner_name.as_deref(),
        )
        .await?
        .ok_or(GraceError::OwnerDoesNotExist)?;
        ctx.owner(owner_id)
            .handle(OwnerCommand::Undelete, metadata.clone())
            .await
    };
    execute(&metadata, &parameters, vec![], dispatch).await
}

/// Query: current owner dto.
pub async fn get(ctx: &ServerContext, owner_id: Uuid) -> Result<OwnerDto, GraceError> {
    ctx.owner(owner_id).get().await
}
