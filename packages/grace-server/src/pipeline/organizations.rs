//! Organization endpoints.

use grace_actors::EventMetadata;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{execute, validations, PipelineOutcome, Validation};
use crate::context::ServerContext;
use crate::domains::organization::commands::OrganizationCommand;
use crate::domains::organization::models::{OrganizationDto, OrganizationType};
use crate::domains::owner::models::SearchVisibility;
use crate::errors::GraceError;
use crate::resolve;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrganizationParameters {
    pub organization_id: Uuid,
    pub owner_id: Uuid,
    pub organization_name: String,
    pub organization_type: OrganizationType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganizationParameters {
    pub owner_id: Uuid,
    pub organization_id: Option<Uuid>,
    pub organization_name: Option<String>,
}

async fn resolve_target(
    ctx: &ServerContext,
    parameters: &OrganizationParameters,
) -> Result<Uuid, GraceError> {
    resolve::resolve_organization_id(
        ctx,
        parameters.owner_id,
        parameters.organization_id,
        parameters.organization_name.as_deref(),
    )
    .await?
    .ok_or(GraceError::OrganizationDoesNotExist)
}

pub async fn create(
    ctx: &ServerContext,
    parameters: CreateOrganizationParameters,
    metadata: EventMetadata,
) -> PipelineOutcome {
    let validations: Vec<Validation> = vec![
        Box::pin(validations::not_empty_uuid(
            "organizationId",
            parameters.organization_id,
        )),
        Box::pin(validations::valid_entity_name(
            parameters.organization_name.clone(),
        )),
        Box::pin(validations::owner_exists(ctx, parameters.owner_id)),
    ];
    let dispatch = async {
        let command = OrganizationCommand::Create {
            organization_id: parameters.organization_id,
            owner_id: parameters.owner_id,
            organization_name: parameters.organization_name.clone(),
            organization_type: parameters.organization_type,
        };
        let value = ctx
            .organization(parameters.organization_id)
            .handle(command, metadata.clone())
            .await?;
        ctx.deps().cache.put_exists(
            format!("Organization:{}", parameters.organization_id),
            parameters.organization_id,
        );
        resolve::remember_organization_name(
            ctx,
            parameters.owner_id,
            &parameters.organization_name,
            parameters.organization_id,
        );
        Ok(value.with_property("OwnerId", parameters.owner_id.to_string()))
    };
    execute(&metadata, &parameters, validations, dispatch).await
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetOrganizationNameParameters {
    pub owner_id: Uuid,
    pub organization_id: Option<Uuid>,
    pub organization_name: Option<String>,
    pub new_name: String,
}

pub async fn set_name(
    ctx: &ServerContext,
    parameters: SetOrganizationNameParameters,
    metadata: EventMetadata,
) -> PipelineOutcome {
    let validations: Vec<Validation> = vec![Box::pin(validations::valid_entity_name(
        parameters.new_name.clone(),
    ))];
    let dispatch = async {
        let organization_id = resolve::resolve_organization_id(
            ctx,
            parameters.owner_id,
            parameters.organization_id,
            parameters.organization_name.as_deref(),
        )
        .await?
        .ok_or(GraceError::OrganizationDoesNotExist)?;
        let value = ctx
            .organization(organization_id)
            .handle(
                OrganizationCommand::SetName {
                    organization_name: parameters.new_name.clone(),
                },
                metadata.clone(),
            )
            .await?;
        resolve::remember_organization_name(
            ctx,
            parameters.owner_id,
            &parameters.new_name,
            organization_id,
        );
        Ok(value)
    };
    execute(&metadata, &parameters, validations, dispatch).await
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetOrganizationTypeParameters {
    pub owner_id: Uuid,
    pub organization_id: Option<Uuid>,
    pub organization_name: Option<String>,
    pub organization_type: OrganizationType,
}

pub async fn set_type(
    ctx: &ServerContext,
    parameters: SetOrganizationTypeParameters,
    metadata: EventMetadata,
) -> PipelineOutcome {
    let target = OrganizationParameters {
        owner_id: parameters.owner_id,
        organization_id: parameters.organization_id,
        organization_name: parameters.organization_name.clone(),
    };
    let dispatch = async {
        let organization_id = resolve_target(ctx, &target).await?;
        ctx.organization(organization_id)
            .handle(
                OrganizationCommand::SetType {
                    organization_type: parameters.organization_type,
                },
                metadata.clone(),
            )
            .await
    };
    execute(&metadata, &parameters, vec![], dispatch).await
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetOrganizationSearchVisibilityParameters {
    pub owner_id: Uuid,
    pub organization_id: Option<Uuid>,
    pub organization_name: Option<String>,
    pub search_visibility: SearchVisibility,
}

pub async fn set_search_visibility(
    ctx: &ServerContext,
    parameters: SetOrganizationSearchVisibilityParameters,
    metadata: EventMetadata,
) -> PipelineOutcome {
    let target = OrganizationParameters {
        owner_id: parameters.owner_id,
        organization_id: parameters.organization_id,
        organization_name: parameters.organization_name.clone(),
    };
    let dispatch = async {
        let organization_id = resolve_target(ctx, &target).await?;
        ctx.organization(organization_id)
            .handle(
                OrganizationCommand::SetSearchVisibility {
                    search_visibility: parameters.search_visibility,
                },
                metadata.clone(),
            )
            .await
    };
    execute(&metadata, &parameters, vec![], dispatch).await
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetOrganizationDescriptionParameters {
    pub owner_id: Uuid,
    pub organization_id: Option<Uuid>,
    pub organization_name: Option<String>,
    pub description: String,
}

pub async fn set_description(
    ctx: &ServerContext,
    parameters: SetOrganizationDescriptionParameters,
    metadata: EventMetadata,
) -> PipelineOutcome {
    let target = OrganizationParameters {
        owner_id: parameters.owner_id,
        organization_id: parameters.organization_id,
        organization_name: parameters.organization_name.clone(),
    };
    let dispatch = async {
        let organization_id = resolve_target(ctx, &target).await?;
        ctx.organization(organization_id)
            .handle(
                OrganizationCommand::SetDescription {
                    description: parameters.description.clone(),
                },
                metadata.clone(),
            )
            .await
    };
    execute(&metadata, &parameters, vec![], dispatch).await
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteOrganizationParameters {
    pub owner_id: Uuid,
    pub organization_id: Option<Uuid>,
    pub organization_name: Option<String>,
    pub delete_reason: String,
}

pub async fn delete_logical(
    ctx: &ServerContext,
    parameters: DeleteOrganizationParameters,
    metadata: EventMetadata,
) -> PipelineOutcome {
    let target = OrganizationParameters {
        owner_id: parameters.owner_id,
        organization_id: parameters.organization_id,
        organization_name: parameters.organization_name.clone(),
    };
    let dispatch = async {
        let organization_id = resolve_target(ctx, &target).await?;
        let value = ctx
            .organization(organization_id)
            .handle(
                OrganizationCommand::DeleteLogical {
                    delete_reason: parameters.delete_reason.clone(),
                },
                metadata.clone(),
            )
            .await?;
        ctx.deps()
            .cache
            .invalidate(&format!("Organization:{organization_id}"));
        Ok(value)
    };
    execute(&metadata, &parameters, vec![], dispatch).await
}

pub async fn delete_physical(
    ctx: &ServerContext,
    parameters: OrganizationParameters,
    metadata: EventMetadata,
) -> PipelineOutcome {
    let dispatch = async {
        let organization_id = resolve_target(ctx, &parameters).await?;
        let value = ctx
            .organization(organization_id)
            .handle(OrganizationCommand::DeletePhysical, metadata.clone())
            .await?;
        ctx.deps()
            .cache
            .invalidate(&format!("Organization:{organization_id}"));
        Ok(value)
    };
    execute(&metadata, &parameters, vec![], dispatch).await
}

pub async fn undelete(
    ctx: &ServerContext,
    parameters: OrganizationParameters,
    metadata: EventMetadata,
) -> PipelineOutcome {
    let dispatch = async {
        let organization_id = resolve_target(ctx, &parameters).await?;
        ctx.organization(organization_id)
            .handle(OrganizationCommand::Undelete, metadata.clone())
            .await
    };
    execute(&metadata, &parameters, vec![], dispatch).await
}

/// Query: current organization dto.
pub async fn get(
    ctx: &ServerContext,
    organization_id: Uuid,
) -> Result<OrganizationDto, GraceError> {
    ctx.organization(organization_id).get().await
}
