//! Branch endpoints, including every reference-producing operation.

use grace_actors::EventMetadata;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{execute, validations, PipelineOutcome, Validation};
use crate::context::ServerContext;
use crate::domains::branch::commands::BranchCommand;
use crate::domains::branch::models::{BranchDto, ReferenceFlag};
use crate::domains::entity::GraceReturnValue;
use crate::errors::GraceError;
use crate::readmodel::ReferenceRow;
use crate::resolve;

/// Common target selector for non-create branch operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BranchParameters {
    pub owner_id: Uuid,
    pub organization_id: Uuid,
    pub repository_id: Uuid,
    pub branch_id: Option<Uuid>,
    pub branch_name: Option<String>,
}

async fn resolve_target(
    ctx: &ServerContext,
    parameters: &BranchParameters,
) -> Result<Uuid, GraceError> {
    resolve::resolve_branch_id(
        ctx,
        parameters.repository_id,
        parameters.branch_id,
        parameters.branch_name.as_deref(),
    )
    .await?
    .ok_or(GraceError::BranchDoesNotExist)
}

fn enrich(value: GraceReturnValue, parameters: &BranchParameters) -> GraceReturnValue {
    value
        .with_property("OwnerId", parameters.owner_id.to_string())
        .with_property("OrganizationId", parameters.organization_id.to_string())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBranchParameters {
    pub owner_id: Uuid,
    pub organization_id: Uuid,
    pub repository_id: Uuid,
    pub branch_id: Uuid,
    pub branch_name: String,
    pub parent_branch_id: Option<Uuid>,
}

pub async fn create(
    ctx: &ServerContext,
    parameters: CreateBranchParameters,
    metadata: EventMetadata,
) -> PipelineOutcome {
    let mut validation_set: Vec<Validation> = vec![
        Box::pin(validations::not_empty_uuid("branchId", parameters.branch_id)),
        Box::pin(validations::valid_entity_name(parameters.branch_name.clone())),
        Box::pin(validations::repository_exists(ctx, parameters.repository_id)),
        Box::pin(validations::branch_name_available(
            ctx,
            parameters.repository_id,
            parameters.branch_name.clone(),
        )),
    ];
    if let Some(parent_branch_id) = parameters.parent_branch_id {
        validation_set.push(Box::pin(validations::branch_exists(ctx, parent_branch_id)));
    }

    let dispatch = async {
        // A child branch starts where its parent last promoted.
        let based_on = match parameters.parent_branch_id {
            Some(parent_branch_id) => {
                ctx.branch(parent_branch_id).get_latest_promotion().await?
            }
            None => None,
        };
        let command = BranchCommand::Create {
            branch_id: parameters.branch_id,
            repository_id: parameters.repository_id,
            branch_name: parameters.branch_name.clone(),
            parent_branch_id: parameters.parent_branch_id,
            based_on,
        };
        let value = ctx
            .branch(parameters.branch_id)
            .handle(command, metadata.clone())
            .await?;
        ctx.deps()
            .cache
            .put_exists(format!("Branch:{}", parameters.branch_id), parameters.branch_id);
        Ok(value
            .with_property("OwnerId", parameters.owner_id.to_string())
            .with_property("OrganizationId", parameters.organization_id.to_string()))
    };
    execute(&metadata, &parameters, validation_set, dispatch).await
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetBranchNameParameters {
    pub owner_id: Uuid,
    pub organization_id: Uuid,
    pub repository_id: Uuid,
    pub branch_id: Option<Uuid>,
    pub branch_name: Option<String>,
    pub new_name: String,
}

pub async fn set_name(
    ctx: &ServerContext,
    parameters: SetBranchNameParameters,
    metadata: EventMetadata,
) -> PipelineOutcome {
    let validation_set: Vec<Validation> = vec![
        Box::pin(validations::valid_entity_name(parameters.new_name.clone())),
        Box::pin(validations::branch_name_available(
            ctx,
            parameters.repository_id,
            parameters.new_name.clone(),
        )),
    ];
    let target = BranchParameters {
        owner_id: parameters.owner_id,
        organization_id: parameters.organization_id,
        repository_id: parameters.repository_id,
        branch_id: parameters.branch_id,
        branch_name: parameters.branch_name.clone(),
    };
    let dispatch = async {
        let branch_id = resolve_target(ctx, &target).await?;
        let value = ctx
            .branch(branch_id)
            .handle(
                BranchCommand::SetName {
                    branch_name: parameters.new_name.clone(),
                },
                metadata.clone(),
            )
            .await?;
        Ok(enrich(value, &target))
    };
    execute(&metadata, &parameters, validation_set, dispatch).await
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnableReferenceTypeParameters {
    pub owner_id: Uuid,
    pub organization_id: Uuid,
    pub repository_id: Uuid,
    pub branch_id: Option<Uuid>,
    pub branch_name: Option<String>,
    pub flag: ReferenceFlag,
    pub enabled: bool,
}

pub async fn enable_reference_type(
    ctx: &ServerContext,
    parameters: EnableReferenceTypeParameters,
    metadata: EventMetadata,
) -> PipelineOutcome {
    let target = BranchParameters {
        owner_id: parameters.owner_id,
        organization_id: parameters.organization_id,
        repository_id: parameters.repository_id,
        branch_id: parameters.branch_id,
        branch_name: parameters.branch_name.clone(),
    };
    let dispatch = async {
        let branch_id = resolve_target(ctx, &target).await?;
        let value = ctx
            .branch(branch_id)
            .handle(
                BranchCommand::EnableReferenceType {
                    flag: parameters.flag,
                    enabled: parameters.enabled,
                },
                metadata.clone(),
            )
            .await?;
        Ok(enrich(value, &target))
    };
    execute(&metadata, &parameters, vec![], dispatch).await
}

/// Parameters shared by every reference-producing endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateReferenceParameters {
    pub owner_id: Uuid,
    pub organization_id: Uuid,
    pub repository_id: Uuid,
    pub branch_id: Option<Uuid>,
    pub branch_name: Option<String>,
    pub directory_version_id: Uuid,
    pub sha256_hash: String,
    pub message: String,
}

impl CreateReferenceParameters {
    fn target(&self) -> BranchParameters {
        BranchParameters {
            owner_id: self.owner_id,
            organization_id: self.organization_id,
            repository_id: self.repository_id,
            branch_id: self.branch_id,
            branch_name: self.branch_name.clone(),
        }
    }
}

macro_rules! reference_endpoint {
    ($(#[$doc:meta])* $name:ident, $command:ident) => {
        $(#[$doc])*
        pub async fn $name(
            ctx: &ServerContext,
            parameters: CreateReferenceParameters,
            metadata: EventMetadata,
        ) -> PipelineOutcome {
            let validation_set: Vec<Validation> = vec![
                Box::pin(validations::not_empty_uuid(
                    "directoryVersionId",
                    parameters.directory_version_id,
                )),
                Box::pin(validations::valid_sha256(parameters.sha256_hash.clone())),
                Box::pin(validations::repository_exists(ctx, parameters.repository_id)),
            ];
            let target = parameters.target();
            let dispatch = async {
                let branch_id = resolve_target(ctx, &target).await?;
                let value = ctx
                    .branch(branch_id)
                    .handle(
                        BranchCommand::$command {
                            directory_version_id: parameters.directory_version_id,
                            sha256_hash: parameters.sha256_hash.clone(),
                            reference_text: parameters.message.clone(),
                        },
                        metadata.clone(),
                    )
                    .await?;
                Ok(enrich(value, &target))
            };
            execute(&metadata, &parameters, validation_set, dispatch).await
        }
    };
}

reference_endpoint!(
    /// Record a save (an auto-expiring working snapshot).
    save,
    Save
);
reference_endpoint!(checkpoint, Checkpoint);
reference_endpoint!(commit, Commit);
reference_endpoint!(promote, Promote);
reference_endpoint!(tag, Tag);
reference_endpoint!(create_external, CreateExternal);
reference_endpoint!(
    /// Explicitly re-point `based_on` at a directory version.
    assign,
    Assign
);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RebaseParameters {
    pub owner_id: Uuid,
    pub organization_id: Uuid,
    pub repository_id: Uuid,
    pub branch_id: Option<Uuid>,
    pub branch_name: Option<String>,
    /// The promotion reference on the parent branch to re-base onto.
    pub reference_id: Uuid,
}

pub async fn rebase(
    ctx: &ServerContext,
    parameters: RebaseParameters,
    metadata: EventMetadata,
) -> PipelineOutcome {
    let validation_set: Vec<Validation> = vec![
        Box::pin(validations::not_empty_uuid("referenceId", parameters.reference_id)),
        Box::pin(validations::reference_exists(ctx, parameters.reference_id)),
    ];
    let target = BranchParameters {
        owner_id: parameters.owner_id,
        organization_id: parameters.organization_id,
        repository_id: parameters.repository_id,
        branch_id: parameters.branch_id,
        branch_name: parameters.branch_name.clone(),
    };
    let dispatch = async {
        let branch_id = resolve_target(ctx, &target).await?;
        let value = ctx
            .branch(branch_id)
            .handle(
                BranchCommand::Rebase {
                    reference_id: parameters.reference_id,
                },
                metadata.clone(),
            )
            .await?;
        Ok(enrich(value, &target))
    };
    execute(&metadata, &parameters, validation_set, dispatch).await
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoveReferenceParameters {
    pub owner_id: Uuid,
    pub organization_id: Uuid,
    pub repository_id: Uuid,
    pub branch_id: Option<Uuid>,
    pub branch_name: Option<String>,
    pub reference_id: Uuid,
}

pub async fn remove_reference(
    ctx: &ServerContext,
    parameters: RemoveReferenceParameters,
    metadata: EventMetadata,
) -> PipelineOutcome {
    let validation_set: Vec<Validation> = vec![Box::pin(validations::reference_exists(
        ctx,
        parameters.reference_id,
    ))];
    let target = BranchParameters {
        owner_id: parameters.owner_id,
        organization_id: parameters.organization_id,
        repository_id: parameters.repository_id,
        branch_id: parameters.branch_id,
        branch_name: parameters.branch_name.clone(),
    };
    let dispatch = async {
        let branch_id = resolve_target(ctx, &target).await?;
        let value = ctx
            .branch(branch_id)
            .handle(
                BranchCommand::RemoveReference {
                    reference_id: parameters.reference_id,
                },
                metadata.clone(),
            )
            .await?;
        Ok(enrich(value, &target))
    };
    execute(&metadata, &parameters, validation_set, dispatch).await
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteBranchParameters {
    pub owner_id: Uuid,
    pub organization_id: Uuid,
    pub repository_id: Uuid,
    pub branch_id: Option<Uuid>,
    pub branch_name: Option<String>,
    pub delete_reason: String,
    pub force: bool,
}

pub async fn delete_logical(
    ctx: &ServerContext,
    parameters: DeleteBranchParameters,
    metadata: EventMetadata,
) -> PipelineOutcome {
    let target = BranchParameters {
        owner_id: parameters.owner_id,
        organization_id: parameters.organization_id,
        repository_id: parameters.repository_id,
        branch_id: parameters.branch_id,
        branch_name: parameters.branch_name.clone(),
    };
    let dispatch = async {
        let branch_id = resolve_target(ctx, &target).await?;
        let value = ctx
            .branch(branch_id)
            .handle(
                BranchCommand::DeleteLogical {
                    delete_reason: parameters.delete_reason.clone(),
                    force: parameters.force,
                },
                metadata.clone(),
            )
            .await?;
        ctx.deps().cache.invalidate(&format!("Branch:{branch_id}"));
        Ok(enrich(value, &target))
    };
    execute(&metadata, &parameters, vec![], dispatch).await
}

pub async fn delete_physical(
    ctx: &ServerContext,
    parameters: BranchParameters,
    metadata: EventMetadata,
) -> PipelineOutcome {
    let dispatch = async {
        let branch_id = resolve_target(ctx, &parameters).await?;
        let value = ctx
            .branch(branch_id)
            .handle(BranchCommand::DeletePhysical, metadata.clone())
            .await?;
        ctx.deps().cache.invalidate(&format!("Branch:{branch_id}"));
        Ok(enrich(value, &parameters))
    };
    execute(&metadata, &parameters, vec![], dispatch).await
}

pub async fn undelete(
    ctx: &ServerContext,
    parameters: BranchParameters,
    metadata: EventMetadata,
) -> PipelineOutcome {
    let dispatch = async {
        let branch_id = resolve_target(ctx, &parameters).await?;
        let value = ctx
            .branch(branch_id)
            .handle(BranchCommand::Undelete, metadata.clone())
            .await?;
        Ok(enrich(value, &parameters))
    };
    execute(&metadata, &parameters, vec![], dispatch).await
}

/// Query: current branch dto.
pub async fn get(ctx: &ServerContext, branch_id: Uuid) -> Result<BranchDto, GraceError> {
    ctx.branch(branch_id).get().await
}

/// Query: references on a branch, newest first, bounded by `max_count`.
pub async fn get_references(
    ctx: &ServerContext,
    branch_id: Uuid,
    max_count: usize,
) -> Result<Vec<ReferenceRow>, GraceError> {
    let mut rows = ctx.deps().references.references_for_branch(branch_id);
    rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    rows.truncate(max_count);
    Ok(rows)
}
