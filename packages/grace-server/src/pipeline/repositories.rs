//! Repository endpoints.
//!
//! Create and rename maintain the `RepositoryName` index actor and the
//! existence cache, which is what makes name resolution work for every
//! other endpoint.

use grace_actors::EventMetadata;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{execute, validations, PipelineOutcome, Validation};
use crate::context::ServerContext;
use crate::domains::repository::commands::RepositoryCommand;
use crate::domains::repository::models::{
    RepositoryDto, RepositoryStatus, RepositoryVisibility,
};
use crate::errors::GraceError;
use crate::resolve;

/// Days values accepted for retention windows.
const MAX_RETENTION_DAYS: i64 = 36_500;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRepositoryParameters {
    pub repository_id: Uuid,
    pub owner_id: Uuid,
    pub organization_id: Uuid,
    pub repository_name: String,
    pub visibility: RepositoryVisibility,
}

/// Common target selector for non-create repository operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryParameters {
    pub owner_id: Uuid,
    pub organization_id: Uuid,
    pub repository_id: Option<Uuid>,
    pub repository_name: Option<String>,
}

async fn resolve_target(
    ctx: &ServerContext,
    parameters: &RepositoryParameters,
) -> Result<Uuid, GraceError> {
    resolve::resolve_repository_id(
        ctx,
        parameters.owner_id,
        parameters.organization_id,
        parameters.repository_id,
        parameters.repository_name.as_deref(),
    )
    .await?
    .ok_or(GraceError::RepositoryDoesNotExist)
}

pub async fn create(
    ctx: &ServerContext,
    parameters: CreateRepositoryParameters,
    metadata: EventMetadata,
) -> PipelineOutcome {
    let validations: Vec<Validation> = vec![
        Box::pin(validations::not_empty_uuid(
            "repositoryId",
            parameters.repository_id,
        )),
        Box::pin(validations::valid_entity_name(
            parameters.repository_name.clone(),
        )),
        Box::pin(validations::owner_exists(ctx, parameters.owner_id)),
        Box::pin(validations::organization_exists(
            ctx,
            parameters.organization_id,
        )),
        Box::pin(validations::repository_name_available(
            ctx,
            parameters.owner_id,
            parameters.organization_id,
            parameters.repository_name.clone(),
        )),
    ];
    let dispatch = async {
        let command = RepositoryCommand::Create {
            repository_id: parameters.repository_id,
            owner_id: parameters.owner_id,
            organization_id: parameters.organization_id,
            repository_name: parameters.repository_name.clone(),
            visibility: parameters.visibility,
            retention: ctx.deps().config.default_retention(),
        };
        let value = ctx
            .repository(parameters.repository_id)
            .handle(command, metadata.clone())
            .await?;

        // Bind the name for everyone who resolves by it.
        ctx.repository_name(
            &parameters.repository_name,
            parameters.owner_id,
            parameters.organization_id,
        )
        .set_repository_id(Some(parameters.repository_id))
        .await?;
        ctx.deps().cache.put_exists(
            format!("Repository:{}", parameters.repository_id),
            parameters.repository_id,
        );
        Ok(value)
    };
    execute(&metadata, &parameters, validations, dispatch).await
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetRepositoryNameParameters {
    pub owner_id: Uuid,
    pub organization_id: Uuid,
    pub repository_id: Option<Uuid>,
    pub repository_name: Option<String>,
    pub new_name: String,
}

pub async fn set_name(
    ctx: &ServerContext,
    parameters: SetRepositoryNameParameters,
    metadata: EventMetadata,
) -> PipelineOutcome {
    let validations: Vec<Validation> = vec![
        Box::pin(validations::valid_entity_name(parameters.new_name.clone())),
        Box::pin(validations::repository_name_available(
            ctx,
            parameters.owner_id,
            parameters.organization_id,
            parameters.new_name.clone(),
        )),
    ];
    let target = RepositoryParameters {
        owner_id: parameters.owner_id,
        organization_id: parameters.organization_id,
        repository_id: parameters.repository_id,
        repository_name: parameters.repository_name.clone(),
    };
    let dispatch = async {
        let repository_id = resolve_target(ctx, &target).await?;
        let previous_name = ctx.repository(repository_id).get().await?.repository_name;

        let value = ctx
            .repository(repository_id)
            .handle(
                RepositoryCommand::SetName {
                    repository_name: parameters.new_name.clone(),
                },
                metadata.clone(),
            )
            .await?;

        // Re-point the index: new binding set, old binding cleared.
        ctx.repository_name(
            &parameters.new_name,
            parameters.owner_id,
            parameters.organization_id,
        )
        .set_repository_id(Some(repository_id))
        .await?;
        if previous_name != parameters.new_name {
            ctx.repository_name(
                &previous_name,
                parameters.owner_id,
                parameters.organization_id,
            )
            .set_repository_id(None)
            .await?;
        }
        Ok(value)
    };
    execute(&metadata, &parameters, validations, dispatch).await
}

macro_rules! setter_endpoint {
    ($(#[$doc:meta])* $name:ident, $params:ident { $field:ident : $ty:ty }, $command:ident, $extra:expr) => {
        #[derive(Debug, Clone, Serialize, Deserialize)]
        pub struct $params {
            pub owner_id: Uuid,
            pub organization_id: Uuid,
            pub repository_id: Option<Uuid>,
            pub repository_name: Option<String>,
            pub $field: $ty,
        }

        $(#[$doc])*
        pub async fn $name(
            ctx: &ServerContext,
            parameters: $params,
            metadata: EventMetadata,
        ) -> PipelineOutcome {
            let validations: Vec<Validation> = ($extra)(&parameters);
            let target = RepositoryParameters {
                owner_id: parameters.owner_id,
                organization_id: parameters.organization_id,
                repository_id: parameters.repository_id,
                repository_name: parameters.repository_name.clone(),
            };
            let dispatch = async {
                let repository_id = resolve_target(ctx, &target).await?;
                ctx.repository(repository_id)
                    .handle(
                        RepositoryCommand::$command {
                            $field: parameters.$field.clone(),
                        },
                        metadata.clone(),
                    )
                    .await
            };
            execute(&metadata, &parameters, validations, dispatch).await
        }
    };
}

fn no_validations<P>(_parameters: &P) -> Vec<Validation<'_>> {
    vec![]
}

fn days_validation<'a>(field: &'static str, value: i64) -> Vec<Validation<'a>> {
    vec![Box::pin(validations::within_range(
        field,
        value,
        0,
        MAX_RETENTION_DAYS,
    ))]
}

setter_endpoint!(
    set_visibility,
    SetRepositoryVisibilityParameters { visibility: RepositoryVisibility },
    SetVisibility,
    no_validations
);

setter_endpoint!(
    set_status,
    SetRepositoryStatusParameters { status: RepositoryStatus },
    SetStatus,
    no_validations
);

setter_endpoint!(
    set_record_saves,
    SetRecordSavesParameters { record_saves: bool },
    SetRecordSaves,
    no_validations
);

setter_endpoint!(
    set_default_server_api_version,
    SetDefaultServerApiVersionParameters { default_server_api_version: String },
    SetDefaultServerApiVersion,
    no_validations
);

setter_endpoint!(
    /// Retention window for save references.
    set_save_days,
    SetSaveDaysParameters { save_days: i64 },
    SetSaveDays,
    |parameters: &SetSaveDaysParameters| days_validation("saveDays", parameters.save_days)
);

setter_endpoint!(
    set_checkpoint_days,
    SetCheckpointDaysParameters { checkpoint_days: i64 },
    SetCheckpointDays,
    |parameters: &SetCheckpointDaysParameters| {
        days_validation("checkpointDays", parameters.checkpoint_days)
    }
);

setter_endpoint!(
    set_diff_cache_days,
    SetDiffCacheDaysParameters { diff_cache_days: i64 },
    SetDiffCacheDays,
    |parameters: &SetDiffCacheDaysParameters| {
        days_validation("diffCacheDays", parameters.diff_cache_days)
    }
);

setter_endpoint!(
    set_directory_version_cache_days,
    SetDirectoryVersionCacheDaysParameters { directory_version_cache_days: i64 },
    SetDirectoryVersionCacheDays,
    |parameters: &SetDirectoryVersionCacheDaysParameters| {
        days_validation(
            "directoryVersionCacheDays",
            parameters.directory_version_cache_days,
        )
    }
);

setter_endpoint!(
    set_logical_delete_days,
    SetLogicalDeleteDaysParameters { logical_delete_days: i64 },
    SetLogicalDeleteDays,
    |parameters: &SetLogicalDeleteDaysParameters| {
        days_validation("logicalDeleteDays", parameters.logical_delete_days)
    }
);

setter_endpoint!(
    set_description,
    SetRepositoryDescriptionParameters { description: String },
    SetDescription,
    no_validations
);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteRepositoryParameters {
    pub owner_id: Uuid,
    pub organization_id: Uuid,
    pub repository_id: Option<Uuid>,
    pub repository_name: Option<String>,
    pub delete_reason: String,
    pub force: bool,
}

pub async fn delete_logical(
    ctx: &ServerContext,
    parameters: DeleteRepositoryParameters,
    metadata: EventMetadata,
) -> PipelineOutcome {
    let target = RepositoryParameters {
        owner_id: parameters.owner_id,
        organization_id: parameters.organization_id,
        repository_id: parameters.repository_id,
        repository_name: parameters.repository_name.clone(),
    };
    let dispatch = async {
        let repository_id = resolve_target(ctx, &target).await?;
        let value = ctx
            .repository(repository_id)
            .handle(
                RepositoryCommand::DeleteLogical {
                    delete_reason: parameters.delete_reason.clone(),
                    force: parameters.force,
                },
                metadata.clone(),
            )
            .await?;
        ctx.deps()
            .cache
            .invalidate(&format!("Repository:{repository_id}"));
        Ok(value)
    };
    execute(&metadata, &parameters, vec![], dispatch).await
}

pub async fn delete_physical(
    ctx: &ServerContext,
    parameters: RepositoryParameters,
    metadata: EventMetadata,
) -> PipelineOutcome {
    let dispatch = async {
        let repository_id = resolve_target(ctx, &parameters).await?;
        let value = ctx
            .repository(repository_id)
            .handle(RepositoryCommand::DeletePhysical, metadata.clone())
            .await?;
        ctx.deps()
            .cache
            .invalidate(&format!("Repository:{repository_id}"));
        Ok(value)
    };
    execute(&metadata, &parameters, vec![], dispatch).await
}

pub async fn undelete(
    ctx: &ServerContext,
    parameters: RepositoryParameters,
    metadata: EventMetadata,
) -> PipelineOutcome {
    let dispatch = async {
        let repository_id = resolve_target(ctx, &parameters).await?;
        ctx.repository(repository_id)
            .handle(RepositoryCommand::Undelete, metadata.clone())
            .await
    };
    execute(&metadata, &parameters, vec![], dispatch).await
}

/// Query: current repository dto.
pub async fn get(ctx: &ServerContext, repository_id: Uuid) -> Result<RepositoryDto, GraceError> {
    ctx.repository(repository_id).get().await
}
