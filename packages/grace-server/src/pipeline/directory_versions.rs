//! Directory-version endpoints. Addressed by content:
//! `(repository_id, sha256)` routes to the derived actor id.

use grace_actors::EventMetadata;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{execute, validations, PipelineOutcome, Validation};
use crate::context::ServerContext;
use crate::domains::directory_version::commands::DirectoryVersionCommand;
use crate::domains::directory_version::models::{DirectoryVersionDto, FileEntry};
use crate::errors::GraceError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDirectoryVersionParameters {
    pub owner_id: Uuid,
    pub organization_id: Uuid,
    pub repository_id: Uuid,
    pub directory_version_id: Uuid,
    pub sha256_hash: String,
    pub relative_path: String,
    pub files: Vec<FileEntry>,
    pub size: u64,
    pub directory_version_ids: Vec<Uuid>,
}

pub async fn create(
    ctx: &ServerContext,
    parameters: CreateDirectoryVersionParameters,
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
    let dispatch = async {
        let command = DirectoryVersionCommand::Create {
            directory_version_id: parameters.directory_version_id,
            repository_id: parameters.repository_id,
            sha256_hash: parameters.sha256_hash.clone(),
            relative_path: parameters.relative_path.clone(),
            files: parameters.files.clone(),
            size: parameters.size,
            directory_version_ids: parameters.directory_version_ids.clone(),
        };
        let value = ctx
            .directory_version(parameters.repository_id, &parameters.sha256_hash)
            .handle(command, metadata.clone())
            .await?;
        Ok(value
            .with_property("OwnerId", parameters.owner_id.to_string())
            .with_property("OrganizationId", parameters.organization_id.to_string()))
    };
    execute(&metadata, &parameters, validation_set, dispatch).await
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteDirectoryVersionParameters {
    pub owner_id: Uuid,
    pub organization_id: Uuid,
    pub repository_id: Uuid,
    pub sha256_hash: String,
    pub delete_reason: String,
}

pub async fn delete_logical(
    ctx: &ServerContext,
    parameters: DeleteDirectoryVersionParameters,
    metadata: EventMetadata,
) -> PipelineOutcome {
    let validation_set: Vec<Validation> = vec![Box::pin(validations::valid_sha256(
        parameters.sha256_hash.clone(),
    ))];
    let dispatch = async {
        ctx.directory_version(parameters.repository_id, &parameters.sha256_hash)
            .handle(
                DirectoryVersionCommand::DeleteLogical {
                    delete_reason: parameters.delete_reason.clone(),
                },
                metadata.clone(),
            )
            .await
    };
    execute(&metadata, &parameters, validation_set, dispatch).await
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryVersionParameters {
    pub owner_id: Uuid,
    pub organization_id: Uuid,
    pub repository_id: Uuid,
    pub sha256_hash: String,
}

pub async fn undelete(
    ctx: &ServerContext,
    parameters: DirectoryVersionParameters,
    metadata: EventMetadata,
) -> PipelineOutcome {
    let dispatch = async {
        ctx.directory_version(parameters.repository_id, &parameters.sha256_hash)
            .handle(DirectoryVersionCommand::Undelete, metadata.clone())
            .await
    };
    execute(&metadata, &parameters, vec![], dispatch).await
}

/// Query: the directory version cached for `(repository, sha256)`.
pub async fn get_by_sha256(
    ctx: &ServerContext,
    repository_id: Uuid,
    sha256_hash: &str,
) -> Result<DirectoryVersionDto, GraceError> {
    let dto = ctx.directory_version(repository_id, sha256_hash).get().await?;
    if dto.directory_version_id.is_nil() {
        return Err(GraceError::DirectoryVersionDoesNotExist);
    }
    Ok(dto)
}

/// Query: file entries, bounded by `max_count`.
pub async fn get_files(
    ctx: &ServerContext,
    repository_id: Uuid,
    sha256_hash: &str,
    max_count: usize,
) -> Result<Vec<FileEntry>, GraceError> {
    ctx.directory_version(repository_id, sha256_hash)
        .get_files(max_count)
        .await
}

