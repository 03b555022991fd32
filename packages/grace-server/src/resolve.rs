//! Name → id resolution.
//!
//! Given any admissible mix of ids and names for a path
//! (owner[, organization[, repository[, branch]]]), resolve each level
//! to its canonical id, preferring a provided id over a name. Repository
//! names route through the `RepositoryName` index actor; branch names
//! through the branch read model; owner and organization name bindings
//! are kept warm in the existence cache by whoever creates or renames
//! them (the cache is never authoritative - a cold name lookup misses
//! and the caller falls back to requiring the id).

use grace_actors::CachedEntity;
use uuid::Uuid;

use crate::context::ServerContext;
use crate::errors::GraceError;

fn owner_name_key(owner_name: &str) -> String {
    format!("OwnerName:{owner_name}")
}

fn organization_name_key(owner_id: Uuid, organization_name: &str) -> String {
    format!("OrganizationName:{owner_id}|{organization_name}")
}

fn repository_name_key(repository_name: &str, owner_id: Uuid, organization_id: Uuid) -> String {
    format!("RepositoryName:{repository_name}|{owner_id}|{organization_id}")
}

/// Seed the owner-name binding (create/rename path).
pub fn remember_owner_name(ctx: &ServerContext, owner_name: &str, owner_id: Uuid) {
    ctx.deps().cache.put_exists(owner_name_key(owner_name), owner_id);
}

pub fn remember_organization_name(
    ctx: &ServerContext,
    owner_id: Uuid,
    organization_name: &str,
    organization_id: Uuid,
) {
    ctx.deps().cache.put_exists(
        organization_name_key(owner_id, organization_name),
        organization_id,
    );
}

pub async fn resolve_owner_id(
    ctx: &ServerContext,
    owner_id: Option<Uuid>,
    owner_name: Option<&str>,
) -> Result<Option<Uuid>, GraceError> {
    if let Some(id) = owner_id {
        return Ok(Some(id));
    }
    let Some(name) = owner_name else {
        return Ok(None);
    };
    match ctx.deps().cache.get(&owner_name_key(name)) {
        Some(CachedEntity::Exists(id)) => Ok(Some(id)),
        _ => Ok(None),
    }
}

pub async fn resolve_organization_id(
    ctx: &ServerContext,
    owner_id: Uuid,
    organization_id: Option<Uuid>,
    organization_name: Option<&str>,
) -> Result<Option<Uuid>, GraceError> {
    if let Some(id) = organization_id {
        return Ok(Some(id));
    }
    let Some(name) = organization_name else {
        return Ok(None);
    };
    match ctx.deps().cache.get(&organization_name_key(owner_id, name)) {
        Some(CachedEntity::Exists(id)) => Ok(Some(id)),
        _ => Ok(None),
    }
}

/// Repository resolution consults the cache, then the name index actor.
pub async fn resolve_repository_id(
    ctx: &ServerContext,
    owner_id: Uuid,
    organization_id: Uuid,
    repository_id: Option<Uuid>,
    repository_name: Option<&str>,
) -> Result<Option<Uuid>, GraceError> {
    if let Some(id) = repository_id {
        return Ok(Some(id));
    }
    let Some(name) = repository_name else {
        return Ok(None);
    };

    let cache_key = repository_name_key(name, owner_id, organization_id);
    match ctx.deps().cache.get(&cache_key) {
        Some(CachedEntity::Exists(id)) => return Ok(Some(id)),
        Some(CachedEntity::DoesNotExist) => return Ok(None),
        None => {}
    }

    let resolved = ctx
        .repository_name(name, owner_id, organization_id)
        .get_repository_id()
        .await?;
    match resolved {
        Some(id) => ctx.deps().cache.put_exists(cache_key, id),
        None => ctx.deps().cache.put_missing(cache_key),
    }
    Ok(resolved)
}

/// Branch resolution goes through the repository's branch read model.
pub async fn resolve_branch_id(
    ctx: &ServerContext,
    repository_id: Uuid,
    branch_id: Option<Uuid>,
    branch_name: Option<&str>,
) -> Result<Option<Uuid>, GraceError> {
    if let Some(id) = branch_id {
        return Ok(Some(id));
    }
    let Some(name) = branch_name else {
        return Ok(None);
    };
    Ok(ctx.deps().branches.branch_id_by_name(repository_id, name))
}
