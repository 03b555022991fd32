//! Validation library.
//!
//! Pure checks (names, hashes, ranges) plus existence validators that
//! consult the cache first and fall through to the entity actor. All of
//! them return the stable error codes of the taxonomy; endpoints compose
//! them into arrays executed concurrently by `all_pass`.

use std::sync::OnceLock;

use grace_actors::CachedEntity;
use regex::Regex;
use uuid::Uuid;

use crate::context::ServerContext;
use crate::errors::GraceError;

fn name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new("^[A-Za-z][A-Za-z0-9-]{1,63}$").unwrap_or_else(|error| {
            panic!("entity-name pattern failed to compile: {error}");
        })
    })
}

pub fn is_valid_entity_name(name: &str) -> bool {
    name_pattern().is_match(name)
}

pub fn is_well_formed_sha256(hash: &str) -> bool {
    hash.len() == 64 && hash.bytes().all(|byte| byte.is_ascii_hexdigit())
}

// -- Pure validators ---------------------------------------------------------

pub async fn valid_entity_name(name: String) -> Result<(), GraceError> {
    if is_valid_entity_name(&name) {
        Ok(())
    } else {
        Err(GraceError::InvalidEntityName { name })
    }
}

pub async fn valid_uuid(value: String) -> Result<(), GraceError> {
    match Uuid::try_parse(&value) {
        Ok(id) if !id.is_nil() => Ok(()),
        _ => Err(GraceError::InvalidUuid { value }),
    }
}

pub async fn not_empty_uuid(field: &'static str, id: Uuid) -> Result<(), GraceError> {
    if id.is_nil() {
        Err(GraceError::InvalidUuid {
            value: format!("{field}: {id}"),
        })
    } else {
        Ok(())
    }
}

pub async fn valid_sha256(hash: String) -> Result<(), GraceError> {
    if is_well_formed_sha256(&hash) {
        Ok(())
    } else {
        Err(GraceError::InvalidSha256 { value: hash })
    }
}

pub async fn within_range(
    field: &'static str,
    value: i64,
    minimum: i64,
    maximum: i64,
) -> Result<(), GraceError> {
    if value < minimum || value > maximum {
        Err(GraceError::ValueOutOfRange {
            field,
            minimum,
            maximum,
            value,
        })
    } else {
        Ok(())
    }
}

// -- Existence validators ----------------------------------------------------
//
// Cache states: Exists short-circuits, DoesNotExist short-circuits the
// other way, unknown falls through to the actor and refills the cache.

pub async fn owner_exists(ctx: &ServerContext, owner_id: Uuid) -> Result<(), GraceError> {
    let key = format!("Owner:{owner_id}");
    match ctx.deps().cache.get(&key) {
        Some(CachedEntity::Exists(_)) => return Ok(()),
        Some(CachedEntity::DoesNotExist) => return Err(GraceError::OwnerDoesNotExist),
        None => {}
    }
    if ctx.owner(owner_id).exists().await? {
        ctx.deps().cache.put_exists(key, owner_id);
        Ok(())
    } else {
        ctx.deps().cache.put_missing(key);
        Err(GraceError::OwnerDoesNotExist)
    }
}

pub async fn organization_exists(
    ctx: &ServerContext,
    organization_id: Uuid,
) -> Result<(), GraceError> {
    let key = format!("Organization:{organization_id}");
    match ctx.deps().cache.get(&key) {
        Some(CachedEntity::Exists(_)) => return Ok(()),
        Some(CachedEntity::DoesNotExist) => return Err(GraceError::OrganizationDoesNotExist),
        None => {}
    }
    if ctx.organization(organization_id).exists().await? {
        ctx.deps().cache.put_exists(key, organization_id);
        Ok(())
    } else {
        ctx.deps().cache.put_missing(key);
        Err(GraceError::OrganizationDoesNotExist)
    }
}

pub async fn repository_exists(
    ctx: &ServerContext,
    repository_id: Uuid,
) -> Result<(), GraceError> {
    let key = format!("Repository:{repository_id}");
    match ctx.deps().cache.get(&key) {
        Some(CachedEntity::Exists(_)) => return Ok(()),
        Some(CachedEntity::DoesNotExist) => return Err(GraceError::RepositoryDoesNotExist),
        None => {}
    }
    if ctx.repository(repository_id).exists().await? {
        ctx.deps().cache.put_exists(key, repository_id);
        Ok(())
    } else {
        ctx.deps().cache.put_missing(key);
        Err(GraceError::RepositoryDoesNotExist)
    }
}

pub async fn branch_exists(ctx: &ServerContext, branch_id: Uuid) -> Result<(), GraceError> {
    let key = format!("Branch:{branch_id}");
    match ctx.deps().cache.get(&key) {
        Some(CachedEntity::Exists(_)) => return Ok(()),
        Some(CachedEntity::DoesNotExist) => return Err(GraceError::BranchDoesNotExist),
        None => {}
    }
    if ctx.branch(branch_id).exists().await? {
        ctx.deps().cache.put_exists(key, branch_id);
        Ok(())
    } else {
        ctx.deps().cache.put_missing(key);
        Err(GraceError::BranchDoesNotExist)
    }
}

pub async fn reference_exists(ctx: &ServerContext, reference_id: Uuid) -> Result<(), GraceError> {
    if ctx.reference(reference_id).exists().await? {
        Ok(())
    } else {
        Err(GraceError::ReferenceDoesNotExist)
    }
}

// -- Uniqueness validators ---------------------------------------------------

/// Invariant: a repository's set of branch names is unique.
pub async fn branch_name_available(
    ctx: &ServerContext,
    repository_id: Uuid,
    branch_name: String,
) -> Result<(), GraceError> {
    if ctx
        .deps()
        .branches
        .branch_name_taken(repository_id, &branch_name)
    {
        Err(GraceError::NameAlreadyExists { name: branch_name })
    } else {
        Ok(())
    }
}

/// Invariant: a repository's (name, owner, organization) is unique.
pub async fn repository_name_available(
    ctx: &ServerContext,
    owner_id: Uuid,
    organization_id: Uuid,
    repository_name: String,
) -> Result<(), GraceError> {
    let taken = ctx
        .repository_name(&repository_name, owner_id, organization_id)
        .get_repository_id()
        .await?
        .is_some();
    if taken {
        Err(GraceError::NameAlreadyExists {
            name: repository_name,
        })
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_name_pattern() {
        assert!(is_valid_entity_name("demo"));
        assert!(is_valid_entity_name("Demo-2"));
        assert!(is_valid_entity_name(&format!("a{}", "b".repeat(63))));

        assert!(!is_valid_entity_name("a")); // too short
        assert!(!is_valid_entity_name("1demo")); // leading digit
        assert!(!is_valid_entity_name("-demo")); // leading dash
        assert!(!is_valid_entity_name("de mo")); // whitespace
        assert!(!is_valid_entity_name(&format!("a{}", "b".repeat(64)))); // too long
    }

    #[test]
    fn sha256_shape() {
        assert!(is_well_formed_sha256(&"ab".repeat(32)));
        assert!(is_well_formed_sha256(&"AB".repeat(32)));
        assert!(!is_well_formed_sha256("abc"));
        assert!(!is_well_formed_sha256(&"zz".repeat(32)));
    }

    #[tokio::test]
    async fn range_validator() {
        assert!(within_range("saveDays", 7, 0, 36_500).await.is_ok());
        assert!(within_range("saveDays", -1, 0, 36_500).await.is_err());
        assert!(within_range("saveDays", 50_000, 0, 36_500).await.is_err());
    }

    #[tokio::test]
    async fn uuid_validators() {
        assert!(valid_uuid(Uuid::new_v4().to_string()).await.is_ok());
        assert!(valid_uuid("not-a-uuid".into()).await.is_err());
        assert!(valid_uuid(Uuid::nil().to_string()).await.is_err());

        assert!(not_empty_uuid("ownerId", Uuid::new_v4()).await.is_ok());
        assert!(not_empty_uuid("ownerId", Uuid::nil()).await.is_err());
    }
}
