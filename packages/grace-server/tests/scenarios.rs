//! End-to-end scenarios through the command pipeline, the entity
//! actors, the reminder scheduler and the read model, on a manual clock.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{Duration, Utc};
use grace_actors::testing::{eventually, FlakyStorage};
use grace_actors::{ActorAddress, Clock, EventMetadata, InMemoryStateStorage, ManualClock};
use grace_server::domains::branch::models::ReferenceFlag;
use grace_server::domains::owner::models::OwnerType;
use grace_server::domains::organization::models::OrganizationType;
use grace_server::domains::reference::models::ReferenceType;
use grace_server::domains::repository::models::{RepositoryVisibility, RetentionPolicy};
use grace_server::errors::GraceError;
use grace_server::pipeline::{
    branches, directory_versions, organizations, owners, references, repositories,
    PipelineOutcome,
};
use grace_server::{Config, ServerContext};
use uuid::Uuid;

struct Harness {
    ctx: ServerContext,
    clock: Arc<ManualClock>,
    owner_id: Uuid,
    organization_id: Uuid,
}

fn metadata() -> EventMetadata {
    EventMetadata::new(Uuid::new_v4().to_string())
}

fn sha(hex_pair: &str) -> String {
    hex_pair.repeat(32)
}

async fn setup() -> Harness {
    setup_with_storage(Arc::new(InMemoryStateStorage::new())).await
}

async fn setup_with_storage(storage: Arc<dyn grace_actors::StateStorage>) -> Harness {
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let ctx = ServerContext::builder(Config::default())
        .with_clock(Arc::clone(&clock) as Arc<dyn Clock>)
        .with_storage(storage)
        .build();

    let owner_id = Uuid::new_v4();
    let organization_id = Uuid::new_v4();

    let outcome = owners::create(
        &ctx,
        owners::CreateOwnerParameters {
            owner_id,
            owner_name: "alice".into(),
            owner_type: OwnerType::User,
        },
        metadata(),
    )
    .await;
    assert!(outcome.is_ok(), "owner create failed: {outcome:?}");

    let outcome = organizations::create(
        &ctx,
        organizations::CreateOrganizationParameters {
            organization_id,
            owner_id,
            organization_name: "engineering".into(),
            organization_type: OrganizationType::Private,
        },
        metadata(),
    )
    .await;
    assert!(outcome.is_ok(), "organization create failed: {outcome:?}");

    Harness {
        ctx,
        clock,
        owner_id,
        organization_id,
    }
}

impl Harness {
    async fn create_repository(&self, name: &str) -> Uuid {
        let repository_id = Uuid::new_v4();
        let outcome = repositories::create(
            &self.ctx,
            repositories::CreateRepositoryParameters {
                repository_id,
                owner_id: self.owner_id,
                organization_id: self.organization_id,
                repository_name: name.into(),
                visibility: RepositoryVisibility::Private,
            },
            metadata(),
        )
        .await;
        assert!(outcome.is_ok(), "repository create failed: {outcome:?}");
        repository_id
    }

    async fn create_branch(
        &self,
        repository_id: Uuid,
        name: &str,
        parent_branch_id: Option<Uuid>,
    ) -> Uuid {
        let branch_id = Uuid::new_v4();
        let outcome = branches::create(
            &self.ctx,
            branches::CreateBranchParameters {
                owner_id: self.owner_id,
                organization_id: self.organization_id,
                repository_id,
                branch_id,
                branch_name: name.into(),
                parent_branch_id,
            },
            metadata(),
        )
        .await;
        assert!(outcome.is_ok(), "branch create failed: {outcome:?}");
        // Wait for the read model to pick the branch up; cascade and
        // name-uniqueness guards depend on it.
        let seen = eventually(StdDuration::from_secs(2), || async move {
            self.ctx
                .deps()
                .branches
                .branches_for_repository(repository_id)
                .iter()
                .any(|row| row.branch_id == branch_id)
        })
        .await;
        assert!(seen, "branch never reached the read model");
        branch_id
    }

    fn reference_parameters(
        &self,
        repository_id: Uuid,
        branch_id: Uuid,
        hex_pair: &str,
        message: &str,
    ) -> branches::CreateReferenceParameters {
        branches::CreateReferenceParameters {
            owner_id: self.owner_id,
            organization_id: self.organization_id,
            repository_id,
            branch_id: Some(branch_id),
            branch_name: None,
            directory_version_id: Uuid::new_v4(),
            sha256_hash: sha(hex_pair),
            message: message.into(),
        }
    }
}

fn reference_id_of(outcome: &PipelineOutcome) -> Uuid {
    let value = outcome.ok_value().expect("expected Ok outcome");
    value
        .property("ReferenceId")
        .and_then(|id| Uuid::try_parse(id).ok())
        .expect("ReferenceId property missing")
}

// -- Scenario A: create then get --------------------------------------------

#[tokio::test]
async fn create_repository_then_get_returns_active_dto_with_defaults() {
    let harness = setup().await;
    let repository_id = harness.create_repository("demo").await;

    let dto = repositories::get(&harness.ctx, repository_id).await.unwrap();
    assert_eq!(dto.repository_name, "demo");
    assert_eq!(dto.repository_id, repository_id);
    assert_eq!(dto.owner_id, harness.owner_id);
    assert_eq!(dto.organization_id, harness.organization_id);
    assert!(dto.deleted_at.is_none());
    assert_eq!(dto.retention, RetentionPolicy::default());
}

// -- Scenario B: duplicate correlation id ------------------------------------

#[tokio::test]
async fn duplicate_correlation_id_is_rejected_with_one_persisted_event() {
    let harness = setup().await;
    let repository_id = harness.create_repository("retention").await;

    let correlated = EventMetadata::new("c-1");
    let parameters = repositories::SetSaveDaysParameters {
        owner_id: harness.owner_id,
        organization_id: harness.organization_id,
        repository_id: Some(repository_id),
        repository_name: None,
        save_days: 30,
    };

    let first =
        repositories::set_save_days(&harness.ctx, parameters.clone(), correlated.clone()).await;
    assert!(first.is_ok());

    let second = repositories::set_save_days(&harness.ctx, parameters, correlated).await;
    assert_eq!(second.error(), Some(&GraceError::DuplicateCorrelationId));
    assert_eq!(second.status_code(), 400);

    let dto = repositories::get(&harness.ctx, repository_id).await.unwrap();
    assert_eq!(dto.retention.save_days, 30);
}

// -- Scenario C: save retention ----------------------------------------------

#[tokio::test]
async fn save_with_zero_retention_is_physically_deleted_when_the_timer_fires() {
    let harness = setup().await;
    let repository_id = harness.create_repository("ephemeral").await;
    let branch_id = harness.create_branch(repository_id, "main", None).await;

    // SaveDays = 0 means immediate expiration.
    let outcome = repositories::set_save_days(
        &harness.ctx,
        repositories::SetSaveDaysParameters {
            owner_id: harness.owner_id,
            organization_id: harness.organization_id,
            repository_id: Some(repository_id),
            repository_name: None,
            save_days: 0,
        },
        metadata(),
    )
    .await;
    assert!(outcome.is_ok());

    let outcome = branches::save(
        &harness.ctx,
        harness.reference_parameters(repository_id, branch_id, "aa", "wip"),
        metadata(),
    )
    .await;
    let reference_id = reference_id_of(&outcome);
    harness.clock.advance(Duration::seconds(1));

    let ctx = &harness.ctx;
    let gone = eventually(StdDuration::from_secs(2), || async move {
        !ctx.reference(reference_id).exists().await.unwrap_or(true)
    })
    .await;
    assert!(gone, "save reference survived its retention window");

    // The event log is gone from the store as well.
    let address = ActorAddress::new("Reference", reference_id.to_string());
    let stored = harness.ctx.storage.retrieve(&address, "events").await.unwrap();
    assert_eq!(stored, None);
}

// -- Scenario D: disabled reference type -------------------------------------

#[tokio::test]
async fn save_on_a_branch_with_saves_disabled_is_rejected_without_side_effects() {
    let harness = setup().await;
    let repository_id = harness.create_repository("locked").await;
    let branch_id = harness.create_branch(repository_id, "main", None).await;

    let outcome = branches::enable_reference_type(
        &harness.ctx,
        branches::EnableReferenceTypeParameters {
            owner_id: harness.owner_id,
            organization_id: harness.organization_id,
            repository_id,
            branch_id: Some(branch_id),
            branch_name: None,
            flag: ReferenceFlag::Save,
            enabled: false,
        },
        metadata(),
    )
    .await;
    assert!(outcome.is_ok());

    let outcome = branches::save(
        &harness.ctx,
        harness.reference_parameters(repository_id, branch_id, "bb", "nope"),
        metadata(),
    )
    .await;
    assert_eq!(outcome.error(), Some(&GraceError::SaveIsDisabled));

    // No reference was created and no pointer moved.
    let dto = branches::get(&harness.ctx, branch_id).await.unwrap();
    assert_eq!(dto.latest_save, None);
    assert!(harness
        .ctx
        .deps()
        .references
        .references_for_branch(branch_id)
        .is_empty());
}

// -- Scenario E: forced cascade delete ---------------------------------------

#[tokio::test]
async fn forced_repository_delete_cascades_to_branches_and_references() {
    let harness = setup().await;
    let repository_id = harness.create_repository("retiring").await;
    let alpha = harness.create_branch(repository_id, "alpha", None).await;
    let beta = harness.create_branch(repository_id, "beta", None).await;

    let mut reference_ids = Vec::new();
    for (branch_id, hex_pair) in [(alpha, "0a"), (alpha, "0b"), (beta, "0c")] {
        let outcome = branches::commit(
            &harness.ctx,
            harness.reference_parameters(repository_id, branch_id, hex_pair, "work"),
            metadata(),
        )
        .await;
        reference_ids.push(reference_id_of(&outcome));
    }

    // The cascade enumerates children through the read model; make sure
    // it has caught up before arming the timers.
    let ctx = &harness.ctx;
    let projected = eventually(StdDuration::from_secs(2), || async move {
        ctx.deps().references.references_for_branch(alpha).len() == 2
            && ctx.deps().references.references_for_branch(beta).len() == 1
    })
    .await;
    assert!(projected, "references never reached the read model");

    // Without force the delete is rejected while branches exist.
    let rejected = repositories::delete_logical(
        &harness.ctx,
        repositories::DeleteRepositoryParameters {
            owner_id: harness.owner_id,
            organization_id: harness.organization_id,
            repository_id: Some(repository_id),
            repository_name: None,
            delete_reason: "retire".into(),
            force: false,
        },
        metadata(),
    )
    .await;
    assert_eq!(rejected.error(), Some(&GraceError::RepositoryIsNotEmpty));

    let outcome = repositories::delete_logical(
        &harness.ctx,
        repositories::DeleteRepositoryParameters {
            owner_id: harness.owner_id,
            organization_id: harness.organization_id,
            repository_id: Some(repository_id),
            repository_name: None,
            delete_reason: "retire".into(),
            force: true,
        },
        metadata(),
    )
    .await;
    assert!(outcome.is_ok(), "forced delete failed: {outcome:?}");

    // After logical-delete-days pass the timers fire and everything is
    // physically deleted.
    harness.clock.advance(Duration::days(
        RetentionPolicy::default().logical_delete_days + 1,
    ));

    let ctx = &harness.ctx;
    let repository_gone = eventually(StdDuration::from_secs(3), || async move {
        !ctx.repository(repository_id).exists().await.unwrap_or(true)
    })
    .await;
    assert!(repository_gone, "repository survived the cascade");

    for branch_id in [alpha, beta] {
        assert!(!ctx.branch(branch_id).exists().await.unwrap());
    }
    for reference_id in reference_ids {
        assert!(!ctx.reference(reference_id).exists().await.unwrap());
    }
}

// -- Scenario F + property 7: promote and rebase -----------------------------

#[tokio::test]
async fn rebase_copies_the_promotion_and_moves_based_on_only() {
    let harness = setup().await;
    let repository_id = harness.create_repository("flow").await;
    let main = harness.create_branch(repository_id, "main", None).await;

    // Promote on main; the promotion becomes both pointers (property 7).
    let promote_parameters = harness.reference_parameters(repository_id, main, "cd", "release 1");
    let promotion_dv = promote_parameters.directory_version_id;
    let outcome = branches::promote(&harness.ctx, promote_parameters, metadata()).await;
    let promotion_id = reference_id_of(&outcome);

    let main_dto = branches::get(&harness.ctx, main).await.unwrap();
    assert_eq!(main_dto.latest_promotion, Some(promotion_id));
    assert_eq!(main_dto.based_on, Some(promotion_id));

    // A feature branch created afterwards starts at that promotion.
    let feature = harness
        .create_branch(repository_id, "feature", Some(main))
        .await;
    let feature_dto = branches::get(&harness.ctx, feature).await.unwrap();
    assert_eq!(feature_dto.based_on, Some(promotion_id));

    // Put a save on the feature branch so latest_* has something to keep.
    let outcome = branches::save(
        &harness.ctx,
        harness.reference_parameters(repository_id, feature, "ee", "wip"),
        metadata(),
    )
    .await;
    let save_id = reference_id_of(&outcome);

    // Rebase the feature branch onto the promotion.
    let outcome = branches::rebase(
        &harness.ctx,
        branches::RebaseParameters {
            owner_id: harness.owner_id,
            organization_id: harness.organization_id,
            repository_id,
            branch_id: Some(feature),
            branch_name: None,
            reference_id: promotion_id,
        },
        metadata(),
    )
    .await;
    assert!(outcome.is_ok(), "rebase failed: {outcome:?}");
    let rebase_reference_id = reference_id_of(&outcome);

    // The new reference mirrors the promotion's snapshot.
    let rebase_dto = references::get(&harness.ctx, rebase_reference_id)
        .await
        .unwrap();
    assert_eq!(rebase_dto.reference_type, ReferenceType::Rebase);
    assert_eq!(rebase_dto.directory_version_id, promotion_dv);
    assert_eq!(rebase_dto.sha256_hash, sha("cd"));
    assert_eq!(rebase_dto.reference_text, "release 1");

    // based_on moved to the promotion; latest_* untouched.
    let feature_dto = branches::get(&harness.ctx, feature).await.unwrap();
    assert_eq!(feature_dto.based_on, Some(promotion_id));
    assert_eq!(feature_dto.latest_save, Some(save_id));
    assert_eq!(feature_dto.latest_promotion, None);
}

#[tokio::test]
async fn stale_branch_must_rebase_before_promoting() {
    let harness = setup().await;
    let repository_id = harness.create_repository("strict").await;
    let main = harness.create_branch(repository_id, "main", None).await;

    let outcome = branches::promote(
        &harness.ctx,
        harness.reference_parameters(repository_id, main, "a1", "v1"),
        metadata(),
    )
    .await;
    assert!(outcome.is_ok());

    let feature = harness
        .create_branch(repository_id, "feature", Some(main))
        .await;

    // Main moves ahead.
    let outcome = branches::promote(
        &harness.ctx,
        harness.reference_parameters(repository_id, main, "a2", "v2"),
        metadata(),
    )
    .await;
    let latest_promotion = reference_id_of(&outcome);

    // The stale feature branch cannot promote.
    let rejected = branches::promote(
        &harness.ctx,
        harness.reference_parameters(repository_id, feature, "a3", "mine"),
        metadata(),
    )
    .await;
    assert_eq!(
        rejected.error(),
        Some(&GraceError::BranchNotBasedOnLatestPromotion)
    );

    // Rebase onto the latest promotion, then promotion succeeds.
    let outcome = branches::rebase(
        &harness.ctx,
        branches::RebaseParameters {
            owner_id: harness.owner_id,
            organization_id: harness.organization_id,
            repository_id,
            branch_id: Some(feature),
            branch_name: None,
            reference_id: latest_promotion,
        },
        metadata(),
    )
    .await;
    assert!(outcome.is_ok());

    let outcome = branches::promote(
        &harness.ctx,
        harness.reference_parameters(repository_id, feature, "a4", "mine"),
        metadata(),
    )
    .await;
    assert!(outcome.is_ok(), "promotion after rebase failed: {outcome:?}");
}

// -- Property 4: physical deletion resets to the default dto -----------------

#[tokio::test]
async fn physically_deleted_branch_reads_as_default_and_absent() {
    let harness = setup().await;
    let repository_id = harness.create_repository("cleanup").await;
    let branch_id = harness.create_branch(repository_id, "main", None).await;

    let outcome = branches::delete_physical(
        &harness.ctx,
        branches::BranchParameters {
            owner_id: harness.owner_id,
            organization_id: harness.organization_id,
            repository_id,
            branch_id: Some(branch_id),
            branch_name: None,
        },
        metadata(),
    )
    .await;
    assert!(outcome.is_ok());

    assert!(!harness.ctx.branch(branch_id).exists().await.unwrap());
    let dto = branches::get(&harness.ctx, branch_id).await.unwrap();
    assert_eq!(dto, Default::default());
}

// -- Invariants 2 and 3: name uniqueness -------------------------------------

#[tokio::test]
async fn branch_names_are_unique_within_a_repository() {
    let harness = setup().await;
    let repository_id = harness.create_repository("names").await;
    harness.create_branch(repository_id, "main", None).await;

    let outcome = branches::create(
        &harness.ctx,
        branches::CreateBranchParameters {
            owner_id: harness.owner_id,
            organization_id: harness.organization_id,
            repository_id,
            branch_id: Uuid::new_v4(),
            branch_name: "main".into(),
            parent_branch_id: None,
        },
        metadata(),
    )
    .await;
    assert_eq!(
        outcome.error(),
        Some(&GraceError::NameAlreadyExists {
            name: "main".into()
        })
    );
}

#[tokio::test]
async fn repository_names_are_unique_under_owner_and_organization() {
    let harness = setup().await;
    harness.create_repository("demo").await;

    let outcome = repositories::create(
        &harness.ctx,
        repositories::CreateRepositoryParameters {
            repository_id: Uuid::new_v4(),
            owner_id: harness.owner_id,
            organization_id: harness.organization_id,
            repository_name: "demo".into(),
            visibility: RepositoryVisibility::Private,
        },
        metadata(),
    )
    .await;
    assert_eq!(
        outcome.error(),
        Some(&GraceError::NameAlreadyExists {
            name: "demo".into()
        })
    );

    // Resolution by name finds the original.
    let resolved = grace_server::resolve::resolve_repository_id(
        &harness.ctx,
        harness.owner_id,
        harness.organization_id,
        None,
        Some("demo"),
    )
    .await
    .unwrap();
    assert!(resolved.is_some());
}

// -- Undelete window ----------------------------------------------------------

#[tokio::test]
async fn undelete_cancels_the_physical_deletion_timer() {
    let harness = setup().await;
    let repository_id = harness.create_repository("revived").await;

    let outcome = repositories::delete_logical(
        &harness.ctx,
        repositories::DeleteRepositoryParameters {
            owner_id: harness.owner_id,
            organization_id: harness.organization_id,
            repository_id: Some(repository_id),
            repository_name: None,
            delete_reason: "oops".into(),
            force: false,
        },
        metadata(),
    )
    .await;
    assert!(outcome.is_ok());
    assert!(harness.ctx.repository(repository_id).is_deleted().await.unwrap());

    let outcome = repositories::undelete(
        &harness.ctx,
        repositories::RepositoryParameters {
            owner_id: harness.owner_id,
            organization_id: harness.organization_id,
            repository_id: Some(repository_id),
            repository_name: None,
        },
        metadata(),
    )
    .await;
    assert!(outcome.is_ok());

    // The timer was cancelled: long after the window, still alive.
    harness.clock.advance(Duration::days(365));
    tokio::time::sleep(StdDuration::from_millis(100)).await;
    assert!(harness.ctx.repository(repository_id).exists().await.unwrap());
    assert!(!harness.ctx.repository(repository_id).is_deleted().await.unwrap());
}

// -- Poisoned-actor recovery --------------------------------------------------

#[tokio::test]
async fn failed_persist_poisons_the_actor_and_the_next_turn_rebuilds() {
    let flaky = Arc::new(FlakyStorage::new(Arc::new(InMemoryStateStorage::new())));
    let harness = setup_with_storage(Arc::clone(&flaky) as Arc<dyn grace_actors::StateStorage>).await;
    let repository_id = harness.create_repository("sturdy").await;

    flaky.fail_next_saves(1);
    let outcome = repositories::set_description(
        &harness.ctx,
        repositories::SetRepositoryDescriptionParameters {
            owner_id: harness.owner_id,
            organization_id: harness.organization_id,
            repository_id: Some(repository_id),
            repository_name: None,
            description: "lost".into(),
        },
        metadata(),
    )
    .await;
    assert_eq!(outcome.status_code(), 500, "expected a faulted outcome");

    // The next turn re-activates from durable state: the failed write
    // is invisible, and the actor accepts new commands.
    let dto = repositories::get(&harness.ctx, repository_id).await.unwrap();
    assert_eq!(dto.description, "");
    assert_eq!(dto.repository_name, "sturdy");

    let outcome = repositories::set_description(
        &harness.ctx,
        repositories::SetRepositoryDescriptionParameters {
            owner_id: harness.owner_id,
            organization_id: harness.organization_id,
            repository_id: Some(repository_id),
            repository_name: None,
            description: "kept".into(),
        },
        metadata(),
    )
    .await;
    assert!(outcome.is_ok());
    let dto = repositories::get(&harness.ctx, repository_id).await.unwrap();
    assert_eq!(dto.description, "kept");
}

// -- Activation reconciliation of latest pointers -----------------------------

#[tokio::test]
async fn reactivated_branch_rederives_latest_pointers_from_the_read_model() {
    let flaky = Arc::new(FlakyStorage::new(Arc::new(InMemoryStateStorage::new())));
    let harness = setup_with_storage(Arc::clone(&flaky) as Arc<dyn grace_actors::StateStorage>).await;
    let repository_id = harness.create_repository("pointers").await;
    let branch_id = harness.create_branch(repository_id, "main", None).await;

    let outcome = branches::commit(
        &harness.ctx,
        harness.reference_parameters(repository_id, branch_id, "fe", "first"),
        metadata(),
    )
    .await;
    let commit_id = reference_id_of(&outcome);

    // Wait until the read model carries the commit.
    let ctx = &harness.ctx;
    let projected = eventually(StdDuration::from_secs(2), || async move {
        ctx.deps().references.latest_by_type(branch_id).commit == Some(commit_id)
    })
    .await;
    assert!(projected);

    // Poison the branch actor with a failed persist; its next turn
    // replays from storage, where the pointer event was never written.
    flaky.fail_next_saves(1);
    let outcome = branches::set_name(
        &harness.ctx,
        branches::SetBranchNameParameters {
            owner_id: harness.owner_id,
            organization_id: harness.organization_id,
            repository_id,
            branch_id: Some(branch_id),
            branch_name: None,
            new_name: "renamed".into(),
        },
        metadata(),
    )
    .await;
    assert_eq!(outcome.status_code(), 500);

    // Activation repaired latest_commit from the read model.
    let dto = branches::get(&harness.ctx, branch_id).await.unwrap();
    assert_eq!(dto.branch_name, "main", "failed rename must not stick");
    assert_eq!(dto.latest_commit, Some(commit_id));
}

// -- Directory versions -------------------------------------------------------

#[tokio::test]
async fn directory_version_create_checks_hash_and_declared_size() {
    let harness = setup().await;
    let repository_id = harness.create_repository("content").await;

    let files = vec![
        grace_server::domains::directory_version::models::FileEntry {
            relative_path: "src/lib.rs".into(),
            sha256_hash: sha("11"),
            size: 100,
        },
        grace_server::domains::directory_version::models::FileEntry {
            relative_path: "README.md".into(),
            sha256_hash: sha("22"),
            size: 50,
        },
    ];
    let hash =
        grace_server::domains::directory_version::models::compute_directory_sha256(&files);

    // A declared hash that does not match the listing is an integrity
    // error.
    let wrong_hash = directory_versions::create(
        &harness.ctx,
        directory_versions::CreateDirectoryVersionParameters {
            owner_id: harness.owner_id,
            organization_id: harness.organization_id,
            repository_id,
            directory_version_id: Uuid::new_v4(),
            sha256_hash: sha("9f"),
            relative_path: ".".into(),
            files: files.clone(),
            size: 150,
            directory_version_ids: vec![],
        },
        metadata(),
    )
    .await;
    assert_eq!(wrong_hash.error(), Some(&GraceError::Sha256Mismatch));

    let mismatched = directory_versions::create(
        &harness.ctx,
        directory_versions::CreateDirectoryVersionParameters {
            owner_id: harness.owner_id,
            organization_id: harness.organization_id,
            repository_id,
            directory_version_id: Uuid::new_v4(),
            sha256_hash: hash.clone(),
            relative_path: ".".into(),
            files: files.clone(),
            size: 999,
            directory_version_ids: vec![],
        },
        metadata(),
    )
    .await;
    assert_eq!(mismatched.error(), Some(&GraceError::DeclaredSizeMismatch));

    let outcome = directory_versions::create(
        &harness.ctx,
        directory_versions::CreateDirectoryVersionParameters {
            owner_id: harness.owner_id,
            organization_id: harness.organization_id,
            repository_id,
            directory_version_id: Uuid::new_v4(),
            sha256_hash: hash.clone(),
            relative_path: ".".into(),
            files,
            size: 150,
            directory_version_ids: vec![],
        },
        metadata(),
    )
    .await;
    assert!(outcome.is_ok(), "directory version create failed: {outcome:?}");

    // Content-addressed lookup by (repository, sha256).
    let dto = directory_versions::get_by_sha256(&harness.ctx, repository_id, &hash)
        .await
        .unwrap();
    assert_eq!(dto.size, 150);
    assert_eq!(dto.files.len(), 2);
}

// -- Queries are bounded ------------------------------------------------------

#[tokio::test]
async fn get_references_is_bounded_by_max_count() {
    let harness = setup().await;
    let repository_id = harness.create_repository("busy").await;
    let branch_id = harness.create_branch(repository_id, "main", None).await;

    for hex_pair in ["b1", "b2", "b3", "b4"] {
        let outcome = branches::commit(
            &harness.ctx,
            harness.reference_parameters(repository_id, branch_id, hex_pair, "step"),
            metadata(),
        )
        .await;
        assert!(outcome.is_ok());
    }

    let ctx = &harness.ctx;
    let projected = eventually(StdDuration::from_secs(2), || async move {
        ctx.deps().references.references_for_branch(branch_id).len() == 4
    })
    .await;
    assert!(projected);

    let rows = branches::get_references(&harness.ctx, branch_id, 2)
        .await
        .unwrap();
    assert_eq!(rows.len(), 2);
    // Newest first.
    assert!(rows[0].created_at >= rows[1].created_at);
}
