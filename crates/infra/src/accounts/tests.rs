use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;

use identity_auth::{MIN_COST, PasswordHasher, TokenCodec};
use identity_core::{
    Actor, IdentityError, Organization, OrganizationId, PageRequest, User, UserId,
};

use super::{AccountService, StoreTimeouts};
use crate::store::{
    InMemoryOrganizationStore, InMemoryUserStore, OrganizationStore, StoreError, UserStore,
};

const SECRET: &[u8] = b"flow-test-secret";

struct Harness {
    service: AccountService,
    users: Arc<InMemoryUserStore>,
    codec: Arc<TokenCodec>,
}

fn harness() -> Harness {
    harness_with(Arc::new(InMemoryOrganizationStore::new()))
}

fn harness_with(organizations: Arc<dyn OrganizationStore>) -> Harness {
    let users = Arc::new(InMemoryUserStore::new());
    let codec = Arc::new(TokenCodec::new(SECRET).unwrap());
    let service = service(
        users.clone(),
        organizations,
        MIN_COST,
        StoreTimeouts::default(),
    );
    Harness {
        service,
        users,
        codec,
    }
}

fn service(
    users: Arc<dyn UserStore>,
    organizations: Arc<dyn OrganizationStore>,
    cost: u32,
    timeouts: StoreTimeouts,
) -> AccountService {
    AccountService::new(
        users,
        organizations,
        PasswordHasher::new(cost).unwrap(),
        Arc::new(TokenCodec::new(SECRET).unwrap()),
        timeouts,
    )
}

impl Harness {
    /// Log in and return the actor the API layer would resolve from the token.
    async fn login_actor(&self, username: &str, password: &str, org: &str) -> Actor {
        let token = self.service.login(username, password, org).await.unwrap();
        let claims = self.codec.verify(&token).unwrap();
        Actor::user(claims.id, claims.organization_id, claims.admin)
    }

    async fn founder(&self, org: &str) -> (User, Actor) {
        let user = self.service.sign_up("root", "hunter2", org).await.unwrap();
        (user, self.login_actor("root", "hunter2", org).await)
    }

    async fn member(&self, admin: &Actor, username: &str, full_access: bool) -> (User, Actor) {
        self.service.add_user(admin, username, full_access).await.unwrap();
        let org: OrganizationId = admin.organization_id().parse().unwrap();
        let user = self
            .users
            .find_user_by_org_and_username(&org, username)
            .await
            .unwrap();
        let actor = Actor::user(user.id.to_string(), org.to_string(), full_access);
        (user, actor)
    }
}

#[tokio::test]
async fn sign_up_creates_full_access_founder_inside_new_organization() {
    let h = harness();
    let (user, actor) = h.founder("acme").await;

    assert!(user.admin);
    assert!(user.organization_id.is_some());
    assert_ne!(user.password_hash, "hunter2");

    let org = h.service.get_organization(&actor).await.unwrap();
    assert_eq!(org.name, "acme");
    assert_eq!(org.creator_id, user.id);
    assert_eq!(Some(org.id), user.organization_id);
}

#[tokio::test]
async fn sign_up_with_taken_organization_name_conflicts() {
    let h = harness();
    h.service.sign_up("root", "hunter2", "acme").await.unwrap();

    let err = h.service.sign_up("other", "pw", "acme").await.unwrap_err();
    assert!(matches!(err, IdentityError::Conflict(msg) if msg.contains("acme")));
}

#[tokio::test]
async fn sign_up_rejects_blank_fields() {
    let h = harness();
    for (u, p, o) in [("", "pw", "acme"), ("root", "", "acme"), ("root", "pw", "  ")] {
        let err = h.service.sign_up(u, p, o).await.unwrap_err();
        assert!(matches!(err, IdentityError::Validation(_)), "{err:?}");
    }
}

#[tokio::test]
async fn login_issues_token_carrying_user_org_and_admin_flag() {
    let h = harness();
    let founder = h.service.sign_up("root", "hunter2", "acme").await.unwrap();

    let token = h.service.login("root", "hunter2", "acme").await.unwrap();
    let claims = h.codec.verify(&token).unwrap();

    assert_eq!(claims.id, founder.id.to_string());
    assert_eq!(claims.organization_id, founder.organization_id.unwrap().to_string());
    assert!(claims.admin);
    assert_eq!(claims.iss, identity_auth::ISSUER);
}

#[tokio::test]
async fn login_failures_are_indistinguishable() {
    let h = harness();
    h.service.sign_up("root", "hunter2", "acme").await.unwrap();

    let unknown_org = h.service.login("root", "hunter2", "nope").await.unwrap_err();
    let unknown_user = h.service.login("ghost", "hunter2", "acme").await.unwrap_err();
    let wrong_password = h.service.login("root", "wrong", "acme").await.unwrap_err();

    assert_eq!(unknown_org, IdentityError::InvalidCredentials);
    assert_eq!(unknown_user, IdentityError::InvalidCredentials);
    assert_eq!(wrong_password, IdentityError::InvalidCredentials);
    assert_eq!(unknown_org.to_string(), wrong_password.to_string());
}

#[tokio::test]
async fn add_user_requires_full_access() {
    let h = harness();
    let (_, admin) = h.founder("acme").await;
    let (_, plain) = h.member(&admin, "bob", false).await;

    let err = h.service.add_user(&plain, "carol", false).await.unwrap_err();
    assert_eq!(err, IdentityError::Forbidden);
}

#[tokio::test]
async fn add_user_returns_one_time_password_and_stores_only_its_hash() {
    let h = harness();
    let (_, admin) = h.founder("acme").await;

    let password = h.service.add_user(&admin, "bob", false).await.unwrap();
    assert_eq!(password.expose().chars().count(), 16);

    let org: OrganizationId = admin.organization_id().parse().unwrap();
    let bob = h.users.find_user_by_org_and_username(&org, "bob").await.unwrap();
    assert_ne!(bob.password_hash, password.expose());
    assert!(PasswordHasher::default().verify(password.expose(), &bob.password_hash));
    assert_eq!(bob.creator_id, admin.actor_id());
    assert!(!bob.admin);

    // The generated password is immediately usable.
    h.service.login("bob", password.expose(), "acme").await.unwrap();
}

#[tokio::test]
async fn add_user_with_taken_username_conflicts() {
    let h = harness();
    let (_, admin) = h.founder("acme").await;

    let err = h.service.add_user(&admin, "root", false).await.unwrap_err();
    assert!(matches!(err, IdentityError::Conflict(msg) if msg.contains("root")));
}

#[tokio::test]
async fn users_of_other_organizations_are_not_found() {
    let h = harness();
    let (_, acme_admin) = h.founder("acme").await;
    let globex_root = h.service.sign_up("root", "hunter2", "globex").await.unwrap();

    let err = h
        .service
        .get_user_in_organization(&acme_admin, &globex_root.id)
        .await
        .unwrap_err();
    assert!(matches!(err, IdentityError::NotFound(_)));

    let err = h.service.delete_user(&acme_admin, &globex_root.id).await.unwrap_err();
    assert!(matches!(err, IdentityError::NotFound(_)));
}

#[tokio::test]
async fn deleting_twice_is_not_found() {
    let h = harness();
    let (_, admin) = h.founder("acme").await;
    let (bob, _) = h.member(&admin, "bob", false).await;

    let deleted = h.service.delete_user(&admin, &bob.id).await.unwrap();
    assert!(deleted.deleted);

    let err = h.service.delete_user(&admin, &bob.id).await.unwrap_err();
    assert!(matches!(err, IdentityError::NotFound(_)));
    assert_eq!(
        h.service.login("bob", "anything", "acme").await.unwrap_err(),
        IdentityError::InvalidCredentials
    );
}

#[tokio::test]
async fn reset_password_invalidates_the_old_one() {
    let h = harness();
    let (_, admin) = h.founder("acme").await;
    let first = h.service.add_user(&admin, "bob", false).await.unwrap();
    let org: OrganizationId = admin.organization_id().parse().unwrap();
    let bob = h.users.find_user_by_org_and_username(&org, "bob").await.unwrap();

    let second = h.service.reset_password(&admin, &bob.id).await.unwrap();
    assert_ne!(first, second);

    assert_eq!(
        h.service.login("bob", first.expose(), "acme").await.unwrap_err(),
        IdentityError::InvalidCredentials
    );
    h.service.login("bob", second.expose(), "acme").await.unwrap();
}

#[tokio::test]
async fn change_admin_takes_effect_on_next_login() {
    let h = harness();
    let (_, admin) = h.founder("acme").await;
    let password = h.service.add_user(&admin, "bob", false).await.unwrap();
    let org: OrganizationId = admin.organization_id().parse().unwrap();
    let bob = h.users.find_user_by_org_and_username(&org, "bob").await.unwrap();

    let promoted = h.service.change_admin(&admin, &bob.id, true).await.unwrap();
    assert!(promoted.admin);

    let token = h.service.login("bob", password.expose(), "acme").await.unwrap();
    assert!(h.codec.verify(&token).unwrap().admin);
}

#[tokio::test]
async fn plain_member_reads_within_organization_but_cannot_administer() {
    let h = harness();
    let (root, admin) = h.founder("acme").await;
    let (bob, bob_actor) = h.member(&admin, "bob", false).await;

    assert_eq!(h.service.get_self(&bob_actor).await.unwrap().id, bob.id);
    h.service.change_own_password(&bob_actor, "new-secret").await.unwrap();
    h.service.login("bob", "new-secret", "acme").await.unwrap();

    assert_eq!(
        h.service.list_users(&bob_actor, PageRequest::default()).await.unwrap().len(),
        2
    );
    assert_eq!(h.service.get_organization(&bob_actor).await.unwrap().name, "acme");
    assert_eq!(
        h.service.get_user_in_organization(&bob_actor, &root.id).await.unwrap().id,
        root.id
    );

    for err in [
        h.service.delete_user(&bob_actor, &root.id).await.unwrap_err(),
        h.service.change_admin(&bob_actor, &bob.id, true).await.unwrap_err(),
    ] {
        assert_eq!(err, IdentityError::Forbidden);
    }
    assert_eq!(
        h.service.reset_password(&bob_actor, &root.id).await.unwrap_err(),
        IdentityError::Forbidden
    );
}

#[tokio::test]
async fn self_operations_require_a_user_actor() {
    let h = harness();
    let (_, admin) = h.founder("acme").await;
    let key = Actor::api_key("key-1", admin.organization_id());

    assert_eq!(h.service.get_self(&key).await.unwrap_err(), IdentityError::Forbidden);
    assert_eq!(
        h.service.change_own_password(&key, "pw").await.unwrap_err(),
        IdentityError::Forbidden
    );
    // Reads scoped to the key's organization are still allowed.
    assert_eq!(h.service.list_users(&key, PageRequest::default()).await.unwrap().len(), 1);
}

#[tokio::test]
async fn list_users_pages_within_the_organization() {
    let h = harness();
    let (_, admin) = h.founder("acme").await;
    for name in ["a", "b", "c"] {
        h.service.add_user(&admin, name, false).await.unwrap();
    }
    h.service.sign_up("root", "hunter2", "globex").await.unwrap();

    let all = h.service.list_users(&admin, PageRequest::new(0, 10)).await.unwrap();
    assert_eq!(all.len(), 4);

    let second = h.service.list_users(&admin, PageRequest::new(1, 3)).await.unwrap();
    assert_eq!(second.len(), 1);
}

#[tokio::test]
async fn actor_without_organization_is_forbidden() {
    let h = harness();
    let stub = Actor::api_key("", "");
    assert_eq!(
        h.service.list_users(&stub, PageRequest::default()).await.unwrap_err(),
        IdentityError::Forbidden
    );

    let orgless_admin = Actor::user(UserId::new().to_string(), "", true);
    assert_eq!(
        h.service.add_user(&orgless_admin, "bob", false).await.unwrap_err(),
        IdentityError::Forbidden
    );
}

/// Organization store whose writes always fail.
struct BrokenOrganizations;

#[async_trait]
impl OrganizationStore for BrokenOrganizations {
    async fn create_organization(&self, _: Organization) -> Result<Organization, StoreError> {
        Err(StoreError::Unavailable("disk full".into()))
    }

    async fn update_organization(&self, _: &Organization) -> Result<Organization, StoreError> {
        Err(StoreError::Unavailable("disk full".into()))
    }

    async fn find_organization_by_name(&self, _: &str) -> Result<Organization, StoreError> {
        Err(StoreError::NotFound("organization"))
    }

    async fn find_organization_by_id(
        &self,
        _: &OrganizationId,
    ) -> Result<Organization, StoreError> {
        Err(StoreError::NotFound("organization"))
    }

    async fn count_organizations_by_name(&self, _: &str) -> Result<u64, StoreError> {
        Ok(0)
    }
}

#[tokio::test]
async fn failed_sign_up_discards_the_orphaned_user() {
    let h = harness_with(Arc::new(BrokenOrganizations));

    let err = h.service.sign_up("root", "hunter2", "acme").await.unwrap_err();
    assert!(matches!(err, IdentityError::Fatal(_)));

    // The founder was written before the organization; it must now be gone.
    let orphans: Vec<User> = h
        .users
        .snapshot()
        .into_iter()
        .filter(|u| u.username == "root")
        .collect();
    assert_eq!(orphans.len(), 1);
    assert!(orphans[0].deleted);
}

/// Organization store that never answers in time.
struct StalledOrganizations;

#[async_trait]
impl OrganizationStore for StalledOrganizations {
    async fn create_organization(&self, o: Organization) -> Result<Organization, StoreError> {
        Ok(o)
    }

    async fn update_organization(&self, o: &Organization) -> Result<Organization, StoreError> {
        Ok(o.clone())
    }

    async fn find_organization_by_name(&self, _: &str) -> Result<Organization, StoreError> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Err(StoreError::NotFound("organization"))
    }

    async fn find_organization_by_id(
        &self,
        _: &OrganizationId,
    ) -> Result<Organization, StoreError> {
        Err(StoreError::NotFound("organization"))
    }

    async fn count_organizations_by_name(&self, _: &str) -> Result<u64, StoreError> {
        Ok(0)
    }
}

#[tokio::test(start_paused = true)]
async fn slow_store_fails_with_timeout() {
    let h = harness_with(Arc::new(StalledOrganizations));

    let err = h.service.login("root", "hunter2", "acme").await.unwrap_err();
    assert_eq!(err, IdentityError::Timeout);
}

#[tokio::test]
async fn sign_up_rejects_passwords_bcrypt_would_truncate() {
    let h = harness();
    let long = "p".repeat(73);

    let err = h.service.sign_up("root", &long, "acme").await.unwrap_err();
    assert!(matches!(err, IdentityError::Validation(_)), "{err:?}");
    assert!(h.users.snapshot().is_empty());

    let (_, actor) = h.founder("acme").await;
    let err = h.service.change_own_password(&actor, &long).await.unwrap_err();
    assert!(matches!(err, IdentityError::Validation(_)), "{err:?}");
}

/// User store whose first update fails; everything else goes to memory.
struct FlakyBackfill {
    inner: InMemoryUserStore,
    failed: AtomicBool,
}

#[async_trait]
impl UserStore for FlakyBackfill {
    async fn create_user(&self, user: User) -> Result<User, StoreError> {
        self.inner.create_user(user).await
    }

    async fn find_user_by_id(
        &self,
        organization_id: &OrganizationId,
        user_id: &UserId,
    ) -> Result<User, StoreError> {
        self.inner.find_user_by_id(organization_id, user_id).await
    }

    async fn find_user_by_org_and_username(
        &self,
        organization_id: &OrganizationId,
        username: &str,
    ) -> Result<User, StoreError> {
        self.inner
            .find_user_by_org_and_username(organization_id, username)
            .await
    }

    async fn update_user(&self, user: &User) -> Result<User, StoreError> {
        if !self.failed.swap(true, Ordering::SeqCst) {
            return Err(StoreError::Unavailable("connection reset".into()));
        }
        self.inner.update_user(user).await
    }

    async fn count_users_by_org_and_username(
        &self,
        organization_id: &OrganizationId,
        username: &str,
    ) -> Result<u64, StoreError> {
        self.inner
            .count_users_by_org_and_username(organization_id, username)
            .await
    }

    async fn list_users_by_org(
        &self,
        organization_id: &OrganizationId,
        skip: u64,
        limit: u64,
    ) -> Result<Vec<User>, StoreError> {
        self.inner.list_users_by_org(organization_id, skip, limit).await
    }
}

#[tokio::test]
async fn failed_backfill_releases_the_organization_name() {
    let users = Arc::new(FlakyBackfill {
        inner: InMemoryUserStore::new(),
        failed: AtomicBool::new(false),
    });
    let organizations = Arc::new(InMemoryOrganizationStore::new());
    let service = service(
        users.clone(),
        organizations.clone(),
        MIN_COST,
        StoreTimeouts::default(),
    );

    let err = service.sign_up("root", "hunter2", "acme").await.unwrap_err();
    assert!(matches!(err, IdentityError::Fatal(_)), "{err:?}");

    assert!(users.inner.snapshot().iter().all(|u| u.deleted));
    assert_eq!(
        organizations.find_organization_by_name("acme").await,
        Err(StoreError::NotFound("organization"))
    );
    assert_eq!(organizations.count_organizations_by_name("acme").await, Ok(0));

    // The name is free again, so a retry goes through.
    let founder = service.sign_up("root", "hunter2", "acme").await.unwrap();
    assert!(!founder.deleted);
    service.login("root", "hunter2", "acme").await.unwrap();
}

/// Organization store that commits the write and then stops answering.
struct CommitThenStall {
    inner: InMemoryOrganizationStore,
}

#[async_trait]
impl OrganizationStore for CommitThenStall {
    async fn create_organization(&self, o: Organization) -> Result<Organization, StoreError> {
        let created = self.inner.create_organization(o).await;
        tokio::time::sleep(Duration::from_secs(10)).await;
        created
    }

    async fn update_organization(&self, o: &Organization) -> Result<Organization, StoreError> {
        self.inner.update_organization(o).await
    }

    async fn find_organization_by_name(&self, name: &str) -> Result<Organization, StoreError> {
        self.inner.find_organization_by_name(name).await
    }

    async fn find_organization_by_id(
        &self,
        organization_id: &OrganizationId,
    ) -> Result<Organization, StoreError> {
        self.inner.find_organization_by_id(organization_id).await
    }

    async fn count_organizations_by_name(&self, name: &str) -> Result<u64, StoreError> {
        self.inner.count_organizations_by_name(name).await
    }
}

#[tokio::test]
async fn sign_up_cut_off_after_organization_write_is_rolled_back() {
    let users = Arc::new(InMemoryUserStore::new());
    let organizations = Arc::new(CommitThenStall {
        inner: InMemoryOrganizationStore::new(),
    });
    let timeouts = StoreTimeouts {
        read: Duration::from_millis(500),
        write: Duration::from_millis(500),
    };
    let service = service(users.clone(), organizations.clone(), MIN_COST, timeouts);

    let err = service.sign_up("root", "hunter2", "acme").await.unwrap_err();
    assert_eq!(err, IdentityError::Timeout);

    assert_eq!(organizations.inner.count_organizations_by_name("acme").await, Ok(0));
    let founders = users.snapshot();
    assert_eq!(founders.len(), 1);
    assert!(founders[0].deleted);
}

async fn timed_failed_login(service: &AccountService, username: &str, org: &str) -> Duration {
    let started = Instant::now();
    let err = service.login(username, "wrong", org).await.unwrap_err();
    assert_eq!(err, IdentityError::InvalidCredentials);
    started.elapsed()
}

#[tokio::test]
async fn login_misses_cost_as_much_as_a_wrong_password() {
    let service = service(
        Arc::new(InMemoryUserStore::new()),
        Arc::new(InMemoryOrganizationStore::new()),
        8,
        StoreTimeouts::default(),
    );
    service.sign_up("root", "hunter2", "acme").await.unwrap();

    let mismatch = timed_failed_login(&service, "root", "acme").await;
    let unknown_user = timed_failed_login(&service, "ghost", "acme").await;
    let unknown_org = timed_failed_login(&service, "root", "nope").await;

    assert!(unknown_user >= mismatch / 4, "{unknown_user:?} vs {mismatch:?}");
    assert!(unknown_org >= mismatch / 4, "{unknown_org:?} vs {mismatch:?}");
}
