use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::Instant;
use tracing::instrument;

use identity_auth::{
    MAX_PASSWORD_BYTES, OneTimePassword, Operation, PasswordHasher, TokenCodec, authorize,
    generate_password, scope_to_organization, self_user_id,
};
use identity_core::{
    Actor, IdentityError, IdentityResult, Organization, OrganizationId, PageRequest, User, UserId,
};

use super::StoreTimeouts;
use crate::store::{OrganizationStore, StoreError, UserStore};

/// Plaintext behind the digest checked when a login lookup misses.
const DECOY_PASSWORD: &str = "decoy-password-never-issued";

/// Authentication flow: every account operation the API exposes.
#[derive(Clone)]
pub struct AccountService {
    users: Arc<dyn UserStore>,
    organizations: Arc<dyn OrganizationStore>,
    hasher: PasswordHasher,
    tokens: Arc<TokenCodec>,
    timeouts: StoreTimeouts,
    /// Same-cost digest verified on login misses so every failure costs one bcrypt check.
    decoy_digest: Arc<str>,
}

impl AccountService {
    pub fn new(
        users: Arc<dyn UserStore>,
        organizations: Arc<dyn OrganizationStore>,
        hasher: PasswordHasher,
        tokens: Arc<TokenCodec>,
        timeouts: StoreTimeouts,
    ) -> Self {
        let decoy_digest = hasher.hash(DECOY_PASSWORD).unwrap_or_else(|e| {
            tracing::error!(error = %e, "failed to prepare decoy digest");
            String::new()
        });

        Self {
            users,
            organizations,
            hasher,
            tokens,
            timeouts,
            decoy_digest: decoy_digest.into(),
        }
    }

    // -------------------------
    // Public (unauthenticated) operations
    // -------------------------

    /// Create an organization together with its first (full-access) user.
    ///
    /// The user is written first without an organization, then the
    /// organization, then the user is back-filled. If a later step fails or
    /// the deadline expires, both records are soft-deleted again so no
    /// half-created account or organization stays visible.
    #[instrument(skip_all, fields(organization = %organization_name))]
    pub async fn sign_up(
        &self,
        username: &str,
        password: &str,
        organization_name: &str,
    ) -> IdentityResult<User> {
        require_field("username", username)?;
        require_password(password)?;
        require_field("organization_name", organization_name)?;

        let deadline = Instant::now() + self.timeouts.write;

        let password_hash = self
            .before(deadline, "sign_up", async {
                let taken = self
                    .organizations
                    .count_organizations_by_name(organization_name)
                    .await?;
                if taken > 0 {
                    return Err(IdentityError::conflict(format!(
                        "organization {organization_name} already exists"
                    )));
                }
                self.hash(password).await
            })
            .await?;

        let founder = User::founder(username, password_hash, Utc::now());
        let user = match self
            .before(deadline, "sign_up", async {
                Ok::<_, IdentityError>(self.users.create_user(founder.clone()).await?)
            })
            .await
        {
            Ok(user) => user,
            // The write may have landed before the deadline cut it off.
            Err(IdentityError::Timeout) => {
                self.roll_back_sign_up(founder, organization_name).await;
                return Err(IdentityError::Timeout);
            }
            Err(e) => return Err(e),
        };

        let organization = Organization::new(organization_name, user.id, Utc::now());
        let created = self
            .before(deadline, "sign_up", async {
                let organization = self.organizations.create_organization(organization).await?;
                let mut member = user.clone();
                member.assign_organization(organization.id, Utc::now());
                let member = self.users.update_user(&member).await?;
                Ok::<_, IdentityError>((member, organization))
            })
            .await;

        match created {
            Ok((member, organization)) => {
                tracing::info!(
                    user_id = %member.id,
                    organization_id = %organization.id,
                    "organization signed up"
                );
                Ok(member)
            }
            Err(e) => {
                self.roll_back_sign_up(user, organization_name).await;
                Err(e)
            }
        }
    }

    /// Exchange username + password + organization name for a bearer token.
    ///
    /// Unknown organization, unknown user and wrong password all fail with
    /// the same `InvalidCredentials` after the same amount of hashing work.
    #[instrument(skip_all, fields(organization = %organization_name))]
    pub async fn login(
        &self,
        username: &str,
        password: &str,
        organization_name: &str,
    ) -> IdentityResult<String> {
        require_field("username", username)?;
        require_field("password", password)?;
        require_field("organization_name", organization_name)?;

        self.within(self.timeouts.read, "login", async {
            let Some(user) = self.find_login_user(organization_name, username).await? else {
                self.verify(password, &self.decoy_digest).await?;
                return Err(IdentityError::InvalidCredentials);
            };

            if !self.verify(password, &user.password_hash).await? {
                tracing::debug!("password mismatch");
                return Err(IdentityError::InvalidCredentials);
            }

            let organization_id = user
                .organization_id
                .map(|id| id.to_string())
                .unwrap_or_default();
            let token = self
                .tokens
                .issue(&user.id.to_string(), &organization_id, user.admin)?;

            tracing::info!(user_id = %user.id, "user authenticated");
            Ok(token)
        })
        .await
    }

    // -------------------------
    // Self operations
    // -------------------------

    #[instrument(skip_all, fields(actor_id = %actor.actor_id()))]
    pub async fn get_self(&self, actor: &Actor) -> IdentityResult<User> {
        authorize(actor, Operation::GetSelf)?;
        let user_id = self_user_id(actor)?;
        let organization_id = scope_to_organization(actor)?;

        self.within(self.timeouts.read, "get_self", async {
            self.find_member(&organization_id, &user_id).await
        })
        .await
    }

    /// Replace the caller's own password. The token already proves identity,
    /// so the old password is not asked for.
    #[instrument(skip_all, fields(actor_id = %actor.actor_id()))]
    pub async fn change_own_password(
        &self,
        actor: &Actor,
        new_password: &str,
    ) -> IdentityResult<User> {
        authorize(actor, Operation::ChangeOwnPassword)?;
        require_password(new_password)?;
        let user_id = self_user_id(actor)?;
        let organization_id = scope_to_organization(actor)?;

        self.within(self.timeouts.write, "change_own_password", async {
            let mut user = self.find_member(&organization_id, &user_id).await?;
            let password_hash = self.hash(new_password).await?;
            user.replace_password_hash(password_hash, Utc::now());
            Ok(self.users.update_user(&user).await?)
        })
        .await
    }

    // -------------------------
    // Organization-scoped operations
    // -------------------------

    #[instrument(skip_all, fields(actor_id = %actor.actor_id()))]
    pub async fn get_organization(&self, actor: &Actor) -> IdentityResult<Organization> {
        authorize(actor, Operation::GetOrganization)?;
        let organization_id = scope_to_organization(actor)?;

        self.within(self.timeouts.read, "get_organization", async {
            Ok(self
                .organizations
                .find_organization_by_id(&organization_id)
                .await?)
        })
        .await
    }

    #[instrument(
        skip_all,
        fields(actor_id = %actor.actor_id(), page = page.page, size = page.size)
    )]
    pub async fn list_users(
        &self,
        actor: &Actor,
        page: PageRequest,
    ) -> IdentityResult<Vec<User>> {
        authorize(actor, Operation::ListUsers)?;
        let organization_id = scope_to_organization(actor)?;

        self.within(self.timeouts.read, "list_users", async {
            Ok(self
                .users
                .list_users_by_org(&organization_id, page.skip(), page.limit())
                .await?)
        })
        .await
    }

    /// Fetch a user of the caller's organization. Users of other
    /// organizations are reported as `NotFound`.
    #[instrument(skip_all, fields(actor_id = %actor.actor_id(), target = %target))]
    pub async fn get_user_in_organization(
        &self,
        actor: &Actor,
        target: &UserId,
    ) -> IdentityResult<User> {
        authorize(actor, Operation::GetUser)?;
        let organization_id = scope_to_organization(actor)?;

        self.within(self.timeouts.read, "get_user", async {
            self.find_member(&organization_id, target).await
        })
        .await
    }

    /// Add a user to the caller's organization with a generated password.
    ///
    /// The plaintext is returned once; only its hash is stored.
    #[instrument(skip_all, fields(actor_id = %actor.actor_id(), admin = admin))]
    pub async fn add_user(
        &self,
        actor: &Actor,
        username: &str,
        admin: bool,
    ) -> IdentityResult<OneTimePassword> {
        authorize(actor, Operation::AddUser)?;
        require_field("username", username)?;
        let organization_id = scope_to_organization(actor)?;

        self.within(self.timeouts.write, "add_user", async {
            if self
                .users
                .count_users_by_org_and_username(&organization_id, username)
                .await?
                > 0
            {
                return Err(IdentityError::conflict(format!(
                    "username {username} is already taken"
                )));
            }

            let password = generate_password();
            let password_hash = self.hash(password.expose()).await?;
            let user = self
                .users
                .create_user(User::added_by(
                    actor,
                    organization_id,
                    username,
                    password_hash,
                    admin,
                    Utc::now(),
                ))
                .await?;

            tracing::info!(user_id = %user.id, organization_id = %organization_id, "user added");
            Ok(password)
        })
        .await
    }

    /// Soft-delete a user of the caller's organization.
    ///
    /// A second delete of the same user fails `NotFound`.
    #[instrument(skip_all, fields(actor_id = %actor.actor_id(), target = %target))]
    pub async fn delete_user(&self, actor: &Actor, target: &UserId) -> IdentityResult<User> {
        authorize(actor, Operation::DeleteUser)?;
        let organization_id = scope_to_organization(actor)?;

        self.within(self.timeouts.write, "delete_user", async {
            let mut user = self.find_member(&organization_id, target).await?;
            user.mark_deleted(Utc::now());
            let user = self.users.update_user(&user).await?;
            tracing::info!(user_id = %user.id, "user deleted");
            Ok(user)
        })
        .await
    }

    #[instrument(skip_all, fields(actor_id = %actor.actor_id(), target = %target))]
    pub async fn reset_password(
        &self,
        actor: &Actor,
        target: &UserId,
    ) -> IdentityResult<OneTimePassword> {
        authorize(actor, Operation::ResetPassword)?;
        let organization_id = scope_to_organization(actor)?;

        self.within(self.timeouts.write, "reset_password", async {
            let mut user = self.find_member(&organization_id, target).await?;
            let password = generate_password();
            let password_hash = self.hash(password.expose()).await?;
            user.replace_password_hash(password_hash, Utc::now());
            self.users.update_user(&user).await?;
            Ok(password)
        })
        .await
    }

    /// Grant or revoke full access. No last-admin guard is applied.
    #[instrument(
        skip_all,
        fields(actor_id = %actor.actor_id(), target = %target, admin = admin)
    )]
    pub async fn change_admin(
        &self,
        actor: &Actor,
        target: &UserId,
        admin: bool,
    ) -> IdentityResult<User> {
        authorize(actor, Operation::ChangeAdmin)?;
        let organization_id = scope_to_organization(actor)?;

        self.within(self.timeouts.write, "change_admin", async {
            let mut user = self.find_member(&organization_id, target).await?;
            user.set_admin(admin, Utc::now());
            Ok(self.users.update_user(&user).await?)
        })
        .await
    }

    // -------------------------
    // Helpers
    // -------------------------

    async fn find_member(
        &self,
        organization_id: &OrganizationId,
        user_id: &UserId,
    ) -> IdentityResult<User> {
        Ok(self.users.find_user_by_id(organization_id, user_id).await?)
    }

    /// `None` when either the organization or the user is unknown.
    async fn find_login_user(
        &self,
        organization_name: &str,
        username: &str,
    ) -> IdentityResult<Option<User>> {
        let found = self.organizations.find_organization_by_name(organization_name).await;
        let Some(organization) = missing_as_none(found)? else {
            return Ok(None);
        };
        let found = self
            .users
            .find_user_by_org_and_username(&organization.id, username)
            .await;
        missing_as_none(found)
    }

    /// Run `fut` under `budget`; an expired deadline abandons the in-flight
    /// store call and fails with `Timeout` (never retried).
    async fn within<T, F>(
        &self,
        budget: Duration,
        operation: &'static str,
        fut: F,
    ) -> IdentityResult<T>
    where
        F: Future<Output = IdentityResult<T>>,
    {
        self.before(Instant::now() + budget, operation, fut).await
    }

    /// Like [`within`](Self::within) but against an absolute deadline shared
    /// by several steps.
    async fn before<T, F>(
        &self,
        deadline: Instant,
        operation: &'static str,
        fut: F,
    ) -> IdentityResult<T>
    where
        F: Future<Output = IdentityResult<T>>,
    {
        match tokio::time::timeout_at(deadline, fut).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(operation, "store deadline exceeded");
                Err(IdentityError::Timeout)
            }
        }
    }

    /// bcrypt is CPU-bound; keep it off the async workers.
    async fn hash(&self, plaintext: &str) -> IdentityResult<String> {
        let hasher = self.hasher;
        let plaintext = plaintext.to_owned();
        tokio::task::spawn_blocking(move || hasher.hash(&plaintext))
            .await
            .map_err(|e| IdentityError::fatal(format!("hashing task failed: {e}")))?
            .map_err(IdentityError::from)
    }

    async fn verify(&self, plaintext: &str, digest: &str) -> IdentityResult<bool> {
        let hasher = self.hasher;
        let plaintext = plaintext.to_owned();
        let digest = digest.to_owned();
        tokio::task::spawn_blocking(move || hasher.verify(&plaintext, &digest))
            .await
            .map_err(|e| IdentityError::fatal(format!("verification task failed: {e}")))
    }

    /// Undo a sign-up that failed after the founder was written.
    ///
    /// Runs on its own task with a fresh write budget, so it completes even
    /// when the caller's deadline has passed or the caller goes away.
    async fn roll_back_sign_up(&self, founder: User, organization_name: &str) {
        let this = self.clone();
        let organization_name = organization_name.to_owned();
        let budget = self.timeouts.write;

        let task = tokio::spawn(async move {
            let outcome = this
                .within(budget, "sign_up_rollback", async {
                    this.discard_founder(founder.clone()).await;
                    this.discard_organization(&organization_name, &founder.id).await;
                    Ok::<_, IdentityError>(())
                })
                .await;
            if outcome.is_err() {
                tracing::error!(user_id = %founder.id, "sign-up rollback did not finish");
            }
        });

        if let Err(e) = task.await {
            tracing::error!(error = %e, "sign-up rollback task failed");
        }
    }

    async fn discard_founder(&self, mut founder: User) {
        founder.mark_deleted(Utc::now());
        match self.users.update_user(&founder).await {
            Ok(_) => tracing::warn!(user_id = %founder.id, "discarded orphaned sign-up user"),
            // Never written: nothing to undo.
            Err(StoreError::NotFound(_)) => {}
            Err(e) => tracing::error!(
                user_id = %founder.id,
                error = %e,
                "failed to discard orphaned sign-up user"
            ),
        }
    }

    /// Soft-delete the organization only if this sign-up created it.
    async fn discard_organization(&self, name: &str, creator_id: &UserId) {
        let mut organization = match self.organizations.find_organization_by_name(name).await {
            Ok(organization) if organization.creator_id == *creator_id => organization,
            Ok(_) | Err(StoreError::NotFound(_)) => return,
            Err(e) => {
                tracing::error!(error = %e, "failed to look up orphaned organization");
                return;
            }
        };

        organization.mark_deleted(Utc::now());
        match self.organizations.update_organization(&organization).await {
            Ok(_) => tracing::warn!(
                organization_id = %organization.id,
                "discarded orphaned sign-up organization"
            ),
            Err(e) => tracing::error!(
                organization_id = %organization.id,
                error = %e,
                "failed to discard orphaned sign-up organization"
            ),
        }
    }
}

fn require_field(name: &str, value: &str) -> IdentityResult<()> {
    if value.trim().is_empty() {
        return Err(IdentityError::validation(format!("{name} is required")));
    }
    Ok(())
}

/// Passwords are hashed whole; bcrypt ignores anything past its input limit.
fn require_password(password: &str) -> IdentityResult<()> {
    require_field("password", password)?;
    if password.len() > MAX_PASSWORD_BYTES {
        return Err(IdentityError::validation(format!(
            "password must not exceed {MAX_PASSWORD_BYTES} bytes"
        )));
    }
    Ok(())
}

/// Login must not reveal which lookup missed.
fn missing_as_none<T>(found: Result<T, StoreError>) -> IdentityResult<Option<T>> {
    match found {
        Ok(row) => Ok(Some(row)),
        Err(StoreError::NotFound(what)) => {
            tracing::debug!(missing = what, "login lookup missed");
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}
