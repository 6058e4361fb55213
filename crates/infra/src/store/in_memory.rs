use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use identity_core::{Entity, Organization, OrganizationId, User, UserId};

use super::r#trait::{OrganizationStore, StoreError, UserStore};

/// Rows keyed by entity id. UUIDv7 keys keep iteration in creation order.
#[derive(Debug)]
struct Table<E: Entity> {
    rows: RwLock<BTreeMap<E::Id, E>>,
}

impl<E: Entity> Default for Table<E> {
    fn default() -> Self {
        Self {
            rows: RwLock::new(BTreeMap::new()),
        }
    }
}

impl<E: Entity + Clone> Table<E> {
    fn read(&self) -> Result<RwLockReadGuard<'_, BTreeMap<E::Id, E>>, StoreError> {
        self.rows
            .read()
            .map_err(|_| StoreError::Unavailable("in-memory store lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, BTreeMap<E::Id, E>>, StoreError> {
        self.rows
            .write()
            .map_err(|_| StoreError::Unavailable("in-memory store lock poisoned".into()))
    }

    fn live(rows: &BTreeMap<E::Id, E>) -> impl Iterator<Item = &E> {
        rows.values().filter(|row| !row.is_deleted())
    }

    fn find_live(&self, what: &'static str, pred: impl Fn(&E) -> bool) -> Result<E, StoreError> {
        let rows = self.read()?;
        Self::live(&rows)
            .find(|row| pred(*row))
            .cloned()
            .ok_or(StoreError::NotFound(what))
    }

    fn count_live(&self, pred: impl Fn(&E) -> bool) -> Result<u64, StoreError> {
        let rows = self.read()?;
        Ok(Self::live(&rows).filter(|row| pred(*row)).count() as u64)
    }

    /// Insert `row` unless a live row clashes with it. Check and insert
    /// happen under one write lock.
    fn insert_unique(
        &self,
        row: E,
        clashes: impl Fn(&E) -> bool,
        conflict: impl FnOnce() -> String,
    ) -> Result<E, StoreError> {
        let mut rows = self.write()?;
        if Self::live(&rows).any(|existing| clashes(existing)) {
            return Err(StoreError::Conflict(conflict()));
        }
        if rows.contains_key(row.id()) {
            return Err(StoreError::Conflict("duplicate id".into()));
        }
        rows.insert(*row.id(), row.clone());
        Ok(row)
    }

    fn replace(&self, what: &'static str, row: &E) -> Result<E, StoreError> {
        let mut rows = self.write()?;
        match rows.get_mut(row.id()) {
            Some(slot) => {
                *slot = row.clone();
                Ok(row.clone())
            }
            None => Err(StoreError::NotFound(what)),
        }
    }
}

/// In-memory user store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    users: Table<User>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw lookup including soft-deleted rows (diagnostics and tests).
    pub fn get_any(&self, user_id: &UserId) -> Option<User> {
        self.users.read().ok()?.get(user_id).cloned()
    }

    /// Every row, soft-deleted ones included.
    pub fn snapshot(&self) -> Vec<User> {
        self.users
            .read()
            .map(|rows| rows.values().cloned().collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn create_user(&self, user: User) -> Result<User, StoreError> {
        let username = user.username.clone();
        let organization_id = user.organization_id;

        self.users.insert_unique(
            user,
            |existing| {
                organization_id.is_some()
                    && existing.organization_id == organization_id
                    && existing.username == username
            },
            || format!("username {username} is already taken"),
        )
    }

    async fn find_user_by_id(
        &self,
        organization_id: &OrganizationId,
        user_id: &UserId,
    ) -> Result<User, StoreError> {
        self.users
            .find_live("user", |u| u.id == *user_id && u.belongs_to(organization_id))
    }

    async fn find_user_by_org_and_username(
        &self,
        organization_id: &OrganizationId,
        username: &str,
    ) -> Result<User, StoreError> {
        self.users
            .find_live("user", |u| u.belongs_to(organization_id) && u.username == username)
    }

    async fn update_user(&self, user: &User) -> Result<User, StoreError> {
        self.users.replace("user", user)
    }

    async fn count_users_by_org_and_username(
        &self,
        organization_id: &OrganizationId,
        username: &str,
    ) -> Result<u64, StoreError> {
        self.users
            .count_live(|u| u.belongs_to(organization_id) && u.username == username)
    }

    async fn list_users_by_org(
        &self,
        organization_id: &OrganizationId,
        skip: u64,
        limit: u64,
    ) -> Result<Vec<User>, StoreError> {
        let rows = self.users.read()?;
        Ok(Table::<User>::live(&rows)
            .filter(|u| u.belongs_to(organization_id))
            .skip(usize::try_from(skip).unwrap_or(usize::MAX))
            .take(usize::try_from(limit).unwrap_or(usize::MAX))
            .cloned()
            .collect())
    }
}

/// In-memory organization store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryOrganizationStore {
    organizations: Table<Organization>,
}

impl InMemoryOrganizationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrganizationStore for InMemoryOrganizationStore {
    async fn create_organization(
        &self,
        organization: Organization,
    ) -> Result<Organization, StoreError> {
        let name = organization.name.clone();
        self.organizations.insert_unique(
            organization,
            |existing| existing.name == name,
            || format!("organization {name} already exists"),
        )
    }

    async fn update_organization(
        &self,
        organization: &Organization,
    ) -> Result<Organization, StoreError> {
        self.organizations.replace("organization", organization)
    }

    async fn find_organization_by_name(&self, name: &str) -> Result<Organization, StoreError> {
        self.organizations.find_live("organization", |o| o.name == name)
    }

    async fn find_organization_by_id(
        &self,
        organization_id: &OrganizationId,
    ) -> Result<Organization, StoreError> {
        self.organizations
            .find_live("organization", |o| o.id == *organization_id)
    }

    async fn count_organizations_by_name(&self, name: &str) -> Result<u64, StoreError> {
        self.organizations.count_live(|o| o.name == name)
    }
}
