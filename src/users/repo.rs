use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use time::OffsetDateTime;
use tracing::debug;

use crate::error::{Result, UserError};
use crate::users::repo_types::{NewUser, User, UserPatch, UserStatus};

/// Storage seam for user accounts. Implementations must be safe to share
/// across concurrent requests.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert an active row and return its generated id.
    async fn create(&self, user: NewUser) -> Result<i64>;

    /// Overwrite the fields present in `patch` and stamp `updated_at`.
    /// An empty patch is a no-op; an unknown id matches nothing and succeeds.
    async fn update(&self, id: i64, patch: UserPatch) -> Result<()>;

    /// Flip the row to `Deleted` and stamp `updated_at`. The row is kept.
    /// Unconditional: an unknown id matches nothing and succeeds.
    async fn soft_delete(&self, id: i64) -> Result<()>;

    /// Fetch one row regardless of its status.
    async fn get(&self, id: i64) -> Result<User>;
}

#[derive(Clone)]
pub struct PgUserRepository {
    db: PgPool,
}

impl PgUserRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

pub(crate) fn build_insert(user: &NewUser) -> QueryBuilder<'_, Postgres> {
    let mut qb =
        QueryBuilder::new("INSERT INTO users (name, email, password, role, status) VALUES (");
    let mut values = qb.separated(", ");
    values.push_bind(user.name.as_str());
    values.push_bind(user.email.as_str());
    values.push_bind(user.password.as_str());
    values.push_bind(user.role);
    values.push_bind(UserStatus::Active);
    qb.push(") RETURNING id");
    qb
}

/// Build the UPDATE for the present fields only, or `None` when there is
/// nothing to write.
pub(crate) fn build_update(
    id: i64,
    patch: &UserPatch,
    now: OffsetDateTime,
) -> Option<QueryBuilder<'_, Postgres>> {
    if patch.is_empty() {
        return None;
    }

    let mut qb = QueryBuilder::new("UPDATE users SET ");
    let mut set = qb.separated(", ");
    if let Some(name) = &patch.name {
        set.push("name = ").push_bind_unseparated(name.as_str());
    }
    if let Some(email) = &patch.email {
        set.push("email = ").push_bind_unseparated(email.as_str());
    }
    if let Some(role) = patch.role {
        set.push("role = ").push_bind_unseparated(role);
    }
    set.push("updated_at = ").push_bind_unseparated(now);

    qb.push(" WHERE id = ").push_bind(id);
    Some(qb)
}

pub(crate) fn build_soft_delete(id: i64, now: OffsetDateTime) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new("UPDATE users SET status = ");
    qb.push_bind(UserStatus::Deleted)
        .push(", updated_at = ")
        .push_bind(now)
        .push(" WHERE id = ")
        .push_bind(id);
    qb
}

pub(crate) fn build_get(id: i64) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(
        "SELECT id, name, email, role, status, created_at, updated_at FROM users WHERE id = ",
    );
    qb.push_bind(id).push(" LIMIT 1");
    qb
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(&self, user: NewUser) -> Result<i64> {
        let mut qb = build_insert(&user);
        let id = qb
            .build_query_scalar::<i64>()
            .fetch_one(&self.db)
            .await?;
        Ok(id)
    }

    async fn update(&self, id: i64, patch: UserPatch) -> Result<()> {
        let Some(mut qb) = build_update(id, &patch, OffsetDateTime::now_utc()) else {
            return Ok(());
        };
        let res = qb.build().execute(&self.db).await?;
        debug!(user_id = id, rows = res.rows_affected(), "users updated");
        Ok(())
    }

    async fn soft_delete(&self, id: i64) -> Result<()> {
        let mut qb = build_soft_delete(id, OffsetDateTime::now_utc());
        let res = qb.build().execute(&self.db).await?;
        debug!(user_id = id, rows = res.rows_affected(), "users marked deleted");
        Ok(())
    }

    async fn get(&self, id: i64) -> Result<User> {
        let mut qb = build_get(id);
        qb.build_query_as::<User>()
            .fetch_optional(&self.db)
            .await?
            .ok_or(UserError::NotFound { id })
    }
}
