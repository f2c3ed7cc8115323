use std::collections::BTreeMap;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;

use crate::error::{Result, UserError};
use crate::users::repo::UserRepository;
use crate::users::repo_types::{NewUser, User, UserPatch, UserStatus};

/// In-process fake with the same semantics as the SQL store: sequential
/// ids, unique emails, soft delete. Data lives as long as the process.
#[derive(Default)]
pub struct MemoryUserRepository {
    inner: RwLock<Inner>,
}

struct Row {
    user: User,
    password: String,
}

#[derive(Default)]
struct Inner {
    last_id: i64,
    rows: BTreeMap<i64, Row>,
}

impl Inner {
    fn email_taken(&self, email: &str, except: Option<i64>) -> bool {
        self.rows
            .values()
            .any(|r| r.user.email == email && Some(r.user.id) != except)
    }
}

impl MemoryUserRepository {
    /// Stored password hash, for asserting what Create persisted.
    #[cfg(test)]
    pub(crate) async fn stored_password(&self, id: i64) -> Option<String> {
        self.inner
            .read()
            .await
            .rows
            .get(&id)
            .map(|r| r.password.clone())
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn create(&self, user: NewUser) -> Result<i64> {
        let mut inner = self.inner.write().await;
        if inner.email_taken(&user.email, None) {
            return Err(UserError::AlreadyExists("users_email_key".into()));
        }
        inner.last_id += 1;
        let id = inner.last_id;
        inner.rows.insert(
            id,
            Row {
                user: User {
                    id,
                    name: user.name,
                    email: user.email,
                    role: user.role,
                    status: UserStatus::Active,
                    created_at: OffsetDateTime::now_utc(),
                    updated_at: None,
                },
                password: user.password,
            },
        );
        Ok(id)
    }

    async fn update(&self, id: i64, patch: UserPatch) -> Result<()> {
        if patch.is_empty() {
            return Ok(());
        }
        let mut inner = self.inner.write().await;
        // same as an UPDATE matching zero rows
        if !inner.rows.contains_key(&id) {
            return Ok(());
        }
        if let Some(email) = &patch.email {
            if inner.email_taken(email, Some(id)) {
                return Err(UserError::AlreadyExists("users_email_key".into()));
            }
        }
        if let Some(row) = inner.rows.get_mut(&id) {
            let user = &mut row.user;
            if let Some(name) = patch.name {
                user.name = name;
            }
            if let Some(email) = patch.email {
                user.email = email;
            }
            if let Some(role) = patch.role {
                user.role = role;
            }
            user.updated_at = Some(OffsetDateTime::now_utc());
        }
        Ok(())
    }

    async fn soft_delete(&self, id: i64) -> Result<()> {
        let mut inner = self.inner.write().await;
        if let Some(row) = inner.rows.get_mut(&id) {
            row.user.status = UserStatus::Deleted;
            row.user.updated_at = Some(OffsetDateTime::now_utc());
        }
        Ok(())
    }

    async fn get(&self, id: i64) -> Result<User> {
        self.inner
            .read()
            .await
            .rows
            .get(&id)
            .map(|r| r.user.clone())
            .ok_or(UserError::NotFound { id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::repo_types::Role;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            name: "Ann".into(),
            email: email.into(),
            password: "hashed".into(),
            role: Role::User,
        }
    }

    fn email_patch(email: &str) -> UserPatch {
        UserPatch {
            email: Some(email.into()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn ids_are_sequential_and_unique() {
        let repo = MemoryUserRepository::default();
        let a = repo.create(new_user("a@x.com")).await.unwrap();
        let b = repo.create(new_user("b@x.com")).await.unwrap();
        assert_eq!(a, 1);
        assert_eq!(b, 2);
        assert_eq!(repo.stored_password(a).await.as_deref(), Some("hashed"));
    }

    #[tokio::test]
    async fn duplicate_email_is_conflict() {
        let repo = MemoryUserRepository::default();
        repo.create(new_user("a@x.com")).await.unwrap();
        let err = repo.create(new_user("a@x.com")).await.unwrap_err();
        assert!(matches!(err, UserError::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn update_to_taken_email_is_conflict() {
        let repo = MemoryUserRepository::default();
        repo.create(new_user("a@x.com")).await.unwrap();
        let b = repo.create(new_user("b@x.com")).await.unwrap();
        let err = repo.update(b, email_patch("a@x.com")).await.unwrap_err();
        assert!(matches!(err, UserError::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn update_keeps_own_email() {
        let repo = MemoryUserRepository::default();
        let id = repo.create(new_user("a@x.com")).await.unwrap();
        repo.update(id, email_patch("a@x.com")).await.unwrap();
    }

    #[tokio::test]
    async fn empty_update_does_not_stamp() {
        let repo = MemoryUserRepository::default();
        let id = repo.create(new_user("a@x.com")).await.unwrap();
        repo.update(id, UserPatch::default()).await.unwrap();
        assert!(repo.get(id).await.unwrap().updated_at.is_none());
    }

    #[tokio::test]
    async fn soft_delete_keeps_row() {
        let repo = MemoryUserRepository::default();
        let id = repo.create(new_user("a@x.com")).await.unwrap();
        repo.soft_delete(id).await.unwrap();
        let first = repo.get(id).await.unwrap();
        assert_eq!(first.status, UserStatus::Deleted);
        assert!(first.updated_at.is_some());

        // deleting again only re-stamps
        repo.soft_delete(id).await.unwrap();
        let second = repo.get(id).await.unwrap();
        assert_eq!(second.status, UserStatus::Deleted);
        assert!(second.updated_at >= first.updated_at);
    }

    #[tokio::test]
    async fn only_get_reports_missing_rows() {
        let repo = MemoryUserRepository::default();
        assert!(matches!(
            repo.get(9).await.unwrap_err(),
            UserError::NotFound { id: 9 }
        ));

        repo.soft_delete(9).await.expect("delete matches nothing");
        let patch = UserPatch {
            name: Some("x".into()),
            ..Default::default()
        };
        repo.update(9, patch).await.expect("update matches nothing");
        assert!(repo.get(9).await.is_err());
    }

    #[tokio::test]
    async fn missing_row_wins_over_taken_email() {
        let repo = MemoryUserRepository::default();
        repo.create(new_user("a@x.com")).await.unwrap();
        repo.update(77, email_patch("a@x.com"))
            .await
            .expect("no row to conflict with");
    }
}
