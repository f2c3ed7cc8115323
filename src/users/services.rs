use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

use crate::error::{Result, UserError};
use crate::users::dto::{CreateRequest, UpdateRequest};
use crate::users::password::hash_password;
use crate::users::repo::UserRepository;
use crate::users::repo_types::{NewUser, User, UserPatch};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn normalize_email(raw: &str) -> Result<String> {
    let email = raw.trim().to_lowercase();
    if !is_valid_email(&email) {
        return Err(UserError::invalid(format!("invalid email: {email}")));
    }
    Ok(email)
}

fn normalize_name(raw: &str) -> Result<String> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(UserError::invalid("name must not be empty"));
    }
    Ok(name.to_string())
}

fn check_id(id: i64) -> Result<()> {
    if id <= 0 {
        return Err(UserError::invalid(format!("id must be positive, got {id}")));
    }
    Ok(())
}

pub async fn create_user(repo: &dyn UserRepository, req: CreateRequest) -> Result<i64> {
    let name = normalize_name(&req.name)?;
    let email = normalize_email(&req.email)?;
    if req.password.is_empty() {
        return Err(UserError::invalid("password must not be empty"));
    }

    // argon2 is CPU bound; keep it off the async workers
    let plain = req.password;
    let password = tokio::task::spawn_blocking(move || hash_password(&plain))
        .await
        .map_err(|e| UserError::Internal(e.to_string()))??;

    repo.create(NewUser {
        name,
        email,
        password,
        role: req.role,
    })
    .await
}

pub async fn update_user(repo: &dyn UserRepository, req: UpdateRequest) -> Result<()> {
    check_id(req.id)?;
    let patch = UserPatch {
        name: req.name.as_deref().map(normalize_name).transpose()?,
        email: req.email.as_deref().map(normalize_email).transpose()?,
        role: req.role,
    };
    if patch.is_empty() {
        debug!(user_id = req.id, "update without fields, nothing to write");
        return Ok(());
    }
    repo.update(req.id, patch).await
}

pub async fn delete_user(repo: &dyn UserRepository, id: i64) -> Result<()> {
    check_id(id)?;
    repo.soft_delete(id).await
}

pub async fn get_user(repo: &dyn UserRepository, id: i64) -> Result<User> {
    check_id(id)?;
    repo.get(id).await
}
