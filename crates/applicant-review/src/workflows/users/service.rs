use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use super::password::{self, MIN_PASSWORD_LENGTH};
use super::UserError;
use crate::config::SeedAdmin;
use crate::domain::{NewUser, Role, User, UserId};
use crate::repository::{AuditAction, AuditEvent, AuditLog, RepositoryError, ReviewRepository};
use crate::workflows::intake::is_valid_email;
use crate::workflows::record_audit;

const USERNAME_LENGTH: std::ops::RangeInclusive<usize> = 3..=50;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewUserInput {
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    /// Generated when absent.
    #[serde(default)]
    pub password: Option<String>,
    pub role: Role,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct UserPatch {
    pub email: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
    pub password: Option<String>,
}

/// A new account; the generated password is only ever returned here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreatedUser {
    pub user: User,
    pub generated_password: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserSummary {
    #[serde(flatten)]
    pub user: User,
    pub review_count: usize,
}

pub struct UserService<R, A> {
    repository: Arc<R>,
    audit: Arc<A>,
}

impl<R, A> UserService<R, A>
where
    R: ReviewRepository + 'static,
    A: AuditLog + 'static,
{
    pub fn new(repository: Arc<R>, audit: Arc<A>) -> Self {
        Self { repository, audit }
    }

    pub fn create(
        &self,
        actor: Option<UserId>,
        input: NewUserInput,
    ) -> Result<CreatedUser, UserError> {
        let username = input.username.trim().to_string();
        if !USERNAME_LENGTH.contains(&username.chars().count()) {
            return Err(UserError::InvalidUsername);
        }
        let email = validated_email(input.email)?;

        let (password, generated_password) = match input.password {
            Some(password) => {
                if !password::meets_minimum(&password) {
                    return Err(UserError::WeakPassword {
                        min: MIN_PASSWORD_LENGTH,
                    });
                }
                (password, None)
            }
            None => {
                let generated = password::generate_password();
                (generated.clone(), Some(generated))
            }
        };

        let user = match self.repository.insert_user(NewUser {
            username: username.clone(),
            email,
            password_hash: hash(&password)?,
            role: input.role,
            is_active: true,
        }) {
            Ok(user) => user,
            Err(RepositoryError::Conflict) => return Err(UserError::UsernameTaken(username)),
            Err(other) => return Err(other.into()),
        };

        record_audit(
            self.audit.as_ref(),
            AuditEvent::new(AuditAction::CreateUser, "user")
                .by(actor)
                .entity(user.id.0)
                .metadata(json!({ "username": user.username, "role": user.role })),
        );
        info!(user_id = %user.id, role = user.role.label(), "created user");

        Ok(CreatedUser {
            user,
            generated_password,
        })
    }

    pub fn update(
        &self,
        actor: Option<UserId>,
        id: UserId,
        patch: UserPatch,
    ) -> Result<User, UserError> {
        let mut user = self.fetch(id)?;

        if let Some(email) = patch.email {
            user.email = validated_email(Some(email))?;
        }
        if let Some(role) = patch.role {
            user.role = role;
        }
        if let Some(is_active) = patch.is_active {
            user.is_active = is_active;
        }
        if let Some(password) = patch.password {
            if !password::meets_minimum(&password) {
                return Err(UserError::WeakPassword {
                    min: MIN_PASSWORD_LENGTH,
                });
            }
            user.password_hash = hash(&password)?;
        }

        self.repository.update_user(user.clone())?;
        record_audit(
            self.audit.as_ref(),
            AuditEvent::new(AuditAction::UpdateUser, "user")
                .by(actor)
                .entity(id.0),
        );
        Ok(user)
    }

    pub fn delete(&self, actor: UserId, id: UserId) -> Result<(), UserError> {
        if actor == id {
            return Err(UserError::CannotDeleteSelf);
        }
        match self.repository.delete_user(id) {
            Ok(()) => {}
            Err(RepositoryError::NotFound) => return Err(UserError::UserNotFound(id)),
            Err(other) => return Err(other.into()),
        }

        record_audit(
            self.audit.as_ref(),
            AuditEvent::new(AuditAction::DeleteUser, "user")
                .by(Some(actor))
                .entity(id.0),
        );
        info!(user_id = %id, "deleted user");
        Ok(())
    }

    /// Replace the password with a generated one and return it.
    pub fn reset_password(&self, actor: Option<UserId>, id: UserId) -> Result<String, UserError> {
        let mut user = self.fetch(id)?;
        let generated = password::generate_password();
        user.password_hash = hash(&generated)?;
        self.repository.update_user(user)?;

        record_audit(
            self.audit.as_ref(),
            AuditEvent::new(AuditAction::ResetPassword, "user")
                .by(actor)
                .entity(id.0),
        );
        Ok(generated)
    }

    pub fn list(&self) -> Result<Vec<UserSummary>, UserError> {
        let mut counts: HashMap<UserId, usize> = HashMap::new();
        for review in self.repository.reviews()? {
            *counts.entry(review.reviewer_id).or_insert(0) += 1;
        }

        Ok(self
            .repository
            .users()?
            .into_iter()
            .map(|user| UserSummary {
                review_count: counts.get(&user.id).copied().unwrap_or(0),
                user,
            })
            .collect())
    }

    pub fn fetch(&self, id: UserId) -> Result<User, UserError> {
        self.repository
            .fetch_user(id)?
            .ok_or(UserError::UserNotFound(id))
    }

    /// `None` for unknown, inactive or mismatched accounts alike.
    pub fn verify_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<User>, UserError> {
        let Some(mut user) = self.repository.find_user_by_username(username.trim())? else {
            return Ok(None);
        };
        if !user.is_active {
            return Ok(None);
        }

        match password::verify_password(password, &user.password_hash) {
            Ok(true) => {}
            Ok(false) => return Ok(None),
            Err(err) => {
                warn!(user_id = %user.id, error = %err, "stored password hash is unreadable");
                return Ok(None);
            }
        }

        user.last_login = Some(Utc::now());
        self.repository.update_user(user.clone())?;
        Ok(Some(user))
    }

    /// Create the configured admin unless the username already exists.
    pub fn ensure_seed_admin(&self, seed: &SeedAdmin) -> Result<User, UserError> {
        if let Some(existing) = self.repository.find_user_by_username(&seed.username)? {
            return Ok(existing);
        }
        let created = self.create(
            None,
            NewUserInput {
                username: seed.username.clone(),
                email: None,
                password: Some(seed.password.clone()),
                role: Role::Admin,
            },
        )?;
        Ok(created.user)
    }
}

fn validated_email(email: Option<String>) -> Result<Option<String>, UserError> {
    match email.map(|value| value.trim().to_string()) {
        None => Ok(None),
        Some(value) if value.is_empty() => Ok(None),
        Some(value) if is_valid_email(&value) => Ok(Some(value)),
        Some(value) => Err(UserError::InvalidEmail(value)),
    }
}

fn hash(password: &str) -> Result<String, UserError> {
    password::hash_password(password).map_err(|err| UserError::Hash(err.to_string()))
}
