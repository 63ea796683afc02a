//! Account management and the credential check.

pub mod password;
mod service;

pub use service::{CreatedUser, NewUserInput, UserPatch, UserService, UserSummary};

use crate::domain::UserId;
use crate::repository::RepositoryError;

#[derive(Debug, thiserror::Error)]
pub enum UserError {
    #[error("username must be between 3 and 50 characters")]
    InvalidUsername,
    #[error("invalid email address: {0}")]
    InvalidEmail(String),
    #[error("password must be at least {min} characters long")]
    WeakPassword { min: usize },
    #[error("username {0} is already taken")]
    UsernameTaken(String),
    #[error("user {0} not found")]
    UserNotFound(UserId),
    #[error("you cannot delete your own account")]
    CannotDeleteSelf,
    #[error("failed to hash password: {0}")]
    Hash(String),
    #[error("failed to access user data: {0}")]
    Repository(#[from] RepositoryError),
}
