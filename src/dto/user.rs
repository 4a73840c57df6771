use crate::domain;
use derive_more::Display;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// DTO for registering a new user via the API
#[derive(Deserialize, Display, Validate)]
#[display("{username}")]
#[serde(deny_unknown_fields)]
#[cfg_attr(test, derive(Serialize))]
pub struct UserCredentials {
    #[validate(length(min = 1, max = 24), custom = "validate_username")]
    pub username: String,
    #[validate(length(min = 1, max = 128))]
    pub password: String,
}

/// Usernames end up verbatim in the legacy session cookie, so they're limited to
/// characters a cookie value may hold
fn validate_username(username: &str) -> Result<(), ValidationError> {
    let cookie_safe = username
        .chars()
        .all(|c| c.is_ascii_graphic() && !matches!(c, '"' | ',' | ';' | '\\'));
    if !cookie_safe {
        return Err(ValidationError::new("username_charset"));
    }

    Ok(())
}

impl From<UserCredentials> for domain::user::Credentials {
    fn from(value: UserCredentials) -> Self {
        domain::user::Credentials {
            username: value.username,
            password: value.password,
        }
    }
}

/// DTO for logging in. Both fields must be present, but their contents are left to the
/// login check itself.
#[derive(Deserialize, Display)]
#[display("{username}")]
#[serde(deny_unknown_fields)]
pub struct LoginCredentials {
    pub username: String,
    pub password: String,
}

impl From<LoginCredentials> for domain::user::Credentials {
    fn from(value: LoginCredentials) -> Self {
        domain::user::Credentials {
            username: value.username,
            password: value.password,
        }
    }
}

/// DTO for a registered user. Password hashes never leave the service.
#[derive(Serialize)]
#[cfg_attr(test, derive(Deserialize, PartialEq, Eq, Debug))]
pub struct TodoUser {
    pub username: String,
}

impl From<domain::user::TodoUser> for TodoUser {
    fn from(value: domain::user::TodoUser) -> Self {
        TodoUser {
            username: value.username,
        }
    }
}

/// DTO for the list of registered users
#[derive(Serialize)]
#[cfg_attr(test, derive(Deserialize, Debug))]
pub struct UserList {
    pub users: Vec<TodoUser>,
}
