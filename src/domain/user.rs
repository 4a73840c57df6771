use crate::domain::password;
use crate::domain::session::SessionScheme;
use crate::domain::user::driving_ports::{ListUsersError, LoginError, RegisterError};
use crate::external_connections::ExternalConnectivity;
use anyhow::Context;
use derive_more::Display;
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(PartialEq, Eq, Debug)]
#[cfg_attr(test, derive(Clone))]
pub struct TodoUser {
    pub id: i32,
    pub username: String,
}

/// A user along with the password hash they registered with
#[cfg_attr(test, derive(Clone, Debug))]
pub struct UserCredentials {
    pub user: TodoUser,
    pub password_hash: String,
}

/// A username/password pair submitted for registration or login. Only the username
/// shows up when this is displayed.
#[derive(Display)]
#[display("{username}")]
#[cfg_attr(test, derive(Clone, Debug))]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// A user ready to be written to storage
pub struct CreateUser {
    pub username: String,
    pub password_hash: String,
}

pub mod driven_ports {
    use super::*;
    use crate::external_connections::ExternalConnectivity;

    pub trait UserReader {
        async fn get_all(
            &self,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Vec<TodoUser>, anyhow::Error>;
        async fn get_by_username(
            &self,
            username: &str,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Option<TodoUser>, anyhow::Error>;
        async fn credentials_by_username(
            &self,
            username: &str,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Option<UserCredentials>, anyhow::Error>;
    }

    pub trait UserWriter {
        /// Stores a new user, returning its ID. Returns [None] if the username was
        /// already taken by the time the write happened.
        async fn create_user(
            &self,
            user: &CreateUser,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Option<i32>, anyhow::Error>;
    }

    pub trait DetectUser {
        async fn user_with_name_exists(
            &self,
            username: &str,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<bool, anyhow::Error>;
    }
}

pub mod driving_ports {
    use super::*;
    use crate::external_connections::ExternalConnectivity;

    #[derive(Debug, Error)]
    pub enum RegisterError {
        #[error("The provided user already exists.")]
        UserAlreadyExists,
        #[error(transparent)]
        PortError(#[from] anyhow::Error),
    }

    #[derive(Debug, Error)]
    pub enum LoginError {
        #[error("The username or password did not match a registered user.")]
        InvalidCredentials,
        #[error(transparent)]
        PortError(#[from] anyhow::Error),
    }

    #[derive(Debug, Error)]
    pub enum ListUsersError {
        #[error("The session does not belong to a registered user.")]
        NotLoggedIn,
        #[error(transparent)]
        PortError(#[from] anyhow::Error),
    }

    pub trait UserPort {
        /// Lists every registered user on behalf of [username], who must still exist
        async fn get_users(
            &self,
            username: &str,
            ext_cxn: &mut impl ExternalConnectivity,
            u_reader: &impl driven_ports::UserReader,
        ) -> Result<Vec<TodoUser>, ListUsersError>;
        async fn register(
            &self,
            credentials: &Credentials,
            ext_cxn: &mut impl ExternalConnectivity,
            u_writer: &impl driven_ports::UserWriter,
            u_detect: &impl driven_ports::DetectUser,
        ) -> Result<i32, RegisterError>;
        /// Checks credentials according to [sessions] and issues a session token on success
        async fn log_in(
            &self,
            credentials: &Credentials,
            sessions: &SessionScheme,
            ext_cxn: &mut impl ExternalConnectivity,
            u_reader: &impl driven_ports::UserReader,
        ) -> Result<String, LoginError>;
    }
}

pub struct UserService {}

#[derive(Debug, Error)]
pub(super) enum UserExistsErr {
    #[error("user {0} does not exist")]
    UserDoesNotExist(String),

    #[error(transparent)]
    PortError(#[from] anyhow::Error),
}

/// Looks up the user a session identifies, failing if they're no longer registered
pub(super) async fn resolve_user(
    username: &str,
    ext_cxn: &mut impl ExternalConnectivity,
    u_reader: &impl driven_ports::UserReader,
) -> Result<TodoUser, UserExistsErr> {
    let user = u_reader.get_by_username(username, ext_cxn).await?;

    user.ok_or_else(|| UserExistsErr::UserDoesNotExist(username.to_owned()))
}

impl driving_ports::UserPort for UserService {
    async fn get_users(
        &self,
        username: &str,
        ext_cxn: &mut impl ExternalConnectivity,
        u_reader: &impl driven_ports::UserReader,
    ) -> Result<Vec<TodoUser>, ListUsersError> {
        match resolve_user(username, &mut *ext_cxn, u_reader).await {
            Ok(_) => {}
            Err(UserExistsErr::UserDoesNotExist(username)) => {
                warn!("Session for unregistered user {username} was rejected.");
                return Err(ListUsersError::NotLoggedIn);
            }
            Err(UserExistsErr::PortError(err)) => {
                return Err(err.context("Resolving the session's user").into());
            }
        }

        let all_users_result = u_reader.get_all(ext_cxn).await;
        if let Err(ref port_err) = all_users_result {
            error!("User fetch failure: {port_err}");
        }

        Ok(all_users_result.context("Failed fetching users")?)
    }

    async fn register(
        &self,
        credentials: &Credentials,
        ext_cxn: &mut impl ExternalConnectivity,
        u_writer: &impl driven_ports::UserWriter,
        u_detect: &impl driven_ports::DetectUser,
    ) -> Result<i32, RegisterError> {
        let user_exists = u_detect
            .user_with_name_exists(&credentials.username, &mut *ext_cxn)
            .await
            .context("Looking up user during registration")?;
        if user_exists {
            return Err(RegisterError::UserAlreadyExists);
        }

        let new_user = CreateUser {
            username: credentials.username.clone(),
            password_hash: password::hash_off_thread(credentials.password.clone()).await?,
        };

        let created_id = u_writer
            .create_user(&new_user, &mut *ext_cxn)
            .await
            .context("Trying to create user at service level")?;

        created_id.ok_or(RegisterError::UserAlreadyExists)
    }

    async fn log_in(
        &self,
        credentials: &Credentials,
        sessions: &SessionScheme,
        ext_cxn: &mut impl ExternalConnectivity,
        u_reader: &impl driven_ports::UserReader,
    ) -> Result<String, LoginError> {
        let Some(stored) = u_reader
            .credentials_by_username(&credentials.username, ext_cxn)
            .await
            .context("Looking up user during login")?
        else {
            info!("Login attempt for unknown user {credentials}");
            return Err(LoginError::InvalidCredentials);
        };

        if sessions.verifies_passwords() {
            let matches = password::verify_off_thread(
                credentials.password.clone(),
                stored.password_hash,
            )
            .await?;
            if !matches {
                info!("Wrong password given for user {credentials}");
                return Err(LoginError::InvalidCredentials);
            }
        }

        let token = sessions
            .issue(&stored.user.username, crate::domain::session::now_ms())
            .context("Issuing session token")?;

        Ok(token)
    }
}
