use super::{Count, NewId};
use crate::domain;
use crate::domain::user::{CreateUser, TodoUser, UserCredentials};
use crate::external_connections::{ConnectionHandle, ExternalConnectivity};
use anyhow::Context;
use sqlx::{FromRow, query_as};

pub struct DbDetectUser;

impl domain::user::driven_ports::DetectUser for DbDetectUser {
    async fn user_with_name_exists(
        &self,
        username: &str,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<bool, anyhow::Error> {
        let mut connection = ext_cxn.database_cxn().await?;

        let user_with_name_count = query_as::<_, Count>(
            r#"SELECT count(*) AS count FROM "user" u WHERE u.username = $1"#,
        )
        .bind(username)
        .fetch_one(connection.borrow_connection())
        .await
        .context("Detecting user via username")?;

        Ok(user_with_name_count.count() > 0)
    }
}

pub struct DbReadUsers;

#[derive(FromRow)]
struct TodoUserRow {
    id: i32,
    username: String,
}

impl From<TodoUserRow> for TodoUser {
    fn from(value: TodoUserRow) -> Self {
        TodoUser {
            id: value.id,
            username: value.username,
        }
    }
}

#[derive(FromRow)]
struct UserCredentialsRow {
    id: i32,
    username: String,
    password: String,
}

impl From<UserCredentialsRow> for UserCredentials {
    fn from(value: UserCredentialsRow) -> Self {
        UserCredentials {
            user: TodoUser {
                id: value.id,
                username: value.username,
            },
            password_hash: value.password,
        }
    }
}

impl domain::user::driven_ports::UserReader for DbReadUsers {
    async fn get_all(
        &self,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<Vec<TodoUser>, anyhow::Error> {
        let mut connection = ext_cxn.database_cxn().await?;

        let users: Vec<TodoUser> =
            query_as::<_, TodoUserRow>(r#"SELECT u.id, u.username FROM "user" u ORDER BY u.id"#)
                .fetch_all(connection.borrow_connection())
                .await
                .context("Fetching all users")?
                .into_iter()
                .map(TodoUser::from)
                .collect();

        Ok(users)
    }

    async fn get_by_username(
        &self,
        username: &str,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<Option<TodoUser>, anyhow::Error> {
        let mut cxn_handle = ext_cxn.database_cxn().await?;

        let user = query_as::<_, TodoUserRow>(
            r#"SELECT u.id, u.username FROM "user" u WHERE u.username = $1"#,
        )
        .bind(username)
        .fetch_optional(cxn_handle.borrow_connection())
        .await
        .context("Fetching a user by username")?;

        Ok(user.map(TodoUser::from))
    }

    async fn credentials_by_username(
        &self,
        username: &str,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<Option<UserCredentials>, anyhow::Error> {
        let mut cxn_handle = ext_cxn.database_cxn().await?;

        let credentials = query_as::<_, UserCredentialsRow>(
            r#"SELECT u.id, u.username, u.password FROM "user" u WHERE u.username = $1"#,
        )
        .bind(username)
        .fetch_optional(cxn_handle.borrow_connection())
        .await
        .context("Fetching credentials for a user")?;

        Ok(credentials.map(UserCredentials::from))
    }
}

pub struct DbWriteUsers;

impl domain::user::driven_ports::UserWriter for DbWriteUsers {
    async fn create_user(
        &self,
        user: &CreateUser,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<Option<i32>, anyhow::Error> {
        let mut cxn_handle = ext_cxn.database_cxn().await?;

        let new_id = query_as::<_, NewId>(
            r#"INSERT INTO "user"(username, password) VALUES ($1, $2)
               ON CONFLICT (username) DO NOTHING
               RETURNING "user".id"#,
        )
        .bind(&user.username)
        .bind(&user.password_hash)
        .fetch_optional(cxn_handle.borrow_connection())
        .await
        .context("Inserting new user")?;

        Ok(new_id.map(|row| row.id))
    }
}
