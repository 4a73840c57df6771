use crate::domain;
use crate::domain::todo::driven_ports::{TaskReader, TaskWriter};
use crate::domain::todo::driving_ports::TaskError;
use crate::external_connections::ExternalConnectivity;
use anyhow::Context;
use tracing::{info, warn};

#[derive(PartialEq, Eq, Debug)]
#[cfg_attr(test, derive(Clone))]
pub struct TodoTask {
    pub id: i32,
    pub owner_user_id: i32,
    pub title: String,
    pub description: Option<String>,
    pub done: bool,
}

#[derive(Debug)]
#[cfg_attr(test, derive(Clone))]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub done: bool,
}

/// A partial update to a task. Only fields which are [Some] get written.
#[derive(Debug, Default)]
#[cfg_attr(test, derive(Clone, PartialEq, Eq))]
pub struct UpdateTask {
    pub title: Option<String>,
    pub description: Option<String>,
    pub done: Option<bool>,
}

impl UpdateTask {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.done.is_none()
    }
}

pub mod driven_ports {
    use super::*;
    use crate::external_connections::ExternalConnectivity;

    pub trait TaskReader {
        async fn tasks_for_user(
            &self,
            user_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Vec<TodoTask>, anyhow::Error>;
    }

    pub trait TaskWriter {
        async fn create_task_for_user(
            &self,
            user_id: i32,
            new_task: &NewTask,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<i32, anyhow::Error>;

        /// Deletes the task if it belongs to the user. Returns whether anything was deleted.
        async fn delete_user_task(
            &self,
            user_id: i32,
            task_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<bool, anyhow::Error>;

        /// Applies the update to the task if it belongs to the user. Returns whether anything was updated.
        async fn update_user_task(
            &self,
            user_id: i32,
            task_id: i32,
            update: &UpdateTask,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<bool, anyhow::Error>;
    }
}

pub mod driving_ports {
    use super::*;
    use crate::domain;
    use crate::external_connections::ExternalConnectivity;
    use thiserror::Error;

    #[derive(Debug, Error)]
    pub enum TaskError {
        #[error("The session does not belong to a registered user.")]
        NotLoggedIn,
        #[error(transparent)]
        PortError(#[from] anyhow::Error),
    }

    impl From<domain::user::UserExistsErr> for TaskError {
        fn from(value: domain::user::UserExistsErr) -> Self {
            match value {
                domain::user::UserExistsErr::UserDoesNotExist(username) => {
                    warn!("Session for unregistered user {username} was rejected.");
                    TaskError::NotLoggedIn
                }
                domain::user::UserExistsErr::PortError(err) => {
                    TaskError::from(err.context("Resolving the session's user"))
                }
            }
        }
    }


    /// Task operations on behalf of the user a session identifies. Every operation only
    /// sees and touches that user's own tasks.
    pub trait TaskPort {
        async fn tasks_for_user(
            &self,
            username: &str,
            ext_cxn: &mut impl ExternalConnectivity,
            u_reader: &impl domain::user::driven_ports::UserReader,
            task_read: &impl driven_ports::TaskReader,
        ) -> Result<Vec<TodoTask>, TaskError>;
        async fn create_task_for_user(
            &self,
            username: &str,
            task: &NewTask,
            ext_cxn: &mut impl ExternalConnectivity,
            u_reader: &impl domain::user::driven_ports::UserReader,
            task_write: &impl driven_ports::TaskWriter,
        ) -> Result<i32, TaskError>;
        async fn delete_task(
            &self,
            username: &str,
            task_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
            u_reader: &impl domain::user::driven_ports::UserReader,
            task_write: &impl driven_ports::TaskWriter,
        ) -> Result<(), TaskError>;
        async fn update_task(
            &self,
            username: &str,
            task_id: i32,
            update: &UpdateTask,
            ext_cxn: &mut impl ExternalConnectivity,
            u_reader: &impl domain::user::driven_ports::UserReader,
            task_write: &impl driven_ports::TaskWriter,
        ) -> Result<(), TaskError>;
    }
}

pub struct TaskService {}

impl driving_ports::TaskPort for TaskService {
    async fn tasks_for_user(
        &self,
        username: &str,
        ext_cxn: &mut impl ExternalConnectivity,
        u_reader: &impl domain::user::driven_ports::UserReader,
        task_read: &impl TaskReader,
    ) -> Result<Vec<TodoTask>, TaskError> {
        let owner = domain::user::resolve_user(username, &mut *ext_cxn, u_reader).await?;
        let tasks = task_read
            .tasks_for_user(owner.id, &mut *ext_cxn)
            .await
            .context("fetching a user's tasks")?;

        Ok(tasks)
    }

    async fn create_task_for_user(
        &self,
        username: &str,
        task: &NewTask,
        ext_cxn: &mut impl ExternalConnectivity,
        u_reader: &impl domain::user::driven_ports::UserReader,
        task_write: &impl TaskWriter,
    ) -> Result<i32, TaskError> {
        let owner = domain::user::resolve_user(username, &mut *ext_cxn, u_reader).await?;
        let created_task_id = task_write
            .create_task_for_user(owner.id, task, &mut *ext_cxn)
            .await
            .context("creating a task")?;

        Ok(created_task_id)
    }

    async fn delete_task(
        &self,
        username: &str,
        task_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
        u_reader: &impl domain::user::driven_ports::UserReader,
        task_write: &impl TaskWriter,
    ) -> Result<(), TaskError> {
        let owner = domain::user::resolve_user(username, &mut *ext_cxn, u_reader).await?;
        let deleted = task_write
            .delete_user_task(owner.id, task_id, &mut *ext_cxn)
            .await
            .context("deleting a task")?;
        if !deleted {
            info!("User {} has no task {task_id} to delete", owner.id);
        }

        Ok(())
    }

    async fn update_task(
        &self,
        username: &str,
        task_id: i32,
        update: &UpdateTask,
        ext_cxn: &mut impl ExternalConnectivity,
        u_reader: &impl domain::user::driven_ports::UserReader,
        task_write: &impl TaskWriter,
    ) -> Result<(), TaskError> {
        let owner = domain::user::resolve_user(username, &mut *ext_cxn, u_reader).await?;
        if update.is_empty() {
            return Ok(());
        }

        let updated = task_write
            .update_user_task(owner.id, task_id, update, &mut *ext_cxn)
            .await
            .context("updating a task")?;
        if !updated {
            info!("User {} has no task {task_id} to update", owner.id);
        }

        Ok(())
    }
}
