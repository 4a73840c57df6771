use super::NewId;
use crate::domain;
use crate::domain::todo::{NewTask, TodoTask, UpdateTask};
use crate::external_connections::{ConnectionHandle, ExternalConnectivity};
use anyhow::Context;
use sqlx::{FromRow, query, query_as};

pub struct DbTaskReader;

#[derive(FromRow)]
struct TodoRow {
    todo_id: i32,
    user_id: i32,
    title: String,
    description: Option<String>,
    done: bool,
}

impl From<TodoRow> for domain::todo::TodoTask {
    fn from(value: TodoRow) -> Self {
        TodoTask {
            id: value.todo_id,
            owner_user_id: value.user_id,
            title: value.title,
            description: value.description,
            done: value.done,
        }
    }
}

impl domain::todo::driven_ports::TaskReader for DbTaskReader {
    async fn tasks_for_user(
        &self,
        user_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<Vec<TodoTask>, anyhow::Error> {
        let mut cxn = ext_cxn.database_cxn().await?;

        let todo_items: Vec<TodoTask> = query_as::<_, TodoRow>(
            "SELECT t.todo_id, t.user_id, t.title, t.description, t.done FROM todo t WHERE t.user_id = $1 ORDER BY t.todo_id",
        )
        .bind(user_id)
        .fetch_all(cxn.borrow_connection())
        .await
        .context("trying to fetch todo items for a user")?
        .into_iter()
        .map(domain::todo::TodoTask::from)
        .collect();

        Ok(todo_items)
    }
}

pub struct DbTaskWriter;

impl domain::todo::driven_ports::TaskWriter for DbTaskWriter {
    async fn create_task_for_user(
        &self,
        user_id: i32,
        new_task: &NewTask,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<i32, anyhow::Error> {
        let mut cxn = ext_cxn.database_cxn().await?;

        let new_id = query_as::<_, NewId>(
            "INSERT INTO todo(user_id, title, description, done) VALUES ($1, $2, $3, $4) RETURNING todo.todo_id AS id",
        )
        .bind(user_id)
        .bind(&new_task.title)
        .bind(&new_task.description)
        .bind(new_task.done)
        .fetch_one(cxn.borrow_connection())
        .await
        .context("trying to insert a new task into the database")?;

        Ok(new_id.id)
    }

    async fn delete_user_task(
        &self,
        user_id: i32,
        task_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<bool, anyhow::Error> {
        let mut cxn = ext_cxn.database_cxn().await?;

        let result = query("DELETE FROM todo WHERE todo_id = $1 AND user_id = $2")
            .bind(task_id)
            .bind(user_id)
            .execute(cxn.borrow_connection())
            .await
            .context("trying to remove a task from the database")?;

        Ok(result.rows_affected() > 0)
    }

    async fn update_user_task(
        &self,
        user_id: i32,
        task_id: i32,
        update: &UpdateTask,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<bool, anyhow::Error> {
        let mut cxn = ext_cxn.database_cxn().await?;

        // NULL parameters keep the column's current value
        let result = query(
            "UPDATE todo SET
                title = COALESCE($3, title),
                description = COALESCE($4, description),
                done = COALESCE($5, done)
             WHERE todo_id = $1 AND user_id = $2",
        )
        .bind(task_id)
        .bind(user_id)
        .bind(&update.title)
        .bind(&update.description)
        .bind(update.done)
        .execute(cxn.borrow_connection())
        .await
        .context("trying to update a task in the database")?;

        Ok(result.rows_affected() > 0)
    }
}
