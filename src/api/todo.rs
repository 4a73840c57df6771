use crate::api::identity::Identity;
use crate::domain::todo::driving_ports::{TaskError, TaskPort};
use crate::dto::MessageResponse;
use crate::external_connections::ExternalConnectivity;
use crate::routing_utils::{
    GenericErrorResponse, Json, NotLoggedInResponse, Path, ValidationErrorResponse,
};
use crate::{AppState, SharedData, domain, dto, persistence};
use axum::Router;
use axum::extract::State;
use axum::response::{ErrorResponse, IntoResponse};
use axum::routing::{get, put};
use std::sync::Arc;
use tracing::{error, info};
use validator::Validate;

/// Adds routes under "/todo" for managing the logged-in user's tasks
pub fn task_routes() -> Router<Arc<SharedData>> {
    Router::new()
        .route(
            "/todo",
            get(
                |State(app_state): AppState, Identity(username): Identity| async move {
                    let mut ext_cxn = app_state.ext_cxn.clone();
                    let task_service = domain::todo::TaskService {};

                    get_tasks(&username, &mut ext_cxn, &task_service).await
                },
            )
            .post(
                |State(app_state): AppState,
                 Identity(username): Identity,
                 Json(new_task): Json<dto::task::NewTask>| async move {
                    let mut ext_cxn = app_state.ext_cxn.clone();
                    let task_service = domain::todo::TaskService {};

                    create_task(&username, new_task, &mut ext_cxn, &task_service).await
                },
            ),
        )
        .route(
            "/todo/:todo_id",
            put(
                |State(app_state): AppState,
                 Identity(username): Identity,
                 Path(todo_id): Path<i32>,
                 Json(update): Json<dto::task::UpdateTask>| async move {
                    let mut ext_cxn = app_state.ext_cxn.clone();
                    let task_service = domain::todo::TaskService {};

                    update_task(&username, todo_id, update, &mut ext_cxn, &task_service).await
                },
            )
            .delete(
                |State(app_state): AppState,
                 Identity(username): Identity,
                 Path(todo_id): Path<i32>| async move {
                    let mut ext_cxn = app_state.ext_cxn.clone();
                    let task_service = domain::todo::TaskService {};

                    delete_task(&username, todo_id, &mut ext_cxn, &task_service).await
                },
            ),
        )
}

impl IntoResponse for TaskError {
    fn into_response(self) -> axum::response::Response {
        match self {
            TaskError::NotLoggedIn => NotLoggedInResponse.into_response(),
            TaskError::PortError(err) => GenericErrorResponse(err).into_response(),
        }
    }
}

/// Lists the caller's tasks
async fn get_tasks(
    username: &str,
    ext_cxn: &mut impl ExternalConnectivity,
    task_service: &impl TaskPort,
) -> Result<Json<dto::task::TaskList>, ErrorResponse> {
    info!("Get tasks for user {username}");
    let user_reader = persistence::db_user_driven_ports::DbReadUsers;
    let task_reader = persistence::db_todo_driven_ports::DbTaskReader;

    let tasks = task_service
        .tasks_for_user(username, &mut *ext_cxn, &user_reader, &task_reader)
        .await?;

    Ok(Json(dto::task::TaskList {
        todo: tasks.into_iter().map(dto::task::TodoTask::from).collect(),
    }))
}

/// Adds a task owned by the caller
async fn create_task(
    username: &str,
    new_task: dto::task::NewTask,
    ext_cxn: &mut impl ExternalConnectivity,
    task_service: &impl TaskPort,
) -> Result<Json<MessageResponse>, ErrorResponse> {
    info!("Adding task for user {username}");
    new_task.validate().map_err(ValidationErrorResponse::from)?;

    let domain_task = domain::todo::NewTask::from(new_task);
    let user_reader = persistence::db_user_driven_ports::DbReadUsers;
    let task_writer = persistence::db_todo_driven_ports::DbTaskWriter;

    let create_result = task_service
        .create_task_for_user(username, &domain_task, &mut *ext_cxn, &user_reader, &task_writer)
        .await;
    match create_result {
        Ok(task_id) => {
            info!("Created task {task_id} for user {username}");
            Ok(Json(MessageResponse::new("TODO ADDED")))
        }
        Err(task_err) => {
            if let TaskError::PortError(ref err) = task_err {
                error!("Failed to add task for user {username}: {err}");
            }
            Err(task_err.into())
        }
    }
}

/// Removes one of the caller's tasks. Ids the caller doesn't own are quietly ignored.
async fn delete_task(
    username: &str,
    task_id: i32,
    ext_cxn: &mut impl ExternalConnectivity,
    task_service: &impl TaskPort,
) -> Result<Json<MessageResponse>, ErrorResponse> {
    info!("Deleting task {task_id} for user {username}");
    let user_reader = persistence::db_user_driven_ports::DbReadUsers;
    let task_writer = persistence::db_todo_driven_ports::DbTaskWriter;

    task_service
        .delete_task(username, task_id, &mut *ext_cxn, &user_reader, &task_writer)
        .await?;

    Ok(Json(MessageResponse::new("TODO DELETED")))
}

/// Applies the fields present in [task_data] to one of the caller's tasks
async fn update_task(
    username: &str,
    task_id: i32,
    task_data: dto::task::UpdateTask,
    ext_cxn: &mut impl ExternalConnectivity,
    task_service: &impl TaskPort,
) -> Result<Json<MessageResponse>, ErrorResponse> {
    info!("Updating task {task_id} for user {username}");
    task_data.validate().map_err(ValidationErrorResponse::from)?;

    let domain_update = domain::todo::UpdateTask::from(task_data);
    let user_reader = persistence::db_user_driven_ports::DbReadUsers;
    let task_writer = persistence::db_todo_driven_ports::DbTaskWriter;

    task_service
        .update_task(
            username,
            task_id,
            &domain_update,
            &mut *ext_cxn,
            &user_reader,
            &task_writer,
        )
        .await?;

    Ok(Json(MessageResponse::new("TODO UPDATED")))
}
