use crate::api::identity::Identity;
use crate::domain::session::{LOGGED_OUT_SENTINEL, SESSION_COOKIE, SessionScheme};
use crate::domain::user::driving_ports::{ListUsersError, LoginError, RegisterError, UserPort};
use crate::dto::MessageResponse;
use crate::external_connections::{
    ExternalConnectivity, Transactable, TransactableExternalConnectivity, TransactionHandle,
};
use crate::routing_utils::{
    GenericErrorResponse, Json, LoginFailedResponse, NotLoggedInResponse, ValidationErrorResponse,
};
use crate::{AppState, SharedData, domain, dto, persistence};
use axum::Router;
use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::response::{ErrorResponse, IntoResponse, Response};
use axum::routing::{get, post};
use cookie::{Cookie, SameSite};
use std::sync::Arc;
use tracing::{error, info};
use validator::Validate;

/// Builds a router for registration, login/logout, and the user listing
pub fn user_routes() -> Router<Arc<SharedData>> {
    Router::new()
        .route(
            "/register",
            post(
                |State(app_state): AppState,
                 Json(new_user): Json<dto::user::UserCredentials>| async move {
                    let user_service = domain::user::UserService {};

                    register(new_user, &app_state.ext_cxn, &user_service).await
                },
            ),
        )
        .route(
            "/login",
            post(
                |State(app_state): AppState,
                 Json(login): Json<dto::user::LoginCredentials>| async move {
                    let mut ext_cxn = app_state.ext_cxn.clone();
                    let user_service = domain::user::UserService {};

                    log_in(login, &app_state.sessions, &mut ext_cxn, &user_service).await
                },
            ),
        )
        .route("/logout", get(log_out))
        .route(
            "/users",
            get(
                |State(app_state): AppState, Identity(username): Identity| async move {
                    info!("User {username} requested the user list");
                    let mut ext_cxn = app_state.ext_cxn.clone();
                    let user_service = domain::user::UserService {};

                    get_users(&username, &mut ext_cxn, &user_service).await
                },
            ),
        )
}

/// Registers a new user, reporting (not failing) when the username is taken
async fn register(
    new_user: dto::user::UserCredentials,
    ext_cxn: &impl TransactableExternalConnectivity,
    user_service: &impl UserPort,
) -> Result<Json<MessageResponse>, ErrorResponse> {
    info!("Attempt to register user: {new_user}");
    new_user.validate().map_err(ValidationErrorResponse::from)?;

    let credentials = domain::user::Credentials::from(new_user);
    let user_writer = persistence::db_user_driven_ports::DbWriteUsers;
    let user_detect = persistence::db_user_driven_ports::DbDetectUser;

    let mut txn = ext_cxn
        .start_transaction()
        .await
        .map_err(GenericErrorResponse)?;
    let register_result = user_service
        .register(&credentials, &mut txn, &user_writer, &user_detect)
        .await;

    match register_result {
        Ok(new_id) => {
            txn.commit().await.map_err(GenericErrorResponse)?;
            info!("Registered user {credentials} with ID {new_id}");

            Ok(Json(MessageResponse::new("USER ADDED")))
        }
        Err(RegisterError::UserAlreadyExists) => {
            info!("User {credentials} is already registered");

            Ok(Json(MessageResponse::new("USER ALREADY EXISTS")))
        }
        Err(RegisterError::PortError(err)) => {
            error!("User registration failure: {err}");

            Err(GenericErrorResponse(err).into())
        }
    }
}

/// Checks a user's credentials and hands back a session cookie for them. Login applies no
/// length rules, so anything registration accepted (and legacy accounts) can still log in.
async fn log_in(
    login: dto::user::LoginCredentials,
    sessions: &SessionScheme,
    ext_cxn: &mut impl ExternalConnectivity,
    user_service: &impl UserPort,
) -> Result<Response, ErrorResponse> {
    info!("Login attempt for user: {login}");

    let credentials = domain::user::Credentials::from(login);
    let user_reader = persistence::db_user_driven_ports::DbReadUsers;

    let token = match user_service
        .log_in(&credentials, sessions, &mut *ext_cxn, &user_reader)
        .await
    {
        Ok(token) => token,
        Err(LoginError::InvalidCredentials) => return Err(LoginFailedResponse.into()),
        Err(LoginError::PortError(err)) => {
            error!("Login failure: {err}");
            return Err(GenericErrorResponse(err).into());
        }
    };

    let session_cookie = Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build();

    Ok((
        [(SET_COOKIE, session_cookie.to_string())],
        Json(MessageResponse::new(format!(
            "You are LOGGED IN as {}",
            credentials.username
        ))),
    )
        .into_response())
}

/// Clears the session cookie. Nothing is tracked server-side, so this always succeeds.
async fn log_out() -> Response {
    let cleared_cookie = Cookie::build((SESSION_COOKIE, LOGGED_OUT_SENTINEL))
        .path("/")
        .max_age(cookie::time::Duration::ZERO)
        .build();

    (
        [(SET_COOKIE, cleared_cookie.to_string())],
        Json(MessageResponse::new("logout")),
    )
        .into_response()
}

impl IntoResponse for ListUsersError {
    fn into_response(self) -> Response {
        match self {
            ListUsersError::NotLoggedIn => NotLoggedInResponse.into_response(),
            ListUsersError::PortError(err) => GenericErrorResponse(err).into_response(),
        }
    }
}

/// Retrieves the usernames of everyone registered on behalf of [username]
async fn get_users(
    username: &str,
    ext_cxn: &mut impl ExternalConnectivity,
    user_service: &impl UserPort,
) -> Result<Json<dto::user::UserList>, ErrorResponse> {
    let user_reader = persistence::db_user_driven_ports::DbReadUsers;

    let users = user_service
        .get_users(username, &mut *ext_cxn, &user_reader)
        .await?;

    Ok(Json(dto::user::UserList {
        users: users.into_iter().map(dto::user::TodoUser::from).collect(),
    }))
}
