use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{FromRequest, Request};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum_macros::FromRequestParts;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::error;
use validator::ValidationErrors;

/// Contains diagnostic information about an API failure
#[derive(Serialize, Debug)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct BasicErrorResponse {
    pub error_code: String,
    pub error_description: String,
    pub extra_info: Option<ExtraInfo>,
}

#[derive(Serialize, Debug)]
#[cfg_attr(test, derive(serde::Deserialize))]
#[serde(untagged)]
pub enum ExtraInfo {
    Message(String),
    /// Field-by-field [ValidationErrors]
    ValidationIssues(serde_json::Value),
}

fn error_response(
    status: StatusCode,
    error_code: &str,
    error_description: &str,
    extra_info: Option<ExtraInfo>,
) -> Response {
    (
        status,
        axum::Json(BasicErrorResponse {
            error_code: error_code.into(),
            error_description: error_description.into(),
            extra_info,
        }),
    )
        .into_response()
}

/// Response type that hides any unexpected failure behind a generic 500. The underlying
/// error gets logged but never reaches the caller.
pub struct GenericErrorResponse(pub anyhow::Error);

impl IntoResponse for GenericErrorResponse {
    fn into_response(self) -> Response {
        error!("Internal failure while handling request: {:#}", self.0);

        error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal_error",
            "Could not access data to complete your request",
            None,
        )
    }
}

/// Response type that wraps validation errors and turns them into [BasicErrorResponse]s
pub struct ValidationErrorResponse(ValidationErrors);

impl IntoResponse for ValidationErrorResponse {
    fn into_response(self) -> Response {
        let issues = ExtraInfo::ValidationIssues(
            serde_json::to_value(&self.0).unwrap_or(serde_json::Value::Null),
        );

        error_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            "invalid_input",
            "Submitted data was invalid.",
            Some(issues),
        )
    }
}

impl From<ValidationErrors> for ValidationErrorResponse {
    fn from(value: ValidationErrors) -> Self {
        Self(value)
    }
}

/// Response for requests which need a logged-in user but didn't carry a usable session
pub struct NotLoggedInResponse;

impl IntoResponse for NotLoggedInResponse {
    fn into_response(self) -> Response {
        error_response(
            StatusCode::FORBIDDEN,
            "not_logged_in",
            "You need to be logged in.",
            None,
        )
    }
}

/// Response for a login whose credentials didn't check out
pub struct LoginFailedResponse;

impl IntoResponse for LoginFailedResponse {
    fn into_response(self) -> Response {
        error_response(
            StatusCode::UNAUTHORIZED,
            "login_failed",
            "Could not verify your login!",
            None,
        )
    }
}

/// Wrapper for [axum::Json] which customizes the error response to use our
/// data structure for API errors. Bodies that aren't a non-empty JSON object are
/// rejected as bad requests; objects that don't fit [T] are unprocessable.
pub struct Json<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequest<S> for Json<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = JsonErrorResponse;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let axum::Json(raw_body) = axum::Json::<serde_json::Value>::from_request(req, state)
            .await
            .map_err(JsonErrorResponse::from)?;

        match raw_body {
            serde_json::Value::Object(ref fields) if !fields.is_empty() => {}
            _ => return Err(JsonErrorResponse::NoInput),
        }

        serde_json::from_value(raw_body)
            .map(Json)
            .map_err(|err| JsonErrorResponse::Unprocessable(err.to_string()))
    }
}

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

/// Response type representing unusable JSON request bodies
#[derive(Debug)]
pub enum JsonErrorResponse {
    Malformed(String),
    NoInput,
    Unprocessable(String),
}

impl From<JsonRejection> for JsonErrorResponse {
    fn from(value: JsonRejection) -> Self {
        JsonErrorResponse::Malformed(value.body_text())
    }
}

impl IntoResponse for JsonErrorResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Malformed(parse_problem) => error_response(
                StatusCode::BAD_REQUEST,
                "invalid_json",
                "The passed request body contained malformed or unreadable JSON.",
                Some(ExtraInfo::Message(parse_problem)),
            ),
            Self::NoInput => error_response(
                StatusCode::BAD_REQUEST,
                "no_input",
                "No input data provided",
                None,
            ),
            Self::Unprocessable(schema_problem) => error_response(
                StatusCode::UNPROCESSABLE_ENTITY,
                "invalid_input",
                "Submitted data was invalid.",
                Some(ExtraInfo::Message(schema_problem)),
            ),
        }
    }
}

/// Wrapper for [axum::extract::Path] which reports unparseable path parameters
/// as a missing resource
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(PathErrorResponse))]
pub struct Path<T>(pub T);

/// Response type representing a path which doesn't address anything
pub struct PathErrorResponse;

impl From<PathRejection> for PathErrorResponse {
    fn from(_: PathRejection) -> Self {
        PathErrorResponse
    }
}

impl IntoResponse for PathErrorResponse {
    fn into_response(self) -> Response {
        error_response(
            StatusCode::NOT_FOUND,
            "not_found",
            "The requested entity could not be found.",
            None,
        )
    }
}
