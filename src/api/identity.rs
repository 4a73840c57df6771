use crate::SharedData;
use crate::domain::session::{self, SESSION_COOKIE, SessionScheme};
use crate::routing_utils::NotLoggedInResponse;
use axum::extract::FromRequestParts;
use axum::http::HeaderMap;
use axum::http::header::COOKIE;
use axum::http::request::Parts;
use cookie::Cookie;
use std::sync::Arc;
use tracing::debug;

/// The username carried by the request's session cookie. Extracting it rejects the request
/// with a 403 when the cookie is missing or the session scheme doesn't accept it.
#[derive(Debug, PartialEq, Eq)]
pub struct Identity(pub String);

impl Identity {
    fn from_headers(headers: &HeaderMap, sessions: &SessionScheme) -> Result<Self, NotLoggedInResponse> {
        let Some(token) = session_token(headers) else {
            debug!("Request carried no session cookie");
            return Err(NotLoggedInResponse);
        };

        match sessions.identify(&token, session::now_ms()) {
            Ok(username) => Ok(Identity(username)),
            Err(session_err) => {
                debug!("Session cookie was rejected: {session_err}");
                Err(NotLoggedInResponse)
            }
        }
    }
}

fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|header| header.to_str().ok())
        .flat_map(|header| Cookie::split_parse(header))
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == SESSION_COOKIE)
        .map(|cookie| cookie.value().to_owned())
}

#[axum::async_trait]
impl FromRequestParts<Arc<SharedData>> for Identity {
    type Rejection = NotLoggedInResponse;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<SharedData>,
    ) -> Result<Self, Self::Rejection> {
        Identity::from_headers(&parts.headers, &state.sessions)
    }
}
