use crate::{SharedData, api, logging};
use axum::Router;
use std::sync::Arc;

/// Assembles every route the service exposes, with request tracing attached
pub fn build_router(shared_data: Arc<SharedData>) -> Router {
    let router = Router::new()
        .merge(api::user::user_routes())
        .merge(api::todo::task_routes());

    logging::attach_tracing_http(router).with_state(shared_data)
}
