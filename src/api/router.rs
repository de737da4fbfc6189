//! HTTP surface: one route, action-dispatched, answering 200 with a
//! structured body for every outcome (the contract the frontends expect).

use std::collections::HashMap;

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use tower_http::trace::TraceLayer;

use crate::api::request::Payload;
use crate::api::response::ApiResponse;
use crate::api::{dispatch_get, dispatch_post, AppState};

pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handle_get).post(handle_post))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn handle_post(State(state): State<AppState>, body: String) -> Json<ApiResponse> {
    if body.trim().is_empty() {
        return Json(ApiResponse::fail("Empty request body"));
    }
    let payload = Payload::parse(&body);
    Json(dispatch_post(&state, &payload).await)
}

async fn handle_get(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<ApiResponse> {
    let params = Payload::from_pairs(params);
    Json(dispatch_get(&state, &params).await)
}
