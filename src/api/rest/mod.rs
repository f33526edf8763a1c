pub mod auth;
pub mod cashier;
pub mod county;
pub mod orders;
pub mod transit;
pub mod worklist;
pub mod ws;

use std::sync::Arc;

use axum::async_trait;
use axum::body::Bytes;
use axum::extract::{FromRequest, Request, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Json;
use axum::Router;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::engine::handoff::BatchOutcome;
use crate::engine::worklist::{self as staging, HandoffStage};
use crate::error::AppError;
use crate::models::actor::Actor;
use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(orders::router())
        .merge(cashier::router())
        .merge(county::router())
        .merge(transit::router())
        .merge(worklist::router())
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route("/ws", get(ws::ws_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

#[derive(Debug, Default, Deserialize)]
pub struct BatchRequest {
    #[serde(default)]
    pub order_ids: Option<Vec<Uuid>>,
}

/// JSON body that may be left out. An empty body is `None`; a body that is
/// present but does not parse is a validation error.
pub struct OptionalJson<T>(pub Option<T>);

#[async_trait]
impl<T, S> FromRequest<S> for OptionalJson<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|err| AppError::validation("body", err.body_text()))?;

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self(None));
        }

        serde_json::from_slice(&bytes)
            .map(|body| Self(Some(body)))
            .map_err(|err| AppError::validation("body", err.to_string()))
    }
}

/// Runs a batch hand-off over the explicit `order_ids`, or over the driver's
/// worklist for `stage` when none are given. The worklist is only released
/// after the engine accepts the batch.
pub(crate) fn confirm_batch<F>(
    state: &AppState,
    actor: &Actor,
    stage: HandoffStage,
    request: Option<BatchRequest>,
    confirm: F,
) -> Result<Response, AppError>
where
    F: FnOnce(&[Uuid]) -> Result<BatchOutcome, AppError>,
{
    let explicit = request.and_then(|request| request.order_ids);
    let from_worklist = explicit.is_none();
    let order_ids = explicit.unwrap_or_else(|| staging::staged(state, actor.user_id, stage));

    let outcome = confirm(&order_ids)?;
    if from_worklist {
        staging::release(state, actor.user_id, stage, &order_ids);
    }

    Ok(batch_response(outcome))
}

pub(crate) fn batch_response(outcome: BatchOutcome) -> Response {
    if outcome.updated_count() > 0 {
        return (StatusCode::OK, Json(outcome)).into_response();
    }

    let body = serde_json::json!({
        "error": format!("no matching records updated: {}", outcome.message),
        "kind": "state_conflict",
        "outcome": outcome,
    });
    (StatusCode::CONFLICT, Json(body)).into_response()
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    orders: usize,
    routes: usize,
    drivers: usize,
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        orders: state.orders.len(),
        routes: state.routes.len(),
        drivers: state.drivers.len(),
    })
}

async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(err) => (StatusCode::INTERNAL_SERVER_ERROR, err).into_response(),
    }
}
