use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use serde::Deserialize;
use uuid::Uuid;

use crate::api::rest::auth::OptionalActor;
use crate::engine::lifecycle::{self, OrderDraft};
use crate::engine::routing::RouteAssignment;
use crate::error::AppError;
use crate::models::actor::ActorRole;
use crate::models::order::{OrderRecord, PaymentTime, TrackingView};
use crate::models::route::RouteRecord;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/orders", post(create_order))
        .route("/orders/:id", get(get_order))
        .route("/orders/:id/confirm", post(confirm_order))
        .route("/track/:tracking_number", get(track_order))
        .route("/routes", get(list_routes))
        .route("/routes/resolve", post(resolve_route))
}

#[derive(Deserialize)]
pub struct ConfirmOrderRequest {
    pub payment_time: PaymentTime,
}

#[derive(Deserialize)]
pub struct ResolveRouteRequest {
    pub sender_county: String,
    pub receiver_county: String,
}

async fn create_order(
    State(state): State<Arc<AppState>>,
    Json(draft): Json<OrderDraft>,
) -> Result<Json<OrderRecord>, AppError> {
    let order = lifecycle::create_online_order(&state, draft)?;
    Ok(Json(order))
}

async fn get_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<OrderRecord>, AppError> {
    Ok(Json(lifecycle::get_order(&state, id)?))
}

async fn confirm_order(
    State(state): State<Arc<AppState>>,
    OptionalActor(actor): OptionalActor,
    Path(id): Path<Uuid>,
    Json(payload): Json<ConfirmOrderRequest>,
) -> Result<Json<OrderRecord>, AppError> {
    if let Some(actor) = &actor {
        if !matches!(actor.role, ActorRole::Customer | ActorRole::Cashier) {
            return Err(AppError::Forbidden(format!(
                "{} cannot confirm orders",
                actor.role.as_str()
            )));
        }
    }

    let order = lifecycle::confirm_order(
        &state,
        id,
        payload.payment_time,
        actor.map(|actor| actor.user_id),
    )?;
    Ok(Json(order))
}

async fn track_order(
    State(state): State<Arc<AppState>>,
    Path(tracking_number): Path<String>,
) -> Result<Json<TrackingView>, AppError> {
    Ok(Json(lifecycle::track(&state, &tracking_number)?))
}

async fn list_routes(State(state): State<Arc<AppState>>) -> Json<Vec<RouteRecord>> {
    Json(state.routes.all().to_vec())
}

async fn resolve_route(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ResolveRouteRequest>,
) -> Result<Json<RouteAssignment>, AppError> {
    let assignment = state
        .routes
        .assign(&payload.sender_county, &payload.receiver_county)?;
    Ok(Json(assignment))
}
