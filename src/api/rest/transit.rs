use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::Response;
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use serde::Deserialize;
use uuid::Uuid;

use crate::api::rest::auth::require_role;
use crate::api::rest::{confirm_batch, BatchRequest, OptionalJson};
use crate::engine::worklist::HandoffStage;
use crate::engine::{handoff, walker};
use crate::error::AppError;
use crate::models::actor::{Actor, ActorRole};
use crate::models::driver::{CheckIn, CheckInOutcome, RouteView};
use crate::models::order::OrderRecord;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/transit/route", get(route))
        .route("/transit/check-in", post(check_in))
        .route("/transit/check-out", post(check_out))
        .route("/transit/check-ins", get(check_ins))
        .route("/transit/transfers", get(transfers))
        .route("/transit/dropoffs", get(dropoffs).post(drop_off))
        .route("/transit/pickups", post(pick_up))
        .route("/transit/orders/:id", get(order_detail))
}

#[derive(Deserialize)]
pub struct CheckInRequest {
    pub county: String,
}

fn transit_driver(actor: &Actor) -> Result<(), AppError> {
    require_role(actor, ActorRole::TransitDriver)
}

async fn route(
    State(state): State<Arc<AppState>>,
    actor: Actor,
) -> Result<Json<RouteView>, AppError> {
    transit_driver(&actor)?;
    Ok(Json(walker::route_view(&state, &actor)?))
}

async fn check_in(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Json(payload): Json<CheckInRequest>,
) -> Result<Json<CheckInOutcome>, AppError> {
    transit_driver(&actor)?;
    Ok(Json(walker::check_in(&state, &actor, &payload.county)?))
}

async fn check_out(
    State(state): State<Arc<AppState>>,
    actor: Actor,
) -> Result<Json<RouteView>, AppError> {
    transit_driver(&actor)?;
    Ok(Json(walker::check_out(&state, &actor)?))
}

async fn check_ins(
    State(state): State<Arc<AppState>>,
    actor: Actor,
) -> Result<Json<Vec<CheckIn>>, AppError> {
    transit_driver(&actor)?;
    Ok(Json(walker::checkin_history(&state, actor.user_id)))
}

async fn transfers(
    State(state): State<Arc<AppState>>,
    actor: Actor,
) -> Result<Json<Vec<OrderRecord>>, AppError> {
    transit_driver(&actor)?;
    Ok(Json(handoff::available_transfers(&state, &actor)?))
}

async fn dropoffs(
    State(state): State<Arc<AppState>>,
    actor: Actor,
) -> Result<Json<Vec<OrderRecord>>, AppError> {
    transit_driver(&actor)?;
    Ok(Json(handoff::dropoff_candidates(&state, &actor)))
}

async fn order_detail(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(id): Path<Uuid>,
) -> Result<Json<OrderRecord>, AppError> {
    transit_driver(&actor)?;
    Ok(Json(handoff::transit_order_detail(&state, &actor, id)?))
}

async fn pick_up(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    OptionalJson(request): OptionalJson<BatchRequest>,
) -> Result<Response, AppError> {
    transit_driver(&actor)?;
    confirm_batch(&state, &actor, HandoffStage::TransitPickup, request, |ids| {
        handoff::pick_up_for_transit(&state, &actor, ids)
    })
}

async fn drop_off(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    OptionalJson(request): OptionalJson<BatchRequest>,
) -> Result<Response, AppError> {
    transit_driver(&actor)?;
    confirm_batch(&state, &actor, HandoffStage::TransitDropoff, request, |ids| {
        handoff::drop_off_from_transit(&state, &actor, ids)
    })
}
