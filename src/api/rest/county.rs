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
use crate::engine::handoff;
use crate::engine::worklist::HandoffStage;
use crate::error::AppError;
use crate::models::actor::{Actor, ActorRole};
use crate::models::order::{OrderRecord, PaymentMode};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/county/pickups", get(pickups))
        .route("/county/collected", get(collected))
        .route("/county/deliveries", get(deliveries))
        .route("/county/in-delivery", get(in_delivery))
        .route("/county/orders/:id", get(order_detail))
        .route("/county/orders/:id/collect", post(collect))
        .route("/county/orders/:id/deliver", post(deliver))
        .route("/county/dropoff", post(drop_off))
        .route("/county/dispatch", post(dispatch))
}

#[derive(Debug, Default, Deserialize)]
pub struct PaymentRequest {
    #[serde(default)]
    pub payment_mode: Option<String>,
}

fn county_driver(actor: &Actor) -> Result<(), AppError> {
    require_role(actor, ActorRole::CountyDriver)
}

fn payment_mode(request: Option<PaymentRequest>) -> Result<Option<PaymentMode>, AppError> {
    request
        .and_then(|request| request.payment_mode)
        .map(|raw| raw.parse::<PaymentMode>())
        .transpose()
        .map_err(|message| AppError::validation("payment_mode", message))
}

async fn pickups(
    State(state): State<Arc<AppState>>,
    actor: Actor,
) -> Result<Json<Vec<OrderRecord>>, AppError> {
    county_driver(&actor)?;
    Ok(Json(handoff::pickup_candidates(&state, &actor)?))
}

async fn collected(
    State(state): State<Arc<AppState>>,
    actor: Actor,
) -> Result<Json<Vec<OrderRecord>>, AppError> {
    county_driver(&actor)?;
    Ok(Json(handoff::collected_by(&state, &actor)))
}

async fn deliveries(
    State(state): State<Arc<AppState>>,
    actor: Actor,
) -> Result<Json<Vec<OrderRecord>>, AppError> {
    county_driver(&actor)?;
    Ok(Json(handoff::delivery_candidates(&state, &actor)?))
}

async fn in_delivery(
    State(state): State<Arc<AppState>>,
    actor: Actor,
) -> Result<Json<Vec<OrderRecord>>, AppError> {
    county_driver(&actor)?;
    Ok(Json(handoff::out_for_delivery_by(&state, &actor)))
}

async fn order_detail(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(id): Path<Uuid>,
) -> Result<Json<OrderRecord>, AppError> {
    county_driver(&actor)?;
    Ok(Json(handoff::county_order_detail(&state, &actor, id)?))
}

async fn collect(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(id): Path<Uuid>,
    OptionalJson(request): OptionalJson<PaymentRequest>,
) -> Result<Json<OrderRecord>, AppError> {
    county_driver(&actor)?;
    let order = handoff::collect_order(&state, &actor, id, payment_mode(request)?)?;
    Ok(Json(order))
}

async fn deliver(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(id): Path<Uuid>,
    OptionalJson(request): OptionalJson<PaymentRequest>,
) -> Result<Json<OrderRecord>, AppError> {
    county_driver(&actor)?;
    let order = handoff::deliver_order(&state, &actor, id, payment_mode(request)?)?;
    Ok(Json(order))
}

async fn drop_off(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    OptionalJson(request): OptionalJson<BatchRequest>,
) -> Result<Response, AppError> {
    county_driver(&actor)?;
    confirm_batch(&state, &actor, HandoffStage::OfficeDropoff, request, |ids| {
        handoff::drop_off_at_office(&state, &actor, ids)
    })
}

async fn dispatch(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    OptionalJson(request): OptionalJson<BatchRequest>,
) -> Result<Response, AppError> {
    county_driver(&actor)?;
    confirm_batch(&state, &actor, HandoffStage::DeliveryDispatch, request, |ids| {
        handoff::dispatch_for_delivery(&state, &actor, ids)
    })
}
