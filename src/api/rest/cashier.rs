use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use crate::api::rest::auth::require_role;
use crate::engine::lifecycle::{self, WalkInDraft};
use crate::engine::pricing;
use crate::error::AppError;
use crate::models::actor::{Actor, ActorRole};
use crate::models::order::OrderRecord;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/cashier/pending", get(pending_orders))
        .route("/cashier/orders/:id/price", post(price_order))
        .route("/cashier/walk-in", post(create_walk_in))
}

#[derive(Deserialize)]
pub struct PriceOrderRequest {
    pub costs: Vec<Option<Decimal>>,
}

async fn pending_orders(
    State(state): State<Arc<AppState>>,
    actor: Actor,
) -> Result<Json<Vec<OrderRecord>>, AppError> {
    require_role(&actor, ActorRole::Cashier)?;
    let county = actor
        .county
        .as_deref()
        .ok_or_else(|| AppError::Forbidden("cashier has no county office".to_string()))?;

    Ok(Json(pricing::pending_pricing(&state, county)))
}

async fn price_order(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(id): Path<Uuid>,
    Json(payload): Json<PriceOrderRequest>,
) -> Result<Json<OrderRecord>, AppError> {
    require_role(&actor, ActorRole::Cashier)?;
    let order = pricing::price_order(&state, id, &payload.costs, Some(actor.user_id))?;
    Ok(Json(order))
}

async fn create_walk_in(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Json(draft): Json<WalkInDraft>,
) -> Result<Json<OrderRecord>, AppError> {
    require_role(&actor, ActorRole::Cashier)?;
    let order = lifecycle::create_walk_in_order(&state, &actor, draft)?;
    Ok(Json(order))
}
