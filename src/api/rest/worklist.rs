use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, put};
use axum::Json;
use axum::Router;
use serde::Serialize;
use uuid::Uuid;

use crate::api::rest::auth::require_role;
use crate::engine::worklist::{self, HandoffStage};
use crate::error::AppError;
use crate::models::actor::Actor;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/worklists/:stage", get(staged))
        .route("/worklists/:stage/:order_id", put(select).delete(deselect))
}

#[derive(Serialize)]
pub struct WorklistResponse {
    pub stage: HandoffStage,
    pub order_ids: Vec<Uuid>,
}

fn stage_for(actor: &Actor, raw: &str) -> Result<HandoffStage, AppError> {
    let stage: HandoffStage = raw.parse()?;
    require_role(actor, stage.role())?;
    Ok(stage)
}

async fn staged(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(stage): Path<String>,
) -> Result<Json<WorklistResponse>, AppError> {
    let stage = stage_for(&actor, &stage)?;
    Ok(Json(WorklistResponse {
        stage,
        order_ids: worklist::staged(&state, actor.user_id, stage),
    }))
}

async fn select(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path((stage, order_id)): Path<(String, Uuid)>,
) -> Result<Json<WorklistResponse>, AppError> {
    let stage = stage_for(&actor, &stage)?;
    let order_ids = worklist::select(&state, actor.user_id, stage, order_id)?;
    Ok(Json(WorklistResponse { stage, order_ids }))
}

async fn deselect(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path((stage, order_id)): Path<(String, Uuid)>,
) -> Result<Json<WorklistResponse>, AppError> {
    let stage = stage_for(&actor, &stage)?;
    let order_ids = worklist::deselect(&state, actor.user_id, stage, order_id);
    Ok(Json(WorklistResponse { stage, order_ids }))
}
