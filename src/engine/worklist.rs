use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::actor::{ActorRole, UserId};
use crate::state::AppState;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum HandoffStage {
    OfficeDropoff,
    TransitPickup,
    TransitDropoff,
    DeliveryDispatch,
}

impl HandoffStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            HandoffStage::OfficeDropoff => "office_dropoff",
            HandoffStage::TransitPickup => "transit_pickup",
            HandoffStage::TransitDropoff => "transit_dropoff",
            HandoffStage::DeliveryDispatch => "delivery_dispatch",
        }
    }

    pub fn role(&self) -> ActorRole {
        match self {
            HandoffStage::OfficeDropoff | HandoffStage::DeliveryDispatch => ActorRole::CountyDriver,
            HandoffStage::TransitPickup | HandoffStage::TransitDropoff => ActorRole::TransitDriver,
        }
    }
}

impl std::str::FromStr for HandoffStage {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "office_dropoff" => Ok(HandoffStage::OfficeDropoff),
            "transit_pickup" => Ok(HandoffStage::TransitPickup),
            "transit_dropoff" => Ok(HandoffStage::TransitDropoff),
            "delivery_dispatch" => Ok(HandoffStage::DeliveryDispatch),
            other => Err(AppError::validation(
                "stage",
                format!(
                    "unknown stage: {other}, expected office_dropoff/transit_pickup/transit_dropoff/delivery_dispatch"
                ),
            )),
        }
    }
}

pub type WorklistKey = (UserId, HandoffStage);

pub fn select(
    state: &AppState,
    driver_id: UserId,
    stage: HandoffStage,
    order_id: Uuid,
) -> Result<Vec<Uuid>, AppError> {
    if !state.orders.contains_key(&order_id) {
        return Err(AppError::NotFound(format!("order {order_id} not found")));
    }

    let mut staged = state.worklists.entry((driver_id, stage)).or_default();
    if !staged.contains(&order_id) {
        staged.push(order_id);
    }
    Ok(staged.clone())
}

pub fn deselect(state: &AppState, driver_id: UserId, stage: HandoffStage, order_id: Uuid) -> Vec<Uuid> {
    match state.worklists.get_mut(&(driver_id, stage)) {
        Some(mut staged) => {
            staged.retain(|id| *id != order_id);
            staged.clone()
        }
        None => Vec::new(),
    }
}

pub fn staged(state: &AppState, driver_id: UserId, stage: HandoffStage) -> Vec<Uuid> {
    state
        .worklists
        .get(&(driver_id, stage))
        .map(|entry| entry.value().clone())
        .unwrap_or_default()
}

/// Drops `order_ids` from the worklist once their batch has been confirmed.
/// Orders staged in the meantime stay.
pub fn release(state: &AppState, driver_id: UserId, stage: HandoffStage, order_ids: &[Uuid]) {
    let key = (driver_id, stage);
    if let Some(mut staged) = state.worklists.get_mut(&key) {
        staged.retain(|id| !order_ids.contains(id));
    }
    state.worklists.remove_if(&key, |_, staged| staged.is_empty());
}
