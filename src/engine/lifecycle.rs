use chrono::Utc;
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::engine::validation::{
    into_parcels, positive_cost, validate_parcels, validate_party, ParcelInput,
};
use crate::error::AppError;
use crate::models::actor::{Actor, UserId};
use crate::models::event::OrderEvent;
use crate::models::order::{
    CustomerType, OrderRecord, OrderStatus, Party, PaymentTime, TrackingView,
};
use crate::notify::{self, Notification};
use crate::state::AppState;

#[derive(Debug, Clone, Deserialize)]
pub struct OrderDraft {
    pub sender: Party,
    pub receiver: Party,
    pub parcels: Vec<ParcelInput>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WalkInSender {
    pub name: String,
    pub email: String,
    pub phone: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WalkInDraft {
    pub sender: WalkInSender,
    pub receiver: Party,
    pub parcels: Vec<ParcelInput>,
}

pub fn can_transition(from: OrderStatus, to: OrderStatus) -> bool {
    use OrderStatus::*;

    matches!(
        (from, to),
        (PendingCostCalculation, AwaitingConfirmation)
            | (AwaitingConfirmation, ToBeCollected)
            | (ToBeCollected, Collected)
            | (Collected, WaitingTransit)
            | (WaitingTransit, InTransit)
            | (InTransit, ToBeDelivered)
            | (ToBeDelivered, InDelivery)
            | (ToBeDelivered, Delivered)
            | (InDelivery, Delivered)
    )
}

/// Moves one order from one of `from` to `to`.
///
/// `update` runs against a copy of the locked record; if it fails nothing is
/// written. Scope checks inside `update` should fail with `StateConflict` so
/// out-of-scope orders behave like rows the guarded update did not match.
pub fn apply_transition<F>(
    state: &AppState,
    order_id: Uuid,
    from: &[OrderStatus],
    to: OrderStatus,
    actor_id: Option<UserId>,
    update: F,
) -> Result<OrderRecord, AppError>
where
    F: FnOnce(&mut OrderRecord) -> Result<(), AppError>,
{
    if let Some(illegal) = from.iter().find(|status| !can_transition(**status, to)) {
        return Err(AppError::Internal(format!(
            "illegal transition {illegal} -> {to}"
        )));
    }

    let (previous, updated) = {
        let mut entry = state
            .orders
            .get_mut(&order_id)
            .ok_or_else(|| AppError::NotFound(format!("order {order_id} not found")))?;

        let previous = entry.status;
        if !from.contains(&previous) {
            state.metrics.record_transition(to.as_str(), "conflict");
            warn!(
                order_id = %order_id,
                current = %previous,
                target = %to,
                "guarded transition matched no record"
            );
            return Err(AppError::StateConflict(format!(
                "order {order_id} is {previous}, expected {}",
                describe(from)
            )));
        }

        let mut draft = entry.clone();
        if let Err(err) = update(&mut draft) {
            state.metrics.record_transition(to.as_str(), err.kind());
            return Err(err);
        }
        draft.status = to;
        *entry = draft.clone();

        (previous, draft)
    };

    state.metrics.record_transition(to.as_str(), "success");
    publish(state, order_id, Some(previous), to, actor_id);

    info!(
        order_id = %order_id,
        from = %previous,
        to = %to,
        actor_id = ?actor_id,
        "order transitioned"
    );

    Ok(updated)
}

pub fn create_online_order(state: &AppState, draft: OrderDraft) -> Result<OrderRecord, AppError> {
    validate_party("sender", &draft.sender, false)?;
    validate_party("receiver", &draft.receiver, true)?;
    validate_parcels(&draft.parcels)?;

    let order = new_order(
        state,
        draft.sender,
        draft.receiver,
        into_parcels(draft.parcels, false),
        CustomerType::Online,
        None,
        OrderStatus::PendingCostCalculation,
    )?;

    state.metrics.orders_created_total.with_label_values(&["online"]).inc();
    Ok(order)
}

pub fn create_walk_in_order(
    state: &AppState,
    cashier: &Actor,
    draft: WalkInDraft,
) -> Result<OrderRecord, AppError> {
    let county = cashier
        .county
        .as_deref()
        .map(str::trim)
        .filter(|county| !county.is_empty())
        .ok_or_else(|| AppError::Forbidden("cashier has no county office".to_string()))?
        .to_string();

    let sender = Party {
        name: draft.sender.name,
        email: draft.sender.email,
        phone: draft.sender.phone,
        building: format!("{county} office"),
        county,
        street: None,
        landmark: None,
    };

    validate_party("sender", &sender, false)?;
    validate_party("receiver", &draft.receiver, true)?;
    validate_parcels(&draft.parcels)?;
    for (index, parcel) in draft.parcels.iter().enumerate() {
        positive_cost(format!("parcels[{index}].cost"), parcel.cost)?;
    }

    let served_by = cashier
        .email
        .clone()
        .unwrap_or_else(|| cashier.user_id.to_string());

    let order = new_order(
        state,
        sender,
        draft.receiver,
        into_parcels(draft.parcels, true),
        CustomerType::WalkIn,
        Some(served_by),
        OrderStatus::AwaitingConfirmation,
    )?;

    state.metrics.orders_created_total.with_label_values(&["walk_in"]).inc();
    Ok(order)
}

fn new_order(
    state: &AppState,
    sender: Party,
    receiver: Party,
    parcels: Vec<crate::models::order::Parcel>,
    customer_type: CustomerType,
    served_by: Option<String>,
    status: OrderStatus,
) -> Result<OrderRecord, AppError> {
    let assignment = state.routes.assign(&sender.county, &receiver.county)?;

    let mut order = OrderRecord {
        order_id: Uuid::new_v4(),
        tracking_number: None,
        customer_type,
        served_by,
        current_county_office: sender.county.trim().to_string(),
        sender,
        receiver,
        parcels,
        total_cost: None,
        route_id: assignment.route_id,
        direction: assignment.direction,
        status,
        payment_time: None,
        payment_mode: None,
        paid_at: None,
        assigned_county_driver_id: None,
        assigned_transit_driver_id: None,
        transfers: Vec::new(),
        created_at: Utc::now(),
        pickup_time: None,
        transit_start_time: None,
        delivery_time: None,
        estimated_delivery: None,
    };

    if status == OrderStatus::AwaitingConfirmation {
        order.total_cost = order.parcel_cost_sum();
    }

    state.orders.insert(order.order_id, order.clone());
    publish(state, order.order_id, None, status, None);

    info!(
        order_id = %order.order_id,
        route_id = order.route_id,
        direction = order.direction.as_str(),
        status = %status,
        "order created"
    );

    Ok(order)
}

pub fn confirm_order(
    state: &AppState,
    order_id: Uuid,
    payment_time: PaymentTime,
    actor_id: Option<UserId>,
) -> Result<OrderRecord, AppError> {
    let tracking_number = generate_tracking_number(state);
    let sla = state.delivery_sla;

    let order = apply_transition(
        state,
        order_id,
        &[OrderStatus::AwaitingConfirmation],
        OrderStatus::ToBeCollected,
        actor_id,
        |order| {
            if !order.is_priced() {
                return Err(AppError::validation(
                    "total_cost",
                    "order must have a positive total cost before confirmation",
                ));
            }
            if order.tracking_number.is_none() {
                order.tracking_number = Some(tracking_number);
            }
            order.payment_time = Some(payment_time);
            order.estimated_delivery = Some(order.created_at + sla);
            Ok(())
        },
    )?;

    if let Some(tracking_number) = &order.tracking_number {
        state
            .tracking_index
            .insert(tracking_number.clone(), order.order_id);
    }

    if let Some(notification) = Notification::order_confirmed(&order, Utc::now()) {
        notify::enqueue(state, notification);
    }

    Ok(order)
}

pub fn get_order(state: &AppState, order_id: Uuid) -> Result<OrderRecord, AppError> {
    state
        .orders
        .get(&order_id)
        .map(|entry| entry.value().clone())
        .ok_or_else(|| AppError::NotFound(format!("order {order_id} not found")))
}

pub fn track(state: &AppState, tracking_number: &str) -> Result<TrackingView, AppError> {
    let tracking_number = tracking_number.trim();
    let order_id = state
        .tracking_index
        .get(tracking_number)
        .map(|entry| *entry.value())
        .ok_or_else(|| AppError::NotFound(format!("tracking number {tracking_number} not found")))?;

    let order = get_order(state, order_id)?;
    Ok(TrackingView::from_order(tracking_number.to_string(), &order))
}

pub fn list_orders<P>(state: &AppState, predicate: P) -> Vec<OrderRecord>
where
    P: Fn(&OrderRecord) -> bool,
{
    let mut orders: Vec<OrderRecord> = state
        .orders
        .iter()
        .filter(|entry| predicate(entry.value()))
        .map(|entry| entry.value().clone())
        .collect();
    orders.sort_by_key(|order| order.created_at);
    orders
}

fn generate_tracking_number(state: &AppState) -> String {
    loop {
        let candidate = format!(
            "MC{}",
            &Uuid::new_v4().simple().to_string()[..16].to_ascii_uppercase()
        );
        if !state.tracking_index.contains_key(&candidate) {
            return candidate;
        }
    }
}

fn publish(
    state: &AppState,
    order_id: Uuid,
    from: Option<OrderStatus>,
    to: OrderStatus,
    actor_id: Option<UserId>,
) {
    let event = OrderEvent {
        id: Uuid::new_v4(),
        order_id,
        from,
        to,
        actor_id,
        occurred_at: Utc::now(),
    };
    let _ = state.order_events_tx.send(event);
}

fn describe(statuses: &[OrderStatus]) -> String {
    statuses
        .iter()
        .map(|status| status.as_str())
        .collect::<Vec<_>>()
        .join(" or ")
}
