use chrono::Utc;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::engine::lifecycle::{apply_transition, get_order, list_orders};
use crate::engine::walker;
use crate::error::AppError;
use crate::models::actor::Actor;
use crate::models::order::{OrderRecord, OrderStatus, PaymentMode, PaymentTime, TransferLeg};
use crate::state::AppState;

#[derive(Debug, Clone, Serialize)]
pub struct SkippedOrder {
    pub order_id: Uuid,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchOutcome {
    pub operation: &'static str,
    pub requested: usize,
    pub updated: Vec<Uuid>,
    pub skipped: Vec<SkippedOrder>,
    pub message: String,
}

impl BatchOutcome {
    pub fn updated_count(&self) -> usize {
        self.updated.len()
    }
}

fn driver_county(driver: &Actor) -> Result<&str, AppError> {
    driver
        .county
        .as_deref()
        .map(str::trim)
        .filter(|county| !county.is_empty())
        .ok_or_else(|| AppError::Forbidden("county driver has no county assigned".to_string()))
}

fn checked_in_county(state: &AppState, driver: &Actor) -> Result<String, AppError> {
    walker::current_county(state, driver.user_id).ok_or_else(|| {
        AppError::validation("check_in", "transit driver must check in at an office first")
    })
}

fn held_at(order: &OrderRecord, county: &str) -> Result<(), AppError> {
    if order.current_county_office.eq_ignore_ascii_case(county) {
        Ok(())
    } else {
        Err(AppError::StateConflict(format!(
            "order {} is held at the {} office, not {county}",
            order.order_id, order.current_county_office
        )))
    }
}

fn settle_payment(
    order: &mut OrderRecord,
    due: PaymentTime,
    payment_mode: Option<PaymentMode>,
) -> Result<(), AppError> {
    if order.payment_time != Some(due) {
        return Ok(());
    }

    let mode = payment_mode.ok_or_else(|| AppError::PaymentModeRequired {
        order_id: order.order_id.to_string(),
        payment_time: due.as_str(),
    })?;
    order.payment_mode = Some(mode);
    order.paid_at = Some(Utc::now());
    Ok(())
}

fn run_batch<F>(
    state: &AppState,
    operation: &'static str,
    order_ids: &[Uuid],
    mut step: F,
) -> Result<BatchOutcome, AppError>
where
    F: FnMut(Uuid) -> Result<OrderRecord, AppError>,
{
    if order_ids.is_empty() {
        return Err(AppError::validation(
            "order_ids",
            "at least one order must be selected",
        ));
    }

    let mut unique: Vec<Uuid> = Vec::with_capacity(order_ids.len());
    for id in order_ids {
        if !unique.contains(id) {
            unique.push(*id);
        }
    }

    let mut updated = Vec::new();
    let mut skipped = Vec::new();
    for order_id in &unique {
        match step(*order_id) {
            Ok(_) => updated.push(*order_id),
            Err(err) => skipped.push(SkippedOrder {
                order_id: *order_id,
                reason: err.to_string(),
            }),
        }
    }

    state
        .metrics
        .handoff_batch_orders_total
        .with_label_values(&[operation, "updated"])
        .inc_by(updated.len() as u64);
    state
        .metrics
        .handoff_batch_orders_total
        .with_label_values(&[operation, "skipped"])
        .inc_by(skipped.len() as u64);

    let requested = unique.len();
    info!(
        operation,
        requested,
        updated = updated.len(),
        skipped = skipped.len(),
        "batch hand-off confirmed"
    );

    Ok(BatchOutcome {
        operation,
        requested,
        message: format!("{} of {} orders updated", updated.len(), requested),
        updated,
        skipped,
    })
}

pub fn collect_order(
    state: &AppState,
    driver: &Actor,
    order_id: Uuid,
    payment_mode: Option<PaymentMode>,
) -> Result<OrderRecord, AppError> {
    let county = driver_county(driver)?;

    apply_transition(
        state,
        order_id,
        &[OrderStatus::ToBeCollected],
        OrderStatus::Collected,
        Some(driver.user_id),
        |order| {
            held_at(order, county)?;
            settle_payment(order, PaymentTime::OnPickup, payment_mode)?;
            order.pickup_time = Some(Utc::now());
            order.assigned_county_driver_id = Some(driver.user_id);
            order.assigned_transit_driver_id = None;
            Ok(())
        },
    )
}

pub fn drop_off_at_office(
    state: &AppState,
    driver: &Actor,
    order_ids: &[Uuid],
) -> Result<BatchOutcome, AppError> {
    run_batch(state, "office_dropoff", order_ids, |order_id| {
        apply_transition(
            state,
            order_id,
            &[OrderStatus::Collected],
            OrderStatus::WaitingTransit,
            Some(driver.user_id),
            |order| {
                if order.assigned_county_driver_id != Some(driver.user_id) {
                    return Err(AppError::StateConflict(format!(
                        "order {order_id} was collected by another driver"
                    )));
                }
                Ok(())
            },
        )
    })
}

pub fn pick_up_for_transit(
    state: &AppState,
    driver: &Actor,
    order_ids: &[Uuid],
) -> Result<BatchOutcome, AppError> {
    let county = checked_in_county(state, driver)?;
    let route = walker::route_state(state, driver)?;

    run_batch(state, "transit_pickup", order_ids, |order_id| {
        apply_transition(
            state,
            order_id,
            &[OrderStatus::WaitingTransit],
            OrderStatus::InTransit,
            Some(driver.user_id),
            |order| {
                held_at(order, &county)?;
                if order.route_id != route.route_id || order.direction != route.current_direction {
                    return Err(AppError::StateConflict(format!(
                        "order {order_id} travels route {} {}, driver is on route {} {}",
                        order.route_id,
                        order.direction.as_str(),
                        route.route_id,
                        route.current_direction.as_str()
                    )));
                }

                let now = Utc::now();
                order.transit_start_time.get_or_insert(now);
                order.assigned_transit_driver_id = Some(driver.user_id);
                order.assigned_county_driver_id = None;
                order.transfers.push(TransferLeg {
                    driver_id: driver.user_id,
                    from_county: county.clone(),
                    to_county: None,
                    picked_up_at: now,
                    dropped_off_at: None,
                });
                Ok(())
            },
        )
    })
}

pub fn drop_off_from_transit(
    state: &AppState,
    driver: &Actor,
    order_ids: &[Uuid],
) -> Result<BatchOutcome, AppError> {
    let county = checked_in_county(state, driver)?;

    run_batch(state, "transit_dropoff", order_ids, |order_id| {
        apply_transition(
            state,
            order_id,
            &[OrderStatus::InTransit],
            OrderStatus::ToBeDelivered,
            Some(driver.user_id),
            |order| {
                if order.assigned_transit_driver_id != Some(driver.user_id) {
                    return Err(AppError::StateConflict(format!(
                        "order {order_id} is carried by another driver"
                    )));
                }
                if !order.destination_county().eq_ignore_ascii_case(&county) {
                    return Err(AppError::StateConflict(format!(
                        "order {order_id} is destined for {}, not {county}",
                        order.destination_county()
                    )));
                }

                let now = Utc::now();
                if let Some(leg) = order
                    .transfers
                    .iter_mut()
                    .rev()
                    .find(|leg| leg.dropped_off_at.is_none())
                {
                    leg.to_county = Some(county.clone());
                    leg.dropped_off_at = Some(now);
                }
                order.current_county_office = county.clone();
                order.assigned_transit_driver_id = None;
                Ok(())
            },
        )
    })
}

pub fn dispatch_for_delivery(
    state: &AppState,
    driver: &Actor,
    order_ids: &[Uuid],
) -> Result<BatchOutcome, AppError> {
    let county = driver_county(driver)?;

    run_batch(state, "delivery_dispatch", order_ids, |order_id| {
        apply_transition(
            state,
            order_id,
            &[OrderStatus::ToBeDelivered],
            OrderStatus::InDelivery,
            Some(driver.user_id),
            |order| {
                held_at(order, county)?;
                order.assigned_county_driver_id = Some(driver.user_id);
                Ok(())
            },
        )
    })
}

pub fn deliver_order(
    state: &AppState,
    driver: &Actor,
    order_id: Uuid,
    payment_mode: Option<PaymentMode>,
) -> Result<OrderRecord, AppError> {
    let county = driver_county(driver)?;

    apply_transition(
        state,
        order_id,
        &[OrderStatus::ToBeDelivered, OrderStatus::InDelivery],
        OrderStatus::Delivered,
        Some(driver.user_id),
        |order| {
            held_at(order, county)?;
            if order.status == OrderStatus::InDelivery
                && order.assigned_county_driver_id != Some(driver.user_id)
            {
                return Err(AppError::StateConflict(format!(
                    "order {order_id} is out for delivery with another driver"
                )));
            }
            settle_payment(order, PaymentTime::OnDelivery, payment_mode)?;
            order.delivery_time = Some(Utc::now());
            order.assigned_county_driver_id = Some(driver.user_id);
            Ok(())
        },
    )
}

pub fn pickup_candidates(state: &AppState, driver: &Actor) -> Result<Vec<OrderRecord>, AppError> {
    let county = driver_county(driver)?;
    Ok(list_orders(state, |order| {
        order.status == OrderStatus::ToBeCollected
            && order.current_county_office.eq_ignore_ascii_case(county)
    }))
}

pub fn collected_by(state: &AppState, driver: &Actor) -> Vec<OrderRecord> {
    list_orders(state, |order| {
        order.status == OrderStatus::Collected
            && order.assigned_county_driver_id == Some(driver.user_id)
    })
}

pub fn delivery_candidates(state: &AppState, driver: &Actor) -> Result<Vec<OrderRecord>, AppError> {
    let county = driver_county(driver)?;
    Ok(list_orders(state, |order| {
        order.status == OrderStatus::ToBeDelivered
            && order.current_county_office.eq_ignore_ascii_case(county)
    }))
}

pub fn out_for_delivery_by(state: &AppState, driver: &Actor) -> Vec<OrderRecord> {
    list_orders(state, |order| {
        order.status == OrderStatus::InDelivery
            && order.assigned_county_driver_id == Some(driver.user_id)
    })
}

pub fn available_transfers(state: &AppState, driver: &Actor) -> Result<Vec<OrderRecord>, AppError> {
    let Some(county) = walker::current_county(state, driver.user_id) else {
        return Ok(Vec::new());
    };
    let route = walker::route_state(state, driver)?;

    Ok(list_orders(state, |order| {
        order.status == OrderStatus::WaitingTransit
            && order.current_county_office.eq_ignore_ascii_case(&county)
            && order.route_id == route.route_id
            && order.direction == route.current_direction
    }))
}

pub fn dropoff_candidates(state: &AppState, driver: &Actor) -> Vec<OrderRecord> {
    let Some(county) = walker::current_county(state, driver.user_id) else {
        return Vec::new();
    };

    list_orders(state, |order| {
        order.status == OrderStatus::InTransit
            && order.assigned_transit_driver_id == Some(driver.user_id)
            && order.destination_county().eq_ignore_ascii_case(&county)
    })
}

pub fn county_order_detail(
    state: &AppState,
    driver: &Actor,
    order_id: Uuid,
) -> Result<OrderRecord, AppError> {
    let county = driver_county(driver)?;
    let order = get_order(state, order_id)?;

    let in_scope = order.current_county_office.eq_ignore_ascii_case(county)
        || order.assigned_county_driver_id == Some(driver.user_id);
    if in_scope {
        Ok(order)
    } else {
        Err(AppError::NotFound(format!("order {order_id} not found")))
    }
}

pub fn transit_order_detail(
    state: &AppState,
    driver: &Actor,
    order_id: Uuid,
) -> Result<OrderRecord, AppError> {
    let route = walker::route_state(state, driver)?;
    let order = get_order(state, order_id)?;

    let companion = state.routes.companion(route.route_id).map(|r| r.route_id);
    let in_scope = order.route_id == route.route_id
        || Some(order.route_id) == companion
        || order.assigned_transit_driver_id == Some(driver.user_id);
    if in_scope {
        Ok(order)
    } else {
        Err(AppError::NotFound(format!("order {order_id} not found")))
    }
}
