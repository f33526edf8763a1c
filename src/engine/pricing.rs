use rust_decimal::Decimal;
use uuid::Uuid;

use crate::engine::lifecycle::{apply_transition, list_orders};
use crate::engine::validation::positive_cost;
use crate::error::AppError;
use crate::models::actor::UserId;
use crate::models::order::{OrderRecord, OrderStatus};
use crate::state::AppState;

pub fn price_order(
    state: &AppState,
    order_id: Uuid,
    costs: &[Option<Decimal>],
    actor_id: Option<UserId>,
) -> Result<OrderRecord, AppError> {
    apply_transition(
        state,
        order_id,
        &[OrderStatus::PendingCostCalculation],
        OrderStatus::AwaitingConfirmation,
        actor_id,
        |order| {
            if costs.len() != order.parcels.len() {
                return Err(AppError::validation(
                    "costs",
                    format!(
                        "expected {} parcel costs, got {}",
                        order.parcels.len(),
                        costs.len()
                    ),
                ));
            }

            let mut total = Decimal::ZERO;
            for (index, (parcel, cost)) in order.parcels.iter_mut().zip(costs).enumerate() {
                let cost = positive_cost(format!("costs[{index}]"), *cost)?;
                parcel.cost = Some(cost);
                total += cost;
            }

            order.total_cost = Some(total);
            Ok(())
        },
    )
}

pub fn pending_pricing(state: &AppState, county: &str) -> Vec<OrderRecord> {
    list_orders(state, |order| {
        order.status == OrderStatus::PendingCostCalculation
            && order.sender.county.eq_ignore_ascii_case(county)
    })
}
