use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::actor::UserId;
use crate::models::route::Direction;

/// Status vocabulary shared with deployed clients. Declaration order is the
/// lifecycle order, so `Ord` compares how far an order has progressed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OrderStatus {
    #[serde(rename = "Pending Cost Calculation")]
    PendingCostCalculation,
    #[serde(rename = "Awaiting Confirmation")]
    AwaitingConfirmation,
    #[serde(rename = "To Be Collected")]
    ToBeCollected,
    #[serde(rename = "Collected")]
    Collected,
    #[serde(rename = "Waiting Transit")]
    WaitingTransit,
    #[serde(rename = "In Transit")]
    InTransit,
    #[serde(rename = "To Be Delivered")]
    ToBeDelivered,
    #[serde(rename = "in delivery")]
    InDelivery,
    #[serde(rename = "Delivered")]
    Delivered,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::PendingCostCalculation => "Pending Cost Calculation",
            OrderStatus::AwaitingConfirmation => "Awaiting Confirmation",
            OrderStatus::ToBeCollected => "To Be Collected",
            OrderStatus::Collected => "Collected",
            OrderStatus::WaitingTransit => "Waiting Transit",
            OrderStatus::InTransit => "In Transit",
            OrderStatus::ToBeDelivered => "To Be Delivered",
            OrderStatus::InDelivery => "in delivery",
            OrderStatus::Delivered => "Delivered",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PaymentTime {
    #[serde(rename = "on-pickup")]
    OnPickup,
    #[serde(rename = "on-delivery")]
    OnDelivery,
}

impl PaymentTime {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentTime::OnPickup => "on-pickup",
            PaymentTime::OnDelivery => "on-delivery",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMode {
    Cash,
    Mpesa,
    Card,
}

impl std::str::FromStr for PaymentMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cash" => Ok(PaymentMode::Cash),
            "mpesa" => Ok(PaymentMode::Mpesa),
            "card" => Ok(PaymentMode::Card),
            other => Err(format!("unknown payment mode: {other}, expected cash/mpesa/card")),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum CustomerType {
    #[serde(rename = "online")]
    Online,
    #[serde(rename = "walk-in")]
    WalkIn,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Party {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub county: String,
    pub building: String,
    #[serde(default)]
    pub street: Option<String>,
    #[serde(default)]
    pub landmark: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Parcel {
    pub content: String,
    pub weight: Decimal,
    pub pieces: u32,
    pub cost: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransferLeg {
    pub driver_id: UserId,
    pub from_county: String,
    pub to_county: Option<String>,
    pub picked_up_at: DateTime<Utc>,
    pub dropped_off_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRecord {
    pub order_id: Uuid,
    pub tracking_number: Option<String>,
    pub customer_type: CustomerType,
    pub served_by: Option<String>,
    pub sender: Party,
    pub receiver: Party,
    pub parcels: Vec<Parcel>,
    pub total_cost: Option<Decimal>,
    pub route_id: u32,
    pub direction: Direction,
    pub current_county_office: String,
    pub status: OrderStatus,
    pub payment_time: Option<PaymentTime>,
    pub payment_mode: Option<PaymentMode>,
    pub paid_at: Option<DateTime<Utc>>,
    pub assigned_county_driver_id: Option<UserId>,
    pub assigned_transit_driver_id: Option<UserId>,
    pub transfers: Vec<TransferLeg>,
    pub created_at: DateTime<Utc>,
    pub pickup_time: Option<DateTime<Utc>>,
    pub transit_start_time: Option<DateTime<Utc>>,
    pub delivery_time: Option<DateTime<Utc>>,
    pub estimated_delivery: Option<DateTime<Utc>>,
}

impl OrderRecord {
    pub fn destination_county(&self) -> &str {
        &self.receiver.county
    }

    pub fn parcel_cost_sum(&self) -> Option<Decimal> {
        self.parcels
            .iter()
            .map(|parcel| parcel.cost)
            .sum::<Option<Decimal>>()
    }

    pub fn is_priced(&self) -> bool {
        matches!(self.total_cost, Some(total) if total > Decimal::ZERO)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TrackingView {
    pub tracking_number: String,
    pub status: OrderStatus,
    pub origin_county: String,
    pub destination_county: String,
    pub current_county_office: String,
    pub created_at: DateTime<Utc>,
    pub pickup_time: Option<DateTime<Utc>>,
    pub transit_start_time: Option<DateTime<Utc>>,
    pub delivery_time: Option<DateTime<Utc>>,
    pub estimated_delivery: Option<DateTime<Utc>>,
}

impl TrackingView {
    pub fn from_order(tracking_number: String, order: &OrderRecord) -> Self {
        Self {
            tracking_number,
            status: order.status,
            origin_county: order.sender.county.clone(),
            destination_county: order.receiver.county.clone(),
            current_county_office: order.current_county_office.clone(),
            created_at: order.created_at,
            pickup_time: order.pickup_time,
            transit_start_time: order.transit_start_time,
            delivery_time: order.delivery_time,
            estimated_delivery: order.estimated_delivery,
        }
    }
}
