pub mod dispatcher;

use async_trait::async_trait;
use chrono::{DateTime, Timelike, Utc};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::order::OrderRecord;
use crate::state::AppState;

#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub order_id: Uuid,
    pub recipient_name: String,
    pub recipient_email: String,
    pub recipient_phone: String,
    pub subject: String,
    pub body: String,
}

impl Notification {
    pub fn order_confirmed(order: &OrderRecord, now: DateTime<Utc>) -> Option<Self> {
        let tracking_number = order.tracking_number.as_deref()?;

        let greeting = match now.hour() {
            0..=11 => "Good morning",
            12..=17 => "Good afternoon",
            _ => "Good evening",
        };
        let total_cost = order
            .total_cost
            .map(|cost| cost.to_string())
            .unwrap_or_else(|| "TBD".to_string());
        let estimated_delivery = order
            .estimated_delivery
            .map(|eta| eta.format("%B %-d, %Y %H:%M").to_string())
            .unwrap_or_else(|| "TBD".to_string());

        let body = format!(
            "{greeting} {name},\n\n\
             We are pleased to inform you that your order has been confirmed.\n\n\
             Order Details:\n\
             - Tracking Number: {tracking_number}\n\
             - Order Date: {created}\n\
             - Estimated Delivery: {estimated_delivery}\n\
             - Total Cost: KES {total_cost}\n\n\
             You can track your order at /track/{tracking_number}",
            name = order.sender.name,
            created = order.created_at.format("%B %-d, %Y %H:%M"),
        );

        Some(Self {
            order_id: order.order_id,
            recipient_name: order.sender.name.clone(),
            recipient_email: order.sender.email.clone(),
            recipient_phone: order.sender.phone.clone(),
            subject: format!("Order confirmed: {tracking_number}"),
            body,
        })
    }
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification delivery failed: {0}")]
    Delivery(String),
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError>;
}

pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        info!(
            order_id = %notification.order_id,
            email = %notification.recipient_email,
            phone = %notification.recipient_phone,
            subject = %notification.subject,
            "notification sent"
        );
        Ok(())
    }
}

pub fn enqueue(state: &AppState, notification: Notification) {
    let order_id = notification.order_id;
    match state.notification_tx.try_send(notification) {
        Ok(()) => state.metrics.notifications_in_queue.inc(),
        Err(TrySendError::Full(_)) => {
            state.metrics.notifications_total.with_label_values(&["dropped"]).inc();
            warn!(order_id = %order_id, "notification queue full; dropping notification");
        }
        Err(TrySendError::Closed(_)) => {
            state.metrics.notifications_total.with_label_values(&["dropped"]).inc();
            warn!(order_id = %order_id, "notification queue closed; dropping notification");
        }
    }
}
