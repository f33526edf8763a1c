use chrono::Duration;
use dashmap::DashMap;
use tokio::sync::{broadcast, mpsc};
use uuid::Uuid;

use crate::config::Config;
use crate::engine::routing::RouteDirectory;
use crate::engine::worklist::WorklistKey;
use crate::models::actor::UserId;
use crate::models::driver::{CheckIn, DriverRouteState};
use crate::models::event::OrderEvent;
use crate::models::order::OrderRecord;
use crate::notify::Notification;
use crate::observability::metrics::Metrics;

pub struct AppState {
    pub routes: RouteDirectory,
    pub orders: DashMap<Uuid, OrderRecord>,
    pub tracking_index: DashMap<String, Uuid>,
    pub drivers: DashMap<UserId, DriverRouteState>,
    pub checkins: DashMap<UserId, Vec<CheckIn>>,
    pub worklists: DashMap<WorklistKey, Vec<Uuid>>,
    pub order_events_tx: broadcast::Sender<OrderEvent>,
    pub notification_tx: mpsc::Sender<Notification>,
    pub delivery_sla: Duration,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(routes: RouteDirectory, config: &Config) -> (Self, mpsc::Receiver<Notification>) {
        let (notification_tx, notification_rx) = mpsc::channel(config.notification_queue_size);
        let (order_events_tx, _unused_rx) = broadcast::channel(config.event_buffer_size);

        (
            Self {
                routes,
                orders: DashMap::new(),
                tracking_index: DashMap::new(),
                drivers: DashMap::new(),
                checkins: DashMap::new(),
                worklists: DashMap::new(),
                order_events_tx,
                notification_tx,
                delivery_sla: Duration::hours(config.delivery_sla_hours),
                metrics: Metrics::new(),
            },
            notification_rx,
        )
    }
}
