use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::notify::{Notification, Notifier};
use crate::state::AppState;

pub async fn run_notification_dispatcher(
    state: Arc<AppState>,
    mut notification_rx: mpsc::Receiver<Notification>,
    notifier: Arc<dyn Notifier>,
) {
    info!("notification dispatcher started");

    while let Some(notification) = notification_rx.recv().await {
        state.metrics.notifications_in_queue.dec();

        match notifier.send(&notification).await {
            Ok(()) => {
                state
                    .metrics
                    .notifications_total
                    .with_label_values(&["sent"])
                    .inc();
            }
            Err(err) => {
                state
                    .metrics
                    .notifications_total
                    .with_label_values(&["failed"])
                    .inc();
                warn!(
                    order_id = %notification.order_id,
                    error = %err,
                    "notification failed; order state is unaffected"
                );
            }
        }
    }

    warn!("notification dispatcher stopped: queue channel closed");
}
