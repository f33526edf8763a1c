use prometheus::{Encoder, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub order_transitions_total: IntCounterVec,
    pub handoff_batch_orders_total: IntCounterVec,
    pub orders_created_total: IntCounterVec,
    pub notifications_total: IntCounterVec,
    pub notifications_in_queue: IntGauge,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let order_transitions_total = IntCounterVec::new(
            Opts::new(
                "order_transitions_total",
                "Guarded order status transitions by target status and outcome",
            ),
            &["transition", "outcome"],
        )
        .expect("valid order_transitions_total metric");

        let handoff_batch_orders_total = IntCounterVec::new(
            Opts::new(
                "handoff_batch_orders_total",
                "Orders processed by bulk hand-off operations",
            ),
            &["operation", "outcome"],
        )
        .expect("valid handoff_batch_orders_total metric");

        let orders_created_total = IntCounterVec::new(
            Opts::new("orders_created_total", "Orders created by channel"),
            &["channel"],
        )
        .expect("valid orders_created_total metric");

        let notifications_total = IntCounterVec::new(
            Opts::new("notifications_total", "Notification deliveries by outcome"),
            &["outcome"],
        )
        .expect("valid notifications_total metric");

        let notifications_in_queue = IntGauge::new(
            "notifications_in_queue",
            "Current number of queued notifications",
        )
        .expect("valid notifications_in_queue metric");

        registry
            .register(Box::new(order_transitions_total.clone()))
            .expect("register order_transitions_total");
        registry
            .register(Box::new(handoff_batch_orders_total.clone()))
            .expect("register handoff_batch_orders_total");
        registry
            .register(Box::new(orders_created_total.clone()))
            .expect("register orders_created_total");
        registry
            .register(Box::new(notifications_total.clone()))
            .expect("register notifications_total");
        registry
            .register(Box::new(notifications_in_queue.clone()))
            .expect("register notifications_in_queue");

        Self {
            registry,
            order_transitions_total,
            handoff_batch_orders_total,
            orders_created_total,
            notifications_total,
            notifications_in_queue,
        }
    }

    pub fn record_transition(&self, transition: &str, outcome: &str) {
        self.order_transitions_total
            .with_label_values(&[transition, outcome])
            .inc();
    }

    pub fn encode(&self) -> Result<String, String> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();

        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|err| format!("failed to encode metrics: {err}"))?;

        String::from_utf8(buffer).map_err(|err| format!("metrics are not valid utf8: {err}"))
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
