mod server;

pub use server::{health_handler, metrics_handler};

use prometheus::{IntCounter, IntCounterVec, IntGauge, Opts, Registry};

use crate::domain::order::OrderStatus;

// ============================================================================
// Metrics Module - Prometheus metrics for observability
// ============================================================================
//
// Order-domain signals:
// - Order creation volume and failures
// - Status transitions, accepted and rejected, labeled from/to
// - Delivery-partner assignments and assignment conflicts
// - Broadcast publishes and the broadcast circuit breaker state
//
// Scraped via GET /metrics on the main server.
// ============================================================================

pub struct Metrics {
    registry: Registry,

    pub orders_created: IntCounter,
    pub order_create_failures: IntCounterVec,

    pub status_transitions: IntCounterVec,
    pub status_transitions_rejected: IntCounterVec,

    pub assignments: IntCounter,
    pub assignment_conflicts: IntCounter,

    pub broadcasts_published: IntCounter,
    pub broadcast_failures: IntCounter,
    pub broadcast_circuit_state: IntGauge,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let orders_created = IntCounter::new("orders_created_total", "Orders persisted")?;
        registry.register(Box::new(orders_created.clone()))?;

        let order_create_failures = IntCounterVec::new(
            Opts::new("order_create_failures_total", "Order creations rejected"),
            &["reason"],
        )?;
        registry.register(Box::new(order_create_failures.clone()))?;

        let status_transitions = IntCounterVec::new(
            Opts::new("order_status_transitions_total", "Accepted status transitions"),
            &["from", "to"],
        )?;
        registry.register(Box::new(status_transitions.clone()))?;

        let status_transitions_rejected = IntCounterVec::new(
            Opts::new(
                "order_status_transitions_rejected_total",
                "Status transitions rejected by the lifecycle graph",
            ),
            &["from", "to"],
        )?;
        registry.register(Box::new(status_transitions_rejected.clone()))?;

        let assignments = IntCounter::new(
            "delivery_partner_assignments_total",
            "Successful delivery partner assignments",
        )?;
        registry.register(Box::new(assignments.clone()))?;

        let assignment_conflicts = IntCounter::new(
            "delivery_partner_assignment_conflicts_total",
            "Accepts rejected because the order was already assigned",
        )?;
        registry.register(Box::new(assignment_conflicts.clone()))?;

        let broadcasts_published = IntCounter::new(
            "order_update_broadcasts_total",
            "order:update broadcasts published",
        )?;
        registry.register(Box::new(broadcasts_published.clone()))?;

        let broadcast_failures = IntCounter::new(
            "order_update_broadcast_failures_total",
            "order:update broadcasts that failed to publish",
        )?;
        registry.register(Box::new(broadcast_failures.clone()))?;

        let broadcast_circuit_state = IntGauge::new(
            "broadcast_circuit_breaker_state",
            "Broadcast circuit breaker state (0=Closed, 1=Open, 2=HalfOpen)",
        )?;
        registry.register(Box::new(broadcast_circuit_state.clone()))?;

        Ok(Self {
            registry,
            orders_created,
            order_create_failures,
            status_transitions,
            status_transitions_rejected,
            assignments,
            assignment_conflicts,
            broadcasts_published,
            broadcast_failures,
            broadcast_circuit_state,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn record_order_created(&self) {
        self.orders_created.inc();
    }

    pub fn record_order_create_failure(&self, reason: &str) {
        self.order_create_failures.with_label_values(&[reason]).inc();
    }

    pub fn record_transition(&self, from: OrderStatus, to: OrderStatus, accepted: bool) {
        let labels = [from.as_str(), to.as_str()];
        if accepted {
            self.status_transitions.with_label_values(&labels).inc();
        } else {
            self.status_transitions_rejected.with_label_values(&labels).inc();
        }
    }

    pub fn record_assignment(&self, succeeded: bool) {
        if succeeded {
            self.assignments.inc();
        } else {
            self.assignment_conflicts.inc();
        }
    }

    pub fn record_broadcast(&self, succeeded: bool) {
        if succeeded {
            self.broadcasts_published.inc();
        } else {
            self.broadcast_failures.inc();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = Metrics::new().unwrap();
        assert!(!metrics.registry.gather().is_empty());
    }

    #[test]
    fn test_record_transition_labels() {
        let metrics = Metrics::new().unwrap();
        metrics.record_transition(OrderStatus::Pending, OrderStatus::Preparing, true);
        metrics.record_transition(OrderStatus::Pending, OrderStatus::Delivered, false);

        let gathered = metrics.registry.gather();
        let accepted = gathered
            .iter()
            .find(|m| m.name() == "order_status_transitions_total")
            .unwrap();
        assert_eq!(accepted.metric[0].counter.value, Some(1.0));

        let rejected = gathered
            .iter()
            .find(|m| m.name() == "order_status_transitions_rejected_total")
            .unwrap();
        assert_eq!(rejected.metric[0].counter.value, Some(1.0));
    }

    #[test]
    fn test_record_assignment_outcomes() {
        let metrics = Metrics::new().unwrap();
        metrics.record_assignment(true);
        metrics.record_assignment(false);
        metrics.record_assignment(false);

        let gathered = metrics.registry.gather();
        let conflicts = gathered
            .iter()
            .find(|m| m.name() == "delivery_partner_assignment_conflicts_total")
            .unwrap();
        assert_eq!(conflicts.metric[0].counter.value, Some(2.0));
    }

    #[test]
    fn test_record_broadcast_outcomes() {
        let metrics = Metrics::new().unwrap();
        metrics.record_broadcast(true);
        metrics.record_broadcast(true);
        metrics.record_broadcast(false);

        let gathered = metrics.registry.gather();
        let published = gathered
            .iter()
            .find(|m| m.name() == "order_update_broadcasts_total")
            .unwrap();
        assert_eq!(published.metric[0].counter.value, Some(2.0));
    }
}
