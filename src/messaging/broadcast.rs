use std::time::Duration;

use anyhow::Result;
use rdkafka::{
    config::ClientConfig,
    producer::{FutureProducer, FutureRecord},
};

use crate::models::OrderSnapshot;
use crate::utils::{CircuitBreaker, CircuitBreakerConfig, CircuitBreakerError, CircuitState};

/// Topic carrying post-transition order snapshots to real-time subscribers.
pub const ORDER_UPDATE_TOPIC: &str = "order:update";

// ============================================================================
// Broadcast Client
// ============================================================================
//
// Fire-and-forget, at-least-once, best-effort: a missed broadcast is fine
// because subscribers reconcile by refetching. Callers never fail a request
// on a publish error.
//
// ============================================================================

pub struct BroadcastClient {
    producer: FutureProducer,
    circuit_breaker: CircuitBreaker,
}

impl BroadcastClient {
    pub fn new(brokers: &str) -> Result<Self> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("message.timeout.ms", "5000")
            .create()?;

        let cb_config = CircuitBreakerConfig {
            failure_threshold: 5,
            timeout: Duration::from_secs(30),
            success_threshold: 3,
        };

        Ok(Self {
            producer,
            circuit_breaker: CircuitBreaker::new(cb_config),
        })
    }

    /// Publish the fully joined order snapshot on `order:update`, keyed by
    /// order id so per-order messages stay in partition order.
    pub async fn publish_order_update(&self, snapshot: &OrderSnapshot) -> Result<()> {
        let key = snapshot.order.id.to_string();
        let payload = serde_json::to_string(snapshot)?;
        self.publish(ORDER_UPDATE_TOPIC, &key, &payload).await
    }

    async fn publish(&self, topic: &str, key: &str, payload: &str) -> Result<()> {
        let result = self
            .circuit_breaker
            .call(async {
                let record = FutureRecord::to(topic).key(key).payload(payload);

                self.producer
                    .send(record, rdkafka::util::Timeout::After(Duration::from_secs(5)))
                    .await
                    .map_err(|(e, _)| anyhow::anyhow!("Broker send error: {}", e))?;

                Ok::<(), anyhow::Error>(())
            })
            .await;

        match result {
            Ok(()) => {
                tracing::debug!(topic = %topic, key = %key, "Broadcast published");
                Ok(())
            }
            Err(CircuitBreakerError::CircuitOpen) => {
                tracing::error!(topic = %topic, "Circuit breaker open - broadcast broker unavailable");
                Err(anyhow::anyhow!("Circuit breaker open for broadcast broker"))
            }
            Err(CircuitBreakerError::OperationFailed(e)) => {
                tracing::error!(error = %e, topic = %topic, "Failed to publish broadcast");
                Err(e)
            }
        }
    }

    pub async fn circuit_state(&self) -> CircuitState {
        self.circuit_breaker.state().await
    }
}
