pub mod delivery_partners;
pub mod orders;
pub mod response;

use actix_web::web;

use crate::metrics;
use crate::models::OrderSnapshot;
use crate::state::AppState;

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/orders")
            .route("", web::get().to(orders::list_active))
            .route("", web::post().to(orders::create_order))
            .route("/customer/{customer_id}", web::get().to(orders::list_customer_orders))
            .route(
                "/restaurant/{restaurant_id}/history",
                web::get().to(orders::restaurant_history),
            )
            .route(
                "/restaurant/{restaurant_id}",
                web::get().to(orders::list_restaurant_orders),
            )
            .route(
                "/delivery-partner/{dp_id}",
                web::get().to(orders::list_delivery_partner_orders),
            )
            .route("/{id}", web::get().to(orders::get_order))
            .route("/{id}/status", web::patch().to(orders::update_status)),
    )
    .service(
        web::scope("/delivery-partners")
            .route("/acceptOrder", web::patch().to(delivery_partners::accept_order))
            .route("/completeOrder", web::patch().to(delivery_partners::complete_order)),
    )
    .route("/metrics", web::get().to(metrics::metrics_handler))
    .route("/health", web::get().to(metrics::health_handler));
}

/// Fire-and-forget `order:update` broadcast. Publish failures are logged and
/// counted, never surfaced to the HTTP caller.
pub(crate) fn broadcast_snapshot(state: &web::Data<AppState>, snapshot: OrderSnapshot) {
    let broadcast = state.broadcast.clone();
    let metrics = state.metrics.clone();

    tokio::spawn(async move {
        match broadcast.publish_order_update(&snapshot).await {
            Ok(()) => metrics.record_broadcast(true),
            Err(err) => {
                metrics.record_broadcast(false);
                tracing::warn!(
                    order_id = %snapshot.order.id,
                    error = %err,
                    "order:update broadcast failed"
                );
            }
        }

        let state = match broadcast.circuit_state().await {
            crate::utils::CircuitState::Closed => 0,
            crate::utils::CircuitState::Open => 1,
            crate::utils::CircuitState::HalfOpen => 2,
        };
        metrics.broadcast_circuit_state.set(state);
    });
}
