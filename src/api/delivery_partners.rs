use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::api::{broadcast_snapshot, response};
use crate::auth::AuthenticatedUser;
use crate::db;
use crate::domain::order::{OrderError, OrderStatus, Role};
use crate::errors::AppError;
use crate::state::AppState;

// ============================================================================
// Assignment Gate Endpoints
// ============================================================================
//
// Identity is derived from the session: the body dpId is cross-checked
// against the authenticated principal rather than trusted on its own.
//
// ============================================================================

fn ensure_partner_identity(user: &AuthenticatedUser, dp_id: Uuid) -> Result<(), AppError> {
    match user.role {
        Role::Admin => Ok(()),
        Role::DeliveryPartner if user.id == dp_id => Ok(()),
        Role::DeliveryPartner => Err(AppError::forbidden(
            "Delivery partner id does not match authenticated session",
        )),
        _ => Err(AppError::forbidden(
            "Only delivery partners may accept or complete orders",
        )),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceptOrderRequest {
    pub dp_id: Uuid,
    pub order_id: Uuid,
    /// Client-reported acceptance time; server clock when absent.
    #[serde(default)]
    pub dp_accepted_at: Option<DateTime<Utc>>,
}

/// PATCH /delivery-partners/acceptOrder
///
/// Binds a delivery partner to an order exactly once. The write is a
/// compare-and-set on an unassigned order, so of two concurrent accepts
/// exactly one succeeds and the other gets Conflict.
pub async fn accept_order(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    body: web::Json<AcceptOrderRequest>,
) -> Result<HttpResponse, AppError> {
    let req = body.into_inner();
    ensure_partner_identity(&user, req.dp_id)?;

    db::delivery_partners::find_delivery_partner(&state.db, req.dp_id)
        .await?
        .ok_or_else(|| AppError::not_found("Delivery partner not found"))?;

    db::orders::find_order(&state.db, req.order_id)
        .await?
        .ok_or_else(|| AppError::not_found("Order not found"))?;

    let accepted_at = req.dp_accepted_at.unwrap_or_else(Utc::now);
    let assigned =
        db::orders::assign_partner(&state.db, req.order_id, req.dp_id, accepted_at).await?;

    state.metrics.record_assignment(assigned);
    if !assigned {
        tracing::warn!(
            order_id = %req.order_id,
            dp_id = %req.dp_id,
            "Accept rejected: order already assigned"
        );
        return Err(OrderError::AlreadyAssigned.into());
    }

    tracing::info!(order_id = %req.order_id, dp_id = %req.dp_id, "Delivery partner assigned");

    let snapshot = db::orders::load_snapshot(&state.db, req.order_id)
        .await?
        .ok_or_else(|| AppError::not_found("Order not found"))?;
    let updated = snapshot.order.clone();
    broadcast_snapshot(&state, snapshot);

    Ok(response::ok(updated, "Order accepted successfully"))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteOrderRequest {
    pub dp_id: Uuid,
    pub order_id: Uuid,
    /// Client-reported delivery time; server clock when absent.
    #[serde(default)]
    pub dp_delivered_at: Option<DateTime<Utc>>,
    /// Must be the literal "delivered"; guards against misuse of this
    /// endpoint for other transitions.
    pub status: String,
}

/// PATCH /delivery-partners/completeOrder
pub async fn complete_order(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    body: web::Json<CompleteOrderRequest>,
) -> Result<HttpResponse, AppError> {
    let req = body.into_inner();

    if req.status != "delivered" {
        return Err(AppError::validation(
            "Invalid status: completeOrder only accepts 'delivered'",
        ));
    }

    ensure_partner_identity(&user, req.dp_id)?;

    let order = db::orders::find_order(&state.db, req.order_id)
        .await?
        .ok_or_else(|| AppError::not_found("Order not found"))?;

    if order.delivery_partner_id != Some(req.dp_id) {
        tracing::warn!(
            order_id = %req.order_id,
            dp_id = %req.dp_id,
            assigned = ?order.delivery_partner_id,
            "Completion attempt by non-assigned partner"
        );
        return Err(OrderError::PartnerMismatch.into());
    }

    if !order.status.can_transition_to(OrderStatus::Delivered) {
        state.metrics.record_transition(order.status, OrderStatus::Delivered, false);
        return Err(OrderError::invalid_transition(order.status, OrderStatus::Delivered).into());
    }

    let delivered_at = req.dp_delivered_at.unwrap_or_else(Utc::now);
    let completed =
        db::orders::complete_delivery(&state.db, req.order_id, req.dp_id, delivered_at).await?;
    if !completed {
        // Raced with another transition between the read and the write
        state.metrics.record_transition(order.status, OrderStatus::Delivered, false);
        return Err(OrderError::invalid_transition(order.status, OrderStatus::Delivered).into());
    }

    state.metrics.record_transition(order.status, OrderStatus::Delivered, true);
    tracing::info!(order_id = %req.order_id, dp_id = %req.dp_id, "Order delivered");

    let snapshot = db::orders::load_snapshot(&state.db, req.order_id)
        .await?
        .ok_or_else(|| AppError::not_found("Order not found"))?;
    let updated = snapshot.order.clone();
    broadcast_snapshot(&state, snapshot);

    Ok(response::ok(updated, "Order completed successfully"))
}
