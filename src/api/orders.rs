use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::api::{broadcast_snapshot, response};
use crate::auth::AuthenticatedUser;
use crate::db;
use crate::domain::order::{
    self, OrderError, OrderItemRequest, OrderStatus, OrderType, PaymentType, Role,
};
use crate::errors::AppError;
use crate::state::AppState;

// ============================================================================
// Order Endpoints
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub restaurant_id: Uuid,
    pub customer_id: Uuid,
    pub items: Vec<OrderItemRequest>,
    pub payment_type: PaymentType,
    pub order_type: OrderType,
    #[serde(default)]
    pub address: Option<Value>,
    #[serde(default)]
    pub customer_notes: Option<String>,
    #[serde(default)]
    pub distance: f64,
}

/// POST /api/orders
///
/// Order Builder: resolve every line against the live menu, derive the
/// money fields, persist order + items atomically.
pub async fn create_order(
    state: web::Data<AppState>,
    _user: AuthenticatedUser,
    body: web::Json<CreateOrderRequest>,
) -> Result<HttpResponse, AppError> {
    let req = body.into_inner();

    if req.items.is_empty() {
        state.metrics.record_order_create_failure("empty_items");
        return Err(OrderError::EmptyItems.into());
    }

    let mut lines = Vec::with_capacity(req.items.len());
    for item in &req.items {
        let menu_item = db::menu::find_menu_item(&state.db, item.menu_item_id)
            .await?
            .ok_or_else(|| {
                state.metrics.record_order_create_failure("menu_item_not_found");
                OrderError::MenuItemNotFound(item.menu_item_id)
            })?;

        let line = order::price_line(&menu_item, item).map_err(|e| {
            state.metrics.record_order_create_failure("validation");
            e
        })?;
        lines.push(line);
    }

    let totals = order::order_totals(&lines, req.distance)?;

    let new_order = db::orders::NewOrder {
        restaurant_id: req.restaurant_id,
        customer_id: req.customer_id,
        payment_type: req.payment_type,
        order_type: req.order_type,
        customer_notes: req.customer_notes,
        distance: req.distance,
        address: req.address,
        totals,
        lines,
    };

    let order_id = db::orders::create_order(&state.db, &new_order).await?;
    state.metrics.record_order_created();

    tracing::info!(
        order_id = %order_id,
        restaurant_id = %req.restaurant_id,
        customer_id = %req.customer_id,
        item_count = new_order.lines.len(),
        total_amount = new_order.totals.total_amount,
        "Order created"
    );

    if state.broadcast_on_create {
        if let Some(snapshot) = db::orders::load_snapshot(&state.db, order_id).await? {
            broadcast_snapshot(&state, snapshot);
        }
    }

    Ok(response::created(
        serde_json::json!({ "orderId": order_id }),
        "Order created successfully",
    ))
}

/// GET /api/orders - active orders across all restaurants.
pub async fn list_active(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let orders = db::orders::list_active(&state.db, None).await?;
    let snapshots = db::orders::load_snapshots(&state.db, orders).await?;
    Ok(response::ok(snapshots, "Orders retrieved successfully"))
}

/// GET /api/orders/{id}
pub async fn get_order(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let snapshot = db::orders::load_snapshot(&state.db, id)
        .await?
        .ok_or_else(|| AppError::not_found("Order not found"))?;
    Ok(response::ok(snapshot, "Order retrieved successfully"))
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
}

/// PATCH /api/orders/{id}/status
///
/// Status Machine: the transition graph is consulted before the write, and
/// the write itself is conditional on the observed status so concurrent
/// transitions lose with Conflict instead of overwriting.
pub async fn update_status(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<UpdateStatusRequest>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let next = body.status;

    let order = db::orders::find_order(&state.db, id)
        .await?
        .ok_or_else(|| AppError::not_found("Order not found"))?;

    if !order.status.can_transition_to(next) {
        state.metrics.record_transition(order.status, next, false);
        tracing::warn!(
            order_id = %id,
            from = %order.status,
            to = %next,
            "Rejected illegal status transition"
        );
        return Err(OrderError::invalid_transition(order.status, next).into());
    }

    let applied = db::orders::set_status(&state.db, id, order.status, next).await?;
    if !applied {
        // A concurrent transition moved the order first
        state.metrics.record_transition(order.status, next, false);
        return Err(OrderError::invalid_transition(order.status, next).into());
    }

    state.metrics.record_transition(order.status, next, true);
    tracing::info!(order_id = %id, from = %order.status, to = %next, "Order status updated");

    if let Some(snapshot) = db::orders::load_snapshot(&state.db, id).await? {
        let updated = snapshot.order.clone();
        broadcast_snapshot(&state, snapshot);
        return Ok(response::ok(updated, "Order status updated successfully"));
    }

    let mut updated = order;
    updated.status = next;
    Ok(response::ok(updated, "Order status updated successfully"))
}

/// GET /api/orders/customer/{customer_id}
pub async fn list_customer_orders(
    state: web::Data<AppState>,
    _user: AuthenticatedUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let customer_id = path.into_inner();
    let orders = db::orders::list_by_customer(&state.db, customer_id).await?;
    let snapshots = db::orders::load_snapshots(&state.db, orders).await?;
    Ok(response::ok(snapshots, "Customer orders retrieved successfully"))
}

/// GET /api/orders/restaurant/{restaurant_id} - active orders for one restaurant.
pub async fn list_restaurant_orders(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let restaurant_id = path.into_inner();
    let orders = db::orders::list_active(&state.db, Some(restaurant_id)).await?;
    let snapshots = db::orders::load_snapshots(&state.db, orders).await?;
    Ok(response::ok(snapshots, "Restaurant orders retrieved successfully"))
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    20
}

/// GET /api/orders/restaurant/{restaurant_id}/history
///
/// Owner-only: the authenticated principal must be the restaurant itself.
pub async fn restaurant_history(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
    query: web::Query<HistoryQuery>,
) -> Result<HttpResponse, AppError> {
    let restaurant_id = path.into_inner();

    let owns = user.role == Role::Admin
        || (user.role == Role::Restaurant && user.id == restaurant_id);
    if !owns {
        return Err(AppError::forbidden(
            "Unauthorized: You do not have access to this restaurant",
        ));
    }

    let orders =
        db::orders::list_history(&state.db, restaurant_id, query.page, query.limit).await?;
    let snapshots = db::orders::load_snapshots(&state.db, orders).await?;
    Ok(response::ok(snapshots, "Restaurant order history retrieved successfully"))
}

/// GET /api/orders/delivery-partner/{dp_id} - dispatch/delivered orders.
pub async fn list_delivery_partner_orders(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let dp_id = path.into_inner();
    let orders = db::orders::list_by_delivery_partner(&state.db, dp_id).await?;
    let snapshots = db::orders::load_snapshots(&state.db, orders).await?;
    Ok(response::ok(snapshots, "Delivery partner orders retrieved successfully"))
}
