use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::order::{OrderStatus, OrderTotals, OrderType, PaymentType, PricedLine};
use crate::models::{
    Customer, DeliveryPartner, MenuItem, Order, OrderItem, OrderItemSnapshot, OrderSnapshot,
    Restaurant,
};

// ============================================================================
// Order Repository
// ============================================================================
//
// All writes that must be race-safe are conditional updates: the status
// machine writes `WHERE status = <observed>` and the assignment gate writes
// `WHERE delivery_partner_id IS NULL`, so concurrent actors lose cleanly
// instead of overwriting each other.
//
// ============================================================================

const ORDER_COLUMNS: &str = "id, restaurant_id, customer_id, delivery_partner_id, status, \
     payment_type, order_type, customer_notes, distance, address, items_amount, gst, \
     delivery_fee, total_amount, placed_at, dp_accepted_at, dp_delivered_at";

const ITEM_COLUMNS: &str =
    "id, order_id, menu_item_id, quantity, base_price, addons, total_addon_price, total_price";

/// A fully priced order ready to persist.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub restaurant_id: Uuid,
    pub customer_id: Uuid,
    pub payment_type: PaymentType,
    pub order_type: OrderType,
    pub customer_notes: Option<String>,
    pub distance: f64,
    pub address: Option<Value>,
    pub totals: OrderTotals,
    pub lines: Vec<PricedLine>,
}

/// Persist the order row and all of its line rows in one transaction.
/// A failure anywhere rolls the whole order back; partial creation is
/// never observable.
pub async fn create_order(pool: &PgPool, new_order: &NewOrder) -> Result<Uuid, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let order_id: Uuid = sqlx::query_scalar(
        "INSERT INTO orders (restaurant_id, customer_id, status, payment_type, order_type, \
         customer_notes, distance, address, items_amount, gst, delivery_fee, total_amount) \
         VALUES ($1, $2, 'pending', $3, $4, $5, $6, $7, $8, $9, $10, $11) \
         RETURNING id",
    )
    .bind(new_order.restaurant_id)
    .bind(new_order.customer_id)
    .bind(new_order.payment_type)
    .bind(new_order.order_type)
    .bind(&new_order.customer_notes)
    .bind(new_order.distance)
    .bind(&new_order.address)
    .bind(new_order.totals.items_amount)
    .bind(new_order.totals.gst)
    .bind(new_order.totals.delivery_fee)
    .bind(new_order.totals.total_amount)
    .fetch_one(&mut *tx)
    .await?;

    for line in &new_order.lines {
        sqlx::query(
            "INSERT INTO order_items (order_id, menu_item_id, quantity, base_price, addons, \
             total_addon_price, total_price) VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(order_id)
        .bind(line.menu_item_id)
        .bind(line.quantity)
        .bind(line.base_price)
        .bind(&line.addons)
        .bind(line.total_addon_price)
        .bind(line.total_price)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(order_id)
}

pub async fn find_order(pool: &PgPool, id: Uuid) -> Result<Option<Order>, sqlx::Error> {
    sqlx::query_as::<_, Order>(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Conditional status write for the status machine. Returns false when the
/// observed status no longer matches, i.e. a concurrent transition won.
pub async fn set_status(
    pool: &PgPool,
    id: Uuid,
    observed: OrderStatus,
    next: OrderStatus,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE orders SET status = $1 WHERE id = $2 AND status = $3")
        .bind(next)
        .bind(id)
        .bind(observed)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() == 1)
}

/// Compare-and-set assignment: binds the delivery partner only while the
/// order is unassigned. Exactly one of two concurrent accepts succeeds.
pub async fn assign_partner(
    pool: &PgPool,
    order_id: Uuid,
    dp_id: Uuid,
    accepted_at: DateTime<Utc>,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE orders SET delivery_partner_id = $1, dp_accepted_at = $2 \
         WHERE id = $3 AND delivery_partner_id IS NULL",
    )
    .bind(dp_id)
    .bind(accepted_at)
    .bind(order_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Terminal delivery write, conditional on both the assigned partner and the
/// dispatch status.
pub async fn complete_delivery(
    pool: &PgPool,
    order_id: Uuid,
    dp_id: Uuid,
    delivered_at: DateTime<Utc>,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE orders SET status = 'delivered', dp_delivered_at = $1 \
         WHERE id = $2 AND delivery_partner_id = $3 AND status = 'dispatch'",
    )
    .bind(delivered_at)
    .bind(order_id)
    .bind(dp_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

// ============================================================================
// Read Side
// ============================================================================

/// Active orders (pending/preparing/ready), globally or for one restaurant.
pub async fn list_active(
    pool: &PgPool,
    restaurant_id: Option<Uuid>,
) -> Result<Vec<Order>, sqlx::Error> {
    match restaurant_id {
        Some(restaurant_id) => {
            sqlx::query_as::<_, Order>(&format!(
                "SELECT {ORDER_COLUMNS} FROM orders \
                 WHERE restaurant_id = $1 AND status IN ('pending', 'preparing', 'ready') \
                 ORDER BY placed_at DESC"
            ))
            .bind(restaurant_id)
            .fetch_all(pool)
            .await
        }
        None => {
            sqlx::query_as::<_, Order>(&format!(
                "SELECT {ORDER_COLUMNS} FROM orders \
                 WHERE status IN ('pending', 'preparing', 'ready') \
                 ORDER BY placed_at DESC"
            ))
            .fetch_all(pool)
            .await
        }
    }
}

/// Offset for a 1-based page; page numbers below 1 clamp to the first page.
pub fn history_offset(page: i64, limit: i64) -> i64 {
    (page.max(1) - 1) * limit
}

/// Restaurant order history (dispatch/rejected), newest first, paginated.
pub async fn list_history(
    pool: &PgPool,
    restaurant_id: Uuid,
    page: i64,
    limit: i64,
) -> Result<Vec<Order>, sqlx::Error> {
    sqlx::query_as::<_, Order>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders \
         WHERE restaurant_id = $1 AND status IN ('dispatch', 'rejected') \
         ORDER BY placed_at DESC OFFSET $2 LIMIT $3"
    ))
    .bind(restaurant_id)
    .bind(history_offset(page, limit))
    .bind(limit)
    .fetch_all(pool)
    .await
}

pub async fn list_by_customer(pool: &PgPool, customer_id: Uuid) -> Result<Vec<Order>, sqlx::Error> {
    sqlx::query_as::<_, Order>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE customer_id = $1 ORDER BY placed_at DESC"
    ))
    .bind(customer_id)
    .fetch_all(pool)
    .await
}

/// A delivery partner's dispatch/delivered orders, newest first.
pub async fn list_by_delivery_partner(
    pool: &PgPool,
    dp_id: Uuid,
) -> Result<Vec<Order>, sqlx::Error> {
    sqlx::query_as::<_, Order>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders \
         WHERE delivery_partner_id = $1 AND status IN ('dispatch', 'delivered') \
         ORDER BY placed_at DESC"
    ))
    .bind(dp_id)
    .fetch_all(pool)
    .await
}

// ============================================================================
// Joined Snapshots
// ============================================================================

pub async fn load_snapshot(pool: &PgPool, id: Uuid) -> Result<Option<OrderSnapshot>, sqlx::Error> {
    let Some(order) = find_order(pool, id).await? else {
        return Ok(None);
    };
    let mut snapshots = load_snapshots(pool, vec![order]).await?;
    Ok(snapshots.pop())
}

/// Join a batch of orders with their items (plus menu items), restaurant,
/// customer and delivery partner. Related entities are fetched once per
/// batch, not once per order.
pub async fn load_snapshots(
    pool: &PgPool,
    orders: Vec<Order>,
) -> Result<Vec<OrderSnapshot>, sqlx::Error> {
    if orders.is_empty() {
        return Ok(Vec::new());
    }

    let order_ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
    let items = sqlx::query_as::<_, OrderItem>(&format!(
        "SELECT {ITEM_COLUMNS} FROM order_items WHERE order_id = ANY($1)"
    ))
    .bind(&order_ids)
    .fetch_all(pool)
    .await?;

    let menu_ids: Vec<Uuid> = items.iter().map(|i| i.menu_item_id).collect();
    let menu_by_id: HashMap<Uuid, MenuItem> = sqlx::query_as::<_, MenuItem>(
        "SELECT id, restaurant_id, name, price, discounted_price, is_available \
         FROM menu_items WHERE id = ANY($1)",
    )
    .bind(&menu_ids)
    .fetch_all(pool)
    .await?
    .into_iter()
    .map(|m| (m.id, m))
    .collect();

    let restaurant_ids: Vec<Uuid> = orders.iter().map(|o| o.restaurant_id).collect();
    let restaurants: HashMap<Uuid, Restaurant> = sqlx::query_as::<_, Restaurant>(
        "SELECT id, name, address, mobile FROM restaurants WHERE id = ANY($1)",
    )
    .bind(&restaurant_ids)
    .fetch_all(pool)
    .await?
    .into_iter()
    .map(|r| (r.id, r))
    .collect();

    let customer_ids: Vec<Uuid> = orders.iter().map(|o| o.customer_id).collect();
    let customers: HashMap<Uuid, Customer> = sqlx::query_as::<_, Customer>(
        "SELECT id, name, email, mobile FROM customers WHERE id = ANY($1)",
    )
    .bind(&customer_ids)
    .fetch_all(pool)
    .await?
    .into_iter()
    .map(|c| (c.id, c))
    .collect();

    let dp_ids: Vec<Uuid> = orders.iter().filter_map(|o| o.delivery_partner_id).collect();
    let partners: HashMap<Uuid, DeliveryPartner> = if dp_ids.is_empty() {
        HashMap::new()
    } else {
        sqlx::query_as::<_, DeliveryPartner>(
            "SELECT id, name, mobile, vehicle_type, status, is_live \
             FROM delivery_partners WHERE id = ANY($1)",
        )
        .bind(&dp_ids)
        .fetch_all(pool)
        .await?
        .into_iter()
        .map(|d| (d.id, d))
        .collect()
    };

    let mut items_by_order: HashMap<Uuid, Vec<OrderItemSnapshot>> = HashMap::new();
    for item in items {
        if let Some(menu_item) = menu_by_id.get(&item.menu_item_id).cloned() {
            items_by_order
                .entry(item.order_id)
                .or_default()
                .push(OrderItemSnapshot { line: item, menu_item });
        }
    }

    Ok(orders
        .into_iter()
        .map(|order| OrderSnapshot {
            items: items_by_order.remove(&order.id).unwrap_or_default(),
            restaurant: restaurants.get(&order.restaurant_id).cloned(),
            customer: customers.get(&order.customer_id).cloned(),
            delivery_partner: order
                .delivery_partner_id
                .and_then(|id| partners.get(&id).cloned()),
            order,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_offset() {
        assert_eq!(history_offset(1, 20), 0);
        assert_eq!(history_offset(2, 20), 20);
        assert_eq!(history_offset(3, 5), 10);
        // Page numbers below 1 clamp to the first page
        assert_eq!(history_offset(0, 20), 0);
        assert_eq!(history_offset(-4, 20), 0);
    }
}
