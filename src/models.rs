use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::domain::order::{OrderStatus, OrderType, PaymentType};

// ============================================================================
// Persistent Records
// ============================================================================
//
// Row shapes map 1:1 onto the migration schema; the wire contract is
// camelCase throughout.
//
// ============================================================================

/// The order aggregate root. Monetary fields are derived at creation time
/// and never client-supplied.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    pub restaurant_id: Uuid,
    pub customer_id: Uuid,
    pub delivery_partner_id: Option<Uuid>,
    pub status: OrderStatus,
    pub payment_type: PaymentType,
    pub order_type: OrderType,
    pub customer_notes: Option<String>,
    pub distance: f64,
    /// Delivery address snapshot taken at order time.
    pub address: Option<Value>,
    pub items_amount: f64,
    pub gst: f64,
    pub delivery_fee: f64,
    pub total_amount: f64,
    pub placed_at: DateTime<Utc>,
    pub dp_accepted_at: Option<DateTime<Utc>>,
    pub dp_delivered_at: Option<DateTime<Utc>>,
}

/// A line within an order. Prices are copied from the menu at order time.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub menu_item_id: Uuid,
    pub quantity: i32,
    pub base_price: f64,
    pub addons: Option<Value>,
    pub total_addon_price: f64,
    pub total_price: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    pub id: Uuid,
    pub restaurant_id: Uuid,
    pub name: String,
    pub price: f64,
    pub discounted_price: Option<f64>,
    pub is_available: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Restaurant {
    pub id: Uuid,
    pub name: String,
    pub address: Option<String>,
    pub mobile: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub mobile: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryPartner {
    pub id: Uuid,
    pub name: String,
    pub mobile: String,
    pub vehicle_type: Option<String>,
    pub status: String,
    pub is_live: bool,
}

// ============================================================================
// Joined Snapshots
// ============================================================================

/// A line item joined with the menu item it references.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemSnapshot {
    #[serde(flatten)]
    pub line: OrderItem,
    pub menu_item: MenuItem,
}

/// The fully joined order view returned by read endpoints and broadcast on
/// `order:update`. Consumers treat each broadcast as "refetch state", so the
/// whole aggregate travels together.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSnapshot {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItemSnapshot>,
    pub restaurant: Option<Restaurant>,
    pub customer: Option<Customer>,
    pub delivery_partner: Option<DeliveryPartner>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::{OrderStatus, OrderType, PaymentType};

    fn sample_order() -> Order {
        Order {
            id: Uuid::new_v4(),
            restaurant_id: Uuid::new_v4(),
            customer_id: Uuid::new_v4(),
            delivery_partner_id: None,
            status: OrderStatus::Pending,
            payment_type: PaymentType::Cod,
            order_type: OrderType::Delivery,
            customer_notes: None,
            distance: 4.2,
            address: Some(serde_json::json!({ "line1": "12 MG Road", "city": "Pune" })),
            items_amount: 180.0,
            gst: 9.0,
            delivery_fee: 0.0,
            total_amount: 189.0,
            placed_at: Utc::now(),
            dp_accepted_at: None,
            dp_delivered_at: None,
        }
    }

    #[test]
    fn test_order_serializes_camel_case() {
        let json = serde_json::to_value(sample_order()).unwrap();
        assert!(json.get("itemsAmount").is_some());
        assert!(json.get("totalAmount").is_some());
        assert!(json.get("dpAcceptedAt").is_some());
        assert!(json.get("placedAt").is_some());
        assert!(json.get("items_amount").is_none());
    }

    #[test]
    fn test_snapshot_flattens_order_fields() {
        let snapshot = OrderSnapshot {
            order: sample_order(),
            items: vec![],
            restaurant: None,
            customer: None,
            delivery_partner: None,
        };
        let json = serde_json::to_value(&snapshot).unwrap();
        // Order fields sit at the top level next to the joined entities
        assert!(json.get("status").is_some());
        assert!(json.get("items").is_some());
        assert!(json.get("deliveryPartner").is_some());
    }
}
