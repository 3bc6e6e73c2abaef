use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::models::MenuItem;

use super::errors::OrderError;

// ============================================================================
// Order Builder Pricing
// ============================================================================
//
// All monetary fields on an order are derived here, never taken from the
// client. Menu prices are read once at order time and copied onto the line,
// so persisted orders are immune to later menu edits.
//
// ============================================================================

/// GST is a fixed 5% of the items amount.
pub const GST_RATE: f64 = 0.05;

/// Current fee policy charges nothing per kilometre. The field is kept on
/// the order for future fee models.
pub const DELIVERY_FEE_PER_KM: f64 = 0.0;

/// One line of an incoming order request, as sent by the client.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemRequest {
    pub menu_item_id: Uuid,
    pub quantity: i32,
    /// Free-form addon snapshots; older clients send this as `item_addons`.
    #[serde(default, alias = "item_addons")]
    pub addons: Option<Value>,
}

/// A line item priced against the live menu, ready to persist.
#[derive(Debug, Clone)]
pub struct PricedLine {
    pub menu_item_id: Uuid,
    pub quantity: i32,
    pub base_price: f64,
    pub addons: Option<Value>,
    pub total_addon_price: f64,
    pub total_price: f64,
}

/// Order-level money derived from the priced lines.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderTotals {
    pub items_amount: f64,
    pub gst: f64,
    pub delivery_fee: f64,
    pub total_amount: f64,
}

/// Price a single requested line against its resolved menu item.
///
/// The unit price is the discounted price when one exists, the base price
/// otherwise. The raw addon array is kept verbatim as the snapshot; only
/// numeric `extraPrice` values contribute to the addon total.
pub fn price_line(menu_item: &MenuItem, request: &OrderItemRequest) -> Result<PricedLine, OrderError> {
    if request.quantity < 1 {
        return Err(OrderError::InvalidQuantity(request.quantity));
    }

    let unit_price = menu_item.discounted_price.unwrap_or(menu_item.price);
    let line_total = unit_price * f64::from(request.quantity);

    let (addons, total_addon_price) = match &request.addons {
        None | Some(Value::Null) => (None, 0.0),
        Some(Value::Array(list)) => {
            let sum: f64 = list
                .iter()
                .filter_map(|addon| addon.get("extraPrice").and_then(Value::as_f64))
                .sum();
            (Some(Value::Array(list.clone())), sum)
        }
        Some(_) => return Err(OrderError::InvalidAddons),
    };

    Ok(PricedLine {
        menu_item_id: request.menu_item_id,
        quantity: request.quantity,
        base_price: menu_item.price,
        addons,
        total_addon_price,
        total_price: line_total + total_addon_price,
    })
}

/// Derive order-level amounts from the priced lines.
pub fn order_totals(lines: &[PricedLine], distance: f64) -> Result<OrderTotals, OrderError> {
    if lines.is_empty() {
        return Err(OrderError::EmptyItems);
    }

    let items_amount: f64 = lines.iter().map(|line| line.total_price).sum();
    let gst = items_amount * GST_RATE;
    let delivery_fee = distance * DELIVERY_FEE_PER_KM;

    Ok(OrderTotals {
        items_amount,
        gst,
        delivery_fee,
        total_amount: items_amount + gst,
    })
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const EPS: f64 = 1e-9;

    fn menu_item(price: f64, discounted_price: Option<f64>) -> MenuItem {
        MenuItem {
            id: Uuid::new_v4(),
            restaurant_id: Uuid::new_v4(),
            name: "Paneer Tikka".to_string(),
            price,
            discounted_price,
            is_available: true,
        }
    }

    fn request(menu_item_id: Uuid, quantity: i32, addons: Option<Value>) -> OrderItemRequest {
        OrderItemRequest { menu_item_id, quantity, addons }
    }

    #[test]
    fn test_discounted_unit_price_times_quantity() {
        // items=[{quantity: 2, price: 100, discountedPrice: 90}], distance=5
        // => itemsAmount=180, gst=9, deliveryFee=0, totalAmount=189
        let item = menu_item(100.0, Some(90.0));
        let line = price_line(&item, &request(item.id, 2, None)).unwrap();

        assert!((line.total_price - 180.0).abs() < EPS);
        assert!((line.base_price - 100.0).abs() < EPS);

        let totals = order_totals(&[line], 5.0).unwrap();
        assert!((totals.items_amount - 180.0).abs() < EPS);
        assert!((totals.gst - 9.0).abs() < EPS);
        assert!((totals.delivery_fee - 0.0).abs() < EPS);
        assert!((totals.total_amount - 189.0).abs() < EPS);
    }

    #[test]
    fn test_falls_back_to_base_price_without_discount() {
        let item = menu_item(250.0, None);
        let line = price_line(&item, &request(item.id, 3, None)).unwrap();
        assert!((line.total_price - 750.0).abs() < EPS);
    }

    #[test]
    fn test_addon_prices_are_summed_and_snapshot_kept() {
        let item = menu_item(100.0, None);
        let addons = json!([
            { "name": "Extra cheese", "extraPrice": 30.0 },
            { "name": "Note only" },
            { "name": "Bad price", "extraPrice": "free" },
            { "name": "Coke", "extraPrice": 40 }
        ]);
        let line = price_line(&item, &request(item.id, 1, Some(addons.clone()))).unwrap();

        // Only numeric extraPrice values count
        assert!((line.total_addon_price - 70.0).abs() < EPS);
        assert!((line.total_price - 170.0).abs() < EPS);
        // Raw array stored verbatim
        assert_eq!(line.addons, Some(addons));
    }

    #[test]
    fn test_null_addons_is_no_addons() {
        let item = menu_item(100.0, None);
        let line = price_line(&item, &request(item.id, 1, Some(Value::Null))).unwrap();
        assert!(line.addons.is_none());
        assert!((line.total_addon_price - 0.0).abs() < EPS);
    }

    #[test]
    fn test_non_array_addons_rejected() {
        let item = menu_item(100.0, None);
        let result = price_line(&item, &request(item.id, 1, Some(json!({ "extraPrice": 10 }))));
        assert!(matches!(result, Err(OrderError::InvalidAddons)));
    }

    #[test]
    fn test_non_positive_quantity_rejected() {
        let item = menu_item(100.0, None);
        assert!(matches!(
            price_line(&item, &request(item.id, 0, None)),
            Err(OrderError::InvalidQuantity(0))
        ));
        assert!(matches!(
            price_line(&item, &request(item.id, -2, None)),
            Err(OrderError::InvalidQuantity(-2))
        ));
    }

    #[test]
    fn test_empty_order_rejected() {
        assert!(matches!(order_totals(&[], 3.0), Err(OrderError::EmptyItems)));
    }

    #[test]
    fn test_totals_invariants_over_mixed_lines() {
        let a = menu_item(120.0, Some(99.0));
        let b = menu_item(80.0, None);

        let lines = vec![
            price_line(&a, &request(a.id, 2, Some(json!([{ "extraPrice": 15.5 }])))).unwrap(),
            price_line(&b, &request(b.id, 1, None)).unwrap(),
        ];

        let expected_items: f64 = lines.iter().map(|l| l.total_price).sum();
        let totals = order_totals(&lines, 12.0).unwrap();

        assert!((totals.items_amount - expected_items).abs() < EPS);
        assert!((totals.gst - expected_items * GST_RATE).abs() < EPS);
        assert!((totals.total_amount - (totals.items_amount + totals.gst)).abs() < EPS);
    }

    #[test]
    fn test_item_addons_wire_alias() {
        let raw = json!({
            "menuItemId": Uuid::new_v4(),
            "quantity": 1,
            "item_addons": [{ "extraPrice": 5 }]
        });
        let parsed: OrderItemRequest = serde_json::from_value(raw).unwrap();
        assert!(parsed.addons.is_some());
    }
}
