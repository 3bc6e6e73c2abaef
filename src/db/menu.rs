use sqlx::PgPool;
use uuid::Uuid;

use crate::models::MenuItem;

const MENU_ITEM_COLUMNS: &str = "id, restaurant_id, name, price, discounted_price, is_available";

/// Menu Catalog lookup consumed by the Order Builder.
pub async fn find_menu_item(pool: &PgPool, id: Uuid) -> Result<Option<MenuItem>, sqlx::Error> {
    sqlx::query_as::<_, MenuItem>(&format!(
        "SELECT {MENU_ITEM_COLUMNS} FROM menu_items WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}
