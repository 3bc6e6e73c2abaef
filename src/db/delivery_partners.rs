use sqlx::PgPool;
use uuid::Uuid;

use crate::models::DeliveryPartner;

const DP_COLUMNS: &str = "id, name, mobile, vehicle_type, status, is_live";

pub async fn find_delivery_partner(
    pool: &PgPool,
    id: Uuid,
) -> Result<Option<DeliveryPartner>, sqlx::Error> {
    sqlx::query_as::<_, DeliveryPartner>(&format!(
        "SELECT {DP_COLUMNS} FROM delivery_partners WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}
