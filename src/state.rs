use std::sync::Arc;

use sqlx::PgPool;

use crate::auth::TokenStore;
use crate::messaging::BroadcastClient;
use crate::metrics::Metrics;

/// Shared infrastructure handed to every handler.
pub struct AppState {
    pub db: PgPool,
    pub broadcast: Arc<BroadcastClient>,
    pub tokens: Arc<dyn TokenStore>,
    pub metrics: Arc<Metrics>,
    pub broadcast_on_create: bool,
}
