mod token_store;

pub use token_store::{MemoryTokenStore, RedisTokenStore, TokenStore};

use actix_web::{dev::Payload, http::header, web, FromRequest, HttpRequest};
use futures_util::future::LocalBoxFuture;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::order::Role;
use crate::errors::AppError;
use crate::state::AppState;

// ============================================================================
// Authenticated Principal
// ============================================================================

/// Identity attached to a validated session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Principal {
    pub id: Uuid,
    pub role: Role,
}

/// Extractor that resolves the Bearer token against the shared token store.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub Principal);

impl std::ops::Deref for AuthenticatedUser {
    type Target = Principal;

    fn deref(&self) -> &Principal {
        &self.0
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = AppError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let state = req.app_data::<web::Data<AppState>>().cloned();
        let header = req
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);

        Box::pin(async move {
            let state = state
                .ok_or_else(|| AppError::Internal(anyhow::anyhow!("AppState not configured")))?;

            let header =
                header.ok_or_else(|| AppError::unauthorized("No authorization token provided"))?;
            let token = header
                .strip_prefix("Bearer ")
                .ok_or_else(|| AppError::unauthorized("Invalid or expired token"))?;

            let principal_json = state
                .tokens
                .validate(token)
                .await?
                .ok_or_else(|| AppError::unauthorized("Invalid or expired token"))?;

            let principal: Principal = serde_json::from_str(&principal_json)
                .map_err(|_| AppError::unauthorized("Invalid or expired token"))?;

            Ok(AuthenticatedUser(principal))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_principal_roundtrip() {
        let principal = Principal {
            id: Uuid::new_v4(),
            role: Role::DeliveryPartner,
        };
        let json = serde_json::to_string(&principal).unwrap();
        assert!(json.contains("delivery_partner"));

        let parsed: Principal = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.id, principal.id);
        assert_eq!(parsed.role, Role::DeliveryPartner);
    }

    #[tokio::test]
    async fn test_principal_survives_token_store() {
        let store = MemoryTokenStore::default();
        let principal = Principal {
            id: Uuid::new_v4(),
            role: Role::Restaurant,
        };

        let json = serde_json::to_string(&principal).unwrap();
        store.store("tok", &json, Duration::from_secs(60)).await.unwrap();

        let loaded = store.validate("tok").await.unwrap().unwrap();
        let parsed: Principal = serde_json::from_str(&loaded).unwrap();
        assert_eq!(parsed.id, principal.id);
    }
}
