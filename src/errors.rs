use actix_web::{http::StatusCode, HttpResponse, ResponseError};

use crate::domain::order::OrderError;

// ============================================================================
// HTTP Error Taxonomy
// ============================================================================
//
// Every handler returns Result<HttpResponse, AppError>; no failure crosses
// the HTTP boundary unformatted. Internal errors keep their diagnostics in
// the log and hand the caller a generic message.
//
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }
}

impl From<OrderError> for AppError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::MenuItemNotFound(_) => AppError::NotFound(err.to_string()),
            OrderError::EmptyItems
            | OrderError::InvalidQuantity(_)
            | OrderError::InvalidAddons => AppError::Validation(err.to_string()),
            OrderError::InvalidStatusTransition { .. } | OrderError::AlreadyAssigned => {
                AppError::Conflict(err.to_string())
            }
            OrderError::PartnerMismatch => AppError::Forbidden(err.to_string()),
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Internal(err.into())
    }
}

impl From<redis::RedisError> for AppError {
    fn from(err: redis::RedisError) -> Self {
        AppError::Internal(err.into())
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let AppError::Internal(source) = self {
            tracing::error!(error = ?source, "Unhandled internal error");
        }

        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "success": false,
            "message": self.to_string(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::OrderStatus;
    use uuid::Uuid;

    #[test]
    fn test_status_codes() {
        assert_eq!(AppError::validation("x").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::unauthorized("x").status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::forbidden("x").status_code(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::not_found("x").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::conflict("x").status_code(), StatusCode::CONFLICT);
        assert_eq!(
            AppError::Internal(anyhow::anyhow!("boom")).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_domain_errors_map_to_taxonomy() {
        let id = Uuid::new_v4();
        assert!(matches!(
            AppError::from(OrderError::MenuItemNotFound(id)),
            AppError::NotFound(_)
        ));
        assert!(matches!(
            AppError::from(OrderError::InvalidAddons),
            AppError::Validation(_)
        ));
        assert!(matches!(
            AppError::from(OrderError::invalid_transition(
                OrderStatus::Pending,
                OrderStatus::Delivered
            )),
            AppError::Conflict(_)
        ));
        assert!(matches!(
            AppError::from(OrderError::AlreadyAssigned),
            AppError::Conflict(_)
        ));
        assert!(matches!(
            AppError::from(OrderError::PartnerMismatch),
            AppError::Forbidden(_)
        ));
    }

    #[test]
    fn test_internal_error_message_is_generic() {
        let err = AppError::Internal(anyhow::anyhow!("connection refused to 10.0.0.3:5432"));
        assert_eq!(err.to_string(), "Internal server error");
    }

    #[test]
    fn test_not_found_reports_which_menu_item() {
        let id = Uuid::new_v4();
        let err = AppError::from(OrderError::MenuItemNotFound(id));
        assert!(err.to_string().contains(&id.to_string()));
    }
}
