use actix_web::HttpResponse;
use serde::Serialize;

// ============================================================================
// Response Envelope
// ============================================================================
//
// Every endpoint answers `{success, message, data?}`; failures render the
// same envelope through AppError.
//
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

/// 200 with payload.
pub fn ok<T: Serialize>(data: T, message: &str) -> HttpResponse {
    HttpResponse::Ok().json(ApiResponse {
        success: true,
        message: message.to_string(),
        data: Some(data),
    })
}

/// 201 with payload.
pub fn created<T: Serialize>(data: T, message: &str) -> HttpResponse {
    HttpResponse::Created().json(ApiResponse {
        success: true,
        message: message.to_string(),
        data: Some(data),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_shape() {
        let envelope = ApiResponse {
            success: true,
            message: "Order created successfully".to_string(),
            data: Some(serde_json::json!({ "orderId": "abc" })),
        };
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["message"], "Order created successfully");
        assert_eq!(json["data"]["orderId"], "abc");
    }

    #[test]
    fn test_data_omitted_when_absent() {
        let envelope: ApiResponse<serde_json::Value> = ApiResponse {
            success: true,
            message: "ok".to_string(),
            data: None,
        };
        let json = serde_json::to_value(&envelope).unwrap();
        assert!(json.get("data").is_none());
    }
}
