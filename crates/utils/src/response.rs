use serde::{Deserialize, Serialize};

/// Envelope every JSON endpoint answers with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T, E = T> {
    success: bool,
    data: Option<T>,
    error_data: Option<E>,
    message: Option<String>,
}

impl<T, E> ApiResponse<T, E> {
    pub fn success(data: T) -> Self {
        ApiResponse {
            success: true,
            data: Some(data),
            message: None,
            error_data: None,
        }
    }

    pub fn success_with_message(data: T, message: impl Into<String>) -> Self {
        ApiResponse {
            success: true,
            data: Some(data),
            message: Some(message.into()),
            error_data: None,
        }
    }

    pub fn error(message: &str) -> Self {
        ApiResponse {
            success: false,
            data: None,
            message: Some(message.to_string()),
            error_data: None,
        }
    }

    pub fn error_with_data(message: &str, error_data: E) -> Self {
        ApiResponse {
            success: false,
            data: None,
            error_data: Some(error_data),
            message: Some(message.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn success_envelope_shape() {
        let value = serde_json::to_value(ApiResponse::<u32>::success(7)).unwrap();
        assert_eq!(
            value,
            json!({"success": true, "data": 7, "error_data": null, "message": null})
        );
    }

    #[test]
    fn error_envelope_carries_message() {
        let response = ApiResponse::<()>::error("Invalid job id");
        assert!(!response.is_success());
        assert_eq!(response.message(), Some("Invalid job id"));
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["data"], serde_json::Value::Null);
    }

    #[test]
    fn error_data_sits_beside_the_message() {
        let response = ApiResponse::<(), _>::error_with_data(
            "total_payment: expected a whole number",
            json!({"field": "total_payment"}),
        );
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(
            value,
            json!({
                "success": false,
                "data": null,
                "error_data": {"field": "total_payment"},
                "message": "total_payment: expected a whole number"
            })
        );
    }
}
