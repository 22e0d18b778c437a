use serde::Serialize;
pub(crate) mod behavior_controller;
pub(crate) mod call_controller;
pub(crate) mod feedback_controller;
pub(crate) mod health_check_controller;
pub(crate) mod upload_controller;

#[derive(Debug, Serialize)]
struct ApiResponse<T: Serialize> {
    status_code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(status_code: u16, data: T) -> Self {
        Self {
            status_code,
            data: Some(data),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_serialize_api_response_with_some() {
        let response = ApiResponse {
            status_code: StatusCode::OK.into(),
            data: Some(23),
        };
        let serialized = serde_json::to_string(&response).unwrap();

        // Serializing and then deserializing because the string output from serde_json::to_string is
        // non-deterministic as far as the order of the JSON keys. This ensures the test won't be flaky
        let deserialized_value: serde_json::Value = serde_json::from_str(&serialized).unwrap();
        let deserialized_expected_value: serde_json::Value =
            json!({"data": 23, "status_code": 200});
        assert_eq!(deserialized_value, deserialized_expected_value);
    }

    #[tokio::test]
    async fn test_serialize_api_response_skips_missing_data() {
        let response = ApiResponse::<()> {
            status_code: StatusCode::NO_CONTENT.into(),
            data: None,
        };
        let serialized = serde_json::to_string(&response).unwrap();
        assert_eq!(serialized, json!({"status_code": 204}).to_string());
    }
}
