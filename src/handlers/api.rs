use axum::response::Json;
use serde_json::{Value, json};

/// Root health check.
pub async fn health_check() -> Json<Value> {
    Json(json!({ "message": "Server is running" }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_health_check_message() {
        let Json(body) = health_check().await;
        assert_eq!(body["message"], "Server is running");
    }
}
