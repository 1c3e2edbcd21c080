use axum::response::Json;
use serde_json::{json, Value};

pub async fn root() -> &'static str {
    "Contact relay is running"
}

pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": env!("CARGO_PKG_NAME"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION")
    }))
}
