//! Handler for `GET /`.

use axum::Json;
use serde_json::{Value, json};

/// `GET /` — liveness probe.
pub async fn handler() -> Json<Value> {
  Json(json!({
    "status":  "ok",
    "message": "Tether identity reconciliation API",
  }))
}
