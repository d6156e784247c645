use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::state::AppState;

// GET /health (503 si la base no responde)
pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let (status, database) =
        match sqlx::query_scalar::<_, i32>("SELECT 1").fetch_one(&state.pool).await {
            Ok(_) => (StatusCode::OK, "ok"),
            Err(e) => {
                tracing::warn!("Health check sin base de datos: {}", e);
                (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
            }
        };
    (
        status,
        Json(json!({
            "status": if status.is_success() { "ok" } else { "degraded" },
            "database": database,
            "version": env!("CARGO_PKG_VERSION"),
        })),
    )
}
