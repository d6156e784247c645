use axum::{
    extract::{Json, State},
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;

use crate::{error::AppResult, services::titulos::suggest_titles, state::AppState};

#[derive(Debug, Deserialize)]
pub struct SugerenciasPayload {
    pub title: String,
    pub text: String,
}

// POST /api/titulos/sugerencias
pub async fn suggest_titles_handler(
    State(state): State<AppState>,
    Json(body): Json<SugerenciasPayload>,
) -> AppResult<impl IntoResponse> {
    let sugerencias = suggest_titles(&state.http, &state.config.ai, &body.title, &body.text).await?;
    Ok(Json(json!({ "sugerencias": sugerencias })))
}
