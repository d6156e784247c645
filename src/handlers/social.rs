use axum::{
    extract::{Json, State},
    response::IntoResponse,
};

use crate::{
    error::AppResult,
    services::social::{SocialClient, SocialPostPayload},
    state::AppState,
    utils::validation::text_len,
};

// POST /api/post-social
pub async fn post_social_handler(
    State(state): State<AppState>,
    Json(body): Json<SocialPostPayload>,
) -> AppResult<impl IntoResponse> {
    // Sin credenciales respondemos error enseguida, sin tocar la red
    let client = SocialClient::from_config(state.http.clone(), &state.config.social)?;
    text_len("title", &body.title, 3, 300)?;
    text_len("slug", &body.slug, 1, 300)?;

    let result = client.publish(&body, &state.config.site_url).await;
    Ok(Json(result))
}
