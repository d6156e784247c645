use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use chrono::{DateTime, Utc};

use crate::player::PlayerSource;

#[derive(Debug, Clone, Deserialize, Serialize, FromRow)]
pub struct Streaming {
    pub id: i64,
    pub nombre: String,
    pub url: String,
    pub imagen: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateStreamingSchema {
    pub nombre: String,
    pub url: String,
    pub imagen: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateStreamingSchema {
    pub nombre: Option<String>,
    pub url: Option<String>,
    pub imagen: Option<String>,
}

// Fila singleton de "stream-videos": ¿mostramos el vivo o los videos?
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, FromRow)]
pub struct StreamToggle {
    pub is_auto: bool,
    pub stream: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateStreamToggleSchema {
    pub is_auto: Option<bool>,
    pub stream: Option<bool>,
}

// Lo que consume el reproductor público
#[derive(Debug, Serialize)]
pub struct ActiveStreamResponse {
    pub streaming: Streaming,
    pub player: PlayerSource,
    pub toggle: Option<StreamToggle>,
}
