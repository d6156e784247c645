use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use chrono::{DateTime, Utc};

// Imágenes de cabecera del sitio público
#[derive(Debug, Clone, Deserialize, Serialize, FromRow)]
pub struct HeaderImage {
    pub id: i64,
    pub nombre: String,
    pub image_url: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateHeaderImageSchema {
    pub nombre: String,
    pub imagen: String,
    pub is_active: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateHeaderImageSchema {
    pub nombre: Option<String>,
    pub imagen: Option<String>,
    pub is_active: Option<bool>,
}
