use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Deserialize, Serialize, FromRow)]
pub struct Banner {
    pub id: i64,
    pub nombre: String,
    pub image_url: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateBannerSchema {
    pub nombre: String,
    pub imagen: String,
    pub is_active: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateBannerSchema {
    pub nombre: Option<String>,
    pub imagen: Option<String>,
    pub is_active: Option<bool>,
}
