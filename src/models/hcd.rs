use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use chrono::{DateTime, Utc};

// Enlace a un video de sesión del HCD. No guarda imágenes.
#[derive(Debug, Clone, Deserialize, Serialize, FromRow)]
pub struct Hcd {
    pub id: i64,
    pub nombre: String,
    pub url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateHcdSchema {
    pub nombre: String,
    pub url: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateHcdSchema {
    pub nombre: Option<String>,
    pub url: Option<String>,
}
