use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use chrono::{DateTime, Utc};

// Solo alta y baja, los textos no se editan
#[derive(Debug, Clone, Deserialize, Serialize, FromRow)]
pub struct TextoTicker {
    pub id: i64,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateTextoTickerSchema {
    pub text: String,
}
