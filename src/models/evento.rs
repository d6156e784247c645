use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Deserialize, Serialize, FromRow)]
pub struct Evento {
    pub id: i64,
    pub titulo: String,
    pub descripcion: Option<String>,
    pub lugar: Option<String>,
    pub fecha_inicio: DateTime<Utc>,
    pub fecha_fin: Option<DateTime<Utc>>,
    pub imagen: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateEventoSchema {
    pub titulo: String,
    pub descripcion: Option<String>,
    pub lugar: Option<String>,
    pub fecha_inicio: DateTime<Utc>,
    pub fecha_fin: Option<DateTime<Utc>>,
    pub imagen: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateEventoSchema {
    pub titulo: Option<String>,
    pub descripcion: Option<String>,
    pub lugar: Option<String>,
    pub fecha_inicio: Option<DateTime<Utc>>,
    pub fecha_fin: Option<DateTime<Utc>>,
    pub imagen: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct EventoFilter {
    // Solo eventos que aún no terminaron
    pub proximos: Option<bool>,
}
