use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use chrono::{DateTime, Duration, Utc};

pub const DIAS_VIGENCIA: i64 = 30;

#[derive(Debug, Clone, Deserialize, Serialize, FromRow)]
pub struct Anuncio {
    pub id: i64,
    pub name: String,
    pub image_url: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Vencimiento a 30 días: solo informativo, la base no lo aplica
#[derive(Debug, Serialize)]
pub struct AnuncioView {
    #[serde(flatten)]
    pub anuncio: Anuncio,
    pub expira_el: DateTime<Utc>,
    pub dias_restantes: i64,
}

impl AnuncioView {
    pub fn at(anuncio: Anuncio, now: DateTime<Utc>) -> Self {
        let expira_el = anuncio.created_at + Duration::days(DIAS_VIGENCIA);
        let dias_restantes = (expira_el - now).num_days().max(0);
        Self { anuncio, expira_el, dias_restantes }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateAnuncioSchema {
    pub name: String,
    pub imagen: String,
    pub is_active: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateAnuncioSchema {
    pub name: Option<String>,
    pub imagen: Option<String>,
    pub is_active: Option<bool>,
}
