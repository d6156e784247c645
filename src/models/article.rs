use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use chrono::{DateTime, Utc};

// Fila completa de la tabla articles
#[derive(Debug, Clone, Deserialize, Serialize, FromRow)]
pub struct Article {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub text: String,
    pub image_url: Option<String>,
    pub is_featured: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Lo mínimo que necesita el sitemap
#[derive(Debug, Clone, FromRow)]
pub struct ArticleSlug {
    pub slug: String,
    pub updated_at: DateTime<Utc>,
}

// Lo que envía el editor al crear una noticia
#[derive(Debug, Deserialize)]
pub struct CreateArticleSchema {
    pub title: String,
    pub text: String,
    // URL publicada o data URI (se sube al bucket de publicidad)
    pub imagen: Option<String>,
    pub is_featured: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateArticleSchema {
    pub title: Option<String>,
    pub text: Option<String>,
    pub imagen: Option<String>,
    pub is_featured: Option<bool>,
}
