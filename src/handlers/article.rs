use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::article::{Article, CreateArticleSchema, UpdateArticleSchema},
    state::AppState,
    storage::BUCKET_PUBLICIDAD,
    utils::{
        slug::slugify,
        validation::{optional_image, text_len},
    },
};

const TABLE: &str = "articles";
const COLUMNS: &str = "id, title, slug, text, image_url, is_featured, created_at, updated_at";

#[derive(Debug, Default, Deserialize)]
pub struct FilterOptions {
    pub search: Option<String>,
    pub destacadas: Option<bool>,
}

fn not_found() -> AppError {
    AppError::NotFound("Noticia no encontrada".to_string())
}

// "%texto%" con los comodines de LIKE del usuario escapados
fn contains_pattern(search: &str) -> String {
    let mut pattern = String::with_capacity(search.len() + 2);
    pattern.push('%');
    for c in search.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn check_text(text: &str) -> AppResult<String> {
    text_len("text", text, 1, 100_000)
}

// GET /api/articles (?search=texto&destacadas=true)
pub async fn list_articles_handler(
    State(state): State<AppState>,
    Query(opts): Query<FilterOptions>,
) -> AppResult<impl IntoResponse> {
    let pattern = opts
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(contains_pattern);

    // Busca en cualquier parte del título o del cuerpo
    let articles = sqlx::query_as::<_, Article>(&format!(
        r"SELECT {COLUMNS} FROM articles
         WHERE ($1::text IS NULL OR title ILIKE $1 ESCAPE '\' OR text ILIKE $1 ESCAPE '\')
           AND ($2::bool IS NULL OR is_featured = $2)
         ORDER BY created_at DESC
         LIMIT 50"
    ))
    .bind(pattern)
    .bind(opts.destacadas)
    .fetch_all(&state.pool)
    .await
    .map_err(|e| AppError::from_db(TABLE, e))?;

    Ok(Json(articles))
}

// GET /api/articles/:slug
pub async fn get_article_handler(
    Path(slug): Path<String>,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let article = sqlx::query_as::<_, Article>(&format!(
        "SELECT {COLUMNS} FROM articles WHERE slug = $1"
    ))
    .bind(&slug)
    .fetch_optional(&state.pool)
    .await
    .map_err(|e| AppError::from_db(TABLE, e))?
    .ok_or_else(not_found)?;

    Ok(Json(article))
}

// POST /api/articles
pub async fn create_article_handler(
    State(state): State<AppState>,
    Json(body): Json<CreateArticleSchema>,
) -> AppResult<impl IntoResponse> {
    let title = text_len("title", &body.title, 3, 200)?;
    let text = check_text(&body.text)?;
    let imagen = optional_image("imagen", body.imagen.as_deref())?;
    let resolved = state.resolve_optional_image(BUCKET_PUBLICIDAD, imagen).await?;
    let image_url = resolved.as_ref().map(|i| i.url.as_str());

    let mut slug = slugify(&title);
    if slug.is_empty() {
        slug = format!("noticia-{}", Uuid::new_v4().simple());
    }

    let inserted = insert_article(&state, &title, &slug, &text, image_url, body.is_featured).await;
    // Título repetido: agregamos un sufijo corto para no chocar con el slug único
    let inserted = match inserted {
        Err(AppError::Conflict(_)) => {
            let suffix = Uuid::new_v4().simple().to_string();
            let slug = format!("{slug}-{}", &suffix[..8]);
            insert_article(&state, &title, &slug, &text, image_url, body.is_featured).await
        }
        other => other,
    };
    let article = state.discard_on_error(resolved.as_ref(), inserted).await?;

    tracing::info!("Noticia {} creada con slug {}", article.id, article.slug);
    Ok((StatusCode::CREATED, Json(article)))
}

async fn insert_article(
    state: &AppState,
    title: &str,
    slug: &str,
    text: &str,
    image_url: Option<&str>,
    is_featured: Option<bool>,
) -> AppResult<Article> {
    sqlx::query_as::<_, Article>(&format!(
        "INSERT INTO articles (title, slug, text, image_url, is_featured)
         VALUES ($1, $2, $3, $4, $5)
         RETURNING {COLUMNS}"
    ))
    .bind(title)
    .bind(slug)
    .bind(text)
    .bind(image_url)
    .bind(is_featured.unwrap_or(false))
    .fetch_one(&state.pool)
    .await
    .map_err(|e| AppError::from_db(TABLE, e))
}

// PUT /api/admin/articles/:id
pub async fn update_article_handler(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Json(body): Json<UpdateArticleSchema>,
) -> AppResult<impl IntoResponse> {
    let title = body.title.as_deref().map(|t| text_len("title", t, 3, 200)).transpose()?;
    let text = body.text.as_deref().map(check_text).transpose()?;
    let imagen = optional_image("imagen", body.imagen.as_deref())?;
    let resolved = state.resolve_optional_image(BUCKET_PUBLICIDAD, imagen).await?;

    // COALESCE($1, title): si no envían el campo, queda el valor guardado.
    // El slug no cambia para no romper enlaces ya publicados.
    let updated = sqlx::query_as::<_, Article>(&format!(
        "UPDATE articles SET
            title = COALESCE($1, title),
            text = COALESCE($2, text),
            image_url = COALESCE($3, image_url),
            is_featured = COALESCE($4, is_featured),
            updated_at = NOW()
         WHERE id = $5
         RETURNING {COLUMNS}"
    ))
    .bind(title)
    .bind(text)
    .bind(resolved.as_ref().map(|i| i.url.as_str()))
    .bind(body.is_featured)
    .bind(id)
    .fetch_optional(&state.pool)
    .await
    .map_err(|e| AppError::from_db(TABLE, e))
    .and_then(|row| row.ok_or_else(not_found));
    let article = state.discard_on_error(resolved.as_ref(), updated).await?;

    Ok(Json(article))
}

// DELETE /api/admin/articles/:id
pub async fn delete_article_handler(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let result = sqlx::query("DELETE FROM articles WHERE id = $1")
        .bind(id)
        .execute(&state.pool)
        .await
        .map_err(|e| AppError::from_db(TABLE, e))?;

    if result.rows_affected() == 0 {
        return Err(not_found());
    }
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_wildcards_are_escaped() {
        assert_eq!(contains_pattern("dólar"), "%dólar%");
        assert_eq!(contains_pattern("100%"), r"%100\%%");
        assert_eq!(contains_pattern("a_b"), r"%a\_b%");
        assert_eq!(contains_pattern(r"c:\tmp"), r"%c:\\tmp%");
    }
}
