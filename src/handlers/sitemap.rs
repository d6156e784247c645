use axum::{
    extract::State,
    http::header,
    response::IntoResponse,
};

use crate::{
    error::{AppError, AppResult},
    models::article::ArticleSlug,
    state::AppState,
};

fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Arma el sitemap: primero la portada y después una entrada por noticia.
pub fn render_sitemap(site_url: &str, articles: &[ArticleSlug]) -> String {
    let base = site_url.trim_end_matches('/');
    let mut xml = String::with_capacity(256 + articles.len() * 160);
    xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    xml.push_str("<urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n");

    xml.push_str("  <url>\n");
    xml.push_str(&format!("    <loc>{}/</loc>\n", xml_escape(base)));
    xml.push_str("    <changefreq>hourly</changefreq>\n");
    xml.push_str("    <priority>1.0</priority>\n");
    xml.push_str("  </url>\n");

    for article in articles {
        xml.push_str("  <url>\n");
        xml.push_str(&format!(
            "    <loc>{}/noticia/{}</loc>\n",
            xml_escape(base),
            xml_escape(&article.slug)
        ));
        xml.push_str(&format!(
            "    <lastmod>{}</lastmod>\n",
            article.updated_at.format("%Y-%m-%d")
        ));
        xml.push_str("    <changefreq>daily</changefreq>\n");
        xml.push_str("    <priority>0.8</priority>\n");
        xml.push_str("  </url>\n");
    }

    xml.push_str("</urlset>\n");
    xml
}

// GET /sitemap.xml
pub async fn sitemap_handler(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let articles = sqlx::query_as::<_, ArticleSlug>(
        "SELECT slug, updated_at FROM articles ORDER BY updated_at DESC",
    )
    .fetch_all(&state.pool)
    .await
    .map_err(|e| AppError::from_db("articles", e))?;

    tracing::debug!("Sitemap generado con {} noticias", articles.len());
    Ok((
        [(header::CONTENT_TYPE, "application/xml; charset=utf-8")],
        render_sitemap(&state.config.site_url, &articles),
    ))
}
