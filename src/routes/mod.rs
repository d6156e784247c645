use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::services::ServeDir;

use crate::{
    handlers::{
        anuncio, article, auth, banner, evento, hcd, header_image, health, sitemap, social,
        streaming, ticker, titulos, upload,
    },
    state::AppState,
    utils::jwt::{admin_middleware, auth_middleware},
};

// Imágenes en base64 de hasta 5MB ocupan ~6.7MB en el JSON
const BODY_LIMIT: usize = 8 * 1024 * 1024;

pub fn create_routes(state: AppState) -> Router {
    // 1. Rutas públicas (lectura para el sitio y el panel)
    let mut public_routes = Router::new()
        .route("/health", get(health::health_handler))
        .route("/sitemap.xml", get(sitemap::sitemap_handler))
        .route("/api/auth/register", post(auth::register_handler))
        .route("/api/auth/login", post(auth::login_handler))
        .route("/api/articles", get(article::list_articles_handler))
        .route("/api/articles/:slug", get(article::get_article_handler))
        .route("/api/anuncios", get(anuncio::list_anuncios_handler))
        .route("/api/banners", get(banner::list_banners_handler))
        .route("/api/header-images", get(header_image::list_header_images_handler))
        .route("/api/hcd", get(hcd::list_hcd_handler))
        .route("/api/ticker", get(ticker::list_textos_handler))
        .route("/api/eventos", get(evento::list_eventos_handler))
        .route("/api/streaming", get(streaming::list_streaming_handler))
        .route("/api/streaming/activo", get(streaming::active_streaming_handler))
        .route("/api/stream-videos", get(streaming::get_toggle_handler));

    if let Some(dir) = state.storage.local_dir() {
        public_routes = public_routes.nest_service("/uploads", ServeDir::new(dir));
    }

    // 2. Rutas de editores (redacción): requieren token válido
    let editor_routes = Router::new()
        .route("/api/articles", post(article::create_article_handler))
        .route("/api/admin/articles/:id", put(article::update_article_handler))
        .route("/api/upload", post(upload::upload_image_handler))
        .route("/api/titulos/sugerencias", post(titulos::suggest_titles_handler))
        .route("/api/post-social", post(social::post_social_handler))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    // 3. Rutas de admin: el resto de las altas, bajas y modificaciones
    let admin_routes = Router::new()
        .route("/api/admin/articles/:id", delete(article::delete_article_handler))
        .route("/api/admin/anuncios", post(anuncio::create_anuncio_handler))
        .route(
            "/api/admin/anuncios/:id",
            put(anuncio::update_anuncio_handler).delete(anuncio::delete_anuncio_handler),
        )
        .route("/api/admin/anuncios/:id/toggle", post(anuncio::toggle_anuncio_handler))
        .route("/api/admin/banners", post(banner::create_banner_handler))
        .route(
            "/api/admin/banners/:id",
            put(banner::update_banner_handler).delete(banner::delete_banner_handler),
        )
        .route("/api/admin/banners/:id/toggle", post(banner::toggle_banner_handler))
        .route("/api/admin/header-images", post(header_image::create_header_image_handler))
        .route(
            "/api/admin/header-images/:id",
            put(header_image::update_header_image_handler)
                .delete(header_image::delete_header_image_handler),
        )
        .route(
            "/api/admin/header-images/:id/toggle",
            post(header_image::toggle_header_image_handler),
        )
        .route("/api/admin/hcd", post(hcd::create_hcd_handler))
        .route(
            "/api/admin/hcd/:id",
            put(hcd::update_hcd_handler).delete(hcd::delete_hcd_handler),
        )
        .route("/api/admin/ticker", post(ticker::create_texto_handler))
        .route("/api/admin/ticker/:id", delete(ticker::delete_texto_handler))
        .route("/api/admin/eventos", post(evento::create_evento_handler))
        .route(
            "/api/admin/eventos/:id",
            put(evento::update_evento_handler).delete(evento::delete_evento_handler),
        )
        .route("/api/admin/streaming", post(streaming::create_streaming_handler))
        .route(
            "/api/admin/streaming/:id",
            put(streaming::update_streaming_handler).delete(streaming::delete_streaming_handler),
        )
        .route("/api/admin/streaming/:id/activar", post(streaming::activate_streaming_handler))
        .route(
            "/api/admin/streaming/:id/desactivar",
            post(streaming::deactivate_streaming_handler),
        )
        .route("/api/admin/stream-videos", put(streaming::update_toggle_handler))
        .route_layer(middleware::from_fn_with_state(state.clone(), admin_middleware));

    Router::new()
        .merge(public_routes)
        .merge(editor_routes)
        .merge(admin_routes)
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StorageConfig;
    use crate::state::test_support::{test_config, test_state, test_state_with, token};
    use crate::storage::{BUCKET_ANUNCIOS, BUCKET_BANNER, BUCKET_PUBLICIDAD, BUCKET_VIDEOS};
    use axum::{
        body::Body,
        http::{header, Method, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use std::path::{Path, PathBuf};
    use tower::ServiceExt;

    // PNG de 1x1
    const PNG_B64: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

    fn state_with_upload_dir() -> (AppState, PathBuf) {
        let dir = std::env::temp_dir().join(format!("cms-uploads-{}", uuid::Uuid::new_v4()));
        let mut config = test_config();
        config.storage = StorageConfig::Local {
            dir: dir.display().to_string(),
        };
        (test_state_with(config), dir)
    }

    fn stored_files(folder: &Path) -> Vec<String> {
        match std::fs::read_dir(folder) {
            Ok(entries) => entries
                .filter_map(|e| e.ok())
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .collect(),
            Err(_) => Vec::new(),
        }
    }

    async fn send(
        app: &Router,
        method: Method,
        path: &str,
        bearer: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(path);
        if let Some(t) = bearer {
            request = request.header(header::AUTHORIZATION, format!("Bearer {t}"));
        }
        let request = match body {
            Some(b) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(b.to_string())),
            None => request.body(Body::empty()),
        }
        .expect("request should build");

        let response = app.clone().oneshot(request).await.expect("router should respond");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body should read");
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn admin_routes_require_a_token() {
        let app = create_routes(test_state());
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/admin/anuncios",
            None,
            Some(json!({ "name": "Ferretería", "imagen": "https://cdn.example/a.png" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "No autorizado");
    }

    #[tokio::test]
    async fn editors_cannot_use_admin_routes() {
        let app = create_routes(test_state());
        let editor = token("editor");
        let (status, _) = send(&app, Method::DELETE, "/api/admin/articles/1", Some(&editor), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, _) = send(&app, Method::POST, "/api/admin/streaming/1/activar", Some(&editor), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn invalid_tokens_are_rejected() {
        let app = create_routes(test_state());
        let (status, _) = send(
            &app,
            Method::POST,
            "/api/titulos/sugerencias",
            Some("no-es-un-jwt"),
            Some(json!({ "title": "x", "text": "y" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn short_names_are_rejected_before_the_database() {
        let app = create_routes(test_state());
        let admin = token("admin");
        for (path, body) in [
            ("/api/admin/anuncios", json!({ "name": "ab", "imagen": "https://cdn.example/a.png" })),
            ("/api/admin/banners", json!({ "nombre": "ab", "imagen": "https://cdn.example/b.png" })),
            ("/api/admin/hcd", json!({ "nombre": "Sesión", "url": "no-es-url" })),
            ("/api/admin/ticker", json!({ "text": "  " })),
            ("/api/admin/streaming", json!({ "nombre": "Canal", "url": "ftp://cdn/x" })),
        ] {
            let (status, body) = send(&app, Method::POST, path, Some(&admin), Some(body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{path}");
            assert!(body["error"].as_str().is_some(), "{path}");
        }
    }

    #[tokio::test]
    async fn bad_image_data_uri_is_rejected() {
        let app = create_routes(test_state());
        let admin = token("admin");
        let (status, _) = send(
            &app,
            Method::POST,
            "/api/admin/anuncios",
            Some(&admin),
            Some(json!({ "name": "Ferretería", "imagen": "data:image/png;base64,@@@" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn event_end_before_start_is_rejected() {
        let app = create_routes(test_state());
        let admin = token("admin");
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/admin/eventos",
            Some(&admin),
            Some(json!({
                "titulo": "Feria del libro",
                "fecha_inicio": "2024-05-10T18:00:00Z",
                "fecha_fin": "2024-05-10T17:00:00Z"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("fecha de fin"));
    }

    #[tokio::test]
    async fn title_suggestions_need_twenty_characters() {
        let app = create_routes(test_state());
        let editor = token("editor");
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/titulos/sugerencias",
            Some(&editor),
            Some(json!({ "title": "Suba del dólar", "text": "Texto corto" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("20"));
    }

    #[tokio::test]
    async fn social_post_without_credentials_is_a_config_error() {
        let app = create_routes(test_state());
        let editor = token("editor");
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/post-social",
            Some(&editor),
            Some(json!({ "title": "Nuevo puente", "slug": "nuevo-puente", "imageUrl": null })),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"].as_str().unwrap().contains("META_ACCESS_TOKEN"));
    }

    #[tokio::test]
    async fn multipart_upload_goes_to_local_storage() {
        let app = create_routes(test_state());
        let editor = token("editor");
        let png = base64::Engine::decode(&base64::engine::general_purpose::STANDARD, PNG_B64).unwrap();

        let boundary = "limite-de-prueba";
        let mut body = Vec::new();
        body.extend_from_slice(
            format!("--{boundary}\r\nContent-Disposition: form-data; name=\"bucket\"\r\n\r\nbanner\r\n")
                .as_bytes(),
        );
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"pixel.png\"\r\n\
                 Content-Type: image/png\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(&png);
        body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/upload")
            .header(header::AUTHORIZATION, format!("Bearer {editor}"))
            .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={boundary}"))
            .body(Body::from(body))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value: Value = serde_json::from_slice(&bytes).unwrap();
        assert!(value["url"].as_str().unwrap().starts_with("/uploads/banner/"));
        assert_eq!(value["original_name"], "pixel.png");
    }

    #[tokio::test]
    async fn failed_writes_do_not_leave_uploaded_images() {
        let (state, dir) = state_with_upload_dir();
        let app = create_routes(state);
        let admin = token("admin");
        let png = format!("data:image/png;base64,{PNG_B64}");

        // El pool apunta a un puerto cerrado: la imagen se sube y la escritura falla
        for (method, path, bucket, body) in [
            (
                Method::POST,
                "/api/admin/anuncios",
                BUCKET_ANUNCIOS,
                json!({ "name": "Ferretería Central", "imagen": png.as_str() }),
            ),
            (Method::PUT, "/api/admin/banners/7", BUCKET_BANNER, json!({ "imagen": png.as_str() })),
            (
                Method::POST,
                "/api/admin/streaming",
                BUCKET_VIDEOS,
                json!({ "nombre": "Canal uno", "url": "https://cdn.example/live.m3u8", "imagen": png.as_str() }),
            ),
            (Method::PUT, "/api/admin/articles/3", BUCKET_PUBLICIDAD, json!({ "imagen": png.as_str() })),
            (Method::PUT, "/api/admin/eventos/5", BUCKET_PUBLICIDAD, json!({ "imagen": png.as_str() })),
        ] {
            let (status, body) = send(&app, method, path, Some(&admin), Some(body)).await;
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{path}: {body}");
            assert_eq!(stored_files(&dir.join(bucket)), Vec::<String>::new(), "{path}");
        }

        let _ = std::fs::remove_dir_all(dir);
    }
}
