use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{config::SocialConfig, error::AppError};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialPostPayload {
    pub title: String,
    pub excerpt: Option<String>,
    pub slug: String,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlatformResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<Result<String, SocialError>> for PlatformResult {
    fn from(result: Result<String, SocialError>) -> Self {
        match result {
            Ok(id) => PlatformResult { success: true, id: Some(id), error: None },
            Err(e) => PlatformResult { success: false, id: None, error: Some(e.to_string()) },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PlatformResults {
    pub facebook: PlatformResult,
    pub instagram: PlatformResult,
}

#[derive(Debug, Serialize)]
pub struct SocialPostResult {
    // Alcanza con que una red haya publicado
    pub success: bool,
    pub results: PlatformResults,
}

#[derive(Debug, thiserror::Error)]
pub enum SocialError {
    #[error("error de red: {0}")]
    Request(#[from] reqwest::Error),
    #[error("la API respondió {status}: {message}")]
    Api { status: u16, message: String },
    #[error("{0}")]
    InvalidImage(String),
    #[error("respuesta sin id")]
    MissingId,
}

pub struct SocialClient {
    http: reqwest::Client,
    graph_url: String,
    access_token: String,
    page_id: String,
    instagram_id: String,
}

impl SocialClient {
    pub fn from_config(http: reqwest::Client, config: &SocialConfig) -> Result<Self, AppError> {
        let missing = |name: &str| AppError::Config(format!("{name} no está configurado"));
        Ok(Self {
            http,
            graph_url: config.graph_api_url.trim_end_matches('/').to_string(),
            access_token: config.access_token.clone().ok_or_else(|| missing("META_ACCESS_TOKEN"))?,
            page_id: config.facebook_page_id.clone().ok_or_else(|| missing("FACEBOOK_PAGE_ID"))?,
            instagram_id: config
                .instagram_account_id
                .clone()
                .ok_or_else(|| missing("INSTAGRAM_ACCOUNT_ID"))?,
        })
    }

    /// Publica en ambas redes en paralelo. El fallo de una no afecta a la otra.
    pub async fn publish(&self, post: &SocialPostPayload, site_url: &str) -> SocialPostResult {
        let link = format!("{}/noticia/{}", site_url.trim_end_matches('/'), post.slug);
        let message = compose_message(post, Some(&link));
        let caption = compose_message(post, None);

        let (facebook, instagram) = tokio::join!(
            self.publish_facebook(&message, &link),
            self.publish_instagram(post.image_url.as_deref(), &caption),
        );

        match &facebook {
            Ok(id) => tracing::info!("Publicado en Facebook: {}", id),
            Err(e) => tracing::warn!("Falló la publicación en Facebook: {}", e),
        }
        match &instagram {
            Ok(id) => tracing::info!("Publicado en Instagram: {}", id),
            Err(e) => tracing::warn!("Falló la publicación en Instagram: {}", e),
        }

        let results = PlatformResults {
            facebook: facebook.into(),
            instagram: instagram.into(),
        };
        SocialPostResult {
            success: results.facebook.success || results.instagram.success,
            results,
        }
    }

    async fn publish_facebook(&self, message: &str, link: &str) -> Result<String, SocialError> {
        self.graph_post(
            &format!("{}/feed", self.page_id),
            json!({ "message": message, "link": link, "access_token": self.access_token }),
        )
        .await
    }

    async fn publish_instagram(&self, image_url: Option<&str>, caption: &str) -> Result<String, SocialError> {
        let image_url = check_instagram_image(image_url)?;
        let creation_id = self
            .graph_post(
                &format!("{}/media", self.instagram_id),
                json!({ "image_url": image_url, "caption": caption, "access_token": self.access_token }),
            )
            .await?;
        self.graph_post(
            &format!("{}/media_publish", self.instagram_id),
            json!({ "creation_id": creation_id, "access_token": self.access_token }),
        )
        .await
    }

    async fn graph_post(&self, path: &str, body: Value) -> Result<String, SocialError> {
        let response = self
            .http
            .post(format!("{}/{}", self.graph_url, path))
            .json(&body)
            .send()
            .await?;
        let status = response.status();
        let payload: Value = response.json().await.unwrap_or(Value::Null);

        if !status.is_success() {
            let message = payload["error"]["message"]
                .as_str()
                .unwrap_or("sin detalle")
                .to_string();
            return Err(SocialError::Api { status: status.as_u16(), message });
        }
        payload["id"]
            .as_str()
            .map(ToString::to_string)
            .ok_or(SocialError::MissingId)
    }
}

// Instagram exige una imagen real accesible públicamente
pub fn check_instagram_image(image_url: Option<&str>) -> Result<&str, SocialError> {
    match image_url.map(str::trim).filter(|u| !u.is_empty()) {
        None => Err(SocialError::InvalidImage(
            "Instagram requiere una imagen para publicar".to_string(),
        )),
        Some(url) if url.contains("placehold.co") => Err(SocialError::InvalidImage(
            "Instagram no acepta imágenes de placeholder".to_string(),
        )),
        Some(url) if !url.starts_with("http") => Err(SocialError::InvalidImage(
            "La imagen debe ser una URL pública".to_string(),
        )),
        Some(url) => Ok(url),
    }
}

pub fn compose_message(post: &SocialPostPayload, link: Option<&str>) -> String {
    let mut parts = vec![post.title.trim().to_string()];
    if let Some(excerpt) = post.excerpt.as_deref().map(str::trim).filter(|e| !e.is_empty()) {
        parts.push(excerpt.to_string());
    }
    if let Some(link) = link {
        parts.push(link.to_string());
    }
    parts.join("\n\n")
}
