use std::path::PathBuf;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use mime::Mime;
use tokio::fs;
use uuid::Uuid;

use crate::config::StorageConfig;

pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024; // 5MB

// Buckets usados por cada sección del panel
pub const BUCKET_ANUNCIOS: &str = "imagenes-anuncios";
pub const BUCKET_PUBLICIDAD: &str = "publicidad";
pub const BUCKET_BANNER: &str = "banner";
pub const BUCKET_HEADER: &str = "header-images";
pub const BUCKET_VIDEOS: &str = "imagenvideos";

pub const BUCKETS: &[&str] = &[
    BUCKET_ANUNCIOS,
    BUCKET_PUBLICIDAD,
    BUCKET_BANNER,
    BUCKET_HEADER,
    BUCKET_VIDEOS,
];

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("imagen inválida: {0}")]
    InvalidDataUri(String),
    #[error("el almacenamiento rechazó la subida: {0}")]
    Storage(String),
    #[error("no se pudo obtener la URL pública de {0}")]
    PublicUrl(String),
    #[error("error de red: {0}")]
    Request(#[from] reqwest::Error),
    #[error("error de disco: {0}")]
    Io(#[from] std::io::Error),
}

/// Objeto subido a un bucket y su URL pública.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub bucket: String,
    pub name: String,
    pub url: String,
}

/// Imagen ya decodificada lista para subir.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub mime: Mime,
    pub bytes: Vec<u8>,
}

impl DecodedImage {
    pub fn extension(&self) -> &'static str {
        extension_for(&self.mime).unwrap_or("jpg")
    }
}

// Solo imágenes comunes (jpg, png, webp, gif)
pub fn extension_for(mime: &Mime) -> Option<&'static str> {
    if mime.type_() != mime::IMAGE {
        return None;
    }
    match mime.subtype().as_str() {
        "jpeg" | "jpg" => Some("jpg"),
        "png" => Some("png"),
        "webp" => Some("webp"),
        "gif" => Some("gif"),
        _ => None,
    }
}

pub fn check_image(mime: Mime, bytes: Vec<u8>) -> Result<DecodedImage, UploadError> {
    if extension_for(&mime).is_none() {
        return Err(UploadError::InvalidDataUri(
            "solo se permiten imágenes (jpg, png, webp, gif)".to_string(),
        ));
    }
    if bytes.is_empty() {
        return Err(UploadError::InvalidDataUri("la imagen está vacía".to_string()));
    }
    if bytes.len() > MAX_IMAGE_BYTES {
        return Err(UploadError::InvalidDataUri(
            "la imagen excede el tamaño máximo de 5MB".to_string(),
        ));
    }
    Ok(DecodedImage { mime, bytes })
}

/// Decodifica `data:image/png;base64,....`
pub fn decode_data_uri(data_uri: &str) -> Result<DecodedImage, UploadError> {
    let rest = data_uri
        .strip_prefix("data:")
        .ok_or_else(|| UploadError::InvalidDataUri("falta el prefijo data:".to_string()))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| UploadError::InvalidDataUri("falta la coma separadora".to_string()))?;
    let mime_str = header
        .strip_suffix(";base64")
        .ok_or_else(|| UploadError::InvalidDataUri("no está codificada en base64".to_string()))?;
    let mime: Mime = mime_str
        .parse()
        .map_err(|_| UploadError::InvalidDataUri(format!("tipo MIME desconocido: {mime_str}")))?;
    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|e| UploadError::InvalidDataUri(format!("base64 corrupto: {e}")))?;
    check_image(mime, bytes)
}

#[derive(Debug, Clone)]
pub enum ObjectStorage {
    Supabase {
        http: reqwest::Client,
        base_url: String,
        anon_key: String,
    },
    Local {
        dir: PathBuf,
    },
}

impl ObjectStorage {
    pub fn from_config(config: &StorageConfig, http: reqwest::Client) -> Self {
        match config {
            StorageConfig::Supabase { base_url, anon_key } => ObjectStorage::Supabase {
                http,
                base_url: base_url.clone(),
                anon_key: anon_key.clone(),
            },
            StorageConfig::Local { dir } => ObjectStorage::Local {
                dir: PathBuf::from(dir),
            },
        }
    }

    pub fn local_dir(&self) -> Option<&PathBuf> {
        match self {
            ObjectStorage::Local { dir } => Some(dir),
            ObjectStorage::Supabase { .. } => None,
        }
    }

    pub fn public_url(&self, bucket: &str, name: &str) -> String {
        match self {
            ObjectStorage::Supabase { base_url, .. } => {
                format!("{base_url}/storage/v1/object/public/{bucket}/{name}")
            }
            ObjectStorage::Local { .. } => format!("/uploads/{bucket}/{name}"),
        }
    }

    pub async fn put(&self, bucket: &str, name: &str, image: &DecodedImage) -> Result<(), UploadError> {
        match self {
            ObjectStorage::Supabase { http, base_url, anon_key } => {
                let response = http
                    .post(format!("{base_url}/storage/v1/object/{bucket}/{name}"))
                    .header("apikey", anon_key)
                    .bearer_auth(anon_key)
                    .header(reqwest::header::CONTENT_TYPE, image.mime.as_ref())
                    .header("x-upsert", "false")
                    .body(image.bytes.clone())
                    .send()
                    .await?;
                if !response.status().is_success() {
                    let status = response.status();
                    let body = response.text().await.unwrap_or_default();
                    return Err(UploadError::Storage(format!("{status}: {body}")));
                }
                Ok(())
            }
            ObjectStorage::Local { dir } => {
                let folder = dir.join(bucket);
                fs::create_dir_all(&folder).await?;
                fs::write(folder.join(name), &image.bytes).await?;
                Ok(())
            }
        }
    }

    // Comprueba que la URL pública realmente sirve el objeto
    pub async fn verify(&self, bucket: &str, name: &str) -> Result<String, UploadError> {
        let url = self.public_url(bucket, name);
        match self {
            ObjectStorage::Supabase { http, .. } => {
                let response = http.head(&url).send().await?;
                if !response.status().is_success() {
                    return Err(UploadError::PublicUrl(format!("{bucket}/{name}")));
                }
            }
            ObjectStorage::Local { dir } => {
                if !fs::try_exists(dir.join(bucket).join(name)).await? {
                    return Err(UploadError::PublicUrl(format!("{bucket}/{name}")));
                }
            }
        }
        Ok(url)
    }

    pub async fn remove(&self, bucket: &str, name: &str) -> Result<(), UploadError> {
        match self {
            ObjectStorage::Supabase { http, base_url, anon_key } => {
                let response = http
                    .delete(format!("{base_url}/storage/v1/object/{bucket}/{name}"))
                    .header("apikey", anon_key)
                    .bearer_auth(anon_key)
                    .send()
                    .await?;
                if !response.status().is_success() {
                    return Err(UploadError::Storage(format!("borrado {}", response.status())));
                }
                Ok(())
            }
            ObjectStorage::Local { dir } => {
                fs::remove_file(dir.join(bucket).join(name)).await?;
                Ok(())
            }
        }
    }

    /// Sube la imagen con nombre aleatorio y devuelve el objeto con su URL pública.
    /// Si la URL no se puede confirmar, intenta borrar el objeto recién subido.
    pub async fn upload_image(&self, bucket: &str, image: &DecodedImage) -> Result<StoredObject, UploadError> {
        let name = format!("{}.{}", Uuid::new_v4(), image.extension());
        self.put(bucket, &name, image).await?;

        match self.verify(bucket, &name).await {
            Ok(url) => {
                tracing::debug!("Imagen subida a {}/{}", bucket, name);
                Ok(StoredObject {
                    bucket: bucket.to_string(),
                    name,
                    url,
                })
            }
            Err(e) => {
                tracing::warn!("URL pública no disponible para {}/{}: {}", bucket, name, e);
                if let Err(cleanup) = self.remove(bucket, &name).await {
                    tracing::error!("No se pudo limpiar {}/{}: {}", bucket, name, cleanup);
                }
                Err(e)
            }
        }
    }

    pub async fn upload_data_uri(&self, bucket: &str, data_uri: &str) -> Result<StoredObject, UploadError> {
        let image = decode_data_uri(data_uri)?;
        self.upload_image(bucket, &image).await
    }

    // Borrado sin propagar errores: solo se registran
    pub async fn discard(&self, object: &StoredObject) {
        match self.remove(&object.bucket, &object.name).await {
            Ok(()) => tracing::debug!("Objeto {}/{} descartado", object.bucket, object.name),
            Err(e) => tracing::error!("No se pudo limpiar {}/{}: {}", object.bucket, object.name, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::{Path, State};
    use axum::http::StatusCode;
    use axum::routing::{head, post};
    use axum::Router;
    use std::sync::{Arc, Mutex};

    // PNG de 1x1
    const PNG_B64: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

    #[test]
    fn decode_png_data_uri() {
        let image = decode_data_uri(&format!("data:image/png;base64,{PNG_B64}")).expect("valid");
        assert_eq!(image.mime, mime::IMAGE_PNG);
        assert_eq!(image.extension(), "png");
        assert!(image.bytes.starts_with(&[0x89, b'P', b'N', b'G']));
    }

    #[test]
    fn jpeg_maps_to_jpg_extension() {
        let mime: Mime = "image/jpeg".parse().unwrap();
        assert_eq!(extension_for(&mime), Some("jpg"));
        let svg: Mime = "image/svg+xml".parse().unwrap();
        assert_eq!(extension_for(&svg), None);
    }

    #[test]
    fn rejects_malformed_data_uris() {
        assert!(decode_data_uri("image/png;base64,abc").is_err());
        assert!(decode_data_uri("data:image/png,abc").is_err());
        assert!(decode_data_uri("data:image/png;base64,@@@").is_err());
        assert!(decode_data_uri("data:text/plain;base64,aG9sYQ==").is_err());
        assert!(decode_data_uri("data:image/png;base64,").is_err());
    }

    #[test]
    fn rejects_oversized_images() {
        let big = vec![0u8; MAX_IMAGE_BYTES + 1];
        assert!(check_image(mime::IMAGE_PNG, big).is_err());
    }

    #[derive(Clone, Default)]
    struct FakeStorage {
        uploaded: Arc<Mutex<Vec<String>>>,
        deleted: Arc<Mutex<Vec<String>>>,
        public_ok: bool,
    }

    async fn put_object(
        State(state): State<FakeStorage>,
        Path((bucket, name)): Path<(String, String)>,
    ) -> StatusCode {
        state.uploaded.lock().unwrap().push(format!("{bucket}/{name}"));
        StatusCode::OK
    }

    async fn delete_object(
        State(state): State<FakeStorage>,
        Path((bucket, name)): Path<(String, String)>,
    ) -> StatusCode {
        state.deleted.lock().unwrap().push(format!("{bucket}/{name}"));
        StatusCode::OK
    }

    async fn head_public(State(state): State<FakeStorage>) -> StatusCode {
        if state.public_ok {
            StatusCode::OK
        } else {
            StatusCode::NOT_FOUND
        }
    }

    async fn spawn_fake_storage(state: FakeStorage) -> String {
        let app = Router::new()
            .route(
                "/storage/v1/object/:bucket/:name",
                post(put_object).delete(delete_object),
            )
            .route("/storage/v1/object/public/:bucket/:name", head(head_public))
            .with_state(state);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("listener should bind");
        let address = listener.local_addr().expect("local addr should exist");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("server should run");
        });
        format!("http://{address}")
    }

    fn supabase(base_url: String) -> ObjectStorage {
        ObjectStorage::Supabase {
            http: reqwest::Client::new(),
            base_url,
            anon_key: "anon".to_string(),
        }
    }

    #[tokio::test]
    async fn upload_returns_public_url() {
        let state = FakeStorage {
            public_ok: true,
            ..Default::default()
        };
        let base = spawn_fake_storage(state.clone()).await;
        let storage = supabase(base.clone());

        let stored = storage
            .upload_data_uri(BUCKET_BANNER, &format!("data:image/png;base64,{PNG_B64}"))
            .await
            .expect("upload should succeed");

        let uploaded = state.uploaded.lock().unwrap().clone();
        assert_eq!(uploaded, vec![format!("banner/{}", stored.name)]);
        assert!(stored.name.ends_with(".png"));
        assert_eq!(stored.url, format!("{base}/storage/v1/object/public/{}", uploaded[0]));
        assert!(state.deleted.lock().unwrap().is_empty());

        storage.discard(&stored).await;
        assert_eq!(state.deleted.lock().unwrap().clone(), uploaded);
    }

    #[tokio::test]
    async fn failed_public_url_deletes_the_object() {
        let state = FakeStorage::default();
        let base = spawn_fake_storage(state.clone()).await;
        let storage = supabase(base);

        let err = storage
            .upload_data_uri(BUCKET_ANUNCIOS, &format!("data:image/png;base64,{PNG_B64}"))
            .await
            .expect_err("verification should fail");
        assert!(matches!(err, UploadError::PublicUrl(_)));

        let uploaded = state.uploaded.lock().unwrap().clone();
        let deleted = state.deleted.lock().unwrap().clone();
        assert_eq!(uploaded, deleted);
    }

    #[tokio::test]
    async fn local_storage_writes_under_bucket_folder() {
        let dir = std::env::temp_dir().join(format!("cms-uploads-{}", Uuid::new_v4()));
        let storage = ObjectStorage::Local { dir: dir.clone() };

        let stored = storage
            .upload_data_uri(BUCKET_HEADER, &format!("data:image/png;base64,{PNG_B64}"))
            .await
            .expect("local upload should succeed");

        assert_eq!(stored.url, format!("/uploads/header-images/{}", stored.name));
        let path = dir.join(BUCKET_HEADER).join(&stored.name);
        assert!(path.exists());

        storage.discard(&stored).await;
        assert!(!path.exists());
        let _ = std::fs::remove_dir_all(dir);
    }
}
