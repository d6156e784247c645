use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::storage::UploadError;

// Códigos SQLSTATE de Postgres que sabemos explicar
const UNDEFINED_TABLE: &str = "42P01";
const UNIQUE_VIOLATION: &str = "23505";
const INSUFFICIENT_PRIVILEGE: &str = "42501";

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Error de configuración: {0}")]
    Config(String),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("No autorizado")]
    Unauthorized,
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    Conflict(String),
    #[error(
        "La tabla '{0}' no existe en la base de datos. Ejecuta las migraciones \
         (RUN_MIGRATIONS=true) o créala manualmente antes de usar esta sección."
    )]
    MissingTable(String),
    #[error("Error al subir la imagen: {0}")]
    Upload(#[from] UploadError),
    #[error("Error del servicio externo: {0}")]
    Upstream(String),
    #[error("Error de base de datos")]
    Database(#[source] sqlx::Error),
    #[error("Error interno")]
    Internal(String),
}

impl AppError {
    // Traduce un error de sqlx usando el código SQLSTATE en lugar del mensaje
    pub fn from_db(table: &str, err: sqlx::Error) -> Self {
        if let sqlx::Error::RowNotFound = err {
            return AppError::NotFound(format!("Registro no encontrado en '{table}'"));
        }
        let code = err
            .as_database_error()
            .and_then(|db| db.code())
            .map(|c| c.into_owned());
        match code.as_deref() {
            Some(UNDEFINED_TABLE) => AppError::MissingTable(table.to_string()),
            Some(UNIQUE_VIOLATION) => {
                AppError::Conflict(format!("Ya existe un registro igual en '{table}'"))
            }
            Some(INSUFFICIENT_PRIVILEGE) => AppError::Forbidden(format!(
                "Sin permisos sobre '{table}'. Revisa las políticas RLS de la tabla."
            )),
            _ => AppError::Database(err),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Upload(UploadError::InvalidDataUri(_)) => StatusCode::BAD_REQUEST,
            AppError::Upload(_) | AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AppError::Config(_)
            | AppError::MissingTable(_)
            | AppError::Database(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            AppError::Database(e) => tracing::error!("Error de base de datos: {:?}", e),
            AppError::Internal(detail) => tracing::error!("Error interno: {}", detail),
            AppError::MissingTable(table) => tracing::error!("Tabla inexistente: {}", table),
            other if status.is_server_error() => tracing::error!("{}", other),
            other => tracing::debug!("Petición rechazada: {}", other),
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
