use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{DateTime, Utc};

use crate::{
    db::DbPool,
    error::{AppError, AppResult},
    models::evento::{CreateEventoSchema, Evento, EventoFilter, UpdateEventoSchema},
    state::AppState,
    storage::BUCKET_PUBLICIDAD,
    utils::validation::{optional_image, optional_text, text_len},
};

const TABLE: &str = "eventos_calendario";
const COLUMNS: &str =
    "id, titulo, descripcion, lugar, fecha_inicio, fecha_fin, imagen, created_at, updated_at";

fn not_found() -> AppError {
    AppError::NotFound("Evento no encontrado".to_string())
}

fn range_error() -> AppError {
    AppError::Validation("La fecha de fin no puede ser anterior a la de inicio".to_string())
}

fn check_range(inicio: DateTime<Utc>, fin: Option<DateTime<Utc>>) -> AppResult<()> {
    match fin {
        Some(fin) if fin < inicio => Err(range_error()),
        _ => Ok(()),
    }
}

// GET /api/eventos (?proximos=true oculta los que ya terminaron)
pub async fn list_eventos_handler(
    State(state): State<AppState>,
    Query(filter): Query<EventoFilter>,
) -> AppResult<impl IntoResponse> {
    let eventos = sqlx::query_as::<_, Evento>(&format!(
        "SELECT {COLUMNS} FROM eventos_calendario
         WHERE ($1 = FALSE OR COALESCE(fecha_fin, fecha_inicio) >= NOW())
         ORDER BY created_at DESC"
    ))
    .bind(filter.proximos.unwrap_or(false))
    .fetch_all(&state.pool)
    .await
    .map_err(|e| AppError::from_db(TABLE, e))?;

    Ok(Json(eventos))
}

// POST /api/admin/eventos
pub async fn create_evento_handler(
    State(state): State<AppState>,
    Json(body): Json<CreateEventoSchema>,
) -> AppResult<impl IntoResponse> {
    let titulo = text_len("titulo", &body.titulo, 3, 150)?;
    let descripcion = optional_text("descripcion", body.descripcion.as_deref(), 1000)?;
    let lugar = optional_text("lugar", body.lugar.as_deref(), 150)?;
    check_range(body.fecha_inicio, body.fecha_fin)?;
    let imagen = optional_image("imagen", body.imagen.as_deref())?;
    let resolved = state.resolve_optional_image(BUCKET_PUBLICIDAD, imagen).await?;

    let inserted = sqlx::query_as::<_, Evento>(&format!(
        "INSERT INTO eventos_calendario (titulo, descripcion, lugar, fecha_inicio, fecha_fin, imagen)
         VALUES ($1, $2, $3, $4, $5, $6)
         RETURNING {COLUMNS}"
    ))
    .bind(&titulo)
    .bind(descripcion)
    .bind(lugar)
    .bind(body.fecha_inicio)
    .bind(body.fecha_fin)
    .bind(resolved.as_ref().map(|i| i.url.as_str()))
    .fetch_one(&state.pool)
    .await
    .map_err(|e| AppError::from_db(TABLE, e));
    let evento = state.discard_on_error(resolved.as_ref(), inserted).await?;

    tracing::info!("Evento {} agendado para {}", evento.id, evento.fecha_inicio);
    Ok((StatusCode::CREATED, Json(evento)))
}

// PUT /api/admin/eventos/:id
pub async fn update_evento_handler(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Json(body): Json<UpdateEventoSchema>,
) -> AppResult<impl IntoResponse> {
    let titulo = body.titulo.as_deref().map(|t| text_len("titulo", t, 3, 150)).transpose()?;
    let descripcion = optional_text("descripcion", body.descripcion.as_deref(), 1000)?;
    let lugar = optional_text("lugar", body.lugar.as_deref(), 150)?;
    if let Some(inicio) = body.fecha_inicio {
        check_range(inicio, body.fecha_fin)?;
    }
    let imagen = optional_image("imagen", body.imagen.as_deref())?;

    // La fila se lee antes de subir la imagen: un 404 o un rango inválido no dejan objetos sueltos
    let actual = sqlx::query_as::<_, Evento>(&format!(
        "SELECT {COLUMNS} FROM eventos_calendario WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(&state.pool)
    .await
    .map_err(|e| AppError::from_db(TABLE, e))?
    .ok_or_else(not_found)?;
    check_range(
        body.fecha_inicio.unwrap_or(actual.fecha_inicio),
        body.fecha_fin.or(actual.fecha_fin),
    )?;

    let resolved = state.resolve_optional_image(BUCKET_PUBLICIDAD, imagen).await?;

    // La condición sobre las fechas repite el chequeo por si la fila cambió entretanto
    let updated = sqlx::query_as::<_, Evento>(&format!(
        "UPDATE eventos_calendario SET
            titulo = COALESCE($1, titulo),
            descripcion = COALESCE($2, descripcion),
            lugar = COALESCE($3, lugar),
            fecha_inicio = COALESCE($4, fecha_inicio),
            fecha_fin = COALESCE($5, fecha_fin),
            imagen = COALESCE($6, imagen),
            updated_at = NOW()
         WHERE id = $7
           AND COALESCE($5, fecha_fin, COALESCE($4, fecha_inicio)) >= COALESCE($4, fecha_inicio)
         RETURNING {COLUMNS}"
    ))
    .bind(titulo)
    .bind(descripcion)
    .bind(lugar)
    .bind(body.fecha_inicio)
    .bind(body.fecha_fin)
    .bind(resolved.as_ref().map(|i| i.url.as_str()))
    .bind(id)
    .fetch_optional(&state.pool)
    .await
    .map_err(|e| AppError::from_db(TABLE, e));

    let updated = match updated {
        Ok(Some(evento)) => Ok(evento),
        Ok(None) => Err(untouched_row_error(&state.pool, id).await),
        Err(e) => Err(e),
    };
    let evento = state.discard_on_error(resolved.as_ref(), updated).await?;

    Ok(Json(evento))
}

// El UPDATE no tocó ninguna fila: la borraron o el rango dejó de ser válido
async fn untouched_row_error(pool: &DbPool, id: i64) -> AppError {
    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (SELECT 1 FROM eventos_calendario WHERE id = $1)",
    )
    .bind(id)
    .fetch_one(pool)
    .await;

    match exists {
        Ok(true) => range_error(),
        Ok(false) => not_found(),
        Err(e) => AppError::from_db(TABLE, e),
    }
}

// DELETE /api/admin/eventos/:id
pub async fn delete_evento_handler(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let result = sqlx::query("DELETE FROM eventos_calendario WHERE id = $1")
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
    use chrono::TimeZone;

    #[test]
    fn end_before_start_is_rejected() {
        let inicio = Utc.with_ymd_and_hms(2024, 5, 10, 18, 0, 0).unwrap();
        let fin = Utc.with_ymd_and_hms(2024, 5, 10, 17, 0, 0).unwrap();
        assert!(check_range(inicio, Some(fin)).is_err());
        assert!(check_range(inicio, Some(inicio)).is_ok());
        assert!(check_range(inicio, None).is_ok());
    }
}
