use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::headers::{authorization::Bearer, Authorization};
use axum_extra::TypedHeader;
use serde_json::json;

use crate::{
    error::{AppError, AppResult},
    models::user::{AuthResponse, LoginPayload, RegisterPayload, User, ROLE_ADMIN, ROLE_EDITOR},
    state::AppState,
    utils::{
        jwt::{issue_token, verify_token},
        security::{hash_password, verify_password},
        validation::text_len,
    },
};

// POST /api/auth/register (el primer usuario se crea sin token y queda como admin)
pub async fn register_handler(
    State(state): State<AppState>,
    maybe_auth: Option<TypedHeader<Authorization<Bearer>>>,
    Json(payload): Json<RegisterPayload>,
) -> AppResult<impl IntoResponse> {
    let username = text_len("username", &payload.username, 3, 50)?;
    let email = text_len("email", &payload.email, 3, 254)?;
    if !email.contains('@') {
        return Err(AppError::Validation("El email no es válido".to_string()));
    }
    text_len("password", &payload.password, 8, 128)?;

    let user_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(&state.pool)
        .await
        .map_err(|e| AppError::from_db("users", e))?;

    // Si ya hay usuarios, exigimos token de admin
    if user_count > 0 {
        let TypedHeader(auth) = maybe_auth.ok_or_else(|| {
            AppError::Forbidden("Solo un admin puede crear usuarios".to_string())
        })?;
        let claims = verify_token(auth.token(), &state.config.jwt_secret)?;
        if !claims.is_admin() {
            return Err(AppError::Forbidden("Solo un admin puede crear usuarios".to_string()));
        }
    }

    let hashed_password = hash_password(&payload.password)?;
    let role = if user_count == 0 { ROLE_ADMIN } else { ROLE_EDITOR };

    let user = sqlx::query_as::<_, User>(
        "INSERT INTO users (username, email, password_hash, role)
         VALUES ($1, $2, $3, $4)
         RETURNING id, username, email, password_hash, role",
    )
    .bind(&username)
    .bind(&email)
    .bind(&hashed_password)
    .bind(role)
    .fetch_one(&state.pool)
    .await
    .map_err(|e| match AppError::from_db("users", e) {
        AppError::Conflict(_) => AppError::Conflict("El usuario o email ya existe".to_string()),
        other => other,
    })?;

    tracing::info!("Usuario {} creado con rol {}", user.username, user.role);
    Ok((
        StatusCode::CREATED,
        Json(json!({ "id": user.id, "username": user.username, "role": user.role })),
    ))
}

// POST /api/auth/login
pub async fn login_handler(
    State(state): State<AppState>,
    Json(payload): Json<LoginPayload>,
) -> AppResult<impl IntoResponse> {
    let user = sqlx::query_as::<_, User>(
        "SELECT id, username, email, password_hash, role FROM users WHERE email = $1",
    )
    .bind(payload.email.trim())
    .fetch_optional(&state.pool)
    .await
    .map_err(|e| AppError::from_db("users", e))?;

    // Mismo error para email inexistente y contraseña incorrecta
    let user = match user {
        Some(u) if verify_password(&payload.password, &u.password_hash) => u,
        _ => return Err(AppError::Unauthorized),
    };

    let token = issue_token(&user, &state.config.jwt_secret)?;
    Ok(Json(AuthResponse {
        token,
        token_type: "Bearer".to_string(),
        role: user.role,
    }))
}
