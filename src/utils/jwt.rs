use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{authorization::Bearer, Authorization};
use axum_extra::TypedHeader;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};

use crate::{
    error::{AppError, AppResult},
    models::user::{Claims, User},
    state::AppState,
};

const TOKEN_HOURS: i64 = 24;

pub fn issue_token(user: &User, secret: &str) -> AppResult<String> {
    let now = Utc::now();
    let claims = Claims {
        sub: user.email.clone(),
        exp: (now + Duration::hours(TOKEN_HOURS)).timestamp() as usize,
        iat: now.timestamp() as usize,
        user_id: user.id,
        role: user.role.clone(),
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes()))
        .map_err(|e| AppError::Internal(format!("no se pudo firmar el token: {e}")))
}

// Token falso, expirado o manipulado => 401
pub fn verify_token(token: &str, secret: &str) -> AppResult<Claims> {
    decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &Validation::default())
        .map(|data| data.claims)
        .map_err(|_| AppError::Unauthorized)
}

// Editores y admins: adjunta los claims para los handlers
pub async fn auth_middleware(
    State(state): State<AppState>,
    auth: Option<TypedHeader<Authorization<Bearer>>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let TypedHeader(auth) = auth.ok_or(AppError::Unauthorized)?;
    let claims = verify_token(auth.token(), &state.config.jwt_secret)?;
    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

pub async fn admin_middleware(
    State(state): State<AppState>,
    auth: Option<TypedHeader<Authorization<Bearer>>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let TypedHeader(auth) = auth.ok_or(AppError::Unauthorized)?;
    let claims = verify_token(auth.token(), &state.config.jwt_secret)?;
    if !claims.is_admin() {
        return Err(AppError::Forbidden(
            "Solo un admin puede realizar esta acción".to_string(),
        ));
    }
    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: &str) -> User {
        User {
            id: 7,
            username: "redaccion".into(),
            email: "redaccion@medios.example".into(),
            password_hash: String::new(),
            role: role.into(),
        }
    }

    #[test]
    fn issued_token_verifies_with_same_secret() {
        let token = issue_token(&user("editor"), "s3creto").unwrap();
        let claims = verify_token(&token, "s3creto").unwrap();
        assert_eq!(claims.user_id, 7);
        assert_eq!(claims.role, "editor");
        assert!(!claims.is_admin());
    }

    #[test]
    fn wrong_secret_is_unauthorized() {
        let token = issue_token(&user("admin"), "s3creto").unwrap();
        assert!(matches!(verify_token(&token, "otro"), Err(AppError::Unauthorized)));
    }
}
