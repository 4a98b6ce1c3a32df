use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::errors::{AppError, Result};
use crate::models::user::{Claims, User};
use crate::state::AppState;

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Verifies the bearer token and makes its [`Claims`] available to the
/// handlers behind this layer.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response> {
    let token = bearer_token(request.headers())
        .ok_or_else(|| AppError::auth("missing bearer token"))?;
    let claims = state.tokens.verify(token)?;

    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

/// Runs after [`auth_middleware`]. The role is read from the stored account
/// rather than the token so that a demoted admin loses access at once.
pub async fn require_admin(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response> {
    let claims = request
        .extensions()
        .get::<Claims>()
        .ok_or_else(|| AppError::auth("missing credentials"))?;
    let user = current_user(&state, claims).await?;
    if !user.is_admin {
        tracing::warn!(user_id = user.id, "Non-admin request to an admin route");
        return Err(AppError::Forbidden);
    }
    Ok(next.run(request).await)
}

/// Loads the account a token was issued for. A token for an account that
/// no longer exists is treated as invalid.
pub async fn current_user(state: &AppState, claims: &Claims) -> Result<User> {
    state
        .repos
        .users
        .find_by_id(claims.sub)
        .await?
        .ok_or_else(|| AppError::auth("account no longer exists"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn extracts_bearer_tokens_only() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(bearer_token(&headers), Some("abc.def"));
    }
}
