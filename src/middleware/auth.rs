use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::database::models::User;
use crate::error::ApiError;
use crate::state::AppState;

/// Authenticated caller, resolved from the bearer token and injected into
/// request extensions
#[derive(Clone, Debug)]
pub struct AuthUser(pub User);

/// Bearer authentication for protected routes.
///
/// Every rejection (missing header, bad token, unknown or inactive user)
/// produces the same 401 body; the reason is only logged.
pub async fn jwt_auth_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer_token(&headers).map_err(|reason| {
        tracing::debug!("Rejecting request: {}", reason);
        ApiError::invalid_credentials()
    })?;

    let user_id = state.credentials.validate_token(token)?;

    let user = state
        .repo
        .find_user_by_id(user_id)
        .await?
        .ok_or_else(|| {
            tracing::debug!("Rejecting request: token subject {} no longer exists", user_id);
            ApiError::invalid_credentials()
        })?;

    if !user.is_active {
        tracing::debug!("Rejecting request: user {} is inactive", user.id);
        return Err(ApiError::invalid_credentials());
    }

    request.extensions_mut().insert(AuthUser(user));

    Ok(next.run(request).await)
}

/// Extract the token from an `Authorization: Bearer <token>` header
fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, &'static str> {
    let auth_str = headers
        .get(header::AUTHORIZATION)
        .ok_or("Missing Authorization header")?
        .to_str()
        .map_err(|_| "Invalid Authorization header format")?;

    let (scheme, token) = auth_str
        .split_once(' ')
        .ok_or("Authorization header must use Bearer token format")?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err("Authorization header must use Bearer token format");
    }

    let token = token.trim();
    if token.is_empty() {
        return Err("Empty bearer token");
    }
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn extracts_bearer_token() {
        assert_eq!(extract_bearer_token(&headers_with("Bearer abc.def")).unwrap(), "abc.def");
        assert_eq!(extract_bearer_token(&headers_with("bearer abc")).unwrap(), "abc");
    }

    #[test]
    fn rejects_missing_or_malformed_headers() {
        assert!(extract_bearer_token(&HeaderMap::new()).is_err());
        assert!(extract_bearer_token(&headers_with("Basic dXNlcjpwYXNz")).is_err());
        assert!(extract_bearer_token(&headers_with("Bearer ")).is_err());
        assert!(extract_bearer_token(&headers_with("Bearer")).is_err());
    }
}
