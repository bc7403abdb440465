//! HTTP basic auth, §6: every endpoint requires it; failure is a 401.

use crate::errors::ApiError;
use crate::state::AppState;
use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

fn extract_password(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(axum::http::header::AUTHORIZATION)?.to_str().ok()?;
    let encoded = value.strip_prefix("Basic ")?;
    let decoded = BASE64.decode(encoded).ok()?;
    let text = String::from_utf8(decoded).ok()?;
    let (_user, password) = text.split_once(':')?;
    Some(password.to_string())
}

pub async fn require_basic_auth(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let password = extract_password(request.headers()).ok_or(ApiError::Unauthorized)?;
    if password.as_bytes() != state.api_password.as_bytes() {
        return Err(ApiError::Unauthorized);
    }
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn extracts_password_from_basic_header() {
        let mut headers = HeaderMap::new();
        let encoded = BASE64.encode("hsd:s3cret");
        headers.insert(
            axum::http::header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Basic {encoded}")).unwrap(),
        );
        assert_eq!(extract_password(&headers).as_deref(), Some("s3cret"));
    }

    #[test]
    fn missing_header_yields_none() {
        assert!(extract_password(&HeaderMap::new()).is_none());
    }
}
