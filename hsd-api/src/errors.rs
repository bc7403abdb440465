use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Error-code mapping fixed by §6: auth failure -> 401, unknown network
/// -> 400, anything else -> 500 with a plain-text body.
#[derive(Debug)]
pub enum ApiError {
    Unauthorized,
    UnknownNetwork(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Unauthorized => {
                (StatusCode::UNAUTHORIZED, "unauthorized").into_response()
            }
            ApiError::UnknownNetwork(n) => {
                (StatusCode::BAD_REQUEST, format!("unknown network: {n}")).into_response()
            }
            ApiError::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, msg).into_response()
            }
        }
    }
}
