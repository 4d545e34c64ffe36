use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;

use crate::auth::jwt::TokenError;
use crate::store::StoreError;

/// Outcome discriminator carried by every response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AppStatus {
    Success,
    Failed,
}

/// Uniform response wrapper: `status` plus `data`, with `msg` on success
/// and `error` on failure.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub status: AppStatus,
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> Envelope<T> {
    pub fn success(data: T) -> Self {
        Self {
            status: AppStatus::Success,
            data: Some(data),
            msg: None,
            error: None,
        }
    }

    pub fn success_msg(data: T, msg: impl Into<String>) -> Self {
        Self {
            msg: Some(msg.into()),
            ..Self::success(data)
        }
    }
}

impl Envelope<()> {
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            status: AppStatus::Failed,
            data: None,
            msg: None,
            error: Some(error.into()),
        }
    }
}

/// Everything a handler can fail with. Each variant owes the caller exactly
/// one status code and one message; conversion happens in `into_response`
/// and nowhere else.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or malformed input.
    #[error("{0}")]
    Validation(String),
    #[error("{0} is not found")]
    NotFound(&'static str),
    /// Bad login credentials. Unknown email and wrong password share this
    /// variant, so the response cannot be used to probe for accounts.
    #[error("Invalid credentials")]
    AuthFailure,
    #[error("Invalid token")]
    TokenInvalid,
    #[error("Token expired, please log in again")]
    TokenExpired,
    #[error("{0}")]
    Forbidden(&'static str),
    #[error("{0}")]
    Conflict(String),
    #[error("crypto failure: {0}")]
    Crypto(String),
    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl From<TokenError> for ApiError {
    fn from(e: TokenError) -> Self {
        match e {
            TokenError::Expired => ApiError::TokenExpired,
            TokenError::Invalid => ApiError::TokenInvalid,
        }
    }
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::AuthFailure | ApiError::TokenInvalid | ApiError::TokenExpired => {
                StatusCode::UNAUTHORIZED
            }
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Conflict(_) | ApiError::Storage(StoreError::DuplicateEmail) => {
                StatusCode::CONFLICT
            }
            ApiError::Crypto(_) | ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        // Internal detail stays in the log; the caller gets a generic line.
        let message = if status.is_server_error() {
            error!(error = %self, "request failed");
            "Server Error".to_string()
        } else {
            self.to_string()
        };
        (status, axum::Json(Envelope::<()>::failure(message))).into_response()
    }
}

/// `axum::Json` with its rejection shaped into the failure envelope, so a
/// malformed request body comes back as a 400 `FAILED` response instead of
/// the framework's plain-text error.
#[derive(Debug)]
pub struct Json<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for Json<T>
where
    axum::Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match axum::Json::<T>::from_request(req, state).await {
            Ok(axum::Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(ApiError::Validation(rejection.body_text())),
        }
    }
}

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn success_envelope_shape() {
        let envelope = Envelope::success_msg(json!({"id": 1}), "done");
        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(value["status"], "SUCCESS");
        assert_eq!(value["data"]["id"], 1);
        assert_eq!(value["msg"], "done");
        assert!(value.get("error").is_none());
    }

    #[test]
    fn failure_envelope_shape() {
        let envelope = Envelope::<()>::failure("boom");
        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(value["status"], "FAILED");
        assert_eq!(value["data"], Value::Null);
        assert_eq!(value["error"], "boom");
        assert!(value.get("msg").is_none());
    }

    #[test]
    fn status_codes() {
        assert_eq!(
            ApiError::Validation("bad".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::NotFound("User").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::AuthFailure.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::TokenInvalid.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::TokenExpired.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::Forbidden("no").status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            ApiError::Conflict("taken".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::Storage(StoreError::DuplicateEmail).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::Crypto("oops".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn token_errors_map_to_api_errors() {
        assert!(matches!(ApiError::from(TokenError::Expired), ApiError::TokenExpired));
        assert!(matches!(ApiError::from(TokenError::Invalid), ApiError::TokenInvalid));
    }

    #[tokio::test]
    async fn server_errors_are_masked() {
        let response = ApiError::Crypto("salt machine exploded".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["error"], "Server Error");
        assert!(!String::from_utf8_lossy(&body).contains("salt machine"));
    }
}
