/*
 * Responsibility
 * - Application-level error (AppError) and its HTTP rendering
 * - ErrorResponseReason: stable tag for why a request was not authenticated
 * - The body never says which credential check failed; the reason tag only
 *   names the stage (header, scheme, credential)
 */
use std::fmt;

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::services::auth::TokenError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorResponseReason {
    MissingHeader,
    InvalidHeader,
    KeyNotSupported,
    ParseFailed,
    MissingAuthentication,
}

impl ErrorResponseReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingHeader => "MissingHeader",
            Self::InvalidHeader => "InvalidHeader",
            Self::KeyNotSupported => "KeyNotSupported",
            Self::ParseFailed => "ParseFailed",
            Self::MissingAuthentication => "MissingAuthentication",
        }
    }
}

impl fmt::Display for ErrorResponseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{reason}: bad request")]
    BadCredentials { reason: ErrorResponseReason },

    #[error("{reason}: unauthorized")]
    Unauthenticated {
        reason: ErrorResponseReason,
        // WWW-Authenticate value, e.g. `Basic realm="credgate", Bearer realm="credgate"`
        challenge: Option<String>,
    },
}

impl AppError {
    pub fn unauthenticated(reason: ErrorResponseReason, challenge: Option<String>) -> Self {
        Self::Unauthenticated { reason, challenge }
    }

    /// Map a factory failure onto 400/401 using the error's own classification.
    pub fn from_token_error(err: &TokenError, challenge: Option<String>) -> Self {
        let reason = ErrorResponseReason::ParseFailed;
        if err.status() == StatusCode::BAD_REQUEST {
            Self::BadCredentials { reason }
        } else {
            Self::Unauthenticated { reason, challenge }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, challenge) = match self {
            AppError::BadCredentials { reason } => (
                StatusCode::BAD_REQUEST,
                reason.as_str(),
                "bad request".to_string(),
                None,
            ),
            AppError::Unauthenticated { reason, challenge } => (
                StatusCode::UNAUTHORIZED,
                reason.as_str(),
                "unauthorized".to_string(),
                challenge,
            ),
        };

        let body = ErrorResponse {
            error: ErrorBody { code, message },
        };

        let mut response = (status, Json(body)).into_response();
        if let Some(value) = challenge.and_then(|c| HeaderValue::from_str(&c).ok()) {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, value);
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reason_display_is_stable() {
        assert_eq!(ErrorResponseReason::MissingHeader.to_string(), "MissingHeader");
        assert_eq!(
            ErrorResponseReason::KeyNotSupported.to_string(),
            "KeyNotSupported"
        );
    }

    #[test]
    fn unauthenticated_sets_challenge_header() {
        let resp = AppError::unauthenticated(
            ErrorResponseReason::ParseFailed,
            Some(r#"Basic realm="credgate""#.to_string()),
        )
        .into_response();

        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            resp.headers().get(header::WWW_AUTHENTICATE).unwrap(),
            r#"Basic realm="credgate""#
        );
    }

    #[test]
    fn bad_credentials_render_400_without_challenge() {
        let resp = AppError::BadCredentials {
            reason: ErrorResponseReason::InvalidHeader,
        }
        .into_response();

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(resp.headers().get(header::WWW_AUTHENTICATE).is_none());
    }

    #[test]
    fn token_errors_split_into_400_and_401() {
        let bad = AppError::from_token_error(&TokenError::MalformedValue, None);
        assert!(matches!(bad, AppError::BadCredentials { .. }));

        let unauth = AppError::from_token_error(&TokenError::InvalidPassword, None);
        assert!(matches!(
            unauth,
            AppError::Unauthenticated {
                reason: ErrorResponseReason::ParseFailed,
                ..
            }
        ));
    }
}
