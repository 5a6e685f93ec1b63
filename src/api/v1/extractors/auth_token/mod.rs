/*!
 * Authenticated token extractor
 *
 * Responsibility:
 * - Hand the Token built by the constructor middleware to handlers
 * - Missing token (route not behind the middleware) is a 401, not a panic
 */

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::{AppError, ErrorResponseReason};
use crate::token::Token;

pub struct AuthToken(pub Token);

impl<S> FromRequestParts<S> for AuthToken
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Token>()
            .cloned()
            .map(AuthToken)
            .ok_or(AppError::unauthenticated(
                ErrorResponseReason::MissingAuthentication,
                None,
            ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::Attributes;
    use axum::http::Request;

    #[tokio::test]
    async fn reads_token_from_extensions() {
        let (mut parts, _) = Request::new(()).into_parts();
        parts
            .extensions
            .insert(Token::new("basic", "user", Attributes::new()));

        let AuthToken(token) = AuthToken::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(token.principal(), "user");
    }

    #[tokio::test]
    async fn missing_token_is_missing_authentication() {
        let (mut parts, _) = Request::new(()).into_parts();
        let err = AuthToken::from_request_parts(&mut parts, &())
            .await
            .err()
            .unwrap();
        assert!(matches!(
            err,
            AppError::Unauthenticated {
                reason: ErrorResponseReason::MissingAuthentication,
                ..
            }
        ));
    }
}
