//! Signed-token ("Bearer"/JWT) credentials.
//!
//! Pipeline, first failure wins:
//! parse -> protected header -> alg -> kid (or default) -> resolve key
//! -> verify signature -> claims object -> `sub` principal.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use axum::http::request::Parts;
use jsonwebtoken::Algorithm;
use serde_json::Value;
use tracing::debug;

use crate::services::auth::envelope::EnvelopeParser;
use crate::services::auth::error::TokenError;
use crate::services::auth::factory::TokenFactory;
use crate::services::auth::resolver::KeyResolver;
use crate::token::Token;

/// `Authorization` scheme keyword this factory is registered under.
pub const BEARER_SCHEME: &str = "bearer";

/// Scheme stamped on the tokens it produces.
pub const JWT_SCHEME: &str = "jwt";

/// Claim holding the principal.
pub const PRINCIPAL_CLAIM: &str = "sub";

#[derive(Clone)]
pub struct BearerTokenFactory {
    default_key_id: String,
    resolver: Arc<dyn KeyResolver>,
    parser: Arc<dyn EnvelopeParser>,
}

impl fmt::Debug for BearerTokenFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BearerTokenFactory")
            .field("default_key_id", &self.default_key_id)
            .finish_non_exhaustive()
    }
}

impl BearerTokenFactory {
    pub fn new(
        default_key_id: impl Into<String>,
        resolver: Arc<dyn KeyResolver>,
        parser: Arc<dyn EnvelopeParser>,
    ) -> Self {
        Self {
            default_key_id: default_key_id.into(),
            resolver,
            parser,
        }
    }

    pub fn default_key_id(&self) -> &str {
        &self.default_key_id
    }
}

#[async_trait]
impl TokenFactory for BearerTokenFactory {
    async fn parse_and_validate(&self, _request: &Parts, value: &str) -> Result<Token, TokenError> {
        if value.is_empty() {
            return Err(TokenError::EmptyValue);
        }

        let envelope = self.parser.parse(value).map_err(TokenError::Parse)?;

        let header = envelope.protected_header();
        if header.is_empty() {
            return Err(TokenError::NoProtectedHeader);
        }

        // `none` and unknown names do not parse into an Algorithm
        let alg = header
            .get("alg")
            .and_then(Value::as_str)
            .and_then(|alg| Algorithm::from_str(alg).ok())
            .ok_or(TokenError::NoSigningMethod)?;

        let key_id = header
            .get("kid")
            .and_then(Value::as_str)
            .filter(|kid| !kid.is_empty())
            .unwrap_or(self.default_key_id.as_str());

        let key = self.resolver.resolve(key_id).await?;
        envelope.verify(alg, &key).map_err(TokenError::Verify)?;

        // Only read the payload once the signature checked out
        let Value::Object(claims) = envelope.payload() else {
            return Err(TokenError::UnexpectedPayload);
        };

        let principal = claims
            .get(PRINCIPAL_CLAIM)
            .and_then(Value::as_str)
            .ok_or(TokenError::UnexpectedPrincipal)?
            .to_string();

        debug!(kid = %key_id, alg = ?alg, principal = %principal, "bearer token verified");

        Ok(Token::new(JWT_SCHEME, principal, claims.clone()))
    }
}
