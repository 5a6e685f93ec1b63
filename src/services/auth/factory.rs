/*
 * Responsibility
 * - TokenFactory: one contract for every credential scheme
 * - TokenFactories: scheme name -> factory registry used by the middleware
 */
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use axum::http::request::Parts;

use crate::services::auth::error::TokenError;
use crate::token::Token;

/// Turns the credential part of an `Authorization` header into a `Token`.
///
/// - `value` has the scheme keyword already stripped
/// - `request` is available for attribute enrichment; built-in factories ignore it
/// - implementations hold only read-only state, so one instance serves every request
#[async_trait]
pub trait TokenFactory: Send + Sync {
    async fn parse_and_validate(&self, request: &Parts, value: &str) -> Result<Token, TokenError>;
}

/// Immutable registry, keyed by lowercase scheme name.
#[derive(Clone, Default)]
pub struct TokenFactories {
    factories: HashMap<String, Arc<dyn TokenFactory>>,
}

impl fmt::Debug for TokenFactories {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenFactories")
            .field("schemes", &self.schemes())
            .finish()
    }
}

impl TokenFactories {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, scheme: &str, factory: Arc<dyn TokenFactory>) -> Self {
        self.factories.insert(scheme.to_ascii_lowercase(), factory);
        self
    }

    /// Case-insensitive lookup ("Bearer", "bearer" and "BEARER" are the same scheme).
    pub fn get(&self, scheme: &str) -> Option<&Arc<dyn TokenFactory>> {
        self.factories.get(&scheme.to_ascii_lowercase())
    }

    pub fn schemes(&self) -> Vec<&str> {
        let mut schemes: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        schemes.sort_unstable();
        schemes
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::Attributes;
    use axum::http::Request;

    struct Fixed(&'static str);

    #[async_trait]
    impl TokenFactory for Fixed {
        async fn parse_and_validate(
            &self,
            _request: &Parts,
            value: &str,
        ) -> Result<Token, TokenError> {
            Ok(Token::new(self.0, value, Attributes::new()))
        }
    }

    #[tokio::test]
    async fn lookup_ignores_scheme_case() {
        let factories = TokenFactories::new().with("Basic", Arc::new(Fixed("basic")));
        let (parts, _) = Request::new(()).into_parts();

        for scheme in ["basic", "Basic", "BASIC"] {
            let factory = factories.get(scheme).expect("registered");
            let token = factory.parse_and_validate(&parts, "v").await.unwrap();
            assert_eq!(token.scheme(), "basic");
        }
        assert!(factories.get("bearer").is_none());
    }

    #[test]
    fn schemes_are_sorted() {
        let factories = TokenFactories::new()
            .with("bearer", Arc::new(Fixed("jwt")))
            .with("basic", Arc::new(Fixed("basic")));
        assert_eq!(factories.schemes(), vec!["basic", "bearer"]);
        assert!(!factories.is_empty());
        assert!(TokenFactories::new().is_empty());
    }
}
