/*
 * Responsibility
 * - Validated identity produced by a TokenFactory
 * - Immutable once built: fields are private, only getters are exposed
 */
use serde::Serialize;
use serde_json::{Map, Value};

/// Ordered claim/attribute bag attached to a token.
pub type Attributes = Map<String, Value>;

/// A validated credential.
///
/// - `scheme` is the name of the factory that produced it ("basic", "jwt")
/// - `principal` is the subject identity taken from validated material only
/// - `attributes` carries auxiliary claims (empty for basic auth)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Token {
    scheme: String,
    principal: String,
    attributes: Attributes,
}

impl Token {
    pub fn new(
        scheme: impl Into<String>,
        principal: impl Into<String>,
        attributes: Attributes,
    ) -> Self {
        Self {
            scheme: scheme.into(),
            principal: principal.into(),
            attributes,
        }
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn principal(&self) -> &str {
        &self.principal
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Convenience lookup into the attribute bag.
    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }
}
