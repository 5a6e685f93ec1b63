//! Static shared-secret ("Basic") credentials.

use std::collections::HashMap;
use std::{error::Error as StdError, fmt};

use async_trait::async_trait;
use axum::http::request::Parts;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use thiserror::Error;

use crate::services::auth::error::TokenError;
use crate::services::auth::factory::TokenFactory;
use crate::token::{Attributes, Token};

pub const BASIC_SCHEME: &str = "basic";

/// username -> expected password, fixed at construction.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct BasicTokenFactory {
    credentials: HashMap<String, String>,
}

impl fmt::Debug for BasicTokenFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Do not print secrets
        let mut users: Vec<&str> = self.credentials.keys().map(String::as_str).collect();
        users.sort_unstable();
        f.debug_struct("BasicTokenFactory")
            .field("users", &users)
            .finish()
    }
}

impl From<HashMap<String, String>> for BasicTokenFactory {
    fn from(credentials: HashMap<String, String>) -> Self {
        Self { credentials }
    }
}

impl BasicTokenFactory {
    pub fn new(credentials: HashMap<String, String>) -> Self {
        Self { credentials }
    }

    /// Build from base64-encoded `user:pass` entries.
    ///
    /// Bad entries are skipped and reported; good ones are always loaded.
    /// On `Err`, `KeyListError::into_partial` hands back the factory built
    /// from the good entries. Later duplicates overwrite earlier ones.
    pub fn from_list<I, S>(keys: I) -> Result<Self, KeyListError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut credentials = HashMap::new();
        let mut errors = Vec::new();

        for (index, key) in keys.into_iter().enumerate() {
            let decoded = match STANDARD.decode(key.as_ref()) {
                Ok(decoded) => decoded,
                Err(source) => {
                    errors.push(KeyEntryError::Decode { index, source });
                    continue;
                }
            };

            match split_credentials(&decoded) {
                Some((user, pass)) => {
                    credentials.insert(user.to_string(), pass.to_string());
                }
                None => errors.push(KeyEntryError::Malformed { index }),
            }
        }

        let factory = Self { credentials };
        if errors.is_empty() {
            Ok(factory)
        } else {
            Err(KeyListError {
                partial: factory,
                errors,
            })
        }
    }

    pub fn len(&self) -> usize {
        self.credentials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }
}

#[async_trait]
impl TokenFactory for BasicTokenFactory {
    async fn parse_and_validate(&self, _request: &Parts, value: &str) -> Result<Token, TokenError> {
        if value.is_empty() {
            return Err(TokenError::EmptyValue);
        }

        let decoded = STANDARD.decode(value).map_err(TokenError::Decode)?;
        let (user, pass) = split_credentials(&decoded).ok_or(TokenError::MalformedValue)?;

        let expected = self
            .credentials
            .get(user)
            .ok_or(TokenError::PrincipalNotFound)?;

        if !secrets_match(expected, pass) {
            return Err(TokenError::InvalidPassword);
        }

        Ok(Token::new(BASIC_SCHEME, user, Attributes::new()))
    }
}

// First colon splits; the password may contain more colons.
fn split_credentials(decoded: &[u8]) -> Option<(&str, &str)> {
    std::str::from_utf8(decoded).ok()?.split_once(':')
}

// Digests equalise length; ct_eq keeps the comparison constant-time.
fn secrets_match(expected: &str, given: &str) -> bool {
    Sha256::digest(expected.as_bytes())
        .ct_eq(&Sha256::digest(given.as_bytes()))
        .into()
}

/// A single rejected entry of a basic auth key list.
#[derive(Debug, Error)]
pub enum KeyEntryError {
    #[error("failed to base64-decode basic auth key at index {index}: {source}")]
    Decode {
        index: usize,
        #[source]
        source: base64::DecodeError,
    },

    #[error("malformed basic auth key at index {index}: expected user:pass")]
    Malformed { index: usize },
}

/// Aggregate of every entry `from_list` had to skip.
#[derive(Debug)]
pub struct KeyListError {
    partial: BasicTokenFactory,
    errors: Vec<KeyEntryError>,
}

impl KeyListError {
    pub fn errors(&self) -> &[KeyEntryError] {
        &self.errors
    }

    /// Factory holding the entries that did load.
    pub fn partial(&self) -> &BasicTokenFactory {
        &self.partial
    }

    pub fn into_partial(self) -> BasicTokenFactory {
        self.partial
    }
}

impl fmt::Display for KeyListError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.errors.as_slice() {
            [single] => write!(f, "{}", single),
            errors => {
                write!(f, "multiple errors ({}): ", errors.len())?;
                for (i, e) in errors.iter().enumerate() {
                    if i > 0 {
                        f.write_str("; ")?;
                    }
                    write!(f, "{}", e)?;
                }
                Ok(())
            }
        }
    }
}

impl StdError for KeyListError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self.errors.as_slice() {
            [single] => Some(single),
            _ => None,
        }
    }
}
