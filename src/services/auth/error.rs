use axum::http::StatusCode;
use thiserror::Error;

use crate::services::auth::envelope::EnvelopeError;
use crate::services::auth::resolver::ResolveError;

/// Failures returned by `TokenFactory::parse_and_validate`.
///
/// Every condition is its own variant so callers branch on the variant
/// (or on `kind()`), never on the message text.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("empty value")]
    EmptyValue,

    #[error("could not decode credential: illegal base64 data: {0}")]
    Decode(#[source] base64::DecodeError),

    #[error("malformed credential value")]
    MalformedValue,

    #[error("principal not found")]
    PrincipalNotFound,

    #[error("invalid password")]
    InvalidPassword,

    #[error("failed to parse signed token: {0}")]
    Parse(#[source] EnvelopeError),

    #[error("no protected header found")]
    NoProtectedHeader,

    #[error("protected header does not name a supported signing method")]
    NoSigningMethod,

    #[error("failed to resolve verification key: {0}")]
    Resolve(#[from] ResolveError),

    #[error("failed to verify signed token: {0}")]
    Verify(#[source] EnvelopeError),

    #[error("payload is not a claims object")]
    UnexpectedPayload,

    #[error("payload does not carry a principal claim")]
    UnexpectedPrincipal,
}

/// Coarse tag for a `TokenError`, stable across releases.
/// Used as a structured log field and for status mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenErrorKind {
    // caller sent something we cannot read
    Encoding,
    // unknown principal, wrong secret, missing claims
    Credential,
    // unsupported algorithm / missing protected header
    Policy,
    // key resolution or signature verification
    Dependency,
}

impl TokenErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Encoding => "encoding",
            Self::Credential => "credential",
            Self::Policy => "policy",
            Self::Dependency => "dependency",
        }
    }
}

impl TokenError {
    pub fn kind(&self) -> TokenErrorKind {
        match self {
            Self::EmptyValue | Self::Decode(_) | Self::MalformedValue | Self::Parse(_) => {
                TokenErrorKind::Encoding
            }
            Self::PrincipalNotFound
            | Self::InvalidPassword
            | Self::UnexpectedPayload
            | Self::UnexpectedPrincipal => TokenErrorKind::Credential,
            Self::NoProtectedHeader | Self::NoSigningMethod => TokenErrorKind::Policy,
            Self::Resolve(_) | Self::Verify(_) => TokenErrorKind::Dependency,
        }
    }

    /// 400 for input the caller got wrong, 401 for everything else.
    pub fn status(&self) -> StatusCode {
        match self.kind() {
            TokenErrorKind::Encoding => StatusCode::BAD_REQUEST,
            _ => StatusCode::UNAUTHORIZED,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn encoding_errors_map_to_bad_request() {
        assert_eq!(TokenError::EmptyValue.status(), StatusCode::BAD_REQUEST);
        assert_eq!(TokenError::MalformedValue.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            TokenError::Parse(EnvelopeError::Malformed("segments")).status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn credential_policy_and_dependency_errors_map_to_unauthorized() {
        for err in [
            TokenError::PrincipalNotFound,
            TokenError::InvalidPassword,
            TokenError::NoProtectedHeader,
            TokenError::NoSigningMethod,
            TokenError::UnexpectedPayload,
            TokenError::UnexpectedPrincipal,
            TokenError::Resolve(ResolveError::UnknownKeyId("k".into())),
        ] {
            assert_eq!(err.status(), StatusCode::UNAUTHORIZED, "{err}");
        }
    }

    #[test]
    fn wrapped_errors_keep_their_source() {
        let err = TokenError::Resolve(ResolveError::UnknownKeyId("missing".into()));
        assert_eq!(err.kind(), TokenErrorKind::Dependency);
        assert!(err.source().is_some());
        assert!(err.to_string().contains("missing"));
    }
}
