//! Compact JWS envelope parsing and signature verification.
//!
//! The bearer factory only talks to the `EnvelopeParser` / `SignedEnvelope`
//! traits. `CompactJwsParser` is the jsonwebtoken-backed implementation used
//! by the server; tests swap in fakes.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EnvelopeError {
    #[error("malformed compact jws: {0}")]
    Malformed(&'static str),

    #[error("signature verification failed: {0}")]
    Signature(#[source] jsonwebtoken::errors::Error),
}

/// A parsed, not yet verified, signed token.
///
/// `payload()` is readable before `verify()` but callers must not trust it
/// until `verify()` returned `Ok`.
pub trait SignedEnvelope: Send + Sync {
    fn protected_header(&self) -> &Map<String, Value>;

    fn payload(&self) -> &Value;

    fn signature(&self) -> &[u8];

    fn verify(&self, alg: Algorithm, key: &DecodingKey) -> Result<(), EnvelopeError>;
}

pub trait EnvelopeParser: Send + Sync {
    fn parse(&self, raw: &str) -> Result<Box<dyn SignedEnvelope>, EnvelopeError>;
}

/// Parser for `header.payload.signature` compact serialization.
#[derive(Debug, Clone, Default)]
pub struct CompactJwsParser {
    // Allowed exp/nbf drift, seconds.
    leeway_seconds: u64,
}

impl CompactJwsParser {
    pub fn new(leeway_seconds: u64) -> Self {
        Self { leeway_seconds }
    }
}

impl EnvelopeParser for CompactJwsParser {
    fn parse(&self, raw: &str) -> Result<Box<dyn SignedEnvelope>, EnvelopeError> {
        let mut segments = raw.split('.');
        let (Some(header), Some(payload), Some(signature), None) = (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) else {
            return Err(EnvelopeError::Malformed("expected three segments"));
        };

        let header = match decode_json_segment(header)? {
            Value::Object(map) => map,
            _ => return Err(EnvelopeError::Malformed("protected header is not an object")),
        };
        let payload = decode_json_segment(payload)?;
        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| EnvelopeError::Malformed("signature is not base64url"))?;

        Ok(Box::new(CompactJws {
            raw: raw.to_string(),
            header,
            payload,
            signature,
            leeway_seconds: self.leeway_seconds,
        }))
    }
}

fn decode_json_segment(segment: &str) -> Result<Value, EnvelopeError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| EnvelopeError::Malformed("segment is not base64url"))?;
    serde_json::from_slice(&bytes).map_err(|_| EnvelopeError::Malformed("segment is not json"))
}

struct CompactJws {
    raw: String,
    header: Map<String, Value>,
    payload: Value,
    signature: Vec<u8>,
    leeway_seconds: u64,
}

impl SignedEnvelope for CompactJws {
    fn protected_header(&self) -> &Map<String, Value> {
        &self.header
    }

    fn payload(&self) -> &Value {
        &self.payload
    }

    fn signature(&self) -> &[u8] {
        &self.signature
    }

    fn verify(&self, alg: Algorithm, key: &DecodingKey) -> Result<(), EnvelopeError> {
        // Signature + alg pinning. exp/nbf are checked only when the token
        // carries them; no claim is mandatory at this layer.
        let mut validation = Validation::new(alg);
        validation.required_spec_claims.clear();
        validation.validate_aud = false;
        validation.leeway = self.leeway_seconds;

        jsonwebtoken::decode::<Value>(&self.raw, key, &validation)
            .map(|_| ())
            .map_err(EnvelopeError::Signature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{EncodingKey, Header};
    use serde_json::json;

    const SECRET: &[u8] = b"envelope-test-secret";

    fn sign(claims: &Value) -> String {
        let mut header = Header::new(Algorithm::HS256);
        header.kid = Some("k1".to_string());
        jsonwebtoken::encode(&header, claims, &EncodingKey::from_secret(SECRET)).unwrap()
    }

    #[test]
    fn parses_header_payload_and_signature() {
        let raw = sign(&json!({ "sub": "alice" }));
        let env = CompactJwsParser::default().parse(&raw).unwrap();

        assert_eq!(env.protected_header().get("alg"), Some(&json!("HS256")));
        assert_eq!(env.protected_header().get("kid"), Some(&json!("k1")));
        assert_eq!(env.payload(), &json!({ "sub": "alice" }));
        assert!(!env.signature().is_empty());
    }

    #[test]
    fn rejects_wrong_segment_count() {
        let parser = CompactJwsParser::default();
        assert!(matches!(
            parser.parse("abc.def"),
            Err(EnvelopeError::Malformed(_))
        ));
        assert!(matches!(
            parser.parse("a.b.c.d"),
            Err(EnvelopeError::Malformed(_))
        ));
    }

    #[test]
    fn rejects_non_json_header() {
        let header = URL_SAFE_NO_PAD.encode("not json");
        let payload = URL_SAFE_NO_PAD.encode("{}");
        let raw = format!("{header}.{payload}.");
        assert!(matches!(
            CompactJwsParser::default().parse(&raw),
            Err(EnvelopeError::Malformed(_))
        ));
    }

    #[test]
    fn verifies_with_the_signing_key() {
        let raw = sign(&json!({ "sub": "alice" }));
        let env = CompactJwsParser::default().parse(&raw).unwrap();

        assert!(
            env.verify(Algorithm::HS256, &DecodingKey::from_secret(SECRET))
                .is_ok()
        );
    }

    #[test]
    fn verify_fails_with_another_key() {
        let raw = sign(&json!({ "sub": "alice" }));
        let env = CompactJwsParser::default().parse(&raw).unwrap();

        let err = env
            .verify(Algorithm::HS256, &DecodingKey::from_secret(b"other"))
            .unwrap_err();
        assert!(matches!(err, EnvelopeError::Signature(_)));
    }

    #[test]
    fn verify_rejects_expired_tokens() {
        let raw = sign(&json!({ "sub": "alice", "exp": 1_000 }));
        let env = CompactJwsParser::new(0).parse(&raw).unwrap();

        assert!(matches!(
            env.verify(Algorithm::HS256, &DecodingKey::from_secret(SECRET)),
            Err(EnvelopeError::Signature(_))
        ));
    }
}
