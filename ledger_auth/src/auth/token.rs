//! Signed, self-contained bearer tokens (JWT, HMAC family).

use super::{
    errors::TokenError,
    models::{Claims, TokenKind},
};
use chrono::{DateTime, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use log::debug;
use serde::Deserialize;
use serde_json::Value;

/// Algorithms usable with a shared secret
pub const SUPPORTED_ALGORITHMS: [Algorithm; 3] = [Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];

/// Claims as found on the wire, before presence and type checks.
///
/// Values stay untyped so a mistyped claim in a correctly signed payload
/// surfaces as `MalformedClaims`.
#[derive(Debug, Clone, Deserialize)]
struct WireClaims {
    sub: Option<Value>,
    iat: Option<Value>,
    exp: Option<Value>,
    #[serde(rename = "type")]
    kind: Option<Value>,
}

/// Encodes and verifies tokens under one process-wide secret and algorithm
#[derive(Clone)]
pub struct TokenCodec {
    algorithm: Algorithm,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenCodec {
    /// Create a codec signing with `secret` under `algorithm`.
    ///
    /// # Errors
    ///
    /// * `TokenError::Encoding` - `algorithm` is not an HMAC algorithm
    pub fn new(secret: &[u8], algorithm: Algorithm) -> Result<Self, TokenError> {
        if !SUPPORTED_ALGORITHMS.contains(&algorithm) {
            return Err(TokenError::Encoding(format!(
                "unsupported signing algorithm {algorithm:?}"
            )));
        }

        // Only the configured algorithm is accepted; expiry is checked
        // against the caller's clock with zero leeway.
        let mut validation = Validation::new(algorithm);
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation.required_spec_claims.clear();

        Ok(Self {
            algorithm,
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        })
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Sign `claims` into a `header.claims.signature` token
    ///
    /// # Errors
    ///
    /// * `TokenError::Encoding` - Empty subject or signer failure
    pub fn encode(&self, claims: &Claims) -> Result<String, TokenError> {
        if claims.sub.is_empty() {
            return Err(TokenError::Encoding("missing subject".to_string()));
        }

        encode(&Header::new(self.algorithm), claims, &self.encoding_key)
            .map_err(|e| TokenError::Encoding(e.to_string()))
    }

    /// Verify `token` against the current time
    pub fn decode(&self, token: &str) -> Result<Claims, TokenError> {
        self.decode_at(token, Utc::now())
    }

    /// Verify `token` as of `now`.
    ///
    /// Checks run in order: integrity tag and algorithm, expiry, then the
    /// presence of the remaining claims.
    ///
    /// # Errors
    ///
    /// * `TokenError::InvalidSignature` - Token not produced under this secret and algorithm
    /// * `TokenError::Expired` - `exp` is at or before `now`
    /// * `TokenError::MalformedClaims` - Missing or mistyped `exp`, `iat`, `type`, or `sub`
    pub fn decode_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, TokenError> {
        let wire = decode::<WireClaims>(token, &self.decoding_key, &self.validation)
            .map_err(classify)?
            .claims;

        let exp = wire
            .exp
            .as_ref()
            .and_then(Value::as_i64)
            .ok_or(TokenError::MalformedClaims)?;
        if exp <= now.timestamp() {
            return Err(TokenError::Expired);
        }

        let sub = match wire.sub {
            Some(Value::String(sub)) if !sub.is_empty() => sub,
            _ => return Err(TokenError::MalformedClaims),
        };
        let iat = wire
            .iat
            .as_ref()
            .and_then(Value::as_i64)
            .ok_or(TokenError::MalformedClaims)?;
        let kind = match wire.kind.as_ref().and_then(Value::as_str) {
            Some("access") => TokenKind::Access,
            Some("refresh") => TokenKind::Refresh,
            _ => return Err(TokenError::MalformedClaims),
        };

        Ok(Claims { sub, iat, exp, kind })
    }
}

fn classify(err: jsonwebtoken::errors::Error) -> TokenError {
    debug!("Token verification failed: {err}");
    match err.kind() {
        ErrorKind::ExpiredSignature => TokenError::Expired,
        ErrorKind::MissingRequiredClaim(_) => TokenError::MalformedClaims,
        // Anything that cannot be authenticated as ours: bad tag, foreign
        // algorithm, undecodable header or segments
        _ => TokenError::InvalidSignature,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;

    const SECRET: &[u8] = b"test_secret_key_for_jwt_signing_0001";

    fn codec() -> TokenCodec {
        TokenCodec::new(SECRET, Algorithm::HS256).unwrap()
    }

    fn claims_at(now: DateTime<Utc>, kind: TokenKind) -> Claims {
        Claims::new(7, kind, now, Duration::minutes(30)).unwrap()
    }

    #[test]
    fn test_round_trip() {
        let codec = codec();
        let claims = claims_at(Utc::now(), TokenKind::Access);

        let token = codec.encode(&claims).unwrap();
        assert_eq!(token.split('.').count(), 3);
        assert_eq!(codec.decode(&token).unwrap(), claims);
    }

    #[test]
    fn test_expiry_boundary() {
        let codec = codec();
        let issued = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let claims = claims_at(issued, TokenKind::Access);
        let token = codec.encode(&claims).unwrap();

        let just_before = issued + Duration::minutes(30) - Duration::seconds(1);
        assert!(codec.decode_at(&token, just_before).is_ok());

        let at_expiry = issued + Duration::minutes(30);
        assert_eq!(codec.decode_at(&token, at_expiry), Err(TokenError::Expired));

        // Real clock is well past 2023
        assert_eq!(codec.decode(&token), Err(TokenError::Expired));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = codec()
            .encode(&claims_at(Utc::now(), TokenKind::Access))
            .unwrap();
        let other = TokenCodec::new(b"another_secret_key_for_jwt_signing", Algorithm::HS256).unwrap();

        assert_eq!(other.decode(&token), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn test_algorithm_confusion_rejected() {
        let hs512 = TokenCodec::new(SECRET, Algorithm::HS512).unwrap();
        let token = hs512
            .encode(&claims_at(Utc::now(), TokenKind::Access))
            .unwrap();

        assert_eq!(codec().decode(&token), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn test_unsigned_token_rejected() {
        let token = codec()
            .encode(&claims_at(Utc::now(), TokenKind::Access))
            .unwrap();
        let payload = token.split('.').nth(1).unwrap();

        // {"alg":"none","typ":"JWT"}
        let unsigned = format!("eyJhbGciOiJub25lIiwidHlwIjoiSldUIn0.{payload}.");
        assert_eq!(codec().decode(&unsigned), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn test_asymmetric_algorithm_refused() {
        assert!(matches!(
            TokenCodec::new(SECRET, Algorithm::RS256),
            Err(TokenError::Encoding(_))
        ));
    }

    #[test]
    fn test_empty_subject_not_encoded() {
        let mut claims = claims_at(Utc::now(), TokenKind::Access);
        claims.sub.clear();

        assert!(matches!(codec().encode(&claims), Err(TokenError::Encoding(_))));
    }

    #[test]
    fn test_missing_or_mistyped_claims_are_malformed() {
        let exp = (Utc::now() + Duration::minutes(5)).timestamp();
        let iat = Utc::now().timestamp();
        let header = Header::new(Algorithm::HS256);
        let key = EncodingKey::from_secret(SECRET);

        let payloads = [
            json!({ "iat": iat, "exp": exp, "type": "access" }),
            json!({ "sub": "", "iat": iat, "exp": exp, "type": "access" }),
            json!({ "sub": "7", "exp": exp, "type": "access" }),
            json!({ "sub": "7", "iat": iat, "exp": exp }),
            json!({ "sub": "7", "iat": iat, "exp": exp, "type": "session" }),
            json!({ "sub": "7", "iat": iat, "type": "access" }),
            json!({ "sub": 7, "iat": iat, "exp": exp, "type": "access" }),
            json!({ "sub": null, "iat": iat, "exp": exp, "type": "access" }),
            json!({ "sub": "7", "iat": iat, "exp": exp, "type": 1 }),
            json!({ "sub": "7", "iat": "x", "exp": exp, "type": "access" }),
            json!({ "sub": "7", "iat": iat, "exp": "soon", "type": "access" }),
            json!({ "sub": "7", "iat": iat, "exp": 1.5e12, "type": "access" }),
        ];

        for payload in payloads {
            let token = encode(&header, &payload, &key).unwrap();
            assert_eq!(
                codec().decode(&token),
                Err(TokenError::MalformedClaims),
                "payload {payload} should be malformed"
            );
        }
    }

    #[test]
    fn test_garbage_is_invalid_signature() {
        for token in ["", "abc", "a.b", "a.b.c", "invalid.jwt.token", "...."] {
            assert_eq!(codec().decode(token), Err(TokenError::InvalidSignature));
        }
    }
}
