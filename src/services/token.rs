//! Bearer token issuing and validation
//!
//! Tokens are JWTs in compact form signed with HMAC-SHA256. The subject is
//! the user's email and a `role` claim carries the account role.

use chrono::{Duration, Utc};
use data_encoding::BASE64URL_NOPAD;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::models::UserRole;

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "HS256";

/// Token service errors
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("Malformed token")]
    Malformed,

    #[error("Invalid token signature")]
    InvalidSignature,

    #[error("Token expired")]
    Expired,

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

#[derive(Debug, Serialize, Deserialize)]
struct Header {
    alg: String,
    typ: String,
}

/// Claims carried by every token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User email
    pub sub: String,
    pub role: UserRole,
    /// Issued at, seconds since the epoch
    pub iat: i64,
    /// Expiry, seconds since the epoch
    pub exp: i64,
}

/// Issues and checks signed, time-limited tokens
pub struct TokenService {
    secret: Vec<u8>,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: impl Into<Vec<u8>>, ttl: Duration) -> Self {
        Self {
            secret: secret.into(),
            ttl,
        }
    }

    /// Lifetime of newly issued tokens
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a token for `subject` carrying `role`
    pub fn issue(&self, subject: &str, role: UserRole) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = Claims {
            sub: subject.to_string(),
            role,
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        let header = Header {
            alg: ALGORITHM.to_string(),
            typ: "JWT".to_string(),
        };

        let header = BASE64URL_NOPAD.encode(&serde_json::to_vec(&header).map_err(anyhow::Error::from)?);
        let payload = BASE64URL_NOPAD.encode(&serde_json::to_vec(&claims).map_err(anyhow::Error::from)?);
        let signing_input = format!("{}.{}", header, payload);
        let signature = BASE64URL_NOPAD.encode(&self.sign(signing_input.as_bytes())?);

        Ok(format!("{}.{}", signing_input, signature))
    }

    /// Verify signature and expiry and return the claims
    pub fn decode(&self, token: &str) -> Result<Claims, TokenError> {
        let (signing_input, signature) = token.rsplit_once('.').ok_or(TokenError::Malformed)?;
        let (header, payload) = signing_input
            .split_once('.')
            .filter(|(_, payload)| !payload.contains('.'))
            .ok_or(TokenError::Malformed)?;

        let header: Header = decode_segment(header)?;
        if header.alg != ALGORITHM {
            return Err(TokenError::Malformed);
        }

        let signature = BASE64URL_NOPAD
            .decode(signature.as_bytes())
            .map_err(|_| TokenError::Malformed)?;
        let mut mac = self.mac()?;
        mac.update(signing_input.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| TokenError::InvalidSignature)?;

        let claims: Claims = decode_segment(payload)?;
        if claims.exp <= Utc::now().timestamp() {
            return Err(TokenError::Expired);
        }
        Ok(claims)
    }

    /// Subject of a token whose signature and expiry check out
    pub fn subject(&self, token: &str) -> Result<String, TokenError> {
        Ok(self.decode(token)?.sub)
    }

    /// True when the token is valid and was issued for `expected_subject`
    pub fn validate(&self, token: &str, expected_subject: &str) -> bool {
        matches!(self.decode(token), Ok(claims) if claims.sub == expected_subject)
    }

    fn mac(&self) -> Result<HmacSha256, TokenError> {
        HmacSha256::new_from_slice(&self.secret)
            .map_err(|e| TokenError::InternalError(anyhow::anyhow!("Invalid signing key: {}", e)))
    }

    fn sign(&self, input: &[u8]) -> Result<Vec<u8>, TokenError> {
        let mut mac = self.mac()?;
        mac.update(input);
        Ok(mac.finalize().into_bytes().to_vec())
    }
}

fn decode_segment<T: for<'de> Deserialize<'de>>(segment: &str) -> Result<T, TokenError> {
    let bytes = BASE64URL_NOPAD
        .decode(segment.as_bytes())
        .map_err(|_| TokenError::Malformed)?;
    serde_json::from_slice(&bytes).map_err(|_| TokenError::Malformed)
}
