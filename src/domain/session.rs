//! Issues and reads the identity carried in the `token` cookie.
//!
//! Signed tokens look like `<payload>.<signature>` where the payload is base64url JSON
//! claims and the signature is base64url HMAC-SHA256 over the encoded payload.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Name of the cookie holding the session token
pub const SESSION_COOKIE: &str = "token";
/// Value written to the session cookie on logout
pub const LOGGED_OUT_SENTINEL: &str = "None";

const MIN_SECRET_LEN: usize = 32;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("session secret is too short (min {MIN_SECRET_LEN} bytes)")]
    SecretTooShort,
    #[error("session token is malformed")]
    InvalidFormat,
    #[error("session token signature is invalid")]
    InvalidSignature,
    #[error("session token is expired")]
    Expired,
    #[error("failed to encode session claims")]
    Encode,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
struct SessionClaims {
    sub: String,
    exp_ms: u64,
}

/// The way session cookies get issued and read
#[derive(Clone)]
pub enum SessionScheme {
    /// Tokens are HMAC-signed claims with an expiry; passwords are checked at login
    Signed { secret: Arc<[u8]>, ttl: Duration },
    /// The token is the plaintext username and login only checks that the username exists.
    /// Reproduces how the old service behaved so existing clients can be tested against this one.
    Legacy,
}

impl SessionScheme {
    pub fn signed(secret: Vec<u8>, ttl: Duration) -> Result<Self, SessionError> {
        if secret.len() < MIN_SECRET_LEN {
            return Err(SessionError::SecretTooShort);
        }

        Ok(SessionScheme::Signed {
            secret: Arc::from(secret),
            ttl,
        })
    }

    /// Whether login should compare the submitted password with the stored hash
    pub fn verifies_passwords(&self) -> bool {
        matches!(self, SessionScheme::Signed { .. })
    }

    /// Produces a session token identifying [username], valid from [now_ms]
    pub fn issue(&self, username: &str, now_ms: u64) -> Result<String, SessionError> {
        match self {
            SessionScheme::Legacy => Ok(username.to_owned()),
            SessionScheme::Signed { secret, ttl } => {
                let claims = SessionClaims {
                    sub: username.to_owned(),
                    exp_ms: now_ms.saturating_add(ttl.as_millis() as u64),
                };
                let payload = serde_json::to_vec(&claims).map_err(|_| SessionError::Encode)?;
                let payload_b64 = URL_SAFE_NO_PAD.encode(payload);
                let signature = sign(secret, payload_b64.as_bytes())?;

                Ok(format!("{payload_b64}.{}", URL_SAFE_NO_PAD.encode(signature)))
            }
        }
    }

    /// Reads the username out of a session token, rejecting tokens that were tampered with
    /// or have expired as of [now_ms]
    pub fn identify(&self, token: &str, now_ms: u64) -> Result<String, SessionError> {
        if token.is_empty() || token == LOGGED_OUT_SENTINEL {
            return Err(SessionError::InvalidFormat);
        }

        let SessionScheme::Signed { secret, .. } = self else {
            return Ok(token.to_owned());
        };

        let (payload_b64, signature_b64) = token
            .split_once('.')
            .ok_or(SessionError::InvalidFormat)?;
        let signature = URL_SAFE_NO_PAD
            .decode(signature_b64)
            .map_err(|_| SessionError::InvalidFormat)?;

        let mut mac =
            HmacSha256::new_from_slice(secret).map_err(|_| SessionError::InvalidSignature)?;
        mac.update(payload_b64.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| SessionError::InvalidSignature)?;

        let payload = URL_SAFE_NO_PAD
            .decode(payload_b64)
            .map_err(|_| SessionError::InvalidFormat)?;
        let claims: SessionClaims =
            serde_json::from_slice(&payload).map_err(|_| SessionError::InvalidFormat)?;

        if now_ms >= claims.exp_ms {
            return Err(SessionError::Expired);
        }

        Ok(claims.sub)
    }
}

fn sign(secret: &[u8], bytes: &[u8]) -> Result<Vec<u8>, SessionError> {
    let mut mac = HmacSha256::new_from_slice(secret).map_err(|_| SessionError::InvalidSignature)?;
    mac.update(bytes);

    Ok(mac.finalize().into_bytes().to_vec())
}

pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
