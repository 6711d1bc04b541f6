//! Self-describing session tokens.
//!
//! Token shape: `base64(username "." expiry_unix_seconds) "." hex_signature`
//! where the signature is the SHA-1 of the base64 payload concatenated with
//! the server secret. Validation is stateless: recompute and compare, then
//! check expiry.

use std::time::{SystemTime, UNIX_EPOCH};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use biogit_hash::Hasher;

/// Default token lifetime in seconds.
pub const DEFAULT_TOKEN_LIFETIME_SECS: u64 = 3600;

/// Errors from token issuing and validation.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("malformed token")]
    Malformed,

    #[error("token signature mismatch")]
    BadSignature,

    #[error("token expired")]
    Expired,
}

/// Issues and validates tokens against a server secret.
pub struct TokenSigner {
    secret: String,
    lifetime_secs: u64,
}

impl TokenSigner {
    /// Create a signer with the default lifetime.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            lifetime_secs: DEFAULT_TOKEN_LIFETIME_SECS,
        }
    }

    /// Override the token lifetime.
    pub fn with_lifetime(mut self, lifetime_secs: u64) -> Self {
        self.lifetime_secs = lifetime_secs;
        self
    }

    /// Issue a token for a username, expiring `lifetime_secs` from now.
    pub fn issue(&self, username: &str) -> String {
        let expiry = now_secs() + self.lifetime_secs;
        self.issue_with_expiry(username, expiry)
    }

    fn issue_with_expiry(&self, username: &str, expiry: u64) -> String {
        let payload = BASE64.encode(format!("{username}.{expiry}"));
        let sig = self.sign(&payload);
        format!("{payload}.{sig}")
    }

    /// Validate a token; returns the username it was issued for.
    pub fn validate(&self, token: &str) -> Result<String, TokenError> {
        let (payload, sig) = token.rsplit_once('.').ok_or(TokenError::Malformed)?;

        if self.sign(payload) != sig {
            return Err(TokenError::BadSignature);
        }

        let decoded = BASE64.decode(payload).map_err(|_| TokenError::Malformed)?;
        let decoded = String::from_utf8(decoded).map_err(|_| TokenError::Malformed)?;
        let (username, expiry) = decoded.rsplit_once('.').ok_or(TokenError::Malformed)?;
        let expiry: u64 = expiry.parse().map_err(|_| TokenError::Malformed)?;

        if now_secs() >= expiry {
            return Err(TokenError::Expired);
        }
        Ok(username.to_string())
    }

    fn sign(&self, payload: &str) -> String {
        let mut input = Vec::with_capacity(payload.len() + self.secret.len());
        input.extend_from_slice(payload.as_bytes());
        input.extend_from_slice(self.secret.as_bytes());
        // SHA-1 over ASCII input cannot trip collision detection.
        match Hasher::digest(&input) {
            Ok(oid) => oid.to_hex(),
            Err(_) => String::new(),
        }
    }
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issue_validate_roundtrip() {
        let signer = TokenSigner::new("server-secret");
        let token = signer.issue("jane");
        assert_eq!(signer.validate(&token).unwrap(), "jane");
    }

    #[test]
    fn username_with_dot_survives() {
        let signer = TokenSigner::new("s");
        let token = signer.issue("jane.doe");
        assert_eq!(signer.validate(&token).unwrap(), "jane.doe");
    }

    #[test]
    fn tampered_payload_rejected() {
        let signer = TokenSigner::new("s");
        let token = signer.issue("jane");
        let (_, sig) = token.rsplit_once('.').unwrap();
        let forged = format!("{}.{}", BASE64.encode("mallory.9999999999"), sig);
        assert_eq!(signer.validate(&forged), Err(TokenError::BadSignature));
    }

    #[test]
    fn wrong_secret_rejected() {
        let token = TokenSigner::new("secret-a").issue("jane");
        assert_eq!(
            TokenSigner::new("secret-b").validate(&token),
            Err(TokenError::BadSignature)
        );
    }

    #[test]
    fn expired_token_rejected() {
        let signer = TokenSigner::new("s");
        let token = signer.issue_with_expiry("jane", now_secs().saturating_sub(10));
        assert_eq!(signer.validate(&token), Err(TokenError::Expired));
    }

    #[test]
    fn garbage_rejected() {
        let signer = TokenSigner::new("s");
        assert_eq!(signer.validate("nodots"), Err(TokenError::Malformed));
        assert_eq!(
            signer.validate("!!!notbase64.aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa"),
            Err(TokenError::BadSignature)
        );
    }
}
