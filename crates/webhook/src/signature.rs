//! HMAC-SHA256 verification of GitHub webhook deliveries.
//!
//! GitHub signs the exact bytes of the request body and sends the result as
//! `X-Hub-Signature-256: sha256=<hex>`. Verification always runs on the raw
//! body as received, never on a re-serialized JSON value.

use std::{fmt, sync::Arc};

use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

use crate::infrastructure::constant_time_eq;

pub const SIGNATURE_HEADER: &str = "x-hub-signature-256";
pub const SIGNATURE_PREFIX: &str = "sha256=";

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SignatureError {
    /// No shared secret configured on the server side
    #[error("webhook secret is not configured")]
    NotConfigured,

    #[error("signature missing")]
    Missing,

    #[error("signature mismatch")]
    Mismatch,

    #[error("signature verification error: {0}")]
    Verification(String),
}

impl SignatureError {
    /// Short label used for metrics and log fields
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::NotConfigured => "not_configured",
            Self::Missing => "signature_missing",
            Self::Mismatch => "signature_mismatch",
            Self::Verification(_) => "verification_error",
        }
    }
}

/// Checks webhook signatures against the pre-shared secret
#[derive(Clone)]
pub struct SignatureVerifier {
    secret: Option<Arc<[u8]>>,
}

impl SignatureVerifier {
    /// An empty secret is treated the same as no secret
    pub fn new(secret: Option<&str>) -> Self {
        let secret = secret.filter(|s| !s.is_empty()).map(|s| Arc::from(s.as_bytes()));
        Self { secret }
    }

    pub fn is_configured(&self) -> bool {
        self.secret.is_some()
    }

    /// Verify `signature` (the raw header value) over `body`
    pub fn verify(&self, body: &[u8], signature: Option<&str>) -> Result<(), SignatureError> {
        let secret = self.secret.as_deref().ok_or(SignatureError::NotConfigured)?;
        let signature = signature.ok_or(SignatureError::Missing)?;

        let expected = sign(secret, body)?;
        if constant_time_eq(expected.as_bytes(), signature.as_bytes()) {
            Ok(())
        } else {
            Err(SignatureError::Mismatch)
        }
    }
}

impl fmt::Debug for SignatureVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignatureVerifier")
            .field("secret", &self.secret.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Compute the `sha256=<hex>` header value for `body`
pub fn sign(secret: &[u8], body: &[u8]) -> Result<String, SignatureError> {
    let mut mac = HmacSha256::new_from_slice(secret)
        .map_err(|e| SignatureError::Verification(e.to_string()))?;
    mac.update(body);
    let digest = mac.finalize().into_bytes();

    Ok(format!("{SIGNATURE_PREFIX}{}", hex::encode(digest)))
}
