use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, thiserror::Error)]
pub enum SignError {
    #[error("signing key secret is empty")]
    InvalidKey,
    #[error("invalid operation: {0}")]
    InvalidOperation(String),
    #[error("organization id is empty")]
    InvalidOrg,
    #[error("query parameter not encodable: {0}")]
    EncodingError(String),
}

/// Base64-encoded HMAC-SHA256 digest. Always 44 characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureToken(String);

impl SignatureToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SignatureToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Sign a canonical signing string with a shared secret.
///
/// Computes HMAC-SHA256 over the UTF-8 bytes of `signing_string` and
/// base64-encodes the digest (standard alphabet, padded). Deterministic
/// and side-effect free.
pub fn sign(signing_string: &str, secret: &[u8]) -> Result<SignatureToken, SignError> {
    if secret.is_empty() {
        return Err(SignError::InvalidKey);
    }

    let mut mac = HmacSha256::new_from_slice(secret).map_err(|_| SignError::InvalidKey)?;
    mac.update(signing_string.as_bytes());
    let digest = mac.finalize().into_bytes();

    Ok(SignatureToken(
        base64::engine::general_purpose::STANDARD.encode(digest),
    ))
}
