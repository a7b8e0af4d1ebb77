use sha2::{Digest, Sha256};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignError {
    #[error("request path cannot be empty")]
    EmptyPath,

    #[error("shared secret cannot be empty")]
    EmptySecret,
}

/// Compute the request signature for `path`, `secret` and `timestamp_ms`.
///
/// The token is the SHA-256 digest of `path + secret + timestamp_ms` as 64
/// lowercase hex characters. The receiving side recomputes it from the same
/// inputs, so the function must stay deterministic.
pub fn sign(path: &str, secret: &str, timestamp_ms: i64) -> Result<String, SignError> {
    validate(path, secret)?;
    Ok(digest(path, secret, timestamp_ms))
}

fn validate(path: &str, secret: &str) -> Result<(), SignError> {
    if path.is_empty() {
        return Err(SignError::EmptyPath);
    }
    if secret.is_empty() {
        return Err(SignError::EmptySecret);
    }
    Ok(())
}

fn digest(path: &str, secret: &str, timestamp_ms: i64) -> String {
    let mut hasher = Sha256::new();
    hasher.update(path.as_bytes());
    hasher.update(secret.as_bytes());
    hasher.update(timestamp_ms.to_string().as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Signing context with a path and secret that were validated up front.
#[derive(Clone)]
pub struct Signer {
    path: String,
    secret: String,
}

impl Signer {
    pub fn new(path: impl Into<String>, secret: impl Into<String>) -> Result<Self, SignError> {
        let path = path.into();
        let secret = secret.into();
        validate(&path, &secret)?;
        Ok(Self { path, secret })
    }

    pub fn sign(&self, timestamp_ms: i64) -> String {
        digest(&self.path, &self.secret, timestamp_ms)
    }

    /// Check a received signature against the one derived locally.
    pub fn verify(&self, timestamp_ms: i64, signature: &str) -> bool {
        self.sign(timestamp_ms).eq_ignore_ascii_case(signature)
    }
}

// Keep the secret out of debug output.
impl std::fmt::Debug for Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signer")
            .field("path", &self.path)
            .field("secret", &"<redacted>")
            .finish()
    }
}
