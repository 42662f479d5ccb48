use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::{Rng, TryRngCore, distr::Alphanumeric, rngs::OsRng};
use sha2::{Digest, Sha256};

use crate::OAuthError;

const VERIFIER_BYTES: usize = 32;

pub const DEFAULT_STATE_LENGTH: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct PkcePair {
    pub code_verifier: String,
    pub code_challenge: String,
}

impl PkcePair {
    pub fn generate() -> Result<Self, OAuthError> {
        let mut bytes = [0u8; VERIFIER_BYTES];
        OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|err| OAuthError::OsRng {
                message: err.to_string(),
            })?;
        Ok(Self::from_verifier(URL_SAFE_NO_PAD.encode(bytes)))
    }

    pub fn from_verifier(code_verifier: impl Into<String>) -> Self {
        let code_verifier = code_verifier.into();
        let code_challenge = URL_SAFE_NO_PAD.encode(Sha256::digest(code_verifier.as_bytes()));
        Self {
            code_verifier,
            code_challenge,
        }
    }
}

/// Opaque `[A-Za-z0-9]` string for the `state` parameter. Not a secret: the
/// thread-local generator is fine here.
pub fn generate_random_string(length: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

pub fn generate_state() -> String {
    generate_random_string(DEFAULT_STATE_LENGTH)
}
