//! Ed25519 keypairs, PEM/base64 codecs, and standalone verification.
//!
//! Public keys travel through the protocol as PEM-encoded SPKI documents;
//! signatures travel as standard base64 (padded). Secret keys never leave
//! the party that generated them; only the connector persists its own.

use data_encoding::BASE64;
use ed25519_dalek::pkcs8::spki::der::pem::LineEnding;
use ed25519_dalek::pkcs8::{DecodePublicKey, EncodePublicKey};
use ed25519_dalek::{Signer, Verifier, VerifyingKey};
use rand::rngs::OsRng;

use crate::error::AuthError;

/// An Ed25519 keypair held by a signing party (the connector, or tests).
#[derive(Clone)]
pub struct Keypair(ed25519_dalek::SigningKey);

impl Keypair {
    pub fn generate() -> Self {
        Self(ed25519_dalek::SigningKey::generate(&mut OsRng))
    }

    /// Reconstruct from the raw 32-byte seed.
    pub fn from_seed(seed: [u8; 32]) -> Self {
        Self(ed25519_dalek::SigningKey::from_bytes(&seed))
    }

    /// Reconstruct from a base64-encoded seed (the connector's storage form).
    pub fn from_seed_base64(encoded: &str) -> Result<Self, AuthError> {
        let raw = BASE64
            .decode(encoded.as_bytes())
            .map_err(|e| AuthError::MalformedInput(format!("secret key: {e}")))?;
        let seed: [u8; 32] = raw
            .try_into()
            .map_err(|_| AuthError::MalformedInput("secret key must be 32 bytes".into()))?;
        Ok(Self::from_seed(seed))
    }

    /// Base64-encoded 32-byte seed, suitable for persistent storage.
    pub fn seed_base64(&self) -> String {
        BASE64.encode(&self.0.to_bytes())
    }

    /// The public half as a PEM-encoded SPKI document.
    pub fn public_key_pem(&self) -> Result<String, AuthError> {
        self.0
            .verifying_key()
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| AuthError::MalformedInput(format!("public key encode: {e}")))
    }

    /// Sign a canonical message, returning the base64-encoded signature.
    pub fn sign_base64(&self, message: &[u8]) -> String {
        BASE64.encode(&self.0.sign(message).to_bytes())
    }
}

impl std::fmt::Debug for Keypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Keypair(..)")
    }
}

/// Verify a base64 signature over `message` against a PEM public key.
///
/// Fails with `MalformedInput` when the key or signature cannot be decoded,
/// `InvalidSignature` when the signature does not verify.
pub fn verify_signature(
    public_key_pem: &str,
    message: &[u8],
    signature_b64: &str,
) -> Result<(), AuthError> {
    let vk = VerifyingKey::from_public_key_pem(public_key_pem)
        .map_err(|e| AuthError::MalformedInput(format!("public key: {e}")))?;
    let raw = BASE64
        .decode(signature_b64.as_bytes())
        .map_err(|e| AuthError::MalformedInput(format!("signature: {e}")))?;
    let arr: [u8; 64] = raw
        .try_into()
        .map_err(|_| AuthError::MalformedInput("signature must be 64 bytes".into()))?;
    let sig = ed25519_dalek::Signature::from_bytes(&arr);
    vk.verify(message, &sig)
        .map_err(|_| AuthError::InvalidSignature)
}
