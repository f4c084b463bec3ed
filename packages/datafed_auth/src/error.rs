//! Error taxonomy shared by every signature check in the protocol.

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// A key, signature, or timestamp could not be decoded.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// The signature decoded but does not verify against the public key.
    #[error("invalid signature")]
    InvalidSignature,

    /// The signature's `expire_time` is in the past.
    #[error("signature expired")]
    Expired,
}

impl AuthError {
    /// Stable machine-readable code, used in HTTP error bodies.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::MalformedInput(_) => "malformed_input",
            Self::InvalidSignature => "invalid_signature",
            Self::Expired => "expired",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes() {
        assert_eq!(
            AuthError::MalformedInput("bad pem".into()).error_code(),
            "malformed_input"
        );
        assert_eq!(AuthError::InvalidSignature.error_code(), "invalid_signature");
        assert_eq!(AuthError::Expired.error_code(), "expired");
    }
}
