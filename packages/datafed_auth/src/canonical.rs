//! Canonical message construction: the exact bytes that are signed and later
//! re-derived for verification.

/// Concatenate fields in the caller's order with no separator.
///
/// Signer and verifier must pass byte-identical fields in exactly the same
/// order, which is why every operation in the protocol documents its field
/// order. The encoding is deliberately separator-free for wire compatibility
/// with the deployed protocol: two different field splits can produce the
/// same byte string, so callers must not accept fields whose boundaries an
/// attacker controls on both sides of a split.
pub fn message(fields: &[&str]) -> Vec<u8> {
    let mut msg = Vec::with_capacity(fields.iter().map(|f| f.len()).sum());
    for field in fields {
        msg.extend_from_slice(field.as_bytes());
    }
    msg
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concatenates_in_order() {
        let msg = message(&["alice", "-----BEGIN PUBLIC KEY-----", "2030-01-01T00:00:00Z"]);
        assert_eq!(
            msg,
            b"alice-----BEGIN PUBLIC KEY-----2030-01-01T00:00:00Z".to_vec()
        );
    }

    #[test]
    fn order_matters() {
        assert_ne!(message(&["ab", "c"]), message(&["c", "ab"]));
    }

    #[test]
    fn no_separator() {
        // The documented ambiguity: different splits, same bytes.
        assert_eq!(message(&["ab", "c"]), message(&["a", "bc"]));
    }

    #[test]
    fn empty_fields_are_identity() {
        assert_eq!(message(&["", "x", ""]), message(&["x"]));
    }
}
