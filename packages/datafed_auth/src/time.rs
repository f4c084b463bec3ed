//! Timestamp parsing and signature freshness.
//!
//! All timestamps on the wire are RFC 3339 text with an explicit UTC marker
//! (e.g. `2030-01-01T00:00:00Z`). Stored timestamps are normalized through
//! [`to_utc_string`], which keeps lexicographic order equal to chronological
//! order.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::error::AuthError;

/// Parse an RFC 3339 timestamp into UTC.
pub fn parse_utc(value: &str) -> Result<DateTime<Utc>, AuthError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| AuthError::MalformedInput(format!("timestamp {value:?}: {e}")))
}

/// Render a UTC timestamp in the wire format (`...Z`, whole seconds).
pub fn to_utc_string(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Reject a signature whose `expire_time` has passed.
///
/// An `expire_time` exactly equal to the current instant is still valid:
/// only a strictly later "now" triggers `Expired`.
pub fn check_not_expired(expire_time: &str) -> Result<(), AuthError> {
    let expires = parse_utc(expire_time)?;
    if Utc::now() > expires {
        Err(AuthError::Expired)
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn future_expiry_accepted() {
        let t = to_utc_string(Utc::now() + Duration::minutes(5));
        assert!(check_not_expired(&t).is_ok());
    }

    #[test]
    fn past_expiry_rejected() {
        let t = to_utc_string(Utc::now() - Duration::seconds(1));
        assert_eq!(check_not_expired(&t), Err(AuthError::Expired));
    }

    #[test]
    fn offset_form_accepted() {
        // RFC 3339 with a numeric offset parses the same instant as Z.
        let z = parse_utc("2030-01-01T00:00:00Z").unwrap();
        let offset = parse_utc("2030-01-01T09:00:00+09:00").unwrap();
        assert_eq!(z, offset);
    }

    #[test]
    fn garbage_timestamp_is_malformed() {
        assert!(matches!(
            check_not_expired("next tuesday"),
            Err(AuthError::MalformedInput(_))
        ));
    }

    #[test]
    fn wire_format_is_sortable() {
        let early = to_utc_string(parse_utc("2030-01-01T00:00:00Z").unwrap());
        let late = to_utc_string(parse_utc("2030-06-01T00:00:00Z").unwrap());
        assert!(early < late);
        assert!(early.ends_with('Z'));
    }
}
