//! Signature primitives for the datafed authorization protocol.
//!
//! Every privileged operation in the system is authorized by one mechanism:
//! a detached Ed25519 signature over a canonical message that ends with an
//! `expire_time` freshness bound. The services layer authorization *policy*
//! (who must sign what) on top of the three primitives exported here:
//! [`canonical::message`], [`verify_signature`], and [`check_not_expired`].

pub mod canonical;
pub mod error;
pub mod keys;
pub mod time;

pub use error::AuthError;
pub use keys::{Keypair, verify_signature};
pub use time::{check_not_expired, parse_utc, to_utc_string};
