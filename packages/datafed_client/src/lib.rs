//! HTTP clients consumed across datafed services.
//!
//! The key directory is the trust anchor of the protocol: the catalog and
//! local access-control services resolve a claimed identity's public key
//! here before verifying any signature. A directory outage must stay
//! distinguishable from "identity never registered", so [`ClientError`]
//! separates `Unavailable` from `NotFound`.

pub mod catalog;
pub mod directory;
pub mod error;

pub use catalog::CatalogClient;
pub use directory::{DirectoryClient, KeyRecord};
pub use error::ClientError;
