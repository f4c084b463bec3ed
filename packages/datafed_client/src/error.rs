//! Remote-call failures, classified by remediation.

#[derive(Debug, Clone, thiserror::Error)]
pub enum ClientError {
    /// The remote service answered 404: the record does not exist.
    #[error("not found")]
    NotFound,

    /// The remote service answered 409: the record already exists.
    #[error("already exists")]
    Conflict,

    /// The remote service rejected the request (4xx) with a reason.
    #[error("request rejected: {0}")]
    Rejected(String),

    /// Transport failure or 5xx: the service could not be reached or is
    /// broken. Retryable, unlike `NotFound`.
    #[error("service unavailable: {0}")]
    Unavailable(String),
}
