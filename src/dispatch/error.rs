use thiserror::Error;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("no online courier within the pickup radius")]
    NoCandidates,
    #[error("dispatch deadline exceeded without assignment")]
    Timeout,
    #[error("a dispatch run is already in flight for this order")]
    AlreadyInFlight,
    #[error("storage failure during dispatch: {0}")]
    Storage(String),
}

impl From<crate::order::error::OrderError> for DispatchError {
    fn from(err: crate::order::error::OrderError) -> Self {
        DispatchError::Storage(err.to_string())
    }
}

impl From<crate::cache::CacheError> for DispatchError {
    fn from(err: crate::cache::CacheError) -> Self {
        DispatchError::Storage(err.to_string())
    }
}
