use crate::common::error::AdsyncError;

/// Result alias used across the crate.
pub type AdsyncResult<T> = Result<T, AdsyncError>;
