//! Outcome Classifier
//!
//! Maps HTTP statuses and storage results onto the three outcome buckets used
//! by every status counter.

use axum::http::StatusCode;

use crate::error::CacheError;

/// Classification of a finished operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    Success,
    ClientError,
    ServerError,
}

impl Outcome {
    /// Classifies a response status.
    ///
    /// `None` means the handler never set a status, which HTTP frameworks
    /// treat as an implicit 200.
    pub fn from_status(status: Option<StatusCode>) -> Self {
        match status.map(|s| s.as_u16()) {
            None => Outcome::Success,
            Some(200..=299) => Outcome::Success,
            Some(400..=499) => Outcome::ClientError,
            Some(_) => Outcome::ServerError,
        }
    }

    /// Classifies the result of a backend call.
    pub fn from_result<T>(result: &Result<T, CacheError>) -> Self {
        match result {
            Ok(_) => Outcome::Success,
            Err(err) => Self::from_error(err),
        }
    }

    /// Classifies a storage error.
    pub fn from_error(err: &CacheError) -> Self {
        match err {
            CacheError::NotFound(_) | CacheError::BadRequest(_) => Outcome::ClientError,
            CacheError::Backend(_) => Outcome::ServerError,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(code: u16) -> Option<StatusCode> {
        Some(StatusCode::from_u16(code).unwrap())
    }

    #[test]
    fn test_unset_status_is_success() {
        assert_eq!(Outcome::from_status(None), Outcome::Success);
    }

    #[test]
    fn test_status_ranges() {
        assert_eq!(Outcome::from_status(status(200)), Outcome::Success);
        assert_eq!(Outcome::from_status(status(204)), Outcome::Success);
        assert_eq!(Outcome::from_status(status(299)), Outcome::Success);
        assert_eq!(Outcome::from_status(status(400)), Outcome::ClientError);
        assert_eq!(Outcome::from_status(status(404)), Outcome::ClientError);
        assert_eq!(Outcome::from_status(status(499)), Outcome::ClientError);
        assert_eq!(Outcome::from_status(status(500)), Outcome::ServerError);
        assert_eq!(Outcome::from_status(status(503)), Outcome::ServerError);
    }

    #[test]
    fn test_other_ranges_are_server_errors() {
        assert_eq!(Outcome::from_status(status(101)), Outcome::ServerError);
        assert_eq!(Outcome::from_status(status(302)), Outcome::ServerError);
        assert_eq!(Outcome::from_status(status(999)), Outcome::ServerError);
    }

    #[test]
    fn test_results() {
        let ok: Result<(), CacheError> = Ok(());
        assert_eq!(Outcome::from_result(&ok), Outcome::Success);

        let bad: Result<(), CacheError> = Err(CacheError::BadRequest("ttl".into()));
        assert_eq!(Outcome::from_result(&bad), Outcome::ClientError);

        let missing: Result<(), CacheError> = Err(CacheError::NotFound("k".into()));
        assert_eq!(Outcome::from_result(&missing), Outcome::ClientError);

        let failed: Result<(), CacheError> = Err(CacheError::Backend("io".into()));
        assert_eq!(Outcome::from_result(&failed), Outcome::ServerError);
    }
}
