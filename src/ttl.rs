//! TTL Policy
//!
//! Pure functions deciding how long a stored item lives. No I/O happens here.

use crate::error::{CacheError, Result};

// == Validate ==
/// Validates a client-supplied TTL.
///
/// Negative values are rejected as `BadRequest`. Zero means "not specified"
/// and is carried as-is so that the backend default applies later.
pub fn validate_requested(requested: i64) -> Result<u64> {
    u64::try_from(requested).map_err(|_| {
        CacheError::BadRequest(format!(
            "ttlseconds must not be negative, got {}",
            requested
        ))
    })
}

// == Resolve ==
/// Resolves the effective TTL from a requested value and a backend default.
///
/// A positive request wins. Otherwise the backend default is returned verbatim,
/// including 0 which means the item never expires.
pub fn resolve(requested: u64, backend_default: u64) -> u64 {
    if requested > 0 {
        requested
    } else {
        backend_default
    }
}

// == Cap ==
/// Outcome of clamping a requested TTL to the configured maximum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CappedTtl {
    /// TTL handed to the backend
    pub ttl_seconds: u64,
    /// Seconds requested above the maximum, if any
    pub extra_seconds: Option<u64>,
}

/// Clamps `requested` to `max_ttl`. A `max_ttl` of 0 disables the cap.
pub fn cap(requested: u64, max_ttl: u64) -> CappedTtl {
    if max_ttl > 0 && requested > max_ttl {
        CappedTtl {
            ttl_seconds: max_ttl,
            extra_seconds: Some(requested - max_ttl),
        }
    } else {
        CappedTtl {
            ttl_seconds: requested,
            extra_seconds: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_requested_wins_when_positive() {
        assert_eq!(resolve(30, 300), 30);
    }

    #[test]
    fn test_zero_falls_back_to_default() {
        assert_eq!(resolve(0, 300), 300);
    }

    #[test]
    fn test_zero_default_passes_through() {
        // 0 default means entries never expire on that backend
        assert_eq!(resolve(0, 0), 0);
    }

    #[test]
    fn test_negative_rejected() {
        let err = validate_requested(-1).unwrap_err();
        assert!(matches!(err, CacheError::BadRequest(_)));
    }

    #[test]
    fn test_validate_accepts_zero_and_positive() {
        assert_eq!(validate_requested(0).unwrap(), 0);
        assert_eq!(validate_requested(60).unwrap(), 60);
    }

    #[test]
    fn test_cap_reports_extra() {
        let capped = cap(5000, 3600);
        assert_eq!(capped.ttl_seconds, 3600);
        assert_eq!(capped.extra_seconds, Some(1400));
    }

    #[test]
    fn test_cap_disabled() {
        let capped = cap(5000, 0);
        assert_eq!(capped.ttl_seconds, 5000);
        assert!(capped.extra_seconds.is_none());
    }

    proptest! {
        #[test]
        fn prop_resolve_never_returns_zero_for_positive_request(
            requested in 1u64..u64::MAX,
            default in any::<u64>(),
        ) {
            prop_assert_eq!(resolve(requested, default), requested);
        }

        #[test]
        fn prop_negative_always_rejected(requested in i64::MIN..0) {
            prop_assert!(validate_requested(requested).is_err());
        }

        #[test]
        fn prop_cap_never_exceeds_max(requested in any::<u64>(), max in 1u64..1_000_000) {
            let capped = cap(requested, max);
            prop_assert!(capped.ttl_seconds <= max);
            let extra = capped.extra_seconds.unwrap_or(0);
            prop_assert_eq!(capped.ttl_seconds + extra, requested);
        }
    }
}
