//! Rate limit configuration shared by every pattern of one logger.

use std::fmt;
use std::time::Duration;

/// Error returned when a rate limit configuration is invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateError {
    /// At least one event per period must be allowed
    ZeroMaxRate,
    /// Period length must be greater than zero
    ZeroPeriod,
}

impl fmt::Display for RateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RateError::ZeroMaxRate => write!(f, "max_rate must be greater than 0"),
            RateError::ZeroPeriod => write!(f, "period must be greater than 0"),
        }
    }
}

impl std::error::Error for RateError {}

/// Maximum number of events allowed per period.
///
/// Compared by value. One instance is shared (behind an `Arc`) by all
/// patterns created from the same logger.
///
/// # Example
/// ```
/// use rate_limited_log::{RateAndPeriod, RateError};
/// use std::time::Duration;
///
/// let rate = RateAndPeriod::new(10, Duration::from_secs(10)).unwrap();
/// assert_eq!(rate.max_rate(), 10);
///
/// assert_eq!(
///     RateAndPeriod::new(0, Duration::from_secs(1)),
///     Err(RateError::ZeroMaxRate)
/// );
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RateAndPeriod {
    max_rate: u32,
    period: Duration,
}

impl RateAndPeriod {
    /// Create a new rate limit.
    ///
    /// # Errors
    /// Returns `RateError::ZeroMaxRate` if `max_rate` is zero, or
    /// `RateError::ZeroPeriod` if `period` is zero.
    pub fn new(max_rate: u32, period: Duration) -> Result<Self, RateError> {
        if max_rate == 0 {
            return Err(RateError::ZeroMaxRate);
        }
        if period.is_zero() {
            return Err(RateError::ZeroPeriod);
        }
        Ok(Self { max_rate, period })
    }

    /// Events allowed per period.
    pub fn max_rate(&self) -> u32 {
        self.max_rate
    }

    /// Length of one period.
    pub fn period(&self) -> Duration {
        self.period
    }
}

impl fmt::Display for RateAndPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} per {:?}", self.max_rate, self.period)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_rate() {
        let rate = RateAndPeriod::new(3, Duration::from_millis(500)).unwrap();
        assert_eq!(rate.max_rate(), 3);
        assert_eq!(rate.period(), Duration::from_millis(500));
    }

    #[test]
    fn test_zero_max_rate() {
        let result = RateAndPeriod::new(0, Duration::from_secs(1));
        assert!(matches!(result, Err(RateError::ZeroMaxRate)));
    }

    #[test]
    fn test_zero_period() {
        let result = RateAndPeriod::new(1, Duration::ZERO);
        assert!(matches!(result, Err(RateError::ZeroPeriod)));
    }

    #[test]
    fn test_equality_by_value() {
        let a = RateAndPeriod::new(5, Duration::from_secs(1)).unwrap();
        let b = RateAndPeriod::new(5, Duration::from_millis(1000)).unwrap();
        let c = RateAndPeriod::new(6, Duration::from_secs(1)).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_display() {
        let rate = RateAndPeriod::new(10, Duration::from_secs(10)).unwrap();
        assert_eq!(rate.to_string(), "10 per 10s");
    }
}
