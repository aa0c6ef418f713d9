//! Result type alias for tripstream
//!
//! This module provides a convenient Result type alias that uses TripstreamError
//! as the error type.

use super::errors::TripstreamError;

/// Result type alias for tripstream operations
///
/// # Examples
///
/// ```
/// use tripstream::domain::result::Result;
/// use tripstream::domain::errors::TripstreamError;
///
/// fn example_function() -> Result<String> {
///     Ok("success".to_string())
/// }
///
/// fn failing_function() -> Result<()> {
///     Err(TripstreamError::EmptySource("fhv_final.jsonl".to_string()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, TripstreamError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_with_question_mark() -> Result<()> {
        fn inner() -> Result<u64> {
            Ok(42)
        }

        let value = inner()?;
        assert_eq!(value, 42);
        Ok(())
    }

    #[test]
    fn test_result_err() {
        let result: Result<u64> = Err(TripstreamError::Allocation("contention".to_string()));
        assert!(result.is_err());
    }
}
