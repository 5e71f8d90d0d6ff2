/*!
[`ParseOutcome`], the atomic unit every argument parser returns.
*/

use core::fmt::Display;

/**
The result of a single `parse` call: either a value or an error message,
never both.

A successful outcome may legitimately carry no value, for parsers of nullable
types; that case is distinguished from failure by the absence of an error
message, not by the absence of a value. Outcomes are constructed only through
[`success`][ParseOutcome::success], [`success_empty`][ParseOutcome::success_empty],
and [`error`][ParseOutcome::error].
*/
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseOutcome<T> {
    /// The token parsed. `None` is a legitimate parsed "no value".
    Success(Option<T>),

    /// The token did not parse; the message is a raw, unlocalized reason
    /// intended for an external renderer.
    Failure(String),
}

impl<T> ParseOutcome<T> {
    /// A successful outcome carrying a value.
    #[inline]
    #[must_use]
    pub fn success(value: T) -> Self {
        Self::Success(Some(value))
    }

    /// A successful outcome carrying no value, for nullable types.
    #[inline]
    #[must_use]
    pub fn success_empty() -> Self {
        Self::Success(None)
    }

    /// A failed outcome with the given error message.
    #[inline]
    #[must_use]
    pub fn error(message: impl Display) -> Self {
        Self::Failure(message.to_string())
    }

    #[inline]
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// The error message, if this outcome is a failure.
    #[inline]
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Success(_) => None,
            Self::Failure(message) => Some(message),
        }
    }

    /// Convert into a `Result`, preserving the nullable-success distinction.
    #[inline]
    pub fn into_result(self) -> Result<Option<T>, String> {
        match self {
            Self::Success(value) => Ok(value),
            Self::Failure(message) => Err(message),
        }
    }

    /// Map the success value, leaving failures untouched.
    #[inline]
    pub fn map<U>(self, op: impl FnOnce(T) -> U) -> ParseOutcome<U> {
        match self {
            Self::Success(value) => ParseOutcome::Success(value.map(op)),
            Self::Failure(message) => ParseOutcome::Failure(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ParseOutcome;

    #[test]
    fn success_and_failure_are_distinct() {
        let ok: ParseOutcome<u32> = ParseOutcome::success(10);
        let empty: ParseOutcome<u32> = ParseOutcome::success_empty();
        let bad: ParseOutcome<u32> = ParseOutcome::error("nope");

        assert!(ok.is_success());
        assert!(empty.is_success());
        assert!(!bad.is_success());

        // empty success is not a failure
        assert_eq!(empty.error_message(), None);
        assert_eq!(bad.error_message(), Some("nope"));
    }

    #[test]
    fn map_preserves_emptiness() {
        let empty: ParseOutcome<u32> = ParseOutcome::success_empty();
        assert_eq!(empty.map(|n| n * 2), ParseOutcome::success_empty());

        let ok: ParseOutcome<u32> = ParseOutcome::success(4);
        assert_eq!(ok.map(|n| n * 2), ParseOutcome::success(8));
    }
}
