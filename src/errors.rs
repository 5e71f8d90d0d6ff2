/*!
Error types for the two error classes the engine keeps apart.

[`ParseError`] is the *user-input* class: expected, recoverable outcomes that
an external renderer turns into user-facing text. [`SignatureError`] is the
*configuration* class: programmer mistakes in descriptor lists, reported at
definition time by [`SignatureBuilder::try_build`][crate::SignatureBuilder]
(or as a panic from `build`). Configuration mistakes that can be caught even
earlier (blank descriptor names, empty parser type names) panic directly at
descriptor construction.
*/

use thiserror::Error;

/// A user-input failure: the tokens didn't satisfy the signature. One is
/// produced per invocation; matching aborts on the first.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Fewer tokens than required descriptors.
    #[error("expected at least {required} argument(s), got {given}")]
    NotEnoughArguments { required: usize, given: usize },

    /// More tokens than descriptors, with no greedy descriptor to absorb
    /// the surplus.
    #[error("expected at most {limit} argument(s), got {given}")]
    TooManyArguments { limit: usize, given: usize },

    /// The command-level guard rejected the caller.
    #[error("access denied")]
    GuardDenied,

    /// A descriptor's access predicate rejected the caller. This aborts the
    /// whole match; later descriptors are never consulted.
    #[error("access denied for argument '{name}'")]
    AccessDenied { name: String },

    /// A token failed to parse or validate against its descriptor.
    #[error("invalid value for argument '{name}' ({type_name}): {message}")]
    InvalidValue {
        name: String,
        type_name: &'static str,
        message: String,
    },

    /// A flag or key-value that doesn't allow repetition appeared twice.
    #[error("'{name}' was given more than once")]
    Duplicate { name: String },

    /// A key announced by `--key` reached the end of the tokens without its
    /// value.
    #[error("missing value for '{key}'")]
    MissingValue { key: String },
}

/// A configuration mistake in a descriptor list, caught at build time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    /// Two descriptors (arguments, flags, or key-values) share a
    /// case-insensitive name.
    #[error("duplicate descriptor name '{name}'")]
    DuplicateName { name: String },

    /// A required descriptor appears after an optional one.
    #[error("required argument '{name}' appears after an optional argument")]
    RequiredAfterOptional { name: String },

    /// More than one descriptor is marked greedy.
    #[error("argument '{name}' is greedy, but an earlier argument already is")]
    MultipleGreedy { name: String },

    /// A greedy descriptor is not the last descriptor.
    #[error("greedy argument '{name}' must be the last argument")]
    GreedyNotLast { name: String },

    /// A greedy descriptor's parser isn't a string parser.
    #[error("greedy argument '{name}' requires a string parser, got '{type_name}'")]
    GreedyNotString {
        name: String,
        type_name: &'static str,
    },
}
