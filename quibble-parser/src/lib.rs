#![no_std]

/*!
Low-level classification of raw command tokens. Takes care of distinguishing
flag-shaped, assignment-shaped, and plain word tokens, that sort of thing. No
type handling and no knowledge of declared arguments happens here; deciding
whether a `--token` actually *names* a declared flag is the engine's job.
Usually this is too low level to use directly.
*/

use core::fmt::{self, Debug};

/**
The syntactic shape of a single whitespace-delimited token.

This classification is purely lexical. A [`Shape::Pair`] might turn out to be
an ordinary positional word (`12:30`), and a [`Shape::Long`] might name a flag,
a key-value expecting its value in the next token, or nothing declared at all.
The consumer resolves those questions against its declared descriptors; tokens
it cannot resolve fall back to being treated as [`Shape::Word`].
*/
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum Shape<'t> {
    /// A long form, `--verbose`. The leading dashes are stripped.
    Long(&'t str),

    /// A negated long form, `--no-verbose`. Contains the name *without* the
    /// `no-` prefix. Only meaningful if the named flag declares negation
    /// support; otherwise the consumer should treat the token as a long form
    /// whose body still carries the `no-` prefix.
    NegatedLong(&'t str),

    /// One or more bundled single-character short forms, `-x` or `-xyz`.
    /// Contains the characters without the leading dash.
    Shorts(&'t str),

    /// An inline assignment, `--key=value`. Dashes and `=` are stripped.
    LongAssign { key: &'t str, value: &'t str },

    /// A bare colon pair, `key:value`. Colon pairs have no dash prefix, so
    /// this shape frequently turns out to be an ordinary word.
    Pair { key: &'t str, value: &'t str },

    /// Anything else: a plain positional word.
    Word(&'t str),
}

impl<'t> Shape<'t> {
    /**
    Classify a single raw token.

    Classification never fails; a token that resembles no recognized shape is
    a [`Shape::Word`]. A lone `-` or a dash followed by something that can't
    be a short-flag bundle (`-5`, `-1.5`) is also a word, so that negative
    numbers survive as positionals.
    */
    #[must_use]
    pub fn classify(token: &'t str) -> Self {
        if let Some(body) = token.strip_prefix("--") {
            if body.is_empty() {
                return Shape::Word(token);
            }

            return match split_once(body, b'=') {
                Some((key, value)) => Shape::LongAssign { key, value },
                None => match body.strip_prefix("no-") {
                    Some(name) if !name.is_empty() => Shape::NegatedLong(name),
                    _ => Shape::Long(body),
                },
            };
        }

        if let Some(body) = token.strip_prefix('-') {
            return match is_short_bundle(body) {
                true => Shape::Shorts(body),
                false => Shape::Word(token),
            };
        }

        match split_once(token, b':') {
            Some((key, value)) if !key.is_empty() => Shape::Pair { key, value },
            _ => Shape::Word(token),
        }
    }

    /// True for shapes that are candidates for flag or key-value handling.
    #[must_use]
    pub const fn is_flag_like(&self) -> bool {
        !matches!(self, Shape::Word(_) | Shape::Pair { .. })
    }
}

impl Debug for Shape<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Shape::Long(name) => write!(f, "Long({name:?})"),
            Shape::NegatedLong(name) => write!(f, "NegatedLong({name:?})"),
            Shape::Shorts(shorts) => write!(f, "Shorts({shorts:?})"),
            Shape::LongAssign { key, value } => write!(f, "LongAssign({key:?}={value:?})"),
            Shape::Pair { key, value } => write!(f, "Pair({key:?}:{value:?})"),
            Shape::Word(word) => write!(f, "Word({word:?})"),
        }
    }
}

/**
Whether an in-progress token looks like the *start* of a flag or key-value
form, before it's complete enough to classify. Completion engines use this to
decide between positional and flag suggestion modes: `-`, `--`, and any token
containing `=` or `:` qualify.
*/
#[must_use]
pub fn looks_flag_like(token: &str) -> bool {
    token.starts_with('-')
        || memchr::memchr2(b'=', b':', token.as_bytes()).is_some()
}

/// A short bundle is one or more ASCII alphanumerics led by a letter.
/// Anything else (digits first, punctuation, empty) keeps its dash and stays
/// a word.
fn is_short_bundle(body: &str) -> bool {
    let mut chars = body.chars();

    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {
            chars.all(|c| c.is_ascii_alphanumeric())
        }
        _ => false,
    }
}

fn split_once(input: &str, delimiter: u8) -> Option<(&str, &str)> {
    memchr::memchr(delimiter, input.as_bytes()).map(|i| (&input[..i], &input[i + 1..]))
}
