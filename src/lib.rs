/*!
A declarative token-parsing and adaptive-completion engine; quibble is a more
sensible way to argue with (command) arguments.

Given an ordered argument [`Signature`] (names, types, optionality,
validation rules, greediness, access predicates) and a raw sequence of
whitespace-delimited tokens, quibble deterministically maps tokens to typed
values or structured errors, and independently computes ranked, context-aware
completion suggestions for a partially-typed token.

The crate is split along the same seam as its inputs:

- [`quibble_parser`] (re-exported as [`Shape`]) handles the purely lexical
  classification of tokens into flag, assignment, and word shapes.
- The [`parser`] module provides the [`ArgumentParser`] trait and the
  [`impls`][mod@impls] module its built-in implementations: integers, floats,
  booleans, UUIDs, durations, raw strings, choice maps, alias'd enumerations,
  and first-match-wins unions.
- [`Arg`], [`Flag`], and [`KeyValue`] descriptors bind names to parsers and
  [`ArgumentSpec`]s; a [`Signature`] owns the ordered descriptor list and
  enforces its structural invariants at build time.
- [`Signature::parse`] runs extraction, positional matching, and the
  validation pipeline; [`Signature::complete`] resolves ranked suggestions
  through the debounced, TTL-bounded [`CompletionCache`].

Two error classes are never conflated: descriptor misuse (blank names,
illegal greedy placement, and friends) is a programmer mistake and panics at
definition time, while parse and validation failures are ordinary values of
[`ParseError`], returned to the caller for rendering.
*/

pub mod access;
pub mod arguments;
pub mod cache;
pub mod complete;
pub mod descriptor;
pub mod errors;
pub mod impls;
pub mod outcome;
pub mod parallel;
pub mod parser;
pub mod signature;
pub mod spec;

mod extract;
mod matcher;
mod validate;

pub use quibble_parser::{Shape, looks_flag_like};

pub use crate::access::{Access, Caller, CallerRef};
pub use crate::arguments::Arguments;
pub use crate::cache::{CacheConfig, CompletionCache};
pub use crate::complete::{SuggestionProvider, SuggestionSupplier, rank};
pub use crate::descriptor::{Arg, Flag, KeyValue};
pub use crate::errors::{ParseError, SignatureError};
pub use crate::outcome::ParseOutcome;
pub use crate::parallel::{CoordinatorConfig, ParseCoordinator, ParseTask};
pub use crate::parser::ArgumentParser;
pub use crate::signature::{Signature, SignatureBuilder, SubRoute};
pub use crate::spec::ArgumentSpec;
