/*!
The [`ArgumentParser`] trait: a stateless, thread-safe parsing strategy for a
single argument type.

Most code interacts with parsers through the type-erased [`AnyParser`] form,
which is what descriptors carry; [`ArgumentParser`] is the typed surface you
implement. Every `ArgumentParser` gets an `AnyParser` implementation for
free, and any `impl ArgumentParser` can be shared as an [`ArcParser`] via
[`erase`].
*/

use std::sync::Arc;

use crate::access::Caller;
use crate::arguments::BoxedValue;
use crate::outcome::ParseOutcome;

/**
A parsing strategy for one argument type.

Implementations are stateless function bundles: they must be safely callable
concurrently from many parse and completion requests, which in practice means
no mutable instance state.

# Contract

[`type_name`][ArgumentParser::type_name] must never return an empty string.
It serves both as the label in error messages and as a type contract: a
greedy descriptor is only legal when its parser's type name is exactly
`"string"`. Violations are caught when the parser is bound to a descriptor,
and are fatal.
*/
pub trait ArgumentParser: Send + Sync {
    /// The parsed value type.
    type Output: Send + Sync + 'static;

    /// Parse a single token into a value or an error message. Never panics
    /// on malformed input; malformed input is the *expected* case.
    fn parse(&self, token: &str, caller: &dyn Caller) -> ParseOutcome<Self::Output>;

    /// Native completion suggestions for a partial token. This is the lowest
    /// priority suggestion source; parsers with a closed set of inputs (such
    /// as booleans or choice maps) should offer them here.
    fn complete(&self, prefix: &str, caller: &dyn Caller) -> Vec<String> {
        let _ = (prefix, caller);
        Vec::new()
    }

    /// A short, non-empty label for the parsed type, such as `"integer"`.
    fn type_name(&self) -> &'static str;
}

/**
The type-erased form of [`ArgumentParser`], as carried by descriptors.

Heterogeneous descriptor lists and first-match-wins unions need parsers of
different output types behind one interface; values cross that boundary as
[`BoxedValue`]s and recover their types in [`Arguments`][crate::Arguments].
*/
pub trait AnyParser: Send + Sync {
    fn parse_erased(&self, token: &str, caller: &dyn Caller) -> ParseOutcome<BoxedValue>;

    fn complete(&self, prefix: &str, caller: &dyn Caller) -> Vec<String>;

    fn type_name(&self) -> &'static str;
}

/// Shared handle to a type-erased parser.
pub type ArcParser = Arc<dyn AnyParser>;

impl<P: ArgumentParser> AnyParser for P {
    fn parse_erased(&self, token: &str, caller: &dyn Caller) -> ParseOutcome<BoxedValue> {
        self.parse(token, caller)
            .map(|value| Box::new(value) as BoxedValue)
    }

    fn complete(&self, prefix: &str, caller: &dyn Caller) -> Vec<String> {
        ArgumentParser::complete(self, prefix, caller)
    }

    fn type_name(&self) -> &'static str {
        ArgumentParser::type_name(self)
    }
}

/// Share a typed parser as an [`ArcParser`].
#[must_use]
pub fn erase(parser: impl ArgumentParser + 'static) -> ArcParser {
    Arc::new(parser)
}
