/*!
Descriptors: the immutable bindings of a name to a parser and its
configuration.

[`Arg`] describes a positional argument; [`Flag`] and [`KeyValue`] describe
the named tokens the extractor strips out before positional matching runs.
All three are created once at command-definition time and shared freely
afterwards; their "mutators" always return a new descriptor built from the
old one's fields, never an in-place change, so a descriptor can safely be
reused across many command definitions.
*/

use crate::access::Access;
use crate::arguments::BoxedValue;
use crate::parser::{ArcParser, ArgumentParser, erase};
use crate::spec::{ArgumentSpec, DefaultValue, default_value};

fn checked_name(name: impl Into<String>, kind: &str) -> String {
    let name = name.into();

    assert!(
        !name.trim().is_empty(),
        "{kind} names must not be blank"
    );
    assert!(
        !name.contains(char::is_whitespace),
        "{kind} name {name:?} must not contain whitespace"
    );

    name
}

fn checked_parser(parser: ArcParser, name: &str) -> ArcParser {
    assert!(
        !parser.type_name().is_empty(),
        "parser bound to {name:?} reports an empty type name"
    );

    parser
}

/**
A positional argument descriptor: `(name, parser, spec)`.

# Panics

Construction panics on a blank or whitespace-containing name, or on a parser
whose `type_name()` is empty. Both are configuration errors and fail fast.
*/
#[derive(Clone)]
pub struct Arg {
    name: String,
    parser: ArcParser,
    spec: ArgumentSpec,
}

impl Arg {
    /// A required, non-greedy argument with a default spec.
    #[must_use]
    pub fn new(name: impl Into<String>, parser: impl ArgumentParser + 'static) -> Self {
        Self::from_parts(name, erase(parser), ArgumentSpec::default())
    }

    /// Build a descriptor from an already-erased parser and an explicit spec.
    #[must_use]
    pub fn from_parts(name: impl Into<String>, parser: ArcParser, spec: ArgumentSpec) -> Self {
        let name = checked_name(name, "argument");
        let parser = checked_parser(parser, &name);

        Self { name, parser, spec }
    }

    /// This descriptor, but with the given spec.
    #[must_use]
    pub fn with_spec(self, spec: ArgumentSpec) -> Self {
        Self { spec, ..self }
    }

    /// This descriptor, but optional (or required again).
    #[must_use]
    pub fn optional(self, optional: bool) -> Self {
        let spec = self.spec.rebuild().optional(optional).build();
        Self { spec, ..self }
    }

    /// This descriptor, but greedy. Whether greediness is *legal* here (last
    /// position, string parser) is checked when the signature is built.
    #[must_use]
    pub fn greedy(self) -> Self {
        let spec = self.spec.rebuild().greedy(true).build();
        Self { spec, ..self }
    }

    /// This descriptor, but gated on the given access predicate.
    #[must_use]
    pub fn with_access(self, access: Access) -> Self {
        let spec = self.spec.rebuild().access(access).build();
        Self { spec, ..self }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.parser.type_name()
    }

    #[must_use]
    pub fn spec(&self) -> &ArgumentSpec {
        &self.spec
    }

    #[must_use]
    pub fn parser(&self) -> &ArcParser {
        &self.parser
    }

    #[must_use]
    pub fn is_optional(&self) -> bool {
        self.spec.optional
    }

    #[must_use]
    pub fn is_greedy(&self) -> bool {
        self.spec.greedy
    }
}

/**
A boolean flag descriptor: `--name`, `-x`, and (with negation support
declared) `--no-name`.
*/
#[derive(Clone)]
pub struct Flag {
    name: String,
    short: Option<char>,
    negatable: bool,
    access: Access,
}

impl Flag {
    /// # Panics
    ///
    /// Panics on a blank or whitespace-containing name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: checked_name(name, "flag"),
            short: None,
            negatable: false,
            access: Access::open(),
        }
    }

    /// This flag, but also answering to `-short`.
    #[must_use]
    pub fn short(self, short: char) -> Self {
        Self {
            short: Some(short),
            ..self
        }
    }

    /// This flag, but accepting `--no-name` to mean `false`.
    #[must_use]
    pub fn negatable(self) -> Self {
        Self {
            negatable: true,
            ..self
        }
    }

    #[must_use]
    pub fn with_access(self, access: Access) -> Self {
        Self { access, ..self }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn short_name(&self) -> Option<char> {
        self.short
    }

    #[must_use]
    pub fn is_negatable(&self) -> bool {
        self.negatable
    }

    #[must_use]
    pub fn access(&self) -> &Access {
        &self.access
    }
}

/**
A key-value descriptor: `--key=value`, `key:value`, or `--key value`.

Key-values carry a parser for their value and, optionally, a default that
lands in the result map when the key never appears.
*/
#[derive(Clone)]
pub struct KeyValue {
    key: String,
    short: Option<char>,
    parser: ArcParser,
    default: Option<DefaultValue>,
    multiple: bool,
    access: Access,
}

impl KeyValue {
    /// # Panics
    ///
    /// Panics on a blank or whitespace-containing key, or a parser with an
    /// empty type name.
    #[must_use]
    pub fn new(key: impl Into<String>, parser: impl ArgumentParser + 'static) -> Self {
        let key = checked_name(key, "key-value");
        let parser = checked_parser(erase(parser), &key);

        Self {
            key,
            short: None,
            parser,
            default: None,
            multiple: false,
            access: Access::open(),
        }
    }

    /// This key-value, but also answering to `-short value`.
    #[must_use]
    pub fn short(self, short: char) -> Self {
        Self {
            short: Some(short),
            ..self
        }
    }

    /// This key-value, but allowed to appear more than once; parsed values
    /// collect into a `Vec` in the result map.
    #[must_use]
    pub fn multiple(self) -> Self {
        Self {
            multiple: true,
            ..self
        }
    }

    /// This key-value, but with a default for when the key never appears.
    #[must_use]
    pub fn with_default<T: Clone + Send + Sync + 'static>(self, value: T) -> Self {
        Self {
            default: Some(default_value(value)),
            ..self
        }
    }

    #[must_use]
    pub fn with_access(self, access: Access) -> Self {
        Self { access, ..self }
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[must_use]
    pub fn short_name(&self) -> Option<char> {
        self.short
    }

    #[must_use]
    pub fn allows_multiple(&self) -> bool {
        self.multiple
    }

    #[must_use]
    pub fn access(&self) -> &Access {
        &self.access
    }

    #[must_use]
    pub fn parser(&self) -> &ArcParser {
        &self.parser
    }

    pub(crate) fn default(&self) -> Option<BoxedValue> {
        self.default.as_ref().map(|default| default())
    }
}

#[cfg(test)]
mod tests {
    use super::{Arg, Flag};
    use crate::impls::{IntParser, StringParser};

    #[test]
    fn mutators_return_new_descriptors() {
        let base = Arg::new("target", StringParser);
        let optional = base.clone().optional(true);

        assert!(!base.is_optional());
        assert!(optional.is_optional());
        assert_eq!(base.name(), optional.name());
    }

    #[test]
    #[should_panic(expected = "must not be blank")]
    fn blank_names_fail_fast() {
        let _ = Arg::new("  ", IntParser);
    }

    #[test]
    #[should_panic(expected = "must not contain whitespace")]
    fn whitespace_names_fail_fast() {
        let _ = Arg::new("two words", IntParser);
    }

    #[test]
    fn flags_build_by_chaining() {
        let flag = Flag::new("verbose").short('v').negatable();

        assert_eq!(flag.name(), "verbose");
        assert_eq!(flag.short_name(), Some('v'));
        assert!(flag.is_negatable());
    }
}
