/*!
[`Signature`]: the ordered descriptor list owned by a command definition,
together with its flags, key-values, guard, and sub-routes.

A signature enforces its structural invariants when it is *built*, never when
it is used:

1. no two descriptors (arguments, flags, or key-values) share a
   case-insensitive name;
2. once an optional argument appears, no later argument may be required;
3. at most one argument is greedy, it must be the last, and its parser's
   type name must be exactly `"string"`.
*/

use core::time::Duration;

use crate::access::{Access, Caller, CallerRef};
use crate::arguments::Arguments;
use crate::cache::CompletionCache;
use crate::complete;
use crate::descriptor::{Arg, Flag, KeyValue};
use crate::errors::{ParseError, SignatureError};
use crate::matcher;

/// A named sub-route of the enclosing command, offered as a first-token
/// completion. The engine never routes between sub-routes; it only suggests
/// their names, access-filtered.
#[derive(Clone)]
pub struct SubRoute {
    pub(crate) name: String,
    pub(crate) access: Access,
}

impl SubRoute {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            access: Access::open(),
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
}

/// Knobs for completion resolution, carried by the signature.
#[derive(Clone)]
pub(crate) struct ResolverOptions {
    pub(crate) validate_on_tab: bool,
    pub(crate) fuzzy_threshold: Option<i64>,
    pub(crate) source_timeout: Duration,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            validate_on_tab: false,
            fuzzy_threshold: None,
            source_timeout: Duration::from_millis(2000),
        }
    }
}

/**
An immutable, validated command signature. Build one with
[`Signature::builder`]; parsing and completion both happen here, via
[`parse`][Signature::parse] and [`complete`][Signature::complete].
*/
#[derive(Clone)]
pub struct Signature {
    pub(crate) args: Vec<Arg>,
    pub(crate) flags: Vec<Flag>,
    pub(crate) key_values: Vec<KeyValue>,
    pub(crate) guard: Access,
    pub(crate) sub_routes: Vec<SubRoute>,
    pub(crate) options: ResolverOptions,
}

impl Signature {
    #[must_use]
    pub fn builder() -> SignatureBuilder {
        SignatureBuilder::default()
    }

    /**
    Parse a full token sequence against this signature.

    Flags and key-values are extracted first; the residual positional tokens
    then walk the ordered argument list. The result map contains exactly the
    descriptors that received a value (plus any configured defaults); the
    first user-input problem aborts with a [`ParseError`].
    */
    pub fn parse(&self, tokens: &[&str], caller: &dyn Caller) -> Result<Arguments, ParseError> {
        matcher::run(self, tokens, caller)
    }

    /**
    Compute ranked completion suggestions for the final, in-progress token of
    `tokens` (which may be empty for a freshly started token).

    The returned list is always non-nil, possibly empty, and already ranked:
    exact matches, then prefix matches, then substring matches, each tier
    sorted lexicographically.
    */
    pub async fn complete(
        &self,
        tokens: &[&str],
        caller: &CallerRef,
        cache: &CompletionCache,
    ) -> Vec<String> {
        complete::resolve(self, tokens, caller, cache).await
    }

    #[must_use]
    pub fn args(&self) -> &[Arg] {
        &self.args
    }

    #[must_use]
    pub fn flags(&self) -> &[Flag] {
        &self.flags
    }

    #[must_use]
    pub fn key_values(&self) -> &[KeyValue] {
        &self.key_values
    }

    /// The number of required positional arguments.
    #[must_use]
    pub fn required_count(&self) -> usize {
        self.args.iter().filter(|arg| !arg.is_optional()).count()
    }

    /// The index of the greedy argument, which is always the last if present.
    #[must_use]
    pub fn greedy_index(&self) -> Option<usize> {
        self.args
            .last()
            .filter(|arg| arg.is_greedy())
            .map(|_| self.args.len() - 1)
    }

    pub(crate) fn find_flag(&self, name: &str) -> Option<&Flag> {
        self.flags
            .iter()
            .find(|flag| flag.name().eq_ignore_ascii_case(name))
    }

    pub(crate) fn find_flag_short(&self, short: char) -> Option<&Flag> {
        self.flags
            .iter()
            .find(|flag| flag.short_name() == Some(short))
    }

    pub(crate) fn find_key_value(&self, key: &str) -> Option<&KeyValue> {
        self.key_values
            .iter()
            .find(|kv| kv.key().eq_ignore_ascii_case(key))
    }

    pub(crate) fn find_key_value_short(&self, short: char) -> Option<&KeyValue> {
        self.key_values
            .iter()
            .find(|kv| kv.short_name() == Some(short))
    }
}

/**
Builder for [`Signature`]. Descriptors are appended in order;
[`try_build`][Self::try_build] reports the first structural violation as a
[`SignatureError`], and [`build`][Self::build] panics on it, for definitions
assembled at startup where a configuration mistake should fail fast.
*/
#[derive(Default)]
pub struct SignatureBuilder {
    args: Vec<Arg>,
    flags: Vec<Flag>,
    key_values: Vec<KeyValue>,
    guard: Access,
    sub_routes: Vec<SubRoute>,
    options: ResolverOptions,
}

impl SignatureBuilder {
    #[must_use]
    pub fn arg(mut self, arg: Arg) -> Self {
        self.args.push(arg);
        self
    }

    #[must_use]
    pub fn flag(mut self, flag: Flag) -> Self {
        self.flags.push(flag);
        self
    }

    #[must_use]
    pub fn key_value(mut self, key_value: KeyValue) -> Self {
        self.key_values.push(key_value);
        self
    }

    /// The command-level access gate. A denied caller gets a
    /// [`ParseError::GuardDenied`] from parsing and no suggestions at all
    /// from completion.
    #[must_use]
    pub fn guard(mut self, guard: Access) -> Self {
        self.guard = guard;
        self
    }

    #[must_use]
    pub fn sub_route(mut self, sub_route: SubRoute) -> Self {
        self.sub_routes.push(sub_route);
        self
    }

    /// Re-parse and re-validate all prior tokens before suggesting; any
    /// failure among them suppresses suggestions entirely.
    #[must_use]
    pub fn validate_on_tab(mut self, validate: bool) -> Self {
        self.options.validate_on_tab = validate;
        self
    }

    /// Enable fuzzy sub-route suggestions when no prefix match exists,
    /// keeping candidates whose similarity score reaches `threshold`.
    #[must_use]
    pub fn fuzzy_threshold(mut self, threshold: i64) -> Self {
        self.options.fuzzy_threshold = Some(threshold);
        self
    }

    /// The bounded wait applied to each asynchronous suggestion source.
    #[must_use]
    pub fn source_timeout(mut self, timeout: Duration) -> Self {
        self.options.source_timeout = timeout;
        self
    }

    /**
    Validate the structural invariants and produce the signature.

    # Errors

    Returns the first [`SignatureError`] violated, in declaration order.
    */
    pub fn try_build(self) -> Result<Signature, SignatureError> {
        fn claim(names: &mut Vec<String>, name: &str) -> Result<(), SignatureError> {
            let folded = name.to_lowercase();
            match names.contains(&folded) {
                true => Err(SignatureError::DuplicateName {
                    name: name.to_owned(),
                }),
                false => {
                    names.push(folded);
                    Ok(())
                }
            }
        }

        // A flag and a key-value may share a bare name (the extractor
        // tie-breaks in the key-value's favor), so uniqueness is checked
        // within each kind; arguments must additionally avoid both, since
        // all three kinds land in one result map.
        let mut flag_names = Vec::new();
        for flag in &self.flags {
            claim(&mut flag_names, flag.name())?;
        }

        let mut key_names = Vec::new();
        for key_value in &self.key_values {
            claim(&mut key_names, key_value.key())?;
        }

        let mut names: Vec<String> = flag_names;
        names.extend(key_names);
        names.sort();
        names.dedup();

        let mut seen_optional = false;

        for arg in &self.args {
            claim(&mut names, arg.name())?;

            if arg.is_optional() {
                seen_optional = true;
            } else if seen_optional {
                return Err(SignatureError::RequiredAfterOptional {
                    name: arg.name().to_owned(),
                });
            }
        }

        let mut greedy = self
            .args
            .iter()
            .enumerate()
            .filter(|(_, arg)| arg.is_greedy());

        if let Some((index, arg)) = greedy.next() {
            if let Some((_, extra)) = greedy.next() {
                return Err(SignatureError::MultipleGreedy {
                    name: extra.name().to_owned(),
                });
            }

            if index != self.args.len() - 1 {
                return Err(SignatureError::GreedyNotLast {
                    name: arg.name().to_owned(),
                });
            }

            if arg.type_name() != "string" {
                return Err(SignatureError::GreedyNotString {
                    name: arg.name().to_owned(),
                    type_name: arg.type_name(),
                });
            }
        }

        Ok(Signature {
            args: self.args,
            flags: self.flags,
            key_values: self.key_values,
            guard: self.guard,
            sub_routes: self.sub_routes,
            options: self.options,
        })
    }

    /**
    Like [`try_build`][Self::try_build], but panics on a structural
    violation. Descriptor-list construction mistakes are programmer errors,
    caught at definition time.
    */
    #[must_use]
    pub fn build(self) -> Signature {
        match self.try_build() {
            Ok(signature) => signature,
            Err(error) => panic!("invalid signature: {error}"),
        }
    }
}
