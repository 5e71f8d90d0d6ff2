/*!
[`ArgumentSpec`]: the per-argument configuration that travels with a
descriptor: optionality, greediness, access gating, validation rules,
defaults, transforms, and completion sources.

Specs are immutable value objects built through [`ArgumentSpecBuilder`].
Descriptor "mutators" like [`Arg::optional`][crate::Arg::optional] rebuild a
new spec from the old one's fields plus overrides; nothing here mutates in
place after construction.
*/

use std::sync::Arc;

use regex::Regex;

use crate::access::{Access, Caller};
use crate::arguments::{Arguments, BoxedValue};
use crate::complete::{SuggestionProvider, SuggestionSupplier};

/// A custom validation rule over an erased parsed value. `None` means valid;
/// `Some` is the error string. Use [`validator`] to build one from a typed
/// closure.
pub type Validator = Arc<dyn Fn(&BoxedValue) -> Option<String> + Send + Sync>;

/// A post-validation value transform. Use [`transform`] to build one from a
/// typed closure.
pub type Transform = Arc<dyn Fn(BoxedValue) -> BoxedValue + Send + Sync>;

/// A pre-bound condition over previously parsed values. Returning `false`
/// skips the argument entirely: it consumes no token and contributes at most
/// its default.
pub type Condition = Arc<dyn Fn(&Arguments) -> bool + Send + Sync>;

/// A factory for an argument's default value, used when an optional argument
/// receives no token.
pub type DefaultValue = Arc<dyn Fn() -> BoxedValue + Send + Sync>;

/// A synchronous dynamic suggestion source.
pub type DynamicCompleter = Arc<dyn Fn(&str, &dyn Caller) -> Vec<String> + Send + Sync>;

/**
Wrap a typed validation closure into a [`Validator`].

# Panics

Panics at validation time if the argument's parser produces a different type
than `T`: attaching a mismatched validator is a configuration error, not a
user-input error.
*/
#[must_use]
pub fn validator<T: Send + Sync + 'static>(
    rule: impl Fn(&T) -> Option<String> + Send + Sync + 'static,
) -> Validator {
    Arc::new(move |value: &BoxedValue| match value.downcast_ref::<T>() {
        Some(value) => rule(value),
        None => panic!("validator attached to an argument of a different type"),
    })
}

/**
Wrap a typed transform closure into a [`Transform`].

# Panics

As with [`validator`], a type mismatch at transform time is a configuration
error and panics.
*/
#[must_use]
pub fn transform<T: Send + Sync + 'static>(
    op: impl Fn(T) -> T + Send + Sync + 'static,
) -> Transform {
    Arc::new(move |value: BoxedValue| match value.downcast::<T>() {
        Ok(value) => Box::new(op(*value)),
        Err(_) => panic!("transform attached to an argument of a different type"),
    })
}

/// Wrap a cloneable value into a [`DefaultValue`] factory.
#[must_use]
pub fn default_value<T: Clone + Send + Sync + 'static>(value: T) -> DefaultValue {
    Arc::new(move || Box::new(value.clone()))
}

/// The completion sources attached to a spec, in resolution priority order.
/// Predefined lists take priority over dynamic sources when both are
/// present; the sources are alternatives, never additive.
#[derive(Clone, Default)]
pub(crate) struct CompletionSources {
    pub(crate) predefined: Option<Vec<String>>,
    pub(crate) dynamic: Option<DynamicCompleter>,
    pub(crate) async_predefined: Option<Arc<dyn SuggestionSupplier>>,
    pub(crate) async_dynamic: Option<Arc<dyn SuggestionProvider>>,
}

impl CompletionSources {
    pub(crate) fn is_async(&self) -> bool {
        self.predefined.is_none()
            && self.dynamic.is_none()
            && (self.async_predefined.is_some() || self.async_dynamic.is_some())
    }
}

/**
Per-argument configuration. Immutable once built; see the
[module docs][self] for the copy-on-write discipline.
*/
#[derive(Clone, Default)]
pub struct ArgumentSpec {
    pub(crate) optional: bool,
    pub(crate) greedy: bool,
    pub(crate) access: Access,
    pub(crate) default: Option<DefaultValue>,
    pub(crate) min_int: Option<i64>,
    pub(crate) max_int: Option<i64>,
    pub(crate) min_float: Option<f64>,
    pub(crate) max_float: Option<f64>,
    pub(crate) min_length: Option<usize>,
    pub(crate) max_length: Option<usize>,
    pub(crate) pattern: Option<Regex>,
    pub(crate) validators: Vec<Validator>,
    pub(crate) condition: Option<Condition>,
    pub(crate) transform: Option<Transform>,
    pub(crate) completions: CompletionSources,
}

impl ArgumentSpec {
    #[must_use]
    pub fn builder() -> ArgumentSpecBuilder {
        ArgumentSpecBuilder {
            spec: Self::default(),
        }
    }

    /// Rebuild this spec through a builder, for copy-on-write mutators.
    #[must_use]
    pub fn rebuild(&self) -> ArgumentSpecBuilder {
        ArgumentSpecBuilder { spec: self.clone() }
    }

    #[must_use]
    pub fn is_optional(&self) -> bool {
        self.optional
    }

    #[must_use]
    pub fn is_greedy(&self) -> bool {
        self.greedy
    }

    #[must_use]
    pub fn access(&self) -> &Access {
        &self.access
    }
}

/**
Staged builder for [`ArgumentSpec`].

# Panics

`build` panics on unsatisfiable ranges (`min > max` for ints, floats, or
string lengths). An unsatisfiable range can only be a programmer mistake, so
it's rejected at definition time rather than surfacing as a parse-time error
nobody can fix by retyping their input.
*/
pub struct ArgumentSpecBuilder {
    spec: ArgumentSpec,
}

impl ArgumentSpecBuilder {
    #[must_use]
    pub fn optional(mut self, optional: bool) -> Self {
        self.spec.optional = optional;
        self
    }

    #[must_use]
    pub fn greedy(mut self, greedy: bool) -> Self {
        self.spec.greedy = greedy;
        self
    }

    #[must_use]
    pub fn access(mut self, access: Access) -> Self {
        self.spec.access = access;
        self
    }

    #[must_use]
    pub fn default_value<T: Clone + Send + Sync + 'static>(mut self, value: T) -> Self {
        self.spec.default = Some(default_value(value));
        self
    }

    #[must_use]
    pub fn min_int(mut self, min: i64) -> Self {
        self.spec.min_int = Some(min);
        self
    }

    #[must_use]
    pub fn max_int(mut self, max: i64) -> Self {
        self.spec.max_int = Some(max);
        self
    }

    #[must_use]
    pub fn min_float(mut self, min: f64) -> Self {
        self.spec.min_float = Some(min);
        self
    }

    #[must_use]
    pub fn max_float(mut self, max: f64) -> Self {
        self.spec.max_float = Some(max);
        self
    }

    #[must_use]
    pub fn min_length(mut self, min: usize) -> Self {
        self.spec.min_length = Some(min);
        self
    }

    #[must_use]
    pub fn max_length(mut self, max: usize) -> Self {
        self.spec.max_length = Some(max);
        self
    }

    /**
    Require parsed strings to match `pattern`.

    # Panics

    Panics if `pattern` is not a valid regular expression.
    */
    #[must_use]
    pub fn pattern(mut self, pattern: &str) -> Self {
        self.spec.pattern = Some(match Regex::new(pattern) {
            Ok(regex) => regex,
            Err(error) => panic!("invalid argument pattern {pattern:?}: {error}"),
        });
        self
    }

    /// Append a custom validator. Validators run in registration order,
    /// after the structural range/length/pattern checks.
    #[must_use]
    pub fn validator(mut self, validator: Validator) -> Self {
        self.spec.validators.push(validator);
        self
    }

    #[must_use]
    pub fn condition(
        mut self,
        condition: impl Fn(&Arguments) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.spec.condition = Some(Arc::new(condition));
        self
    }

    #[must_use]
    pub fn transform(mut self, transform: Transform) -> Self {
        self.spec.transform = Some(transform);
        self
    }

    /// A fixed suggestion list. Takes priority over every other source.
    #[must_use]
    pub fn completions(mut self, completions: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.spec.completions.predefined =
            Some(completions.into_iter().map(Into::into).collect());
        self
    }

    /// A synchronous dynamic suggestion source.
    #[must_use]
    pub fn completions_dynamic(
        mut self,
        completer: impl Fn(&str, &dyn Caller) -> Vec<String> + Send + Sync + 'static,
    ) -> Self {
        self.spec.completions.dynamic = Some(Arc::new(completer));
        self
    }

    /// An asynchronous predefined suggestion supplier, awaited with a
    /// bounded timeout and cached through the completion cache.
    #[must_use]
    pub fn completions_async(mut self, supplier: Arc<dyn SuggestionSupplier>) -> Self {
        self.spec.completions.async_predefined = Some(supplier);
        self
    }

    /// An asynchronous dynamic suggestion provider; same timeout and cache
    /// treatment as [`completions_async`][Self::completions_async].
    #[must_use]
    pub fn completions_async_dynamic(mut self, provider: Arc<dyn SuggestionProvider>) -> Self {
        self.spec.completions.async_dynamic = Some(provider);
        self
    }

    #[must_use]
    pub fn build(self) -> ArgumentSpec {
        let spec = self.spec;

        if let (Some(min), Some(max)) = (spec.min_int, spec.max_int) {
            assert!(min <= max, "unsatisfiable integer range: {min} > {max}");
        }

        if let (Some(min), Some(max)) = (spec.min_float, spec.max_float) {
            assert!(min <= max, "unsatisfiable float range: {min} > {max}");
        }

        if let (Some(min), Some(max)) = (spec.min_length, spec.max_length) {
            assert!(min <= max, "unsatisfiable length range: {min} > {max}");
        }

        spec
    }
}
