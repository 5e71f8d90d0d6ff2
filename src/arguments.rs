/*!
The name → value map produced by a successful parse.
*/

use core::any::Any;
use std::collections::HashMap;

/// A parsed value with its concrete type erased. Descriptors of different
/// output types share one result map, so values travel boxed and get their
/// types back at the access site.
pub type BoxedValue = Box<dyn Any + Send + Sync>;

/**
The assembled result of a parse: descriptor names mapped to their parsed,
validated, transformed values.

Only descriptors that actually received a value are present; an unparsed
optional descriptor is simply absent, never present with a placeholder. Flag
descriptors contribute `bool` values, key-values with `multiple_values`
contribute `Vec` of their parser's output.

Lookups are case-insensitive, matching the case-insensitive uniqueness that
[`Signature`][crate::Signature] construction enforces on names.
*/
#[derive(Debug, Default)]
pub struct Arguments {
    values: HashMap<String, BoxedValue>,
}

impl Arguments {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /**
    Get the value parsed for `name`, downcast to its concrete type.

    Returns `None` if the descriptor received no value *or* if `T` is not the
    type its parser produces; the latter is a programming error, but one this
    map can't distinguish from absence on its own. Use
    [`contains`][Self::contains] when the distinction matters.
    */
    #[must_use]
    pub fn get<T: 'static>(&self, name: &str) -> Option<&T> {
        self.values
            .get(&fold_name(name))
            .and_then(|value| value.downcast_ref())
    }

    /// Whether any value at all was parsed for `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(&fold_name(name))
    }

    /// Remove and return the value for `name`, downcast to `T`.
    pub fn remove<T: 'static>(&mut self, name: &str) -> Option<T> {
        let value = self.values.remove(&fold_name(name))?;

        match value.downcast() {
            Ok(value) => Some(*value),
            Err(value) => {
                // wrong type requested; put it back rather than dropping it
                self.values.insert(fold_name(name), value);
                None
            }
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The (folded) names present in this map, in no particular order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub(crate) fn insert(&mut self, name: &str, value: BoxedValue) {
        self.values.insert(fold_name(name), value);
    }
}

fn fold_name(name: &str) -> String {
    name.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::Arguments;

    #[test]
    fn typed_round_trip() {
        let mut args = Arguments::new();
        args.insert("count", Box::new(3_i32));
        args.insert("target", Box::new(String::from("hunter")));

        assert_eq!(args.get::<i32>("count"), Some(&3));
        assert_eq!(args.get::<String>("target").map(String::as_str), Some("hunter"));
        assert_eq!(args.len(), 2);
    }

    #[test]
    fn lookups_are_case_insensitive() {
        let mut args = Arguments::new();
        args.insert("Target", Box::new(String::from("hunter")));

        assert!(args.contains("target"));
        assert!(args.contains("TARGET"));
    }

    #[test]
    fn wrong_type_is_none_but_present() {
        let mut args = Arguments::new();
        args.insert("count", Box::new(3_i32));

        assert_eq!(args.get::<String>("count"), None);
        assert!(args.contains("count"));
    }

    #[test]
    fn remove_with_wrong_type_keeps_the_value() {
        let mut args = Arguments::new();
        args.insert("count", Box::new(3_i32));

        assert_eq!(args.remove::<String>("count"), None);
        assert_eq!(args.remove::<i32>("count"), Some(3));
        assert!(args.is_empty());
    }
}
