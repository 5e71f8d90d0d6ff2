/*!
Opaque caller identities and the access predicates gating descriptors.

The engine never inspects a caller beyond handing it to predicates and
parsers; what a "caller" is (a player, a console, a network session) is the
host's business.
*/

use core::any::Any;
use core::fmt::{self, Debug};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use tracing::warn;

/**
An opaque caller identity, passed through to every `parse`, `complete`, and
access-predicate call.

The trait is deliberately empty: the engine only ever moves callers around.
Hosts recover their concrete caller type with
[`downcast_ref`][Caller::downcast_ref] inside the closures and parsers they
register.
*/
pub trait Caller: Any + Send + Sync {}

impl dyn Caller {
    /// Downcast to the host's concrete caller type.
    #[must_use]
    pub fn downcast_ref<T: Caller>(&self) -> Option<&T> {
        (self as &dyn Any).downcast_ref()
    }
}

/// Shared handle to a caller. Completion resolution and parallel parsing may
/// move the caller into spawned tasks, so it's always reference-counted.
pub type CallerRef = Arc<dyn Caller>;

/**
An access gate over callers: either open to everyone, or guarded by a
predicate.

A predicate that panics is treated as a denial: a broken guard must fail
closed, and must never take the parse or completion path down with it.
*/
#[derive(Clone)]
pub struct Access {
    predicate: Option<Arc<dyn Fn(&dyn Caller) -> bool + Send + Sync>>,
}

impl Access {
    /// An access gate that admits every caller.
    #[must_use]
    pub fn open() -> Self {
        Self { predicate: None }
    }

    /// An access gate guarded by the given predicate.
    #[must_use]
    pub fn guarded(predicate: impl Fn(&dyn Caller) -> bool + Send + Sync + 'static) -> Self {
        Self {
            predicate: Some(Arc::new(predicate)),
        }
    }

    /// Whether any predicate is registered at all.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.predicate.is_none()
    }

    /// Evaluate the gate for a caller. Panicking predicates deny.
    #[must_use]
    pub fn check(&self, caller: &dyn Caller) -> bool {
        match self.predicate {
            None => true,
            Some(ref predicate) => {
                catch_unwind(AssertUnwindSafe(|| predicate(caller))).unwrap_or_else(|_| {
                    warn!("access predicate panicked; treating as denial");
                    false
                })
            }
        }
    }
}

impl Default for Access {
    fn default() -> Self {
        Self::open()
    }
}

impl Debug for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.predicate {
            None => f.write_str("Access::Open"),
            Some(_) => f.write_str("Access::Guarded"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Access, Caller};

    struct Nobody;
    impl Caller for Nobody {}

    #[test]
    fn open_admits_everyone() {
        assert!(Access::open().check(&Nobody));
    }

    #[test]
    fn guarded_consults_the_predicate() {
        assert!(Access::guarded(|_| true).check(&Nobody));
        assert!(!Access::guarded(|_| false).check(&Nobody));
    }

    #[test]
    fn panicking_predicate_denies() {
        let gate = Access::guarded(|_| panic!("broken guard"));
        assert!(!gate.check(&Nobody));
    }

    #[test]
    fn callers_downcast_to_their_concrete_type() {
        struct Admin {
            level: u8,
        }
        impl Caller for Admin {}

        let gate = Access::guarded(|caller| {
            caller
                .downcast_ref::<Admin>()
                .is_some_and(|admin| admin.level >= 4)
        });

        assert!(gate.check(&Admin { level: 4 }));
        assert!(!gate.check(&Admin { level: 1 }));
        assert!(!gate.check(&Nobody));
    }
}
