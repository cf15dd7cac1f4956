use std::fmt;

/// Self-closing side of a registered participant.
///
/// Implementors flip to inert exactly once: the first `close` takes the
/// participant's deregistration handle under its own lock and every later
/// call finds nothing to do.
pub(crate) trait Participant: Send + Sync {
    fn close(&self);
    fn is_closed(&self) -> bool;
}

macro_rules! participant_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(u64);

        impl $name {
            pub(crate) fn new(raw: u64) -> Self {
                Self(raw)
            }

            pub fn as_u64(&self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

participant_id!(
    /// Identity of a subscription, unique within its event for the event's lifetime.
    SubscriptionId
);

participant_id!(
    /// Identity of a listener, unique within its signal for the signal's lifetime.
    ListenerId
);

/// Mints identities for one registry; ids start at 1 and are never reused.
#[derive(Debug, Default)]
pub(crate) struct IdCounter(u64);

impl IdCounter {
    pub(crate) fn next(&mut self) -> u64 {
        self.0 += 1;
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_is_monotonic() {
        let mut counter = IdCounter::default();
        assert_eq!(counter.next(), 1);
        assert_eq!(counter.next(), 2);
        assert_eq!(counter.next(), 3);
    }

    #[test]
    fn test_id_display() {
        assert_eq!(SubscriptionId::new(7).to_string(), "7");
        assert_eq!(ListenerId::new(42).as_u64(), 42);
    }
}
