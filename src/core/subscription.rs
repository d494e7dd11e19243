/// Subscription handles returned by the bus
use std::fmt;

use crate::core::bus::EventBus;
use crate::core::event::BusEvent;

/// Unique id of a single listener registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub(crate) u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub#{}", self.0)
    }
}

/// Owning identity for a group of registrations (usually one scene instance).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextId(pub(crate) u64);

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ctx#{}", self.0)
    }
}

/// Handle for one listener registration. Keep it to unsubscribe later.
///
/// Dropping a plain `Subscription` does nothing; call [`Subscription::guard`]
/// to get a handle that unsubscribes on drop.
#[must_use = "a dropped Subscription can no longer be used to unsubscribe"]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription<K> {
    pub(crate) id: SubscriptionId,
    pub(crate) kind: K,
    pub(crate) context: Option<ContextId>,
}

impl<K: Copy> Subscription<K> {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    pub fn kind(&self) -> K {
        self.kind
    }

    pub fn context(&self) -> Option<ContextId> {
        self.context
    }

    /// Tie this registration to a scope: it is removed when the guard drops.
    pub fn guard<E>(self, bus: &EventBus<E>) -> SubscriptionGuard<E>
    where
        E: BusEvent<Kind = K>,
    {
        SubscriptionGuard {
            bus: bus.clone(),
            subscription: Some(self),
        }
    }
}

/// RAII wrapper around a [`Subscription`].
pub struct SubscriptionGuard<E: BusEvent> {
    bus: EventBus<E>,
    subscription: Option<Subscription<E::Kind>>,
}

impl<E: BusEvent> SubscriptionGuard<E> {
    pub fn subscription(&self) -> Option<&Subscription<E::Kind>> {
        self.subscription.as_ref()
    }

    /// Give up the guard without unsubscribing.
    pub fn release(mut self) -> Option<Subscription<E::Kind>> {
        self.subscription.take()
    }

    /// Unsubscribe now. Returns false if the listener was already gone.
    pub fn unsubscribe(mut self) -> bool {
        match self.subscription.take() {
            Some(sub) => self.bus.off(&sub),
            None => false,
        }
    }
}

impl<E: BusEvent> Drop for SubscriptionGuard<E> {
    fn drop(&mut self) {
        if let Some(sub) = self.subscription.take() {
            self.bus.off(&sub);
        }
    }
}

impl<E: BusEvent> fmt::Debug for SubscriptionGuard<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionGuard")
            .field("subscription", &self.subscription)
            .finish()
    }
}
