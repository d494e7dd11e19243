/// Routing contract between an event value and the bus
use std::fmt::{Debug, Display};
use std::hash::Hash;

/// Any event type that can travel over an [`EventBus`](crate::core::bus::EventBus).
///
/// The bus never looks inside the payload. It only routes on the kind, so every
/// variant of an event enum maps to exactly one `Kind`.
pub trait BusEvent: Send + Sync + 'static {
    /// Fieldless routing key (one per event variant)
    type Kind: Copy + Eq + Hash + Debug + Display + Send + Sync + 'static;

    fn kind(&self) -> Self::Kind;
}
