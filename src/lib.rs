pub mod core {
    pub mod bus;
    pub mod event;
    pub mod subscription;
}

pub mod cli;
pub mod config;
pub mod engine;
pub mod events;
pub mod scenes;

// Re-export for convenience
pub use crate::core::bus::{EmitReport, EventBus};
pub use crate::core::event::BusEvent;
pub use crate::core::subscription::{ContextId, Subscription, SubscriptionGuard, SubscriptionId};
pub use crate::events::{AppEvent, EventKind};
