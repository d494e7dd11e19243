/// Synchronous in-process publish/subscribe hub
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, error, trace};

use crate::core::event::BusEvent;
use crate::core::subscription::{ContextId, Subscription, SubscriptionId};

type Callback<E> = Arc<dyn Fn(&E) + Send + Sync>;

struct Listener<E> {
    id: SubscriptionId,
    context: Option<ContextId>,
    once: bool,
    callback: Callback<E>,
}

struct Registry<E: BusEvent> {
    listeners: HashMap<E::Kind, Vec<Listener<E>>>,
    contexts: HashMap<ContextId, String>,
    next_subscription: u64,
    next_context: u64,
}

impl<E: BusEvent> Registry<E> {
    fn remove_where(&mut self, kind: E::Kind, pred: impl Fn(&Listener<E>) -> bool) -> usize {
        let Some(list) = self.listeners.get_mut(&kind) else {
            return 0;
        };
        let before = list.len();
        list.retain(|l| !pred(l));
        let removed = before - list.len();
        if list.is_empty() {
            self.listeners.remove(&kind);
        }
        removed
    }
}

/// Outcome of a single [`EventBus::emit`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmitReport {
    /// Listeners that returned normally
    pub delivered: usize,
    /// Listeners that panicked (caught and logged)
    pub failed: usize,
}

impl EmitReport {
    pub fn total(&self) -> usize {
        self.delivered + self.failed
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// Typed publish/subscribe hub.
///
/// Cloning is cheap and every clone shares one listener table, so the owner
/// constructs a single bus and hands clones to each component.
///
/// * Listeners for a kind run synchronously, in registration order, on the
///   thread that calls [`emit`](Self::emit).
/// * `emit` snapshots the listener list first. Registrations added or removed
///   while it runs (a listener unsubscribing itself included) take effect from
///   the next emit.
/// * No lock is held while a listener runs, so listeners may emit, subscribe
///   and unsubscribe on the same bus.
/// * A panicking listener is caught and logged; the remaining listeners still
///   run and the panicking one stays registered. A `once` listener is the
///   exception: it leaves the table before it runs, panic or not.
pub struct EventBus<E: BusEvent> {
    inner: Arc<Mutex<Registry<E>>>,
}

impl<E: BusEvent> Clone for EventBus<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<E: BusEvent> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: BusEvent> fmt::Debug for EventBus<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reg = self.registry();
        let mut counts: Vec<(String, usize)> = reg
            .listeners
            .iter()
            .map(|(kind, list)| (kind.to_string(), list.len()))
            .collect();
        counts.sort();
        f.debug_struct("EventBus")
            .field("listeners", &counts)
            .field("contexts", &reg.contexts.len())
            .finish()
    }
}

impl<E: BusEvent> EventBus<E> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Registry {
                listeners: HashMap::new(),
                contexts: HashMap::new(),
                next_subscription: 1,
                next_context: 1,
            })),
        }
    }

    // Listeners never run under this lock, so poisoning can only come from a
    // panic inside the bus itself; the table is still consistent then.
    fn registry(&self) -> MutexGuard<'_, Registry<E>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn register<F>(&self, kind: E::Kind, context: Option<ContextId>, once: bool, callback: F) -> Subscription<E::Kind>
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        let mut reg = self.registry();
        let id = SubscriptionId(reg.next_subscription);
        reg.next_subscription += 1;
        reg.listeners.entry(kind).or_default().push(Listener {
            id,
            context,
            once,
            callback: Arc::new(callback),
        });
        debug!(%kind, %id, context = ?context, once, "listener registered");
        Subscription { id, kind, context }
    }

    /// Run `callback` on every emit of `kind`.
    pub fn on<F>(&self, kind: E::Kind, callback: F) -> Subscription<E::Kind>
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        self.register(kind, None, false, callback)
    }

    /// Like [`on`](Self::on), but owned by `context` for bulk removal.
    pub fn on_with_context<F>(&self, kind: E::Kind, context: ContextId, callback: F) -> Subscription<E::Kind>
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        self.register(kind, Some(context), false, callback)
    }

    /// Run `callback` for the next emit of `kind` only. The registration is
    /// consumed by that emit even if the callback panics.
    pub fn once<F>(&self, kind: E::Kind, callback: F) -> Subscription<E::Kind>
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        self.register(kind, None, true, callback)
    }

    /// Remove exactly the registration behind `subscription`.
    ///
    /// Returns false when it was already removed (by another `off_*` call or
    /// because it was a `once` listener that already fired).
    pub fn off(&self, subscription: &Subscription<E::Kind>) -> bool {
        let id = subscription.id;
        let removed = self.registry().remove_where(subscription.kind, |l| l.id == id) > 0;
        if removed {
            debug!(kind = %subscription.kind, %id, "listener removed");
        }
        removed
    }

    /// Remove every listener of `kind`, whatever its context.
    pub fn off_event(&self, kind: E::Kind) -> usize {
        let removed = self.registry().listeners.remove(&kind).map_or(0, |list| list.len());
        debug!(%kind, removed, "listeners removed for event");
        removed
    }

    /// Remove listeners of `kind` whose context equals `context`.
    ///
    /// `None` matches only listeners registered without a context; listeners
    /// owned by a context are left alone. Use [`off_event`](Self::off_event)
    /// to drop all of them.
    pub fn off_context(&self, kind: E::Kind, context: Option<ContextId>) -> usize {
        let removed = self.registry().remove_where(kind, |l| l.context == context);
        debug!(%kind, context = ?context, removed, "listeners removed for context");
        removed
    }

    /// Allocate a fresh owning context. The label only shows up in logs.
    pub fn new_context(&self, label: impl Into<String>) -> ContextId {
        let mut reg = self.registry();
        let ctx = ContextId(reg.next_context);
        reg.next_context += 1;
        let label = label.into();
        debug!(%ctx, %label, "context created");
        reg.contexts.insert(ctx, label);
        ctx
    }

    pub fn context_label(&self, context: ContextId) -> Option<String> {
        self.registry().contexts.get(&context).cloned()
    }

    /// Remove every registration owned by `context`, across all kinds, and
    /// retire the context.
    pub fn remove_context(&self, context: ContextId) -> usize {
        let mut reg = self.registry();
        let mut removed = 0;
        reg.listeners.retain(|_, list| {
            let before = list.len();
            list.retain(|l| l.context != Some(context));
            removed += before - list.len();
            !list.is_empty()
        });
        let label = reg.contexts.remove(&context).unwrap_or_default();
        debug!(%context, %label, removed, "context torn down");
        removed
    }

    /// Remove every listener on the bus.
    pub fn clear(&self) -> usize {
        let mut reg = self.registry();
        let removed = reg.listeners.values().map(Vec::len).sum();
        reg.listeners.clear();
        debug!(removed, "bus cleared");
        removed
    }

    pub fn listener_count(&self, kind: E::Kind) -> usize {
        self.registry().listeners.get(&kind).map_or(0, Vec::len)
    }

    pub fn has_listeners(&self, kind: E::Kind) -> bool {
        self.listener_count(kind) > 0
    }

    /// Kinds that currently have at least one listener (unordered).
    pub fn event_kinds(&self) -> Vec<E::Kind> {
        self.registry().listeners.keys().copied().collect()
    }

    /// Deliver `event` to every listener of its kind.
    pub fn emit(&self, event: &E) -> EmitReport {
        let kind = event.kind();

        let snapshot: Vec<(SubscriptionId, Callback<E>)> = {
            let mut reg = self.registry();
            let Some(list) = reg.listeners.get_mut(&kind) else {
                trace!(%kind, "emit with no listeners");
                return EmitReport::default();
            };
            let snapshot = list.iter().map(|l| (l.id, Arc::clone(&l.callback))).collect();
            // once-listeners leave the table before anything runs, so a
            // nested emit of the same kind cannot fire them again
            list.retain(|l| !l.once);
            let drained = list.is_empty();
            if drained {
                reg.listeners.remove(&kind);
            }
            snapshot
        };

        trace!(%kind, listeners = snapshot.len(), "emit");

        let mut report = EmitReport::default();
        for (id, callback) in snapshot {
            match panic::catch_unwind(AssertUnwindSafe(|| callback(event))) {
                Ok(()) => report.delivered += 1,
                Err(payload) => {
                    report.failed += 1;
                    error!(%kind, %id, reason = %panic_message(payload.as_ref()), "listener panicked");
                }
            }
        }
        report
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum Kind {
        Ping,
        Pong,
    }

    impl fmt::Display for Kind {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                Kind::Ping => write!(f, "ping"),
                Kind::Pong => write!(f, "pong"),
            }
        }
    }

    #[derive(Debug)]
    enum Msg {
        Ping(u32),
        Pong,
    }

    impl BusEvent for Msg {
        type Kind = Kind;
        fn kind(&self) -> Kind {
            match self {
                Msg::Ping(_) => Kind::Ping,
                Msg::Pong => Kind::Pong,
            }
        }
    }

    fn recorder() -> (Arc<Mutex<Vec<String>>>, impl Fn(&'static str) -> Box<dyn Fn(&Msg) + Send + Sync>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = log.clone();
        let make = move |tag: &'static str| -> Box<dyn Fn(&Msg) + Send + Sync> {
            let sink = sink.clone();
            Box::new(move |msg: &Msg| {
                let entry = match msg {
                    Msg::Ping(n) => format!("{tag}:{n}"),
                    Msg::Pong => format!("{tag}:pong"),
                };
                sink.lock().unwrap().push(entry);
            })
        };
        (log, make)
    }

    #[test]
    fn once_fires_a_single_time() {
        let bus = EventBus::<Msg>::new();
        let (log, make) = recorder();
        let sub = bus.once(Kind::Ping, make("a"));
        bus.emit(&Msg::Ping(1));
        bus.emit(&Msg::Ping(2));
        assert_eq!(*log.lock().unwrap(), vec!["a:1"]);
        assert!(!bus.off(&sub));
    }

    #[test]
    fn once_is_not_refired_by_nested_emit() {
        let bus = EventBus::<Msg>::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let inner = bus.clone();
        let _sub = bus.once(Kind::Ping, move |msg| {
            counter.fetch_add(1, Ordering::SeqCst);
            if let Msg::Ping(n) = msg {
                if *n == 0 {
                    inner.emit(&Msg::Ping(1));
                }
            }
        });
        bus.emit(&Msg::Ping(0));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn panicking_once_listener_is_still_consumed() {
        let bus = EventBus::<Msg>::new();
        let sub = bus.once(Kind::Ping, |_| panic!("first and last"));
        let report = bus.emit(&Msg::Ping(1));
        assert_eq!(report.failed, 1);
        assert!(!bus.has_listeners(Kind::Ping));
        assert!(!bus.off(&sub));
        assert!(bus.emit(&Msg::Ping(2)).is_empty());
    }

    #[test]
    fn duplicate_registrations_are_independent() {
        let bus = EventBus::<Msg>::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let subs: Vec<_> = (0..2)
            .map(|_| {
                let hits = hits.clone();
                bus.on(Kind::Ping, move |_| {
                    hits.fetch_add(1, Ordering::SeqCst);
                })
            })
            .collect();
        assert_eq!(bus.emit(&Msg::Ping(0)).delivered, 2);
        assert!(bus.off(&subs[0]));
        bus.emit(&Msg::Ping(0));
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn kinds_are_routed_separately() {
        let bus = EventBus::<Msg>::new();
        let (log, make) = recorder();
        let _ping = bus.on(Kind::Ping, make("ping"));
        let _pong = bus.on(Kind::Pong, make("pong"));
        bus.emit(&Msg::Pong);
        assert_eq!(*log.lock().unwrap(), vec!["pong:pong"]);
    }

    #[test]
    fn off_context_none_only_matches_contextless() {
        let bus = EventBus::<Msg>::new();
        let (log, make) = recorder();
        let ctx = bus.new_context("scene");
        let _plain = bus.on(Kind::Ping, make("plain"));
        let _owned = bus.on_with_context(Kind::Ping, ctx, make("owned"));

        assert_eq!(bus.off_context(Kind::Ping, None), 1);
        bus.emit(&Msg::Ping(1));
        assert_eq!(*log.lock().unwrap(), vec!["owned:1"]);

        assert_eq!(bus.off_context(Kind::Ping, Some(ctx)), 1);
        assert!(!bus.has_listeners(Kind::Ping));
    }

    #[test]
    fn off_event_ignores_context() {
        let bus = EventBus::<Msg>::new();
        let (_log, make) = recorder();
        let ctx = bus.new_context("scene");
        let _a = bus.on(Kind::Ping, make("a"));
        let _b = bus.on_with_context(Kind::Ping, ctx, make("b"));
        let _c = bus.on(Kind::Pong, make("c"));
        assert_eq!(bus.off_event(Kind::Ping), 2);
        assert_eq!(bus.event_kinds(), vec![Kind::Pong]);
    }

    #[test]
    fn remove_context_spans_kinds() {
        let bus = EventBus::<Msg>::new();
        let (_log, make) = recorder();
        let ctx = bus.new_context("weather");
        let other = bus.new_context("news");
        let _a = bus.on_with_context(Kind::Ping, ctx, make("a"));
        let _b = bus.on_with_context(Kind::Pong, ctx, make("b"));
        let _c = bus.on_with_context(Kind::Pong, other, make("c"));
        assert_eq!(bus.context_label(ctx).as_deref(), Some("weather"));

        assert_eq!(bus.remove_context(ctx), 2);
        assert_eq!(bus.listener_count(Kind::Ping), 0);
        assert_eq!(bus.listener_count(Kind::Pong), 1);
        assert_eq!(bus.context_label(ctx), None);
    }

    #[test]
    fn listener_added_during_emit_waits_for_next_emit() {
        let bus = EventBus::<Msg>::new();
        let (log, make) = recorder();
        let inner = bus.clone();
        let late = Arc::new(Mutex::new(Some(make("late"))));
        let _spawner = bus.on(Kind::Ping, move |_| {
            if let Some(cb) = late.lock().unwrap().take() {
                let _ = inner.on(Kind::Ping, cb);
            }
        });
        bus.emit(&Msg::Ping(1));
        assert!(log.lock().unwrap().is_empty());
        bus.emit(&Msg::Ping(2));
        assert_eq!(*log.lock().unwrap(), vec!["late:2"]);
    }

    #[test]
    fn clear_empties_the_table() {
        let bus = EventBus::<Msg>::new();
        let (_log, make) = recorder();
        let _a = bus.on(Kind::Ping, make("a"));
        let _b = bus.on(Kind::Pong, make("b"));
        assert_eq!(bus.clear(), 2);
        assert!(bus.event_kinds().is_empty());
        assert!(bus.emit(&Msg::Pong).is_empty());
    }

    #[test]
    fn panic_message_handles_both_payload_types() {
        let static_str: Box<dyn Any + Send> = Box::new("boom");
        let owned: Box<dyn Any + Send> = Box::new(String::from("bang"));
        let other: Box<dyn Any + Send> = Box::new(5_u8);
        assert_eq!(panic_message(static_str.as_ref()), "boom");
        assert_eq!(panic_message(owned.as_ref()), "bang");
        assert_eq!(panic_message(other.as_ref()), "non-string panic payload");
    }
}
