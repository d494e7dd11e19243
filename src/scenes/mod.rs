pub mod flights;
pub mod macros;
pub mod manager;
pub mod mascot;
pub mod news;
pub mod stocks;
pub mod typewriter;
pub mod weather;

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::core::bus::EventBus;
use crate::core::subscription::ContextId;
use crate::events::AppEvent;
use crate::register_scenes;

pub use manager::{SceneError, SceneManager};

/// A bus client with a create/destroy lifecycle.
///
/// `create` must register every listener under `ctx`; the manager tears the
/// scene down by removing that context, so nothing registered elsewhere is
/// cleaned up.
pub trait Scene: Send + Sync + 'static {
    fn key(&self) -> &'static str;

    fn create(&self, bus: &EventBus<AppEvent>, ctx: ContextId);

    /// Called once per runtime frame; animated scenes advance here.
    fn on_frame(&self) {}

    /// One-line status for the end-of-run report
    fn summary(&self) -> String;
}

/// Most recent entries a scene keeps in its history; older ones are dropped.
pub const HISTORY_LIMIT: usize = 64;

pub(crate) fn push_recent<T>(history: &mut VecDeque<T>, item: T) {
    if history.len() == HISTORY_LIMIT {
        history.pop_front();
    }
    history.push_back(item);
}

/// Metadata about a scene
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SceneInfo {
    pub key: &'static str,
    pub name: &'static str,
    pub description: &'static str,
}

/// Registry entry containing metadata and a constructed scene
#[derive(Clone)]
pub struct SceneEntry {
    pub info: SceneInfo,
    pub scene: Arc<dyn Scene>,
}

// A listener that panicked while holding scene state poisons the mutex; the
// bus keeps that listener registered, so later events must still get in.
pub(crate) fn lock<T>(state: &Mutex<T>) -> MutexGuard<'_, T> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

// Register all scenes here
register_scenes! {
    mascot => {
        scene: MascotScene,
        key: "mascot",
        name: "Amish Brandon",
        description: "Mascot playground - chats back, spawns sprites, follows UI modes"
    },
    weather => {
        scene: WeatherScene,
        key: "weather",
        name: "Weather Visualizer",
        description: "Picks particle effects from the latest weather reading"
    },
    news => {
        scene: NewsScene,
        key: "news",
        name: "Fake News Anchor",
        description: "Reads headlines and reacts by counting sentiment keywords"
    },
    stocks => {
        scene: StocksScene,
        key: "stocks",
        name: "Stock Ticker",
        description: "Ticker tape of watched symbols with change against previous close"
    },
    flights => {
        scene: FlightsScene,
        key: "flights",
        name: "Flight Tracker",
        description: "Flags flights passing within the configured radius"
    }
}
