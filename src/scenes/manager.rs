/// Starts and stops scenes against a shared bus
use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::config::AppConfig;
use crate::core::bus::EventBus;
use crate::core::subscription::ContextId;
use crate::events::AppEvent;
use crate::scenes::{find_scene, Scene};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SceneError {
    #[error("scene '{0}' not found")]
    UnknownScene(String),
}

struct ActiveScene {
    key: &'static str,
    context: ContextId,
    scene: Arc<dyn Scene>,
}

pub struct SceneManager {
    bus: EventBus<AppEvent>,
    active: Vec<ActiveScene>,
}

impl SceneManager {
    pub fn new(bus: EventBus<AppEvent>) -> Self {
        Self { bus, active: Vec::new() }
    }

    /// Create `scene` under a fresh context and announce it as ready.
    ///
    /// A scene already active under the same key is stopped first.
    pub fn start(&mut self, scene: Arc<dyn Scene>) -> ContextId {
        let key = scene.key();
        if self.is_active(key) {
            self.stop(key);
        }
        let context = self.bus.new_context(key);
        scene.create(&self.bus, context);
        self.active.push(ActiveScene { key, context, scene });
        info!(scene = key, %context, "scene started");
        self.bus.emit(&AppEvent::scene_ready(key));
        context
    }

    /// Look the scene up in the registry and start it.
    pub fn start_by_key(&mut self, key: &str, config: &AppConfig) -> Result<ContextId, SceneError> {
        let entry = find_scene(key, config).ok_or_else(|| SceneError::UnknownScene(key.to_string()))?;
        Ok(self.start(entry.scene))
    }

    /// Tear the scene down. Returns how many listeners were removed.
    pub fn stop(&mut self, key: &str) -> usize {
        let Some(pos) = self.active.iter().position(|a| a.key == key) else {
            return 0;
        };
        let active = self.active.remove(pos);
        let removed = self.bus.remove_context(active.context);
        info!(scene = key, removed, "scene stopped");
        removed
    }

    pub fn stop_all(&mut self) -> usize {
        let keys: Vec<&'static str> = self.active.iter().map(|a| a.key).collect();
        keys.into_iter().map(|k| self.stop(k)).sum()
    }

    pub fn is_active(&self, key: &str) -> bool {
        self.active.iter().any(|a| a.key == key)
    }

    pub fn active(&self) -> Vec<&'static str> {
        self.active.iter().map(|a| a.key).collect()
    }

    pub fn context_of(&self, key: &str) -> Option<ContextId> {
        self.active.iter().find(|a| a.key == key).map(|a| a.context)
    }

    /// Advance every active scene by one frame.
    pub fn frame(&self) {
        for active in &self.active {
            active.scene.on_frame();
        }
    }

    /// `(key, summary)` for every active scene, in start order.
    pub fn summaries(&self) -> Vec<(&'static str, String)> {
        self.active.iter().map(|a| (a.key, a.scene.summary())).collect()
    }

    pub fn bus(&self) -> &EventBus<AppEvent> {
        &self.bus
    }
}
