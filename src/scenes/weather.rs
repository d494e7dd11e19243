/// Weather visualizer: maps readings onto particle effects
use std::sync::{Arc, Mutex};

use tracing::info;

use crate::config::AppConfig;
use crate::core::bus::EventBus;
use crate::core::subscription::ContextId;
use crate::events::{AppEvent, EventKind, WeatherCondition, WeatherReading};
use crate::scenes::{lock, Scene};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticleKind {
    Sunbeams,
    Clouds,
    Raindrops,
    Snowflakes,
    Lightning,
    Mist,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleEffect {
    pub kind: ParticleKind,
    /// particles per second
    pub density: u32,
    /// horizontal drift in px per frame
    pub drift: f32,
}

impl ParticleEffect {
    pub fn for_reading(reading: &WeatherReading) -> Self {
        let (kind, density) = match reading.condition {
            WeatherCondition::Clear => (ParticleKind::Sunbeams, 10),
            WeatherCondition::Clouds => (ParticleKind::Clouds, 20),
            WeatherCondition::Rain => (ParticleKind::Raindrops, 120),
            WeatherCondition::Snow => (ParticleKind::Snowflakes, 80),
            WeatherCondition::Thunderstorm => (ParticleKind::Lightning, 150),
            WeatherCondition::Fog => (ParticleKind::Mist, 40),
        };
        // snow floats, so it drifts harder in the same wind
        let drift_scale = if kind == ParticleKind::Snowflakes { 0.2 } else { 0.1 };
        Self {
            kind,
            density,
            drift: (reading.wind_kph.max(0.0) * drift_scale).min(12.0),
        }
    }
}

#[derive(Debug, Default)]
pub struct WeatherState {
    pub latest: Option<WeatherReading>,
    pub effect: Option<ParticleEffect>,
    pub readings: usize,
    pub fallbacks: usize,
}

pub struct WeatherScene {
    state: Arc<Mutex<WeatherState>>,
}

impl WeatherScene {
    pub fn new(_config: &AppConfig) -> Self {
        Self {
            state: Arc::new(Mutex::new(WeatherState::default())),
        }
    }

    pub fn latest(&self) -> Option<WeatherReading> {
        lock(&self.state).latest.clone()
    }

    pub fn effect(&self) -> Option<ParticleEffect> {
        lock(&self.state).effect
    }

    pub fn readings(&self) -> usize {
        lock(&self.state).readings
    }

    pub fn fallbacks(&self) -> usize {
        lock(&self.state).fallbacks
    }
}

impl Scene for WeatherScene {
    fn key(&self) -> &'static str {
        "weather"
    }

    fn create(&self, bus: &EventBus<AppEvent>, ctx: ContextId) {
        let state = self.state.clone();
        let _ = bus.on_with_context(EventKind::WeatherDataReceived, ctx, move |event| {
            let AppEvent::WeatherDataReceived(reading) = event else { return };
            let effect = ParticleEffect::for_reading(reading);
            info!(city = %reading.city, condition = ?reading.condition, effect = ?effect.kind, "weather updated");
            let mut state = lock(&state);
            state.readings += 1;
            if reading.fallback {
                state.fallbacks += 1;
            }
            state.latest = Some(reading.clone());
            state.effect = Some(effect);
        });
    }

    fn summary(&self) -> String {
        let state = lock(&self.state);
        match (&state.latest, &state.effect) {
            (Some(reading), Some(effect)) => format!(
                "{} reading(s) ({} fallback), {} {:.1}°C -> {:?}",
                state.readings, state.fallbacks, reading.city, reading.temperature_c, effect.kind
            ),
            _ => "no readings yet".to_string(),
        }
    }
}
