/// Typed event catalogue shared by the runtime, feeds and scenes
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::event::BusEvent;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneReady {
    pub scene: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigUpdated {
    pub key: String,
    pub value: serde_json::Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeatherCondition {
    Clear,
    Clouds,
    Rain,
    Snow,
    Thunderstorm,
    Fog,
}

impl WeatherCondition {
    pub const ALL: [WeatherCondition; 6] = [
        WeatherCondition::Clear,
        WeatherCondition::Clouds,
        WeatherCondition::Rain,
        WeatherCondition::Snow,
        WeatherCondition::Thunderstorm,
        WeatherCondition::Fog,
    ];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReading {
    pub city: String,
    pub temperature_c: f32,
    pub condition: WeatherCondition,
    pub wind_kph: f32,
    /// Set when the source failed and a default reading was substituted
    #[serde(default)]
    pub fallback: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsHeadline {
    pub headline: String,
    #[serde(default)]
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockQuote {
    pub symbol: String,
    pub price: f64,
    pub previous_close: f64,
    #[serde(default)]
    pub fallback: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightPosition {
    pub callsign: String,
    pub latitude: f64,
    pub longitude: f64,
    pub altitude_m: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatInput {
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mood {
    Happy,
    Neutral,
    Grumpy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MascotSpeech {
    pub text: String,
    pub mood: Mood,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UiMode {
    Chat,
    Weather,
    News,
    Stocks,
    Flights,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModeToggled {
    pub mode: UiMode,
    pub enabled: bool,
}

/// Every event the app publishes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload", rename_all = "kebab-case")]
pub enum AppEvent {
    CurrentSceneReady(SceneReady),
    ConfigUpdated(ConfigUpdated),
    WeatherDataReceived(WeatherReading),
    NewsHeadline(NewsHeadline),
    StockQuote(StockQuote),
    FlightPosition(FlightPosition),
    ChatInput(ChatInput),
    MascotSays(MascotSpeech),
    ModeToggled(ModeToggled),
    AddSprite,
}

/// Routing key for [`AppEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventKind {
    CurrentSceneReady,
    ConfigUpdated,
    WeatherDataReceived,
    NewsHeadline,
    StockQuote,
    FlightPosition,
    ChatInput,
    MascotSays,
    ModeToggled,
    AddSprite,
}

impl EventKind {
    pub const ALL: [EventKind; 10] = [
        EventKind::CurrentSceneReady,
        EventKind::ConfigUpdated,
        EventKind::WeatherDataReceived,
        EventKind::NewsHeadline,
        EventKind::StockQuote,
        EventKind::FlightPosition,
        EventKind::ChatInput,
        EventKind::MascotSays,
        EventKind::ModeToggled,
        EventKind::AddSprite,
    ];

    pub fn name(self) -> &'static str {
        match self {
            EventKind::CurrentSceneReady => "current-scene-ready",
            EventKind::ConfigUpdated => "config-updated",
            EventKind::WeatherDataReceived => "weather-data-received",
            EventKind::NewsHeadline => "news-headline",
            EventKind::StockQuote => "stock-quote",
            EventKind::FlightPosition => "flight-position",
            EventKind::ChatInput => "chat-input",
            EventKind::MascotSays => "mascot-says",
            EventKind::ModeToggled => "mode-toggled",
            EventKind::AddSprite => "add-sprite",
        }
    }

    pub fn from_name(name: &str) -> Option<EventKind> {
        Self::ALL.into_iter().find(|k| k.name() == name)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl BusEvent for AppEvent {
    type Kind = EventKind;

    fn kind(&self) -> EventKind {
        match self {
            AppEvent::CurrentSceneReady(_) => EventKind::CurrentSceneReady,
            AppEvent::ConfigUpdated(_) => EventKind::ConfigUpdated,
            AppEvent::WeatherDataReceived(_) => EventKind::WeatherDataReceived,
            AppEvent::NewsHeadline(_) => EventKind::NewsHeadline,
            AppEvent::StockQuote(_) => EventKind::StockQuote,
            AppEvent::FlightPosition(_) => EventKind::FlightPosition,
            AppEvent::ChatInput(_) => EventKind::ChatInput,
            AppEvent::MascotSays(_) => EventKind::MascotSays,
            AppEvent::ModeToggled(_) => EventKind::ModeToggled,
            AppEvent::AddSprite => EventKind::AddSprite,
        }
    }
}

// Shorthands for publishers
impl AppEvent {
    pub fn chat(text: impl Into<String>) -> Self {
        AppEvent::ChatInput(ChatInput { text: text.into() })
    }

    pub fn headline(headline: impl Into<String>) -> Self {
        AppEvent::NewsHeadline(NewsHeadline {
            headline: headline.into(),
            body: String::new(),
        })
    }

    pub fn scene_ready(scene: impl Into<String>) -> Self {
        AppEvent::CurrentSceneReady(SceneReady { scene: scene.into() })
    }

    pub fn mascot(text: impl Into<String>, mood: Mood) -> Self {
        AppEvent::MascotSays(MascotSpeech { text: text.into(), mood })
    }

    pub fn toggle(mode: UiMode, enabled: bool) -> Self {
        AppEvent::ModeToggled(ModeToggled { mode, enabled })
    }
}
