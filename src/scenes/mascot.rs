/// Mascot playground: Amish Brandon answers chat, spawns sprites and tracks UI modes
use std::collections::{BTreeSet, VecDeque};
use std::sync::{Arc, Mutex};

use rand::seq::IndexedRandom;
use tracing::{debug, info};

use crate::config::AppConfig;
use crate::core::bus::EventBus;
use crate::core::subscription::ContextId;
use crate::events::{AppEvent, EventKind, MascotSpeech, Mood, UiMode};
use crate::scenes::typewriter::Typewriter;
use crate::scenes::{lock, push_recent, Scene};

const GREETINGS: [&str; 5] = ["hi", "hello", "howdy", "hey", "guten"];

pub const QUIPS: [&str; 5] = [
    "Ask the horse, he knows more than I do.",
    "Ja, but only after the barn raising.",
    "We don't have Wi-Fi, but we have wise guys.",
    "That's a question for a candle-lit evening.",
    "I'd check, but my phone is a rotary butter churn.",
];

#[derive(Debug)]
pub struct MascotState {
    pub bubble: Typewriter,
    pub mood: Mood,
    pub sprites: usize,
    pub modes: BTreeSet<UiMode>,
    /// Latest chat lines, bounded; `heard_total` counts all of them
    pub heard: VecDeque<String>,
    pub heard_total: usize,
    pub spoken: VecDeque<MascotSpeech>,
    pub spoken_total: usize,
}

/// What the mascot does with a line of chat
#[derive(Debug, Clone, PartialEq)]
pub enum ChatAction {
    Ignore,
    Reply(MascotSpeech),
    AddSprite,
    Toggle(UiMode),
}

pub struct MascotScene {
    chars_per_tick: usize,
    state: Arc<Mutex<MascotState>>,
}

impl MascotScene {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            chars_per_tick: config.typewriter_chars_per_tick,
            state: Arc::new(Mutex::new(MascotState {
                bubble: Typewriter::new("", config.typewriter_chars_per_tick),
                mood: Mood::Neutral,
                sprites: 0,
                modes: BTreeSet::new(),
                heard: VecDeque::new(),
                heard_total: 0,
                spoken: VecDeque::new(),
                spoken_total: 0,
            })),
        }
    }

    pub fn sprites(&self) -> usize {
        lock(&self.state).sprites
    }

    pub fn modes(&self) -> Vec<UiMode> {
        lock(&self.state).modes.iter().copied().collect()
    }

    pub fn spoken(&self) -> Vec<MascotSpeech> {
        lock(&self.state).spoken.iter().cloned().collect()
    }

    pub fn heard(&self) -> Vec<String> {
        lock(&self.state).heard.iter().cloned().collect()
    }

    /// `(heard, spoken)` since the scene was built, including lines no longer kept.
    pub fn totals(&self) -> (usize, usize) {
        let state = lock(&self.state);
        (state.heard_total, state.spoken_total)
    }

    pub fn mood(&self) -> Mood {
        lock(&self.state).mood
    }

    /// Advance the speech bubble animation and return the visible text.
    pub fn tick_bubble(&self) -> String {
        lock(&self.state).bubble.tick().to_string()
    }

    pub fn bubble_text(&self) -> String {
        lock(&self.state).bubble.full_text().to_string()
    }

    pub fn visible_bubble(&self) -> String {
        lock(&self.state).bubble.visible().to_string()
    }
}

/// Decide how to react to a chat line. Slash commands drive the playground.
pub fn interpret(text: &str) -> ChatAction {
    let text = text.trim();
    if text.is_empty() {
        return ChatAction::Ignore;
    }
    if let Some(command) = text.strip_prefix('/') {
        let mut parts = command.split_whitespace();
        return match (parts.next(), parts.next()) {
            (Some("sprite"), _) => ChatAction::AddSprite,
            (Some("toggle"), Some(mode)) => parse_mode(mode).map_or(ChatAction::Ignore, ChatAction::Toggle),
            _ => ChatAction::Ignore,
        };
    }

    let lower = text.to_lowercase();
    let first_word = lower
        .split(|c: char| !c.is_alphanumeric())
        .find(|w| !w.is_empty())
        .unwrap_or("");
    if GREETINGS.contains(&first_word) {
        return ChatAction::Reply(MascotSpeech {
            text: "Howdy, friend! The barn is open and the vibes are hand-churned.".to_string(),
            mood: Mood::Happy,
        });
    }
    if text.ends_with('?') {
        let quip = QUIPS.choose(&mut rand::rng()).copied().unwrap_or(QUIPS[0]);
        return ChatAction::Reply(MascotSpeech {
            text: quip.to_string(),
            mood: Mood::Neutral,
        });
    }
    ChatAction::Reply(MascotSpeech {
        text: format!("Ja, \"{text}\". Very vibey."),
        mood: Mood::Neutral,
    })
}

fn parse_mode(name: &str) -> Option<UiMode> {
    match name.to_ascii_lowercase().as_str() {
        "chat" => Some(UiMode::Chat),
        "weather" => Some(UiMode::Weather),
        "news" => Some(UiMode::News),
        "stocks" => Some(UiMode::Stocks),
        "flights" => Some(UiMode::Flights),
        _ => None,
    }
}

impl Scene for MascotScene {
    fn key(&self) -> &'static str {
        "mascot"
    }

    fn create(&self, bus: &EventBus<AppEvent>, ctx: ContextId) {
        // chat -> reaction, emitted after the state lock is released
        let state = self.state.clone();
        let publisher = bus.clone();
        let _ = bus.on_with_context(EventKind::ChatInput, ctx, move |event| {
            let AppEvent::ChatInput(chat) = event else { return };
            let action = interpret(&chat.text);
            let follow_up = {
                let mut state = lock(&state);
                push_recent(&mut state.heard, chat.text.clone());
                state.heard_total += 1;
                match action {
                    ChatAction::Ignore => None,
                    ChatAction::Reply(speech) => Some(AppEvent::MascotSays(speech)),
                    ChatAction::AddSprite => Some(AppEvent::AddSprite),
                    ChatAction::Toggle(mode) => {
                        let enabled = !state.modes.contains(&mode);
                        Some(AppEvent::toggle(mode, enabled))
                    }
                }
            };
            if let Some(event) = follow_up {
                publisher.emit(&event);
            }
        });

        let state = self.state.clone();
        let chars_per_tick = self.chars_per_tick;
        let _ = bus.on_with_context(EventKind::MascotSays, ctx, move |event| {
            let AppEvent::MascotSays(speech) = event else { return };
            info!(mood = ?speech.mood, text = %speech.text, "mascot speaks");
            let mut state = lock(&state);
            state.bubble = Typewriter::new(speech.text.clone(), chars_per_tick);
            state.mood = speech.mood;
            push_recent(&mut state.spoken, speech.clone());
            state.spoken_total += 1;
        });

        let state = self.state.clone();
        let _ = bus.on_with_context(EventKind::AddSprite, ctx, move |_| {
            let mut state = lock(&state);
            state.sprites += 1;
            debug!(sprites = state.sprites, "sprite added");
        });

        let state = self.state.clone();
        let _ = bus.on_with_context(EventKind::ModeToggled, ctx, move |event| {
            let AppEvent::ModeToggled(toggle) = event else { return };
            let mut state = lock(&state);
            if toggle.enabled {
                state.modes.insert(toggle.mode);
            } else {
                state.modes.remove(&toggle.mode);
            }
        });
    }

    fn on_frame(&self) {
        lock(&self.state).bubble.tick();
    }

    fn summary(&self) -> String {
        let state = lock(&self.state);
        format!(
            "heard {} line(s), said {}, {} sprite(s), modes {:?}, bubble {:?}",
            state.heard_total,
            state.spoken_total,
            state.sprites,
            state.modes,
            state.bubble.visible()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenes::HISTORY_LIMIT;

    fn mounted() -> (EventBus<AppEvent>, MascotScene) {
        let bus = EventBus::new();
        let scene = MascotScene::new(&AppConfig::default());
        let ctx = bus.new_context("mascot");
        scene.create(&bus, ctx);
        (bus, scene)
    }

    #[test]
    fn interprets_greetings_questions_and_commands() {
        assert!(matches!(interpret("Howdy there"), ChatAction::Reply(MascotSpeech { mood: Mood::Happy, .. })));
        match interpret("Is it raining?") {
            ChatAction::Reply(speech) => assert!(QUIPS.contains(&speech.text.as_str())),
            other => panic!("unexpected action {other:?}"),
        }
        assert_eq!(interpret("/sprite"), ChatAction::AddSprite);
        assert_eq!(interpret("/toggle News"), ChatAction::Toggle(UiMode::News));
        assert_eq!(interpret("/toggle tractors"), ChatAction::Ignore);
        assert_eq!(interpret("   "), ChatAction::Ignore);
    }

    #[test]
    fn chat_produces_speech_through_the_bus() {
        let (bus, scene) = mounted();
        let report = bus.emit(&AppEvent::chat("hello"));
        assert_eq!(report.failed, 0);
        assert_eq!(scene.spoken().len(), 1);
        assert_eq!(scene.mood(), Mood::Happy);
        assert_eq!(scene.heard(), vec!["hello".to_string()]);
        assert_eq!(scene.tick_bubble(), "H");
    }

    #[test]
    fn slash_commands_round_trip_through_bus() {
        let (bus, scene) = mounted();
        bus.emit(&AppEvent::chat("/sprite"));
        bus.emit(&AppEvent::chat("/sprite"));
        bus.emit(&AppEvent::chat("/toggle weather"));
        assert_eq!(scene.sprites(), 2);
        assert_eq!(scene.modes(), vec![UiMode::Weather]);
        bus.emit(&AppEvent::chat("/toggle weather"));
        assert!(scene.modes().is_empty());
    }

    #[test]
    fn frames_reveal_the_bubble() {
        let (bus, scene) = mounted();
        bus.emit(&AppEvent::mascot("Ja!", Mood::Happy));
        assert_eq!(scene.visible_bubble(), "");
        scene.on_frame();
        scene.on_frame();
        assert_eq!(scene.visible_bubble(), "Ja");
        scene.on_frame();
        scene.on_frame();
        assert!(scene.summary().ends_with("bubble \"Ja!\""));
    }

    #[test]
    fn history_is_bounded_but_totals_keep_counting() {
        let (bus, scene) = mounted();
        for i in 0..HISTORY_LIMIT + 10 {
            bus.emit(&AppEvent::chat(format!("line {i}")));
        }
        let heard = scene.heard();
        assert_eq!(heard.len(), HISTORY_LIMIT);
        assert_eq!(heard[0], "line 10");
        assert_eq!(scene.spoken().len(), HISTORY_LIMIT);
        assert_eq!(scene.totals(), (HISTORY_LIMIT + 10, HISTORY_LIMIT + 10));
        assert!(scene.summary().starts_with(&format!("heard {} line(s)", HISTORY_LIMIT + 10)));
    }

    #[test]
    fn echo_reply_quotes_the_input() {
        let (bus, scene) = mounted();
        bus.emit(&AppEvent::chat("nice barn"));
        assert!(scene.bubble_text().contains("\"nice barn\""));
    }
}
