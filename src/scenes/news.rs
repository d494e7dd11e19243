/// Fake news anchor: reads headlines and reacts by sentiment keyword counting
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::config::AppConfig;
use crate::core::bus::EventBus;
use crate::core::subscription::ContextId;
use crate::events::{AppEvent, EventKind, Mood, NewsHeadline};
use crate::scenes::{lock, push_recent, Scene};

const POSITIVE: &[&str] = &[
    "good", "great", "win", "wins", "record", "growth", "happy", "celebrate", "success", "rise", "rises", "boom",
    "bumper", "best",
];

const NEGATIVE: &[&str] = &[
    "bad", "loss", "crash", "fall", "falls", "scandal", "storm", "fear", "down", "fail", "fails", "drop", "worst",
    "shortage",
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Sentiment {
    pub positive: usize,
    pub negative: usize,
}

impl Sentiment {
    /// Count whole-word keyword hits, case-insensitive.
    pub fn of(text: &str) -> Self {
        let mut sentiment = Sentiment::default();
        for word in text.split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty()) {
            let word = word.to_lowercase();
            if POSITIVE.contains(&word.as_str()) {
                sentiment.positive += 1;
            } else if NEGATIVE.contains(&word.as_str()) {
                sentiment.negative += 1;
            }
        }
        sentiment
    }

    pub fn score(&self) -> i64 {
        self.positive as i64 - self.negative as i64
    }

    pub fn mood(&self) -> Mood {
        match self.score() {
            s if s > 0 => Mood::Happy,
            s if s < 0 => Mood::Grumpy,
            _ => Mood::Neutral,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub headline: String,
    pub sentiment: Sentiment,
}

/// The anchor's on-air line for a headline.
pub fn anchor_take(headline: &NewsHeadline, sentiment: Sentiment) -> String {
    let take = match sentiment.mood() {
        Mood::Happy => "Wunderbar! Somebody bake a shoofly pie.",
        Mood::Grumpy => "Oof. Back to the butter churn, folks.",
        Mood::Neutral => "Well, that happened.",
    };
    format!("Breaking: {}. {}", headline.headline.trim_end_matches('.'), take)
}

#[derive(Debug, Default)]
struct Desk {
    recent: VecDeque<Report>,
    headlines: usize,
    net: i64,
}

pub struct NewsScene {
    desk: Arc<Mutex<Desk>>,
}

impl NewsScene {
    pub fn new(_config: &AppConfig) -> Self {
        Self {
            desk: Arc::new(Mutex::new(Desk::default())),
        }
    }

    /// The most recent reports, oldest first.
    pub fn reports(&self) -> Vec<Report> {
        lock(&self.desk).recent.iter().cloned().collect()
    }

    /// Headlines read and their summed sentiment score over the scene's life.
    pub fn totals(&self) -> (usize, i64) {
        let desk = lock(&self.desk);
        (desk.headlines, desk.net)
    }
}

impl Scene for NewsScene {
    fn key(&self) -> &'static str {
        "news"
    }

    fn create(&self, bus: &EventBus<AppEvent>, ctx: ContextId) {
        let desk = self.desk.clone();
        let publisher = bus.clone();
        let _ = bus.on_with_context(EventKind::NewsHeadline, ctx, move |event| {
            let AppEvent::NewsHeadline(headline) = event else { return };
            let sentiment = Sentiment::of(&format!("{} {}", headline.headline, headline.body));
            {
                let mut desk = lock(&desk);
                desk.headlines += 1;
                desk.net += sentiment.score();
                push_recent(
                    &mut desk.recent,
                    Report {
                        headline: headline.headline.clone(),
                        sentiment,
                    },
                );
            }
            publisher.emit(&AppEvent::mascot(anchor_take(headline, sentiment), sentiment.mood()));
        });
    }

    fn summary(&self) -> String {
        let desk = lock(&self.desk);
        format!("{} headline(s), net sentiment {:+}", desk.headlines, desk.net)
    }
}
