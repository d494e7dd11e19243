/// Timer-driven publishers standing in for the app's polling sources
use std::collections::HashMap;
use std::time::Duration;

use anyhow::{bail, Result};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use crate::config::AppConfig;
use crate::core::bus::EventBus;
use crate::events::{AppEvent, FlightPosition, NewsHeadline, StockQuote, WeatherCondition, WeatherReading};

/// A polled data source. `poll` may fail; `fallback` masks the failure.
pub trait Feed: Send + 'static {
    fn name(&self) -> &'static str;

    fn poll(&mut self) -> Result<Vec<AppEvent>>;

    fn fallback(&mut self) -> Vec<AppEvent>;
}

/// Poll `feed` every `period` (first poll immediately) and emit what it yields.
///
/// Feeds are fire-and-forget: nothing deduplicates two feeds for the same
/// resource. Abort the returned handle to stop.
pub fn spawn_feed<F: Feed>(bus: EventBus<AppEvent>, period: Duration, mut feed: F) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            let events = match feed.poll() {
                Ok(events) => events,
                Err(e) => {
                    warn!(feed = feed.name(), error = %e, "feed failed, using fallback");
                    feed.fallback()
                }
            };
            debug!(feed = feed.name(), count = events.len(), "feed tick");
            for event in &events {
                bus.emit(event);
            }
        }
    })
}

fn seeded_rng(seed: Option<u64>) -> StdRng {
    StdRng::seed_from_u64(seed.unwrap_or_else(rand::random))
}

pub struct WeatherFeed {
    city: String,
    failure_rate: f64,
    rng: StdRng,
}

impl WeatherFeed {
    pub fn new(config: &AppConfig, seed: Option<u64>) -> Self {
        Self {
            city: config.default_city.clone(),
            failure_rate: 0.1,
            rng: seeded_rng(seed),
        }
    }

    pub fn with_failure_rate(mut self, rate: f64) -> Self {
        self.failure_rate = rate.clamp(0.0, 1.0);
        self
    }
}

/// Default reading used when the weather source is down.
pub fn fallback_weather(city: &str) -> WeatherReading {
    WeatherReading {
        city: city.to_string(),
        temperature_c: 18.0,
        condition: WeatherCondition::Clear,
        wind_kph: 5.0,
        fallback: true,
    }
}

impl Feed for WeatherFeed {
    fn name(&self) -> &'static str {
        "weather"
    }

    fn poll(&mut self) -> Result<Vec<AppEvent>> {
        if self.rng.random_bool(self.failure_rate) {
            bail!("weather service timed out");
        }
        let condition = *WeatherCondition::ALL.choose(&mut self.rng).unwrap_or(&WeatherCondition::Clear);
        let temperature_c = match condition {
            WeatherCondition::Snow => self.rng.random_range(-12.0..1.0),
            _ => self.rng.random_range(2.0..34.0),
        };
        Ok(vec![AppEvent::WeatherDataReceived(WeatherReading {
            city: self.city.clone(),
            temperature_c,
            condition,
            wind_kph: self.rng.random_range(0.0..60.0),
            fallback: false,
        })])
    }

    fn fallback(&mut self) -> Vec<AppEvent> {
        vec![AppEvent::WeatherDataReceived(fallback_weather(&self.city))]
    }
}

/// Random-walk quotes for the watched symbols.
pub struct StockFeed {
    symbols: Vec<String>,
    closes: HashMap<String, f64>,
    last: HashMap<String, f64>,
    failure_rate: f64,
    rng: StdRng,
}

impl StockFeed {
    pub fn new(config: &AppConfig, seed: Option<u64>) -> Self {
        let mut rng = seeded_rng(seed);
        let closes: HashMap<String, f64> = config
            .watched_symbols
            .iter()
            .map(|s| (s.clone(), rng.random_range(5.0..250.0)))
            .collect();
        Self {
            symbols: config.watched_symbols.clone(),
            last: closes.clone(),
            closes,
            failure_rate: 0.1,
            rng,
        }
    }

    pub fn with_failure_rate(mut self, rate: f64) -> Self {
        self.failure_rate = rate.clamp(0.0, 1.0);
        self
    }

    fn quotes(&mut self, max_step_pct: f64, fallback: bool) -> Vec<AppEvent> {
        let mut events = Vec::with_capacity(self.symbols.len());
        for symbol in &self.symbols {
            let close = self.closes.get(symbol).copied().unwrap_or(100.0);
            let last = self.last.entry(symbol.clone()).or_insert(close);
            let step = self.rng.random_range(-max_step_pct..=max_step_pct) / 100.0;
            *last = (*last * (1.0 + step)).max(0.01);
            events.push(AppEvent::StockQuote(StockQuote {
                symbol: symbol.clone(),
                price: (*last * 100.0).round() / 100.0,
                previous_close: close,
                fallback,
            }));
        }
        events
    }
}

impl Feed for StockFeed {
    fn name(&self) -> &'static str {
        "stocks"
    }

    fn poll(&mut self) -> Result<Vec<AppEvent>> {
        if self.rng.random_bool(self.failure_rate) {
            bail!("quote API rate limited");
        }
        Ok(self.quotes(2.0, false))
    }

    // mock prices: small jitter around the last known price
    fn fallback(&mut self) -> Vec<AppEvent> {
        self.quotes(0.5, true)
    }
}

pub const HEADLINES: [&str; 8] = [
    "Local barn raising sets new record",
    "Buggy traffic jam causes crash on Route 30",
    "Shoofly pie prices rise amid bumper harvest",
    "Scandal at county fair as prize pumpkin falls off stage",
    "Quilting circle celebrates great success",
    "Horse refuses to work, cites storm fear",
    "Butter churn startup wins best in show",
    "Lantern oil shortage worst in decades",
];

pub struct NewsFeed {
    rng: StdRng,
}

impl NewsFeed {
    pub fn new(seed: Option<u64>) -> Self {
        Self { rng: seeded_rng(seed) }
    }
}

impl Feed for NewsFeed {
    fn name(&self) -> &'static str {
        "news"
    }

    fn poll(&mut self) -> Result<Vec<AppEvent>> {
        let headline = HEADLINES.choose(&mut self.rng).copied().unwrap_or(HEADLINES[0]);
        Ok(vec![AppEvent::NewsHeadline(NewsHeadline {
            headline: headline.to_string(),
            body: String::new(),
        })])
    }

    fn fallback(&mut self) -> Vec<AppEvent> {
        Vec::new()
    }
}

/// Aircraft wandering around the home point.
pub struct FlightFeed {
    home: (f64, f64),
    flights: Vec<FlightPosition>,
    rng: StdRng,
}

impl FlightFeed {
    pub fn new(config: &AppConfig, seed: Option<u64>) -> Self {
        let mut rng = seeded_rng(seed);
        let home = (config.home_latitude, config.home_longitude);
        let flights = ["AMSH1", "BUGY22", "HRSE7"]
            .iter()
            .map(|callsign| FlightPosition {
                callsign: callsign.to_string(),
                latitude: home.0 + rng.random_range(-1.0..1.0),
                longitude: home.1 + rng.random_range(-1.0..1.0),
                altitude_m: rng.random_range(900.0..11000.0),
            })
            .collect();
        Self { home, flights, rng }
    }
}

impl Feed for FlightFeed {
    fn name(&self) -> &'static str {
        "flights"
    }

    fn poll(&mut self) -> Result<Vec<AppEvent>> {
        for flight in &mut self.flights {
            flight.latitude += self.rng.random_range(-0.15..0.15);
            flight.longitude += self.rng.random_range(-0.15..0.15);
            // drift back towards home so the demo keeps flying by
            flight.latitude += (self.home.0 - flight.latitude) * 0.1;
            flight.longitude += (self.home.1 - flight.longitude) * 0.1;
        }
        Ok(self.flights.iter().cloned().map(AppEvent::FlightPosition).collect())
    }

    fn fallback(&mut self) -> Vec<AppEvent> {
        Vec::new()
    }
}
