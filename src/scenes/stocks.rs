/// Stock ticker demo: latest quote per symbol and a ticker tape
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::config::AppConfig;
use crate::core::bus::EventBus;
use crate::core::subscription::ContextId;
use crate::events::{AppEvent, EventKind, StockQuote};
use crate::scenes::{lock, Scene};

/// Percent change of `price` against `previous_close`; zero when there is no close.
pub fn change_pct(quote: &StockQuote) -> f64 {
    if quote.previous_close <= 0.0 {
        return 0.0;
    }
    (quote.price - quote.previous_close) / quote.previous_close * 100.0
}

pub fn ticker_line(quote: &StockQuote) -> String {
    let pct = change_pct(quote);
    let arrow = if pct > 0.0 {
        '▲'
    } else if pct < 0.0 {
        '▼'
    } else {
        '■'
    };
    let mock = if quote.fallback { " (mock)" } else { "" };
    format!("{} {:.2} {} {:+.2}%{}", quote.symbol, quote.price, arrow, pct, mock)
}

pub struct StocksScene {
    watched: Vec<String>,
    quotes: Arc<Mutex<BTreeMap<String, StockQuote>>>,
}

impl StocksScene {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            watched: config.watched_symbols.clone(),
            quotes: Arc::new(Mutex::new(BTreeMap::new())),
        }
    }

    pub fn quote(&self, symbol: &str) -> Option<StockQuote> {
        lock(&self.quotes).get(symbol).cloned()
    }

    /// Ticker lines for watched symbols that have a quote, in watch-list order.
    pub fn tape(&self) -> Vec<String> {
        let quotes = lock(&self.quotes);
        self.watched.iter().filter_map(|s| quotes.get(s)).map(ticker_line).collect()
    }
}

impl Scene for StocksScene {
    fn key(&self) -> &'static str {
        "stocks"
    }

    fn create(&self, bus: &EventBus<AppEvent>, ctx: ContextId) {
        let quotes = self.quotes.clone();
        let _ = bus.on_with_context(EventKind::StockQuote, ctx, move |event| {
            let AppEvent::StockQuote(quote) = event else { return };
            debug!(symbol = %quote.symbol, price = quote.price, fallback = quote.fallback, "quote received");
            lock(&quotes).insert(quote.symbol.clone(), quote.clone());
        });
    }

    fn summary(&self) -> String {
        let tape = self.tape();
        if tape.is_empty() {
            "no quotes yet".to_string()
        } else {
            tape.join(" | ")
        }
    }
}
