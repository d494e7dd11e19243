use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::core::bus::EventBus;
use crate::engine::feeds::{spawn_feed, FlightFeed, NewsFeed, StockFeed, WeatherFeed};
use crate::events::{AppEvent, ConfigUpdated};
use crate::scenes::{scene_infos, SceneManager};

/// How often animated scenes are advanced
pub const FRAME_PERIOD: Duration = Duration::from_millis(50);

/// End-of-run report
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub chat_lines: usize,
    pub scenes: Vec<(&'static str, String)>,
}

/// Owns the single bus for the process and wires scenes and feeds onto it.
pub struct VibeRuntime {
    config: AppConfig,
    bus: EventBus<AppEvent>,
    scenes: SceneManager,
    feeds: Vec<JoinHandle<()>>,
}

impl VibeRuntime {
    pub fn new(config: AppConfig) -> Self {
        let bus = EventBus::new();
        Self {
            config,
            scenes: SceneManager::new(bus.clone()),
            bus,
            feeds: Vec::new(),
        }
    }

    pub fn bus(&self) -> &EventBus<AppEvent> {
        &self.bus
    }

    pub fn scenes(&self) -> &SceneManager {
        &self.scenes
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Start the named scenes, or every registered scene when `keys` is empty.
    pub fn start_scenes(&mut self, keys: &[String]) -> Result<()> {
        let keys: Vec<String> = if keys.is_empty() {
            scene_infos().into_iter().map(|i| i.key.to_string()).collect()
        } else {
            keys.to_vec()
        };
        for key in &keys {
            self.scenes
                .start_by_key(key, &self.config)
                .with_context(|| format!("starting scene '{key}'"))?;
        }
        Ok(())
    }

    /// Push every config field onto the bus as a `config-updated` event.
    pub fn publish_config(&self) -> Result<()> {
        let value = serde_json::to_value(&self.config).context("serializing config")?;
        let Some(fields) = value.as_object() else {
            return Ok(());
        };
        for (key, value) in fields {
            self.bus.emit(&AppEvent::ConfigUpdated(ConfigUpdated {
                key: key.clone(),
                value: value.clone(),
            }));
        }
        Ok(())
    }

    /// Spawn one feed per polled source. `seed` makes the simulated data repeatable.
    pub fn spawn_feeds(&mut self, seed: Option<u64>) {
        let seed_for = |offset: u64| seed.map(|s| s.wrapping_add(offset));
        self.feeds.push(spawn_feed(
            self.bus.clone(),
            self.config.weather_refresh(),
            WeatherFeed::new(&self.config, seed_for(1)),
        ));
        self.feeds.push(spawn_feed(
            self.bus.clone(),
            self.config.stock_watch(),
            StockFeed::new(&self.config, seed_for(2)),
        ));
        self.feeds.push(spawn_feed(
            self.bus.clone(),
            self.config.news_interval(),
            NewsFeed::new(seed_for(3)),
        ));
        self.feeds.push(spawn_feed(
            self.bus.clone(),
            self.config.flight_poll(),
            FlightFeed::new(&self.config, seed_for(4)),
        ));
        info!(feeds = self.feeds.len(), "feeds running");
    }

    /// Publish each input line as chat until the input closes or `duration`
    /// elapses, advancing scenes every [`FRAME_PERIOD`], then stop feeds and
    /// scenes.
    pub async fn run(&mut self, mut input: mpsc::Receiver<String>, duration: Option<Duration>) -> Result<RunSummary> {
        let mut chat_lines = 0;
        let deadline = async {
            match duration {
                Some(d) => tokio::time::sleep(d).await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::pin!(deadline);

        let mut frames = tokio::time::interval(FRAME_PERIOD);
        frames.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                line = input.recv() => {
                    let Some(line) = line else {
                        info!("input closed");
                        break;
                    };
                    if line.trim().is_empty() {
                        continue;
                    }
                    chat_lines += 1;
                    let report = self.bus.emit(&AppEvent::chat(line));
                    if report.failed > 0 {
                        warn!(failed = report.failed, "chat listeners failed");
                    }
                }
                _ = frames.tick() => {
                    self.scenes.frame();
                }
                _ = &mut deadline => {
                    info!("run duration elapsed");
                    break;
                }
            }
        }

        Ok(self.shutdown(chat_lines))
    }

    fn shutdown(&mut self, chat_lines: usize) -> RunSummary {
        for feed in self.feeds.drain(..) {
            feed.abort();
        }
        let scenes = self.scenes.summaries();
        self.scenes.stop_all();
        RunSummary { chat_lines, scenes }
    }
}

impl Drop for VibeRuntime {
    fn drop(&mut self) {
        for feed in &self.feeds {
            feed.abort();
        }
    }
}
