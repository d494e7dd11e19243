use std::io::Cursor;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;

use vibebus::config::AppConfig;
use vibebus::engine::{spawn_line_reader, VibeRuntime};
use vibebus::events::{Mood, WeatherCondition, WeatherReading};
use vibebus::scenes::mascot::MascotScene;
use vibebus::scenes::{Scene, SceneManager};
use vibebus::{AppEvent, EventBus, EventKind};

#[test]
fn headline_reaches_mascot_bubble_through_news_scene() {
    let bus = EventBus::new();
    let config = AppConfig::default();
    let mut manager = SceneManager::new(bus.clone());
    manager.start_by_key("news", &config).unwrap();

    let mascot = Arc::new(MascotScene::new(&config));
    manager.start(mascot.clone());

    bus.emit(&AppEvent::headline("Quilting circle celebrates great success"));
    assert_eq!(mascot.mood(), Mood::Happy);
    assert!(mascot.bubble_text().starts_with("Breaking: Quilting circle"));
}

#[test]
fn stopped_scene_no_longer_reacts() {
    let bus = EventBus::new();
    let config = AppConfig::default();
    let mut manager = SceneManager::new(bus.clone());
    let mascot = Arc::new(MascotScene::new(&config));
    manager.start(mascot.clone());

    bus.emit(&AppEvent::chat("/sprite"));
    manager.stop(mascot.key());
    bus.emit(&AppEvent::chat("/sprite"));

    assert_eq!(mascot.sprites(), 1);
    assert!(!manager.is_active("mascot"));
}

#[tokio::test]
async fn runtime_consumes_chat_until_eof() {
    let mut runtime = VibeRuntime::new(AppConfig::default());
    runtime.start_scenes(&[]).unwrap();

    let replies = Arc::new(Mutex::new(Vec::new()));
    let sink = replies.clone();
    let _sub = runtime.bus().on(EventKind::MascotSays, move |event| {
        if let AppEvent::MascotSays(speech) = event {
            sink.lock().unwrap().push(speech.text.clone());
        }
    });

    let input = spawn_line_reader(Cursor::new("howdy\n\n/sprite\nnice weather\n"));
    let summary = runtime.run(input, None).await.unwrap();

    assert_eq!(summary.chat_lines, 3);
    assert_eq!(replies.lock().unwrap().len(), 2);
    let mascot = summary.scenes.iter().find(|(k, _)| *k == "mascot").unwrap();
    assert!(mascot.1.contains("1 sprite(s)"));
    assert!(runtime.scenes().active().is_empty());
    assert!(runtime.bus().event_kinds() == vec![EventKind::MascotSays]);
}

#[tokio::test]
async fn publish_config_reaches_flight_scene() {
    let mut config = AppConfig::default();
    config.flight_radius_km = 400.0;
    let mut runtime = VibeRuntime::new(config);
    runtime.start_scenes(&["flights".to_string()]).unwrap();
    runtime.publish_config().unwrap();

    let summary = runtime.run(spawn_line_reader(Cursor::new("")), None).await.unwrap();
    let (_, flights) = &summary.scenes[0];
    assert!(flights.ends_with("within 400 km"), "{flights}");
}

#[tokio::test]
async fn unknown_scene_fails_to_start() {
    let mut runtime = VibeRuntime::new(AppConfig::default());
    let err = runtime.start_scenes(&["github".to_string()]).unwrap_err();
    assert!(format!("{err:#}").contains("scene 'github' not found"));
}

#[tokio::test(start_paused = true)]
async fn feeds_drive_scenes_until_deadline() {
    let mut runtime = VibeRuntime::new(AppConfig::default());
    runtime.start_scenes(&["weather".to_string(), "stocks".to_string()]).unwrap();

    let readings = Arc::new(Mutex::new(0usize));
    let counter = readings.clone();
    let _sub = runtime.bus().on(EventKind::WeatherDataReceived, move |_| *counter.lock().unwrap() += 1);

    runtime.spawn_feeds(Some(11));
    // input that never yields a line; the deadline ends the run
    let (_tx, rx) = mpsc::channel::<String>(1);
    let summary = runtime.run(rx, Some(Duration::from_secs(65))).await.unwrap();

    // weather refreshes at 0s, 30s and 60s
    assert_eq!(*readings.lock().unwrap(), 3);
    let stocks = summary.scenes.iter().find(|(k, _)| *k == "stocks").unwrap();
    assert!(stocks.1.contains("ACME"));
}

#[tokio::test(start_paused = true)]
async fn deadline_ends_run_while_input_stays_open() {
    let mut runtime = VibeRuntime::new(AppConfig::default());
    runtime.start_scenes(&["mascot".to_string()]).unwrap();

    let (tx, rx) = mpsc::channel(8);
    tx.send("/sprite".to_string()).await.unwrap();

    let summary = tokio::time::timeout(Duration::from_secs(60), runtime.run(rx, Some(Duration::from_secs(5))))
        .await
        .expect("run outlived its deadline")
        .unwrap();

    assert_eq!(summary.chat_lines, 1);
    assert!(summary.scenes[0].1.contains("1 sprite(s)"));
    // the sender is still open
    assert!(!tx.is_closed());
}

#[tokio::test(start_paused = true)]
async fn frames_reveal_the_reply_bubble_during_a_run() {
    let mut runtime = VibeRuntime::new(AppConfig::default());
    runtime.start_scenes(&["mascot".to_string()]).unwrap();

    let (tx, rx) = mpsc::channel(8);
    tx.send("howdy".to_string()).await.unwrap();
    let summary = runtime.run(rx, Some(Duration::from_secs(10))).await.unwrap();
    drop(tx);

    let (_, mascot) = &summary.scenes[0];
    assert!(
        mascot.ends_with("bubble \"Howdy, friend! The barn is open and the vibes are hand-churned.\""),
        "{mascot}"
    );
}

#[test]
fn weather_scene_effect_from_direct_emit() {
    let bus = EventBus::new();
    let config = AppConfig::default();
    let mut manager = SceneManager::new(bus.clone());
    manager.start_by_key("weather", &config).unwrap();

    let report = bus.emit(&AppEvent::WeatherDataReceived(WeatherReading {
        city: "Bird-in-Hand".into(),
        temperature_c: -3.0,
        condition: WeatherCondition::Snow,
        wind_kph: 12.0,
        fallback: false,
    }));
    assert_eq!(report.delivered, 1);
    let summaries = manager.summaries();
    assert!(summaries[0].1.contains("Snowflakes"));
}
