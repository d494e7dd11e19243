/// Flight tracker: flags aircraft passing within a radius of home
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};

use tracing::info;

use crate::config::AppConfig;
use crate::core::bus::EventBus;
use crate::core::subscription::ContextId;
use crate::events::{AppEvent, EventKind, Mood};
use crate::scenes::{lock, Scene};

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance in km.
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let (phi1, phi2) = (lat1.to_radians(), lat2.to_radians());
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lon2 - lon1).to_radians();
    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().asin()
}

#[derive(Debug, Clone)]
pub struct FlightState {
    pub home: (f64, f64),
    pub radius_km: f64,
    pub distances: BTreeMap<String, f64>,
    pub overhead: BTreeSet<String>,
    pub sightings: usize,
}

pub struct FlightsScene {
    state: Arc<Mutex<FlightState>>,
}

impl FlightsScene {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            state: Arc::new(Mutex::new(FlightState {
                home: (config.home_latitude, config.home_longitude),
                radius_km: config.flight_radius_km,
                distances: BTreeMap::new(),
                overhead: BTreeSet::new(),
                sightings: 0,
            })),
        }
    }

    pub fn overhead(&self) -> Vec<String> {
        lock(&self.state).overhead.iter().cloned().collect()
    }

    pub fn distance_km(&self, callsign: &str) -> Option<f64> {
        lock(&self.state).distances.get(callsign).copied()
    }

    pub fn sightings(&self) -> usize {
        lock(&self.state).sightings
    }

    pub fn radius_km(&self) -> f64 {
        lock(&self.state).radius_km
    }
}

impl Scene for FlightsScene {
    fn key(&self) -> &'static str {
        "flights"
    }

    fn create(&self, bus: &EventBus<AppEvent>, ctx: ContextId) {
        let state = self.state.clone();
        let publisher = bus.clone();
        let _ = bus.on_with_context(EventKind::FlightPosition, ctx, move |event| {
            let AppEvent::FlightPosition(flight) = event else { return };
            let entered = {
                let mut state = lock(&state);
                let (home_lat, home_lon) = state.home;
                let distance = haversine_km(home_lat, home_lon, flight.latitude, flight.longitude);
                state.distances.insert(flight.callsign.clone(), distance);
                if distance <= state.radius_km {
                    let entered = state.overhead.insert(flight.callsign.clone());
                    if entered {
                        state.sightings += 1;
                    }
                    entered.then_some(distance)
                } else {
                    state.overhead.remove(&flight.callsign);
                    None
                }
            };
            if let Some(distance) = entered {
                info!(callsign = %flight.callsign, distance_km = distance, "flight overhead");
                publisher.emit(&AppEvent::mascot(
                    format!("Look up! {} is {:.1} km away at {:.0} m.", flight.callsign, distance, flight.altitude_m),
                    Mood::Happy,
                ));
            }
        });

        // home point and radius follow live config updates
        let state = self.state.clone();
        let _ = bus.on_with_context(EventKind::ConfigUpdated, ctx, move |event| {
            let AppEvent::ConfigUpdated(update) = event else { return };
            let Some(value) = update.value.as_f64() else { return };
            let mut state = lock(&state);
            match update.key.as_str() {
                "flight_radius_km" if value > 0.0 => state.radius_km = value,
                "home_latitude" if (-90.0..=90.0).contains(&value) => state.home.0 = value,
                "home_longitude" if (-180.0..=180.0).contains(&value) => state.home.1 = value,
                _ => {}
            }
        });
    }

    fn summary(&self) -> String {
        let state = lock(&self.state);
        format!(
            "{} tracked, {} overhead now, {} sighting(s) within {:.0} km",
            state.distances.len(),
            state.overhead.len(),
            state.sightings,
            state.radius_km
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{ConfigUpdated, FlightPosition};

    fn at(callsign: &str, latitude: f64, longitude: f64) -> AppEvent {
        AppEvent::FlightPosition(FlightPosition {
            callsign: callsign.into(),
            latitude,
            longitude,
            altitude_m: 3000.0,
        })
    }

    #[test]
    fn haversine_known_distance() {
        // Lancaster, PA to Philadelphia, PA is roughly 100 km
        let d = haversine_km(40.0379, -76.3055, 39.9526, -75.1652);
        assert!((95.0..105.0).contains(&d), "got {d}");
        assert!(haversine_km(10.0, 10.0, 10.0, 10.0).abs() < 1e-9);
    }

    #[test]
    fn entering_radius_announces_once() {
        let bus = EventBus::new();
        let scene = FlightsScene::new(&AppConfig::default());
        scene.create(&bus, bus.new_context("flights"));

        let announcements = Arc::new(Mutex::new(0));
        let counter = announcements.clone();
        let _sub = bus.on(EventKind::MascotSays, move |_| *counter.lock().unwrap() += 1);

        bus.emit(&at("AMSH1", 40.04, -76.30));
        bus.emit(&at("AMSH1", 40.05, -76.31));
        bus.emit(&at("FAR22", 39.95, -75.16));

        assert_eq!(scene.overhead(), vec!["AMSH1".to_string()]);
        assert_eq!(*announcements.lock().unwrap(), 1);
        assert_eq!(scene.sightings(), 1);

        bus.emit(&at("AMSH1", 39.95, -75.16));
        assert!(scene.overhead().is_empty());
        assert!(scene.distance_km("FAR22").unwrap() > 25.0);
    }

    #[test]
    fn config_updates_change_radius() {
        let bus = EventBus::new();
        let scene = FlightsScene::new(&AppConfig::default());
        scene.create(&bus, bus.new_context("flights"));

        bus.emit(&AppEvent::ConfigUpdated(ConfigUpdated {
            key: "flight_radius_km".into(),
            value: serde_json::json!(150.0),
        }));
        bus.emit(&AppEvent::ConfigUpdated(ConfigUpdated {
            key: "flight_radius_km".into(),
            value: serde_json::json!(-3.0),
        }));
        assert_eq!(scene.radius_km(), 150.0);

        bus.emit(&at("FAR22", 39.95, -75.16));
        assert_eq!(scene.overhead(), vec!["FAR22".to_string()]);
    }
}
