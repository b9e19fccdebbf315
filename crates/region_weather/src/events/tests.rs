use super::*;
use crate::catalog::WeatherCatalog;

fn climate(temperature: f32, rainfall: f32) -> ClimateSample {
    ClimateSample {
        temperature,
        rainfall,
        elevation_adjusted_rainfall: rainfall,
    }
}

fn forced(catalog: &WeatherCatalog, code: &str) -> WeatherEventController {
    let mut rng = WeatherRng::for_region(1, 1, 1);
    let mut controller =
        WeatherEventController::select(catalog, &climate(10.0, 0.3), 0.0, &mut rng);
    let index = catalog.event_index(code).unwrap();
    controller.force(catalog, index, 0.0, &mut rng);
    controller
}

#[test]
fn test_blizzard_stops_when_warm() {
    let catalog = WeatherCatalog::default();
    let blizzard = forced(&catalog, "blizzard");
    assert!(!blizzard.should_stop(&catalog, 0.8, -10.0));
    assert!(blizzard.should_stop(&catalog, 0.8, 5.0));
    assert!(blizzard.should_stop(&catalog, 0.1, -10.0));
}

#[test]
fn test_calm_never_stops() {
    let catalog = WeatherCatalog::default();
    let calm = forced(&catalog, "calm");
    assert!(!calm.should_stop(&catalog, 0.0, 40.0));
    assert!(!calm.should_stop(&catalog, 1.0, -40.0));
}

#[test]
fn test_selection_respects_sustain() {
    let catalog = WeatherCatalog::default();
    let mut rng = WeatherRng::for_region(2, 2, 2);
    // Hot and dry: only events without rainfall requirements qualify
    let dry = climate(30.0, 0.0);
    for _ in 0..500 {
        let controller = WeatherEventController::select(&catalog, &dry, 0.0, &mut rng);
        assert!(!controller.should_stop(&catalog, dry.rainfall, dry.temperature));
        assert_eq!(controller.code(&catalog), "calm");
    }
}

#[test]
fn test_cold_wet_climate_can_pick_blizzard() {
    let catalog = WeatherCatalog::default();
    let mut rng = WeatherRng::for_region(3, 3, 3);
    let cold = climate(-10.0, 0.8);
    let picked_blizzard = (0..500).any(|_| {
        WeatherEventController::select(&catalog, &cold, 0.0, &mut rng).code(&catalog) == "blizzard"
    });
    assert!(picked_blizzard);
}

#[test]
fn test_lightning_rate_needs_warmth() {
    let catalog = WeatherCatalog::default();
    let storm = forced(&catalog, "thunderstorm");
    assert!(storm.lightning_rate(&catalog, 25.0) > 0.0);
    assert_eq!(storm.lightning_rate(&catalog, 2.0), 0.0);
    let calm = forced(&catalog, "calm");
    assert_eq!(calm.lightning_rate(&catalog, 25.0), 0.0);
}

#[test]
fn test_expiry() {
    let catalog = WeatherCatalog::default();
    let mut rng = WeatherRng::for_region(4, 0, 0);
    let controller = WeatherEventController::select(&catalog, &climate(10.0, 0.3), 12.0, &mut rng);
    assert_eq!(controller.state.started_hours, 12.0);
    assert!(!controller.is_expired(controller.state.active_until_hours));
    assert!(controller.is_expired(controller.state.active_until_hours + 0.5));
}

#[test]
fn test_out_of_range_index_is_clamped() {
    let catalog = WeatherCatalog::default();
    let mut controller = forced(&catalog, "calm");
    controller.state.index = 999;
    assert_eq!(controller.code(&catalog), catalog.events.last().unwrap().code);
}

fn rain_only_catalog() -> WeatherCatalog {
    let mut catalog = WeatherCatalog::default();
    for event in &mut catalog.events {
        event.sustain.min_rainfall = Some(0.5);
    }
    catalog
}

#[test]
fn test_unsustainable_climate_keeps_current_event() {
    let catalog = rain_only_catalog();
    let dry = climate(20.0, 0.0);
    let mut rng = WeatherRng::for_region(5, 5, 5);
    let mut controller = WeatherEventController::select(&catalog, &dry, 0.0, &mut rng);
    let index = controller.state.index;
    assert!(!controller.should_stop(&catalog, dry.rainfall, dry.temperature));

    let later = controller.state.active_until_hours + 1.0;
    assert!(!controller.reselect(&catalog, &dry, later, &mut rng));
    assert_eq!(controller.state.index, index);
    assert_eq!(controller.state.started_hours, later);
    assert!(!controller.is_expired(later));
}

#[test]
fn test_stop_when_an_alternative_holds() {
    let catalog = rain_only_catalog();
    let wet = climate(20.0, 0.8);
    let mut rng = WeatherRng::for_region(6, 6, 6);
    let mut controller = forced(&catalog, "blizzard");
    assert!(controller.should_stop(&catalog, wet.rainfall, wet.temperature));
    assert!(controller.reselect(&catalog, &wet, 1.0, &mut rng));
    assert!(!controller.should_stop(&catalog, wet.rainfall, wet.temperature));
}
