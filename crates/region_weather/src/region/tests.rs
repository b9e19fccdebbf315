use super::*;
use crate::calendar::WeatherCalendar;
use crate::catalog::WeatherCatalog;
use crate::climate::{ClimateProvider, ClimateSample, SeasonalClimate};
use crate::params::WeatherParams;

const SEED: u64 = 0x5eed_1234;

struct Fixture {
    calendar: WeatherCalendar,
    climate: Box<dyn ClimateProvider>,
    catalog: WeatherCatalog,
    params: WeatherParams,
}

impl Fixture {
    fn new() -> Self {
        Self {
            calendar: WeatherCalendar::default(),
            climate: Box::new(SeasonalClimate::default()),
            catalog: WeatherCatalog::default(),
            params: WeatherParams::default(),
        }
    }

    fn with_constant_climate(temperature: f32, rainfall: f32) -> Self {
        let mut fixture = Self::new();
        fixture.climate = Box::new(move |_: Vec3, _: f64| {
            Some(ClimateSample {
                temperature,
                rainfall,
                elevation_adjusted_rainfall: rainfall,
            })
        });
        fixture
    }

    fn ctx(&self) -> WeatherContext<'_> {
        WeatherContext {
            calendar: &self.calendar,
            climate: self.climate.as_ref(),
            catalog: &self.catalog,
            params: &self.params,
        }
    }
}

fn coord() -> RegionCoord {
    RegionCoord::new(3, -7)
}

#[test]
fn test_fresh_regions_are_deterministic() {
    let fx = Fixture::new();
    let a = RegionWeatherSimulation::load_random_pattern(coord(), SEED, &fx.ctx());
    let b = RegionWeatherSimulation::load_random_pattern(coord(), SEED, &fx.ctx());
    assert_eq!(a.to_bytes(), b.to_bytes());
    assert_eq!(a.phase(), RegionPhase::Steady);

    let other =
        RegionWeatherSimulation::load_random_pattern(RegionCoord::new(4, -7), SEED, &fx.ctx());
    assert_ne!(a.rng(), other.rng());
}

#[test]
fn test_containing_floors_toward_negative() {
    assert_eq!(RegionCoord::containing(0.0, 0.0, 100.0), RegionCoord::new(0, 0));
    assert_eq!(RegionCoord::containing(99.9, 100.0, 100.0), RegionCoord::new(0, 1));
    assert_eq!(RegionCoord::containing(-0.1, -250.0, 100.0), RegionCoord::new(-1, -3));
    // Degenerate sizes clamp to one world unit
    assert_eq!(RegionCoord::containing(5.5, -5.5, 0.0), RegionCoord::new(5, -6));
}

#[test]
fn test_roundtrip_is_bit_identical() {
    let mut fx = Fixture::with_constant_climate(-4.0, 0.7);
    let mut region = RegionWeatherSimulation::load_random_pattern(coord(), SEED, &fx.ctx());
    fx.calendar.total_hours = 12.3;
    region.trigger_transition(Some(30.0), &fx.ctx());
    for _ in 0..40 {
        region.tick(0.025, &fx.ctx());
    }
    assert!(region.blender().weight > 0.0 && region.blender().weight < 1.0);
    assert_eq!(region.snow().snapshot_copy().len(), 12);

    let bytes = region.to_bytes();
    let restored = RegionWeatherSimulation::from_bytes(coord(), SEED, &bytes, &fx.ctx());

    assert_eq!(restored.blender().weight.to_bits(), region.blender().weight.to_bits());
    assert_eq!(restored.blender(), region.blender());
    assert_eq!(restored.wind(), region.wind());
    assert_eq!(restored.event(), region.event());
    assert_eq!(restored.rng(), region.rng());
    assert_eq!(restored.snow().snapshot_copy(), region.snow().snapshot_copy());
    assert_eq!(restored.snow().ledger(), region.snow().ledger());
    assert_eq!(restored.to_bytes(), bytes);
}

#[test]
fn test_corrupt_bytes_regenerate() {
    let fx = Fixture::new();
    let fresh = RegionWeatherSimulation::load_random_pattern(coord(), SEED, &fx.ctx());

    let restored = RegionWeatherSimulation::from_bytes(coord(), SEED, &[1, 2, 3], &fx.ctx());
    assert_eq!(restored.to_bytes(), fresh.to_bytes());

    let empty = RegionWeatherSimulation::from_bytes(coord(), SEED, &[], &fx.ctx());
    assert_eq!(empty.to_bytes(), fresh.to_bytes());
}

#[test]
fn test_bytes_for_another_region_regenerate() {
    let fx = Fixture::new();
    let other =
        RegionWeatherSimulation::load_random_pattern(RegionCoord::new(0, 0), SEED, &fx.ctx());
    let restored =
        RegionWeatherSimulation::from_bytes(coord(), SEED, &other.to_bytes(), &fx.ctx());
    assert_eq!(restored.coord(), coord());
    assert_eq!(
        restored.rng(),
        RegionWeatherSimulation::load_random_pattern(coord(), SEED, &fx.ctx()).rng()
    );
}

#[test]
fn test_out_of_range_indices_are_clamped_on_load() {
    let fx = Fixture::new();
    let region = RegionWeatherSimulation::load_random_pattern(coord(), SEED, &fx.ctx());
    let mut state = region.to_state();
    state.blender.new.index = 500;
    state.wind.state.index = 500;
    state.event.state.index = 500;
    let bytes = bitcode::encode(&state);

    let restored = RegionWeatherSimulation::from_bytes(coord(), SEED, &bytes, &fx.ctx());
    assert_eq!(restored.blender().new.index as usize, fx.catalog.patterns.len() - 1);
    assert_eq!(restored.wind().state.index as usize, fx.catalog.wind_patterns.len() - 1);
    assert_eq!(restored.event().state.index as usize, fx.catalog.events.len() - 1);
}

#[test]
fn test_auto_retrigger_when_pattern_expires() {
    let mut fx = Fixture::new();
    let mut region = RegionWeatherSimulation::load_random_pattern(coord(), SEED, &fx.ctx());
    let previous = region.blender().new;

    fx.calendar.total_hours = previous.active_until_hours + 0.5;
    let report = region.tick(0.025, &fx.ctx());

    assert_eq!(report.push, Some(PushReason::Transition));
    assert_eq!(region.phase(), RegionPhase::Transitioning);
    // Wind re-selection may drift the outgoing pattern's cloud factors
    assert_eq!(region.blender().old.index, previous.index);
    assert_eq!(region.blender().old.active_until_hours, previous.active_until_hours);
    assert!(region.blender().new.active_until_hours > fx.calendar.total_hours);
    assert!(region.blender().weight > 0.0);
}

#[test]
fn test_steady_region_does_not_push() {
    let fx = Fixture::new();
    let mut region = RegionWeatherSimulation::load_random_pattern(coord(), SEED, &fx.ctx());
    for _ in 0..10 {
        let report = region.tick(0.025, &fx.ctx());
        assert_eq!(report.push, None);
    }
}

#[test]
fn test_transition_completes() {
    let fx = Fixture::new();
    let mut region = RegionWeatherSimulation::load_random_pattern(coord(), SEED, &fx.ctx());
    region.trigger_transition(Some(1.0), &fx.ctx());
    assert_eq!(region.blender().weight, 0.0);
    for _ in 0..60 {
        region.tick(0.025, &fx.ctx());
    }
    assert_eq!(region.phase(), RegionPhase::Steady);
    assert_eq!(region.blender().weight, 1.0);
    assert_eq!(region.current().cloud_density, region.blender().new.cloud_density);
}

#[test]
fn test_transition_length_matches_its_delay_at_custom_reference_speed() {
    let mut fx = Fixture::new();
    fx.params.transition.reference_speed_of_time = 120.0;
    fx.calendar.speed_of_time = 120.0;
    let mut region = RegionWeatherSimulation::load_random_pattern(coord(), SEED, &fx.ctx());
    region.trigger_transition(None, &fx.ctx());
    let delay = region.blender().transition_delay;
    assert!(delay >= fx.params.transition.delay_base_secs);

    let tolerance = delay as f64 * 0.01 + 0.05;
    let mut elapsed = 0.0f64;
    while region.phase() == RegionPhase::Transitioning {
        region.tick(0.025, &fx.ctx());
        elapsed += 0.025;
        assert!(
            elapsed <= delay as f64 + tolerance,
            "blend ran {elapsed}s for a {delay}s delay"
        );
    }
    assert!(
        (elapsed - delay as f64).abs() <= tolerance,
        "blend ran {elapsed}s for a {delay}s delay"
    );
}

#[test]
fn test_unsustainable_events_do_not_churn() {
    let mut fx = Fixture::with_constant_climate(20.0, 0.0);
    for event in &mut fx.catalog.events {
        event.sustain.min_rainfall = Some(0.5);
    }
    let mut region = RegionWeatherSimulation::load_random_pattern(coord(), SEED, &fx.ctx());
    let event = region.event().code(&fx.catalog).to_string();

    let mut event_pushes = 0;
    for _ in 0..400 {
        fx.calendar.total_hours += 0.05;
        if region.tick(0.025, &fx.ctx()).push == Some(PushReason::EventChanged) {
            event_pushes += 1;
        }
        assert_eq!(region.event().code(&fx.catalog), event);
    }
    assert_eq!(event_pushes, 0);
}

#[test]
fn test_force_overrides() {
    let fx = Fixture::new();
    let mut region = RegionWeatherSimulation::load_random_pattern(coord(), SEED, &fx.ctx());

    assert!(region.force_pattern("heavy-rain", Some(5.0), &fx.ctx()));
    assert_eq!(region.blender().new.code(&fx.catalog), "heavy-rain");
    assert_eq!(region.phase(), RegionPhase::Transitioning);

    assert!(region.force_wind("gale", &fx.ctx()));
    assert_eq!(region.wind().code(&fx.catalog), "gale");
    assert!(region.force_event("thunderstorm", &fx.ctx()));
    assert_eq!(region.event().code(&fx.catalog), "thunderstorm");

    let before = region.to_bytes();
    assert!(!region.force_pattern("acid-rain", None, &fx.ctx()));
    assert!(!region.force_wind("tornado", &fx.ctx()));
    assert!(!region.force_event("meteor", &fx.ctx()));
    assert_eq!(region.to_bytes(), before);
}

#[test]
fn test_blended_snapshot() {
    let fx = Fixture::with_constant_climate(-10.0, 0.8);
    let mut region = RegionWeatherSimulation::load_random_pattern(coord(), SEED, &fx.ctx());
    region.force_pattern("snow-clouds", Some(0.001), &fx.ctx());
    region.tick(0.025, &fx.ctx());

    let current = region.current();
    let pattern = region.blender().new;
    assert_eq!(current.pattern_code, "snow-clouds");
    assert_eq!(current.blend_weight, 1.0);
    assert!((current.temperature - (-10.0 + pattern.temperature_offset)).abs() < 1e-5);
    assert_eq!(current.precipitation_type, PrecipitationType::Snow);
    assert!((current.wind.length() - current.wind_speed).abs() < 1e-5);
}

#[test]
fn test_precipitation_classification() {
    assert_eq!(PrecipitationType::classify(0.0, -10.0), PrecipitationType::None);
    assert_eq!(PrecipitationType::classify(f32::NAN, 10.0), PrecipitationType::None);
    assert_eq!(PrecipitationType::classify(0.5, -5.0), PrecipitationType::Snow);
    assert_eq!(PrecipitationType::classify(0.5, 0.0), PrecipitationType::Sleet);
    assert_eq!(PrecipitationType::classify(0.5, 12.0), PrecipitationType::Rain);
}

#[test]
fn test_snow_catch_up_inline_and_backlog() {
    let mut fx = Fixture::with_constant_climate(-5.0, 0.8);
    let mut region = RegionWeatherSimulation::load_random_pattern(coord(), SEED, &fx.ctx());

    fx.calendar.total_hours = 10.0;
    let report = region.tick(0.025, &fx.ctx());
    assert_eq!(report.snow_hours, 10);
    assert_eq!(report.snow_backlog, 0);
    assert!(region.snow().accumulated().iter().all(|d| *d > 0.0));

    fx.calendar.total_hours = 200.0;
    let report = region.tick(0.025, &fx.ctx());
    assert_eq!(report.snow_hours, 0);
    assert_eq!(report.snow_backlog, 190);
}

#[test]
fn test_regenerate_replays_stream() {
    let fx = Fixture::new();
    let fresh = RegionWeatherSimulation::load_random_pattern(coord(), SEED, &fx.ctx());
    let mut region = RegionWeatherSimulation::load_random_pattern(coord(), SEED, &fx.ctx());
    region.trigger_transition(None, &fx.ctx());
    region.regenerate(&fx.ctx());
    assert_eq!(region.rng(), fresh.rng());
    assert_eq!(region.blender(), fresh.blender());
    assert_eq!(region.wind(), fresh.wind());
    assert_eq!(region.event(), fresh.event());
}

#[test]
fn test_stale_packet_is_discarded() {
    let mut fx = Fixture::new();
    fx.calendar.total_hours = 100.0;
    let authority = RegionWeatherSimulation::load_random_pattern(coord(), SEED, &fx.ctx());
    let packet = authority.state_packet(PushReason::Subscribed, 100.0);

    let mut replica = RegionWeatherSimulation::from_packet(&packet, &fx.ctx()).unwrap();
    assert_eq!(replica.last_applied_hours(), 100.0);

    let mut changed = RegionWeatherSimulation::load_random_pattern(coord(), SEED, &fx.ctx());
    changed.force_pattern("fog", Some(1.0), &fx.ctx());
    let stale = changed.state_packet(PushReason::Forced, 90.0);
    assert!(!replica.apply_packet(&stale, &fx.ctx()));
    assert_eq!(replica.last_applied_hours(), 100.0);
    assert_eq!(replica.blender(), authority.blender());

    let fresh = changed.state_packet(PushReason::Forced, 110.0);
    assert!(replica.apply_packet(&fresh, &fx.ctx()));
    assert_eq!(replica.last_applied_hours(), 110.0);
    assert_eq!(replica.blender().new.code(&fx.catalog), "fog");
}

#[test]
fn test_packet_for_other_region_is_rejected() {
    let fx = Fixture::new();
    let authority = RegionWeatherSimulation::load_random_pattern(coord(), SEED, &fx.ctx());
    let subscribed = authority.state_packet(PushReason::Subscribed, 0.0);
    let mut replica = RegionWeatherSimulation::from_packet(&subscribed, &fx.ctx()).unwrap();
    let other =
        RegionWeatherSimulation::load_random_pattern(RegionCoord::new(0, 0), SEED, &fx.ctx());
    assert!(!replica.apply_packet(&other.state_packet(PushReason::Transition, 5.0), &fx.ctx()));

    let mut garbage = authority.state_packet(PushReason::Transition, 5.0);
    garbage.state = vec![0xAB; 7];
    assert!(!replica.apply_packet(&garbage, &fx.ctx()));
    assert_eq!(replica.last_applied_hours(), 0.0);
}

#[test]
fn test_packet_wire_roundtrip() {
    let fx = Fixture::new();
    let authority = RegionWeatherSimulation::load_random_pattern(coord(), SEED, &fx.ctx());
    let packet = authority.state_packet(PushReason::WindChanged, 4.5);
    let decoded = RegionStatePacket::decode(&packet.encode()).unwrap();
    assert_eq!(decoded, packet);
}

#[test]
fn test_replica_never_selects() {
    let mut fx = Fixture::new();
    let authority = RegionWeatherSimulation::load_random_pattern(coord(), SEED, &fx.ctx());
    let subscribed = authority.state_packet(PushReason::Subscribed, 0.0);
    let mut replica = RegionWeatherSimulation::from_packet(&subscribed, &fx.ctx()).unwrap();

    fx.calendar.total_hours = 1_000.0;
    for _ in 0..100 {
        replica.tick_replica(0.025, &fx.ctx());
    }
    assert_eq!(replica.rng(), authority.rng());
    assert_eq!(replica.blender().new, authority.blender().new);
    assert_eq!(replica.wind(), authority.wind());
    assert_eq!(replica.event(), authority.event());
}

#[test]
fn test_replica_smooths_wind_speed() {
    let fx = Fixture::new();
    let mut authority = RegionWeatherSimulation::load_random_pattern(coord(), SEED, &fx.ctx());
    authority.force_wind("still", &fx.ctx());
    let subscribed = authority.state_packet(PushReason::Subscribed, 0.0);
    let mut replica = RegionWeatherSimulation::from_packet(&subscribed, &fx.ctx()).unwrap();
    replica.tick_replica(0.025, &fx.ctx());
    let calm_speed = replica.current().wind_speed;

    authority.force_wind("gale", &fx.ctx());
    let gale_speed = authority.current().wind_speed.max(authority.wind().state.strength);
    assert!(replica.apply_packet(&authority.state_packet(PushReason::Forced, 0.1), &fx.ctx()));

    replica.tick_replica(0.025, &fx.ctx());
    let step = replica.current().wind_speed;
    assert!(step > calm_speed && step < gale_speed);

    for _ in 0..2_000 {
        replica.tick_replica(0.025, &fx.ctx());
    }
    assert!((replica.current().wind_speed - gale_speed).abs() < 1e-3);
}
