use bevy::prelude::*;

use super::*;

#[test]
fn test_diurnal_factor_peak_and_minimum() {
    assert!((diurnal_factor(15.0) - 1.0).abs() < 0.01);
    assert!(diurnal_factor(6.0).abs() < 0.01);
    for h in 0..24 {
        let f = diurnal_factor(h as f32);
        assert!((-0.01..=1.01).contains(&f), "diurnal_factor({}) = {}", h, f);
    }
}

#[test]
fn test_seasonal_climate_is_deterministic() {
    let a = SeasonalClimate::new(ClimateZone::Continental, 17);
    let b = SeasonalClimate::new(ClimateZone::Continental, 17);
    let pos = Vec3::new(1000.0, 120.0, -300.0);
    for hour in [0.5, 100.25, 5000.0, 12345.75] {
        assert_eq!(a.climate_at(pos, hour), b.climate_at(pos, hour));
    }
}

#[test]
fn test_winter_colder_than_summer() {
    let climate = SeasonalClimate::new(ClimateZone::Temperate, 1);
    let pos = Vec3::new(0.0, 110.0, 0.0);
    // Noon on day 0 (mid-winter) vs noon on day 180 (mid-summer)
    let winter = climate.climate_at(pos, 12.0).unwrap();
    let summer = climate.climate_at(pos, 180.0 * 24.0 + 12.0).unwrap();
    assert!(
        summer.temperature > winter.temperature + 15.0,
        "summer {} should be much warmer than winter {}",
        summer.temperature,
        winter.temperature
    );
}

#[test]
fn test_altitude_cools_and_wets() {
    let climate = SeasonalClimate::new(ClimateZone::Oceanic, 3);
    let low = climate.climate_at(Vec3::new(10.0, 110.0, 10.0), 300.0).unwrap();
    let high = climate.climate_at(Vec3::new(10.0, 230.0, 10.0), 300.0).unwrap();
    assert!(high.temperature < low.temperature);
    assert!(high.elevation_adjusted_rainfall >= low.elevation_adjusted_rainfall);
    assert_eq!(high.rainfall, low.rainfall);
}

#[test]
fn test_rainfall_in_unit_range() {
    for zone in ClimateZone::all() {
        let climate = SeasonalClimate::new(*zone, 99);
        for day in 0..360 {
            let c = climate
                .climate_at(Vec3::new(50.0, 140.0, 70.0), day as f64 * 24.0 + 3.0)
                .unwrap();
            assert!((0.0..=1.0).contains(&c.rainfall), "{:?} rainfall {}", zone, c.rainfall);
            assert!((0.0..=1.0).contains(&c.elevation_adjusted_rainfall));
        }
    }
}

#[test]
fn test_non_finite_query_returns_none() {
    let climate = SeasonalClimate::default();
    assert!(climate.climate_at(Vec3::new(f32::NAN, 0.0, 0.0), 1.0).is_none());
    assert!(climate.climate_at(Vec3::ZERO, f64::INFINITY).is_none());
}

#[test]
fn test_zone_from_name() {
    assert_eq!(ClimateZone::from_name("subarctic"), Some(ClimateZone::Subarctic));
    assert_eq!(ClimateZone::from_name("Arid"), Some(ClimateZone::Arid));
    assert_eq!(ClimateZone::from_name("lunar"), None);
}

#[test]
fn test_closure_provider() {
    let source = ClimateSource::new(|_pos: Vec3, _hours: f64| {
        Some(ClimateSample {
            temperature: -5.0,
            rainfall: 0.8,
            elevation_adjusted_rainfall: 0.8,
        })
    });
    let c = source.0.climate_at(Vec3::ZERO, 0.0).unwrap();
    assert_eq!(c.temperature, -5.0);
}
