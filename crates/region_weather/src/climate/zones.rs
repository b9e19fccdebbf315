use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::{ClimateProvider, ClimateSample};
use crate::config::{DEFAULT_DAYS_PER_YEAR, DEFAULT_HOURS_PER_DAY, MAP_HEIGHT, SEA_LEVEL};
use crate::rng::splitmix64;

/// Temperature drop per block above sea level (Celsius).
const LAPSE_RATE_PER_BLOCK: f32 = 0.04;

/// Maximum local temperature offset from position noise (Celsius).
const LOCAL_TEMPERATURE_VARIATION: f32 = 2.0;

/// Size of the cells that share one local offset.
const LOCAL_CELL_SIZE: f32 = 64.0;

/// Climate zone presets that shift the seasonal curve of [`SeasonalClimate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ClimateZone {
    /// Moderate temperatures, four distinct seasons.
    #[default]
    Temperate,
    /// Hot year-round, heavy rainfall, no snow.
    Tropical,
    /// Hot days, cold nights, little rain.
    Arid,
    /// Dry hot summers, mild wet winters.
    Mediterranean,
    /// Cold winters, warm summers.
    Continental,
    /// Very cold winters, cool summers, heavy snow.
    Subarctic,
    /// Mild, wet year-round with narrow temperature range.
    Oceanic,
}

/// Seasonal curve parameters for one zone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoneClimateParams {
    /// Mean temperature at mid-winter (Celsius).
    pub winter_mean: f32,
    /// Mean temperature at mid-summer (Celsius).
    pub summer_mean: f32,
    /// Peak-to-trough day/night swing (Celsius).
    pub diurnal_range: f32,
    /// Annual mean rainfall in `[0, 1]`.
    pub rainfall: f32,
    /// Rainfall shift toward summer (positive) or winter (negative).
    pub rainfall_seasonality: f32,
}

impl ClimateZone {
    pub fn all() -> &'static [ClimateZone] {
        &[
            ClimateZone::Temperate,
            ClimateZone::Tropical,
            ClimateZone::Arid,
            ClimateZone::Mediterranean,
            ClimateZone::Continental,
            ClimateZone::Subarctic,
            ClimateZone::Oceanic,
        ]
    }

    pub fn name(self) -> &'static str {
        match self {
            ClimateZone::Temperate => "Temperate",
            ClimateZone::Tropical => "Tropical",
            ClimateZone::Arid => "Arid",
            ClimateZone::Mediterranean => "Mediterranean",
            ClimateZone::Continental => "Continental",
            ClimateZone::Subarctic => "Subarctic",
            ClimateZone::Oceanic => "Oceanic",
        }
    }

    /// Case-insensitive lookup by [`ClimateZone::name`].
    pub fn from_name(name: &str) -> Option<ClimateZone> {
        Self::all()
            .iter()
            .copied()
            .find(|z| z.name().eq_ignore_ascii_case(name))
    }

    pub fn params(self) -> ZoneClimateParams {
        match self {
            ClimateZone::Temperate => ZoneClimateParams {
                winter_mean: -4.0,
                summer_mean: 22.0,
                diurnal_range: 10.0,
                rainfall: 0.5,
                rainfall_seasonality: 0.0,
            },
            ClimateZone::Tropical => ZoneClimateParams {
                winter_mean: 24.0,
                summer_mean: 30.0,
                diurnal_range: 8.0,
                rainfall: 0.8,
                rainfall_seasonality: 0.2,
            },
            ClimateZone::Arid => ZoneClimateParams {
                winter_mean: 10.0,
                summer_mean: 36.0,
                diurnal_range: 18.0,
                rainfall: 0.1,
                rainfall_seasonality: 0.0,
            },
            ClimateZone::Mediterranean => ZoneClimateParams {
                winter_mean: 9.0,
                summer_mean: 27.0,
                diurnal_range: 12.0,
                rainfall: 0.35,
                rainfall_seasonality: -0.3,
            },
            ClimateZone::Continental => ZoneClimateParams {
                winter_mean: -14.0,
                summer_mean: 24.0,
                diurnal_range: 12.0,
                rainfall: 0.45,
                rainfall_seasonality: 0.2,
            },
            ClimateZone::Subarctic => ZoneClimateParams {
                winter_mean: -24.0,
                summer_mean: 14.0,
                diurnal_range: 8.0,
                rainfall: 0.4,
                rainfall_seasonality: 0.1,
            },
            ClimateZone::Oceanic => ZoneClimateParams {
                winter_mean: 4.0,
                summer_mean: 17.0,
                diurnal_range: 7.0,
                rainfall: 0.7,
                rainfall_seasonality: -0.1,
            },
        }
    }
}

/// Diurnal temperature factor in `[0.0, 1.0]`: 0.0 at the daily minimum
/// (06:00), 1.0 at the maximum (15:00).
pub fn diurnal_factor(hour: f32) -> f32 {
    let h = hour.rem_euclid(24.0);

    if (6.0..=15.0).contains(&h) {
        // Warming phase: 06:00 to 15:00 (9 hours)
        let t = (h - 6.0) / 9.0;
        0.5 - 0.5 * (t * std::f32::consts::PI).cos()
    } else {
        // Cooling phase: 15:00 to 06:00 next day (15 hours)
        let hours_since_15 = if h >= 15.0 { h - 15.0 } else { h + 9.0 };
        let t = hours_since_15 / 15.0;
        0.5 + 0.5 * (t * std::f32::consts::PI).cos()
    }
}

/// Deterministic `[0, 1)` value for a hashed key.
fn unit_hash(key: u64) -> f32 {
    (splitmix64(key) >> 40) as f32 / 16_777_216.0
}

/// Built-in climate provider: seasonal curve of a [`ClimateZone`], diurnal
/// cycle, elevation lapse rate and a position-derived local offset. Fully
/// deterministic in `(seed, position, total_hours)`.
#[derive(Debug, Clone, PartialEq)]
pub struct SeasonalClimate {
    pub zone: ClimateZone,
    pub seed: u64,
    pub hours_per_day: f32,
    pub days_per_year: u32,
    pub sea_level: f32,
    pub map_height: f32,
}

impl Default for SeasonalClimate {
    fn default() -> Self {
        Self {
            zone: ClimateZone::default(),
            seed: 0,
            hours_per_day: DEFAULT_HOURS_PER_DAY,
            days_per_year: DEFAULT_DAYS_PER_YEAR,
            sea_level: SEA_LEVEL,
            map_height: MAP_HEIGHT,
        }
    }
}

impl SeasonalClimate {
    pub fn new(zone: ClimateZone, seed: u64) -> Self {
        Self {
            zone,
            seed,
            ..Default::default()
        }
    }

    /// 0.0 at mid-winter (start of year), 1.0 at mid-summer.
    fn summer_factor(&self, total_hours: f64) -> f32 {
        let year = (self.hours_per_day as f64 * self.days_per_year as f64).max(1.0);
        let frac = (total_hours.rem_euclid(year) / year) as f32;
        0.5 - 0.5 * (frac * std::f32::consts::TAU).cos()
    }

    fn cell_key(&self, position: Vec3) -> u64 {
        let cx = (position.x / LOCAL_CELL_SIZE).floor() as i32 as u32 as u64;
        let cz = (position.z / LOCAL_CELL_SIZE).floor() as i32 as u32 as u64;
        self.seed ^ splitmix64((cx << 32) | cz)
    }
}

impl ClimateProvider for SeasonalClimate {
    fn climate_at(&self, position: Vec3, total_hours: f64) -> Option<ClimateSample> {
        if !position.is_finite() || !total_hours.is_finite() {
            return None;
        }
        let p = self.zone.params();
        let summer = self.summer_factor(total_hours);

        let hpd = self.hours_per_day.max(1.0);
        let hour = (total_hours.rem_euclid(hpd as f64) as f32) * 24.0 / hpd;
        let height_above = (position.y - self.sea_level).max(0.0);
        let cell = self.cell_key(position);

        let mean = p.winter_mean + (p.summer_mean - p.winter_mean) * summer;
        let diurnal = (diurnal_factor(hour) - 0.5) * p.diurnal_range;
        let local = (unit_hash(cell) * 2.0 - 1.0) * LOCAL_TEMPERATURE_VARIATION;
        let temperature = mean + diurnal + local - height_above * LAPSE_RATE_PER_BLOCK;

        let day = (total_hours / hpd as f64).floor() as i64 as u64;
        let daily = unit_hash(cell ^ day.wrapping_mul(0x9e3779b97f4a7c15));
        let seasonal_rain =
            (p.rainfall + p.rainfall_seasonality * (summer - 0.5)).clamp(0.0, 1.0);
        let rainfall = (seasonal_rain * (0.4 + 1.2 * daily)).clamp(0.0, 1.0);

        let relief = (self.map_height - self.sea_level).max(1.0);
        let elevation_adjusted_rainfall =
            (rainfall * (1.0 + 0.5 * height_above / relief)).clamp(0.0, 1.0);

        Some(ClimateSample {
            temperature,
            rainfall,
            elevation_adjusted_rainfall,
        })
    }
}
