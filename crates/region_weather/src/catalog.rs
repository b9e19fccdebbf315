//! Weather pattern, wind pattern and weather event catalogs.
//!
//! Catalogs are read-only and shared process-wide as `Arc<WeatherCatalog>`.
//! Regions refer to entries by stable index only and keep their own mutable
//! per-use state. The climate weighting of every entry is data ([`HereChance`]),
//! so custom curves can be loaded from JSON.

use std::fmt;
use std::sync::Arc;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::climate::ClimateSample;
use crate::rng::WeatherRng;

fn default_falloff() -> f32 {
    5.0
}

/// Climate interval with a linear falloff outside it.
///
/// Inside `[min, max]` the factor is 1.0; it drops linearly to 0.0 over
/// `falloff` units beyond either edge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClimateBand {
    pub min: f32,
    pub max: f32,
    #[serde(default = "default_falloff")]
    pub falloff: f32,
}

impl ClimateBand {
    pub const fn new(min: f32, max: f32, falloff: f32) -> Self {
        Self { min, max, falloff }
    }

    pub fn factor(&self, value: f32) -> f32 {
        let distance = if value < self.min {
            self.min - value
        } else if value > self.max {
            value - self.max
        } else {
            return 1.0;
        };
        if self.falloff <= 0.0 {
            return 0.0;
        }
        (1.0 - distance / self.falloff).max(0.0)
    }
}

/// Climate-dependent selection weight of a catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct HereChance {
    pub weight: f32,
    #[serde(default)]
    pub temperature: Option<ClimateBand>,
    #[serde(default)]
    pub rainfall: Option<ClimateBand>,
}

impl HereChance {
    pub const fn flat(weight: f32) -> Self {
        Self {
            weight,
            temperature: None,
            rainfall: None,
        }
    }

    /// Non-negative weight at the given climate. Non-finite results count as 0.
    pub fn at(&self, climate: &ClimateSample) -> f32 {
        let t = self
            .temperature
            .map_or(1.0, |band| band.factor(climate.temperature));
        let r = self
            .rainfall
            .map_or(1.0, |band| band.factor(climate.rainfall));
        let w = self.weight * t * r;
        if w.is_finite() && w > 0.0 {
            w
        } else {
            0.0
        }
    }
}

/// Inclusive range a per-use parameter is rolled from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    pub min: f32,
    pub max: f32,
}

impl ValueRange {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    pub const fn fixed(value: f32) -> Self {
        Self {
            min: value,
            max: value,
        }
    }

    pub fn roll(&self, rng: &mut WeatherRng) -> f32 {
        rng.next_range(self.min, self.max)
    }

    pub fn clamp(&self, value: f32) -> f32 {
        value.clamp(self.min.min(self.max), self.max.max(self.min))
    }
}

/// Conditions an event needs to keep running.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ClimateRequirement {
    #[serde(default)]
    pub min_rainfall: Option<f32>,
    #[serde(default)]
    pub min_temperature: Option<f32>,
    #[serde(default)]
    pub max_temperature: Option<f32>,
}

impl ClimateRequirement {
    pub fn is_met(&self, rainfall: f32, temperature: f32) -> bool {
        self.min_rainfall.map_or(true, |min| rainfall >= min)
            && self.min_temperature.map_or(true, |min| temperature >= min)
            && self.max_temperature.map_or(true, |max| temperature <= max)
    }
}

/// Lightning produced while an event is active.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LightningParams {
    /// No lightning below this temperature.
    pub min_temperature: f32,
    /// Strikes per second at full intensity.
    pub rate: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherPatternDef {
    pub code: String,
    pub chance: HereChance,
    pub cloud_density: ValueRange,
    pub fog_density: ValueRange,
    pub precipitation: ValueRange,
    /// Added to the climate temperature while this pattern is active.
    pub temperature_offset: ValueRange,
    pub duration_hours: ValueRange,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindPatternDef {
    pub code: String,
    pub chance: HereChance,
    pub strength: ValueRange,
    pub duration_hours: ValueRange,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherEventDef {
    pub code: String,
    pub chance: HereChance,
    pub duration_hours: ValueRange,
    /// Added to the blended pattern precipitation while active.
    #[serde(default)]
    pub precipitation_boost: f32,
    #[serde(default)]
    pub lightning: Option<LightningParams>,
    #[serde(default)]
    pub sustain: ClimateRequirement,
}

/// Errors from loading a catalog.
#[derive(Debug)]
pub enum CatalogError {
    /// The JSON could not be parsed into a catalog.
    Parse(serde_json::Error),
    /// A catalog section has no entries.
    Empty(&'static str),
    /// Two entries in one section share a code.
    DuplicateCode { section: &'static str, code: String },
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogError::Parse(e) => write!(f, "Catalog parse error: {e}"),
            CatalogError::Empty(section) => write!(f, "Catalog section '{section}' is empty"),
            CatalogError::DuplicateCode { section, code } => {
                write!(f, "Catalog section '{section}' has duplicate code '{code}'")
            }
        }
    }
}

impl std::error::Error for CatalogError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CatalogError::Parse(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for CatalogError {
    fn from(e: serde_json::Error) -> Self {
        CatalogError::Parse(e)
    }
}

/// Clamp a stored catalog index into range, logging when it had to move.
pub(crate) fn clamp_index(index: u32, len: usize, section: &str) -> u32 {
    let last = len.saturating_sub(1) as u32;
    if index > last {
        warn!(
            "Weather catalog '{}' index {} out of range (len {}), clamping to {}",
            section, index, len, last
        );
        last
    } else {
        index
    }
}

fn check_section<T>(
    section: &'static str,
    entries: &[T],
    code: impl Fn(&T) -> &str,
) -> Result<(), CatalogError> {
    if entries.is_empty() {
        return Err(CatalogError::Empty(section));
    }
    for (i, entry) in entries.iter().enumerate() {
        if entries[..i].iter().any(|other| code(other) == code(entry)) {
            return Err(CatalogError::DuplicateCode {
                section,
                code: code(entry).to_string(),
            });
        }
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherCatalog {
    pub patterns: Vec<WeatherPatternDef>,
    pub wind_patterns: Vec<WindPatternDef>,
    pub events: Vec<WeatherEventDef>,
}

impl WeatherCatalog {
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let catalog: WeatherCatalog = serde_json::from_str(json)?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn validate(&self) -> Result<(), CatalogError> {
        check_section("patterns", &self.patterns, |p| p.code.as_str())?;
        check_section("wind_patterns", &self.wind_patterns, |w| w.code.as_str())?;
        check_section("events", &self.events, |e| e.code.as_str())
    }

    pub fn pattern(&self, index: u32) -> &WeatherPatternDef {
        &self.patterns[clamp_index(index, self.patterns.len(), "patterns") as usize]
    }

    pub fn wind_pattern(&self, index: u32) -> &WindPatternDef {
        &self.wind_patterns[clamp_index(index, self.wind_patterns.len(), "wind_patterns") as usize]
    }

    pub fn event(&self, index: u32) -> &WeatherEventDef {
        &self.events[clamp_index(index, self.events.len(), "events") as usize]
    }

    pub fn pattern_index(&self, code: &str) -> Option<u32> {
        self.patterns.iter().position(|p| p.code == code).map(|i| i as u32)
    }

    pub fn wind_pattern_index(&self, code: &str) -> Option<u32> {
        self.wind_patterns.iter().position(|w| w.code == code).map(|i| i as u32)
    }

    pub fn event_index(&self, code: &str) -> Option<u32> {
        self.events.iter().position(|e| e.code == code).map(|i| i as u32)
    }
}

impl Default for WeatherCatalog {
    fn default() -> Self {
        let patterns = vec![
            WeatherPatternDef {
                code: "clear".into(),
                chance: HereChance::flat(1.0),
                cloud_density: ValueRange::new(0.0, 0.1),
                fog_density: ValueRange::new(0.0, 0.02),
                precipitation: ValueRange::fixed(0.0),
                temperature_offset: ValueRange::new(0.5, 2.0),
                duration_hours: ValueRange::new(8.0, 36.0),
            },
            WeatherPatternDef {
                code: "scattered-clouds".into(),
                chance: HereChance::flat(1.2),
                cloud_density: ValueRange::new(0.2, 0.45),
                fog_density: ValueRange::new(0.0, 0.05),
                precipitation: ValueRange::fixed(0.0),
                temperature_offset: ValueRange::new(-0.5, 1.0),
                duration_hours: ValueRange::new(6.0, 24.0),
            },
            WeatherPatternDef {
                code: "overcast".into(),
                chance: HereChance {
                    weight: 0.8,
                    temperature: None,
                    rainfall: Some(ClimateBand::new(0.3, 1.0, 0.3)),
                },
                cloud_density: ValueRange::new(0.7, 0.95),
                fog_density: ValueRange::new(0.05, 0.15),
                precipitation: ValueRange::new(0.0, 0.05),
                temperature_offset: ValueRange::new(-2.0, -0.5),
                duration_hours: ValueRange::new(6.0, 24.0),
            },
            WeatherPatternDef {
                code: "drizzle".into(),
                chance: HereChance {
                    weight: 0.6,
                    temperature: Some(ClimateBand::new(2.0, 40.0, 4.0)),
                    rainfall: Some(ClimateBand::new(0.4, 1.0, 0.2)),
                },
                cloud_density: ValueRange::new(0.6, 0.85),
                fog_density: ValueRange::new(0.1, 0.2),
                precipitation: ValueRange::new(0.1, 0.35),
                temperature_offset: ValueRange::new(-2.0, -1.0),
                duration_hours: ValueRange::new(3.0, 12.0),
            },
            WeatherPatternDef {
                code: "heavy-rain".into(),
                chance: HereChance {
                    weight: 0.4,
                    temperature: Some(ClimateBand::new(4.0, 45.0, 4.0)),
                    rainfall: Some(ClimateBand::new(0.6, 1.0, 0.2)),
                },
                cloud_density: ValueRange::new(0.85, 1.0),
                fog_density: ValueRange::new(0.1, 0.3),
                precipitation: ValueRange::new(0.5, 1.0),
                temperature_offset: ValueRange::new(-3.0, -1.5),
                duration_hours: ValueRange::new(2.0, 8.0),
            },
            WeatherPatternDef {
                code: "fog".into(),
                chance: HereChance {
                    weight: 0.3,
                    temperature: Some(ClimateBand::new(-5.0, 15.0, 5.0)),
                    rainfall: Some(ClimateBand::new(0.3, 1.0, 0.2)),
                },
                cloud_density: ValueRange::new(0.3, 0.6),
                fog_density: ValueRange::new(0.5, 0.9),
                precipitation: ValueRange::fixed(0.0),
                temperature_offset: ValueRange::new(-1.0, 0.0),
                duration_hours: ValueRange::new(2.0, 10.0),
            },
            WeatherPatternDef {
                code: "snow-clouds".into(),
                chance: HereChance {
                    weight: 0.9,
                    temperature: Some(ClimateBand::new(-40.0, 0.0, 3.0)),
                    rainfall: Some(ClimateBand::new(0.3, 1.0, 0.2)),
                },
                cloud_density: ValueRange::new(0.75, 1.0),
                fog_density: ValueRange::new(0.1, 0.25),
                precipitation: ValueRange::new(0.3, 0.8),
                temperature_offset: ValueRange::new(-3.0, -1.0),
                duration_hours: ValueRange::new(4.0, 18.0),
            },
        ];

        let wind_patterns = vec![
            WindPatternDef {
                code: "still".into(),
                chance: HereChance::flat(0.6),
                strength: ValueRange::new(0.0, 0.05),
                duration_hours: ValueRange::new(4.0, 16.0),
            },
            WindPatternDef {
                code: "light-breeze".into(),
                chance: HereChance::flat(1.5),
                strength: ValueRange::new(0.1, 0.3),
                duration_hours: ValueRange::new(4.0, 24.0),
            },
            WindPatternDef {
                code: "medium-breeze".into(),
                chance: HereChance::flat(1.0),
                strength: ValueRange::new(0.3, 0.55),
                duration_hours: ValueRange::new(3.0, 16.0),
            },
            WindPatternDef {
                code: "strong-breeze".into(),
                chance: HereChance::flat(0.4),
                strength: ValueRange::new(0.55, 0.8),
                duration_hours: ValueRange::new(2.0, 10.0),
            },
            WindPatternDef {
                code: "gale".into(),
                chance: HereChance {
                    weight: 0.15,
                    temperature: None,
                    rainfall: Some(ClimateBand::new(0.5, 1.0, 0.3)),
                },
                strength: ValueRange::new(0.8, 1.2),
                duration_hours: ValueRange::new(1.0, 6.0),
            },
        ];

        let events = vec![
            WeatherEventDef {
                code: "calm".into(),
                chance: HereChance::flat(3.0),
                duration_hours: ValueRange::new(6.0, 24.0),
                precipitation_boost: 0.0,
                lightning: None,
                sustain: ClimateRequirement::default(),
            },
            WeatherEventDef {
                code: "showers".into(),
                chance: HereChance {
                    weight: 0.8,
                    temperature: Some(ClimateBand::new(2.0, 40.0, 3.0)),
                    rainfall: Some(ClimateBand::new(0.35, 1.0, 0.2)),
                },
                duration_hours: ValueRange::new(1.0, 4.0),
                precipitation_boost: 0.25,
                lightning: None,
                sustain: ClimateRequirement {
                    min_rainfall: Some(0.2),
                    min_temperature: Some(0.0),
                    max_temperature: None,
                },
            },
            WeatherEventDef {
                code: "thunderstorm".into(),
                chance: HereChance {
                    weight: 0.3,
                    temperature: Some(ClimateBand::new(15.0, 45.0, 5.0)),
                    rainfall: Some(ClimateBand::new(0.55, 1.0, 0.15)),
                },
                duration_hours: ValueRange::new(1.0, 3.0),
                precipitation_boost: 0.5,
                lightning: Some(LightningParams {
                    min_temperature: 10.0,
                    rate: 0.4,
                }),
                sustain: ClimateRequirement {
                    min_rainfall: Some(0.4),
                    min_temperature: Some(8.0),
                    max_temperature: None,
                },
            },
            WeatherEventDef {
                code: "hailstorm".into(),
                chance: HereChance {
                    weight: 0.1,
                    temperature: Some(ClimateBand::new(5.0, 25.0, 5.0)),
                    rainfall: Some(ClimateBand::new(0.6, 1.0, 0.15)),
                },
                duration_hours: ValueRange::new(0.25, 1.0),
                precipitation_boost: 0.4,
                lightning: Some(LightningParams {
                    min_temperature: 5.0,
                    rate: 0.15,
                }),
                sustain: ClimateRequirement {
                    min_rainfall: Some(0.45),
                    min_temperature: Some(0.0),
                    max_temperature: None,
                },
            },
            WeatherEventDef {
                code: "blizzard".into(),
                chance: HereChance {
                    weight: 0.5,
                    temperature: Some(ClimateBand::new(-50.0, -2.0, 2.0)),
                    rainfall: Some(ClimateBand::new(0.5, 1.0, 0.2)),
                },
                duration_hours: ValueRange::new(2.0, 12.0),
                precipitation_boost: 0.4,
                lightning: None,
                sustain: ClimateRequirement {
                    min_rainfall: Some(0.3),
                    min_temperature: None,
                    max_temperature: Some(0.0),
                },
            },
        ];

        Self {
            patterns,
            wind_patterns,
            events,
        }
    }
}

/// Process-wide shared catalog.
#[derive(Resource, Clone)]
pub struct SharedCatalog(pub Arc<WeatherCatalog>);

impl Default for SharedCatalog {
    fn default() -> Self {
        Self(Arc::new(WeatherCatalog::default()))
    }
}
