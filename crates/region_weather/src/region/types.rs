use bevy::prelude::*;
use bitcode::{Decode, Encode};
use serde::{Deserialize, Serialize};

use crate::calendar::WeatherCalendar;
use crate::catalog::WeatherCatalog;
use crate::climate::ClimateProvider;
use crate::params::WeatherParams;

/// Region identity in region units (world position / region size, floored).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Default,
    Serialize,
    Deserialize,
    Encode,
    Decode,
)]
pub struct RegionCoord {
    pub x: i32,
    pub z: i32,
}

impl RegionCoord {
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Region containing the world position `(x, z)`.
    pub fn containing(world_x: f32, world_z: f32, region_size: f32) -> Self {
        let size = region_size.max(1.0);
        Self {
            x: (world_x / size).floor() as i32,
            z: (world_z / size).floor() as i32,
        }
    }

    /// Centre of the region at height `y`.
    pub fn center(&self, region_size: f32, y: f32) -> Vec3 {
        Vec3::new(
            (self.x as f32 + 0.5) * region_size,
            y,
            (self.z as f32 + 0.5) * region_size,
        )
    }
}

impl std::fmt::Display for RegionCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.z)
    }
}

/// Whether this process owns pattern selection or mirrors pushed state.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SimulationRole {
    #[default]
    Authority,
    Replica,
}

/// Lifecycle phase of a loaded region. Regions that are not loaded have no
/// record at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionPhase {
    Steady,
    Transitioning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PrecipitationType {
    #[default]
    None,
    Rain,
    Snow,
    Sleet,
}

impl PrecipitationType {
    /// Below this intensity nothing falls.
    pub const MIN_INTENSITY: f32 = 0.05;
    /// Below this temperature precipitation falls as snow.
    pub const SNOW_BELOW: f32 = -2.0;
    /// Between the snow threshold and this temperature it falls as sleet.
    pub const SLEET_BELOW: f32 = 1.5;

    pub fn classify(intensity: f32, temperature: f32) -> Self {
        if intensity.is_nan() || intensity < Self::MIN_INTENSITY {
            Self::None
        } else if temperature < Self::SNOW_BELOW {
            Self::Snow
        } else if temperature < Self::SLEET_BELOW {
            Self::Sleet
        } else {
            Self::Rain
        }
    }
}

/// Read-only weather a region exposes after each tick.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BlendedWeather {
    pub total_hours: f64,
    /// Climate temperature plus the blended pattern offset, Celsius.
    pub temperature: f32,
    pub wind_speed: f32,
    /// Wind velocity `(dx, dz)` at sea level.
    pub wind: Vec2,
    pub precipitation: f32,
    pub precipitation_type: PrecipitationType,
    pub cloud_density: f32,
    pub fog_density: f32,
    /// Lightning strikes per second.
    pub lightning_rate: f32,
    pub blend_weight: f32,
    pub pattern_code: String,
    pub wind_code: String,
    pub event_code: String,
}

/// Why a region state packet was pushed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub enum PushReason {
    Transition,
    WindChanged,
    EventChanged,
    Subscribed,
    Forced,
}

/// Outcome of one region tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    /// Set when replicas need a fresh state packet.
    pub push: Option<PushReason>,
    /// Snapshots added inline this tick.
    pub snow_hours: usize,
    /// Hours still missing from snow history, left for a background task.
    pub snow_backlog: u64,
}

impl TickReport {
    /// Record a push reason, keeping the most significant one.
    pub(crate) fn request_push(&mut self, reason: PushReason) {
        let rank = |r: PushReason| match r {
            PushReason::WindChanged => 0,
            PushReason::EventChanged => 1,
            PushReason::Transition => 2,
            PushReason::Subscribed => 3,
            PushReason::Forced => 4,
        };
        self.push = match self.push {
            Some(current) if rank(current) >= rank(reason) => Some(current),
            _ => Some(reason),
        };
    }
}

/// Shared inputs of a region tick.
#[derive(Clone, Copy)]
pub struct WeatherContext<'a> {
    pub calendar: &'a WeatherCalendar,
    pub climate: &'a dyn ClimateProvider,
    pub catalog: &'a WeatherCatalog,
    pub params: &'a WeatherParams,
}

impl WeatherContext<'_> {
    pub fn now(&self) -> f64 {
        self.calendar.total_hours
    }

    /// Transition pace relative to the authored speed of time.
    pub fn time_speed_factor(&self) -> f32 {
        self.params.transition.speed_factor(self.calendar.speed_of_time)
    }
}
