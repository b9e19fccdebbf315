//! Data-driven weather tunables.
//!
//! Collects the timing, snow and wind constants into a single [`WeatherParams`]
//! resource so they can be tuned at runtime. Registered via `Saveable` so
//! overrides persist across save/load.

use bevy::prelude::*;
use bitcode::{Decode, Encode};
use serde::{Deserialize, Serialize};

use crate::config::{
    DEFAULT_MAX_CATCHUP_HOURS, MAP_HEIGHT, MAX_WIND_SPEED, REFERENCE_SPEED_OF_TIME, REGION_SIZE,
    SEA_LEVEL,
};

/// Pattern transition timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Encode, Decode)]
pub struct TransitionParams {
    /// Minimum randomized transition length in seconds.
    pub delay_base_secs: f32,
    /// Random extra length on top of the base, in seconds.
    pub delay_scale_secs: f32,
    /// Speed of time the delays were authored for.
    pub reference_speed_of_time: f32,
}

impl Default for TransitionParams {
    fn default() -> Self {
        Self {
            delay_base_secs: 60.0,
            delay_scale_secs: 120.0,
            reference_speed_of_time: REFERENCE_SPEED_OF_TIME,
        }
    }
}

impl TransitionParams {
    /// How much faster than the authored pace simulated time runs. Both the
    /// randomized delay and the blend step scale by this same factor.
    pub fn speed_factor(&self, speed_of_time: f32) -> f32 {
        (speed_of_time / self.reference_speed_of_time.max(0.01)).max(0.01)
    }
}

/// Snow accumulation rules and catch-up limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Encode, Decode)]
pub struct SnowParams {
    /// Hard cap on hours back-filled by a single catch-up.
    pub max_catchup_hours: u32,
    /// Backlogs up to this many hours are computed inside the tick; larger
    /// ones are handed to a background task.
    pub inline_catchup_hours: u32,
    /// Above this temperature snow always melts.
    pub melt_temperature: f32,
    /// Below this rainfall, any temperature above freezing melts.
    pub dry_rainfall: f32,
    /// Melt per hour is `-temperature / melt_divisor`.
    pub melt_divisor: f32,
    /// Accumulation per hour is `rainfall / accumulate_divisor`.
    pub accumulate_divisor: f32,
    /// Lower and upper sample altitude of the corner grid.
    pub sample_altitudes: [f32; 2],
}

impl Default for SnowParams {
    fn default() -> Self {
        Self {
            max_catchup_hours: DEFAULT_MAX_CATCHUP_HOURS,
            inline_catchup_hours: 24,
            melt_temperature: 1.5,
            dry_rainfall: 0.05,
            melt_divisor: 15.0,
            accumulate_divisor: 3.0,
            sample_altitudes: [SEA_LEVEL, SEA_LEVEL + 64.0],
        }
    }
}

/// Altitude curve for wind speed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Encode, Decode)]
pub struct WindParams {
    /// Height above sea level over which wind strength doubles (before capping).
    pub altitude_scale: f32,
    pub max_speed: f32,
}

impl Default for WindParams {
    fn default() -> Self {
        Self {
            altitude_scale: 128.0,
            max_speed: MAX_WIND_SPEED,
        }
    }
}

/// World geometry the regions live in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Encode, Decode)]
pub struct WorldParams {
    pub region_size: f32,
    pub sea_level: f32,
    pub map_height: f32,
}

impl Default for WorldParams {
    fn default() -> Self {
        Self {
            region_size: REGION_SIZE,
            sea_level: SEA_LEVEL,
            map_height: MAP_HEIGHT,
        }
    }
}

#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize, Encode, Decode)]
pub struct WeatherParams {
    pub transition: TransitionParams,
    pub snow: SnowParams,
    pub wind: WindParams,
    pub world: WorldParams,
    /// Seconds of tick time between climate re-samples of a region.
    pub climate_resample_interval_secs: f32,
    /// Exponential approach rate (per second) for replica-side smoothing of
    /// wind speed and lightning rate.
    pub replica_smoothing_rate: f32,
}

impl Default for WeatherParams {
    fn default() -> Self {
        Self {
            transition: TransitionParams::default(),
            snow: SnowParams::default(),
            wind: WindParams::default(),
            world: WorldParams::default(),
            climate_resample_interval_secs: 0.25,
            replica_smoothing_rate: 2.0,
        }
    }
}

impl WeatherParams {
    /// Parse overrides from JSON. Missing sections are not allowed; use
    /// [`WeatherParams::default`] and edit fields for partial overrides.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl crate::Saveable for WeatherParams {
    const SAVE_KEY: &'static str = "weather_params";

    fn save_to_bytes(&self) -> Option<Vec<u8>> {
        if *self == Self::default() {
            return None;
        }
        Some(bitcode::encode(self))
    }

    fn load_from_bytes(bytes: &[u8]) -> Self {
        crate::decode_or_warn(Self::SAVE_KEY, bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Saveable;

    #[test]
    fn test_speed_factor_follows_reference_speed() {
        let mut transition = TransitionParams::default();
        assert!((transition.speed_factor(REFERENCE_SPEED_OF_TIME) - 1.0).abs() < f32::EPSILON);
        assert!((transition.speed_factor(4.0 * REFERENCE_SPEED_OF_TIME) - 4.0).abs() < 1e-6);

        transition.reference_speed_of_time = 120.0;
        assert!((transition.speed_factor(120.0) - 1.0).abs() < f32::EPSILON);
        assert!((transition.speed_factor(0.0) - 0.01).abs() < f32::EPSILON);
    }

    #[test]
    fn test_default_params_skip_saving() {
        assert!(WeatherParams::default().save_to_bytes().is_none());
    }

    #[test]
    fn test_modified_params_roundtrip() {
        let mut params = WeatherParams::default();
        params.snow.max_catchup_hours = 100;
        params.wind.max_speed = 2.0;
        let bytes = params.save_to_bytes().expect("modified params should save");
        let restored = WeatherParams::load_from_bytes(&bytes);
        assert_eq!(restored, params);
    }

    #[test]
    fn test_corrupt_bytes_fall_back_to_default() {
        let restored = WeatherParams::load_from_bytes(&[0xFF, 0x01]);
        assert_eq!(restored, WeatherParams::default());
    }

    #[test]
    fn test_json_roundtrip() {
        let params = WeatherParams::default();
        let json = serde_json::to_string(&params).unwrap();
        let parsed = WeatherParams::from_json(&json).unwrap();
        assert_eq!(parsed, params);
    }
}
