//! Wind pattern controller: active wind pattern, its lifetime, and the
//! altitude curve that turns pattern strength into local wind speed.


use bitcode::{Decode, Encode};

use crate::catalog::WeatherCatalog;
use crate::climate::ClimateSample;
use crate::params::WindParams;
use crate::rng::WeatherRng;
use crate::selection::pick_weighted;

/// Depth (in blocks) below sea level over which wind strength halves.
const SUBSURFACE_DAMPING_DEPTH: f32 = 4.0;

/// Wind speed at world height `y` for a pattern of the given `strength`.
///
/// Below sea level the strength is damped by depth; above it is amplified
/// linearly with height and capped at `params.max_speed`.
pub fn wind_speed_at_altitude(strength: f32, y: f32, sea_level: f32, params: &WindParams) -> f32 {
    if y < sea_level {
        strength / (1.0 + (sea_level - y) / SUBSURFACE_DAMPING_DEPTH)
    } else {
        let gain = 1.0 + (y - sea_level) / params.altitude_scale.max(1.0);
        (strength * gain).min(params.max_speed)
    }
}

/// Shortest signed angular difference from `from` to `to`, in `[-PI, PI]`.
pub(crate) fn angle_diff(from: f32, to: f32) -> f32 {
    let diff = (to - from).rem_euclid(std::f32::consts::TAU);
    if diff > std::f32::consts::PI {
        diff - std::f32::consts::TAU
    } else {
        diff
    }
}

/// Per-use state of one catalog wind pattern.
#[derive(Debug, Clone, Copy, PartialEq, Encode, Decode)]
pub struct WindState {
    /// Index into [`WeatherCatalog::wind_patterns`].
    pub index: u32,
    pub active_until_hours: f64,
    /// Strength at sea level, before the altitude curve.
    pub strength: f32,
    /// Direction the wind blows toward, radians in `[0, 2*PI)`. 0 = East.
    pub direction: f32,
}

#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub struct WindPatternController {
    pub state: WindState,
}

impl WindPatternController {
    /// Draw a fresh wind pattern for the given climate.
    pub fn select(
        catalog: &WeatherCatalog,
        climate: &ClimateSample,
        now_hours: f64,
        rng: &mut WeatherRng,
    ) -> Self {
        let index = pick_weighted(&catalog.wind_patterns, rng, |w| w.chance.at(climate)) as u32;
        let direction =
            (rng.next_float() * std::f32::consts::TAU).rem_euclid(std::f32::consts::TAU);
        Self {
            state: Self::begin_use(catalog, index, direction, now_hours, rng),
        }
    }

    fn begin_use(
        catalog: &WeatherCatalog,
        index: u32,
        direction: f32,
        now_hours: f64,
        rng: &mut WeatherRng,
    ) -> WindState {
        let def = catalog.wind_pattern(index);
        let strength = def.strength.roll(rng).max(0.0);
        let duration = def.duration_hours.roll(rng).max(0.0) as f64;
        WindState {
            index,
            active_until_hours: now_hours + duration,
            strength,
            direction,
        }
    }

    /// Replace the active pattern with a new weighted draw. The direction
    /// veers by up to a quarter turn instead of jumping.
    pub fn reselect(
        &mut self,
        catalog: &WeatherCatalog,
        climate: &ClimateSample,
        now_hours: f64,
        rng: &mut WeatherRng,
    ) {
        let index = pick_weighted(&catalog.wind_patterns, rng, |w| w.chance.at(climate)) as u32;
        let veer = rng.next_range(-1.0, 1.0) * std::f32::consts::FRAC_PI_4;
        let direction = (self.state.direction + veer).rem_euclid(std::f32::consts::TAU);
        self.state = Self::begin_use(catalog, index, direction, now_hours, rng);
    }

    /// Force a specific pattern (admin override), keeping the direction.
    pub fn force(
        &mut self,
        catalog: &WeatherCatalog,
        index: u32,
        now_hours: f64,
        rng: &mut WeatherRng,
    ) {
        self.state = Self::begin_use(catalog, index, self.state.direction, now_hours, rng);
    }

    pub fn is_expired(&self, now_hours: f64) -> bool {
        now_hours > self.state.active_until_hours
    }

    pub fn speed_at(&self, y: f32, sea_level: f32, params: &WindParams) -> f32 {
        wind_speed_at_altitude(self.state.strength, y, sea_level, params)
    }

    /// Unit `(dx, dz)` vector of the blowing direction.
    pub fn direction_vector(&self) -> (f32, f32) {
        (self.state.direction.cos(), self.state.direction.sin())
    }

    pub fn code<'a>(&self, catalog: &'a WeatherCatalog) -> &'a str {
        &catalog.wind_pattern(self.state.index).code
    }
}
