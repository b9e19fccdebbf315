//! Two-pattern blending state machine.
//!
//! Every blended scalar the region exposes is
//! `old * (1 - weight) + new * weight`; nothing is blended any other way.


use bitcode::{Decode, Encode};

use crate::catalog::{WeatherCatalog, WeatherPatternDef};
use crate::params::TransitionParams;
use crate::rng::WeatherRng;

/// Shortest transition the blender accepts, so `dt / delay` stays finite.
const MIN_TRANSITION_DELAY_SECS: f32 = 0.001;

/// Fraction of a pattern's parameter range a single drift step may move.
const DRIFT_STEP: f32 = 0.05;

/// Per-use state of one catalog weather pattern.
#[derive(Debug, Clone, Copy, PartialEq, Encode, Decode)]
pub struct PatternState {
    /// Index into [`WeatherCatalog::patterns`].
    pub index: u32,
    /// Simulated hour after which this pattern should be replaced.
    pub active_until_hours: f64,
    pub cloud_density: f32,
    pub fog_density: f32,
    pub precipitation: f32,
    pub temperature_offset: f32,
}

impl PatternState {
    /// Enter a pattern: roll its parametric state and active duration.
    pub fn begin_use(
        def: &WeatherPatternDef,
        index: u32,
        now_hours: f64,
        rng: &mut WeatherRng,
    ) -> Self {
        let cloud_density = def.cloud_density.roll(rng);
        let fog_density = def.fog_density.roll(rng);
        let precipitation = def.precipitation.roll(rng);
        let temperature_offset = def.temperature_offset.roll(rng);
        let duration = def.duration_hours.roll(rng).max(0.0) as f64;
        Self {
            index,
            active_until_hours: now_hours + duration,
            cloud_density,
            fog_density,
            precipitation,
            temperature_offset,
        }
    }

    /// Small random walk of the cloud and fog factors, kept inside the def's ranges.
    pub fn drift(&mut self, def: &WeatherPatternDef, rng: &mut WeatherRng) {
        let cloud_span = def.cloud_density.max - def.cloud_density.min;
        let fog_span = def.fog_density.max - def.fog_density.min;
        self.cloud_density = def
            .cloud_density
            .clamp(self.cloud_density + rng.next_range(-1.0, 1.0) * cloud_span * DRIFT_STEP);
        self.fog_density = def
            .fog_density
            .clamp(self.fog_density + rng.next_range(-1.0, 1.0) * fog_span * DRIFT_STEP);
    }

    pub fn code<'a>(&self, catalog: &'a WeatherCatalog) -> &'a str {
        &catalog.pattern(self.index).code
    }
}

#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub struct WeatherPatternBlender {
    pub old: PatternState,
    pub new: PatternState,
    /// Blend factor in `[0, 1]`; 1.0 means fully on `new`.
    pub weight: f32,
    pub transitioning: bool,
    /// Length of the running transition in seconds.
    pub transition_delay: f32,
}

impl WeatherPatternBlender {
    /// Fully settled on `state`.
    pub fn steady(state: PatternState) -> Self {
        Self {
            old: state,
            new: state,
            weight: 1.0,
            transitioning: false,
            transition_delay: 0.0,
        }
    }

    /// Randomized transition length, divided by the same `speed_factor` that
    /// [`WeatherPatternBlender::tick`] multiplies by.
    pub fn random_delay(params: &TransitionParams, speed_factor: f32, rng: &mut WeatherRng) -> f32 {
        (params.delay_base_secs + rng.next_float() * params.delay_scale_secs)
            / speed_factor.max(0.01)
    }

    /// Start blending from the current pattern to `incoming` over `delay_secs`.
    pub fn begin_transition(&mut self, incoming: PatternState, delay_secs: f32) {
        self.old = self.new;
        self.new = incoming;
        self.weight = 0.0;
        self.transitioning = true;
        self.transition_delay = if delay_secs.is_finite() {
            delay_secs.max(MIN_TRANSITION_DELAY_SECS)
        } else {
            MIN_TRANSITION_DELAY_SECS
        };
    }

    /// Advance the blend by `dt` seconds scaled by `time_speed_factor`.
    pub fn tick(&mut self, dt: f32, time_speed_factor: f32) {
        if !self.transitioning {
            return;
        }
        let step = dt.max(0.0) / self.transition_delay.max(MIN_TRANSITION_DELAY_SECS)
            * time_speed_factor.max(0.0);
        if step.is_finite() {
            self.weight += step;
        }
        if self.weight >= 1.0 {
            self.weight = 1.0;
            self.transitioning = false;
        }
    }

    /// `old_value(old) * (1 - weight) + new_value(new) * weight`, exact at both ends.
    pub fn blended_with(
        &self,
        old_value: impl Fn(&PatternState) -> f32,
        new_value: impl Fn(&PatternState) -> f32,
    ) -> f32 {
        if self.weight <= 0.0 {
            return old_value(&self.old);
        }
        if self.weight >= 1.0 {
            return new_value(&self.new);
        }
        old_value(&self.old) * (1.0 - self.weight) + new_value(&self.new) * self.weight
    }

    /// Blend one field read the same way from both patterns.
    pub fn blended(&self, value: impl Fn(&PatternState) -> f32) -> f32 {
        self.blended_with(&value, &value)
    }

    /// Whether the incoming pattern has outlived its active time.
    pub fn needs_retrigger(&self, now_hours: f64) -> bool {
        now_hours > self.new.active_until_hours
    }
}
