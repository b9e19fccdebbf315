//! Per-region weather orchestrator.
//!
//! A [`RegionWeatherSimulation`] owns one pattern blender, one wind controller,
//! one event controller and one snow tracker, all driven from the region's own
//! [`WeatherRng`]. The authority ticks it and pushes state packets; replicas
//! only apply packets and smooth a few display values.

mod persistence;
mod replication;
mod tick;
mod types;
#[cfg(test)]
mod tests;

use bevy::prelude::*;

pub use persistence::REGION_STATE_VERSION;
pub use replication::RegionStatePacket;
pub use types::{
    BlendedWeather, PrecipitationType, PushReason, RegionCoord, RegionPhase, SimulationRole,
    TickReport, WeatherContext,
};

use crate::blender::{PatternState, WeatherPatternBlender};
use crate::climate::ClimateSample;
use crate::events::WeatherEventController;
use crate::rng::WeatherRng;
use crate::selection::pick_weighted;
use crate::snow::{corner_sample_points, SnowAccumulationTracker};
use crate::wind::WindPatternController;

/// Replica-side display values that approach the authoritative ones gradually.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub(crate) struct ReplicaSmoothing {
    pub wind_speed: f32,
    pub wind_direction: f32,
    pub lightning_rate: f32,
    pub primed: bool,
}

pub struct RegionWeatherSimulation {
    coord: RegionCoord,
    rng: WeatherRng,
    blender: WeatherPatternBlender,
    wind: WindPatternController,
    event: WeatherEventController,
    /// Simulated hour of the last authoritative update.
    last_update_hours: f64,
    snow: SnowAccumulationTracker,
    /// Last known climate at the region's representative point.
    climate: ClimateSample,
    /// Tick seconds since the last climate sample.
    climate_timer: f32,
    /// `total_hours` of the newest state packet applied on a replica.
    last_applied_hours: f64,
    smoothing: ReplicaSmoothing,
    current: BlendedWeather,
}

impl RegionWeatherSimulation {
    /// Fresh region: every component draws independently from the region's stream.
    pub fn load_random_pattern(coord: RegionCoord, world_seed: u64, ctx: &WeatherContext) -> Self {
        let mut rng = WeatherRng::for_region(world_seed, coord.x, coord.z);
        Self::draw_components(coord, &mut rng, ctx, None)
    }

    fn draw_components(
        coord: RegionCoord,
        rng: &mut WeatherRng,
        ctx: &WeatherContext,
        snow: Option<SnowAccumulationTracker>,
    ) -> Self {
        let now = ctx.now();
        let climate = Self::sample_climate(coord, ctx).unwrap_or_default();

        let index = pick_weighted(&ctx.catalog.patterns, rng, |p| p.chance.at(&climate)) as u32;
        let pattern = PatternState::begin_use(ctx.catalog.pattern(index), index, now, rng);
        let wind = WindPatternController::select(ctx.catalog, &climate, now, rng);
        let event = WeatherEventController::select(ctx.catalog, &climate, now, rng);

        let snow = snow.unwrap_or_else(|| {
            SnowAccumulationTracker::new(
                Self::snow_points(coord, ctx),
                ctx.calendar.snow_history_capacity(),
                now,
            )
        });

        let mut region = Self {
            coord,
            rng: *rng,
            blender: WeatherPatternBlender::steady(pattern),
            wind,
            event,
            last_update_hours: now,
            snow,
            climate,
            climate_timer: 0.0,
            last_applied_hours: now,
            smoothing: ReplicaSmoothing::default(),
            current: BlendedWeather::default(),
        };
        region.refresh_blended(ctx);
        region
    }

    /// Redraw every component from the start of the region's stream, as when
    /// the region is regenerated. Snow history is kept.
    pub fn regenerate(&mut self, ctx: &WeatherContext) {
        let mut rng = self.rng;
        rng.reinitialize();
        let snow = self.snow.clone();
        *self = Self::draw_components(self.coord, &mut rng, ctx, Some(snow));
        info!("Region {} weather regenerated", self.coord);
    }

    pub(crate) fn snow_points(
        coord: RegionCoord,
        ctx: &WeatherContext,
    ) -> [Vec3; crate::config::SNOW_SAMPLE_COUNT] {
        corner_sample_points(coord.x, coord.z, &ctx.params.world, &ctx.params.snow)
    }

    pub(crate) fn sample_climate(
        coord: RegionCoord,
        ctx: &WeatherContext,
    ) -> Option<ClimateSample> {
        let world = &ctx.params.world;
        let point = coord.center(world.region_size, world.sea_level);
        ctx.climate.climate_at(point, ctx.now())
    }

    pub fn coord(&self) -> RegionCoord {
        self.coord
    }

    pub fn rng(&self) -> &WeatherRng {
        &self.rng
    }

    pub fn blender(&self) -> &WeatherPatternBlender {
        &self.blender
    }

    pub fn wind(&self) -> &WindPatternController {
        &self.wind
    }

    pub fn event(&self) -> &WeatherEventController {
        &self.event
    }

    pub fn snow(&self) -> &SnowAccumulationTracker {
        &self.snow
    }

    pub fn climate(&self) -> &ClimateSample {
        &self.climate
    }

    pub fn last_update_hours(&self) -> f64 {
        self.last_update_hours
    }

    pub fn last_applied_hours(&self) -> f64 {
        self.last_applied_hours
    }

    /// Blended read-only weather as of the last tick.
    pub fn current(&self) -> &BlendedWeather {
        &self.current
    }

    pub fn phase(&self) -> RegionPhase {
        if self.blender.transitioning {
            RegionPhase::Transitioning
        } else {
            RegionPhase::Steady
        }
    }

    /// Start a transition to a freshly drawn pattern. Without an explicit
    /// delay the length is randomized and scaled by the speed of time.
    pub fn trigger_transition(&mut self, delay_secs: Option<f32>, ctx: &WeatherContext) {
        let climate = self.climate;
        let index =
            pick_weighted(&ctx.catalog.patterns, &mut self.rng, |p| p.chance.at(&climate)) as u32;
        self.transition_to(index, delay_secs, ctx);
    }

    fn transition_to(&mut self, index: u32, delay_secs: Option<f32>, ctx: &WeatherContext) {
        let now = ctx.now();
        let incoming =
            PatternState::begin_use(ctx.catalog.pattern(index), index, now, &mut self.rng);
        let delay = delay_secs.unwrap_or_else(|| {
            WeatherPatternBlender::random_delay(
                &ctx.params.transition,
                ctx.time_speed_factor(),
                &mut self.rng,
            )
        });
        self.blender.begin_transition(incoming, delay);
        debug!(
            "Region {} transition {} -> {} over {:.1}s",
            self.coord,
            self.blender.old.code(ctx.catalog),
            self.blender.new.code(ctx.catalog),
            self.blender.transition_delay
        );
    }

    /// Admin override: transition to the pattern with `code`. Unknown codes
    /// are logged and ignored.
    pub fn force_pattern(
        &mut self,
        code: &str,
        delay_secs: Option<f32>,
        ctx: &WeatherContext,
    ) -> bool {
        match ctx.catalog.pattern_index(code) {
            Some(index) => {
                self.transition_to(index, delay_secs, ctx);
                true
            }
            None => {
                warn!("Region {}: unknown weather pattern '{}'", self.coord, code);
                false
            }
        }
    }

    pub fn force_wind(&mut self, code: &str, ctx: &WeatherContext) -> bool {
        match ctx.catalog.wind_pattern_index(code) {
            Some(index) => {
                self.wind.force(ctx.catalog, index, ctx.now(), &mut self.rng);
                true
            }
            None => {
                warn!("Region {}: unknown wind pattern '{}'", self.coord, code);
                false
            }
        }
    }

    pub fn force_event(&mut self, code: &str, ctx: &WeatherContext) -> bool {
        match ctx.catalog.event_index(code) {
            Some(index) => {
                self.event.force(ctx.catalog, index, ctx.now(), &mut self.rng);
                true
            }
            None => {
                warn!("Region {}: unknown weather event '{}'", self.coord, code);
                false
            }
        }
    }
}
