use bevy::prelude::*;
use bitcode::{Decode, Encode};

use super::{RegionCoord, RegionWeatherSimulation, ReplicaSmoothing, WeatherContext};
use crate::blender::WeatherPatternBlender;
use crate::catalog::clamp_index;
use crate::climate::ClimateSample;
use crate::events::WeatherEventController;
use crate::rng::WeatherRng;
use crate::snow::{SnowAccumulationTracker, SnowLedger};
use crate::wind::WindPatternController;

/// Bumped whenever [`RegionWeatherState`] changes shape.
pub const REGION_STATE_VERSION: u32 = 1;

/// Full persisted record of one region.
#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub(crate) struct RegionWeatherState {
    pub version: u32,
    pub coord: RegionCoord,
    pub rng: WeatherRng,
    pub blender: WeatherPatternBlender,
    pub wind: WindPatternController,
    pub event: WeatherEventController,
    pub last_update_hours: f64,
    pub climate: ClimateSample,
    pub snow: SnowLedger,
}

impl RegionWeatherState {
    pub fn decode(bytes: &[u8]) -> Result<Self, String> {
        let state: Self = bitcode::decode(bytes).map_err(|e| e.to_string())?;
        if state.version != REGION_STATE_VERSION {
            return Err(format!(
                "unsupported region state version {} (expected {})",
                state.version, REGION_STATE_VERSION
            ));
        }
        Ok(state)
    }

    /// Pull every catalog index and blend scalar back into range.
    fn sanitize(&mut self, ctx: &WeatherContext) {
        let catalog = ctx.catalog;
        let patterns = catalog.patterns.len();
        self.blender.old.index = clamp_index(self.blender.old.index, patterns, "patterns");
        self.blender.new.index = clamp_index(self.blender.new.index, patterns, "patterns");
        self.wind.state.index =
            clamp_index(self.wind.state.index, catalog.wind_patterns.len(), "wind_patterns");
        self.event.state.index =
            clamp_index(self.event.state.index, catalog.events.len(), "events");
        if !self.blender.weight.is_finite() {
            self.blender.weight = 1.0;
        }
        self.blender.weight = self.blender.weight.clamp(0.0, 1.0);
        if self.blender.weight >= 1.0 {
            self.blender.transitioning = false;
        }
    }
}

impl RegionWeatherSimulation {
    pub(crate) fn to_state(&self) -> RegionWeatherState {
        RegionWeatherState {
            version: REGION_STATE_VERSION,
            coord: self.coord,
            rng: self.rng,
            blender: self.blender.clone(),
            wind: self.wind.clone(),
            event: self.event.clone(),
            last_update_hours: self.last_update_hours,
            climate: self.climate,
            snow: self.snow.ledger(),
        }
    }

    /// Serialize the full region record.
    pub fn to_bytes(&self) -> Vec<u8> {
        bitcode::encode(&self.to_state())
    }

    /// Restore a region exactly from [`RegionWeatherSimulation::to_bytes`].
    /// Missing or corrupt bytes fall back to a fresh random draw.
    pub fn from_bytes(
        coord: RegionCoord,
        world_seed: u64,
        bytes: &[u8],
        ctx: &WeatherContext,
    ) -> Self {
        match RegionWeatherState::decode(bytes) {
            Ok(state) if state.coord == coord => Self::from_state(state, ctx),
            Ok(state) => {
                warn!(
                    "Region {}: saved state belongs to region {}, regenerating",
                    coord, state.coord
                );
                Self::load_random_pattern(coord, world_seed, ctx)
            }
            Err(e) => {
                warn!("Region {}: failed to restore weather ({}), regenerating", coord, e);
                Self::load_random_pattern(coord, world_seed, ctx)
            }
        }
    }

    pub(crate) fn from_state(mut state: RegionWeatherState, ctx: &WeatherContext) -> Self {
        state.sanitize(ctx);
        let snow = SnowAccumulationTracker::from_ledger(
            Self::snow_points(state.coord, ctx),
            state.snow,
            ctx.calendar.snow_history_capacity(),
        );
        let mut region = Self {
            coord: state.coord,
            rng: state.rng,
            blender: state.blender,
            wind: state.wind,
            event: state.event,
            last_update_hours: state.last_update_hours,
            snow,
            climate: state.climate,
            climate_timer: 0.0,
            last_applied_hours: state.last_update_hours,
            smoothing: ReplicaSmoothing::default(),
            current: Default::default(),
        };
        region.refresh_blended(ctx);
        region
    }

    /// Overwrite everything except identity and replica smoothing with `state`.
    pub(crate) fn overwrite_from(&mut self, mut state: RegionWeatherState, ctx: &WeatherContext) {
        state.sanitize(ctx);
        self.rng = state.rng;
        self.blender = state.blender;
        self.wind = state.wind;
        self.event = state.event;
        self.last_update_hours = state.last_update_hours;
        self.climate = state.climate;
        self.snow = SnowAccumulationTracker::from_ledger(
            *self.snow.sample_points(),
            state.snow,
            ctx.calendar.snow_history_capacity(),
        );
    }
}
