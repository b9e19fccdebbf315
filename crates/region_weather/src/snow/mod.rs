//! Snow accumulation history.
//!
//! Each simulated hour produces one [`SnowSnapshot`] of per-corner snow change,
//! computed from climate samples and kept for one simulated year in a
//! [`SnowRing`]. The ring lives behind a mutex so background catch-up tasks and
//! the tick thread can share it.

mod tracker;
mod types;

use bevy::prelude::*;

pub use tracker::{SnowAccumulationTracker, SnowBatch, SnowCatchUp, SnowLedger};
pub use types::{SnowRing, SnowSnapshot};

use crate::climate::ClimateSample;
use crate::config::{SNOW_GRID_X, SNOW_GRID_Y, SNOW_GRID_Z, SNOW_SAMPLE_COUNT};
use crate::params::{SnowParams, WorldParams};

/// Snow change over one hour for the given climate. Positive accumulates,
/// negative melts.
pub fn hourly_snow_delta(climate: &ClimateSample, params: &SnowParams) -> f32 {
    let t = climate.temperature;
    let melting =
        t > params.melt_temperature || (climate.rainfall < params.dry_rainfall && t > 0.0);
    if melting {
        -t / params.melt_divisor.max(f32::EPSILON)
    } else {
        climate.rainfall / params.accumulate_divisor.max(f32::EPSILON)
    }
}

/// World positions of the region's corner sample grid, x-major then y then z.
pub fn corner_sample_points(
    region_x: i32,
    region_z: i32,
    world: &WorldParams,
    snow: &SnowParams,
) -> [Vec3; SNOW_SAMPLE_COUNT] {
    let origin_x = region_x as f32 * world.region_size;
    let origin_z = region_z as f32 * world.region_size;
    let mut points = [Vec3::ZERO; SNOW_SAMPLE_COUNT];
    let mut i = 0;
    for ix in 0..SNOW_GRID_X {
        for iy in 0..SNOW_GRID_Y {
            for iz in 0..SNOW_GRID_Z {
                points[i] = Vec3::new(
                    origin_x + grid_fraction(ix, SNOW_GRID_X) * world.region_size,
                    snow.sample_altitudes[iy.min(snow.sample_altitudes.len() - 1)],
                    origin_z + grid_fraction(iz, SNOW_GRID_Z) * world.region_size,
                );
                i += 1;
            }
        }
    }
    points
}

fn grid_fraction(i: usize, n: usize) -> f32 {
    if n <= 1 {
        0.5
    } else {
        i as f32 / (n - 1) as f32
    }
}
