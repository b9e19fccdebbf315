//! Climate query boundary.
//!
//! The weather core never models climate itself; it asks a [`ClimateProvider`]
//! for conditions at a world position and simulated hour. Queries must be
//! deterministic for a fixed world and answerable for past hours, since the
//! snow tracker back-fills history with them.

mod zones;
#[cfg(test)]
mod tests;

use std::sync::Arc;

use bevy::prelude::*;
use bitcode::{Decode, Encode};
use serde::{Deserialize, Serialize};

pub use zones::{diurnal_factor, ClimateZone, SeasonalClimate, ZoneClimateParams};

/// Conditions returned by a climate query.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, Encode, Decode)]
pub struct ClimateSample {
    /// Air temperature in Celsius.
    pub temperature: f32,
    /// Rainfall in `[0, 1]`.
    pub rainfall: f32,
    /// Rainfall after orographic (elevation) adjustment, in `[0, 1]`.
    pub elevation_adjusted_rainfall: f32,
}

/// Source of climate conditions. `None` means the sample is unavailable and
/// callers treat it as "no change".
pub trait ClimateProvider: Send + Sync {
    fn climate_at(&self, position: Vec3, total_hours: f64) -> Option<ClimateSample>;
}

impl<F> ClimateProvider for F
where
    F: Fn(Vec3, f64) -> Option<ClimateSample> + Send + Sync,
{
    fn climate_at(&self, position: Vec3, total_hours: f64) -> Option<ClimateSample> {
        self(position, total_hours)
    }
}

/// Shared handle to the active climate provider.
#[derive(Resource, Clone)]
pub struct ClimateSource(pub Arc<dyn ClimateProvider>);

impl ClimateSource {
    pub fn new(provider: impl ClimateProvider + 'static) -> Self {
        Self(Arc::new(provider))
    }
}

impl Default for ClimateSource {
    fn default() -> Self {
        Self::new(SeasonalClimate::default())
    }
}
