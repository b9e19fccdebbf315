use std::time::Duration;

/// Fixed interval between weather ticks for every loaded region.
pub const WEATHER_TICK_INTERVAL: Duration = Duration::from_millis(25);

/// Side length of a weather region in world units (blocks).
pub const REGION_SIZE: f32 = 256.0;

/// World-space Y of the sea surface.
pub const SEA_LEVEL: f32 = 110.0;

/// Highest world-space Y the map can reach.
pub const MAP_HEIGHT: f32 = 256.0;

/// Snow sample grid: 2 corners along X, 2 altitudes, 2 corners along Z.
pub const SNOW_GRID_X: usize = 2;
pub const SNOW_GRID_Y: usize = 2;
pub const SNOW_GRID_Z: usize = 2;
pub const SNOW_SAMPLE_COUNT: usize = SNOW_GRID_X * SNOW_GRID_Y * SNOW_GRID_Z;

/// Largest span of simulated hours the snow tracker back-fills in one call (~20 days).
pub const DEFAULT_MAX_CATCHUP_HOURS: u32 = 480;

pub const DEFAULT_HOURS_PER_DAY: f32 = 24.0;

/// 360-day year: 4 seasons of 90 days.
pub const DEFAULT_DAYS_PER_YEAR: u32 = 360;

/// Simulated seconds per real second at which transition timings are authored.
pub const REFERENCE_SPEED_OF_TIME: f32 = 60.0;

/// Ceiling for altitude-amplified wind speed.
pub const MAX_WIND_SPEED: f32 = 1.5;
