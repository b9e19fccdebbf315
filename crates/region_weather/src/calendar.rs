use bevy::prelude::*;
use bitcode::{Decode, Encode};
use serde::{Deserialize, Serialize};

use crate::config::{DEFAULT_DAYS_PER_YEAR, DEFAULT_HOURS_PER_DAY, REFERENCE_SPEED_OF_TIME};

/// Simulated calendar the weather runs against. All weather durations are
/// expressed in `total_hours`, never in wall-clock time.
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize, Encode, Decode)]
pub struct WeatherCalendar {
    /// Monotonic simulated time in hours since world creation.
    pub total_hours: f64,
    pub hours_per_day: f32,
    pub days_per_year: u32,
    /// Simulated seconds that pass per real second.
    pub speed_of_time: f32,
    pub paused: bool,
}

impl Default for WeatherCalendar {
    fn default() -> Self {
        Self {
            total_hours: 0.0,
            hours_per_day: DEFAULT_HOURS_PER_DAY,
            days_per_year: DEFAULT_DAYS_PER_YEAR,
            speed_of_time: REFERENCE_SPEED_OF_TIME,
            paused: false,
        }
    }
}

impl WeatherCalendar {
    /// Advance by `real_secs` of wall-clock time scaled by `speed_of_time`.
    pub fn advance(&mut self, real_secs: f32) {
        if self.paused || real_secs <= 0.0 {
            return;
        }
        self.total_hours += real_secs as f64 * self.speed_of_time as f64 / 3600.0;
    }

    pub fn hours_per_year(&self) -> f64 {
        self.hours_per_day as f64 * self.days_per_year as f64
    }

    /// Ring capacity for one year of hourly snow snapshots plus one.
    pub fn snow_history_capacity(&self) -> usize {
        self.hours_per_year().round().max(0.0) as usize + 1
    }

    pub fn hour_of_day(&self) -> f32 {
        self.total_hours.rem_euclid(self.hours_per_day.max(1.0) as f64) as f32
    }

    /// Zero-based day within the current year.
    pub fn day_of_year(&self) -> u32 {
        let day = (self.total_hours / self.hours_per_day.max(1.0) as f64).floor();
        (day as u64 % self.days_per_year.max(1) as u64) as u32
    }

    /// Position within the year in `[0, 1)`.
    pub fn year_fraction(&self) -> f32 {
        let year = self.hours_per_year().max(1.0);
        (self.total_hours.rem_euclid(year) / year) as f32
    }

    pub fn formatted(&self) -> String {
        let hour = self.hour_of_day();
        let h = hour as u32;
        let m = ((hour - h as f32) * 60.0) as u32;
        format!("Day {} {:02}:{:02}", self.day_of_year() + 1, h, m)
    }
}

impl crate::Saveable for WeatherCalendar {
    const SAVE_KEY: &'static str = "weather_calendar";

    fn save_to_bytes(&self) -> Option<Vec<u8>> {
        Some(bitcode::encode(self))
    }

    fn load_from_bytes(bytes: &[u8]) -> Self {
        crate::decode_or_warn(Self::SAVE_KEY, bytes)
    }
}

/// Advances the calendar by one fixed weather step.
pub fn advance_weather_calendar(time: Res<Time<Fixed>>, mut calendar: ResMut<WeatherCalendar>) {
    calendar.advance(time.timestep().as_secs_f32());
}
