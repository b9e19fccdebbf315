//! Weather event controller: the active discrete event (calm, showers,
//! thunderstorm, blizzard, ...), its lightning output and its stop conditions.

#[cfg(test)]
mod tests;

use bitcode::{Decode, Encode};

use crate::catalog::WeatherCatalog;
use crate::climate::ClimateSample;
use crate::rng::WeatherRng;
use crate::selection::pick_weighted;

/// Per-use state of one catalog weather event.
#[derive(Debug, Clone, Copy, PartialEq, Encode, Decode)]
pub struct EventState {
    /// Index into [`WeatherCatalog::events`].
    pub index: u32,
    pub started_hours: f64,
    pub active_until_hours: f64,
}

fn any_sustainable(catalog: &WeatherCatalog, rainfall: f32, temperature: f32) -> bool {
    catalog
        .events
        .iter()
        .any(|e| e.sustain.is_met(rainfall, temperature))
}

#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub struct WeatherEventController {
    pub state: EventState,
}

impl WeatherEventController {
    /// Weighted draw over events whose sustain condition holds in `climate`,
    /// so a freshly chosen event never stops on the very next check.
    fn draw(catalog: &WeatherCatalog, climate: &ClimateSample, rng: &mut WeatherRng) -> u32 {
        pick_weighted(&catalog.events, rng, |e| {
            if e.sustain.is_met(climate.rainfall, climate.temperature) {
                e.chance.at(climate)
            } else {
                0.0
            }
        }) as u32
    }

    fn begin_use(
        catalog: &WeatherCatalog,
        index: u32,
        now_hours: f64,
        rng: &mut WeatherRng,
    ) -> EventState {
        let duration = catalog.event(index).duration_hours.roll(rng).max(0.0) as f64;
        EventState {
            index,
            started_hours: now_hours,
            active_until_hours: now_hours + duration,
        }
    }

    pub fn select(
        catalog: &WeatherCatalog,
        climate: &ClimateSample,
        now_hours: f64,
        rng: &mut WeatherRng,
    ) -> Self {
        let index = Self::draw(catalog, climate, rng);
        Self {
            state: Self::begin_use(catalog, index, now_hours, rng),
        }
    }

    /// Replace the active event with a fresh draw. When no event can be
    /// sustained in `climate` the current one is kept and its duration
    /// restarted instead. Returns whether a new draw replaced it.
    pub fn reselect(
        &mut self,
        catalog: &WeatherCatalog,
        climate: &ClimateSample,
        now_hours: f64,
        rng: &mut WeatherRng,
    ) -> bool {
        if !any_sustainable(catalog, climate.rainfall, climate.temperature) {
            self.state = Self::begin_use(catalog, self.state.index, now_hours, rng);
            return false;
        }
        let index = Self::draw(catalog, climate, rng);
        self.state = Self::begin_use(catalog, index, now_hours, rng);
        true
    }

    /// Force a specific event (admin override).
    pub fn force(
        &mut self,
        catalog: &WeatherCatalog,
        index: u32,
        now_hours: f64,
        rng: &mut WeatherRng,
    ) {
        self.state = Self::begin_use(catalog, index, now_hours, rng);
    }

    /// The current climate no longer supports this event but does support
    /// some other one to switch to.
    pub fn should_stop(&self, catalog: &WeatherCatalog, rainfall: f32, temperature: f32) -> bool {
        !catalog
            .event(self.state.index)
            .sustain
            .is_met(rainfall, temperature)
            && any_sustainable(catalog, rainfall, temperature)
    }

    pub fn is_expired(&self, now_hours: f64) -> bool {
        now_hours > self.state.active_until_hours
    }

    /// Lightning strikes per second at the given temperature.
    pub fn lightning_rate(&self, catalog: &WeatherCatalog, temperature: f32) -> f32 {
        match catalog.event(self.state.index).lightning {
            Some(l) if temperature >= l.min_temperature => l.rate,
            _ => 0.0,
        }
    }

    pub fn precipitation_boost(&self, catalog: &WeatherCatalog) -> f32 {
        catalog.event(self.state.index).precipitation_boost
    }

    pub fn code<'a>(&self, catalog: &'a WeatherCatalog) -> &'a str {
        &catalog.event(self.state.index).code
    }
}
