//! Bevy integration: resources, events and the fixed-step systems that drive
//! every loaded region.

mod map;
mod snow_tasks;
mod systems;

use bevy::ecs::system::SystemParam;
use bevy::prelude::*;

pub use map::RegionWeatherMap;
pub use snow_tasks::{collect_snow_catch_up, dispatch_snow_catch_up, SnowCatchUpTasks};
pub use systems::{
    apply_received_state, handle_region_lifecycle, handle_weather_commands, push_subscribed_state,
    tick_regions,
};

use crate::calendar::{advance_weather_calendar, WeatherCalendar};
use crate::catalog::SharedCatalog;
use crate::climate::ClimateSource;
use crate::config::WEATHER_TICK_INTERVAL;
use crate::params::WeatherParams;
use crate::region::{RegionCoord, RegionStatePacket, SimulationRole, WeatherContext};
use crate::SaveableAppExt;

/// Bring a region's weather into memory (authority only).
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadRegion(pub RegionCoord);

/// Serialize and drop a region's weather.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnloadRegion(pub RegionCoord);

/// A replica started watching a region and needs its full state.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplicaSubscribed(pub RegionCoord);

/// Admin override of a region's weather.
#[derive(Event, Debug, Clone, PartialEq)]
pub struct ForceWeather {
    pub region: RegionCoord,
    pub command: WeatherCommand,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WeatherCommand {
    /// Transition to a freshly drawn pattern.
    Transition { delay_secs: Option<f32> },
    /// Transition to the pattern with this code.
    Pattern { code: String, delay_secs: Option<f32> },
    Wind(String),
    Event(String),
    /// Rewind the region's random stream and redraw everything.
    Regenerate,
}

/// Outgoing authority state, for the transport to deliver.
#[derive(Event, Debug, Clone, PartialEq)]
pub struct RegionStatePushed(pub RegionStatePacket);

/// Incoming authority state, delivered by the transport on a replica.
#[derive(Event, Debug, Clone, PartialEq)]
pub struct RegionStateReceived(pub RegionStatePacket);

/// Read-only inputs every region tick needs.
#[derive(SystemParam)]
pub struct WeatherInputs<'w> {
    pub calendar: Res<'w, WeatherCalendar>,
    pub climate: Res<'w, ClimateSource>,
    pub catalog: Res<'w, SharedCatalog>,
    pub params: Res<'w, WeatherParams>,
}

impl WeatherInputs<'_> {
    pub fn context(&self) -> WeatherContext<'_> {
        WeatherContext {
            calendar: &self.calendar,
            climate: self.climate.0.as_ref(),
            catalog: &self.catalog.0,
            params: &self.params,
        }
    }
}

pub struct RegionWeatherPlugin;

impl Plugin for RegionWeatherPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(Time::<Fixed>::from_duration(WEATHER_TICK_INTERVAL))
            .init_resource::<WeatherCalendar>()
            .init_resource::<WeatherParams>()
            .init_resource::<ClimateSource>()
            .init_resource::<SharedCatalog>()
            .init_resource::<SimulationRole>()
            .init_resource::<RegionWeatherMap>()
            .init_resource::<SnowCatchUpTasks>()
            .add_event::<LoadRegion>()
            .add_event::<UnloadRegion>()
            .add_event::<ReplicaSubscribed>()
            .add_event::<ForceWeather>()
            .add_event::<RegionStatePushed>()
            .add_event::<RegionStateReceived>()
            .register_saveable::<WeatherCalendar>()
            .register_saveable::<WeatherParams>()
            .register_saveable::<RegionWeatherMap>()
            .add_systems(
                FixedUpdate,
                (
                    advance_weather_calendar,
                    handle_region_lifecycle,
                    apply_received_state.run_if(resource_equals(SimulationRole::Replica)),
                    handle_weather_commands.run_if(resource_equals(SimulationRole::Authority)),
                    push_subscribed_state.run_if(resource_equals(SimulationRole::Authority)),
                    dispatch_snow_catch_up.run_if(resource_equals(SimulationRole::Authority)),
                    collect_snow_catch_up,
                    tick_regions,
                )
                    .chain(),
            );
    }
}
