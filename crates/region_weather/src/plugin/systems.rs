use bevy::prelude::*;

use super::{
    ForceWeather, LoadRegion, RegionStatePushed, RegionStateReceived, RegionWeatherMap,
    ReplicaSubscribed, SnowCatchUpTasks, UnloadRegion, WeatherCommand, WeatherInputs,
};
use crate::region::{PushReason, RegionWeatherSimulation, SimulationRole};

/// Load and unload regions. Replicas only create regions from received
/// packets, so they ignore load requests and drop unloaded regions outright.
pub fn handle_region_lifecycle(
    mut loads: EventReader<LoadRegion>,
    mut unloads: EventReader<UnloadRegion>,
    mut map: ResMut<RegionWeatherMap>,
    mut tasks: ResMut<SnowCatchUpTasks>,
    role: Res<SimulationRole>,
    inputs: WeatherInputs,
) {
    let ctx = inputs.context();
    for LoadRegion(coord) in loads.read() {
        if *role == SimulationRole::Authority {
            map.load(*coord, &ctx);
        }
    }
    for UnloadRegion(coord) in unloads.read() {
        tasks.cancel(*coord);
        match *role {
            SimulationRole::Authority => {
                if map.unload(*coord) {
                    debug!("Region {} weather unloaded", coord);
                }
            }
            SimulationRole::Replica => {
                map.evict(*coord);
            }
        }
    }
}

pub fn handle_weather_commands(
    mut commands: EventReader<ForceWeather>,
    mut map: ResMut<RegionWeatherMap>,
    mut pushed: EventWriter<RegionStatePushed>,
    inputs: WeatherInputs,
) {
    let ctx = inputs.context();
    for ForceWeather { region, command } in commands.read() {
        let Some(sim) = map.get_mut(*region) else {
            warn!("Weather command for unloaded region {} ignored", region);
            continue;
        };
        let applied = match command {
            WeatherCommand::Transition { delay_secs } => {
                sim.trigger_transition(*delay_secs, &ctx);
                true
            }
            WeatherCommand::Pattern { code, delay_secs } => {
                sim.force_pattern(code, *delay_secs, &ctx)
            }
            WeatherCommand::Wind(code) => sim.force_wind(code, &ctx),
            WeatherCommand::Event(code) => sim.force_event(code, &ctx),
            WeatherCommand::Regenerate => {
                sim.regenerate(&ctx);
                true
            }
        };
        if applied {
            info!("Region {} weather command applied: {:?}", region, command);
            pushed.send(RegionStatePushed(sim.state_packet(PushReason::Forced, ctx.now())));
        }
    }
}

pub fn push_subscribed_state(
    mut subscriptions: EventReader<ReplicaSubscribed>,
    map: Res<RegionWeatherMap>,
    mut pushed: EventWriter<RegionStatePushed>,
    inputs: WeatherInputs,
) {
    let now = inputs.calendar.total_hours;
    for ReplicaSubscribed(coord) in subscriptions.read() {
        match map.get(*coord) {
            Some(sim) => {
                pushed.send(RegionStatePushed(sim.state_packet(PushReason::Subscribed, now)));
            }
            None => debug!("Replica subscribed to unloaded region {}", coord),
        }
    }
}

/// Replica side: apply pushed state, creating the region on first contact.
pub fn apply_received_state(
    mut received: EventReader<RegionStateReceived>,
    mut map: ResMut<RegionWeatherMap>,
    inputs: WeatherInputs,
) {
    let ctx = inputs.context();
    for RegionStateReceived(packet) in received.read() {
        match map.get_mut(packet.region) {
            Some(sim) => {
                sim.apply_packet(packet, &ctx);
            }
            None => {
                if let Some(sim) = RegionWeatherSimulation::from_packet(packet, &ctx) {
                    map.insert(sim);
                }
            }
        }
    }
}

/// Advance every loaded region by one fixed step and push state where the
/// authority changed something replicas must see.
pub fn tick_regions(
    time: Res<Time<Fixed>>,
    role: Res<SimulationRole>,
    mut map: ResMut<RegionWeatherMap>,
    mut pushed: EventWriter<RegionStatePushed>,
    inputs: WeatherInputs,
) {
    let dt = time.timestep().as_secs_f32();
    let ctx = inputs.context();
    for (_, sim) in map.iter_mut() {
        match *role {
            SimulationRole::Authority => {
                let report = sim.tick(dt, &ctx);
                if let Some(reason) = report.push {
                    pushed.send(RegionStatePushed(sim.state_packet(reason, ctx.now())));
                }
            }
            SimulationRole::Replica => sim.tick_replica(dt, &ctx),
        }
    }
}
