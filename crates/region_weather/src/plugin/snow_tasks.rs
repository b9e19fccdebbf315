use std::collections::BTreeMap;
use std::sync::Arc;

use bevy::prelude::*;
use bevy::tasks::{block_on, AsyncComputeTaskPool, Task};

use super::{RegionWeatherMap, WeatherInputs};
use crate::region::RegionCoord;

/// Snow catch-ups too long for a single tick, running on the async compute pool.
/// At most one task per region.
#[derive(Resource, Default)]
pub struct SnowCatchUpTasks {
    in_flight: BTreeMap<RegionCoord, Task<usize>>,
}

impl SnowCatchUpTasks {
    pub fn is_running(&self, coord: RegionCoord) -> bool {
        self.in_flight.contains_key(&coord)
    }

    pub fn len(&self) -> usize {
        self.in_flight.len()
    }

    pub fn is_empty(&self) -> bool {
        self.in_flight.is_empty()
    }

    /// Drop a region's task. Dropping a bevy `Task` cancels it.
    pub(crate) fn cancel(&mut self, coord: RegionCoord) {
        self.in_flight.remove(&coord);
    }
}

/// Hand snow backlogs larger than the inline limit to a background task.
/// The task commits into the region's shared ledger under its lock.
pub fn dispatch_snow_catch_up(
    map: Res<RegionWeatherMap>,
    mut tasks: ResMut<SnowCatchUpTasks>,
    inputs: WeatherInputs,
) {
    let now = inputs.calendar.total_hours;
    let snow_params = &inputs.params.snow;
    let pool = AsyncComputeTaskPool::get();

    for (coord, sim) in map.iter() {
        if tasks.is_running(*coord) {
            continue;
        }
        let tracker = sim.snow();
        if tracker.pending_hours(now) <= snow_params.inline_catchup_hours as u64 {
            continue;
        }
        let Some(plan) = tracker.plan(now, snow_params.max_catchup_hours) else {
            continue;
        };
        debug!(
            "Region {} snow catch-up of {} hours dispatched",
            coord,
            plan.hours()
        );
        let tracker = tracker.clone();
        let climate = Arc::clone(&inputs.climate.0);
        let params = snow_params.clone();
        let task = pool.spawn(async move {
            let batch = plan.compute(climate.as_ref(), &params);
            tracker.commit(batch)
        });
        tasks.in_flight.insert(*coord, task);
    }
}

/// Poll in-flight catch-ups and fold finished ones into accumulation.
pub fn collect_snow_catch_up(map: Res<RegionWeatherMap>, mut tasks: ResMut<SnowCatchUpTasks>) {
    let mut finished = Vec::new();
    for (coord, task) in tasks.in_flight.iter_mut() {
        if let Some(added) = block_on(futures_lite::future::poll_once(task)) {
            finished.push((*coord, added));
        }
    }
    for (coord, added) in finished {
        tasks.in_flight.remove(&coord);
        if let Some(sim) = map.get(coord) {
            sim.snow().fold_unchecked();
            debug!("Region {} snow catch-up committed {} hours", coord, added);
        }
    }
}
