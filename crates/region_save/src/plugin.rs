use std::path::{Path, PathBuf};

use bevy::prelude::*;
use region_weather::plugin::{LoadRegion, RegionWeatherMap, SnowCatchUpTasks};
use region_weather::SaveableRegistry;

use crate::atomic_write::atomic_write;
use crate::codec::{decode_save, encode_save};
use crate::save_error::SaveError;

/// Write all saveable weather resources to `path`.
#[derive(Event, Debug, Clone, PartialEq, Eq)]
pub struct SaveWeatherRequest(pub PathBuf);

/// Replace all saveable weather resources with the contents of `path`.
#[derive(Event, Debug, Clone, PartialEq, Eq)]
pub struct LoadWeatherRequest(pub PathBuf);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOperation {
    Save,
    Load,
}

/// Result of a save or load request. `error` is `None` on success.
#[derive(Event, Debug, Clone, PartialEq, Eq)]
pub struct WeatherSaveFinished {
    pub operation: SaveOperation,
    pub path: PathBuf,
    pub bytes: usize,
    pub error: Option<String>,
}

/// Serialize every registered saveable and write the file atomically.
/// Returns the number of bytes written.
pub fn save_weather_to_file(world: &World, path: &Path) -> Result<usize, SaveError> {
    let registry = world
        .get_resource::<SaveableRegistry>()
        .ok_or(SaveError::NoData)?;
    let bytes = encode_save(registry.save_all(world))?;
    atomic_write(path, &bytes)?;
    Ok(bytes.len())
}

/// Read `path` and restore every registered saveable from it.
///
/// Regions that were loaded before the call are requested again, so they
/// come back from the file's stored state instead of disappearing. In-flight
/// snow catch-ups are dropped since they target the replaced ledgers.
pub fn load_weather_from_file(world: &mut World, path: &Path) -> Result<usize, SaveError> {
    let bytes = std::fs::read(path)?;
    let extensions = decode_save(&bytes)?;

    let reloaded: Vec<_> = world
        .get_resource::<RegionWeatherMap>()
        .map(|map| map.iter().map(|(coord, _)| *coord).collect())
        .unwrap_or_default();

    world.insert_resource(SnowCatchUpTasks::default());
    world.resource_scope(|world, registry: Mut<SaveableRegistry>| {
        registry.reset_all(world);
        registry.load_all(world, &extensions);
    });
    for coord in reloaded {
        world.send_event(LoadRegion(coord));
    }
    Ok(bytes.len())
}

fn report(
    world: &mut World,
    operation: SaveOperation,
    path: PathBuf,
    result: Result<usize, SaveError>,
) {
    let finished = match result {
        Ok(bytes) => {
            info!("Weather {:?} of {} bytes: {}", operation, bytes, path.display());
            WeatherSaveFinished {
                operation,
                path,
                bytes,
                error: None,
            }
        }
        Err(e) => {
            warn!("Weather {:?} failed for {}: {}", operation, path.display(), e);
            WeatherSaveFinished {
                operation,
                path,
                bytes: 0,
                error: Some(e.to_string()),
            }
        }
    };
    world.send_event(finished);
}

/// Exclusive system: drain save then load requests with full world access.
pub(crate) fn process_weather_save_requests(world: &mut World) {
    let saves: Vec<PathBuf> = world
        .resource_mut::<Events<SaveWeatherRequest>>()
        .drain()
        .map(|e| e.0)
        .collect();
    for path in saves {
        let result = save_weather_to_file(world, &path);
        report(world, SaveOperation::Save, path, result);
    }

    let loads: Vec<PathBuf> = world
        .resource_mut::<Events<LoadWeatherRequest>>()
        .drain()
        .map(|e| e.0)
        .collect();
    for path in loads {
        let result = load_weather_from_file(world, &path);
        report(world, SaveOperation::Load, path, result);
    }
}

pub struct WeatherSavePlugin;

impl Plugin for WeatherSavePlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<SaveWeatherRequest>()
            .add_event::<LoadWeatherRequest>()
            .add_event::<WeatherSaveFinished>()
            .init_resource::<SaveableRegistry>()
            .add_systems(Update, process_weather_save_requests);
    }
}
