//! Headless weather runner: builds a minimal Bevy app with the region weather
//! and save plugins, loads a block of regions and steps the fixed schedule.
//!
//! Environment:
//! - `WEATHER_TICKS`     fixed steps to run (default 2400, one real minute)
//! - `WEATHER_SEED`      world seed (default random)
//! - `WEATHER_ZONE`      climate zone name (default temperate)
//! - `WEATHER_RADIUS`    regions loaded around the focus (default 1 → 3x3)
//! - `WEATHER_FOCUS`     world position `x,z` the loaded block is centred on
//! - `WEATHER_CATALOG`   JSON weather catalog replacing the built-in one
//! - `WEATHER_PARAMS`    JSON tuning parameters replacing the defaults
//! - `WEATHER_SAVE_PATH` load from this file if present, save to it on exit
//!
//! Pass `--json` to print the final per-region snapshot as JSON lines.

use std::fmt::Display;
use std::path::PathBuf;
use std::sync::Arc;

use bevy::log::LogPlugin;
use bevy::prelude::*;

use region_save::{load_weather_from_file, save_weather_to_file, WeatherSavePlugin};
use region_weather::calendar::WeatherCalendar;
use region_weather::catalog::{SharedCatalog, WeatherCatalog};
use region_weather::climate::{ClimateSource, ClimateZone, SeasonalClimate};
use region_weather::params::WeatherParams;
use region_weather::plugin::{LoadRegion, RegionStatePushed, RegionWeatherMap};
use region_weather::region::{BlendedWeather, RegionCoord};
use region_weather::RegionWeatherPlugin;

struct RunnerConfig {
    ticks: u32,
    seed: u64,
    zone: ClimateZone,
    radius: i32,
    focus: (f32, f32),
    catalog: Option<WeatherCatalog>,
    params: Option<WeatherParams>,
    save_path: Option<PathBuf>,
    json: bool,
}

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    match std::env::var(name) {
        Ok(raw) => match raw.parse() {
            Ok(v) => v,
            Err(_) => {
                eprintln!("{name}={raw:?} is not valid, using the default");
                default
            }
        },
        Err(_) => default,
    }
}

fn parse_focus(raw: &str) -> Option<(f32, f32)> {
    let (x, z) = raw.split_once(',')?;
    Some((x.trim().parse().ok()?, z.trim().parse().ok()?))
}

/// Read and parse the JSON file named by `name`. Unreadable or invalid files
/// are reported and skipped so the built-in defaults apply.
fn json_file_or_default<T, E: Display>(
    name: &str,
    parse: impl FnOnce(&str) -> Result<T, E>,
) -> Option<T> {
    let path = std::env::var_os(name).map(PathBuf::from)?;
    let json = match std::fs::read_to_string(&path) {
        Ok(json) => json,
        Err(e) => {
            eprintln!("{name}: could not read {}: {e}, using the default", path.display());
            return None;
        }
    };
    match parse(&json) {
        Ok(value) => Some(value),
        Err(e) => {
            eprintln!("{name}: {} is not valid: {e}, using the default", path.display());
            None
        }
    }
}

impl RunnerConfig {
    fn from_env() -> Self {
        let zone = match std::env::var("WEATHER_ZONE") {
            Ok(name) => ClimateZone::from_name(&name).unwrap_or_else(|| {
                eprintln!("Unknown climate zone {name:?}, using temperate");
                ClimateZone::default()
            }),
            Err(_) => ClimateZone::default(),
        };
        Self {
            ticks: env_or("WEATHER_TICKS", 2400),
            seed: env_or("WEATHER_SEED", rand::random::<u64>()),
            zone,
            radius: env_or::<i32>("WEATHER_RADIUS", 1).max(0),
            focus: std::env::var("WEATHER_FOCUS")
                .ok()
                .and_then(|raw| {
                    parse_focus(&raw).or_else(|| {
                        eprintln!("WEATHER_FOCUS={raw:?} is not an x,z position, using 0,0");
                        None
                    })
                })
                .unwrap_or((0.0, 0.0)),
            catalog: json_file_or_default("WEATHER_CATALOG", WeatherCatalog::from_json),
            params: json_file_or_default("WEATHER_PARAMS", WeatherParams::from_json),
            save_path: std::env::var_os("WEATHER_SAVE_PATH").map(PathBuf::from),
            json: std::env::args().any(|a| a == "--json"),
        }
    }
}

fn snapshot_json(coord: RegionCoord, w: &BlendedWeather) -> serde_json::Value {
    serde_json::json!({
        "region": [coord.x, coord.z],
        "total_hours": w.total_hours,
        "pattern": w.pattern_code,
        "wind": w.wind_code,
        "event": w.event_code,
        "temperature": w.temperature,
        "wind_speed": w.wind_speed,
        "precipitation": w.precipitation,
        "precipitation_type": format!("{:?}", w.precipitation_type),
        "cloud_density": w.cloud_density,
        "fog_density": w.fog_density,
        "lightning_rate": w.lightning_rate,
        "blend_weight": w.blend_weight,
    })
}

fn main() {
    let config = RunnerConfig::from_env();
    let params = config.params.clone().unwrap_or_default();
    let center = RegionCoord::containing(config.focus.0, config.focus.1, params.world.region_size);

    let mut app = App::new();
    app.add_plugins((MinimalPlugins, LogPlugin::default()));
    if let Some(catalog) = config.catalog.clone() {
        app.insert_resource(SharedCatalog(Arc::new(catalog)));
    }
    app.insert_resource(params.clone());
    app.insert_resource(ClimateSource::new(SeasonalClimate::new(config.zone, config.seed)));
    app.insert_resource(RegionWeatherMap::new(config.seed));
    app.add_plugins((RegionWeatherPlugin, WeatherSavePlugin));
    app.update();

    if let Some(path) = config.save_path.as_deref().filter(|p| p.exists()) {
        if let Err(e) = load_weather_from_file(app.world_mut(), path) {
            error!("Could not load {}: {}", path.display(), e);
        }
        if config.params.is_some() {
            // An explicit params file wins over whatever the save carried
            app.insert_resource(params);
        }
    }

    info!(
        "Weather runner: seed {}, zone {}, {} ticks, {} regions around {}",
        config.seed,
        config.zone.name(),
        config.ticks,
        (2 * config.radius + 1).pow(2),
        center
    );
    for dx in -config.radius..=config.radius {
        for dz in -config.radius..=config.radius {
            let coord = RegionCoord::new(center.x + dx, center.z + dz);
            app.world_mut().send_event(LoadRegion(coord));
        }
    }

    let mut pushes = 0usize;
    for _ in 0..config.ticks {
        app.world_mut().run_schedule(FixedUpdate);
        pushes += app
            .world()
            .resource::<Events<RegionStatePushed>>()
            .iter_current_update_events()
            .count();
        app.world_mut()
            .resource_mut::<Events<RegionStatePushed>>()
            .update();
    }

    let calendar = app.world().resource::<WeatherCalendar>();
    info!(
        "Ran to {} ({:.3} h), {} state pushes",
        calendar.formatted(),
        calendar.total_hours,
        pushes
    );
    let map = app.world().resource::<RegionWeatherMap>();
    for (coord, sim) in map.iter() {
        let w = sim.current();
        if config.json {
            println!("{}", snapshot_json(*coord, w));
        } else {
            info!(
                "Region {}: {:?} {:.0}% {}, {:.1}C, wind {} {:.2}, {:?} {:.2}, event {}",
                coord,
                sim.phase(),
                w.blend_weight * 100.0,
                w.pattern_code,
                w.temperature,
                w.wind_code,
                w.wind_speed,
                w.precipitation_type,
                w.precipitation,
                w.event_code,
            );
        }
    }

    if let Some(path) = config.save_path.as_deref() {
        match save_weather_to_file(app.world(), path) {
            Ok(bytes) => info!("Saved {} bytes to {}", bytes, path.display()),
            Err(e) => error!("Could not save {}: {}", path.display(), e),
        }
    }
}
