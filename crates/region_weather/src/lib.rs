pub mod blender;
pub mod calendar;
pub mod catalog;
pub mod climate;
pub mod config;
pub mod events;
pub mod params;
pub mod plugin;
pub mod region;
pub mod rng;
mod saveable;
pub mod selection;
pub mod snow;
pub mod wind;

pub use plugin::RegionWeatherPlugin;
pub use saveable::{decode_or_warn, Saveable, SaveableAppExt, SaveableRegistry};
