//! Weather save files: the saveable registry's extension map behind a
//! checksummed, optionally compressed header, written atomically.

mod atomic_write;
pub mod codec;
pub mod file_header;
mod plugin;
mod save_error;

pub use atomic_write::atomic_write;
pub use codec::{decode_save, encode_save, WeatherSaveData};
pub use plugin::{
    load_weather_from_file, save_weather_to_file, LoadWeatherRequest, SaveOperation,
    SaveWeatherRequest, WeatherSaveFinished, WeatherSavePlugin,
};
pub use save_error::SaveError;
