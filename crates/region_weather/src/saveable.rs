//! Weather persistence hooks. Every saveable resource owns one opaque blob in
//! the save file's extension map under a stable key; the save crate never
//! looks inside.

use std::collections::BTreeMap;

use bevy::prelude::*;

pub trait Saveable: Resource + Default {
    /// Extension-map key. Never rename once shipped.
    const SAVE_KEY: &'static str;

    /// `None` leaves the key out of the file, e.g. while still at defaults.
    fn save_to_bytes(&self) -> Option<Vec<u8>>;

    fn load_from_bytes(bytes: &[u8]) -> Self;
}

/// bitcode-decode a saved blob, falling back to `T::default()` with a warning.
pub fn decode_or_warn<T: bitcode::DecodeOwned + Default>(key: &str, bytes: &[u8]) -> T {
    bitcode::decode(bytes).unwrap_or_else(|e| {
        warn!(
            "Weather save entry {} ({} bytes) is unreadable, using defaults: {}",
            key,
            bytes.len(),
            e
        );
        T::default()
    })
}

struct SaveHooks {
    save: fn(&World) -> Option<Vec<u8>>,
    load: fn(&mut World, &[u8]),
    reset: fn(&mut World),
}

fn save_resource<T: Saveable>(world: &World) -> Option<Vec<u8>> {
    world.get_resource::<T>()?.save_to_bytes()
}

fn load_resource<T: Saveable>(world: &mut World, bytes: &[u8]) {
    world.insert_resource(T::load_from_bytes(bytes));
}

fn reset_resource<T: Saveable>(world: &mut World) {
    world.insert_resource(T::default());
}

/// Saveable weather resources by key, filled in by [`SaveableAppExt`].
#[derive(Resource, Default)]
pub struct SaveableRegistry {
    hooks: BTreeMap<&'static str, SaveHooks>,
}

impl SaveableRegistry {
    /// Add `T` under its `SAVE_KEY`. A second registration of a key is ignored.
    pub fn register<T: Saveable>(&mut self) {
        if self.hooks.contains_key(T::SAVE_KEY) {
            warn!("Weather save key {} registered twice, keeping the first", T::SAVE_KEY);
            return;
        }
        self.hooks.insert(
            T::SAVE_KEY,
            SaveHooks {
                save: save_resource::<T>,
                load: load_resource::<T>,
                reset: reset_resource::<T>,
            },
        );
    }

    pub fn save_all(&self, world: &World) -> BTreeMap<String, Vec<u8>> {
        self.hooks
            .iter()
            .filter_map(|(key, hooks)| (hooks.save)(world).map(|bytes| (key.to_string(), bytes)))
            .collect()
    }

    /// Restore every resource whose key is present. Absent keys are left as they are.
    pub fn load_all(&self, world: &mut World, extensions: &BTreeMap<String, Vec<u8>>) {
        for (key, hooks) in &self.hooks {
            if let Some(bytes) = extensions.get(*key) {
                (hooks.load)(world, bytes);
            }
        }
    }

    pub fn reset_all(&self, world: &mut World) {
        for hooks in self.hooks.values() {
            (hooks.reset)(world);
        }
    }
}

pub trait SaveableAppExt {
    fn register_saveable<T: Saveable>(&mut self) -> &mut Self;
}

impl SaveableAppExt for App {
    fn register_saveable<T: Saveable>(&mut self) -> &mut Self {
        self.init_resource::<SaveableRegistry>();
        self.world_mut()
            .resource_mut::<SaveableRegistry>()
            .register::<T>();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::WeatherCalendar;
    use crate::params::WeatherParams;

    fn calendar_at(total_hours: f64) -> WeatherCalendar {
        WeatherCalendar {
            total_hours,
            ..Default::default()
        }
    }

    #[test]
    fn test_calendar_saved_under_its_key() {
        let mut world = World::new();
        world.insert_resource(calendar_at(42.5));
        let mut registry = SaveableRegistry::default();
        registry.register::<WeatherCalendar>();

        let extensions = registry.save_all(&world);
        assert_eq!(extensions.len(), 1);
        let restored = WeatherCalendar::load_from_bytes(&extensions["weather_calendar"]);
        assert_eq!(restored.total_hours, 42.5);
    }

    #[test]
    fn test_default_params_left_out() {
        let mut world = World::new();
        world.insert_resource(WeatherParams::default());
        let mut registry = SaveableRegistry::default();
        registry.register::<WeatherParams>();
        assert!(registry.save_all(&world).is_empty());
    }

    #[test]
    fn test_missing_resource_left_out() {
        let world = World::new();
        let mut registry = SaveableRegistry::default();
        registry.register::<WeatherCalendar>();
        assert!(registry.save_all(&world).is_empty());
    }

    #[test]
    fn test_load_then_reset_calendar() {
        let mut world = World::new();
        world.insert_resource(WeatherCalendar::default());
        let mut registry = SaveableRegistry::default();
        registry.register::<WeatherCalendar>();

        let saved = WeatherCalendar {
            speed_of_time: 120.0,
            ..calendar_at(99.0)
        };
        let mut extensions = BTreeMap::new();
        extensions.insert("weather_calendar".to_string(), bitcode::encode(&saved));
        extensions.insert("lunar_tides".to_string(), vec![0xFF, 0xFF]);

        registry.load_all(&mut world, &extensions);
        assert_eq!(*world.resource::<WeatherCalendar>(), saved);

        registry.reset_all(&mut world);
        assert_eq!(*world.resource::<WeatherCalendar>(), WeatherCalendar::default());
    }

    #[test]
    fn test_unreadable_blob_loads_defaults() {
        let mut world = World::new();
        world.insert_resource(calendar_at(7.0));
        let mut registry = SaveableRegistry::default();
        registry.register::<WeatherCalendar>();

        let mut extensions = BTreeMap::new();
        extensions.insert("weather_calendar".to_string(), vec![0xFF]);
        registry.load_all(&mut world, &extensions);
        assert_eq!(*world.resource::<WeatherCalendar>(), WeatherCalendar::default());
    }

    #[test]
    fn test_second_registration_keeps_one_entry() {
        let mut world = World::new();
        world.insert_resource(calendar_at(3.0));
        let mut registry = SaveableRegistry::default();
        registry.register::<WeatherCalendar>();
        registry.register::<WeatherCalendar>();
        assert_eq!(registry.save_all(&world).len(), 1);
    }
}
