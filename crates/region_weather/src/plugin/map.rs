use std::collections::BTreeMap;

use bevy::prelude::*;
use bitcode::{Decode, Encode};

use crate::region::{RegionCoord, RegionWeatherSimulation, WeatherContext};
use crate::Saveable;

/// Every region this process knows about: live simulations for loaded
/// regions, serialized records for unloaded ones.
#[derive(Resource, Default)]
pub struct RegionWeatherMap {
    /// Seed every region's random stream is derived from.
    pub world_seed: u64,
    loaded: BTreeMap<RegionCoord, RegionWeatherSimulation>,
    stored: BTreeMap<RegionCoord, Vec<u8>>,
}

impl RegionWeatherMap {
    pub fn new(world_seed: u64) -> Self {
        Self {
            world_seed,
            ..Default::default()
        }
    }

    pub fn get(&self, coord: RegionCoord) -> Option<&RegionWeatherSimulation> {
        self.loaded.get(&coord)
    }

    pub fn get_mut(&mut self, coord: RegionCoord) -> Option<&mut RegionWeatherSimulation> {
        self.loaded.get_mut(&coord)
    }

    pub fn is_loaded(&self, coord: RegionCoord) -> bool {
        self.loaded.contains_key(&coord)
    }

    pub fn is_stored(&self, coord: RegionCoord) -> bool {
        self.stored.contains_key(&coord)
    }

    pub fn loaded_count(&self) -> usize {
        self.loaded.len()
    }

    pub fn stored_count(&self) -> usize {
        self.stored.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&RegionCoord, &RegionWeatherSimulation)> {
        self.loaded.iter()
    }

    pub fn iter_mut(
        &mut self,
    ) -> impl Iterator<Item = (&RegionCoord, &mut RegionWeatherSimulation)> {
        self.loaded.iter_mut()
    }

    /// Bring a region into memory: restore its stored record if there is one,
    /// otherwise draw it fresh. Already loaded regions are left alone.
    pub fn load(
        &mut self,
        coord: RegionCoord,
        ctx: &WeatherContext,
    ) -> &mut RegionWeatherSimulation {
        let world_seed = self.world_seed;
        let stored = &mut self.stored;
        self.loaded.entry(coord).or_insert_with(|| match stored.remove(&coord) {
            Some(bytes) => {
                debug!("Region {} weather restored ({} bytes)", coord, bytes.len());
                RegionWeatherSimulation::from_bytes(coord, world_seed, &bytes, ctx)
            }
            None => {
                debug!("Region {} weather drawn fresh", coord);
                RegionWeatherSimulation::load_random_pattern(coord, world_seed, ctx)
            }
        })
    }

    /// Serialize a loaded region into storage and drop it from memory.
    pub fn unload(&mut self, coord: RegionCoord) -> bool {
        match self.loaded.remove(&coord) {
            Some(region) => {
                self.stored.insert(coord, region.to_bytes());
                true
            }
            None => false,
        }
    }

    /// Drop a loaded region without keeping its state (replicas).
    pub fn evict(&mut self, coord: RegionCoord) -> Option<RegionWeatherSimulation> {
        self.loaded.remove(&coord)
    }

    /// Insert a region built elsewhere, e.g. from a replication packet.
    pub fn insert(&mut self, region: RegionWeatherSimulation) {
        self.loaded.insert(region.coord(), region);
    }
}

#[derive(Default, Encode, Decode)]
struct RegionMapSave {
    world_seed: u64,
    regions: Vec<(RegionCoord, Vec<u8>)>,
}

impl Saveable for RegionWeatherMap {
    const SAVE_KEY: &'static str = "region_weather";

    fn save_to_bytes(&self) -> Option<Vec<u8>> {
        if self.loaded.is_empty() && self.stored.is_empty() && self.world_seed == 0 {
            return None;
        }
        let mut regions: BTreeMap<RegionCoord, Vec<u8>> = self.stored.clone();
        for (coord, region) in &self.loaded {
            regions.insert(*coord, region.to_bytes());
        }
        Some(bitcode::encode(&RegionMapSave {
            world_seed: self.world_seed,
            regions: regions.into_iter().collect(),
        }))
    }

    /// Every region comes back unloaded; the next `LoadRegion` restores it.
    fn load_from_bytes(bytes: &[u8]) -> Self {
        let save: RegionMapSave = crate::decode_or_warn(Self::SAVE_KEY, bytes);
        Self {
            world_seed: save.world_seed,
            loaded: BTreeMap::new(),
            stored: save.regions.into_iter().collect(),
        }
    }
}
