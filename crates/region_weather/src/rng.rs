//! Deterministic per-region random stream.
//!
//! A 64-bit linear congruential generator whose increment is derived from the
//! region's map-gen seed. The full state is three `u64`s, so a region can be
//! restored bit-exactly from a save or a replication packet and will then
//! produce the same draws on every machine.

use bitcode::{Decode, Encode};
use rand::RngCore;

/// Knuth's MMIX multiplier (`a mod 4 == 1`, full period with any odd increment).
const LCG_MULTIPLIER: u64 = 6_364_136_223_846_793_005;

/// 2^24, the resolution of `next_float`.
const FLOAT_SCALE: f32 = 16_777_216.0;

/// Avalanche mixer used to derive the map-gen seed from world seed and region coordinates.
pub(crate) fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9e3779b97f4a7c15);
    x = (x ^ (x >> 30)).wrapping_mul(0xbf58476d1ce4e5b9);
    x = (x ^ (x >> 27)).wrapping_mul(0x94d049bb133111eb);
    x ^ (x >> 31)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Encode, Decode)]
pub struct WeatherRng {
    world_seed: u64,
    map_gen_seed: u64,
    current_seed: u64,
}

impl WeatherRng {
    /// Stream for the region at `(region_x, region_z)` in a world created with `world_seed`.
    pub fn for_region(world_seed: u64, region_x: i32, region_z: i32) -> Self {
        let packed = ((region_x as u32 as u64) << 32) | region_z as u32 as u64;
        let map_gen_seed = splitmix64(world_seed ^ splitmix64(packed));
        Self {
            world_seed,
            map_gen_seed,
            current_seed: map_gen_seed,
        }
    }

    /// Restore an exact stream state, e.g. after loading a save.
    pub fn from_seeds(world_seed: u64, map_gen_seed: u64, current_seed: u64) -> Self {
        Self {
            world_seed,
            map_gen_seed,
            current_seed,
        }
    }

    pub fn world_seed(&self) -> u64 {
        self.world_seed
    }

    pub fn map_gen_seed(&self) -> u64 {
        self.map_gen_seed
    }

    pub fn current_seed(&self) -> u64 {
        self.current_seed
    }

    /// Rewind to the start of the stream (used when a region is regenerated).
    pub fn reinitialize(&mut self) {
        self.current_seed = self.map_gen_seed;
    }

    #[inline]
    fn advance(&mut self) {
        self.current_seed = self
            .current_seed
            .wrapping_mul(LCG_MULTIPLIER)
            .wrapping_add(self.map_gen_seed | 1);
    }

    /// Uniform float in `[0, 1)` taken from the top 24 bits of the state.
    pub fn next_float(&mut self) -> f32 {
        let value = (self.current_seed >> 40) as f32 / FLOAT_SCALE;
        self.advance();
        value
    }

    /// Uniform integer in `[0, bound)`. A zero bound yields 0 and still advances.
    pub fn next_int(&mut self, bound: u32) -> u32 {
        let value = if bound == 0 {
            0
        } else {
            ((self.current_seed >> 32) % bound as u64) as u32
        };
        self.advance();
        value
    }

    /// Uniform float in `[min, max)`.
    pub fn next_range(&mut self, min: f32, max: f32) -> f32 {
        min + self.next_float() * (max - min)
    }
}

impl RngCore for WeatherRng {
    fn next_u32(&mut self) -> u32 {
        let value = (self.current_seed >> 32) as u32;
        self.advance();
        value
    }

    fn next_u64(&mut self) -> u64 {
        let high = self.next_u32() as u64;
        let low = self.next_u32() as u64;
        (high << 32) | low
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(4) {
            let bytes = self.next_u32().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}
