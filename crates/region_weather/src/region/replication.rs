use bevy::prelude::*;
use bitcode::{Decode, Encode};

use super::persistence::RegionWeatherState;
use super::{PushReason, RegionCoord, RegionWeatherSimulation, WeatherContext};

/// Full region state pushed from the authority to replicas.
#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub struct RegionStatePacket {
    pub region: RegionCoord,
    /// Simulated time the state was captured at; replicas never go backward.
    pub total_hours: f64,
    pub reason: PushReason,
    /// Same bytes as [`RegionWeatherSimulation::to_bytes`].
    pub state: Vec<u8>,
}

impl RegionStatePacket {
    pub fn encode(&self) -> Vec<u8> {
        bitcode::encode(self)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, bitcode::Error> {
        bitcode::decode(bytes)
    }
}

impl RegionWeatherSimulation {
    pub fn state_packet(&self, reason: PushReason, total_hours: f64) -> RegionStatePacket {
        RegionStatePacket {
            region: self.coord,
            total_hours,
            reason,
            state: self.to_bytes(),
        }
    }

    /// Build a replica record from the first packet received for a region.
    pub fn from_packet(packet: &RegionStatePacket, ctx: &WeatherContext) -> Option<Self> {
        match RegionWeatherState::decode(&packet.state) {
            Ok(state) if state.coord == packet.region => {
                let mut region = Self::from_state(state, ctx);
                region.last_applied_hours = packet.total_hours;
                Some(region)
            }
            Ok(_) => {
                warn!("Region {}: packet carries another region's state", packet.region);
                None
            }
            Err(e) => {
                warn!("Region {}: undecodable state packet ({})", packet.region, e);
                None
            }
        }
    }

    /// Replace the whole region state with `packet`. Packets older than the
    /// last applied one are discarded. Returns whether the packet was applied.
    pub fn apply_packet(&mut self, packet: &RegionStatePacket, ctx: &WeatherContext) -> bool {
        if packet.region != self.coord {
            warn!(
                "Region {}: ignoring packet addressed to region {}",
                self.coord, packet.region
            );
            return false;
        }
        if packet.total_hours.is_nan() || packet.total_hours < self.last_applied_hours {
            debug!(
                "Region {}: discarding stale packet ({:.3}h < {:.3}h)",
                self.coord, packet.total_hours, self.last_applied_hours
            );
            return false;
        }
        let state = match RegionWeatherState::decode(&packet.state) {
            Ok(state) if state.coord == self.coord => state,
            Ok(_) => {
                warn!("Region {}: packet carries another region's state", self.coord);
                return false;
            }
            Err(e) => {
                warn!("Region {}: undecodable state packet ({})", self.coord, e);
                return false;
            }
        };
        self.overwrite_from(state, ctx);
        self.last_applied_hours = packet.total_hours;
        self.refresh_blended(ctx);
        true
    }
}
