use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bevy::prelude::*;
use bitcode::{Decode, Encode};

use super::hourly_snow_delta;
use super::types::{SnowRing, SnowSnapshot};
use crate::climate::ClimateProvider;
use crate::config::SNOW_SAMPLE_COUNT;
use crate::params::SnowParams;

/// Everything the tracker persists: the hourly history, the first hour not
/// yet computed, and the snow folded into persistent accumulation so far.
#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub struct SnowLedger {
    pub ring: SnowRing,
    /// First whole simulated hour without a snapshot.
    pub next_hour: i64,
    /// Persistent per-corner snow depth, never negative.
    pub accumulated: [f32; SNOW_SAMPLE_COUNT],
}

impl SnowLedger {
    pub fn new(capacity: usize, now_hours: f64) -> Self {
        Self {
            ring: SnowRing::new(capacity),
            next_hour: whole_hour(now_hours),
            accumulated: [0.0; SNOW_SAMPLE_COUNT],
        }
    }
}

fn whole_hour(hours: f64) -> i64 {
    if hours.is_finite() {
        hours.floor() as i64
    } else {
        0
    }
}

/// A planned catch-up over whole hours `[start_hour, end_hour)`. Holds no lock,
/// so it can be computed on a background thread.
#[derive(Debug, Clone, PartialEq)]
pub struct SnowCatchUp {
    pub start_hour: i64,
    pub end_hour: i64,
    pub sample_points: [Vec3; SNOW_SAMPLE_COUNT],
}

impl SnowCatchUp {
    pub fn hours(&self) -> usize {
        (self.end_hour - self.start_hour).max(0) as usize
    }

    /// Query the climate at the middle of every planned hour and corner.
    /// Unavailable samples count as no change for that corner.
    pub fn compute(&self, climate: &dyn ClimateProvider, params: &SnowParams) -> SnowBatch {
        let snapshots = (self.start_hour..self.end_hour)
            .map(|hour| {
                let at = hour as f64 + 0.5;
                let mut deltas = [0.0; SNOW_SAMPLE_COUNT];
                for (delta, point) in deltas.iter_mut().zip(self.sample_points.iter()) {
                    if let Some(sample) = climate.climate_at(*point, at) {
                        *delta = hourly_snow_delta(&sample, params);
                    }
                }
                SnowSnapshot {
                    total_hours: hour as f64,
                    deltas,
                    checks: 0,
                }
            })
            .collect();
        SnowBatch {
            end_hour: self.end_hour,
            snapshots,
        }
    }
}

/// Computed snapshots waiting to be committed to the ring.
#[derive(Debug, Clone, PartialEq)]
pub struct SnowBatch {
    pub end_hour: i64,
    pub snapshots: Vec<SnowSnapshot>,
}

/// Per-region snow history behind a single mutex.
///
/// Cloning yields another handle to the same ledger, which is how background
/// catch-up tasks commit their results.
#[derive(Debug, Clone)]
pub struct SnowAccumulationTracker {
    shared: Arc<Mutex<SnowLedger>>,
    sample_points: [Vec3; SNOW_SAMPLE_COUNT],
}

impl SnowAccumulationTracker {
    pub fn new(sample_points: [Vec3; SNOW_SAMPLE_COUNT], capacity: usize, now_hours: f64) -> Self {
        Self::from_ledger(sample_points, SnowLedger::new(capacity, now_hours), capacity)
    }

    /// Restore a persisted ledger, repairing the ring and resizing it to `capacity`.
    pub fn from_ledger(
        sample_points: [Vec3; SNOW_SAMPLE_COUNT],
        mut ledger: SnowLedger,
        capacity: usize,
    ) -> Self {
        let ring = ledger.ring.sanitized();
        ledger.ring = if ring.capacity() == capacity.max(1) {
            ring
        } else {
            ring.resized(capacity)
        };
        if let Some(newest) = ledger.ring.newest() {
            ledger.next_hour = ledger.next_hour.max(newest.total_hours as i64 + 1);
        }
        for depth in ledger.accumulated.iter_mut() {
            if !depth.is_finite() || *depth < 0.0 {
                *depth = 0.0;
            }
        }
        Self {
            shared: Arc::new(Mutex::new(ledger)),
            sample_points,
        }
    }

    fn lock(&self) -> MutexGuard<'_, SnowLedger> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn sample_points(&self) -> &[Vec3; SNOW_SAMPLE_COUNT] {
        &self.sample_points
    }

    pub fn next_hour(&self) -> i64 {
        self.lock().next_hour
    }

    /// Whole hours between the last computed hour and `target_hours`.
    pub fn pending_hours(&self, target_hours: f64) -> u64 {
        (whole_hour(target_hours) - self.next_hour()).max(0) as u64
    }

    /// Plan the hours needed to reach `target_hours`, keeping only the most
    /// recent `max_catchup_hours`. Older backlog is dropped.
    pub fn plan(&self, target_hours: f64, max_catchup_hours: u32) -> Option<SnowCatchUp> {
        let end_hour = whole_hour(target_hours);
        let next_hour = self.next_hour();
        if end_hour <= next_hour {
            return None;
        }
        let start_hour = next_hour.max(end_hour - max_catchup_hours as i64);
        Some(SnowCatchUp {
            start_hour,
            end_hour,
            sample_points: self.sample_points,
        })
    }

    /// Push a computed batch under the lock. Hours already covered by an
    /// earlier commit are skipped. Returns the number of snapshots added.
    pub fn commit(&self, batch: SnowBatch) -> usize {
        let mut ledger = self.lock();
        let mut added = 0;
        for snapshot in batch.snapshots {
            if snapshot.total_hours < ledger.next_hour as f64 {
                continue;
            }
            ledger.next_hour = snapshot.total_hours as i64 + 1;
            ledger.ring.push(snapshot);
            added += 1;
        }
        ledger.next_hour = ledger.next_hour.max(batch.end_hour);
        added
    }

    /// Compute and commit every missing hour up to `target_hours`, capped at
    /// `params.max_catchup_hours`. Climate queries run without the lock held.
    pub fn advance_to(
        &self,
        target_hours: f64,
        climate: &dyn ClimateProvider,
        params: &SnowParams,
    ) -> usize {
        match self.plan(target_hours, params.max_catchup_hours) {
            Some(plan) => self.commit(plan.compute(climate, params)),
            None => 0,
        }
    }

    /// Apply every snapshot not yet folded to the persistent accumulation and
    /// return the resulting per-corner depth.
    pub fn fold_unchecked(&self) -> [f32; SNOW_SAMPLE_COUNT] {
        let mut ledger = self.lock();
        let sum = ledger.ring.fold_unchecked();
        for (depth, delta) in ledger.accumulated.iter_mut().zip(sum.iter()) {
            *depth = (*depth + delta).max(0.0);
        }
        ledger.accumulated
    }

    pub fn accumulated(&self) -> [f32; SNOW_SAMPLE_COUNT] {
        self.lock().accumulated
    }

    /// Per-corner change during the hour containing `hour`, if still in history.
    pub fn snow_fallen_in_hour(&self, hour: f64) -> Option<[f32; SNOW_SAMPLE_COUNT]> {
        self.lock().ring.at_hour(hour).map(|s| s.deltas)
    }

    pub fn accumulated_between(&self, from_hours: f64, to_hours: f64) -> [f32; SNOW_SAMPLE_COUNT] {
        self.lock().ring.accumulated_between(from_hours, to_hours)
    }

    /// Copy of the whole history, taken under the lock.
    pub fn snapshot_copy(&self) -> SnowRing {
        self.lock().ring.clone()
    }

    /// Copy of the full persisted state.
    pub fn ledger(&self) -> SnowLedger {
        self.lock().clone()
    }
}
