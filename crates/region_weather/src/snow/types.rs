//! Snow history types: hourly snapshots and the fixed-capacity ring holding them.

use bitcode::{Decode, Encode};

use crate::config::SNOW_SAMPLE_COUNT;

/// One simulated hour of snow change at the region's corner sample points.
#[derive(Debug, Clone, Copy, PartialEq, Encode, Decode)]
pub struct SnowSnapshot {
    /// Start of the simulated hour this snapshot covers.
    pub total_hours: f64,
    /// Accumulation (positive) or melt (negative) per sample point.
    pub deltas: [f32; SNOW_SAMPLE_COUNT],
    /// How many times this snapshot was folded into persistent accumulation.
    pub checks: u32,
}

/// Fixed-capacity ring of [`SnowSnapshot`]s in increasing `total_hours` order.
/// When full, the oldest entry is overwritten.
#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub struct SnowRing {
    slots: Vec<SnowSnapshot>,
    capacity: u32,
    /// Slot the next snapshot is written to.
    cursor: u32,
}

impl SnowRing {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            slots: Vec::with_capacity(capacity.min(1024)),
            capacity: capacity as u32,
            cursor: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity as usize
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor as usize
    }

    pub fn push(&mut self, snapshot: SnowSnapshot) {
        if self.slots.len() < self.capacity as usize {
            self.slots.push(snapshot);
        } else {
            self.slots[self.cursor as usize] = snapshot;
        }
        self.cursor = (self.cursor + 1) % self.capacity;
    }

    /// Snapshots from oldest to newest.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &SnowSnapshot> + '_ {
        let split = if self.slots.len() < self.capacity as usize {
            0
        } else {
            self.cursor as usize
        };
        self.slots[split..].iter().chain(self.slots[..split].iter())
    }

    pub fn newest(&self) -> Option<&SnowSnapshot> {
        self.iter().next_back()
    }

    pub fn oldest(&self) -> Option<&SnowSnapshot> {
        self.iter().next()
    }

    /// The snapshot covering simulated hour `hour`, if still held.
    pub fn at_hour(&self, hour: f64) -> Option<&SnowSnapshot> {
        let start = hour.floor();
        self.iter().rev().find(|s| s.total_hours == start)
    }

    /// Summed deltas of the snapshots with `from <= total_hours < to`.
    pub fn accumulated_between(&self, from: f64, to: f64) -> [f32; SNOW_SAMPLE_COUNT] {
        let mut sum = [0.0; SNOW_SAMPLE_COUNT];
        for s in self.iter().filter(|s| s.total_hours >= from && s.total_hours < to) {
            for (acc, d) in sum.iter_mut().zip(s.deltas.iter()) {
                *acc += d;
            }
        }
        sum
    }

    /// Sum every snapshot not yet folded and bump its `checks` counter, so a
    /// snapshot is applied to persistent accumulation exactly once.
    pub(crate) fn fold_unchecked(&mut self) -> [f32; SNOW_SAMPLE_COUNT] {
        let mut sum = [0.0; SNOW_SAMPLE_COUNT];
        for snapshot in self.slots.iter_mut().filter(|s| s.checks == 0) {
            snapshot.checks += 1;
            for (acc, d) in sum.iter_mut().zip(snapshot.deltas.iter()) {
                *acc += d;
            }
        }
        sum
    }

    /// Rebuild with a new capacity, keeping the newest entries.
    pub fn resized(&self, capacity: usize) -> Self {
        let mut ring = SnowRing::new(capacity);
        let keep = self.len().min(ring.capacity());
        for s in self.iter().skip(self.len() - keep) {
            ring.push(*s);
        }
        ring
    }

    /// Repair invariants after decoding untrusted bytes: capacity and cursor in
    /// range, and entries strictly increasing in time.
    pub(crate) fn sanitized(self) -> Self {
        let valid = self.capacity > 0
            && self.slots.len() <= self.capacity as usize
            && self.cursor < self.capacity
            && (self.slots.len() == self.capacity as usize
                || self.cursor as usize == self.slots.len());
        let ordered = valid && {
            let mut prev = f64::NEG_INFINITY;
            self.iter().all(|s| {
                let ok = s.total_hours > prev;
                prev = s.total_hours;
                ok
            })
        };
        if ordered {
            return self;
        }
        let capacity = self.capacity.max(1) as usize;
        let mut entries = self.slots;
        entries.sort_by(|a, b| a.total_hours.total_cmp(&b.total_hours));
        entries.dedup_by(|a, b| a.total_hours == b.total_hours);
        let mut ring = SnowRing::new(capacity);
        let skip = entries.len().saturating_sub(capacity);
        for s in entries.into_iter().skip(skip) {
            ring.push(s);
        }
        ring
    }
}
