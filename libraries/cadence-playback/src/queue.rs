//! Play queue
//!
//! Holds the caller's base order and the playback order derived from it.
//! Both always contain the same tracks; only their order differs.

use crate::shuffle::{rotated_to, shuffled_around};
use cadence_core::{Track, TrackId};
use rand::Rng;

/// Outcome of stepping through the queue
#[derive(Debug, Clone, PartialEq)]
pub enum Advance {
    /// Play this track next
    Play(Track),

    /// Last track finished with nowhere to go; stop and rewind
    EndOfQueue,

    /// Queue is empty
    Empty,
}

/// Base order plus playback order
#[derive(Debug, Clone, Default)]
pub struct PlayQueue {
    base: Vec<Track>,
    order: Vec<Track>,
}

impl PlayQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a queue in the given order, unshuffled
    pub fn from_tracks(tracks: Vec<Track>) -> Self {
        Self {
            order: tracks.clone(),
            base: tracks,
        }
    }

    /// Replace the queue
    ///
    /// With `shuffle`, the playback order is a fresh permutation anchored at
    /// `active`; otherwise it is the supplied order unmodified.
    pub fn replace<R: Rng>(
        &mut self,
        tracks: Vec<Track>,
        active: &str,
        shuffle: bool,
        rng: &mut R,
    ) {
        self.order = if shuffle {
            shuffled_around(&tracks, Some(active), rng)
        } else {
            tracks.clone()
        };
        self.base = tracks;
    }

    /// Recompute the playback order as a permutation anchored at `active`
    pub fn shuffle<R: Rng>(&mut self, active: Option<&str>, rng: &mut R) {
        self.order = shuffled_around(&self.base, active, rng);
    }

    /// Restore base order, rotated so `active` stays current
    pub fn unshuffle(&mut self, active: Option<&str>) {
        self.order = rotated_to(&self.base, active);
    }

    /// Tracks in playback order
    pub fn tracks(&self) -> &[Track] {
        &self.order
    }

    /// Tracks in the caller's order
    pub fn base(&self) -> &[Track] {
        &self.base
    }

    /// Ids in playback order
    pub fn ids(&self) -> Vec<TrackId> {
        self.order.iter().map(|t| t.id.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Index of `active` in playback order; 0 if the queue lost track of it
    fn current_index(&self, active: &str) -> usize {
        self.order.iter().position(|t| t.id == active).unwrap_or(0)
    }

    /// Pick the track after `active`
    ///
    /// Shuffle picks uniformly at random, falling back to the sequential
    /// next index on a self-loop. A repeat-all continuation always steps
    /// sequentially and wraps. Otherwise, stepping off the last track ends
    /// the queue instead of wrapping.
    pub fn next<R: Rng>(
        &self,
        active: &str,
        shuffle: bool,
        repeat_all: bool,
        rng: &mut R,
    ) -> Advance {
        let len = self.order.len();
        if len == 0 {
            return Advance::Empty;
        }

        let current = self.current_index(active);
        let sequential = (current + 1) % len;
        let next = if shuffle && !repeat_all {
            let pick = rng.gen_range(0..len);
            if len > 1 && pick == current {
                sequential
            } else {
                pick
            }
        } else {
            sequential
        };

        if !repeat_all && !shuffle && next == 0 && current == len - 1 {
            return Advance::EndOfQueue;
        }
        Advance::Play(self.order[next].clone())
    }

    /// Pick the track before `active`; always wraps
    pub fn previous<R: Rng>(&self, active: &str, shuffle: bool, rng: &mut R) -> Advance {
        let len = self.order.len();
        if len == 0 {
            return Advance::Empty;
        }

        let current = self.current_index(active);
        let sequential = (current + len - 1) % len;
        let previous = if shuffle {
            let pick = rng.gen_range(0..len);
            if len > 1 && pick == current {
                sequential
            } else {
                pick
            }
        } else {
            sequential
        };

        Advance::Play(self.order[previous].clone())
    }
}
