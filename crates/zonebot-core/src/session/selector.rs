//! Ephemeral selector handles
//!
//! The chat transport can only round-trip short callback payloads, so lists
//! are rendered with positional handles instead of ids or names. Each render
//! rebuilds the map under a new generation, and the generation is part of the
//! handle: a handle from an earlier render never resolves, even when the same
//! position exists again.
//!
//! Handles also carry the epoch of the session that minted them. A keyboard
//! left in the chat by a previous process (or a dropped session) names an
//! epoch no live map owns, so it never resolves after a restart.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};

/// Last epoch handed out in this process
static LAST_EPOCH: AtomicU64 = AtomicU64::new(0);

/// Allocate the epoch for a session created at `created_at`
///
/// Epochs are millisecond timestamps bumped to stay strictly increasing, so
/// two sessions never share one inside a process and a restarted process
/// starts above anything the previous one minted.
pub fn next_epoch(created_at: DateTime<Utc>) -> u64 {
    let floor = u64::try_from(created_at.timestamp_millis()).unwrap_or(0);
    let mut current = LAST_EPOCH.load(Ordering::Relaxed);
    loop {
        let next = floor.max(current.wrapping_add(1));
        match LAST_EPOCH.compare_exchange_weak(current, next, Ordering::Relaxed, Ordering::Relaxed)
        {
            Ok(_) => return next,
            Err(observed) => current = observed,
        }
    }
}

/// Short opaque handle handed to the interface layer
/// (`<epoch hex>.<generation>.<index>`)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SelectorToken(String);

impl SelectorToken {
    fn new(epoch: u64, generation: u32, index: usize) -> Self {
        Self(format!("{:x}.{}.{}", epoch, generation, index))
    }

    /// Parse a handle received from the interface
    ///
    /// Malformed input still produces a token; it simply never resolves.
    pub fn from_wire(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Handle as sent over the wire
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn parts(&self) -> Option<(u64, u32, usize)> {
        let mut parts = self.0.splitn(3, '.');
        let epoch = u64::from_str_radix(parts.next()?, 16).ok()?;
        let generation = parts.next()?.parse().ok()?;
        let index = parts.next()?.parse().ok()?;
        Some((epoch, generation, index))
    }
}

impl fmt::Display for SelectorToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Index map from handle to entity key, valid until the next rebuild
#[derive(Debug, Clone)]
pub struct SelectorMap<T> {
    epoch: u64,
    generation: u32,
    entries: Vec<T>,
}

impl<T: Clone + PartialEq> SelectorMap<T> {
    /// Create an empty map owned by the session with `epoch`
    pub fn new(epoch: u64) -> Self {
        Self {
            epoch,
            generation: 0,
            entries: Vec::new(),
        }
    }

    /// Replace the map for a fresh render and return one handle per entry,
    /// in order
    pub fn rebuild(&mut self, entries: impl IntoIterator<Item = T>) -> Vec<SelectorToken> {
        self.generation = self.generation.wrapping_add(1);
        self.entries = entries.into_iter().collect();
        (0..self.entries.len())
            .map(|index| SelectorToken::new(self.epoch, self.generation, index))
            .collect()
    }

    /// Drop every outstanding handle
    pub fn invalidate(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        self.entries.clear();
    }

    /// Resolve a handle against the current generation of this session
    pub fn resolve(&self, token: &SelectorToken) -> Option<&T> {
        let (epoch, generation, index) = token.parts()?;
        if epoch != self.epoch || generation != self.generation {
            return None;
        }
        self.entries.get(index)
    }

    /// Handle currently denoting `entry`, if it was part of the last render
    pub fn token_for(&self, entry: &T) -> Option<SelectorToken> {
        self.entries
            .iter()
            .position(|candidate| candidate == entry)
            .map(|index| SelectorToken::new(self.epoch, self.generation, index))
    }

    /// Number of resolvable entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` if nothing resolves
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
