//! Which track to play next.
//!
//! Pure functions over indices into the full catalog. Shuffle draws from an
//! exclusion set, so a draw costs at most one pass over the catalog.

use std::collections::HashSet;

use rand::Rng;
use rand::seq::IndexedRandom;

/// Indices played since the last shuffle cycle began.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShuffleHistory {
    visited: HashSet<usize>,
}

impl ShuffleHistory {
    pub fn insert(&mut self, index: usize) {
        self.visited.insert(index);
    }

    pub fn contains(&self, index: usize) -> bool {
        self.visited.contains(&index)
    }

    pub fn clear(&mut self) {
        self.visited.clear();
    }

    pub fn len(&self) -> usize {
        self.visited.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visited.is_empty()
    }

    fn covers(&self, len: usize) -> bool {
        (0..len).all(|i| self.visited.contains(&i))
    }
}

/// Where playback starts when nothing has been loaded yet.
pub fn initial_index<R: Rng + ?Sized>(len: usize, shuffle: bool, rng: &mut R) -> Option<usize> {
    match len {
        0 => None,
        _ if shuffle => Some(rng.random_range(0..len)),
        _ => Some(0),
    }
}

/// The track after `current`.
///
/// Shuffled: a uniform draw among indices not in `history`; once every index
/// has been visited the history is cleared first and a new cycle begins
/// (avoiding `current` when there is anything else to pick). In order:
/// `current + 1`, wrapping. `None` only for an empty catalog.
pub fn next_index<R: Rng + ?Sized>(
    current: Option<usize>,
    len: usize,
    shuffle: bool,
    history: &mut ShuffleHistory,
    rng: &mut R,
) -> Option<usize> {
    if len == 0 {
        return None;
    }
    if !shuffle {
        return Some(current.map_or(0, |c| (c + 1) % len));
    }

    if history.covers(len) {
        history.clear();
    }
    let mut candidates: Vec<usize> = (0..len).filter(|&i| !history.contains(i)).collect();
    if candidates.len() > 1 {
        if let Some(c) = current {
            candidates.retain(|&i| i != c);
        }
    }
    candidates.choose(rng).copied()
}

/// The literal predecessor of `current`, wrapping. Shuffle is ignored.
///
/// Nothing loaded counts as the slot before the first track, so the result
/// is the second-to-last track (or the only one).
pub fn previous_index(current: Option<usize>, len: usize) -> Option<usize> {
    if len == 0 {
        return None;
    }
    Some(match current {
        Some(c) => (c % len + len - 1) % len,
        None => (2 * len - 2) % len,
    })
}
