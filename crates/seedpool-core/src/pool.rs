// Copyright (c) 2025 Felix Kahle.
//
// Permission is hereby granted, free of charge, to any person obtaining
// a copy of this software and associated documentation files (the
// "Software"), to deal in the Software without restriction, including
// without limitation the rights to use, copy, modify, merge, publish,
// distribute, sublicense, and/or sell copies of the Software, and to
// permit persons to whom the Software is furnished to do so, subject to
// the following conditions:
//
// The above copyright notice and this permission notice shall be
// included in all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND,
// EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF
// MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
// NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE
// LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION
// OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION
// WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

//! # Pool Identifiers and Block Tallies
//!
//! A pool identifier is a run of ASCII letters followed by a run of ASCII
//! digits, e.g. `"A301"` or `"CC12"`. The letters are the *wave*: every pool
//! of a wave is played in the same schedule slot. The digits are the
//! *station*, the pool's position inside its wave.
//!
//! A wave of more than one letter spans several schedule *blocks*, one per
//! letter, so `"CC12"` occupies block `C` twice and `"AB4"` occupies `A` and
//! `B`. `BlockTally` counts how often a single competitor lands in each block
//! across all of their phases; any count above one is a double booking.

use smallvec::SmallVec;

/// Splits a pool identifier into its wave and station.
///
/// Returns `None` unless the whole string is letters followed by digits.
///
/// ```rust
/// use seedpool_core::pool::decompose_pool_name;
///
/// assert_eq!(decompose_pool_name("A301"), Some(("A", 301)));
/// assert_eq!(decompose_pool_name("CC7"), Some(("CC", 7)));
/// assert_eq!(decompose_pool_name("301A"), None);
/// ```
pub fn decompose_pool_name(pool: &str) -> Option<(&str, u64)> {
    let split = pool
        .char_indices()
        .find(|(_, c)| !c.is_ascii_alphabetic())
        .map(|(i, _)| i)?;
    let (wave, station) = pool.split_at(split);
    if wave.is_empty() || station.is_empty() || !station.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    station.parse().ok().map(|s| (wave, s))
}

/// Returns the wave of a pool identifier, if it decomposes.
#[inline]
pub fn pool_wave(pool: &str) -> Option<&str> {
    decompose_pool_name(pool).map(|(w, _)| w)
}

/// Returns the station of a pool identifier, if it decomposes.
#[inline]
pub fn pool_station(pool: &str) -> Option<u64> {
    decompose_pool_name(pool).map(|(_, s)| s)
}

/// The schedule blocks a wave occupies, one per letter.
#[inline]
pub fn wave_blocks(wave: &str) -> impl Iterator<Item = char> + '_ {
    wave.chars()
}

/// Per-block occupancy counts for one competitor.
///
/// Kept sorted by block so iteration order is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockTally {
    counts: SmallVec<[(char, u32); 8]>,
}

impl BlockTally {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one occupancy of `block`.
    #[inline]
    pub fn add(&mut self, block: char) {
        match self.counts.binary_search_by_key(&block, |&(b, _)| b) {
            Ok(i) => self.counts[i].1 += 1,
            Err(i) => self.counts.insert(i, (block, 1)),
        }
    }

    /// Adds one occupancy of every block of `wave`.
    #[inline]
    pub fn add_wave(&mut self, wave: &str) {
        for b in wave_blocks(wave) {
            self.add(b);
        }
    }

    /// Occupancy of `block`, zero if never added.
    #[inline]
    pub fn count(&self, block: char) -> u32 {
        self.counts
            .binary_search_by_key(&block, |&(b, _)| b)
            .map(|i| self.counts[i].1)
            .unwrap_or(0)
    }

    /// Iterates over occupied blocks and their counts in block order.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (char, u32)> + '_ {
        self.counts.iter().copied()
    }

    /// Number of distinct occupied blocks.
    #[inline]
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Returns `true` if any block is occupied more than once.
    #[inline]
    pub fn has_conflict(&self) -> bool {
        self.counts.iter().any(|&(_, c)| c > 1)
    }
}

/// Tallies the blocks of one competitor's per-phase pool assignments.
///
/// Pools equal to `unassigned` and pools that do not decompose are skipped.
///
/// ```rust
/// use seedpool_core::pool::count_blocks;
///
/// let tally = count_blocks(["A1", "B4", "A7", "xx"], Some("xx"));
/// assert_eq!(tally.count('A'), 2);
/// assert_eq!(tally.count('B'), 1);
/// assert!(tally.has_conflict());
/// ```
pub fn count_blocks<'a, I>(schedule: I, unassigned: Option<&str>) -> BlockTally
where
    I: IntoIterator<Item = &'a str>,
{
    let mut tally = BlockTally::new();
    for pool in schedule {
        if unassigned == Some(pool) {
            continue;
        }
        if let Some(wave) = pool_wave(pool) {
            tally.add_wave(wave);
        }
    }
    tally
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decompose_accepts_letters_then_digits() {
        assert_eq!(decompose_pool_name("A301"), Some(("A", 301)));
        assert_eq!(decompose_pool_name("CC301"), Some(("CC", 301)));
        assert_eq!(decompose_pool_name("b07"), Some(("b", 7)));
    }

    #[test]
    fn test_decompose_rejects_malformed_names() {
        assert_eq!(decompose_pool_name(""), None);
        assert_eq!(decompose_pool_name("A"), None);
        assert_eq!(decompose_pool_name("301"), None);
        assert_eq!(decompose_pool_name("A3B"), None);
        assert_eq!(decompose_pool_name("xx"), None);
        assert_eq!(decompose_pool_name("A-1"), None);
    }

    #[test]
    fn test_wave_and_station_accessors() {
        assert_eq!(pool_wave("D12"), Some("D"));
        assert_eq!(pool_station("D12"), Some(12));
        assert_eq!(pool_wave("Dummy"), None);
    }

    #[test]
    fn test_multi_letter_wave_spans_blocks() {
        let tally = count_blocks(["AB1", "B2"], None);
        assert_eq!(tally.count('A'), 1);
        assert_eq!(tally.count('B'), 2);
        assert_eq!(tally.len(), 2);
    }

    #[test]
    fn test_tally_is_sorted_by_block() {
        let tally = count_blocks(["C1", "A1", "B1", "A2"], None);
        let blocks: Vec<(char, u32)> = tally.iter().collect();
        assert_eq!(blocks, vec![('A', 2), ('B', 1), ('C', 1)]);
    }

    #[test]
    fn test_no_conflict_for_distinct_blocks() {
        let tally = count_blocks(["A1", "B1", "C1"], None);
        assert!(!tally.has_conflict());
        assert_eq!(tally.count('D'), 0);
    }
}
