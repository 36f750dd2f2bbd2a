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

//! # Schedule Cost
//!
//! A competitor's schedule is the multiset of blocks occupied by all of
//! their phases. With `c` occupancies of block `b`:
//!
//! ```text
//! cost = scm * sum_b (c_b! - 1) + xcm * sum_{b unavailable} c_b
//! ```
//!
//! ## Greedy minimum
//!
//! The lower bound is built one phase at a time. Every round:
//!
//! 1. Each block gets a marginal slope, the cost of one more occupancy:
//!    `scm * ((c + 1)! - c!) + xcm * [b unavailable]`. An option (one row
//!    of waves over an event's remaining phases) costs the sum of the slopes
//!    of its waves' blocks.
//! 2. Events are ranked by their cheapest option, then by how few options
//!    reach that price; every event tied on both is preferred.
//! 3. The candidate (event, phase) pairs of the preferred events are
//!    narrowed wave by wave, in label order or in the caller's preferred
//!    wave order, until one remains. The first remaining candidate takes the
//!    first preferred wave it offers.
//! 4. The event keeps only the options using that wave in that phase, and
//!    the wave's blocks are tallied.
//!
//! The construction is a heuristic bound, not an exact optimum. Its
//! tie-breaks fix the value the annealers converge towards, so they are
//! part of the contract.

use rustc_hash::FxHashMap;
use seedpool_core::pool::{wave_blocks, BlockTally};
use smallvec::SmallVec;

/// Interned wave label.
pub type WaveId = u32;

/// One option of an event: a wave per remaining phase.
pub type WaveRow = SmallVec<[WaveId; 4]>;

/// `n!` as a float; exact for every count a schedule can reach.
#[inline]
pub fn factorial(n: u32) -> f64 {
    (2..=n).fold(1.0, |acc, k| acc * k as f64)
}

/// Interned wave labels and their preference ranks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WaveBook {
    labels: Vec<String>,
    ranks: Vec<u32>,
    index: FxHashMap<String, WaveId>,
}

impl WaveBook {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the id of `wave`, interning it on first sight.
    pub fn intern(&mut self, wave: &str) -> WaveId {
        if let Some(&id) = self.index.get(wave) {
            return id;
        }
        let id = self.labels.len() as WaveId;
        self.labels.push(wave.to_string());
        self.index.insert(wave.to_string(), id);
        id
    }

    #[inline]
    pub fn get(&self, wave: &str) -> Option<WaveId> {
        self.index.get(wave).copied()
    }

    #[inline]
    pub fn label(&self, id: WaveId) -> &str {
        &self.labels[id as usize]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Ranks every interned wave. Waves listed in `preferred` come first in
    /// that order, all others follow by label.
    pub fn rank<S: AsRef<str>>(&mut self, preferred: Option<&[S]>) {
        let position = |label: &str| -> usize {
            preferred
                .and_then(|p| p.iter().position(|w| w.as_ref() == label))
                .unwrap_or(usize::MAX)
        };
        let mut order: Vec<usize> = (0..self.labels.len()).collect();
        order.sort_by(|&a, &b| {
            let (la, lb) = (&self.labels[a], &self.labels[b]);
            position(la).cmp(&position(lb)).then_with(|| la.cmp(lb))
        });
        self.ranks = vec![0; self.labels.len()];
        for (rank, &id) in order.iter().enumerate() {
            self.ranks[id] = rank as u32;
        }
    }

    #[inline]
    fn rank_of(&self, id: WaveId) -> u32 {
        self.ranks.get(id as usize).copied().unwrap_or(id)
    }

    #[inline]
    fn blocks(&self, id: WaveId) -> impl Iterator<Item = char> + '_ {
        wave_blocks(self.label(id))
    }
}

/// The two schedule weights, `scm` and `xcm`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduleWeights {
    pub conflict: f64,
    pub external: f64,
}

impl Default for ScheduleWeights {
    fn default() -> Self {
        Self {
            conflict: 2.0,
            external: 8.0,
        }
    }
}

impl ScheduleWeights {
    #[inline]
    pub fn new(conflict: f64, external: f64) -> Self {
        Self { conflict, external }
    }

    /// Cost of a finished tally.
    pub fn cost(&self, tally: &BlockTally, unavailable: &[char]) -> f64 {
        let factorials: f64 = tally.iter().map(|(_, c)| factorial(c)).sum();
        let internal = self.conflict * (factorials - tally.len() as f64);
        let external: u32 = unavailable.iter().map(|&b| tally.count(b)).sum();
        internal + self.external * external as f64
    }

    /// Marginal cost of one more occupancy of a block held `count` times.
    #[inline]
    pub fn slope(&self, count: u32, unavailable: bool) -> f64 {
        let internal = self.conflict * (factorial(count + 1) - factorial(count));
        if unavailable {
            internal + self.external
        } else {
            internal
        }
    }

    /// Greedily completes `tally` with one wave per remaining phase of every
    /// pending event, see the module documentation.
    ///
    /// Each entry of `pending` lists one event's options; all rows of an
    /// event have the same length.
    pub fn complete(
        &self,
        book: &WaveBook,
        mut tally: BlockTally,
        unavailable: &[char],
        mut pending: Vec<Vec<WaveRow>>,
    ) -> BlockTally {
        pending.retain(|options| options.first().is_some_and(|row| !row.is_empty()));

        while !pending.is_empty() {
            let wave_slope = |w: WaveId| -> f64 {
                book.blocks(w)
                    .map(|b| self.slope(tally.count(b), unavailable.contains(&b)))
                    .sum()
            };

            // (pending position, options at the minimum)
            let mut preferred: Vec<(usize, Vec<usize>)> = Vec::new();
            let mut best = (f64::INFINITY, usize::MAX);
            for (p, options) in pending.iter().enumerate() {
                let slopes: Vec<f64> = options
                    .iter()
                    .map(|row| row.iter().map(|&w| wave_slope(w)).sum())
                    .collect();
                let min = slopes.iter().copied().fold(f64::INFINITY, f64::min);
                let at_min: Vec<usize> = (0..slopes.len()).filter(|&i| slopes[i] == min).collect();
                if min < best.0 || (min == best.0 && at_min.len() < best.1) {
                    best = (min, at_min.len());
                    preferred.clear();
                }
                if min == best.0 && at_min.len() == best.1 {
                    preferred.push((p, at_min));
                }
            }

            let offers = |(slot, column): (usize, usize), wave: WaveId| -> bool {
                let (p, ref rows) = preferred[slot];
                rows.iter().any(|&r| pending[p][r][column] == wave)
            };

            let mut waves: Vec<WaveId> = Vec::new();
            for (p, rows) in &preferred {
                for &r in rows {
                    waves.extend(pending[*p][r].iter().copied());
                }
            }
            waves.sort_unstable_by_key(|&w| book.rank_of(w));
            waves.dedup();

            let mut candidates: Vec<(usize, usize)> = preferred
                .iter()
                .enumerate()
                .flat_map(|(slot, (p, _))| (0..pending[*p][0].len()).map(move |c| (slot, c)))
                .collect();
            for &w in &waves {
                let chosen: Vec<(usize, usize)> =
                    candidates.iter().copied().filter(|&c| offers(c, w)).collect();
                if !chosen.is_empty() {
                    candidates = chosen;
                }
                if candidates.len() == 1 {
                    break;
                }
            }

            let (slot, column) = candidates[0];
            let Some(wave) = waves.iter().copied().find(|&w| offers((slot, column), w)) else {
                break;
            };
            let p = preferred[slot].0;

            tally.add_wave(book.label(wave));
            let options = &mut pending[p];
            options.retain(|row| row[column] == wave);
            for row in options.iter_mut() {
                row.remove(column);
            }
            if options.first().map_or(true, |row| row.is_empty()) {
                pending.remove(p);
            }
        }

        tally
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::smallvec;

    fn book(waves: &[&str]) -> WaveBook {
        let mut book = WaveBook::new();
        for w in waves {
            book.intern(w);
        }
        book.rank::<&str>(None);
        book
    }

    fn rows(book: &WaveBook, options: &[&[&str]]) -> Vec<WaveRow> {
        options
            .iter()
            .map(|row| row.iter().map(|w| book.get(w).unwrap()).collect())
            .collect()
    }

    #[test]
    fn test_factorial() {
        assert_eq!(factorial(0), 1.0);
        assert_eq!(factorial(1), 1.0);
        assert_eq!(factorial(4), 24.0);
    }

    #[test]
    fn test_cost_of_tally() {
        let mut tally = BlockTally::new();
        for b in ['A', 'A', 'B', 'B', 'B', 'C'] {
            tally.add(b);
        }
        let weights = ScheduleWeights::default();
        // 2 * ((2 + 6 + 1) - 3) + 8 * 3
        assert_eq!(weights.cost(&tally, &['B']), 12.0 + 24.0);
        assert_eq!(weights.cost(&BlockTally::new(), &['A']), 0.0);
    }

    #[test]
    fn test_slope_grows_factorially() {
        let weights = ScheduleWeights::default();
        assert_eq!(weights.slope(0, false), 0.0);
        assert_eq!(weights.slope(1, false), 2.0);
        assert_eq!(weights.slope(2, false), 8.0);
        assert_eq!(weights.slope(0, true), 8.0);
    }

    #[test]
    fn test_greedy_spreads_two_events() {
        let book = book(&["A", "B"]);
        let weights = ScheduleWeights::default();
        let pending = vec![rows(&book, &[&["A"], &["B"]]), rows(&book, &[&["A"], &["B"]])];
        let tally = weights.complete(&book, BlockTally::new(), &[], pending);
        assert_eq!(tally.count('A'), 1);
        assert_eq!(tally.count('B'), 1);
        assert_eq!(weights.cost(&tally, &[]), 0.0);
    }

    #[test]
    fn test_greedy_avoids_unavailable_block() {
        let book = book(&["A", "B"]);
        let weights = ScheduleWeights::default();
        let pending = vec![rows(&book, &[&["A"], &["B"]]), rows(&book, &[&["A"], &["B"]])];
        let tally = weights.complete(&book, BlockTally::new(), &['A'], pending);
        assert_eq!(tally.count('A'), 0);
        assert_eq!(tally.count('B'), 2);
        assert_eq!(weights.cost(&tally, &['A']), 2.0);
    }

    #[test]
    fn test_greedy_respects_kept_blocks() {
        let book = book(&["A", "B"]);
        let weights = ScheduleWeights::default();
        let mut kept = BlockTally::new();
        kept.add('B');
        let pending = vec![rows(&book, &[&["A"], &["B"]])];
        let tally = weights.complete(&book, kept, &[], pending);
        assert_eq!(tally.count('A'), 1);
        assert_eq!(tally.count('B'), 1);
    }

    #[test]
    fn test_greedy_prefers_event_with_fewer_options() {
        let book = book(&["A", "B", "C"]);
        let weights = ScheduleWeights::default();
        let pending = vec![
            rows(&book, &[&["A", "C"], &["B", "C"]]),
            rows(&book, &[&["A"]]),
        ];
        let tally = weights.complete(&book, BlockTally::new(), &[], pending);
        assert_eq!(tally.count('A'), 1);
        assert_eq!(tally.count('B'), 1);
        assert_eq!(tally.count('C'), 1);
    }

    #[test]
    fn test_greedy_follows_preferred_wave_order() {
        let mut book = book(&["A", "B"]);
        book.rank(Some(&["B"][..]));
        let weights = ScheduleWeights::default();
        let pending = vec![rows(&book, &[&["A"], &["B"]])];
        let tally = weights.complete(&book, BlockTally::new(), &[], pending);
        assert_eq!(tally.count('B'), 1);
        assert_eq!(tally.count('A'), 0);
    }

    #[test]
    fn test_multi_letter_waves_occupy_every_block() {
        let book = book(&["AB", "A"]);
        let weights = ScheduleWeights::default();
        let pending = vec![rows(&book, &[&["AB"]]), rows(&book, &[&["A"]])];
        let tally = weights.complete(&book, BlockTally::new(), &[], pending);
        assert_eq!(tally.count('A'), 2);
        assert_eq!(tally.count('B'), 1);
        assert_eq!(weights.cost(&tally, &[]), 2.0);
    }

    #[test]
    fn test_empty_pending_keeps_tally() {
        let book = book(&["A"]);
        let weights = ScheduleWeights::default();
        let row: WaveRow = smallvec![];
        let tally = weights.complete(&book, BlockTally::new(), &[], vec![vec![row]]);
        assert!(tally.is_empty());
    }
}
