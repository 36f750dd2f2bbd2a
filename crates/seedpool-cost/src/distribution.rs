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

//! Distribution cost of a single cell.
//!
//! A cell is one slice of an event's field: a phase, a value tier (entrants
//! valued at least the tier's value) and optionally one place of a
//! location. Its cost is the dispersion of the weighted entrant counts over
//! the phase's buckets; its minimum is the dispersion of the most even
//! partition of its entrant weights, level by level when bracket folding
//! applies.

use seedpool_core::math::{
    dispersion::{bracket_dispersion, folded_levels, population_std},
    partition::optimal_weight_partition,
};
use seedpool_model::location::Place;

/// Cost of a cell holding `counts` per bucket, buckets in pool order.
#[inline]
pub fn cell_cost(counts: &[f64], bracket: bool) -> f64 {
    bracket_dispersion(counts, bracket)
}

/// Lower bound of [`cell_cost`] for entrants of `weights` over `buckets`.
pub fn cell_minimum(weights: &[f64], buckets: usize, bracket: bool) -> f64 {
    let mut minimum = population_std(&optimal_weight_partition(buckets, weights));
    if bracket {
        for level in folded_levels(buckets) {
            minimum += population_std(&optimal_weight_partition(level, weights));
        }
    }
    minimum
}

/// Sorted distinct values, the tier thresholds of a field.
pub fn tiers(values: impl IntoIterator<Item = f64>) -> Vec<f64> {
    let mut tiers: Vec<f64> = values.into_iter().collect();
    tiers.sort_by(f64::total_cmp);
    tiers.dedup();
    tiers
}

/// Identifies a cell for reporting.
#[derive(Debug, Clone, PartialEq)]
pub struct CellKey {
    pub event: String,
    /// Zero-based phase.
    pub phase: usize,
    /// Lowest value admitted to the cell.
    pub tier: f64,
    /// Position of the tier among the event phase's tiers; 0 admits everyone.
    pub tier_rank: usize,
    /// Location position and place for place cells.
    pub place: Option<(usize, Place)>,
}

impl std::fmt::Display for CellKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", self.event, self.phase + 1)?;
        if self.tier_rank > 0 {
            write!(f, " value>={}", self.tier)?;
        }
        if let Some((location, place)) = &self.place {
            write!(f, " @{}:{}", location, place.join("+"))?;
        }
        Ok(())
    }
}
