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

//! Read-only diagnostics over a compiled layout and a decision vector.
//!
//! None of these functions take part in the search. They report which
//! rows are double booked or booked into unavailable blocks, which rows
//! could be scheduled better, and which cells are further from their
//! minimum than a tolerance.

use crate::{
    distribution::{cell_cost, CellKey},
    layout::{Layout, Tally},
};
use seedpool_model::{
    index::{EventIndex, RowIndex},
    location::{Location, Place},
    table::EntryTable,
};

/// Rows holding some block more than once.
pub fn find_schedule_conflicts(layout: &Layout, decisions: &[Option<usize>]) -> Vec<RowIndex> {
    (0..layout.num_rows())
        .filter(|&r| layout.row_tally(decisions, r, Tally::Actual).has_conflict())
        .map(RowIndex::new)
        .collect()
}

/// Rows occupying a block they listed as unavailable.
pub fn find_external_conflicts(layout: &Layout, decisions: &[Option<usize>]) -> Vec<RowIndex> {
    (0..layout.num_rows())
        .filter(|&r| {
            let unavailable = &layout.rows[r].unavailable;
            if unavailable.is_empty() {
                return false;
            }
            let tally = layout.row_tally(decisions, r, Tally::Actual);
            unavailable.iter().any(|&b| tally.count(b) > 0)
        })
        .map(RowIndex::new)
        .collect()
}

/// Rows whose schedule, completed greedily around their placed signups,
/// costs more than the greedy schedule built from scratch.
pub fn find_suboptimal_schedules(layout: &Layout, decisions: &[Option<usize>]) -> Vec<RowIndex> {
    (0..layout.num_rows())
        .filter(|&r| !layout.rows[r].signups.is_empty())
        .filter(|&r| {
            layout.row_schedule(decisions, r, Tally::Completed)
                > layout.row_schedule(decisions, r, Tally::Minimum)
        })
        .map(RowIndex::new)
        .collect()
}

/// Settings of [`find_suboptimal_distributions`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistributionCheck {
    /// Also report value tiers above the lowest.
    pub include_tiers: bool,
    /// Excess over the minimum that is still tolerated.
    pub tolerance: f64,
}

impl Default for DistributionCheck {
    fn default() -> Self {
        Self {
            include_tiers: false,
            tolerance: 1e-7,
        }
    }
}

/// Cells whose unscaled cost exceeds their minimum by more than the
/// tolerance, with the excess.
pub fn find_suboptimal_distributions(
    layout: &Layout,
    decisions: &[Option<usize>],
    check: DistributionCheck,
) -> Vec<(CellKey, f64)> {
    let counts = layout.counts(decisions);
    layout
        .cells
        .iter()
        .filter(|cell| check.include_tiers || cell.key.tier_rank == 0)
        .filter_map(|cell| {
            let cost = cell_cost(&counts[cell.offset..cell.offset + cell.buckets], cell.bracket);
            let excess = cost - cell.minimum;
            (excess > check.tolerance).then(|| (cell.key.clone(), excess))
        })
        .collect()
}

/// Weighted entrant counts per pool of `phase` for the rows of `event` at
/// `place` of `location`, pools in bucket order.
///
/// Unlike the scored cells this ignores value tiers and the location
/// threshold, and works for any phase of the event.
pub fn place_distribution(
    layout: &Layout,
    table: &EntryTable,
    decisions: &[Option<usize>],
    event: EventIndex,
    location: &Location,
    place: &Place,
    phase: usize,
) -> Vec<(String, f64)> {
    let plan = &layout.events[event.get()];
    let Some(labels) = plan.bucket_labels.get(phase) else {
        return Vec::new();
    };
    let mut counts = vec![0.0; labels.len()];
    for (i, entrant) in plan.entrants.iter().enumerate() {
        let Some(bucket) = decisions[plan.offset + i].and_then(|o| plan.buckets[phase][o]) else {
            continue;
        };
        let weight = entrant.weight / entrant.members.len().max(1) as f64;
        let here = entrant
            .members
            .iter()
            .filter(|&&row| location.place_of(table.record(row)).as_ref() == Some(place))
            .count();
        counts[bucket] += weight * here as f64;
    }
    labels.iter().cloned().zip(counts).collect()
}
