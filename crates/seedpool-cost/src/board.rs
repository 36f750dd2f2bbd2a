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

//! Incremental scoring.
//!
//! A [`ScoreBoard`] holds one decision vector together with the bucket
//! counts, cell costs and row costs it implies. Moves are applied with
//! [`ScoreBoard::reassign`], which only updates counts and marks the cells
//! and rows it touched; [`ScoreBoard::settle`] then re-scores exactly the
//! marked cells and rows and returns the change of the total.
//!
//! Every overwritten value goes to an [`UndoLog`], so a rejected move is
//! taken back with [`ScoreBoard::rollback`]:
//!
//! ```text
//! board.begin();
//! board.reassign(&layout, e, a, Some(1));
//! board.reassign(&layout, e, b, Some(0));
//! let delta = board.settle(&layout);
//! if accept(delta) { board.commit() } else { board.rollback() }
//! ```
//!
//! The settled total always equals [`Layout::evaluate`] of the current
//! decisions, up to floating point drift of the running sum.

use crate::{
    layout::{Layout, Score},
    undo::UndoLog,
};
use fixedbitset::FixedBitSet;
use seedpool_model::index::{EntrantIndex, EventIndex};

/// The restorable part of a board.
#[derive(Debug, Clone, PartialEq)]
pub struct BoardState {
    pub(crate) decisions: Vec<Option<usize>>,
    pub(crate) counts: Vec<f64>,
    pub(crate) cell_costs: Vec<f64>,
    pub(crate) row_costs: Vec<f64>,
    pub(crate) total: f64,
}

#[derive(Debug, Clone)]
pub struct ScoreBoard {
    state: BoardState,
    dirty_cells: FixedBitSet,
    touched_cells: Vec<usize>,
    dirty_rows: FixedBitSet,
    touched_rows: Vec<usize>,
    log: UndoLog,
}

impl ScoreBoard {
    /// Scores `decisions` from scratch.
    pub fn new(layout: &Layout, decisions: Vec<Option<usize>>) -> Self {
        debug_assert!(
            decisions.len() == layout.num_decisions(),
            "called `ScoreBoard::new` with a decision vector of wrong length: expected {} but got {}",
            layout.num_decisions(),
            decisions.len()
        );

        let mut board = Self {
            state: BoardState {
                decisions,
                counts: Vec::new(),
                cell_costs: Vec::new(),
                row_costs: Vec::new(),
                total: 0.0,
            },
            dirty_cells: FixedBitSet::with_capacity(layout.cells.len()),
            touched_cells: Vec::new(),
            dirty_rows: FixedBitSet::with_capacity(layout.num_rows()),
            touched_rows: Vec::new(),
            log: UndoLog::new(64),
        };
        board.refresh(layout);
        board
    }

    /// A board holding the layout's initial decisions.
    #[inline]
    pub fn initial(layout: &Layout) -> Self {
        Self::new(layout, layout.initial_decisions())
    }

    /// Recomputes every cached value, e.g. after [`Layout::set_scale`].
    /// Clears the undo log.
    pub fn refresh(&mut self, layout: &Layout) {
        let state = &mut self.state;
        state.counts = layout.counts(&state.decisions);
        state.cell_costs = (0..layout.cells.len())
            .map(|c| layout.cell_cost_from(&state.counts, c))
            .collect();
        state.row_costs = if layout.skip_schedule {
            vec![0.0; layout.num_rows()]
        } else {
            (0..layout.num_rows())
                .map(|r| layout.row_cost(&state.decisions, r))
                .collect()
        };
        state.total = state.cell_costs.iter().sum::<f64>() + state.row_costs.iter().sum::<f64>();

        self.dirty_cells.clear();
        self.touched_cells.clear();
        self.dirty_rows.clear();
        self.touched_rows.clear();
        self.log.clear();
    }

    #[inline]
    pub fn total(&self) -> f64 {
        self.state.total
    }

    /// Current schedule and distribution parts.
    pub fn score(&self) -> Score {
        Score {
            schedule: self.state.row_costs.iter().sum(),
            distribution: self.state.cell_costs.iter().sum(),
        }
    }

    #[inline]
    pub fn decisions(&self) -> &[Option<usize>] {
        &self.state.decisions
    }

    #[inline]
    pub fn decision(&self, layout: &Layout, event: EventIndex, entrant: EntrantIndex) -> Option<usize> {
        self.state.decisions[layout.decision_index(event, entrant)]
    }

    /// Cached cost of one row, weighted.
    #[inline]
    pub fn row_cost(&self, row: usize) -> f64 {
        self.state.row_costs[row]
    }

    /// Cached cost of one cell, scaled.
    #[inline]
    pub fn cell_cost(&self, cell: usize) -> f64 {
        self.state.cell_costs[cell]
    }

    /// Starts recording a move.
    #[inline]
    pub fn begin(&mut self) {
        self.log.clear();
    }

    /// Gives `entrant` of `event` the option `decision`.
    ///
    /// Counts are updated immediately; costs only on [`ScoreBoard::settle`].
    pub fn reassign(
        &mut self,
        layout: &Layout,
        event: EventIndex,
        entrant: EntrantIndex,
        decision: Option<usize>,
    ) {
        let plan = &layout.events[event.get()];
        let index = plan.offset + entrant.get();
        let old = self.state.decisions[index];
        if old == decision {
            return;
        }

        debug_assert!(
            decision.map_or(true, |o| o < plan.labels.len()),
            "called `ScoreBoard::reassign` with option out of bounds: the len is {} but the option is {:?}",
            plan.labels.len(),
            decision
        );

        self.log.push_decision(index, old);
        self.state.decisions[index] = decision;

        for &(cell, phase, weight) in &plan.entrants[entrant.get()].cells {
            let from = old.and_then(|o| plan.buckets[phase][o]);
            let to = decision.and_then(|o| plan.buckets[phase][o]);
            if from == to {
                continue;
            }
            let offset = layout.cells[cell].offset;
            if let Some(bucket) = from {
                let k = offset + bucket;
                self.log.push_count(k, self.state.counts[k]);
                self.state.counts[k] -= weight;
            }
            if let Some(bucket) = to {
                let k = offset + bucket;
                self.log.push_count(k, self.state.counts[k]);
                self.state.counts[k] += weight;
            }
            if !self.dirty_cells.put(cell) {
                self.touched_cells.push(cell);
            }
        }

        if plan.schedule && !layout.skip_schedule && !plan.same_waves(old, decision) {
            for row in &plan.entrants[entrant.get()].members {
                if !self.dirty_rows.put(row.get()) {
                    self.touched_rows.push(row.get());
                }
            }
        }
    }

    /// Re-scores every cell and row touched since the last settle and
    /// returns the change of the total.
    pub fn settle(&mut self, layout: &Layout) -> f64 {
        let mut delta = 0.0;

        for &cell in &self.touched_cells {
            let cost = layout.cell_cost_from(&self.state.counts, cell);
            let old = self.state.cell_costs[cell];
            if cost != old {
                self.log.push_cell_cost(cell, old);
                self.state.cell_costs[cell] = cost;
                delta += cost - old;
            }
        }
        for &row in &self.touched_rows {
            let cost = layout.row_cost(&self.state.decisions, row);
            let old = self.state.row_costs[row];
            if cost != old {
                self.log.push_row_cost(row, old);
                self.state.row_costs[row] = cost;
                delta += cost - old;
            }
        }

        self.clear_marks();
        if delta != 0.0 {
            self.log.push_total(self.state.total);
            self.state.total += delta;
        }
        delta
    }

    /// Keeps every change since [`ScoreBoard::begin`].
    #[inline]
    pub fn commit(&mut self) {
        self.log.clear();
    }

    /// Takes back every change since [`ScoreBoard::begin`], settled or not.
    pub fn rollback(&mut self) {
        self.clear_marks();
        self.log.apply_rollback(&mut self.state);
    }

    fn clear_marks(&mut self) {
        for &cell in &self.touched_cells {
            self.dirty_cells.set(cell, false);
        }
        for &row in &self.touched_rows {
            self.dirty_rows.set(row, false);
        }
        self.touched_cells.clear();
        self.touched_rows.clear();
    }
}
