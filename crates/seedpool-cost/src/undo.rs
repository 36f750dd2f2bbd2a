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

//! Undo support for tentative score updates.
//!
//! A stack-based log of the values a [`ScoreBoard`](crate::board::ScoreBoard)
//! overwrote while applying a move. Rolling back walks the stacks backwards
//! and writes every old value back, restoring the board exactly, bit for bit.
//!
//! Operation tags, integer arguments and old values live on three separate
//! stacks so that recording a change never allocates once the buffers have
//! grown to the size of a typical move.

use crate::board::BoardState;

/// The kinds of state a move can overwrite.
///
/// - Decision: old decision of one entrant.
/// - Count: old bucket count of one cell.
/// - CellCost: old cost of one cell.
/// - RowCost: old schedule cost of one row.
/// - Total: old running total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum UndoOperation {
    Decision,
    Count,
    CellCost,
    RowCost,
    Total,
}

impl std::fmt::Display for UndoOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UndoOperation::Decision => write!(f, "Decision"),
            UndoOperation::Count => write!(f, "Count"),
            UndoOperation::CellCost => write!(f, "CellCost"),
            UndoOperation::RowCost => write!(f, "RowCost"),
            UndoOperation::Total => write!(f, "Total"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UndoLog {
    operations: Vec<UndoOperation>,   // LIFO stack of recorded operations
    args: Vec<usize>,                 // LIFO stack of positions, one per op except Total
    values: Vec<f64>,                 // LIFO stack of old numeric values
    decisions: Vec<Option<usize>>,    // LIFO stack of old decisions
}

impl Default for UndoLog {
    fn default() -> Self {
        Self::new(16)
    }
}

impl UndoLog {
    /// Creates a new `UndoLog` with the given initial capacity.
    #[inline]
    pub fn new(capacity: usize) -> Self {
        Self {
            operations: Vec::with_capacity(capacity),
            args: Vec::with_capacity(capacity),
            values: Vec::with_capacity(capacity),
            decisions: Vec::with_capacity(capacity.min(16)),
        }
    }

    /// Forgets every recorded operation.
    #[inline]
    pub fn clear(&mut self) {
        self.operations.clear();
        self.args.clear();
        self.values.clear();
        self.decisions.clear();
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    #[inline]
    pub fn push_decision(&mut self, index: usize, old: Option<usize>) {
        self.operations.push(UndoOperation::Decision);
        self.args.push(index);
        self.decisions.push(old);
    }

    #[inline]
    pub fn push_count(&mut self, index: usize, old: f64) {
        self.push_value(UndoOperation::Count, index, old);
    }

    #[inline]
    pub fn push_cell_cost(&mut self, cell: usize, old: f64) {
        self.push_value(UndoOperation::CellCost, cell, old);
    }

    #[inline]
    pub fn push_row_cost(&mut self, row: usize, old: f64) {
        self.push_value(UndoOperation::RowCost, row, old);
    }

    #[inline]
    pub fn push_total(&mut self, old: f64) {
        self.operations.push(UndoOperation::Total);
        self.values.push(old);
    }

    #[inline]
    fn push_value(&mut self, operation: UndoOperation, index: usize, old: f64) {
        debug_assert!(
            self.operations.len() >= self.values.len(),
            "called `UndoLog::push_value` with unbalanced stacks: operations.len() = {}, args.len() = {}, values.len() = {}",
            self.operations.len(),
            self.args.len(),
            self.values.len()
        );

        self.operations.push(operation);
        self.args.push(index);
        self.values.push(old);
    }

    /// Writes every recorded old value back into `state`, newest first, and
    /// leaves the log empty.
    pub fn apply_rollback(&mut self, state: &mut BoardState) {
        while let Some(operation) = self.operations.pop() {
            match operation {
                UndoOperation::Decision => {
                    debug_assert!(
                        !self.args.is_empty() && !self.decisions.is_empty(),
                        "called `UndoLog::apply_rollback` with corrupted Decision operation: expected 1 arg and 1 decision, found {} args and {} decisions",
                        self.args.len(),
                        self.decisions.len()
                    );

                    let old = unsafe { self.decisions.pop().unwrap_unchecked() };
                    let index = unsafe { self.args.pop().unwrap_unchecked() };
                    state.decisions[index] = old;
                }
                UndoOperation::Total => {
                    debug_assert!(
                        !self.values.is_empty(),
                        "called `UndoLog::apply_rollback` with corrupted Total operation: expected 1 value, found none"
                    );

                    state.total = unsafe { self.values.pop().unwrap_unchecked() };
                }
                UndoOperation::Count | UndoOperation::CellCost | UndoOperation::RowCost => {
                    debug_assert!(
                        !self.args.is_empty() && !self.values.is_empty(),
                        "called `UndoLog::apply_rollback` with corrupted {} operation: expected 1 arg and 1 value, found {} args and {} values",
                        operation,
                        self.args.len(),
                        self.values.len()
                    );

                    let old = unsafe { self.values.pop().unwrap_unchecked() };
                    let index = unsafe { self.args.pop().unwrap_unchecked() };
                    let target = match operation {
                        UndoOperation::Count => &mut state.counts,
                        UndoOperation::CellCost => &mut state.cell_costs,
                        _ => &mut state.row_costs,
                    };

                    debug_assert!(
                        index < target.len(),
                        "called `UndoLog::apply_rollback` with index out of bounds for {} operation: the len is {} but the index is {}",
                        operation,
                        target.len(),
                        index
                    );

                    target[index] = old;
                }
            }
        }

        debug_assert!(
            self.args.is_empty() && self.values.is_empty() && self.decisions.is_empty(),
            "called `UndoLog::apply_rollback` with leftover stack entries: args.len() = {}, values.len() = {}, decisions.len() = {}",
            self.args.len(),
            self.values.len(),
            self.decisions.len()
        );
    }
}

impl<'a> IntoIterator for &'a UndoLog {
    type Item = &'a UndoOperation;
    type IntoIter = std::slice::Iter<'a, UndoOperation>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.operations.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> BoardState {
        BoardState {
            decisions: vec![Some(0), None, Some(2)],
            counts: vec![1.0, 2.0, 3.0],
            cell_costs: vec![0.5, 0.25],
            row_costs: vec![4.0],
            total: 10.0,
        }
    }

    #[test]
    fn test_new_clear_is_empty() {
        let mut log = UndoLog::new(4);
        assert!(log.is_empty());
        log.push_count(0, 1.0);
        log.push_total(2.0);
        assert_eq!(log.len(), 2);
        log.clear();
        assert!(log.is_empty());
    }

    #[test]
    fn test_rollback_restores_every_kind() {
        let original = state();
        let mut current = state();
        let mut log = UndoLog::default();

        log.push_decision(1, current.decisions[1]);
        current.decisions[1] = Some(1);
        log.push_count(0, current.counts[0]);
        current.counts[0] = 7.0;
        log.push_cell_cost(1, current.cell_costs[1]);
        current.cell_costs[1] = 9.0;
        log.push_row_cost(0, current.row_costs[0]);
        current.row_costs[0] = 0.0;
        log.push_total(current.total);
        current.total = -1.0;

        log.apply_rollback(&mut current);
        assert_eq!(current, original);
        assert!(log.is_empty());
    }

    #[test]
    fn test_repeated_writes_restore_oldest_value() {
        let mut current = state();
        let mut log = UndoLog::default();
        for v in [5.0, 6.0, 7.0] {
            log.push_count(2, current.counts[2]);
            current.counts[2] = v;
        }
        log.apply_rollback(&mut current);
        assert_eq!(current.counts[2], 3.0);
    }

    #[test]
    fn test_operations_iterate_in_recording_order() {
        let mut log = UndoLog::default();
        log.push_row_cost(0, 1.0);
        log.push_decision(0, None);
        let ops: Vec<UndoOperation> = (&log).into_iter().copied().collect();
        assert_eq!(ops, vec![UndoOperation::RowCost, UndoOperation::Decision]);
        assert_eq!(ops[0].to_string(), "RowCost");
    }
}
