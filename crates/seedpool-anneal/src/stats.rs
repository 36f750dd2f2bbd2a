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

//! Run statistics of an annealing search.
//!
//! Counters are updated once per step in the hot loop and use saturating
//! arithmetic, so a very long run clamps instead of overflowing.

use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct AnnealStatistics {
    /// Number of completed iterations.
    pub iterations: u64,

    /// Number of proposed moves.
    pub proposed_moves: u64,

    /// Number of accepted moves.
    pub accepted_moves: u64,

    /// Accepted moves per move kind, in the order kinds were first seen.
    pub accepted_by_kind: Vec<(&'static str, u64)>,

    /// Wall time of the search loop.
    pub time_total: Duration,
}

impl AnnealStatistics {
    #[inline]
    pub fn on_iteration(&mut self) {
        self.iterations = self.iterations.saturating_add(1);
    }

    #[inline]
    pub fn on_proposed_move(&mut self) {
        self.proposed_moves = self.proposed_moves.saturating_add(1);
    }

    /// Counts an accepted move of `kind`.
    pub fn on_accepted_move(&mut self, kind: &'static str) {
        self.accepted_moves = self.accepted_moves.saturating_add(1);
        match self.accepted_by_kind.iter_mut().find(|(k, _)| *k == kind) {
            Some((_, count)) => *count = count.saturating_add(1),
            None => self.accepted_by_kind.push((kind, 1)),
        }
    }

    #[inline]
    pub fn set_total_time(&mut self, duration: Duration) {
        self.time_total = duration;
    }

    #[inline]
    pub fn rejected_moves(&self) -> u64 {
        self.proposed_moves.saturating_sub(self.accepted_moves)
    }

    /// Accepted moves of `kind`.
    pub fn accepted(&self, kind: &str) -> u64 {
        self.accepted_by_kind
            .iter()
            .find(|(k, _)| *k == kind)
            .map_or(0, |(_, c)| *c)
    }
}

impl std::fmt::Display for AnnealStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Seedpool-Anneal Statistics:")?;
        writeln!(f, "   Iterations:        {}", self.iterations)?;
        writeln!(f, "   Proposed Moves:    {}", self.proposed_moves)?;
        writeln!(f, "   Accepted Moves:    {}", self.accepted_moves)?;
        for (kind, count) in &self.accepted_by_kind {
            writeln!(f, "     {:<16} {}", format!("{kind}:"), count)?;
        }
        writeln!(f, "   Rejected Moves:    {}", self.rejected_moves())?;
        writeln!(f, "   Total Time:        {:?}", self.time_total)?;
        Ok(())
    }
}
