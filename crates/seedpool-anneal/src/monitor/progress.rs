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

//! Periodic progress reporting.
//!
//! `ProgressMonitor` emits one `tracing::info!` event every `every`
//! iterations and one when the run ends, carrying the iteration, the
//! current score, the minimum and the number of accepted moves.

use crate::{
    monitor::anneal_monitor::AnnealMonitor, result::AnnealOutcome, stats::AnnealStatistics,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressMonitor {
    every: u64,
    reports: u64,
}

impl ProgressMonitor {
    /// Reports every `every` iterations. An interval of 0 only reports the end.
    #[inline]
    pub fn new(every: u64) -> Self {
        Self { every, reports: 0 }
    }

    /// Number of reports emitted so far, the final one included.
    #[inline]
    pub fn reports(&self) -> u64 {
        self.reports
    }
}

impl AnnealMonitor for ProgressMonitor {
    fn name(&self) -> &str {
        "ProgressMonitor"
    }

    fn on_start(&mut self, score: f64, minimum: f64) {
        self.reports = 0;
        tracing::debug!(current = score, minimum, "annealing started");
    }

    fn on_iteration(&mut self, score: f64, minimum: f64, statistics: &AnnealStatistics) {
        if self.every == 0 || statistics.iterations % self.every != 0 {
            return;
        }
        self.reports += 1;
        tracing::info!(
            iteration = statistics.iterations,
            current = score,
            minimum,
            accepted = statistics.accepted_moves,
            "annealing progress"
        );
    }

    fn on_move_accepted(
        &mut self,
        _kind: &'static str,
        _delta: f64,
        _statistics: &AnnealStatistics,
    ) {
    }

    fn on_end(&mut self, outcome: &AnnealOutcome) {
        if self.every == 0 {
            return;
        }
        self.reports += 1;
        tracing::info!(
            iteration = outcome.statistics().iterations,
            current = outcome.score(),
            minimum = outcome.minimum(),
            accepted = outcome.statistics().accepted_moves,
            reason = %outcome.termination_reason(),
            "annealing finished"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::AnnealTerminationReason;

    #[test]
    fn test_reports_on_interval_and_at_end() {
        let mut monitor = ProgressMonitor::new(10);
        monitor.on_start(5.0, 1.0);
        let mut stats = AnnealStatistics::default();
        for _ in 0..25 {
            monitor.on_iteration(5.0, 1.0, &stats);
            stats.on_iteration();
        }
        assert_eq!(monitor.reports(), 3);

        let outcome =
            AnnealOutcome::new(AnnealTerminationReason::IterationLimit, 4.0, 1.0, stats);
        monitor.on_end(&outcome);
        assert_eq!(monitor.reports(), 4);
    }

    #[test]
    fn test_zero_interval_stays_silent() {
        let mut monitor = ProgressMonitor::new(0);
        let stats = AnnealStatistics::default();
        monitor.on_iteration(1.0, 0.0, &stats);
        monitor.on_end(&AnnealOutcome::settled(0.0, 0.0));
        assert_eq!(monitor.reports(), 0);
    }
}
