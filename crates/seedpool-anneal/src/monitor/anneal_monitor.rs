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

//! Monitoring interface for annealing runs.
//!
//! A monitor observes the start, every iteration and the end of a run and
//! may stop it early by returning [`SearchCommand::Terminate`]. The default
//! `search_command` continues, so logging monitors stay a few lines long.

use crate::{result::AnnealOutcome, stats::AnnealStatistics};

/// What the engine should do next.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub enum SearchCommand {
    #[default]
    Continue,
    Terminate(String),
}

impl std::fmt::Display for SearchCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SearchCommand::Continue => write!(f, "Continue"),
            SearchCommand::Terminate(reason) => write!(f, "Terminate: {}", reason),
        }
    }
}

/// A monitor for annealing runs.
pub trait AnnealMonitor {
    /// Returns the name of the monitor.
    fn name(&self) -> &str;

    /// Called once before the first iteration.
    fn on_start(&mut self, score: f64, minimum: f64);

    /// Called at the top of every iteration, before a move is proposed.
    fn on_iteration(&mut self, score: f64, minimum: f64, statistics: &AnnealStatistics);

    /// Called after a move was accepted.
    fn on_move_accepted(&mut self, kind: &'static str, delta: f64, statistics: &AnnealStatistics);

    /// Called once with the final outcome.
    fn on_end(&mut self, outcome: &AnnealOutcome);

    /// Determines the command for the next iteration.
    fn search_command(&mut self, _statistics: &AnnealStatistics) -> SearchCommand {
        SearchCommand::Continue
    }
}

impl<M> AnnealMonitor for &mut M
where
    M: AnnealMonitor + ?Sized,
{
    fn name(&self) -> &str {
        (**self).name()
    }

    fn on_start(&mut self, score: f64, minimum: f64) {
        (**self).on_start(score, minimum)
    }

    fn on_iteration(&mut self, score: f64, minimum: f64, statistics: &AnnealStatistics) {
        (**self).on_iteration(score, minimum, statistics)
    }

    fn on_move_accepted(&mut self, kind: &'static str, delta: f64, statistics: &AnnealStatistics) {
        (**self).on_move_accepted(kind, delta, statistics)
    }

    fn on_end(&mut self, outcome: &AnnealOutcome) {
        (**self).on_end(outcome)
    }

    fn search_command(&mut self, statistics: &AnnealStatistics) -> SearchCommand {
        (**self).search_command(statistics)
    }
}

impl std::fmt::Debug for dyn AnnealMonitor + '_ {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AnnealMonitor {{ name: {} }}", self.name())
    }
}

impl std::fmt::Display for dyn AnnealMonitor + '_ {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AnnealMonitor: {}", self.name())
    }
}

/// A monitor that observes nothing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoOpMonitor;

impl AnnealMonitor for NoOpMonitor {
    fn name(&self) -> &str {
        "NoOpMonitor"
    }

    fn on_start(&mut self, _score: f64, _minimum: f64) {}

    fn on_iteration(&mut self, _score: f64, _minimum: f64, _statistics: &AnnealStatistics) {}

    fn on_move_accepted(
        &mut self,
        _kind: &'static str,
        _delta: f64,
        _statistics: &AnnealStatistics,
    ) {
    }

    fn on_end(&mut self, _outcome: &AnnealOutcome) {}
}
