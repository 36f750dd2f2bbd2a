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

//! The annealing loop.
//!
//! The engine drives any [`AnnealProblem`]: it asks the problem for a
//! candidate move and its score change, draws the Metropolis decision with
//! the `tau` of the current iteration, and tells the problem to keep or
//! take back the move. The problem owns its state and the undo log; the
//! engine only sees scores.
//!
//! A run stops when the score comes within `tolerance` of the problem's
//! lower bound, when the iteration cap is reached, when the problem has no
//! move left to offer, or when the monitor asks for it.

use crate::{
    metropolis::metropolis,
    monitor::anneal_monitor::{AnnealMonitor, SearchCommand},
    result::{AnnealOutcome, AnnealTerminationReason},
    stats::AnnealStatistics,
    temperature::TemperatureSchedule,
};
use rand::Rng;
use std::time::Instant;

/// Slack added to the tolerance so that float noise in the incremental
/// score does not keep a converged run going.
pub const CONVERGENCE_EPSILON: f64 = 1e-7;

/// A candidate move handed to the engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Proposal {
    /// Move kind, counted in the statistics.
    pub kind: &'static str,
    /// Change of the score if the move is kept.
    pub delta: f64,
}

impl Proposal {
    #[inline]
    pub fn new(kind: &'static str, delta: f64) -> Self {
        Self { kind, delta }
    }
}

/// A problem the engine can anneal.
///
/// After `propose` returns `Some`, the move is applied tentatively and the
/// engine calls exactly one of `accept` or `reject` before proposing again.
pub trait AnnealProblem {
    /// Score of the current state.
    fn score(&self) -> f64;

    /// Lower bound of the score.
    fn minimum(&self) -> f64;

    /// Applies a random move tentatively, or returns `None` if no move exists.
    fn propose<R>(&mut self, rng: &mut R) -> Option<Proposal>
    where
        R: Rng + ?Sized;

    /// Keeps the proposed move.
    fn accept(&mut self);

    /// Takes the proposed move back.
    fn reject(&mut self);
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnnealEngine {
    schedule: TemperatureSchedule,
    max_iters: u64,
    tolerance: f64,
}

impl AnnealEngine {
    #[inline]
    pub fn new(schedule: TemperatureSchedule, max_iters: u64, tolerance: f64) -> Self {
        Self {
            schedule,
            max_iters,
            tolerance,
        }
    }

    #[inline]
    pub fn schedule(&self) -> &TemperatureSchedule {
        &self.schedule
    }

    #[inline]
    pub fn max_iters(&self) -> u64 {
        self.max_iters
    }

    #[inline]
    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Returns `true` once `score` is within the tolerance of `minimum`.
    #[inline]
    pub fn is_converged(&self, score: f64, minimum: f64) -> bool {
        score - minimum <= self.tolerance + CONVERGENCE_EPSILON
    }

    /// Anneals `problem` until one of the stopping conditions holds and
    /// leaves it in its final state.
    pub fn run<P, M, R>(&self, problem: &mut P, monitor: &mut M, rng: &mut R) -> AnnealOutcome
    where
        P: AnnealProblem,
        M: AnnealMonitor + ?Sized,
        R: Rng + ?Sized,
    {
        let start_time = Instant::now();
        let mut stats = AnnealStatistics::default();
        let minimum = problem.minimum();

        monitor.on_start(problem.score(), minimum);

        let termination_reason = loop {
            if self.is_converged(problem.score(), minimum) {
                break AnnealTerminationReason::Converged;
            }
            if stats.iterations >= self.max_iters {
                break AnnealTerminationReason::IterationLimit;
            }
            if let SearchCommand::Terminate(reason) = monitor.search_command(&stats) {
                break AnnealTerminationReason::Aborted(reason);
            }

            monitor.on_iteration(problem.score(), minimum, &stats);

            let Some(proposal) = problem.propose(rng) else {
                break AnnealTerminationReason::Exhausted;
            };
            stats.on_proposed_move();

            let tau = self.schedule.at(stats.iterations);
            if metropolis(proposal.delta, tau, rng) {
                problem.accept();
                stats.on_accepted_move(proposal.kind);
                monitor.on_move_accepted(proposal.kind, proposal.delta, &stats);
            } else {
                let before = problem.score();
                problem.reject();
                debug_assert!(
                    (problem.score() - before + proposal.delta).abs() <= 1e-6 * (1.0 + before.abs())
                        || proposal.delta == 0.0
                        || !proposal.delta.is_finite(),
                    "called `AnnealEngine::run` with a problem whose rejection does not restore the score: before {}, after {}, delta {}",
                    before,
                    problem.score(),
                    proposal.delta
                );
            }

            stats.on_iteration();
        };

        stats.set_total_time(start_time.elapsed());
        let outcome = AnnealOutcome::new(termination_reason, problem.score(), minimum, stats);
        monitor.on_end(&outcome);
        outcome
    }
}
