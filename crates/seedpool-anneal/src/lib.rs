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

//! Seedpool-Anneal: simulated annealing for pool, seed and bracket assignment
//!
//! Three optimizers share one annealing engine and the cost model of
//! `seedpool_cost`:
//!
//! - `pools::PoolAssigner` places open entrants into pools.
//! - `seeds::SeedPoolAssigner` seeds key events and places the seeded
//!   entrants into pools through a seed-to-pool map and a pool order.
//! - `bracket::BracketSeeder` seeds one event for a single elimination
//!   bracket.
//!
//! Core flow
//! - Build an optimizer, configure `options::AnnealOptions` and the cost
//!   options, then `run` it on an `EntryTable` with an injected `Rng`.
//! - Input problems are validated before any search starts.
//! - The engine proposes a move, the problem applies it tentatively through
//!   its `ScoreBoard` and reports the exact score change, and the Metropolis
//!   rule keeps it or rolls it back.
//! - The search stops once the score is within tolerance of the lower
//!   bound, or at the iteration cap, or when a monitor asks it to.
//!
//! Module map
//! - `engine`: the annealing loop and the `AnnealProblem` trait.
//! - `temperature`: inverse temperature schedules.
//! - `metropolis`: the acceptance rule.
//! - `sampler`: weighted choice of events, value groups and move kinds.
//! - `reorder`: legal rewrites of a pool order.
//! - `monitor`: observers that may stop a search.
//! - `result`, `stats`: outcomes with termination reasons and counters.

pub mod bracket;
pub mod engine;
pub mod error;
pub mod metropolis;
pub mod monitor;
pub mod options;
pub mod pools;
pub mod reorder;
pub mod result;
pub mod sampler;
pub mod seeds;
pub mod stats;
pub mod temperature;
