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

//! # Seedpool Cost
//!
//! The cost model shared by every optimizer. A candidate assignment is
//! scored by two families of cost:
//!
//! - **Schedule cost**, per competitor row: a block occupied `c > 1` times
//!   costs `scm * (c! - 1)`, and every occupancy of a block the row listed
//!   as unavailable costs `xcm`.
//! - **Distribution cost**, per cell: the population standard deviation of
//!   weighted entrant counts over the pools of one phase, restricted to a
//!   value tier and optionally to one location's place, plus the deviation
//!   of every folded bracket level when bracket accounting applies.
//!
//! Both families have a lower bound computed once: a greedy schedule
//! construction per row and an optimal weight partition per cell.
//!
//! ## Modules
//!
//! - `options`: `CostOptions` and the accounting modes.
//! - `order`: `PoolOrder`, the mapping from pools to bucket positions.
//! - `schedule`: schedule cost of a block tally and the greedy minimum.
//! - `distribution`: cell cost and cell minimum.
//! - `layout`: `Layout`, the compiled, index-addressed form of a problem,
//!   and its from-scratch evaluation.
//! - `board`: `ScoreBoard`, the mutable assignment with cached costs and
//!   incremental re-scoring.
//! - `undo`: the log that rolls a rejected move back.
//! - `analyze`: read-only conflict and suboptimality reports.

pub mod analyze;
pub mod board;
pub mod distribution;
pub mod error;
pub mod layout;
pub mod options;
pub mod order;
pub mod schedule;
pub mod undo;
