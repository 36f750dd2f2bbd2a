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

//! # Seedpool Core
//!
//! Foundational primitives for the seedpool tournament assignment workspace.
//! Nothing in here knows about entries tables or optimizers; these are the
//! small, exact building blocks the higher crates lean on.
//!
//! ## Modules
//!
//! - `utils`: phantom-tagged, strongly typed indices (`TypedIndex<T>`).
//! - `pool`: decomposition of pool identifiers such as `"A301"` into a wave
//!   (`"A"`) and a station (`301`), plus per-competitor block tallies.
//! - `bracket`: single-elimination seeding math (`seed_order`,
//!   `reverse_seed_map`, `bracket_sections`) and list conversions between
//!   sequential bracket lines and seed order.
//! - `math`: population standard deviation, bracket folding and optimal
//!   weight partitions used by the distribution cost.

pub mod bracket;
pub mod math;
pub mod pool;
pub mod utils;
