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

use seedpool_model::error::ModelError;
use thiserror::Error;

/// Errors raised while compiling a cost layout.
#[derive(Debug, Error)]
pub enum CostError {
    #[error("pool `{pool}` is not part of event `{event}`")]
    UnknownPool { event: String, pool: String },

    #[error("seed {seed} of event `{event}` is outside 1..={positions}")]
    SeedOutOfRange {
        event: String,
        seed: usize,
        positions: usize,
    },

    #[error("unknown {kind} mode `{value}`")]
    UnknownMode { kind: &'static str, value: String },

    #[error("event `{0}` has no buckets")]
    NoBuckets(String),

    #[error(transparent)]
    Model(#[from] ModelError),
}
