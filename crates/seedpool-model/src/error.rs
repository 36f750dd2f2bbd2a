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

use thiserror::Error;

/// Errors raised while validating or deriving model data.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("non-unique primary key `{0}`")]
    DuplicateKey(String),

    #[error("members of entry `{entry}` in event `{event}` have dissimilar assignments")]
    DissimilarAssignments { event: String, entry: String },

    #[error("pool `{pool}` of event `{event}` has no transition out of phase {phase}")]
    IncompleteTransition {
        event: String,
        phase: usize,
        pool: String,
    },

    #[error("event `{0}` has no pools")]
    NoPools(String),

    #[error("schedule has no header row")]
    EmptySchedule,

    #[error("cannot remove station {station} of block `{block}` from event `{event}`: it is not scheduled")]
    MissingStation {
        event: String,
        block: String,
        station: i64,
    },

    #[error("unknown uniform length `{0}`, expected `none`, `event` or `all`")]
    UnknownUniformLength(String),

    #[error("failed to read schedule: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to open schedule: {0}")]
    Io(#[from] std::io::Error),
}
