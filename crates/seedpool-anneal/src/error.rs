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

use seedpool_cost::error::CostError;
use seedpool_model::error::ModelError;
use thiserror::Error;

/// Errors raised before an optimizer starts searching.
#[derive(Debug, Error)]
pub enum AnnealError {
    #[error("temperature schedule is empty")]
    EmptyTemperature,

    #[error("first temperature value {first} is not strictly below the last value {last}")]
    TemperatureNotRising { first: f64, last: f64 },

    #[error("temperature values are not strictly increasing at position {0}")]
    TemperatureNotMonotonic(usize),

    #[error("temperature values must be positive, found {0}")]
    NonPositiveTemperature(f64),

    #[error("unknown reorder method `{0}`")]
    UnknownReorderMethod(String),

    #[error("reorder method for event `{event}` is not a legal reordering: {reason}")]
    IllegalReorder { event: String, reason: String },

    #[error("cannot pre-assign pools of seeded event `{event}` (entry `{entry}` holds `{pool}`)")]
    PreassignedSeededPool {
        event: String,
        entry: String,
        pool: String,
    },

    #[error("seed values of event `{event}` must be positive, entry `{entry}` has {value}")]
    NonPositiveValue {
        event: String,
        entry: String,
        value: f64,
    },

    #[error("event `{0}` is not part of the problem")]
    UnknownEvent(String),

    #[error(transparent)]
    Cost(#[from] CostError),

    #[error(transparent)]
    Model(#[from] ModelError),
}
