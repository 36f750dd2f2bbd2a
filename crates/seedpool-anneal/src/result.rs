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

//! Search outcome and termination reporting.

use crate::stats::AnnealStatistics;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AnnealTerminationReason {
    /// The score came within the tolerance of the lower bound.
    Converged,

    /// The iteration cap was reached first.
    IterationLimit,

    /// The problem had no move left to propose.
    Exhausted,

    /// A monitor stopped the search; the string says why.
    Aborted(String),
}

impl std::fmt::Display for AnnealTerminationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnnealTerminationReason::Converged => write!(f, "Converged"),
            AnnealTerminationReason::IterationLimit => write!(f, "Iteration Limit Reached"),
            AnnealTerminationReason::Exhausted => write!(f, "No Moves Available"),
            AnnealTerminationReason::Aborted(msg) => write!(f, "Aborted: {}", msg),
        }
    }
}

/// Final score, lower bound and statistics of one run.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnealOutcome {
    termination_reason: AnnealTerminationReason,
    score: f64,
    minimum: f64,
    statistics: AnnealStatistics,
}

impl AnnealOutcome {
    #[inline]
    pub fn new(
        termination_reason: AnnealTerminationReason,
        score: f64,
        minimum: f64,
        statistics: AnnealStatistics,
    ) -> Self {
        Self {
            termination_reason,
            score,
            minimum,
            statistics,
        }
    }

    /// An outcome for a problem that needed no search at all.
    #[inline]
    pub fn settled(score: f64, minimum: f64) -> Self {
        Self::new(
            AnnealTerminationReason::Converged,
            score,
            minimum,
            AnnealStatistics::default(),
        )
    }

    #[inline]
    pub fn termination_reason(&self) -> &AnnealTerminationReason {
        &self.termination_reason
    }

    /// Score of the final state.
    #[inline]
    pub fn score(&self) -> f64 {
        self.score
    }

    /// Lower bound the search was measured against.
    #[inline]
    pub fn minimum(&self) -> f64 {
        self.minimum
    }

    /// Distance of the final score from the lower bound.
    #[inline]
    pub fn gap(&self) -> f64 {
        self.score - self.minimum
    }

    #[inline]
    pub fn statistics(&self) -> &AnnealStatistics {
        &self.statistics
    }

    #[inline]
    pub fn is_converged(&self) -> bool {
        self.termination_reason == AnnealTerminationReason::Converged
    }
}

impl std::fmt::Display for AnnealOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} after {} iterations: score {:.4}, minimum {:.4}",
            self.termination_reason, self.statistics.iterations, self.score, self.minimum
        )
    }
}
