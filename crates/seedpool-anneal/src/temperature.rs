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

//! Temperature schedules.
//!
//! The annealing loop accepts a worsening move of size `delta` with
//! probability `exp(-tau * delta)`, where `tau` is read from the schedule at
//! the current iteration. `tau` is an inverse temperature: it rises over the
//! run, so the search moves from exploration to strict descent.
//!
//! A schedule is described by a [`TemperatureSpec`] and resolved against the
//! iteration cap:
//!
//! - `Default`: `max_iters` values log-spaced from `10^0` to `10^4`.
//! - `MaxExponent(b)`: log-spaced from `10^0` to `10^b`.
//! - `Exponents(a, b)`: log-spaced from `10^a` to `10^b`.
//! - `Values(v)`: the values themselves. Fewer values than iterations are
//!   resampled log-spaced between the first and the last value; surplus
//!   values are left unused. Both cases log a warning.

use crate::error::AnnealError;

#[derive(Debug, Clone, Default, PartialEq)]
pub enum TemperatureSpec {
    #[default]
    Default,
    MaxExponent(f64),
    Exponents(f64, f64),
    Values(Vec<f64>),
}

/// `n` values spaced evenly on a log scale from `10^start` to `10^stop`.
pub fn logspace(start: f64, stop: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![10f64.powf(start)],
        _ => {
            let step = (stop - start) / (n - 1) as f64;
            (0..n)
                .map(|i| 10f64.powf(start + step * i as f64))
                .collect()
        }
    }
}

/// A validated, strictly increasing sequence of positive `tau` values.
#[derive(Debug, Clone, PartialEq)]
pub struct TemperatureSchedule {
    values: Vec<f64>,
}

impl TemperatureSchedule {
    /// Resolves `spec` for a run of `iterations` steps.
    ///
    /// # Errors
    ///
    /// Returns an error if the resolved values are empty while iterations
    /// are requested, contain a non-positive value, do not start strictly
    /// below their end, or are not strictly increasing.
    pub fn resolve(spec: &TemperatureSpec, iterations: usize) -> Result<Self, AnnealError> {
        let values = match spec {
            TemperatureSpec::Default => logspace(0.0, 4.0, iterations),
            TemperatureSpec::MaxExponent(stop) => logspace(0.0, *stop, iterations),
            TemperatureSpec::Exponents(start, stop) => logspace(*start, *stop, iterations),
            TemperatureSpec::Values(values) => {
                if let Some(&bad) = values.iter().find(|&&v| v <= 0.0 || v.is_nan()) {
                    return Err(AnnealError::NonPositiveTemperature(bad));
                }
                match (values.first(), values.last()) {
                    (Some(&first), Some(&last)) if values.len() < iterations => {
                        tracing::warn!(
                            given = values.len(),
                            iterations,
                            "fewer temperature values than iterations, resampling"
                        );
                        logspace(first.log10(), last.log10(), iterations)
                    }
                    _ => {
                        if values.len() > iterations {
                            tracing::warn!(
                                unused = values.len() - iterations,
                                "more temperature values than iterations, the last ones stay unused"
                            );
                        }
                        values.clone()
                    }
                }
            }
        };
        Self::validate(&values, iterations)?;
        Ok(Self { values })
    }

    fn validate(values: &[f64], iterations: usize) -> Result<(), AnnealError> {
        if values.is_empty() {
            return if iterations == 0 {
                Ok(())
            } else {
                Err(AnnealError::EmptyTemperature)
            };
        }
        if let Some(&bad) = values.iter().find(|&&v| v <= 0.0 || v.is_nan()) {
            return Err(AnnealError::NonPositiveTemperature(bad));
        }
        if values.len() > 1 {
            let (first, last) = (values[0], values[values.len() - 1]);
            if first >= last {
                return Err(AnnealError::TemperatureNotRising { first, last });
            }
            if let Some(at) = values.windows(2).position(|w| w[0] >= w[1]) {
                return Err(AnnealError::TemperatureNotMonotonic(at + 1));
            }
        }
        Ok(())
    }

    /// `tau` at `iteration`; the last value holds beyond the end.
    #[inline]
    pub fn at(&self, iteration: u64) -> f64 {
        let i = usize::try_from(iteration).unwrap_or(usize::MAX);
        self.values
            .get(i)
            .or_else(|| self.values.last())
            .copied()
            .unwrap_or(1.0)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[inline]
    pub fn values(&self) -> &[f64] {
        &self.values
    }
}
