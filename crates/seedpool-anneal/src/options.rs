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

//! Options shared by every optimizer.

use crate::{
    engine::AnnealEngine,
    error::AnnealError,
    monitor::{
        anneal_monitor::AnnealMonitor, composite::CompositeAnnealMonitor,
        progress::ProgressMonitor,
    },
    temperature::{TemperatureSchedule, TemperatureSpec},
};

#[derive(Debug, Clone, PartialEq)]
pub struct AnnealOptions {
    /// Iteration cap; each optimizer has its own size-proportional default.
    pub max_iters: Option<u64>,
    /// Progress is logged every this many iterations when set.
    pub iter_check: Option<u64>,
    /// The search stops once the score is this close to the minimum.
    pub tolerance: f64,
    pub temperature: TemperatureSpec,
}

impl Default for AnnealOptions {
    fn default() -> Self {
        Self {
            max_iters: None,
            iter_check: None,
            tolerance: 0.0,
            temperature: TemperatureSpec::Default,
        }
    }
}

impl AnnealOptions {
    #[inline]
    pub fn with_max_iters(mut self, max_iters: u64) -> Self {
        self.max_iters = Some(max_iters);
        self
    }

    #[inline]
    pub fn with_iter_check(mut self, every: u64) -> Self {
        self.iter_check = Some(every);
        self
    }

    #[inline]
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    #[inline]
    pub fn with_temperature(mut self, temperature: TemperatureSpec) -> Self {
        self.temperature = temperature;
        self
    }

    /// Builds the engine, capping at `max_iters` or else at `default_iters`.
    ///
    /// # Errors
    ///
    /// Returns an error if the temperature schedule is malformed.
    pub fn engine(&self, default_iters: u64) -> Result<AnnealEngine, AnnealError> {
        let max_iters = self.max_iters.unwrap_or(default_iters);
        let length = usize::try_from(max_iters).unwrap_or(usize::MAX);
        let schedule = TemperatureSchedule::resolve(&self.temperature, length)?;
        Ok(AnnealEngine::new(schedule, max_iters, self.tolerance))
    }

    /// `monitor`, preceded by a [`ProgressMonitor`] when `iter_check` is set.
    pub fn monitors<'a, M>(&self, monitor: &'a mut M) -> CompositeAnnealMonitor<'a>
    where
        M: AnnealMonitor + ?Sized,
    {
        let mut composite = CompositeAnnealMonitor::with_capacity(2);
        if let Some(every) = self.iter_check {
            composite.add_monitor(ProgressMonitor::new(every));
        }
        composite.add_monitor(monitor);
        composite
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = AnnealOptions::default();
        assert_eq!(options.max_iters, None);
        assert_eq!(options.tolerance, 0.0);
        assert_eq!(options.temperature, TemperatureSpec::Default);
    }

    #[test]
    fn test_engine_uses_default_cap_unless_set() {
        let engine = AnnealOptions::default().engine(40).unwrap();
        assert_eq!(engine.max_iters(), 40);
        assert_eq!(engine.schedule().len(), 40);

        let engine = AnnealOptions::default()
            .with_max_iters(8)
            .with_tolerance(0.5)
            .engine(40)
            .unwrap();
        assert_eq!(engine.max_iters(), 8);
        assert_eq!(engine.tolerance(), 0.5);
    }

    #[test]
    fn test_monitors_add_progress_on_iter_check() {
        let mut inner = crate::monitor::anneal_monitor::NoOpMonitor;
        assert_eq!(AnnealOptions::default().monitors(&mut inner).monitors().len(), 1);
        let options = AnnealOptions::default().with_iter_check(100);
        let composite = options.monitors(&mut inner);
        assert_eq!(composite.monitors().len(), 2);
        assert_eq!(composite.monitors()[0].name(), "ProgressMonitor");
    }

    #[test]
    fn test_engine_rejects_falling_schedule() {
        let options = AnnealOptions::default()
            .with_temperature(TemperatureSpec::Values(vec![10.0, 5.0, 1.0]));
        assert!(matches!(
            options.engine(3),
            Err(AnnealError::TemperatureNotRising { .. })
        ));
    }
}
