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

use crate::{
    monitor::anneal_monitor::{AnnealMonitor, SearchCommand},
    result::AnnealOutcome,
    stats::AnnealStatistics,
};

/// Fans every callback out to a list of monitors.
#[derive(Default)]
pub struct CompositeAnnealMonitor<'a> {
    monitors: Vec<Box<dyn AnnealMonitor + 'a>>,
}

impl<'a> CompositeAnnealMonitor<'a> {
    #[inline]
    pub fn new() -> Self {
        Self {
            monitors: Vec::new(),
        }
    }

    #[inline]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            monitors: Vec::with_capacity(capacity),
        }
    }

    #[inline]
    pub fn add_monitor<M>(&mut self, monitor: M)
    where
        M: AnnealMonitor + 'a,
    {
        self.monitors.push(Box::new(monitor));
    }

    #[inline]
    pub fn add_boxed_monitor(&mut self, monitor: Box<dyn AnnealMonitor + 'a>) {
        self.monitors.push(monitor);
    }

    #[inline]
    pub fn monitors(&self) -> &[Box<dyn AnnealMonitor + 'a>] {
        &self.monitors
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.monitors.is_empty()
    }
}

impl std::fmt::Debug for CompositeAnnealMonitor<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.monitors.iter()).finish()
    }
}

impl AnnealMonitor for CompositeAnnealMonitor<'_> {
    fn name(&self) -> &str {
        "CompositeAnnealMonitor"
    }

    fn on_start(&mut self, score: f64, minimum: f64) {
        for m in &mut self.monitors {
            m.on_start(score, minimum);
        }
    }

    fn on_iteration(&mut self, score: f64, minimum: f64, statistics: &AnnealStatistics) {
        for m in &mut self.monitors {
            m.on_iteration(score, minimum, statistics);
        }
    }

    fn on_move_accepted(&mut self, kind: &'static str, delta: f64, statistics: &AnnealStatistics) {
        for m in &mut self.monitors {
            m.on_move_accepted(kind, delta, statistics);
        }
    }

    fn on_end(&mut self, outcome: &AnnealOutcome) {
        for m in &mut self.monitors {
            m.on_end(outcome);
        }
    }

    fn search_command(&mut self, statistics: &AnnealStatistics) -> SearchCommand {
        for m in &mut self.monitors {
            match m.search_command(statistics) {
                SearchCommand::Continue => continue,
                // First terminate request wins, in insertion order.
                SearchCommand::Terminate(msg) => return SearchCommand::Terminate(msg),
            }
        }
        SearchCommand::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StopAt {
        name: &'static str,
        at: u64,
    }

    impl AnnealMonitor for StopAt {
        fn name(&self) -> &str {
            self.name
        }
        fn on_start(&mut self, _score: f64, _minimum: f64) {}
        fn on_iteration(&mut self, _score: f64, _minimum: f64, _statistics: &AnnealStatistics) {}
        fn on_move_accepted(&mut self, _kind: &'static str, _delta: f64, _s: &AnnealStatistics) {}
        fn on_end(&mut self, _outcome: &AnnealOutcome) {}
        fn search_command(&mut self, statistics: &AnnealStatistics) -> SearchCommand {
            if statistics.iterations >= self.at {
                SearchCommand::Terminate(self.name.to_string())
            } else {
                SearchCommand::Continue
            }
        }
    }

    #[test]
    fn test_first_terminate_wins() {
        let mut composite = CompositeAnnealMonitor::with_capacity(3);
        composite.add_monitor(StopAt { name: "late", at: 10 });
        composite.add_monitor(StopAt { name: "early", at: 5 });
        composite.add_monitor(StopAt { name: "also", at: 5 });

        let mut stats = AnnealStatistics::default();
        assert_eq!(composite.search_command(&stats), SearchCommand::Continue);
        stats.iterations = 7;
        assert_eq!(
            composite.search_command(&stats),
            SearchCommand::Terminate("early".to_string())
        );
        stats.iterations = 12;
        assert_eq!(
            composite.search_command(&stats),
            SearchCommand::Terminate("late".to_string())
        );
    }

    #[test]
    fn test_empty_composite_continues() {
        let mut composite = CompositeAnnealMonitor::new();
        assert!(composite.is_empty());
        assert_eq!(
            composite.search_command(&AnnealStatistics::default()),
            SearchCommand::Continue
        );
        assert_eq!(composite.name(), "CompositeAnnealMonitor");
    }
}
