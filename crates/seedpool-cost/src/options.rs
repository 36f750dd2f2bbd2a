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

//! Options of the cost model.
//!
//! `CostOptions` carries the defaults every event inherits; an `EventSpec`
//! may override the distribution and bracket modes for its own event.

use crate::error::CostError;
use std::str::FromStr;

/// How many phases of an event are scored for distribution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum DistributionMode {
    /// No distribution cost.
    None,
    /// The first phase, when it has more than one pool.
    #[default]
    First,
    /// As many leading phases as the event has phases with more than one pool.
    Max,
}

impl FromStr for DistributionMode {
    type Err = CostError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "first" => Ok(Self::First),
            "max" => Ok(Self::Max),
            _ => Err(CostError::UnknownMode {
                kind: "distribution",
                value: s.to_string(),
            }),
        }
    }
}

/// Which tiers of the last scored phase add folded bracket levels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum BracketMode {
    #[default]
    None,
    /// Tiers with a positive value only.
    Ranked,
    /// Every tier.
    All,
}

impl BracketMode {
    /// Returns `true` if a tier starting at `value` is bracket-accounted.
    #[inline]
    pub fn applies_to(self, value: f64) -> bool {
        match self {
            BracketMode::None => false,
            BracketMode::Ranked => value > 0.0,
            BracketMode::All => true,
        }
    }
}

impl FromStr for BracketMode {
    type Err = CostError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "ranked" => Ok(Self::Ranked),
            "all" => Ok(Self::All),
            _ => Err(CostError::UnknownMode {
                kind: "bracket",
                value: s.to_string(),
            }),
        }
    }
}

/// How a row's schedule cost treats its open signups.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ScheduleMode {
    /// Only placed signups count; open signups occupy nothing.
    #[default]
    Actual,
    /// Placed signups are kept and open signups are completed greedily.
    Completed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CostOptions {
    /// `scm`: weight of an internal double booking.
    pub schedule_conflict_weight: f64,
    /// `xcm`: weight of an occupancy of an unavailable block.
    pub external_conflict_weight: f64,
    /// Separator of a row's unavailable blocks; one block per character when unset.
    pub external_separator: Option<char>,
    /// Preferred wave order of the greedy schedule minimum.
    pub wave_order: Option<Vec<String>>,
    pub distribution: DistributionMode,
    pub bracket: BracketMode,
    /// Place cells are scored only below this share of their phase's entrants.
    pub location_threshold: f64,
    pub skip_schedule: bool,
    pub schedule_mode: ScheduleMode,
}

impl Default for CostOptions {
    fn default() -> Self {
        Self {
            schedule_conflict_weight: 2.0,
            external_conflict_weight: 8.0,
            external_separator: None,
            wave_order: None,
            distribution: DistributionMode::First,
            bracket: BracketMode::None,
            location_threshold: 1.0,
            skip_schedule: false,
            schedule_mode: ScheduleMode::Actual,
        }
    }
}

impl CostOptions {
    #[inline]
    pub fn with_schedule_conflict_weight(mut self, weight: f64) -> Self {
        self.schedule_conflict_weight = weight;
        self
    }

    #[inline]
    pub fn with_external_conflict_weight(mut self, weight: f64) -> Self {
        self.external_conflict_weight = weight;
        self
    }

    #[inline]
    pub fn with_external_separator(mut self, separator: char) -> Self {
        self.external_separator = Some(separator);
        self
    }

    pub fn with_wave_order<I, S>(mut self, waves: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.wave_order = Some(waves.into_iter().map(Into::into).collect());
        self
    }

    #[inline]
    pub fn with_distribution(mut self, mode: DistributionMode) -> Self {
        self.distribution = mode;
        self
    }

    #[inline]
    pub fn with_bracket(mut self, mode: BracketMode) -> Self {
        self.bracket = mode;
        self
    }

    #[inline]
    pub fn with_location_threshold(mut self, threshold: f64) -> Self {
        self.location_threshold = threshold;
        self
    }

    #[inline]
    pub fn with_skip_schedule(mut self, skip: bool) -> Self {
        self.skip_schedule = skip;
        self
    }

    #[inline]
    pub fn with_schedule_mode(mut self, mode: ScheduleMode) -> Self {
        self.schedule_mode = mode;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = CostOptions::default();
        assert_eq!(options.schedule_conflict_weight, 2.0);
        assert_eq!(options.external_conflict_weight, 8.0);
        assert_eq!(options.location_threshold, 1.0);
        assert_eq!(options.distribution, DistributionMode::First);
        assert_eq!(options.bracket, BracketMode::None);
        assert_eq!(options.schedule_mode, ScheduleMode::Actual);
    }

    #[test]
    fn test_modes_parse_case_insensitively() {
        assert_eq!("MAX".parse::<DistributionMode>().unwrap(), DistributionMode::Max);
        assert_eq!("ranked".parse::<BracketMode>().unwrap(), BracketMode::Ranked);
        assert!("half".parse::<BracketMode>().is_err());
    }

    #[test]
    fn test_bracket_mode_applies_to_tiers() {
        assert!(!BracketMode::None.applies_to(3.0));
        assert!(!BracketMode::Ranked.applies_to(0.0));
        assert!(BracketMode::Ranked.applies_to(0.5));
        assert!(BracketMode::All.applies_to(0.0));
    }
}
