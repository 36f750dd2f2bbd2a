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

//! # Cost Layout
//!
//! `Layout` compiles a table and a set of event descriptions into dense,
//! index-addressed plans so that scoring never touches strings:
//!
//! - Every event exposes a list of *options*. For a pool event these are
//!   its entry pools: the phase-0 pools first (the only options an open
//!   entrant can be given), then pools that are entered directly at a later
//!   phase. For a seed event the options are the seeds `1..=N`.
//! - Per phase, every option resolves to a bucket (its position in pool
//!   order) and to a wave.
//! - A *decision* is the option an entrant currently holds, `None` while
//!   the entrant is open. Decisions are stored flattened, event by event.
//! - Cells are static. Which entrants belong to a cell, with which weight,
//!   is fixed at compile time; only the buckets they land in move.
//!
//! Open entrants count towards cell minima but add nothing to bucket counts
//! and occupy no blocks in [`ScheduleMode::Actual`].
//!
//! [`Layout::evaluate`] scores a decision vector from scratch. The
//! incremental [`ScoreBoard`](crate::board::ScoreBoard) must always agree
//! with it.

use crate::{
    distribution::{cell_cost, cell_minimum, tiers, CellKey},
    error::CostError,
    options::{BracketMode, CostOptions, DistributionMode, ScheduleMode},
    order::PoolOrder,
    schedule::{ScheduleWeights, WaveBook, WaveId, WaveRow},
};
use seedpool_core::pool::{pool_wave, BlockTally};
use seedpool_model::{
    index::{EntrantIndex, EventIndex, RowIndex},
    location::{Location, Place},
    phase::PhaseChain,
    roster::Roster,
    table::{EntryTable, Slot},
};
use smallvec::SmallVec;
use std::collections::BTreeMap;

/// What an event assigns its entrants to.
#[derive(Debug, Clone)]
pub enum Stage {
    /// Pools, possibly chained over several phases.
    Pools { chain: PhaseChain, order: PoolOrder },
    /// Seeds `1..=buckets.len()`; seed `s` lands in bucket `buckets[s - 1]`.
    Seeds { buckets: Vec<usize> },
}

impl Stage {
    /// Option labels: entry pools, or seed numbers.
    fn option_labels(&self) -> Vec<String> {
        match self {
            Stage::Pools { chain, .. } => entry_options(chain)
                .into_iter()
                .map(|(phase, pos)| chain.phase_pools(phase)[pos].clone())
                .collect(),
            Stage::Seeds { buckets } => (1..=buckets.len()).map(|s| s.to_string()).collect(),
        }
    }

    fn assignable(&self) -> usize {
        match self {
            Stage::Pools { chain, .. } => chain.pools().len(),
            Stage::Seeds { buckets } => buckets.len(),
        }
    }
}

/// Phase and position of every option of a chain: phase-0 pools, then pools
/// first entered at a later phase.
fn entry_options(chain: &PhaseChain) -> Vec<(usize, usize)> {
    let mut options: Vec<(usize, usize)> = (0..chain.pools().len()).map(|i| (0, i)).collect();
    for phase in 1..chain.num_phases() {
        for (pos, pool) in chain.phase_pools(phase).iter().enumerate() {
            if chain.entry_point(pool) == Some((phase, pos)) {
                options.push((phase, pos));
            }
        }
    }
    options
}

/// One entrant as handed to [`Layout::compile`].
#[derive(Debug, Clone, PartialEq)]
pub struct EntrantSpec {
    pub key: String,
    pub members: Vec<RowIndex>,
    /// Total weight, shared evenly by the members. Entrants without member
    /// rows still count with their full weight in whole-event cells.
    pub weight: f64,
    /// Tier value.
    pub value: f64,
    /// Initial option, `None` while open.
    pub decision: Option<usize>,
    /// Whether the entrant takes part in distribution cells.
    pub distributed: bool,
}

/// One event as handed to [`Layout::compile`].
#[derive(Debug, Clone)]
pub struct EventSpec {
    pub name: String,
    pub stage: Stage,
    pub entrants: Vec<EntrantSpec>,
    /// Whether the event's waves count towards schedule cost.
    pub schedule: bool,
    /// Whether cells are split into value tiers.
    pub tiers: bool,
    /// Overrides [`CostOptions::distribution`].
    pub distribution: Option<DistributionMode>,
    /// Overrides [`CostOptions::bracket`].
    pub bracket: Option<BracketMode>,
}

impl EventSpec {
    /// A pool event over `roster`, decisions taken from the entrants' slots.
    ///
    /// # Errors
    ///
    /// Returns [`CostError::UnknownPool`] if an entrant holds a pool the
    /// chain does not contain.
    pub fn pools(roster: &Roster, chain: PhaseChain) -> Result<Self, CostError> {
        let stage = Stage::Pools {
            chain,
            order: PoolOrder::Lexical,
        };
        let labels = stage.option_labels();
        let entrants = roster
            .entrants()
            .iter()
            .map(|entrant| {
                let decision = match entrant.slot() {
                    Slot::Open => None,
                    Slot::Pool(pool) => Some(labels.iter().position(|l| l == pool).ok_or_else(
                        || CostError::UnknownPool {
                            event: roster.event().to_string(),
                            pool: pool.clone(),
                        },
                    )?),
                };
                Ok(EntrantSpec {
                    key: entrant.key().to_string(),
                    members: entrant.members().to_vec(),
                    weight: 1.0,
                    value: entrant.filled_value(),
                    decision,
                    distributed: true,
                })
            })
            .collect::<Result<Vec<_>, CostError>>()?;

        Ok(Self {
            name: roster.event().to_string(),
            stage,
            entrants,
            schedule: true,
            tiers: true,
            distribution: None,
            bracket: None,
        })
    }

    /// A seed event; seed `s` of an entrant is decision `s - 1`.
    pub fn seeds<S: Into<String>>(name: S, buckets: Vec<usize>, entrants: Vec<EntrantSpec>) -> Self {
        Self {
            name: name.into(),
            stage: Stage::Seeds { buckets },
            entrants,
            schedule: false,
            tiers: true,
            distribution: None,
            bracket: None,
        }
    }

    /// Lays the event's buckets out in `order`. No effect on seed events.
    pub fn with_order(mut self, order: PoolOrder) -> Self {
        if let Stage::Pools { order: o, .. } = &mut self.stage {
            *o = order;
        }
        self
    }

    #[inline]
    pub fn with_schedule(mut self, schedule: bool) -> Self {
        self.schedule = schedule;
        self
    }

    #[inline]
    pub fn with_tiers(mut self, tiers: bool) -> Self {
        self.tiers = tiers;
        self
    }

    #[inline]
    pub fn with_distribution(mut self, mode: DistributionMode) -> Self {
        self.distribution = Some(mode);
        self
    }

    #[inline]
    pub fn with_bracket(mut self, mode: BracketMode) -> Self {
        self.bracket = Some(mode);
        self
    }
}

/// Schedule and distribution parts of a score.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Score {
    pub schedule: f64,
    pub distribution: f64,
}

impl Score {
    #[inline]
    pub fn total(&self) -> f64 {
        self.schedule + self.distribution
    }
}

impl std::fmt::Display for Score {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:.4} (schedule {:.4}, distribution {:.4})",
            self.total(),
            self.schedule,
            self.distribution
        )
    }
}

/// Cell membership of an entrant: cell, phase, weight.
pub(crate) type Membership = (usize, usize, f64);

#[derive(Debug, Clone)]
pub(crate) struct EntrantPlan {
    pub(crate) key: String,
    pub(crate) members: Vec<RowIndex>,
    pub(crate) weight: f64,
    pub(crate) value: f64,
    pub(crate) cells: SmallVec<[Membership; 8]>,
}

#[derive(Debug, Clone)]
pub(crate) struct EventPlan {
    pub(crate) name: String,
    pub(crate) labels: Vec<String>,
    pub(crate) assignable: usize,
    // [phase][option]
    pub(crate) buckets: Vec<Vec<Option<usize>>>,
    // [phase][option]
    pub(crate) waves: Vec<Vec<Option<WaveId>>>,
    // [phase][bucket]
    pub(crate) bucket_labels: Vec<Vec<String>>,
    // [option]
    pub(crate) entry_phases: Vec<usize>,
    // [entry phase][route], waves from the entry phase on
    pub(crate) greedy: Vec<Vec<WaveRow>>,
    pub(crate) entrants: Vec<EntrantPlan>,
    pub(crate) initial: Vec<Option<usize>>,
    pub(crate) offset: usize,
    pub(crate) schedule: bool,
    pub(crate) scale: f64,
}

impl EventPlan {
    /// Returns `true` if options `a` and `b` occupy the same waves in every phase.
    pub(crate) fn same_waves(&self, a: Option<usize>, b: Option<usize>) -> bool {
        match (a, b) {
            (None, None) => true,
            (Some(a), Some(b)) => self.waves.iter().all(|w| w[a] == w[b]),
            _ => false,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct CellPlan {
    pub(crate) key: CellKey,
    pub(crate) event: usize,
    pub(crate) buckets: usize,
    pub(crate) bracket: bool,
    pub(crate) minimum: f64,
    pub(crate) offset: usize,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct RowPlan {
    pub(crate) signups: SmallVec<[(usize, usize); 4]>,
    pub(crate) weight: f64,
    pub(crate) unavailable: SmallVec<[char; 4]>,
    pub(crate) minimum: f64,
}

/// Which schedule a row is tallied with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Tally {
    /// Placed signups only.
    Actual,
    /// Placed signups kept, open signups completed greedily.
    Completed,
    /// Every signup placed greedily from scratch, from its entry phase on.
    Minimum,
}

/// A compiled assignment problem.
#[derive(Debug, Clone)]
pub struct Layout {
    pub(crate) events: Vec<EventPlan>,
    pub(crate) cells: Vec<CellPlan>,
    pub(crate) rows: Vec<RowPlan>,
    pub(crate) book: WaveBook,
    pub(crate) weights: ScheduleWeights,
    pub(crate) mode: ScheduleMode,
    pub(crate) skip_schedule: bool,
    pub(crate) locations: Vec<Location>,
    pub(crate) num_decisions: usize,
    pub(crate) num_counts: usize,
}

impl Layout {
    /// Compiles `events` over `table`.
    ///
    /// # Errors
    ///
    /// Returns [`CostError::SeedOutOfRange`] or [`CostError::UnknownPool`]
    /// for an initial decision outside the event's options, and
    /// [`CostError::NoBuckets`] for an event without options.
    pub fn compile(
        table: &EntryTable,
        events: Vec<EventSpec>,
        locations: &[Location],
        options: &CostOptions,
    ) -> Result<Self, CostError> {
        let mut book = WaveBook::new();
        let mut plans = Vec::with_capacity(events.len());
        let mut cells = Vec::new();
        let mut offset = 0;
        let mut num_counts = 0;

        for (e, spec) in events.into_iter().enumerate() {
            let plan = compile_event(
                e,
                spec,
                table,
                locations,
                options,
                &mut book,
                &mut cells,
                &mut num_counts,
                offset,
            )?;
            offset += plan.entrants.len();
            plans.push(plan);
        }
        book.rank(options.wave_order.as_deref());

        let mut rows: Vec<RowPlan> = table
            .records()
            .iter()
            .map(|record| {
                let mut unavailable: SmallVec<[char; 4]> = record
                    .external_blocks(options.external_separator)
                    .iter()
                    .filter_map(|b| {
                        let mut chars = b.chars();
                        match (chars.next(), chars.next()) {
                            (Some(c), None) => Some(c),
                            _ => None,
                        }
                    })
                    .collect();
                unavailable.sort_unstable();
                unavailable.dedup();
                RowPlan {
                    signups: SmallVec::new(),
                    weight: record.schedule_weight(),
                    unavailable,
                    minimum: 0.0,
                }
            })
            .collect();
        for (e, plan) in plans.iter().enumerate() {
            if !plan.schedule {
                continue;
            }
            for (i, entrant) in plan.entrants.iter().enumerate() {
                for row in &entrant.members {
                    rows[row.get()].signups.push((e, i));
                }
            }
        }

        let mut layout = Self {
            events: plans,
            cells,
            rows,
            book,
            weights: ScheduleWeights::new(
                options.schedule_conflict_weight,
                options.external_conflict_weight,
            ),
            mode: options.schedule_mode,
            skip_schedule: options.skip_schedule,
            locations: locations.to_vec(),
            num_decisions: offset,
            num_counts,
        };

        if !layout.skip_schedule {
            let decisions = layout.initial_decisions();
            for r in 0..layout.rows.len() {
                let minimum = layout.row_cost_with(&decisions, r, Tally::Minimum);
                layout.rows[r].minimum = minimum;
            }
        }

        tracing::debug!(
            events = layout.events.len(),
            cells = layout.cells.len(),
            rows = layout.rows.len(),
            waves = layout.book.len(),
            "compiled cost layout"
        );
        Ok(layout)
    }

    #[inline]
    pub fn num_events(&self) -> usize {
        self.events.len()
    }

    pub fn event_index(&self, name: &str) -> Option<EventIndex> {
        self.events
            .iter()
            .position(|e| e.name == name)
            .map(EventIndex::new)
    }

    #[inline]
    pub fn event_name(&self, event: EventIndex) -> &str {
        &self.events[event.get()].name
    }

    #[inline]
    pub fn num_entrants(&self, event: EventIndex) -> usize {
        self.events[event.get()].entrants.len()
    }

    #[inline]
    pub fn entrant_key(&self, event: EventIndex, entrant: EntrantIndex) -> &str {
        &self.events[event.get()].entrants[entrant.get()].key
    }

    #[inline]
    pub fn entrant_members(&self, event: EventIndex, entrant: EntrantIndex) -> &[RowIndex] {
        &self.events[event.get()].entrants[entrant.get()].members
    }

    #[inline]
    pub fn entrant_value(&self, event: EventIndex, entrant: EntrantIndex) -> f64 {
        self.events[event.get()].entrants[entrant.get()].value
    }

    /// Option labels of `event`.
    #[inline]
    pub fn options(&self, event: EventIndex) -> &[String] {
        &self.events[event.get()].labels
    }

    /// Number of leading options an open entrant may be given.
    #[inline]
    pub fn assignable(&self, event: EventIndex) -> usize {
        self.events[event.get()].assignable
    }

    pub fn option_of(&self, event: EventIndex, label: &str) -> Option<usize> {
        self.events[event.get()].labels.iter().position(|l| l == label)
    }

    /// Position of `(event, entrant)` in a decision vector.
    #[inline]
    pub fn decision_index(&self, event: EventIndex, entrant: EntrantIndex) -> usize {
        debug_assert!(
            entrant.get() < self.events[event.get()].entrants.len(),
            "called `Layout::decision_index` with entrant index out of bounds: the len is {} but the index is {}",
            self.events[event.get()].entrants.len(),
            entrant.get()
        );
        self.events[event.get()].offset + entrant.get()
    }

    #[inline]
    pub fn num_decisions(&self) -> usize {
        self.num_decisions
    }

    /// The decisions the layout was compiled with.
    pub fn initial_decisions(&self) -> Vec<Option<usize>> {
        self.events
            .iter()
            .flat_map(|e| e.initial.iter().copied())
            .collect()
    }

    /// Decisions of `event` within a full decision vector.
    #[inline]
    pub fn event_decisions<'a>(
        &self,
        decisions: &'a [Option<usize>],
        event: EventIndex,
    ) -> &'a [Option<usize>] {
        let plan = &self.events[event.get()];
        &decisions[plan.offset..plan.offset + plan.entrants.len()]
    }

    /// Multiplier on the distribution cost of `event`.
    #[inline]
    pub fn scale(&self, event: EventIndex) -> f64 {
        self.events[event.get()].scale
    }

    #[inline]
    pub fn set_scale(&mut self, event: EventIndex, scale: f64) {
        self.events[event.get()].scale = scale;
    }

    #[inline]
    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    #[inline]
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    pub fn cell_keys(&self) -> impl Iterator<Item = &CellKey> + '_ {
        self.cells.iter().map(|c| &c.key)
    }

    /// Lower bound of the schedule cost.
    pub fn schedule_minimum(&self) -> f64 {
        if self.skip_schedule {
            return 0.0;
        }
        self.rows.iter().map(|r| r.minimum).sum()
    }

    /// Lower bound of the distribution cost of `event`, scaled.
    pub fn distribution_minimum(&self, event: EventIndex) -> f64 {
        let scale = self.events[event.get()].scale;
        self.cells
            .iter()
            .filter(|c| c.event == event.get())
            .map(|c| c.minimum * scale)
            .sum()
    }

    /// Lower bound of the total cost.
    pub fn minimum(&self) -> Score {
        Score {
            schedule: self.schedule_minimum(),
            distribution: EventIndex::range(self.events.len())
                .map(|e| self.distribution_minimum(e))
                .sum(),
        }
    }

    /// Scores `decisions` from scratch.
    pub fn evaluate(&self, decisions: &[Option<usize>]) -> Score {
        debug_assert!(
            decisions.len() == self.num_decisions,
            "called `Layout::evaluate` with a decision vector of wrong length: expected {} but got {}",
            self.num_decisions,
            decisions.len()
        );

        let schedule = if self.skip_schedule {
            0.0
        } else {
            (0..self.rows.len())
                .map(|r| self.row_cost(decisions, r))
                .sum()
        };
        let counts = self.counts(decisions);
        let distribution = (0..self.cells.len())
            .map(|c| self.cell_cost_from(&counts, c))
            .sum();
        Score {
            schedule,
            distribution,
        }
    }

    /// Bucket counts of every cell, flattened.
    pub(crate) fn counts(&self, decisions: &[Option<usize>]) -> Vec<f64> {
        let mut counts = vec![0.0; self.num_counts];
        for plan in &self.events {
            for (i, entrant) in plan.entrants.iter().enumerate() {
                let Some(option) = decisions[plan.offset + i] else {
                    continue;
                };
                for &(cell, phase, weight) in &entrant.cells {
                    if let Some(bucket) = plan.buckets[phase][option] {
                        counts[self.cells[cell].offset + bucket] += weight;
                    }
                }
            }
        }
        counts
    }

    /// Scaled cost of `cell` from flattened `counts`.
    pub(crate) fn cell_cost_from(&self, counts: &[f64], cell: usize) -> f64 {
        let plan = &self.cells[cell];
        let slice = &counts[plan.offset..plan.offset + plan.buckets];
        cell_cost(slice, plan.bracket) * self.events[plan.event].scale
    }

    /// Weighted schedule cost of row `r` under the layout's schedule mode.
    pub(crate) fn row_cost(&self, decisions: &[Option<usize>], r: usize) -> f64 {
        let tally = match self.mode {
            ScheduleMode::Actual => Tally::Actual,
            ScheduleMode::Completed => Tally::Completed,
        };
        self.row_cost_with(decisions, r, tally)
    }

    pub(crate) fn row_cost_with(&self, decisions: &[Option<usize>], r: usize, tally: Tally) -> f64 {
        let row = &self.rows[r];
        if row.signups.is_empty() {
            return 0.0;
        }
        let blocks = self.row_tally(decisions, r, tally);
        self.weights.cost(&blocks, &row.unavailable) * row.weight
    }

    /// Block tally of row `r`.
    pub(crate) fn row_tally(&self, decisions: &[Option<usize>], r: usize, tally: Tally) -> BlockTally {
        let row = &self.rows[r];
        let mut blocks = BlockTally::new();
        let mut pending: Vec<Vec<WaveRow>> = Vec::new();
        for &(e, i) in &row.signups {
            let plan = &self.events[e];
            let decision = decisions[plan.offset + i];
            match (tally, decision) {
                (Tally::Minimum, _) => {
                    // a held late entrant only plays the phases from its entry on
                    let start = decision.map_or(0, |o| plan.entry_phases[o]);
                    if !plan.greedy[start].is_empty() {
                        pending.push(plan.greedy[start].clone());
                    }
                }
                (_, Some(option)) => {
                    for waves in &plan.waves {
                        if let Some(w) = waves[option] {
                            blocks.add_wave(self.book.label(w));
                        }
                    }
                }
                (Tally::Completed, None) if !plan.greedy[0].is_empty() => {
                    pending.push(plan.greedy[0].clone());
                }
                _ => {}
            }
        }
        if pending.is_empty() {
            blocks
        } else {
            self.weights
                .complete(&self.book, blocks, &row.unavailable, pending)
        }
    }

    /// Unweighted schedule cost of row `r` under `tally`.
    pub(crate) fn row_schedule(&self, decisions: &[Option<usize>], r: usize, tally: Tally) -> f64 {
        let blocks = self.row_tally(decisions, r, tally);
        self.weights.cost(&blocks, &self.rows[r].unavailable)
    }
}

#[allow(clippy::too_many_arguments)]
fn compile_event(
    e: usize,
    spec: EventSpec,
    table: &EntryTable,
    locations: &[Location],
    options: &CostOptions,
    book: &mut WaveBook,
    cells: &mut Vec<CellPlan>,
    num_counts: &mut usize,
    offset: usize,
) -> Result<EventPlan, CostError> {
    let labels = spec.stage.option_labels();
    let assignable = spec.stage.assignable();
    if assignable == 0 {
        return Err(CostError::NoBuckets(spec.name));
    }

    let (buckets, waves, bucket_labels, entry_phases, scored_phases) = match &spec.stage {
        Stage::Pools { chain, order } => {
            let entries = entry_options(chain);
            let mut buckets: Vec<Vec<Option<usize>>> = Vec::with_capacity(chain.num_phases());
            let mut waves: Vec<Vec<Option<WaveId>>> = Vec::with_capacity(chain.num_phases());
            let mut bucket_labels = Vec::with_capacity(chain.num_phases());
            for phase in 0..chain.num_phases() {
                let pools = chain.phase_pools(phase);
                let positions = order.positions(pools);
                let wave_ids: Vec<Option<WaveId>> = pools
                    .iter()
                    .map(|p| pool_wave(p).map(|w| book.intern(w)))
                    .collect();
                let reach: Vec<Option<usize>> = entries
                    .iter()
                    .map(|&(start, pos)| (start <= phase).then(|| chain.route_from(start, pos, phase)))
                    .collect();
                buckets.push(reach.iter().map(|r| r.map(|p| positions[p])).collect());
                waves.push(reach.iter().map(|r| r.and_then(|p| wave_ids[p])).collect());
                let mut sorted = vec![String::new(); pools.len()];
                for (p, &pos) in positions.iter().enumerate() {
                    sorted[pos] = pools[p].clone();
                }
                bucket_labels.push(sorted);
            }
            let scored = match spec.distribution.unwrap_or(options.distribution) {
                DistributionMode::None => 0,
                DistributionMode::Max => chain.varying_phases(),
                DistributionMode::First => usize::from(chain.pools().len() > 1),
            };
            let entry_phases = entries.iter().map(|&(start, _)| start).collect();
            (buckets, waves, bucket_labels, entry_phases, scored)
        }
        Stage::Seeds { buckets } => {
            let scored = match spec.distribution.unwrap_or(options.distribution) {
                DistributionMode::None => 0,
                _ => usize::from(buckets.iter().any(|&b| b > 0)),
            };
            let width = buckets.iter().max().map_or(0, |&b| b + 1);
            let mut labels = vec![String::new(); width];
            for (s, &b) in buckets.iter().enumerate() {
                if labels[b].is_empty() {
                    labels[b] = (s + 1).to_string();
                } else {
                    labels[b] = format!("{},{}", labels[b], s + 1);
                }
            }
            (
                vec![buckets.iter().map(|&b| Some(b)).collect()],
                vec![vec![None; buckets.len()]],
                vec![labels],
                vec![0; buckets.len()],
                scored,
            )
        }
    };

    for entrant in &spec.entrants {
        if let Some(option) = entrant.decision {
            if option >= labels.len() {
                return Err(match spec.stage {
                    Stage::Seeds { .. } => CostError::SeedOutOfRange {
                        event: spec.name.clone(),
                        seed: option + 1,
                        positions: labels.len(),
                    },
                    Stage::Pools { .. } => CostError::UnknownPool {
                        event: spec.name.clone(),
                        pool: option.to_string(),
                    },
                });
            }
        }
    }

    let greedy: Vec<Vec<WaveRow>> = (0..waves.len())
        .map(|start| {
            if !spec.schedule {
                return Vec::new();
            }
            let mut routes: Vec<WaveRow> = (0..entry_phases.len())
                .filter(|&o| entry_phases[o] <= start)
                .filter_map(|o| waves[start..].iter().map(|w| w[o]).collect::<Option<WaveRow>>())
                .collect();
            routes.sort_unstable();
            routes.dedup();
            routes
        })
        .collect();

    let mut entrants: Vec<EntrantPlan> = spec
        .entrants
        .iter()
        .map(|s| EntrantPlan {
            key: s.key.clone(),
            members: s.members.clone(),
            weight: s.weight,
            value: s.value,
            cells: SmallVec::new(),
        })
        .collect();
    let member_weight =
        |i: usize| spec.entrants[i].weight / spec.entrants[i].members.len().max(1) as f64;
    let bracket_mode = spec.bracket.unwrap_or(options.bracket);

    for phase in 0..scored_phases {
        let in_phase: Vec<usize> = (0..spec.entrants.len())
            .filter(|&i| match spec.entrants[i].decision {
                None => true,
                Some(o) => buckets[phase][o].is_some(),
            })
            .collect();
        let phase_total: f64 = in_phase.iter().map(|&i| spec.entrants[i].weight).sum();
        let value_of = |i: usize| if spec.tiers { spec.entrants[i].value } else { 0.0 };
        let distributed: Vec<usize> = in_phase
            .iter()
            .copied()
            .filter(|&i| spec.entrants[i].distributed)
            .collect();
        if distributed.is_empty() {
            continue;
        }
        let num_buckets = bucket_labels[phase].len();

        for (tier_rank, tier) in tiers(distributed.iter().map(|&i| value_of(i))).into_iter().enumerate() {
            let admitted: Vec<usize> = distributed
                .iter()
                .copied()
                .filter(|&i| value_of(i) >= tier)
                .collect();
            let bracket = phase + 1 == scored_phases && bracket_mode.applies_to(tier);
            let key = |place: Option<(usize, Place)>| CellKey {
                event: spec.name.clone(),
                phase,
                tier,
                tier_rank,
                place,
            };

            let memberships: Vec<(usize, f64)> = admitted
                .iter()
                .map(|&i| (i, spec.entrants[i].weight))
                .collect();
            push_cell(
                cells,
                num_counts,
                &mut entrants,
                key(None),
                e,
                phase,
                num_buckets,
                bracket,
                &memberships,
            );

            for (l, location) in locations.iter().enumerate() {
                let mut places: BTreeMap<Place, Vec<(usize, f64)>> = BTreeMap::new();
                for &i in &admitted {
                    for &row in &spec.entrants[i].members {
                        let Some(place) = location.place_of(table.record(row)) else {
                            continue;
                        };
                        let members = places.entry(place).or_default();
                        match members.last_mut() {
                            Some((last, w)) if *last == i => *w += member_weight(i),
                            _ => members.push((i, member_weight(i))),
                        }
                    }
                }
                for (place, memberships) in places {
                    let total: f64 = memberships.iter().map(|&(_, w)| w).sum();
                    if total < options.location_threshold * phase_total {
                        push_cell(
                            cells,
                            num_counts,
                            &mut entrants,
                            key(Some((l, place))),
                            e,
                            phase,
                            num_buckets,
                            bracket,
                            &memberships,
                        );
                    }
                }
            }
        }
    }

    Ok(EventPlan {
        name: spec.name,
        labels,
        assignable,
        buckets,
        waves,
        bucket_labels,
        entry_phases,
        greedy,
        entrants,
        initial: spec.entrants.iter().map(|s| s.decision).collect(),
        offset,
        schedule: spec.schedule,
        scale: 1.0,
    })
}

#[allow(clippy::too_many_arguments)]
fn push_cell(
    cells: &mut Vec<CellPlan>,
    num_counts: &mut usize,
    entrants: &mut [EntrantPlan],
    key: CellKey,
    event: usize,
    phase: usize,
    buckets: usize,
    bracket: bool,
    memberships: &[(usize, f64)],
) {
    let id = cells.len();
    let weights: Vec<f64> = memberships.iter().map(|&(_, w)| w).collect();
    cells.push(CellPlan {
        key,
        event,
        buckets,
        bracket,
        minimum: cell_minimum(&weights, buckets, bracket),
        offset: *num_counts,
    });
    *num_counts += buckets;
    for &(i, w) in memberships {
        entrants[i].cells.push((id, phase, w));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seedpool_model::{
        phase::Transition,
        table::{EntryRecord, Signup},
    };

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn singles(slots: &[(&str, f64, Option<&str>)]) -> EntryTable {
        slots
            .iter()
            .map(|&(key, value, pool)| {
                let signup = match pool {
                    Some(p) => Signup::assigned(p),
                    None => Signup::open(),
                };
                EntryRecord::new(key).with_signup("SF", signup.with_value(value))
            })
            .collect()
    }

    fn compile(table: &EntryTable, pools: &[&str], options: &CostOptions) -> Layout {
        let roster = Roster::derive(table, "SF").unwrap();
        let spec = EventSpec::pools(&roster, PhaseChain::identity(pools)).unwrap();
        Layout::compile(table, vec![spec], &[], options).unwrap()
    }

    #[test]
    fn test_tiers_split_distribution() {
        let table = singles(&[
            ("ann", 1.0, Some("A1")),
            ("bob", 1.0, Some("A1")),
            ("cat", 2.0, Some("A2")),
            ("dan", 2.0, Some("A2")),
        ]);
        let layout = compile(&table, &["A1", "A2"], &CostOptions::default());
        assert_eq!(layout.cell_keys().count(), 2);

        let initial = layout.initial_decisions();
        let score = layout.evaluate(&initial);
        // [2, 2] everyone, [0, 2] for value >= 2
        assert!(close(score.distribution, 1.0));
        assert!(close(score.schedule, 0.0));

        let swapped = vec![Some(0), Some(1), Some(0), Some(1)];
        assert!(close(layout.evaluate(&swapped).total(), 0.0));
        assert!(close(layout.minimum().total(), 0.0));
    }

    #[test]
    fn test_without_tiers_values_are_ignored() {
        let table = singles(&[("ann", 1.0, Some("A1")), ("bob", 5.0, Some("A2"))]);
        let roster = Roster::derive(&table, "SF").unwrap();
        let spec = EventSpec::pools(&roster, PhaseChain::identity(&["A1", "A2"]))
            .unwrap()
            .with_tiers(false);
        let layout = Layout::compile(&table, vec![spec], &[], &CostOptions::default()).unwrap();
        assert_eq!(layout.cell_keys().count(), 1);
        assert!(close(layout.evaluate(&layout.initial_decisions()).total(), 0.0));
    }

    #[test]
    fn test_open_entrants_count_only_towards_minimum() {
        let table = singles(&[("ann", 0.0, Some("A1")), ("bob", 0.0, None), ("cat", 0.0, None)]);
        let layout = compile(&table, &["A1", "A2", "A3"], &CostOptions::default());
        let score = layout.evaluate(&layout.initial_decisions());
        // [1, 0, 0]
        assert!(close(score.distribution, (2.0f64 / 9.0).sqrt()));
        assert!(close(layout.minimum().distribution, 0.0));
        assert_eq!(layout.assignable(EventIndex::new(0)), 3);
    }

    #[test]
    fn test_scale_multiplies_distribution() {
        let table = singles(&[("ann", 0.0, Some("A1")), ("bob", 0.0, Some("A1"))]);
        let mut layout = compile(&table, &["A1", "A2"], &CostOptions::default());
        let before = layout.evaluate(&layout.initial_decisions()).distribution;
        layout.set_scale(EventIndex::new(0), 0.5);
        let after = layout.evaluate(&layout.initial_decisions()).distribution;
        assert!(close(before, 1.0));
        assert!(close(after, 0.5));
    }

    #[test]
    fn test_late_entry_points_become_locked_only_options() {
        let first: Transition = [("A1", "C1"), ("A2", "C2"), ("B1", "C1"), ("B2", "C2")]
            .into_iter()
            .map(|(a, b)| (a.to_string(), b.to_string()))
            .collect();
        let chain = PhaseChain::from_transitions("SF", None::<&[&str]>, &[first]).unwrap();
        let table = singles(&[
            ("ann", 0.0, Some("A1")),
            ("bob", 0.0, Some("B2")),
            ("cat", 0.0, Some("C1")),
        ]);
        let roster = Roster::derive(&table, "SF").unwrap();
        let spec = EventSpec::pools(&roster, chain)
            .unwrap()
            .with_distribution(DistributionMode::Max);
        let layout = Layout::compile(&table, vec![spec], &[], &CostOptions::default()).unwrap();

        let event = EventIndex::new(0);
        assert_eq!(layout.options(event), &["A1", "A2", "B1", "B2", "C1", "C2"]);
        assert_eq!(layout.assignable(event), 4);
        assert_eq!(layout.initial_decisions(), vec![Some(0), Some(3), Some(4)]);

        // phase 1: [1, 0, 0, 1]; phase 2: [2, 1]
        let score = layout.evaluate(&layout.initial_decisions());
        assert!(close(score.distribution, 1.0));
        assert!(close(layout.minimum().distribution, 1.0));
    }

    #[test]
    fn test_unknown_pool_is_rejected() {
        let table = singles(&[("ann", 0.0, Some("Z9"))]);
        let roster = Roster::derive(&table, "SF").unwrap();
        let err = EventSpec::pools(&roster, PhaseChain::identity(&["A1"])).unwrap_err();
        assert!(matches!(err, CostError::UnknownPool { .. }));
    }

    #[test]
    fn test_seed_out_of_range_is_rejected() {
        let table = singles(&[("ann", 0.0, None)]);
        let entrant = EntrantSpec {
            key: "ann".to_string(),
            members: vec![RowIndex::new(0)],
            weight: 1.0,
            value: 1.0,
            decision: Some(2),
            distributed: true,
        };
        let spec = EventSpec::seeds("SF", vec![0, 1], vec![entrant]);
        let err = Layout::compile(&table, vec![spec], &[], &CostOptions::default()).unwrap_err();
        assert!(matches!(err, CostError::SeedOutOfRange { seed: 3, .. }));
    }

    fn two_events(sf: Signup, db: Signup) -> EntryTable {
        [EntryRecord::new("ann").with_signup("SF", sf).with_signup("DB", db)]
            .into_iter()
            .collect()
    }

    fn compile_two(table: &EntryTable, options: &CostOptions) -> Layout {
        let sf = Roster::derive(table, "SF").unwrap();
        let db = Roster::derive(table, "DB").unwrap();
        let specs = vec![
            EventSpec::pools(&sf, PhaseChain::identity(&["A1", "B1"])).unwrap(),
            EventSpec::pools(&db, PhaseChain::identity(&["A2"])).unwrap(),
        ];
        Layout::compile(table, specs, &[], options).unwrap()
    }

    #[test]
    fn test_double_booking_costs_conflict_weight() {
        let table = two_events(Signup::assigned("A1"), Signup::assigned("A2"));
        let layout = compile_two(&table, &CostOptions::default());
        assert!(close(layout.evaluate(&layout.initial_decisions()).schedule, 2.0));
        assert!(close(layout.schedule_minimum(), 0.0));
        assert!(close(layout.evaluate(&[Some(1), Some(0)]).schedule, 0.0));
    }

    #[test]
    fn test_completed_mode_fills_open_signups() {
        let table = two_events(Signup::assigned("A1"), Signup::open());
        let actual = compile_two(&table, &CostOptions::default());
        assert!(close(actual.evaluate(&actual.initial_decisions()).schedule, 0.0));

        let options = CostOptions::default().with_schedule_mode(ScheduleMode::Completed);
        let completed = compile_two(&table, &options);
        // DB can only go to wave A, on top of SF
        assert!(close(completed.evaluate(&completed.initial_decisions()).schedule, 2.0));
    }

    #[test]
    fn test_held_late_entrant_minimum_skips_earlier_phases() {
        let first: Transition = [("A1", "C1")]
            .into_iter()
            .map(|(a, b)| (a.to_string(), b.to_string()))
            .collect();
        let chain = PhaseChain::from_transitions("SF", None::<&[&str]>, &[first]).unwrap();
        let table = two_events(Signup::assigned("C1"), Signup::open());
        let sf = Roster::derive(&table, "SF").unwrap();
        let db = Roster::derive(&table, "DB").unwrap();
        let specs = || {
            vec![
                EventSpec::pools(&sf, chain.clone()).unwrap(),
                EventSpec::pools(&db, PhaseChain::identity(&["A1", "A2"])).unwrap(),
            ]
        };

        // SF only plays wave C, so DB fits wave A without a conflict
        let actual = Layout::compile(&table, specs(), &[], &CostOptions::default()).unwrap();
        let decisions = actual.initial_decisions();
        assert!(close(actual.evaluate(&decisions).schedule, 0.0));
        assert!(close(actual.schedule_minimum(), 0.0));

        let options = CostOptions::default().with_schedule_mode(ScheduleMode::Completed);
        let completed = Layout::compile(&table, specs(), &[], &options).unwrap();
        let decisions = completed.initial_decisions();
        let schedule = completed.evaluate(&decisions).schedule;
        assert!(schedule >= completed.schedule_minimum());
        assert!(close(completed.schedule_minimum(), 0.0));
        assert!(crate::analyze::find_suboptimal_schedules(&completed, &decisions).is_empty());
    }

    #[test]
    fn test_unavailable_blocks_cost_external_weight() {
        let table: EntryTable = [EntryRecord::new("ann")
            .with_signup("SF", Signup::assigned("A1"))
            .with_external("AQ")]
        .into_iter()
        .collect();
        let layout = compile(&table, &["A1", "B1"], &CostOptions::default());
        assert!(close(layout.evaluate(&layout.initial_decisions()).schedule, 8.0));
        assert!(close(layout.schedule_minimum(), 0.0));

        let skipped = compile(&table, &["A1", "B1"], &CostOptions::default().with_skip_schedule(true));
        assert!(close(skipped.evaluate(&skipped.initial_decisions()).schedule, 0.0));
    }

    #[test]
    fn test_place_cells_below_threshold() {
        let clubs = ["X", "X", "Y", "Y"];
        let table: EntryTable = clubs
            .iter()
            .enumerate()
            .map(|(i, club)| {
                EntryRecord::new(format!("p{i}"))
                    .with_signup("SF", Signup::assigned("A1"))
                    .with_attribute("club", *club)
            })
            .collect();
        let roster = Roster::derive(&table, "SF").unwrap();
        let spec = EventSpec::pools(&roster, PhaseChain::identity(&["A1", "A2"])).unwrap();
        let layout = Layout::compile(
            &table,
            vec![spec],
            &[Location::single("club")],
            &CostOptions::default(),
        )
        .unwrap();
        let keys: Vec<String> = layout.cell_keys().map(|k| k.to_string()).collect();
        assert_eq!(keys, vec!["SF..1", "SF..1 @0:X", "SF..1 @0:Y"]);

        // [4, 0] and [2, 0] twice
        let score = layout.evaluate(&layout.initial_decisions());
        assert!(close(score.distribution, 4.0));
        let spread = vec![Some(0), Some(1), Some(0), Some(1)];
        assert!(close(layout.evaluate(&spread).distribution, 0.0));
    }

    #[test]
    fn test_place_holding_everyone_is_not_a_cell() {
        let table: EntryTable = (0..3)
            .map(|i| {
                EntryRecord::new(format!("p{i}"))
                    .with_signup("SF", Signup::open())
                    .with_attribute("club", "X")
            })
            .collect();
        let roster = Roster::derive(&table, "SF").unwrap();
        let spec = EventSpec::pools(&roster, PhaseChain::identity(&["A1", "A2"])).unwrap();
        let layout =
            Layout::compile(&table, vec![spec], &[Location::single("club")], &CostOptions::default())
                .unwrap();
        assert_eq!(layout.cell_keys().count(), 1);
    }
}
