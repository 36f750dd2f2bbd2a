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

//! # Pool assignment
//!
//! `PoolAssigner` places the open entrants of one or more events into pools
//! so that schedule conflicts and pool imbalance are as small as possible.
//!
//! 1. Each event's field is padded with filler entrants (`Dummy <event> <n>`,
//!    value 0) until the open and phase-0-locked entrants fill every pool
//!    equally. Filler entrants make sure a pool always has a partner to
//!    swap with.
//! 2. The lower bound is computed on the open field.
//! 3. Open entrants are dealt the free pool slots in random order.
//! 4. The search swaps the pools of two open entrants of one event, the
//!    event drawn with weight equal to its number of swappable pairs that
//!    sit in different pools.
//!
//! Entrants that already hold a pool never move. *True events* are fixed
//! events whose pools only take part in schedule cost.

use crate::{
    engine::{AnnealProblem, Proposal},
    error::AnnealError,
    monitor::anneal_monitor::{AnnealMonitor, NoOpMonitor},
    options::AnnealOptions,
    result::AnnealOutcome,
    sampler::WeightedSampler,
};
use rand::{seq::SliceRandom, Rng};
use seedpool_cost::{
    board::ScoreBoard,
    layout::{EventSpec, Layout, Score},
    options::{CostOptions, DistributionMode},
};
use seedpool_model::{
    index::{EntrantIndex, EventIndex, RowIndex},
    location::Location,
    phase::{chain_for, phase_chains, EventPools, PhaseChain, Transition},
    roster::Roster,
    table::{EntryRecord, EntryTable, Signup, Slot},
};
use std::collections::BTreeMap;

/// Iterations per signup when no cap is given.
const ITERS_PER_SIGNUP: u64 = 50;

#[derive(Debug, Clone)]
pub struct PoolAssigner {
    events: Vec<String>,
    pools: EventPools,
    transitions: BTreeMap<String, Vec<Transition>>,
    true_events: Vec<String>,
    locations: Vec<Location>,
    cost: CostOptions,
    anneal: AnnealOptions,
    keep_dummies: bool,
}

impl PoolAssigner {
    /// An assigner for `events`, whose pools are listed in `pools`.
    pub fn new<I, S>(events: I, pools: EventPools) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            events: events.into_iter().map(Into::into).collect(),
            pools,
            transitions: BTreeMap::new(),
            true_events: Vec::new(),
            locations: Vec::new(),
            cost: CostOptions::default(),
            anneal: AnnealOptions::default(),
            keep_dummies: false,
        }
    }

    #[inline]
    pub fn with_transitions(mut self, transitions: BTreeMap<String, Vec<Transition>>) -> Self {
        self.transitions = transitions;
        self
    }

    /// Fixed events that only contribute schedule cost.
    pub fn with_true_events<I, S>(mut self, events: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.true_events = events.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_locations<I>(mut self, locations: I) -> Self
    where
        I: IntoIterator<Item = Location>,
    {
        self.locations = locations.into_iter().collect();
        self
    }

    #[inline]
    pub fn with_cost_options(mut self, cost: CostOptions) -> Self {
        self.cost = cost;
        self
    }

    #[inline]
    pub fn with_anneal_options(mut self, anneal: AnnealOptions) -> Self {
        self.anneal = anneal;
        self
    }

    /// Keeps the filler rows in the returned table.
    #[inline]
    pub fn with_keep_dummies(mut self, keep: bool) -> Self {
        self.keep_dummies = keep;
        self
    }

    /// Runs the assignment.
    ///
    /// # Errors
    ///
    /// Fails before searching if primary keys repeat, team members hold
    /// different pools, an event has no pools, a held pool is unknown, or
    /// the temperature schedule is malformed.
    pub fn run<R>(&self, table: &EntryTable, rng: &mut R) -> Result<PoolAssignment, AnnealError>
    where
        R: Rng + ?Sized,
    {
        self.run_with_monitor(table, &mut NoOpMonitor, rng)
    }

    /// Like [`PoolAssigner::run`], reporting to `monitor`.
    pub fn run_with_monitor<M, R>(
        &self,
        table: &EntryTable,
        monitor: &mut M,
        rng: &mut R,
    ) -> Result<PoolAssignment, AnnealError>
    where
        M: AnnealMonitor + ?Sized,
        R: Rng + ?Sized,
    {
        let prepared = self.prepare(table, rng)?;
        let engine = self.anneal.engine(prepared.default_iters)?;

        tracing::debug!(
            events = self.events.len(),
            rows = prepared.work.len(),
            max_iters = engine.max_iters(),
            minimum = prepared.layout.minimum().total(),
            "starting pool assignment"
        );

        let mut problem = PoolSwapProblem::new(&prepared.layout, prepared.decisions, &prepared.swappable);
        let mut monitors = self.anneal.monitors(monitor);
        let outcome = engine.run(&mut problem, &mut monitors, rng);

        let score = problem.board.score();
        let minimum = prepared.layout.minimum();
        let mut work = prepared.work;
        write_slots(
            &prepared.layout,
            problem.board.decisions(),
            (0..self.events.len()).map(EventIndex::new),
            &mut work,
        );
        if !self.keep_dummies {
            let rows: Vec<RowIndex> = RowIndex::range(table.len()).collect();
            work = work.select(&rows);
        }

        tracing::info!(
            score = score.total(),
            minimum = minimum.total(),
            iterations = outcome.statistics().iterations,
            reason = %outcome.termination_reason(),
            "pool assignment finished"
        );

        Ok(PoolAssignment {
            table: work,
            score,
            minimum,
            outcome,
        })
    }

    fn prepare<R>(&self, table: &EntryTable, rng: &mut R) -> Result<Prepared, AnnealError>
    where
        R: Rng + ?Sized,
    {
        table.validate_unique_keys()?;
        let chains = phase_chains(&self.transitions, &self.pools)?;

        let mut work = table.clone();
        let mut event_chains: Vec<PhaseChain> = Vec::with_capacity(self.events.len());
        for event in &self.events {
            let chain = chain_for(event, &chains, &self.pools)?;
            let roster = Roster::derive(&work, event)?;
            append_dummies(&mut work, event, &roster, &chain);
            event_chains.push(chain);
        }

        let mut specs = Vec::with_capacity(self.events.len() + self.true_events.len());
        for (event, chain) in self.events.iter().zip(event_chains) {
            let roster = Roster::derive(&work, event)?;
            specs.push(EventSpec::pools(&roster, chain)?);
        }
        for event in &self.true_events {
            if self.events.contains(event) {
                continue;
            }
            let chain = chain_for(event, &chains, &self.pools)?;
            let roster = Roster::derive(&work, event)?;
            specs.push(EventSpec::pools(&roster, chain)?.with_distribution(DistributionMode::None));
        }

        let layout = Layout::compile(&work, specs, &self.locations, &self.cost)?;
        let mut decisions = layout.initial_decisions();
        let mut swappable = Vec::with_capacity(self.events.len());
        for e in (0..self.events.len()).map(EventIndex::new) {
            swappable.push(deal_open_slots(&layout, e, &mut decisions, rng));
        }

        let signups: usize = self.events.iter().map(|e| work.signup_count(e)).sum();
        Ok(Prepared {
            work,
            layout,
            decisions,
            swappable,
            default_iters: ITERS_PER_SIGNUP * signups as u64,
        })
    }
}

/// Result of a [`PoolAssigner`] run.
#[derive(Debug, Clone)]
pub struct PoolAssignment {
    table: EntryTable,
    score: Score,
    minimum: Score,
    outcome: AnnealOutcome,
}

impl PoolAssignment {
    /// The input table with every open signup of the assigned events filled.
    #[inline]
    pub fn table(&self) -> &EntryTable {
        &self.table
    }

    #[inline]
    pub fn into_table(self) -> EntryTable {
        self.table
    }

    /// Score of the returned assignment.
    #[inline]
    pub fn score(&self) -> Score {
        self.score
    }

    /// Lower bound of the score.
    #[inline]
    pub fn minimum(&self) -> Score {
        self.minimum
    }

    #[inline]
    pub fn outcome(&self) -> &AnnealOutcome {
        &self.outcome
    }
}

struct Prepared {
    work: EntryTable,
    layout: Layout,
    decisions: Vec<Option<usize>>,
    swappable: Vec<Swappable>,
    default_iters: u64,
}

/// Open entrants of one event and the number of their pairs in different pools.
struct Swappable {
    entrants: Vec<EntrantIndex>,
    pairs: f64,
}

/// Pads the field of `event` to a multiple of its phase-0 pool count.
fn append_dummies(work: &mut EntryTable, event: &str, roster: &Roster, chain: &PhaseChain) {
    let npools = chain.pools().len();
    if npools == 0 {
        return;
    }
    let fillable = roster
        .entrants()
        .iter()
        .filter(|entrant| match entrant.slot() {
            Slot::Open => true,
            Slot::Pool(pool) => chain.pools().contains(pool),
        })
        .count();
    let missing = (npools - fillable % npools) % npools;
    for j in 0..missing {
        work.push(
            EntryRecord::new(format!("Dummy {} {}", event, j + 1))
                .with_signup(event, Signup::open().with_value(0.0)),
        );
    }
}

/// Deals the free phase-0 slots of `event` to its open entrants.
fn deal_open_slots<R>(
    layout: &Layout,
    event: EventIndex,
    decisions: &mut [Option<usize>],
    rng: &mut R,
) -> Swappable
where
    R: Rng + ?Sized,
{
    let npools = layout.assignable(event);
    let current = layout.event_decisions(decisions, event);
    let open: Vec<EntrantIndex> = current
        .iter()
        .enumerate()
        .filter(|(_, d)| d.is_none())
        .map(|(i, _)| EntrantIndex::new(i))
        .collect();
    let held: Vec<usize> = current.iter().flatten().copied().filter(|&o| o < npools).collect();

    let capacity = (open.len() + held.len()) / npools;
    let mut remaining = vec![capacity; npools];
    for &o in &held {
        remaining[o] = remaining[o].saturating_sub(1);
    }
    let mut slots: Vec<usize> = remaining
        .iter()
        .enumerate()
        .flat_map(|(o, &n)| std::iter::repeat(o).take(n))
        .collect();
    // Pools overfilled by held entrants leave too few slots.
    let mut next = 0;
    while slots.len() < open.len() {
        slots.push(next % npools);
        next += 1;
    }
    slots.shuffle(rng);
    slots.truncate(open.len());

    let mut per_pool = vec![0usize; npools];
    for (&entrant, &option) in open.iter().zip(&slots) {
        decisions[layout.decision_index(event, entrant)] = Some(option);
        per_pool[option] += 1;
    }

    let pairs = |n: usize| (n * n.saturating_sub(1) / 2) as f64;
    Swappable {
        pairs: pairs(open.len()) - per_pool.iter().map(|&n| pairs(n)).sum::<f64>(),
        entrants: open,
    }
}

/// Writes the decisions of `events` back into the slots of `table`.
pub(crate) fn write_slots<I>(
    layout: &Layout,
    decisions: &[Option<usize>],
    events: I,
    table: &mut EntryTable,
) where
    I: IntoIterator<Item = EventIndex>,
{
    for event in events {
        let name = layout.event_name(event);
        for (i, decision) in layout.event_decisions(decisions, event).iter().enumerate() {
            let slot = match decision {
                Some(o) => Slot::pool(layout.options(event)[*o].clone()),
                None => Slot::Open,
            };
            for &row in layout.entrant_members(event, EntrantIndex::new(i)) {
                table.record_mut(row).set_slot(name, slot.clone());
            }
        }
    }
}

/// Swaps the pools of two open entrants of one event.
struct PoolSwapProblem<'a> {
    layout: &'a Layout,
    board: ScoreBoard,
    minimum: f64,
    events: WeightedSampler<EventIndex>,
    swappable: &'a [Swappable],
}

impl<'a> PoolSwapProblem<'a> {
    fn new(layout: &'a Layout, decisions: Vec<Option<usize>>, swappable: &'a [Swappable]) -> Self {
        let events = swappable
            .iter()
            .enumerate()
            .map(|(e, s)| (EventIndex::new(e), s.pairs))
            .collect();
        Self {
            layout,
            board: ScoreBoard::new(layout, decisions),
            minimum: layout.minimum().total(),
            events,
            swappable,
        }
    }
}

impl AnnealProblem for PoolSwapProblem<'_> {
    #[inline]
    fn score(&self) -> f64 {
        self.board.total()
    }

    #[inline]
    fn minimum(&self) -> f64 {
        self.minimum
    }

    fn propose<R>(&mut self, rng: &mut R) -> Option<Proposal>
    where
        R: Rng + ?Sized,
    {
        let event = *self.events.sample(rng)?;
        let candidates = &self.swappable[event.get()].entrants;
        debug_assert!(
            candidates.len() >= 2,
            "called `PoolSwapProblem::propose` on an event with fewer than two open entrants: {}",
            candidates.len()
        );

        // Pools are conserved by swaps, so a pair in different pools exists
        // whenever the event has a positive weight.
        let (a, b, pool_a, pool_b) = loop {
            let i = rng.random_range(0..candidates.len());
            let mut j = rng.random_range(0..candidates.len() - 1);
            if j >= i {
                j += 1;
            }
            let (a, b) = (candidates[i], candidates[j]);
            let pool_a = self.board.decision(self.layout, event, a);
            let pool_b = self.board.decision(self.layout, event, b);
            if pool_a != pool_b {
                break (a, b, pool_a, pool_b);
            }
        };

        self.board.begin();
        self.board.reassign(self.layout, event, a, pool_b);
        self.board.reassign(self.layout, event, b, pool_a);
        let delta = self.board.settle(self.layout);
        Some(Proposal::new("swap", delta))
    }

    #[inline]
    fn accept(&mut self) {
        self.board.commit();
    }

    #[inline]
    fn reject(&mut self) {
        self.board.rollback();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::AnnealTerminationReason;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn pools() -> EventPools {
        EventPools::from([
            (
                "SF".to_string(),
                vec!["A1".to_string(), "A2".to_string(), "B1".to_string(), "B2".to_string()],
            ),
            ("MK".to_string(), vec!["A3".to_string(), "B3".to_string()]),
            ("DB".to_string(), vec!["C1".to_string(), "C2".to_string()]),
            ("TR".to_string(), vec!["A9".to_string(), "C9".to_string()]),
        ])
    }

    fn table() -> EntryTable {
        (0..10)
            .map(|i| {
                let mut record = EntryRecord::new(format!("p{}", i)).with_signup(
                    "SF",
                    if i == 9 {
                        Signup::assigned("B2").with_value(3.0)
                    } else {
                        Signup::open().with_value((i % 3) as f64)
                    },
                );
                if i < 6 {
                    record = record
                        .with_signup("MK", Signup::open())
                        .with_signup(
                            "DB",
                            Signup::open()
                                .with_entry(format!("t{}", i / 2))
                                .with_value(1.0 + (i / 2 % 2) as f64),
                        )
                        .with_attribute("club", if i % 2 == 0 { "north" } else { "south" });
                }
                if i % 4 == 0 {
                    record = record.with_signup("TR", Signup::assigned(if i < 4 { "A9" } else { "C9" }));
                }
                record
            })
            .collect()
    }

    fn assigner() -> PoolAssigner {
        PoolAssigner::new(["SF", "MK", "DB"], pools())
            .with_true_events(["TR"])
            .with_locations([Location::single("club")])
    }

    fn slot_of<'t>(table: &'t EntryTable, key: &str, event: &str) -> &'t Slot {
        let row = table.row_of(key).unwrap();
        &table.record(row).signup(event).unwrap().slot
    }

    #[test]
    fn test_pads_with_dummies_and_fills_capacity() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let result = assigner()
            .with_keep_dummies(true)
            .with_anneal_options(AnnealOptions::default().with_max_iters(0))
            .run(&table(), &mut rng)
            .unwrap();
        let out = result.table();

        assert_eq!(out.len(), 13);
        assert!(out.row_of("Dummy SF 1").is_some());
        assert!(out.row_of("Dummy SF 2").is_some());
        assert!(out.row_of("Dummy DB 1").is_some());
        assert!(out.row_of("Dummy MK 1").is_none());

        for pool in ["A1", "A2", "B1", "B2"] {
            let count = out
                .records()
                .iter()
                .filter(|r| r.signup("SF").map(|s| s.slot.as_pool()) == Some(Some(pool)))
                .count();
            assert_eq!(count, 3, "pool {} holds {}", pool, count);
        }
        assert_eq!(slot_of(out, "p9", "SF"), &Slot::pool("B2"));
    }

    #[test]
    fn test_returns_input_rows_with_every_signup_placed() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let input = table();
        let result = assigner().run(&input, &mut rng).unwrap();
        let out = result.table();

        assert_eq!(out.len(), input.len());
        for (row, record) in out.iter() {
            assert_eq!(record.key(), input.record(row).key());
            for event in ["SF", "MK", "DB"] {
                if let Some(signup) = record.signup(event) {
                    assert!(!signup.slot.is_open(), "{} left open in {}", record.key(), event);
                }
            }
        }
        assert_eq!(slot_of(out, "p0", "TR"), &Slot::pool("A9"));
        assert_eq!(slot_of(out, "p4", "TR"), &Slot::pool("C9"));
        assert_eq!(slot_of(out, "p9", "SF"), &Slot::pool("B2"));
    }

    #[test]
    fn test_team_members_share_their_pool() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let result = assigner().run(&table(), &mut rng).unwrap();
        let out = result.table();
        for team in 0..3 {
            let a = slot_of(out, &format!("p{}", 2 * team), "DB");
            let b = slot_of(out, &format!("p{}", 2 * team + 1), "DB");
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_incremental_delta_matches_full_evaluation() {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let prepared = assigner().prepare(&table(), &mut rng).unwrap();
        let layout = &prepared.layout;
        let mut problem = PoolSwapProblem::new(layout, prepared.decisions.clone(), &prepared.swappable);

        let multiset = |decisions: &[Option<usize>], e: usize| {
            let mut d: Vec<Option<usize>> =
                layout.event_decisions(decisions, EventIndex::new(e)).to_vec();
            d.sort_unstable();
            d
        };
        let initial: Vec<_> = (0..3).map(|e| multiset(&prepared.decisions, e)).collect();

        for _ in 0..300 {
            let before = problem.score();
            let proposal = problem.propose(&mut rng).unwrap();
            let full = layout.evaluate(problem.board.decisions()).total();
            assert!((problem.score() - full).abs() < 1e-9);
            assert!((before + proposal.delta - full).abs() < 1e-9);

            if rng.random_bool(0.5) {
                problem.accept();
            } else {
                problem.reject();
                assert!((problem.score() - before).abs() < 1e-9);
            }
            for (e, counts) in initial.iter().enumerate() {
                assert_eq!(&multiset(problem.board.decisions(), e), counts);
            }
        }
    }

    #[test]
    fn test_final_score_not_below_minimum() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let result = assigner()
            .with_anneal_options(AnnealOptions::default().with_max_iters(2_000))
            .run(&table(), &mut rng)
            .unwrap();
        assert!(result.score().total() >= result.minimum().total() - 1e-7);
        assert!((result.outcome().score() - result.score().total()).abs() < 1e-6);
        assert!(result.outcome().statistics().iterations <= 2_000);
    }

    #[test]
    fn test_balanced_field_converges_immediately() {
        let mut rng = ChaCha8Rng::seed_from_u64(6);
        let table: EntryTable = (0..4)
            .map(|i| EntryRecord::new(format!("p{}", i)).with_signup("SF", Signup::open()))
            .collect();
        let pools = EventPools::from([("SF".to_string(), vec!["A1".to_string(), "A2".to_string()])]);
        let result = PoolAssigner::new(["SF"], pools).run(&table, &mut rng).unwrap();

        assert_eq!(
            result.outcome().termination_reason(),
            &AnnealTerminationReason::Converged
        );
        assert_eq!(result.outcome().statistics().iterations, 0);
        assert_eq!(result.score().total(), 0.0);
    }

    #[test]
    fn test_same_seed_same_assignment() {
        let run = |seed| {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            assigner()
                .with_anneal_options(AnnealOptions::default().with_max_iters(500))
                .run(&table(), &mut rng)
                .unwrap()
                .into_table()
        };
        assert_eq!(run(9), run(9));
    }

    #[test]
    fn test_rejects_duplicate_keys() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut input = table();
        input.push(EntryRecord::new("p0").with_signup("SF", Signup::open()));
        assert!(matches!(
            assigner().run(&input, &mut rng),
            Err(AnnealError::Model(seedpool_model::error::ModelError::DuplicateKey(_)))
        ));
    }

    #[test]
    fn test_rejects_team_with_dissimilar_pools() {
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let input: EntryTable = [
            EntryRecord::new("a").with_signup("DB", Signup::assigned("C1").with_entry("t")),
            EntryRecord::new("b").with_signup("DB", Signup::assigned("C2").with_entry("t")),
        ]
        .into_iter()
        .collect();
        assert!(matches!(
            PoolAssigner::new(["DB"], pools()).run(&input, &mut rng),
            Err(AnnealError::Model(
                seedpool_model::error::ModelError::DissimilarAssignments { .. }
            ))
        ));
    }

    #[test]
    fn test_rejects_malformed_temperature() {
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let options = AnnealOptions::default()
            .with_temperature(crate::temperature::TemperatureSpec::Values(vec![1.0, -1.0, 5.0]));
        assert!(matches!(
            assigner().with_anneal_options(options).run(&table(), &mut rng),
            Err(AnnealError::NonPositiveTemperature(_))
        ));
    }
}
