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

//! # Seed and pool assignment
//!
//! `SeedPoolAssigner` places seeded entrants into pools through their seeds.
//! Every *key event* (an event where some entrant carries a value) gets:
//!
//! - seeds `1..=n` by descending value, free within each group of equal
//!   values;
//! - a map from seed to pool position, following bracket lines when the
//!   event is a bracket event with a power-of-two pool count and snaking
//!   across the pools otherwise;
//! - a pool order, mapping positions to pools, which may change through the
//!   flips of the event's [`ReorderMethod`].
//!
//! The search mixes two moves: swapping the seeds of two equal-valued
//! entrants, and flipping the pool order. Each move re-places the affected
//! entrants, so the score (schedule cost, pool distribution of the key
//! events, and seed balance over bracket lines) is updated exactly.
//!
//! Seed balance is scaled down when its lower bound exceeds that of the
//! rest of the score, so neither part drowns the other.
//!
//! Only rows with at least one seeded key-event signup take part. Key events
//! cannot hold pools beforehand and their values must be positive.

use crate::{
    bracket::rank_seeds,
    engine::{AnnealProblem, Proposal},
    error::AnnealError,
    monitor::anneal_monitor::{AnnealMonitor, NoOpMonitor},
    options::AnnealOptions,
    reorder::{ReorderConfig, ReorderList},
    result::AnnealOutcome,
    sampler::WeightedSampler,
};
use rand::Rng;
use seedpool_core::bracket::reverse_seed_map;
use seedpool_cost::{
    board::ScoreBoard,
    layout::{EntrantSpec, EventSpec, Layout, Score},
    options::{BracketMode, CostOptions, DistributionMode, ScheduleMode},
    order::PoolOrder,
};
use seedpool_model::{
    index::{EntrantIndex, EventIndex, RowIndex},
    location::Location,
    phase::{chain_for, phase_chains, EventPools, PhaseChain, Transition},
    roster::{Entrant, Roster},
    table::{EntryRecord, EntryTable, Slot},
};
use std::collections::BTreeMap;

/// Iterations per key-event signup when no cap is given.
const ITERS_PER_SIGNUP: u64 = 100;

/// A per-event switch with a value for unlisted events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventSwitch {
    default: bool,
    events: BTreeMap<String, bool>,
}

impl EventSwitch {
    /// The same value for every event.
    #[inline]
    pub fn uniform(value: bool) -> Self {
        Self {
            default: value,
            events: BTreeMap::new(),
        }
    }

    pub fn with_event<S: Into<String>>(mut self, event: S, value: bool) -> Self {
        self.events.insert(event.into(), value);
        self
    }

    #[inline]
    pub fn get(&self, event: &str) -> bool {
        self.events.get(event).copied().unwrap_or(self.default)
    }
}

#[derive(Debug, Clone)]
pub struct SeedPoolAssigner {
    events: Vec<String>,
    pools: EventPools,
    transitions: BTreeMap<String, Vec<Transition>>,
    true_events: Vec<String>,
    locations: Vec<Location>,
    cost: CostOptions,
    anneal: AnnealOptions,
    pool_order: PoolOrder,
    event_orders: BTreeMap<String, PoolOrder>,
    reorder: ReorderConfig,
    bracket_events: EventSwitch,
    skip_bracket_cost: EventSwitch,
}

impl SeedPoolAssigner {
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
            pool_order: PoolOrder::Lexical,
            event_orders: BTreeMap::new(),
            reorder: ReorderConfig::default(),
            bracket_events: EventSwitch::uniform(true),
            skip_bracket_cost: EventSwitch::uniform(false),
        }
    }

    #[inline]
    pub fn with_transitions(mut self, transitions: BTreeMap<String, Vec<Transition>>) -> Self {
        self.transitions = transitions;
        self
    }

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

    /// Cost options; the schedule is always scored in completed mode.
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

    /// Initial pool order of every event without its own.
    #[inline]
    pub fn with_pool_order(mut self, order: PoolOrder) -> Self {
        self.pool_order = order;
        self
    }

    pub fn with_event_pool_order<S: Into<String>>(mut self, event: S, order: PoolOrder) -> Self {
        self.event_orders.insert(event.into(), order);
        self
    }

    #[inline]
    pub fn with_reorder(mut self, reorder: ReorderConfig) -> Self {
        self.reorder = reorder;
        self
    }

    /// Events whose seeds follow bracket lines. Defaults to all.
    #[inline]
    pub fn with_bracket_events(mut self, events: EventSwitch) -> Self {
        self.bracket_events = events;
        self
    }

    /// Events whose seed balance is not scored. Defaults to none.
    #[inline]
    pub fn with_skip_bracket_cost(mut self, events: EventSwitch) -> Self {
        self.skip_bracket_cost = events;
        self
    }

    fn order_for(&self, event: &str) -> &PoolOrder {
        self.event_orders.get(event).unwrap_or(&self.pool_order)
    }

    /// Runs the assignment.
    ///
    /// # Errors
    ///
    /// Fails before searching if primary keys repeat, a key event holds a
    /// pool, a value is not positive, a reorder method is illegal, team
    /// members disagree, or the temperature schedule is malformed.
    pub fn run<R>(&self, table: &EntryTable, rng: &mut R) -> Result<SeedPoolAssignment, AnnealError>
    where
        R: Rng + ?Sized,
    {
        self.run_with_monitor(table, &mut NoOpMonitor, rng)
    }

    /// Like [`SeedPoolAssigner::run`], reporting to `monitor`.
    pub fn run_with_monitor<M, R>(
        &self,
        table: &EntryTable,
        monitor: &mut M,
        rng: &mut R,
    ) -> Result<SeedPoolAssignment, AnnealError>
    where
        M: AnnealMonitor + ?Sized,
        R: Rng + ?Sized,
    {
        let prepared = self.prepare(table, rng)?;
        let engine = self.anneal.engine(prepared.default_iters)?;

        tracing::debug!(
            key_events = prepared.keys.len(),
            rows = prepared.work.len(),
            max_iters = engine.max_iters(),
            minimum = prepared.layout.minimum().total(),
            "starting seed and pool assignment"
        );

        let Prepared {
            mut work,
            rows,
            layout,
            decisions,
            keys,
            moves,
            ..
        } = prepared;
        let mut problem = SeedPoolProblem::new(&layout, decisions, keys, moves);
        let mut monitors = self.anneal.monitors(monitor);
        let outcome = engine.run(&mut problem, &mut monitors, rng);

        crate::pools::write_slots(
            &layout,
            problem.board.decisions(),
            problem.keys.iter().map(|k| k.pool_event),
            &mut work,
        );
        let mut out = table.clone();
        for (i, &row) in rows.iter().enumerate() {
            let record = work.record(RowIndex::new(i));
            for key in &problem.keys {
                if let Some(signup) = record.signup(&key.name) {
                    out.record_mut(row).set_slot(&key.name, signup.slot.clone());
                }
            }
        }

        let mut orders = BTreeMap::new();
        let mut seeds = BTreeMap::new();
        for key in &problem.keys {
            let labels = layout.options(key.pool_event);
            orders.insert(
                key.name.clone(),
                key.order.iter().map(|&o| labels[o].clone()).collect::<Vec<_>>(),
            );
            seeds.insert(
                key.name.clone(),
                key.seeded
                    .iter()
                    .zip(&key.seeds)
                    .map(|(&i, &s)| (layout.entrant_key(key.pool_event, i).to_string(), s))
                    .collect::<Vec<_>>(),
            );
        }

        let score = problem.board.score();
        let minimum = layout.minimum();
        tracing::info!(
            score = score.total(),
            minimum = minimum.total(),
            iterations = outcome.statistics().iterations,
            seed_swaps = outcome.statistics().accepted("seed"),
            order_swaps = outcome.statistics().accepted("order"),
            reason = %outcome.termination_reason(),
            "seed and pool assignment finished"
        );

        Ok(SeedPoolAssignment {
            table: out,
            orders,
            seeds,
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

        let seeded_in = |record: &EntryRecord, event: &str| {
            record.signup(event).is_some_and(|s| s.value.is_some())
        };
        let key_events: Vec<&str> = self
            .events
            .iter()
            .map(String::as_str)
            .filter(|&e| table.records().iter().any(|r| seeded_in(r, e)))
            .collect();
        validate_key_events(table, &key_events)?;

        let mut starts = Vec::with_capacity(key_events.len());
        for &event in &key_events {
            let chain = chain_for(event, &chains, &self.pools)?;
            let npools = chain.pools().len();
            let reorder = ReorderList::new(event, &self.reorder.method_for(event), npools)?;
            let mut order = vec![0; npools];
            for (pool, position) in self.order_for(event).positions(chain.pools()).into_iter().enumerate() {
                order[position] = pool;
            }
            reorder.randomize(&mut order, rng);
            starts.push((chain, reorder, order));
        }

        let rows: Vec<RowIndex> = table
            .iter()
            .filter(|(_, r)| key_events.iter().any(|&e| seeded_in(r, e)))
            .map(|(row, _)| row)
            .collect();
        let work = table.select(&rows);

        let mut specs = Vec::new();
        let mut keys = Vec::with_capacity(key_events.len());
        let mut seed_specs = Vec::with_capacity(key_events.len());
        for (k, (&event, (chain, reorder, order))) in key_events.iter().zip(starts).enumerate() {
            let roster = Roster::derive(&work, event)?;
            if roster.entrants().iter().any(Entrant::has_mixed_values) {
                tracing::warn!(
                    event,
                    "members of some teams have both missing and present values"
                );
            }
            let (seeded, values): (Vec<EntrantIndex>, Vec<f64>) = roster
                .iter()
                .filter_map(|(i, e)| e.seeded_value().map(|v| (i, v)))
                .unzip();
            let (seeds, groups) = rank_seeds(&values, rng);

            let npools = chain.pools().len();
            let by_bracket = self.bracket_events.get(event) && npools.is_power_of_two();
            let (positions, lines) = seed_positions(seeds.len(), npools, by_bracket);

            let mut spec = EventSpec::pools(&roster, chain)?
                .with_order(self.order_for(event).clone())
                .with_tiers(false)
                .with_distribution(DistributionMode::Max);
            for (entrant, spec_entrant) in roster.entrants().iter().zip(spec.entrants.iter_mut()) {
                spec_entrant.distributed = entrant.seeded_value().is_some();
            }
            specs.push(spec);

            seed_specs.push(match lines {
                Some(lines) if !self.skip_bracket_cost.get(event) => {
                    let entrants = seeded
                        .iter()
                        .zip(values.iter().zip(&seeds))
                        .map(|(&i, (&value, &seed))| {
                            let entrant = roster.entrant(i);
                            EntrantSpec {
                                key: entrant.key().to_string(),
                                members: entrant.members().to_vec(),
                                weight: 1.0,
                                value,
                                decision: Some(seed - 1),
                                distributed: true,
                            }
                        })
                        .collect();
                    Some(
                        EventSpec::seeds(format!("{}.Seed", event), lines, entrants)
                            .with_bracket(BracketMode::All)
                            .with_distribution(DistributionMode::First),
                    )
                }
                _ => None,
            });

            keys.push(KeyEvent {
                name: event.to_string(),
                pool_event: EventIndex::new(k),
                seed_event: None,
                seeded,
                seeds,
                groups: groups
                    .into_iter()
                    .map(|g| {
                        let weight = g.len() as f64 - 1.0;
                        (g, weight)
                    })
                    .collect(),
                positions,
                order,
                reorder,
            });
        }

        for event in &self.events {
            if key_events.contains(&event.as_str()) {
                continue;
            }
            specs.push(self.fixed_spec(&work, event, &chains)?);
        }
        for event in &self.true_events {
            if self.events.contains(event) {
                continue;
            }
            specs.push(self.fixed_spec(&work, event, &chains)?);
        }
        for (key, spec) in keys.iter_mut().zip(seed_specs) {
            if let Some(spec) = spec {
                key.seed_event = Some(EventIndex::new(specs.len()));
                specs.push(spec);
            }
        }

        let options = self.cost.clone().with_schedule_mode(ScheduleMode::Completed);
        let mut layout = Layout::compile(&work, specs, &self.locations, &options)?;

        let seed_events: Vec<EventIndex> = keys.iter().filter_map(|k| k.seed_event).collect();
        let seed_minimum: f64 = seed_events
            .iter()
            .map(|&e| layout.distribution_minimum(e))
            .sum();
        let pool_minimum = layout.minimum().total() - seed_minimum;
        if seed_minimum > pool_minimum {
            let scale = pool_minimum / seed_minimum;
            for &e in &seed_events {
                layout.set_scale(e, scale);
            }
        }

        let mut decisions = layout.initial_decisions();
        for key in &keys {
            for (j, &entrant) in key.seeded.iter().enumerate() {
                decisions[layout.decision_index(key.pool_event, entrant)] = Some(key.option_of(j));
            }
        }

        let moves = keys
            .iter()
            .enumerate()
            .flat_map(|(k, key)| {
                let flips = if !key.reorder.is_empty() && key.order.len() > 1 {
                    key.order.len() as f64
                } else {
                    0.0
                };
                [(Move::Seed(k), key.groups.total()), (Move::Order(k), flips)]
            })
            .collect();

        let signups: usize = key_events.iter().map(|e| work.signup_count(e)).sum();
        Ok(Prepared {
            work,
            rows,
            layout,
            decisions,
            keys,
            moves,
            default_iters: ITERS_PER_SIGNUP * signups as u64,
        })
    }

    /// An event whose slots stay as they are.
    fn fixed_spec(
        &self,
        work: &EntryTable,
        event: &str,
        chains: &BTreeMap<String, PhaseChain>,
    ) -> Result<EventSpec, AnnealError> {
        let chain = chain_for(event, chains, &self.pools)?;
        let roster = Roster::derive(work, event)?;
        Ok(EventSpec::pools(&roster, chain)?.with_distribution(DistributionMode::None))
    }
}

fn validate_key_events(table: &EntryTable, key_events: &[&str]) -> Result<(), AnnealError> {
    for &event in key_events {
        for record in table.records() {
            if let Some(Slot::Pool(pool)) = record.signup(event).map(|s| &s.slot) {
                return Err(AnnealError::PreassignedSeededPool {
                    event: event.to_string(),
                    entry: record.key().to_string(),
                    pool: pool.clone(),
                });
            }
        }
    }
    for &event in key_events {
        for record in table.records() {
            match record.signup(event).and_then(|s| s.value) {
                Some(value) if value <= 0.0 => {
                    return Err(AnnealError::NonPositiveValue {
                        event: event.to_string(),
                        entry: record.key().to_string(),
                        value,
                    });
                }
                _ => {}
            }
        }
    }
    Ok(())
}

/// Pool position of every seed, and the bracket lines when seeds follow
/// a bracket.
///
/// Bracket seeds sit at `line * npools / lines`. Otherwise seeds snake:
/// left to right on even rows of `npools` seeds, right to left on odd rows.
fn seed_positions(seeds: usize, npools: usize, by_bracket: bool) -> (Vec<usize>, Option<Vec<usize>>) {
    if by_bracket {
        let lines = reverse_seed_map(seeds);
        let n = lines.len();
        let positions = lines.iter().map(|&l| l * npools / n).collect();
        return (positions, Some(lines));
    }
    let n = seeds.div_ceil(npools) * npools;
    let positions = (0..n)
        .map(|r| {
            if (r / npools) % 2 == 0 {
                r % npools
            } else {
                npools - 1 - r % npools
            }
        })
        .collect();
    (positions, None)
}

/// Result of a [`SeedPoolAssigner`] run.
#[derive(Debug, Clone)]
pub struct SeedPoolAssignment {
    table: EntryTable,
    orders: BTreeMap<String, Vec<String>>,
    seeds: BTreeMap<String, Vec<(String, usize)>>,
    score: Score,
    minimum: Score,
    outcome: AnnealOutcome,
}

impl SeedPoolAssignment {
    /// The input table with the seeded signups of every key event placed.
    #[inline]
    pub fn table(&self) -> &EntryTable {
        &self.table
    }

    #[inline]
    pub fn into_table(self) -> EntryTable {
        self.table
    }

    /// Final pool order of a key event: the pool at every position.
    pub fn order(&self, event: &str) -> Option<&[String]> {
        self.orders.get(event).map(Vec::as_slice)
    }

    #[inline]
    pub fn orders(&self) -> &BTreeMap<String, Vec<String>> {
        &self.orders
    }

    /// Entry keys and seeds of a key event.
    pub fn seeds(&self, event: &str) -> Option<&[(String, usize)]> {
        self.seeds.get(event).map(Vec::as_slice)
    }

    #[inline]
    pub fn score(&self) -> Score {
        self.score
    }

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
    rows: Vec<RowIndex>,
    layout: Layout,
    decisions: Vec<Option<usize>>,
    keys: Vec<KeyEvent>,
    moves: WeightedSampler<Move>,
    default_iters: u64,
}

/// Search state of one key event. Entrant `j` of the seed event is
/// `seeded[j]` of the pool event.
struct KeyEvent {
    name: String,
    pool_event: EventIndex,
    seed_event: Option<EventIndex>,
    seeded: Vec<EntrantIndex>,
    seeds: Vec<usize>,
    groups: WeightedSampler<Vec<usize>>,
    // [seed - 1] -> position
    positions: Vec<usize>,
    // [position] -> option
    order: Vec<usize>,
    reorder: ReorderList,
}

impl KeyEvent {
    #[inline]
    fn option_of(&self, j: usize) -> usize {
        self.order[self.positions[self.seeds[j] - 1]]
    }

    fn place(&self, layout: &Layout, board: &mut ScoreBoard, j: usize) {
        board.reassign(layout, self.pool_event, self.seeded[j], Some(self.option_of(j)));
        if let Some(event) = self.seed_event {
            board.reassign(layout, event, EntrantIndex::new(j), Some(self.seeds[j] - 1));
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Move {
    Seed(usize),
    Order(usize),
}

/// What to restore besides the board when a move is rejected.
enum Pending {
    Seeds { key: usize, a: usize, b: usize },
    Order { key: usize, previous: Vec<usize> },
}

struct SeedPoolProblem<'a> {
    layout: &'a Layout,
    board: ScoreBoard,
    minimum: f64,
    keys: Vec<KeyEvent>,
    moves: WeightedSampler<Move>,
    pending: Option<Pending>,
}

impl<'a> SeedPoolProblem<'a> {
    fn new(
        layout: &'a Layout,
        decisions: Vec<Option<usize>>,
        keys: Vec<KeyEvent>,
        moves: WeightedSampler<Move>,
    ) -> Self {
        Self {
            layout,
            board: ScoreBoard::new(layout, decisions),
            minimum: layout.minimum().total(),
            keys,
            moves,
            pending: None,
        }
    }
}

impl AnnealProblem for SeedPoolProblem<'_> {
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
        let chosen = *self.moves.sample(rng)?;
        self.board.begin();
        match chosen {
            Move::Seed(k) => {
                let key = &mut self.keys[k];
                let group = key.groups.sample(rng)?;
                let i = rng.random_range(0..group.len());
                let mut j = rng.random_range(0..group.len() - 1);
                if j >= i {
                    j += 1;
                }
                let (a, b) = (group[i], group[j]);

                key.seeds.swap(a, b);
                key.place(self.layout, &mut self.board, a);
                key.place(self.layout, &mut self.board, b);
                self.pending = Some(Pending::Seeds { key: k, a, b });
            }
            Move::Order(k) => {
                let key = &mut self.keys[k];
                let flip = key.reorder.choose(rng)?.clone();
                let previous = key.order.clone();
                flip.apply(&mut key.order);
                for j in 0..key.seeded.len() {
                    if flip.moves(key.positions[key.seeds[j] - 1]) {
                        key.place(self.layout, &mut self.board, j);
                    }
                }
                self.pending = Some(Pending::Order { key: k, previous });
            }
        }

        let delta = self.board.settle(self.layout);
        let kind = match chosen {
            Move::Seed(_) => "seed",
            Move::Order(_) => "order",
        };
        Some(Proposal::new(kind, delta))
    }

    #[inline]
    fn accept(&mut self) {
        self.board.commit();
        self.pending = None;
    }

    fn reject(&mut self) {
        self.board.rollback();
        match self.pending.take() {
            Some(Pending::Seeds { key, a, b }) => self.keys[key].seeds.swap(a, b),
            Some(Pending::Order { key, previous }) => self.keys[key].order = previous,
            None => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reorder::ReorderMethod;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use seedpool_model::table::Signup;

    fn pools() -> EventPools {
        let names = |ps: &[&str]| ps.iter().map(|p| p.to_string()).collect::<Vec<_>>();
        EventPools::from([
            ("SF".to_string(), names(&["A1", "A2", "B1", "B2"])),
            ("MK".to_string(), names(&["A3", "B3", "C3"])),
            ("DB".to_string(), names(&["C1", "C2"])),
            ("TR".to_string(), names(&["A9", "C9"])),
        ])
    }

    fn table() -> EntryTable {
        (0..14)
            .map(|i| {
                let mut record = EntryRecord::new(format!("p{}", i))
                    .with_attribute("club", if i % 2 == 0 { "north" } else { "south" });
                if i < 12 {
                    record = record.with_signup("SF", Signup::open().with_value((i % 3 + 1) as f64));
                }
                if (6..12).contains(&i) {
                    record = record.with_signup("MK", Signup::open().with_value((i % 2 + 1) as f64));
                }
                if i == 0 || i >= 12 {
                    record = record.with_signup("MK", Signup::open());
                }
                match i {
                    0 => record = record.with_signup("DB", Signup::assigned("C1")),
                    1 | 3 => record = record.with_signup("DB", Signup::open()),
                    2 => record = record.with_signup("DB", Signup::assigned("C2")),
                    4 => record = record.with_signup("TR", Signup::assigned("A9")),
                    5 => record = record.with_signup("TR", Signup::assigned("C9")),
                    _ => {}
                }
                record
            })
            .collect()
    }

    fn assigner() -> SeedPoolAssigner {
        SeedPoolAssigner::new(["SF", "MK", "DB"], pools())
            .with_true_events(["TR"])
            .with_locations([Location::single("club")])
    }

    fn slot_of<'t>(table: &'t EntryTable, key: &str, event: &str) -> &'t Slot {
        let row = table.row_of(key).unwrap();
        &table.record(row).signup(event).unwrap().slot
    }

    fn index_of(key: &str) -> usize {
        key[1..].parse().unwrap()
    }

    #[test]
    fn test_seed_positions_snake_and_bracket() {
        let (snake, lines) = seed_positions(7, 3, false);
        assert_eq!(snake, vec![0, 1, 2, 2, 1, 0, 0, 1, 2]);
        assert!(lines.is_none());

        let (bracket, lines) = seed_positions(8, 4, true);
        assert_eq!(lines, Some(vec![0, 4, 6, 2, 3, 7, 5, 1]));
        assert_eq!(bracket, vec![0, 2, 3, 1, 1, 3, 2, 0]);
    }

    #[test]
    fn test_pools_follow_seeds_through_the_order() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let result = assigner().run(&table(), &mut rng).unwrap();
        let out = result.table();

        let order = result.order("SF").unwrap();
        let seeds = result.seeds("SF").unwrap();
        let mut all: Vec<usize> = seeds.iter().map(|&(_, s)| s).collect();
        all.sort_unstable();
        assert_eq!(all, (1..=12).collect::<Vec<_>>());
        let lines = reverse_seed_map(12);
        for (key, seed) in seeds {
            let pool = order[lines[seed - 1] * 4 / 16].as_str();
            assert_eq!(slot_of(out, key, "SF"), &Slot::pool(pool));
        }

        let order = result.order("MK").unwrap();
        let seeds = result.seeds("MK").unwrap();
        assert_eq!(seeds.len(), 6);
        for (key, seed) in seeds {
            let r = seed - 1;
            let position = if (r / 3) % 2 == 0 { r % 3 } else { 2 - r % 3 };
            assert_eq!(slot_of(out, key, "MK"), &Slot::pool(order[position].as_str()));
        }
    }

    #[test]
    fn test_seeds_follow_descending_values() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let result = assigner().run(&table(), &mut rng).unwrap();
        for (key, seed) in result.seeds("SF").unwrap() {
            let expected = match index_of(key) % 3 + 1 {
                3 => 1..=4,
                2 => 5..=8,
                _ => 9..=12,
            };
            assert!(expected.contains(seed), "{} got seed {}", key, seed);
        }
    }

    #[test]
    fn test_other_signups_are_left_alone() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let input = table();
        let result = assigner().run(&input, &mut rng).unwrap();
        let out = result.table();

        assert_eq!(out.len(), input.len());
        assert!(slot_of(out, "p0", "MK").is_open());
        assert!(slot_of(out, "p12", "MK").is_open());
        assert!(slot_of(out, "p13", "MK").is_open());
        assert_eq!(slot_of(out, "p0", "DB"), &Slot::pool("C1"));
        assert!(slot_of(out, "p1", "DB").is_open());
        assert_eq!(slot_of(out, "p5", "TR"), &Slot::pool("C9"));
        assert!(result.order("DB").is_none());
    }

    #[test]
    fn test_incremental_delta_matches_full_evaluation() {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let prepared = assigner()
            .with_reorder(ReorderMethod::Relaxed.into())
            .prepare(&table(), &mut rng)
            .unwrap();
        let layout = &prepared.layout;
        let mut problem = SeedPoolProblem::new(layout, prepared.decisions, prepared.keys, prepared.moves);
        let full = layout.evaluate(problem.board.decisions()).total();
        assert!((problem.score() - full).abs() < 1e-9);

        let mut kinds = Vec::new();
        for _ in 0..400 {
            let before = problem.score();
            let proposal = problem.propose(&mut rng).unwrap();
            kinds.push(proposal.kind);
            let full = layout.evaluate(problem.board.decisions()).total();
            assert!((before + proposal.delta - full).abs() < 1e-9);

            if rng.random_bool(0.5) {
                problem.accept();
            } else {
                problem.reject();
                assert!((problem.score() - before).abs() < 1e-9);
            }

            let decisions = problem.board.decisions();
            for key in &problem.keys {
                let mut seeds = key.seeds.clone();
                seeds.sort_unstable();
                assert_eq!(seeds, (1..=key.seeds.len()).collect::<Vec<_>>());
                for (j, &entrant) in key.seeded.iter().enumerate() {
                    let index = layout.decision_index(key.pool_event, entrant);
                    assert_eq!(decisions[index], Some(key.option_of(j)));
                    if let Some(e) = key.seed_event {
                        let index = layout.decision_index(e, EntrantIndex::new(j));
                        assert_eq!(decisions[index], Some(key.seeds[j] - 1));
                    }
                }
            }
        }
        assert!(kinds.contains(&"seed"));
        assert!(kinds.contains(&"order"));
    }

    #[test]
    fn test_seed_balance_is_scaled_down_to_the_pool_bound() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let prepared = assigner().prepare(&table(), &mut rng).unwrap();
        let seed_event = prepared.keys[0].seed_event.unwrap();
        assert_eq!(prepared.layout.event_name(seed_event), "SF.Seed");
        assert!(prepared.keys[1].seed_event.is_none());

        let scale = prepared.layout.scale(seed_event);
        assert!(scale > 0.0 && scale <= 1.0);
        let seed_minimum = prepared.layout.distribution_minimum(seed_event);
        let rest = prepared.layout.minimum().total() - seed_minimum;
        assert!(seed_minimum <= rest + 1e-9);
    }

    #[test]
    fn test_switches_drop_the_bracket_map() {
        let mut rng = ChaCha8Rng::seed_from_u64(6);
        let prepared = assigner()
            .with_skip_bracket_cost(EventSwitch::uniform(true))
            .prepare(&table(), &mut rng)
            .unwrap();
        assert!(prepared.keys.iter().all(|k| k.seed_event.is_none()));
        assert_eq!(prepared.keys[0].positions.len(), 16);

        let prepared = assigner()
            .with_bracket_events(EventSwitch::uniform(true).with_event("SF", false))
            .prepare(&table(), &mut rng)
            .unwrap();
        assert!(prepared.keys[0].seed_event.is_none());
        assert_eq!(prepared.keys[0].positions, seed_positions(12, 4, false).0);
    }

    #[test]
    fn test_frozen_order_never_changes() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let result = assigner()
            .with_reorder(ReorderMethod::Frozen.into())
            .with_event_pool_order("SF", PoolOrder::sequence(&["B2", "A1", "B1", "A2"]))
            .with_anneal_options(AnnealOptions::default().with_max_iters(500))
            .run(&table(), &mut rng)
            .unwrap();
        assert_eq!(result.order("SF").unwrap(), &["B2", "A1", "B1", "A2"]);
        assert_eq!(result.order("MK").unwrap(), &["A3", "B3", "C3"]);
        assert_eq!(result.outcome().statistics().accepted("order"), 0);
    }

    #[test]
    fn test_final_score_not_below_minimum() {
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let result = assigner()
            .with_anneal_options(AnnealOptions::default().with_max_iters(1_500))
            .run(&table(), &mut rng)
            .unwrap();
        assert!(result.score().total() >= result.minimum().total() - 1e-7);
        assert!((result.outcome().score() - result.score().total()).abs() < 1e-6);
    }

    #[test]
    fn test_same_seed_same_assignment() {
        let run = |seed| {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let result = assigner()
                .with_anneal_options(AnnealOptions::default().with_max_iters(300))
                .run(&table(), &mut rng)
                .unwrap();
            (result.orders().clone(), result.into_table())
        };
        assert_eq!(run(11), run(11));
    }

    #[test]
    fn test_rejects_preassigned_key_event() {
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let mut input = table();
        input.push(EntryRecord::new("late").with_signup("SF", Signup::assigned("A1")));
        assert!(matches!(
            assigner().run(&input, &mut rng),
            Err(AnnealError::PreassignedSeededPool { ref entry, .. }) if entry == "late"
        ));
    }

    #[test]
    fn test_rejects_non_positive_values() {
        let mut rng = ChaCha8Rng::seed_from_u64(10);
        let mut input = table();
        input.push(EntryRecord::new("zero").with_signup("SF", Signup::open().with_value(0.0)));
        assert!(matches!(
            assigner().run(&input, &mut rng),
            Err(AnnealError::NonPositiveValue { ref entry, .. }) if entry == "zero"
        ));
    }

    #[test]
    fn test_rejects_key_event_without_pools() {
        use seedpool_model::error::ModelError;

        let mut rng = ChaCha8Rng::seed_from_u64(12);
        let mut empty = pools();
        empty.insert("SF".to_string(), Vec::new());
        let assigner = SeedPoolAssigner::new(["SF", "MK", "DB"], empty);
        assert!(matches!(
            assigner.run(&table(), &mut rng),
            Err(AnnealError::Model(ModelError::NoPools(ref event))) if event == "SF"
        ));
    }

    #[test]
    fn test_rejects_illegal_custom_reorder() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let reorder = ReorderMethod::Custom(vec![(vec![1, 2], vec![1, 3])]);
        assert!(matches!(
            assigner().with_reorder(reorder.into()).run(&table(), &mut rng),
            Err(AnnealError::IllegalReorder { .. })
        ));
    }
}
