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

//! # Bracket seeding
//!
//! `BracketSeeder` numbers the entrants of one event `1..=n` for a single
//! elimination bracket. Seeds follow descending value; among entrants of
//! equal value the order is free, and the search uses that freedom to
//! spread the field evenly over every bracket section, optionally per
//! location.
//!
//! The cost is the distribution cost of a seed event whose buckets are the
//! bracket lines (`reverse_seed_map`), with bracket accounting on every
//! tier. A swap exchanges the seeds of two entrants of equal value, the
//! value group drawn by its number of pairs.

use crate::{
    engine::{AnnealProblem, Proposal},
    error::AnnealError,
    monitor::anneal_monitor::{AnnealMonitor, NoOpMonitor},
    options::AnnealOptions,
    result::{AnnealOutcome, AnnealTerminationReason},
    sampler::WeightedSampler,
    stats::AnnealStatistics,
};
use rand::{seq::SliceRandom, Rng};
use seedpool_core::bracket::reverse_seed_map;
use seedpool_cost::{
    board::ScoreBoard,
    layout::{EntrantSpec, EventSpec, Layout, Score},
    options::{BracketMode, CostOptions, DistributionMode},
};
use seedpool_model::{
    index::{EntrantIndex, EventIndex},
    location::Location,
    roster::Roster,
    table::EntryTable,
};

/// Iterations per row when no cap is given.
const ITERS_PER_ROW: u64 = 16;

/// Seeds `1..=n` by descending value, ties in order of appearance, then
/// shuffled within every group of equal values.
///
/// Returns the seeds and the groups of equal values (as indices into
/// `values`), ordered by ascending value.
pub(crate) fn rank_seeds<R>(values: &[f64], rng: &mut R) -> (Vec<usize>, Vec<Vec<usize>>)
where
    R: Rng + ?Sized,
{
    let mut by_rank: Vec<usize> = (0..values.len()).collect();
    by_rank.sort_by(|&a, &b| values[b].total_cmp(&values[a]));

    let mut seeds = vec![0; values.len()];
    for (rank, &i) in by_rank.iter().enumerate() {
        seeds[i] = rank + 1;
    }

    let mut groups: Vec<Vec<usize>> = Vec::new();
    for &i in &by_rank {
        match groups.last_mut() {
            Some(group) if values[group[0]] == values[i] => group.push(i),
            _ => groups.push(vec![i]),
        }
    }
    groups.reverse();

    for group in &groups {
        let mut ranks: Vec<usize> = group.iter().map(|&i| seeds[i]).collect();
        ranks.shuffle(rng);
        for (&i, rank) in group.iter().zip(ranks) {
            seeds[i] = rank;
        }
    }
    (seeds, groups)
}

/// Bracket positions (one-based lines) of `seeds` in a bracket sized for the
/// largest seed.
///
/// ```rust
/// use seedpool_anneal::bracket::positions_from_seeds;
///
/// assert_eq!(positions_from_seeds(&[1, 2, 3, 4]), vec![1, 3, 4, 2]);
/// ```
pub fn positions_from_seeds(seeds: &[usize]) -> Vec<usize> {
    let Some(&largest) = seeds.iter().max() else {
        return Vec::new();
    };
    let lines = reverse_seed_map(largest);
    seeds.iter().map(|&s| lines[s - 1] + 1).collect()
}

#[derive(Debug, Clone)]
pub struct BracketSeeder {
    event: String,
    locations: Vec<Location>,
    cost: CostOptions,
    anneal: AnnealOptions,
}

impl BracketSeeder {
    pub fn new<S: Into<String>>(event: S) -> Self {
        Self {
            event: event.into(),
            locations: Vec::new(),
            cost: CostOptions::default(),
            anneal: AnnealOptions::default(),
        }
    }

    pub fn with_locations<I>(mut self, locations: I) -> Self
    where
        I: IntoIterator<Item = Location>,
    {
        self.locations = locations.into_iter().collect();
        self
    }

    /// Cost options; schedule cost is always skipped.
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

    /// Seeds the entrants of the event in `table`.
    ///
    /// # Errors
    ///
    /// Fails if team members hold different slots or the temperature
    /// schedule is malformed.
    pub fn run<R>(&self, table: &EntryTable, rng: &mut R) -> Result<BracketSeeding, AnnealError>
    where
        R: Rng + ?Sized,
    {
        self.run_with_monitor(table, &mut NoOpMonitor, rng)
    }

    /// Like [`BracketSeeder::run`], reporting to `monitor`.
    pub fn run_with_monitor<M, R>(
        &self,
        table: &EntryTable,
        monitor: &mut M,
        rng: &mut R,
    ) -> Result<BracketSeeding, AnnealError>
    where
        M: AnnealMonitor + ?Sized,
        R: Rng + ?Sized,
    {
        let roster = Roster::derive(table, &self.event)?;
        let rows: usize = roster.entrants().iter().map(|e| e.members().len()).sum();
        let engine = self.anneal.engine(ITERS_PER_ROW * rows as u64)?;

        let values: Vec<f64> = roster.entrants().iter().map(|e| e.filled_value()).collect();
        let (seeds, groups) = rank_seeds(&values, rng);
        let layout = self.compile(table, &roster, &values, &seeds)?;

        let swappable: WeightedSampler<Vec<usize>> = groups
            .into_iter()
            .map(|g| {
                let c = g.len() as f64;
                (g, c * (c - 1.0) / 2.0)
            })
            .collect();

        let mut problem = SeedSwapProblem::new(&layout, swappable);
        let outcome = if problem.groups.is_empty() {
            AnnealOutcome::new(
                AnnealTerminationReason::Exhausted,
                problem.score(),
                problem.minimum(),
                AnnealStatistics::default(),
            )
        } else {
            let mut monitors = self.anneal.monitors(monitor);
            engine.run(&mut problem, &mut monitors, rng)
        };

        if engine.is_converged(outcome.score(), outcome.minimum()) {
            tracing::info!(
                event = %self.event,
                iterations = outcome.statistics().iterations,
                "bracket optimized in {} iterations",
                outcome.statistics().iterations
            );
        } else {
            tracing::info!(
                event = %self.event,
                gap = outcome.gap(),
                "maximum iterations reached, bracket {:.3} points from optimal",
                outcome.gap()
            );
        }

        let event = EventIndex::new(0);
        let seeds: Vec<(String, usize)> = problem
            .board
            .decisions()
            .iter()
            .enumerate()
            .map(|(i, d)| {
                let key = layout.entrant_key(event, EntrantIndex::new(i)).to_string();
                (key, d.map_or(0, |o| o + 1))
            })
            .collect();
        let mut row_seeds = vec![None; table.len()];
        for (i, (_, seed)) in seeds.iter().enumerate() {
            for row in layout.entrant_members(event, EntrantIndex::new(i)) {
                row_seeds[row.get()] = Some(*seed);
            }
        }

        Ok(BracketSeeding {
            seeds,
            row_seeds,
            score: problem.board.score(),
            minimum: layout.minimum(),
            outcome,
        })
    }

    fn compile(
        &self,
        table: &EntryTable,
        roster: &Roster,
        values: &[f64],
        seeds: &[usize],
    ) -> Result<Layout, AnnealError> {
        let entrants = roster
            .entrants()
            .iter()
            .zip(values.iter().zip(seeds))
            .map(|(entrant, (&value, &seed))| EntrantSpec {
                key: entrant.key().to_string(),
                members: entrant.members().to_vec(),
                weight: 1.0,
                value,
                decision: Some(seed - 1),
                distributed: true,
            })
            .collect();
        let spec = EventSpec::seeds(
            format!("{}.Seed", self.event),
            reverse_seed_map(seeds.len()),
            entrants,
        )
        .with_bracket(BracketMode::All)
        .with_distribution(DistributionMode::First);

        let options = self.cost.clone().with_skip_schedule(true);
        Ok(Layout::compile(table, vec![spec], &self.locations, &options)?)
    }
}

/// Result of a [`BracketSeeder`] run.
#[derive(Debug, Clone)]
pub struct BracketSeeding {
    seeds: Vec<(String, usize)>,
    row_seeds: Vec<Option<usize>>,
    score: Score,
    minimum: Score,
    outcome: AnnealOutcome,
}

impl BracketSeeding {
    /// Entry keys with their seeds, in order of first appearance.
    #[inline]
    pub fn seeds(&self) -> &[(String, usize)] {
        &self.seeds
    }

    pub fn seed_of(&self, entry: &str) -> Option<usize> {
        self.seeds.iter().find(|(k, _)| k == entry).map(|&(_, s)| s)
    }

    /// Seed of every table row, `None` for rows not in the event.
    #[inline]
    pub fn row_seeds(&self) -> &[Option<usize>] {
        &self.row_seeds
    }

    /// Bracket line of every entrant, in the order of [`BracketSeeding::seeds`].
    pub fn positions(&self) -> Vec<usize> {
        let seeds: Vec<usize> = self.seeds.iter().map(|&(_, s)| s).collect();
        positions_from_seeds(&seeds)
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

/// Swaps the seeds of two entrants of equal value.
struct SeedSwapProblem<'a> {
    layout: &'a Layout,
    board: ScoreBoard,
    minimum: f64,
    groups: WeightedSampler<Vec<usize>>,
}

impl<'a> SeedSwapProblem<'a> {
    fn new(layout: &'a Layout, groups: WeightedSampler<Vec<usize>>) -> Self {
        Self {
            layout,
            board: ScoreBoard::initial(layout),
            minimum: layout.minimum().total(),
            groups,
        }
    }
}

impl AnnealProblem for SeedSwapProblem<'_> {
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
        let group = self.groups.sample(rng)?;
        debug_assert!(
            group.len() >= 2,
            "called `SeedSwapProblem::propose` with a value group of {} entrants",
            group.len()
        );
        let i = rng.random_range(0..group.len());
        let mut j = rng.random_range(0..group.len() - 1);
        if j >= i {
            j += 1;
        }

        let event = EventIndex::new(0);
        let (a, b) = (EntrantIndex::new(group[i]), EntrantIndex::new(group[j]));
        let seed_a = self.board.decision(self.layout, event, a);
        let seed_b = self.board.decision(self.layout, event, b);

        self.board.begin();
        self.board.reassign(self.layout, event, a, seed_b);
        self.board.reassign(self.layout, event, b, seed_a);
        let delta = self.board.settle(self.layout);
        Some(Proposal::new("seed", delta))
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
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use seedpool_model::table::{EntryRecord, Signup};

    fn field(values: &[f64]) -> EntryTable {
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| {
                EntryRecord::new(format!("p{}", i))
                    .with_signup("SF", Signup::open().with_value(v))
                    .with_attribute("club", if i % 3 == 0 { "north" } else { "south" })
            })
            .collect()
    }

    #[test]
    fn test_positions_from_seeds() {
        assert_eq!(positions_from_seeds(&[1, 2, 3, 4]), vec![1, 3, 4, 2]);
        assert_eq!(positions_from_seeds(&[3, 1]), vec![4, 1]);
        assert!(positions_from_seeds(&[]).is_empty());
    }

    #[test]
    fn test_rank_seeds_orders_by_value_and_groups_ties() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let values = [2.0, 5.0, 2.0, 1.0, 5.0];
        let (seeds, groups) = rank_seeds(&values, &mut rng);

        let mut top: Vec<usize> = vec![seeds[1], seeds[4]];
        top.sort_unstable();
        assert_eq!(top, vec![1, 2]);
        let mut mid: Vec<usize> = vec![seeds[0], seeds[2]];
        mid.sort_unstable();
        assert_eq!(mid, vec![3, 4]);
        assert_eq!(seeds[3], 5);
        assert_eq!(groups, vec![vec![3], vec![0, 2], vec![1, 4]]);
    }

    #[test]
    fn test_unique_values_skip_the_search() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let result = BracketSeeder::new("SF")
            .run(&field(&[4.0, 3.0, 2.0, 1.0]), &mut rng)
            .unwrap();
        assert_eq!(
            result.outcome().termination_reason(),
            &AnnealTerminationReason::Exhausted
        );
        assert_eq!(result.seed_of("p0"), Some(1));
        assert_eq!(result.seed_of("p3"), Some(4));
        assert_eq!(result.positions(), vec![1, 3, 4, 2]);
    }

    #[test]
    fn test_seeds_are_a_permutation_respecting_value_order() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let values = [3.0, 3.0, 3.0, 3.0, 2.0, 2.0, 2.0, 2.0, 1.0, 1.0, 1.0];
        let result = BracketSeeder::new("SF")
            .with_locations([Location::single("club")])
            .run(&field(&values), &mut rng)
            .unwrap();

        let mut all: Vec<usize> = result.seeds().iter().map(|&(_, s)| s).collect();
        all.sort_unstable();
        assert_eq!(all, (1..=11).collect::<Vec<_>>());
        for (key, seed) in result.seeds() {
            let i: usize = key[1..].parse().unwrap();
            let expected = match values[i] as u32 {
                3 => 1..=4,
                2 => 5..=8,
                _ => 9..=11,
            };
            assert!(expected.contains(seed), "{} got seed {}", key, seed);
        }
        assert!(result.score().total() >= result.minimum().total() - 1e-7);
        assert_eq!(result.row_seeds().len(), values.len());
        assert!(result.row_seeds().iter().all(Option::is_some));
    }

    fn check_delta_law(values: &[f64], rng_seed: u64, steps: usize) {
        let mut rng = ChaCha8Rng::seed_from_u64(rng_seed);
        let table = field(values);
        let seeder = BracketSeeder::new("SF").with_locations([Location::single("club")]);
        let roster = Roster::derive(&table, "SF").unwrap();
        let (seeds, groups) = rank_seeds(values, &mut rng);
        let layout = seeder.compile(&table, &roster, values, &seeds).unwrap();
        let sampler = groups
            .into_iter()
            .map(|g| {
                let c = g.len() as f64;
                (g, c * (c - 1.0) / 2.0)
            })
            .collect();
        let mut problem = SeedSwapProblem::new(&layout, sampler);

        for _ in 0..steps {
            let before = problem.score();
            let proposal = problem.propose(&mut rng).unwrap();
            let full = layout.evaluate(problem.board.decisions()).total();
            assert!((before + proposal.delta - full).abs() < 1e-9);
            if rng.random_bool(0.5) {
                problem.accept();
            } else {
                problem.reject();
            }
            let full = layout.evaluate(problem.board.decisions()).total();
            assert!((problem.score() - full).abs() < 1e-9);

            // equal values only ever trade seeds
            for (i, d) in problem.board.decisions().iter().enumerate() {
                let seed = d.unwrap() + 1;
                let above = values.iter().filter(|&&v| v > values[i]).count();
                let level = values.iter().filter(|&&v| v >= values[i]).count();
                assert!(above < seed && seed <= level, "row {} got seed {}", i, seed);
            }
        }
    }

    #[test]
    fn test_incremental_delta_matches_full_evaluation() {
        check_delta_law(&[2.0, 2.0, 2.0, 2.0, 2.0, 1.0, 1.0, 1.0, 1.0], 4, 200);
    }

    #[test]
    fn test_incremental_delta_with_interleaved_ties() {
        let values = [5.0, 1.0, 3.0, 5.0, 2.0, 3.0, 1.0, 3.0, 5.0, 2.0, 3.0, 1.0, 3.0];
        check_delta_law(&values, 21, 300);
    }

    #[test]
    fn test_equal_field_reaches_minimum() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let values = [1.0; 8];
        let result = BracketSeeder::new("SF")
            .with_anneal_options(AnnealOptions::default().with_max_iters(400))
            .run(&field(&values), &mut rng)
            .unwrap();
        assert!(result.outcome().is_converged());
    }
}
