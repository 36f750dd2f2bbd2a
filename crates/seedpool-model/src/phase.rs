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

//! # Phase Chains
//!
//! An event may run through several phases: the pool an entrant plays in
//! during phase 1 decides, through a transition map, the pool of phase 2,
//! and so on. A `PhaseChain` compiles the transition maps of one event into
//! dense routes:
//!
//! - `phase_pools(k)`: the distinct pools of phase `k` (phase 0 keeps the
//!   configured order, later phases are sorted).
//! - `route(k, i)`: the position, in `phase_pools(k)`, of the pool the
//!   `i`-th phase-0 pool leads to.
//!
//! Entrants may also be placed directly into a pool of a later phase. Such
//! an entrant is absent from every earlier phase and follows the chain from
//! there on; `expand` handles both cases.
//!
//! Events without transitions get the identity chain: one phase whose pools
//! are the event's configured pools.

use crate::{
    error::ModelError,
    index::RowIndex,
    table::{EntryTable, Slot},
};
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;

/// Maps every pool of one phase to a pool of the next.
pub type Transition = BTreeMap<String, String>;

/// Configured phase-0 pools per event.
pub type EventPools = BTreeMap<String, Vec<String>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseChain {
    phases: Vec<Vec<String>>,
    // steps[k][i]: position in phase k + 1 of the successor of phases[k][i]
    steps: Vec<Vec<usize>>,
    entry_points: FxHashMap<String, (usize, usize)>,
}

impl PhaseChain {
    /// A single-phase chain over `pools`.
    pub fn identity<S: AsRef<str>>(pools: &[S]) -> Self {
        Self::build(
            vec![pools.iter().map(|p| p.as_ref().to_string()).collect()],
            Vec::new(),
        )
    }

    /// Compiles a chain from consecutive transition maps.
    ///
    /// When `pools` is `None` the keys of the first transition are the
    /// phase-0 pools.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::IncompleteTransition`] if a pool of some phase
    /// has no entry in the transition leading out of it, and
    /// [`ModelError::NoPools`] if the chain would have no phase-0 pools.
    pub fn from_transitions<S: AsRef<str>>(
        event: &str,
        pools: Option<&[S]>,
        transitions: &[Transition],
    ) -> Result<Self, ModelError> {
        let first: Vec<String> = match pools {
            Some(pools) => pools.iter().map(|p| p.as_ref().to_string()).collect(),
            None => transitions
                .first()
                .map(|t| t.keys().cloned().collect())
                .unwrap_or_default(),
        };
        if first.is_empty() {
            return Err(ModelError::NoPools(event.to_string()));
        }

        let mut phases = vec![first];
        let mut steps = Vec::with_capacity(transitions.len());
        for (k, transition) in transitions.iter().enumerate() {
            let current = &phases[k];
            let mut targets: Vec<&str> = Vec::with_capacity(current.len());
            for pool in current {
                match transition.get(pool) {
                    Some(next) => targets.push(next),
                    None => {
                        return Err(ModelError::IncompleteTransition {
                            event: event.to_string(),
                            phase: k + 1,
                            pool: pool.clone(),
                        })
                    }
                }
            }
            let mut next: Vec<String> = targets.iter().map(|t| t.to_string()).collect();
            next.sort_unstable();
            next.dedup();
            let step = targets
                .iter()
                .map(|t| next.binary_search_by(|p| p.as_str().cmp(t)).unwrap_or_default())
                .collect();
            steps.push(step);
            phases.push(next);
        }

        Ok(Self::build(phases, steps))
    }

    fn build(phases: Vec<Vec<String>>, steps: Vec<Vec<usize>>) -> Self {
        let mut entry_points = FxHashMap::default();
        for (k, pools) in phases.iter().enumerate() {
            for (i, pool) in pools.iter().enumerate() {
                entry_points.entry(pool.clone()).or_insert((k, i));
            }
        }
        Self {
            phases,
            steps,
            entry_points,
        }
    }

    #[inline]
    pub fn num_phases(&self) -> usize {
        self.phases.len()
    }

    #[inline]
    pub fn pools(&self) -> &[String] {
        &self.phases[0]
    }

    #[inline]
    pub fn phase_pools(&self, phase: usize) -> &[String] {
        debug_assert!(
            phase < self.phases.len(),
            "called `PhaseChain::phase_pools` with phase out of bounds: the len is {} but the phase is {}",
            self.phases.len(),
            phase
        );
        &self.phases[phase]
    }

    /// Position in `phase_pools(phase)` reached from `pool` of phase `from`.
    pub fn route_from(&self, from: usize, pool: usize, phase: usize) -> usize {
        debug_assert!(
            from <= phase,
            "called `PhaseChain::route_from` with a target phase before the start phase: {} > {}",
            from,
            phase
        );
        (from..phase).fold(pool, |at, k| self.steps[k][at])
    }

    /// Position in `phase_pools(phase)` reached from the `pool`-th phase-0 pool.
    #[inline]
    pub fn route(&self, phase: usize, pool: usize) -> usize {
        self.route_from(0, pool, phase)
    }

    /// Number of phases holding more than one distinct pool.
    pub fn varying_phases(&self) -> usize {
        self.phases.iter().filter(|p| p.len() > 1).count()
    }

    /// Phase and position at which `pool` enters the chain.
    #[inline]
    pub fn entry_point(&self, pool: &str) -> Option<(usize, usize)> {
        self.entry_points.get(pool).copied()
    }

    /// Per-phase slots of an entrant holding `slot`.
    ///
    /// An open slot stays open in every phase; a pool outside the chain is
    /// absent from every phase.
    pub fn expand(&self, slot: &Slot) -> Vec<Option<Slot>> {
        let n = self.num_phases();
        let Some(pool) = slot.as_pool() else {
            return vec![Some(Slot::Open); n];
        };
        let Some((start, at)) = self.entry_point(pool) else {
            return vec![None; n];
        };
        (0..n)
            .map(|k| {
                (k >= start).then(|| Slot::pool(self.phases[k][self.route_from(start, at, k)].clone()))
            })
            .collect()
    }
}

/// Compiles the phase chains of every event that lists transitions.
///
/// Events also present in `pools` start from their configured pools; the
/// others start from the keys of their first transition.
pub fn phase_chains(
    transitions: &BTreeMap<String, Vec<Transition>>,
    pools: &EventPools,
) -> Result<BTreeMap<String, PhaseChain>, ModelError> {
    transitions
        .iter()
        .map(|(event, ts)| {
            let chain = PhaseChain::from_transitions(
                event,
                pools.get(event).map(Vec::as_slice),
                ts,
            )?;
            Ok((event.clone(), chain))
        })
        .collect()
}

/// The chain of `event`: its compiled transitions, or the identity over its pools.
pub fn chain_for(
    event: &str,
    chains: &BTreeMap<String, PhaseChain>,
    pools: &EventPools,
) -> Result<PhaseChain, ModelError> {
    if let Some(chain) = chains.get(event) {
        return Ok(chain.clone());
    }
    match pools.get(event) {
        Some(p) if !p.is_empty() => Ok(PhaseChain::identity(p.as_slice())),
        _ => Err(ModelError::NoPools(event.to_string())),
    }
}

/// One derived per-phase column of the table.
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseColumn {
    event: String,
    phase: usize,
    cells: Vec<Option<Slot>>,
}

impl PhaseColumn {
    #[inline]
    pub fn event(&self) -> &str {
        &self.event
    }

    /// Zero-based phase.
    #[inline]
    pub fn phase(&self) -> usize {
        self.phase
    }

    /// Slot of `row` in this phase, `None` when the row does not take part.
    #[inline]
    pub fn cell(&self, row: RowIndex) -> Option<&Slot> {
        self.cells[row.get()].as_ref()
    }
}

impl std::fmt::Display for PhaseColumn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", self.event, self.phase + 1)
    }
}

/// Every row's per-phase slots for a set of events.
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseColumns {
    columns: Vec<PhaseColumn>,
}

impl PhaseColumns {
    #[inline]
    pub fn columns(&self) -> &[PhaseColumn] {
        &self.columns
    }

    pub fn column(&self, event: &str, phase: usize) -> Option<&PhaseColumn> {
        self.columns
            .iter()
            .find(|c| c.event == event && c.phase == phase)
    }

    /// Assigned pools of `row` across every column, in column order.
    pub fn schedule_of(&self, row: RowIndex) -> impl Iterator<Item = &str> + '_ {
        self.columns
            .iter()
            .filter_map(move |c| c.cell(row).and_then(Slot::as_pool))
    }
}

/// Expands every event's slot into one column per phase.
///
/// Events without a chain in `chains` get a single column holding their slot.
pub fn expand_phase_columns<S: AsRef<str>>(
    table: &EntryTable,
    chains: &BTreeMap<String, PhaseChain>,
    events: &[S],
) -> PhaseColumns {
    let mut columns = Vec::new();
    for event in events.iter().map(AsRef::as_ref) {
        let expanded: Vec<Vec<Option<Slot>>> = table
            .records()
            .iter()
            .map(|r| match (r.signup(event), chains.get(event)) {
                (None, Some(chain)) => vec![None; chain.num_phases()],
                (None, None) => vec![None],
                (Some(s), Some(chain)) => chain.expand(&s.slot),
                (Some(s), None) => vec![Some(s.slot.clone())],
            })
            .collect();
        let num_phases = chains.get(event).map_or(1, PhaseChain::num_phases);
        for phase in 0..num_phases {
            columns.push(PhaseColumn {
                event: event.to_string(),
                phase,
                cells: expanded.iter().map(|e| e[phase].clone()).collect(),
            });
        }
    }
    PhaseColumns { columns }
}
