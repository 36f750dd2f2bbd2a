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

//! Per-event grouping of rows into entrants.
//!
//! Rows signed up for an event are grouped by their entry key (falling back
//! to the row's primary key, which makes every row its own entrant). Each
//! member carries weight `1 / team size`, so every entrant weighs exactly 1
//! in distribution counts while partial credit is spread over its rows.
//!
//! Values are kept per member. `filled_value` is the mean with missing
//! values read as 0, the convention for pool balancing; `seeded_value` is the
//! mean over present values only, the convention for seeding.

use crate::{
    error::ModelError,
    index::{EntrantIndex, RowIndex},
    table::{EntryTable, Slot},
};
use rustc_hash::FxHashMap;

/// One team (or single competitor) inside one event.
#[derive(Debug, Clone, PartialEq)]
pub struct Entrant {
    key: String,
    members: Vec<RowIndex>,
    values: Vec<Option<f64>>,
    slot: Slot,
}

impl Entrant {
    #[inline]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[inline]
    pub fn members(&self) -> &[RowIndex] {
        &self.members
    }

    /// Weight of every member row.
    #[inline]
    pub fn member_weight(&self) -> f64 {
        1.0 / self.members.len() as f64
    }

    /// Slot shared by all members.
    #[inline]
    pub fn slot(&self) -> &Slot {
        &self.slot
    }

    /// Mean member value with missing values counted as 0.
    pub fn filled_value(&self) -> f64 {
        let sum: f64 = self.values.iter().map(|v| v.unwrap_or(0.0)).sum();
        sum / self.values.len() as f64
    }

    /// Mean over present member values, `None` when no member has one.
    pub fn seeded_value(&self) -> Option<f64> {
        let present: Vec<f64> = self.values.iter().flatten().copied().collect();
        if present.is_empty() {
            None
        } else {
            Some(present.iter().sum::<f64>() / present.len() as f64)
        }
    }

    /// Returns `true` when some members have a value and others do not.
    pub fn has_mixed_values(&self) -> bool {
        let present = self.values.iter().filter(|v| v.is_some()).count();
        present > 0 && present < self.values.len()
    }
}

/// Entrants of one event in first-appearance order.
#[derive(Debug, Clone, PartialEq)]
pub struct Roster {
    event: String,
    entrants: Vec<Entrant>,
    by_row: FxHashMap<RowIndex, EntrantIndex>,
}

impl Roster {
    /// Groups the rows signed up for `event` into entrants.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::DissimilarAssignments`] if two members of one
    /// entrant hold different slots.
    pub fn derive(table: &EntryTable, event: &str) -> Result<Self, ModelError> {
        let mut entrants: Vec<Entrant> = Vec::new();
        let mut by_key: FxHashMap<String, EntrantIndex> = FxHashMap::default();
        let mut by_row = FxHashMap::default();

        for (row, record) in table.iter() {
            let Some(signup) = record.signup(event) else {
                continue;
            };
            let key = signup
                .entry
                .clone()
                .unwrap_or_else(|| record.key().to_string());

            let index = match by_key.get(&key) {
                Some(&index) => {
                    let entrant = &mut entrants[index.get()];
                    if entrant.slot != signup.slot {
                        return Err(ModelError::DissimilarAssignments {
                            event: event.to_string(),
                            entry: key,
                        });
                    }
                    entrant.members.push(row);
                    entrant.values.push(signup.value);
                    index
                }
                None => {
                    let index = EntrantIndex::new(entrants.len());
                    entrants.push(Entrant {
                        key: key.clone(),
                        members: vec![row],
                        values: vec![signup.value],
                        slot: signup.slot.clone(),
                    });
                    by_key.insert(key, index);
                    index
                }
            };
            by_row.insert(row, index);
        }

        Ok(Self {
            event: event.to_string(),
            entrants,
            by_row,
        })
    }

    #[inline]
    pub fn event(&self) -> &str {
        &self.event
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entrants.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entrants.is_empty()
    }

    #[inline]
    pub fn entrants(&self) -> &[Entrant] {
        &self.entrants
    }

    #[inline]
    pub fn entrant(&self, index: EntrantIndex) -> &Entrant {
        debug_assert!(
            index.get() < self.entrants.len(),
            "called `Roster::entrant` with entrant index out of bounds: the len is {} but the index is {}",
            self.entrants.len(),
            index.get()
        );
        &self.entrants[index.get()]
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (EntrantIndex, &Entrant)> {
        self.entrants
            .iter()
            .enumerate()
            .map(|(i, e)| (EntrantIndex::new(i), e))
    }

    /// Entrant the row plays as, if the row is signed up.
    #[inline]
    pub fn entrant_of(&self, row: RowIndex) -> Option<EntrantIndex> {
        self.by_row.get(&row).copied()
    }

    /// Sum of all member weights, i.e. the number of entrants.
    pub fn total_weight(&self) -> f64 {
        self.entrants
            .iter()
            .map(|e| e.member_weight() * e.members.len() as f64)
            .sum()
    }
}

/// Derives the rosters of several events at once.
pub fn derive_rosters<S: AsRef<str>>(
    table: &EntryTable,
    events: &[S],
) -> Result<Vec<Roster>, ModelError> {
    events
        .iter()
        .map(|e| Roster::derive(table, e.as_ref()))
        .collect()
}
