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

//! The entries table.
//!
//! One `EntryRecord` per competitor row. A row signs up for events through
//! `Signup`s; a signup names the entry (team) the row plays in, an optional
//! skill value, and the current `Slot`. Rows sharing an entry key inside an
//! event are one entrant and must always hold the same slot.

use crate::{error::ModelError, index::RowIndex};
use rustc_hash::FxHashSet;
use std::collections::BTreeMap;

/// Token conventionally used for an unassigned pool in string-typed inputs.
pub const DEFAULT_UNASSIGNED: &str = "xx";

/// Where a signup currently sits in an event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Slot {
    /// Signed up but not yet placed.
    #[default]
    Open,
    /// Placed in the named pool (or seed position).
    Pool(String),
}

impl Slot {
    #[inline]
    pub fn pool<S: Into<String>>(name: S) -> Self {
        Slot::Pool(name.into())
    }

    /// Reads a string token, treating `unassigned` as [`Slot::Open`].
    #[inline]
    pub fn from_token(token: &str, unassigned: &str) -> Self {
        if token == unassigned {
            Slot::Open
        } else {
            Slot::Pool(token.to_string())
        }
    }

    /// Writes the slot back as a string token.
    #[inline]
    pub fn token<'a>(&'a self, unassigned: &'a str) -> &'a str {
        match self {
            Slot::Open => unassigned,
            Slot::Pool(p) => p,
        }
    }

    #[inline]
    pub fn as_pool(&self) -> Option<&str> {
        match self {
            Slot::Open => None,
            Slot::Pool(p) => Some(p),
        }
    }

    #[inline]
    pub fn is_open(&self) -> bool {
        matches!(self, Slot::Open)
    }
}

impl std::fmt::Display for Slot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.token(DEFAULT_UNASSIGNED))
    }
}

/// A row's participation in one event.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Signup {
    /// Entry (team) key; the row's primary key when absent.
    pub entry: Option<String>,
    /// Skill value; missing values count as 0 for pool balancing.
    pub value: Option<f64>,
    pub slot: Slot,
}

impl Signup {
    #[inline]
    pub fn open() -> Self {
        Self::default()
    }

    #[inline]
    pub fn assigned<S: Into<String>>(pool: S) -> Self {
        Self {
            slot: Slot::pool(pool),
            ..Self::default()
        }
    }

    #[inline]
    pub fn with_entry<S: Into<String>>(mut self, entry: S) -> Self {
        self.entry = Some(entry.into());
        self
    }

    #[inline]
    pub fn with_value(mut self, value: f64) -> Self {
        self.value = Some(value);
        self
    }
}

/// One competitor row.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryRecord {
    key: String,
    signups: BTreeMap<String, Signup>,
    attributes: BTreeMap<String, String>,
    external: Option<String>,
    schedule_weight: Option<f64>,
}

impl EntryRecord {
    pub fn new<S: Into<String>>(key: S) -> Self {
        Self {
            key: key.into(),
            signups: BTreeMap::new(),
            attributes: BTreeMap::new(),
            external: None,
            schedule_weight: None,
        }
    }

    pub fn with_signup<S: Into<String>>(mut self, event: S, signup: Signup) -> Self {
        self.signups.insert(event.into(), signup);
        self
    }

    pub fn with_attribute<K: Into<String>, V: Into<String>>(mut self, name: K, value: V) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Blocks this row is unavailable for, e.g. `"AC"` or `"A;C"`.
    pub fn with_external<S: Into<String>>(mut self, blocks: S) -> Self {
        self.external = Some(blocks.into());
        self
    }

    pub fn with_schedule_weight(mut self, weight: f64) -> Self {
        self.schedule_weight = Some(weight);
        self
    }

    #[inline]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[inline]
    pub fn signup(&self, event: &str) -> Option<&Signup> {
        self.signups.get(event)
    }

    #[inline]
    pub fn signups(&self) -> impl Iterator<Item = (&str, &Signup)> {
        self.signups.iter().map(|(e, s)| (e.as_str(), s))
    }

    #[inline]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    #[inline]
    pub fn external(&self) -> Option<&str> {
        self.external.as_deref()
    }

    /// Multiplier on this row's schedule cost, 1 when unset.
    #[inline]
    pub fn schedule_weight(&self) -> f64 {
        self.schedule_weight.unwrap_or(1.0)
    }

    /// Replaces the slot of an existing signup. Returns `false` if the row
    /// is not signed up for `event`.
    pub fn set_slot(&mut self, event: &str, slot: Slot) -> bool {
        match self.signups.get_mut(event) {
            Some(signup) => {
                signup.slot = slot;
                true
            }
            None => false,
        }
    }

    /// External conflict blocks, split on `separator` or per character.
    pub fn external_blocks(&self, separator: Option<char>) -> Vec<String> {
        let Some(external) = self.external() else {
            return Vec::new();
        };
        match separator {
            Some(sep) => external
                .split(sep)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            None => external.chars().map(|c| c.to_string()).collect(),
        }
    }
}

/// Ordered collection of competitor rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntryTable {
    records: Vec<EntryRecord>,
}

impl EntryTable {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn push(&mut self, record: EntryRecord) -> RowIndex {
        self.records.push(record);
        RowIndex::new(self.records.len() - 1)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[inline]
    pub fn records(&self) -> &[EntryRecord] {
        &self.records
    }

    /// Returns the record at `row`.
    ///
    /// # Panics
    ///
    /// Panics if `row` is out of bounds.
    #[inline]
    pub fn record(&self, row: RowIndex) -> &EntryRecord {
        debug_assert!(
            row.get() < self.records.len(),
            "called `EntryTable::record` with row index out of bounds: the len is {} but the index is {}",
            self.records.len(),
            row.get()
        );
        &self.records[row.get()]
    }

    #[inline]
    pub fn record_mut(&mut self, row: RowIndex) -> &mut EntryRecord {
        debug_assert!(
            row.get() < self.records.len(),
            "called `EntryTable::record_mut` with row index out of bounds: the len is {} but the index is {}",
            self.records.len(),
            row.get()
        );
        &mut self.records[row.get()]
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (RowIndex, &EntryRecord)> {
        self.records
            .iter()
            .enumerate()
            .map(|(i, r)| (RowIndex::new(i), r))
    }

    /// Position of the row with primary key `key`.
    pub fn row_of(&self, key: &str) -> Option<RowIndex> {
        self.records
            .iter()
            .position(|r| r.key == key)
            .map(RowIndex::new)
    }

    /// Fails on the first primary key that appears twice.
    pub fn validate_unique_keys(&self) -> Result<(), ModelError> {
        let mut seen = FxHashSet::default();
        for record in &self.records {
            if !seen.insert(record.key.as_str()) {
                return Err(ModelError::DuplicateKey(record.key.clone()));
            }
        }
        Ok(())
    }

    /// Number of rows signed up for `event`.
    pub fn signup_count(&self, event: &str) -> usize {
        self.records
            .iter()
            .filter(|r| r.signup(event).is_some())
            .count()
    }

    /// Copies the selected rows, in the given order, into a new table.
    pub fn select(&self, rows: &[RowIndex]) -> EntryTable {
        rows.iter().map(|&r| self.record(r).clone()).collect()
    }
}

impl FromIterator<EntryRecord> for EntryTable {
    fn from_iter<I: IntoIterator<Item = EntryRecord>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

impl Extend<EntryRecord> for EntryTable {
    fn extend<I: IntoIterator<Item = EntryRecord>>(&mut self, iter: I) {
        self.records.extend(iter);
    }
}
