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

//! # Seedpool Model
//!
//! The tabular input of the assignment optimizers, expressed as typed records
//! instead of label-indexed columns.
//!
//! - `table`: `EntryTable` of `EntryRecord`s. Every record is one competitor
//!   row with a primary key, per-event `Signup`s (entry grouping key, skill
//!   value, current `Slot`), location attributes, an optional external
//!   conflict list and an optional schedule weight.
//! - `roster`: per-event grouping of rows into entrants (teams), the derived
//!   member weight `1 / team size`, entrant values and the entry-consistency
//!   check.
//! - `phase`: phase chains built from transition maps and the per-phase
//!   expansion of a table's assignments.
//! - `location`: grouping attributes and the places they induce.
//! - `schedule`: the block/count CSV format that produces per-event pool lists.
//! - `error`: `ModelError`, shared by all of the above.

pub mod error;
pub mod index;
pub mod location;
pub mod phase;
pub mod roster;
pub mod schedule;
pub mod table;
