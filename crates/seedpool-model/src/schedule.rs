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

//! # Schedule Sheets
//!
//! Pools are usually not typed in by hand but read from a schedule sheet:
//!
//! ```text
//! Block,SF,MK,BB
//! Offset,7,,10
//! Step,2,3,
//! A,2,,1
//! B,2,,1
//! ```
//!
//! The header names the events. Every other row starts with a block label
//! and holds, per event, a count of stations to open in that block. A
//! positive count `n` appends stations `step * i + offset + 1` for
//! `i in 0..n`; a negative count `-s` removes the previously opened station
//! `s` of that block. Rows labelled `Offset` or `Step` (any case) change the
//! numbering for the rows below them. Blank or non-numeric cells are skipped.
//!
//! Station numbers can be zero-padded to a uniform width per event or across
//! the whole sheet, see [`UniformLength`].

use crate::{error::ModelError, phase::EventPools};
use std::{io::Read, path::Path, str::FromStr};

/// Zero-padding applied to station numbers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UniformLength {
    /// Stations are written as is.
    #[default]
    None,
    /// Padded to the widest station of the same event.
    Event,
    /// Padded to the widest station of the sheet.
    All,
}

impl FromStr for UniformLength {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(UniformLength::None),
            "event" => Ok(UniformLength::Event),
            "all" => Ok(UniformLength::All),
            _ => Err(ModelError::UnknownUniformLength(s.to_string())),
        }
    }
}

struct EventStations {
    name: String,
    offset: i64,
    step: i64,
    stations: Vec<(String, i64)>,
}

impl EventStations {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            offset: 0,
            step: 1,
            stations: Vec::new(),
        }
    }

    fn apply(&mut self, label: &str, n: i64) -> Result<(), ModelError> {
        if label.eq_ignore_ascii_case("offset") {
            self.offset = n;
        } else if label.eq_ignore_ascii_case("step") {
            self.step = n;
        } else if n > 0 {
            let (step, offset) = (self.step, self.offset);
            self.stations
                .extend((0..n).map(|i| (label.to_string(), step * i + offset + 1)));
        } else if n < 0 {
            let position = self
                .stations
                .iter()
                .position(|(b, s)| b == label && *s == -n)
                .ok_or_else(|| ModelError::MissingStation {
                    event: self.name.clone(),
                    block: label.to_string(),
                    station: -n,
                })?;
            self.stations.remove(position);
        }
        Ok(())
    }

    fn width(&self) -> usize {
        self.stations
            .iter()
            .map(|(_, s)| *s)
            .max()
            .map_or(1, |s| s.to_string().len())
    }
}

/// Reads a schedule sheet into per-event pool lists.
///
/// # Errors
///
/// Returns [`ModelError::EmptySchedule`] for a sheet without a header row,
/// [`ModelError::MissingStation`] when a negative count removes a station
/// that was never opened, and [`ModelError::Csv`] for malformed CSV.
pub fn read_pools_from_schedule<R: Read>(
    reader: R,
    uniform_length: UniformLength,
) -> Result<EventPools, ModelError> {
    let mut csv = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);
    let mut records = csv.records();

    let header = records.next().ok_or(ModelError::EmptySchedule)??;
    let mut events: Vec<EventStations> = header.iter().skip(1).map(EventStations::new).collect();

    for record in records {
        let record = record?;
        let Some(label) = record.get(0) else {
            continue;
        };
        for (j, event) in events.iter_mut().enumerate() {
            let Some(n) = record.get(j + 1).and_then(|c| c.trim().parse::<i64>().ok()) else {
                continue;
            };
            event.apply(label, n)?;
        }
    }

    let sheet_width = events.iter().map(EventStations::width).max().unwrap_or(1);
    let pools = events
        .into_iter()
        .map(|event| {
            let width = match uniform_length {
                UniformLength::None => 0,
                UniformLength::Event => event.width(),
                UniformLength::All => sheet_width,
            };
            let names = event
                .stations
                .iter()
                .map(|(block, station)| format!("{}{:0width$}", block, station, width = width))
                .collect();
            (event.name, names)
        })
        .collect();

    tracing::debug!(uniform_length = ?uniform_length, "read pools from schedule sheet");
    Ok(pools)
}

/// Reads the schedule sheet at `path`, see [`read_pools_from_schedule`].
pub fn pools_from_schedule<P: AsRef<Path>>(
    path: P,
    uniform_length: UniformLength,
) -> Result<EventPools, ModelError> {
    let file = std::fs::File::open(path)?;
    read_pools_from_schedule(file, uniform_length)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read(sheet: &str, uniform_length: UniformLength) -> EventPools {
        read_pools_from_schedule(sheet.as_bytes(), uniform_length).unwrap()
    }

    fn pools(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    const BASIC: &str = "Block,SF,MK,BB\nA,2,,1\nB,2,,1\nC,2,2,\nD,2,2,\n";

    const OFFSET: &str = "Block,SF,MK,BB\nOffset,7,,10\nA,2,,1\nB,2,,1\nC,2,2,\nD,2,2,\n";

    const STEP: &str =
        "Block,SF,MK,BB\nOffset,7,,10\nStep,2,3,\nA,2,,1\nB,2,,1\nC,2,2,\nD,2,2,\n";

    #[test]
    fn test_basic_sheet_for_every_padding() {
        for uniform_length in [UniformLength::None, UniformLength::Event, UniformLength::All] {
            let result = read(BASIC, uniform_length);
            assert_eq!(result["SF"], pools(&["A1", "A2", "B1", "B2", "C1", "C2", "D1", "D2"]));
            assert_eq!(result["MK"], pools(&["C1", "C2", "D1", "D2"]));
            assert_eq!(result["BB"], pools(&["A1", "B1"]));
        }
    }

    #[test]
    fn test_offset_rows() {
        for uniform_length in [UniformLength::None, UniformLength::Event] {
            let result = read(OFFSET, uniform_length);
            assert_eq!(result["SF"], pools(&["A8", "A9", "B8", "B9", "C8", "C9", "D8", "D9"]));
            assert_eq!(result["MK"], pools(&["C1", "C2", "D1", "D2"]));
            assert_eq!(result["BB"], pools(&["A11", "B11"]));
        }

        let result = read(OFFSET, UniformLength::All);
        assert_eq!(
            result["SF"],
            pools(&["A08", "A09", "B08", "B09", "C08", "C09", "D08", "D09"])
        );
        assert_eq!(result["MK"], pools(&["C01", "C02", "D01", "D02"]));
        assert_eq!(result["BB"], pools(&["A11", "B11"]));
    }

    #[test]
    fn test_step_rows() {
        let result = read(STEP, UniformLength::None);
        assert_eq!(
            result["SF"],
            pools(&["A8", "A10", "B8", "B10", "C8", "C10", "D8", "D10"])
        );
        assert_eq!(result["MK"], pools(&["C1", "C4", "D1", "D4"]));
        assert_eq!(result["BB"], pools(&["A11", "B11"]));

        let result = read(STEP, UniformLength::Event);
        assert_eq!(
            result["SF"],
            pools(&["A08", "A10", "B08", "B10", "C08", "C10", "D08", "D10"])
        );
        assert_eq!(result["MK"], pools(&["C1", "C4", "D1", "D4"]));

        let result = read(STEP, UniformLength::All);
        assert_eq!(result["MK"], pools(&["C01", "C04", "D01", "D04"]));
        assert_eq!(result["BB"], pools(&["A11", "B11"]));
    }

    #[test]
    fn test_negative_counts_remove_stations() {
        let sheet = "Block,KI,BB\nStep,,2\nA,2,3\nB,3,3\nB,,-3\nC,2,3\n";
        let result = read(sheet, UniformLength::None);
        assert_eq!(
            result["BB"],
            pools(&["A1", "A3", "A5", "B1", "B5", "C1", "C3", "C5"])
        );
        assert_eq!(result["KI"], pools(&["A1", "A2", "B1", "B2", "B3", "C1", "C2"]));
    }

    #[test]
    fn test_offset_can_shift_midway() {
        let sheet = "Block,KI,BB\nOffset,10,22\nA,2,2\nB,3,2\nOffset,,20\nC,2,4\n";
        let result = read(sheet, UniformLength::None);
        assert_eq!(
            result["BB"],
            pools(&["A23", "A24", "B23", "B24", "C21", "C22", "C23", "C24"])
        );
        assert_eq!(result["KI"], pools(&["A11", "A12", "B11", "B12", "B13", "C11", "C12"]));
    }

    #[test]
    fn test_removing_unknown_station_fails() {
        let sheet = "Block,BB\nA,2\nA,-5\n";
        match read_pools_from_schedule(sheet.as_bytes(), UniformLength::None) {
            Err(ModelError::MissingStation { event, block, station }) => {
                assert_eq!(event, "BB");
                assert_eq!(block, "A");
                assert_eq!(station, 5);
            }
            other => panic!("expected missing station, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_sheet_and_unknown_padding() {
        assert!(matches!(
            read_pools_from_schedule("".as_bytes(), UniformLength::None),
            Err(ModelError::EmptySchedule)
        ));
        assert_eq!("EVENT".parse::<UniformLength>().unwrap(), UniformLength::Event);
        assert!("wide".parse::<UniformLength>().is_err());
    }
}
