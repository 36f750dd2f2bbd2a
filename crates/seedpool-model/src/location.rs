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

//! Locations are grouping attributes (a club, a region, a judge panel)
//! over which pool balance is scored separately. A location names one or
//! more attributes; a row's place is the tuple of its values and exists
//! only when every attribute is present.

use crate::table::EntryRecord;

/// A place: the attribute values of one location, in attribute order.
pub type Place = Vec<String>;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Location {
    attributes: Vec<String>,
}

impl Location {
    pub fn new<I, S>(attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let attributes: Vec<String> = attributes.into_iter().map(Into::into).collect();
        debug_assert!(
            !attributes.is_empty(),
            "called `Location::new` without any attribute"
        );
        Self { attributes }
    }

    /// A location over a single attribute.
    #[inline]
    pub fn single<S: Into<String>>(attribute: S) -> Self {
        Self {
            attributes: vec![attribute.into()],
        }
    }

    #[inline]
    pub fn attributes(&self) -> &[String] {
        &self.attributes
    }

    /// The record's place, or `None` if any attribute is missing.
    pub fn place_of(&self, record: &EntryRecord) -> Option<Place> {
        self.attributes
            .iter()
            .map(|a| record.attribute(a).map(str::to_string))
            .collect()
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.attributes.join("+"))
    }
}

impl From<&str> for Location {
    fn from(attribute: &str) -> Self {
        Self::single(attribute)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_place_of_requires_every_attribute() {
        let record = EntryRecord::new("a")
            .with_attribute("Club", "North")
            .with_attribute("Region", "East");
        let both = Location::new(["Club", "Region"]);
        assert_eq!(
            both.place_of(&record),
            Some(vec!["North".to_string(), "East".to_string()])
        );

        let partial = Location::new(["Club", "Judge"]);
        assert_eq!(partial.place_of(&record), None);
        assert_eq!(Location::from("Club").place_of(&record), Some(vec!["North".to_string()]));
    }

    #[test]
    fn test_display_joins_attributes() {
        assert_eq!(Location::new(["Club", "Region"]).to_string(), "Club+Region");
    }
}
