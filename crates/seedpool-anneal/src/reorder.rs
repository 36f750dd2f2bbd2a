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

//! Legal reorderings of an event's pool order.
//!
//! In the seed/pool optimizer seeds map to *positions* and positions map to
//! pools through a per-event pool order. A [`Flip`] rewrites part of that
//! order: position `from[k]` takes the pool previously at `to[k]`. Every
//! flip permutes a set of positions onto itself, so the order stays a
//! permutation of the event's pools.
//!
//! Positions are zero-based here. Caller-supplied custom flips are
//! one-based, matching how pool positions are numbered on paper.

use crate::error::AnnealError;
use rand::{seq::SliceRandom, Rng};
use seedpool_core::bracket::{bracket_sections, bracket_sections_by_level};
use std::{collections::BTreeMap, str::FromStr};

/// How an event's pool order may change during the search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ReorderMethod {
    /// No reordering.
    Frozen,
    /// Mirror every section of one bracket level at once.
    Strict,
    /// Mirror any single bracket section.
    #[default]
    Semistrict,
    /// Swap any two positions.
    Relaxed,
    /// Explicit one-based `(from, to)` position lists.
    Custom(Vec<(Vec<usize>, Vec<usize>)>),
}

impl FromStr for ReorderMethod {
    type Err = AnnealError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "frozen" => Ok(ReorderMethod::Frozen),
            "strict" => Ok(ReorderMethod::Strict),
            "semistrict" => Ok(ReorderMethod::Semistrict),
            "relaxed" => Ok(ReorderMethod::Relaxed),
            _ => Err(AnnealError::UnknownReorderMethod(s.to_string())),
        }
    }
}

impl std::fmt::Display for ReorderMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReorderMethod::Frozen => write!(f, "frozen"),
            ReorderMethod::Strict => write!(f, "strict"),
            ReorderMethod::Semistrict => write!(f, "semistrict"),
            ReorderMethod::Relaxed => write!(f, "relaxed"),
            ReorderMethod::Custom(flips) => write!(f, "custom ({} flips)", flips.len()),
        }
    }
}

/// Reorder methods of every event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReorderConfig {
    /// The same method for every event.
    Uniform(ReorderMethod),
    /// Methods per event; unlisted events are frozen.
    PerEvent(BTreeMap<String, ReorderMethod>),
}

impl Default for ReorderConfig {
    fn default() -> Self {
        ReorderConfig::Uniform(ReorderMethod::Semistrict)
    }
}

impl ReorderConfig {
    /// The method of `event`.
    pub fn method_for(&self, event: &str) -> ReorderMethod {
        match self {
            ReorderConfig::Uniform(method) => method.clone(),
            ReorderConfig::PerEvent(methods) => {
                methods.get(event).cloned().unwrap_or(ReorderMethod::Frozen)
            }
        }
    }
}

impl From<ReorderMethod> for ReorderConfig {
    fn from(method: ReorderMethod) -> Self {
        ReorderConfig::Uniform(method)
    }
}

/// One legal rewrite of a pool order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Flip {
    from: Vec<usize>,
    to: Vec<usize>,
}

impl Flip {
    #[inline]
    pub fn from_positions(&self) -> &[usize] {
        &self.from
    }

    #[inline]
    pub fn to_positions(&self) -> &[usize] {
        &self.to
    }

    /// Returns `true` if the flip rewrites `position`.
    #[inline]
    pub fn moves(&self, position: usize) -> bool {
        self.from.contains(&position)
    }

    /// Rewrites `order` in place: `order[from[k]]` becomes the old `order[to[k]]`.
    pub fn apply<T: Clone>(&self, order: &mut [T]) {
        let taken: Vec<T> = self.to.iter().map(|&p| order[p].clone()).collect();
        for (&p, item) in self.from.iter().zip(taken) {
            order[p] = item;
        }
    }

    /// Mirror of `sections`, each restricted to positions below `limit`.
    fn mirror(sections: &[Vec<usize>], limit: usize) -> Option<Self> {
        let mut from = Vec::new();
        let mut to = Vec::new();
        for section in sections {
            from.extend(section.iter().copied().filter(|&p| p < limit));
            to.extend(section.iter().rev().copied().filter(|&p| p < limit));
        }
        (from != to).then_some(Self { from, to })
    }
}

/// The flips an event's pool order may undergo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReorderList {
    method: ReorderMethod,
    flips: Vec<Flip>,
}

impl ReorderList {
    /// The flips of `method` over `npools` positions.
    ///
    /// Bracket sections reaching past `npools` are cut back to the existing
    /// positions; sections left with a single position are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`AnnealError::IllegalReorder`] if a custom flip does not map
    /// a set of positions onto itself, repeats a position, or names a
    /// position outside `1..=npools`.
    pub fn new(event: &str, method: &ReorderMethod, npools: usize) -> Result<Self, AnnealError> {
        let flips = match method {
            ReorderMethod::Frozen => Vec::new(),
            ReorderMethod::Strict => bracket_sections_by_level(npools, 0)
                .iter()
                .filter_map(|level| Flip::mirror(level, npools))
                .collect(),
            ReorderMethod::Semistrict => bracket_sections(npools, 0)
                .into_iter()
                .filter_map(|section| Flip::mirror(&[section], npools))
                .collect(),
            ReorderMethod::Relaxed => (0..npools)
                .flat_map(|p| {
                    (p + 1..npools).map(move |q| Flip {
                        from: vec![p, q],
                        to: vec![q, p],
                    })
                })
                .collect(),
            ReorderMethod::Custom(pairs) => pairs
                .iter()
                .enumerate()
                .map(|(i, (from, to))| custom_flip(event, i, from, to, npools))
                .collect::<Result<_, _>>()?,
        };
        Ok(Self {
            method: method.clone(),
            flips,
        })
    }

    #[inline]
    pub fn method(&self) -> &ReorderMethod {
        &self.method
    }

    #[inline]
    pub fn flips(&self) -> &[Flip] {
        &self.flips
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.flips.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.flips.is_empty()
    }

    /// A uniformly drawn flip, `None` when the list is empty.
    pub fn choose<R>(&self, rng: &mut R) -> Option<&Flip>
    where
        R: Rng + ?Sized,
    {
        if self.flips.is_empty() {
            return None;
        }
        Some(&self.flips[rng.random_range(0..self.flips.len())])
    }

    /// Randomizes a starting order the way the method explores orders:
    /// one flip for `Strict`, each flip with probability 1/2 (largest
    /// sections first) for `Semistrict`, a shuffle for `Relaxed`, and a
    /// random subset of flips for `Custom`.
    pub fn randomize<T, R>(&self, order: &mut [T], rng: &mut R)
    where
        T: Clone,
        R: Rng + ?Sized,
    {
        match self.method {
            ReorderMethod::Frozen => {}
            ReorderMethod::Strict => {
                if let Some(flip) = self.choose(rng) {
                    flip.apply(order);
                }
            }
            ReorderMethod::Semistrict => {
                for flip in self.flips.iter().rev() {
                    if rng.random_bool(0.5) {
                        flip.apply(order);
                    }
                }
            }
            ReorderMethod::Relaxed => order.shuffle(rng),
            ReorderMethod::Custom(_) => {
                let count = rng.random_range(0..=self.flips.len());
                for i in rand::seq::index::sample(rng, self.flips.len(), count) {
                    self.flips[i].apply(order);
                }
            }
        }
    }
}

fn custom_flip(
    event: &str,
    index: usize,
    from: &[usize],
    to: &[usize],
    npools: usize,
) -> Result<Flip, AnnealError> {
    let illegal = |reason: String| AnnealError::IllegalReorder {
        event: event.to_string(),
        reason,
    };
    let sorted = |positions: &[usize]| {
        let mut s = positions.to_vec();
        s.sort_unstable();
        s
    };
    let (a, b) = (sorted(from), sorted(to));
    if a.windows(2).any(|w| w[0] == w[1]) || b.windows(2).any(|w| w[0] == w[1]) {
        return Err(illegal(format!("flip {} repeats a position", index)));
    }
    if a != b {
        return Err(illegal(format!(
            "flip {} does not map its positions onto themselves",
            index
        )));
    }
    if let Some(&p) = a.iter().find(|&&p| p == 0 || p > npools) {
        return Err(illegal(format!(
            "flip {} names position {} outside 1..={}",
            index, p, npools
        )));
    }
    Ok(Flip {
        from: from.iter().map(|p| p - 1).collect(),
        to: to.iter().map(|p| p - 1).collect(),
    })
}
