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

//! # Single-Elimination Bracket Math
//!
//! Standard bracket seeding places seed 1 and seed 2 in opposite halves,
//! seeds 1-4 in different quarters, and so on. The layout is defined
//! recursively: `seed_order(1) = [1]`, and the order for `2n` lines is
//! obtained by following every seed `j` of the order for `n` lines with its
//! complement `2n + 1 - j`.
//!
//! Positions (bracket lines) are zero-based in `reverse_seed_map` and in
//! `bracket_sections`; seeds are one-based, matching how they are printed.

use thiserror::Error;

/// Returned when a sequential bracket line-up is not a full bracket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("bracket line-up of length {len} is not a power of two")]
pub struct BracketSizeError {
    pub len: usize,
}

/// The smallest power of two that is at least `size` (and at least 1).
#[inline]
pub fn bracket_size(size: usize) -> usize {
    size.max(1).next_power_of_two()
}

/// Seeds in the order they appear down a bracket of `bracket_size(size)` lines.
///
/// ```rust
/// use seedpool_core::bracket::seed_order;
///
/// assert_eq!(seed_order(8), vec![1, 8, 4, 5, 2, 7, 3, 6]);
/// assert_eq!(seed_order(3), vec![1, 4, 2, 3]);
/// ```
pub fn seed_order(size: usize) -> Vec<usize> {
    let mut order = vec![1];
    while order.len() < size {
        let complement = order.len() * 2 + 1;
        order = order.iter().flat_map(|&j| [j, complement - j]).collect();
    }
    order
}

/// Zero-based bracket line of each seed: `reverse_seed_map(n)[s - 1]` is the
/// line seed `s` starts on. This is the inverse permutation of `seed_order`.
///
/// ```rust
/// use seedpool_core::bracket::reverse_seed_map;
///
/// assert_eq!(reverse_seed_map(8), vec![0, 4, 6, 2, 3, 7, 5, 1]);
/// ```
pub fn reverse_seed_map(size: usize) -> Vec<usize> {
    let order = seed_order(size);
    let mut lines = vec![0; order.len()];
    for (line, &seed) in order.iter().enumerate() {
        lines[seed - 1] = line;
    }
    lines
}

/// Contiguous sections of a bracket, smallest first: all pairs, then all
/// quarters' worth of lines, up to the whole bracket. Line numbers start at
/// `inc` (use `1` for one-based pool positions).
pub fn bracket_sections(size: usize, inc: usize) -> Vec<Vec<usize>> {
    bracket_sections_by_level(size, inc)
        .into_iter()
        .flatten()
        .collect()
}

/// Like [`bracket_sections`], grouped per level: level 0 holds the pairs,
/// the last level holds the whole bracket.
pub fn bracket_sections_by_level(size: usize, inc: usize) -> Vec<Vec<Vec<usize>>> {
    let lines = bracket_size(size);
    let mut levels = Vec::new();
    let mut width = 1;
    while width < lines {
        width *= 2;
        levels.push(
            (inc..lines + inc)
                .step_by(width)
                .map(|start| (start..start + width).collect())
                .collect(),
        );
    }
    levels
}

/// Reorders a sequential line-up (top to bottom of the bracket) into seed
/// order. Trailing blanks are removed when `trim` is set.
///
/// # Errors
///
/// Returns [`BracketSizeError`] if the line-up length is not a power of two.
pub fn sequential_to_seeds<T, F>(
    lineup: &[T],
    is_blank: F,
    trim: bool,
) -> Result<Vec<T>, BracketSizeError>
where
    T: Clone,
    F: Fn(&T) -> bool,
{
    let order = seed_order(lineup.len());
    if order.len() != lineup.len() {
        return Err(BracketSizeError { len: lineup.len() });
    }
    let mut slots: Vec<Option<T>> = vec![None; lineup.len()];
    for (item, &seed) in lineup.iter().zip(order.iter()) {
        slots[seed - 1] = Some(item.clone());
    }
    let mut seeds: Vec<T> = slots.into_iter().flatten().collect();
    if trim {
        while seeds.last().is_some_and(&is_blank) {
            seeds.pop();
        }
    }
    Ok(seeds)
}

/// Lays out a seed list down a bracket of `bracket_size(size)` lines, where
/// `size` defaults to the number of seeds. Missing seeds are produced by
/// `fill`, which receives the one-based index of the filler.
pub fn seeds_to_sequential<T, F>(seeds: &[T], size: Option<usize>, mut fill: F) -> Vec<T>
where
    T: Clone,
    F: FnMut(usize) -> T,
{
    let lines = reverse_seed_map(size.unwrap_or(seeds.len()));
    let fillers = lines.len().saturating_sub(seeds.len());
    let filled = seeds
        .iter()
        .cloned()
        .chain((1..=fillers).map(&mut fill))
        .take(lines.len());

    let mut lineup: Vec<Option<T>> = vec![None; lines.len()];
    for (item, &line) in filled.zip(lines.iter()) {
        lineup[line] = Some(item);
    }
    lineup.into_iter().flatten().collect()
}

/// Doubles a sequential bracket by following every line with a blank line.
pub fn widen_bracket<T: Clone>(lineup: &[T], blank: T) -> Vec<T> {
    lineup
        .iter()
        .flat_map(|item| [item.clone(), blank.clone()])
        .collect()
}
