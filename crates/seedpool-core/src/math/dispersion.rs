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

//! Population standard deviation and bracket folding.
//!
//! The imbalance of a pool distribution is the population standard deviation
//! (divide by `n`, not `n - 1`) of its per-pool weighted counts. With bracket
//! accounting, adjacent buckets are summed pairwise, mirroring two pools
//! feeding one bracket half, and every folded level's deviation is added until
//! at most two buckets remain.

use num_traits::Float;

/// Population standard deviation of `values`; zero for an empty slice.
pub fn population_std<F: Float>(values: &[F]) -> F {
    if values.is_empty() {
        return F::zero();
    }
    let n = F::from(values.len()).unwrap_or_else(F::one);
    let mean = values.iter().fold(F::zero(), |acc, &v| acc + v) / n;
    let variance = values
        .iter()
        .fold(F::zero(), |acc, &v| acc + (v - mean) * (v - mean))
        / n;
    variance.sqrt()
}

/// Sums adjacent buckets pairwise; an odd trailing bucket is kept as is.
pub fn fold_pairs<F: Float>(values: &[F]) -> Vec<F> {
    values
        .chunks(2)
        .map(|pair| pair.iter().fold(F::zero(), |acc, &v| acc + v))
        .collect()
}

/// Deviation of `values`, plus the deviation of every pairwise fold while
/// more than two buckets remain when `bracket` is set.
pub fn bracket_dispersion<F: Float>(values: &[F], bracket: bool) -> F {
    let mut score = population_std(values);
    if bracket {
        let mut level = values.to_vec();
        while level.len() > 2 {
            level = fold_pairs(&level);
            score = score + population_std(&level);
        }
    }
    score
}

/// Bucket counts of every folded level below `buckets`, matching the levels
/// visited by [`bracket_dispersion`].
pub fn folded_levels(buckets: usize) -> impl Iterator<Item = usize> {
    std::iter::successors(Some(buckets), |&n| (n > 2).then(|| n.div_ceil(2))).skip(1)
}
