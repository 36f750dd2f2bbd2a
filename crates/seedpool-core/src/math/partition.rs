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

//! Most even split of a weight multiset into a fixed number of bins.
//!
//! With a single distinct weight the answer is exact: every bin receives
//! `items / bins` items and the first `items % bins` bins one more. With mixed
//! weights a largest-weight-first greedy fills the currently lightest bins.
//! The greedy is not optimal for every multiset; it is kept because its
//! output is the reference lower bound the annealers converge towards, and
//! that bound must stay reproducible.

/// Item counts per bin for `items` equal items split over `bins` bins.
pub fn uniform_partition(bins: usize, items: usize) -> Vec<usize> {
    if bins == 0 {
        return Vec::new();
    }
    let base = items / bins;
    let extra = items % bins;
    (0..bins).map(|i| base + usize::from(i < extra)).collect()
}

/// Bin totals of the most even split of `weights` into `bins` bins.
pub fn optimal_weight_partition(bins: usize, weights: &[f64]) -> Vec<f64> {
    let classes = weight_classes(weights);
    if let [(weight, count)] = classes.as_slice() {
        return uniform_partition(bins, *count)
            .into_iter()
            .map(|n| *weight * n as f64)
            .collect();
    }

    let mut totals = vec![0.0; bins];
    if bins == 0 {
        return totals;
    }
    for &(weight, count) in classes.iter().rev() {
        let mut remaining = count;
        while remaining > 0 {
            let lightest = totals.iter().copied().fold(f64::INFINITY, f64::min);
            let mut placed = 0;
            for total in totals.iter_mut() {
                if placed == remaining {
                    break;
                }
                if *total == lightest {
                    *total += weight;
                    placed += 1;
                }
            }
            remaining -= placed;
        }
    }
    totals
}

/// Distinct weights in ascending order with their multiplicities.
fn weight_classes(weights: &[f64]) -> Vec<(f64, usize)> {
    let mut sorted = weights.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mut classes: Vec<(f64, usize)> = Vec::new();
    for w in sorted {
        match classes.last_mut() {
            Some((last, count)) if *last == w => *count += 1,
            _ => classes.push((w, 1)),
        }
    }
    classes
}
