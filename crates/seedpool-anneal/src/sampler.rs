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

//! Discrete weighted sampling over a cumulative weight table.

use rand::Rng;

/// Draws items with probability proportional to their weight.
///
/// Items with a non-positive weight are never drawn and are not stored.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightedSampler<T> {
    items: Vec<T>,
    cumulative: Vec<f64>,
}

impl<T> Default for WeightedSampler<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            cumulative: Vec::new(),
        }
    }
}

impl<T> WeightedSampler<T> {
    pub fn new<I>(weighted: I) -> Self
    where
        I: IntoIterator<Item = (T, f64)>,
    {
        let mut sampler = Self::default();
        let mut total = 0.0;
        for (item, weight) in weighted {
            if weight > 0.0 {
                total += weight;
                sampler.items.push(item);
                sampler.cumulative.push(total);
            }
        }
        sampler
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[inline]
    pub fn total(&self) -> f64 {
        self.cumulative.last().copied().unwrap_or(0.0)
    }

    #[inline]
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Draws one item, or `None` if every weight was zero.
    pub fn sample<R>(&self, rng: &mut R) -> Option<&T>
    where
        R: Rng + ?Sized,
    {
        if self.items.is_empty() {
            return None;
        }
        let r = rng.random::<f64>() * self.total();
        let at = self.cumulative.partition_point(|&c| c <= r);
        self.items.get(at.min(self.items.len() - 1))
    }
}

impl<T> FromIterator<(T, f64)> for WeightedSampler<T> {
    fn from_iter<I: IntoIterator<Item = (T, f64)>>(iter: I) -> Self {
        Self::new(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_zero_weights_are_dropped() {
        let sampler = WeightedSampler::new([("a", 0.0), ("b", 2.0), ("c", -1.0)]);
        assert_eq!(sampler.items(), &["b"]);
        assert_eq!(sampler.total(), 2.0);

        let mut rng = ChaCha8Rng::seed_from_u64(1);
        for _ in 0..20 {
            assert_eq!(sampler.sample(&mut rng), Some(&"b"));
        }
    }

    #[test]
    fn test_empty_sampler_draws_nothing() {
        let sampler: WeightedSampler<u8> = WeightedSampler::new([(1, 0.0)]);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert!(sampler.is_empty());
        assert_eq!(sampler.sample(&mut rng), None);
    }

    #[test]
    fn test_frequencies_follow_weights() {
        let sampler: WeightedSampler<usize> = [(0, 1.0), (1, 3.0)].into_iter().collect();
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let ones = (0..8_000)
            .filter(|_| sampler.sample(&mut rng) == Some(&1))
            .count();
        assert!((5_700..6_300).contains(&ones), "ones {ones}");
    }
}
