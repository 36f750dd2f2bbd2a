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

//! The Metropolis acceptance criterion.
//!
//! An improving move is always taken. A move that worsens the score by
//! `delta` is taken with probability `exp(-tau * delta)`, so equal-score
//! moves are always taken and the search random-walks across plateaus.

use rand::Rng;

/// Probability of taking a move of size `delta` at inverse temperature `tau`.
#[inline]
pub fn acceptance_probability(delta: f64, tau: f64) -> f64 {
    if delta < 0.0 {
        1.0
    } else {
        (-tau * delta).exp()
    }
}

/// Draws the accept/reject decision for a move of size `delta`.
///
/// A non-finite `delta` is always rejected.
#[inline]
pub fn metropolis<R>(delta: f64, tau: f64, rng: &mut R) -> bool
where
    R: Rng + ?Sized,
{
    if !delta.is_finite() {
        return false;
    }
    rng.random::<f64>() < acceptance_probability(delta, tau)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_improvements_and_plateaus_are_always_taken() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        for _ in 0..100 {
            assert!(metropolis(-0.5, 1e6, &mut rng));
            assert!(metropolis(0.0, 1e6, &mut rng));
        }
    }

    #[test]
    fn test_large_worsening_is_rejected_when_cold() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        for _ in 0..100 {
            assert!(!metropolis(10.0, 1e4, &mut rng));
        }
        assert!(!metropolis(f64::NAN, 1.0, &mut rng));
    }

    #[test]
    fn test_acceptance_rate_follows_probability() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let p = acceptance_probability(1.0, 2.0f64.ln());
        assert!((p - 0.5).abs() < 1e-12);

        let taken = (0..10_000)
            .filter(|_| metropolis(1.0, 2.0f64.ln(), &mut rng))
            .count();
        assert!((4_500..5_500).contains(&taken), "taken {taken}");
    }
}
