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

//! Pool orders.
//!
//! The buckets of a distribution cell are laid out in pool order, which only
//! matters once bracket levels fold adjacent buckets together. A `PoolOrder`
//! assigns every pool a sort key; bucket positions follow the keys, ties
//! broken by pool name.

use rustc_hash::FxHashMap;
use std::{cmp::Ordering, sync::Arc};

#[derive(Clone, Default)]
pub enum PoolOrder {
    /// Pools sorted by name.
    #[default]
    Lexical,
    /// Explicit keys; pools without a key sort after all keyed pools.
    Table(FxHashMap<String, i64>),
    /// Keys computed from the pool name.
    Function(Arc<dyn Fn(&str) -> i64 + Send + Sync>),
}

impl PoolOrder {
    /// An explicit order from `(pool, key)` pairs.
    pub fn table<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = (S, i64)>,
        S: Into<String>,
    {
        PoolOrder::Table(keys.into_iter().map(|(p, k)| (p.into(), k)).collect())
    }

    /// An order listing `pools` at keys `1..=len`.
    pub fn sequence<S: AsRef<str>>(pools: &[S]) -> Self {
        PoolOrder::Table(
            pools
                .iter()
                .enumerate()
                .map(|(i, p)| (p.as_ref().to_string(), i as i64 + 1))
                .collect(),
        )
    }

    pub fn function<F>(f: F) -> Self
    where
        F: Fn(&str) -> i64 + Send + Sync + 'static,
    {
        PoolOrder::Function(Arc::new(f))
    }

    fn compare(&self, a: &str, b: &str) -> Ordering {
        let by_key = match self {
            PoolOrder::Lexical => Ordering::Equal,
            PoolOrder::Table(keys) => match (keys.get(a), keys.get(b)) {
                (Some(x), Some(y)) => x.cmp(y),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            },
            PoolOrder::Function(f) => f(a).cmp(&f(b)),
        };
        by_key.then_with(|| a.cmp(b))
    }

    /// `pools` sorted by this order.
    pub fn sorted<S: AsRef<str> + Clone>(&self, pools: &[S]) -> Vec<S> {
        let mut sorted = pools.to_vec();
        sorted.sort_by(|a, b| self.compare(a.as_ref(), b.as_ref()));
        sorted
    }

    /// Bucket position of every pool in `pools`, in input order.
    pub fn positions<S: AsRef<str>>(&self, pools: &[S]) -> Vec<usize> {
        let mut by_order: Vec<usize> = (0..pools.len()).collect();
        by_order.sort_by(|&a, &b| self.compare(pools[a].as_ref(), pools[b].as_ref()));
        let mut positions = vec![0; pools.len()];
        for (position, &pool) in by_order.iter().enumerate() {
            positions[pool] = position;
        }
        positions
    }
}

impl std::fmt::Debug for PoolOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PoolOrder::Lexical => write!(f, "PoolOrder::Lexical"),
            PoolOrder::Table(keys) => write!(f, "PoolOrder::Table({} keys)", keys.len()),
            PoolOrder::Function(_) => write!(f, "PoolOrder::Function"),
        }
    }
}
