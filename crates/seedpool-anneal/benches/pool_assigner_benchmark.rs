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

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use seedpool_anneal::options::AnnealOptions;
use seedpool_anneal::pools::PoolAssigner;
use seedpool_anneal::seeds::SeedPoolAssigner;
use seedpool_model::location::Location;
use seedpool_model::phase::EventPools;
use seedpool_model::table::{EntryRecord, EntryTable, Signup};
use std::hint::black_box;

const EVENTS: [&str; 3] = ["SF", "MK", "DB"];

fn event_pools(npools: usize) -> EventPools {
    EVENTS
        .iter()
        .enumerate()
        .map(|(e, event)| {
            let wave = (b'A' + e as u8) as char;
            let pools = (1..=npools).map(|p| format!("{}{}", wave, p)).collect::<Vec<_>>();
            (event.to_string(), pools)
        })
        .collect()
}

/// A field of `rows` competitors, most of them in two or three events.
fn synthetic_field(rows: usize, seeded: bool) -> EntryTable {
    (0..rows)
        .map(|i| {
            let mut record = EntryRecord::new(format!("p{}", i))
                .with_attribute("club", format!("club{}", i % 7));
            for (e, event) in EVENTS.iter().enumerate() {
                if (i + e) % 4 == 3 {
                    continue;
                }
                let mut signup = Signup::open();
                if seeded {
                    signup = signup.with_value(((i * 7 + e) % 5 + 1) as f64);
                }
                record = record.with_signup(*event, signup);
            }
            record
        })
        .collect()
}

fn bench_pool_assigner(c: &mut Criterion) {
    let mut group = c.benchmark_group("pool_assigner_benchmark");
    for &(rows, npools) in &[(64, 4), (256, 8), (1024, 16)] {
        let table = synthetic_field(rows, false);
        let assigner = PoolAssigner::new(EVENTS, event_pools(npools))
            .with_locations([Location::single("club")])
            .with_anneal_options(AnnealOptions::default().with_max_iters(2_000));

        group.throughput(Throughput::Elements(2_000));
        group.bench_with_input(
            BenchmarkId::new("pools", format!("{}x{}", rows, npools)),
            &table,
            |b, table| {
                b.iter(|| {
                    let mut rng = ChaCha8Rng::seed_from_u64(42);
                    let result = assigner
                        .run(black_box(table), &mut rng)
                        .unwrap_or_else(|e| panic!("pool assignment failed: {}", e));
                    black_box(result.score())
                })
            },
        );
    }
    group.finish();
}

fn bench_seed_pool_assigner(c: &mut Criterion) {
    let mut group = c.benchmark_group("seed_pool_assigner_benchmark");
    for &(rows, npools) in &[(64, 4), (256, 8)] {
        let table = synthetic_field(rows, true);
        let assigner = SeedPoolAssigner::new(EVENTS, event_pools(npools))
            .with_locations([Location::single("club")])
            .with_anneal_options(AnnealOptions::default().with_max_iters(2_000));

        group.throughput(Throughput::Elements(2_000));
        group.bench_with_input(
            BenchmarkId::new("seeds", format!("{}x{}", rows, npools)),
            &table,
            |b, table| {
                b.iter(|| {
                    let mut rng = ChaCha8Rng::seed_from_u64(42);
                    let result = assigner
                        .run(black_box(table), &mut rng)
                        .unwrap_or_else(|e| panic!("seed assignment failed: {}", e));
                    black_box(result.score())
                })
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_pool_assigner, bench_seed_pool_assigner);
criterion_main!(benches);
