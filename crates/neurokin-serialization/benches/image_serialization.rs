// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Parameter image serialization throughput by channel count

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use neurokin_model::builds::izk_curr_comb_exp;
use neurokin_model::fragments::{standard_channels, IzhikevichParameters};
use neurokin_model::Timestep;
use neurokin_serialization::serialize_descriptor;

fn bench_serialize_descriptor(c: &mut Criterion) {
    let mut group = c.benchmark_group("serialize_descriptor");
    for n in [2usize, 8, 32] {
        let model = izk_curr_comb_exp(&IzhikevichParameters::default(), &standard_channels(n / 2, n / 2))
            .expect("valid model");
        let scales = vec![1.0; n];
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| serialize_descriptor(black_box(&model), black_box(&scales), Timestep::default()))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_serialize_descriptor);
criterion_main!(benches);
