/*
 * sss: shamir secret sharing over GF(2^8) with authenticated shares
 * Copyright (C) 2018-2022 Aleksa Sarai <cyphar@cyphar.com>
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this program.  If not, see <https://www.gnu.org/licenses/>.
 */

use std::time::Duration;

use sss_core::{
    combine_shares, create_shares,
    shamir::{recover_secret, Dealer},
    SECRET_LENGTH,
};

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use rand::{distributions::Standard, rngs::OsRng, Rng};

fn random_bytes(len: usize) -> Vec<u8> {
    rand::thread_rng()
        .sample_iter(Standard)
        .take(len)
        .collect::<Vec<u8>>()
}

fn benchmark_dealer_shard(c: &mut Criterion) {
    let mut group = c.benchmark_group("shamir Dealer::shard");
    for threshold in (10..=40).step_by(10) {
        let secret = random_bytes(1 << 12);
        let dealer = Dealer::new(threshold, &secret, &mut OsRng).unwrap();
        group.measurement_time(Duration::new(20, 0));
        group.throughput(Throughput::Bytes(secret.len() as u64));
        group.bench_with_input(format!("K={:03}", threshold), &dealer, |b, dealer| {
            b.iter(|| dealer.shard(black_box(threshold)))
        });
    }
    group.finish()
}

fn benchmark_recover_secret(c: &mut Criterion) {
    let mut group = c.benchmark_group("shamir recover_secret");
    for threshold in (5..=65).step_by(15) {
        let secret = random_bytes(1 << 12);
        let dealer = Dealer::new(threshold, &secret, &mut OsRng).unwrap();
        let shards = dealer.shards(threshold).collect::<Vec<_>>();
        group.throughput(Throughput::Bytes(secret.len() as u64));
        group.measurement_time(Duration::new(20 + threshold as u64, 0));
        group.bench_with_input(format!("K={:03}", threshold), &shards, |b, shards| {
            b.iter(|| recover_secret(black_box(shards)).unwrap())
        });
    }
    group.finish()
}

fn benchmark_shares_roundtrip(c: &mut Criterion) {
    let mut group = c.benchmark_group("create_shares + combine_shares");
    let mut secret = [0u8; SECRET_LENGTH];
    rand::thread_rng().fill(&mut secret[..]);
    for (count, threshold) in [(5, 3), (50, 25), (254, 128)] {
        group.bench_function(format!("N={:03} K={:03}", count, threshold), |b| {
            b.iter(|| {
                let shares = create_shares(black_box(&secret), count, threshold).unwrap();
                combine_shares(&shares[..threshold]).unwrap()
            })
        });
    }
    group.finish()
}

criterion_group! {
    name = benches;
    config = Criterion::default().sample_size(100);
    targets = benchmark_dealer_shard, benchmark_recover_secret, benchmark_shares_roundtrip
}
criterion_main!(benches);
