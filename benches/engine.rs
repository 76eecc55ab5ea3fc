// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Daniel Negri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Benchmarks for the parking engine.
//!
//! Run with: cargo bench
//!
//! Benchmarks include:
//! - Pricing (estimates and exit fees)
//! - Single-threaded park/exit cycles on both account stores
//! - Parallel park/exit cycles contending on the lot lock

use chrono::{DateTime, Duration, TimeZone, Utc};
use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use easypark_rs::{
    AccountStore, Billing, Engine, FundingMethod, MemoryAccountStore, ParkingLot, SpotId,
    SqliteAccountStore, Username, Vehicle, VehicleClass,
};
use rayon::prelude::*;
use rust_decimal_macros::dec;

// =============================================================================
// Helper Functions
// =============================================================================

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

fn engine_with_users<S: AccountStore>(store: S, spots: usize) -> (Engine<S>, Vec<Username>) {
    let engine = Engine::new(ParkingLot::new(spots), store, Billing::default());
    let users = (0..spots)
        .map(|i| {
            let user = Username(format!("user{i}"));
            engine.signup(&user, "pw").unwrap();
            engine
                .add_funds(&user, dec!(1000000), FundingMethod::Card)
                .unwrap();
            user
        })
        .collect();
    (engine, users)
}

fn park_and_exit<S: AccountStore>(engine: &Engine<S>, user: &Username, spot: &SpotId) {
    let vehicle = Vehicle::new(VehicleClass::Car, "BENCH");
    engine
        .park_vehicle_at(user, spot, vehicle, 1, t0())
        .unwrap();
    engine
        .pay_and_exit(user, spot, t0() + Duration::minutes(90))
        .unwrap();
}

// =============================================================================
// Pricing Benchmarks
// =============================================================================

fn bench_estimate_cost(c: &mut Criterion) {
    let billing = Billing::default();
    c.bench_function("estimate_cost", |b| {
        b.iter(|| billing.estimate_cost(black_box(VehicleClass::Car), black_box(3)))
    });
}

fn bench_exit_fee(c: &mut Criterion) {
    let billing = Billing::default();
    let mut lot = ParkingLot::new(1);
    let spot = SpotId::from("A1");
    lot.occupy_at(
        &spot,
        Vehicle::new(VehicleClass::Motorcycle, "M"),
        2,
        Username::from("u"),
        t0(),
    )
    .unwrap();
    let occupied = lot.spot(&spot).unwrap().clone();

    c.bench_function("exit_fee", |b| {
        b.iter(|| billing.exit_fee(black_box(&occupied), t0() + Duration::seconds(9_123)))
    });
}

// =============================================================================
// Single-Threaded Benchmarks
// =============================================================================

fn bench_park_exit_memory(c: &mut Criterion) {
    let (engine, users) = engine_with_users(MemoryAccountStore::new(), 1);
    let spot = SpotId::from("A1");
    c.bench_function("park_exit_memory", |b| {
        b.iter(|| park_and_exit(&engine, &users[0], &spot))
    });
}

fn bench_park_exit_sqlite(c: &mut Criterion) {
    let (engine, users) = engine_with_users(SqliteAccountStore::in_memory().unwrap(), 1);
    let spot = SpotId::from("A1");
    c.bench_function("park_exit_sqlite", |b| {
        b.iter(|| park_and_exit(&engine, &users[0], &spot))
    });
}

fn bench_lot_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("available_spots");

    for size in [10usize, 100, 1_000].iter() {
        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let (engine, users) = engine_with_users(MemoryAccountStore::new(), size);
            // Half the lot occupied
            for (i, user) in users.iter().enumerate().step_by(2) {
                engine
                    .park_vehicle_at(user, &SpotId::from_index(i), Vehicle::new(VehicleClass::Car, "X"), 1, t0())
                    .unwrap();
            }
            b.iter(|| black_box(engine.available_spots()))
        });
    }
    group.finish();
}

// =============================================================================
// Multi-Threaded Benchmarks
// =============================================================================

fn bench_parallel_park_exit(c: &mut Criterion) {
    let mut group = c.benchmark_group("parallel_park_exit");

    for spots in [2usize, 8, 32].iter() {
        group.throughput(Throughput::Elements(*spots as u64));
        group.bench_with_input(BenchmarkId::from_parameter(spots), spots, |b, &spots| {
            let (engine, users) = engine_with_users(MemoryAccountStore::new(), spots);
            b.iter(|| {
                users.par_iter().enumerate().for_each(|(i, user)| {
                    park_and_exit(&engine, user, &SpotId::from_index(i));
                });
            })
        });
    }
    group.finish();
}

criterion_group!(pricing, bench_estimate_cost, bench_exit_fee,);

criterion_group!(
    single_threaded,
    bench_park_exit_memory,
    bench_park_exit_sqlite,
    bench_lot_scan,
);

criterion_group!(multi_threaded, bench_parallel_park_exit,);

criterion_main!(pricing, single_threaded, multi_threaded);
