// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use ps2rx::core::config::{EmulatorConfig, ExecutionMode};
use ps2rx::core::cpu::{build_block, decode, ExecutionDriver, CPU};
use ps2rx::core::memory::Bus;
use std::hint::black_box;

/// Counted loop with ALU, shift, multiply and MMI work in the body
const LOOP: [u32; 7] = [
    0x2508_0001, // addiu $t0, $t0, 1
    0x0008_48F8, // dsll $t1, $t0, 3
    0x0109_5018, // mult $t2, $t0, $t1
    0x716B_4808, // paddw $t1, $t3, $t3
    0x2529_0002, // addiu $t1, $t1, 2
    0x1000_FFFA, // beq $0, $0, loop
    0x0000_0000, // nop
];

fn load_loop(bus: &mut Bus) {
    for (i, &word) in LOOP.iter().enumerate() {
        bus.write32(0x8000_1000 + i as u32 * 4, word).unwrap();
    }
}

fn cpu_step_benchmark(c: &mut Criterion) {
    c.bench_function("cpu_step", |b| {
        let mut cpu = CPU::new();
        let mut bus = Bus::new();
        load_loop(&mut bus);
        cpu.set_pc(0x8000_1000);

        b.iter(|| black_box(cpu.step(&mut bus).unwrap()));
    });
}

fn decode_benchmark(c: &mut Criterion) {
    c.bench_function("decode_loop_body", |b| {
        b.iter(|| {
            for &raw in &LOOP {
                black_box(decode(black_box(raw)));
            }
        });
    });
}

fn block_build_benchmark(c: &mut Criterion) {
    let mut bus = Bus::new();
    load_loop(&mut bus);

    c.bench_function("build_block", |b| {
        b.iter(|| black_box(build_block(&bus, black_box(0x8000_1000), 256).unwrap()));
    });
}

fn driver_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("driver");

    for (name, mode) in [
        ("block_cache", ExecutionMode::BlockCache),
        ("interpreter", ExecutionMode::Interpreter),
    ] {
        group.bench_with_input(BenchmarkId::new("loop_7000", name), &mode, |b, &mode| {
            let mut cpu = CPU::new();
            let mut bus = Bus::new();
            load_loop(&mut bus);
            let mut driver = ExecutionDriver::new(EmulatorConfig {
                mode,
                ..EmulatorConfig::default()
            });

            b.iter(|| {
                cpu.set_pc(0x8000_1000);
                let mut retired = driver.stats().instructions;
                let target = retired + 7000;
                while retired < target {
                    driver.step(&mut cpu, &mut bus).unwrap();
                    retired = driver.stats().instructions;
                }
                black_box(cpu.reg(8))
            });
        });
    }

    group.finish();
}

fn bus_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("bus");

    group.bench_function("read32_ram", |b| {
        let bus = Bus::new();
        b.iter(|| black_box(bus.read32(black_box(0x8000_1000)).unwrap()));
    });

    group.bench_function("write128_ram", |b| {
        let mut bus = Bus::new();
        b.iter(|| {
            bus.write128(black_box(0x8000_2000), black_box(u128::MAX))
                .unwrap()
        });
    });

    group.bench_function("read32_scratchpad", |b| {
        let bus = Bus::new();
        b.iter(|| black_box(bus.read32(black_box(0x7000_0100)).unwrap()));
    });

    group.finish();
}

criterion_group!(
    benches,
    cpu_step_benchmark,
    decode_benchmark,
    block_build_benchmark,
    driver_benchmark,
    bus_benchmark
);
criterion_main!(benches);
