//! Criterion micro-benchmarks for checksum accumulation and GameLogic CRCs.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use tandem_bench::{command_batch, wired_kernel};
use tandem_crc::CrcAccumulator;
use tandem_kernel::GameLogicCrcOptions;

/// Benchmark: fold a 4 KiB block.
fn bench_crc_add_bytes_4k(c: &mut Criterion) {
    let data: Vec<u8> = (0..4096u32).map(|i| (i * 31) as u8).collect();
    let mut group = c.benchmark_group("crc");
    group.throughput(Throughput::Bytes(data.len() as u64));
    group.bench_function("add_bytes_4k", |b| {
        b.iter(|| {
            let mut crc = CrcAccumulator::new();
            crc.add_bytes(black_box(&data));
            black_box(crc.crc())
        });
    });
    group.finish();
}

/// Benchmark: 1000 checked 32-bit writes.
fn bench_crc_checked_ints(c: &mut Criterion) {
    c.bench_function("crc_add_unsigned_int_1000", |b| {
        b.iter(|| {
            let mut crc = CrcAccumulator::new();
            for i in 0..1000i64 {
                crc.add_unsigned_int(black_box(i)).unwrap();
            }
            black_box(crc.crc())
        });
    });
}

/// Benchmark: full GameLogic CRC over a 64-command snapshot.
fn bench_game_logic_crc(c: &mut Criterion) {
    let mut kernel = wired_kernel();
    for cmd in command_batch(5, 64) {
        kernel.enqueue_command(cmd);
    }
    c.bench_function("game_logic_crc_64_commands", |b| {
        b.iter(|| {
            black_box(
                kernel
                    .compute_game_logic_crc(None, GameLogicCrcOptions::default())
                    .unwrap(),
            )
        });
    });
}

criterion_group!(
    benches,
    bench_crc_add_bytes_4k,
    bench_crc_checked_ints,
    bench_game_logic_crc
);
criterion_main!(benches);
