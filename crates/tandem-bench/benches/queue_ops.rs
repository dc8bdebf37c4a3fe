//! Criterion micro-benchmarks for command ordering and hash recording.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use tandem_bench::{command_batch, wired_kernel};
use tandem_kernel::StateKernel;

/// Benchmark: enqueue then drain one frame of 32 commands.
fn bench_enqueue_drain_32(c: &mut Criterion) {
    let batch = command_batch(11, 32);
    c.bench_function("enqueue_drain_32", |b| {
        b.iter_batched(
            || (StateKernel::default(), batch.clone()),
            |(mut kernel, batch)| {
                for cmd in batch {
                    kernel.enqueue_command(cmd);
                }
                black_box(kernel.drain_commands())
            },
            BatchSize::SmallInput,
        );
    });
}

/// Benchmark: record local and remote frame hashes for 4 peers, then prune.
fn bench_record_and_prune(c: &mut Criterion) {
    c.bench_function("record_hashes_4_peers_prune", |b| {
        b.iter_batched(
            wired_kernel,
            |mut kernel| {
                for frame in 0..128u32 {
                    let hash = kernel.record_local_frame_hash(Some(frame), None).unwrap_or(0);
                    for peer in 1..4 {
                        kernel.record_remote_frame_hash(frame, peer, hash);
                    }
                }
                kernel.prune_validation_before(64);
                black_box(kernel)
            },
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(benches, bench_enqueue_drain_32, bench_record_and_prune);
criterion_main!(benches);
