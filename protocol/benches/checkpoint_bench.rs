// Point-in-time lookup benchmarks for the checkpoint ledger.
//
// Covers historical balance queries against accounts with long histories,
// and the cost of appending mutations as histories grow.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use tvrbo_protocol::identity::AccountId;
use tvrbo_protocol::ledger::{CheckpointLedger, SequencePoint, TokenMetadata};

/// Ledger where `holder` has `n` checkpoints from alternating mints and
/// transfers out.
fn ledger_with_history(n: u64) -> (CheckpointLedger, AccountId) {
    let ctrl = AccountId::from_label("ctrl");
    let holder = AccountId::from_label("holder");
    let sink = AccountId::from_label("sink");
    let mut ledger = CheckpointLedger::new(TokenMetadata::default(), ctrl);
    for i in 0..n {
        if i % 2 == 0 {
            ledger.mint(&ctrl, &holder, 1_000).unwrap();
        } else {
            ledger.transfer(&holder, &sink, 1).unwrap();
        }
    }
    (ledger, holder)
}

fn bench_balance_at(c: &mut Criterion) {
    let mut group = c.benchmark_group("ledger/balance_at");
    for size in [100u64, 10_000, 1_000_000] {
        let (ledger, holder) = ledger_with_history(size);
        let mid = SequencePoint::new(size / 2);
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| ledger.balance_at(black_box(&holder), black_box(mid)));
        });
    }
    group.finish();
}

fn bench_transfer_append(c: &mut Criterion) {
    let (mut ledger, holder) = ledger_with_history(10_000);
    let other = AccountId::from_label("other");
    c.bench_function("ledger/transfer_append", |b| {
        b.iter(|| {
            ledger.transfer(&holder, &other, 1).unwrap();
            ledger.transfer(&other, &holder, 1).unwrap();
        });
    });
}

criterion_group!(benches, bench_balance_at, bench_transfer_append);
criterion_main!(benches);
