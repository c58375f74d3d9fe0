use agora_types::{Address, Env};
use agora_votes::{Checkpoints, VotesLedger};
use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};

fn bench_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("checkpoints_lookup");

    for size in [16u64, 1_024, 65_536] {
        let mut cp = Checkpoints::new();
        for t in 0..size {
            cp.push(t * 3, u128::from(t) + 1).unwrap();
        }
        group.bench_function(format!("upper_lookup_{size}"), |b| {
            let mut query = 0u64;
            b.iter(|| {
                query = (query + 7_919) % (size * 3);
                black_box(cp.upper_lookup(black_box(query)))
            })
        });
    }

    group.finish();
}

fn bench_ledger(c: &mut Criterion) {
    let mut group = c.benchmark_group("votes_ledger");
    let alice = Address::derive(b"alice");
    let bob = Address::derive(b"bob");

    group.bench_function("transfer_between_delegates", |b| {
        b.iter_batched(
            || {
                let env = Env::new(1, 0);
                let mut ledger = VotesLedger::new();
                ledger.mint(&env, alice, 1_000_000).unwrap();
                ledger.delegate(&env, alice, alice).unwrap();
                ledger.delegate(&env, bob, bob).unwrap();
                ledger
            },
            |mut ledger| {
                let mut env = Env::new(2, 12);
                for _ in 0..100 {
                    ledger.transfer(&env, alice, bob, 1).unwrap();
                    env.advance_blocks(1, 12);
                }
                black_box(ledger)
            },
            BatchSize::SmallInput,
        )
    });

    let mut env = Env::new(1, 0);
    let mut ledger = VotesLedger::new();
    ledger.mint(&env, alice, 1_000_000).unwrap();
    ledger.delegate(&env, alice, alice).unwrap();
    for _ in 0..10_000 {
        env.advance_blocks(1, 12);
        ledger.transfer(&env, alice, bob, 1).unwrap();
    }
    env.advance_blocks(1, 12);

    group.bench_function("power_at_10k_history", |b| {
        b.iter(|| black_box(ledger.power_at(&env, &alice, black_box(5_000)).unwrap()))
    });

    group.finish();
}

criterion_group!(benches, bench_lookup, bench_ledger);
criterion_main!(benches);
