use agora_contracts::ValueStoreCall;
use agora_governor::{hash_description, hash_proposal, Governor, GovernorConfig, ProposalActions, VoteSupport};
use agora_timelock::Timelock;
use agora_types::{Address, Env};
use agora_votes::VotesLedger;
use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};

const VOTERS: usize = 200;

fn bundle(calls: usize) -> ProposalActions {
    let target = Address::derive(b"store");
    let mut actions = ProposalActions::new(Vec::new(), Vec::new(), Vec::new());
    for i in 0..calls {
        actions.targets.push(target);
        actions.values.push(0);
        actions.calldatas.push(ValueStoreCall::Store(i as u128).encode().unwrap());
    }
    actions
}

fn bench_hashing(c: &mut Criterion) {
    let mut group = c.benchmark_group("proposal_hashing");
    let description = hash_description("benchmark proposal");

    for calls in [1usize, 16, 128] {
        let actions = bundle(calls);
        group.bench_function(format!("hash_proposal_{calls}"), |b| {
            b.iter(|| black_box(hash_proposal(black_box(&actions), description).unwrap()))
        });
    }

    group.finish();
}

fn bench_voting(c: &mut Criterion) {
    let mut group = c.benchmark_group("voting");
    let voters: Vec<Address> = (0..VOTERS)
        .map(|i| Address::derive(format!("voter-{i}").as_bytes()))
        .collect();

    let mut env = Env::new(1, 0);
    let mut ledger = VotesLedger::new();
    for voter in &voters {
        ledger.mint(&env, *voter, 1_000).unwrap();
        ledger.delegate(&env, *voter, *voter).unwrap();
    }
    env.advance_blocks(1, 12);

    let governor_address = Address::derive(b"governor");
    let timelock = Timelock::new(Address::derive(b"timelock"), 0, &[governor_address], &[governor_address], None);

    group.bench_function(format!("propose_and_cast_{VOTERS}"), |b| {
        b.iter_batched(
            || {
                Governor::new(&env, governor_address, timelock.address(), &GovernorConfig::default()).unwrap()
            },
            |mut governor| {
                let mut env = env;
                let id = governor
                    .propose(&env, &ledger, &timelock, voters[0], bundle(1), "bench")
                    .unwrap();
                env.advance_blocks(2, 12);
                for voter in &voters {
                    governor
                        .cast_vote(&env, &ledger, *voter, id, VoteSupport::For)
                        .unwrap();
                }
                black_box(governor)
            },
            BatchSize::SmallInput,
        )
    });

    group.finish();
}

criterion_group!(benches, bench_hashing, bench_voting);
criterion_main!(benches);
