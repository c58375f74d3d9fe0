//! End-to-end governance scenarios.
//!
//! Each test wires a ledger, a timelock, a governor and a value store the
//! way a deployment does, then drives proposals through their lifecycle.

use agora_contracts::{ContractError, StoredValue, TargetRegistry, ValueStoreCall};
use agora_governor::{
    hash_description, GovernorCall, GovernorConfig, GovernorError, Governor, ProposalActions,
    ProposalState, VoteSupport,
};
use agora_timelock::{Role, Timelock, TimelockCall, TimelockError};
use agora_types::{Address, Amount, Call, Dispatcher, Env, Hash};
use agora_votes::VotesLedger;

const MIN_DELAY: u64 = 3_600;
const VOTING_DELAY: u64 = 1;
const VOTING_PERIOD: u64 = 5;
const BLOCK_TIME: u64 = 12;

fn governor_at() -> Address {
    Address::derive(b"governor")
}

fn timelock_at() -> Address {
    Address::derive(b"timelock")
}

fn store_at() -> Address {
    Address::derive(b"store")
}

fn deployer() -> Address {
    Address::derive(b"deployer")
}

fn alice() -> Address {
    Address::derive(b"alice")
}

fn bob() -> Address {
    Address::derive(b"bob")
}

fn whale() -> Address {
    Address::derive(b"whale")
}

struct World {
    env: Env,
    ledger: VotesLedger,
    timelock: Timelock,
    governor: Governor,
    registry: TargetRegistry,
}

fn config() -> GovernorConfig {
    GovernorConfig {
        voting_delay: VOTING_DELAY,
        voting_period: VOTING_PERIOD,
        ..Default::default()
    }
}

/// Deploy and hand everything over to governance.
fn world_with(config: GovernorConfig, holdings: &[(Address, Amount)]) -> World {
    deploy(config, holdings, &[governor_at()])
}

/// Like [`world_with`], but anyone may run ready operations.
fn open_world(config: GovernorConfig) -> World {
    deploy(config, &[(alice(), 600), (bob(), 400)], &[governor_at(), Address::ANYONE])
}

fn deploy(config: GovernorConfig, holdings: &[(Address, Amount)], executors: &[Address]) -> World {
    let mut env = Env::new(1, 1_700_000_000);

    let mut ledger = VotesLedger::new();
    for (holder, amount) in holdings {
        ledger.mint(&env, *holder, *amount).unwrap();
        ledger.delegate(&env, *holder, *holder).unwrap();
    }

    let mut timelock = Timelock::new(timelock_at(), MIN_DELAY, &[], executors, Some(deployer()))
        .with_grace_period(config.grace_period);
    timelock.grant_role(deployer(), Role::Proposer, governor_at()).unwrap();
    let governor = Governor::new(&env, governor_at(), timelock_at(), &config).unwrap();

    let mut registry = TargetRegistry::new();
    registry.deploy(store_at(), Box::new(StoredValue::new(deployer())));
    registry
        .get_mut::<StoredValue>(&store_at())
        .unwrap()
        .transfer_ownership(deployer(), timelock_at())
        .unwrap();

    timelock.renounce_role(deployer(), Role::Admin);
    env.advance_blocks(1, BLOCK_TIME);

    World { env, ledger, timelock, governor, registry }
}

fn world() -> World {
    world_with(config(), &[(alice(), 600), (bob(), 400)])
}

fn store(value: u128) -> ProposalActions {
    ProposalActions::single(store_at(), ValueStoreCall::Store(value).encode().unwrap())
}

impl World {
    fn mine(&mut self, blocks: u64) {
        self.env.advance_blocks(blocks, BLOCK_TIME);
    }

    fn wait(&mut self, seconds: u64) {
        self.env.advance_time(seconds);
    }

    fn propose(&mut self, actions: &ProposalActions, description: &str) -> Result<Hash, GovernorError> {
        self.governor.propose(
            &self.env,
            &self.ledger,
            &self.timelock,
            alice(),
            actions.clone(),
            description,
        )
    }

    fn vote(&mut self, voter: Address, id: Hash, support: VoteSupport) -> Result<Amount, GovernorError> {
        self.governor.cast_vote(&self.env, &self.ledger, voter, id, support)
    }

    fn state(&self, id: &Hash) -> ProposalState {
        self.governor.state(&self.env, &self.ledger, &self.timelock, id).unwrap()
    }

    fn queue(&mut self, actions: &ProposalActions, description: &str) -> Result<Vec<Hash>, GovernorError> {
        self.governor.queue(
            &self.env,
            &self.ledger,
            &mut self.timelock,
            actions,
            hash_description(description),
        )
    }

    fn execute(&mut self, actions: &ProposalActions, description: &str) -> Result<(), GovernorError> {
        self.governor.execute(
            &self.env,
            &self.ledger,
            &mut self.timelock,
            &mut self.registry,
            actions,
            hash_description(description),
        )
    }

    fn stored(&self) -> u128 {
        self.registry.get::<StoredValue>(&store_at()).unwrap().retrieve()
    }

    /// Propose, vote with `votes`, and close the voting window.
    fn decide(&mut self, actions: &ProposalActions, description: &str, votes: &[(Address, VoteSupport)]) -> Hash {
        let id = self.propose(actions, description).unwrap();
        self.mine(VOTING_DELAY + 1);
        for (voter, support) in votes {
            self.vote(*voter, id, *support).unwrap();
        }
        self.mine(VOTING_PERIOD);
        id
    }
}

#[test]
fn test_store_777_through_governance() {
    let mut w = world();
    let actions = store(777);
    let description = "Proposal #1: store 777";

    // The timelock owns the store; nobody else can write to it.
    let err = w
        .registry
        .get_mut::<StoredValue>(&store_at())
        .unwrap()
        .store(alice(), 777)
        .unwrap_err();
    assert_eq!(err, ContractError::NotOwner { caller: alice(), owner: timelock_at() });
    let data = ValueStoreCall::Store(777).encode().unwrap();
    assert!(w.registry.dispatch(&w.env, alice(), store_at(), 0, &data).is_err());

    let id = w.propose(&actions, description).unwrap();
    assert_eq!(w.state(&id), ProposalState::Pending);

    w.mine(VOTING_DELAY + 1);
    assert_eq!(w.state(&id), ProposalState::Active);
    w.vote(alice(), id, VoteSupport::For).unwrap();
    w.vote(bob(), id, VoteSupport::Against).unwrap();

    w.mine(VOTING_PERIOD);
    assert_eq!(w.state(&id), ProposalState::Succeeded);

    w.queue(&actions, description).unwrap();
    assert_eq!(w.state(&id), ProposalState::Queued);

    w.wait(MIN_DELAY);
    w.execute(&actions, description).unwrap();
    assert_eq!(w.state(&id), ProposalState::Executed);
    assert_eq!(w.stored(), 777);
}

#[test]
fn test_no_votes_is_defeated() {
    let mut w = world();
    let actions = store(1);
    let id = w.decide(&actions, "quiet", &[]);

    assert_eq!(w.state(&id), ProposalState::Defeated);
    assert_eq!(
        w.queue(&actions, "quiet"),
        Err(GovernorError::NotSucceeded { id, state: ProposalState::Defeated })
    );
}

#[test]
fn test_early_execution_then_success() {
    let mut w = world();
    let actions = store(5);
    w.decide(&actions, "wait for it", &[(alice(), VoteSupport::For)]);
    w.queue(&actions, "wait for it").unwrap();

    w.wait(MIN_DELAY - 1);
    let err = w.execute(&actions, "wait for it").unwrap_err();
    assert!(matches!(err, GovernorError::Timelock(TimelockError::NotReady { .. })));
    assert_eq!(w.stored(), 0);

    w.wait(1);
    w.execute(&actions, "wait for it").unwrap();
    assert_eq!(w.stored(), 5);
}

#[test]
fn test_quorum_boundary() {
    // Supply 1_001 at 4% needs ceil(40.04) = 41 votes.
    let holdings = [(alice(), 40), (bob(), 1), (whale(), 960)];

    let mut w = world_with(config(), &holdings);
    let actions = store(1);
    let id = w.decide(&actions, "short", &[(alice(), VoteSupport::For)]);
    assert_eq!(w.governor.quorum(&w.env, &w.ledger, w.governor.proposal_snapshot(&id).unwrap()).unwrap(), 41);
    assert_eq!(w.state(&id), ProposalState::Defeated);

    let mut w = world_with(config(), &holdings);
    let id = w.decide(&actions, "enough", &[(alice(), VoteSupport::For), (bob(), VoteSupport::Abstain)]);
    assert_eq!(w.state(&id), ProposalState::Succeeded);
}

#[test]
fn test_double_vote_rejected_and_tally_bounded() {
    let mut w = world_with(config(), &[(alice(), 600), (bob(), 400), (whale(), 5_000)]);
    let id = w.propose(&store(1), "once").unwrap();
    w.mine(VOTING_DELAY + 1);
    w.vote(alice(), id, VoteSupport::For).unwrap();
    assert_eq!(
        w.vote(alice(), id, VoteSupport::For),
        Err(GovernorError::AlreadyVoted { id, voter: alice() })
    );
    w.vote(bob(), id, VoteSupport::Against).unwrap();

    // Power moved after the snapshot does not count twice.
    w.ledger.transfer(&w.env, alice(), bob(), 600).unwrap();
    assert_eq!(
        w.vote(alice(), id, VoteSupport::Abstain),
        Err(GovernorError::AlreadyVoted { id, voter: alice() })
    );
    w.mine(1);

    let snapshot = w.governor.proposal_snapshot(&id).unwrap();
    let mut counted = 0;
    for voter in [alice(), bob()] {
        let receipt = w.governor.receipt(&id, &voter).unwrap();
        assert_eq!(receipt.weight, w.ledger.power_at(&w.env, &voter, snapshot).unwrap());
        counted += receipt.weight;
    }
    assert!(w.governor.receipt(&id, &whale()).is_none());
    assert_eq!(w.governor.proposal_votes(&id).unwrap().total(), counted);
}

#[test]
fn test_failing_call_rolls_back_bundle() {
    let mut w = world();
    let actions = ProposalActions::new(
        vec![store_at(), store_at()],
        vec![0, 0],
        vec![
            ValueStoreCall::Store(42).encode().unwrap(),
            ValueStoreCall::TransferOwnership(Address::ZERO).encode().unwrap(),
        ],
    );
    let id = w.decide(&actions, "half broken", &[(alice(), VoteSupport::For)]);
    w.queue(&actions, "half broken").unwrap();
    w.wait(MIN_DELAY);

    let err = w.execute(&actions, "half broken").unwrap_err();
    assert!(matches!(
        err,
        GovernorError::Timelock(TimelockError::CallFailed { index: 1, .. })
    ));
    assert_eq!(w.stored(), 0);
    assert_eq!(w.state(&id), ProposalState::Queued);
}

#[test]
fn test_expired_after_grace_period() {
    let mut w = world_with(GovernorConfig { grace_period: 86_400, ..config() }, &[(alice(), 1)]);
    let actions = store(3);
    let id = w.decide(&actions, "slow", &[(alice(), VoteSupport::For)]);
    w.queue(&actions, "slow").unwrap();

    w.wait(MIN_DELAY + 86_400);
    assert_eq!(w.state(&id), ProposalState::Expired);
    assert!(matches!(w.execute(&actions, "slow"), Err(GovernorError::NotQueued { .. })));
    assert_eq!(w.stored(), 0);
}

#[test]
fn test_governance_updates_its_own_settings() {
    let mut w = world();
    let actions = ProposalActions::new(
        vec![governor_at(), timelock_at()],
        vec![0, 0],
        vec![
            GovernorCall::SetVotingPeriod { new: 20 }.encode().unwrap(),
            TimelockCall::UpdateDelay { new_delay: 7_200 }.encode().unwrap(),
        ],
    );
    w.decide(&actions, "retune", &[(alice(), VoteSupport::For)]);
    w.queue(&actions, "retune").unwrap();
    w.wait(MIN_DELAY);
    w.execute(&actions, "retune").unwrap();

    assert_eq!(w.governor.voting_period(), 20);
    assert_eq!(w.timelock.min_delay(), 7_200);

    // Settings calls from anyone but the timelock are refused.
    assert_eq!(
        w.governor.update_settings(&w.env, alice(), GovernorCall::SetVotingPeriod { new: 1 }),
        Err(GovernorError::Unauthorized(alice()))
    );
}

#[test]
fn test_timelock_cancel_cancels_proposal() {
    let mut w = world();
    // Governance grants a guardian the ADMIN role over the timelock.
    let guardian = Address::derive(b"guardian");
    let grant = ProposalActions::single(
        timelock_at(),
        TimelockCall::GrantRole { role: Role::Admin, account: guardian }.encode().unwrap(),
    );
    w.decide(&grant, "appoint guardian", &[(alice(), VoteSupport::For)]);
    w.queue(&grant, "appoint guardian").unwrap();
    w.wait(MIN_DELAY);
    w.execute(&grant, "appoint guardian").unwrap();
    assert!(w.timelock.has_role(Role::Admin, &guardian));

    let actions = store(9);
    let id = w.decide(&actions, "vetoed", &[(alice(), VoteSupport::For)]);
    let ops = w.queue(&actions, "vetoed").unwrap();
    w.timelock.cancel(guardian, ops[0]).unwrap();

    assert_eq!(w.state(&id), ProposalState::Canceled);
    w.wait(MIN_DELAY);
    assert!(matches!(w.execute(&actions, "vetoed"), Err(GovernorError::NotQueued { .. })));
}

#[test]
fn test_redelegation_after_snapshot_does_not_change_weight() {
    let mut w = world();
    let id = w.propose(&store(1), "delegation").unwrap();
    w.mine(VOTING_DELAY + 1);

    w.ledger.delegate(&w.env, alice(), bob()).unwrap();
    assert_eq!(w.ledger.current_votes(&bob()), 1_000);
    assert_eq!(w.ledger.current_votes(&alice()), 0);

    assert_eq!(w.vote(bob(), id, VoteSupport::For).unwrap(), 400);
    assert_eq!(w.vote(alice(), id, VoteSupport::For).unwrap(), 600);
}

#[test]
fn test_defeated_bundle_can_be_proposed_again() {
    let mut w = world();
    let actions = store(11);
    let first = w.decide(&actions, "second chance", &[(bob(), VoteSupport::For), (alice(), VoteSupport::Against)]);
    assert_eq!(w.state(&first), ProposalState::Defeated);

    let second = w.decide(&actions, "second chance", &[(alice(), VoteSupport::For)]);
    assert_eq!(first, second);
    assert_eq!(w.state(&second), ProposalState::Succeeded);
    assert!(!w.governor.has_voted(&second, &bob()));
}

#[test]
fn test_duplicate_live_proposal_rejected() {
    let mut w = world();
    let actions = store(2);
    let id = w.decide(&actions, "once only", &[(alice(), VoteSupport::For)]);
    assert_eq!(
        w.propose(&actions, "once only"),
        Err(GovernorError::AlreadyExists { id, state: ProposalState::Succeeded })
    );
}

/// Salt the governor uses when it queues `description`.
fn salt(w: &World, id: &Hash, description: &str) -> Hash {
    let snapshot = w.governor.proposal_snapshot(id).unwrap();
    Hash::of_encoded(&(governor_at(), hash_description(description), snapshot)).unwrap()
}

#[test]
fn test_open_execution_runs_bundle_whole_or_not_at_all() {
    let mut w = open_world(config());
    let actions = ProposalActions::new(
        vec![store_at(), store_at()],
        vec![0, 0],
        vec![
            ValueStoreCall::Store(1).encode().unwrap(),
            ValueStoreCall::Store(2).encode().unwrap(),
        ],
    );
    let id = w.decide(&actions, "pair", &[(alice(), VoteSupport::For)]);
    let ops = w.queue(&actions, "pair").unwrap();
    assert_eq!(ops.len(), 1);
    w.wait(MIN_DELAY);

    let stranger = Address::derive(b"stranger");
    let salt = salt(&w, &id, "pair");
    let calls: Vec<Call> = actions.calls();

    // The first call alone is not a scheduled operation.
    let err = w
        .timelock
        .execute(&w.env, stranger, &calls[0], Hash::ZERO, salt, &mut w.registry)
        .unwrap_err();
    assert!(matches!(err, TimelockError::OperationNotScheduled(_)));
    assert_eq!(w.stored(), 0);
    assert_eq!(w.state(&id), ProposalState::Queued);

    w.timelock
        .execute_batch(&w.env, stranger, &calls, Hash::ZERO, salt, &mut w.registry)
        .unwrap();
    assert_eq!(w.stored(), 2);
    assert_eq!(w.state(&id), ProposalState::Executed);
}

#[test]
fn test_open_execution_cannot_revive_expired_proposal() {
    let mut w = open_world(GovernorConfig { grace_period: 86_400, ..config() });
    let actions = store(777);
    let id = w.decide(&actions, "too late", &[(alice(), VoteSupport::For)]);
    let ops = w.queue(&actions, "too late").unwrap();
    w.wait(MIN_DELAY + 86_400);
    assert_eq!(w.state(&id), ProposalState::Expired);

    let stranger = Address::derive(b"stranger");
    let salt = salt(&w, &id, "too late");
    let err = w
        .timelock
        .execute_batch(&w.env, stranger, &actions.calls(), Hash::ZERO, salt, &mut w.registry)
        .unwrap_err();
    assert!(matches!(err, TimelockError::Expired { id: op, .. } if op == ops[0]));

    assert_eq!(w.stored(), 0);
    assert_eq!(w.state(&id), ProposalState::Expired);
}
