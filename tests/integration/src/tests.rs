//! Integration tests for the loot box and its randomness oracle.
//!
//! Each contract runs in its own `OwnedDeps` and is driven through its
//! entry points. Messages one contract emits for the other are relayed by
//! hand: the loot box's randomness request becomes an oracle
//! `request_randomness`, and each oracle callback becomes a loot box
//! `fulfill`. A callback the loot box rejects is fed back to the oracle's
//! `reply`, the same as a failed reply-on-error sub-message.
//!
//! Run:
//! ```bash
//! cargo test -p loot-box-integration-tests
//! ```

use cosmwasm_std::testing::{
    message_info, mock_dependencies, mock_env, MockApi, MockQuerier, MockStorage,
};
use cosmwasm_std::{
    coins, from_json, Addr, BankMsg, Binary, Coin, CosmosMsg, Env, OwnedDeps, Reply, ReplyOn,
    Response, SubMsgResult, Timestamp, Uint128, WasmMsg,
};
use loot_box::error::ContractError as LootBoxError;
use loot_box::state::DrawRequest;
use loot_box_common::randomness::derive_random_word;
use loot_box_common::selection::select;
use loot_box_common::types::{AssetRef, DrawStatus, RewardKind};
use randomness_oracle::state::{Job, JobStatus};

// ─── Constants ───

/// Real drand quicknet public key
const QUICKNET_PK_HEX: &str = "83cf0f2896adee7eb8b5f01fcad3912212c437e0073e911fb90022d3e760183c8c4b450b6a0a6c3ac6a5776a2d1064510d1fec758c921cc22b0e17e63aaf4bcb5ed66304de9cf809bd274ca73bab4af5a6e9c76a4bc09e76eae8991ef5ece45a";

/// Real quicknet test vector: round 1000
const TEST_ROUND: u64 = 1000;
const TEST_SIG_HEX: &str = "b44679b9a59af2ec876b1a6b1ad52ea9b1615fc3982b19576350f93447cb1125e342b73a8dd2bacbe47e4b6b63ed5e39";
const TEST_RANDOMNESS_HEX: &str =
    "fe290beca10872ef2fb164d2aa4442de4566183ec51c56ff3cd603d930e54fdd";

const GENESIS: u64 = 1692803367;
const PERIOD: u64 = 3;

const FEE: u128 = 1_000;
const FEE_DENOM: &str = "inj";
const TIMEOUT: u64 = 3600;

type TestDeps = OwnedDeps<MockStorage, MockApi, MockQuerier>;

// ─── Harness ───

struct Harness {
    engine: TestDeps,
    oracle: TestDeps,
    engine_addr: Addr,
    oracle_addr: Addr,
    api: MockApi,
}

/// Block time during drand round 999, so draws opened here target round 1000.
fn env_for(contract: &Addr) -> Env {
    let mut env = mock_env();
    env.block.time = Timestamp::from_seconds(GENESIS + PERIOD * (TEST_ROUND - 2));
    env.contract.address = contract.clone();
    env
}

fn wasm_execute(msg: &CosmosMsg) -> (String, Binary) {
    match msg {
        CosmosMsg::Wasm(WasmMsg::Execute {
            contract_addr, msg, ..
        }) => (contract_addr.clone(), msg.clone()),
        other => panic!("expected wasm execute, got: {:?}", other),
    }
}

impl Harness {
    fn new(max_callbacks_per_beacon: u32) -> Self {
        let api = MockApi::default();
        let engine_addr = api.addr_make("loot_box");
        let oracle_addr = api.addr_make("randomness_oracle");
        let admin = api.addr_make("admin");

        let mut oracle = mock_dependencies();
        randomness_oracle::contract::instantiate(
            oracle.as_mut(),
            env_for(&oracle_addr),
            message_info(&admin, &[]),
            randomness_oracle::msg::InstantiateMsg {
                operators: vec![api.addr_make("operator").to_string()],
                quicknet_pubkey_hex: QUICKNET_PK_HEX.to_string(),
                chain_hash: "52db9ba70e0cc0f6eaf7803dd07447a1f5477735fd3f661792ba94600c84e971"
                    .to_string(),
                genesis_time: GENESIS,
                period_seconds: PERIOD,
                max_callbacks_per_beacon,
            },
        )
        .unwrap();

        let mut engine = mock_dependencies();
        loot_box::contract::instantiate(
            engine.as_mut(),
            env_for(&engine_addr),
            message_info(&admin, &[]),
            loot_box::msg::InstantiateMsg {
                oracle: oracle_addr.to_string(),
                fee_denom: FEE_DENOM.to_string(),
                draw_fee: Uint128::new(FEE),
                timeout_window_seconds: TIMEOUT,
            },
        )
        .unwrap();

        Self {
            engine,
            oracle,
            engine_addr,
            oracle_addr,
            api,
        }
    }

    fn engine_exec(
        &mut self,
        sender: &Addr,
        funds: &[Coin],
        msg: loot_box::msg::ExecuteMsg,
    ) -> Result<Response, LootBoxError> {
        loot_box::contract::execute(
            self.engine.as_mut(),
            env_for(&self.engine_addr),
            message_info(sender, funds),
            msg,
        )
    }

    fn add_fungible(&mut self, denom: &str, amount: u128, weight: u64) {
        let admin = self.api.addr_make("admin");
        self.engine_exec(
            &admin,
            &[],
            loot_box::msg::ExecuteMsg::AddReward {
                kind: RewardKind::Fungible,
                asset: AssetRef::Native {
                    denom: denom.to_string(),
                },
                sub_id: None,
                amount: Uint128::new(amount),
                weight,
            },
        )
        .unwrap();
    }

    /// Catalog {A: 70, B: 20, C: 10}
    fn add_abc(&mut self) {
        self.add_fungible("ua", 100, 70);
        self.add_fungible("ub", 200, 20);
        self.add_fungible("uc", 300, 10);
    }

    fn fund_engine(&mut self, balance: Vec<Coin>) {
        self.engine
            .querier
            .bank
            .update_balance(self.engine_addr.as_str(), balance);
    }

    /// Open a draw and relay its randomness request. Returns (request_id, oracle job id).
    fn open(&mut self, user: &str) -> (u64, u64) {
        let user = self.api.addr_make(user);
        let res = self
            .engine_exec(
                &user,
                &coins(FEE, FEE_DENOM),
                loot_box::msg::ExecuteMsg::Open {},
            )
            .unwrap();
        let request_id: u64 = from_json(res.data.clone().unwrap()).unwrap();

        assert_eq!(res.messages.len(), 1);
        let (contract_addr, msg) = wasm_execute(&res.messages[0].msg);
        assert_eq!(contract_addr, self.oracle_addr.to_string());
        let request: randomness_oracle::msg::ExecuteMsg = from_json(msg).unwrap();

        let res = randomness_oracle::contract::execute(
            self.oracle.as_mut(),
            env_for(&self.oracle_addr),
            message_info(&self.engine_addr, &[]),
            request,
        )
        .unwrap();
        let job_id: u64 = from_json(res.data.unwrap()).unwrap();
        (request_id, job_id)
    }

    /// Relay every oracle callback in `res` to the loot box.
    fn relay_callbacks(&mut self, res: Response) -> Vec<Result<Response, LootBoxError>> {
        let mut results = Vec::new();
        for sub in res.messages {
            assert_eq!(sub.reply_on, ReplyOn::Error);
            let (contract_addr, msg) = wasm_execute(&sub.msg);
            assert_eq!(contract_addr, self.engine_addr.to_string());
            let callback: loot_box::msg::ExecuteMsg = from_json(msg).unwrap();

            let oracle_addr = self.oracle_addr.clone();
            let result = self.engine_exec(&oracle_addr, &[], callback);
            if let Err(err) = &result {
                randomness_oracle::contract::reply(
                    self.oracle.as_mut(),
                    env_for(&self.oracle_addr),
                    Reply {
                        id: sub.id,
                        payload: Binary::default(),
                        gas_used: 0,
                        result: SubMsgResult::Err(err.to_string()),
                    },
                )
                .unwrap();
            }
            results.push(result);
        }
        results
    }

    fn submit_beacon(&mut self) -> Vec<Result<Response, LootBoxError>> {
        let operator = self.api.addr_make("operator");
        let res = randomness_oracle::contract::execute(
            self.oracle.as_mut(),
            env_for(&self.oracle_addr),
            message_info(&operator, &[]),
            randomness_oracle::msg::ExecuteMsg::SubmitBeacon {
                round: TEST_ROUND,
                signature_hex: TEST_SIG_HEX.to_string(),
            },
        )
        .unwrap();
        self.relay_callbacks(res)
    }

    fn deliver_pending(&mut self) -> Vec<Result<Response, LootBoxError>> {
        let keeper = self.api.addr_make("keeper");
        let res = randomness_oracle::contract::execute(
            self.oracle.as_mut(),
            env_for(&self.oracle_addr),
            message_info(&keeper, &[]),
            randomness_oracle::msg::ExecuteMsg::DeliverPending { limit: None },
        )
        .unwrap();
        self.relay_callbacks(res)
    }

    fn draw(&self, request_id: u64) -> DrawRequest {
        from_json(
            loot_box::contract::query(
                self.engine.as_ref(),
                env_for(&self.engine_addr),
                loot_box::msg::QueryMsg::Draw { request_id },
            )
            .unwrap(),
        )
        .unwrap()
    }

    fn job(&self, id: u64) -> Job {
        let job: Option<Job> = from_json(
            randomness_oracle::contract::query(
                self.oracle.as_ref(),
                env_for(&self.oracle_addr),
                randomness_oracle::msg::QueryMsg::Job { id },
            )
            .unwrap(),
        )
        .unwrap();
        job.unwrap()
    }

    fn expected_word(&self, request_id: u64) -> Uint128 {
        let randomness = hex::decode(TEST_RANDOMNESS_HEX).unwrap();
        derive_random_word(&randomness, self.engine_addr.as_str(), request_id)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[test]
fn test_draw_round_trip() {
    let mut h = Harness::new(10);
    h.add_abc();
    h.fund_engine(vec![
        Coin::new(10_000u128, "ua"),
        Coin::new(10_000u128, "ub"),
        Coin::new(10_000u128, "uc"),
    ]);

    let (request_id, job_id) = h.open("alice");
    assert_eq!(h.draw(request_id).status, DrawStatus::Pending);
    assert_eq!(h.job(job_id).status, JobStatus::Pending);

    let results = h.submit_beacon();
    assert_eq!(results.len(), 1);
    let res = results.into_iter().next().unwrap().unwrap();

    // The word is bound to the beacon, the engine address and the request id
    let word = h.expected_word(request_id);
    let draw = h.draw(request_id);
    let expected = select(&draw.snapshot, word).unwrap().clone();
    assert_eq!(
        draw.status,
        DrawStatus::Fulfilled {
            random_word: word,
            selected_reward_id: expected.id,
        }
    );

    let denom = match &expected.asset {
        AssetRef::Native { denom } => denom.clone(),
        other => panic!("unexpected asset: {:?}", other),
    };
    assert_eq!(res.messages.len(), 1);
    assert_eq!(
        res.messages[0].msg,
        CosmosMsg::Bank(BankMsg::Send {
            to_address: h.api.addr_make("alice").to_string(),
            amount: coins(expected.amount.u128(), denom),
        })
    );

    assert_eq!(
        h.job(job_id).status,
        JobStatus::Delivered { round: TEST_ROUND }
    );

    eprintln!("test_draw_round_trip passed");
}

#[test]
fn test_concurrent_draws_are_independent() {
    let mut h = Harness::new(10);
    h.add_abc();
    h.fund_engine(vec![
        Coin::new(10_000u128, "ua"),
        Coin::new(10_000u128, "ub"),
        Coin::new(10_000u128, "uc"),
    ]);

    let users = ["alice", "bob", "carol", "dave"];
    let requests: Vec<u64> = users.iter().map(|u| h.open(u).0).collect();

    let results = h.submit_beacon();
    assert_eq!(results.len(), users.len());
    assert!(results.iter().all(|r| r.is_ok()));

    let mut words = Vec::new();
    for (user, request_id) in users.iter().zip(&requests) {
        let draw = h.draw(*request_id);
        assert_eq!(draw.requester, h.api.addr_make(user));
        match draw.status {
            DrawStatus::Fulfilled { random_word, .. } => {
                assert_eq!(random_word, h.expected_word(*request_id));
                words.push(random_word);
            }
            other => panic!("draw {} not fulfilled: {:?}", request_id, other),
        }
    }
    words.sort();
    words.dedup();
    assert_eq!(words.len(), users.len());

    let state: loot_box::state::EngineState = from_json(
        loot_box::contract::query(
            h.engine.as_ref(),
            env_for(&h.engine_addr),
            loot_box::msg::QueryMsg::EngineState {},
        )
        .unwrap(),
    )
    .unwrap();
    assert_eq!(state.total_draws_fulfilled, 4);
    assert_eq!(state.pending_fees, Uint128::zero());
    assert_eq!(state.fee_balance, Uint128::new(4 * FEE));
}

#[test]
fn test_late_callback_after_cancel() {
    let mut h = Harness::new(10);
    h.add_abc();
    let (request_id, job_id) = h.open("alice");

    // Oracle stalls past the timeout; alice takes her fee back
    let alice = h.api.addr_make("alice");
    let mut env = env_for(&h.engine_addr);
    env.block.time = env.block.time.plus_seconds(TIMEOUT + 1);
    let res = loot_box::contract::execute(
        h.engine.as_mut(),
        env,
        message_info(&alice, &[]),
        loot_box::msg::ExecuteMsg::Cancel { request_id },
    )
    .unwrap();
    assert_eq!(
        res.messages[0].msg,
        CosmosMsg::Bank(BankMsg::Send {
            to_address: alice.to_string(),
            amount: coins(FEE, FEE_DENOM),
        })
    );

    // The beacon still lands; the engine refuses and the oracle records it
    let results = h.submit_beacon();
    assert_eq!(results.len(), 1);
    assert!(matches!(
        results[0],
        Err(LootBoxError::NotPending { .. })
    ));

    assert_eq!(h.draw(request_id).status, DrawStatus::Cancelled);
    match h.job(job_id).status {
        JobStatus::Failed { round, reason } => {
            assert_eq!(round, TEST_ROUND);
            assert!(reason.contains("not pending"), "reason: {}", reason);
        }
        other => panic!("expected failed job, got: {:?}", other),
    }
}

#[test]
fn test_payout_deferred_then_claimed() {
    let mut h = Harness::new(10);
    h.add_fungible("ugem", 500, 1);

    let (request_id, _) = h.open("alice");
    // Engine holds no ugem, so the payout cannot be made yet
    let results = h.submit_beacon();
    let res = results.into_iter().next().unwrap().unwrap();
    assert!(res.messages.is_empty());
    assert!(matches!(
        h.draw(request_id).status,
        DrawStatus::Claimable { .. }
    ));

    h.fund_engine(vec![Coin::new(500u128, "ugem")]);
    let bob = h.api.addr_make("bob");
    let res = h
        .engine_exec(
            &bob,
            &[],
            loot_box::msg::ExecuteMsg::Claim { request_id },
        )
        .unwrap();
    assert_eq!(
        res.messages[0].msg,
        CosmosMsg::Bank(BankMsg::Send {
            to_address: h.api.addr_make("alice").to_string(),
            amount: coins(500, "ugem"),
        })
    );
    assert_eq!(h.draw(request_id).status, DrawStatus::Claimed);
}

#[test]
fn test_callbacks_delivered_in_batches() {
    let mut h = Harness::new(2);
    h.add_abc();
    h.fund_engine(vec![
        Coin::new(10_000u128, "ua"),
        Coin::new(10_000u128, "ub"),
        Coin::new(10_000u128, "uc"),
    ]);

    let requests: Vec<u64> = ["alice", "bob", "carol"]
        .iter()
        .map(|u| h.open(u).0)
        .collect();

    let results = h.submit_beacon();
    assert_eq!(results.len(), 2);
    assert_eq!(h.draw(requests[2]).status, DrawStatus::Pending);

    let results = h.deliver_pending();
    assert_eq!(results.len(), 1);
    assert!(results[0].is_ok());

    for request_id in requests {
        assert!(matches!(
            h.draw(request_id).status,
            DrawStatus::Fulfilled { .. }
        ));
    }
}

#[test]
fn test_only_oracle_can_fulfill() {
    let mut h = Harness::new(10);
    h.add_abc();
    h.fund_engine(vec![Coin::new(10_000u128, "ua")]);
    let (request_id, _) = h.open("alice");

    // Picks bucket 0, always reward A
    let mallory = h.api.addr_make("mallory");
    let err = h
        .engine_exec(
            &mallory,
            &[],
            loot_box::msg::ExecuteMsg::Fulfill {
                request_id,
                random_word: Uint128::zero(),
            },
        )
        .unwrap_err();
    assert!(matches!(err, LootBoxError::Unauthorized { .. }));
    assert_eq!(h.draw(request_id).status, DrawStatus::Pending);

    let results = h.submit_beacon();
    assert!(results[0].is_ok());
    assert_eq!(h.draw(request_id).random_word, Some(h.expected_word(request_id)));
}

#[test]
fn test_empty_catalog_requests_nothing() {
    let mut h = Harness::new(10);
    let alice = h.api.addr_make("alice");

    let err = h
        .engine_exec(
            &alice,
            &coins(FEE, FEE_DENOM),
            loot_box::msg::ExecuteMsg::Open {},
        )
        .unwrap_err();
    assert!(matches!(err, LootBoxError::EmptyCatalog));

    let pending: randomness_oracle::msg::PendingJobsResponse = from_json(
        randomness_oracle::contract::query(
            h.oracle.as_ref(),
            env_for(&h.oracle_addr),
            randomness_oracle::msg::QueryMsg::PendingJobs { limit: None },
        )
        .unwrap(),
    )
    .unwrap();
    assert!(pending.jobs.is_empty());
}
