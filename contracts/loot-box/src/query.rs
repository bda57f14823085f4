use cosmwasm_std::{to_json_binary, Binary, Deps, Order, StdResult};
use cw_storage_plus::Bound;

use crate::catalog::capture_snapshot;
use crate::msg::{DrawHistoryResponse, OddsResponse, RewardOdds, RewardsResponse};
use crate::state::{CONFIG, CONSUMED, DRAWS, ENGINE_STATE, REWARDS, USER_DRAWS};

const DEFAULT_LIMIT: u32 = 20;
const MAX_LIMIT: u32 = 100;

pub fn query_config(deps: Deps) -> StdResult<Binary> {
    let config = CONFIG.load(deps.storage)?;
    to_json_binary(&config)
}

pub fn query_engine_state(deps: Deps) -> StdResult<Binary> {
    let state = ENGINE_STATE.load(deps.storage)?;
    to_json_binary(&state)
}

pub fn query_reward(deps: Deps, reward_id: u32) -> StdResult<Binary> {
    let reward = REWARDS.load(deps.storage, reward_id)?;
    to_json_binary(&reward)
}

pub fn query_rewards(deps: Deps, start_after: Option<u32>, limit: Option<u32>) -> StdResult<Binary> {
    let limit = limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT) as usize;
    let start = start_after.map(Bound::exclusive);

    let rewards = REWARDS
        .range(deps.storage, start, None, Order::Ascending)
        .take(limit)
        .map(|r| r.map(|(_, reward)| reward))
        .collect::<StdResult<Vec<_>>>()?;

    to_json_binary(&RewardsResponse { rewards })
}

/// The snapshot a draw opened right now would capture, or null when the catalog is empty.
pub fn query_catalog(deps: Deps) -> StdResult<Binary> {
    let snapshot = capture_snapshot(deps.storage).ok();
    to_json_binary(&snapshot)
}

pub fn query_odds(deps: Deps) -> StdResult<Binary> {
    let Ok(snapshot) = capture_snapshot(deps.storage) else {
        return to_json_binary(&OddsResponse {
            total_weight: 0,
            odds: vec![],
        });
    };

    let total = u128::from(snapshot.total_weight);
    let odds = snapshot
        .entries
        .iter()
        .map(|e| RewardOdds {
            reward_id: e.reward.id,
            weight: e.reward.weight,
            probability_bps: (u128::from(e.reward.weight) * 10_000 / total) as u64,
        })
        .collect();

    to_json_binary(&OddsResponse {
        total_weight: snapshot.total_weight,
        odds,
    })
}

pub fn query_draw(deps: Deps, request_id: u64) -> StdResult<Binary> {
    let draw = DRAWS.load(deps.storage, request_id)?;
    to_json_binary(&draw)
}

pub fn query_draw_history(
    deps: Deps,
    start_after: Option<u64>,
    limit: Option<u32>,
) -> StdResult<Binary> {
    let limit = limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT) as usize;
    let start = start_after.map(Bound::exclusive);

    let draws: Vec<_> = DRAWS
        .range(deps.storage, start, None, Order::Ascending)
        .take(limit)
        .filter_map(|r| r.ok())
        .map(|(_, draw)| draw)
        .collect();

    to_json_binary(&DrawHistoryResponse { draws })
}

pub fn query_user_draws(
    deps: Deps,
    address: String,
    start_after: Option<u64>,
    limit: Option<u32>,
) -> StdResult<Binary> {
    let addr = deps.api.addr_validate(&address)?;
    let limit = limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT) as usize;
    let start = start_after.map(Bound::exclusive);

    let draws: Vec<_> = USER_DRAWS
        .prefix(&addr)
        .range(deps.storage, start, None, Order::Ascending)
        .take(limit)
        .filter_map(|r| r.ok())
        .filter_map(|(request_id, _)| DRAWS.load(deps.storage, request_id).ok())
        .collect();

    to_json_binary(&DrawHistoryResponse { draws })
}

pub fn query_consumed(deps: Deps, reward_id: u32) -> StdResult<Binary> {
    let winner = CONSUMED.may_load(deps.storage, reward_id)?;
    to_json_binary(&winner)
}
