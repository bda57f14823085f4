use cosmwasm_std::{to_json_binary, Binary, Deps, Order, StdResult};

use crate::msg::PendingJobsResponse;
use crate::state::{BEACONS, CONFIG, JOBS, LATEST_ROUND, PENDING_JOBS};

const DEFAULT_LIMIT: u32 = 20;
const MAX_LIMIT: u32 = 100;

pub fn query_config(deps: Deps) -> StdResult<Binary> {
    let config = CONFIG.load(deps.storage)?;
    to_json_binary(&config)
}

pub fn query_beacon(deps: Deps, round: u64) -> StdResult<Binary> {
    let beacon = BEACONS.may_load(deps.storage, round)?;
    to_json_binary(&beacon)
}

pub fn query_latest_round(deps: Deps) -> StdResult<Binary> {
    let round = LATEST_ROUND.may_load(deps.storage)?.unwrap_or(0);
    to_json_binary(&round)
}

pub fn query_job(deps: Deps, id: u64) -> StdResult<Binary> {
    let job = JOBS.may_load(deps.storage, id)?;
    to_json_binary(&job)
}

pub fn query_pending_jobs(deps: Deps, limit: Option<u32>) -> StdResult<Binary> {
    let limit = limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT) as usize;

    let jobs = PENDING_JOBS
        .keys(deps.storage, None, None, Order::Ascending)
        .take(limit)
        .map(|key| {
            let (_, id) = key?;
            JOBS.load(deps.storage, id)
        })
        .collect::<StdResult<Vec<_>>>()?;

    to_json_binary(&PendingJobsResponse { jobs })
}
