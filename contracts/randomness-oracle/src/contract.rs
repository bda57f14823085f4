#[cfg(not(feature = "library"))]
use cosmwasm_std::entry_point;
use cosmwasm_std::{
    Binary, Deps, DepsMut, Env, MessageInfo, Reply, Response, StdResult, SubMsgResult,
};
use cw2::{get_contract_version, set_contract_version};

use crate::error::ContractError;
use crate::execute;
use crate::msg::{ExecuteMsg, InstantiateMsg, MigrateMsg, QueryMsg};
use crate::query;
use crate::state::{OracleConfig, CONFIG, LATEST_ROUND, NEXT_JOB_ID};

const CONTRACT_NAME: &str = "crates.io:randomness-oracle";
const CONTRACT_VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn instantiate(
    deps: DepsMut,
    _env: Env,
    info: MessageInfo,
    msg: InstantiateMsg,
) -> Result<Response, ContractError> {
    set_contract_version(deps.storage, CONTRACT_NAME, CONTRACT_VERSION)?;

    let pubkey_bytes = hex::decode(&msg.quicknet_pubkey_hex).map_err(|_| {
        ContractError::InvalidHex {
            field: "quicknet_pubkey_hex".to_string(),
        }
    })?;
    if pubkey_bytes.len() != 96 {
        return Err(ContractError::InvalidPubkeyLength {
            got: pubkey_bytes.len(),
        });
    }
    if msg.period_seconds == 0 {
        return Err(ContractError::InvalidConfig {
            reason: "period_seconds must be greater than zero".to_string(),
        });
    }
    execute::validate_max_callbacks(msg.max_callbacks_per_beacon)?;

    let operators = msg
        .operators
        .iter()
        .map(|op| deps.api.addr_validate(op))
        .collect::<StdResult<Vec<_>>>()?;

    let config = OracleConfig {
        admin: info.sender.clone(),
        operators,
        quicknet_pubkey: pubkey_bytes,
        chain_hash: msg.chain_hash,
        genesis_time: msg.genesis_time,
        period_seconds: msg.period_seconds,
        max_callbacks_per_beacon: msg.max_callbacks_per_beacon,
    };

    CONFIG.save(deps.storage, &config)?;
    LATEST_ROUND.save(deps.storage, &0u64)?;
    NEXT_JOB_ID.save(deps.storage, &0u64)?;

    Ok(Response::new()
        .add_attribute("action", "instantiate")
        .add_attribute("contract", "randomness-oracle")
        .add_attribute("admin", info.sender.to_string()))
}

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn execute(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    msg: ExecuteMsg,
) -> Result<Response, ContractError> {
    match msg {
        ExecuteMsg::RequestRandomness { job_id } => {
            execute::request_randomness(deps, env, info, job_id)
        }
        ExecuteMsg::SubmitBeacon {
            round,
            signature_hex,
        } => execute::submit_beacon(deps, env, info, round, signature_hex),
        ExecuteMsg::DeliverPending { limit } => execute::deliver_pending(deps, env, info, limit),
        ExecuteMsg::UpdateOperators { add, remove } => {
            execute::update_operators(deps, env, info, add, remove)
        }
        ExecuteMsg::UpdateConfig {
            admin,
            max_callbacks_per_beacon,
        } => execute::update_config(deps, env, info, admin, max_callbacks_per_beacon),
    }
}

/// Callbacks are dispatched reply-on-error with the job's correlation id as reply id.
#[cfg_attr(not(feature = "library"), entry_point)]
pub fn reply(deps: DepsMut, env: Env, msg: Reply) -> Result<Response, ContractError> {
    match msg.result {
        SubMsgResult::Err(reason) => execute::job_failed(deps, env, msg.id, reason),
        SubMsgResult::Ok(_) => Ok(Response::new()),
    }
}

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn query(deps: Deps, _env: Env, msg: QueryMsg) -> StdResult<Binary> {
    match msg {
        QueryMsg::Config {} => query::query_config(deps),
        QueryMsg::Beacon { round } => query::query_beacon(deps, round),
        QueryMsg::LatestRound {} => query::query_latest_round(deps),
        QueryMsg::Job { id } => query::query_job(deps, id),
        QueryMsg::PendingJobs { limit } => query::query_pending_jobs(deps, limit),
    }
}

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn migrate(deps: DepsMut, _env: Env, _msg: MigrateMsg) -> Result<Response, ContractError> {
    let stored = get_contract_version(deps.storage)?;
    if stored.contract != CONTRACT_NAME {
        return Err(ContractError::Unauthorized {
            reason: "Cannot migrate from different contract type".to_string(),
        });
    }

    set_contract_version(deps.storage, CONTRACT_NAME, CONTRACT_VERSION)?;

    Ok(Response::new()
        .add_attribute("action", "migrate")
        .add_attribute("from_version", stored.version)
        .add_attribute("to_version", CONTRACT_VERSION))
}
