#[cfg(not(feature = "library"))]
use cosmwasm_std::entry_point;
use cosmwasm_std::{
    Binary, Deps, DepsMut, Env, MessageInfo, Reply, Response, StdResult, SubMsgResult, Uint128,
};
use cw2::{get_contract_version, set_contract_version};

use crate::catalog;
use crate::error::ContractError;
use crate::execute;
use crate::msg::{AddRewardParams, ExecuteMsg, InstantiateMsg, MigrateMsg, QueryMsg};
use crate::query;
use crate::state::{
    CatalogState, EngineState, LootBoxConfig, CATALOG_STATE, CONFIG, ENGINE_STATE,
};

const CONTRACT_NAME: &str = "crates.io:loot-box";
const CONTRACT_VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn instantiate(
    deps: DepsMut,
    _env: Env,
    info: MessageInfo,
    msg: InstantiateMsg,
) -> Result<Response, ContractError> {
    set_contract_version(deps.storage, CONTRACT_NAME, CONTRACT_VERSION)?;

    execute::validate_timeout_window(msg.timeout_window_seconds)?;
    if msg.fee_denom.trim().is_empty() {
        return Err(ContractError::InvalidAsset {
            reason: "fee denom must not be empty".to_string(),
        });
    }

    let config = LootBoxConfig {
        admin: info.sender.clone(),
        oracle: deps.api.addr_validate(&msg.oracle)?,
        fee_denom: msg.fee_denom,
        draw_fee: msg.draw_fee,
        timeout_window_seconds: msg.timeout_window_seconds,
    };
    CONFIG.save(deps.storage, &config)?;

    ENGINE_STATE.save(
        deps.storage,
        &EngineState {
            next_request_id: 0,
            fee_balance: Uint128::zero(),
            pending_fees: Uint128::zero(),
            total_draws_opened: 0,
            total_draws_fulfilled: 0,
            total_draws_claimed: 0,
            total_draws_cancelled: 0,
            total_fees_withdrawn: Uint128::zero(),
        },
    )?;
    CATALOG_STATE.save(
        deps.storage,
        &CatalogState {
            next_reward_id: 0,
            total_weight: 0,
        },
    )?;

    Ok(Response::new()
        .add_attribute("action", "instantiate")
        .add_attribute("contract", "loot-box")
        .add_attribute("admin", info.sender.to_string())
        .add_attribute("oracle", config.oracle.to_string()))
}

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn execute(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    msg: ExecuteMsg,
) -> Result<Response, ContractError> {
    match msg {
        ExecuteMsg::Open {} => execute::open(deps, env, info),
        ExecuteMsg::Fulfill {
            request_id,
            random_word,
        } => execute::fulfill(deps, env, info, request_id, random_word),
        ExecuteMsg::Claim { request_id } => execute::claim(deps, env, info, request_id),
        ExecuteMsg::Cancel { request_id } => execute::cancel(deps, env, info, request_id),
        ExecuteMsg::AddReward {
            kind,
            asset,
            sub_id,
            amount,
            weight,
        } => catalog::add_reward(
            deps,
            env,
            info,
            AddRewardParams {
                kind,
                asset,
                sub_id,
                amount,
                weight,
            },
        ),
        ExecuteMsg::RemoveReward { reward_id } => {
            catalog::remove_reward(deps, env, info, reward_id)
        }
        ExecuteMsg::SetWeight { reward_id, weight } => {
            catalog::set_weight(deps, env, info, reward_id, weight)
        }
        ExecuteMsg::SetFee { fee } => execute::set_fee(deps, env, info, fee),
        ExecuteMsg::SetTimeoutWindow { seconds } => {
            execute::set_timeout_window(deps, env, info, seconds)
        }
        ExecuteMsg::UpdateConfig { admin, oracle } => {
            execute::update_config(deps, env, info, admin, oracle)
        }
        ExecuteMsg::Withdraw { amount } => execute::withdraw(deps, env, info, amount),
    }
}

/// Payout transfers are dispatched reply-on-error with the request id as reply id.
#[cfg_attr(not(feature = "library"), entry_point)]
pub fn reply(deps: DepsMut, env: Env, msg: Reply) -> Result<Response, ContractError> {
    match msg.result {
        SubMsgResult::Err(reason) => execute::payout_failed(deps, env, msg.id, reason),
        SubMsgResult::Ok(_) => Ok(Response::new()),
    }
}

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn query(deps: Deps, _env: Env, msg: QueryMsg) -> StdResult<Binary> {
    match msg {
        QueryMsg::Config {} => query::query_config(deps),
        QueryMsg::EngineState {} => query::query_engine_state(deps),
        QueryMsg::Reward { reward_id } => query::query_reward(deps, reward_id),
        QueryMsg::Rewards { start_after, limit } => query::query_rewards(deps, start_after, limit),
        QueryMsg::Catalog {} => query::query_catalog(deps),
        QueryMsg::Odds {} => query::query_odds(deps),
        QueryMsg::Draw { request_id } => query::query_draw(deps, request_id),
        QueryMsg::DrawHistory { start_after, limit } => {
            query::query_draw_history(deps, start_after, limit)
        }
        QueryMsg::UserDraws {
            address,
            start_after,
            limit,
        } => query::query_user_draws(deps, address, start_after, limit),
        QueryMsg::Consumed { reward_id } => query::query_consumed(deps, reward_id),
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
