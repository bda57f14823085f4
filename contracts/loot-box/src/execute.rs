use cosmwasm_std::{
    coins, to_json_binary, BankMsg, Coin, DepsMut, Env, Event, MessageInfo, Response, SubMsg,
    Uint128, WasmMsg,
};
use loot_box_common::msg::OracleExecuteMsg;
use loot_box_common::selection::{bucket, select};
use loot_box_common::types::{DrawStatus, RewardKind};

use crate::catalog::{capture_snapshot, consume_unique};
use crate::error::ContractError;
use crate::payout::{ensure_payable, transfer_msg};
use crate::state::{DrawRequest, LootBoxConfig, CONFIG, DRAWS, ENGINE_STATE, USER_DRAWS};

/// Bounds on how long a draw must wait before it can be cancelled.
pub const MIN_TIMEOUT_WINDOW_SECONDS: u64 = 300;
pub const MAX_TIMEOUT_WINDOW_SECONDS: u64 = 604_800;

pub fn validate_timeout_window(seconds: u64) -> Result<(), ContractError> {
    if !(MIN_TIMEOUT_WINDOW_SECONDS..=MAX_TIMEOUT_WINDOW_SECONDS).contains(&seconds) {
        return Err(ContractError::InvalidTimeoutWindow {
            seconds,
            min: MIN_TIMEOUT_WINDOW_SECONDS,
            max: MAX_TIMEOUT_WINDOW_SECONDS,
        });
    }
    Ok(())
}

pub(crate) fn assert_admin(
    config: &LootBoxConfig,
    info: &MessageInfo,
    what: &str,
) -> Result<(), ContractError> {
    if info.sender != config.admin {
        return Err(ContractError::Unauthorized {
            reason: format!("only admin can {}", what),
        });
    }
    Ok(())
}

/// The funds must be exactly the draw fee, or nothing when the fee is zero.
fn must_pay_fee(config: &LootBoxConfig, info: &MessageInfo) -> Result<Uint128, ContractError> {
    let paid = match info.funds.as_slice() {
        [] => config.draw_fee.is_zero(),
        [coin] => coin.denom == config.fee_denom && coin.amount == config.draw_fee,
        _ => false,
    };

    if !paid {
        let sent: Vec<String> = info.funds.iter().map(Coin::to_string).collect();
        return Err(ContractError::InsufficientFee {
            required: Coin::new(config.draw_fee, config.fee_denom.clone()).to_string(),
            sent: sent.join(","),
        });
    }
    Ok(config.draw_fee)
}

/// Open a draw: take the fee, freeze the catalog, ask the oracle for randomness.
///
/// The request id is minted locally and handed to the oracle as its job id;
/// the oracle echoes it back in the `fulfill` callback.
pub fn open(deps: DepsMut, env: Env, info: MessageInfo) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    let fee_paid = must_pay_fee(&config, &info)?;
    let snapshot = capture_snapshot(deps.storage)?;

    let mut state = ENGINE_STATE.load(deps.storage)?;
    let request_id = state.next_request_id;
    state.next_request_id += 1;
    state.fee_balance += fee_paid;
    state.pending_fees += fee_paid;
    state.total_draws_opened += 1;

    let cancel_after = env.block.time.plus_seconds(config.timeout_window_seconds);
    let total_weight = snapshot.total_weight;
    let num_rewards = snapshot.entries.len();

    let draw = DrawRequest {
        request_id,
        requester: info.sender.clone(),
        fee_paid,
        snapshot,
        status: DrawStatus::Pending,
        created_at: env.block.time,
        cancel_after,
        random_word: None,
        reward_id: None,
        fulfilled_at: None,
        settled_at: None,
    };
    DRAWS.save(deps.storage, request_id, &draw)?;
    USER_DRAWS.save(deps.storage, (&info.sender, request_id), &())?;
    ENGINE_STATE.save(deps.storage, &state)?;

    let request_msg = WasmMsg::Execute {
        contract_addr: config.oracle.to_string(),
        msg: to_json_binary(&OracleExecuteMsg::RequestRandomness { job_id: request_id })?,
        funds: vec![],
    };

    Ok(Response::new()
        .add_message(request_msg)
        .set_data(to_json_binary(&request_id)?)
        .add_attribute("action", "open")
        .add_attribute("request_id", request_id.to_string())
        .add_event(
            Event::new("lootbox_draw_opened")
                .add_attribute("request_id", request_id.to_string())
                .add_attribute("requester", info.sender.to_string())
                .add_attribute("fee_paid", fee_paid.to_string())
                .add_attribute("total_weight", total_weight.to_string())
                .add_attribute("num_rewards", num_rewards.to_string())
                .add_attribute("cancel_after", cancel_after.seconds().to_string()),
        ))
}

/// Deliver randomness for a pending draw. Oracle only.
///
/// Resolves the stored snapshot (never the live catalog), advances the draw,
/// then dispatches the payout. A payout that cannot be made leaves the draw
/// Claimable instead of failing this call:
/// 1. unique collectibles are consumed before anything is sent
/// 2. the draw is saved as Fulfilled before the transfer is dispatched
/// 3. the transfer runs as a reply-on-error sub-message; `reply` marks failures Claimable
pub fn fulfill(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    request_id: u64,
    random_word: Uint128,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    if info.sender != config.oracle {
        return Err(ContractError::Unauthorized {
            reason: "only the oracle can fulfill draws".to_string(),
        });
    }

    let mut draw = DRAWS
        .may_load(deps.storage, request_id)?
        .ok_or(ContractError::UnknownRequest { request_id })?;
    if draw.status != DrawStatus::Pending {
        return Err(ContractError::NotPending { request_id });
    }

    let reward = select(&draw.snapshot, random_word)
        .cloned()
        .ok_or(ContractError::EmptyCatalog)?;
    let ticket = bucket(&draw.snapshot, random_word).unwrap_or_default();

    let mut state = ENGINE_STATE.load(deps.storage)?;
    state.pending_fees = state.pending_fees.checked_sub(draw.fee_paid)?;

    draw.random_word = Some(random_word);
    draw.reward_id = Some(reward.id);
    draw.fulfilled_at = Some(env.block.time);

    if reward.kind == RewardKind::UniqueCollectible
        && !consume_unique(deps.storage, reward.id, request_id)?
    {
        // Another draw already won this collectible; settle by refund.
        state.fee_balance = state.fee_balance.checked_sub(draw.fee_paid)?;
        state.total_draws_cancelled += 1;
        draw.status = DrawStatus::Cancelled;
        draw.settled_at = Some(env.block.time);
        DRAWS.save(deps.storage, request_id, &draw)?;
        ENGINE_STATE.save(deps.storage, &state)?;

        let mut response = Response::new()
            .add_attribute("action", "fulfill")
            .add_attribute("request_id", request_id.to_string())
            .add_attribute("outcome", "refunded")
            .add_event(
                Event::new("lootbox_draw_cancelled")
                    .add_attribute("request_id", request_id.to_string())
                    .add_attribute("refunded_amount", draw.fee_paid.to_string())
                    .add_attribute("reward_id", reward.id.to_string())
                    .add_attribute("reason", "reward_already_awarded"),
            );
        if !draw.fee_paid.is_zero() {
            response = response.add_message(BankMsg::Send {
                to_address: draw.requester.to_string(),
                amount: coins(draw.fee_paid.u128(), &config.fee_denom),
            });
        }
        return Ok(response);
    }

    state.total_draws_fulfilled += 1;

    let payout = ensure_payable(&deps.querier, &env, &config, state.fee_balance, &reward)
        .and_then(|_| Ok(transfer_msg(&env, &reward, &draw.requester)?));

    let response = Response::new()
        .add_attribute("action", "fulfill")
        .add_attribute("request_id", request_id.to_string())
        .add_attribute("reward_id", reward.id.to_string());

    match payout {
        Ok(msg) => {
            draw.status = DrawStatus::Fulfilled {
                random_word,
                selected_reward_id: reward.id,
            };
            DRAWS.save(deps.storage, request_id, &draw)?;
            ENGINE_STATE.save(deps.storage, &state)?;

            Ok(response
                .add_submessage(SubMsg::reply_on_error(msg, request_id))
                .add_attribute("outcome", "paid")
                .add_event(
                    Event::new("lootbox_draw_fulfilled")
                        .add_attribute("request_id", request_id.to_string())
                        .add_attribute("random_word", random_word.to_string())
                        .add_attribute("bucket", ticket.to_string())
                        .add_attribute("total_weight", draw.snapshot.total_weight.to_string())
                        .add_attribute("reward_id", reward.id.to_string())
                        .add_attribute("kind", reward.kind.as_str())
                        .add_attribute("asset", reward.asset.to_string())
                        .add_attribute("amount", reward.amount.to_string())
                        .add_attribute("recipient", draw.requester.to_string()),
                ))
        }
        Err(err) => {
            let reason = err.to_string();
            draw.status = DrawStatus::Claimable {
                reason: reason.clone(),
            };
            DRAWS.save(deps.storage, request_id, &draw)?;
            ENGINE_STATE.save(deps.storage, &state)?;

            Ok(response.add_attribute("outcome", "deferred").add_event(
                Event::new("lootbox_draw_payout_deferred")
                    .add_attribute("request_id", request_id.to_string())
                    .add_attribute("random_word", random_word.to_string())
                    .add_attribute("reward_id", reward.id.to_string())
                    .add_attribute("reason", reason),
            ))
        }
    }
}

/// Record a payout transfer that failed after dispatch.
///
/// Called from `reply`. Never errors on an unexpected draw state, since an
/// error here would revert the oracle callback.
pub fn payout_failed(
    deps: DepsMut,
    _env: Env,
    request_id: u64,
    reason: String,
) -> Result<Response, ContractError> {
    let Some(mut draw) = DRAWS.may_load(deps.storage, request_id)? else {
        return Ok(Response::new()
            .add_attribute("action", "payout_failed")
            .add_attribute("request_id", request_id.to_string())
            .add_attribute("outcome", "unknown_request"));
    };
    if !matches!(draw.status, DrawStatus::Fulfilled { .. }) {
        return Ok(Response::new()
            .add_attribute("action", "payout_failed")
            .add_attribute("request_id", request_id.to_string())
            .add_attribute("outcome", "ignored"));
    }

    draw.status = DrawStatus::Claimable {
        reason: reason.clone(),
    };
    DRAWS.save(deps.storage, request_id, &draw)?;

    Ok(Response::new()
        .add_attribute("action", "payout_failed")
        .add_attribute("request_id", request_id.to_string())
        .add_event(
            Event::new("lootbox_draw_payout_deferred")
                .add_attribute("request_id", request_id.to_string())
                .add_attribute(
                    "reward_id",
                    draw.reward_id.map(|id| id.to_string()).unwrap_or_default(),
                )
                .add_attribute("reason", reason),
        ))
}

/// Retry the payout of a claimable draw. Anyone can call; the requester is paid.
///
/// The transfer is a plain message, so a failing retry reverts the whole
/// claim and the draw stays Claimable.
pub fn claim(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    request_id: u64,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    let mut draw = DRAWS
        .may_load(deps.storage, request_id)?
        .ok_or(ContractError::UnknownRequest { request_id })?;
    if !matches!(draw.status, DrawStatus::Claimable { .. }) {
        return Err(ContractError::NotClaimable { request_id });
    }

    let reward_id = draw
        .reward_id
        .ok_or(ContractError::NotClaimable { request_id })?;
    let reward = draw
        .selected_reward()
        .cloned()
        .ok_or(ContractError::UnknownReward { reward_id })?;

    let mut state = ENGINE_STATE.load(deps.storage)?;
    ensure_payable(&deps.querier, &env, &config, state.fee_balance, &reward)?;
    let transfer = transfer_msg(&env, &reward, &draw.requester)?;

    draw.status = DrawStatus::Claimed;
    draw.settled_at = Some(env.block.time);
    state.total_draws_claimed += 1;
    DRAWS.save(deps.storage, request_id, &draw)?;
    ENGINE_STATE.save(deps.storage, &state)?;

    Ok(Response::new()
        .add_message(transfer)
        .add_attribute("action", "claim")
        .add_attribute("request_id", request_id.to_string())
        .add_event(
            Event::new("lootbox_reward_claimed")
                .add_attribute("request_id", request_id.to_string())
                .add_attribute("recipient", draw.requester.to_string())
                .add_attribute("kind", reward.kind.as_str())
                .add_attribute("asset", reward.asset.to_string())
                .add_attribute("amount", reward.amount.to_string())
                .add_attribute("claimed_by", info.sender.to_string()),
        ))
}

/// Cancel a draw the oracle never fulfilled and refund its fee.
/// Requester or admin, strictly after the draw's timeout.
pub fn cancel(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    request_id: u64,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    let mut draw = DRAWS
        .may_load(deps.storage, request_id)?
        .ok_or(ContractError::UnknownRequest { request_id })?;

    if info.sender != draw.requester && info.sender != config.admin {
        return Err(ContractError::Unauthorized {
            reason: "only the requester or admin can cancel a draw".to_string(),
        });
    }
    if draw.status != DrawStatus::Pending {
        return Err(ContractError::NotPending { request_id });
    }
    if env.block.time <= draw.cancel_after {
        return Err(ContractError::NotExpired {
            request_id,
            cancel_after: draw.cancel_after.seconds(),
        });
    }

    let mut state = ENGINE_STATE.load(deps.storage)?;
    state.pending_fees = state.pending_fees.checked_sub(draw.fee_paid)?;
    state.fee_balance = state.fee_balance.checked_sub(draw.fee_paid)?;
    state.total_draws_cancelled += 1;
    ENGINE_STATE.save(deps.storage, &state)?;

    draw.status = DrawStatus::Cancelled;
    draw.settled_at = Some(env.block.time);
    DRAWS.save(deps.storage, request_id, &draw)?;

    let mut response = Response::new()
        .add_attribute("action", "cancel")
        .add_attribute("request_id", request_id.to_string())
        .add_event(
            Event::new("lootbox_draw_cancelled")
                .add_attribute("request_id", request_id.to_string())
                .add_attribute("refunded_amount", draw.fee_paid.to_string())
                .add_attribute("requester", draw.requester.to_string())
                .add_attribute("reason", "timeout"),
        );
    if !draw.fee_paid.is_zero() {
        response = response.add_message(BankMsg::Send {
            to_address: draw.requester.to_string(),
            amount: coins(draw.fee_paid.u128(), &config.fee_denom),
        });
    }
    Ok(response)
}

/// Change the draw fee. Draws already open keep the fee they paid. Admin only.
pub fn set_fee(
    deps: DepsMut,
    _env: Env,
    info: MessageInfo,
    fee: Uint128,
) -> Result<Response, ContractError> {
    let mut config = CONFIG.load(deps.storage)?;
    assert_admin(&config, &info, "set the draw fee")?;

    let old_fee = config.draw_fee;
    config.draw_fee = fee;
    CONFIG.save(deps.storage, &config)?;

    Ok(Response::new()
        .add_attribute("action", "set_fee")
        .add_event(
            Event::new("lootbox_fee_set")
                .add_attribute("old_fee", old_fee.to_string())
                .add_attribute("new_fee", fee.to_string())
                .add_attribute("denom", config.fee_denom),
        ))
}

/// Change the cancellation timeout. Draws already open keep their deadline. Admin only.
pub fn set_timeout_window(
    deps: DepsMut,
    _env: Env,
    info: MessageInfo,
    seconds: u64,
) -> Result<Response, ContractError> {
    let mut config = CONFIG.load(deps.storage)?;
    assert_admin(&config, &info, "set the timeout window")?;
    validate_timeout_window(seconds)?;

    let old = config.timeout_window_seconds;
    config.timeout_window_seconds = seconds;
    CONFIG.save(deps.storage, &config)?;

    Ok(Response::new()
        .add_attribute("action", "set_timeout_window")
        .add_event(
            Event::new("lootbox_timeout_set")
                .add_attribute("old_seconds", old.to_string())
                .add_attribute("new_seconds", seconds.to_string()),
        ))
}

/// Update admin or oracle. Admin only.
pub fn update_config(
    deps: DepsMut,
    _env: Env,
    info: MessageInfo,
    admin: Option<String>,
    oracle: Option<String>,
) -> Result<Response, ContractError> {
    let mut config = CONFIG.load(deps.storage)?;
    assert_admin(&config, &info, "update config")?;

    if let Some(admin) = admin {
        config.admin = deps.api.addr_validate(&admin)?;
    }
    if let Some(oracle) = oracle {
        config.oracle = deps.api.addr_validate(&oracle)?;
    }
    CONFIG.save(deps.storage, &config)?;

    Ok(Response::new()
        .add_attribute("action", "update_config")
        .add_event(
            Event::new("lootbox_config_updated")
                .add_attribute("admin", config.admin.to_string())
                .add_attribute("oracle", config.oracle.to_string()),
        ))
}

/// Withdraw earned fees to the admin. Fees of pending draws stay refundable.
pub fn withdraw(
    deps: DepsMut,
    _env: Env,
    info: MessageInfo,
    amount: Uint128,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    assert_admin(&config, &info, "withdraw fees")?;

    if amount.is_zero() {
        return Err(ContractError::ZeroWithdraw);
    }

    let mut state = ENGINE_STATE.load(deps.storage)?;
    let withdrawable = state.fee_balance.checked_sub(state.pending_fees)?;
    if amount > withdrawable {
        return Err(ContractError::InsufficientVaultBalance {
            requested: amount,
            available: withdrawable,
        });
    }

    state.fee_balance -= amount;
    state.total_fees_withdrawn += amount;
    ENGINE_STATE.save(deps.storage, &state)?;

    Ok(Response::new()
        .add_message(BankMsg::Send {
            to_address: info.sender.to_string(),
            amount: coins(amount.u128(), &config.fee_denom),
        })
        .add_attribute("action", "withdraw")
        .add_attribute("amount", amount.to_string())
        .add_event(
            Event::new("lootbox_fees_withdrawn")
                .add_attribute("amount", amount.to_string())
                .add_attribute("denom", config.fee_denom.clone())
                .add_attribute("recipient", info.sender.to_string())
                .add_attribute("remaining", state.fee_balance.to_string()),
        ))
}
