use cosmwasm_std::{
    coins, to_json_binary, Addr, BankMsg, CosmosMsg, Env, QuerierWrapper, StdError, StdResult,
    Uint128, WasmMsg,
};
use loot_box_common::msg::{
    Cw1155ExecuteMsg, Cw20BalanceResponse, Cw20ExecuteMsg, Cw20QueryMsg, Cw721ExecuteMsg,
};
use loot_box_common::types::{AssetRef, RewardEntry, RewardKind};

use crate::error::ContractError;
use crate::state::LootBoxConfig;

/// Build the transfer that pays `reward` to `recipient`.
///
/// One message per reward kind: bank send or CW20 `transfer` for fungibles,
/// CW721 `transfer_nft` for collectibles, CW1155 `send_from` for stacks.
pub fn transfer_msg(env: &Env, reward: &RewardEntry, recipient: &Addr) -> StdResult<CosmosMsg> {
    let msg = match (&reward.kind, &reward.asset) {
        (RewardKind::Fungible, AssetRef::Native { denom }) => CosmosMsg::Bank(BankMsg::Send {
            to_address: recipient.to_string(),
            amount: coins(reward.amount.u128(), denom),
        }),
        (RewardKind::Fungible, AssetRef::Contract { addr }) => CosmosMsg::Wasm(WasmMsg::Execute {
            contract_addr: addr.clone(),
            msg: to_json_binary(&Cw20ExecuteMsg::Transfer {
                recipient: recipient.to_string(),
                amount: reward.amount,
            })?,
            funds: vec![],
        }),
        (RewardKind::UniqueCollectible, AssetRef::Contract { addr }) => {
            CosmosMsg::Wasm(WasmMsg::Execute {
                contract_addr: addr.clone(),
                msg: to_json_binary(&Cw721ExecuteMsg::TransferNft {
                    recipient: recipient.to_string(),
                    token_id: token_id(reward)?,
                })?,
                funds: vec![],
            })
        }
        (RewardKind::SemiFungibleStack, AssetRef::Contract { addr }) => {
            CosmosMsg::Wasm(WasmMsg::Execute {
                contract_addr: addr.clone(),
                msg: to_json_binary(&Cw1155ExecuteMsg::SendFrom {
                    from: env.contract.address.to_string(),
                    to: recipient.to_string(),
                    token_id: token_id(reward)?,
                    value: reward.amount,
                    msg: None,
                })?,
                funds: vec![],
            })
        }
        (kind, AssetRef::Native { .. }) => {
            return Err(StdError::generic_err(format!(
                "{} reward {} cannot be a native asset",
                kind.as_str(),
                reward.id
            )))
        }
    };
    Ok(msg)
}

/// Fail with `InsufficientRewardBalance` if the engine cannot cover a fungible reward.
///
/// Fees sitting in the vault are not spendable as rewards, so when the reward
/// is paid in the fee denom the vault balance is held back. Collectibles and
/// stacks are not pre-checked; their transfer failing is caught on dispatch.
pub fn ensure_payable(
    querier: &QuerierWrapper,
    env: &Env,
    config: &LootBoxConfig,
    fee_balance: Uint128,
    reward: &RewardEntry,
) -> Result<(), ContractError> {
    if reward.kind != RewardKind::Fungible {
        return Ok(());
    }

    let available = match &reward.asset {
        AssetRef::Native { denom } => {
            let balance = querier
                .query_balance(env.contract.address.as_str(), denom)?
                .amount;
            if *denom == config.fee_denom {
                balance.saturating_sub(fee_balance)
            } else {
                balance
            }
        }
        AssetRef::Contract { addr } => {
            let res: Cw20BalanceResponse = querier.query_wasm_smart(
                addr,
                &Cw20QueryMsg::Balance {
                    address: env.contract.address.to_string(),
                },
            )?;
            res.balance
        }
    };

    if available < reward.amount {
        return Err(ContractError::InsufficientRewardBalance {
            needed: reward.amount,
            available,
        });
    }
    Ok(())
}

fn token_id(reward: &RewardEntry) -> StdResult<String> {
    reward
        .sub_id
        .map(|id| id.to_string())
        .ok_or_else(|| StdError::generic_err(format!("reward {} has no token id", reward.id)))
}
