use cosmwasm_std::{Api, DepsMut, Env, Event, MessageInfo, Order, Response, Storage, Uint128};
use loot_box_common::selection::{build_snapshot, SnapshotError};
use loot_box_common::types::{AssetRef, CatalogSnapshot, RewardEntry, RewardKind};

use crate::error::ContractError;
use crate::execute::assert_admin;
use crate::msg::AddRewardParams;
use crate::state::{CATALOG_STATE, CONFIG, CONSUMED, REWARDS};

/// Add a reward to the catalog. Admin only.
pub fn add_reward(
    deps: DepsMut,
    _env: Env,
    info: MessageInfo,
    params: AddRewardParams,
) -> Result<Response, ContractError> {
    let AddRewardParams {
        kind,
        asset,
        sub_id,
        amount,
        weight,
    } = params;

    let config = CONFIG.load(deps.storage)?;
    assert_admin(&config, &info, "add rewards")?;

    if weight == 0 {
        return Err(ContractError::InvalidWeight);
    }
    let asset = validate_reward(deps.api, &kind, asset, sub_id, amount)?;

    let mut catalog = CATALOG_STATE.load(deps.storage)?;
    let reward_id = catalog.next_reward_id;
    catalog.next_reward_id += 1;
    catalog.total_weight = catalog
        .total_weight
        .checked_add(weight)
        .ok_or(ContractError::WeightOverflow)?;

    let entry = RewardEntry {
        id: reward_id,
        kind,
        asset,
        sub_id,
        amount,
        weight,
    };
    REWARDS.save(deps.storage, reward_id, &entry)?;
    CATALOG_STATE.save(deps.storage, &catalog)?;

    Ok(Response::new()
        .add_attribute("action", "add_reward")
        .add_attribute("reward_id", reward_id.to_string())
        .add_event(
            Event::new("lootbox_reward_added")
                .add_attribute("reward_id", reward_id.to_string())
                .add_attribute("kind", entry.kind.as_str())
                .add_attribute("asset", entry.asset.to_string())
                .add_attribute("amount", entry.amount.to_string())
                .add_attribute("weight", weight.to_string())
                .add_attribute("total_weight", catalog.total_weight.to_string()),
        ))
}

/// Remove a reward from the live catalog. Admin only.
/// Snapshots already captured by open draws keep their copy.
pub fn remove_reward(
    deps: DepsMut,
    _env: Env,
    info: MessageInfo,
    reward_id: u32,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    assert_admin(&config, &info, "remove rewards")?;

    let entry = REWARDS
        .may_load(deps.storage, reward_id)?
        .ok_or(ContractError::UnknownReward { reward_id })?;

    let mut catalog = CATALOG_STATE.load(deps.storage)?;
    catalog.total_weight -= entry.weight;
    CATALOG_STATE.save(deps.storage, &catalog)?;
    REWARDS.remove(deps.storage, reward_id);

    Ok(Response::new()
        .add_attribute("action", "remove_reward")
        .add_attribute("reward_id", reward_id.to_string())
        .add_event(
            Event::new("lootbox_reward_removed")
                .add_attribute("reward_id", reward_id.to_string())
                .add_attribute("total_weight", catalog.total_weight.to_string()),
        ))
}

/// Change a reward's weight. Admin only.
pub fn set_weight(
    deps: DepsMut,
    _env: Env,
    info: MessageInfo,
    reward_id: u32,
    weight: u64,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    assert_admin(&config, &info, "set reward weights")?;

    let mut entry = REWARDS
        .may_load(deps.storage, reward_id)?
        .ok_or(ContractError::UnknownReward { reward_id })?;

    let mut catalog = CATALOG_STATE.load(deps.storage)?;
    catalog.total_weight = (catalog.total_weight - entry.weight)
        .checked_add(weight)
        .ok_or(ContractError::WeightOverflow)?;
    let old_weight = entry.weight;
    entry.weight = weight;

    REWARDS.save(deps.storage, reward_id, &entry)?;
    CATALOG_STATE.save(deps.storage, &catalog)?;

    Ok(Response::new()
        .add_attribute("action", "set_weight")
        .add_attribute("reward_id", reward_id.to_string())
        .add_event(
            Event::new("lootbox_weight_set")
                .add_attribute("reward_id", reward_id.to_string())
                .add_attribute("old_weight", old_weight.to_string())
                .add_attribute("new_weight", weight.to_string())
                .add_attribute("total_weight", catalog.total_weight.to_string()),
        ))
}

/// Capture the live catalog as a cumulative weight table, ordered by reward id.
pub fn capture_snapshot(storage: &dyn Storage) -> Result<CatalogSnapshot, ContractError> {
    let entries = REWARDS
        .range(storage, None, None, Order::Ascending)
        .map(|r| r.map(|(_, entry)| entry))
        .collect::<Result<Vec<_>, _>>()?;

    build_snapshot(entries).map_err(|e| match e {
        SnapshotError::Empty => ContractError::EmptyCatalog,
        SnapshotError::WeightOverflow => ContractError::WeightOverflow,
    })
}

/// Mark a unique collectible as won by `request_id` and take it out of the live catalog.
///
/// Returns `false` without touching state if a different draw already won it.
pub fn consume_unique(
    storage: &mut dyn Storage,
    reward_id: u32,
    request_id: u64,
) -> Result<bool, ContractError> {
    if let Some(winner) = CONSUMED.may_load(storage, reward_id)? {
        return Ok(winner == request_id);
    }
    CONSUMED.save(storage, reward_id, &request_id)?;

    if let Some(entry) = REWARDS.may_load(storage, reward_id)? {
        let mut catalog = CATALOG_STATE.load(storage)?;
        catalog.total_weight -= entry.weight;
        CATALOG_STATE.save(storage, &catalog)?;
        REWARDS.remove(storage, reward_id);
    }
    Ok(true)
}

/// Check that kind, asset, sub id and amount fit together.
/// Returns the asset with its contract address normalized.
fn validate_reward(
    api: &dyn Api,
    kind: &RewardKind,
    asset: AssetRef,
    sub_id: Option<u64>,
    amount: Uint128,
) -> Result<AssetRef, ContractError> {
    let invalid = |reason: &str| ContractError::InvalidAsset {
        reason: reason.to_string(),
    };

    if amount.is_zero() {
        return Err(invalid("amount must be greater than zero"));
    }

    let asset = match asset {
        AssetRef::Native { denom } => {
            if denom.trim().is_empty() {
                return Err(invalid("native denom must not be empty"));
            }
            AssetRef::Native { denom }
        }
        AssetRef::Contract { addr } => AssetRef::Contract {
            addr: api.addr_validate(&addr)?.to_string(),
        },
    };

    if kind.requires_sub_id() {
        if sub_id.is_none() {
            return Err(invalid("unique and semi-fungible rewards need a sub id"));
        }
        if matches!(asset, AssetRef::Native { .. }) {
            return Err(invalid("unique and semi-fungible rewards must be contract assets"));
        }
    } else if sub_id.is_some() {
        return Err(invalid("fungible rewards take no sub id"));
    }

    if *kind == RewardKind::UniqueCollectible && amount != Uint128::one() {
        return Err(invalid("unique collectibles have an amount of exactly one"));
    }

    Ok(asset)
}
