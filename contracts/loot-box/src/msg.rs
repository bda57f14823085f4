use cosmwasm_schema::{cw_serde, QueryResponses};
use cosmwasm_std::Uint128;
use loot_box_common::types::{AssetRef, CatalogSnapshot, RewardEntry, RewardKind};

use crate::state::{DrawRequest, EngineState, LootBoxConfig};

#[cw_serde]
pub struct InstantiateMsg {
    pub oracle: String,
    pub fee_denom: String,
    pub draw_fee: Uint128,
    pub timeout_window_seconds: u64,
}

#[cw_serde]
pub enum ExecuteMsg {
    /// Buy a draw. Send exactly the draw fee in `fee_denom`.
    Open {},
    /// Deliver randomness for a pending draw. Oracle only.
    Fulfill {
        request_id: u64,
        random_word: Uint128,
    },
    /// Retry the payout of a claimable draw. Anyone can call.
    Claim { request_id: u64 },
    /// Cancel a draw that was never fulfilled and refund its fee.
    /// Requester or admin, after the timeout window.
    Cancel { request_id: u64 },
    /// Add a reward to the catalog. Admin only.
    AddReward {
        kind: RewardKind,
        asset: AssetRef,
        sub_id: Option<u64>,
        amount: Uint128,
        weight: u64,
    },
    /// Remove a reward from the catalog. Admin only.
    RemoveReward { reward_id: u32 },
    /// Change a reward's weight; zero takes it out of new draws. Admin only.
    SetWeight { reward_id: u32, weight: u64 },
    /// Change the fee for draws opened from now on. Admin only.
    SetFee { fee: Uint128 },
    /// Change the cancellation timeout for draws opened from now on. Admin only.
    SetTimeoutWindow { seconds: u64 },
    /// Update admin or oracle. Admin only.
    UpdateConfig {
        admin: Option<String>,
        oracle: Option<String>,
    },
    /// Withdraw collected fees to the admin. Admin only.
    Withdraw { amount: Uint128 },
}

#[cw_serde]
pub struct MigrateMsg {}

#[cw_serde]
#[derive(QueryResponses)]
pub enum QueryMsg {
    #[returns(LootBoxConfig)]
    Config {},
    #[returns(EngineState)]
    EngineState {},
    #[returns(RewardEntry)]
    Reward { reward_id: u32 },
    #[returns(RewardsResponse)]
    Rewards {
        start_after: Option<u32>,
        limit: Option<u32>,
    },
    /// The snapshot a draw opened now would capture.
    #[returns(Option<CatalogSnapshot>)]
    Catalog {},
    #[returns(OddsResponse)]
    Odds {},
    #[returns(DrawRequest)]
    Draw { request_id: u64 },
    #[returns(DrawHistoryResponse)]
    DrawHistory {
        start_after: Option<u64>,
        limit: Option<u32>,
    },
    #[returns(DrawHistoryResponse)]
    UserDraws {
        address: String,
        start_after: Option<u64>,
        limit: Option<u32>,
    },
    /// Which draw won a unique collectible, if any.
    #[returns(Option<u64>)]
    Consumed { reward_id: u32 },
}

#[cw_serde]
pub struct RewardsResponse {
    pub rewards: Vec<RewardEntry>,
}

#[cw_serde]
pub struct RewardOdds {
    pub reward_id: u32,
    pub weight: u64,
    /// Probability in basis points, rounded down
    pub probability_bps: u64,
}

#[cw_serde]
pub struct OddsResponse {
    pub total_weight: u64,
    pub odds: Vec<RewardOdds>,
}

#[cw_serde]
pub struct DrawHistoryResponse {
    pub draws: Vec<DrawRequest>,
}

/// Arguments of `ExecuteMsg::AddReward`, grouped for the handler.
pub struct AddRewardParams {
    pub kind: RewardKind,
    pub asset: AssetRef,
    pub sub_id: Option<u64>,
    pub amount: Uint128,
    pub weight: u64,
}
