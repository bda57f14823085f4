use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Addr, Timestamp, Uint128};
use cw_storage_plus::{Item, Map};
use loot_box_common::types::{CatalogSnapshot, DrawStatus, RewardEntry};

pub const CONFIG: Item<LootBoxConfig> = Item::new("config");
pub const ENGINE_STATE: Item<EngineState> = Item::new("engine_state");
pub const CATALOG_STATE: Item<CatalogState> = Item::new("catalog_state");

/// Live catalog, keyed by reward id. Ascending key order is insertion order.
pub const REWARDS: Map<u32, RewardEntry> = Map::new("rewards");
/// Unique collectibles already awarded: reward id -> request id that won it.
pub const CONSUMED: Map<u32, u64> = Map::new("consumed");

pub const DRAWS: Map<u64, DrawRequest> = Map::new("draws");
/// Per-requester draw index
pub const USER_DRAWS: Map<(&Addr, u64), ()> = Map::new("user_draws");

#[cw_serde]
pub struct LootBoxConfig {
    pub admin: Addr,
    /// The only address allowed to deliver randomness
    pub oracle: Addr,
    pub fee_denom: String,
    /// Price of one draw in `fee_denom`
    pub draw_fee: Uint128,
    /// How long a draw must stay pending before it can be cancelled (seconds)
    pub timeout_window_seconds: u64,
}

#[cw_serde]
pub struct EngineState {
    pub next_request_id: u64,
    /// Collected fees not yet refunded or withdrawn
    pub fee_balance: Uint128,
    /// Part of `fee_balance` belonging to draws that are still refundable
    pub pending_fees: Uint128,
    pub total_draws_opened: u64,
    /// Draws resolved to a reward, whether paid at once or left Claimable
    pub total_draws_fulfilled: u64,
    /// Claimable draws later paid through `claim`
    pub total_draws_claimed: u64,
    pub total_draws_cancelled: u64,
    pub total_fees_withdrawn: Uint128,
}

#[cw_serde]
pub struct CatalogState {
    pub next_reward_id: u32,
    /// Sum of weights over the live catalog
    pub total_weight: u64,
}

#[cw_serde]
pub struct DrawRequest {
    pub request_id: u64,
    pub requester: Addr,
    pub fee_paid: Uint128,
    pub snapshot: CatalogSnapshot,
    pub status: DrawStatus,
    pub created_at: Timestamp,
    pub cancel_after: Timestamp,
    pub random_word: Option<Uint128>,
    pub reward_id: Option<u32>,
    pub fulfilled_at: Option<Timestamp>,
    pub settled_at: Option<Timestamp>,
}

impl DrawRequest {
    /// The snapshot entry a fulfilled draw resolved to.
    pub fn selected_reward(&self) -> Option<&RewardEntry> {
        let id = self.reward_id?;
        self.snapshot
            .entries
            .iter()
            .map(|e| &e.reward)
            .find(|r| r.id == id)
    }
}
