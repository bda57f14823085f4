//! Wire messages exchanged with collaborator contracts.
//!
//! Only the variants this protocol sends are declared; each serializes to the
//! same JSON as the counterpart contract's own message enum.

use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Binary, Uint128};

/// Sent by a loot box to the randomness oracle.
#[cw_serde]
pub enum OracleExecuteMsg {
    /// Ask for one random word, correlated by the caller's `job_id`.
    RequestRandomness { job_id: u64 },
}

/// Sent by the randomness oracle back to the requesting loot box.
#[cw_serde]
pub enum LootBoxCallbackMsg {
    Fulfill {
        request_id: u64,
        random_word: Uint128,
    },
}

#[cw_serde]
pub enum Cw20ExecuteMsg {
    Transfer { recipient: String, amount: Uint128 },
}

#[cw_serde]
pub enum Cw20QueryMsg {
    Balance { address: String },
}

#[cw_serde]
pub struct Cw20BalanceResponse {
    pub balance: Uint128,
}

#[cw_serde]
pub enum Cw721ExecuteMsg {
    TransferNft { recipient: String, token_id: String },
}

#[cw_serde]
pub enum Cw1155ExecuteMsg {
    SendFrom {
        from: String,
        to: String,
        token_id: String,
        value: Uint128,
        msg: Option<Binary>,
    },
}
