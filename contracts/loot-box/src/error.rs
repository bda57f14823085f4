use cosmwasm_std::{OverflowError, StdError, Uint128};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ContractError {
    #[error("{0}")]
    Std(#[from] StdError),

    #[error("{0}")]
    Overflow(#[from] OverflowError),

    #[error("unauthorized: {reason}")]
    Unauthorized { reason: String },

    #[error("reward weight must be greater than zero")]
    InvalidWeight,

    #[error("invalid asset: {reason}")]
    InvalidAsset { reason: String },

    #[error("total catalog weight overflows")]
    WeightOverflow,

    #[error("reward {reward_id} not found")]
    UnknownReward { reward_id: u32 },

    #[error("catalog has no weighted rewards")]
    EmptyCatalog,

    #[error("draw fee is {required}, sent {sent}")]
    InsufficientFee { required: String, sent: String },

    #[error("draw request {request_id} not found")]
    UnknownRequest { request_id: u64 },

    #[error("draw request {request_id} is not pending")]
    NotPending { request_id: u64 },

    #[error("draw request {request_id} is not claimable")]
    NotClaimable { request_id: u64 },

    #[error("draw request {request_id} cannot be cancelled before {cancel_after}")]
    NotExpired { request_id: u64, cancel_after: u64 },

    #[error("insufficient reward balance: need {needed}, have {available}")]
    InsufficientRewardBalance { needed: Uint128, available: Uint128 },

    #[error("insufficient vault balance: requested {requested}, withdrawable {available}")]
    InsufficientVaultBalance {
        requested: Uint128,
        available: Uint128,
    },

    #[error("invalid timeout window: {seconds}s (must be between {min} and {max})")]
    InvalidTimeoutWindow { seconds: u64, min: u64, max: u64 },

    #[error("withdraw amount must be greater than zero")]
    ZeroWithdraw,
}
