use cosmwasm_schema::{cw_serde, QueryResponses};

use crate::state::{Job, OracleConfig, StoredBeacon};

#[cw_serde]
pub struct InstantiateMsg {
    pub operators: Vec<String>,
    /// Hex-encoded quicknet public key (96 bytes = 192 hex chars)
    pub quicknet_pubkey_hex: String,
    pub chain_hash: String,
    pub genesis_time: u64,
    pub period_seconds: u64,
    pub max_callbacks_per_beacon: u32,
}

#[cw_serde]
pub enum ExecuteMsg {
    /// Queue a randomness job. The caller receives
    /// `fulfill { request_id: job_id, random_word }` once a later beacon lands.
    RequestRandomness { job_id: u64 },
    /// Submit a drand beacon for verification and storage.
    SubmitBeacon {
        round: u64,
        /// Hex-encoded BLS signature (48 bytes = 96 hex chars)
        signature_hex: String,
    },
    /// Deliver queued jobs whose target-round beacon is stored.
    DeliverPending { limit: Option<u32> },
    /// Update operator list (admin only).
    UpdateOperators {
        add: Vec<String>,
        remove: Vec<String>,
    },
    /// Update admin or delivery batch size (admin only).
    UpdateConfig {
        admin: Option<String>,
        max_callbacks_per_beacon: Option<u32>,
    },
}

#[cw_serde]
pub struct MigrateMsg {}

#[cw_serde]
#[derive(QueryResponses)]
pub enum QueryMsg {
    #[returns(OracleConfig)]
    Config {},

    #[returns(Option<StoredBeacon>)]
    Beacon { round: u64 },

    #[returns(u64)]
    LatestRound {},

    #[returns(Option<Job>)]
    Job { id: u64 },

    /// Undelivered jobs, oldest target round first.
    #[returns(PendingJobsResponse)]
    PendingJobs { limit: Option<u32> },
}

#[cw_serde]
pub struct PendingJobsResponse {
    pub jobs: Vec<Job>,
}
