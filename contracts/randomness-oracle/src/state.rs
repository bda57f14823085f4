use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Addr, Timestamp};
use cw_storage_plus::{Item, Map};

pub const CONFIG: Item<OracleConfig> = Item::new("config");
pub const BEACONS: Map<u64, StoredBeacon> = Map::new("beacons");
pub const LATEST_ROUND: Item<u64> = Item::new("latest_round");
pub const NEXT_JOB_ID: Item<u64> = Item::new("next_job_id");
pub const JOBS: Map<u64, Job> = Map::new("jobs");
/// Undelivered jobs keyed by (target_round, id), so a round bound selects the ready ones.
pub const PENDING_JOBS: Map<(u64, u64), ()> = Map::new("pending_jobs");

#[cw_serde]
pub struct OracleConfig {
    pub admin: Addr,
    pub operators: Vec<Addr>,
    /// Quicknet public key, 96 bytes (G2 point)
    pub quicknet_pubkey: Vec<u8>,
    /// Chain hash identifying the drand network
    pub chain_hash: String,
    /// Genesis time of the drand network (unix seconds)
    pub genesis_time: u64,
    /// Period between rounds in seconds (3 for quicknet)
    pub period_seconds: u64,
    /// Callbacks dispatched by a single beacon submission
    pub max_callbacks_per_beacon: u32,
}

impl OracleConfig {
    /// The drand round published at `time`, or 0 before genesis.
    pub fn round_at(&self, time: Timestamp) -> u64 {
        let now = time.seconds();
        if now < self.genesis_time {
            return 0;
        }
        (now - self.genesis_time) / self.period_seconds + 1
    }
}

#[cw_serde]
pub struct StoredBeacon {
    pub round: u64,
    /// sha256(signature), 32 bytes
    pub randomness: Vec<u8>,
    /// BLS signature on G1, 48 bytes
    pub signature: Vec<u8>,
    pub verified: bool,
    pub submitted_at: Timestamp,
    pub submitted_by: Addr,
}

#[cw_serde]
pub enum JobStatus {
    Pending,
    Delivered { round: u64 },
    Failed { round: u64, reason: String },
}

#[cw_serde]
pub struct Job {
    /// Oracle-assigned correlation id
    pub id: u64,
    pub requester: Addr,
    /// Requester's own id, echoed back as `request_id` in the callback
    pub job_id: u64,
    /// First round whose beacon may answer this job
    pub target_round: u64,
    pub requested_at: Timestamp,
    pub status: JobStatus,
}
