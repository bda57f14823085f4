use cosmwasm_schema::cw_serde;
use cosmwasm_std::Uint128;

/// The asset standard a reward is paid out in.
#[cw_serde]
pub enum RewardKind {
    /// Native bank denom or CW20 token.
    Fungible,
    /// A single CW721 token.
    UniqueCollectible,
    /// An amount of one CW1155 token id.
    SemiFungibleStack,
}

impl RewardKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RewardKind::Fungible => "fungible",
            RewardKind::UniqueCollectible => "unique_collectible",
            RewardKind::SemiFungibleStack => "semi_fungible_stack",
        }
    }

    /// Unique and semi-fungible rewards address a token id inside their contract.
    pub fn requires_sub_id(&self) -> bool {
        !matches!(self, RewardKind::Fungible)
    }
}

/// Where a reward's asset lives.
#[cw_serde]
pub enum AssetRef {
    Native { denom: String },
    Contract { addr: String },
}

impl std::fmt::Display for AssetRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssetRef::Native { denom } => write!(f, "native:{}", denom),
            AssetRef::Contract { addr } => write!(f, "contract:{}", addr),
        }
    }
}

#[cw_serde]
pub struct RewardEntry {
    pub id: u32,
    pub kind: RewardKind,
    pub asset: AssetRef,
    /// Token id for unique and semi-fungible rewards.
    pub sub_id: Option<u64>,
    pub amount: Uint128,
    pub weight: u64,
}

/// One row of the cumulative weight table: the entry owns tickets
/// `[cumulative_start, cumulative_end)`.
#[cw_serde]
pub struct SnapshotEntry {
    pub cumulative_start: u64,
    pub cumulative_end: u64,
    pub reward: RewardEntry,
}

/// Immutable weight table captured when a draw is opened.
#[cw_serde]
pub struct CatalogSnapshot {
    pub entries: Vec<SnapshotEntry>,
    pub total_weight: u64,
}

/// The lifecycle status of a draw request.
#[cw_serde]
pub enum DrawStatus {
    Pending,
    Fulfilled {
        random_word: Uint128,
        selected_reward_id: u32,
    },
    Claimable {
        reason: String,
    },
    Claimed,
    Cancelled,
}

impl DrawStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DrawStatus::Pending => "pending",
            DrawStatus::Fulfilled { .. } => "fulfilled",
            DrawStatus::Claimable { .. } => "claimable",
            DrawStatus::Claimed => "claimed",
            DrawStatus::Cancelled => "cancelled",
        }
    }
}
