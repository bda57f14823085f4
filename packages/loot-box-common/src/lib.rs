pub mod msg;
pub mod randomness;
pub mod selection;
pub mod types;

pub use randomness::derive_random_word;
pub use selection::{build_snapshot, select};
pub use types::{AssetRef, CatalogSnapshot, DrawStatus, RewardEntry, RewardKind, SnapshotEntry};
