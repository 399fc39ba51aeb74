pub mod asset;
pub mod error;

pub use crate::asset::{Asset, AssetLedger, AssetMsg, VaultAssets};
pub use crate::asset::asset_memory::MemoryLedger;
pub use crate::error::AssetError;
