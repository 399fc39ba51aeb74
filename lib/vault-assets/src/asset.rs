use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Addr, Uint128};
use cw20::Cw20ExecuteMsg;

use crate::error::AssetError;

pub mod asset_memory;


/// An asset movement order, to be executed by an `AssetLedger` on behalf of a sender.
///
/// **NOTE**: The wrapped messages follow cw20 semantics: `Transfer` moves funds out of the
/// sender's account, `TransferFrom` moves funds out of the `owner` account using the allowance
/// granted to the sender.
#[cw_serde]
pub struct AssetMsg {
    pub asset_ref: String,
    pub msg: Cw20ExecuteMsg
}


/// Interface of the fungible asset ledger the vaults settle against.
pub trait AssetLedger: Send + Sync {

    /// Query the balance of `account`.
    ///
    /// # Arguments:
    /// * `asset_ref` - The asset reference.
    /// * `account` - The account to query.
    ///
    fn balance_of(&self, asset_ref: &str, account: &Addr) -> Result<Uint128, AssetError>;


    /// Query the amount `spender` may pull from `owner`.
    ///
    /// # Arguments:
    /// * `asset_ref` - The asset reference.
    /// * `owner` - The owner of the funds.
    /// * `spender` - The account allowed to pull the funds.
    ///
    fn allowance(&self, asset_ref: &str, owner: &Addr, spender: &Addr) -> Result<Uint128, AssetError>;


    /// Execute a batch of asset messages on behalf of `sender`.
    ///
    /// ! **IMPORTANT**: The batch is all-or-nothing. If any message fails, none of the messages
    /// of the batch may take effect.
    ///
    /// # Arguments:
    /// * `sender` - The account executing the messages.
    /// * `msgs` - The messages to execute, in order.
    ///
    fn execute(&self, sender: &Addr, msgs: Vec<AssetMsg>) -> Result<(), AssetError>;

}


/// Asset handler. The asset *reference* identifies the asset on the ledger.
#[cw_serde]
pub struct Asset(pub String);

impl Asset {

    pub fn get_asset_ref(&self) -> &str {
        &self.0
    }


    /// Build the message to pull `amount` of the asset from `owner` into `vault`.
    ///
    /// NOTE: Zero-valued transfers do not generate a message.
    ///
    /// # Arguments:
    /// * `vault` - The vault receiving the asset.
    /// * `owner` - The account the asset is pulled from.
    /// * `amount` - The asset amount to receive.
    ///
    pub fn receive_asset(
        &self,
        vault: &Addr,
        owner: &Addr,
        amount: Uint128
    ) -> Option<AssetMsg> {

        if amount.is_zero() {
            return None;
        }

        Some(AssetMsg {
            asset_ref: self.0.clone(),
            msg: Cw20ExecuteMsg::TransferFrom {
                owner: owner.to_string(),
                recipient: vault.to_string(),
                amount
            }
        })
    }


    /// Build the message to send `amount` of the asset from the vault to `recipient`.
    ///
    /// NOTE: Zero-valued transfers do not generate a message.
    ///
    /// # Arguments:
    /// * `amount` - The asset amount to send.
    /// * `recipient` - The recipient of the asset.
    ///
    pub fn send_asset(
        &self,
        amount: Uint128,
        recipient: &Addr
    ) -> Option<AssetMsg> {

        if amount.is_zero() {
            return None;
        }

        Some(AssetMsg {
            asset_ref: self.0.clone(),
            msg: Cw20ExecuteMsg::Transfer {
                recipient: recipient.to_string(),
                amount
            }
        })
    }
}

impl std::fmt::Display for Asset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}


/// The ordered set of assets held by a vault.
#[cw_serde]
pub struct VaultAssets(pub Vec<Asset>);

impl VaultAssets {

    /// Generate a new vault assets handler with the specified assets.
    ///
    /// ! **IMPORTANT**: This function does not check whether the provided assets exist on the
    /// ledger, only that the set is well formed.
    ///
    /// # Arguments:
    /// * `assets` - The assets contained by the vault.
    /// * `max_assets` - The maximum asset count.
    ///
    pub fn new(assets: Vec<Asset>, max_assets: usize) -> Result<Self, AssetError> {

        if assets.is_empty() || assets.len() > max_assets {
            return Err(AssetError::InvalidParameters {
                reason: format!("Invalid asset count {} (must be within 1 and {}).", assets.len(), max_assets)
            });
        }

        let has_duplicates = assets.iter()
            .enumerate()
            .any(|(index, asset)| assets[..index].contains(asset));

        if has_duplicates {
            return Err(AssetError::InvalidParameters {
                reason: "Duplicate assets.".to_string()
            });
        }

        if assets.iter().any(|asset| asset.0.is_empty()) {
            return Err(AssetError::InvalidParameters {
                reason: "Empty asset reference.".to_string()
            });
        }

        Ok(Self(assets))
    }


    pub fn get_assets(&self) -> &Vec<Asset> {
        &self.0
    }


    pub fn get_assets_refs(&self) -> Vec<&str> {
        self.0.iter()
            .map(|asset| asset.get_asset_ref())
            .collect()
    }


    /// Get the index of an asset within the vault.
    pub fn index_of(&self, asset_ref: &str) -> Option<usize> {
        self.0.iter()
            .position(|asset| asset.get_asset_ref() == asset_ref)
    }


    pub fn get_asset_by_index(&self, index: usize) -> Option<&Asset> {
        self.0.get(index)
    }
}
