use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Addr, Binary, Event, Uint128, Uint64};
use fixed_point_math::U256;

use crate::escrow::PacketId;


#[cw_serde]
pub struct InstantiateMsg {
    pub name: String,       // Name for the vault token
    pub symbol: String,     // Symbol for the vault token
    pub chain_interface: Option<String>,
    pub vault_fee: Uint64,
    pub governance_fee_share: Uint64,
    pub fee_administrator: String,
    pub setup_master: String,
    pub governance_account: String
}


#[cw_serde]
pub struct InitializeSwapCurvesMsg {
    pub assets: Vec<String>,
    pub weights: Vec<Uint64>,
    pub amp: Uint64,
    pub depositor: String
}


/// Cross chain swap order.
#[derive(Clone, Debug, PartialEq)]
pub struct SendAssetMsg {
    pub channel_id: String,
    /// The target vault (Catalyst encoded).
    pub to_vault: Binary,
    /// The recipient of the swap output (Catalyst encoded).
    pub to_account: Binary,
    pub from_asset: String,
    pub to_asset_index: u8,
    pub amount: Uint128,
    pub min_out: U256,
    /// The account to which the escrowed assets are returned if the swap fails.
    pub fallback_account: String
}


/// Inbound swap order, as decoded from a packet by the chain interface.
#[derive(Clone, Debug, PartialEq)]
pub struct ReceiveAssetMsg {
    pub channel_id: String,
    pub from_vault: Binary,
    pub to_asset_index: u8,
    pub to_account: String,
    pub u: U256,
    pub min_out: Uint128,
    pub from_amount: U256,
    pub from_asset: Binary,
    pub from_block_number_mod: u32
}


/// Confirmation (or rejection) of a cross chain swap, as delivered by the chain interface.
#[derive(Clone, Debug, PartialEq)]
pub struct SendAssetAckMsg {
    pub packet_id: PacketId,
    pub to_account: Binary,
    pub u: U256,
    pub escrow_amount: Uint128,
    pub asset_ref: String,
    pub block_number_mod: u32
}


/// The message the vault hands to its chain interface to emit a cross chain swap.
#[derive(Clone, Debug, PartialEq)]
pub struct SendCrossChainAssetMsg {
    pub channel_id: String,
    pub to_vault: Binary,
    pub to_account: Binary,
    pub to_asset_index: u8,
    pub u: U256,
    pub min_out: U256,
    pub from_amount: Uint128,
    pub from_asset: String,
    pub block_number: u32
}



/// Cross chain liquidity swap order: the vault tokens are burnt, and their value is deposited
/// into the target vault.
#[derive(Clone, Debug, PartialEq)]
pub struct SendLiquidityMsg {
    pub channel_id: String,
    /// The target vault (Catalyst encoded).
    pub to_vault: Binary,
    /// The recipient of the target vault tokens (Catalyst encoded).
    pub to_account: Binary,
    /// The vault tokens to burn.
    pub amount: Uint128,
    pub min_vault_tokens: U256,
    pub min_reference_asset: U256,
    /// The account for which the escrowed vault tokens are minted back if the swap fails.
    pub fallback_account: String
}


/// Inbound liquidity swap order, as decoded from a packet by the chain interface.
#[derive(Clone, Debug, PartialEq)]
pub struct ReceiveLiquidityMsg {
    pub channel_id: String,
    pub from_vault: Binary,
    pub to_account: String,
    pub u: U256,
    pub min_vault_tokens: Uint128,
    pub min_reference_asset: Uint128,
    pub from_amount: U256,
    pub from_block_number_mod: u32
}


/// Confirmation (or rejection) of a liquidity swap, as delivered by the chain interface.
#[derive(Clone, Debug, PartialEq)]
pub struct SendLiquidityAckMsg {
    pub packet_id: PacketId,
    pub to_account: Binary,
    pub u: U256,
    pub escrow_amount: Uint128,
    pub block_number_mod: u32
}


/// The message the vault hands to its chain interface to emit a liquidity swap.
#[derive(Clone, Debug, PartialEq)]
pub struct SendCrossChainLiquidityMsg {
    pub channel_id: String,
    pub to_vault: Binary,
    pub to_account: Binary,
    pub u: U256,
    pub min_vault_tokens: U256,
    pub min_reference_asset: U256,
    pub from_amount: Uint128,
    pub block_number: u32
}



// Responses ********************************************************************************************************************

/// The result of a vault operation together with its notifications.
#[derive(Clone, Debug, PartialEq)]
pub struct VaultResponse<T = ()> {
    pub data: T,
    pub events: Vec<Event>
}

impl VaultResponse<()> {
    pub fn new() -> Self {
        Self::with_data(())
    }
}

impl Default for VaultResponse<()> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> VaultResponse<T> {

    pub fn with_data(data: T) -> Self {
        Self {
            data,
            events: vec![]
        }
    }

    pub fn add_event(mut self, event: Event) -> Self {
        self.events.push(event);
        self
    }
}


#[derive(Clone, Debug, PartialEq)]
pub struct SendAssetResponse {
    pub packet_id: PacketId,
    pub units: U256,
    pub escrow_amount: Uint128,
    pub fee: Uint128
}


#[derive(Clone, Debug, PartialEq)]
pub struct SendLiquidityResponse {
    pub packet_id: PacketId,
    pub units: U256
}


#[cw_serde]
pub struct FeesResponse {
    pub vault_fee: Uint64,
    pub governance_fee_share: Uint64,
    pub fee_administrator: Addr,
    pub governance_account: Addr
}


#[derive(Clone, Debug, PartialEq)]
pub struct LimitCapacityResponse {
    pub capacity: U256,
    pub max_limit_capacity: U256,
    pub used_limit_capacity: U256
}
