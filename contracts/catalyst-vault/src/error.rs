use cosmwasm_std::{Binary, ConversionOverflowError, DivideByZeroError, OverflowError, StdError, Uint128, Uint64};
use fixed_point_math::{FixedPointMathError, U256};
use thiserror::Error;
use vault_assets::AssetError;

use crate::escrow::PacketId;

#[derive(Error, Debug, PartialEq)]
pub enum ContractError {

    #[error("{0}")]
    Std(#[from] StdError),

    #[error("Unauthorized")]
    Unauthorized {},

    #[error("Arithmetic error")]
    ArithmeticError {},

    #[error("Invalid assets (invalid number of assets or invalid asset.)")]
    InvalidAssets {},

    #[error("Invalid asset: {asset}.")]
    InvalidAsset { asset: String },

    #[error("Invalid parameters: {reason}")]
    InvalidParameters { reason: String },

    #[error("Insufficient balance of {asset} for {account}: {balance} < {required}.")]
    InsufficientBalance {
        asset: String,
        account: String,
        balance: Uint128,
        required: Uint128
    },

    #[error("Asset error: {reason}")]
    AssetError { reason: String },

    #[error("Invalid amplification value.")]
    InvalidAmplification {},

    #[error("Invalid vault fee: requested fee is {requested_fee}, max allowed fee is {max_fee}.")]
    InvalidVaultFee { requested_fee: Uint64, max_fee: Uint64 },

    #[error("Invalid governance fee: requested fee is {requested_fee}, max allowed fee is {max_fee}.")]
    InvalidGovernanceFee { requested_fee: Uint64, max_fee: Uint64 },

    #[error("Invalid provided zero balance.")]
    InvalidZeroBalance {},

    #[error("Invalid weight.")]
    InvalidWeight {},

    #[error("The vault swap curves have not been initialized.")]
    VaultNotInitialized {},

    #[error("Security limit exceeded by {overflow} amount.")]
    SecurityLimitExceeded { overflow: U256 },

    #[error("Return insufficient: output is {out}, minimum output is {min_out}.")]
    InsufficientReturn { out: Uint128, min_out: Uint128 },

    #[error("The swap requires paying out more than the available output asset balance.")]
    CurveOverflow {},

    #[error("Vault not connected (channel id: {channel_id}, vault: {vault}).")]
    VaultNotConnected { channel_id: String, vault: Binary },

    #[error("The vault only allows for local swaps, as it has no cross chain interface.")]
    VaultHasNoInterface {},

    #[error("An escrow already exists for packet {packet_id}.")]
    DuplicatePacket { packet_id: PacketId },

    #[error("No open escrow for packet {packet_id}.")]
    UnknownOrResolvedPacket { packet_id: PacketId },

    #[error("The acknowledged swap does not match the escrow of packet {packet_id}.")]
    EscrowMismatch { packet_id: PacketId },

    #[error("Chain interface error: {reason}")]
    ChainInterface { reason: String },

    #[error("Rollback of packet {packet_id} failed after '{cause}': {reason}")]
    RollbackFailed { packet_id: PacketId, cause: String, reason: String },

}


impl From<AssetError> for ContractError {
    fn from(err: AssetError) -> Self {
        match err {
            AssetError::Std(error) => ContractError::Std(error),
            AssetError::InvalidParameters { reason } => ContractError::InvalidParameters { reason },
            AssetError::AssetNotFound { asset } => ContractError::InvalidAsset { asset },
            AssetError::InsufficientBalance {
                asset,
                account,
                balance,
                required
            } => ContractError::InsufficientBalance { asset, account, balance, required },
            other_err => ContractError::AssetError { reason: other_err.to_string() }
        }
    }
}

impl From<OverflowError> for ContractError {
    fn from(_err: OverflowError) -> Self {
        ContractError::ArithmeticError {}
    }
}

impl From<ConversionOverflowError> for ContractError {
    fn from(_err: ConversionOverflowError) -> Self {
        ContractError::ArithmeticError {}
    }
}

impl From<DivideByZeroError> for ContractError {
    fn from(_err: DivideByZeroError) -> Self {
        ContractError::ArithmeticError {}
    }
}

impl From<FixedPointMathError> for ContractError {
    fn from(_err: FixedPointMathError) -> Self {
        ContractError::ArithmeticError {}
    }
}

impl From<ContractError> for StdError {
    fn from(err: ContractError) -> StdError {
        StdError::GenericErr { msg: err.to_string() }
    }
}
