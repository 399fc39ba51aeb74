use cosmwasm_std::{StdError, Uint128};
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum AssetError {

    #[error("{0}")]
    Std(#[from] StdError),

    #[error("Invalid parameters: {reason}")]
    InvalidParameters { reason: String },

    #[error("The requested asset does not exist: {asset}.")]
    AssetNotFound { asset: String },

    #[error("Asset {asset} already exists.")]
    AssetAlreadyExists { asset: String },

    #[error("Insufficient balance of {asset} for {account}: {balance} < {required}.")]
    InsufficientBalance {
        asset: String,
        account: String,
        balance: Uint128,
        required: Uint128
    },

    #[error("Insufficient allowance of {asset} for {spender}: {allowance} < {required}.")]
    InsufficientAllowance {
        asset: String,
        spender: String,
        allowance: Uint128,
        required: Uint128
    },

    #[error("Unsupported asset message.")]
    UnsupportedMessage {},

}

impl From<AssetError> for StdError {
    fn from(err: AssetError) -> StdError {
        StdError::GenericErr { msg: err.to_string() }
    }
}
