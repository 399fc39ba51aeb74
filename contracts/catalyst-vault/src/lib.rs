pub mod chain_interface;
pub mod curves;
pub mod error;
pub mod escrow;
pub mod event;
pub mod fees;
pub mod msg;
pub mod security_limit;
pub mod vault;
pub mod vault_token;

pub use crate::error::ContractError;
pub use crate::vault::Vault;
