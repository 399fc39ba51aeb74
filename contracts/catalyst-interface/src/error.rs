use catalyst_vault::{escrow::PacketId, ContractError};
use cosmwasm_std::StdError;
use thiserror::Error;

use crate::relay::RelayError;

#[derive(Error, Debug, PartialEq)]
pub enum InterfaceError {
    #[error("{0}")]
    Std(#[from] StdError),

    #[error("Unauthorized")]
    Unauthorized {},

    #[error("Channel {channel_id} not found.")]
    ChannelNotFound { channel_id: String },

    #[error("Only supports channel with ibc version catalyst-v1, got {version}")]
    InvalidIbcChannelVersion { version: String },

    #[error("Vault {vault} is not registered on the interface.")]
    VaultNotRegistered { vault: String },

    #[error("Packet sequence mismatch on channel {channel_id}: expected {expected}, got {actual}.")]
    SequenceMismatch {
        channel_id: String,
        expected: u64,
        actual: u64
    },

    #[error("The delivered packet does not match the sent packet.")]
    PacketMismatch {},

    #[error("The payload was issued for packet {payload_packet_id}, but arrived as packet {packet_id}.")]
    PacketIdMismatch { packet_id: PacketId, payload_packet_id: PacketId },

    #[error("Payload encoding failed.")]
    PayloadEncodingError {},

    #[error("Payload decoding failed.")]
    PayloadDecodingError {},

    #[error("Invalid Catalyst 65-byte encoded address.")]
    InvalidCatalystEncodedAddress {},

    #[error("Packet {packet_id} has already been received.")]
    DuplicatePacket { packet_id: PacketId },

    #[error("Packet {packet_id} is unknown or already resolved.")]
    UnknownOrResolvedPacket { packet_id: PacketId },

    #[error("Relay error: {0}")]
    Relay(#[from] RelayError),

    #[error("Vault error: {0}")]
    Vault(#[from] ContractError),
}


// The vaults see the interface through the 'ChainInterface' trait, which reports vault errors.
impl From<InterfaceError> for ContractError {
    fn from(err: InterfaceError) -> Self {
        match err {
            InterfaceError::Vault(error) => error,
            other_err => ContractError::ChainInterface { reason: other_err.to_string() }
        }
    }
}
