use cosmwasm_std::IbcPacket;
use thiserror::Error;


#[derive(Error, Debug, Clone, PartialEq)]
pub enum RelayError {
    #[error("The relay rejected the packet: {reason}")]
    Rejected { reason: String },

    #[error("The relay is unavailable.")]
    Unavailable {},
}


/// The transport carrying packets between chains.
///
/// ! **IMPORTANT**: Implementations must not deliver the packet (nor any acknowledgement) from
/// within `send_packet`, as the sending vault is still mid-operation.
pub trait PacketRelay: Send + Sync {

    /// Hand a packet over for delivery. Returns the sequence under which the packet was
    /// accepted, which must match the packet's own sequence.
    fn send_packet(&self, packet: &IbcPacket) -> Result<u64, RelayError>;

}
