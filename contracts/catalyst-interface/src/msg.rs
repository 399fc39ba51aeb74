use cosmwasm_schema::cw_serde;
use cosmwasm_std::{IbcEndpoint, IbcPacket};


#[cw_serde]
pub struct InterfaceConfig {
    /// The port the interface binds its channels to.
    pub port_id: String,
    /// Lifetime (in seconds) of the emitted packets.
    pub default_timeout: u64
}


#[cw_serde]
pub struct IbcChannelInfo {
    pub endpoint: IbcEndpoint,
    pub counterparty_endpoint: IbcEndpoint,
    pub connection_id: String
}


/// Life cycle of an outbound packet. `Sent` is the only non-terminal state.
#[cw_serde]
#[derive(Copy, Eq)]
pub enum PacketState {
    Sent,
    Acknowledged { success: bool },
    TimedOut
}


#[cw_serde]
pub struct PacketRecord {
    pub packet: IbcPacket,
    pub state: PacketState
}
