use cosmwasm_std::{Addr, BlockInfo};

use crate::{error::ContractError, escrow::PacketId, msg::{SendCrossChainAssetMsg, SendCrossChainLiquidityMsg}};


/// The cross chain messaging layer a vault emits its outbound asset and liquidity swaps through.
pub trait ChainInterface {

    /// The address under which the interface is authorized on the vault.
    fn address(&self) -> &Addr;


    /// The id the next packet sent over `channel_id` will carry.
    fn next_packet_id(&self, channel_id: &str) -> Result<PacketId, ContractError>;


    /// Emit a cross chain swap.
    ///
    /// ! **IMPORTANT**: The packet must be emitted under `packet_id`. If the channel sequence has
    /// moved since `next_packet_id` was queried, the call must fail without emitting anything.
    ///
    /// # Arguments:
    /// * `sender` - The vault initiating the swap.
    /// * `block` - The current block.
    /// * `packet_id` - The expected id of the packet.
    /// * `msg` - The swap description.
    ///
    fn send_cross_chain_asset(
        &self,
        sender: &Addr,
        block: &BlockInfo,
        packet_id: &PacketId,
        msg: SendCrossChainAssetMsg
    ) -> Result<(), ContractError>;


    /// Emit a cross chain liquidity swap, under the same `packet_id` rules as
    /// `send_cross_chain_asset`.
    fn send_cross_chain_liquidity(
        &self,
        sender: &Addr,
        block: &BlockInfo,
        packet_id: &PacketId,
        msg: SendCrossChainLiquidityMsg
    ) -> Result<(), ContractError>;

}
