use std::{collections::{HashMap, HashSet}, sync::Arc};

use catalyst_vault::{
    chain_interface::ChainInterface,
    escrow::PacketId,
    msg::{
        ReceiveAssetMsg, ReceiveLiquidityMsg, SendAssetAckMsg, SendCrossChainAssetMsg,
        SendCrossChainLiquidityMsg, SendLiquidityAckMsg, VaultResponse
    },
    ContractError, Vault
};
use cosmwasm_std::{Addr, Binary, BlockInfo, IbcChannel, IbcPacket, IbcTimeout, Uint128};
use fixed_point_math::U256;
use parking_lot::Mutex;
use tracing::{debug, error, info, warn};
use vault_assets::AssetLedger;

use crate::{
    catalyst_payload::{
        CatalystEncodedAddress, CatalystV1Packet, CatalystV1SendAssetPayload, CatalystV1SendLiquidityPayload
    },
    error::InterfaceError,
    ibc::{ack_fail, ack_success, is_ack_success, validate_ibc_channel_config},
    msg::{IbcChannelInfo, InterfaceConfig, PacketRecord, PacketState},
    relay::PacketRelay
};


struct InterfaceState<L: AssetLedger> {
    channels: HashMap<String, IbcChannelInfo>,
    next_sequences: HashMap<String, u64>,
    /// Every packet ever sent, resolved ones included. Records are never pruned: a resolved
    /// record is what rejects a repeated acknowledgement or timeout of its packet.
    sent_packets: HashMap<PacketId, PacketRecord>,
    /// Ids of every packet ever received. Never pruned, as they are the replay protection.
    received_packets: HashSet<PacketId>,
    vaults: HashMap<String, Arc<Vault<L>>>
}

impl<L: AssetLedger> InterfaceState<L> {

    fn channel(&self, channel_id: &str) -> Result<&IbcChannelInfo, InterfaceError> {
        self.channels
            .get(channel_id)
            .ok_or_else(|| InterfaceError::ChannelNotFound { channel_id: channel_id.to_string() })
    }

    fn next_sequence(&self, channel_id: &str) -> u64 {
        self.next_sequences
            .get(channel_id)
            .copied()
            .unwrap_or(1)
    }

    fn vault(&self, vault: &str) -> Result<Arc<Vault<L>>, InterfaceError> {
        self.vaults
            .get(vault)
            .cloned()
            .ok_or_else(|| InterfaceError::VaultNotRegistered { vault: vault.to_string() })
    }
}


/// Cross chain messaging layer of the Catalyst vaults of a chain.
///
/// The interface encodes the outbound swaps of its vaults into packets handed to a
/// `PacketRelay`, executes the inbound packets against the target vaults, and drives every
/// outbound packet from `Sent` to exactly one terminal state (acknowledged or timed out).
///
/// ! **IMPORTANT**: The interface never holds its own lock while calling into a vault. The only
/// nesting is vault → interface, when a vault emits a swap.
pub struct CatalystInterface<L: AssetLedger, R: PacketRelay> {
    address: Addr,
    config: InterfaceConfig,
    relay: Arc<R>,
    state: Mutex<InterfaceState<L>>
}

impl<L: AssetLedger, R: PacketRelay> CatalystInterface<L, R> {

    pub fn new(address: Addr, config: InterfaceConfig, relay: Arc<R>) -> Self {
        Self {
            address,
            config,
            relay,
            state: Mutex::new(InterfaceState {
                channels: HashMap::new(),
                next_sequences: HashMap::new(),
                sent_packets: HashMap::new(),
                received_packets: HashSet::new(),
                vaults: HashMap::new()
            })
        }
    }


    pub fn config(&self) -> &InterfaceConfig {
        &self.config
    }



    // Channel management *******************************************************************************************************

    /// Open (or reopen) a channel. Sequences of a reopened channel continue where they left off.
    ///
    /// # Arguments:
    /// * `channel` - The local channel configuration.
    /// * `counterparty_version` - The counterparty's channel version.
    ///
    pub fn open_channel(
        &self,
        channel: IbcChannel,
        counterparty_version: Option<&str>
    ) -> Result<(), InterfaceError> {

        validate_ibc_channel_config(&channel, counterparty_version)?;

        let channel_id = channel.endpoint.channel_id.clone();

        info!(
            interface = %self.address,
            %channel_id,
            counterparty_channel_id = %channel.counterparty_endpoint.channel_id,
            connection_id = %channel.connection_id,
            "channel open"
        );

        self.state.lock().channels.insert(
            channel_id,
            IbcChannelInfo {
                endpoint: channel.endpoint,
                counterparty_endpoint: channel.counterparty_endpoint,
                connection_id: channel.connection_id
            }
        );

        Ok(())
    }


    /// Close a channel. Packets still in flight over it can be acknowledged or timed out.
    pub fn close_channel(&self, channel_id: &str) -> Result<(), InterfaceError> {

        self.state.lock().channels
            .remove(channel_id)
            .ok_or_else(|| InterfaceError::ChannelNotFound { channel_id: channel_id.to_string() })?;

        info!(interface = %self.address, %channel_id, "channel close");

        Ok(())
    }


    pub fn channel(&self, channel_id: &str) -> Option<IbcChannelInfo> {
        self.state.lock().channels.get(channel_id).cloned()
    }



    // Vault management *********************************************************************************************************

    /// Route the packets addressed to (and acknowledgements destined for) `vault` through the
    /// interface. The vault must have the interface configured as its chain interface.
    pub fn register_vault(&self, vault: Arc<Vault<L>>) -> Result<(), InterfaceError> {

        if vault.chain_interface().as_ref() != Some(&self.address) {
            return Err(InterfaceError::Unauthorized {});
        }

        let vault_address = vault.address().to_string();

        debug!(interface = %self.address, vault = %vault_address, "vault registered");

        self.state.lock().vaults.insert(vault_address, vault);

        Ok(())
    }



    // Outbound packets *********************************************************************************************************

    fn try_next_packet_id(&self, channel_id: &str) -> Result<PacketId, InterfaceError> {

        let state = self.state.lock();

        state.channel(channel_id)?;

        Ok(PacketId::new(channel_id, state.next_sequence(channel_id)))
    }


    fn try_send_cross_chain_asset(
        &self,
        sender: &Addr,
        block: &BlockInfo,
        packet_id: &PacketId,
        msg: SendCrossChainAssetMsg
    ) -> Result<(), InterfaceError> {

        let to_vault = CatalystEncodedAddress::try_from(&msg.to_vault)?;
        let to_account = CatalystEncodedAddress::try_from(&msg.to_account)?;
        let from_asset = CatalystEncodedAddress::try_encode(msg.from_asset.as_bytes())?;

        self.try_emit_packet(
            sender,
            block,
            packet_id,
            &msg.channel_id,
            msg.u,
            |from_vault, source_channel, sequence| {
                CatalystV1Packet::SendAsset(CatalystV1SendAssetPayload {
                    from_vault,
                    to_vault,
                    to_account,
                    u: msg.u,
                    to_asset_index: msg.to_asset_index,
                    min_out: msg.min_out,
                    from_amount: U256::new(msg.from_amount.u128()),
                    from_asset,
                    block_number: msg.block_number,
                    source_channel,
                    sequence
                })
            }
        )
    }


    fn try_send_cross_chain_liquidity(
        &self,
        sender: &Addr,
        block: &BlockInfo,
        packet_id: &PacketId,
        msg: SendCrossChainLiquidityMsg
    ) -> Result<(), InterfaceError> {

        let to_vault = CatalystEncodedAddress::try_from(&msg.to_vault)?;
        let to_account = CatalystEncodedAddress::try_from(&msg.to_account)?;

        self.try_emit_packet(
            sender,
            block,
            packet_id,
            &msg.channel_id,
            msg.u,
            |from_vault, source_channel, sequence| {
                CatalystV1Packet::SendLiquidity(CatalystV1SendLiquidityPayload {
                    from_vault,
                    to_vault,
                    to_account,
                    u: msg.u,
                    min_vault_tokens: msg.min_vault_tokens,
                    min_reference_asset: msg.min_reference_asset,
                    from_amount: U256::new(msg.from_amount.u128()),
                    block_number: msg.block_number,
                    source_channel,
                    sequence
                })
            }
        )
    }


    /// Hand the packet built by `build_payload` to the relay under `packet_id`, which must be
    /// the next packet id of `channel_id`.
    fn try_emit_packet(
        &self,
        sender: &Addr,
        block: &BlockInfo,
        packet_id: &PacketId,
        channel_id: &str,
        units: U256,
        build_payload: impl FnOnce(CatalystEncodedAddress, CatalystEncodedAddress, u64) -> CatalystV1Packet
    ) -> Result<(), InterfaceError> {

        let mut state = self.state.lock();

        if !state.vaults.contains_key(sender.as_str()) {
            return Err(InterfaceError::VaultNotRegistered { vault: sender.to_string() });
        }

        let channel = state.channel(channel_id)?.clone();

        let sequence = state.next_sequence(channel_id);
        if packet_id.channel_id != channel_id || packet_id.sequence != sequence {
            return Err(InterfaceError::SequenceMismatch {
                channel_id: channel_id.to_string(),
                expected: sequence,
                actual: packet_id.sequence
            });
        }

        let payload = build_payload(
            CatalystEncodedAddress::try_encode(sender.as_bytes())?,
            CatalystEncodedAddress::try_encode(channel_id.as_bytes())?,
            sequence
        );

        let packet = IbcPacket::new(
            payload.encode(),
            channel.endpoint,
            channel.counterparty_endpoint,
            sequence,
            IbcTimeout::with_timestamp(block.time.plus_seconds(self.config.default_timeout))
        );

        let relayed_sequence = self.relay.send_packet(&packet)?;
        if relayed_sequence != sequence {
            error!(interface = %self.address, %packet_id, relayed_sequence, "relay sequence mismatch");
            return Err(InterfaceError::SequenceMismatch {
                channel_id: channel_id.to_string(),
                expected: sequence,
                actual: relayed_sequence
            });
        }

        state.next_sequences.insert(channel_id.to_string(), sequence + 1);
        state.sent_packets.insert(
            packet_id.clone(),
            PacketRecord {
                packet,
                state: PacketState::Sent
            }
        );

        info!(interface = %self.address, vault = %sender, %packet_id, %units, "packet sent");

        Ok(())
    }


    pub fn packet_state(&self, packet_id: &PacketId) -> Option<PacketState> {
        self.state.lock().sent_packets
            .get(packet_id)
            .map(|record| record.state)
    }



    // Inbound packets **********************************************************************************************************

    /// Handle the reception of a packet, returning the acknowledgement to relay back.
    ///
    /// Any failure of the swap itself (malformed payload, unknown vault, insufficient return, ...)
    /// results in a failure acknowledgement, as does a payload whose packet id does not match the
    /// packet carrying it. Only packets that cannot be accepted at all (unknown channel, replays)
    /// result in an error.
    ///
    pub fn on_packet_receive(
        &self,
        block: &BlockInfo,
        packet: &IbcPacket
    ) -> Result<Binary, InterfaceError> {

        let packet_id = PacketId::new(packet.dest.channel_id.clone(), packet.sequence);

        {
            let mut state = self.state.lock();

            state.channel(&packet.dest.channel_id)?;

            if !state.received_packets.insert(packet_id.clone()) {
                warn!(interface = %self.address, %packet_id, "replayed packet rejected");
                return Err(InterfaceError::DuplicatePacket { packet_id });
            }
        }

        match self.execute_receive(block, packet) {
            Ok(out) => {
                info!(interface = %self.address, %packet_id, %out, "packet received");
                Ok(ack_success())
            },
            Err(err) => {
                warn!(interface = %self.address, %packet_id, error = %err, "packet execution failed");
                Ok(ack_fail())
            }
        }
    }


    fn execute_receive(
        &self,
        block: &BlockInfo,
        packet: &IbcPacket
    ) -> Result<Uint128, InterfaceError> {

        let payload = CatalystV1Packet::try_decode(&packet.data)?;

        // The payload must have been issued for the packet that carries it
        let packet_id = PacketId::new(packet.src.channel_id.clone(), packet.sequence);
        let payload_packet_id = payload.packet_id()?;
        if payload_packet_id != packet_id {
            warn!(interface = %self.address, %packet_id, %payload_packet_id, "payload packet id mismatch");
            return Err(InterfaceError::PacketIdMismatch { packet_id, payload_packet_id });
        }

        let vault = self.state.lock().vault(&payload.to_vault().try_decode_as_string()?)?;

        match payload {
            CatalystV1Packet::SendAsset(payload) => self.execute_receive_asset(&vault, block, packet, payload),
            CatalystV1Packet::SendLiquidity(payload) => self.execute_receive_liquidity(&vault, block, packet, payload)
        }
    }


    fn execute_receive_asset(
        &self,
        vault: &Vault<L>,
        block: &BlockInfo,
        packet: &IbcPacket,
        payload: CatalystV1SendAssetPayload
    ) -> Result<Uint128, InterfaceError> {

        let response = vault.receive_asset(
            &self.address,
            block,
            ReceiveAssetMsg {
                channel_id: packet.dest.channel_id.clone(),
                from_vault: payload.from_vault.to_binary(),
                to_asset_index: payload.to_asset_index,
                to_account: payload.to_account.try_decode_as_string()?,
                u: payload.u,
                min_out: uint128_from_payload(payload.min_out)?,
                from_amount: payload.from_amount,
                from_asset: payload.from_asset.to_binary(),
                from_block_number_mod: payload.block_number
            }
        )?;

        Ok(response.data)
    }


    fn execute_receive_liquidity(
        &self,
        vault: &Vault<L>,
        block: &BlockInfo,
        packet: &IbcPacket,
        payload: CatalystV1SendLiquidityPayload
    ) -> Result<Uint128, InterfaceError> {

        let response = vault.receive_liquidity(
            &self.address,
            block,
            ReceiveLiquidityMsg {
                channel_id: packet.dest.channel_id.clone(),
                from_vault: payload.from_vault.to_binary(),
                to_account: payload.to_account.try_decode_as_string()?,
                u: payload.u,
                min_vault_tokens: uint128_from_payload(payload.min_vault_tokens)?,
                min_reference_asset: uint128_from_payload(payload.min_reference_asset)?,
                from_amount: payload.from_amount,
                from_block_number_mod: payload.block_number
            }
        )?;

        Ok(response.data)
    }



    // Packet resolution ********************************************************************************************************

    /// Handle the acknowledgement of an outbound packet.
    ///
    /// # Arguments:
    /// * `packet` - The acknowledged packet, as originally sent.
    /// * `ack` - The acknowledgement data.
    ///
    pub fn on_acknowledgement(
        &self,
        packet: &IbcPacket,
        ack: &[u8]
    ) -> Result<VaultResponse, InterfaceError> {

        let success = is_ack_success(ack);

        self.resolve_packet(packet, success, PacketState::Acknowledged { success })
    }


    /// Handle the timeout of an outbound packet. The swap is rolled back.
    pub fn on_timeout(
        &self,
        packet: &IbcPacket
    ) -> Result<VaultResponse, InterfaceError> {

        self.resolve_packet(packet, false, PacketState::TimedOut)
    }


    fn resolve_packet(
        &self,
        packet: &IbcPacket,
        success: bool,
        final_state: PacketState
    ) -> Result<VaultResponse, InterfaceError> {

        let packet_id = PacketId::new(packet.src.channel_id.clone(), packet.sequence);

        let (vault, payload) = {
            let state = self.state.lock();

            let record = state.sent_packets
                .get(&packet_id)
                .filter(|record| record.state == PacketState::Sent)
                .ok_or_else(|| {
                    warn!(interface = %self.address, %packet_id, state = ?final_state, "unknown or resolved packet");
                    InterfaceError::UnknownOrResolvedPacket { packet_id: packet_id.clone() }
                })?;

            if record.packet != *packet {
                warn!(interface = %self.address, %packet_id, "delivered packet does not match the sent packet");
                return Err(InterfaceError::PacketMismatch {});
            }

            let payload = CatalystV1Packet::try_decode(&record.packet.data)?;
            let vault = state.vault(&payload.from_vault().try_decode_as_string()?)?;

            (vault, payload)
        };

        let response = match payload {
            CatalystV1Packet::SendAsset(payload) => {
                let ack_msg = SendAssetAckMsg {
                    packet_id: packet_id.clone(),
                    to_account: payload.to_account.to_binary(),
                    u: payload.u,
                    escrow_amount: uint128_from_payload(payload.from_amount)?,
                    asset_ref: payload.from_asset.try_decode_as_string()?,
                    block_number_mod: payload.block_number
                };
                match success {
                    true => vault.on_send_asset_success(&self.address, ack_msg)?,
                    false => vault.on_send_asset_failure(&self.address, ack_msg)?
                }
            },
            CatalystV1Packet::SendLiquidity(payload) => {
                let ack_msg = SendLiquidityAckMsg {
                    packet_id: packet_id.clone(),
                    to_account: payload.to_account.to_binary(),
                    u: payload.u,
                    escrow_amount: uint128_from_payload(payload.from_amount)?,
                    block_number_mod: payload.block_number
                };
                match success {
                    true => vault.on_send_liquidity_success(&self.address, ack_msg)?,
                    false => vault.on_send_liquidity_failure(&self.address, ack_msg)?
                }
            }
        };

        let mut state = self.state.lock();
        match state.sent_packets.get_mut(&packet_id) {
            Some(record) if record.state == PacketState::Sent => {
                record.state = final_state;
            },
            _ => {
                error!(interface = %self.address, %packet_id, "packet resolved concurrently");
                return Err(InterfaceError::UnknownOrResolvedPacket { packet_id });
            }
        }

        info!(interface = %self.address, %packet_id, state = ?final_state, "packet resolved");

        Ok(response)
    }
}


impl<L: AssetLedger, R: PacketRelay> ChainInterface for CatalystInterface<L, R> {

    fn address(&self) -> &Addr {
        &self.address
    }

    fn next_packet_id(&self, channel_id: &str) -> Result<PacketId, ContractError> {
        Ok(self.try_next_packet_id(channel_id)?)
    }

    fn send_cross_chain_asset(
        &self,
        sender: &Addr,
        block: &BlockInfo,
        packet_id: &PacketId,
        msg: SendCrossChainAssetMsg
    ) -> Result<(), ContractError> {
        Ok(self.try_send_cross_chain_asset(sender, block, packet_id, msg)?)
    }

    fn send_cross_chain_liquidity(
        &self,
        sender: &Addr,
        block: &BlockInfo,
        packet_id: &PacketId,
        msg: SendCrossChainLiquidityMsg
    ) -> Result<(), ContractError> {
        Ok(self.try_send_cross_chain_liquidity(sender, block, packet_id, msg)?)
    }
}


fn uint128_from_payload(value: U256) -> Result<Uint128, InterfaceError> {
    u128::try_from(value)
        .map(Uint128::new)
        .map_err(|_| InterfaceError::PayloadDecodingError {})
}
