use std::collections::HashMap;
use std::fmt;

use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Addr, Binary, BlockInfo, Timestamp, Uint128};
use fixed_point_math::U256;
use sha3::{Digest, Keccak256};
use tracing::debug;

use crate::error::ContractError;


/// Identifier of a cross chain packet: the channel it was sent over and its sequence number
/// within that channel.
#[cw_serde]
#[derive(Eq, Hash)]
pub struct PacketId {
    pub channel_id: String,
    pub sequence: u64
}

impl PacketId {
    pub fn new(channel_id: impl Into<String>, sequence: u64) -> Self {
        Self {
            channel_id: channel_id.into(),
            sequence
        }
    }
}

impl fmt::Display for PacketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.channel_id, self.sequence)
    }
}


#[cw_serde]
#[derive(Copy, Eq)]
pub enum EscrowState {
    Open,
    Released,
    Refunded
}


#[cw_serde]
pub struct EscrowEntry {
    pub packet_id: PacketId,
    pub asset_ref: String,
    pub amount: Uint128,
    /// The governance share of the swap fee, paid out when the escrow is resolved.
    pub governance_fee: Uint128,
    pub fallback_account: Addr,
    pub send_asset_hash: Binary,
    pub block_height: u64,
    pub timestamp: Timestamp,
    pub state: EscrowState
}


/// Escrow of the vault tokens burnt by an outgoing liquidity swap.
#[cw_serde]
pub struct LiquidityEscrowEntry {
    pub packet_id: PacketId,
    pub amount: Uint128,
    pub fallback_account: Addr,
    pub send_liquidity_hash: Binary,
    pub block_height: u64,
    pub timestamp: Timestamp,
    pub state: EscrowState
}


/// Bookkeeping of the assets (and vault tokens) withheld by a vault pending cross chain
/// confirmation.
///
/// Retention: entries are never pruned. Resolved entries are kept with their terminal state for
/// the lifetime of the ledger, so that late or repeated acknowledgements are always rejected and
/// can be told apart from unknown packets in the logs. Only escrows whose packet was never emitted
/// are removed (see `cancel`). The memory used hence grows with the number of cross chain swaps.
#[derive(Debug, Default)]
pub struct EscrowLedger {
    entries: HashMap<PacketId, EscrowEntry>,
    liquidity_entries: HashMap<PacketId, LiquidityEscrowEntry>,
    total_escrowed: HashMap<String, Uint128>,
    pending_governance_fees: HashMap<String, Uint128>,
    total_escrowed_liquidity: Uint128
}

impl EscrowLedger {

    pub fn new() -> Self {
        Self::default()
    }


    /// Verify that no escrow (of either kind) has ever been created for `packet_id`.
    pub fn check_vacant(&self, packet_id: &PacketId) -> Result<(), ContractError> {
        if self.entries.contains_key(packet_id) || self.liquidity_entries.contains_key(packet_id) {
            return Err(ContractError::DuplicatePacket { packet_id: packet_id.clone() });
        }
        Ok(())
    }



    // Asset escrows ************************************************************************************************************

    /// Create an asset escrow.
    ///
    /// # Arguments:
    /// * `packet_id` - The id under which to create the escrow.
    /// * `asset_ref` - The escrowed asset reference.
    /// * `amount` - The escrow amount.
    /// * `governance_fee` - The governance fee withheld together with the escrow.
    /// * `fallback_account` - The account which to return the escrowed assets to in the case of an unsuccessful swap.
    /// * `send_asset_hash` - The hash of the swap parameters, used to validate the swap acknowledgement.
    /// * `block` - The block at which the escrow is created.
    ///
    pub fn open(
        &mut self,
        packet_id: PacketId,
        asset_ref: &str,
        amount: Uint128,
        governance_fee: Uint128,
        fallback_account: Addr,
        send_asset_hash: Vec<u8>,
        block: &BlockInfo
    ) -> Result<&EscrowEntry, ContractError> {

        self.check_vacant(&packet_id)?;

        let total = self.total_escrowed(asset_ref).checked_add(amount)?;
        let pending_fees = self.pending_governance_fees(asset_ref).checked_add(governance_fee)?;

        self.total_escrowed.insert(asset_ref.to_owned(), total);
        self.pending_governance_fees.insert(asset_ref.to_owned(), pending_fees);

        debug!(%packet_id, asset = asset_ref, %amount, %governance_fee, %fallback_account, "escrow opened");

        let entry = EscrowEntry {
            packet_id: packet_id.clone(),
            asset_ref: asset_ref.to_owned(),
            amount,
            governance_fee,
            fallback_account,
            send_asset_hash: Binary(send_asset_hash),
            block_height: block.height,
            timestamp: block.time,
            state: EscrowState::Open
        };

        Ok(self.entries.entry(packet_id).or_insert(entry))
    }


    /// Remove the open asset escrow of a packet that has not been emitted.
    pub fn cancel(&mut self, packet_id: &PacketId) -> Option<EscrowEntry> {

        if self.entries.get(packet_id)?.state != EscrowState::Open {
            return None;
        }

        let entry = self.entries.remove(packet_id)?;
        self.release_totals(&entry);

        debug!(%packet_id, "escrow cancelled");

        Some(entry)
    }


    /// Release an escrow after a successful swap. The escrowed assets remain with the vault,
    /// the caller must pay out the entry's governance fee.
    pub fn resolve_success(
        &mut self,
        packet_id: &PacketId,
        send_asset_hash: &[u8]
    ) -> Result<EscrowEntry, ContractError> {
        self.resolve(packet_id, send_asset_hash, EscrowState::Released)
    }


    /// Release an escrow after an unsuccessful swap. The caller must return the escrowed assets
    /// to the entry's fallback account and pay out the entry's governance fee.
    pub fn resolve_failure(
        &mut self,
        packet_id: &PacketId,
        send_asset_hash: &[u8]
    ) -> Result<EscrowEntry, ContractError> {
        self.resolve(packet_id, send_asset_hash, EscrowState::Refunded)
    }


    /// Get the open escrow of `packet_id`, verifying that it describes the swap fingerprinted
    /// by `send_asset_hash`.
    pub fn get_open(
        &self,
        packet_id: &PacketId,
        send_asset_hash: &[u8]
    ) -> Result<&EscrowEntry, ContractError> {

        let entry = self.entries
            .get(packet_id)
            .filter(|entry| entry.state == EscrowState::Open)
            .ok_or_else(|| ContractError::UnknownOrResolvedPacket { packet_id: packet_id.clone() })?;

        if entry.send_asset_hash.as_slice() != send_asset_hash {
            return Err(ContractError::EscrowMismatch { packet_id: packet_id.clone() });
        }

        Ok(entry)
    }


    fn resolve(
        &mut self,
        packet_id: &PacketId,
        send_asset_hash: &[u8],
        final_state: EscrowState
    ) -> Result<EscrowEntry, ContractError> {

        let entry = self.get_open(packet_id, send_asset_hash)?.clone();

        self.release_totals(&entry);

        let stored_entry = self.entries
            .get_mut(packet_id)
            .ok_or_else(|| ContractError::UnknownOrResolvedPacket { packet_id: packet_id.clone() })?;
        stored_entry.state = final_state;

        debug!(%packet_id, state = ?final_state, amount = %entry.amount, "escrow resolved");

        Ok(stored_entry.clone())
    }


    // The totals always include the open entries, hence the subtractions never saturate.
    fn release_totals(&mut self, entry: &EscrowEntry) {
        if let Some(total) = self.total_escrowed.get_mut(&entry.asset_ref) {
            *total = total.saturating_sub(entry.amount);
        }
        if let Some(pending_fees) = self.pending_governance_fees.get_mut(&entry.asset_ref) {
            *pending_fees = pending_fees.saturating_sub(entry.governance_fee);
        }
    }


    pub fn get(&self, packet_id: &PacketId) -> Option<&EscrowEntry> {
        self.entries.get(packet_id)
    }


    /// Sum of the open escrow amounts of an asset.
    pub fn total_escrowed(&self, asset_ref: &str) -> Uint128 {
        self.total_escrowed
            .get(asset_ref)
            .copied()
            .unwrap_or_default()
    }


    /// Sum of the governance fees of an asset withheld by the open escrows.
    pub fn pending_governance_fees(&self, asset_ref: &str) -> Uint128 {
        self.pending_governance_fees
            .get(asset_ref)
            .copied()
            .unwrap_or_default()
    }


    pub fn open_entries(&self) -> impl Iterator<Item = &EscrowEntry> {
        self.entries
            .values()
            .filter(|entry| entry.state == EscrowState::Open)
    }



    // Liquidity escrows ********************************************************************************************************

    /// Create a liquidity escrow for the `amount` of vault tokens burnt by a liquidity swap.
    pub fn open_liquidity(
        &mut self,
        packet_id: PacketId,
        amount: Uint128,
        fallback_account: Addr,
        send_liquidity_hash: Vec<u8>,
        block: &BlockInfo
    ) -> Result<&LiquidityEscrowEntry, ContractError> {

        self.check_vacant(&packet_id)?;

        self.total_escrowed_liquidity = self.total_escrowed_liquidity.checked_add(amount)?;

        debug!(%packet_id, %amount, %fallback_account, "liquidity escrow opened");

        let entry = LiquidityEscrowEntry {
            packet_id: packet_id.clone(),
            amount,
            fallback_account,
            send_liquidity_hash: Binary(send_liquidity_hash),
            block_height: block.height,
            timestamp: block.time,
            state: EscrowState::Open
        };

        Ok(self.liquidity_entries.entry(packet_id).or_insert(entry))
    }


    /// Remove the open liquidity escrow of a packet that has not been emitted.
    pub fn cancel_liquidity(&mut self, packet_id: &PacketId) -> Option<LiquidityEscrowEntry> {

        if self.liquidity_entries.get(packet_id)?.state != EscrowState::Open {
            return None;
        }

        let entry = self.liquidity_entries.remove(packet_id)?;
        self.total_escrowed_liquidity = self.total_escrowed_liquidity.saturating_sub(entry.amount);

        debug!(%packet_id, "liquidity escrow cancelled");

        Some(entry)
    }


    /// Get the open liquidity escrow of `packet_id`, verifying that it describes the swap
    /// fingerprinted by `send_liquidity_hash`.
    pub fn get_open_liquidity(
        &self,
        packet_id: &PacketId,
        send_liquidity_hash: &[u8]
    ) -> Result<&LiquidityEscrowEntry, ContractError> {

        let entry = self.liquidity_entries
            .get(packet_id)
            .filter(|entry| entry.state == EscrowState::Open)
            .ok_or_else(|| ContractError::UnknownOrResolvedPacket { packet_id: packet_id.clone() })?;

        if entry.send_liquidity_hash.as_slice() != send_liquidity_hash {
            return Err(ContractError::EscrowMismatch { packet_id: packet_id.clone() });
        }

        Ok(entry)
    }


    /// Release a liquidity escrow. On failure (`Refunded`) the caller must mint the escrowed
    /// vault tokens for the entry's fallback account.
    pub fn resolve_liquidity(
        &mut self,
        packet_id: &PacketId,
        send_liquidity_hash: &[u8],
        final_state: EscrowState
    ) -> Result<LiquidityEscrowEntry, ContractError> {

        let amount = self.get_open_liquidity(packet_id, send_liquidity_hash)?.amount;

        self.total_escrowed_liquidity = self.total_escrowed_liquidity.checked_sub(amount)?;

        let entry = self.liquidity_entries
            .get_mut(packet_id)
            .ok_or_else(|| ContractError::UnknownOrResolvedPacket { packet_id: packet_id.clone() })?;
        entry.state = final_state;

        debug!(%packet_id, state = ?final_state, %amount, "liquidity escrow resolved");

        Ok(entry.clone())
    }


    pub fn get_liquidity(&self, packet_id: &PacketId) -> Option<&LiquidityEscrowEntry> {
        self.liquidity_entries.get(packet_id)
    }


    /// Sum of the vault tokens held by the open liquidity escrows.
    pub fn total_escrowed_liquidity(&self) -> Uint128 {
        self.total_escrowed_liquidity
    }
}


fn calc_keccak256(bytes: Vec<u8>) -> Vec<u8> {
    let mut hasher = Keccak256::new();
    hasher.update(bytes);
    hasher.finalize().to_vec()
}


/// Compute the hash of an asset swap.
///
/// # Arguments:
/// * `to_account` - The recipient of the swap output.
/// * `u` - The units value of the swap.
/// * `escrow_amount` - The escrowed asset amount.
/// * `asset_ref` - The swap source asset reference.
/// * `block_number_mod` - The block number at which the swap was committed (modulo 2^32).
///
pub fn compute_send_asset_hash(
    to_account: &[u8],
    u: U256,
    escrow_amount: Uint128,
    asset_ref: &str,
    block_number_mod: u32
) -> Vec<u8> {

    let asset_bytes = asset_ref.as_bytes();

    let mut hash_data: Vec<u8> = Vec::with_capacity(
        to_account.len()
            + 32
            + 16
            + asset_bytes.len()
            + 4
    );

    hash_data.extend_from_slice(to_account);
    hash_data.extend_from_slice(&u.to_be_bytes());
    hash_data.extend_from_slice(&escrow_amount.to_be_bytes());
    hash_data.extend_from_slice(asset_bytes);
    hash_data.extend_from_slice(&block_number_mod.to_be_bytes());

    calc_keccak256(hash_data)
}


/// Compute the hash of a liquidity swap.
///
/// # Arguments:
/// * `to_account` - The recipient of the swap output.
/// * `u` - The units value of the swap.
/// * `escrow_amount` - The escrowed vault token amount.
/// * `block_number_mod` - The block number at which the swap was committed (modulo 2^32).
///
pub fn compute_send_liquidity_hash(
    to_account: &[u8],
    u: U256,
    escrow_amount: Uint128,
    block_number_mod: u32
) -> Vec<u8> {

    let mut hash_data: Vec<u8> = Vec::with_capacity(
        to_account.len()
            + 32
            + 16
            + 4
    );

    hash_data.extend_from_slice(to_account);
    hash_data.extend_from_slice(&u.to_be_bytes());
    hash_data.extend_from_slice(&escrow_amount.to_be_bytes());
    hash_data.extend_from_slice(&block_number_mod.to_be_bytes());

    calc_keccak256(hash_data)
}
