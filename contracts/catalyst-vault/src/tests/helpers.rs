use std::{collections::HashMap, sync::Arc};

use cosmwasm_std::{Addr, Binary, BlockInfo, Timestamp, Uint128, Uint64};
use fixed_point_math::U256;
use parking_lot::Mutex;
use test_helpers::{
    asset::{fund_and_approve, mock_ledger},
    definitions::{
        CHANNEL_ID, FEE_ADMINISTRATOR, GOVERNANCE, SETUP_MASTER, VAULT_TOKEN_NAME,
        VAULT_TOKEN_SYMBOL, DEPOSITOR, CHAIN_INTERFACE
    },
    misc::encode_payload_address
};
use vault_assets::MemoryLedger;

use crate::{
    chain_interface::ChainInterface,
    error::ContractError,
    escrow::PacketId,
    msg::{
        InitializeSwapCurvesMsg, InstantiateMsg, ReceiveAssetMsg, ReceiveLiquidityMsg, SendAssetAckMsg,
        SendAssetMsg, SendAssetResponse, SendCrossChainAssetMsg, SendCrossChainLiquidityMsg,
        SendLiquidityAckMsg, SendLiquidityMsg, SendLiquidityResponse, VaultResponse
    },
    vault::Vault
};

use super::parameters::{TEST_VAULT_ASSETS, TEST_VAULT_BALANCES, TEST_VAULT_WEIGHTS};

pub type TestVault = Vault<MemoryLedger>;

pub const VAULT_ADDR: &str = "vault_addr";
pub const REMOTE_VAULT_ADDR: &str = "remote_vault_addr";


pub fn mock_block(height: u64, seconds: u64) -> BlockInfo {
    BlockInfo {
        height,
        time: Timestamp::from_seconds(seconds),
        chain_id: "catalyst-test".to_string()
    }
}

pub fn remote_vault() -> Binary {
    encode_payload_address(REMOTE_VAULT_ADDR.as_bytes())
}

pub fn remote_account(account: &str) -> Binary {
    encode_payload_address(account.as_bytes())
}



// Chain interface mock

/// Records the cross chain swaps emitted by a vault instead of relaying them.
pub struct MockChainInterface {
    address: Addr,
    sequences: Mutex<HashMap<String, u64>>,
    sent: Mutex<Vec<(PacketId, SendCrossChainAssetMsg)>>,
    sent_liquidity: Mutex<Vec<(PacketId, SendCrossChainLiquidityMsg)>>,
    fail: Mutex<bool>
}

impl MockChainInterface {

    pub fn new(address: &str) -> Self {
        Self {
            address: Addr::unchecked(address),
            sequences: Mutex::new(HashMap::new()),
            sent: Mutex::new(vec![]),
            sent_liquidity: Mutex::new(vec![]),
            fail: Mutex::new(false)
        }
    }

    /// Make every following send fail.
    pub fn set_failing(&self, fail: bool) {
        *self.fail.lock() = fail;
    }

    /// Advance the channel sequence, as if another vault had sent a packet.
    pub fn bump_sequence(&self, channel_id: &str) {
        *self.sequences.lock().entry(channel_id.to_string()).or_insert(1) += 1;
    }

    pub fn sent(&self) -> Vec<(PacketId, SendCrossChainAssetMsg)> {
        self.sent.lock().clone()
    }

    pub fn sent_liquidity(&self) -> Vec<(PacketId, SendCrossChainLiquidityMsg)> {
        self.sent_liquidity.lock().clone()
    }

    // Take the channel sequence of `packet_id`, as a relaying interface would.
    fn take_sequence(&self, packet_id: &PacketId) -> Result<(), ContractError> {

        if *self.fail.lock() {
            return Err(ContractError::ChainInterface { reason: "mock failure".to_string() });
        }

        let mut sequences = self.sequences.lock();
        let sequence = sequences.entry(packet_id.channel_id.clone()).or_insert(1);
        if *sequence != packet_id.sequence {
            return Err(ContractError::ChainInterface { reason: "sequence mismatch".to_string() });
        }
        *sequence += 1;

        Ok(())
    }
}

impl ChainInterface for MockChainInterface {

    fn address(&self) -> &Addr {
        &self.address
    }

    fn next_packet_id(&self, channel_id: &str) -> Result<PacketId, ContractError> {
        let sequence = self.sequences.lock()
            .get(channel_id)
            .copied()
            .unwrap_or(1);
        Ok(PacketId::new(channel_id, sequence))
    }

    fn send_cross_chain_asset(
        &self,
        _sender: &Addr,
        _block: &BlockInfo,
        packet_id: &PacketId,
        msg: SendCrossChainAssetMsg
    ) -> Result<(), ContractError> {
        self.take_sequence(packet_id)?;
        self.sent.lock().push((packet_id.clone(), msg));
        Ok(())
    }

    fn send_cross_chain_liquidity(
        &self,
        _sender: &Addr,
        _block: &BlockInfo,
        packet_id: &PacketId,
        msg: SendCrossChainLiquidityMsg
    ) -> Result<(), ContractError> {
        self.take_sequence(packet_id)?;
        self.sent_liquidity.lock().push((packet_id.clone(), msg));
        Ok(())
    }
}



// Vault management helpers

pub fn mock_instantiate_msg(
    chain_interface: Option<String>,
    vault_fee: Uint64,
    governance_fee_share: Uint64
) -> InstantiateMsg {
    InstantiateMsg {
        name: VAULT_TOKEN_NAME.to_string(),
        symbol: VAULT_TOKEN_SYMBOL.to_string(),
        chain_interface,
        vault_fee,
        governance_fee_share,
        fee_administrator: FEE_ADMINISTRATOR.to_string(),
        setup_master: SETUP_MASTER.to_string(),
        governance_account: GOVERNANCE.to_string()
    }
}


pub fn mock_instantiate_vault(
    ledger: Arc<MemoryLedger>,
    chain_interface: Option<&str>,
    vault_fee: Uint64,
    governance_fee_share: Uint64
) -> TestVault {
    Vault::instantiate(
        Addr::unchecked(VAULT_ADDR),
        ledger,
        mock_instantiate_msg(
            chain_interface.map(str::to_string),
            vault_fee,
            governance_fee_share
        )
    ).unwrap()
}


/// Fund the vault and initialize its swap curves.
pub fn mock_initialize_vault(
    vault: &TestVault,
    assets: &[&str],
    balances: &[Uint128],
    weights: &[Uint64],
    amplification: Uint64
) -> Result<(), ContractError> {

    for (asset, balance) in assets.iter().zip(balances) {
        vault.ledger().mint(asset, vault.address(), *balance)?;
    }

    vault.initialize_swap_curves(
        &Addr::unchecked(SETUP_MASTER),
        &mock_block(1, 0),
        InitializeSwapCurvesMsg {
            assets: assets.iter().map(|asset| asset.to_string()).collect(),
            weights: weights.to_vec(),
            amp: amplification,
            depositor: DEPOSITOR.to_string()
        }
    )?;

    Ok(())
}


/// Deploy a fully set up vault over the test assets, connected to `REMOTE_VAULT_ADDR` over
/// `CHANNEL_ID`.
pub fn mock_deploy_vault(
    amplification: Uint64,
    vault_fee: Uint64,
    governance_fee_share: Uint64
) -> (TestVault, MockChainInterface) {

    let ledger = Arc::new(mock_ledger(&TEST_VAULT_ASSETS));
    let interface = MockChainInterface::new(CHAIN_INTERFACE);

    let vault = mock_instantiate_vault(ledger, Some(CHAIN_INTERFACE), vault_fee, governance_fee_share);

    mock_initialize_vault(
        &vault,
        &TEST_VAULT_ASSETS,
        &TEST_VAULT_BALANCES,
        &TEST_VAULT_WEIGHTS,
        amplification
    ).unwrap();

    vault.set_connection(
        &Addr::unchecked(SETUP_MASTER),
        CHANNEL_ID.to_string(),
        remote_vault(),
        true
    ).unwrap();

    vault.finish_setup(&Addr::unchecked(SETUP_MASTER)).unwrap();

    (vault, interface)
}



// Cross chain swap helpers

pub fn mock_send_asset_msg(from_asset: &str, amount: Uint128, swapper: &str) -> SendAssetMsg {
    SendAssetMsg {
        channel_id: CHANNEL_ID.to_string(),
        to_vault: remote_vault(),
        to_account: remote_account(swapper),
        from_asset: from_asset.to_string(),
        to_asset_index: 0,
        amount,
        min_out: U256::ZERO,
        fallback_account: swapper.to_string()
    }
}


/// Fund `swapper` and send `amount` of `from_asset` to the remote vault.
pub fn mock_send_asset(
    vault: &TestVault,
    interface: &MockChainInterface,
    swapper: &str,
    from_asset: &str,
    amount: Uint128,
    block: &BlockInfo
) -> Result<VaultResponse<SendAssetResponse>, ContractError> {

    fund_and_approve(vault.ledger(), from_asset, swapper, vault.address(), amount);

    vault.send_asset(
        interface,
        &Addr::unchecked(swapper),
        block,
        mock_send_asset_msg(from_asset, amount, swapper)
    )
}


/// Build the acknowledgement of a swap sent with `mock_send_asset`.
pub fn mock_ack_msg(
    response: &SendAssetResponse,
    swapper: &str,
    from_asset: &str,
    block: &BlockInfo
) -> SendAssetAckMsg {
    SendAssetAckMsg {
        packet_id: response.packet_id.clone(),
        to_account: remote_account(swapper),
        u: response.units,
        escrow_amount: response.escrow_amount,
        asset_ref: from_asset.to_string(),
        block_number_mod: block.height as u32
    }
}


pub fn mock_receive_asset_msg(
    to_asset_index: u8,
    to_account: &str,
    units: U256,
    min_out: Uint128
) -> ReceiveAssetMsg {
    ReceiveAssetMsg {
        channel_id: CHANNEL_ID.to_string(),
        from_vault: remote_vault(),
        to_asset_index,
        to_account: to_account.to_string(),
        u: units,
        min_out,
        from_amount: U256::new(1000000000000000000u128),
        from_asset: remote_account("remote_asset"),
        from_block_number_mod: 7
    }
}



// Liquidity swap helpers

pub fn mock_send_liquidity_msg(amount: Uint128, owner: &str) -> SendLiquidityMsg {
    SendLiquidityMsg {
        channel_id: CHANNEL_ID.to_string(),
        to_vault: remote_vault(),
        to_account: remote_account(owner),
        amount,
        min_vault_tokens: U256::ZERO,
        min_reference_asset: U256::ZERO,
        fallback_account: owner.to_string()
    }
}


/// Send `amount` of the vault tokens of `owner` to the remote vault.
pub fn mock_send_liquidity(
    vault: &TestVault,
    interface: &MockChainInterface,
    owner: &str,
    amount: Uint128,
    block: &BlockInfo
) -> Result<VaultResponse<SendLiquidityResponse>, ContractError> {
    vault.send_liquidity(
        interface,
        &Addr::unchecked(owner),
        block,
        mock_send_liquidity_msg(amount, owner)
    )
}


/// Build the acknowledgement of a liquidity swap sent with `mock_send_liquidity`.
pub fn mock_liquidity_ack_msg(
    response: &SendLiquidityResponse,
    owner: &str,
    amount: Uint128,
    block: &BlockInfo
) -> SendLiquidityAckMsg {
    SendLiquidityAckMsg {
        packet_id: response.packet_id.clone(),
        to_account: remote_account(owner),
        u: response.units,
        escrow_amount: amount,
        block_number_mod: block.height as u32
    }
}


pub fn mock_receive_liquidity_msg(
    to_account: &str,
    units: U256,
    min_vault_tokens: Uint128,
    min_reference_asset: Uint128
) -> ReceiveLiquidityMsg {
    ReceiveLiquidityMsg {
        channel_id: CHANNEL_ID.to_string(),
        from_vault: remote_vault(),
        to_account: to_account.to_string(),
        u: units,
        min_vault_tokens,
        min_reference_asset,
        from_amount: U256::new(1000000000000000000u128),
        from_block_number_mod: 7
    }
}
