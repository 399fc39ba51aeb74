#![allow(dead_code)]

use std::sync::Arc;

use catalyst_interface::{
    ibc::CATALYST_V1_CHANNEL_VERSION,
    msg::InterfaceConfig,
    relay::{PacketRelay, RelayError},
    CatalystInterface, InterfaceError
};
use catalyst_vault::{
    msg::{
        InitializeSwapCurvesMsg, InstantiateMsg, SendAssetMsg, SendAssetResponse, SendLiquidityMsg,
        SendLiquidityResponse, VaultResponse
    },
    ContractError, Vault
};
use cosmwasm_std::{
    Addr, Binary, BlockInfo, IbcChannel, IbcEndpoint, IbcOrder, IbcPacket, Timestamp, Uint128, Uint64
};
use fixed_point_math::U256;
use parking_lot::Mutex;
use test_helpers::{
    asset::{fund_and_approve, mock_ledger},
    definitions::{
        CHANNEL_ID, COUNTERPARTY_CHANNEL_ID, DEPOSITOR, FEE_ADMINISTRATOR, GOVERNANCE, PORT_ID,
        SETUP_MASTER, VAULT_TOKEN_NAME, VAULT_TOKEN_SYMBOL
    },
    misc::encode_payload_address,
    packet_queue::PacketQueue
};
use vault_assets::MemoryLedger;

pub type TestInterface = CatalystInterface<MemoryLedger, QueueRelay>;

pub const VAULT_A           : &str = "vault_a_addr";
pub const VAULT_B           : &str = "vault_b_addr";
pub const INTERFACE_A       : &str = "interface_a_addr";
pub const INTERFACE_B       : &str = "interface_b_addr";

pub const TEST_ASSETS       : [&str; 2] = ["asset_x", "asset_y"];
pub const TEST_BALANCES     : [Uint128; 2] = [
    Uint128::new(1000000000000000000000u128),       // 1000e18
    Uint128::new(1000000000000000000000u128)        // 1000e18
];
pub const TEST_WEIGHTS      : [Uint64; 2] = [Uint64::new(1u64), Uint64::new(1u64)];

pub const VOLATILE_AMPLIFICATION : Uint64 = Uint64::new(1000000000000000000u64);     // 1e18
pub const AMPLIFICATION     : Uint64 = Uint64::new(900000000000000000u64);           // 0.9e18

pub const DEFAULT_TIMEOUT   : u64 = 3600;


pub fn mock_block(height: u64, seconds: u64) -> BlockInfo {
    BlockInfo {
        height,
        time: Timestamp::from_seconds(seconds),
        chain_id: "catalyst-test".to_string()
    }
}

pub fn mock_channel(channel_id: &str, counterparty_channel_id: &str, version: &str) -> IbcChannel {
    IbcChannel::new(
        IbcEndpoint { port_id: PORT_ID.to_string(), channel_id: channel_id.to_string() },
        IbcEndpoint { port_id: PORT_ID.to_string(), channel_id: counterparty_channel_id.to_string() },
        IbcOrder::Unordered,
        version,
        "connection-0"
    )
}

pub fn encoded(address: &str) -> Binary {
    encode_payload_address(address.as_bytes())
}



// Relay mock

/// Buffers the sent packets until the test delivers them.
#[derive(Default)]
pub struct QueueRelay {
    queue: PacketQueue,
    failing: Mutex<bool>
}

impl QueueRelay {

    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following send fail.
    pub fn set_failing(&self, failing: bool) {
        *self.failing.lock() = failing;
    }

    pub fn pop(&self) -> Option<IbcPacket> {
        self.queue.pop()
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}

impl PacketRelay for QueueRelay {

    fn send_packet(&self, packet: &IbcPacket) -> Result<u64, RelayError> {

        if *self.failing.lock() {
            return Err(RelayError::Unavailable {});
        }

        self.queue.push(packet.clone());
        Ok(packet.sequence)
    }
}



// Two chain environment

pub struct TestChain {
    pub ledger: Arc<MemoryLedger>,
    pub relay: Arc<QueueRelay>,
    pub interface: TestInterface,
    pub vault: Arc<Vault<MemoryLedger>>
}

impl TestChain {

    /// Deploy a vault over the test assets behind its own interface, connected to `remote_vault`
    /// over `channel_id`.
    pub fn deploy(
        vault_address: &str,
        interface_address: &str,
        channel_id: &str,
        counterparty_channel_id: &str,
        remote_vault: &str,
        amplification: Uint64,
        vault_fee: Uint64,
        governance_fee_share: Uint64
    ) -> Self {

        let ledger = Arc::new(mock_ledger(&TEST_ASSETS));
        let relay = Arc::new(QueueRelay::new());

        let interface = CatalystInterface::new(
            Addr::unchecked(interface_address),
            InterfaceConfig {
                port_id: PORT_ID.to_string(),
                default_timeout: DEFAULT_TIMEOUT
            },
            relay.clone()
        );

        interface.open_channel(
            mock_channel(channel_id, counterparty_channel_id, CATALYST_V1_CHANNEL_VERSION),
            Some(CATALYST_V1_CHANNEL_VERSION)
        ).unwrap();

        let vault = Vault::instantiate(
            Addr::unchecked(vault_address),
            ledger.clone(),
            InstantiateMsg {
                name: VAULT_TOKEN_NAME.to_string(),
                symbol: VAULT_TOKEN_SYMBOL.to_string(),
                chain_interface: Some(interface_address.to_string()),
                vault_fee,
                governance_fee_share,
                fee_administrator: FEE_ADMINISTRATOR.to_string(),
                setup_master: SETUP_MASTER.to_string(),
                governance_account: GOVERNANCE.to_string()
            }
        ).unwrap();

        for (asset, balance) in TEST_ASSETS.iter().zip(TEST_BALANCES) {
            ledger.mint(asset, vault.address(), balance).unwrap();
        }

        let setup_master = Addr::unchecked(SETUP_MASTER);

        vault.initialize_swap_curves(
            &setup_master,
            &mock_block(1, 0),
            InitializeSwapCurvesMsg {
                assets: TEST_ASSETS.iter().map(|asset| asset.to_string()).collect(),
                weights: TEST_WEIGHTS.to_vec(),
                amp: amplification,
                depositor: DEPOSITOR.to_string()
            }
        ).unwrap();

        vault.set_connection(&setup_master, channel_id.to_string(), encoded(remote_vault), true).unwrap();
        vault.finish_setup(&setup_master).unwrap();

        let vault = Arc::new(vault);
        interface.register_vault(vault.clone()).unwrap();

        Self {
            ledger,
            relay,
            interface,
            vault
        }
    }


    pub fn balance(&self, asset: &str, account: &str) -> Uint128 {
        test_helpers::asset::query_balance(self.ledger.as_ref(), asset, account)
    }
}


/// Two chains whose vaults are connected with each other: chain A reaches chain B over
/// `CHANNEL_ID`, chain B reaches chain A over `COUNTERPARTY_CHANNEL_ID`.
pub struct TestEnv {
    pub chain_a: TestChain,
    pub chain_b: TestChain
}

impl TestEnv {

    pub fn new(amplification: Uint64, vault_fee: Uint64, governance_fee_share: Uint64) -> Self {
        Self {
            chain_a: TestChain::deploy(
                VAULT_A,
                INTERFACE_A,
                CHANNEL_ID,
                COUNTERPARTY_CHANNEL_ID,
                VAULT_B,
                amplification,
                vault_fee,
                governance_fee_share
            ),
            chain_b: TestChain::deploy(
                VAULT_B,
                INTERFACE_B,
                COUNTERPARTY_CHANNEL_ID,
                CHANNEL_ID,
                VAULT_A,
                amplification,
                vault_fee,
                governance_fee_share
            )
        }
    }

    /// Zero fee volatile environment.
    pub fn volatile() -> Self {
        Self::new(VOLATILE_AMPLIFICATION, Uint64::zero(), Uint64::zero())
    }


    /// Fund `swapper` on chain A and swap `amount` of `from_asset` to the asset at
    /// `to_asset_index` on chain B.
    pub fn send_asset(
        &self,
        swapper: &str,
        from_asset: &str,
        amount: Uint128,
        to_asset_index: u8,
        min_out: U256,
        block: &BlockInfo
    ) -> Result<VaultResponse<SendAssetResponse>, ContractError> {

        let chain_a = &self.chain_a;

        fund_and_approve(&chain_a.ledger, from_asset, swapper, chain_a.vault.address(), amount);

        chain_a.vault.send_asset(
            &chain_a.interface,
            &Addr::unchecked(swapper),
            block,
            SendAssetMsg {
                channel_id: CHANNEL_ID.to_string(),
                to_vault: encoded(VAULT_B),
                to_account: encoded(swapper),
                from_asset: from_asset.to_string(),
                to_asset_index,
                amount,
                min_out,
                fallback_account: swapper.to_string()
            }
        )
    }


    /// Swap `amount` of the chain A vault tokens of `owner` for vault tokens of chain B.
    pub fn send_liquidity(
        &self,
        owner: &str,
        amount: Uint128,
        min_vault_tokens: U256,
        block: &BlockInfo
    ) -> Result<VaultResponse<SendLiquidityResponse>, ContractError> {

        let chain_a = &self.chain_a;

        chain_a.vault.send_liquidity(
            &chain_a.interface,
            &Addr::unchecked(owner),
            block,
            SendLiquidityMsg {
                channel_id: CHANNEL_ID.to_string(),
                to_vault: encoded(VAULT_B),
                to_account: encoded(owner),
                amount,
                min_vault_tokens,
                min_reference_asset: U256::ZERO,
                fallback_account: owner.to_string()
            }
        )
    }


    /// Deliver the next in-flight packet of chain A to chain B.
    pub fn deliver_to_b(&self, block: &BlockInfo) -> (IbcPacket, Result<Binary, InterfaceError>) {
        let packet = self.chain_a.relay.pop().expect("no packet in flight");
        let ack = self.chain_b.interface.on_packet_receive(block, &packet);
        (packet, ack)
    }
}
