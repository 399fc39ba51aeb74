use cosmwasm_std::Uint64;

pub const CHAIN_INTERFACE       : &str = "chain_interface_addr";
pub const SETUP_MASTER          : &str = "setup_master_addr";
pub const FEE_ADMINISTRATOR     : &str = "fee_administrator_addr";
pub const GOVERNANCE            : &str = "governance_addr";
pub const DEPOSITOR             : &str = "depositor_addr";
pub const LOCAL_SWAPPER         : &str = "local_swapper_addr";
pub const SWAPPER_A             : &str = "swapper_a_addr";
pub const SWAPPER_B             : &str = "swapper_b_addr";
pub const SWAPPER_C             : &str = "swapper_c_addr";

pub const VAULT_TOKEN_NAME      : &str = "Catalyst Vault Token";
pub const VAULT_TOKEN_SYMBOL    : &str = "CAT";

pub const CHANNEL_ID            : &str = "channel-1";
pub const COUNTERPARTY_CHANNEL_ID : &str = "channel-2";
pub const PORT_ID               : &str = "wasm.catalyst_interface";

pub const DEFAULT_TEST_VAULT_FEE : Uint64 = Uint64::new(70000000000000000u64);   // 7%
pub const DEFAULT_TEST_GOV_FEE  : Uint64 = Uint64::new(50000000000000000u64);   // 5%
