use std::{collections::HashMap, sync::Arc};

use cosmwasm_std::{Addr, Binary, BlockInfo, Timestamp, Uint128, Uint64};
use fixed_point_math::{I256, U256, LN2};
use parking_lot::Mutex;
use tracing::{debug, error, info, warn};
use vault_assets::{Asset, AssetLedger, AssetMsg, VaultAssets};

use crate::{
    chain_interface::ChainInterface,
    curves::SwapCurve,
    error::ContractError,
    escrow::{compute_send_asset_hash, EscrowEntry, EscrowLedger, LiquidityEscrowEntry, PacketId},
    event::{
        finish_setup_event, initialize_swap_curves_event, local_swap_event, receive_asset_event,
        send_asset_event, send_asset_failure_event, send_asset_success_event, set_connection_event,
        set_fee_administrator_event, set_governance_fee_share_event, set_vault_fee_event
    },
    fees::{FeeDistributor, FeeSplit},
    msg::{
        FeesResponse, InitializeSwapCurvesMsg, InstantiateMsg, LimitCapacityResponse,
        ReceiveAssetMsg, SendAssetAckMsg, SendAssetMsg, SendAssetResponse,
        SendCrossChainAssetMsg, VaultResponse
    },
    security_limit::SecurityLimit,
    vault_token::{VaultToken, INITIAL_MINT_AMOUNT}
};


mod liquidity;


// Vault Constants **************************************************************************************************************

pub const MAX_ASSETS: usize = 3;

pub const CATALYST_ENCODED_ADDRESS_LENGTH: usize = 65usize;




// Vault State ******************************************************************************************************************

/// The swap curve configuration, fixed once the vault has been initialized.
#[derive(Clone, Debug)]
struct SwapCurves {
    assets: VaultAssets,
    weights: Vec<Uint64>,
    curve: SwapCurve
}

impl SwapCurves {

    fn asset_index(&self, asset_ref: &str) -> Result<usize, ContractError> {
        self.assets
            .index_of(asset_ref)
            .ok_or_else(|| ContractError::InvalidAsset { asset: asset_ref.to_string() })
    }

    fn asset_by_index(&self, index: usize) -> Result<&Asset, ContractError> {
        self.assets
            .get_asset_by_index(index)
            .ok_or(ContractError::InvalidAssets {})
    }

    fn weight(&self, index: usize) -> U256 {
        U256::from(self.weights[index].u64())
    }

    fn weights_u256(&self) -> Vec<U256> {
        self.weights.iter()
            .map(|weight| U256::from(weight.u64()))
            .collect()
    }

    fn weights_sum(&self) -> U256 {
        // Never overflows, as there are at most MAX_ASSETS u64 weights
        self.weights.iter()
            .fold(U256::ZERO, |acc, weight| acc.wrapping_add(U256::from(weight.u64())))
    }
}


struct VaultState {
    setup_master: Option<Addr>,
    chain_interface: Option<Addr>,
    fee_administrator: Addr,
    governance_account: Addr,
    fees: FeeDistributor,
    vault_token: VaultToken,
    curves: Option<SwapCurves>,
    connections: HashMap<(String, Vec<u8>), bool>,
    escrows: EscrowLedger,
    security_limit: SecurityLimit,
    /// Net units that have left an amplified vault (in WAD notation).
    unit_tracker: I256
}

impl VaultState {

    fn curves(&self) -> Result<&SwapCurves, ContractError> {
        self.curves
            .as_ref()
            .ok_or(ContractError::VaultNotInitialized {})
    }

    fn only_setup_master(&self, sender: &Addr) -> Result<(), ContractError> {
        if self.setup_master.as_ref() != Some(sender) {
            return Err(ContractError::Unauthorized {});
        }
        Ok(())
    }

    fn only_fee_administrator(&self, sender: &Addr) -> Result<(), ContractError> {
        if &self.fee_administrator != sender {
            return Err(ContractError::Unauthorized {});
        }
        Ok(())
    }

    fn only_chain_interface(&self, sender: &Addr) -> Result<(), ContractError> {
        match &self.chain_interface {
            None => Err(ContractError::VaultHasNoInterface {}),
            Some(chain_interface) if chain_interface != sender => Err(ContractError::Unauthorized {}),
            Some(_) => Ok(())
        }
    }

    fn is_connected(&self, channel_id: &str, vault: &[u8]) -> bool {
        self.connections
            .get(&(channel_id.to_string(), vault.to_vec()))
            .copied()
            .unwrap_or(false)
    }

    fn only_connected(&self, channel_id: &str, vault: &Binary) -> Result<(), ContractError> {
        if !self.is_connected(channel_id, vault.as_slice()) {
            return Err(ContractError::VaultNotConnected {
                channel_id: channel_id.to_string(),
                vault: vault.clone()
            });
        }
        Ok(())
    }
}


fn validate_address(address: &str, name: &str) -> Result<Addr, ContractError> {
    if address.is_empty() {
        return Err(ContractError::InvalidParameters {
            reason: format!("'{}' must not be empty.", name)
        });
    }
    Ok(Addr::unchecked(address))
}


fn validate_encoded_address(address: &Binary, name: &str) -> Result<(), ContractError> {
    if address.len() != CATALYST_ENCODED_ADDRESS_LENGTH {
        return Err(ContractError::InvalidParameters {
            reason: format!("'{}' address is of invalid length (Catalyst specific address encoding expected).", name)
        });
    }
    Ok(())
}


fn uint128_from_u256(value: U256) -> Result<Uint128, ContractError> {
    u128::try_from(value)
        .map(Uint128::new)
        .map_err(|_| ContractError::ArithmeticError {})
}




// Vault ************************************************************************************************************************

/// A Catalyst vault: a basket of assets priced along a swap curve, which can be swapped locally
/// or against connected vaults on other chains.
///
/// Every operation runs inside the vault's exclusive section.
pub struct Vault<L: AssetLedger> {
    address: Addr,
    ledger: Arc<L>,
    state: Mutex<VaultState>
}

impl<L: AssetLedger> Vault<L> {

    /// Create a new vault. The swap curves must be set up with `initialize_swap_curves` before the
    /// vault can be used.
    ///
    /// # Arguments:
    /// * `address` - The address under which the vault holds its assets on the ledger.
    /// * `ledger` - The asset ledger.
    /// * `msg` - The vault configuration.
    ///
    pub fn instantiate(
        address: Addr,
        ledger: Arc<L>,
        msg: InstantiateMsg
    ) -> Result<Self, ContractError> {

        let state = VaultState {
            setup_master: Some(validate_address(&msg.setup_master, "setup_master")?),
            chain_interface: msg.chain_interface
                .map(|chain_interface| validate_address(&chain_interface, "chain_interface"))
                .transpose()?,
            fee_administrator: validate_address(&msg.fee_administrator, "fee_administrator")?,
            governance_account: validate_address(&msg.governance_account, "governance_account")?,
            fees: FeeDistributor::new(msg.vault_fee, msg.governance_fee_share)?,
            vault_token: VaultToken::new(msg.name, msg.symbol)?,
            curves: None,
            connections: HashMap::new(),
            escrows: EscrowLedger::new(),
            security_limit: SecurityLimit::default(),
            unit_tracker: I256::ZERO
        };

        info!(vault = %address, "vault instantiated");

        Ok(Self {
            address,
            ledger,
            state: Mutex::new(state)
        })
    }


    pub fn address(&self) -> &Addr {
        &self.address
    }


    pub fn ledger(&self) -> &Arc<L> {
        &self.ledger
    }


    // Balance of an asset owned by the vault: the ledger balance minus the governance fees
    // withheld by the open escrows.
    fn held_balance_of(&self, state: &VaultState, asset_ref: &str) -> Result<Uint128, ContractError> {
        let balance = self.ledger.balance_of(asset_ref, &self.address)?;
        Ok(balance.checked_sub(state.escrows.pending_governance_fees(asset_ref))?)
    }


    // Active balance of an asset: the held balance minus the escrowed amount.
    fn active_balance_of(&self, state: &VaultState, asset_ref: &str) -> Result<Uint128, ContractError> {
        let balance = self.held_balance_of(state, asset_ref)?;
        Ok(balance.checked_sub(state.escrows.total_escrowed(asset_ref))?)
    }


    fn execute_asset_msgs(&self, msgs: Vec<Option<AssetMsg>>) -> Result<(), ContractError> {
        let msgs: Vec<AssetMsg> = msgs.into_iter().flatten().collect();
        if msgs.is_empty() {
            return Ok(());
        }
        self.ledger.execute(&self.address, msgs)?;
        Ok(())
    }



    // Setup ********************************************************************************************************************

    /// Initialize the vault swap curves: the assets, their weights and the curve amplification.
    /// The vault must already hold a nonzero balance of every asset. The vault tokens are minted
    /// to the `depositor`.
    ///
    /// **NOTE**: Only the setup master may invoke this function, and only once.
    ///
    pub fn initialize_swap_curves(
        &self,
        sender: &Addr,
        block: &BlockInfo,
        msg: InitializeSwapCurvesMsg
    ) -> Result<VaultResponse, ContractError> {

        let mut guard = self.state.lock();
        let state = &mut *guard;

        state.only_setup_master(sender)?;

        // Only allow the swap curves to be initialized once
        if state.curves.is_some() {
            return Err(ContractError::Unauthorized {});
        }

        if msg.assets.len() != msg.weights.len() {
            return Err(ContractError::InvalidParameters {
                reason: "Assets and weights must have the same length.".to_string()
            });
        }

        let assets = VaultAssets::new(
            msg.assets.iter().cloned().map(Asset).collect(),
            MAX_ASSETS
        ).map_err(|_| ContractError::InvalidAssets {})?;

        if msg.weights.iter().any(|weight| weight.is_zero()) {
            return Err(ContractError::InvalidWeight {});
        }

        let curve = SwapCurve::from_amplification(msg.amp)?;

        let depositor = validate_address(&msg.depositor, "depositor")?;

        let balances = assets.get_assets_refs()
            .into_iter()
            .map(|asset_ref| -> Result<Uint128, ContractError> {
                let balance = self.ledger.balance_of(asset_ref, &self.address)?;
                if balance.is_zero() {
                    return Err(ContractError::InvalidZeroBalance {});
                }
                Ok(balance)
            })
            .collect::<Result<Vec<Uint128>, ContractError>>()?;

        // Volatile vaults cap the inbound units at ln(2)·Σw, amplified vaults cap the
        // inbound value at Σw·b.
        let max_limit_capacity = match curve {
            SwapCurve::Volatile => {
                let weights_sum = msg.weights.iter()
                    .try_fold(U256::ZERO, |acc, weight| acc.checked_add(U256::from(weight.u64())))
                    .ok_or(ContractError::ArithmeticError {})?;
                LN2.checked_mul(weights_sum).ok_or(ContractError::ArithmeticError {})?
            },
            SwapCurve::Amplified { .. } => {
                balances.iter()
                    .zip(&msg.weights)
                    .try_fold(U256::ZERO, |acc, (balance, weight)| {
                        U256::new(balance.u128())
                            .checked_mul(U256::from(weight.u64()))
                            .and_then(|weighted_balance| acc.checked_add(weighted_balance))
                    })
                    .ok_or(ContractError::ArithmeticError {})?
            }
        };

        state.vault_token.mint(INITIAL_MINT_AMOUNT, &depositor)?;
        state.security_limit = SecurityLimit::new(max_limit_capacity);
        state.security_limit.used_limit_capacity_timestamp = Uint64::new(block.time.seconds());
        state.curves = Some(SwapCurves {
            assets,
            weights: msg.weights.clone(),
            curve
        });

        info!(
            vault = %self.address,
            assets = ?msg.assets,
            amplification = %msg.amp,
            %max_limit_capacity,
            "swap curves initialized"
        );

        Ok(
            VaultResponse::new()
                .add_event(
                    initialize_swap_curves_event(
                        depositor.to_string(),
                        msg.assets,
                        msg.weights,
                        msg.amp,
                        INITIAL_MINT_AMOUNT
                    )
                )
        )
    }


    /// Finish the vault setup. This revokes the 'setup_master' authority.
    ///
    /// **NOTE**: Only the setup master may invoke this function.
    pub fn finish_setup(&self, sender: &Addr) -> Result<VaultResponse, ContractError> {

        let mut state = self.state.lock();

        state.only_setup_master(sender)?;

        state.setup_master = None;

        info!(vault = %self.address, "vault setup finished");

        Ok(VaultResponse::new().add_event(finish_setup_event()))
    }


    /// Setup a vault connection.
    ///
    /// **NOTE**: Only the setup master may invoke this function.
    ///
    /// # Arguments:
    /// * `channel_id` - The channel id that connects with the remote vault.
    /// * `to_vault` - The remote vault address (Catalyst encoded).
    /// * `connected` - Whether the connection is enabled.
    ///
    pub fn set_connection(
        &self,
        sender: &Addr,
        channel_id: String,
        to_vault: Binary,
        connected: bool
    ) -> Result<VaultResponse, ContractError> {

        let mut state = self.state.lock();

        state.only_setup_master(sender)?;

        validate_encoded_address(&to_vault, "to_vault")?;

        state.connections.insert((channel_id.clone(), to_vault.to_vec()), connected);

        debug!(vault = %self.address, %channel_id, connected, "vault connection set");

        Ok(
            VaultResponse::new()
                .add_event(set_connection_event(channel_id, to_vault, connected))
        )
    }



    // Fee Administration *******************************************************************************************************

    /// Set the vault fee (18 decimals).
    ///
    /// **NOTE**: Only the fee administrator may invoke this function.
    pub fn set_vault_fee(&self, sender: &Addr, fee: Uint64) -> Result<VaultResponse, ContractError> {

        let mut state = self.state.lock();

        state.only_fee_administrator(sender)?;
        state.fees.set_vault_fee(fee)?;

        info!(vault = %self.address, %fee, "vault fee set");

        Ok(VaultResponse::new().add_event(set_vault_fee_event(fee)))
    }


    /// Set the governance fee share (18 decimals).
    ///
    /// **NOTE**: Only the fee administrator may invoke this function.
    pub fn set_governance_fee_share(&self, sender: &Addr, fee: Uint64) -> Result<VaultResponse, ContractError> {

        let mut state = self.state.lock();

        state.only_fee_administrator(sender)?;
        state.fees.set_governance_fee_share(fee)?;

        info!(vault = %self.address, %fee, "governance fee share set");

        Ok(VaultResponse::new().add_event(set_governance_fee_share_event(fee)))
    }


    /// Hand the fee administration over to `administrator`.
    ///
    /// **NOTE**: Only the fee administrator may invoke this function.
    pub fn set_fee_administrator(&self, sender: &Addr, administrator: String) -> Result<VaultResponse, ContractError> {

        let mut state = self.state.lock();

        state.only_fee_administrator(sender)?;
        state.fee_administrator = validate_address(&administrator, "administrator")?;

        info!(vault = %self.address, %administrator, "fee administrator set");

        Ok(VaultResponse::new().add_event(set_fee_administrator_event(administrator)))
    }



    // Swaps ********************************************************************************************************************

    // Price a local swap of `amount` (fees not yet deducted) against the active balances.
    fn quote_local_swap(
        &self,
        state: &VaultState,
        curves: &SwapCurves,
        from_index: usize,
        to_index: usize,
        amount: Uint128
    ) -> Result<(FeeSplit, Uint128), ContractError> {

        if from_index == to_index {
            return Err(ContractError::InvalidAsset {
                asset: curves.asset_by_index(to_index)?.to_string()
            });
        }

        let fee = state.fees.assess(amount)?;
        let effective_amount = amount - fee.gross_fee;      // Safe, the fee is never larger than 'amount'

        let from_balance = self.active_balance_of(state, curves.asset_by_index(from_index)?.get_asset_ref())?;
        let to_balance = self.active_balance_of(state, curves.asset_by_index(to_index)?.get_asset_ref())?;

        let out = curves.curve.calc_local_swap(
            U256::new(effective_amount.u128()),
            U256::new(from_balance.u128()),
            U256::new(to_balance.u128()),
            curves.weight(from_index),
            curves.weight(to_index)
        )?;

        Ok((fee, uint128_from_u256(out)?))
    }


    /// Swap `amount` of `from_asset` for `to_asset` within the vault. The input assets are pulled
    /// from `sender` (an allowance must have been granted to the vault) and the output is paid to
    /// `sender`.
    ///
    /// # Arguments:
    /// * `from_asset` - The source asset reference.
    /// * `to_asset` - The destination asset reference.
    /// * `amount` - The `from_asset` amount sold to the vault.
    /// * `min_out` - The minimum return to get of `to_asset`.
    ///
    pub fn local_swap(
        &self,
        sender: &Addr,
        block: &BlockInfo,
        from_asset: &str,
        to_asset: &str,
        amount: Uint128,
        min_out: Uint128
    ) -> Result<VaultResponse<Uint128>, ContractError> {

        let mut guard = self.state.lock();
        let state = &mut *guard;

        if amount.is_zero() {
            return Err(ContractError::InvalidParameters { reason: "The swap amount must be nonzero.".to_string() });
        }

        let curves = state.curves()?;
        let from_index = curves.asset_index(from_asset)?;
        let to_index = curves.asset_index(to_asset)?;

        let (fee, out) = self.quote_local_swap(state, curves, from_index, to_index, amount)?;

        if min_out > out {
            debug!(vault = %self.address, %out, %min_out, "local swap return insufficient");
            return Err(ContractError::InsufficientReturn { out, min_out });
        }

        // Update the max limit capacity, as for amplified vaults it is based on the vault asset balances
        let mut security_limit = state.security_limit.clone();
        if let SwapCurve::Amplified { .. } = curves.curve {
            let limit_capacity_increase = U256::new((amount - fee.gross_fee).u128())
                .wrapping_mul(curves.weight(from_index));   // 'wrapping_mul' is overflow safe as U256.max >= Uint128.max * u64.max
            let limit_capacity_decrease = U256::new(out.u128())
                .wrapping_mul(curves.weight(to_index));     // 'wrapping_mul' is overflow safe as U256.max >= Uint128.max * u64.max

            if limit_capacity_decrease > limit_capacity_increase {
                security_limit.decrease_max(limit_capacity_decrease.wrapping_sub(limit_capacity_increase))?;
            }
            else {
                security_limit.increase_max(limit_capacity_increase.wrapping_sub(limit_capacity_decrease));
            }
        }

        let from = curves.asset_by_index(from_index)?;
        let to = curves.asset_by_index(to_index)?;

        self.execute_asset_msgs(vec![
            from.receive_asset(&self.address, sender, amount),
            to.send_asset(out, sender),
            from.send_asset(fee.governance_portion, &state.governance_account)
        ])?;

        state.security_limit = security_limit;

        info!(
            vault = %self.address,
            account = %sender,
            from_asset,
            to_asset,
            %amount,
            %out,
            fee = %fee.gross_fee,
            height = block.height,
            "local swap"
        );

        Ok(
            VaultResponse::with_data(out)
                .add_event(
                    local_swap_event(
                        sender.to_string(),
                        from_asset.to_string(),
                        to_asset.to_string(),
                        amount,
                        out,
                        fee.gross_fee
                    )
                )
        )
    }


    /// Dry run of `local_swap`: the output (fees included) of a swap under the current state.
    pub fn calc_local_swap(
        &self,
        from_asset: &str,
        to_asset: &str,
        amount: Uint128
    ) -> Result<Uint128, ContractError> {

        let state = self.state.lock();

        let curves = state.curves()?;
        let from_index = curves.asset_index(from_asset)?;
        let to_index = curves.asset_index(to_asset)?;

        self.quote_local_swap(&state, curves, from_index, to_index, amount)
            .map(|(_, out)| out)
    }


    // Compute the fee and the units of a cross chain swap of `amount` of the asset `from_index`.
    fn quote_send_asset(
        &self,
        state: &VaultState,
        curves: &SwapCurves,
        from_index: usize,
        amount: Uint128
    ) -> Result<(FeeSplit, U256), ContractError> {

        let fee = state.fees.assess(amount)?;
        let effective_amount = amount - fee.gross_fee;      // Safe, the fee is never larger than 'amount'

        let from_balance = self.active_balance_of(state, curves.asset_by_index(from_index)?.get_asset_ref())?;

        let units = curves.curve.calc_send_units(
            U256::new(effective_amount.u128()),
            U256::new(from_balance.u128()),
            curves.weight(from_index)
        )?;

        Ok((fee, units))
    }


    /// Initiate a cross chain swap.
    ///
    /// The input assets are pulled from `sender`, the fee is deducted, and the remainder is held
    /// in escrow under the id of the emitted packet until the swap is confirmed or rejected.
    ///
    /// # Arguments:
    /// * `interface` - The chain interface through which to emit the swap.
    /// * `sender` - The account selling the assets.
    /// * `block` - The current block.
    /// * `msg` - The swap order.
    ///
    pub fn send_asset(
        &self,
        interface: &dyn ChainInterface,
        sender: &Addr,
        block: &BlockInfo,
        msg: SendAssetMsg
    ) -> Result<VaultResponse<SendAssetResponse>, ContractError> {

        let mut guard = self.state.lock();
        let state = &mut *guard;

        // Only the configured interface may carry the vault's swaps
        match &state.chain_interface {
            None => return Err(ContractError::VaultHasNoInterface {}),
            Some(chain_interface) if chain_interface != interface.address() => {
                return Err(ContractError::Unauthorized {})
            },
            _ => {}
        }

        // Only allow connected vaults
        state.only_connected(&msg.channel_id, &msg.to_vault)?;

        validate_encoded_address(&msg.to_account, "to_account")?;
        let fallback_account = validate_address(&msg.fallback_account, "fallback_account")?;

        if msg.amount.is_zero() {
            return Err(ContractError::InvalidParameters { reason: "The swap amount must be nonzero.".to_string() });
        }

        let curves = state.curves()?;
        let from_index = curves.asset_index(&msg.from_asset)?;
        let from = curves.asset_by_index(from_index)?.clone();

        let (fee, units) = self.quote_send_asset(state, curves, from_index, msg.amount)?;

        // NOTE: The fee is also deducted from the escrow amount to prevent denial of service attacks.
        let escrow_amount = msg.amount - fee.gross_fee;

        let packet_id = interface.next_packet_id(&msg.channel_id)?;

        let block_number = block.height as u32;
        let send_asset_hash = compute_send_asset_hash(
            msg.to_account.as_slice(),
            units,
            escrow_amount,
            from.get_asset_ref(),
            block_number
        );

        let unit_tracker = match curves.curve {
            SwapCurve::Volatile => state.unit_tracker,
            SwapCurve::Amplified { .. } => checked_add_units(state.unit_tracker, units)?
        };

        // The governance portion of the fee is withheld with the escrow, and paid out once the
        // escrow is resolved, as it could not be recovered were the packet emission to fail.
        state.escrows.open(
            packet_id.clone(),
            from.get_asset_ref(),
            escrow_amount,
            fee.governance_portion,
            fallback_account,
            send_asset_hash,
            block
        )?;

        // Pull the input assets into the vault.
        if let Err(err) = self.execute_asset_msgs(vec![
            from.receive_asset(&self.address, sender, msg.amount)
        ]) {
            state.escrows.cancel(&packet_id);
            return Err(err);
        }

        let send_result = interface.send_cross_chain_asset(
            &self.address,
            block,
            &packet_id,
            SendCrossChainAssetMsg {
                channel_id: msg.channel_id.clone(),
                to_vault: msg.to_vault.clone(),
                to_account: msg.to_account.clone(),
                to_asset_index: msg.to_asset_index,
                u: units,
                min_out: msg.min_out,
                from_amount: escrow_amount,
                from_asset: msg.from_asset.clone(),
                block_number
            }
        );

        if let Err(err) = send_result {
            warn!(vault = %self.address, %packet_id, error = %err, "cross chain asset send failed");

            // Return the pulled assets.
            if let Err(rollback_err) = self.execute_asset_msgs(vec![from.send_asset(msg.amount, sender)]) {
                error!(vault = %self.address, %packet_id, error = %rollback_err, "send asset rollback failed");
                return Err(ContractError::RollbackFailed {
                    packet_id,
                    cause: err.to_string(),
                    reason: rollback_err.to_string()
                });
            }

            state.escrows.cancel(&packet_id);
            return Err(err);
        }

        // NOTE: The security limit adjustment is delayed until the swap confirmation is received to
        // prevent a router from abusing swap 'timeouts' to circumvent the security limit.
        state.unit_tracker = unit_tracker;

        info!(
            vault = %self.address,
            account = %sender,
            %packet_id,
            from_asset = %msg.from_asset,
            amount = %msg.amount,
            %units,
            %escrow_amount,
            "send asset"
        );

        let event = send_asset_event(
            &packet_id,
            msg.to_vault,
            msg.to_account,
            msg.from_asset,
            msg.to_asset_index,
            msg.amount,
            msg.min_out,
            units,
            fee.gross_fee
        );

        Ok(
            VaultResponse::with_data(SendAssetResponse {
                packet_id,
                units,
                escrow_amount,
                fee: fee.gross_fee
            })
            .add_event(event)
        )
    }


    /// Dry run of `send_asset`: the units (fees included) bought by a cross chain swap.
    pub fn calc_send_asset(
        &self,
        from_asset: &str,
        amount: Uint128
    ) -> Result<U256, ContractError> {

        let state = self.state.lock();

        let curves = state.curves()?;
        let from_index = curves.asset_index(from_asset)?;

        self.quote_send_asset(&state, curves, from_index, amount)
            .map(|(_, units)| units)
    }


    // Price the output of an inbound swap against the active balance.
    fn quote_receive_asset(
        &self,
        state: &VaultState,
        curves: &SwapCurves,
        to_index: usize,
        units: U256
    ) -> Result<Uint128, ContractError> {

        let to_balance = self.active_balance_of(state, curves.asset_by_index(to_index)?.get_asset_ref())?;

        let out = curves.curve.calc_output(
            units,
            U256::new(to_balance.u128()),
            curves.weight(to_index)
        )?;

        uint128_from_u256(out)
    }


    /// Complete a cross chain swap on the destination side, paying the recipient.
    ///
    /// **NOTE**: Only the chain interface may invoke this function.
    ///
    pub fn receive_asset(
        &self,
        sender: &Addr,
        block: &BlockInfo,
        msg: ReceiveAssetMsg
    ) -> Result<VaultResponse<Uint128>, ContractError> {

        let mut guard = self.state.lock();
        let state = &mut *guard;

        state.only_chain_interface(sender)?;

        // Only allow connected vaults
        state.only_connected(&msg.channel_id, &msg.from_vault)?;

        let to_account = validate_address(&msg.to_account, "to_account")?;

        let curves = state.curves()?;
        let to_index = msg.to_asset_index as usize;
        let to_asset = curves.asset_by_index(to_index)?.clone();

        let out = self.quote_receive_asset(state, curves, to_index, msg.u)?;

        if msg.min_out > out {
            debug!(vault = %self.address, %out, min_out = %msg.min_out, "receive asset return insufficient");
            return Err(ContractError::InsufficientReturn { out, min_out: msg.min_out });
        }

        let mut security_limit = state.security_limit.clone();
        let mut unit_tracker = state.unit_tracker;
        match curves.curve {
            SwapCurve::Volatile => {
                security_limit.consume(block.time, msg.u)?;
            },
            SwapCurve::Amplified { .. } => {
                // Update the max limit capacity and the used limit capacity
                let limit_capacity_delta = U256::new(out.u128())
                    .checked_mul(curves.weight(to_index))
                    .ok_or(ContractError::ArithmeticError {})?;
                security_limit.decrease_max(limit_capacity_delta)?;
                security_limit.consume(block.time, limit_capacity_delta)?;
                unit_tracker = checked_sub_units(unit_tracker, msg.u)?;
            }
        }

        self.execute_asset_msgs(vec![to_asset.send_asset(out, &to_account)])?;

        state.security_limit = security_limit;
        state.unit_tracker = unit_tracker;

        info!(
            vault = %self.address,
            channel_id = %msg.channel_id,
            %to_account,
            to_asset = %to_asset,
            units = %msg.u,
            %out,
            "receive asset"
        );

        Ok(
            VaultResponse::with_data(out)
                .add_event(
                    receive_asset_event(
                        msg.channel_id,
                        msg.from_vault,
                        to_account.to_string(),
                        to_asset.to_string(),
                        msg.u,
                        out,
                        msg.from_amount,
                        msg.from_asset,
                        msg.from_block_number_mod
                    )
                )
        )
    }


    /// Dry run of `receive_asset`: the output for `units` of the asset at `to_asset_index`.
    pub fn calc_receive_asset(
        &self,
        to_asset_index: u8,
        units: U256
    ) -> Result<Uint128, ContractError> {

        let state = self.state.lock();

        let curves = state.curves()?;

        self.quote_receive_asset(&state, curves, to_asset_index as usize, units)
    }


    /// Handle the confirmation of a successful cross chain swap. The escrow is released, the
    /// escrowed assets remain with the vault and the withheld governance fee is paid out.
    ///
    /// **NOTE**: Only the chain interface may invoke this function.
    ///
    pub fn on_send_asset_success(
        &self,
        sender: &Addr,
        msg: SendAssetAckMsg
    ) -> Result<VaultResponse, ContractError> {

        let mut guard = self.state.lock();
        let state = &mut *guard;

        state.only_chain_interface(sender)?;

        // Hash the swap parameters to recover and release the swap escrow. If any of the values
        // are tampered with this will fail.
        let send_asset_hash = compute_send_asset_hash(
            msg.to_account.as_slice(),
            msg.u,
            msg.escrow_amount,
            &msg.asset_ref,
            msg.block_number_mod
        );

        let curves = state.curves()?;
        let curve = curves.curve;
        let weight = curves.weight(curves.asset_index(&msg.asset_ref)?);

        let governance_fee = state.escrows
            .get_open(&msg.packet_id, &send_asset_hash)
            .map(|entry| entry.governance_fee)
            .map_err(|err| log_escrow_anomaly(&self.address, &msg.packet_id, err))?;

        // Pay out the governance fee withheld with the escrow.
        self.execute_asset_msgs(vec![
            Asset(msg.asset_ref.clone()).send_asset(governance_fee, &state.governance_account)
        ])?;

        let entry = state.escrows.resolve_success(&msg.packet_id, &send_asset_hash)?;

        match curve {
            SwapCurve::Volatile => {
                state.security_limit.release(msg.u);
            },
            SwapCurve::Amplified { .. } => {
                // Multiplication is overflow safe, as U256.max >= Uint128.max * u64.max
                state.security_limit.increase_max(
                    U256::new(entry.amount.u128()).wrapping_mul(weight)
                );
            }
        }

        info!(vault = %self.address, packet_id = %msg.packet_id, escrow_amount = %entry.amount, "send asset success");

        Ok(
            VaultResponse::new()
                .add_event(
                    send_asset_success_event(
                        &msg.packet_id,
                        msg.to_account,
                        msg.u,
                        msg.escrow_amount,
                        msg.asset_ref,
                        msg.block_number_mod
                    )
                )
        )
    }


    /// Handle the rejection (or timeout) of a cross chain swap. The escrow is released, the
    /// escrowed assets are returned to the fallback account and the withheld governance fee is
    /// paid out.
    ///
    /// **NOTE**: Only the chain interface may invoke this function.
    ///
    pub fn on_send_asset_failure(
        &self,
        sender: &Addr,
        msg: SendAssetAckMsg
    ) -> Result<VaultResponse, ContractError> {

        let mut guard = self.state.lock();
        let state = &mut *guard;

        state.only_chain_interface(sender)?;

        let send_asset_hash = compute_send_asset_hash(
            msg.to_account.as_slice(),
            msg.u,
            msg.escrow_amount,
            &msg.asset_ref,
            msg.block_number_mod
        );

        let (fallback_account, amount, governance_fee) = state.escrows
            .get_open(&msg.packet_id, &send_asset_hash)
            .map(|entry| (entry.fallback_account.clone(), entry.amount, entry.governance_fee))
            .map_err(|err| log_escrow_anomaly(&self.address, &msg.packet_id, err))?;

        let unit_tracker = match state.curves()?.curve {
            SwapCurve::Volatile => state.unit_tracker,
            SwapCurve::Amplified { .. } => checked_sub_units(state.unit_tracker, msg.u)?
        };

        // Transfer the escrowed assets to the fallback account. The fee is not refunded.
        let asset = Asset(msg.asset_ref.clone());
        self.execute_asset_msgs(vec![
            asset.send_asset(amount, &fallback_account),
            asset.send_asset(governance_fee, &state.governance_account)
        ])?;

        state.escrows.resolve_failure(&msg.packet_id, &send_asset_hash)?;
        state.unit_tracker = unit_tracker;

        info!(
            vault = %self.address,
            packet_id = %msg.packet_id,
            %fallback_account,
            escrow_amount = %amount,
            "send asset failure, escrow refunded"
        );

        Ok(
            VaultResponse::new()
                .add_event(
                    send_asset_failure_event(
                        &msg.packet_id,
                        msg.to_account,
                        msg.u,
                        msg.escrow_amount,
                        msg.asset_ref,
                        msg.block_number_mod
                    )
                )
        )
    }



    // Queries ******************************************************************************************************************

    pub fn ready(&self) -> bool {
        let state = self.state.lock();
        state.setup_master.is_none() && state.curves.is_some()
    }

    pub fn setup_master(&self) -> Option<Addr> {
        self.state.lock().setup_master.clone()
    }

    pub fn chain_interface(&self) -> Option<Addr> {
        self.state.lock().chain_interface.clone()
    }

    pub fn assets(&self) -> Result<Vec<String>, ContractError> {
        let state = self.state.lock();
        Ok(
            state.curves()?
                .assets
                .get_assets_refs()
                .into_iter()
                .map(str::to_string)
                .collect()
        )
    }

    pub fn weights(&self) -> Result<Vec<Uint64>, ContractError> {
        let state = self.state.lock();
        Ok(state.curves()?.weights.clone())
    }

    pub fn amplification(&self) -> Result<Uint64, ContractError> {
        let state = self.state.lock();
        Ok(state.curves()?.curve.amplification())
    }

    pub fn swap_curve(&self) -> Result<SwapCurve, ContractError> {
        let state = self.state.lock();
        Ok(state.curves()?.curve)
    }

    pub fn is_connected(&self, channel_id: &str, vault: &[u8]) -> bool {
        self.state.lock().is_connected(channel_id, vault)
    }

    /// The balance of an asset usable for pricing: the ledger held balance minus the open escrows.
    pub fn active_balance(&self, asset_ref: &str) -> Result<Uint128, ContractError> {
        let state = self.state.lock();
        state.curves()?.asset_index(asset_ref)?;
        self.active_balance_of(&state, asset_ref)
    }

    pub fn total_escrowed(&self, asset_ref: &str) -> Uint128 {
        self.state.lock().escrows.total_escrowed(asset_ref)
    }

    /// The governance fees of an asset withheld by the open escrows.
    pub fn pending_governance_fees(&self, asset_ref: &str) -> Uint128 {
        self.state.lock().escrows.pending_governance_fees(asset_ref)
    }

    pub fn total_escrowed_liquidity(&self) -> Uint128 {
        self.state.lock().escrows.total_escrowed_liquidity()
    }

    pub fn liquidity_escrow(&self, packet_id: &PacketId) -> Option<LiquidityEscrowEntry> {
        self.state.lock().escrows.get_liquidity(packet_id).cloned()
    }

    pub fn unit_tracker(&self) -> I256 {
        self.state.lock().unit_tracker
    }

    pub fn escrow(&self, packet_id: &PacketId) -> Option<EscrowEntry> {
        self.state.lock().escrows.get(packet_id).cloned()
    }

    pub fn open_escrows(&self) -> Vec<EscrowEntry> {
        self.state.lock()
            .escrows
            .open_entries()
            .cloned()
            .collect()
    }

    pub fn fees(&self) -> FeesResponse {
        let state = self.state.lock();
        FeesResponse {
            vault_fee: state.fees.vault_fee(),
            governance_fee_share: state.fees.governance_fee_share(),
            fee_administrator: state.fee_administrator.clone(),
            governance_account: state.governance_account.clone()
        }
    }

    pub fn limit_capacity(&self, timestamp: Timestamp) -> Result<LimitCapacityResponse, ContractError> {
        let state = self.state.lock();
        Ok(LimitCapacityResponse {
            capacity: state.security_limit.capacity(timestamp)?,
            max_limit_capacity: state.security_limit.max_limit_capacity,
            used_limit_capacity: state.security_limit.used_limit_capacity
        })
    }

    pub fn total_supply(&self) -> Uint128 {
        self.state.lock().vault_token.total_supply()
    }

    pub fn vault_token_balance(&self, account: &Addr) -> Uint128 {
        self.state.lock().vault_token.balance(account)
    }

    /// The curve invariant over the active balances (in WAD notation).
    pub fn invariant(&self) -> Result<U256, ContractError> {
        let state = self.state.lock();
        let curves = state.curves()?;

        let balances = curves.assets
            .get_assets_refs()
            .into_iter()
            .map(|asset_ref| {
                self.active_balance_of(&state, asset_ref)
                    .map(|balance| U256::new(balance.u128()))
            })
            .collect::<Result<Vec<U256>, ContractError>>()?;

        let weights: Vec<U256> = (0..curves.weights.len())
            .map(|index| curves.weight(index))
            .collect();

        curves.curve.calc_invariant(&balances, &weights)
    }
}


fn checked_add_units(unit_tracker: I256, units: U256) -> Result<I256, ContractError> {
    I256::try_from(units)
        .ok()
        .and_then(|units| unit_tracker.checked_add(units))
        .ok_or(ContractError::ArithmeticError {})
}


fn checked_sub_units(unit_tracker: I256, units: U256) -> Result<I256, ContractError> {
    I256::try_from(units)
        .ok()
        .and_then(|units| unit_tracker.checked_sub(units))
        .ok_or(ContractError::ArithmeticError {})
}


fn log_escrow_anomaly(vault: &Addr, packet_id: &PacketId, err: ContractError) -> ContractError {
    match &err {
        ContractError::UnknownOrResolvedPacket { .. } => {
            warn!(%vault, %packet_id, "acknowledgement for unknown or resolved escrow")
        },
        ContractError::EscrowMismatch { .. } => {
            error!(%vault, %packet_id, "acknowledgement does not match the escrow")
        },
        _ => {}
    }
    err
}

