use cosmwasm_std::{Addr, BlockInfo, Uint128};
use fixed_point_math::{div_wad_down, mul_wad_down, mul_wad_up, pow_wad, AsI256, AsU256, I256, U256, WAD, WADWAD};
use tracing::{debug, error, info, warn};
use vault_assets::AssetLedger;

use crate::{
    chain_interface::ChainInterface,
    curves::{amplified, volatile, SwapCurve},
    error::ContractError,
    escrow::{compute_send_liquidity_hash, EscrowState},
    event::{
        deposit_event, receive_liquidity_event, send_liquidity_event, send_liquidity_failure_event,
        send_liquidity_success_event, withdraw_event
    },
    msg::{
        ReceiveLiquidityMsg, SendCrossChainLiquidityMsg, SendLiquidityAckMsg, SendLiquidityMsg,
        SendLiquidityResponse, VaultResponse
    }
};

use super::{
    checked_add_units, checked_sub_units, log_escrow_anomaly, uint128_from_u256, validate_address,
    validate_encoded_address, SwapCurves, Vault, VaultState
};


// n·(w·a_0)^(1-k) of an amplified vault.
fn n_weighted_alpha_0_ampped(
    weighted_alpha_0_ampped: U256,
    asset_count: usize
) -> Result<U256, ContractError> {
    weighted_alpha_0_ampped
        .checked_mul(U256::from(asset_count as u64))
        .ok_or(ContractError::ArithmeticError {})
}


// Sum of the weighted amounts Σw·x, used to adjust the amplified security limit.
fn weighted_sum(amounts: &[Uint128], weights: &[U256]) -> Result<U256, ContractError> {
    amounts.iter()
        .zip(weights)
        .try_fold(U256::ZERO, |acc, (amount, weight)| {
            U256::new(amount.u128())
                .checked_mul(*weight)
                .and_then(|weighted_amount| acc.checked_add(weighted_amount))
        })
        .ok_or(ContractError::ArithmeticError {})
}


impl<L: AssetLedger> Vault<L> {

    // Balances held by the vault (escrowed amounts included), in asset order.
    fn held_balances(&self, state: &VaultState, curves: &SwapCurves) -> Result<Vec<U256>, ContractError> {
        curves.assets
            .get_assets_refs()
            .into_iter()
            .map(|asset_ref| {
                self.held_balance_of(state, asset_ref)
                    .map(|balance| U256::new(balance.u128()))
            })
            .collect()
    }


    // Active balances (escrowed amounts excluded), in asset order.
    fn active_balances(&self, state: &VaultState, curves: &SwapCurves) -> Result<Vec<U256>, ContractError> {
        curves.assets
            .get_assets_refs()
            .into_iter()
            .map(|asset_ref| {
                self.active_balance_of(state, asset_ref)
                    .map(|balance| U256::new(balance.u128()))
            })
            .collect()
    }


    // (w·a_0)^(1-k) of an amplified vault, derived from the held balances and the unit tracker.
    fn weighted_alpha_0_ampped(
        &self,
        state: &VaultState,
        curves: &SwapCurves,
        one_minus_amp: I256
    ) -> Result<U256, ContractError> {
        amplified::calc_weighted_alpha_0_ampped(
            &self.held_balances(state, curves)?,
            &curves.weights_u256(),
            one_minus_amp,
            state.unit_tracker
        )
    }


    // The vault token supply including the vault tokens held by the liquidity escrows.
    fn effective_supply(state: &VaultState) -> U256 {
        U256::new(state.vault_token.total_supply().u128())
            .wrapping_add(U256::new(state.escrows.total_escrowed_liquidity().u128()))  // 'wrapping_add' safe, as U256.max >> Uint128.max
    }



    // Deposits and Withdrawals *************************************************************************************************

    /// Deposit a user-configurable balance of assets into the vault.
    ///
    /// The units the deposited assets are worth (minus the vault fee) are translated into vault
    /// tokens, which are minted to `sender`.
    ///
    /// # Arguments:
    /// * `sender` - The depositor.
    /// * `deposit_amounts` - The amounts of each vault asset to deposit (may contain zeros).
    /// * `min_out` - The minimum vault token output.
    ///
    pub fn deposit_mixed(
        &self,
        sender: &Addr,
        deposit_amounts: Vec<Uint128>,
        min_out: Uint128
    ) -> Result<VaultResponse<Uint128>, ContractError> {

        let mut guard = self.state.lock();
        let state = &mut *guard;

        let curves = state.curves()?;
        let assets = curves.assets.get_assets().clone();

        if deposit_amounts.len() != assets.len() {
            return Err(ContractError::InvalidParameters {
                reason: "Invalid deposit_amounts count.".to_string()
            });
        }

        if deposit_amounts.iter().all(|amount| amount.is_zero()) {
            return Err(ContractError::InvalidParameters {
                reason: "The deposit must be nonzero.".to_string()
            });
        }

        let balances = self.held_balances(state, curves)?;
        let weights = curves.weights_u256();

        // Compute the units the deposit is worth.
        let units = deposit_amounts.iter()
            .zip(&balances)
            .zip(&weights)
            .filter(|((amount, _), _)| !amount.is_zero())
            .try_fold(U256::ZERO, |acc, ((amount, balance), weight)| {
                let units_for_asset = curves.curve.calc_units(U256::new(amount.u128()), *balance, *weight)?;
                acc.checked_add(units_for_asset).ok_or(ContractError::ArithmeticError {})
            })?;

        // Subtract the vault fee from the units so that deposits and withdrawals cannot be used
        // as a fee free swap. The governance fee is not taken.
        let units = mul_wad_down(
            units,
            WAD.wrapping_sub(U256::from(state.fees.vault_fee().u64()))      // 'wrapping_sub' safe, as 'vault_fee' <= WAD
        )?;

        // The escrowed vault tokens are not included in the supply (return less).
        let supply = U256::new(state.vault_token.total_supply().u128());

        let share = match curves.curve {
            SwapCurve::Volatile => volatile::calc_price_curve_limit_share(units, curves.weights_sum())?,
            SwapCurve::Amplified { one_minus_amp } => {
                let one_minus_amp = I256::new(one_minus_amp);
                let weighted_alpha_0_ampped = amplified::calc_weighted_alpha_0_ampped(
                    &balances,
                    &weights,
                    one_minus_amp,
                    state.unit_tracker
                )?;
                amplified::calc_price_curve_limit_share(
                    units,
                    n_weighted_alpha_0_ampped(weighted_alpha_0_ampped, assets.len())?,
                    one_minus_amp
                )?
            }
        };

        // NOTE: 'supply' is not in WAD terms, hence neither is the result.
        let out = uint128_from_u256(mul_wad_down(supply, share)?)?;

        if min_out > out {
            debug!(vault = %self.address, %out, %min_out, "deposit return insufficient");
            return Err(ContractError::InsufficientReturn { out, min_out });
        }

        // Deposits increase both the max and the used amplified limit capacity.
        let mut security_limit = state.security_limit.clone();
        if let SwapCurve::Amplified { .. } = curves.curve {
            let weighted_deposit_sum = weighted_sum(&deposit_amounts, &weights)?;
            security_limit.increase_max(weighted_deposit_sum);
            security_limit.increase_used(weighted_deposit_sum)?;
        }

        state.vault_token.mint(out, sender)?;

        let pull_result = self.execute_asset_msgs(
            assets.iter()
                .zip(&deposit_amounts)
                .map(|(asset, amount)| asset.receive_asset(&self.address, sender, *amount))
                .collect()
        );

        if let Err(err) = pull_result {
            state.vault_token.burn(out, sender)?;    // Never fails, the vault tokens have just been minted
            return Err(err);
        }

        state.security_limit = security_limit;

        info!(vault = %self.address, account = %sender, deposit_amounts = ?deposit_amounts, %units, mint = %out, "deposit");

        Ok(
            VaultResponse::with_data(out)
                .add_event(deposit_event(sender.to_string(), out, deposit_amounts))
        )
    }


    /// Withdraw an even amount of assets from the vault by burning `vault_tokens`.
    ///
    /// **NOTE**: This is the only way to withdraw 100% of the vault liquidity.
    ///
    /// # Arguments:
    /// * `sender` - The vault token owner.
    /// * `vault_tokens` - The vault tokens to burn.
    /// * `min_out` - The minimum output of each asset.
    ///
    pub fn withdraw_all(
        &self,
        sender: &Addr,
        vault_tokens: Uint128,
        min_out: Vec<Uint128>
    ) -> Result<VaultResponse<Vec<Uint128>>, ContractError> {

        let mut guard = self.state.lock();
        let state = &mut *guard;

        let curves = state.curves()?;
        let assets = curves.assets.get_assets().clone();

        if min_out.len() != assets.len() {
            return Err(ContractError::InvalidParameters {
                reason: "Invalid min_out count.".to_string()
            });
        }

        if vault_tokens.is_zero() {
            return Err(ContractError::InvalidParameters {
                reason: "The withdrawn vault tokens must be nonzero.".to_string()
            });
        }

        // Include the escrowed vault tokens in the supply (return less).
        let effective_supply = Self::effective_supply(state);
        let balances = self.active_balances(state, curves)?;
        let weights = curves.weights_u256();
        let amount = U256::new(vault_tokens.u128());

        let withdraw_amounts = match curves.curve {
            SwapCurve::Volatile => {
                if amount > effective_supply {
                    return Err(ContractError::CurveOverflow {});
                }
                // 'wrapping_mul' safe, as U256.max > Uint128.max * Uint128.max
                balances.iter()
                    .map(|balance| balance.wrapping_mul(amount) / effective_supply)
                    .collect::<Vec<U256>>()
            },
            SwapCurve::Amplified { one_minus_amp } => {
                let one_minus_amp = I256::new(one_minus_amp);
                let units = amplified::calc_liquidity_units(
                    amount,
                    effective_supply,
                    self.weighted_alpha_0_ampped(state, curves, one_minus_amp)?,
                    one_minus_amp
                )?;
                balances.iter()
                    .zip(&weights)
                    .map(|(balance, weight)| amplified::calc_withdrawal(units, *balance, *weight, one_minus_amp))
                    .collect::<Result<Vec<U256>, ContractError>>()?
            }
        };

        let withdraw_amounts = withdraw_amounts.into_iter()
            .zip(&min_out)
            .map(|(withdraw_amount, asset_min_out)| {
                let withdraw_amount = uint128_from_u256(withdraw_amount)?;
                if *asset_min_out > withdraw_amount {
                    debug!(vault = %self.address, out = %withdraw_amount, min_out = %asset_min_out, "withdraw return insufficient");
                    return Err(ContractError::InsufficientReturn { out: withdraw_amount, min_out: *asset_min_out });
                }
                Ok(withdraw_amount)
            })
            .collect::<Result<Vec<Uint128>, ContractError>>()?;

        let mut security_limit = state.security_limit.clone();
        if let SwapCurve::Amplified { .. } = curves.curve {
            let weighted_withdraw_sum = weighted_sum(&withdraw_amounts, &weights)?;
            security_limit.decrease_max(weighted_withdraw_sum)?;
            security_limit.release(weighted_withdraw_sum);
        }

        state.vault_token.burn(vault_tokens, sender)?;

        let send_result = self.execute_asset_msgs(
            assets.iter()
                .zip(&withdraw_amounts)
                .map(|(asset, amount)| asset.send_asset(*amount, sender))
                .collect()
        );

        if let Err(err) = send_result {
            state.vault_token.mint(vault_tokens, sender)?;   // Never fails, the vault tokens have just been burnt
            return Err(err);
        }

        state.security_limit = security_limit;

        info!(vault = %self.address, account = %sender, burn = %vault_tokens, withdraw_amounts = ?withdraw_amounts, "withdraw");

        Ok(
            VaultResponse::with_data(withdraw_amounts.clone())
                .add_event(withdraw_event(sender.to_string(), vault_tokens, withdraw_amounts))
        )
    }



    // Liquidity Swaps **********************************************************************************************************

    /// Initiate a cross chain liquidity swap.
    ///
    /// The vault tokens are burnt, and their value is sent as units to the connected vault, where
    /// they are deposited. The burnt amount is held in escrow under the id of the emitted packet
    /// until the swap is confirmed or rejected.
    ///
    /// # Arguments:
    /// * `interface` - The chain interface through which to emit the swap.
    /// * `sender` - The vault token owner.
    /// * `block` - The current block.
    /// * `msg` - The swap order.
    ///
    pub fn send_liquidity(
        &self,
        interface: &dyn ChainInterface,
        sender: &Addr,
        block: &BlockInfo,
        msg: SendLiquidityMsg
    ) -> Result<VaultResponse<SendLiquidityResponse>, ContractError> {

        let mut guard = self.state.lock();
        let state = &mut *guard;

        // Only the configured interface may carry the vault's swaps
        state.only_chain_interface(interface.address())?;

        // Only allow connected vaults
        state.only_connected(&msg.channel_id, &msg.to_vault)?;

        validate_encoded_address(&msg.to_account, "to_account")?;
        let fallback_account = validate_address(&msg.fallback_account, "fallback_account")?;

        if msg.amount.is_zero() {
            return Err(ContractError::InvalidParameters { reason: "The swap amount must be nonzero.".to_string() });
        }

        let curves = state.curves()?;
        let curve = curves.curve;

        // Include the escrowed vault tokens in the supply (return less).
        let effective_supply = Self::effective_supply(state);
        let amount = U256::new(msg.amount.u128());

        // Compute the units the vault tokens are worth when withdrawn evenly.
        let units = match curve {
            SwapCurve::Volatile => volatile::calc_liquidity_units(amount, effective_supply, curves.weights_sum())?,
            SwapCurve::Amplified { one_minus_amp } => {
                let one_minus_amp = I256::new(one_minus_amp);
                let units_per_asset = amplified::calc_liquidity_units(
                    amount,
                    effective_supply,
                    self.weighted_alpha_0_ampped(state, curves, one_minus_amp)?,
                    one_minus_amp
                )?;
                n_weighted_alpha_0_ampped(units_per_asset, curves.weights.len())?
            }
        };

        let unit_tracker = match curve {
            SwapCurve::Volatile => state.unit_tracker,
            SwapCurve::Amplified { .. } => checked_add_units(state.unit_tracker, units)?
        };

        let packet_id = interface.next_packet_id(&msg.channel_id)?;

        let block_number = block.height as u32;
        let send_liquidity_hash = compute_send_liquidity_hash(
            msg.to_account.as_slice(),
            units,
            msg.amount,
            block_number
        );

        state.escrows.open_liquidity(
            packet_id.clone(),
            msg.amount,
            fallback_account,
            send_liquidity_hash,
            block
        )?;

        if let Err(err) = state.vault_token.burn(msg.amount, sender) {
            state.escrows.cancel_liquidity(&packet_id);
            return Err(err);
        }

        let send_result = interface.send_cross_chain_liquidity(
            &self.address,
            block,
            &packet_id,
            SendCrossChainLiquidityMsg {
                channel_id: msg.channel_id.clone(),
                to_vault: msg.to_vault.clone(),
                to_account: msg.to_account.clone(),
                u: units,
                min_vault_tokens: msg.min_vault_tokens,
                min_reference_asset: msg.min_reference_asset,
                from_amount: msg.amount,
                block_number
            }
        );

        if let Err(err) = send_result {
            warn!(vault = %self.address, %packet_id, error = %err, "cross chain liquidity send failed");

            // Return the burnt vault tokens.
            if let Err(rollback_err) = state.vault_token.mint(msg.amount, sender) {
                error!(vault = %self.address, %packet_id, error = %rollback_err, "send liquidity rollback failed");
                return Err(ContractError::RollbackFailed {
                    packet_id,
                    cause: err.to_string(),
                    reason: rollback_err.to_string()
                });
            }

            state.escrows.cancel_liquidity(&packet_id);
            return Err(err);
        }

        // NOTE: The security limit adjustment is delayed until the swap confirmation is received.
        state.unit_tracker = unit_tracker;

        info!(
            vault = %self.address,
            account = %sender,
            %packet_id,
            amount = %msg.amount,
            %units,
            "send liquidity"
        );

        let event = send_liquidity_event(
            &packet_id,
            msg.to_vault,
            msg.to_account,
            msg.amount,
            msg.min_vault_tokens,
            msg.min_reference_asset,
            units
        );

        Ok(
            VaultResponse::with_data(SendLiquidityResponse { packet_id, units })
                .add_event(event)
        )
    }


    /// Complete a cross chain liquidity swap on the destination side: the units are deposited
    /// into the vault and the resulting vault tokens are minted to the recipient.
    ///
    /// **NOTE**: Only the chain interface may invoke this function.
    ///
    pub fn receive_liquidity(
        &self,
        sender: &Addr,
        block: &BlockInfo,
        msg: ReceiveLiquidityMsg
    ) -> Result<VaultResponse<Uint128>, ContractError> {

        let mut guard = self.state.lock();
        let state = &mut *guard;

        state.only_chain_interface(sender)?;

        // Only allow connected vaults
        state.only_connected(&msg.channel_id, &msg.from_vault)?;

        let to_account = validate_address(&msg.to_account, "to_account")?;

        let curves = state.curves()?;

        // The escrowed vault tokens are not included in the supply (return less).
        let supply = U256::new(state.vault_token.total_supply().u128());

        let mut security_limit = state.security_limit.clone();
        let mut unit_tracker = state.unit_tracker;

        let (share, reference_amount) = match curves.curve {
            SwapCurve::Volatile => {
                security_limit.consume(block.time, msg.u)?;

                let share = volatile::calc_price_curve_limit_share(msg.u, curves.weights_sum())?;

                let reference_amount = match msg.min_reference_asset.is_zero() {
                    true => U256::ZERO,
                    false => volatile::calc_reference_amount(
                        &self.held_balances(state, curves)?,
                        &curves.weights_u256()
                    )?
                };

                (share, reference_amount)
            },
            SwapCurve::Amplified { one_minus_amp } => {
                let one_minus_amp = I256::new(one_minus_amp);

                let weighted_alpha_0_ampped = self.weighted_alpha_0_ampped(state, curves, one_minus_amp)?;
                let n_weighted_alpha_0_ampped = n_weighted_alpha_0_ampped(weighted_alpha_0_ampped, curves.weights.len())?;

                // Units worth half the vault or more are rejected.
                if msg.u >= n_weighted_alpha_0_ampped {
                    warn!(vault = %self.address, units = %msg.u, %n_weighted_alpha_0_ampped, "liquidity units exceed the vault depth");
                    return Err(ContractError::SecurityLimitExceeded {
                        overflow: msg.u.wrapping_sub(n_weighted_alpha_0_ampped)    // 'wrapping_sub' safe, 'msg.u' >= 'n_weighted_alpha_0_ampped'
                    });
                }

                let share = amplified::calc_price_curve_limit_share(msg.u, n_weighted_alpha_0_ampped, one_minus_amp)?;

                // w·a_0, i.e. the weighted balance of an asset of the equivalent balanced vault.
                let reference_amount = amplified::calc_reference_amount(weighted_alpha_0_ampped, one_minus_amp)?;

                // The security limit is charged twice the weighted balance equivalent of the units:
                //      2·n·w·a_0·(1 - ((n·(w·a_0)^(1-k) - u)/(n·(w·a_0)^(1-k)))^(1/(1-k)))
                let remaining_share = div_wad_down(
                    n_weighted_alpha_0_ampped.wrapping_sub(msg.u),      // 'wrapping_sub' safe, 'msg.u' < 'n_weighted_alpha_0_ampped'
                    n_weighted_alpha_0_ampped
                )?;
                let remaining_share_ampped = match remaining_share == U256::ZERO {
                    true => U256::ZERO,
                    false => pow_wad(remaining_share.as_i256(), WADWAD / one_minus_amp)?.as_u256()
                };
                let weighted_balance_equivalent = mul_wad_up(
                    reference_amount
                        .checked_mul(U256::from(curves.weights.len() as u64))
                        .ok_or(ContractError::ArithmeticError {})?,
                    WAD.saturating_sub(remaining_share_ampped)
                )?;
                security_limit.consume(
                    block.time,
                    weighted_balance_equivalent
                        .checked_mul(U256::from(2u64))
                        .ok_or(ContractError::ArithmeticError {})?
                )?;

                unit_tracker = checked_sub_units(unit_tracker, msg.u)?;

                (share, reference_amount)
            }
        };

        // NOTE: 'supply' is not in WAD terms, hence neither is the result.
        let out = uint128_from_u256(mul_wad_down(share, supply)?)?;

        if msg.min_vault_tokens > out {
            debug!(vault = %self.address, %out, min_out = %msg.min_vault_tokens, "receive liquidity return insufficient");
            return Err(ContractError::InsufficientReturn { out, min_out: msg.min_vault_tokens });
        }

        if !msg.min_reference_asset.is_zero() {

            // Compute the fraction of the reference amount the recipient owns. The escrowed vault
            // tokens are included in the supply so that the requirement holds even if all the
            // ongoing liquidity swaps revert. The minted vault tokens are included as well.
            let user_reference_amount = reference_amount
                .checked_mul(U256::new(out.u128()))
                .ok_or(ContractError::ArithmeticError {})?
                / Self::effective_supply(state).wrapping_add(U256::new(out.u128()));  // 'wrapping_add' safe, as U256.max >> Uint128.max

            let user_reference_amount = uint128_from_u256(user_reference_amount)?;

            if msg.min_reference_asset > user_reference_amount {
                debug!(
                    vault = %self.address,
                    out = %user_reference_amount,
                    min_out = %msg.min_reference_asset,
                    "receive liquidity reference amount insufficient"
                );
                return Err(ContractError::InsufficientReturn {
                    out: user_reference_amount,
                    min_out: msg.min_reference_asset
                });
            }
        }

        state.vault_token.mint(out, &to_account)?;

        state.security_limit = security_limit;
        state.unit_tracker = unit_tracker;

        info!(
            vault = %self.address,
            channel_id = %msg.channel_id,
            %to_account,
            units = %msg.u,
            mint = %out,
            "receive liquidity"
        );

        Ok(
            VaultResponse::with_data(out)
                .add_event(
                    receive_liquidity_event(
                        msg.channel_id,
                        msg.from_vault,
                        to_account.to_string(),
                        msg.u,
                        out,
                        msg.from_amount,
                        msg.from_block_number_mod
                    )
                )
        )
    }


    /// Dry run of `receive_liquidity`: the vault tokens minted for `units`. The security limit
    /// is not checked.
    pub fn calc_receive_liquidity(&self, units: U256) -> Result<Uint128, ContractError> {

        let state = self.state.lock();
        let curves = state.curves()?;

        let share = match curves.curve {
            SwapCurve::Volatile => volatile::calc_price_curve_limit_share(units, curves.weights_sum())?,
            SwapCurve::Amplified { one_minus_amp } => {
                let one_minus_amp = I256::new(one_minus_amp);
                let weighted_alpha_0_ampped = self.weighted_alpha_0_ampped(&state, curves, one_minus_amp)?;
                amplified::calc_price_curve_limit_share(
                    units,
                    n_weighted_alpha_0_ampped(weighted_alpha_0_ampped, curves.weights.len())?,
                    one_minus_amp
                )?
            }
        };

        uint128_from_u256(mul_wad_down(share, U256::new(state.vault_token.total_supply().u128()))?)
    }


    /// Handle the confirmation of a successful liquidity swap. The escrowed vault tokens stay
    /// burnt.
    ///
    /// **NOTE**: Only the chain interface may invoke this function.
    ///
    pub fn on_send_liquidity_success(
        &self,
        sender: &Addr,
        msg: SendLiquidityAckMsg
    ) -> Result<VaultResponse, ContractError> {

        let mut guard = self.state.lock();
        let state = &mut *guard;

        state.only_chain_interface(sender)?;

        let send_liquidity_hash = compute_send_liquidity_hash(
            msg.to_account.as_slice(),
            msg.u,
            msg.escrow_amount,
            msg.block_number_mod
        );

        let curve = state.curves()?.curve;

        state.escrows
            .resolve_liquidity(&msg.packet_id, &send_liquidity_hash, EscrowState::Released)
            .map_err(|err| log_escrow_anomaly(&self.address, &msg.packet_id, err))?;

        // The amplified security limit is not increased, as the weighted value of the
        // liquidity is not tracked.
        if let SwapCurve::Volatile = curve {
            state.security_limit.release(msg.u);
        }

        info!(vault = %self.address, packet_id = %msg.packet_id, escrow_amount = %msg.escrow_amount, "send liquidity success");

        Ok(
            VaultResponse::new()
                .add_event(
                    send_liquidity_success_event(
                        &msg.packet_id,
                        msg.to_account,
                        msg.u,
                        msg.escrow_amount,
                        msg.block_number_mod
                    )
                )
        )
    }


    /// Handle the rejection (or timeout) of a liquidity swap. The escrowed vault tokens are
    /// minted back to the fallback account.
    ///
    /// **NOTE**: Only the chain interface may invoke this function.
    ///
    pub fn on_send_liquidity_failure(
        &self,
        sender: &Addr,
        msg: SendLiquidityAckMsg
    ) -> Result<VaultResponse, ContractError> {

        let mut guard = self.state.lock();
        let state = &mut *guard;

        state.only_chain_interface(sender)?;

        let send_liquidity_hash = compute_send_liquidity_hash(
            msg.to_account.as_slice(),
            msg.u,
            msg.escrow_amount,
            msg.block_number_mod
        );

        let (fallback_account, amount) = state.escrows
            .get_open_liquidity(&msg.packet_id, &send_liquidity_hash)
            .map(|entry| (entry.fallback_account.clone(), entry.amount))
            .map_err(|err| log_escrow_anomaly(&self.address, &msg.packet_id, err))?;

        let unit_tracker = match state.curves()?.curve {
            SwapCurve::Volatile => state.unit_tracker,
            SwapCurve::Amplified { .. } => checked_sub_units(state.unit_tracker, msg.u)?
        };

        state.vault_token.mint(amount, &fallback_account)?;

        state.escrows.resolve_liquidity(&msg.packet_id, &send_liquidity_hash, EscrowState::Refunded)?;
        state.unit_tracker = unit_tracker;

        info!(
            vault = %self.address,
            packet_id = %msg.packet_id,
            %fallback_account,
            escrow_amount = %amount,
            "send liquidity failure, vault tokens refunded"
        );

        Ok(
            VaultResponse::new()
                .add_event(
                    send_liquidity_failure_event(
                        &msg.packet_id,
                        msg.to_account,
                        msg.u,
                        msg.escrow_amount,
                        msg.block_number_mod
                    )
                )
        )
    }
}
