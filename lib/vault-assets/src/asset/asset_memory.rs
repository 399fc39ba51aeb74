use std::collections::{HashMap, HashSet};

use cosmwasm_std::{Addr, Uint128};
use cw20::Cw20ExecuteMsg;
use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::{asset::{AssetLedger, AssetMsg}, error::AssetError};


/// In-memory fungible asset ledger with cw20 balance and allowance semantics.
///
/// Message batches are applied to a copy of the ledger state which replaces the live state only
/// once every message of the batch has succeeded.
#[derive(Default)]
pub struct MemoryLedger {
    state: Mutex<LedgerState>
}

#[derive(Default, Clone)]
struct LedgerState {
    assets: HashSet<String>,
    balances: HashMap<(String, Addr), Uint128>,
    allowances: HashMap<(String, Addr, Addr), Uint128>
}

impl MemoryLedger {

    pub fn new() -> Self {
        Self::default()
    }


    /// Register a new asset on the ledger.
    pub fn create_asset(&self, asset_ref: &str) -> Result<(), AssetError> {

        let mut state = self.state.lock();

        if !state.assets.insert(asset_ref.to_owned()) {
            return Err(AssetError::AssetAlreadyExists { asset: asset_ref.to_owned() });
        }

        debug!(asset = asset_ref, "asset created");
        Ok(())
    }


    /// Issue `amount` of an asset to `recipient`.
    pub fn mint(
        &self,
        asset_ref: &str,
        recipient: &Addr,
        amount: Uint128
    ) -> Result<(), AssetError> {

        let mut state = self.state.lock();

        state.verify_asset(asset_ref)?;
        state.credit(asset_ref, recipient, amount)?;

        debug!(asset = asset_ref, %recipient, %amount, "asset minted");
        Ok(())
    }


    /// Convenience wrapper around `execute` to grant an allowance.
    pub fn approve(
        &self,
        asset_ref: &str,
        owner: &Addr,
        spender: &Addr,
        amount: Uint128
    ) -> Result<(), AssetError> {
        self.execute(
            owner,
            vec![AssetMsg {
                asset_ref: asset_ref.to_owned(),
                msg: Cw20ExecuteMsg::IncreaseAllowance {
                    spender: spender.to_string(),
                    amount,
                    expires: None
                }
            }]
        )
    }


    /// Convenience wrapper around `execute` to transfer funds from `from` to `to`.
    pub fn transfer(
        &self,
        asset_ref: &str,
        from: &Addr,
        to: &Addr,
        amount: Uint128
    ) -> Result<(), AssetError> {
        self.execute(
            from,
            vec![AssetMsg {
                asset_ref: asset_ref.to_owned(),
                msg: Cw20ExecuteMsg::Transfer {
                    recipient: to.to_string(),
                    amount
                }
            }]
        )
    }
}

impl AssetLedger for MemoryLedger {

    fn balance_of(&self, asset_ref: &str, account: &Addr) -> Result<Uint128, AssetError> {

        let state = self.state.lock();

        state.verify_asset(asset_ref)?;
        Ok(state.balance(asset_ref, account))
    }


    fn allowance(&self, asset_ref: &str, owner: &Addr, spender: &Addr) -> Result<Uint128, AssetError> {

        let state = self.state.lock();

        state.verify_asset(asset_ref)?;
        Ok(state.allowance(asset_ref, owner, spender))
    }


    fn execute(&self, sender: &Addr, msgs: Vec<AssetMsg>) -> Result<(), AssetError> {

        let mut state = self.state.lock();

        let mut pending = state.clone();
        msgs.iter()
            .try_for_each(|msg| pending.apply(sender, msg))?;

        *state = pending;

        trace!(%sender, count = msgs.len(), "asset messages executed");
        Ok(())
    }
}

impl LedgerState {

    fn verify_asset(&self, asset_ref: &str) -> Result<(), AssetError> {
        if !self.assets.contains(asset_ref) {
            return Err(AssetError::AssetNotFound { asset: asset_ref.to_owned() });
        }
        Ok(())
    }

    fn balance(&self, asset_ref: &str, account: &Addr) -> Uint128 {
        self.balances
            .get(&(asset_ref.to_owned(), account.clone()))
            .copied()
            .unwrap_or_default()
    }

    fn allowance(&self, asset_ref: &str, owner: &Addr, spender: &Addr) -> Uint128 {
        self.allowances
            .get(&(asset_ref.to_owned(), owner.clone(), spender.clone()))
            .copied()
            .unwrap_or_default()
    }

    fn credit(&mut self, asset_ref: &str, account: &Addr, amount: Uint128) -> Result<(), AssetError> {
        let balance = self.balances
            .entry((asset_ref.to_owned(), account.clone()))
            .or_default();

        *balance = balance.checked_add(amount)
            .map_err(|err| AssetError::Std(err.into()))?;

        Ok(())
    }

    fn debit(&mut self, asset_ref: &str, account: &Addr, amount: Uint128) -> Result<(), AssetError> {
        let balance = self.balance(asset_ref, account);

        if balance < amount {
            return Err(AssetError::InsufficientBalance {
                asset: asset_ref.to_owned(),
                account: account.to_string(),
                balance,
                required: amount
            });
        }

        self.balances.insert(
            (asset_ref.to_owned(), account.clone()),
            balance - amount        // Safe, 'balance >= amount' checked above
        );

        Ok(())
    }

    fn apply(&mut self, sender: &Addr, asset_msg: &AssetMsg) -> Result<(), AssetError> {

        let asset_ref = asset_msg.asset_ref.as_str();
        self.verify_asset(asset_ref)?;

        match &asset_msg.msg {

            Cw20ExecuteMsg::Transfer { recipient, amount } => {
                self.debit(asset_ref, sender, *amount)?;
                self.credit(asset_ref, &Addr::unchecked(recipient), *amount)
            },

            Cw20ExecuteMsg::TransferFrom { owner, recipient, amount } => {
                let owner = Addr::unchecked(owner);

                let allowance = self.allowance(asset_ref, &owner, sender);
                if allowance < *amount {
                    return Err(AssetError::InsufficientAllowance {
                        asset: asset_ref.to_owned(),
                        spender: sender.to_string(),
                        allowance,
                        required: *amount
                    });
                }

                self.debit(asset_ref, &owner, *amount)?;
                self.credit(asset_ref, &Addr::unchecked(recipient), *amount)?;

                self.allowances.insert(
                    (asset_ref.to_owned(), owner, sender.clone()),
                    allowance - *amount     // Safe, 'allowance >= amount' checked above
                );

                Ok(())
            },

            Cw20ExecuteMsg::IncreaseAllowance { spender, amount, .. } => {
                let allowance = self.allowances
                    .entry((asset_ref.to_owned(), sender.clone(), Addr::unchecked(spender)))
                    .or_default();

                *allowance = allowance.saturating_add(*amount);
                Ok(())
            },

            Cw20ExecuteMsg::DecreaseAllowance { spender, amount, .. } => {
                let allowance = self.allowances
                    .entry((asset_ref.to_owned(), sender.clone(), Addr::unchecked(spender)))
                    .or_default();

                *allowance = allowance.saturating_sub(*amount);
                Ok(())
            },

            _ => Err(AssetError::UnsupportedMessage {})
        }
    }
}
