use std::collections::HashMap;

use cosmwasm_std::{Addr, Uint128};
use tracing::debug;

use crate::error::ContractError;

pub const DECIMALS: u8 = 18;
pub const INITIAL_MINT_AMOUNT: Uint128 = Uint128::new(10u128.pow(DECIMALS as u32));


/// The vault token, representing proportional claims on the vault's asset basket.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VaultToken {
    name: String,
    symbol: String,
    total_supply: Uint128,
    balances: HashMap<Addr, Uint128>
}

impl VaultToken {

    pub fn new(name: String, symbol: String) -> Result<Self, ContractError> {

        if name.is_empty() || symbol.is_empty() {
            return Err(ContractError::InvalidParameters {
                reason: "The vault token name and symbol must not be empty.".to_string()
            });
        }

        Ok(Self {
            name,
            symbol,
            ..Default::default()
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn decimals(&self) -> u8 {
        DECIMALS
    }

    pub fn total_supply(&self) -> Uint128 {
        self.total_supply
    }

    pub fn balance(&self, account: &Addr) -> Uint128 {
        self.balances
            .get(account)
            .copied()
            .unwrap_or_default()
    }


    /// Mint vault tokens for `recipient`.
    pub fn mint(
        &mut self,
        amount: Uint128,
        recipient: &Addr
    ) -> Result<(), ContractError> {

        let total_supply = self.total_supply.checked_add(amount)?;

        let balance = self.balances
            .entry(recipient.clone())
            .or_default();
        *balance = balance.checked_add(amount)?;      // Never fails, as 'balance' <= 'total_supply'

        self.total_supply = total_supply;

        debug!(token = %self.symbol, %recipient, %amount, "vault tokens minted");
        Ok(())
    }


    /// Burn vault tokens of `owner`.
    pub fn burn(
        &mut self,
        amount: Uint128,
        owner: &Addr
    ) -> Result<(), ContractError> {

        let balance = self.balance(owner);
        if balance < amount {
            return Err(ContractError::InsufficientBalance {
                asset: self.symbol.clone(),
                account: owner.to_string(),
                balance,
                required: amount
            });
        }

        self.balances.insert(owner.clone(), balance - amount);
        self.total_supply = self.total_supply.checked_sub(amount)?;   // Never fails, as 'balance' <= 'total_supply'

        debug!(token = %self.symbol, %owner, %amount, "vault tokens burnt");
        Ok(())
    }
}
