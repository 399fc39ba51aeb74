use cosmwasm_std::{Uint128, Uint64};
use fixed_point_math::{mul_wad_down, mul_wad_up, U256};

use crate::error::ContractError;

pub const MAX_VAULT_FEE             : Uint64 = Uint64::new(1000000000000000000u64);       // 100%
pub const MAX_GOVERNANCE_FEE_SHARE  : Uint64 = Uint64::new(75u64 * 10000000000000000u64); // 75%


/// A fee split between the vault and governance.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FeeSplit {
    pub gross_fee: Uint128,
    pub vault_retained: Uint128,
    pub governance_portion: Uint128
}


/// Vault fee configuration: the fee charged on every swap input, and the share of it that is
/// routed to governance.
#[derive(Clone, Debug, PartialEq)]
pub struct FeeDistributor {
    vault_fee: Uint64,
    governance_fee_share: Uint64
}

impl FeeDistributor {

    pub fn new(vault_fee: Uint64, governance_fee_share: Uint64) -> Result<Self, ContractError> {
        let mut distributor = Self {
            vault_fee: Uint64::zero(),
            governance_fee_share: Uint64::zero()
        };
        distributor.set_vault_fee(vault_fee)?;
        distributor.set_governance_fee_share(governance_fee_share)?;
        Ok(distributor)
    }

    pub fn vault_fee(&self) -> Uint64 {
        self.vault_fee
    }

    pub fn governance_fee_share(&self) -> Uint64 {
        self.governance_fee_share
    }


    /// Set the vault fee (18 decimals).
    pub fn set_vault_fee(&mut self, fee: Uint64) -> Result<(), ContractError> {

        if fee > MAX_VAULT_FEE {
            return Err(
                ContractError::InvalidVaultFee { requested_fee: fee, max_fee: MAX_VAULT_FEE }
            )
        }

        self.vault_fee = fee;
        Ok(())
    }


    /// Set the governance fee share (18 decimals).
    pub fn set_governance_fee_share(&mut self, fee: Uint64) -> Result<(), ContractError> {

        if fee > MAX_GOVERNANCE_FEE_SHARE {
            return Err(
                ContractError::InvalidGovernanceFee { requested_fee: fee, max_fee: MAX_GOVERNANCE_FEE_SHARE }
            )
        }

        self.governance_fee_share = fee;
        Ok(())
    }


    /// Compute the fee charged on a swap input of `amount` (rounded up, never above `amount`).
    pub fn calc_vault_fee(&self, amount: Uint128) -> Result<Uint128, ContractError> {

        let fee = mul_wad_up(
            U256::new(amount.u128()),
            U256::from(self.vault_fee.u64())
        )?;

        Ok(Uint128::new(fee.as_u128()).min(amount))     // Casting safe, as fee <= amount (fee share <= 1)
    }


    /// Split a gross fee into the vault retained portion and the governance portion
    /// (rounded down).
    pub fn split(&self, gross_fee: Uint128) -> Result<FeeSplit, ContractError> {

        let governance_portion: Uint128 = Uint128::new(
            mul_wad_down(
                U256::new(gross_fee.u128()),
                U256::from(self.governance_fee_share.u64())
            )?.as_u128()        // Casting safe, as the share is < 1
        );

        Ok(FeeSplit {
            gross_fee,
            vault_retained: gross_fee - governance_portion,     // Safe, 'governance_portion' <= 'gross_fee'
            governance_portion
        })
    }


    /// Compute and split the fee of a swap input of `amount`.
    pub fn assess(&self, amount: Uint128) -> Result<FeeSplit, ContractError> {
        self.split(self.calc_vault_fee(amount)?)
    }
}



#[cfg(test)]
mod fees_tests {
    use cosmwasm_std::{Uint128, Uint64};
    use proptest::prelude::*;

    use crate::error::ContractError;

    use super::{FeeDistributor, MAX_GOVERNANCE_FEE_SHARE, MAX_VAULT_FEE};

    #[test]
    fn test_fee_rounding() {

        let distributor = FeeDistributor::new(
            Uint64::new(3000000000000000u64),       // 0.3%
            Uint64::new(500000000000000000u64)      // 50%
        ).unwrap();



        // Tested action: assess the fee of a swap
        let split = distributor.assess(Uint128::new(1001)).unwrap();



        // 1001 * 0.003 = 3.003, rounded up
        assert_eq!(split.gross_fee, Uint128::new(4));
        assert_eq!(split.governance_portion, Uint128::new(2));
        assert_eq!(split.vault_retained, Uint128::new(2));
    }

    #[test]
    fn test_zero_fee() {

        let distributor = FeeDistributor::new(Uint64::zero(), MAX_GOVERNANCE_FEE_SHARE).unwrap();

        let split = distributor.assess(Uint128::new(1000)).unwrap();

        assert_eq!(split.gross_fee, Uint128::zero());
        assert_eq!(split.governance_portion, Uint128::zero());
        assert_eq!(split.vault_retained, Uint128::zero());
    }

    #[test]
    fn test_invalid_fees() {

        assert_eq!(
            FeeDistributor::new(MAX_VAULT_FEE + Uint64::one(), Uint64::zero()),
            Err(ContractError::InvalidVaultFee {
                requested_fee: MAX_VAULT_FEE + Uint64::one(),
                max_fee: MAX_VAULT_FEE
            })
        );

        assert_eq!(
            FeeDistributor::new(Uint64::zero(), MAX_GOVERNANCE_FEE_SHARE + Uint64::one()),
            Err(ContractError::InvalidGovernanceFee {
                requested_fee: MAX_GOVERNANCE_FEE_SHARE + Uint64::one(),
                max_fee: MAX_GOVERNANCE_FEE_SHARE
            })
        );
    }

    proptest! {

        #[test]
        fn prop_fee_split_conservation(
            amount in 0u128..u128::MAX / 2,
            vault_fee in 0u64..=MAX_VAULT_FEE.u64(),
            governance_fee_share in 0u64..=MAX_GOVERNANCE_FEE_SHARE.u64()
        ) {
            let distributor = FeeDistributor::new(
                Uint64::new(vault_fee),
                Uint64::new(governance_fee_share)
            ).unwrap();

            let split = distributor.assess(Uint128::new(amount)).unwrap();

            prop_assert_eq!(split.vault_retained + split.governance_portion, split.gross_fee);
            prop_assert!(split.gross_fee <= Uint128::new(amount));
        }
    }
}
