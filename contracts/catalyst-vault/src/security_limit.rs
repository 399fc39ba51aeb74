use cosmwasm_std::{Timestamp, Uint64};
use fixed_point_math::{u256, U256};
use tracing::{debug, warn};

use crate::error::ContractError;

pub const DECAY_RATE: U256 = u256!("86400");    // 60*60*24


/// Inbound swap value cap. The used capacity decays linearly, releasing the whole
/// `max_limit_capacity` every `DECAY_RATE` seconds.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SecurityLimit {
    pub max_limit_capacity: U256,
    pub used_limit_capacity: U256,
    pub used_limit_capacity_timestamp: Uint64
}

impl SecurityLimit {

    pub fn new(max_limit_capacity: U256) -> Self {
        Self {
            max_limit_capacity,
            used_limit_capacity: U256::ZERO,
            used_limit_capacity_timestamp: Uint64::zero()
        }
    }


    /// Compute the security limit capacity at some time 'timestamp'.
    ///
    /// # Arguments:
    /// * `timestamp` - Time at which to compute the limit capacity (usually this is the current timestamp).
    ///
    pub fn capacity(&self, timestamp: Timestamp) -> Result<U256, ContractError> {

        let current_used = self.decayed_used_capacity(timestamp)?;

        Ok(self.max_limit_capacity.saturating_sub(current_used))
    }


    /// Verify that the security limit allows for the requested amount and update it accordingly.
    ///
    /// # Arguments:
    /// * `timestamp` - The current time.
    /// * `amount` - The amount by which to decrease the limit capacity.
    ///
    pub fn consume(
        &mut self,
        timestamp: Timestamp,
        amount: U256
    ) -> Result<(), ContractError> {

        let current_used = self.decayed_used_capacity(timestamp)?;
        let capacity = self.max_limit_capacity.saturating_sub(current_used);

        if amount > capacity {
            let overflow = amount.wrapping_sub(capacity);     // 'wrapping_sub' safe, as 'amount' > 'capacity'
            warn!(%amount, %capacity, %overflow, "security limit exceeded");
            return Err(ContractError::SecurityLimitExceeded { overflow });
        }

        self.used_limit_capacity = current_used
            .checked_add(amount)
            .ok_or(ContractError::ArithmeticError {})?;
        self.used_limit_capacity_timestamp = Uint64::new(timestamp.seconds());

        debug!(%amount, used = %self.used_limit_capacity, "security limit capacity consumed");
        Ok(())
    }


    /// Give back used capacity (e.g. the units of a confirmed outgoing swap).
    pub fn release(&mut self, amount: U256) {
        self.used_limit_capacity = self.used_limit_capacity.saturating_sub(amount);
    }


    /// Increase the maximum capacity, saturating at the numeric limit so that it never
    /// makes an acknowledgement fail.
    pub fn increase_max(&mut self, amount: U256) {
        self.max_limit_capacity = self.max_limit_capacity.saturating_add(amount);
    }


    /// Increase the used capacity without checking it against the maximum capacity. The used
    /// capacity may hence exceed the maximum.
    pub fn increase_used(&mut self, amount: U256) -> Result<(), ContractError> {
        self.used_limit_capacity = self.used_limit_capacity
            .checked_add(amount)
            .ok_or(ContractError::ArithmeticError {})?;
        Ok(())
    }


    pub fn decrease_max(&mut self, amount: U256) -> Result<(), ContractError> {
        self.max_limit_capacity = self.max_limit_capacity
            .checked_sub(amount)
            .ok_or(ContractError::ArithmeticError {})?;
        Ok(())
    }


    // Compute the 'released' limit capacity using the following linear decay:
    //      released_limit_capacity = max_limit_capacity * time_elapsed / decay_rate
    fn decayed_used_capacity(&self, timestamp: Timestamp) -> Result<U256, ContractError> {

        let time_elapsed = U256::from(
            timestamp.seconds()
                .checked_sub(self.used_limit_capacity_timestamp.u64())
                .ok_or(ContractError::ArithmeticError {})?
        );

        let released_limit_capacity = self.max_limit_capacity
            .checked_mul(time_elapsed)
            .map(|value| value / DECAY_RATE)
            .unwrap_or(U256::MAX);      // Only on overflow, in which case everything has been released

        Ok(self.used_limit_capacity.saturating_sub(released_limit_capacity))
    }
}
