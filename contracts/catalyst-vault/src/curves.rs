use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Uint128, Uint64};
use fixed_point_math::{AsI256, I256, U256, WAD};

use crate::error::ContractError;

pub mod volatile;
pub mod amplified;

/// Local swaps with an output this many times larger than the input are charged a haircut.
pub const SMALL_SWAP_RATIO  : U256 = U256::new(1000000000000u128);             // 1e12
pub const SMALL_SWAP_RETURN : U256 = U256::new(950000000000000000u128);        // 0.95 * WAD

/// The units computed by the amplified curve are reduced by (w·(a + input))^(1-k) divided by
/// this value, as the difference of two 'pow_wad' results carries their rounding error.
pub const UNITS_ERROR_MARGIN_DIVISOR : U256 = U256::new(1000000000000000u128); // 1e15

/// The fraction of the balance paid out by a curve limit is reduced by this value (in WAD
/// notation). The amplified curve scales it by the 1/(1-k) exponent.
pub const OUTPUT_ERROR_MARGIN : U256 = U256::new(1000u128);                    // 1e-15 * WAD


/// The bonding curve family of a vault, selected from the amplification parameter at setup.
#[cw_serde]
#[derive(Copy)]
pub enum SwapCurve {
    Volatile,
    Amplified {
        /// One minus the amplification (in WAD notation).
        one_minus_amp: i128
    }
}

impl SwapCurve {

    /// Select the swap curve for the given amplification (in WAD notation).
    ///
    /// An amplification of exactly one selects the volatile curve, values within (0, 1) the
    /// amplified one.
    pub fn from_amplification(amplification: Uint64) -> Result<Self, ContractError> {

        let amplification = amplification.u64() as u128;
        let wad = WAD.as_u128();

        if amplification == wad {
            return Ok(SwapCurve::Volatile);
        }

        if amplification == 0 || amplification > wad {
            return Err(ContractError::InvalidAmplification {});
        }

        Ok(SwapCurve::Amplified {
            one_minus_amp: (wad - amplification) as i128     // Casting safe, as the value is < WAD
        })
    }


    /// The amplification of the curve (in WAD notation).
    pub fn amplification(&self) -> Uint64 {
        match self {
            SwapCurve::Volatile => Uint64::new(WAD.as_u64()),
            SwapCurve::Amplified { one_minus_amp } => Uint64::new(WAD.as_u64() - *one_minus_amp as u64)
        }
    }


    /// Compute the units the `input` amount is worth when sold into an asset with balance `a`
    /// and weight `w`.
    pub fn calc_units(
        &self,
        input: U256,
        a: U256,
        w: U256
    ) -> Result<U256, ContractError> {

        if a == U256::ZERO {
            return Err(ContractError::CurveOverflow {});
        }

        match self {
            SwapCurve::Volatile => volatile::calc_price_curve_area(input, a, w),
            SwapCurve::Amplified { one_minus_amp } => amplified::calc_price_curve_area(
                input,
                a,
                w,
                I256::new(*one_minus_amp)
            )
        }
    }


    /// Compute the output amount of an asset with balance `b` and weight `w` for the
    /// given units. The result never exceeds `b`.
    pub fn calc_output(
        &self,
        u: U256,
        b: U256,
        w: U256
    ) -> Result<U256, ContractError> {

        if b == U256::ZERO {
            return Ok(U256::ZERO);
        }

        let output = match self {
            SwapCurve::Volatile => volatile::calc_price_curve_limit(u, b, w),
            SwapCurve::Amplified { one_minus_amp } => amplified::calc_price_curve_limit(
                u,
                b,
                w,
                I256::new(*one_minus_amp)
            )
        }?;

        if output >= b && u != U256::ZERO {
            return Err(ContractError::CurveOverflow {});
        }

        Ok(output)
    }


    /// Compute the units sent for a cross chain swap of `input`. Small amplified swaps are
    /// charged a haircut.
    pub fn calc_send_units(
        &self,
        input: U256,
        a: U256,
        w: U256
    ) -> Result<U256, ContractError> {

        let units = self.calc_units(input, a, w)?;

        match self {
            SwapCurve::Amplified { .. } if a / SMALL_SWAP_RATIO >= input => {
                Ok(units.wrapping_mul(SMALL_SWAP_RETURN) / WAD)     // 'wrapping_mul' safe, units are bounded by 'pow_wad' results
            },
            _ => Ok(units)
        }
    }


    /// Compute the output of a local swap of `input` from an asset (balance `a`, weight `w_a`)
    /// into another asset (balance `b`, weight `w_b`).
    pub fn calc_local_swap(
        &self,
        input: U256,
        a: U256,
        b: U256,
        w_a: U256,
        w_b: U256
    ) -> Result<U256, ContractError> {

        if a == U256::ZERO {
            return Err(ContractError::CurveOverflow {});
        }

        if b == U256::ZERO || input == U256::ZERO {
            return Ok(U256::ZERO);
        }

        match self {
            SwapCurve::Volatile => {
                if w_a == w_b {
                    volatile::calc_equal_weights_swap(input, a, b)
                }
                else {
                    let output = volatile::calc_combined_price_curves(input, a, b, w_a, w_b)?;
                    if output >= b {
                        return Err(ContractError::CurveOverflow {});
                    }
                    Ok(output)
                }
            },
            SwapCurve::Amplified { one_minus_amp } => {
                let output = amplified::calc_combined_price_curves(
                    input,
                    a,
                    b,
                    w_a,
                    w_b,
                    I256::new(*one_minus_amp)
                )?;

                if output >= b {
                    return Err(ContractError::CurveOverflow {});
                }

                if output / SMALL_SWAP_RATIO >= input {
                    return Ok(output.wrapping_mul(SMALL_SWAP_RETURN) / WAD);   // 'wrapping_mul' safe, as 'output' < 'b' <= Uint128::MAX
                }

                Ok(output)
            }
        }
    }


    /// Compute the curve invariant of a set of balances.
    pub fn calc_invariant(
        &self,
        balances: &[U256],
        weights: &[U256]
    ) -> Result<U256, ContractError> {
        match self {
            SwapCurve::Volatile => volatile::calc_invariant(balances, weights),
            SwapCurve::Amplified { one_minus_amp } => amplified::calc_invariant(
                balances,
                weights,
                I256::new(*one_minus_amp)
            )
        }
    }
}


fn to_u256_values<T: Copy + Into<u128>>(values: &[T]) -> Vec<U256> {
    values.iter()
        .map(|value| U256::new((*value).into()))
        .collect()
}


/// Price a hypothetical swap of `amount` of asset `from_index` into asset `to_index`.
///
/// Pure function of its arguments: no fees are taken, and the output never exceeds the balance
/// of the output asset.
///
/// # Arguments:
/// * `balances` - The asset balances.
/// * `weights` - The asset weights.
/// * `amplification` - The curve amplification (in WAD notation).
/// * `from_index` - The index of the input asset.
/// * `to_index` - The index of the output asset.
/// * `amount` - The input amount.
///
pub fn quote(
    balances: &[Uint128],
    weights: &[Uint64],
    amplification: Uint64,
    from_index: usize,
    to_index: usize,
    amount: Uint128
) -> Result<Uint128, ContractError> {

    if balances.len() != weights.len() {
        return Err(ContractError::InvalidParameters {
            reason: "Balances and weights must have the same length.".to_string()
        });
    }

    if from_index == to_index {
        return Err(ContractError::InvalidParameters {
            reason: "The input and output assets must differ.".to_string()
        });
    }

    let curve = SwapCurve::from_amplification(amplification)?;

    let (a, w_a) = balances.get(from_index)
        .zip(weights.get(from_index))
        .ok_or(ContractError::InvalidAssets {})?;
    let (b, w_b) = balances.get(to_index)
        .zip(weights.get(to_index))
        .ok_or(ContractError::InvalidAssets {})?;

    let output = curve.calc_local_swap(
        U256::new(amount.u128()),
        U256::new(a.u128()),
        U256::new(b.u128()),
        U256::from(w_a.u64()),
        U256::from(w_b.u64())
    )?;

    Ok(Uint128::new(output.as_u128()))      // Casting safe, as 'output' < 'b'
}


/// Compute the invariant value of a set of balances, weights and amplification
/// (in WAD notation).
pub fn invariant(
    balances: &[Uint128],
    weights: &[Uint64],
    amplification: Uint64
) -> Result<U256, ContractError> {

    if balances.len() != weights.len() {
        return Err(ContractError::InvalidParameters {
            reason: "Balances and weights must have the same length.".to_string()
        });
    }

    let curve = SwapCurve::from_amplification(amplification)?;

    let balances: Vec<u128> = balances.iter().map(|balance| balance.u128()).collect();
    let weights: Vec<u64> = weights.iter().map(|weight| weight.u64()).collect();

    curve.calc_invariant(
        &to_u256_values(&balances),
        &to_u256_values(&weights)
    )
}
