use std::ops::{Shl, Shr};

use cosmwasm_std::{Uint128, Uint64};
use fixed_point_math::{I256, U256};


pub fn u256_to_f64(val: U256) -> f64 {
    let (hi, lo) = val.into_words();

    let mut out: f64 = lo as f64;
    out += (hi as f64) * 2_f64.powf(128_f64);

    out
}

pub fn i256_to_f64(val: I256) -> f64 {
    let (hi, lo) = val.into_words();

    let mut out: f64 = lo as f64;
    out += (hi as f64) * 2_f64.powf(128_f64);

    out
}

pub fn uint128_to_f64(val: Uint128) -> f64 {
    u256_to_f64(U256::new(val.u128()))
}

pub fn uint64_to_f64(val: Uint64) -> f64 {
    val.u64() as f64
}

pub fn f64_to_u256(val: f64) -> Result<U256, String> {
    // f64 standard => See IEEE-754-2008
    //      exponent: 11 bits
    //      mantissa: 52 bits

    if !val.is_finite() {
        return Err("Failed to convert f64 to U256: provided f64 is not finite.".to_string());
    }

    if val == 0. {
        return Ok(U256::ZERO);
    }

    let val_be_bytes = val.to_be_bytes();

    // Verify provided f64 value is not a negative number
    if val_be_bytes[0] & 0x80 != 0 {
        return Err("Failed to convert f64 to U256: provided f64 is a negative number.".to_string());
    }

    // Get the floating point number exponent
    let mut exponent_arr = [0_u8; 2];
    exponent_arr[..2].clone_from_slice(&val_be_bytes[..2]);

    let mut exponent: i16 = i16::from_be_bytes(exponent_arr);
    exponent = exponent.shr(4);                     // Only the 12 most significant bits are of interest
    exponent -= 1023_i16;                           // Subtract exponent offset (see IEEE-754-2008)

    // Get the floating point mantissa, and convert it into a u64 number
    let mut mantissa_arr = [0_u8; 8];
    mantissa_arr[1..].clone_from_slice(&val_be_bytes[1..]);

    // Keep the last 52 bits and set the implicit leading '1' of the mantissa
    mantissa_arr[1] = (mantissa_arr[1] & 0x0Fu8) | 0x10u8;

    let significant_figure = u64::from_be_bytes(mantissa_arr) as u128;

    // Net bit shift required to move the significant figure into the U256 number
    exponent -= 52;

    if exponent <= -64 {
        return Ok(U256::ZERO);
    }

    if exponent >= 256 || (exponent >= 193 && significant_figure.shr(256 - (exponent as u32)) != 0) {
        return Err("Failed to convert f64 to U256: overflow".to_string());
    }

    Ok(U256::from_words(

        if exponent > 0 && exponent < 256 {
            if      exponent == 128 { significant_figure                     }
            else if exponent < 128  { significant_figure.shr(128 - exponent) }
            else                    { significant_figure.shl(exponent - 128) }
        } else { 0_u128 },

        if exponent < 128 {
            if      exponent == 0   { significant_figure                }
            else if exponent < 0    { significant_figure.shr(-exponent) }
            else                    { significant_figure.shl(exponent)  }
        } else { 0_u128 },

    ))
}

pub fn f64_to_uint128(val: f64) -> Result<Uint128, String> {
    u128::try_from(f64_to_u256(val)?)
        .map(Uint128::new)
        .map_err(|_| "Overflow when casting from U256 to Uint128".to_string())
}



// Reference curves *************************************************************************************************************

/// Expected (floating point) result of a swap.
#[derive(Clone, Copy, Debug)]
pub struct ExpectedSwap {
    pub units: f64,
    pub to_amount: f64,
    pub vault_fee: f64,
    pub governance_fee: f64
}


fn split_fee(amount: f64, vault_fee: Option<Uint64>, governance_fee: Option<Uint64>) -> (f64, f64, f64) {
    let vault_fee = amount * vault_fee.map(uint64_to_f64).unwrap_or(0.) / 1e18;
    let governance_fee = vault_fee * governance_fee.map(uint64_to_f64).unwrap_or(0.) / 1e18;

    (amount - vault_fee, vault_fee, governance_fee)
}


/// Units of a volatile swap: w·ln((a+x)/a) (in WAD notation).
pub fn volatile_units(x: f64, a: f64, w: f64) -> f64 {
    w * ((a + x) / a).ln() * 1e18
}

/// Output of a volatile swap: b·(1-exp(-U/w)).
pub fn volatile_output(units: f64, b: f64, w: f64) -> f64 {
    b * (1. - (-units / 1e18 / w).exp())
}

/// Units of an amplified swap: (w(a+x))^(1-k) - (wa)^(1-k) (in WAD notation).
pub fn amplified_units(x: f64, a: f64, w: f64, amplification: f64) -> f64 {
    let one_minus_amp = 1. - amplification;
    ((w * (a + x)).powf(one_minus_amp) - (w * a).powf(one_minus_amp)) * 1e18
}

/// Output of an amplified swap: b·(1 - ((wb)^(1-k) - U)/(wb)^(1-k))^(1/(1-k))).
pub fn amplified_output(units: f64, b: f64, w: f64, amplification: f64) -> f64 {
    let one_minus_amp = 1. - amplification;
    let wb_ampped = (w * b).powf(one_minus_amp);
    b * (1. - ((wb_ampped - units / 1e18) / wb_ampped).powf(1. / one_minus_amp))
}


/// Compute the expected return of a swap (using floating point arithmetic).
///
/// `amplification` set to `None` selects the volatile curve.
pub fn compute_expected_swap(
    amount: Uint128,
    from_weight: Uint64,
    from_balance: Uint128,
    to_weight: Uint64,
    to_balance: Uint128,
    amplification: Option<f64>,
    vault_fee: Option<Uint64>,
    governance_fee: Option<Uint64>
) -> ExpectedSwap {

    let (net_amount, vault_fee, governance_fee) = split_fee(uint128_to_f64(amount), vault_fee, governance_fee);

    let from_weight = uint64_to_f64(from_weight);
    let from_balance = uint128_to_f64(from_balance);
    let to_weight = uint64_to_f64(to_weight);
    let to_balance = uint128_to_f64(to_balance);

    let (units, to_amount) = match amplification {
        None => {
            let units = volatile_units(net_amount, from_balance, from_weight);
            (units, volatile_output(units, to_balance, to_weight))
        },
        Some(amplification) => {
            let units = amplified_units(net_amount, from_balance, from_weight, amplification);
            (units, amplified_output(units, to_balance, to_weight, amplification))
        }
    };

    ExpectedSwap {
        units,
        to_amount,
        vault_fee,
        governance_fee
    }
}



// Reference liquidity curves ***************************************************************************************************

/// Units of a volatile liquidity withdrawal: w_sum·ln(supply/(supply-amount)) (in WAD notation).
pub fn volatile_liquidity_units(amount: f64, supply: f64, w_sum: f64) -> f64 {
    w_sum * (supply / (supply - amount)).ln() * 1e18
}

/// Vault share (relative to the supply before the deposit) bought by volatile liquidity units:
/// exp(U/w_sum) - 1.
pub fn volatile_liquidity_share(units: f64, w_sum: f64) -> f64 {
    (units / 1e18 / w_sum).exp() - 1.
}

/// Reference amount of a volatile vault: prod(b_i^w_i)^(1/w_sum).
pub fn volatile_reference_amount(balances: &[f64], weights: &[f64]) -> f64 {
    let w_sum: f64 = weights.iter().sum();
    let weighted_ln_sum: f64 = balances.iter()
        .zip(weights)
        .map(|(balance, weight)| weight * balance.ln())
        .sum();
    (weighted_ln_sum / w_sum).exp()
}

/// Units of an amplified liquidity withdrawal from a vault with weighted balances `wa0`:
/// n·wa0^(1-k)·(1 - ((supply-amount)/supply)^(1-k)) (in WAD notation).
pub fn amplified_liquidity_units(amount: f64, supply: f64, wa0: f64, asset_count: f64, amplification: f64) -> f64 {
    let one_minus_amp = 1. - amplification;
    asset_count * wa0.powf(one_minus_amp) * (1. - ((supply - amount) / supply).powf(one_minus_amp)) * 1e18
}

/// Vault share (relative to the supply before the deposit) bought by amplified liquidity units:
/// ((n·wa0^(1-k) + U)/(n·wa0^(1-k)))^(1/(1-k)) - 1.
pub fn amplified_liquidity_share(units: f64, wa0: f64, asset_count: f64, amplification: f64) -> f64 {
    let one_minus_amp = 1. - amplification;
    let n_wa0_ampped = asset_count * wa0.powf(one_minus_amp);
    ((n_wa0_ampped + units / 1e18) / n_wa0_ampped).powf(1. / one_minus_amp) - 1.
}
