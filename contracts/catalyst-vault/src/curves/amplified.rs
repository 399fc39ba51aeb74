use fixed_point_math::{div_wad_down, div_wad_up, mul_wad_down, mul_wad_up, pow_wad, AsI256, AsU256, I256, U256, WAD, WADWAD};

use crate::{
    curves::{OUTPUT_ERROR_MARGIN, UNITS_ERROR_MARGIN_DIVISOR},
    error::ContractError
};


// Integral Helpers *************************************************************************************************************

/// Compute the price curve integral $\int_{w·a}^{w·(a + input)} 1/(x^k) · (1-k) dx
///     = (w·(a + input))^(1-k) - (w·a)^(1-k)$
///
/// Returns the units that the provided assets are worth (in WAD notation).
///
/// **NOTE**: This function will fail for w == 0 or (a + input) == 0
///
/// # Arguments:
/// * `input` - The input amount provided by the user.
/// * `a` - The vault's asset balance.
/// * `w` - The vault's asset weight.
/// * `one_minus_amp` - One minus the vault's amplification (in WAD notation).
///
pub fn calc_price_curve_area(
    input: U256,
    a: U256,
    w: U256,
    one_minus_amp: I256
) -> Result<U256, ContractError> {

    // Compute calc = (w·(a + input))^(1-k)
    let weighted_balance_ampped = pow_wad(
        weighted_balance_wad(a.checked_add(input).ok_or(ContractError::ArithmeticError {})?, w)?,
        one_minus_amp
    )?;

    // Compute 'calc' - (w·a)^(1-k)
    // The calculation fails for a balance of 0. Skip this case, as the subtrahend is also 0.
    let mut calc = weighted_balance_ampped;
    if a != U256::ZERO {
        calc = calc.wrapping_sub(   // 'wrapping_sub' is safe as (w·a)^(1-k) < (w·(a + input))^(1-k)
            pow_wad(weighted_balance_wad(a, w)?, one_minus_amp)?
        );
    }

    if calc.is_negative() {
        // Only possible through the rounding of 'pow_wad' for tiny inputs
        return Ok(U256::ZERO);
    }

    // Round in favour of the vault: deduct the 'pow_wad' error margin (rounded up)
    let error_margin = weighted_balance_ampped.as_u256() / UNITS_ERROR_MARGIN_DIVISOR + U256::ONE;

    Ok(calc.as_u256().saturating_sub(error_margin))
}


/// Solve the limit of the price curve integral:
/// $u = \int_{w·(b - y)}^{w·b} 1/(x^k) · (1-k) dx
///     = b \[ 1 - (
///             ((w·b)^(1-k) - u) / ((w·b)^(1-k))
///         )^( 1/(1-k) )
///     \]$
///
/// Returns the output asset amount for the given units.
///
/// Fails with `CurveOverflow` if the units are worth the whole balance or more.
///
/// # Arguments:
/// * `u` - The incoming 'units'.
/// * `b` - The vault's asset balance.
/// * `w` - The vault's asset weight.
/// * `one_minus_amp` - One minus the vault's amplification (in WAD notation).
///
pub fn calc_price_curve_limit(
    u: U256,
    b: U256,
    w: U256,
    one_minus_amp: I256
) -> Result<U256, ContractError> {

    if u == U256::ZERO {
        return Ok(U256::ZERO);
    }

    if b == U256::ZERO {
        return Err(ContractError::CurveOverflow {});
    }

    // Compute (w·b)^(1-k)
    let weighted_balance_ampped = pow_wad(
        weighted_balance_wad(b, w)?,
        one_minus_amp
    )?.as_u256();                                       // Casting always casts a positive number

    if u >= weighted_balance_ampped {
        return Err(ContractError::CurveOverflow {});
    }

    let exponent = WADWAD / one_minus_amp;              // 1/(1-k)

    // Compute 1 - ((wbampped - u) / wbampped)^(1/(1-k))
    let output_fraction = WAD.checked_sub(
        pow_wad(
            div_wad_up(
                weighted_balance_ampped.wrapping_sub(u),        // 'wrapping_sub' is safe, 'u < wbampped' checked above
                weighted_balance_ampped
            )?.as_i256(),                               // Casting never overflows, as the division result is always <= 1
            exponent
        )?.as_u256()                                    // Casting always casts a positive number
    ).ok_or(ContractError::CurveOverflow {})?;

    // The error of 'pow_wad' grows with its exponent
    let error_margin = mul_wad_up(OUTPUT_ERROR_MARGIN, exponent.as_u256())?;

    // Compute b·[1 - ((wbampped - u) / wbampped)^(1/(1-k))]
    mul_wad_down(
        b,
        output_fraction.saturating_sub(error_margin)
    ).map_err(|err| err.into())
}


/// Solve the combined price curve equations. To reduce attack vectors, this is implemented
/// using the individual equations, and is not simplified into a reduced form.
///
/// # Arguments:
/// * `input` - The input amount provided by the user.
/// * `a` - The vault's input asset balance.
/// * `b` - The vault's output asset balance.
/// * `w_a` - The vault's input asset weight.
/// * `w_b` - The vault's output asset weight.
/// * `one_minus_amp` - One minus the vault's amplification (in WAD notation).
///
pub fn calc_combined_price_curves(
    input: U256,
    a: U256,
    b: U256,
    w_a: U256,
    w_b: U256,
    one_minus_amp: I256
) -> Result<U256, ContractError> {
    calc_price_curve_limit(
        calc_price_curve_area(input, a, w_a, one_minus_amp)?,
        b,
        w_b,
        one_minus_amp
    )
}



// Liquidity Helpers ************************************************************************************************************

/// Compute the balanced weighted balance of the vault, $(w·a_0)^(1-k)$ (in WAD notation), from
/// the current balances and the units that have left the vault:
/// $(\sum (w·b)^(1-k) - unit_tracker) / n$
///
/// **NOTE**: The balances must be the balances held by the vault, *including* the escrowed amounts.
///
/// # Arguments:
/// * `balances` - The vault's asset balances.
/// * `weights` - The vault's asset weights.
/// * `one_minus_amp` - One minus the vault's amplification (in WAD notation).
/// * `unit_tracker` - The net units that have left the vault (in WAD notation).
///
pub fn calc_weighted_alpha_0_ampped(
    balances: &[U256],
    weights: &[U256],
    one_minus_amp: I256,
    unit_tracker: I256
) -> Result<U256, ContractError> {

    if balances.is_empty() {
        return Err(ContractError::InvalidAssets {});
    }

    let weighted_balance_ampped_sum = calc_invariant(balances, weights, one_minus_amp)?;

    if weighted_balance_ampped_sum > I256::MAX.as_u256() {
        return Err(ContractError::ArithmeticError {});
    }

    let weighted_alpha_0_ampped_sum = weighted_balance_ampped_sum
        .as_i256()
        .checked_sub(unit_tracker)
        .filter(|sum| !sum.is_negative())
        .ok_or(ContractError::ArithmeticError {})?;

    Ok(weighted_alpha_0_ampped_sum.as_u256() / U256::from(balances.len() as u64))
}


/// Solve the 'liquidity-to-units' equation:
/// $share = ((n·(w·a_0)^(1-k) + u) / (n·(w·a_0)^(1-k)))^(1/(1-k)) - 1$
///
/// Returns the share of the vault (relative to the vault token supply *before* the share is
/// minted) bought by the provided units (in WAD notation).
///
/// # Arguments:
/// * `u` - The incoming 'units'.
/// * `n_weighted_alpha_0_ampped` - n·(w·a_0)^(1-k), with n the vault's asset count.
/// * `one_minus_amp` - One minus the vault's amplification (in WAD notation).
///
pub fn calc_price_curve_limit_share(
    u: U256,
    n_weighted_alpha_0_ampped: U256,
    one_minus_amp: I256
) -> Result<U256, ContractError> {

    if n_weighted_alpha_0_ampped == U256::ZERO {
        return Err(ContractError::CurveOverflow {});
    }

    let exponent = WADWAD / one_minus_amp;              // 1/(1-k)

    let share = pow_wad(
        div_wad_down(
            n_weighted_alpha_0_ampped.checked_add(u).ok_or(ContractError::ArithmeticError {})?,
            n_weighted_alpha_0_ampped
        )?.as_i256(),                                   // If casting overflows to a negative number 'pow_wad' will fail
        exponent
    )?.as_u256()                                        // Casting always casts a positive number
        .saturating_sub(WAD);

    // The error of 'pow_wad' grows with its exponent
    Ok(share.saturating_sub(mul_wad_up(OUTPUT_ERROR_MARGIN, exponent.as_u256())?))
}


/// Compute the units the `amount` of vault tokens are worth *per asset* when withdrawn evenly:
/// $(w·a_0)^(1-k)·(1 - ((supply - amount)/supply)^(1-k))$
///
/// # Arguments:
/// * `amount` - The vault tokens withdrawn.
/// * `effective_supply` - The vault token supply including `amount` and the escrowed vault tokens.
/// * `weighted_alpha_0_ampped` - (w·a_0)^(1-k).
/// * `one_minus_amp` - One minus the vault's amplification (in WAD notation).
///
pub fn calc_liquidity_units(
    amount: U256,
    effective_supply: U256,
    weighted_alpha_0_ampped: U256,
    one_minus_amp: I256
) -> Result<U256, ContractError> {

    if amount > effective_supply || effective_supply == U256::ZERO {
        return Err(ContractError::CurveOverflow {});
    }

    // Round the remaining share up, so that the units are rounded down
    let remaining_share = div_wad_up(
        effective_supply.wrapping_sub(amount),          // 'wrapping_sub' is safe, 'amount' <= 'effective_supply' checked above
        effective_supply
    )?;

    // 'pow_wad' fails for a base of 0
    let remaining_share_ampped = match remaining_share == U256::ZERO {
        true => U256::ZERO,
        false => pow_wad(
            remaining_share.as_i256(),                  // Casting is safe, as the division result is <= 1
            one_minus_amp
        )?.as_u256()                                    // Casting always casts a positive number
    };

    let units = mul_wad_down(
        weighted_alpha_0_ampped,
        WAD.saturating_sub(remaining_share_ampped)
    )?;

    let error_margin = weighted_alpha_0_ampped / UNITS_ERROR_MARGIN_DIVISOR + U256::ONE;

    Ok(units.saturating_sub(error_margin))
}


/// Compute the even withdrawal of an asset for the given per asset `units`. The whole balance
/// is returned if the units are worth it or more.
///
/// # Arguments:
/// * `u` - The units per asset (see `calc_liquidity_units`).
/// * `b` - The vault's asset balance, *excluding* the escrowed amounts.
/// * `w` - The vault's asset weight.
/// * `one_minus_amp` - One minus the vault's amplification (in WAD notation).
///
pub fn calc_withdrawal(
    u: U256,
    b: U256,
    w: U256,
    one_minus_amp: I256
) -> Result<U256, ContractError> {

    if b == U256::ZERO {
        return Ok(U256::ZERO);
    }

    let weighted_balance_ampped = pow_wad(
        weighted_balance_wad(b, w)?,
        one_minus_amp
    )?.as_u256();

    if u >= weighted_balance_ampped {
        return Ok(b);
    }

    calc_price_curve_limit(u, b, w, one_minus_amp)
}


/// Compute the vault reference amount: the weighted balance of the balanced vault,
/// $w·a_0 = ((w·a_0)^(1-k))^(1/(1-k))$.
///
/// # Arguments:
/// * `weighted_alpha_0_ampped` - (w·a_0)^(1-k).
/// * `one_minus_amp` - One minus the vault's amplification (in WAD notation).
///
pub fn calc_reference_amount(
    weighted_alpha_0_ampped: U256,
    one_minus_amp: I256
) -> Result<U256, ContractError> {

    if weighted_alpha_0_ampped == U256::ZERO {
        return Ok(U256::ZERO);
    }

    if weighted_alpha_0_ampped > I256::MAX.as_u256() {
        return Err(ContractError::ArithmeticError {});
    }

    Ok(
        pow_wad(
            weighted_alpha_0_ampped.as_i256(),
            WADWAD / one_minus_amp
        )?.as_u256() / WAD
    )
}



// Invariant Helpers ************************************************************************************************************

/// Compute the amplified invariant $\sum (w·b)^(1-k)$ (in WAD notation). Empty balances are skipped.
///
/// # Arguments:
/// * `balances` - The vault's asset balances.
/// * `weights` - The vault's asset weights.
/// * `one_minus_amp` - One minus the vault's amplification (in WAD notation).
///
pub fn calc_invariant(
    balances: &[U256],
    weights: &[U256],
    one_minus_amp: I256
) -> Result<U256, ContractError> {
    balances.iter()
        .zip(weights)
        .filter(|(balance, _)| **balance != U256::ZERO)
        .try_fold(U256::ZERO, |acc, (balance, weight)| {
            let weighted_balance_ampped = pow_wad(
                weighted_balance_wad(*balance, *weight)?,
                one_minus_amp
            )?.as_u256();

            acc.checked_add(weighted_balance_ampped)
                .ok_or(ContractError::ArithmeticError {})
        })
}


/// Compute w·b in WAD notation as a signed integer, as required by 'pow_wad'.
fn weighted_balance_wad(balance: U256, weight: U256) -> Result<I256, ContractError> {
    let weighted_balance = weight.checked_mul(balance)
        .and_then(|value| value.checked_mul(WAD))
        .ok_or(ContractError::ArithmeticError {})?;

    if weighted_balance > I256::MAX.as_u256() {
        return Err(ContractError::ArithmeticError {});
    }

    Ok(weighted_balance.as_i256())
}
