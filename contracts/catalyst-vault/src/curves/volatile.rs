use fixed_point_math::{div_wad_down, exp_wad, ln_wad, mul_wad_down, AsI256, AsU256, U256, WAD};

use crate::{
    curves::OUTPUT_ERROR_MARGIN,
    error::ContractError
};


// Integral Helpers *************************************************************************************************************

/// Compute the price curve integral: $\int_{a}^{a+input} w/x dx = w·ln((a+x)/a)$
///
/// Returns the units that the provided assets are worth (in WAD notation).
///
/// # Arguments:
/// * `input` - The input amount provided by the user.
/// * `a` - The vault's asset balance.
/// * `w` - The vault's asset weight.
///
pub fn calc_price_curve_area(
    input: U256,
    a: U256,
    w: U256
) -> Result<U256, ContractError> {
    // Compute w·ln((a+x)/a)
    w.checked_mul(
        ln_wad(
            div_wad_down(
                a.checked_add(input).ok_or(ContractError::ArithmeticError {})?,
                a
            )?.as_i256()    // If casting overflows to a negative number 'ln_wad' will fail
        )?.as_u256()        // Casting is safe as 'ln_wad' result is always positive (its argument is >= 1)
    ).ok_or(ContractError::ArithmeticError {})
}


/// Solve the limit of the price curve integral: $u = \int_{b-y}^{b} w/x dx => y = b·(1-exp(-u/w))$
///
/// Returns the output asset amount for the given units.
///
/// # Arguments:
/// * `u` - The incoming 'units'.
/// * `b` - The vault's asset balance.
/// * `w` - The vault's asset weight.
///
pub fn calc_price_curve_limit(
    u: U256,
    b: U256,
    w: U256
) -> Result<U256, ContractError> {
    // Compute 1-exp(-u/w)
    let output_fraction = WAD.checked_sub(
        exp_wad(
            // If the casting to i256 overflows to a negative value, negating it makes it
            // positive and 'exp_wad' returns a value larger than one, which makes the
            // following 'checked_sub' fail.
            (u.checked_div(w).ok_or(ContractError::ArithmeticError {})?)
                .as_i256()
                .wrapping_neg()
        )?.as_u256()                // Casting is safe, as 'exp_wad' result is always positive.
    ).ok_or(ContractError::CurveOverflow {})?;

    // Compute b·(1-exp(-u/w)), rounded in favour of the vault
    mul_wad_down(
        b,
        output_fraction.saturating_sub(OUTPUT_ERROR_MARGIN)
    ).map_err(|err| err.into())
}


/// Solve the combined price curve equations. To reduce attack vectors, this is implemented
/// using the individual equations, and is not simplified into a reduced form.
///
/// Returns the output asset amount for the given input asset amount.
///
/// # Arguments:
/// * `input` - The input amount provided by the user.
/// * `a` - The vault's input asset balance.
/// * `b` - The vault's output asset balance.
/// * `w_a` - The vault's input asset weight.
/// * `w_b` - The vault's output asset weight.
///
pub fn calc_combined_price_curves(
    input: U256,
    a: U256,
    b: U256,
    w_a: U256,
    w_b: U256
) -> Result<U256, ContractError> {
    calc_price_curve_limit(
        calc_price_curve_area(input, a, w_a)?,
        b,
        w_b
    )
}


/// Closed form of the combined price curves for equal weights: $b·x/(a+x)$
///
/// # Arguments:
/// * `input` - The input amount provided by the user.
/// * `a` - The vault's input asset balance.
/// * `b` - The vault's output asset balance.
///
pub fn calc_equal_weights_swap(
    input: U256,
    a: U256,
    b: U256
) -> Result<U256, ContractError> {
    b.checked_mul(input)
        .and_then(|numerator| numerator.checked_div(a.checked_add(input)?))
        .ok_or(ContractError::ArithmeticError {})
}



// Liquidity Helpers ************************************************************************************************************

/// Solve the 'liquidity-to-units' equation: $share = exp(u/w_sum) - 1$
///
/// Returns the share of the vault (relative to the vault token supply *before* the share is
/// minted) bought by the provided units (in WAD notation).
///
/// # Arguments:
/// * `u` - The incoming 'units'.
/// * `w_sum` - The vault's weights sum.
///
pub fn calc_price_curve_limit_share(
    u: U256,
    w_sum: U256
) -> Result<U256, ContractError> {

    // Compute 1 - vault_ownership = exp(-u/w_sum)
    let non_vault_ownership = exp_wad(
        // If the casting to i256 overflows to a negative value, negating it makes it positive and
        // 'exp_wad' returns a value larger than one, which makes the following 'checked_sub' fail.
        (u.checked_div(w_sum).ok_or(ContractError::ArithmeticError {})?)
            .as_i256()
            .wrapping_neg()
    )?.as_u256();       // Casting is safe, as 'exp_wad' result is always positive.

    // Return the vault ownership share *before* the share is included in the vault.
    div_wad_down(
        WAD.checked_sub(non_vault_ownership).ok_or(ContractError::ArithmeticError {})?,
        non_vault_ownership
    ).map_err(|err| err.into())
}


/// Compute the units the `amount` of vault tokens are worth when withdrawn evenly:
/// $w_sum·ln(supply/(supply - amount))$
///
/// # Arguments:
/// * `amount` - The vault tokens withdrawn.
/// * `effective_supply` - The vault token supply including `amount` and the escrowed vault tokens.
/// * `w_sum` - The vault's weights sum.
///
pub fn calc_liquidity_units(
    amount: U256,
    effective_supply: U256,
    w_sum: U256
) -> Result<U256, ContractError> {

    if amount >= effective_supply {
        return Err(ContractError::CurveOverflow {});
    }

    ln_wad(
        div_wad_down(
            effective_supply,
            effective_supply.wrapping_sub(amount)   // 'wrapping_sub' is safe, 'amount' < 'effective_supply' checked above
        )?.as_i256()                                // If casting overflows to a negative value 'ln_wad' will fail
    )?.as_u256()                                    // Casting is safe, as 'ln_wad' of a value >= 1 is always positive
        .checked_mul(w_sum)
        .ok_or(ContractError::ArithmeticError {})
}


/// Compute the vault reference amount $\prod b_i^{w_i}^{1/w_sum}$, evaluated as
/// $exp(\sum w_i·ln(b_i) / w_sum)$ to avoid overflows. Empty balances are skipped.
///
/// # Arguments:
/// * `balances` - The vault's asset balances.
/// * `weights` - The vault's asset weights.
///
pub fn calc_reference_amount(
    balances: &[U256],
    weights: &[U256]
) -> Result<U256, ContractError> {

    let w_sum = weights.iter()
        .try_fold(U256::ZERO, |acc, weight| acc.checked_add(*weight))
        .filter(|w_sum| *w_sum != U256::ZERO)
        .ok_or(ContractError::ArithmeticError {})?;

    let weighted_balance_sum = calc_invariant(balances, weights)?;

    // If casting overflows to a negative number, the result of the exponent is 0 (after dividing
    // by WAD), which makes any nonzero reference requirement fail.
    Ok(exp_wad((weighted_balance_sum / w_sum).as_i256())?.as_u256() / WAD)
}



// Invariant Helpers ************************************************************************************************************

/// Compute the volatile invariant $\sum w·ln(b)$ (in WAD notation). Empty balances are skipped.
///
/// # Arguments:
/// * `balances` - The vault's asset balances.
/// * `weights` - The vault's asset weights.
///
pub fn calc_invariant(
    balances: &[U256],
    weights: &[U256]
) -> Result<U256, ContractError> {
    balances.iter()
        .zip(weights)
        .filter(|(balance, _)| **balance != U256::ZERO)
        .try_fold(U256::ZERO, |acc, (balance, weight)| {
            // ln(b) is negative for balances smaller than one WAD unit, which is not possible
            // for integer balances, as these are scaled by WAD before taking the logarithm.
            let ln_balance = ln_wad(
                balance.checked_mul(WAD).ok_or(ContractError::ArithmeticError {})?.as_i256()
            )?.as_u256();

            weight.checked_mul(ln_balance)
                .and_then(|term| acc.checked_add(term))
                .ok_or(ContractError::ArithmeticError {})
        })
}
