use crate::{I256, U256};

// NOTE: The literals are parsed at compile time. An invalid or out of range literal is a
// compile error.

#[macro_export]
macro_rules! u256 {
    ($integer:literal) => {{
        const VALUE: $crate::U256 = $crate::macros::parse_u256_literal($integer);
        VALUE
    }};
}

#[macro_export]
macro_rules! i256 {
    ($integer:literal) => {{
        const VALUE: $crate::I256 = $crate::macros::parse_i256_literal($integer);
        VALUE
    }};
}


const LOW_MASK: u128 = u64::MAX as u128;

/// Parse the decimal digits of `bytes[start..]` into the (high, low) words of a 256 bit integer.
const fn parse_decimal_words(bytes: &[u8], start: usize) -> (u128, u128) {

    if start >= bytes.len() {
        panic!("empty integer literal");
    }

    let mut hi: u128 = 0;
    let mut lo: u128 = 0;

    let mut i = start;
    while i < bytes.len() {

        let digit = bytes[i];
        if digit < b'0' || digit > b'9' {
            panic!("invalid digit in integer literal");
        }

        // (hi, lo) = (hi, lo) * 10 + digit, computed on 64 bit limbs of 'lo'
        let lo_lo = (lo & LOW_MASK) * 10 + (digit - b'0') as u128;
        let lo_hi = (lo >> 64) * 10 + (lo_lo >> 64);

        lo = (lo_lo & LOW_MASK) | ((lo_hi & LOW_MASK) << 64);

        hi = match hi.checked_mul(10) {
            Some(value) => match value.checked_add(lo_hi >> 64) {
                Some(value) => value,
                None => panic!("integer literal out of range")
            },
            None => panic!("integer literal out of range")
        };

        i += 1;
    }

    (hi, lo)
}

#[doc(hidden)]
pub const fn parse_u256_literal(literal: &str) -> U256 {
    let (hi, lo) = parse_decimal_words(literal.as_bytes(), 0);
    U256::from_words(hi, lo)
}

#[doc(hidden)]
pub const fn parse_i256_literal(literal: &str) -> I256 {

    let bytes = literal.as_bytes();
    let negative = !bytes.is_empty() && bytes[0] == b'-';

    let (hi, lo) = parse_decimal_words(bytes, if negative { 1 } else { 0 });

    // The magnitude must fit the signed range (-2**255 is not representable this way).
    if hi > i128::MAX as u128 {
        panic!("integer literal out of range");
    }

    if !negative {
        return I256::from_words(hi as i128, lo as i128);
    }

    // Two's complement negation
    let (lo, carry) = (!lo).overflowing_add(1);
    let hi = (!hi).wrapping_add(carry as u128);

    I256::from_words(hi as i128, lo as i128)
}
