use crate::{I256, U256, WAD};

pub fn wad_to_f64(x: I256) -> f64 {
    x.to_string().parse::<f64>().unwrap() / 1e18
}

pub fn f64_to_wad(x: f64) -> I256 {
    I256::new((x * 1e18) as i128)
}

pub fn u_wad(x: u128) -> U256 {
    U256::from(x) * WAD
}

pub fn i_wad(x: i128) -> I256 {
    I256::new(x) * I256::new(1000000000000000000i128)
}

/// Assert that `value` is within a relative `tolerance` of `expected`.
pub fn assert_close(value: f64, expected: f64, tolerance: f64) {
    let margin = expected.abs() * tolerance;
    assert!(
        (value - expected).abs() <= margin.max(1e-15),
        "{} not within {} of {}", value, tolerance, expected
    );
}
