//! Shared math helpers for the integer-function opcodes.
//!
//! These mirror the calculator's double-in/double-out convention: inputs
//! are truncated where an integer is required and results come back as
//! `f64` so they can flow straight onto the operand stack.

/// Real gamma function.
pub fn gamma(x: f64) -> f64 {
    libm::tgamma(x)
}

pub fn gcd(n0: f64, m0: f64) -> f64 {
    let mut n = n0 as u64;
    let mut m = m0 as u64;
    while m != 0 {
        let tmp = n;
        n = m;
        m = tmp % m;
    }
    n as f64
}

pub fn lcm(n: f64, m: f64) -> f64 {
    n / gcd(n, m) * m
}

/// nPr via the gamma function.
pub fn permutation(n: f64, r: f64) -> f64 {
    libm::tgamma(n + 1.0) / libm::tgamma(n - r + 1.0)
}

/// nCr via the gamma function.
pub fn combination(n: f64, r: f64) -> f64 {
    libm::tgamma(n + 1.0) / libm::tgamma(r + 1.0) / libm::tgamma(n - r + 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rpx_builtins::approx_eq;

    #[test]
    fn gcd_table() {
        for (expected, n, m) in [(6.0, 12.0, 18.0), (5.0, 30.0, 25.0), (10.0, 110.0, 90.0)] {
            assert_eq!(gcd(n, m), expected);
        }
    }

    #[test]
    fn lcm_table() {
        for (expected, n, m) in [(36.0, 12.0, 18.0), (150.0, 30.0, 25.0), (990.0, 110.0, 90.0)] {
            assert_eq!(lcm(n, m), expected);
        }
    }

    #[test]
    fn permutation_combination() {
        assert!(approx_eq(permutation(5.0, 2.0), 20.0));
        assert!(approx_eq(combination(5.0, 2.0), 10.0));
        assert!(approx_eq(combination(10.0, 5.0), 252.0));
    }
}
