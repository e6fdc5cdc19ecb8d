//! xorshift64 random number generator for the `@r` opcode.
//!
//! Thread-local state, seeded lazily from the system clock; `seed` makes
//! runs reproducible. A zero state would make xorshift degenerate, so it is
//! remapped to a fixed odd constant.

use std::cell::Cell;
use std::time::{SystemTime, UNIX_EPOCH};

const FALLBACK_SEED: u64 = 0x9e37_79b9_7f4a_7c15;

thread_local! {
    static STATE: Cell<u64> = const { Cell::new(0) };
}

fn clock_seed() -> u64 {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(FALLBACK_SEED);
    if nanos == 0 {
        FALLBACK_SEED
    } else {
        nanos
    }
}

/// Reseed the generator; a zero seed is remapped.
pub fn seed(s: u64) {
    STATE.with(|state| state.set(if s == 0 { FALLBACK_SEED } else { s }));
}

/// Next raw xorshift64 draw.
pub fn next() -> u64 {
    STATE.with(|state| {
        let mut x = state.get();
        if x == 0 {
            x = clock_seed();
        }
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        state.set(x);
        x
    })
}

/// Uniform draw in [0, 1).
pub fn uniform() -> f64 {
    // Take the top 53 bits so the quotient is exactly representable.
    (next() >> 11) as f64 / (1u64 << 53) as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reseeding_reproduces_sequence() {
        seed(42);
        let a: Vec<u64> = (0..8).map(|_| next()).collect();
        seed(42);
        let b: Vec<u64> = (0..8).map(|_| next()).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn uniform_stays_in_unit_interval() {
        seed(7);
        for _ in 0..1000 {
            let x = uniform();
            assert!((0.0..1.0).contains(&x));
        }
    }

    #[test]
    fn zero_seed_is_remapped() {
        seed(0);
        assert_ne!(next(), 0);
    }
}
