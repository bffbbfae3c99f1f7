//! Table sizing: primality and element-count to slot-count conversion.

/// Numerator and denominator of the slots-per-element ratio (10/7, i.e.
/// a target maximum load of roughly 70%).
const CELLS_NUM: usize = 10;
const CELLS_DEN: usize = 7;

/// Trial division up to `sqrt(x)`.
pub fn is_prime(x: usize) -> bool {
    if x < 2 {
        return false;
    }
    if x < 4 {
        return true;
    }
    if x % 2 == 0 {
        return false;
    }
    let mut i = 3;
    while i <= x / i {
        if x % i == 0 {
            return false;
        }
        i += 2;
    }
    true
}

/// Smallest prime `>= x`. Never returns less than 2.
pub fn next_prime(mut x: usize) -> usize {
    while !is_prime(x) {
        x += 1;
    }
    x
}

/// Backing-array size needed to hold `n` elements at the target load,
/// rounded down. Saturates instead of overflowing.
pub fn n_to_cells(n: usize) -> usize {
    n.saturating_mul(CELLS_NUM) / CELLS_DEN
}
