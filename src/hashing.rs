//! Polynomial string hashing and the double-hashing probe sequence.
//!
//! Every operation on `DoubleHashMap` walks slots in the order produced by
//! [`Probe`], so insert, lookup and removal agree on where a key can live
//! for a given capacity.

/// Base of the primary hash, which picks the first slot.
pub const PRIME1: u64 = 137;
/// Base of the secondary hash, which picks the stride.
pub const PRIME2: u64 = 139;

/// `sum(prime^(L-1-i) * key[i]) mod buckets`, reduced at every step.
///
/// Character codes are the UTF-8 bytes of `key`. `buckets` must be nonzero.
pub fn hash(key: &str, prime: u64, buckets: usize) -> usize {
    debug_assert!(buckets > 0);
    let m = buckets as u128;
    let p = prime as u128;
    let h = key
        .bytes()
        .fold(0u128, |acc, b| (acc * p + b as u128) % m);
    h as usize
}

/// Slot index of `key` on probe attempt `attempt` in a table of `buckets`
/// slots. Pure in all three arguments.
pub fn probe_index(key: &str, buckets: usize, attempt: usize) -> usize {
    let (start, step) = start_and_step(key, buckets);
    advance(start, step, buckets, attempt)
}

fn start_and_step(key: &str, buckets: usize) -> (usize, usize) {
    let start = hash(key, PRIME1, buckets);
    // `h2 + 1` is zero mod `buckets` when h2 == buckets - 1, which would pin
    // the sequence to `start`; step by one instead.
    let step = match (hash(key, PRIME2, buckets) + 1) % buckets {
        0 => 1,
        s => s,
    };
    (start, step)
}

#[inline]
fn advance(start: usize, step: usize, buckets: usize, attempt: usize) -> usize {
    let m = buckets as u128;
    ((start as u128 + (attempt as u128 % m) * step as u128) % m) as usize
}

/// The probe sequence of one key: `buckets` indices, attempt 0 first.
///
/// When `buckets` is prime the sequence is a permutation of `0..buckets`.
#[derive(Clone, Debug)]
pub struct Probe {
    start: usize,
    step: usize,
    buckets: usize,
    attempt: usize,
}

impl Probe {
    pub fn new(key: &str, buckets: usize) -> Self {
        let (start, step) = start_and_step(key, buckets);
        Self {
            start,
            step,
            buckets,
            attempt: 0,
        }
    }
}

impl Iterator for Probe {
    type Item = usize;

    #[inline]
    fn next(&mut self) -> Option<usize> {
        if self.attempt >= self.buckets {
            return None;
        }
        let idx = advance(self.start, self.step, self.buckets, self.attempt);
        self.attempt += 1;
        Some(idx)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.buckets - self.attempt;
        (left, Some(left))
    }
}

impl ExactSizeIterator for Probe {}
