//! Prime-field helpers shared by both curve engines.

use num_bigint::BigUint;
use num_traits::{One, Zero};

/// `(a - b) mod p` for operands already reduced mod `p`.
pub fn sub_mod(a: &BigUint, b: &BigUint, p: &BigUint) -> BigUint {
    if a >= b {
        a - b
    } else {
        p - (b - a)
    }
}

/// Modular inverse via Fermat's little theorem: `v^(p-2) mod p`.
///
/// Only valid for prime `p` and `v` not divisible by `p`; both are
/// guaranteed by parameter validation and the callers' case analysis.
pub fn mod_inv(v: &BigUint, p: &BigUint) -> BigUint {
    let two = BigUint::from(2u8);
    v.modpow(&(p - two), p)
}

/// Modular square root of `v` mod `p`, or `None` if `v` is a non-residue.
///
/// Supports `p ≡ 3 (mod 4)` (exponent `(p+1)/4`) and `p ≡ 5 (mod 8)`
/// (Atkin: candidate `v^((p+3)/8)`, corrected by `sqrt(-1) = 2^((p-1)/4)`).
/// Other residue classes are rejected at parameter-load time, so reaching
/// one here is a bug; the function answers `None` for them regardless.
pub fn mod_sqrt(v: &BigUint, p: &BigUint) -> Option<BigUint> {
    let v = v % p;
    if v.is_zero() {
        return Some(v);
    }
    let one = BigUint::one();
    let candidate = if (p % 4u8) == BigUint::from(3u8) {
        v.modpow(&((p + &one) >> 2), p)
    } else if (p % 8u8) == BigUint::from(5u8) {
        let candidate = v.modpow(&((p + BigUint::from(3u8)) >> 3), p);
        if (&candidate * &candidate) % p == v {
            candidate
        } else {
            // multiply by sqrt(-1) to land on the other root pair
            let sqrt_m1 = BigUint::from(2u8).modpow(&((p - &one) >> 2), p);
            (candidate * sqrt_m1) % p
        }
    } else {
        return None;
    };
    if (&candidate * &candidate) % p == v {
        Some(candidate)
    } else {
        None
    }
}

/// Miller–Rabin probabilistic primality test with a fixed witness set.
///
/// The witnesses below are enough for a deterministic answer on anything
/// under 3.3·10^24 and leave a vanishing error probability for the curve
/// moduli this crate deals with.
pub fn is_probable_prime(n: &BigUint) -> bool {
    const WITNESSES: [u8; 12] = [2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37];

    let one = BigUint::one();
    let two = BigUint::from(2u8);
    if *n < two {
        return false;
    }
    for w in WITNESSES {
        let w = BigUint::from(w);
        if *n == w {
            return true;
        }
        if (n % &w).is_zero() {
            return false;
        }
    }

    // n - 1 = d * 2^r with d odd
    let n_minus_1 = n - &one;
    let r = n_minus_1.trailing_zeros().unwrap_or(0);
    let d = &n_minus_1 >> r;

    'witness: for w in WITNESSES {
        let mut x = BigUint::from(w).modpow(&d, n);
        if x == one || x == n_minus_1 {
            continue;
        }
        for _ in 1..r {
            x = x.modpow(&two, n);
            if x == n_minus_1 {
                continue 'witness;
            }
        }
        return false;
    }
    true
}

/// Big-endian bytes zero-padded on the left to `len` bytes.
///
/// Values wider than `len` bytes are a caller bug (encodings are bounded by
/// validated parameters); the value is returned unpadded in that case.
pub fn to_fixed_bytes(v: &BigUint, len: usize) -> Vec<u8> {
    let bytes = v.to_bytes_be();
    if bytes.len() >= len {
        return bytes;
    }
    let mut out = vec![0u8; len - bytes.len()];
    out.extend_from_slice(&bytes);
    out
}
