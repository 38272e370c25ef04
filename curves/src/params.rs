use num_bigint::BigUint;
use num_traits::{One, Zero};

use crate::{
    field::{is_probable_prime, mod_sqrt},
    hash::HashAlgorithm,
    point::Point,
    CurveError,
};

/// The two curve families the engines implement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurveFamily {
    Weierstrass,
    TwistedEdwards,
}

/// Family-specific curve coefficients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CurveCoefficients {
    /// `y² = x³ + ax + b`
    Weierstrass { a: BigUint, b: BigUint },
    /// `ax² + y² = 1 + dx²y²`
    TwistedEdwards { a: BigUint, d: BigUint },
}

/// One fully described curve instance.
///
/// All integers are kept reduced mod `p` (the parser guarantees this, and
/// [`CurveParameters::validate`] re-checks it). The invariants the source
/// system never verified — `p` prime, generator on the curve, `n` the actual
/// generator order — are enforced here and in the engine constructors, so
/// everything downstream may rely on them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurveParameters {
    pub name: String,
    pub coefficients: CurveCoefficients,
    pub p: BigUint,
    pub g: Point,
    pub n: BigUint,
    pub cofactor: BigUint,
    pub bit_size: u64,
    pub hash: HashAlgorithm,
}

impl CurveParameters {
    pub fn family(&self) -> CurveFamily {
        match self.coefficients {
            CurveCoefficients::Weierstrass { .. } => CurveFamily::Weierstrass,
            CurveCoefficients::TwistedEdwards { .. } => CurveFamily::TwistedEdwards,
        }
    }

    /// Structural validation; the point-arithmetic invariants (generator on
    /// the curve, `n·G` is the identity) are checked by the engine
    /// constructors which own the arithmetic.
    pub fn validate(&self) -> Result<(), CurveError> {
        let err = |reason: &str| CurveError::invalid_params(&self.name, reason);

        if self.p < BigUint::from(5u8) {
            return Err(err("field modulus is too small"));
        }
        if !is_probable_prime(&self.p) {
            return Err(err("field modulus is not prime"));
        }
        // decompression needs a modular square root for this modulus
        if mod_sqrt(&BigUint::one(), &self.p).is_none() {
            return Err(err("unsupported field modulus residue class (need p = 3 mod 4 or p = 5 mod 8)"));
        }

        if self.n < BigUint::from(2u8) {
            return Err(err("group order is too small"));
        }
        if !is_probable_prime(&self.n) {
            return Err(err("group order is not prime"));
        }
        if self.cofactor.is_zero() {
            return Err(err("cofactor must be at least 1"));
        }

        if self.bit_size == 0 || self.p.bits() > self.bit_size {
            return Err(err("bit size does not cover the field modulus"));
        }
        if self.n.bits() > self.bit_size {
            return Err(err("bit size does not cover the group order"));
        }

        match self.g.xy() {
            None => return Err(err("generator cannot be the point at infinity")),
            Some((x, y)) => {
                if x >= &self.p || y >= &self.p {
                    return Err(err("generator coordinates are not reduced mod p"));
                }
            }
        }

        match &self.coefficients {
            CurveCoefficients::Weierstrass { a, b } => {
                if a >= &self.p || b >= &self.p {
                    return Err(err("curve coefficients are not reduced mod p"));
                }
            }
            CurveCoefficients::TwistedEdwards { a, d } => {
                if a >= &self.p || d >= &self.p {
                    return Err(err("curve coefficients are not reduced mod p"));
                }
                if a.is_zero() || d.is_zero() {
                    return Err(err("twisted Edwards coefficients must be nonzero"));
                }
                if a == d {
                    return Err(err("twisted Edwards coefficients a and d must differ"));
                }
                // the sign-bit-plus-y point encoding needs one spare bit
                if self.p.bits() > self.bit_size - 1 {
                    return Err(err("field modulus leaves no room for the sign bit"));
                }
            }
        }

        Ok(())
    }
}
