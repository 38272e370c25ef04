//! From-scratch elliptic-curve engines over runtime-supplied parameters
//!
//! Unlike fixed-curve libraries, every curve here is described by a
//! [`CurveParameters`] value that arrives at runtime (typically parsed from a
//! stored record), so all arithmetic runs on arbitrary-precision integers.
//! Two curve families are supported:
//!
//!  - short Weierstrass (`y² = x³ + ax + b`) driving ECDSA, and
//!  - twisted Edwards (`ax² + y² = 1 + dx²y²`) driving EdDSA-BN, a
//!    deliberately non-standard EdDSA variant (see [`EdwardsCurve`]).
//!
//! # Assumptions
//!
//! ## Validated parameters
//!
//! Engine constructors validate the parameter set once (prime modulus,
//! generator on the curve, stated order annihilates the generator). The hot
//! paths rely on those invariants instead of re-checking them: the Fermat
//! inverse silently returns garbage for a composite modulus, and point
//! decompression needs the modulus in a known residue class.
//!
//! ## No constant-time guarantees
//!
//! Arithmetic is `BigUint`-based and variable-time throughout. Key and nonce
//! material does leak through timing; this mirrors the system being ported
//! and is documented as a known risk, not fixed silently.

mod edwards;
pub mod field;
mod hash;
mod params;
mod point;
mod weierstrass;

pub use edwards::EdwardsCurve;
pub use hash::{HashAlgorithm, UnknownHashAlgorithm};
pub use params::{CurveCoefficients, CurveFamily, CurveParameters};
pub use point::Point;
pub use weierstrass::WeierstrassCurve;

use derive_more::{Display, Error};

/// Errors of the curve engines and parameter validation.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum CurveError {
    /// A private scalar outside `[1, n-1]` was supplied for signing.
    #[display(fmt = "private scalar out of range [1, n-1]")]
    ScalarOutOfRange,
    /// A decompressed or supplied point does not satisfy the curve equation.
    #[display(fmt = "point is not on the curve")]
    PointNotOnCurve,
    /// A compressed point encoding that cannot denote any curve point.
    #[display(fmt = "malformed point encoding")]
    MalformedPoint,
    /// A packed signature whose components cannot be recovered.
    #[display(fmt = "malformed signature encoding")]
    MalformedSignature,
    /// The parameter set itself is unusable.
    #[display(fmt = "invalid parameters for curve '{}': {}", curve, reason)]
    InvalidParameters { curve: String, reason: String },
}

impl CurveError {
    pub(crate) fn invalid_params(curve: &str, reason: impl Into<String>) -> Self {
        CurveError::InvalidParameters {
            curve: curve.to_owned(),
            reason: reason.into(),
        }
    }
}

/// Result of a signing operation: the packed signature plus the compressed
/// public key derived from the same private scalar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signed {
    pub signature: num_bigint::BigUint,
    pub public_key: num_bigint::BigUint,
}
