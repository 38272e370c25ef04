//! Short Weierstrass curve engine (`y² = x³ + ax + b mod p`) and the ECDSA
//! signing/verification kernels on top of it.

use num_bigint::{BigInt, BigUint, RandBigInt, Sign};
use num_integer::Integer;
use num_traits::{One, Zero};
use rand::rngs::OsRng;

use crate::{
    field::{mod_inv, mod_sqrt, sub_mod},
    params::{CurveCoefficients, CurveFamily, CurveParameters},
    point::Point,
    CurveError, Signed,
};

/// One Weierstrass curve instance with validated parameters.
///
/// Construction checks everything the arithmetic later relies on; after
/// that, all operations are pure and the value can be shared freely.
#[derive(Debug, Clone)]
pub struct WeierstrassCurve {
    params: CurveParameters,
}

impl WeierstrassCurve {
    pub fn new(params: CurveParameters) -> Result<Self, CurveError> {
        if params.family() != CurveFamily::Weierstrass {
            return Err(CurveError::invalid_params(
                &params.name,
                "not a Weierstrass parameter set",
            ));
        }
        params.validate()?;
        let curve = Self { params };
        if !curve.is_on_curve(&curve.params.g) {
            return Err(CurveError::invalid_params(
                &curve.params.name,
                "generator is not on the curve",
            ));
        }
        if !curve
            .scalar_mult_unsigned(&curve.params.n.clone(), &curve.params.g)
            .is_infinity()
        {
            return Err(CurveError::invalid_params(
                &curve.params.name,
                "stated order does not annihilate the generator",
            ));
        }
        Ok(curve)
    }

    pub fn params(&self) -> &CurveParameters {
        &self.params
    }

    fn ab(&self) -> (&BigUint, &BigUint) {
        match &self.params.coefficients {
            CurveCoefficients::Weierstrass { a, b } => (a, b),
            CurveCoefficients::TwistedEdwards { .. } => unreachable!("checked in new()"),
        }
    }

    pub fn is_on_curve(&self, pt: &Point) -> bool {
        let (x, y) = match pt.xy() {
            None => return true, // the identity is a group element
            Some(v) => v,
        };
        let p = &self.params.p;
        let (a, b) = self.ab();
        let lhs = (y * y) % p;
        let rhs = (x.modpow(&BigUint::from(3u8), p) + a * x + b) % p;
        lhs == rhs
    }

    /// `-P`: reflection across the x axis.
    pub fn negate(&self, pt: &Point) -> Point {
        match pt.xy() {
            None => Point::Infinity,
            Some((x, y)) => {
                let y = if y.is_zero() {
                    y.clone()
                } else {
                    &self.params.p - y
                };
                Point::affine(x.clone(), y)
            }
        }
    }

    /// Group law. Handles identity operands, doubling and the
    /// equal-x-opposite-y case (which yields the identity).
    pub fn add(&self, lhs: &Point, rhs: &Point) -> Point {
        let p = &self.params.p;
        let (x1, y1) = match lhs.xy() {
            None => return rhs.clone(),
            Some(v) => v,
        };
        let (x2, y2) = match rhs.xy() {
            None => return lhs.clone(),
            Some(v) => v,
        };

        let lambda = if x1 == x2 {
            if y1 != y2 || y1.is_zero() {
                // vertical line (also covers doubling a 2-torsion point)
                return Point::Infinity;
            }
            // tangent slope: (3x₁² + a) / 2y₁
            let (a, _) = self.ab();
            let num = (BigUint::from(3u8) * x1 * x1 + a) % p;
            let den = (BigUint::from(2u8) * y1) % p;
            (num * mod_inv(&den, p)) % p
        } else {
            // chord slope: (y₂ − y₁) / (x₂ − x₁)
            let num = sub_mod(y2, y1, p);
            let den = sub_mod(x2, x1, p);
            (num * mod_inv(&den, p)) % p
        };

        // x₃ = λ² − x₁ − x₂ ; y₃ = λ(x₁ − x₃) − y₁
        let x3 = sub_mod(&sub_mod(&((&lambda * &lambda) % p), x1, p), x2, p);
        let y3 = sub_mod(&((lambda * sub_mod(x1, &x3, p)) % p), y1, p);
        Point::affine(x3, y3)
    }

    fn scalar_mult_unsigned(&self, k: &BigUint, pt: &Point) -> Point {
        if k.is_zero() || pt.is_infinity() {
            return Point::Infinity;
        }
        let mut result = Point::Infinity;
        let mut addend = pt.clone();
        let mut k = k.clone();
        while !k.is_zero() {
            if k.is_odd() {
                result = self.add(&result, &addend);
            }
            addend = self.add(&addend, &addend);
            k >>= 1u32;
        }
        result
    }

    /// Double-and-add scalar multiplication; a negative `k` multiplies the
    /// reflected point by `|k|`.
    pub fn scalar_mult(&self, k: &BigInt, pt: &Point) -> Point {
        match k.sign() {
            Sign::NoSign => Point::Infinity,
            Sign::Plus => self.scalar_mult_unsigned(k.magnitude(), pt),
            Sign::Minus => self.scalar_mult_unsigned(k.magnitude(), &self.negate(pt)),
        }
    }

    /// Compressed encoding `(x << 1) | parity(y)`. The identity has no
    /// compressed form.
    pub fn compress(&self, pt: &Point) -> Result<BigUint, CurveError> {
        let (x, y) = pt.xy().ok_or(CurveError::MalformedPoint)?;
        Ok((x << 1u32) | (y & BigUint::one()))
    }

    /// Inverse of [`compress`](Self::compress): recovers `y` from the curve
    /// equation and picks the root with the recorded parity.
    pub fn decompress(&self, compressed: &BigUint) -> Result<Point, CurveError> {
        let p = &self.params.p;
        let parity = compressed & BigUint::one();
        let x = compressed >> 1u32;
        if &x >= p {
            return Err(CurveError::MalformedPoint);
        }
        let (a, b) = self.ab();
        let y_squared = (x.modpow(&BigUint::from(3u8), p) + a * &x + b) % p;
        let mut y = mod_sqrt(&y_squared, p).ok_or(CurveError::PointNotOnCurve)?;
        if (&y & BigUint::one()) != parity {
            if y.is_zero() {
                // y = 0 has no odd counterpart
                return Err(CurveError::MalformedPoint);
            }
            y = p - &y;
        }
        Ok(Point::affine(x, y))
    }

    /// `(r << bits(n)) | s`
    pub fn pack_signature(&self, r: &BigUint, s: &BigUint) -> BigUint {
        (r << self.params.n.bits()) | s
    }

    pub fn unpack_signature(&self, signature: &BigUint) -> (BigUint, BigUint) {
        let n_bits = self.params.n.bits();
        let mask = (BigUint::one() << n_bits) - BigUint::one();
        (signature >> n_bits, signature & mask)
    }

    /// ECDSA signing.
    ///
    /// The nonce is drawn fresh from the OS generator on every attempt;
    /// this is the ported system's non-deterministic scheme, kept on
    /// purpose instead of an RFC 6979 derivation.
    pub fn sign(&self, digest: &BigUint, private_key: &BigUint) -> Result<Signed, CurveError> {
        let n = &self.params.n;
        if private_key.is_zero() || private_key >= n {
            return Err(CurveError::ScalarOutOfRange);
        }
        let mut rng = OsRng;
        loop {
            let k = rng.gen_biguint_range(&BigUint::one(), n);
            let r_point = self.scalar_mult_unsigned(&k, &self.params.g);
            let rx = match r_point.xy() {
                None => continue,
                Some((x, _)) => x,
            };
            let r = rx % n;
            if r.is_zero() {
                continue;
            }
            // s = k⁻¹(h + r·d) mod n
            let s = (mod_inv(&k, n) * (digest + &r * private_key % n)) % n;
            if s.is_zero() {
                continue;
            }
            let public_point = self.scalar_mult_unsigned(private_key, &self.params.g);
            return Ok(Signed {
                signature: self.pack_signature(&r, &s),
                public_key: self.compress(&public_point)?,
            });
        }
    }

    /// ECDSA verification.
    ///
    /// A malformed or off-curve public key is an error; a well-formed but
    /// mathematically invalid signature is `Ok(false)`.
    pub fn verify(
        &self,
        digest: &BigUint,
        signature: &BigUint,
        public_key: &BigUint,
    ) -> Result<bool, CurveError> {
        let n = &self.params.n;
        let (r, s) = self.unpack_signature(signature);
        if r.is_zero() || &r >= n || s.is_zero() || &s >= n {
            return Ok(false);
        }
        let q = self.decompress(public_key)?;
        let w = mod_inv(&s, n);
        let u1 = (digest * &w) % n;
        let u2 = (&r * &w) % n;
        let r_point = self.add(
            &self.scalar_mult_unsigned(&u1, &self.params.g),
            &self.scalar_mult_unsigned(&u2, &q),
        );
        match r_point.xy() {
            None => Ok(false),
            Some((x, _)) => Ok(x % n == r),
        }
    }

    /// Fresh key pair: uniform `d ∈ [1, n-1]` and the compressed `d·G`.
    pub fn generate_key_pair(&self) -> Result<(BigUint, BigUint), CurveError> {
        let mut rng = OsRng;
        let d = rng.gen_biguint_range(&BigUint::one(), &self.params.n);
        let q = self.scalar_mult_unsigned(&d, &self.params.g);
        Ok((d, self.compress(&q)?))
    }

    /// Whether the encoding denotes a point on this curve.
    pub fn validate_public_key(&self, compressed: &BigUint) -> bool {
        self.decompress(compressed).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::HashAlgorithm;
    use num_traits::Num;
    use quickcheck::quickcheck;

    fn secp256k1() -> WeierstrassCurve {
        WeierstrassCurve::new(secp256k1_params()).unwrap()
    }

    fn secp256k1_params() -> CurveParameters {
        CurveParameters {
            name: "secp256k1".to_owned(),
            coefficients: CurveCoefficients::Weierstrass {
                a: BigUint::zero(),
                b: BigUint::from(7u8),
            },
            p: BigUint::from_str_radix(
                "fffffffffffffffffffffffffffffffffffffffffffffffffffffffefffffc2f",
                16,
            )
            .unwrap(),
            g: Point::affine(
                BigUint::from_str_radix(
                    "79be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798",
                    16,
                )
                .unwrap(),
                BigUint::from_str_radix(
                    "483ada7726a3c4655da4fbfc0e1108a8fd17b448a68554199c47d08ffb10d4b8",
                    16,
                )
                .unwrap(),
            ),
            n: BigUint::from_str_radix(
                "fffffffffffffffffffffffffffffffebaaedce6af48a03bbfd25e8cd0364141",
                16,
            )
            .unwrap(),
            cofactor: BigUint::one(),
            bit_size: 256,
            hash: HashAlgorithm::Sha256,
        }
    }

    fn digest_of(msg: &[u8]) -> BigUint {
        BigUint::from_bytes_be(&HashAlgorithm::Sha256.digest(msg))
    }

    #[test]
    fn private_key_one_gives_the_generator() {
        let curve = secp256k1();
        let q = curve.scalar_mult(&BigInt::one(), &curve.params().g);
        assert_eq!(q, curve.params().g);
    }

    #[test]
    fn sign_verify_roundtrip_and_bit_flip() {
        let curve = secp256k1();
        let d = BigUint::from(0x1234_5678_9abc_def0u64);
        let digest = digest_of(b"the quick brown fox");
        let signed = curve.sign(&digest, &d).unwrap();
        assert!(curve.verify(&digest, &signed.signature, &signed.public_key).unwrap());

        // one flipped digest bit must kill the signature
        let tampered = &digest ^ BigUint::one();
        assert!(!curve.verify(&tampered, &signed.signature, &signed.public_key).unwrap());

        // ... as must one flipped signature bit
        let tampered_sig = &signed.signature ^ (BigUint::one() << 5u32);
        assert!(!curve.verify(&digest, &tampered_sig, &signed.public_key).unwrap());
    }

    #[test]
    fn signing_with_key_one_yields_public_key_g() {
        let curve = secp256k1();
        let digest = digest_of(b"fixed document");
        let signed = curve.sign(&digest, &BigUint::one()).unwrap();
        let expected = curve.compress(&curve.params().g).unwrap();
        assert_eq!(signed.public_key, expected);
        assert!(curve.verify(&digest, &signed.signature, &expected).unwrap());
    }

    #[test]
    fn rejects_out_of_range_private_keys() {
        let curve = secp256k1();
        let digest = digest_of(b"x");
        assert_eq!(
            curve.sign(&digest, &BigUint::zero()).unwrap_err(),
            CurveError::ScalarOutOfRange
        );
        let n = curve.params().n.clone();
        assert_eq!(curve.sign(&digest, &n).unwrap_err(), CurveError::ScalarOutOfRange);
    }

    #[test]
    fn signature_pack_roundtrip() {
        let curve = secp256k1();
        let r = BigUint::from(0xdeadbeefu32);
        let s = BigUint::from(0xfeedfaceu32);
        let packed = curve.pack_signature(&r, &s);
        assert_eq!(curve.unpack_signature(&packed), (r, s));
    }

    #[test]
    fn zero_r_or_s_is_invalid_not_an_error() {
        let curve = secp256k1();
        let digest = digest_of(b"y");
        let d = BigUint::from(42u8);
        let signed = curve.sign(&digest, &d).unwrap();
        // r = 0
        let only_s = curve.pack_signature(&BigUint::zero(), &BigUint::from(7u8));
        assert!(!curve.verify(&digest, &only_s, &signed.public_key).unwrap());
        // s = 0
        let only_r = curve.pack_signature(&BigUint::from(7u8), &BigUint::zero());
        assert!(!curve.verify(&digest, &only_r, &signed.public_key).unwrap());
    }

    #[test]
    fn malformed_public_key_is_an_error() {
        let curve = secp256k1();
        let digest = digest_of(b"z");
        let d = BigUint::from(42u8);
        let signed = curve.sign(&digest, &d).unwrap();
        // x ≥ p cannot decode
        let oversized = curve.params().p.clone() << 1u32;
        assert!(matches!(
            curve.verify(&digest, &signed.signature, &oversized),
            Err(CurveError::MalformedPoint)
        ));
    }

    #[test]
    fn addition_edge_cases() {
        let curve = secp256k1();
        let g = curve.params().g.clone();
        assert_eq!(curve.add(&Point::Infinity, &g), g);
        assert_eq!(curve.add(&g, &Point::Infinity), g);
        assert!(curve.add(&g, &curve.negate(&g)).is_infinity());
        assert!(curve.scalar_mult(&BigInt::zero(), &g).is_infinity());
    }

    #[test]
    fn negative_scalars_reflect() {
        let curve = secp256k1();
        let g = curve.params().g.clone();
        let minus_g = curve.scalar_mult(&BigInt::from(-1), &g);
        assert_eq!(minus_g, curve.negate(&g));
        // (-2)·G == -(2·G)
        assert_eq!(
            curve.scalar_mult(&BigInt::from(-2), &g),
            curve.negate(&curve.scalar_mult(&BigInt::from(2), &g))
        );
    }

    #[test]
    fn generated_key_pairs_work() {
        let curve = secp256k1();
        let (d, public) = curve.generate_key_pair().unwrap();
        assert!(curve.validate_public_key(&public));
        let digest = digest_of(b"generated");
        let signed = curve.sign(&digest, &d).unwrap();
        assert_eq!(signed.public_key, public);
        assert!(curve.verify(&digest, &signed.signature, &public).unwrap());
    }

    #[test]
    fn rejects_wrong_order() {
        let mut params = secp256k1_params();
        // p is prime too, but it is not the generator's order
        params.n = params.p.clone();
        let err = WeierstrassCurve::new(params).unwrap_err();
        assert!(err.to_string().contains("annihilate"), "{}", err);
    }

    #[test]
    fn rejects_off_curve_generator() {
        let mut params = secp256k1_params();
        let g = params.g.clone();
        if let Some((x, y)) = g.xy() {
            params.g = Point::affine(x.clone(), (y + BigUint::one()) % &params.p);
        }
        let err = WeierstrassCurve::new(params).unwrap_err();
        assert!(err.to_string().contains("generator"), "{}", err);
    }

    quickcheck! {
        fn compress_roundtrip(k: u64) -> bool {
            let curve = secp256k1();
            let k = BigUint::from(k.max(1));
            let g = curve.params().g.clone();
            let pt = curve.scalar_mult(&BigInt::from(k), &g);
            let compressed = curve.compress(&pt).unwrap();
            curve.decompress(&compressed).unwrap() == pt
        }

        fn sign_verify_holds(msg: Vec<u8>, d: u64) -> bool {
            let curve = secp256k1();
            let d = BigUint::from(d.max(1));
            let digest = digest_of(&msg);
            let signed = curve.sign(&digest, &d).unwrap();
            curve.verify(&digest, &signed.signature, &signed.public_key).unwrap()
        }
    }
}
