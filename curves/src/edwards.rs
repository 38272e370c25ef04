//! Twisted Edwards curve engine (`ax² + y² = 1 + dx²y² mod p`) and the
//! EdDSA-BN signing scheme on top of it.
//!
//! EdDSA-BN is **not** RFC 8032 EdDSA and does not interoperate with it:
//! the nonce is the plain mix `r = (d + m) mod n` instead of the SHA-512
//! expansion of a key prefix, and points are packed as big integers rather
//! than little-endian byte strings. Producing real Ed25519 signatures would
//! require replacing both the nonce derivation and the encodings.

use num_bigint::{BigInt, BigUint, RandBigInt, Sign};
use num_integer::Integer;
use num_traits::{One, Zero};
use rand::rngs::OsRng;

use crate::{
    field::{mod_inv, mod_sqrt, sub_mod, to_fixed_bytes},
    params::{CurveCoefficients, CurveFamily, CurveParameters},
    point::Point,
    CurveError, Signed,
};

/// One twisted Edwards curve instance with validated parameters.
#[derive(Debug, Clone)]
pub struct EdwardsCurve {
    params: CurveParameters,
}

impl EdwardsCurve {
    pub fn new(params: CurveParameters) -> Result<Self, CurveError> {
        if params.family() != CurveFamily::TwistedEdwards {
            return Err(CurveError::invalid_params(
                &params.name,
                "not a twisted Edwards parameter set",
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
        let n = curve.params.n.clone();
        if !curve.is_identity(&curve.scalar_mult_unsigned(&n, &curve.params.g)) {
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

    fn ad(&self) -> (&BigUint, &BigUint) {
        match &self.params.coefficients {
            CurveCoefficients::TwistedEdwards { a, d } => (a, d),
            CurveCoefficients::Weierstrass { .. } => unreachable!("checked in new()"),
        }
    }

    /// The neutral element `(0, 1)`. Edwards curves have no point at
    /// infinity; the [`Point::Infinity`] sentinel is treated as neutral
    /// where it shows up.
    pub fn identity(&self) -> Point {
        Point::affine(BigUint::zero(), BigUint::one())
    }

    pub fn is_identity(&self, pt: &Point) -> bool {
        match pt.xy() {
            None => true,
            Some((x, y)) => x.is_zero() && y.is_one(),
        }
    }

    pub fn is_on_curve(&self, pt: &Point) -> bool {
        let (x, y) = match pt.xy() {
            None => return true,
            Some(v) => v,
        };
        let p = &self.params.p;
        let (a, d) = self.ad();
        let x2 = (x * x) % p;
        let y2 = (y * y) % p;
        let lhs = (a * &x2 + &y2) % p;
        let rhs = (BigUint::one() + d * x2 % p * y2) % p;
        lhs == rhs
    }

    /// `-P = (-x, y)`
    pub fn negate(&self, pt: &Point) -> Point {
        match pt.xy() {
            None => Point::Infinity,
            Some((x, y)) => {
                let x = if x.is_zero() {
                    x.clone()
                } else {
                    &self.params.p - x
                };
                Point::affine(x, y.clone())
            }
        }
    }

    /// Complete twisted-Edwards addition; the same formula covers doubling
    /// and the neutral element.
    pub fn add(&self, lhs: &Point, rhs: &Point) -> Point {
        let p = &self.params.p;
        let id = self.identity();
        let (x1, y1) = lhs.xy().unwrap_or_else(|| id.xy().expect("identity is affine"));
        let (x2, y2) = match rhs.xy() {
            None => return lhs.clone(),
            Some(v) => v,
        };

        let (a, d) = self.ad();
        let x1x2 = (x1 * x2) % p;
        let y1y2 = (y1 * y2) % p;
        let x1y2 = (x1 * y2) % p;
        let y1x2 = (y1 * x2) % p;
        let dxy = (d * &x1x2 % p) * &y1y2 % p;

        // x₃ = (x₁y₂ + y₁x₂) / (1 + d·x₁x₂y₁y₂)
        let x_num = (x1y2 + y1x2) % p;
        let x_den = (BigUint::one() + &dxy) % p;
        // y₃ = (y₁y₂ − a·x₁x₂) / (1 − d·x₁x₂y₁y₂)
        let y_num = sub_mod(&y1y2, &((a * x1x2) % p), p);
        let y_den = sub_mod(&BigUint::one(), &dxy, p);

        let x3 = (x_num * mod_inv(&x_den, p)) % p;
        let y3 = (y_num * mod_inv(&y_den, p)) % p;
        Point::affine(x3, y3)
    }

    fn scalar_mult_unsigned(&self, k: &BigUint, pt: &Point) -> Point {
        if k.is_zero() {
            return self.identity();
        }
        let mut result = self.identity();
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

    /// Double-and-add; a negative `k` multiplies the negated point.
    pub fn scalar_mult(&self, k: &BigInt, pt: &Point) -> Point {
        match k.sign() {
            Sign::NoSign => self.identity(),
            Sign::Plus => self.scalar_mult_unsigned(k.magnitude(), pt),
            Sign::Minus => self.scalar_mult_unsigned(k.magnitude(), &self.negate(pt)),
        }
    }

    fn sign_bit_shift(&self) -> u64 {
        self.params.bit_size - 1
    }

    fn encoded_len(&self) -> usize {
        ((self.params.bit_size + 7) / 8) as usize
    }

    /// `sign_bit(x) << (bit_size − 1) | y`; parameter validation guarantees
    /// `y` fits below the sign bit.
    pub fn encode(&self, pt: &Point) -> Result<BigUint, CurveError> {
        let (x, y) = pt.xy().ok_or(CurveError::MalformedPoint)?;
        let sign = x & BigUint::one();
        Ok((sign << self.sign_bit_shift()) | y)
    }

    /// Inverse of [`encode`](Self::encode): recovers `x` from the curve
    /// equation, `x² = (y² − 1)/(dy² − a)`, and picks the root whose parity
    /// matches the sign bit.
    pub fn decode(&self, encoded: &BigUint) -> Result<Point, CurveError> {
        let p = &self.params.p;
        if encoded.bits() > self.params.bit_size {
            return Err(CurveError::MalformedPoint);
        }
        let shift = self.sign_bit_shift();
        let sign = encoded >> shift;
        let y = encoded & ((BigUint::one() << shift) - BigUint::one());
        if &y >= p {
            return Err(CurveError::MalformedPoint);
        }

        let (a, d) = self.ad();
        let y2 = (&y * &y) % p;
        let num = sub_mod(&y2, &BigUint::one(), p);
        let den = sub_mod(&((d * y2) % p), a, p);
        if den.is_zero() {
            return Err(CurveError::MalformedPoint);
        }
        let x2 = (num * mod_inv(&den, p)) % p;
        let mut x = mod_sqrt(&x2, p).ok_or(CurveError::PointNotOnCurve)?;
        if (&x & BigUint::one()) != sign {
            if x.is_zero() {
                return Err(CurveError::MalformedPoint);
            }
            x = p - &x;
        }
        Ok(Point::affine(x, y))
    }

    /// The challenge scalar `k = H(enc(R) ‖ enc(A) ‖ digest) mod n`, using
    /// the curve's configured hash over fixed-width big-endian encodings.
    fn challenge(&self, enc_r: &BigUint, enc_a: &BigUint, digest: &[u8]) -> BigUint {
        let len = self.encoded_len();
        let mut input = Vec::with_capacity(2 * len + digest.len());
        input.extend_from_slice(&to_fixed_bytes(enc_r, len));
        input.extend_from_slice(&to_fixed_bytes(enc_a, len));
        input.extend_from_slice(digest);
        BigUint::from_bytes_be(&self.params.hash.digest(&input)) % &self.params.n
    }

    /// EdDSA-BN signing.
    ///
    /// Nonce: `r = (d + m) mod n` with `m` the digest as an integer — the
    /// ported system's simplified mix, kept under its own name rather than
    /// silently corrected to RFC 8032.
    pub fn sign(&self, digest: &[u8], private_key: &BigUint) -> Result<Signed, CurveError> {
        let n = &self.params.n;
        if private_key.is_zero() || private_key >= n {
            return Err(CurveError::ScalarOutOfRange);
        }
        let m = BigUint::from_bytes_be(digest);
        let r = (private_key + m) % n;
        let big_r = self.scalar_mult_unsigned(&r, &self.params.g);
        let public_point = self.scalar_mult_unsigned(private_key, &self.params.g);
        let enc_r = self.encode(&big_r)?;
        let enc_a = self.encode(&public_point)?;
        let k = self.challenge(&enc_r, &enc_a, digest);
        let s = (r + k * private_key) % n;
        Ok(Signed {
            signature: (enc_r << self.params.bit_size) | s,
            public_key: enc_a,
        })
    }

    /// EdDSA-BN verification: `s·G == R + k·A`.
    ///
    /// A malformed or off-curve public key is an error; a signature whose
    /// `R` cannot be decoded is merely invalid.
    pub fn verify(
        &self,
        digest: &[u8],
        signature: &BigUint,
        public_key: &BigUint,
    ) -> Result<bool, CurveError> {
        let n = &self.params.n;
        let bit_size = self.params.bit_size;
        let s = signature & ((BigUint::one() << bit_size) - BigUint::one());
        let enc_r = signature >> bit_size;
        if &s >= n {
            return Ok(false);
        }
        let a_point = self.decode(public_key)?;
        let big_r = match self.decode(&enc_r) {
            Ok(pt) => pt,
            Err(_) => return Ok(false),
        };
        let k = self.challenge(&enc_r, &self.encode(&a_point)?, digest);
        let lhs = self.scalar_mult_unsigned(&s, &self.params.g);
        let rhs = self.add(&big_r, &self.scalar_mult_unsigned(&k, &a_point));
        Ok(lhs == rhs)
    }

    /// Fresh key pair: uniform `d ∈ [1, n-1]` and the encoded `d·G`.
    pub fn generate_key_pair(&self) -> Result<(BigUint, BigUint), CurveError> {
        let mut rng = OsRng;
        let d = rng.gen_biguint_range(&BigUint::one(), &self.params.n);
        let public_point = self.scalar_mult_unsigned(&d, &self.params.g);
        Ok((d, self.encode(&public_point)?))
    }

    /// Whether the encoding denotes a point on this curve.
    pub fn validate_public_key(&self, encoded: &BigUint) -> bool {
        self.decode(encoded).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::HashAlgorithm;
    use num_traits::Num;
    use quickcheck::quickcheck;

    fn ed25519() -> EdwardsCurve {
        EdwardsCurve::new(ed25519_params()).unwrap()
    }

    fn ed25519_params() -> CurveParameters {
        let p = (BigUint::one() << 255u32) - BigUint::from(19u8);
        CurveParameters {
            name: "Ed25519".to_owned(),
            coefficients: CurveCoefficients::TwistedEdwards {
                a: &p - BigUint::one(),
                d: BigUint::from_str_radix(
                    "52036cee2b6ffe738cc740797779e89800700a4d4141d8ab75eb4dca135978a3",
                    16,
                )
                .unwrap(),
            },
            p,
            g: Point::affine(
                BigUint::from_str_radix(
                    "216936d3cd6e53fec0a4e231fdd6dc5c692cc7609525a7b2c9562d608f25d51a",
                    16,
                )
                .unwrap(),
                BigUint::from_str_radix(
                    "6666666666666666666666666666666666666666666666666666666666666658",
                    16,
                )
                .unwrap(),
            ),
            n: BigUint::from_str_radix(
                "1000000000000000000000000000000014def9dea2f79cd65812631a5cf5d3ed",
                16,
            )
            .unwrap(),
            cofactor: BigUint::from(8u8),
            bit_size: 256,
            hash: HashAlgorithm::Sha512,
        }
    }

    fn digest_of(msg: &[u8]) -> Vec<u8> {
        HashAlgorithm::Sha512.digest(msg)
    }

    #[test]
    fn addition_respects_group_structure() {
        let curve = ed25519();
        let g = curve.params().g.clone();
        // G + id = G
        assert_eq!(curve.add(&g, &curve.identity()), g);
        // 2G + 3G = 5G
        let two_g = curve.scalar_mult(&BigInt::from(2), &g);
        let three_g = curve.scalar_mult(&BigInt::from(3), &g);
        let five_g = curve.scalar_mult(&BigInt::from(5), &g);
        assert_eq!(curve.add(&two_g, &three_g), five_g);
        // G + (-G) = id
        assert!(curve.is_identity(&curve.add(&g, &curve.negate(&g))));
        // (-2)·G == -(2·G)
        assert_eq!(curve.scalar_mult(&BigInt::from(-2), &g), curve.negate(&two_g));
    }

    #[test]
    fn generator_is_on_curve() {
        let curve = ed25519();
        assert!(curve.is_on_curve(&curve.params().g));
        assert!(curve.is_on_curve(&curve.identity()));
    }

    #[test]
    fn encode_decode_roundtrip() {
        let curve = ed25519();
        for k in [1u32, 2, 3, 7, 31337] {
            let g = curve.params().g.clone();
            let pt = curve.scalar_mult(&BigInt::from(k), &g);
            let encoded = curve.encode(&pt).unwrap();
            assert_eq!(curve.decode(&encoded).unwrap(), pt, "k = {}", k);
        }
        // the neutral element encodes as plain 1 (x = 0, y = 1)
        let id_enc = curve.encode(&curve.identity()).unwrap();
        assert_eq!(id_enc, BigUint::one());
        assert!(curve.is_identity(&curve.decode(&id_enc).unwrap()));
    }

    #[test]
    fn sign_verify_roundtrip_and_bit_flip() {
        let curve = ed25519();
        let d = BigUint::from(0xdead_beef_1234u64);
        let digest = digest_of(b"edwards document");
        let signed = curve.sign(&digest, &d).unwrap();
        assert!(curve.verify(&digest, &signed.signature, &signed.public_key).unwrap());

        let mut tampered = digest.clone();
        tampered[0] ^= 0x01;
        assert!(!curve.verify(&tampered, &signed.signature, &signed.public_key).unwrap());

        let tampered_sig = &signed.signature ^ (BigUint::one() << 3u32);
        assert!(!curve.verify(&digest, &tampered_sig, &signed.public_key).unwrap());
    }

    #[test]
    fn verify_rejects_foreign_public_key() {
        let curve = ed25519();
        let digest = digest_of(b"foreign");
        let signed = curve.sign(&digest, &BigUint::from(1234u32)).unwrap();
        let (_, other_public) = curve.generate_key_pair().unwrap();
        assert!(!curve.verify(&digest, &signed.signature, &other_public).unwrap());
    }

    #[test]
    fn malformed_public_key_is_an_error() {
        let curve = ed25519();
        let digest = digest_of(b"malformed");
        let signed = curve.sign(&digest, &BigUint::from(99u8)).unwrap();
        // y ≥ p cannot decode
        let bad = curve.params().p.clone();
        assert!(curve.verify(&digest, &signed.signature, &bad).is_err());
    }

    #[test]
    fn rejects_out_of_range_private_keys() {
        let curve = ed25519();
        let digest = digest_of(b"range");
        assert_eq!(
            curve.sign(&digest, &BigUint::zero()).unwrap_err(),
            CurveError::ScalarOutOfRange
        );
        let n = curve.params().n.clone();
        assert_eq!(curve.sign(&digest, &n).unwrap_err(), CurveError::ScalarOutOfRange);
    }

    #[test]
    fn generated_key_pairs_work() {
        let curve = ed25519();
        let (d, public) = curve.generate_key_pair().unwrap();
        assert!(curve.validate_public_key(&public));
        let digest = digest_of(b"generated");
        let signed = curve.sign(&digest, &d).unwrap();
        assert_eq!(signed.public_key, public);
        assert!(curve.verify(&digest, &signed.signature, &public).unwrap());
    }

    quickcheck! {
        fn sign_verify_holds(msg: Vec<u8>, d: u64) -> bool {
            let curve = ed25519();
            let d = BigUint::from(d.max(1));
            let digest = digest_of(&msg);
            let signed = curve.sign(&digest, &d).unwrap();
            curve.verify(&digest, &signed.signature, &signed.public_key).unwrap()
        }
    }
}
