use criterion::{black_box, criterion_group, criterion_main, Criterion};
use curves::{
    CurveCoefficients, CurveParameters, EdwardsCurve, HashAlgorithm, Point, WeierstrassCurve,
};
use num_bigint::BigUint;
use num_traits::{Num, One, Zero};

fn secp256k1() -> WeierstrassCurve {
    WeierstrassCurve::new(CurveParameters {
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
    })
    .unwrap()
}

fn ed25519() -> EdwardsCurve {
    let p = (BigUint::one() << 255u32) - BigUint::from(19u8);
    EdwardsCurve::new(CurveParameters {
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
    })
    .unwrap()
}

fn criterion_benchmark(c: &mut Criterion) {
    let weierstrass = secp256k1();
    let edwards = ed25519();
    let d = BigUint::from(0x1234_5678_9abc_def0u64);
    let ecdsa_digest = BigUint::from_bytes_be(&HashAlgorithm::Sha256.digest(b"benchmark input"));
    let eddsa_digest = HashAlgorithm::Sha512.digest(b"benchmark input");

    let ecdsa_signed = weierstrass.sign(&ecdsa_digest, &d).unwrap();
    let eddsa_signed = edwards.sign(&eddsa_digest, &d).unwrap();

    c.bench_function("ecdsa sign secp256k1", |b| {
        b.iter(|| weierstrass.sign(black_box(&ecdsa_digest), black_box(&d)))
    });
    c.bench_function("ecdsa verify secp256k1", |b| {
        b.iter(|| {
            weierstrass.verify(
                black_box(&ecdsa_digest),
                &ecdsa_signed.signature,
                &ecdsa_signed.public_key,
            )
        })
    });
    c.bench_function("eddsa-bn sign ed25519", |b| {
        b.iter(|| edwards.sign(black_box(&eddsa_digest), black_box(&d)))
    });
    c.bench_function("eddsa-bn verify ed25519", |b| {
        b.iter(|| {
            edwards.verify(
                black_box(&eddsa_digest),
                &eddsa_signed.signature,
                &eddsa_signed.public_key,
            )
        })
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
