//! Externally stored algorithm/curve records and their parsing.
//!
//! The surrounding service owns persistence; this crate only sees the
//! already-loaded records. Parameter values are polymorphic in the stored
//! form — plain integers, decimal strings, `0x`-prefixed hex strings, and
//! points additionally as two-element lists, `{x, y}` maps or `"x,y"`
//! strings — and are normalized here into typed big integers reduced mod
//! `p`.

use std::collections::BTreeMap;

use curves::{CurveCoefficients, CurveParameters, HashAlgorithm, Point};
use num_bigint::{BigInt, BigUint};
use num_integer::Integer;
use num_traits::Num;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ProviderError;

/// Everything the parameter source hands over: algorithm name → record.
pub type SourceData = BTreeMap<String, AlgorithmRecord>;

/// One algorithm's stored record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AlgorithmRecord {
    #[serde(rename = "type")]
    pub algorithm_type: String,
    #[serde(default)]
    pub curves: BTreeMap<String, CurveRecord>,
}

/// One curve's stored record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CurveRecord {
    #[serde(default)]
    pub parameters: Value,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: CurveStatus,
}

/// Whether a stored curve may be offered.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum CurveStatus {
    #[default]
    Enabled,
    Disabled,
}

fn int_from_str(s: &str) -> Option<BigInt> {
    let t = s.trim().to_ascii_lowercase();
    let (negative, body) = match t.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, t.as_str()),
    };
    let value = if let Some(hex) = body.strip_prefix("0x") {
        BigInt::from_str_radix(hex, 16).ok()?
    } else {
        BigInt::from_str_radix(body, 10).ok()?
    };
    Some(if negative { -value } else { value })
}

fn int_from_value(value: &Value) -> Option<BigInt> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .map(BigInt::from)
            .or_else(|| n.as_u64().map(BigInt::from)),
        Value::String(s) => int_from_str(s),
        _ => None,
    }
}

/// View over one record's `parameters` object with typed field access.
struct RawParameters<'a> {
    curve: &'a str,
    map: &'a serde_json::Map<String, Value>,
}

impl<'a> RawParameters<'a> {
    fn new(curve: &'a str, parameters: &'a Value) -> Result<Self, ProviderError> {
        match parameters {
            Value::Object(map) => Ok(Self { curve, map }),
            _ => Err(ProviderError::bad_record(curve, "parameters must be an object")),
        }
    }

    fn required_int(&self, field: &str) -> Result<BigInt, ProviderError> {
        let value = self
            .map
            .get(field)
            .ok_or_else(|| ProviderError::bad_record(self.curve, format!("missing field '{}'", field)))?;
        int_from_value(value)
            .ok_or_else(|| ProviderError::bad_record(self.curve, format!("unreadable integer in '{}'", field)))
    }

    fn required_point(&self, field: &str) -> Result<(BigInt, BigInt), ProviderError> {
        let bad = |reason: String| ProviderError::bad_record(self.curve, reason);
        let value = self
            .map
            .get(field)
            .ok_or_else(|| bad(format!("missing field '{}'", field)))?;
        let coords = match value {
            Value::Array(items) if items.len() == 2 => {
                (int_from_value(&items[0]), int_from_value(&items[1]))
            }
            Value::Object(map) => (
                map.get("x").and_then(int_from_value),
                map.get("y").and_then(int_from_value),
            ),
            Value::String(s) => match s.split_once(',') {
                Some((x, y)) => (int_from_str(x), int_from_str(y)),
                None => (None, None),
            },
            _ => (None, None),
        };
        match coords {
            (Some(x), Some(y)) => Ok((x, y)),
            _ => Err(bad(format!("unreadable point in '{}'", field))),
        }
    }

    fn optional_u64(&self, field: &str) -> Option<u64> {
        self.map.get(field).and_then(Value::as_u64)
    }

    fn optional_str(&self, field: &str) -> Option<&str> {
        self.map.get(field).and_then(Value::as_str)
    }
}

fn reduce(value: BigInt, p: &BigUint) -> BigUint {
    let modulus = BigInt::from(p.clone());
    value
        .mod_floor(&modulus)
        .to_biguint()
        .expect("mod_floor result is non-negative")
}

fn positive(value: BigInt, curve: &str, field: &str) -> Result<BigUint, ProviderError> {
    value
        .to_biguint()
        .ok_or_else(|| ProviderError::bad_record(curve, format!("'{}' must be positive", field)))
}

struct CommonParameters {
    p: BigUint,
    g: Point,
    n: BigUint,
    cofactor: BigUint,
    bit_size: u64,
    hash: HashAlgorithm,
}

fn common_parameters(raw: &RawParameters<'_>) -> Result<CommonParameters, ProviderError> {
    let p = positive(raw.required_int("p")?, raw.curve, "p")?;
    let n = positive(raw.required_int("n")?, raw.curve, "n")?;
    let (gx, gy) = raw.required_point("g")?;
    let g = Point::affine(reduce(gx, &p), reduce(gy, &p));
    let cofactor = match raw.map.get("h") {
        None => BigUint::from(1u8),
        Some(value) => positive(
            int_from_value(value)
                .ok_or_else(|| ProviderError::bad_record(raw.curve, "unreadable integer in 'h'"))?,
            raw.curve,
            "h",
        )?,
    };
    let bit_size = raw.optional_u64("bit_size").unwrap_or(256);
    let hash = match raw.optional_str("hash_algorithm") {
        Some(name) => name
            .parse::<HashAlgorithm>()
            .map_err(|e| ProviderError::bad_record(raw.curve, e.to_string()))?,
        None => HashAlgorithm::for_bit_size(bit_size),
    };
    Ok(CommonParameters {
        p,
        g,
        n,
        cofactor,
        bit_size,
        hash,
    })
}

/// Parse a stored record into Weierstrass curve parameters (`a`, `b`).
pub(crate) fn weierstrass_parameters(
    name: &str,
    record: &CurveRecord,
) -> Result<CurveParameters, ProviderError> {
    let raw = RawParameters::new(name, &record.parameters)?;
    let common = common_parameters(&raw)?;
    let a = reduce(raw.required_int("a")?, &common.p);
    let b = reduce(raw.required_int("b")?, &common.p);
    Ok(CurveParameters {
        name: name.to_owned(),
        coefficients: CurveCoefficients::Weierstrass { a, b },
        p: common.p,
        g: common.g,
        n: common.n,
        cofactor: common.cofactor,
        bit_size: common.bit_size,
        hash: common.hash,
    })
}

/// Parse a stored record into twisted-Edwards curve parameters (`a`, `d`).
pub(crate) fn edwards_parameters(
    name: &str,
    record: &CurveRecord,
) -> Result<CurveParameters, ProviderError> {
    let raw = RawParameters::new(name, &record.parameters)?;
    let common = common_parameters(&raw)?;
    let a = reduce(raw.required_int("a")?, &common.p);
    let d = reduce(raw.required_int("d")?, &common.p);
    Ok(CurveParameters {
        name: name.to_owned(),
        coefficients: CurveCoefficients::TwistedEdwards { a, d },
        p: common.p,
        g: common.g,
        n: common.n,
        cofactor: common.cofactor,
        bit_size: common.bit_size,
        hash: common.hash,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use curves::CurveFamily;
    use serde_json::json;

    fn record(parameters: Value) -> CurveRecord {
        CurveRecord {
            parameters,
            description: String::new(),
            status: CurveStatus::Enabled,
        }
    }

    #[test]
    fn parses_integers_in_all_stored_forms() {
        let rec = record(json!({
            "p": 23,
            "a": "-3",
            "b": "0x07",
            "n": "29",
            "g": [1, 2],
        }));
        let params = weierstrass_parameters("toy", &rec).unwrap();
        assert_eq!(params.p, BigUint::from(23u8));
        assert_eq!(params.n, BigUint::from(29u8));
        match &params.coefficients {
            CurveCoefficients::Weierstrass { a, b } => {
                assert_eq!(*a, BigUint::from(20u8)); // -3 mod 23
                assert_eq!(*b, BigUint::from(7u8));
            }
            _ => panic!("wrong family"),
        }
    }

    #[test]
    fn parses_points_in_all_stored_forms() {
        for g in [json!([1, 2]), json!({"x": "1", "y": "0x2"}), json!("1, 2")] {
            let rec = record(json!({"p": 23, "a": 0, "b": 7, "n": 29, "g": g}));
            let params = weierstrass_parameters("toy", &rec).unwrap();
            let (x, y) = params.g.xy().unwrap();
            assert_eq!((x.clone(), y.clone()), (BigUint::from(1u8), BigUint::from(2u8)));
        }
    }

    #[test]
    fn missing_field_names_the_field() {
        let rec = record(json!({"p": 23, "a": 0, "b": 7, "g": [1, 2]}));
        let err = weierstrass_parameters("toy", &rec).unwrap_err();
        assert!(err.to_string().contains("'n'"), "{}", err);
    }

    #[test]
    fn non_object_parameters_are_rejected() {
        let rec = record(Value::Null);
        assert!(weierstrass_parameters("toy", &rec).is_err());
    }

    #[test]
    fn explicit_hash_beats_bit_size_rule() {
        let rec = record(json!({
            "p": 23, "a": 0, "b": 7, "n": 29, "g": [1, 2],
            "bit_size": 256, "hash_algorithm": "SHA512",
        }));
        let params = weierstrass_parameters("toy", &rec).unwrap();
        assert_eq!(params.hash, HashAlgorithm::Sha512);

        let rec = record(json!({"p": 23, "a": 0, "b": 7, "n": 29, "g": [1, 2], "bit_size": 384}));
        let params = weierstrass_parameters("toy", &rec).unwrap();
        assert_eq!(params.hash, HashAlgorithm::Sha384);
    }

    #[test]
    fn edwards_records_carry_d_and_cofactor() {
        let rec = record(json!({
            "p": 23, "a": 1, "d": 2, "n": 29, "g": [1, 2], "h": 8,
        }));
        let params = edwards_parameters("toy-ed", &rec).unwrap();
        assert_eq!(params.family(), CurveFamily::TwistedEdwards);
        assert_eq!(params.cofactor, BigUint::from(8u8));
    }

    #[test]
    fn status_defaults_to_enabled() {
        let rec: CurveRecord = serde_json::from_value(json!({
            "parameters": {"p": 23},
            "description": "toy",
        }))
        .unwrap();
        assert_eq!(rec.status, CurveStatus::Enabled);

        let rec: CurveRecord = serde_json::from_value(json!({
            "parameters": {"p": 23},
            "status": "disabled",
        }))
        .unwrap();
        assert_eq!(rec.status, CurveStatus::Disabled);
    }

    #[test]
    fn algorithm_record_roundtrips_through_json() {
        let rec = AlgorithmRecord {
            algorithm_type: "elliptic-curve".to_owned(),
            curves: BTreeMap::from([(
                "toy".to_owned(),
                record(json!({"p": 23, "a": 0, "b": 7, "n": 29, "g": [1, 2]})),
            )]),
        };
        let json = serde_json::to_value(&rec).unwrap();
        assert_eq!(json["type"], "elliptic-curve");
        let back: AlgorithmRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, rec);
    }
}
