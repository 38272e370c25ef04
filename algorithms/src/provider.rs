//! The closed set of signature algorithm providers and their common
//! input/output types.

use std::collections::BTreeMap;

use num_bigint::BigUint;
use num_traits::Num;
use serde::Serialize;
use serde_json::{json, Value};

use crate::{
    ecdsa::EcdsaProvider, eddsa::EddsaProvider, error::ProviderError, rsa::RsaProvider,
    source::AlgorithmRecord,
};

/// Result of a signing call: everything the caller hands on to the client.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SignOutput {
    pub signature: String,
    pub document: String,
    pub public_key: String,
}

/// Result of a verification call.
///
/// `is_valid == false` means the signature is well-formed but wrong — the
/// call itself succeeded. The metadata carries the diagnostic fields the
/// service layer records alongside the verdict.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Verification {
    pub is_valid: bool,
    pub metadata: BTreeMap<String, Value>,
}

/// A freshly minted key pair, hex-encoded like all key material.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct GeneratedKeyPair {
    pub private_key: String,
    pub public_key: String,
}

/// Descriptive view of one supported curve.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CurveInfo {
    pub bit_size: u64,
    pub description: String,
    pub hash_algorithm: String,
    pub parameters: Value,
}

/// All providers this system knows. A closed set: adding an algorithm means
/// adding a variant, and every dispatch site is an exhaustive `match`.
#[derive(Debug)]
pub enum Provider {
    Ecdsa(EcdsaProvider),
    EdDsa(EddsaProvider),
    Rsa(RsaProvider),
}

impl Provider {
    pub fn algorithm_name(&self) -> &'static str {
        match self {
            Provider::Ecdsa(_) => EcdsaProvider::ALGORITHM_NAME,
            Provider::EdDsa(_) => EddsaProvider::ALGORITHM_NAME,
            Provider::Rsa(_) => RsaProvider::ALGORITHM_NAME,
        }
    }

    pub fn algorithm_type(&self) -> &'static str {
        match self {
            Provider::Ecdsa(_) => EcdsaProvider::ALGORITHM_TYPE,
            Provider::EdDsa(_) => EddsaProvider::ALGORITHM_TYPE,
            Provider::Rsa(_) => RsaProvider::ALGORITHM_TYPE,
        }
    }

    pub fn supported_curves(&self) -> BTreeMap<String, CurveInfo> {
        match self {
            Provider::Ecdsa(p) => p.supported_curves(),
            Provider::EdDsa(p) => p.supported_curves(),
            Provider::Rsa(p) => p.supported_curves(),
        }
    }

    pub fn curve_info(&self, curve_name: &str) -> Option<CurveInfo> {
        match self {
            Provider::Ecdsa(p) => p.curve_info(curve_name),
            Provider::EdDsa(p) => p.curve_info(curve_name),
            Provider::Rsa(p) => p.curve_info(curve_name),
        }
    }

    pub fn supports_curve(&self, curve_name: &str) -> bool {
        self.curve_info(curve_name).is_some()
    }

    /// Re-parse an updated record and atomically swap the curve map.
    pub fn configure(&self, record: &AlgorithmRecord) -> Result<(), ProviderError> {
        match self {
            Provider::Ecdsa(p) => p.configure(record),
            Provider::EdDsa(p) => p.configure(record),
            Provider::Rsa(p) => p.configure(record),
        }
    }

    pub fn sign(
        &self,
        document: &str,
        private_key: &str,
        curve_name: &str,
    ) -> Result<SignOutput, ProviderError> {
        match self {
            Provider::Ecdsa(p) => p.sign(document, private_key, curve_name),
            Provider::EdDsa(p) => p.sign(document, private_key, curve_name),
            Provider::Rsa(p) => p.sign(document, private_key, curve_name),
        }
    }

    pub fn verify(
        &self,
        document: &str,
        signature: &str,
        public_key: &str,
        curve_name: &str,
    ) -> Result<Verification, ProviderError> {
        match self {
            Provider::Ecdsa(p) => p.verify(document, signature, public_key, curve_name),
            Provider::EdDsa(p) => p.verify(document, signature, public_key, curve_name),
            Provider::Rsa(p) => p.verify(document, signature, public_key, curve_name),
        }
    }

    pub fn generate_key_pair(&self, curve_name: &str) -> Result<GeneratedKeyPair, ProviderError> {
        match self {
            Provider::Ecdsa(p) => p.generate_key_pair(curve_name),
            Provider::EdDsa(p) => p.generate_key_pair(curve_name),
            Provider::Rsa(_) => Err(ProviderError::KeyGenerationUnsupported {
                algorithm: RsaProvider::ALGORITHM_NAME.to_owned(),
            }),
        }
    }

    pub fn validate_public_key(
        &self,
        public_key: &str,
        curve_name: &str,
    ) -> Result<bool, ProviderError> {
        match self {
            Provider::Ecdsa(p) => p.validate_public_key(public_key, curve_name),
            Provider::EdDsa(p) => p.validate_public_key(public_key, curve_name),
            Provider::Rsa(p) => p.validate_public_key(public_key, curve_name),
        }
    }
}

impl From<EcdsaProvider> for Provider {
    fn from(p: EcdsaProvider) -> Self {
        Provider::Ecdsa(p)
    }
}
impl From<EddsaProvider> for Provider {
    fn from(p: EddsaProvider) -> Self {
        Provider::EdDsa(p)
    }
}
impl From<RsaProvider> for Provider {
    fn from(p: RsaProvider) -> Self {
        Provider::Rsa(p)
    }
}

/// Hex string (optionally `0x`-prefixed, any case) to integer. The error is
/// built by the caller so the same helper serves keys and signatures with
/// the right taxonomy; input values are not echoed into errors since they
/// may be key material.
pub(crate) fn parse_hex(
    input: &str,
    err: impl Fn(String) -> ProviderError,
) -> Result<BigUint, ProviderError> {
    let trimmed = input.trim().to_ascii_lowercase();
    let body = trimmed.strip_prefix("0x").unwrap_or(&trimmed);
    if body.is_empty() {
        return Err(err("empty hex string".to_owned()));
    }
    BigUint::from_str_radix(body, 16).map_err(|_| err("not a hex string".to_owned()))
}

pub(crate) fn to_hex(value: &BigUint) -> String {
    value.to_str_radix(16)
}

/// Documents travel base64-encoded; everything else is malformed input.
pub(crate) fn decode_document(document: &str) -> Result<Vec<u8>, ProviderError> {
    base64::decode(document.trim()).map_err(|e| ProviderError::InvalidDocument {
        reason: e.to_string(),
    })
}

/// The diagnostic fields every verification reports back.
pub(crate) fn verification_metadata(
    document: &str,
    public_key: &str,
    curve_name: &str,
    bit_size: u64,
) -> BTreeMap<String, Value> {
    BTreeMap::from([
        ("document".to_owned(), json!(document)),
        ("public_key".to_owned(), json!(public_key)),
        ("curve_name".to_owned(), json!(curve_name)),
        ("bit_size".to_owned(), json!(bit_size)),
    ])
}
