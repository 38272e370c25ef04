//! EdDSA-BN provider: twisted-Edwards curve map plus the hex/base64
//! surface. The underlying scheme is the custom EdDSA variant of the
//! `curves` crate, not RFC 8032 — see the warning there.

use std::{collections::BTreeMap, sync::Arc};

use curves::EdwardsCurve;
use parking_lot::RwLock;
use serde_json::Value;
use tracing::{debug, warn};

use crate::{
    error::ProviderError,
    provider::{
        decode_document, parse_hex, to_hex, verification_metadata, CurveInfo, GeneratedKeyPair,
        SignOutput, Verification,
    },
    source::{self, AlgorithmRecord, CurveStatus},
};

struct CurveEntry {
    curve: EdwardsCurve,
    description: String,
    parameters: Value,
}

type CurveMap = BTreeMap<String, Arc<CurveEntry>>;

/// EdDSA-BN over runtime-configured twisted Edwards curves.
///
/// Same snapshot discipline as the ECDSA provider: reads work on the map
/// generation they grabbed at entry.
pub struct EddsaProvider {
    curves: RwLock<Arc<CurveMap>>,
}

impl std::fmt::Debug for EddsaProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EddsaProvider")
            .field("curves", &self.curves.read().keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Default for EddsaProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl EddsaProvider {
    pub const ALGORITHM_NAME: &'static str = "EdDSA-BN";
    pub const ALGORITHM_TYPE: &'static str = "edwards-curve";

    pub fn new() -> Self {
        Self {
            curves: RwLock::new(Arc::new(CurveMap::new())),
        }
    }

    pub fn from_record(record: &AlgorithmRecord) -> Result<Self, ProviderError> {
        let provider = Self::new();
        provider.configure(record)?;
        Ok(provider)
    }

    /// Rebuild the curve map from a record and publish it in one swap.
    pub fn configure(&self, record: &AlgorithmRecord) -> Result<(), ProviderError> {
        let mut next = CurveMap::new();
        for (name, curve_record) in &record.curves {
            if curve_record.status == CurveStatus::Disabled {
                warn!(curve = %name, "skipping disabled curve record");
                continue;
            }
            let params = source::edwards_parameters(name, curve_record)?;
            let curve = EdwardsCurve::new(params)
                .map_err(|e| ProviderError::bad_record(name, e.to_string()))?;
            next.insert(
                name.clone(),
                Arc::new(CurveEntry {
                    curve,
                    description: curve_record.description.clone(),
                    parameters: curve_record.parameters.clone(),
                }),
            );
        }
        debug!(
            algorithm = Self::ALGORITHM_NAME,
            curves = next.len(),
            "publishing rebuilt curve map"
        );
        *self.curves.write() = Arc::new(next);
        Ok(())
    }

    fn snapshot(&self) -> Arc<CurveMap> {
        self.curves.read().clone()
    }

    fn entry(&self, curve_name: &str) -> Result<Arc<CurveEntry>, ProviderError> {
        self.snapshot()
            .get(curve_name)
            .cloned()
            .ok_or_else(|| ProviderError::unsupported_curve(curve_name))
    }

    pub fn sign(
        &self,
        document: &str,
        private_key: &str,
        curve_name: &str,
    ) -> Result<SignOutput, ProviderError> {
        let entry = self.entry(curve_name)?;
        let doc = decode_document(document)?;
        let d = parse_hex(private_key, |reason| ProviderError::SigningFailed { reason })?;
        let digest = entry.curve.params().hash.digest(&doc);
        let signed = entry
            .curve
            .sign(&digest, &d)
            .map_err(|e| ProviderError::SigningFailed { reason: e.to_string() })?;
        Ok(SignOutput {
            signature: to_hex(&signed.signature),
            document: document.to_owned(),
            public_key: to_hex(&signed.public_key),
        })
    }

    pub fn verify(
        &self,
        document: &str,
        signature: &str,
        public_key: &str,
        curve_name: &str,
    ) -> Result<Verification, ProviderError> {
        let entry = self.entry(curve_name)?;
        let doc = decode_document(document)?;
        let sig = parse_hex(signature, |reason| ProviderError::InvalidSignatureFormat {
            reason,
        })?;
        let key = parse_hex(public_key, |reason| ProviderError::InvalidPublicKey { reason })?;
        let digest = entry.curve.params().hash.digest(&doc);
        let is_valid = entry.curve.verify(&digest, &sig, &key).map_err(|e| {
            ProviderError::InvalidPublicKey { reason: e.to_string() }
        })?;
        let metadata = verification_metadata(
            document,
            &to_hex(&key),
            curve_name,
            entry.curve.params().bit_size,
        );
        Ok(Verification { is_valid, metadata })
    }

    pub fn generate_key_pair(&self, curve_name: &str) -> Result<GeneratedKeyPair, ProviderError> {
        let entry = self.entry(curve_name)?;
        let (d, public) = entry
            .curve
            .generate_key_pair()
            .map_err(|e| ProviderError::SigningFailed { reason: e.to_string() })?;
        Ok(GeneratedKeyPair {
            private_key: to_hex(&d),
            public_key: to_hex(&public),
        })
    }

    /// Whether the hex string decodes to a point on the named curve.
    pub fn validate_public_key(
        &self,
        public_key: &str,
        curve_name: &str,
    ) -> Result<bool, ProviderError> {
        let entry = self.entry(curve_name)?;
        Ok(
            match parse_hex(public_key, |reason| ProviderError::InvalidPublicKey { reason }) {
                Ok(encoded) => entry.curve.validate_public_key(&encoded),
                Err(_) => false,
            },
        )
    }

    pub fn supported_curves(&self) -> BTreeMap<String, CurveInfo> {
        self.snapshot()
            .iter()
            .map(|(name, entry)| (name.clone(), Self::info(entry)))
            .collect()
    }

    pub fn curve_info(&self, curve_name: &str) -> Option<CurveInfo> {
        self.snapshot().get(curve_name).map(|e| Self::info(e))
    }

    fn info(entry: &CurveEntry) -> CurveInfo {
        CurveInfo {
            bit_size: entry.curve.params().bit_size,
            description: entry.description.clone(),
            hash_algorithm: entry.curve.params().hash.to_string(),
            parameters: entry.parameters.clone(),
        }
    }
}
