//! ECDSA provider: Weierstrass curve map plus the hex/base64 surface.

use std::{collections::BTreeMap, sync::Arc};

use curves::WeierstrassCurve;
use num_bigint::BigUint;
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
    curve: WeierstrassCurve,
    description: String,
    parameters: Value,
}

type CurveMap = BTreeMap<String, Arc<CurveEntry>>;

/// ECDSA over runtime-configured Weierstrass curves.
///
/// The curve map is published as an immutable snapshot behind the lock;
/// every operation works on the snapshot it took at entry, so a concurrent
/// [`configure`](Self::configure) never tears an in-flight call.
pub struct EcdsaProvider {
    curves: RwLock<Arc<CurveMap>>,
}

impl std::fmt::Debug for EcdsaProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EcdsaProvider")
            .field("curves", &self.curves.read().keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Default for EcdsaProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl EcdsaProvider {
    pub const ALGORITHM_NAME: &'static str = "ECDSA";
    pub const ALGORITHM_TYPE: &'static str = "elliptic-curve";

    /// A provider with no curves; it answers `UnsupportedCurve` until the
    /// first [`configure`](Self::configure).
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
    ///
    /// Disabled records are skipped with a warning; a broken record fails
    /// the whole call and leaves the previous map in place.
    pub fn configure(&self, record: &AlgorithmRecord) -> Result<(), ProviderError> {
        let mut next = CurveMap::new();
        for (name, curve_record) in &record.curves {
            if curve_record.status == CurveStatus::Disabled {
                warn!(curve = %name, "skipping disabled curve record");
                continue;
            }
            let params = source::weierstrass_parameters(name, curve_record)?;
            let curve = WeierstrassCurve::new(params)
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
        let digest = BigUint::from_bytes_be(&entry.curve.params().hash.digest(&doc));
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
        let digest = BigUint::from_bytes_be(&entry.curve.params().hash.digest(&doc));
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

    /// Whether the hex string denotes a point on the named curve. Malformed
    /// input is an ordinary `false`, not an error — validation is a query.
    pub fn validate_public_key(
        &self,
        public_key: &str,
        curve_name: &str,
    ) -> Result<bool, ProviderError> {
        let entry = self.entry(curve_name)?;
        Ok(
            match parse_hex(public_key, |reason| ProviderError::InvalidPublicKey { reason }) {
                Ok(compressed) => entry.curve.validate_public_key(&compressed),
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
