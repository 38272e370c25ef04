//! RSA-PSS provider over plain modular exponentiation.
//!
//! The "curves" of this provider are key-size profiles (`RSA-2048`, …).
//! Key material travels as fixed-width hex strings: the private key is the
//! concatenation `d ‖ e ‖ n`, the public key `e ‖ n`, each component
//! exactly `bit_size/4` hex digits. The EMSA-PSS encoding (MGF1, salt
//! length = digest length) is implemented here; the modular arithmetic is
//! `BigUint::modpow`. Keys are supplied externally — this provider does not
//! generate RSA primes.

use std::{collections::BTreeMap, sync::Arc};

use curves::{field::to_fixed_bytes, HashAlgorithm};
use num_bigint::BigUint;
use num_integer::Integer;
use num_traits::{Num, Zero};
use parking_lot::RwLock;
use rand::{rngs::OsRng, RngCore};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::{
    error::ProviderError,
    provider::{
        decode_document, parse_hex, to_hex, verification_metadata, CurveInfo, SignOutput,
        Verification,
    },
    source::{AlgorithmRecord, CurveStatus},
};

struct KeyProfile {
    bit_size: u64,
    hash: HashAlgorithm,
    description: String,
    parameters: Value,
}

type ProfileMap = BTreeMap<String, Arc<KeyProfile>>;

/// RSA-PSS signatures over runtime-configured key-size profiles.
pub struct RsaProvider {
    profiles: RwLock<Arc<ProfileMap>>,
}

impl std::fmt::Debug for RsaProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RsaProvider")
            .field("profiles", &self.profiles.read().keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Default for RsaProvider {
    fn default() -> Self {
        Self::new()
    }
}

fn default_profiles() -> ProfileMap {
    [(2048u64, "RSA with 2048-bit key size"),
     (3072, "RSA with 3072-bit key size"),
     (4096, "RSA with 4096-bit key size")]
        .into_iter()
        .map(|(bits, description)| {
            (
                format!("RSA-{}", bits),
                Arc::new(KeyProfile {
                    bit_size: bits,
                    hash: HashAlgorithm::Sha256,
                    description: description.to_owned(),
                    parameters: json!({ "bit_size": bits }),
                }),
            )
        })
        .collect()
}

fn profile_from_record(
    name: &str,
    record: &crate::source::CurveRecord,
) -> Result<KeyProfile, ProviderError> {
    let (bit_size, hash_name) = match &record.parameters {
        Value::Null => (2048, None),
        Value::Object(map) => (
            map.get("bit_size").and_then(Value::as_u64).unwrap_or(2048),
            map.get("hash_algorithm").and_then(Value::as_str),
        ),
        _ => return Err(ProviderError::bad_record(name, "parameters must be an object")),
    };
    let hash = match hash_name {
        Some(h) => h
            .parse::<HashAlgorithm>()
            .map_err(|e| ProviderError::bad_record(name, e.to_string()))?,
        None => HashAlgorithm::Sha256,
    };
    if bit_size % 8 != 0 {
        return Err(ProviderError::bad_record(name, "bit size must be a multiple of 8"));
    }
    // EMSA-PSS with salt length = digest length must fit into emLen bytes
    if 2 * hash.digest_len() + 2 > (bit_size / 8) as usize {
        return Err(ProviderError::bad_record(name, "modulus too small for PSS encoding"));
    }
    Ok(KeyProfile {
        bit_size,
        hash,
        description: record.description.clone(),
        parameters: record.parameters.clone(),
    })
}

impl RsaProvider {
    pub const ALGORITHM_NAME: &'static str = "RSA-SHA256";
    pub const ALGORITHM_TYPE: &'static str = "asymmetric";

    /// Starts with the conventional 2048/3072/4096 profiles; a configure
    /// call replaces them with the stored records.
    pub fn new() -> Self {
        Self {
            profiles: RwLock::new(Arc::new(default_profiles())),
        }
    }

    pub fn from_record(record: &AlgorithmRecord) -> Result<Self, ProviderError> {
        let provider = Self::new();
        provider.configure(record)?;
        Ok(provider)
    }

    /// Rebuild the profile map from a record and publish it in one swap.
    pub fn configure(&self, record: &AlgorithmRecord) -> Result<(), ProviderError> {
        let mut next = ProfileMap::new();
        for (name, curve_record) in &record.curves {
            if curve_record.status == CurveStatus::Disabled {
                warn!(profile = %name, "skipping disabled key profile");
                continue;
            }
            next.insert(name.clone(), Arc::new(profile_from_record(name, curve_record)?));
        }
        debug!(
            algorithm = Self::ALGORITHM_NAME,
            profiles = next.len(),
            "publishing rebuilt profile map"
        );
        *self.profiles.write() = Arc::new(next);
        Ok(())
    }

    fn snapshot(&self) -> Arc<ProfileMap> {
        self.profiles.read().clone()
    }

    fn profile(&self, name: &str) -> Result<Arc<KeyProfile>, ProviderError> {
        self.snapshot()
            .get(name)
            .cloned()
            .ok_or_else(|| ProviderError::unsupported_curve(name))
    }

    pub fn sign(
        &self,
        document: &str,
        private_key: &str,
        curve_name: &str,
    ) -> Result<SignOutput, ProviderError> {
        let profile = self.profile(curve_name)?;
        let doc = decode_document(document)?;
        let err = |reason: String| ProviderError::SigningFailed { reason };
        let [d, e, n] = split_components::<3>(private_key, profile.bit_size, &err)?;
        if n.bits() != profile.bit_size {
            return Err(err("modulus width does not match the key profile".to_owned()));
        }
        if d.is_zero() || d >= n {
            return Err(err("private exponent out of range".to_owned()));
        }

        let m_hash = profile.hash.digest(&doc);
        let mut salt = vec![0u8; profile.hash.digest_len()];
        OsRng.fill_bytes(&mut salt);
        let em = pss_encode(&profile.hash, &m_hash, profile.bit_size - 1, &salt);
        let s = BigUint::from_bytes_be(&em).modpow(&d, &n);

        Ok(SignOutput {
            signature: to_hex(&s),
            document: document.to_owned(),
            public_key: public_key_hex(&e, &n, profile.bit_size),
        })
    }

    pub fn verify(
        &self,
        document: &str,
        signature: &str,
        public_key: &str,
        curve_name: &str,
    ) -> Result<Verification, ProviderError> {
        let profile = self.profile(curve_name)?;
        let doc = decode_document(document)?;
        let sig = parse_hex(signature, |reason| ProviderError::InvalidSignatureFormat {
            reason,
        })?;
        let err = |reason: String| ProviderError::InvalidPublicKey { reason };
        let [e, n] = split_components::<2>(public_key, profile.bit_size, &err)?;
        if n.bits() != profile.bit_size {
            return Err(err("modulus width does not match the key profile".to_owned()));
        }

        let is_valid = if sig >= n {
            false
        } else {
            let em_bits = profile.bit_size - 1;
            let em_len = ((em_bits + 7) / 8) as usize;
            let m = sig.modpow(&e, &n);
            let em = to_fixed_bytes(&m, em_len);
            em.len() == em_len && pss_verify(&profile.hash, &profile.hash.digest(&doc), &em, em_bits)
        };

        let metadata = verification_metadata(
            document,
            &public_key.trim().to_ascii_lowercase(),
            curve_name,
            profile.bit_size,
        );
        Ok(Verification { is_valid, metadata })
    }

    /// Structural check of an `e ‖ n` public key for the named profile.
    pub fn validate_public_key(
        &self,
        public_key: &str,
        curve_name: &str,
    ) -> Result<bool, ProviderError> {
        let profile = self.profile(curve_name)?;
        let err = |reason: String| ProviderError::InvalidPublicKey { reason };
        Ok(match split_components::<2>(public_key, profile.bit_size, &err) {
            Ok([e, n]) => {
                n.bits() == profile.bit_size && n.is_odd() && e >= BigUint::from(3u8) && e.is_odd()
            }
            Err(_) => false,
        })
    }

    pub fn supported_curves(&self) -> BTreeMap<String, CurveInfo> {
        self.snapshot()
            .iter()
            .map(|(name, profile)| (name.clone(), Self::info(profile)))
            .collect()
    }

    pub fn curve_info(&self, curve_name: &str) -> Option<CurveInfo> {
        self.snapshot().get(curve_name).map(|p| Self::info(p))
    }

    fn info(profile: &KeyProfile) -> CurveInfo {
        CurveInfo {
            bit_size: profile.bit_size,
            description: profile.description.clone(),
            hash_algorithm: profile.hash.to_string(),
            parameters: profile.parameters.clone(),
        }
    }
}

/// One component of a packed key, `bit_size/4` hex digits wide.
fn fixed_hex(value: &BigUint, bit_size: u64) -> String {
    let width = (bit_size / 4) as usize;
    format!("{:0>width$}", value.to_str_radix(16), width = width)
}

fn public_key_hex(e: &BigUint, n: &BigUint, bit_size: u64) -> String {
    format!("{}{}", fixed_hex(e, bit_size), fixed_hex(n, bit_size))
}

/// Split a fixed-width packed hex key into `N` integer components.
fn split_components<const N: usize>(
    input: &str,
    bit_size: u64,
    err: &impl Fn(String) -> ProviderError,
) -> Result<[BigUint; N], ProviderError> {
    let trimmed = input.trim().to_ascii_lowercase();
    let body = trimmed.strip_prefix("0x").unwrap_or(&trimmed);
    let width = (bit_size / 4) as usize;
    if body.len() != N * width {
        return Err(err(format!(
            "expected {} hex digits ({} components of {})",
            N * width,
            N,
            width
        )));
    }
    let mut out = [(); N].map(|_| BigUint::zero());
    for (i, chunk) in body.as_bytes().chunks(width).enumerate() {
        let chunk = std::str::from_utf8(chunk).expect("chunked at byte boundaries of ascii input");
        out[i] =
            BigUint::from_str_radix(chunk, 16).map_err(|_| err("not a hex string".to_owned()))?;
    }
    Ok(out)
}

/// MGF1 mask generation (RFC 8017 B.2.1).
fn mgf1(hash: &HashAlgorithm, seed: &[u8], len: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(len + hash.digest_len());
    let mut counter: u32 = 0;
    while out.len() < len {
        let mut input = seed.to_vec();
        input.extend_from_slice(&counter.to_be_bytes());
        out.extend_from_slice(&hash.digest(&input));
        counter += 1;
    }
    out.truncate(len);
    out
}

/// EMSA-PSS-ENCODE with salt length = digest length.
fn pss_encode(hash: &HashAlgorithm, m_hash: &[u8], em_bits: u64, salt: &[u8]) -> Vec<u8> {
    let em_len = ((em_bits + 7) / 8) as usize;
    let h_len = hash.digest_len();

    // M' = eight zero bytes ‖ mHash ‖ salt
    let mut m_prime = vec![0u8; 8];
    m_prime.extend_from_slice(m_hash);
    m_prime.extend_from_slice(salt);
    let h = hash.digest(&m_prime);

    let ps_len = em_len - salt.len() - h_len - 2;
    let mut db = vec![0u8; ps_len];
    db.push(0x01);
    db.extend_from_slice(salt);

    let mask = mgf1(hash, &h, em_len - h_len - 1);
    for (byte, m) in db.iter_mut().zip(mask.iter()) {
        *byte ^= m;
    }
    let excess = (8 * em_len) as u64 - em_bits;
    db[0] &= 0xffu8 >> excess;

    let mut em = db;
    em.extend_from_slice(&h);
    em.push(0xbc);
    em
}

/// EMSA-PSS-VERIFY with salt length = digest length.
fn pss_verify(hash: &HashAlgorithm, m_hash: &[u8], em: &[u8], em_bits: u64) -> bool {
    let em_len = ((em_bits + 7) / 8) as usize;
    let h_len = hash.digest_len();
    let s_len = h_len;
    if em.len() != em_len || em_len < h_len + s_len + 2 {
        return false;
    }
    if em[em_len - 1] != 0xbc {
        return false;
    }
    let (masked_db, rest) = em.split_at(em_len - h_len - 1);
    let h = &rest[..h_len];
    let excess = (8 * em_len) as u64 - em_bits;
    if masked_db[0] & !(0xffu8 >> excess) != 0 {
        return false;
    }

    let mask = mgf1(hash, h, masked_db.len());
    let mut db: Vec<u8> = masked_db.iter().zip(mask.iter()).map(|(a, b)| a ^ b).collect();
    db[0] &= 0xffu8 >> excess;

    let ps_len = em_len - h_len - s_len - 2;
    if db[..ps_len].iter().any(|&b| b != 0) || db[ps_len] != 0x01 {
        return false;
    }
    let salt = &db[ps_len + 1..];

    let mut m_prime = vec![0u8; 8];
    m_prime.extend_from_slice(m_hash);
    m_prime.extend_from_slice(salt);
    hash.digest(&m_prime).as_slice() == h
}
