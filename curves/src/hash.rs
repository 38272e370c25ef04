use std::{fmt, str::FromStr};

use derive_more::{Display, Error};
use sha2::{Digest, Sha256, Sha384, Sha512};

/// Hash algorithms a curve record may select.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashAlgorithm {
    Sha256,
    Sha384,
    Sha512,
}

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
#[display(fmt = "unknown hash algorithm '{}'", name)]
pub struct UnknownHashAlgorithm {
    name: String,
}

impl HashAlgorithm {
    pub fn digest(&self, data: &[u8]) -> Vec<u8> {
        match self {
            HashAlgorithm::Sha256 => Sha256::digest(data).to_vec(),
            HashAlgorithm::Sha384 => Sha384::digest(data).to_vec(),
            HashAlgorithm::Sha512 => Sha512::digest(data).to_vec(),
        }
    }

    pub fn digest_len(&self) -> usize {
        match self {
            HashAlgorithm::Sha256 => 32,
            HashAlgorithm::Sha384 => 48,
            HashAlgorithm::Sha512 => 64,
        }
    }

    /// Default selection rule when a record names no hash explicitly:
    /// the smallest member of the SHA-2 family covering the curve size.
    pub fn for_bit_size(bit_size: u64) -> Self {
        if bit_size <= 256 {
            HashAlgorithm::Sha256
        } else if bit_size <= 384 {
            HashAlgorithm::Sha384
        } else {
            HashAlgorithm::Sha512
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            HashAlgorithm::Sha256 => "SHA256",
            HashAlgorithm::Sha384 => "SHA384",
            HashAlgorithm::Sha512 => "SHA512",
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for HashAlgorithm {
    type Err = UnknownHashAlgorithm;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().replace('-', "").as_str() {
            "SHA256" => Ok(HashAlgorithm::Sha256),
            "SHA384" => Ok(HashAlgorithm::Sha384),
            "SHA512" => Ok(HashAlgorithm::Sha512),
            _ => Err(UnknownHashAlgorithm { name: s.to_owned() }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_common_spellings() {
        assert_eq!("SHA256".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Sha256);
        assert_eq!("sha-384".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Sha384);
        assert_eq!(" SHA512 ".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Sha512);
        assert!("MD5".parse::<HashAlgorithm>().is_err());
    }

    #[test]
    fn bit_size_rule_matches_record_defaults() {
        assert_eq!(HashAlgorithm::for_bit_size(256), HashAlgorithm::Sha256);
        assert_eq!(HashAlgorithm::for_bit_size(384), HashAlgorithm::Sha384);
        assert_eq!(HashAlgorithm::for_bit_size(521), HashAlgorithm::Sha512);
    }

    #[test]
    fn digest_lengths() {
        for h in [HashAlgorithm::Sha256, HashAlgorithm::Sha384, HashAlgorithm::Sha512] {
            assert_eq!(h.digest(b"abc").len(), h.digest_len());
        }
    }
}
