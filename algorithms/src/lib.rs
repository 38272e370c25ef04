//! Signature algorithm providers and their process-wide registry
//!
//! This crate wraps the raw curve engines of the `curves` crate into the
//! service-facing algorithm surface: each provider owns a map from curve
//! name to a configured engine plus hash algorithm, parses the externally
//! stored parameter records into typed form, and exposes a uniform
//! `sign`/`verify` contract over hex- and base64-encoded strings. The
//! [`AlgorithmRegistry`] is the directory through which the surrounding
//! service reaches the providers; it is an explicit object handed around by
//! reference, not a process-global singleton.
//!
//! # Concurrency
//!
//! Curve maps are published as immutable `Arc` snapshots. A reconfiguration
//! builds the complete replacement map first and swaps it in one store, so
//! concurrent sign/verify calls always run against exactly one generation
//! of parameters, never a mix.

mod ecdsa;
mod eddsa;
mod error;
mod provider;
mod registry;
mod rsa;
mod source;

pub use ecdsa::EcdsaProvider;
pub use eddsa::EddsaProvider;
pub use error::{NotFound, ProviderError};
pub use provider::{CurveInfo, GeneratedKeyPair, Provider, SignOutput, Verification};
pub use registry::{AlgorithmRegistry, RegistryRef};
pub use rsa::RsaProvider;
pub use source::{AlgorithmRecord, CurveRecord, CurveStatus, SourceData};
