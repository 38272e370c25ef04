use derive_more::{Display, Error};

/// Provider-level failures.
///
/// Only inputs that cannot be processed raise these; a well-formed but
/// cryptographically wrong signature is a successful verification with a
/// `false` verdict, never an error.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// The named curve is absent from this provider's map.
    #[display(fmt = "unsupported curve: {}", name)]
    UnsupportedCurve { name: String },
    /// The signature string cannot be decoded into signature components.
    #[display(fmt = "invalid signature format: {}", reason)]
    InvalidSignatureFormat { reason: String },
    /// The public key string decodes to no point on the curve (or to no
    /// valid RSA key).
    #[display(fmt = "invalid public key: {}", reason)]
    InvalidPublicKey { reason: String },
    /// The document string is not valid base64.
    #[display(fmt = "invalid document encoding: {}", reason)]
    InvalidDocument { reason: String },
    /// The private key is malformed or out of range.
    #[display(fmt = "signing failed: {}", reason)]
    SigningFailed { reason: String },
    /// The algorithm cannot mint key pairs (RSA keys are supplied
    /// externally).
    #[display(fmt = "key generation is not supported for {}", algorithm)]
    KeyGenerationUnsupported { algorithm: String },
    /// A stored curve record cannot be parsed or validated.
    #[display(fmt = "invalid record for curve '{}': {}", curve, reason)]
    InvalidCurveRecord { curve: String, reason: String },
}

impl ProviderError {
    pub(crate) fn unsupported_curve(name: &str) -> Self {
        ProviderError::UnsupportedCurve { name: name.to_owned() }
    }

    pub(crate) fn bad_record(curve: &str, reason: impl Into<String>) -> Self {
        ProviderError::InvalidCurveRecord {
            curve: curve.to_owned(),
            reason: reason.into(),
        }
    }
}

/// The registry has no algorithm under the requested name.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
#[display(fmt = "algorithm '{}' is not registered", name)]
pub struct NotFound {
    pub name: String,
}
