//! use certissue::error::PkiError;

use std::fmt;

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, PkiError>;

/// Represents errors that can occur while issuing certificates.
///
/// Every variant carries a short human-readable summary. Messages never
/// contain key material, only what went wrong and where.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PkiError {
    /// Malformed or out-of-range input such as a bad modulus size,
    /// a non-positive validity or an invalid hostname.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Key pair generation failed.
    #[error("Key generation error: {0}")]
    KeyGeneration(String),

    /// A private key could not be decoded.
    #[error("Failed to parse private key: {0}")]
    KeyParse(String),

    /// The CA certificate or CA private key could not be decoded, or the CA
    /// certificate is not usable as an issuer.
    #[error("Failed to parse CA material: {0}")]
    CaParse(String),

    /// A certificate signing request could not be decoded.
    #[error("Failed to parse certificate signing request: {0}")]
    CsrParse(String),

    /// A certificate signing request could not be built.
    #[error("Failed to build certificate signing request: {0}")]
    CsrBuild(String),

    /// The CA private key does not belong to the CA certificate.
    #[error("CA private key does not match the CA certificate public key")]
    KeyMismatch,

    /// A signature did not verify.
    #[error("Signature verification failed: {0}")]
    SignatureVerification(String),

    /// The underlying signing or generation primitive failed.
    #[error("Cryptographic operation failed: {0}")]
    CryptoOperation(String),

    /// Error during data encoding.
    #[error("Failed to encode data: {0}")]
    Encoding(String),
}

/// Stable classification of a [`PkiError`], suitable for mapping to status
/// codes in an outer layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidParameter,
    KeyGeneration,
    KeyParse,
    CaParse,
    CsrParse,
    CsrBuild,
    KeyMismatch,
    SignatureVerification,
    CryptoOperation,
    Encoding,
}

impl ErrorKind {
    /// The stable identifier of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidParameter => "InvalidParameterError",
            ErrorKind::KeyGeneration => "KeyGenerationError",
            ErrorKind::KeyParse => "KeyParseError",
            ErrorKind::CaParse => "CaParseError",
            ErrorKind::CsrParse => "CsrParseError",
            ErrorKind::CsrBuild => "CsrBuildError",
            ErrorKind::KeyMismatch => "KeyMismatchError",
            ErrorKind::SignatureVerification => "SignatureVerificationError",
            ErrorKind::CryptoOperation => "CryptoOperationError",
            ErrorKind::Encoding => "EncodingError",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl serde::Serialize for ErrorKind {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl PkiError {
    /// Returns the stable kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            PkiError::InvalidParameter(_) => ErrorKind::InvalidParameter,
            PkiError::KeyGeneration(_) => ErrorKind::KeyGeneration,
            PkiError::KeyParse(_) => ErrorKind::KeyParse,
            PkiError::CaParse(_) => ErrorKind::CaParse,
            PkiError::CsrParse(_) => ErrorKind::CsrParse,
            PkiError::CsrBuild(_) => ErrorKind::CsrBuild,
            PkiError::KeyMismatch => ErrorKind::KeyMismatch,
            PkiError::SignatureVerification(_) => ErrorKind::SignatureVerification,
            PkiError::CryptoOperation(_) => ErrorKind::CryptoOperation,
            PkiError::Encoding(_) => ErrorKind::Encoding,
        }
    }
}

impl From<der::Error> for PkiError {
    /// DER failures outside a parse context are encoding failures; parsers
    /// map their own errors explicitly.
    fn from(err: der::Error) -> Self {
        PkiError::Encoding(err.to_string())
    }
}

impl From<rsa::signature::Error> for PkiError {
    fn from(err: rsa::signature::Error) -> Self {
        PkiError::CryptoOperation(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_identifiers_are_stable() {
        assert_eq!(PkiError::KeyMismatch.kind().as_str(), "KeyMismatchError");
        assert_eq!(
            PkiError::InvalidParameter("x".into()).kind().to_string(),
            "InvalidParameterError"
        );
        assert_eq!(
            PkiError::SignatureVerification("x".into()).kind(),
            ErrorKind::SignatureVerification
        );
    }
}
