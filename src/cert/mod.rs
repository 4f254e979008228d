pub mod extensions;
pub mod params;

use der::{Decode, Encode};
use extensions::{
    AuthorityKeyIdentifier, BasicConstraints, KeyUsage, SubjectAltName, SubjectKeyIdentifier,
    ToAndFromX509Extension,
};
use params::{DistinguishedName, ExtensionParam, Validity};
use rsa::RsaPublicKey;
use sha2::{Digest, Sha256};
use time::OffsetDateTime;
use x509_cert::certificate::CertificateInner;
use x509_cert::name::Name;

use crate::error::{PkiError, Result};
use crate::key::{public_key_from_spki, verify_signature_for_algorithm};
use crate::pem_utils::{CERTIFICATE_LABEL, der_to_pem, pem_to_der};
use crate::tbs_certificate::from_x509_time;

/// Represents a signed X.509 certificate, leaf or root.
///
/// Values are immutable once built; the accessors decode what callers
/// typically need to display or check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedCertificate {
    /// The inner representation of the certificate.
    pub inner: CertificateInner,
}

/// Decodes a `CERTIFICATE` PEM block, describing what went wrong on failure.
pub(crate) fn decode_certificate_pem(pem: &str) -> std::result::Result<CertificateInner, String> {
    let (label, der) = pem_to_der(pem).map_err(|e| e.to_string())?;
    if label != CERTIFICATE_LABEL {
        return Err(format!(
            "expected a certificate, found PEM label \"{label}\""
        ));
    }
    CertificateInner::from_der(&der).map_err(|e| e.to_string())
}

impl IssuedCertificate {
    /// Parses a certificate from PEM text.
    pub fn from_pem(pem: &str) -> Result<Self> {
        let inner = decode_certificate_pem(pem)
            .map_err(|e| PkiError::InvalidParameter(format!("malformed certificate: {e}")))?;
        Ok(Self { inner })
    }

    /// Encodes the certificate into DER format.
    pub fn to_der(&self) -> Result<Vec<u8>> {
        self.inner
            .to_der()
            .map_err(|e| PkiError::Encoding(e.to_string()))
    }

    /// Encodes the certificate into PEM format.
    pub fn to_pem(&self) -> Result<String> {
        Ok(der_to_pem(&self.to_der()?, CERTIFICATE_LABEL))
    }

    pub fn subject_name(&self) -> &Name {
        &self.inner.tbs_certificate.subject
    }

    pub fn issuer_name(&self) -> &Name {
        &self.inner.tbs_certificate.issuer
    }

    pub fn subject(&self) -> DistinguishedName {
        DistinguishedName::from_x509_name(self.subject_name())
    }

    pub fn issuer(&self) -> DistinguishedName {
        DistinguishedName::from_x509_name(self.issuer_name())
    }

    /// Serial number as lowercase hex.
    pub fn serial_hex(&self) -> String {
        hex::encode(self.inner.tbs_certificate.serial_number.as_bytes())
    }

    pub fn validity(&self) -> Validity {
        let validity = &self.inner.tbs_certificate.validity;
        Validity {
            not_before: from_x509_time(&validity.not_before),
            not_after: from_x509_time(&validity.not_after),
        }
    }

    pub fn not_before(&self) -> OffsetDateTime {
        self.validity().not_before
    }

    pub fn not_after(&self) -> OffsetDateTime {
        self.validity().not_after
    }

    /// The subject's RSA public key.
    pub fn public_key(&self) -> Result<RsaPublicKey> {
        public_key_from_spki(&self.inner.tbs_certificate.subject_public_key_info)
    }

    pub fn extensions(&self) -> Vec<ExtensionParam> {
        self.inner
            .tbs_certificate
            .extensions
            .iter()
            .flatten()
            .map(ExtensionParam::from_x509_extension)
            .collect()
    }

    /// Finds and decodes extension `E`, returning it with its criticality.
    pub fn find_extension<E: ToAndFromX509Extension>(&self) -> Result<Option<(E, bool)>> {
        match self.extensions().iter().find(|ext| ext.oid == E::OID) {
            Some(ext) => Ok(Some((ext.to_extension::<E>()?, ext.critical))),
            None => Ok(None),
        }
    }

    /// DNS names of the Subject Alternative Name extension, empty if absent.
    pub fn dns_names(&self) -> Result<Vec<String>> {
        Ok(self
            .find_extension::<SubjectAltName>()?
            .map(|(san, _)| san.names)
            .unwrap_or_default())
    }

    pub fn basic_constraints(&self) -> Result<Option<BasicConstraints>> {
        Ok(self
            .find_extension::<BasicConstraints>()?
            .map(|(bc, _)| bc))
    }

    pub fn is_ca(&self) -> Result<bool> {
        Ok(self.basic_constraints()?.is_some_and(|bc| bc.is_ca))
    }

    pub fn key_usage(&self) -> Result<Option<KeyUsage>> {
        Ok(self.find_extension::<KeyUsage>()?.map(|(ku, _)| ku))
    }

    pub fn subject_key_identifier(&self) -> Result<Option<Vec<u8>>> {
        Ok(self
            .find_extension::<SubjectKeyIdentifier>()?
            .map(|(ski, _)| ski.0))
    }

    pub fn authority_key_identifier(&self) -> Result<Option<Vec<u8>>> {
        Ok(self
            .find_extension::<AuthorityKeyIdentifier>()?
            .map(|(aki, _)| aki.key_identifier))
    }

    /// Whether issuer and subject are the same name.
    pub fn is_self_issued(&self) -> bool {
        self.issuer_name() == self.subject_name()
    }

    /// SHA-256 fingerprint of the DER encoding, lowercase hex.
    pub fn fingerprint_sha256(&self) -> Result<String> {
        Ok(hex::encode(Sha256::digest(self.to_der()?)))
    }

    /// Verifies the certificate signature against `issuer_key`.
    pub fn verify_signature(&self, issuer_key: &RsaPublicKey) -> Result<()> {
        let signature = self.inner.signature.as_bytes().ok_or_else(|| {
            PkiError::SignatureVerification("signature has unused bits".to_string())
        })?;
        verify_signature_for_algorithm(
            issuer_key,
            self.inner.signature_algorithm.oid,
            &self.inner.tbs_certificate.to_der()?,
            signature,
        )
    }
}
