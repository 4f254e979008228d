use time::OffsetDateTime;
use tracing::{debug, instrument, warn};
use x509_cert::name::Name;

use crate::cert::IssuedCertificate;
use crate::cert::decode_certificate_pem;
use crate::cert::extensions::SubjectAltName;
use crate::cert::params::{ExtensionParam, Validity, validate_hostnames};
use crate::config::IssuancePolicy;
use crate::csr::CertificateSigningRequest;
use crate::error::{PkiError, Result};
use crate::key::KeyPair;
use crate::tbs_certificate::{TbsCertificate, random_serial_number};

/// Represents an entity capable of issuing certificates.
pub trait Issuer {
    /// Returns the distinguished name of the issuer.
    fn issuer_name(&self) -> &Name;

    /// Returns the signing key of the issuer.
    fn signing_key(&self) -> &KeyPair;

    /// Binds `tbs` to this issuer and signs it.
    ///
    /// Whatever issuer name `tbs` carried is replaced, so the issuer of the
    /// result is always this issuer's name.
    fn sign_certificate(&self, mut tbs: TbsCertificate) -> Result<IssuedCertificate> {
        tbs.issuer = self.issuer_name().clone();
        tbs.sign(self.signing_key())
    }
}

/// A trust anchor: an issuer-capable certificate together with its private
/// key.
#[derive(Debug, Clone)]
pub struct CertificateAuthority {
    pub certificate: IssuedCertificate,
    pub key: KeyPair,
}

impl CertificateAuthority {
    /// Pairs a certificate with its private key, failing with
    /// [`PkiError::KeyMismatch`] if the key does not belong to the
    /// certificate.
    pub fn new(certificate: IssuedCertificate, key: KeyPair) -> Result<Self> {
        let public = certificate
            .public_key()
            .map_err(|e| PkiError::CaParse(e.to_string()))?;
        if !key.matches(&public) {
            return Err(PkiError::KeyMismatch);
        }
        Ok(Self { certificate, key })
    }

    /// Parses CA material from PEM text.
    ///
    /// Malformed input in either part is a [`PkiError::CaParse`]; a key that
    /// does not belong to the certificate is a [`PkiError::KeyMismatch`].
    pub fn from_pem(certificate_pem: &str, private_key_pem: &str) -> Result<Self> {
        let certificate = decode_certificate_pem(certificate_pem)
            .map(|inner| IssuedCertificate { inner })
            .map_err(|e| PkiError::CaParse(format!("CA certificate: {e}")))?;
        let key = KeyPair::from_private_key_pem(private_key_pem)
            .map_err(|e| PkiError::CaParse(format!("CA private key: {e}")))?;
        Self::new(certificate, key)
    }

    /// Checks that the certificate may act as an issuer at `now` under
    /// `policy`.
    pub fn check_usable(&self, policy: &IssuancePolicy, now: OffsetDateTime) -> Result<()> {
        let is_ca = self
            .certificate
            .is_ca()
            .map_err(|e| PkiError::CaParse(e.to_string()))?;
        if policy.require_ca_basic_constraints && !is_ca {
            return Err(PkiError::CaParse(
                "CA certificate does not carry basic constraints with cA = TRUE".to_string(),
            ));
        }
        if policy.require_unexpired_ca && !self.certificate.validity().contains(now) {
            return Err(PkiError::CaParse(
                "CA certificate is not currently valid".to_string(),
            ));
        }
        Ok(())
    }
}

impl Issuer for CertificateAuthority {
    fn issuer_name(&self) -> &Name {
        // The name of the issuer is the subject of the certificate
        self.certificate.subject_name()
    }

    fn signing_key(&self) -> &KeyPair {
        &self.key
    }
}

/// Signs certificate signing requests with a [`CertificateAuthority`].
#[derive(Debug, Clone, Default)]
pub struct CertificateIssuer {
    policy: IssuancePolicy,
}

impl CertificateIssuer {
    pub fn new(policy: IssuancePolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &IssuancePolicy {
        &self.policy
    }

    /// Parses all inputs from PEM text and issues a certificate.
    ///
    /// Malformed CA material fails with [`PkiError::CaParse`], a malformed
    /// request with [`PkiError::CsrParse`].
    pub fn issue_pem(
        &self,
        ca_certificate_pem: &str,
        ca_private_key_pem: &str,
        csr_pem: &str,
        validity_days: i64,
        dns_names: &[String],
    ) -> Result<IssuedCertificate> {
        let ca = CertificateAuthority::from_pem(ca_certificate_pem, ca_private_key_pem)?;
        let csr = CertificateSigningRequest::from_pem(csr_pem)?;
        self.issue(&ca, &csr, validity_days, dns_names)
    }

    /// Issues a certificate for `csr`, signed by `ca`.
    ///
    /// The subject and public key come from the request, the issuer name
    /// from the CA certificate. The request's self-signature is verified
    /// first. The SAN extension lists `dns_names`; it is omitted when the
    /// list is empty.
    #[instrument(
        name = "issue_certificate",
        skip_all,
        fields(csr.subject = %csr.subject_name(), validity_days = validity_days, dns_names = ?dns_names),
    )]
    pub fn issue(
        &self,
        ca: &CertificateAuthority,
        csr: &CertificateSigningRequest,
        validity_days: i64,
        dns_names: &[String],
    ) -> Result<IssuedCertificate> {
        let result = self.try_issue(ca, csr, validity_days, dns_names);
        if let Err(e) = &result {
            warn!(error = %e, error.kind = %e.kind(), "refusing to issue certificate");
        }
        result
    }

    fn try_issue(
        &self,
        ca: &CertificateAuthority,
        csr: &CertificateSigningRequest,
        validity_days: i64,
        dns_names: &[String],
    ) -> Result<IssuedCertificate> {
        self.policy.check_leaf_validity(validity_days)?;
        validate_hostnames(dns_names)?;

        let validity = Validity::for_days(validity_days)?;
        ca.check_usable(&self.policy, validity.not_before)?;
        csr.verify()?;

        let ca_not_after = ca.certificate.not_after();
        if validity.not_after > ca_not_after {
            warn!(
                %ca_not_after,
                certificate.not_after = %validity.not_after,
                "issued certificate will outlive the CA"
            );
        }

        let mut extensions = Vec::new();
        if !dns_names.is_empty() {
            let san = SubjectAltName {
                names: dns_names.to_vec(),
            };
            extensions.push(ExtensionParam::from_extension(&san, false)?);
        }

        let tbs = TbsCertificate {
            serial_number: random_serial_number(),
            issuer: ca.issuer_name().clone(),
            validity,
            subject: csr.subject_name().clone(),
            subject_public_key: csr.spki().clone(),
            extensions,
        };

        let certificate = ca.sign_certificate(tbs)?;
        debug!(
            certificate.subject = %certificate.subject_name(),
            certificate.issuer = %certificate.issuer_name(),
            certificate.serial = %certificate.serial_hex(),
            certificate.not_before = %certificate.not_before(),
            certificate.not_after = %certificate.not_after(),
            "issued certificate"
        );
        Ok(certificate)
    }
}
