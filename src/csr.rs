//! PKCS#10 certificate signing requests: building and self-signing a
//! request from a private key and subject, and parsing and verifying
//! requests received from elsewhere.

use const_oid::AssociatedOid;
use der::asn1::{Any, BitString, SetOfVec};
use der::{Decode, Encode};
use rsa::RsaPublicKey;
use tracing::{debug, instrument, warn};
use x509_cert::attr::Attribute;
use x509_cert::name::Name;
use x509_cert::request::{CertReq, CertReqInfo, ExtensionReq, Version};
use x509_cert::spki::SubjectPublicKeyInfoOwned;

use crate::cert::extensions::{SubjectAltName, ToAndFromX509Extension};
use crate::cert::params::{DistinguishedName, ExtensionParam, SubjectInfo, validate_hostnames};
use crate::error::{PkiError, Result};
use crate::key::{KeyPair, public_key_from_spki, verify_signature_for_algorithm};
use crate::pem_utils::{CSR_LABEL, LEGACY_CSR_LABEL, der_to_pem, pem_to_der};
use crate::tbs_certificate::sha256_with_rsa;

/// A parsed or freshly built certificate signing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateSigningRequest {
    pub inner: CertReq,
}

/// Builds self-signed certificate signing requests.
pub struct CsrBuilder;

impl CsrBuilder {
    /// Parses `private_key_pem` and builds a request for `subject`, signed
    /// with that key.
    pub fn build(private_key_pem: &str, subject: &SubjectInfo) -> Result<CertificateSigningRequest> {
        let key = KeyPair::from_private_key_pem(private_key_pem)?;
        Self::build_with_key(&key, subject)
    }

    /// Builds a request for `subject` embedding the public half of `key`
    /// and signed with its private half using SHA-256.
    ///
    /// Invalid subject attributes or DNS names are reported as
    /// [`PkiError::CsrBuild`].
    #[instrument(
        name = "build_csr",
        skip_all,
        fields(subject.common_name = %subject.common_name, subject.dns_names = ?subject.dns_names),
    )]
    pub fn build_with_key(key: &KeyPair, subject: &SubjectInfo) -> Result<CertificateSigningRequest> {
        let request = Self::assemble(key, subject).map_err(|e| match e {
            PkiError::InvalidParameter(msg)
            | PkiError::Encoding(msg)
            | PkiError::CryptoOperation(msg) => PkiError::CsrBuild(msg),
            other => other,
        });
        if let Err(e) = &request {
            warn!(error = %e, "refusing to build certificate signing request");
        }
        request
    }

    fn assemble(key: &KeyPair, subject: &SubjectInfo) -> Result<CertificateSigningRequest> {
        validate_hostnames(&subject.dns_names)?;
        let subject_name = subject.distinguished_name().as_x509_name()?;

        let mut attributes = Vec::new();
        if !subject.dns_names.is_empty() {
            let san = SubjectAltName {
                names: subject.dns_names.clone(),
            };
            let extensions = ExtensionReq(vec![
                ExtensionParam::from_extension(&san, false)?.to_x509_extension()?,
            ]);
            attributes.push(Attribute {
                oid: ExtensionReq::OID,
                values: SetOfVec::try_from(vec![Any::from_der(&extensions.to_der()?)?])?,
            });
        }

        let info = CertReqInfo {
            version: Version::V1,
            subject: subject_name,
            public_key: key.spki()?,
            attributes: SetOfVec::try_from(attributes)?,
        };

        let signature = key.sign_data(&info.to_der()?)?;
        let request = CertReq {
            info,
            algorithm: sha256_with_rsa()?,
            signature: BitString::from_bytes(&signature)?,
        };

        debug!(
            csr.subject = %request.info.subject,
            csr.public_key.size = key.modulus_bits(),
            "built certificate signing request"
        );
        Ok(CertificateSigningRequest { inner: request })
    }
}

impl CertificateSigningRequest {
    /// Parses a request from PEM text. The signature is not checked here;
    /// see [`CertificateSigningRequest::verify`].
    pub fn from_pem(pem: &str) -> Result<Self> {
        let (label, der) = pem_to_der(pem).map_err(|e| PkiError::CsrParse(e.to_string()))?;
        if label != CSR_LABEL && label != LEGACY_CSR_LABEL {
            return Err(PkiError::CsrParse(format!(
                "expected a certificate request, found PEM label \"{label}\""
            )));
        }
        Self::from_der(&der)
    }

    pub fn from_der(der: &[u8]) -> Result<Self> {
        let inner = CertReq::from_der(der).map_err(|e| PkiError::CsrParse(e.to_string()))?;
        Ok(Self { inner })
    }

    pub fn to_der(&self) -> Result<Vec<u8>> {
        self.inner
            .to_der()
            .map_err(|e| PkiError::Encoding(e.to_string()))
    }

    pub fn to_pem(&self) -> Result<String> {
        Ok(der_to_pem(&self.to_der()?, CSR_LABEL))
    }

    pub fn subject_name(&self) -> &Name {
        &self.inner.info.subject
    }

    pub fn subject(&self) -> DistinguishedName {
        DistinguishedName::from_x509_name(self.subject_name())
    }

    pub fn spki(&self) -> &SubjectPublicKeyInfoOwned {
        &self.inner.info.public_key
    }

    /// The embedded RSA public key.
    pub fn public_key(&self) -> Result<RsaPublicKey> {
        public_key_from_spki(self.spki()).map_err(|e| PkiError::CsrParse(e.to_string()))
    }

    /// DNS names requested through the extension request attribute.
    pub fn dns_names(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for attribute in self.inner.info.attributes.iter() {
            if attribute.oid != ExtensionReq::OID {
                continue;
            }
            for value in attribute.values.iter() {
                let request = ExtensionReq::from_der(&value.to_der()?)
                    .map_err(|e| PkiError::CsrParse(e.to_string()))?;
                let san_oid = <SubjectAltName as ToAndFromX509Extension>::OID;
                for ext in request.0.iter().filter(|ext| ext.extn_id == san_oid) {
                    let san: SubjectAltName = ExtensionParam::from_x509_extension(ext)
                        .to_extension()
                        .map_err(|e| PkiError::CsrParse(e.to_string()))?;
                    names.extend(san.names);
                }
            }
        }
        Ok(names)
    }

    /// Verifies the self-signature against the embedded public key.
    ///
    /// Requests signed with SHA-256, SHA-384 or SHA-512 RSA are accepted.
    pub fn verify(&self) -> Result<()> {
        let public_key = self.public_key()?;
        let signature = self.inner.signature.as_bytes().ok_or_else(|| {
            PkiError::SignatureVerification("signature has unused bits".to_string())
        })?;
        verify_signature_for_algorithm(
            &public_key,
            self.inner.algorithm.oid,
            &self.inner.info.to_der()?,
            signature,
        )
    }
}
