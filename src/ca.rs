//! Root CA bootstrapping: a fresh key pair and the self-signed trust anchor
//! built from it.

use tracing::{debug, instrument};

use crate::cert::IssuedCertificate;
use crate::cert::extensions::{
    AuthorityKeyIdentifier, BasicConstraints, KeyUsage, SubjectAltName, SubjectKeyIdentifier,
};
use crate::cert::params::{ExtensionParam, SubjectInfo, Validity, validate_hostnames};
use crate::config::IssuancePolicy;
use crate::error::Result;
use crate::issuer::CertificateAuthority;
use crate::key::KeyPair;
use crate::tbs_certificate::{TbsCertificate, random_serial_number};

/// Modulus size used for root CA keys when the operator does not choose one.
pub const DEFAULT_ROOT_CA_MODULUS_BITS: usize = 4096;

/// Validity of a root CA certificate when the operator does not choose one.
pub const DEFAULT_ROOT_CA_VALIDITY_DAYS: i64 = 3650;

/// Creates self-signed root CA certificates.
#[derive(Debug, Clone, Default)]
pub struct RootCaBootstrapper {
    policy: IssuancePolicy,
}

/// Generates a key pair and a self-signed root CA certificate under the
/// default policy.
pub fn bootstrap_root_ca(
    subject: &SubjectInfo,
    modulus_bits: usize,
    validity_days: i64,
) -> Result<(KeyPair, IssuedCertificate)> {
    RootCaBootstrapper::default().bootstrap(subject, modulus_bits, validity_days)
}

impl RootCaBootstrapper {
    pub fn new(policy: IssuancePolicy) -> Self {
        Self { policy }
    }

    /// Generates a key pair of `modulus_bits` and issues a self-signed CA
    /// certificate for it.
    #[instrument(
        name = "bootstrap_root_ca",
        skip_all,
        fields(subject.common_name = %subject.common_name, modulus_bits = modulus_bits, validity_days = validity_days),
    )]
    pub fn bootstrap(
        &self,
        subject: &SubjectInfo,
        modulus_bits: usize,
        validity_days: i64,
    ) -> Result<(KeyPair, IssuedCertificate)> {
        // Check the cheap inputs before spending time on key generation
        self.policy.check_ca_validity(validity_days)?;
        validate_hostnames(&subject.dns_names)?;

        let key = KeyPair::generate_with_policy(modulus_bits, &self.policy)?;
        let certificate = self.self_sign(&key, subject, validity_days)?;
        Ok((key, certificate))
    }

    /// Like [`RootCaBootstrapper::bootstrap`], returning the result ready to
    /// issue with.
    pub fn bootstrap_authority(
        &self,
        subject: &SubjectInfo,
        modulus_bits: usize,
        validity_days: i64,
    ) -> Result<CertificateAuthority> {
        let (key, certificate) = self.bootstrap(subject, modulus_bits, validity_days)?;
        CertificateAuthority::new(certificate, key)
    }

    /// Issues a self-signed CA certificate for an existing key.
    ///
    /// The certificate carries critical basic constraints (`cA = TRUE`,
    /// no path length limit), critical key usage for signing certificates
    /// and CRLs, and subject and authority key identifiers, both derived
    /// from `key`. A SAN extension is added when `subject` lists DNS names.
    pub fn self_sign(
        &self,
        key: &KeyPair,
        subject: &SubjectInfo,
        validity_days: i64,
    ) -> Result<IssuedCertificate> {
        self.policy.check_ca_validity(validity_days)?;
        validate_hostnames(&subject.dns_names)?;

        let name = subject.distinguished_name().as_x509_name()?;
        let key_identifier = key.key_identifier()?;

        let mut extensions = vec![
            ExtensionParam::from_extension(
                &BasicConstraints {
                    is_ca: true,
                    max_path_length: None,
                },
                true,
            )?,
            ExtensionParam::from_extension(&KeyUsage::root_ca(), true)?,
            ExtensionParam::from_extension(&SubjectKeyIdentifier(key_identifier.clone()), false)?,
            ExtensionParam::from_extension(
                &AuthorityKeyIdentifier { key_identifier },
                false,
            )?,
        ];
        if !subject.dns_names.is_empty() {
            let san = SubjectAltName {
                names: subject.dns_names.clone(),
            };
            extensions.push(ExtensionParam::from_extension(&san, false)?);
        }

        let tbs = TbsCertificate {
            serial_number: random_serial_number(),
            issuer: name.clone(),
            validity: Validity::for_days(validity_days)?,
            subject: name,
            subject_public_key: key.spki()?,
            extensions,
        };
        let certificate = tbs.sign(key)?;

        debug!(
            certificate.subject = %certificate.subject_name(),
            certificate.serial = %certificate.serial_hex(),
            certificate.not_after = %certificate.not_after(),
            "created self-signed root CA certificate"
        );
        Ok(certificate)
    }
}

#[cfg(test)]
mod tests {
    use time::Duration;
    use x509_cert::ext::pkix::KeyUsages;

    use super::*;
    use crate::error::PkiError;
    use crate::key::tests::shared_key;

    #[test]
    fn root_certificate_is_self_consistent() {
        let key = shared_key(0);
        let subject = SubjectInfo::default_root_ca();
        let root = RootCaBootstrapper::default()
            .self_sign(key, &subject, DEFAULT_ROOT_CA_VALIDITY_DAYS)
            .unwrap();

        assert!(root.is_self_issued());
        assert_eq!(root.subject(), subject.distinguished_name());
        assert!(key.matches(&root.public_key().unwrap()));
        root.verify_signature(key.public_key()).unwrap();
        assert_eq!(
            root.validity().duration(),
            Duration::days(DEFAULT_ROOT_CA_VALIDITY_DAYS)
        );
    }

    #[test]
    fn root_certificate_carries_ca_extensions() {
        let key = shared_key(0);
        let root = RootCaBootstrapper::default()
            .self_sign(key, &SubjectInfo::default_root_ca(), 365)
            .unwrap();

        let (bc, critical) = root.find_extension::<BasicConstraints>().unwrap().unwrap();
        assert!(critical);
        assert_eq!(
            bc,
            BasicConstraints {
                is_ca: true,
                max_path_length: None
            }
        );

        let (usage, critical) = root.find_extension::<KeyUsage>().unwrap().unwrap();
        assert!(critical);
        assert!(usage.contains(KeyUsages::KeyCertSign));
        assert!(usage.contains(KeyUsages::CRLSign));
        assert!(!usage.contains(KeyUsages::KeyAgreement));

        let ski = root.subject_key_identifier().unwrap().unwrap();
        assert_eq!(ski, key.key_identifier().unwrap());
        assert_eq!(root.authority_key_identifier().unwrap(), Some(ski));
        assert!(root.dns_names().unwrap().is_empty());

        let (_, critical) = root
            .find_extension::<SubjectKeyIdentifier>()
            .unwrap()
            .unwrap();
        assert!(!critical);
    }

    #[test]
    fn subject_dns_names_become_a_san() {
        let mut subject = SubjectInfo::default_root_ca();
        subject.dns_names = vec!["ca.example.com".to_string()];
        let root = RootCaBootstrapper::default()
            .self_sign(shared_key(0), &subject, 365)
            .unwrap();
        assert_eq!(root.dns_names().unwrap(), subject.dns_names);
    }

    #[test]
    fn policy_limits_are_checked_before_key_generation() {
        let subject = SubjectInfo::default_root_ca();
        for days in [0, 7301] {
            assert!(matches!(
                bootstrap_root_ca(&subject, 2048, days),
                Err(PkiError::InvalidParameter(_))
            ));
        }
        assert!(matches!(
            bootstrap_root_ca(&subject, 1024, 365),
            Err(PkiError::InvalidParameter(_))
        ));
    }
}
