use der::asn1::{Any, BitString, GeneralizedTime, UtcTime};
use der::{Encode, Tag};
use time::OffsetDateTime;
use x509_cert::Version;
use x509_cert::certificate::{CertificateInner, TbsCertificateInner};
use x509_cert::name::Name;
use x509_cert::serial_number::SerialNumber;
use x509_cert::spki::{AlgorithmIdentifierOwned, SubjectPublicKeyInfoOwned};
use x509_cert::time::Time;

use crate::cert::IssuedCertificate;
use crate::cert::params::{ExtensionParam, Validity};
use crate::error::{PkiError, Result};
use crate::key::KeyPair;

/// Length of generated serial numbers in octets.
const SERIAL_NUMBER_LEN: usize = 16;

/// First year that RFC 5280 requires to be encoded as GeneralizedTime.
const GENERALIZED_TIME_FROM_YEAR: i32 = 2050;

/// Represents the "To Be Signed" (TBS) portion of an X.509 certificate.
///
/// # Fields
/// * `serial_number` - Big-endian serial number, positive.
/// * `issuer` - The distinguished name of the certificate issuer.
/// * `validity` - The certificate's validity period.
/// * `subject` - The distinguished name of the certificate subject.
/// * `subject_public_key` - The public key of the certificate subject.
/// * `extensions` - Additional X.509 extensions for the certificate.
pub struct TbsCertificate {
    pub serial_number: Vec<u8>,
    pub issuer: Name,
    pub validity: Validity,
    pub subject: Name,
    pub subject_public_key: SubjectPublicKeyInfoOwned,
    pub extensions: Vec<ExtensionParam>,
}

/// The `sha256WithRSAEncryption` algorithm identifier, with the NULL
/// parameters RFC 4055 requires.
pub fn sha256_with_rsa() -> Result<AlgorithmIdentifierOwned> {
    Ok(AlgorithmIdentifierOwned {
        oid: const_oid::db::rfc5912::SHA_256_WITH_RSA_ENCRYPTION,
        parameters: Some(Any::new(Tag::Null, Vec::<u8>::new())?),
    })
}

/// Draws a positive serial number from the OS random source.
///
/// The top bit of the first octet is cleared so the INTEGER stays positive
/// and the next bit is set so the encoding is always the full length.
pub fn random_serial_number() -> Vec<u8> {
    let mut serial: [u8; SERIAL_NUMBER_LEN] = rand::random();
    serial[0] = (serial[0] & 0x7f) | 0x40;
    serial.to_vec()
}

fn to_x509_time(at: OffsetDateTime) -> Result<Time> {
    let system_time: std::time::SystemTime = at.into();
    if at.year() < GENERALIZED_TIME_FROM_YEAR {
        Ok(Time::UtcTime(UtcTime::from_system_time(system_time)?))
    } else {
        Ok(Time::GeneralTime(GeneralizedTime::from_system_time(
            system_time,
        )?))
    }
}

pub(crate) fn from_x509_time(time: &Time) -> OffsetDateTime {
    OffsetDateTime::from(time.to_system_time())
}

impl TbsCertificate {
    /// Converts the `TbsCertificate` into a `TbsCertificateInner` for DER encoding.
    pub fn to_tbs_certificate_inner(&self) -> Result<TbsCertificateInner> {
        let extensions = self
            .extensions
            .iter()
            .map(ExtensionParam::to_x509_extension)
            .collect::<Result<Vec<_>>>()?;

        let validity = x509_cert::time::Validity {
            not_before: to_x509_time(self.validity.not_before)?,
            not_after: to_x509_time(self.validity.not_after)?,
        };

        let serial_number = SerialNumber::new(self.serial_number.as_slice())?;

        Ok(TbsCertificateInner {
            version: Version::V3,
            serial_number,
            signature: sha256_with_rsa()?,
            issuer: self.issuer.clone(),
            validity,
            subject: self.subject.clone(),
            subject_public_key_info: self.subject_public_key.clone(),
            issuer_unique_id: None,
            subject_unique_id: None,
            extensions: (!extensions.is_empty()).then_some(extensions),
        })
    }

    /// DER-encodes the TBS portion, signs it with `signing_key` and
    /// assembles the certificate.
    pub fn sign(&self, signing_key: &KeyPair) -> Result<IssuedCertificate> {
        if self.validity.not_after <= self.validity.not_before {
            return Err(PkiError::InvalidParameter(
                "not-after must be later than not-before".to_string(),
            ));
        }

        let tbs_certificate = self.to_tbs_certificate_inner()?;
        let signature = signing_key.sign_data(&tbs_certificate.to_der()?)?;

        let inner = CertificateInner {
            tbs_certificate,
            signature_algorithm: sha256_with_rsa()?,
            signature: BitString::from_bytes(&signature)?,
        };

        Ok(IssuedCertificate { inner })
    }
}
