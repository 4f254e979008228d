use std::sync::LazyLock;

use bon::Builder;
use const_oid::ObjectIdentifier;
use der::asn1::{Any, PrintableStringRef, SetOfVec};
use der::{Tag, Tagged};
use regex::Regex;
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use x509_cert::attr::{AttributeTypeAndValue, AttributeValue};
use x509_cert::name::{Name, RdnSequence, RelativeDistinguishedName};

use super::extensions::ToAndFromX509Extension;
use crate::error::{PkiError, Result};

const COUNTRY_NAME: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.6");
const STATE_OR_PROVINCE_NAME: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.8");
const LOCALITY_NAME: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.7");
const ORGANIZATION_NAME: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.10");
const ORGANIZATIONAL_UNIT_NAME: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.11");
const COMMON_NAME: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.3");

/// Maximum length of a DNS name in presentation form.
const MAX_HOSTNAME_LEN: usize = 253;

static HOSTNAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(\*\.)?[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)*\.?$",
    )
    .expect("hostname pattern is valid")
});

/// Checks that `name` is a syntactically valid DNS hostname.
///
/// A single leading wildcard label (`*.example.com`) is accepted, and the
/// optional trailing root dot does not count towards the length limit.
pub fn validate_hostname(name: &str) -> Result<()> {
    let unrooted = name.strip_suffix('.').unwrap_or(name);
    if unrooted.len() > MAX_HOSTNAME_LEN || !HOSTNAME.is_match(name) {
        return Err(PkiError::InvalidParameter(format!(
            "\"{name}\" is not a valid DNS hostname"
        )));
    }
    Ok(())
}

pub fn validate_hostnames<S: AsRef<str>>(names: &[S]) -> Result<()> {
    names.iter().try_for_each(|name| validate_hostname(name.as_ref()))
}

/// Identity of a CSR or certificate subject: distinguished-name attributes
/// plus the DNS names to place in the Subject Alternative Name extension.
///
/// # Fields
/// * `country` - The country (C), a two-letter code.
/// * `state` - The state or province (ST).
/// * `locality` - The locality or city (L).
/// * `organization` - The organization (O).
/// * `organizational_unit` - The organizational unit (OU).
/// * `common_name` - The common name (CN).
/// * `dns_names` - DNS names for the SAN extension.
#[derive(Clone, Debug, Default, Builder, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct SubjectInfo {
    #[builder(into)]
    pub country: Option<String>,
    #[builder(into)]
    pub state: Option<String>,
    #[builder(into)]
    pub locality: Option<String>,
    #[builder(into)]
    pub organization: Option<String>,
    #[builder(into)]
    pub organizational_unit: Option<String>,
    #[builder(into)]
    pub common_name: String,
    #[builder(default)]
    pub dns_names: Vec<String>,
}

impl SubjectInfo {
    /// The subject used for a root CA when the operator supplies none.
    pub fn default_root_ca() -> Self {
        SubjectInfo::builder()
            .country("US")
            .state("California")
            .locality("San Francisco")
            .organization("Test Root CA")
            .organizational_unit("IT Department")
            .common_name("Test Root CA")
            .build()
    }

    pub fn distinguished_name(&self) -> DistinguishedName {
        DistinguishedName {
            common_name: self.common_name.clone(),
            country: self.country.clone(),
            state: self.state.clone(),
            locality: self.locality.clone(),
            organization: self.organization.clone(),
            organization_unit: self.organizational_unit.clone(),
        }
    }
}

/// Distinguished name of a certificate subject or issuer.
///
/// Attributes are encoded as one RDN each, in the order C, ST, L, O, OU,
/// CN. An attribute set to `None` is left out; `Some("")` is encoded as an
/// empty string.
#[derive(Clone, Debug, Builder, Default, PartialEq, Eq, Serialize)]
pub struct DistinguishedName {
    #[builder(into)]
    pub common_name: String,
    #[builder(into)]
    pub country: Option<String>,
    #[builder(into)]
    pub state: Option<String>,
    #[builder(into)]
    pub locality: Option<String>,
    #[builder(into)]
    pub organization: Option<String>,
    #[builder(into)]
    pub organization_unit: Option<String>,
}

impl DistinguishedName {
    /// Converts the distinguished name to an X.509 name.
    ///
    /// The country is encoded as a PrintableString and must be a two-letter
    /// code when non-empty; every other attribute is a UTF8String.
    pub fn as_x509_name(&self) -> Result<Name> {
        let attributes = [
            (COUNTRY_NAME, self.country.as_deref()),
            (STATE_OR_PROVINCE_NAME, self.state.as_deref()),
            (LOCALITY_NAME, self.locality.as_deref()),
            (ORGANIZATION_NAME, self.organization.as_deref()),
            (ORGANIZATIONAL_UNIT_NAME, self.organization_unit.as_deref()),
            (COMMON_NAME, Some(self.common_name.as_str())),
        ];

        let rdns = attributes
            .into_iter()
            .filter_map(|(oid, value)| value.map(|value| (oid, value)))
            .map(|(oid, value)| -> Result<RelativeDistinguishedName> {
                let value = if oid == COUNTRY_NAME {
                    country_value(value)?
                } else {
                    Any::new(Tag::Utf8String, value.as_bytes())?
                };
                let atv = AttributeTypeAndValue { oid, value };
                Ok(RelativeDistinguishedName(SetOfVec::try_from(vec![atv])?))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(RdnSequence(rdns))
    }

    /// Reads the six supported attributes back from an X.509 name. Other
    /// attributes are ignored; values that are not strings are skipped.
    pub fn from_x509_name(x509dn: &Name) -> Self {
        let mut dn = DistinguishedName::default();

        for rdn in x509dn.0.iter() {
            for attr in rdn.0.iter() {
                let Some(value) = attribute_string(&attr.value) else {
                    continue;
                };
                match attr.oid {
                    COMMON_NAME => dn.common_name = value,
                    COUNTRY_NAME => dn.country = Some(value),
                    STATE_OR_PROVINCE_NAME => dn.state = Some(value),
                    LOCALITY_NAME => dn.locality = Some(value),
                    ORGANIZATION_NAME => dn.organization = Some(value),
                    ORGANIZATIONAL_UNIT_NAME => dn.organization_unit = Some(value),
                    _ => {}
                }
            }
        }

        dn
    }
}

fn country_value(value: &str) -> Result<AttributeValue> {
    if !value.is_empty() && (value.len() != 2 || !value.chars().all(|c| c.is_ascii_alphabetic()))
    {
        return Err(PkiError::InvalidParameter(format!(
            "country \"{value}\" must be a two-letter code"
        )));
    }
    let printable = PrintableStringRef::new(value)?;
    Ok(Any::new(Tag::PrintableString, printable.as_str().as_bytes())?)
}

fn attribute_string(value: &AttributeValue) -> Option<String> {
    match value.tag() {
        Tag::Utf8String | Tag::PrintableString | Tag::Ia5String | Tag::TeletexString => {
            String::from_utf8(value.value().to_vec()).ok()
        }
        _ => None,
    }
}

/// Certificate validity period.
///
/// Both bounds carry whole seconds only, since that is all X.509 time
/// encodings can represent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Validity {
    pub not_before: OffsetDateTime,
    pub not_after: OffsetDateTime,
}

impl Validity {
    /// Creates a validity period starting now for the given number of days.
    pub fn for_days(days: i64) -> Result<Self> {
        let now = OffsetDateTime::now_utc();
        let not_before = OffsetDateTime::from_unix_timestamp(now.unix_timestamp())
            .map_err(|e| PkiError::InvalidParameter(e.to_string()))?;
        let out_of_range = || PkiError::InvalidParameter(format!("{days} days is out of range"));
        let seconds = days.checked_mul(86_400).ok_or_else(out_of_range)?;
        let not_after = not_before
            .checked_add(Duration::seconds(seconds))
            .ok_or_else(out_of_range)?;
        Ok(Self {
            not_before,
            not_after,
        })
    }

    /// Whether `at` lies within the period, bounds included.
    pub fn contains(&self, at: OffsetDateTime) -> bool {
        self.not_before <= at && at <= self.not_after
    }

    pub fn duration(&self) -> Duration {
        self.not_after - self.not_before
    }
}

/// Represents an X.509 extension.
///
/// # Fields
/// * `oid` - The object identifier of the extension.
/// * `critical` - Indicates if the extension is critical.
/// * `value` - The DER-encoded value of the extension.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtensionParam {
    pub oid: ObjectIdentifier,
    pub critical: bool,
    /// DER-encoded extension value
    pub value: Vec<u8>,
}

impl ExtensionParam {
    /// Creates an `ExtensionParam` from a specific extension.
    pub fn from_extension<E: ToAndFromX509Extension>(extension: &E, critical: bool) -> Result<Self> {
        Ok(Self {
            oid: E::OID,
            critical,
            value: extension.to_x509_extension_value()?,
        })
    }

    /// Decodes an `ExtensionParam` into a specific extension.
    pub fn to_extension<E: ToAndFromX509Extension>(&self) -> Result<E> {
        E::from_x509_extension_value(&self.value)
    }

    pub fn from_x509_extension(ext: &x509_cert::ext::Extension) -> Self {
        Self {
            oid: ext.extn_id,
            critical: ext.critical,
            value: ext.extn_value.as_bytes().to_vec(),
        }
    }

    pub fn to_x509_extension(&self) -> Result<x509_cert::ext::Extension> {
        Ok(x509_cert::ext::Extension {
            extn_id: self.oid,
            critical: self.critical,
            extn_value: der::asn1::OctetString::new(self.value.clone())?,
        })
    }
}
