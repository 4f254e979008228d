//! Issuance policy: the configurable limits applied by key generation,
//! root CA bootstrap and leaf issuance.

use std::path::Path;

use bon::Builder;
use serde::Deserialize;

use crate::error::{PkiError, Result};

/// RSA modulus sizes accepted by default.
pub const DEFAULT_MODULUS_BITS: [usize; 3] = [2048, 3072, 4096];

/// Default upper bound for leaf certificate lifetimes, in days.
pub const DEFAULT_MAX_LEAF_VALIDITY_DAYS: u32 = 825;

/// Default upper bound for root CA lifetimes, in days.
pub const DEFAULT_MAX_CA_VALIDITY_DAYS: u32 = 7300;

/// Limits enforced by every issuing operation.
///
/// A policy can be assembled with the builder, loaded from JSON, or taken
/// as-is via [`Default`]:
///
/// ```
/// use certissue::config::IssuancePolicy;
///
/// let policy = IssuancePolicy::builder()
///     .allowed_modulus_bits(vec![3072, 4096])
///     .max_leaf_validity_days(397)
///     .build();
/// assert!(policy.check_modulus_bits(2048).is_err());
/// ```
#[derive(Clone, Debug, Builder, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct IssuancePolicy {
    #[builder(default = DEFAULT_MODULUS_BITS.to_vec())]
    pub allowed_modulus_bits: Vec<usize>,
    #[builder(default = DEFAULT_MAX_LEAF_VALIDITY_DAYS)]
    pub max_leaf_validity_days: u32,
    #[builder(default = DEFAULT_MAX_CA_VALIDITY_DAYS)]
    pub max_ca_validity_days: u32,
    /// Refuse to sign with a CA certificate whose validity window does not
    /// include the current time.
    #[builder(default = true)]
    pub require_unexpired_ca: bool,
    /// Refuse to sign with a certificate that lacks `cA = TRUE`.
    #[builder(default = true)]
    pub require_ca_basic_constraints: bool,
}

impl Default for IssuancePolicy {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl IssuancePolicy {
    /// Parses a policy from a JSON document. Missing fields take their
    /// default values.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| PkiError::InvalidParameter(format!("invalid issuance policy: {e}")))
    }

    /// Reads and parses a JSON policy file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            PkiError::InvalidParameter(format!(
                "failed to read issuance policy {}: {e}",
                path.display()
            ))
        })?;
        Self::from_json(&json)
    }

    pub fn check_modulus_bits(&self, bits: usize) -> Result<()> {
        if self.allowed_modulus_bits.contains(&bits) {
            Ok(())
        } else {
            Err(PkiError::InvalidParameter(format!(
                "unsupported RSA modulus size {bits}, expected one of {:?}",
                self.allowed_modulus_bits
            )))
        }
    }

    pub fn check_leaf_validity(&self, days: i64) -> Result<()> {
        check_validity(days, self.max_leaf_validity_days, "certificate")
    }

    pub fn check_ca_validity(&self, days: i64) -> Result<()> {
        check_validity(days, self.max_ca_validity_days, "CA certificate")
    }
}

fn check_validity(days: i64, max: u32, what: &str) -> Result<()> {
    if days <= 0 {
        return Err(PkiError::InvalidParameter(format!(
            "{what} validity must be a positive number of days, got {days}"
        )));
    }
    if days > i64::from(max) {
        return Err(PkiError::InvalidParameter(format!(
            "{what} validity of {days} days exceeds the maximum of {max} days"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let policy = IssuancePolicy::default();
        assert_eq!(policy.allowed_modulus_bits, vec![2048, 3072, 4096]);
        assert!(policy.require_unexpired_ca);
        assert!(policy.require_ca_basic_constraints);
        assert!(policy.check_modulus_bits(2048).is_ok());
        assert!(policy.check_modulus_bits(1024).is_err());
    }

    #[test]
    fn validity_bounds() {
        let policy = IssuancePolicy::default();
        assert!(policy.check_leaf_validity(365).is_ok());
        assert!(policy.check_leaf_validity(825).is_ok());
        assert!(matches!(
            policy.check_leaf_validity(0),
            Err(PkiError::InvalidParameter(_))
        ));
        assert!(policy.check_leaf_validity(-5).is_err());
        assert!(policy.check_leaf_validity(826).is_err());
        assert!(policy.check_ca_validity(3650).is_ok());
        assert!(policy.check_ca_validity(7301).is_err());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let policy = IssuancePolicy::from_json(r#"{ "max_leaf_validity_days": 90 }"#).unwrap();
        assert_eq!(policy.max_leaf_validity_days, 90);
        assert_eq!(policy.max_ca_validity_days, DEFAULT_MAX_CA_VALIDITY_DAYS);
        assert_eq!(policy.allowed_modulus_bits, DEFAULT_MODULUS_BITS.to_vec());
    }

    #[test]
    fn unknown_json_field_is_rejected() {
        let err = IssuancePolicy::from_json(r#"{ "max_days": 90 }"#).unwrap_err();
        assert!(matches!(err, PkiError::InvalidParameter(_)));
    }
}
