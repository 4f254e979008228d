//! Structured request and response types for the layer that exposes the
//! issuance pipeline, such as an HTTP handler or the `certissue` binary.
//!
//! Every operation yields either the complete set of PEM artifacts or an
//! error classification with a message, never a partial result. Serialized
//! responses look like:
//!
//! ```json
//! {"success": true, "certificate": "-----BEGIN CERTIFICATE-----\n..."}
//! {"success": false, "error": "Invalid parameter: ...", "kind": "InvalidParameterError"}
//! ```

use serde::{Deserialize, Serialize};

use crate::ca::{DEFAULT_ROOT_CA_MODULUS_BITS, DEFAULT_ROOT_CA_VALIDITY_DAYS, RootCaBootstrapper};
use crate::cert::IssuedCertificate;
use crate::cert::params::SubjectInfo;
use crate::config::IssuancePolicy;
use crate::csr::CsrBuilder;
use crate::error::{ErrorKind, PkiError, Result};
use crate::issuer::CertificateIssuer;
use crate::key::KeyPair;

const DEFAULT_KEY_SIZE: usize = 2048;
const DEFAULT_VALIDITY_DAYS: i64 = 365;
const DEFAULT_COUNTRY: &str = "US";

fn default_key_size() -> usize {
    DEFAULT_KEY_SIZE
}

fn default_validity_days() -> i64 {
    DEFAULT_VALIDITY_DAYS
}

fn default_root_ca_key_size() -> usize {
    DEFAULT_ROOT_CA_MODULUS_BITS
}

fn default_root_ca_validity_days() -> i64 {
    DEFAULT_ROOT_CA_VALIDITY_DAYS
}

fn default_root_ca_subject() -> SubjectInfo {
    SubjectInfo::default_root_ca()
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct KeyGenerationRequest {
    #[serde(default = "default_key_size")]
    pub key_size: usize,
}

impl Default for KeyGenerationRequest {
    fn default() -> Self {
        Self {
            key_size: DEFAULT_KEY_SIZE,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct KeyGenerationResponse {
    pub private_key: String,
    pub public_key: String,
}

/// Request to build a CSR. Subject fields sit next to the key in the JSON
/// object.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct CsrRequest {
    pub private_key: String,
    #[serde(flatten)]
    pub subject: SubjectInfo,
}

impl CsrRequest {
    /// The subject to request, with a missing country read as `US` and the
    /// other missing attributes as empty strings.
    pub fn subject_with_defaults(&self) -> SubjectInfo {
        let or_empty = |value: &Option<String>| Some(value.clone().unwrap_or_default());
        SubjectInfo {
            country: Some(
                self.subject
                    .country
                    .clone()
                    .unwrap_or_else(|| DEFAULT_COUNTRY.to_string()),
            ),
            state: or_empty(&self.subject.state),
            locality: or_empty(&self.subject.locality),
            organization: or_empty(&self.subject.organization),
            organizational_unit: or_empty(&self.subject.organizational_unit),
            ..self.subject.clone()
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct CsrResponse {
    pub csr: String,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct IssuanceRequest {
    pub root_certificate: String,
    pub root_private_key: String,
    pub csr: String,
    #[serde(default = "default_validity_days")]
    pub validity_days: i64,
    #[serde(default)]
    pub dns_names: Vec<String>,
}

/// A certificate together with the details a caller usually displays.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct CertificateResponse {
    pub certificate: String,
    pub serial_number: String,
    pub fingerprint_sha256: String,
    pub not_before: String,
    pub not_after: String,
    pub dns_names: Vec<String>,
}

impl CertificateResponse {
    fn from_certificate(certificate: &IssuedCertificate) -> Result<Self> {
        Ok(Self {
            certificate: certificate.to_pem()?,
            serial_number: certificate.serial_hex(),
            fingerprint_sha256: certificate.fingerprint_sha256()?,
            not_before: certificate.not_before().to_string(),
            not_after: certificate.not_after().to_string(),
            dns_names: certificate.dns_names()?,
        })
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct RootCaRequest {
    #[serde(default = "default_root_ca_subject")]
    pub subject: SubjectInfo,
    #[serde(default = "default_root_ca_key_size")]
    pub key_size: usize,
    #[serde(default = "default_root_ca_validity_days")]
    pub validity_days: i64,
}

impl Default for RootCaRequest {
    fn default() -> Self {
        Self {
            subject: default_root_ca_subject(),
            key_size: DEFAULT_ROOT_CA_MODULUS_BITS,
            validity_days: DEFAULT_ROOT_CA_VALIDITY_DAYS,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct RootCaResponse {
    pub private_key: String,
    #[serde(flatten)]
    pub certificate: CertificateResponse,
}

/// Outcome of a service operation.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum ServiceResponse<T> {
    Success {
        success: bool,
        #[serde(flatten)]
        payload: T,
    },
    Failure {
        success: bool,
        error: String,
        kind: ErrorKind,
    },
}

impl<T> ServiceResponse<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

impl<T> From<Result<T>> for ServiceResponse<T> {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(payload) => Self::Success {
                success: true,
                payload,
            },
            Err(e) => Self::Failure {
                success: false,
                error: e.to_string(),
                kind: e.kind(),
            },
        }
    }
}

impl<T> From<PkiError> for ServiceResponse<T> {
    fn from(error: PkiError) -> Self {
        Self::from(Err::<T, _>(error))
    }
}

/// Runs the pipeline operations under one [`IssuancePolicy`].
#[derive(Debug, Clone, Default)]
pub struct IssuanceService {
    policy: IssuancePolicy,
}

impl IssuanceService {
    pub fn new(policy: IssuancePolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &IssuancePolicy {
        &self.policy
    }

    pub fn generate_key(&self, request: &KeyGenerationRequest) -> Result<KeyGenerationResponse> {
        let key = KeyPair::generate_with_policy(request.key_size, &self.policy)?;
        let pem = key.serialize()?;
        Ok(KeyGenerationResponse {
            private_key: pem.private_pem.to_string(),
            public_key: pem.public_pem,
        })
    }

    pub fn generate_csr(&self, request: &CsrRequest) -> Result<CsrResponse> {
        let csr = CsrBuilder::build(&request.private_key, &request.subject_with_defaults())?;
        Ok(CsrResponse { csr: csr.to_pem()? })
    }

    pub fn sign(&self, request: &IssuanceRequest) -> Result<CertificateResponse> {
        let certificate = CertificateIssuer::new(self.policy.clone()).issue_pem(
            &request.root_certificate,
            &request.root_private_key,
            &request.csr,
            request.validity_days,
            &request.dns_names,
        )?;
        CertificateResponse::from_certificate(&certificate)
    }

    pub fn init_root_ca(&self, request: &RootCaRequest) -> Result<RootCaResponse> {
        let (key, certificate) = RootCaBootstrapper::new(self.policy.clone()).bootstrap(
            &request.subject,
            request.key_size,
            request.validity_days,
        )?;
        Ok(RootCaResponse {
            private_key: key.serialize()?.private_pem.to_string(),
            certificate: CertificateResponse::from_certificate(&certificate)?,
        })
    }

    /// Decodes a JSON request, runs `operation` on it and encodes the
    /// response as JSON.
    ///
    /// A request that does not decode is answered with an
    /// `InvalidParameterError` response.
    pub fn handle_json<Req, Resp>(
        &self,
        json: &str,
        operation: impl FnOnce(&Self, &Req) -> Result<Resp>,
    ) -> Result<String>
    where
        Req: for<'de> Deserialize<'de>,
        Resp: Serialize,
    {
        let response: ServiceResponse<Resp> = match serde_json::from_str::<Req>(json) {
            Ok(request) => operation(self, &request).into(),
            Err(e) => PkiError::InvalidParameter(format!("malformed request: {e}")).into(),
        };
        serde_json::to_string(&response).map_err(|e| PkiError::Encoding(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::*;

    #[test]
    fn requests_fill_in_defaults() {
        let request: KeyGenerationRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(request.key_size, 2048);

        let request: IssuanceRequest = serde_json::from_value(json!({
            "root_certificate": "a",
            "root_private_key": "b",
            "csr": "c",
        }))
        .unwrap();
        assert_eq!(request.validity_days, 365);
        assert!(request.dns_names.is_empty());

        let request: RootCaRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(request, RootCaRequest::default());
        assert_eq!(request.subject.common_name, "Test Root CA");
    }

    #[test]
    fn csr_request_has_flat_subject_fields() {
        let request: CsrRequest = serde_json::from_value(json!({
            "private_key": "pem",
            "country": "US",
            "common_name": "test.example.com",
            "dns_names": ["test.example.com"],
        }))
        .unwrap();
        assert_eq!(request.subject.country.as_deref(), Some("US"));
        assert_eq!(request.subject.state, None);
        assert_eq!(request.subject.dns_names, vec!["test.example.com"]);
    }

    #[test]
    fn missing_subject_fields_get_defaults() {
        let key = crate::key::tests::shared_key(1);
        let request = CsrRequest {
            private_key: key.serialize().unwrap().private_pem.to_string(),
            subject: SubjectInfo {
                common_name: "test.example.com".to_string(),
                organization: Some("Example".to_string()),
                ..SubjectInfo::default()
            },
        };

        let response = IssuanceService::default().generate_csr(&request).unwrap();
        let subject = crate::csr::CertificateSigningRequest::from_pem(&response.csr)
            .unwrap()
            .subject();
        assert_eq!(subject.country.as_deref(), Some("US"));
        assert_eq!(subject.state.as_deref(), Some(""));
        assert_eq!(subject.locality.as_deref(), Some(""));
        assert_eq!(subject.organization.as_deref(), Some("Example"));
        assert_eq!(subject.organization_unit.as_deref(), Some(""));
        assert_eq!(subject.common_name, "test.example.com");

        let explicit = CsrRequest {
            subject: SubjectInfo {
                country: Some("DE".to_string()),
                ..request.subject.clone()
            },
            ..request
        };
        assert_eq!(explicit.subject_with_defaults().country.as_deref(), Some("DE"));
    }

    #[test]
    fn success_payload_is_flattened() {
        let response: ServiceResponse<CsrResponse> = Ok(CsrResponse {
            csr: "pem".to_string(),
        })
        .into();
        assert!(response.is_success());
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({"success": true, "csr": "pem"})
        );
    }

    #[test]
    fn failure_carries_kind_and_message() {
        let response: ServiceResponse<CsrResponse> = PkiError::KeyMismatch.into();
        assert!(!response.is_success());
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["success"], json!(false));
        assert_eq!(value["kind"], json!("KeyMismatchError"));
        assert!(value.get("csr").is_none());
    }

    #[test]
    fn malformed_json_is_an_invalid_parameter() {
        let service = IssuanceService::default();
        let text = service
            .handle_json("not json", IssuanceService::generate_key)
            .unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["success"], json!(false));
        assert_eq!(value["kind"], json!("InvalidParameterError"));
    }

    #[test]
    fn rejected_key_size_is_reported() {
        let service = IssuanceService::default();
        let text = service
            .handle_json(r#"{"key_size": 1024}"#, IssuanceService::generate_key)
            .unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["kind"], json!("InvalidParameterError"));
        assert!(value.get("private_key").is_none());
    }

    #[test]
    fn bad_key_in_csr_request_is_a_key_parse_error() {
        let service = IssuanceService::default();
        let text = service
            .handle_json(
                r#"{"private_key": "garbage", "common_name": "x"}"#,
                IssuanceService::generate_csr,
            )
            .unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["kind"], json!("KeyParseError"));
    }
}
