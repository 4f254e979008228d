//! # certissue - RSA key, CSR and certificate issuance
//!
//! certissue turns a subject's identity claims into a certificate signed by a
//! root CA, using the RustCrypto crates only (OpenSSL is a test dependency).
//! The pipeline has four parts:
//!
//! - [`key::KeyPair`]: RSA key generation (2048, 3072 or 4096 bits,
//!   exponent 65537) and PEM (de)serialization.
//! - [`csr::CsrBuilder`]: self-signed PKCS#10 requests with a subject
//!   alternative name extension.
//! - [`issuer::CertificateIssuer`]: verifies a request and signs a leaf
//!   certificate with a [`issuer::CertificateAuthority`].
//! - [`ca::RootCaBootstrapper`]: generates the self-signed root CA the
//!   issuer signs with.
//!
//! All operations are synchronous and keep no state between calls. Inputs
//! and outputs are PEM text. Limits such as the allowed key sizes and the
//! longest validity are set by an [`config::IssuancePolicy`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use certissue::{
//!     ca::bootstrap_root_ca,
//!     cert::params::SubjectInfo,
//!     csr::CsrBuilder,
//!     issuer::{CertificateAuthority, CertificateIssuer},
//!     key::KeyPair,
//! };
//!
//! # fn main() -> Result<(), certissue::error::PkiError> {
//! // Create the trust anchor
//! let (ca_key, ca_cert) = bootstrap_root_ca(&SubjectInfo::default_root_ca(), 4096, 3650)?;
//! let ca = CertificateAuthority::new(ca_cert, ca_key)?;
//!
//! // The subject generates a key and a request
//! let key = KeyPair::generate(2048)?;
//! let subject = SubjectInfo::builder()
//!     .common_name("test.example.com")
//!     .dns_names(vec!["test.example.com".to_string()])
//!     .build();
//! let csr = CsrBuilder::build(&key.serialize()?.private_pem, &subject)?;
//!
//! // The CA signs it
//! let cert = CertificateIssuer::default().issue(&ca, &csr, 365, &subject.dns_names)?;
//! println!("{}", cert.to_pem()?);
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Every operation returns a single [`error::PkiError`]; its
//! [`kind`](error::PkiError::kind) is a stable identifier for outer layers:
//!
//! ```rust
//! use certissue::{cert::params::SubjectInfo, csr::CsrBuilder, error::PkiError};
//!
//! match CsrBuilder::build("invalid pem data", &SubjectInfo::default()) {
//!     Ok(_) => unreachable!(),
//!     Err(e @ PkiError::KeyParse(_)) => assert_eq!(e.kind().as_str(), "KeyParseError"),
//!     Err(e) => panic!("unexpected error: {e}"),
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`key`]: Key generation, import/export and signing
//! - [`csr`]: Certificate signing requests
//! - [`issuer`]: CA material and leaf certificate issuance
//! - [`ca`]: Root CA bootstrapping
//! - [`cert`]: The issued certificate value, its names and extensions
//! - [`tbs_certificate`]: Low-level certificate structure and signing
//! - [`config`]: Issuance policy
//! - [`service`]: Request and response types for an outer layer
//! - [`error`]: Error types

pub mod ca;
pub mod cert;
pub mod config;
pub mod csr;
pub mod error;
pub mod issuer;
pub mod key;
pub mod pem_utils;
pub mod service;
pub mod tbs_certificate;

pub use ca::{RootCaBootstrapper, bootstrap_root_ca};
pub use cert::IssuedCertificate;
pub use cert::params::SubjectInfo;
pub use config::IssuancePolicy;
pub use csr::{CertificateSigningRequest, CsrBuilder};
pub use error::{ErrorKind, PkiError, Result};
pub use issuer::{CertificateAuthority, CertificateIssuer};
pub use key::{KeyPair, KeyPairPem};
