#![allow(dead_code)]

use std::sync::OnceLock;

use certissue::cert::params::SubjectInfo;
use certissue::ca::RootCaBootstrapper;
use certissue::csr::{CertificateSigningRequest, CsrBuilder};
use certissue::issuer::CertificateAuthority;
use certissue::key::KeyPair;

pub const SERVER_NAME: &str = "test.example.com";

/// Root CA shared by all tests of one test binary. 2048 bits keeps debug
/// builds fast.
pub fn root_ca() -> &'static CertificateAuthority {
    static CA: OnceLock<CertificateAuthority> = OnceLock::new();
    CA.get_or_init(|| {
        RootCaBootstrapper::default()
            .bootstrap_authority(&SubjectInfo::default_root_ca(), 2048, 3650)
            .unwrap()
    })
}

pub fn server_key() -> &'static KeyPair {
    static KEY: OnceLock<KeyPair> = OnceLock::new();
    KEY.get_or_init(|| KeyPair::generate(2048).unwrap())
}

pub fn other_key() -> &'static KeyPair {
    static KEY: OnceLock<KeyPair> = OnceLock::new();
    KEY.get_or_init(|| KeyPair::generate(2048).unwrap())
}

pub fn server_dns_names() -> Vec<String> {
    vec![SERVER_NAME.to_string(), format!("www.{SERVER_NAME}")]
}

pub fn server_subject() -> SubjectInfo {
    SubjectInfo::builder()
        .country("US")
        .state("California")
        .locality("San Francisco")
        .organization("Test Organization")
        .organizational_unit("IT Department")
        .common_name(SERVER_NAME)
        .dns_names(server_dns_names())
        .build()
}

pub fn server_csr() -> CertificateSigningRequest {
    let pem = server_key().serialize().unwrap().private_pem;
    CsrBuilder::build(&pem, &server_subject()).unwrap()
}
