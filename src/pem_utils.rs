/// PEM label of an X.509 certificate.
pub const CERTIFICATE_LABEL: &str = "CERTIFICATE";
/// PEM label of a PKCS#10 certificate signing request.
pub const CSR_LABEL: &str = "CERTIFICATE REQUEST";
/// Older label some tools still emit for PKCS#10 requests.
pub const LEGACY_CSR_LABEL: &str = "NEW CERTIFICATE REQUEST";
/// PEM label of an unencrypted PKCS#8 private key.
pub const PKCS8_PRIVATE_KEY_LABEL: &str = "PRIVATE KEY";
/// PEM label of an encrypted PKCS#8 private key.
pub const ENCRYPTED_PRIVATE_KEY_LABEL: &str = "ENCRYPTED PRIVATE KEY";
/// PEM label of a PKCS#1 RSA private key.
pub const PKCS1_PRIVATE_KEY_LABEL: &str = "RSA PRIVATE KEY";
/// PEM label of a SubjectPublicKeyInfo public key.
pub const PUBLIC_KEY_LABEL: &str = "PUBLIC KEY";

/// Convert DER‑encoded data into a PEM‑encoded string with the provided label.
pub fn der_to_pem(der: &[u8], label: &str) -> String {
    let pem = pem::Pem::new(label, der);
    pem::encode_config(
        &pem,
        pem::EncodeConfig::new().set_line_ending(pem::LineEnding::LF),
    )
}

/// Convert a PEM‑encoded string to its label and DER‑encoded bytes.
///
/// Surrounding whitespace and text outside the delimiters is tolerated;
/// only the first block is returned.
pub fn pem_to_der(pem_str: &str) -> Result<(String, Vec<u8>), pem::PemError> {
    let pem = pem::parse(pem_str.trim())?;
    Ok((pem.tag().to_string(), pem.contents().to_vec()))
}
