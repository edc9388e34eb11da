//! Loading the signing CA from PEM files.
//!
//! The CA key must be PKCS#8, normally passphrase-encrypted (`ENCRYPTED PRIVATE KEY`).
//! Legacy PKCS#1 `RSA PRIVATE KEY` blocks are refused before any decryption is attempted.

use std::path::Path;

use crate::cert::Certificate;
use crate::error::LoadError;
use crate::key::{PrivateKey, PublicKey};

const ENCRYPTED_PKCS8_LABEL: &str = "ENCRYPTED PRIVATE KEY";
const PKCS8_LABEL: &str = "PRIVATE KEY";
const PKCS1_LABEL: &str = "RSA PRIVATE KEY";

/// The signing authority: its certificate and the matching private key.
///
/// Holds the decrypted key in memory only; nothing here writes it back out.
#[derive(Debug)]
pub struct CertificateAuthority {
    pub certificate: Certificate,
    pub private_key: PrivateKey,
}

/// Read and decrypt the CA certificate and private key.
///
/// # Example
///
/// ```rust,no_run
/// use certissue::loader::load_ca;
///
/// # fn main() -> Result<(), certissue::error::LoadError> {
/// let ca = load_ca("ca/intermediate.crt", "ca/intermediate.key", "correct horse")?;
/// println!("loaded CA {:?}", ca.certificate.subject().common_name);
/// # Ok(())
/// # }
/// ```
pub fn load_ca(
    cert_path: impl AsRef<Path>,
    key_path: impl AsRef<Path>,
    key_passphrase: &str,
) -> Result<CertificateAuthority, LoadError> {
    let certificate = load_certificate(cert_path.as_ref())?;
    let private_key = load_private_key(key_path.as_ref(), key_passphrase)?;

    let cert_public_key =
        PublicKey::from_spki(&certificate.inner.tbs_certificate.subject_public_key_info)
            .map_err(|e| LoadError::KeyType(format!("CA certificate key: {e}")))?;
    if cert_public_key != private_key.public_key() {
        return Err(LoadError::KeyMismatch);
    }

    Ok(CertificateAuthority {
        certificate,
        private_key,
    })
}

/// Read a file holding a single PEM `CERTIFICATE` block.
pub fn load_certificate(path: &Path) -> Result<Certificate, LoadError> {
    let data = read(path)?;
    Certificate::from_pem(&data)
}

/// Read a PKCS#8 private key, decrypting it with `passphrase` when encrypted.
pub fn load_private_key(path: &Path, passphrase: &str) -> Result<PrivateKey, LoadError> {
    let data = read(path)?;
    let block = pem::parse(&data).map_err(|e| LoadError::Format(format!("invalid PEM: {e}")))?;

    match block.tag() {
        ENCRYPTED_PKCS8_LABEL => {
            PrivateKey::from_encrypted_pkcs8_der(block.contents(), passphrase.as_bytes())
        }
        PKCS8_LABEL => PrivateKey::from_pkcs8_der(block.contents()),
        PKCS1_LABEL => Err(LoadError::UnsupportedFormat(
            "PKCS#1 keys are not supported, convert the key to PKCS#8".to_string(),
        )),
        other => Err(LoadError::Format(format!("unrecognized key block type {other}"))),
    }
}

fn read(path: &Path) -> Result<Vec<u8>, LoadError> {
    std::fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}
