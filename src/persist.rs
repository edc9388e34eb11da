//! Writing issued certificates and keys to disk.
//!
//! Files are opened create-or-truncate. A crash halfway through leaves a truncated file
//! behind; callers verify before persisting so nothing unverified is ever written.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

use tracing::Span;

use crate::cert::IssuedCertificate;
use crate::error::PersistError;
use crate::key::IssuedKeyEncoding;

/// Mode of certificate files: `-rw-r--r--`.
pub const CERT_FILE_MODE: u32 = 0o644;
/// Mode of private key files: `-rw-------`.
pub const KEY_FILE_MODE: u32 = 0o600;

/// Writes the certificate and private key of `issued` as PEM files.
///
/// The key file ends up owner read/write only even when `key_path` already existed with
/// wider permissions. Failures to sync a handle on the way out are logged on `span` and
/// otherwise ignored.
pub fn persist(
    issued: &IssuedCertificate,
    cert_path: &Path,
    key_path: &Path,
    encoding: IssuedKeyEncoding,
    span: &Span,
) -> Result<(), PersistError> {
    let cert_pem = pem::encode_config(
        &pem::Pem::new("CERTIFICATE", issued.der.as_slice()),
        pem::EncodeConfig::new().set_line_ending(pem::LineEnding::LF),
    );
    write_file(cert_path, cert_pem.as_bytes(), CERT_FILE_MODE, span)?;

    let key_pem = issued.private_key.to_pem(encoding)?;
    write_file(key_path, key_pem.as_bytes(), KEY_FILE_MODE, span)?;

    tracing::debug!(
        parent: span,
        cert = %cert_path.display(),
        key = %key_path.display(),
        key_encoding = encoding.pem_label(),
        "Certificate and key written"
    );
    Ok(())
}

fn write_file(path: &Path, contents: &[u8], mode: u32, span: &Span) -> Result<(), PersistError> {
    let io_err = |source| PersistError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut file = open_truncate(path, mode).map_err(io_err)?;
    restrict_permissions(&file, mode).map_err(io_err)?;
    let written = file.write_all(contents).map_err(io_err);
    close(file, path, span);
    written
}

#[cfg(unix)]
fn open_truncate(path: &Path, mode: u32) -> std::io::Result<File> {
    use std::os::unix::fs::OpenOptionsExt;

    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(mode)
        .open(path)
}

#[cfg(not(unix))]
fn open_truncate(path: &Path, _mode: u32) -> std::io::Result<File> {
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
}

// `mode()` only applies to newly created files and is filtered through the umask.
#[cfg(unix)]
fn restrict_permissions(file: &File, mode: u32) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    file.set_permissions(std::fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
fn restrict_permissions(_file: &File, _mode: u32) -> std::io::Result<()> {
    Ok(())
}

/// Best effort: flush to disk and drop the handle, logging instead of failing.
fn close(file: File, path: &Path, span: &Span) {
    if let Err(err) = file.sync_all() {
        tracing::warn!(
            parent: span,
            path = %path.display(),
            error = %err,
            "Error closing file"
        );
    }
}
