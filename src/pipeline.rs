use std::path::PathBuf;

use tracing::Span;

use crate::cert::params::SubjectDescriptor;
use crate::error::{Stage, SubjectError};
use crate::issuer::{IssueOptions, Issuer};
use crate::key::IssuedKeyEncoding;
use crate::loader::CertificateAuthority;
use crate::persist::persist;
use crate::verify::verify;

/// Where one subject's artifacts ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuanceReport {
    pub common_name: String,
    /// Serial number as lowercase hex.
    pub serial_number: String,
    pub cert_path: PathBuf,
    pub key_path: PathBuf,
}

/// Issues, verifies and persists certificates for one subject at a time against a loaded CA.
///
/// Every log event is emitted under the span handed to [`Pipeline::new`]; nothing here
/// depends on a globally installed subscriber.
pub struct Pipeline<'a> {
    ca: &'a CertificateAuthority,
    options: IssueOptions,
    key_encoding: IssuedKeyEncoding,
    span: Span,
}

impl<'a> Pipeline<'a> {
    pub fn new(ca: &'a CertificateAuthority, span: Span) -> Self {
        Self {
            ca,
            options: IssueOptions::default(),
            key_encoding: IssuedKeyEncoding::default(),
            span,
        }
    }

    pub fn with_options(mut self, options: IssueOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_key_encoding(mut self, key_encoding: IssuedKeyEncoding) -> Self {
        self.key_encoding = key_encoding;
        self
    }

    /// Runs issue, verify and persist for `subject`.
    ///
    /// The certificate is verified in memory before anything is written, so a failed
    /// verification leaves no files behind.
    pub fn run(&self, subject: &SubjectDescriptor) -> Result<IssuanceReport, SubjectError> {
        let cn = subject.common_name.as_str();
        tracing::debug!(parent: &self.span, subject = cn, "Issuing certificate");
        let issued = self
            .ca
            .issue(subject, self.options)
            .map_err(|e| SubjectError::new(cn, Stage::Issue, e))?;

        verify(&issued.der, &self.ca.certificate)
            .map_err(|e| SubjectError::new(cn, Stage::Verify, e))?;
        let serial_number = issued
            .certificate()
            .map(|cert| hex_lower(cert.serial_number()))
            .map_err(|e| SubjectError::new(cn, Stage::Verify, e))?;
        tracing::debug!(parent: &self.span, subject = cn, serial = %serial_number, "Certificate verified");

        persist(
            &issued,
            &subject.cert_path,
            &subject.key_path,
            self.key_encoding,
            &self.span,
        )
        .map_err(|e| SubjectError::new(cn, Stage::Persist, e))?;

        tracing::info!(
            parent: &self.span,
            subject = cn,
            serial = %serial_number,
            cert = %subject.cert_path.display(),
            "Certificate issued"
        );

        Ok(IssuanceReport {
            common_name: subject.common_name.clone(),
            serial_number,
            cert_path: subject.cert_path.clone(),
            key_path: subject.key_path.clone(),
        })
    }
}

fn hex_lower(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
