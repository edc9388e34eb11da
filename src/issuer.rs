use der::Encode;
use rand_core::CryptoRngCore;
use x509_cert::certificate::CertificateInner;

use crate::cert::extensions::{
    AuthorityKeyIdentifier, BasicConstraints, ExtendedKeyUsage, ExtendedKeyUsageOption,
    KeyUsage, KeyUsages, SubjectAltName, SubjectKeyIdentifier, key_identifier,
};
use crate::cert::params::{ExtensionParam, SubjectDescriptor, Validity, leaf_subject};
use crate::cert::{Certificate, IssuedCertificate};
use crate::error::IssueError;
use crate::key::PrivateKey;
use crate::loader::CertificateAuthority;
use crate::tbs_certificate::{TbsCertificate, random_serial_number};

/// Which DNS names go into a leaf's subject alternative name extension.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DnsNamePolicy {
    /// Leaf certificates carry no DNS names.
    #[default]
    Omit,
    /// Copy the CA certificate's DNS names into every leaf.
    InheritFromCa,
}

/// Knobs for the leaf template that are not part of the subject itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IssueOptions {
    pub dns_names: DnsNamePolicy,
}

/// Represents an entity capable of issuing certificates.
///
/// This trait provides the issuer's certificate and signing key, and issues leaf
/// certificates from them.
pub trait Issuer {
    /// Returns the certificate of the issuer.
    fn issuer_certificate(&self) -> &Certificate;

    /// Returns the signing key of the issuer.
    fn signing_key(&self) -> &PrivateKey;

    /// Issues a leaf certificate for `subject` using the operating system's random source.
    fn issue(
        &self,
        subject: &SubjectDescriptor,
        options: IssueOptions,
    ) -> Result<IssuedCertificate, IssueError> {
        issue_with_rng(
            &mut rand_core::OsRng,
            self.issuer_certificate(),
            self.signing_key(),
            subject,
            options,
        )
    }
}

impl Issuer for CertificateAuthority {
    fn issuer_certificate(&self) -> &Certificate {
        &self.certificate
    }

    fn signing_key(&self) -> &PrivateKey {
        &self.private_key
    }
}

/// Issues a leaf certificate for `subject`, signed by `ca_key`.
///
/// Pure transformation: nothing is read from or written to disk.
pub fn issue(
    ca_cert: &Certificate,
    ca_key: &PrivateKey,
    subject: &SubjectDescriptor,
    options: IssueOptions,
) -> Result<IssuedCertificate, IssueError> {
    issue_with_rng(&mut rand_core::OsRng, ca_cert, ca_key, subject, options)
}

/// Same as [`issue`], drawing the key pair and serial number from `rng`.
///
/// Every check on `subject` runs before `rng` is first used.
pub fn issue_with_rng<R: CryptoRngCore + ?Sized>(
    rng: &mut R,
    ca_cert: &Certificate,
    ca_key: &PrivateKey,
    subject: &SubjectDescriptor,
    options: IssueOptions,
) -> Result<IssuedCertificate, IssueError> {
    let validity = Validity::for_days(subject.validity_days)?;
    if subject.common_name.trim().is_empty() {
        return Err(IssueError::InvalidSubject(
            "common name must not be empty".to_string(),
        ));
    }

    let ca_tbs = &ca_cert.inner.tbs_certificate;
    let subject_name = leaf_subject(&ca_tbs.subject, &subject.common_name)?;

    let san = SubjectAltName {
        dns_names: match options.dns_names {
            DnsNamePolicy::Omit => Vec::new(),
            DnsNamePolicy::InheritFromCa => ca_cert.dns_names(),
        },
        email_addresses: subject.email_addresses.clone(),
    };
    let mut extensions = vec![
        ExtensionParam::from_extension(
            KeyUsage(KeyUsages::DigitalSignature | KeyUsages::KeyEncipherment),
            true,
        )?,
        ExtensionParam::from_extension(
            ExtendedKeyUsage {
                usage: vec![
                    ExtendedKeyUsageOption::ClientAuth,
                    ExtendedKeyUsageOption::ServerAuth,
                ],
            },
            false,
        )?,
        ExtensionParam::from_extension(
            BasicConstraints {
                is_ca: false,
                max_path_length: None,
            },
            true,
        )?,
    ];
    if !san.is_empty() {
        extensions.push(ExtensionParam::from_extension(san, false)?);
    }

    let authority_key_id = match ca_cert.subject_key_identifier() {
        Some(id) => id,
        None => key_identifier(ca_tbs.subject_public_key_info.subject_public_key.raw_bytes()),
    };
    extensions.push(ExtensionParam::from_extension(
        AuthorityKeyIdentifier {
            key_identifier: authority_key_id,
        },
        false,
    )?);

    let leaf_key = PrivateKey::generate_rsa(rng, subject.key_size)?;
    let serial_number = random_serial_number(rng)?;
    let leaf_public_key = leaf_key.public_key();

    extensions.push(ExtensionParam::from_extension(
        SubjectKeyIdentifier(key_identifier(&leaf_public_key.subject_public_key_bytes()?)),
        false,
    )?);

    let signature_algorithm = ca_key.signature_algorithm();
    let tbs_cert = TbsCertificate {
        serial_number,
        signature_algorithm: signature_algorithm.clone(),
        issuer: ca_tbs.subject.clone(),
        validity,
        subject: subject_name,
        subject_public_key: leaf_public_key,
        extensions,
    };

    let tbs_cert_inner = tbs_cert.to_tbs_certificate_inner()?;
    let signature = ca_key.sign(&tbs_cert_inner.to_der()?)?;

    let cert_inner = CertificateInner {
        tbs_certificate: tbs_cert_inner,
        signature_algorithm: signature_algorithm.into(),
        signature: der::asn1::BitString::from_bytes(&signature)?,
    };

    Ok(IssuedCertificate {
        der: cert_inner.to_der()?,
        private_key: leaf_key,
    })
}
