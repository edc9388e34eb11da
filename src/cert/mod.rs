pub mod extensions;
pub mod params;

use der::{Decode, Encode, EncodePem};
use extensions::{SubjectAltName, SubjectKeyIdentifier, ToAndFromX509Extension};
use params::{DistinguishedName, ExtensionParam};
use time::OffsetDateTime;
use x509_cert::certificate::CertificateInner;

use crate::error::{IssueError, LoadError, VerifyError};
use crate::key::PrivateKey;

/// Represents the supported signature algorithms for certificates.
///
/// This enum provides a mapping to the corresponding OIDs for each algorithm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureAlgorithm {
    /// SHA-256 with RSA encryption (PKCS#1 v1.5).
    Sha256WithRSA,
    /// SHA-384 with RSA encryption (PKCS#1 v1.5).
    Sha384WithRSA,
    /// SHA-512 with RSA encryption (PKCS#1 v1.5).
    Sha512WithRSA,
}

impl SignatureAlgorithm {
    pub fn oid(&self) -> const_oid::ObjectIdentifier {
        match self {
            SignatureAlgorithm::Sha256WithRSA => const_oid::db::rfc5912::SHA_256_WITH_RSA_ENCRYPTION,
            SignatureAlgorithm::Sha384WithRSA => const_oid::db::rfc5912::SHA_384_WITH_RSA_ENCRYPTION,
            SignatureAlgorithm::Sha512WithRSA => const_oid::db::rfc5912::SHA_512_WITH_RSA_ENCRYPTION,
        }
    }

    /// Determine the algorithm from a certificate's `AlgorithmIdentifier`.
    pub fn from_algorithm_identifier(
        id: &x509_cert::spki::AlgorithmIdentifierOwned,
    ) -> Result<Self, VerifyError> {
        match id.oid {
            const_oid::db::rfc5912::SHA_256_WITH_RSA_ENCRYPTION => Ok(Self::Sha256WithRSA),
            const_oid::db::rfc5912::SHA_384_WITH_RSA_ENCRYPTION => Ok(Self::Sha384WithRSA),
            const_oid::db::rfc5912::SHA_512_WITH_RSA_ENCRYPTION => Ok(Self::Sha512WithRSA),
            other => Err(VerifyError::UnsupportedAlgorithm(format!(
                "signature algorithm {}",
                const_oid::db::DB
                    .by_oid(&other)
                    .map(str::to_string)
                    .unwrap_or_else(|| other.to_string())
            ))),
        }
    }
}

impl From<SignatureAlgorithm> for x509_cert::spki::AlgorithmIdentifierOwned {
    /// Converts a `SignatureAlgorithm` into an `AlgorithmIdentifierOwned`.
    ///
    /// RSA PKCS#1 v1.5 identifiers carry an explicit NULL parameter (RFC 4055).
    fn from(value: SignatureAlgorithm) -> Self {
        x509_cert::spki::AlgorithmIdentifierOwned {
            oid: value.oid(),
            parameters: Some(der::Any::from(der::asn1::AnyRef::NULL)),
        }
    }
}

/// Represents a parsed X.509 certificate.
///
/// This struct provides methods to encode the certificate into DER or PEM formats and to
/// read the fields the issuance pipeline consumes.
#[derive(Debug, Clone)]
pub struct Certificate {
    /// The inner representation of the certificate.
    pub inner: CertificateInner,
}

impl Certificate {
    /// Decodes a DER-encoded certificate.
    pub fn from_der(der: &[u8]) -> Result<Self, VerifyError> {
        let inner = CertificateInner::from_der(der)?;
        Ok(Self { inner })
    }

    /// Decodes a PEM document holding exactly one `CERTIFICATE` block.
    pub fn from_pem(pem_str: &[u8]) -> Result<Self, LoadError> {
        let blocks = pem::parse_many(pem_str)
            .map_err(|e| LoadError::Format(format!("invalid PEM: {e}")))?;
        let block = match blocks.as_slice() {
            [block] => block,
            [] => return Err(LoadError::Format("no PEM block found".to_string())),
            _ => {
                return Err(LoadError::Format(format!(
                    "expected a single certificate, found {} PEM blocks",
                    blocks.len()
                )));
            }
        };
        if block.tag() != "CERTIFICATE" {
            return Err(LoadError::Format(format!(
                "expected a CERTIFICATE block, found {}",
                block.tag()
            )));
        }
        let inner = CertificateInner::from_der(block.contents())
            .map_err(|e| LoadError::Format(format!("invalid certificate: {e}")))?;
        Ok(Self { inner })
    }

    /// Encodes the certificate into DER format.
    pub fn to_der(&self) -> Result<Vec<u8>, IssueError> {
        Ok(self.inner.to_der()?)
    }

    /// Encodes the certificate into PEM format.
    pub fn to_pem(&self) -> Result<String, IssueError> {
        Ok(self.inner.to_pem(pkcs8::LineEnding::LF)?)
    }

    pub fn subject(&self) -> DistinguishedName {
        DistinguishedName::from_x509_name(&self.inner.tbs_certificate.subject)
    }

    pub fn issuer(&self) -> DistinguishedName {
        DistinguishedName::from_x509_name(&self.inner.tbs_certificate.issuer)
    }

    /// Serial number as unsigned big-endian bytes.
    pub fn serial_number(&self) -> &[u8] {
        self.inner.tbs_certificate.serial_number.as_bytes()
    }

    pub fn not_before(&self) -> OffsetDateTime {
        self.inner
            .tbs_certificate
            .validity
            .not_before
            .to_system_time()
            .into()
    }

    pub fn not_after(&self) -> OffsetDateTime {
        self.inner
            .tbs_certificate
            .validity
            .not_after
            .to_system_time()
            .into()
    }

    /// All extensions in the certificate, in encoding order.
    pub fn extensions(&self) -> Vec<ExtensionParam> {
        self.inner
            .tbs_certificate
            .extensions
            .iter()
            .flatten()
            .map(|ext| ExtensionParam {
                oid: ext.extn_id,
                critical: ext.critical,
                value: ext.extn_value.as_bytes().to_vec(),
            })
            .collect()
    }

    /// Finds and decodes one extension by type.
    pub fn extension<E: ToAndFromX509Extension>(&self) -> Option<E> {
        self.extensions()
            .iter()
            .find(|ext| ext.oid == E::OID)
            .and_then(|ext| ext.to_extension().ok())
    }

    /// DNS names from the subject alternative name extension.
    pub fn dns_names(&self) -> Vec<String> {
        self.extension::<SubjectAltName>()
            .map(|san| san.dns_names)
            .unwrap_or_default()
    }

    /// RFC 822 email addresses from the subject alternative name extension.
    pub fn email_addresses(&self) -> Vec<String> {
        self.extension::<SubjectAltName>()
            .map(|san| san.email_addresses)
            .unwrap_or_default()
    }

    /// The subject key identifier, when the certificate carries one.
    pub fn subject_key_identifier(&self) -> Option<Vec<u8>> {
        self.extension::<SubjectKeyIdentifier>().map(|ski| ski.0)
    }
}

/// A freshly signed leaf certificate and the private key generated for it.
///
/// The DER bytes are the authoritative form; they are what gets verified and persisted.
#[derive(Debug)]
pub struct IssuedCertificate {
    pub der: Vec<u8>,
    pub private_key: PrivateKey,
}

impl IssuedCertificate {
    /// Decode the DER bytes for inspection.
    pub fn certificate(&self) -> Result<Certificate, VerifyError> {
        Certificate::from_der(&self.der)
    }
}
