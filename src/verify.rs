use der::Encode;

use crate::cert::{Certificate, SignatureAlgorithm};
use crate::error::VerifyError;
use crate::key::PublicKey;

/// Checks that `issued_der` is a certificate issued and signed by `ca_cert`.
///
/// The certificate is re-parsed from its DER bytes, its issuer must equal the CA subject
/// exactly, and its signature must validate against the CA public key.
pub fn verify(issued_der: &[u8], ca_cert: &Certificate) -> Result<(), VerifyError> {
    let issued = Certificate::from_der(issued_der)?;
    let tbs = &issued.inner.tbs_certificate;

    if tbs.issuer != ca_cert.inner.tbs_certificate.subject {
        return Err(VerifyError::IssuerMismatch);
    }

    if tbs.signature != issued.inner.signature_algorithm {
        return Err(VerifyError::SignatureVerification(
            "inner and outer signature algorithms differ".to_string(),
        ));
    }
    let algorithm = SignatureAlgorithm::from_algorithm_identifier(&issued.inner.signature_algorithm)?;

    let signature = issued.inner.signature.as_bytes().ok_or_else(|| {
        VerifyError::SignatureVerification("signature has unused bits".to_string())
    })?;

    let ca_public_key =
        PublicKey::from_spki(&ca_cert.inner.tbs_certificate.subject_public_key_info)?;
    ca_public_key.verify(&algorithm, &tbs.to_der()?, signature)
}
