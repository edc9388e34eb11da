//! Error types for every stage of the issuance pipeline.
//!
//! Each stage has its own error enum so callers can match on exactly the failures that stage
//! can produce. [`SubjectError`] wraps the per-subject stages with the subject's common name
//! and the stage that failed.
//!
//! ```rust
//! use certissue::error::LoadError;
//!
//! let err = LoadError::Decryption;
//! assert_eq!(err.to_string(), "Failed to decrypt private key");
//! ```

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading the CA certificate and private key.
#[derive(Debug, Error)]
pub enum LoadError {
    /// A file could not be read.
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// PEM or DER content is malformed, or the PEM block has an unexpected label.
    #[error("Malformed input: {0}")]
    Format(String),

    /// Legacy key containers that are deliberately not accepted.
    #[error("Unsupported key format: {0}")]
    UnsupportedFormat(String),

    /// Wrong passphrase or corrupt ciphertext. Carries no detail on purpose.
    #[error("Failed to decrypt private key")]
    Decryption,

    /// The decrypted key is not an RSA key.
    #[error("Unsupported key type: {0}")]
    KeyType(String),

    /// The private key does not belong to the CA certificate.
    #[error("CA private key does not match the CA certificate public key")]
    KeyMismatch,
}

/// Errors raised while building and signing a leaf certificate.
#[derive(Debug, Error, Clone)]
pub enum IssueError {
    /// Validity must be a positive number of days.
    #[error("Invalid validity period: {0} days")]
    InvalidValidity(i64),

    /// The subject descriptor is unusable (for example an empty common name).
    #[error("Invalid subject: {0}")]
    InvalidSubject(String),

    /// Key pair generation or the random source failed.
    #[error("Key generation error: {0}")]
    KeyGen(String),

    /// The CA key failed to produce a signature.
    #[error("Signing error: {0}")]
    Signing(String),

    /// A certificate field could not be DER-encoded.
    #[error("Failed to encode certificate: {0}")]
    Encoding(String),
}

/// Errors raised while writing issued artifacts to disk.
#[derive(Debug, Error)]
pub enum PersistError {
    /// A file could not be created or written.
    #[error("Failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The private key could not be serialized.
    #[error("Failed to encode private key: {0}")]
    Encoding(String),

    /// Another subject in the same run already writes to this path.
    #[error("{} is already claimed by subject `{owner}`", path.display())]
    OutputConflict { path: PathBuf, owner: String },
}

/// Errors raised while checking an issued certificate against its CA.
#[derive(Debug, Error, Clone)]
pub enum VerifyError {
    /// The DER bytes are not a certificate.
    #[error("Failed to parse certificate: {0}")]
    Parse(String),

    /// The certificate issuer is not the CA subject.
    #[error("Certificate issuer does not match the CA subject")]
    IssuerMismatch,

    /// Signature or key algorithm this crate cannot check.
    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// The signature does not validate against the CA public key.
    #[error("Signature verification failed: {0}")]
    SignatureVerification(String),
}

/// Errors raised while reading or validating the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Missing required setting `{0}`")]
    Missing(&'static str),

    #[error("Invalid setting `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Errors raised by a directory collaborator.
#[derive(Debug, Error)]
#[error("Directory lookup failed: {0}")]
pub struct DirectoryError(pub String);

/// The per-subject stage that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Issue,
    Verify,
    Persist,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Issue => f.write_str("issue"),
            Stage::Verify => f.write_str("verify"),
            Stage::Persist => f.write_str("persist"),
        }
    }
}

/// Underlying cause of a [`SubjectError`].
#[derive(Debug, Error)]
pub enum StageError {
    #[error(transparent)]
    Issue(#[from] IssueError),

    #[error(transparent)]
    Verify(#[from] VerifyError),

    #[error(transparent)]
    Persist(#[from] PersistError),
}

/// A failure for one subject, with enough context to act on it.
#[derive(Debug, Error)]
#[error("Stage `{stage}` failed for subject `{subject}`: {source}")]
pub struct SubjectError {
    pub subject: String,
    pub stage: Stage,
    #[source]
    pub source: StageError,
}

impl SubjectError {
    pub fn new(subject: impl Into<String>, stage: Stage, source: impl Into<StageError>) -> Self {
        Self {
            subject: subject.into(),
            stage,
            source: source.into(),
        }
    }
}

impl From<der::Error> for IssueError {
    fn from(err: der::Error) -> Self {
        IssueError::Encoding(err.to_string())
    }
}

impl From<der::Error> for VerifyError {
    fn from(err: der::Error) -> Self {
        VerifyError::Parse(err.to_string())
    }
}
