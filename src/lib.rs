//! # certissue - Leaf Certificate Issuance Built on RustCrypto
//!
//! certissue mints short-lived X.509 leaf certificates for directory users. It loads an
//! intermediate CA from PEM files, generates a fresh RSA key pair for every subject, signs
//! a leaf certificate with the CA key, checks the result against the CA and writes the
//! certificate and key to disk.
//!
//! ## Pipeline
//!
//! 1. **Load** ([`loader::load_ca`]): the CA certificate plus its passphrase-encrypted
//!    PKCS#8 private key. Runs once.
//! 2. **Issue** ([`issuer::Issuer::issue`]): a pure transformation from a
//!    [`cert::params::SubjectDescriptor`] to a signed DER certificate and its private key.
//! 3. **Verify** ([`verify::verify`]): re-parses the certificate and checks its issuer and
//!    signature against the CA.
//! 4. **Persist** ([`persist::persist`]): PEM files, `0644` for certificates and `0600`
//!    for keys.
//!
//! [`pipeline::Pipeline`] strings the last three together for one subject at a time and
//! reports failures as [`error::SubjectError`], tagged with the subject and stage.
//!
//! ## Supported Key Types
//!
//! - **CA keys**: RSA, PKCS#8 (`ENCRYPTED PRIVATE KEY` or `PRIVATE KEY`)
//! - **Issued keys**: RSA of any configured size, written as PKCS#1 or PKCS#8
//! - **Signatures**: `sha256WithRSAEncryption` when signing; SHA-384 and SHA-512 variants
//!   are accepted when verifying
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use certissue::cert::params::SubjectDescriptor;
//! use certissue::loader::load_ca;
//! use certissue::pipeline::Pipeline;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let ca = load_ca("ca/intermediate.crt", "ca/intermediate.key", "correct horse")?;
//! let pipeline = Pipeline::new(&ca, tracing::info_span!("issue"));
//!
//! let subject = SubjectDescriptor::builder()
//!     .common_name("alice")
//!     .email_addresses(vec!["alice@example.org".to_string()])
//!     .validity_days(365)
//!     .key_size(2048)
//!     .cert_path("out/alice.crt")
//!     .key_path("out/alice.key")
//!     .build();
//!
//! let report = pipeline.run(&subject)?;
//! println!("issued serial {}", report.serial_number);
//! # Ok(())
//! # }
//! ```
//!
//! ## Issuing Without Touching Disk
//!
//! ```rust,no_run
//! use certissue::cert::params::SubjectDescriptor;
//! use certissue::issuer::{IssueOptions, Issuer};
//! use certissue::loader::load_ca;
//! use certissue::verify::verify;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let ca = load_ca("ca/intermediate.crt", "ca/intermediate.key", "correct horse")?;
//! let subject = SubjectDescriptor::builder()
//!     .common_name("bob")
//!     .validity_days(30)
//!     .cert_path("bob.crt")
//!     .key_path("bob.key")
//!     .build();
//!
//! let issued = ca.issue(&subject, IssueOptions::default())?;
//! verify(&issued.der, &ca.certificate)?;
//! println!("{}", issued.certificate()?.to_pem()?);
//! # Ok(())
//! # }
//! ```
//!
//! ## Logging
//!
//! The library never installs a subscriber. [`pipeline::Pipeline`] and
//! [`persist::persist`] emit [`tracing`] events under a span supplied by the caller; the
//! `certissue` binary sets up `tracing-subscriber`.

pub mod cert;
pub mod config;
pub mod directory;
pub mod error;
pub mod issuer;
pub mod key;
pub mod loader;
pub mod persist;
pub mod pipeline;
pub mod tbs_certificate;
pub mod verify;
