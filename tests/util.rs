#![allow(dead_code)]

use std::path::PathBuf;

use certissue::cert::params::SubjectDescriptor;
use openssl::asn1::Asn1Time;
use openssl::bn::BigNum;
use openssl::ec::{EcGroup, EcKey};
use openssl::hash::MessageDigest;
use openssl::nid::Nid;
use openssl::pkey::{PKey, Private};
use openssl::rsa::Rsa;
use openssl::symm::Cipher;
use openssl::x509::extension::{
    BasicConstraints, KeyUsage, SubjectAlternativeName, SubjectKeyIdentifier,
};
use openssl::x509::{X509, X509NameBuilder};
use rand_core::{CryptoRng, RngCore};
use tempfile::TempDir;

pub const PASSPHRASE: &str = "correct horse battery staple";
pub const CA_COMMON_NAME: &str = "Example Intermediate CA";
pub const CA_DNS_NAMES: [&str; 2] = ["ca.example.org", "example.org"];

/// A CA written to a temporary directory, together with the openssl objects it came from.
pub struct CaFixture {
    pub dir: TempDir,
    pub cert_path: PathBuf,
    pub key_path: PathBuf,
    pub cert: X509,
    pub key: PKey<Private>,
}

impl CaFixture {
    pub fn write(&self, name: &str, contents: &[u8]) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    pub fn subject(&self, common_name: &str) -> SubjectDescriptor {
        SubjectDescriptor::builder()
            .common_name(common_name)
            .validity_days(365)
            .key_size(2048)
            .cert_path(self.dir.path().join(format!("{common_name}.crt")))
            .key_path(self.dir.path().join(format!("{common_name}.key")))
            .build()
    }
}

pub fn generate_rsa_key() -> PKey<Private> {
    PKey::from_rsa(Rsa::generate(2048).unwrap()).unwrap()
}

/// Self-signed RSA CA with a full organizational subject and two DNS names.
pub fn generate_ca_cert(key: &PKey<Private>) -> X509 {
    let mut name = X509NameBuilder::new().unwrap();
    name.append_entry_by_nid(Nid::COUNTRYNAME, "DE").unwrap();
    name.append_entry_by_nid(Nid::STATEORPROVINCENAME, "Berlin")
        .unwrap();
    name.append_entry_by_nid(Nid::LOCALITYNAME, "Berlin").unwrap();
    name.append_entry_by_text("street", "Example Street 1")
        .unwrap();
    name.append_entry_by_text("postalCode", "10115").unwrap();
    name.append_entry_by_nid(Nid::ORGANIZATIONNAME, "Example Org")
        .unwrap();
    name.append_entry_by_nid(Nid::ORGANIZATIONALUNITNAME, "People")
        .unwrap();
    name.append_entry_by_nid(Nid::COMMONNAME, CA_COMMON_NAME)
        .unwrap();
    let name = name.build();

    let mut builder = X509::builder().unwrap();
    builder.set_version(2).unwrap();
    let serial = BigNum::from_u32(1).unwrap().to_asn1_integer().unwrap();
    builder.set_serial_number(&serial).unwrap();
    builder.set_subject_name(&name).unwrap();
    builder.set_issuer_name(&name).unwrap();
    builder.set_pubkey(key).unwrap();
    builder
        .set_not_before(&Asn1Time::days_from_now(0).unwrap())
        .unwrap();
    builder
        .set_not_after(&Asn1Time::days_from_now(3650).unwrap())
        .unwrap();

    builder
        .append_extension(BasicConstraints::new().critical().ca().build().unwrap())
        .unwrap();
    builder
        .append_extension(
            KeyUsage::new()
                .critical()
                .key_cert_sign()
                .crl_sign()
                .build()
                .unwrap(),
        )
        .unwrap();
    let ski = SubjectKeyIdentifier::new()
        .build(&builder.x509v3_context(None, None))
        .unwrap();
    builder.append_extension(ski).unwrap();
    let mut san = SubjectAlternativeName::new();
    for dns in CA_DNS_NAMES {
        san.dns(dns);
    }
    let san = san.build(&builder.x509v3_context(None, None)).unwrap();
    builder.append_extension(san).unwrap();

    builder.sign(key, MessageDigest::sha256()).unwrap();
    builder.build()
}

pub fn encrypted_pkcs8_pem(key: &PKey<Private>, passphrase: &str) -> Vec<u8> {
    key.private_key_to_pem_pkcs8_passphrase(Cipher::aes_256_cbc(), passphrase.as_bytes())
        .unwrap()
}

pub fn pkcs1_pem(key: &PKey<Private>) -> Vec<u8> {
    key.rsa().unwrap().private_key_to_pem().unwrap()
}

pub fn generate_ec_key() -> PKey<Private> {
    let group = EcGroup::from_curve_name(Nid::X9_62_PRIME256V1).unwrap();
    PKey::from_ec_key(EcKey::generate(&group).unwrap()).unwrap()
}

/// Writes a fresh CA certificate and its encrypted PKCS#8 key to a new temporary directory.
pub fn ca_fixture() -> CaFixture {
    let key = generate_rsa_key();
    let cert = generate_ca_cert(&key);
    let dir = tempfile::tempdir().unwrap();
    let cert_path = dir.path().join("ca.crt");
    let key_path = dir.path().join("ca.key");
    std::fs::write(&cert_path, cert.to_pem().unwrap()).unwrap();
    std::fs::write(&key_path, encrypted_pkcs8_pem(&key, PASSPHRASE)).unwrap();
    CaFixture {
        dir,
        cert_path,
        key_path,
        cert,
        key,
    }
}

/// Wraps the OS random source and counts how often it is drawn from.
#[derive(Default)]
pub struct CountingRng {
    pub calls: usize,
}

impl RngCore for CountingRng {
    fn next_u32(&mut self) -> u32 {
        self.calls += 1;
        rand_core::OsRng.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.calls += 1;
        rand_core::OsRng.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.calls += 1;
        rand_core::OsRng.fill_bytes(dest)
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand_core::Error> {
        self.calls += 1;
        rand_core::OsRng.try_fill_bytes(dest)
    }
}

impl CryptoRng for CountingRng {}
