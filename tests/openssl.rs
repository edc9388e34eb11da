mod util;

use certissue::issuer::{DnsNamePolicy, IssueOptions, Issuer};
use certissue::key::IssuedKeyEncoding;
use certissue::loader::load_ca;
use certissue::pipeline::Pipeline;
use openssl::nid::Nid;
use openssl::pkey::PKey;
use openssl::stack::Stack;
use openssl::x509::store::X509StoreBuilder;
use openssl::x509::{X509, X509StoreContext, X509VerifyResult};
use tracing::Span;

#[test]
fn test_openssl_validate_issued_cert() {
    let fixture = util::ca_fixture();
    let ca = load_ca(&fixture.cert_path, &fixture.key_path, util::PASSPHRASE).unwrap();

    let mut subject = fixture.subject("alice");
    subject.email_addresses = vec!["alice@example.org".to_string()];
    let issued = ca.issue(&subject, IssueOptions::default()).unwrap();

    let leaf = X509::from_der(&issued.der).unwrap();
    assert!(leaf.verify(&fixture.key).unwrap());
    assert_eq!(fixture.cert.issued(&leaf), X509VerifyResult::OK);

    let cn = leaf
        .subject_name()
        .entries_by_nid(Nid::COMMONNAME)
        .next()
        .unwrap()
        .data()
        .as_utf8()
        .unwrap()
        .to_string();
    assert_eq!(cn, "alice");

    let emails: Vec<String> = leaf
        .subject_alt_names()
        .unwrap()
        .iter()
        .filter_map(|name| name.email().map(str::to_string))
        .collect();
    assert_eq!(emails, vec!["alice@example.org"]);
    assert_eq!(
        leaf.issuer_name().to_der().unwrap(),
        fixture.cert.subject_name().to_der().unwrap()
    );
}

#[test]
fn test_openssl_chain_verification() {
    let fixture = util::ca_fixture();
    let ca = load_ca(&fixture.cert_path, &fixture.key_path, util::PASSPHRASE).unwrap();
    let options = IssueOptions {
        dns_names: DnsNamePolicy::InheritFromCa,
    };
    let issued = ca.issue(&fixture.subject("bob"), options).unwrap();
    let leaf = X509::from_der(&issued.der).unwrap();

    let dns: Vec<String> = leaf
        .subject_alt_names()
        .unwrap()
        .iter()
        .filter_map(|name| name.dnsname().map(str::to_string))
        .collect();
    assert_eq!(dns, util::CA_DNS_NAMES);

    let mut store = X509StoreBuilder::new().unwrap();
    store.add_cert(fixture.cert.clone()).unwrap();
    let store = store.build();
    let chain: Stack<X509> = Stack::new().unwrap();
    let mut ctx = X509StoreContext::new().unwrap();
    let valid = ctx
        .init(&store, &leaf, &chain, |c| {
            let ok = c.verify_cert()?;
            if !ok {
                eprintln!("openssl verify error: {}", c.error());
            }
            Ok(ok)
        })
        .unwrap();
    assert!(valid);
}

#[test]
fn test_openssl_reads_persisted_key() {
    let fixture = util::ca_fixture();
    let ca = load_ca(&fixture.cert_path, &fixture.key_path, util::PASSPHRASE).unwrap();

    for (cn, encoding) in [
        ("carol", IssuedKeyEncoding::Pkcs1),
        ("dave", IssuedKeyEncoding::Pkcs8),
    ] {
        let pipeline = Pipeline::new(&ca, Span::none()).with_key_encoding(encoding);
        let subject = fixture.subject(cn);
        pipeline.run(&subject).unwrap();

        let cert = X509::from_pem(&std::fs::read(&subject.cert_path).unwrap()).unwrap();
        let key = PKey::private_key_from_pem(&std::fs::read(&subject.key_path).unwrap()).unwrap();
        assert!(cert.public_key().unwrap().public_eq(&key));
        assert_eq!(key.bits(), 2048);
        assert!(cert.verify(&fixture.key).unwrap());
    }
}
