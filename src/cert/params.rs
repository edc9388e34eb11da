use std::path::PathBuf;

use bon::Builder;
use const_oid::ObjectIdentifier;
use der::asn1::SetOfVec;
use der::{Any, Tag, Tagged};
use time::{Duration, OffsetDateTime};
use x509_cert::attr::AttributeTypeAndValue;
use x509_cert::name::{Name, RelativeDistinguishedName};

use super::extensions::ToAndFromX509Extension;
use crate::error::IssueError;

/// Common name (CN).
pub const COMMON_NAME: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.3");
/// Country (C).
pub const COUNTRY: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.6");
/// Locality (L).
pub const LOCALITY: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.7");
/// State or province (ST).
pub const PROVINCE: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.8");
/// Street address (STREET).
pub const STREET_ADDRESS: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.9");
/// Organization (O).
pub const ORGANIZATION: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.10");
/// Organizational unit (OU).
pub const ORGANIZATIONAL_UNIT: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.11");
/// Postal code.
pub const POSTAL_CODE: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.17");

/// Attributes a leaf certificate inherits from its CA, in the order they are written.
pub const INHERITED_ATTRIBUTES: [ObjectIdentifier; 7] = [
    COUNTRY,
    ORGANIZATION,
    ORGANIZATIONAL_UNIT,
    LOCALITY,
    PROVINCE,
    STREET_ADDRESS,
    POSTAL_CODE,
];

/// Identity to certify, as supplied by the directory.
///
/// # Fields
/// * `common_name` - The subject common name (CN); must not be empty.
/// * `email_addresses` - RFC 822 names placed in the subject alternative name extension.
/// * `validity_days` - Lifetime of the certificate; must be positive.
/// * `key_size` - RSA modulus size in bits for the generated key.
/// * `cert_path` / `key_path` - Where the PEM artifacts are written.
#[derive(Clone, Debug, Builder, PartialEq, Eq)]
pub struct SubjectDescriptor {
    #[builder(into)]
    pub common_name: String,
    #[builder(default)]
    pub email_addresses: Vec<String>,
    pub validity_days: i64,
    #[builder(default = 2048)]
    pub key_size: usize,
    #[builder(into)]
    pub cert_path: PathBuf,
    #[builder(into)]
    pub key_path: PathBuf,
}

/// Readable view of an X.509 name, grouped by attribute type.
///
/// Every attribute keeps all its values in encoding order; multi-valued names are common
/// for organizational units.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DistinguishedName {
    pub common_name: Option<String>,
    pub country: Vec<String>,
    pub organization: Vec<String>,
    pub organizational_unit: Vec<String>,
    pub locality: Vec<String>,
    pub province: Vec<String>,
    pub street_address: Vec<String>,
    pub postal_code: Vec<String>,
}

impl DistinguishedName {
    /// Creates a `DistinguishedName` from an X.509 name.
    ///
    /// Attributes with non-string values or types outside this view are skipped.
    pub fn from_x509_name(name: &Name) -> Self {
        let mut dn = DistinguishedName::default();
        for atv in name.0.iter().flat_map(|rdn| rdn.0.iter()) {
            let Some(value) = attribute_string(&atv.value) else {
                continue;
            };
            match atv.oid {
                COMMON_NAME => dn.common_name = Some(value),
                COUNTRY => dn.country.push(value),
                ORGANIZATION => dn.organization.push(value),
                ORGANIZATIONAL_UNIT => dn.organizational_unit.push(value),
                LOCALITY => dn.locality.push(value),
                PROVINCE => dn.province.push(value),
                STREET_ADDRESS => dn.street_address.push(value),
                POSTAL_CODE => dn.postal_code.push(value),
                _ => {}
            }
        }
        dn
    }
}

/// Decode a directory string value. PrintableString and IA5String are ASCII subsets of UTF-8.
fn attribute_string(value: &Any) -> Option<String> {
    match value.tag() {
        Tag::Utf8String | Tag::PrintableString | Tag::Ia5String | Tag::TeletexString => {
            std::str::from_utf8(value.value()).ok().map(str::to_string)
        }
        _ => None,
    }
}

/// Builds a leaf subject: the CA's organizational attributes copied verbatim, one per RDN
/// and grouped by type, followed by the common name as a UTF8String.
pub fn leaf_subject(ca_subject: &Name, common_name: &str) -> Result<Name, IssueError> {
    let mut rdns = Vec::new();
    for oid in INHERITED_ATTRIBUTES {
        for atv in ca_subject.0.iter().flat_map(|rdn| rdn.0.iter()) {
            if atv.oid == oid {
                rdns.push(single_attribute_rdn(atv.clone())?);
            }
        }
    }

    let cn = AttributeTypeAndValue {
        oid: COMMON_NAME,
        value: Any::encode_from(&der::asn1::Utf8StringRef::new(common_name)?)?,
    };
    rdns.push(single_attribute_rdn(cn)?);

    Ok(x509_cert::name::RdnSequence(rdns))
}

fn single_attribute_rdn(atv: AttributeTypeAndValue) -> Result<RelativeDistinguishedName, IssueError> {
    let set = SetOfVec::try_from(vec![atv])?;
    Ok(RelativeDistinguishedName(set))
}

/// Certificate validity period.
///
/// This struct represents the `notBefore` and `notAfter` fields in a certificate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Validity {
    pub not_before: OffsetDateTime,
    pub not_after: OffsetDateTime,
}

impl Validity {
    /// Creates a validity period starting at `now` for the given number of days.
    ///
    /// `now` is truncated to whole seconds, the resolution of certificate timestamps.
    pub fn starting_at(now: OffsetDateTime, days: i64) -> Result<Self, IssueError> {
        if days <= 0 {
            return Err(IssueError::InvalidValidity(days));
        }
        let not_before = now
            .replace_nanosecond(0)
            .map_err(|e| IssueError::Encoding(e.to_string()))?;
        let not_after = days
            .checked_mul(86_400)
            .map(Duration::seconds)
            .and_then(|lifetime| not_before.checked_add(lifetime))
            .ok_or(IssueError::InvalidValidity(days))?;
        Ok(Self {
            not_before,
            not_after,
        })
    }

    /// Creates a validity period starting now for the given number of days.
    pub fn for_days(days: i64) -> Result<Self, IssueError> {
        Self::starting_at(OffsetDateTime::now_utc(), days)
    }
}

/// Represents an X.509 extension.
///
/// This struct contains the OID, criticality, and value of an extension.
///
/// # Fields
/// * `oid` - The object identifier of the extension.
/// * `critical` - Indicates if the extension is critical.
/// * `value` - The DER-encoded value of the extension.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtensionParam {
    pub oid: ObjectIdentifier,
    pub critical: bool,
    /// DER-encoded extension value
    pub value: Vec<u8>,
}

impl ExtensionParam {
    /// Creates an `ExtensionParam` from a specific extension.
    pub fn from_extension<E: ToAndFromX509Extension>(
        extension: E,
        critical: bool,
    ) -> Result<Self, IssueError> {
        Ok(Self {
            oid: E::OID,
            critical,
            value: extension.to_x509_extension_value()?,
        })
    }

    /// Decodes an `ExtensionParam` into a specific extension.
    pub fn to_extension<E: ToAndFromX509Extension>(&self) -> Result<E, IssueError> {
        E::from_x509_extension_value(&self.value)
    }
}
