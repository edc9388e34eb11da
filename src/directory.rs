//! Identities to certify, as handed over by a directory service.
//!
//! Querying the directory itself happens elsewhere; this module only defines the record
//! shape and the seam a directory client plugs into.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::cert::params::SubjectDescriptor;
use crate::error::{DirectoryError, PersistError, Stage, SubjectError};

/// A user entry as read from the directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DirectoryUser {
    #[serde(default)]
    pub dn: String,
    pub cn: String,
    #[serde(default)]
    pub uid: String,
    #[serde(default)]
    pub mail: String,
    #[serde(default)]
    pub display_name: String,
}

impl DirectoryUser {
    /// Builds the issuance request for this user.
    ///
    /// Artifacts go to `<output_dir>/<cn>.crt` and `<output_dir>/<cn>.key`, with the common
    /// name reduced to filesystem-safe characters.
    pub fn to_subject(
        &self,
        key_size: usize,
        validity_days: i64,
        output_dir: &Path,
    ) -> SubjectDescriptor {
        let stem = file_stem(&self.cn);
        let email_addresses = match self.mail.trim() {
            "" => Vec::new(),
            mail => vec![mail.to_string()],
        };
        SubjectDescriptor::builder()
            .common_name(self.cn.clone())
            .email_addresses(email_addresses)
            .validity_days(validity_days)
            .key_size(key_size)
            .cert_path(output_dir.join(format!("{stem}.crt")))
            .key_path(output_dir.join(format!("{stem}.key")))
            .build()
    }
}

/// Keeps ASCII alphanumerics, `-`, `_` and `.`; everything else becomes `_`.
pub fn file_stem(common_name: &str) -> String {
    common_name
        .chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' | '.' => c,
            _ => '_',
        })
        .collect()
}

/// Maps `users` to issuance requests, in order.
///
/// Common names that reduce to the same file stem would overwrite each other's artifacts.
/// The first user keeps the stem; every later one gets an `OutputConflict` error instead.
pub fn plan_subjects(
    users: &[DirectoryUser],
    key_size: usize,
    validity_days: i64,
    output_dir: &Path,
) -> Vec<Result<SubjectDescriptor, SubjectError>> {
    let mut owners: HashMap<PathBuf, &str> = HashMap::new();
    users
        .iter()
        .map(|user| {
            let subject = user.to_subject(key_size, validity_days, output_dir);
            if let Some(owner) = owners.get(&subject.cert_path) {
                let conflict = PersistError::OutputConflict {
                    path: subject.cert_path.clone(),
                    owner: owner.to_string(),
                };
                return Err(SubjectError::new(&user.cn, Stage::Persist, conflict));
            }
            owners.insert(subject.cert_path.clone(), &user.cn);
            Ok(subject)
        })
        .collect()
}

/// Source of the users to certify.
pub trait Directory {
    /// Returns every matching user, in directory order.
    fn users(&self) -> Result<Vec<DirectoryUser>, DirectoryError>;
}

/// A directory backed by a fixed list, such as the `[[users]]` table of the configuration.
#[derive(Debug, Clone, Default)]
pub struct StaticDirectory {
    users: Vec<DirectoryUser>,
}

impl StaticDirectory {
    pub fn new(users: Vec<DirectoryUser>) -> Self {
        Self { users }
    }
}

impl Directory for StaticDirectory {
    fn users(&self) -> Result<Vec<DirectoryUser>, DirectoryError> {
        Ok(self.users.clone())
    }
}
