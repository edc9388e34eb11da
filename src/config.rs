use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::directory::DirectoryUser;
use crate::error::ConfigError;
use crate::issuer::{DnsNamePolicy, IssueOptions};
use crate::key::IssuedKeyEncoding;

/// Smallest RSA modulus accepted for issued keys.
pub const MIN_KEY_SIZE: usize = 2048;
/// Largest RSA modulus accepted for issued keys.
pub const MAX_KEY_SIZE: usize = 16384;
/// Longest lifetime accepted for issued certificates.
pub const MAX_VALIDITY_DAYS: i64 = 36_500;

/// Passphrase of the CA key. Redacted in `Debug` output.
#[derive(Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct Passphrase(String);

impl Passphrase {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Passphrase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Passphrase(<redacted>)")
    }
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(default)]
    debug: bool,
    ca_cert_path: Option<PathBuf>,
    ca_key_path: Option<PathBuf>,
    ca_key_passphrase: Option<Passphrase>,
    cert_key_size: Option<usize>,
    cert_validity_days: Option<i64>,
    output_dir: Option<PathBuf>,
    #[serde(default)]
    inherit_ca_dns_names: bool,
    #[serde(default)]
    issued_key_encoding: IssuedKeyEncoding,
    #[serde(default)]
    users: Vec<DirectoryUser>,
}

/// Validated settings for one issuance run.
#[derive(Debug, Clone)]
pub struct Config {
    pub debug: bool,
    pub ca_cert_path: PathBuf,
    pub ca_key_path: PathBuf,
    pub ca_key_passphrase: Passphrase,
    pub cert_key_size: usize,
    pub cert_validity_days: i64,
    pub output_dir: PathBuf,
    pub inherit_ca_dns_names: bool,
    pub issued_key_encoding: IssuedKeyEncoding,
    pub users: Vec<DirectoryUser>,
}

impl Config {
    /// Reads and validates the TOML file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let metadata = std::fs::metadata(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if !metadata.is_file() {
            return Err(ConfigError::Invalid {
                field: "config",
                reason: format!("'{}' is not a regular file", path.display()),
            });
        }
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Parses and validates configuration text. Touches no files.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = toml::from_str(text)?;

        let ca_cert_path = required_path(raw.ca_cert_path, "ca_cert_path")?;
        let ca_key_path = required_path(raw.ca_key_path, "ca_key_path")?;
        let output_dir = required_path(raw.output_dir, "output_dir")?;

        let ca_key_passphrase = raw
            .ca_key_passphrase
            .ok_or(ConfigError::Missing("ca_key_passphrase"))?;
        if ca_key_passphrase.expose().is_empty() {
            return Err(ConfigError::Missing("ca_key_passphrase"));
        }

        let cert_key_size = raw
            .cert_key_size
            .ok_or(ConfigError::Missing("cert_key_size"))?;
        if !(MIN_KEY_SIZE..=MAX_KEY_SIZE).contains(&cert_key_size) {
            return Err(ConfigError::Invalid {
                field: "cert_key_size",
                reason: format!("{cert_key_size} is outside {MIN_KEY_SIZE}..={MAX_KEY_SIZE}"),
            });
        }

        let cert_validity_days = raw
            .cert_validity_days
            .ok_or(ConfigError::Missing("cert_validity_days"))?;
        if !(1..=MAX_VALIDITY_DAYS).contains(&cert_validity_days) {
            return Err(ConfigError::Invalid {
                field: "cert_validity_days",
                reason: format!("{cert_validity_days} is outside 1..={MAX_VALIDITY_DAYS} days"),
            });
        }

        Ok(Self {
            debug: raw.debug,
            ca_cert_path,
            ca_key_path,
            ca_key_passphrase,
            cert_key_size,
            cert_validity_days,
            output_dir,
            inherit_ca_dns_names: raw.inherit_ca_dns_names,
            issued_key_encoding: raw.issued_key_encoding,
            users: raw.users,
        })
    }

    pub fn issue_options(&self) -> IssueOptions {
        IssueOptions {
            dns_names: if self.inherit_ca_dns_names {
                DnsNamePolicy::InheritFromCa
            } else {
                DnsNamePolicy::Omit
            },
        }
    }

    /// Creates the output directory (mode `0700`) if it does not exist yet.
    pub fn prepare_output_dir(&self) -> Result<(), ConfigError> {
        let path = &self.output_dir;
        match std::fs::metadata(path) {
            Ok(metadata) if metadata.is_dir() => Ok(()),
            Ok(_) => Err(ConfigError::Invalid {
                field: "output_dir",
                reason: format!("'{}' is not a directory", path.display()),
            }),
            Err(_) => create_private_dir(path).map_err(|source| ConfigError::Io {
                path: path.clone(),
                source,
            }),
        }
    }
}

fn required_path(value: Option<PathBuf>, field: &'static str) -> Result<PathBuf, ConfigError> {
    match value {
        Some(path) if !path.as_os_str().is_empty() => Ok(path),
        _ => Err(ConfigError::Missing(field)),
    }
}

#[cfg(unix)]
fn create_private_dir(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;

    std::fs::DirBuilder::new()
        .recursive(true)
        .mode(0o700)
        .create(path)
}

#[cfg(not(unix))]
fn create_private_dir(path: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"
        debug = true
        ca_cert_path = "ca/intermediate.crt"
        ca_key_path = "ca/intermediate.key"
        ca_key_passphrase = "s3cret"
        cert_key_size = 3072
        cert_validity_days = 365
        output_dir = "out"

        [[users]]
        cn = "alice"
        mail = "alice@example.org"

        [[users]]
        cn = "bob"
    "#;

    #[test]
    fn test_valid_config() {
        let config = Config::from_toml_str(VALID).unwrap();
        assert!(config.debug);
        assert_eq!(config.cert_key_size, 3072);
        assert_eq!(config.cert_validity_days, 365);
        assert_eq!(config.ca_key_passphrase.expose(), "s3cret");
        assert_eq!(config.issued_key_encoding, IssuedKeyEncoding::Pkcs1);
        assert_eq!(config.issue_options().dns_names, DnsNamePolicy::Omit);
        assert_eq!(config.users.len(), 2);
        assert_eq!(config.users[1].mail, "");
    }

    #[test]
    fn test_debug_output_redacts_passphrase() {
        let config = Config::from_toml_str(VALID).unwrap();
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("s3cret"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_missing_setting() {
        let text = VALID.replace("ca_key_path = \"ca/intermediate.key\"", "");
        let err = Config::from_toml_str(&text).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("ca_key_path")));
    }

    #[test]
    fn test_empty_passphrase_is_missing() {
        let text = VALID.replace("\"s3cret\"", "\"\"");
        let err = Config::from_toml_str(&text).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("ca_key_passphrase")));
    }

    #[test]
    fn test_invalid_values() {
        let text = VALID.replace("cert_validity_days = 365", "cert_validity_days = 0");
        assert!(matches!(
            Config::from_toml_str(&text).unwrap_err(),
            ConfigError::Invalid {
                field: "cert_validity_days",
                ..
            }
        ));

        let text = VALID.replace(
            "cert_validity_days = 365",
            "cert_validity_days = 9223372036854775807",
        );
        assert!(matches!(
            Config::from_toml_str(&text).unwrap_err(),
            ConfigError::Invalid {
                field: "cert_validity_days",
                ..
            }
        ));

        let text = VALID.replace("cert_key_size = 3072", "cert_key_size = 512");
        assert!(matches!(
            Config::from_toml_str(&text).unwrap_err(),
            ConfigError::Invalid {
                field: "cert_key_size",
                ..
            }
        ));
    }

    #[test]
    fn test_optional_switches() {
        let text = format!(
            "inherit_ca_dns_names = true\nissued_key_encoding = \"pkcs8\"\n{VALID}"
        );
        let config = Config::from_toml_str(&text).unwrap();
        assert_eq!(config.issue_options().dns_names, DnsNamePolicy::InheritFromCa);
        assert_eq!(config.issued_key_encoding, IssuedKeyEncoding::Pkcs8);
    }

    #[test]
    fn test_load_rejects_directory() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "config", .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_prepare_output_dir_creates_private_directory() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::from_toml_str(VALID).unwrap();
        config.output_dir = dir.path().join("issued").join("users");
        config.prepare_output_dir().unwrap();
        let mode = std::fs::metadata(&config.output_dir)
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o700);

        // A second call is a no-op.
        config.prepare_output_dir().unwrap();
    }

    #[test]
    fn test_prepare_output_dir_rejects_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let mut config = Config::from_toml_str(VALID).unwrap();
        config.output_dir = file.path().to_path_buf();
        assert!(matches!(
            config.prepare_output_dir().unwrap_err(),
            ConfigError::Invalid {
                field: "output_dir",
                ..
            }
        ));
    }
}
