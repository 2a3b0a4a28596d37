//! Runtime configuration read from `HEARTCHECK_*` environment variables.
//!
//! | Variable | Default |
//! |---|---|
//! | `HEARTCHECK_ARTIFACT_DIR` | `.` (working directory) |
//! | `HEARTCHECK_LOG_MODE` | `auto` (`file` on a TTY, else `stdout`) |
//! | `HEARTCHECK_LOG_FILE` | `heartcheck.log` |
//! | `HEARTCHECK_ARTIFACT_PUBKEY_B64` | unset |
//! | `HEARTCHECK_ARTIFACT_PUBKEY_B64_FILE` | unset |
//! | `HEARTCHECK_REQUIRE_SIGNED_ARTIFACTS` | `false` |

use std::path::PathBuf;

use ed25519_dalek::VerifyingKey;

use crate::adapters::integrity::verifying_key_from_b64;
use crate::adapters::sklearn::ArtifactLoader;
use crate::HeartcheckError;

pub const ARTIFACT_DIR_ENV: &str = "HEARTCHECK_ARTIFACT_DIR";
pub const LOG_MODE_ENV: &str = "HEARTCHECK_LOG_MODE";
pub const LOG_FILE_ENV: &str = "HEARTCHECK_LOG_FILE";
pub const PUBKEY_B64_ENV: &str = "HEARTCHECK_ARTIFACT_PUBKEY_B64";
pub const PUBKEY_B64_FILE_ENV: &str = "HEARTCHECK_ARTIFACT_PUBKEY_B64_FILE";
pub const REQUIRE_SIGNED_ENV: &str = "HEARTCHECK_REQUIRE_SIGNED_ARTIFACTS";

/// Where log output goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogMode {
    /// File when stdout is a terminal (the TUI owns it), stdout otherwise
    #[default]
    Auto,
    File,
    Stdout,
}

impl LogMode {
    fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "file" => Self::File,
            "stdout" => Self::Stdout,
            _ => Self::Auto,
        }
    }

    /// Resolve `Auto` against whether stdout is interactive.
    #[must_use]
    pub fn use_file(self, interactive: bool) -> bool {
        match self {
            Self::File => true,
            Self::Stdout => false,
            Self::Auto => interactive,
        }
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(value.trim(), "1" | "true" | "TRUE" | "yes" | "YES")
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub artifact_dir: PathBuf,
    pub log_mode: LogMode,
    pub log_file: PathBuf,
    /// Base64 Ed25519 public key for the artifact manifest
    pub artifact_pubkey_b64: Option<String>,
    pub require_signed_artifacts: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            artifact_dir: PathBuf::from("."),
            log_mode: LogMode::Auto,
            log_file: PathBuf::from("heartcheck.log"),
            artifact_pubkey_b64: None,
            require_signed_artifacts: false,
        }
    }
}

impl AppConfig {
    /// Read configuration from the process environment.
    ///
    /// # Errors
    /// Returns `Config` if the public key file cannot be read.
    pub fn from_env() -> Result<Self, HeartcheckError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    /// Returns `Config` if the public key file cannot be read.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, HeartcheckError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let non_blank = |v: String| {
            let v = v.trim().to_string();
            (!v.is_empty()).then_some(v)
        };

        // A blank inline key counts as unset, so the file variable still applies.
        let artifact_pubkey_b64 = match lookup(PUBKEY_B64_ENV).and_then(non_blank) {
            Some(v) => Some(v),
            None => match lookup(PUBKEY_B64_FILE_ENV).and_then(non_blank) {
                Some(path) => non_blank(std::fs::read_to_string(&path).map_err(|e| {
                    HeartcheckError::Config(format!("Failed to read {PUBKEY_B64_FILE_ENV}: {e}"))
                })?),
                None => None,
            },
        };

        Ok(Self {
            artifact_dir: lookup(ARTIFACT_DIR_ENV)
                .map(PathBuf::from)
                .unwrap_or(defaults.artifact_dir),
            log_mode: lookup(LOG_MODE_ENV)
                .map(|v| LogMode::parse(&v))
                .unwrap_or(defaults.log_mode),
            log_file: lookup(LOG_FILE_ENV)
                .map(PathBuf::from)
                .unwrap_or(defaults.log_file),
            artifact_pubkey_b64,
            require_signed_artifacts: lookup(REQUIRE_SIGNED_ENV)
                .map(|v| parse_bool(&v))
                .unwrap_or(defaults.require_signed_artifacts),
        })
    }

    /// Decode the configured verifying key, if any.
    ///
    /// # Errors
    /// Returns `Artifact` if the key is not a valid base64 Ed25519 key.
    pub fn verifying_key(&self) -> Result<Option<VerifyingKey>, HeartcheckError> {
        self.artifact_pubkey_b64
            .as_deref()
            .map(verifying_key_from_b64)
            .transpose()
            .map_err(HeartcheckError::from)
    }

    /// Artifact loader configured from these settings.
    ///
    /// # Errors
    /// Returns error if the verifying key is malformed.
    pub fn artifact_loader(&self) -> Result<ArtifactLoader, HeartcheckError> {
        Ok(ArtifactLoader::new(&self.artifact_dir)
            .with_verifying_key(self.verifying_key()?)
            .require_signed(self.require_signed_artifacts))
    }
}
