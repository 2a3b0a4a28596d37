//! Artifact integrity: SHA-256 manifest and Ed25519 signature checks.
//!
//! A `manifest.json` next to the artifacts binds each file name to its SHA-256
//! digest. `artifacts.sig` is an Ed25519 signature over the exact manifest
//! bytes. Both are produced by the `sign_artifacts` binary.
//!
//! Without a manifest the artifacts load unverified, unless signing is required.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Component, Path};

use base64::Engine;
use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::adapters::ArtifactError;

/// Manifest file name.
pub const MANIFEST_FILE: &str = "manifest.json";

/// Detached signature file name.
pub const SIGNATURE_FILE: &str = "artifacts.sig";

/// Supported manifest format version.
pub const MANIFEST_VERSION: u32 = 1;

/// Signed list of artifact digests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactManifest {
    pub version: u32,
    /// Unix timestamp (seconds) when the manifest was written
    #[serde(default)]
    pub created_at: Option<i64>,
    /// File name -> lowercase hex SHA-256
    pub files: BTreeMap<String, String>,
}

/// How far the artifacts were verified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verification {
    /// No manifest present
    Unverified,
    /// Manifest hashes matched, signature not checked
    HashesOnly,
    /// Manifest signature and hashes verified
    Signed,
}

#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

// Constant-time compare for ASCII strings (used for SHA-256 hex digests).
fn constant_time_eq_str(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff: u8 = 0;
    for (x, y) in a.as_bytes().iter().zip(b.as_bytes().iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

fn integrity(msg: impl Into<String>) -> ArtifactError {
    ArtifactError::Integrity(msg.into())
}

/// Decode a base64 Ed25519 public key.
///
/// # Errors
/// Returns `ArtifactError::Integrity` if the key is malformed.
pub fn verifying_key_from_b64(b64: &str) -> Result<VerifyingKey, ArtifactError> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(b64.trim())
        .map_err(|_| integrity("Invalid public key base64"))?;
    let pubkey: [u8; 32] = bytes
        .as_slice()
        .try_into()
        .map_err(|_| integrity("Invalid public key length (expected 32 bytes)"))?;
    VerifyingKey::from_bytes(&pubkey).map_err(|_| integrity("Invalid verifying key"))
}

fn read(path: &Path) -> Result<Vec<u8>, ArtifactError> {
    fs::read(path).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn verify_signature(
    dir: &Path,
    manifest_bytes: &[u8],
    key: &VerifyingKey,
) -> Result<(), ArtifactError> {
    let sig_path = dir.join(SIGNATURE_FILE);
    if !sig_path.exists() {
        return Err(integrity(format!(
            "{SIGNATURE_FILE} not found but a verifying key is configured"
        )));
    }

    let sig_bytes = read(&sig_path)?;
    let sig: [u8; 64] = sig_bytes
        .as_slice()
        .try_into()
        .map_err(|_| integrity("Invalid signature length (expected 64 bytes)"))?;

    key.verify(manifest_bytes, &Signature::from_bytes(&sig))
        .map_err(|_| integrity("Invalid manifest signature"))
}

/// Verify the artifacts in `dir` against the manifest, if there is one.
///
/// Every name in `required` must be bound by the manifest, and every file the
/// manifest lists must hash to its recorded digest.
///
/// # Errors
/// Returns `ArtifactError::Integrity` on any verification failure, and when
/// `require_signed` is set but no key, manifest or signature is available.
pub fn verify_artifacts(
    dir: &Path,
    required: &[&str],
    key: Option<&VerifyingKey>,
    require_signed: bool,
) -> Result<Verification, ArtifactError> {
    if require_signed && key.is_none() {
        return Err(integrity(
            "signed artifacts are required but no verifying key is configured",
        ));
    }

    let manifest_path = dir.join(MANIFEST_FILE);
    if !manifest_path.exists() {
        if key.is_some() {
            return Err(integrity(format!(
                "{MANIFEST_FILE} not found in {} but a verifying key is configured",
                dir.display()
            )));
        }
        tracing::warn!(
            dir = %dir.display(),
            "No {MANIFEST_FILE} found, loading artifacts unverified"
        );
        return Ok(Verification::Unverified);
    }

    let manifest_bytes = read(&manifest_path)?;

    let verification = match key {
        Some(key) => {
            verify_signature(dir, &manifest_bytes, key)?;
            Verification::Signed
        }
        None => {
            if dir.join(SIGNATURE_FILE).exists() {
                tracing::warn!(
                    "{SIGNATURE_FILE} present but no verifying key configured; checking hashes only"
                );
            }
            Verification::HashesOnly
        }
    };

    let manifest: ArtifactManifest = serde_json::from_slice(&manifest_bytes)
        .map_err(|e| integrity(format!("Invalid {MANIFEST_FILE} format: {e}")))?;
    if manifest.version != MANIFEST_VERSION {
        return Err(integrity(format!(
            "Unsupported manifest version: {}",
            manifest.version
        )));
    }

    if let Some(missing) = required.iter().find(|r| !manifest.files.contains_key(**r)) {
        return Err(integrity(format!("{MANIFEST_FILE} does not bind {missing}")));
    }

    for (rel, expected_hex) in &manifest.files {
        if !Path::new(rel)
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
        {
            return Err(integrity(format!(
                "{MANIFEST_FILE} entry {rel:?} must be a plain relative path"
            )));
        }

        let path = dir.join(rel);
        let bytes = fs::read(&path).map_err(|e| {
            integrity(format!(
                "Manifest references missing/unreadable file {}: {e}",
                path.display()
            ))
        })?;

        if !constant_time_eq_str(&sha256_hex(&bytes), &expected_hex.to_ascii_lowercase()) {
            return Err(integrity(format!("File hash mismatch for {rel}")));
        }
    }

    tracing::info!(?verification, "Artifact manifest verified");
    Ok(verification)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::{Signer, SigningKey};
    use tempfile::tempdir;

    const FILES: [&str; 2] = ["scaler.json", "heart_model.json"];

    fn write_files(dir: &Path) {
        fs::write(dir.join(FILES[0]), br#"{"scaler":true}"#).expect("write");
        fs::write(dir.join(FILES[1]), br#"{"model":true}"#).expect("write");
    }

    fn write_manifest(dir: &Path, names: &[&str]) -> Vec<u8> {
        let files = names
            .iter()
            .map(|n| {
                let bytes = fs::read(dir.join(n)).unwrap_or_default();
                ((*n).to_string(), sha256_hex(&bytes))
            })
            .collect();
        let manifest = ArtifactManifest {
            version: MANIFEST_VERSION,
            created_at: Some(1_700_000_000),
            files,
        };
        let bytes = serde_json::to_vec_pretty(&manifest).expect("serialize");
        fs::write(dir.join(MANIFEST_FILE), &bytes).expect("write manifest");
        bytes
    }

    fn sign(dir: &Path, manifest: &[u8], key: &SigningKey) {
        let sig: Signature = key.sign(manifest);
        fs::write(dir.join(SIGNATURE_FILE), sig.to_bytes()).expect("write sig");
    }

    #[test]
    fn test_no_manifest_loads_unverified() {
        let temp = tempdir().expect("tempdir");
        write_files(temp.path());
        let v = verify_artifacts(temp.path(), &FILES, None, false).expect("ok");
        assert_eq!(v, Verification::Unverified);
    }

    #[test]
    fn test_no_manifest_fails_when_signing_required() {
        let temp = tempdir().expect("tempdir");
        write_files(temp.path());
        let key = SigningKey::from_bytes(&[7u8; 32]).verifying_key();

        assert!(verify_artifacts(temp.path(), &FILES, None, true).is_err());
        assert!(verify_artifacts(temp.path(), &FILES, Some(&key), true).is_err());
        assert!(verify_artifacts(temp.path(), &FILES, Some(&key), false).is_err());
    }

    #[test]
    fn test_hash_only_manifest() {
        let temp = tempdir().expect("tempdir");
        write_files(temp.path());
        write_manifest(temp.path(), &FILES);

        let v = verify_artifacts(temp.path(), &FILES, None, false).expect("ok");
        assert_eq!(v, Verification::HashesOnly);
    }

    #[test]
    fn test_tampered_file_is_rejected() {
        let temp = tempdir().expect("tempdir");
        write_files(temp.path());
        write_manifest(temp.path(), &FILES);
        fs::write(temp.path().join(FILES[1]), br#"{"model":false}"#).expect("write");

        let err = verify_artifacts(temp.path(), &FILES, None, false).expect_err("must fail");
        assert!(err.to_string().contains("hash mismatch"));
    }

    #[test]
    fn test_manifest_must_bind_required_files() {
        let temp = tempdir().expect("tempdir");
        write_files(temp.path());
        write_manifest(temp.path(), &FILES[..1]);

        let err = verify_artifacts(temp.path(), &FILES, None, false).expect_err("must fail");
        assert!(err.to_string().contains("does not bind"));
    }

    #[test]
    fn test_manifest_referencing_missing_file_fails() {
        let temp = tempdir().expect("tempdir");
        write_files(temp.path());
        write_manifest(temp.path(), &["scaler.json", "heart_model.json", "extra.json"]);

        let err = verify_artifacts(temp.path(), &FILES, None, false).expect_err("must fail");
        let msg = err.to_string();
        assert!(msg.contains("missing") || msg.contains("unreadable"));
    }

    #[test]
    fn test_signed_manifest_verifies() {
        let temp = tempdir().expect("tempdir");
        write_files(temp.path());
        let manifest = write_manifest(temp.path(), &FILES);
        let signing_key = SigningKey::from_bytes(&[42u8; 32]);
        sign(temp.path(), &manifest, &signing_key);

        let key = signing_key.verifying_key();
        let v = verify_artifacts(temp.path(), &FILES, Some(&key), true).expect("ok");
        assert_eq!(v, Verification::Signed);
    }

    #[test]
    fn test_signature_from_other_key_is_rejected() {
        let temp = tempdir().expect("tempdir");
        write_files(temp.path());
        let manifest = write_manifest(temp.path(), &FILES);
        sign(temp.path(), &manifest, &SigningKey::from_bytes(&[1u8; 32]));

        let other = SigningKey::from_bytes(&[2u8; 32]).verifying_key();
        let err = verify_artifacts(temp.path(), &FILES, Some(&other), false).expect_err("must fail");
        assert!(err.to_string().contains("Invalid manifest signature"));
    }

    #[test]
    fn test_verifying_key_from_b64() {
        let key = SigningKey::from_bytes(&[9u8; 32]).verifying_key();
        let b64 = base64::engine::general_purpose::STANDARD.encode(key.to_bytes());
        assert_eq!(verifying_key_from_b64(&b64).expect("decode"), key);
        assert!(verifying_key_from_b64("not base64!").is_err());
        assert!(verifying_key_from_b64("AAAA").is_err());
    }
}
