//! Artifact signing utility for heartcheck.
//!
//! Writes a `manifest.json` binding `scaler.json` and `heart_model.json` to
//! their SHA-256 digests, plus an Ed25519 signature over it (`artifacts.sig`).
//!
//! # Usage
//!
//! ```bash
//! sign_artifacts --generate-key <seed_file>
//! HEARTCHECK_SIGNING_KEY_B64_FILE=<seed_file> sign_artifacts <artifact_dir>
//! ```
//!
//! The printed public key goes into `HEARTCHECK_ARTIFACT_PUBKEY_B64`.

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::io::Write;
#[cfg(unix)]
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{bail, Context, Result};
use base64::engine::general_purpose;
use base64::Engine;
use ed25519_dalek::{Signer, SigningKey};
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use heartcheck::adapters::integrity::{
    sha256_hex, ArtifactManifest, MANIFEST_FILE, MANIFEST_VERSION, SIGNATURE_FILE,
};
use heartcheck::adapters::sklearn::{MODEL_FILE, SCALER_FILE};

const KEY_FILE_ENV: &str = "HEARTCHECK_SIGNING_KEY_B64_FILE";

const USAGE: &str =
    "Usage: sign_artifacts --generate-key <seed_file> | sign_artifacts <artifact_dir>";

#[derive(Zeroize, ZeroizeOnDrop)]
struct Seed([u8; 32]);

enum Command {
    GenerateKey(PathBuf),
    Sign(PathBuf),
}

fn parse_args() -> Result<Command> {
    let args: Vec<String> = env::args().skip(1).collect();
    match args.as_slice() {
        [flag, path] if flag == "--generate-key" => Ok(Command::GenerateKey(PathBuf::from(path))),
        [dir] if !dir.starts_with('-') => Ok(Command::Sign(PathBuf::from(dir))),
        _ => bail!(USAGE),
    }
}

fn pubkey_b64(key: &SigningKey) -> String {
    general_purpose::STANDARD.encode(key.verifying_key().as_bytes())
}

fn generate_key(out: &Path) -> Result<()> {
    if out.exists() {
        bail!("Refusing to overwrite existing file {out:?}");
    }

    let mut seed = Seed([0u8; 32]);
    OsRng.fill_bytes(&mut seed.0);
    let signing_key = SigningKey::from_bytes(&seed.0);
    let seed_b64 = Zeroizing::new(general_purpose::STANDARD.encode(seed.0));

    let mut opts = fs::OpenOptions::new();
    opts.write(true).create_new(true);
    #[cfg(unix)]
    {
        opts.mode(0o600);
    }
    let mut file = opts
        .open(out)
        .with_context(|| format!("Failed to open {out:?}"))?;
    file.write_all(seed_b64.as_bytes())?;
    file.write_all(b"\n")?;

    println!("Wrote signing seed (base64) to {out:?}");
    println!("HEARTCHECK_ARTIFACT_PUBKEY_B64={}", pubkey_b64(&signing_key));
    Ok(())
}

fn read_signing_seed() -> Result<Seed> {
    let path = env::var(KEY_FILE_ENV).with_context(|| format!("{KEY_FILE_ENV} is not set"))?;
    let content = Zeroizing::new(
        fs::read_to_string(path.trim()).context("Failed reading signing key file")?,
    );

    let raw = Zeroizing::new(
        general_purpose::STANDARD
            .decode(content.trim())
            .context("Invalid base64 in signing key")?,
    );
    if raw.len() != 32 {
        bail!(
            "Signing key seed must be 32 bytes after base64 decode (got {})",
            raw.len()
        );
    }

    let mut seed = Seed([0u8; 32]);
    seed.0.copy_from_slice(&raw);
    Ok(seed)
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

fn sign(dir: &Path) -> Result<()> {
    let seed = read_signing_seed()?;
    let signing_key = SigningKey::from_bytes(&seed.0);

    let mut files = BTreeMap::new();
    for name in [SCALER_FILE, MODEL_FILE] {
        let path = dir.join(name);
        let bytes = fs::read(&path).with_context(|| format!("Failed to read {path:?}"))?;
        files.insert(name.to_string(), sha256_hex(&bytes));
    }

    let manifest = ArtifactManifest {
        version: MANIFEST_VERSION,
        created_at: Some(unix_now()),
        files,
    };
    let manifest_bytes =
        serde_json::to_vec_pretty(&manifest).context("Failed to serialize manifest")?;

    let manifest_path = dir.join(MANIFEST_FILE);
    fs::write(&manifest_path, &manifest_bytes)
        .with_context(|| format!("Failed to write {manifest_path:?}"))?;

    let sig_path = dir.join(SIGNATURE_FILE);
    fs::write(&sig_path, signing_key.sign(&manifest_bytes).to_bytes())
        .with_context(|| format!("Failed to write {sig_path:?}"))?;

    println!("Signed manifest: {manifest_path:?}");
    println!("Wrote signature: {sig_path:?}");
    println!("HEARTCHECK_ARTIFACT_PUBKEY_B64={}", pubkey_b64(&signing_key));
    Ok(())
}

fn main() -> Result<()> {
    match parse_args()? {
        Command::GenerateKey(out) => generate_key(&out),
        Command::Sign(dir) => sign(&dir),
    }
}
