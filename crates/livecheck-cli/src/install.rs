//! `livecheck install-model`: copies a liveness model artifact into the model directory.

use anyhow::{bail, Context, Result};
use livecheck_models::{sha256_file_hex, DEFAULT_MODEL_FILE};
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

/// What `install` did with the artifact.
#[derive(Debug, PartialEq, Eq)]
pub enum InstallOutcome {
    Installed(PathBuf),
    AlreadyPresent(PathBuf),
}

/// Copy a single model file with progress output, verify it, then rename into place.
fn copy_model(source: &Path, dest: &Path, expected_sha256: &str) -> Result<()> {
    let tmp_path = dest.with_extension("onnx.part");

    let total_len = fs::metadata(source)
        .with_context(|| format!("failed to stat {}", source.display()))?
        .len();
    println!("  copying {} ({} bytes)...", source.display(), total_len);

    let mut reader =
        fs::File::open(source).with_context(|| format!("failed to open {}", source.display()))?;
    let mut file = fs::File::create(&tmp_path)
        .with_context(|| format!("failed to create {}", tmp_path.display()))?;

    let mut buf = [0u8; 65536];
    let mut total: u64 = 0;
    let mut last_pct: u64 = 0;

    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        file.write_all(&buf[..n])?;
        total += n as u64;

        if total_len > 0 {
            let pct = (total * 100) / total_len;
            if pct / 10 > last_pct / 10 {
                print!("  {pct}%\r");
                io::stdout().flush().ok();
                last_pct = pct;
            }
        }
    }

    file.flush()?;
    drop(file);

    print!("  verifying checksum... ");
    io::stdout().flush().ok();
    let digest = sha256_file_hex(&tmp_path)?;
    if !digest.eq_ignore_ascii_case(expected_sha256) {
        fs::remove_file(&tmp_path).ok();
        bail!(
            "checksum mismatch for {}:\n  expected: {}\n  got:      {}",
            source.display(),
            expected_sha256,
            digest
        );
    }
    println!("ok");

    fs::rename(&tmp_path, dest).with_context(|| {
        format!(
            "failed to rename {} -> {}",
            tmp_path.display(),
            dest.display()
        )
    })?;

    Ok(())
}

/// Install `source` as `<model_dir>/liveness.onnx`.
///
/// Without a pinned checksum the source file's own digest is used, which still
/// catches a truncated copy.
pub fn run(source: &Path, model_dir: &Path, sha256: Option<&str>) -> Result<InstallOutcome> {
    if !source.is_file() {
        bail!("model source not found: {}", source.display());
    }

    println!("Model directory: {}", model_dir.display());
    fs::create_dir_all(model_dir)
        .with_context(|| format!("failed to create directory {}", model_dir.display()))?;

    let expected = match sha256 {
        Some(s) => s.trim().to_ascii_lowercase(),
        None => sha256_file_hex(source)?,
    };

    let dest = model_dir.join(DEFAULT_MODEL_FILE);
    if dest.exists() {
        match sha256_file_hex(&dest) {
            Ok(digest) if digest == expected => {
                println!("  {DEFAULT_MODEL_FILE} already present (checksum ok)");
                return Ok(InstallOutcome::AlreadyPresent(dest));
            }
            Ok(_) => println!("  {DEFAULT_MODEL_FILE} exists but checksum differs, replacing"),
            Err(_) => println!("  {DEFAULT_MODEL_FILE} exists but unreadable, replacing"),
        }
    }

    copy_model(source, &dest, &expected)?;
    tracing::info!(path = %dest.display(), sha256 = %expected, "model installed");
    println!("Setup complete: {} installed.", dest.display());

    Ok(InstallOutcome::Installed(dest))
}
