//! AC1027 downgrade shim.
//!
//! AC1027 files can optionally be pre-processed by an external document
//! converter into AC1018 before decoding. The converter executable path
//! comes from the `DWGREAD_CONVERTER` environment variable; it is invoked
//! with an input directory, an output directory, and ODA-style arguments.
//! Exit code 0 plus an `AC1018` file appearing in the output directory is
//! success; anything else is [`DwgError::ConvertFailed`]. Converted files
//! are cached keyed by the source path, size, and mtime.

use std::collections::hash_map::DefaultHasher;
use std::env;
use std::fs;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{DwgError, Result};
use crate::types::DwgVersion;

/// Environment variable naming the converter executable.
pub const CONVERTER_ENV: &str = "DWGREAD_CONVERTER";

/// Whether a converter executable is configured.
pub fn converter_configured() -> bool {
    env::var_os(CONVERTER_ENV).is_some_and(|v| !v.is_empty())
}

/// Convert `path` to an AC1018 file, returning the converted path.
pub fn convert_to_ac1018(path: &Path) -> Result<PathBuf> {
    let converter = env::var_os(CONVERTER_ENV)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| {
            DwgError::ConvertFailed(format!("{CONVERTER_ENV} is not set"))
        })?;

    let source = path
        .canonicalize()
        .map_err(|e| DwgError::ConvertFailed(format!("cannot resolve {}: {e}", path.display())))?;
    let metadata = fs::metadata(&source)?;

    let cache_dir = env::temp_dir().join("dwgread-convert");
    fs::create_dir_all(&cache_dir)?;

    let mut hasher = DefaultHasher::new();
    source.hash(&mut hasher);
    metadata.len().hash(&mut hasher);
    if let Ok(modified) = metadata.modified() {
        modified.hash(&mut hasher);
    }
    let key = hasher.finish();
    let cached = cache_dir.join(format!("{key:016x}.dwg"));

    if is_ac1018(&cached) {
        return Ok(cached);
    }

    let work_dir = cache_dir.join(format!("work-{key:016x}"));
    let in_dir = work_dir.join("in");
    let out_dir = work_dir.join("out");
    // Start from a clean work area so the output glob sees only fresh files.
    let _ = fs::remove_dir_all(&work_dir);
    fs::create_dir_all(&in_dir)?;
    fs::create_dir_all(&out_dir)?;

    fs::copy(&source, in_dir.join("source.DWG"))?;

    let status = Command::new(&converter)
        .arg(&in_dir)
        .arg(&out_dir)
        .args(["ACAD2004", "DWG", "0", "1", "*.DWG"])
        .status()
        .map_err(|e| DwgError::ConvertFailed(format!("failed to run converter: {e}")))?;

    if !status.success() {
        let _ = fs::remove_dir_all(&work_dir);
        return Err(DwgError::ConvertFailed(format!(
            "converter exited with {status}"
        )));
    }

    // The output filename convention varies between converter versions;
    // take the first produced DWG bearing the AC1018 magic.
    let converted = find_converted(&out_dir)?;
    fs::copy(&converted, &cached)?;
    let _ = fs::remove_dir_all(&work_dir);

    Ok(cached)
}

fn find_converted(out_dir: &Path) -> Result<PathBuf> {
    let mut candidates: Vec<PathBuf> = fs::read_dir(out_dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|p| {
            p.extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("dwg"))
        })
        .collect();
    candidates.sort();

    candidates
        .into_iter()
        .find(|p| is_ac1018(p))
        .ok_or_else(|| {
            DwgError::ConvertFailed("converter produced no AC1018 output".into())
        })
}

fn is_ac1018(path: &Path) -> bool {
    fs::read(path)
        .ok()
        .and_then(|bytes| DwgVersion::detect(&bytes).ok())
        .map(|version| version == DwgVersion::Ac1018)
        .unwrap_or(false)
}
