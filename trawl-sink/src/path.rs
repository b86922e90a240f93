//! Incremental output naming: `{prefix}_#N.{ext}`, numbered from 1.
//!
//! Numbering scans for the first free slot rather than tracking a counter,
//! so interleaved runs against the same directory never overwrite earlier
//! output and deleting a file recycles its number.

use anyhow::Context;
use std::path::{Path, PathBuf};

/// First free `{prefix}_#N.{ext}` under `dir`, creating `dir` if needed.
///
/// Returns the path together with the number, which is stamped into the
/// file's metadata as `file_number`.
pub fn numbered_path(dir: &Path, prefix: &str, ext: &str) -> anyhow::Result<(PathBuf, u32)> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create output directory: {}", dir.display()))?;

    let mut counter = 1u32;
    loop {
        let candidate = dir.join(format!("{prefix}_#{counter}.{ext}"));
        if !candidate.exists() {
            return Ok((candidate, counter));
        }
        counter += 1;
    }
}
