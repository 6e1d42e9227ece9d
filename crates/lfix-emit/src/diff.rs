//! Patches between snapshots

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, warn};

use crate::EmitError;

/// Snapshot pairs diffed after the last stage: each step, then first to last
pub const STAGE_PAIRS: [(usize, usize); 5] = [(0, 1), (1, 2), (2, 3), (3, 4), (0, 4)];

/// Directory name of the snapshot taken after stage `index`
pub fn snapshot_name(index: usize) -> String {
    format!("l.{}", index)
}

/// Run `diff -urp` for every pair in [`STAGE_PAIRS`] inside `out`, writing
/// `dNM.patch` files there.
///
/// A missing or failing `diff` leaves an empty or partial patch; only
/// failing to write the patch is an error.
pub fn write_diffs(out: &Path) -> Result<Vec<PathBuf>, EmitError> {
    let mut patches = Vec::new();

    for (from, to) in STAGE_PAIRS {
        let patch = out.join(format!("d{}{}.patch", from, to));
        let output = Command::new("diff")
            .arg("-urp")
            .arg(snapshot_name(from))
            .arg(snapshot_name(to))
            .current_dir(out)
            .output();

        let bytes = match output {
            // diff exits 1 when the inputs differ
            Ok(output) if matches!(output.status.code(), Some(0) | Some(1)) => output.stdout,
            Ok(output) => {
                warn!(
                    patch = %patch.display(),
                    status = ?output.status.code(),
                    "diff failed: {}",
                    String::from_utf8_lossy(&output.stderr).trim()
                );
                output.stdout
            }
            Err(e) => {
                warn!(patch = %patch.display(), error = %e, "cannot run diff");
                Vec::new()
            }
        };

        fs::write(&patch, bytes).map_err(EmitError::io(&patch))?;
        debug!(patch = %patch.display(), "wrote patch");
        patches.push(patch);
    }

    Ok(patches)
}
