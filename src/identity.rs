//! Container identity derivation.
//!
//! Pure string transforms, no I/O. The derived name is what the lifecycle
//! manager uses both to detect pre-existing containers and to create new
//! ones, so it must be stable across runs for the same input.

use std::path::Path;

/// Clean a submission path down to the student-facing display name.
///
/// Takes the basename, drops everything from the first dot of the file name
/// (so multi-part extensions like `.tar.gz` go in one pass), then drops one
/// trailing `_submit` marker:
///
/// - `alice_submit.tar.gz` -> `alice`
/// - `bob_submit` -> `bob`
/// - `carol.zip` -> `carol`
pub fn display_name(path: &Path) -> String {
    let base = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let stem = match base.split_once('.') {
        Some((head, _)) if !head.is_empty() => head,
        _ => base.as_str(),
    };

    stem.strip_suffix("_submit").unwrap_or(stem).to_string()
}

/// The deterministic name a submission's container is created under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerIdentity {
    pub name: String,
}

impl ContainerIdentity {
    /// Combine the batch folder's basename with the submission's display
    /// name, e.g. `HW8` + `alice` -> `HW8_alice`.
    pub fn derive(batch_folder: &Path, display_name: &str) -> Self {
        let batch = batch_folder
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            name: format!("{}_{}", batch, display_name),
        }
    }
}
