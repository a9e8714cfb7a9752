//! Batch folder scanning.
//!
//! One level deep only: immediate child directories are submissions to be
//! packed, immediate child files are assumed to already be archives. Nothing
//! here touches the container runtime.

use std::path::{Path, PathBuf};

use crate::error::BatchError;
use crate::identity;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionKind {
    Directory,
    File,
}

/// One student's assignment artifact as discovered in the batch folder.
/// Immutable after discovery.
#[derive(Debug, Clone)]
pub struct Submission {
    pub source_path: PathBuf,
    pub kind: SubmissionKind,
    pub display_name: String,
}

/// Scan the immediate children of `folder`, directories first, each class
/// sorted by path for deterministic processing order.
pub fn scan_batch(folder: &Path) -> Result<Vec<Submission>, BatchError> {
    if !folder.is_dir() {
        return Err(BatchError::InvalidBatchFolder(folder.to_path_buf()));
    }

    let entries =
        std::fs::read_dir(folder).map_err(|_| BatchError::InvalidBatchFolder(folder.to_path_buf()))?;

    let mut directories = Vec::new();
    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|_| BatchError::InvalidBatchFolder(folder.to_path_buf()))?;
        let path = entry.path();
        // Follows symlinks, matching how the entries are later read
        if path.is_dir() {
            directories.push(path);
        } else if path.is_file() {
            files.push(path);
        }
    }
    directories.sort();
    files.sort();

    let mut submissions = Vec::with_capacity(directories.len() + files.len());
    for path in directories {
        submissions.push(make_submission(path, SubmissionKind::Directory));
    }
    for path in files {
        submissions.push(make_submission(path, SubmissionKind::File));
    }
    Ok(submissions)
}

fn make_submission(path: PathBuf, kind: SubmissionKind) -> Submission {
    let display_name = identity::display_name(&path);
    Submission {
        source_path: path,
        kind,
        display_name,
    }
}
