//! Batch orchestration.
//!
//! Drives scan -> normalize -> identity -> lifecycle over every submission
//! in a batch folder. Input validation happens before any container work;
//! after that, per-submission failures are isolated and the only shared
//! obligations are the one-time extra-payload normalization and the cleanup
//! set of temporary archives, which is drained exactly once at the end no
//! matter how the batch went.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::archive::{self, NormalizedArchive};
use crate::config::GraderConfig;
use crate::error::{BatchError, PackagingError, SubmissionError};
use crate::identity::ContainerIdentity;
use crate::lifecycle::{LifecycleManager, SubmissionOutcome};
use crate::runtime::ContainerRuntime;
use crate::scanner::{self, Submission};

/// One invocation's inputs.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Folder of tarballs or assignment folders, one level deep.
    pub folder: PathBuf,
    /// Image submissions containers are created from.
    pub image: String,
    /// Optional file or directory applied identically to every container.
    pub extra: Option<PathBuf>,
}

/// Structured result for one submission.
#[derive(Debug)]
pub struct SubmissionReport {
    pub display_name: String,
    pub container_name: String,
    pub outcome: SubmissionOutcome,
}

/// The batch outcome is this list, not a single success/failure flag.
#[derive(Debug)]
pub struct BatchReport {
    pub submissions: Vec<SubmissionReport>,
}

impl BatchReport {
    pub fn failed_count(&self) -> usize {
        self.submissions
            .iter()
            .filter(|s| s.outcome.is_failure())
            .count()
    }
}

/// Run a whole batch. Only invalid inputs and a failure to package the
/// shared extra payload abort the run; everything downstream is reported
/// per submission.
pub async fn run_batch(
    runtime: Arc<dyn ContainerRuntime>,
    config: &GraderConfig,
    options: &BatchOptions,
) -> Result<BatchReport, BatchError> {
    if !options.folder.is_dir() {
        return Err(BatchError::InvalidBatchFolder(options.folder.clone()));
    }

    // Per-run scratch directory: temporary archives get unique paths here,
    // so concurrent batches and colliding display names never share a file.
    let scratch = tempfile::tempdir().map_err(|e| {
        BatchError::Packaging(PackagingError {
            path: std::env::temp_dir(),
            source: e,
        })
    })?;

    let mut cleanup: Vec<PathBuf> = Vec::new();
    let result = run_batch_inner(runtime, config, options, scratch.path(), &mut cleanup).await;
    cleanup_temporaries(&cleanup);
    // scratch drops here, removing the now-empty directory
    result
}

async fn run_batch_inner(
    runtime: Arc<dyn ContainerRuntime>,
    config: &GraderConfig,
    options: &BatchOptions,
    scratch: &Path,
    cleanup: &mut Vec<PathBuf>,
) -> Result<BatchReport, BatchError> {
    let extra = match &options.extra {
        Some(path) => {
            if !path.exists() {
                return Err(BatchError::InvalidExtraFile(path.clone()));
            }
            let archive = archive::normalize(path, None, scratch)?;
            if archive.is_temporary {
                tracing::info!(path = %archive.path.display(), "created temporary gzip for extra payload");
                cleanup.push(archive.path.clone());
            }
            Some(archive)
        }
        None => None,
    };

    let submissions = scanner::scan_batch(&options.folder)?;
    let manager = LifecycleManager::new(runtime, options.image.clone(), config.clone());

    let mut reports = Vec::with_capacity(submissions.len());
    for submission in &submissions {
        let report = process_submission(
            &manager,
            config,
            options,
            submission,
            extra.as_ref(),
            scratch,
            cleanup,
        )
        .await;
        tracing::info!(
            submission = %report.display_name,
            container = %report.container_name,
            outcome = %report.outcome,
            "submission processed"
        );
        reports.push(report);
    }

    Ok(BatchReport {
        submissions: reports,
    })
}

async fn process_submission(
    manager: &LifecycleManager,
    config: &GraderConfig,
    options: &BatchOptions,
    submission: &Submission,
    extra: Option<&NormalizedArchive>,
    scratch: &Path,
    cleanup: &mut Vec<PathBuf>,
) -> SubmissionReport {
    let identity = ContainerIdentity::derive(&options.folder, &submission.display_name);
    tracing::info!(submission = %submission.display_name, "processing submission");

    let archive = match archive::normalize(
        &submission.source_path,
        Some(&submission.display_name),
        scratch,
    ) {
        Ok(archive) => archive,
        Err(e) => {
            return SubmissionReport {
                display_name: submission.display_name.clone(),
                container_name: identity.name,
                outcome: SubmissionOutcome::Failed(e.into()),
            }
        }
    };
    if archive.is_temporary {
        cleanup.push(archive.path.clone());
    }

    let provision = manager.provision(&identity, &archive, extra);
    let outcome = match config.submission_timeout {
        Some(limit) => match tokio::time::timeout(limit, provision).await {
            Ok(outcome) => outcome,
            Err(_) => SubmissionOutcome::Failed(SubmissionError::Timeout(limit)),
        },
        None => provision.await,
    };

    SubmissionReport {
        display_name: submission.display_name.clone(),
        container_name: identity.name,
        outcome,
    }
}

fn cleanup_temporaries(cleanup: &[PathBuf]) {
    if cleanup.is_empty() {
        return;
    }
    tracing::info!("cleaning up temporary files");
    for path in cleanup {
        if let Err(e) = std::fs::remove_file(path) {
            tracing::warn!(path = %path.display(), error = %e, "failed to remove temporary archive");
        }
    }
}
