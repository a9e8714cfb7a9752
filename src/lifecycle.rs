//! Container lifecycle management for one submission.
//!
//! Lookup, collision policy, creation, and materialization. The runtime's
//! container set is the single source of truth: existence is queried fresh
//! for every submission, never cached across them. Destructive removal only
//! happens when the existing container was built from the same image this
//! run was invoked with.

use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use flate2::read::GzDecoder;

use crate::archive::NormalizedArchive;
use crate::config::GraderConfig;
use crate::error::SubmissionError;
use crate::identity::ContainerIdentity;
use crate::runtime::{ContainerRecord, ContainerRuntime, ContainerSpec};

/// Why a submission was skipped without error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// A container with the derived name exists but was built from a
    /// different image; it is not ours to remove.
    ImageMismatch { existing_image: String },
}

/// Per-submission result. The reporting surface is a rendering of this, not
/// the other way around.
#[derive(Debug)]
pub enum SubmissionOutcome {
    Created,
    Replaced,
    Skipped(SkipReason),
    Failed(SubmissionError),
}

impl SubmissionOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

impl std::fmt::Display for SubmissionOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::Replaced => write!(f, "replaced"),
            Self::Skipped(SkipReason::ImageMismatch { existing_image }) => {
                write!(f, "skipped (existing container uses image {})", existing_image)
            }
            Self::Failed(e) => write!(f, "failed: {}", e),
        }
    }
}

/// Drives lookup, collision policy, creation, and extraction for single
/// submissions against a shared runtime handle.
pub struct LifecycleManager {
    runtime: Arc<dyn ContainerRuntime>,
    image: String,
    config: GraderConfig,
}

impl LifecycleManager {
    pub fn new(runtime: Arc<dyn ContainerRuntime>, image: String, config: GraderConfig) -> Self {
        Self {
            runtime,
            image,
            config,
        }
    }

    /// Provision one submission's container. Every failure is converted to
    /// an outcome here; nothing propagates past the submission boundary.
    pub async fn provision(
        &self,
        identity: &ContainerIdentity,
        archive: &NormalizedArchive,
        extra: Option<&NormalizedArchive>,
    ) -> SubmissionOutcome {
        let existing = match self.find_existing(&identity.name).await {
            Ok(existing) => existing,
            Err(e) => return SubmissionOutcome::Failed(e.into()),
        };

        let mut replaced = false;
        if let Some(record) = existing {
            if record.image != self.image {
                tracing::warn!(
                    container = %identity.name,
                    existing_image = %record.image,
                    "container already exists and does not match the provided image, skipping"
                );
                return SubmissionOutcome::Skipped(SkipReason::ImageMismatch {
                    existing_image: record.image,
                });
            }

            tracing::info!(container = %identity.name, "removing old container");
            if let Err(e) = self.runtime.remove_container(&record.id).await {
                return SubmissionOutcome::Failed(SubmissionError::Removal {
                    name: identity.name.clone(),
                    reason: e.to_string(),
                });
            }
            replaced = true;
        }

        let spec = ContainerSpec {
            image: self.image.clone(),
            name: identity.name.clone(),
            memory_bytes: (self.config.memory_limit_mb * 1024 * 1024) as i64,
            network_disabled: true,
            tty: true,
            entry_command: self.config.entry_command.clone(),
        };
        let container_id = match self.runtime.create_container(&spec).await {
            Ok(id) => id,
            Err(e) => {
                return SubmissionOutcome::Failed(SubmissionError::Creation {
                    name: identity.name.clone(),
                    reason: e.to_string(),
                })
            }
        };

        tracing::info!(container = %identity.name, "extracting assignment");
        if let Err(e) = self.extract(&identity.name, &container_id, &archive.path).await {
            // The container stays in place; a re-run hits the same-image
            // replace path after the root cause is fixed.
            return SubmissionOutcome::Failed(e);
        }

        if let Some(extra) = extra {
            tracing::info!(container = %identity.name, "extracting extra file");
            if let Err(e) = self.extract(&identity.name, &container_id, &extra.path).await {
                return SubmissionOutcome::Failed(e);
            }
        }

        tracing::info!(container = %identity.name, "container created");
        if replaced {
            SubmissionOutcome::Replaced
        } else {
            SubmissionOutcome::Created
        }
    }

    /// Find a container whose name matches the target. The daemon reports
    /// names with a leading `/`.
    async fn find_existing(&self, name: &str) -> Result<Option<ContainerRecord>, crate::error::RuntimeError> {
        let containers = self.runtime.list_containers().await?;
        Ok(containers.into_iter().find(|record| {
            record
                .names
                .iter()
                .any(|n| n.strip_prefix('/').unwrap_or(n) == name)
        }))
    }

    /// Gunzip the archive and copy the resulting tar stream into the
    /// container's home path.
    async fn extract(
        &self,
        name: &str,
        container_id: &str,
        archive_path: &Path,
    ) -> Result<(), SubmissionError> {
        // Blocking read goes to the blocking pool so the per-submission
        // timeout can expire while a stalled filesystem read is in flight.
        let path = archive_path.to_path_buf();
        let tar_bytes = tokio::task::spawn_blocking(move || gunzip(&path))
            .await
            .map_err(|e| SubmissionError::Extraction {
                name: name.to_string(),
                reason: e.to_string(),
            })?
            .map_err(|e| SubmissionError::Extraction {
                name: name.to_string(),
                reason: e.to_string(),
            })?;

        self.runtime
            .upload_archive(container_id, &self.config.container_home, tar_bytes)
            .await
            .map_err(|e| SubmissionError::Extraction {
                name: name.to_string(),
                reason: e.to_string(),
            })
    }
}

fn gunzip(path: &Path) -> std::io::Result<Vec<u8>> {
    let mut decoder = GzDecoder::new(File::open(path)?);
    let mut tar_bytes = Vec::new();
    decoder.read_to_end(&mut tar_bytes)?;
    Ok(tar_bytes)
}
