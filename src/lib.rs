//! gradebox - materialize student assignment submissions into isolated,
//! resource-limited Docker containers for grading.
//!
//! The pipeline is scan -> normalize -> identity -> lifecycle:
//! - [`scanner`] walks a batch folder one level deep,
//! - [`archive`] reduces each submission to a gzipped tarball,
//! - [`identity`] derives the deterministic container name,
//! - [`lifecycle`] applies the collision policy and creates the container,
//! - [`batch`] supervises the whole run and owns temporary-file cleanup.
//!
//! Containers are never silently overwritten: an existing container with a
//! matching name is removed only when it was built from the same image this
//! run was invoked with.

pub mod archive;
pub mod batch;
pub mod config;
pub mod error;
pub mod identity;
pub mod lifecycle;
pub mod runtime;
pub mod scanner;

pub use batch::{run_batch, BatchOptions, BatchReport, SubmissionReport};
pub use config::GraderConfig;
pub use error::{BatchError, SubmissionError};
pub use lifecycle::{LifecycleManager, SkipReason, SubmissionOutcome};
pub use runtime::{connect_docker, ContainerRuntime, DockerRuntime};
pub use scanner::{Submission, SubmissionKind};
