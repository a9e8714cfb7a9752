//! Container runtime boundary.
//!
//! The lifecycle manager talks to the runtime through [`ContainerRuntime`]
//! so the collision policy and orchestration are testable against an
//! in-memory fake. [`DockerRuntime`] is the production implementation over
//! a `bollard::Docker` handle that the caller constructs once and threads
//! through explicitly.

use async_trait::async_trait;
use bollard::container::{
    Config, CreateContainerOptions, ListContainersOptions, RemoveContainerOptions,
    UploadToContainerOptions,
};
use bollard::models::HostConfig;
use bollard::Docker;

use crate::error::RuntimeError;

/// What the runtime reports about an existing container. Names may carry a
/// leading `/`, which callers strip before comparison.
#[derive(Debug, Clone)]
pub struct ContainerRecord {
    pub id: String,
    pub names: Vec<String>,
    pub image: String,
}

/// Everything needed to create one submission container.
#[derive(Debug, Clone)]
pub struct ContainerSpec {
    pub image: String,
    pub name: String,
    pub memory_bytes: i64,
    pub network_disabled: bool,
    pub tty: bool,
    pub entry_command: String,
}

/// The container-runtime capabilities the orchestrator consumes.
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// List all containers known to the runtime, including stopped ones.
    async fn list_containers(&self) -> Result<Vec<ContainerRecord>, RuntimeError>;

    /// Force-remove a container by id.
    async fn remove_container(&self, id: &str) -> Result<(), RuntimeError>;

    /// Create (without starting) a container, returning its id.
    async fn create_container(&self, spec: &ContainerSpec) -> Result<String, RuntimeError>;

    /// Copy the contents of a tar stream into the container at `dest`.
    async fn upload_archive(
        &self,
        container_id: &str,
        dest: &str,
        tar: Vec<u8>,
    ) -> Result<(), RuntimeError>;
}

/// Connect to the local Docker daemon and verify it responds.
pub async fn connect_docker() -> Result<Docker, RuntimeError> {
    let docker =
        Docker::connect_with_local_defaults().map_err(|e| RuntimeError(e.to_string()))?;
    docker.ping().await.map_err(|e| RuntimeError(e.to_string()))?;
    Ok(docker)
}

/// Production runtime backed by the Docker daemon.
pub struct DockerRuntime {
    docker: Docker,
}

impl DockerRuntime {
    pub fn new(docker: Docker) -> Self {
        Self { docker }
    }
}

#[async_trait]
impl ContainerRuntime for DockerRuntime {
    async fn list_containers(&self) -> Result<Vec<ContainerRecord>, RuntimeError> {
        let options = ListContainersOptions::<String> {
            all: true,
            ..Default::default()
        };
        let summaries = self
            .docker
            .list_containers(Some(options))
            .await
            .map_err(|e| RuntimeError(e.to_string()))?;

        Ok(summaries
            .into_iter()
            .map(|c| ContainerRecord {
                id: c.id.unwrap_or_default(),
                names: c.names.unwrap_or_default(),
                image: c.image.unwrap_or_default(),
            })
            .collect())
    }

    async fn remove_container(&self, id: &str) -> Result<(), RuntimeError> {
        self.docker
            .remove_container(
                id,
                Some(RemoveContainerOptions {
                    force: true,
                    ..Default::default()
                }),
            )
            .await
            .map_err(|e| RuntimeError(e.to_string()))
    }

    async fn create_container(&self, spec: &ContainerSpec) -> Result<String, RuntimeError> {
        let host_config = HostConfig {
            memory: Some(spec.memory_bytes),
            ..Default::default()
        };
        let config = Config {
            image: Some(spec.image.clone()),
            cmd: Some(vec![spec.entry_command.clone()]),
            tty: Some(spec.tty),
            network_disabled: Some(spec.network_disabled),
            host_config: Some(host_config),
            ..Default::default()
        };
        let options = CreateContainerOptions {
            name: spec.name.clone(),
            ..Default::default()
        };

        let response = self
            .docker
            .create_container(Some(options), config)
            .await
            .map_err(|e| RuntimeError(e.to_string()))?;
        Ok(response.id)
    }

    async fn upload_archive(
        &self,
        container_id: &str,
        dest: &str,
        tar: Vec<u8>,
    ) -> Result<(), RuntimeError> {
        let options = UploadToContainerOptions::<String> {
            path: dest.to_string(),
            ..Default::default()
        };
        self.docker
            .upload_to_container(container_id, Some(options), tar.into())
            .await
            .map_err(|e| RuntimeError(e.to_string()))
    }
}
