//! gradebox - CLI entry point.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use gradebox::{
    batch::{run_batch, BatchOptions},
    config::GraderConfig,
    runtime::{connect_docker, DockerRuntime},
};

#[derive(Parser, Debug)]
#[command(name = "gradebox")]
#[command(about = "Materialize student submissions into isolated Docker containers")]
#[command(version)]
struct Args {
    /// Folder of submission tarballs or assignment folders
    folder: PathBuf,

    /// Docker image submission containers are created from
    #[arg(long, default_value = "5201")]
    image: String,

    /// Extra files to copy into every container (file or directory)
    #[arg(long)]
    extra: Option<PathBuf>,

    /// Per-submission timeout in seconds (0 disables, the default)
    #[arg(long)]
    timeout_secs: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("gradebox=info"));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let mut config = GraderConfig::resolve()?;
    if let Some(secs) = args.timeout_secs {
        config.submission_timeout = (secs > 0).then(|| Duration::from_secs(secs));
    }

    let docker = connect_docker().await?;
    let runtime = Arc::new(DockerRuntime::new(docker));

    let report = run_batch(
        runtime,
        &config,
        &BatchOptions {
            folder: args.folder,
            image: args.image,
            extra: args.extra,
        },
    )
    .await?;

    let failed = report.failed_count();
    tracing::info!(
        submissions = report.submissions.len(),
        failed,
        "batch complete"
    );
    for submission in &report.submissions {
        println!("{}: {}", submission.container_name, submission.outcome);
    }

    Ok(())
}
