//! TaskJudge - Command Line Entry Point
//!
//! Reads one JSON execution job from stdin, tests it and prints the
//! graded outcome as JSON on stdout.

use std::io::Read;
use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use taskjudge::{
    Config, Engine, ExecutionRequest, WorkerPool,
    db::InMemorySolutionRepository,
    services::GradingService,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    // Logs go to stderr so stdout carries only the outcome
    let json = config.logging.json;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.rust_log.clone().into()),
        )
        .with(json.then(|| tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr)))
        .with((!json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr)))
        .init();

    let mut input = String::new();
    std::io::stdin()
        .read_to_string(&mut input)
        .context("Failed to read job from stdin")?;
    let request: ExecutionRequest =
        serde_json::from_str(&input).context("Failed to parse execution job")?;

    tracing::info!(
        task_id = request.task.id,
        user_id = request.user.id,
        "Received execution job"
    );

    let engine = Arc::new(Engine::new(&config));
    let pool = WorkerPool::new(engine, config.execution.max_concurrent_runs);
    let service = GradingService::new(pool, Arc::new(InMemorySolutionRepository::new()));

    let graded = service.submit(request).await?;
    println!("{}", serde_json::to_string_pretty(&graded)?);

    if !graded.outcome.success {
        std::process::exit(1);
    }

    Ok(())
}
