use std::{path::PathBuf, process::ExitCode};

use anyhow::{Context, Result};
use clap::Parser;
use search_core::{
    build_repository, RepositoryKind, ResponseOrdering, ScreenState, SearchController,
};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    runtime::Handle,
};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

mod config;
mod render;

use config::load_settings;
use render::render_state;

const BLANK_QUERY_HINT: &str = "Enter a search word";

#[derive(Parser, Debug)]
#[command(about = "Search GitHub repositories and print the results")]
struct Args {
    /// Run a single query; without it queries are read line by line from stdin.
    query: Option<String>,
    /// Config file (defaults to ./search.toml when present).
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    repository: Option<RepositoryKind>,
    #[arg(long)]
    api_base_url: Option<String>,
    #[arg(long)]
    ordering: Option<ResponseOrdering>,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    let mut settings = load_settings(args.config.as_deref())?;
    if let Some(kind) = args.repository {
        settings.repository = kind;
    }
    if let Some(url) = args.api_base_url {
        settings.api_base_url = url;
    }
    if let Some(ordering) = args.ordering {
        settings.response_ordering = ordering;
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&settings.log_filter)),
        )
        .with_writer(std::io::stderr)
        .init();
    info!(repository = %settings.repository, "starting search");

    let repository = build_repository(&settings.repository_config())
        .context("failed to build search repository")?;
    let controller =
        SearchController::with_options(repository, settings.controller_options(), Handle::current());

    match args.query {
        Some(query) => run_once(&controller, &query).await,
        None => run_interactive(controller).await,
    }
}

fn is_blank_query(query: &str) -> bool {
    query.trim().is_empty()
}

async fn run_once(controller: &SearchController, query: &str) -> Result<ExitCode> {
    if is_blank_query(query) {
        eprintln!("{BLANK_QUERY_HINT}");
        return Ok(ExitCode::FAILURE);
    }

    let mut subscription = controller.subscribe();
    controller.submit_query(query);

    while let Some(state) = subscription.recv().await {
        print_state(&state);
        match state {
            ScreenState::Loading => continue,
            ScreenState::Success { .. } => return Ok(ExitCode::SUCCESS),
            ScreenState::Error { .. } => return Ok(ExitCode::FAILURE),
        }
    }
    anyhow::bail!("search controller stopped before the search finished")
}

async fn run_interactive(controller: SearchController) -> Result<ExitCode> {
    let mut subscription = controller.subscribe();
    let renderer = tokio::spawn(async move {
        while let Some(state) = subscription.recv().await {
            print_state(&state);
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        if is_blank_query(&line) {
            eprintln!("{BLANK_QUERY_HINT}");
            continue;
        }
        controller.submit_query(line.trim());
    }

    debug!(in_flight = controller.in_flight(), "stdin closed; waiting for searches");
    // The subscription closes once the controller and every in-flight search are gone.
    drop(controller);
    renderer.await.context("renderer task failed")?;
    Ok(ExitCode::SUCCESS)
}

fn print_state(state: &ScreenState) {
    for line in render_state(state) {
        println!("{line}");
    }
}
