use anyhow::{bail, Context, Result};
use ciha_summary::{
    aggregate::FailedFile,
    cli::{Cli, Command},
    config::Config,
    fetch::{archive_urls, BatchFetcher, FetchReport},
    pipeline::{process_directory, ProcessRun},
};
use clap::Parser;
use tokio::time::Instant;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,ciha_summary=info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .init();

    // ─── 2) config + overrides ───────────────────────────────────────
    let cli = Cli::parse();
    let mut config = Config::load(cli.config.as_deref())?;
    match &cli.command {
        Command::Fetch(args) => args.apply(&mut config),
        Command::Process(args) => args.apply(&mut config),
        Command::Run(args) => args.apply(&mut config),
    }
    info!(
        data_dir = %config.data_dir.display(),
        output_dir = %config.output_dir.display(),
        encoding = %config.encoding,
        "startup"
    );

    // ─── 3) dispatch ─────────────────────────────────────────────────
    match cli.command {
        Command::Fetch(_) => {
            fetch(&config).await?;
        }
        Command::Process(_) => process(config).await?,
        Command::Run(_) => {
            fetch(&config).await?;
            process(config).await?;
        }
    }
    Ok(())
}

async fn fetch(config: &Config) -> Result<FetchReport> {
    if config.fetch.start_year > config.fetch.end_year {
        bail!(
            "start year {} is after end year {}",
            config.fetch.start_year,
            config.fetch.end_year
        );
    }
    let urls = archive_urls(&config.fetch);
    info!(urls = urls.len(), dest = %config.data_dir.display(), "fetching archives");

    let start = Instant::now();
    let fetcher = BatchFetcher::new(&config.data_dir, &config.fetch)?;
    let report = fetcher.fetch_all(&urls).await;
    info!(elapsed = ?start.elapsed(), "fetch complete");

    for failed in &report.failed {
        error!(url = %failed.url, reason = %failed.reason, "not downloaded");
    }
    Ok(report)
}

async fn process(config: Config) -> Result<()> {
    let start = Instant::now();
    let run = tokio::task::spawn_blocking(move || process_directory(&config))
        .await
        .context("processing task panicked")??;

    match run {
        ProcessRun::Completed { outputs, failed } => {
            info!(
                long_csv = %outputs.long_csv.display(),
                parquet = %outputs.long_parquet.display(),
                wide_tables = outputs.wide.len(),
                elapsed = ?start.elapsed(),
                "processing complete"
            );
            list_failures(&failed);
            Ok(())
        }
        ProcessRun::NoUsableInput { failed } => {
            list_failures(&failed);
            bail!("no archive could be processed ({} failed)", failed.len());
        }
    }
}

fn list_failures(failed: &[FailedFile]) {
    for f in failed {
        error!(file = %f.path.display(), error = %f.error, "failed to process");
    }
}
