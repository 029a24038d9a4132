use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing::{info, warn};

use jobwatch::config::{self, Settings};

/// Scrapes fresh job listings from a marketplace search-results page and
/// writes them as JSON.
#[derive(Parser, Debug)]
#[command(name = "jobwatch", version, about)]
struct Cli {
    /// Search URL; falls back to UPWORK_SEARCH_URL or the config file.
    search_url: Option<String>,
    /// Output JSON path; falls back to UPWORK_OUTPUT_PATH or the config file.
    output: Option<PathBuf>,
    /// Path to a JSON settings file.
    #[arg(long, default_value = "config/settings.json")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let (settings, load_err) = match config::load_settings(&cli.config) {
        Ok(settings) => (settings, None),
        Err(err) => (Settings::default(), Some(err)),
    };

    tracing_subscriber::fmt()
        .with_max_level(config::level_filter(&settings.run.log_level))
        .init();

    if let Some(err) = load_err {
        warn!(path = %cli.config.display(), error = %err, "could not read config, using defaults");
    }

    let search_url = cli
        .search_url
        .or_else(|| env_non_empty("UPWORK_SEARCH_URL"))
        .unwrap_or_else(|| settings.search_url.clone());
    if search_url.is_empty() {
        bail!(
            "no search URL provided; pass one as the first argument, \
             set UPWORK_SEARCH_URL, or set searchUrl in the config file"
        );
    }

    let output_path = cli
        .output
        .or_else(|| env_non_empty("UPWORK_OUTPUT_PATH").map(PathBuf::from))
        .or_else(|| settings.output_path.clone())
        .unwrap_or_else(|| PathBuf::from("data/output.json"));

    info!(url = %search_url, output = %output_path.display(), "starting job scraper");

    let jobs = jobwatch::extract_jobs_from_search(&search_url, &settings.run).await?;

    if let Some(dir) = output_path.parent() {
        if !dir.as_os_str().is_empty() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("creating output directory {}", dir.display()))?;
        }
    }
    let json = serde_json::to_string_pretty(&jobs)?;
    std::fs::write(&output_path, json)
        .with_context(|| format!("writing {}", output_path.display()))?;

    info!(count = jobs.len(), path = %output_path.display(), "wrote fresh, de-duplicated jobs");
    Ok(())
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}
