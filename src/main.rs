mod config;
mod models;
mod output;
mod pipeline;
mod scraper;
mod utils;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::AppConfig;
use crate::output::OutputFormat;
use crate::pipeline::Pipeline;
use crate::scraper::http_client::HttpClient;
use crate::scraper::sites;

#[derive(Parser)]
#[command(name = "climb-price", about = "Hong Kong climbing gym price extractor", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(clap::Args)]
struct OutputArgs {
    /// Output format (default from config, else json)
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Write to a file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch price pages and extract packages
    Crawl {
        /// Site key to crawl; repeat for several (default: all enabled)
        #[arg(short, long = "site")]
        sites: Vec<String>,

        #[command(flatten)]
        out: OutputArgs,
    },

    /// Extract packages from a saved HTML page
    Parse {
        /// Site key whose rules apply to the page
        #[arg(short, long)]
        site: String,

        file: PathBuf,

        #[command(flatten)]
        out: OutputArgs,
    },

    /// List known sites
    Sites,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(fmt::layer().compact().with_target(false).with_writer(std::io::stderr))
        .with(EnvFilter::new(log_filter(cli.verbose)))
        .init();

    let config = AppConfig::load()?;

    match cli.command {
        Command::Crawl { sites, out } => {
            let _t = utils::Timer::start("Crawl");
            let client = HttpClient::new(&config.scraper)?;
            let (format, path) = resolve_output(&config, out);

            let (gyms, stats) = Pipeline::new(config, client).run(&sites).await?;
            output::emit(&gyms, format, path.as_deref())?;
            info!(
                "Done: {} sites, {} packages, {} errors",
                stats.sites,
                stats.packages,
                stats.section_failures + stats.fetch_failures
            );
        }

        Command::Parse { site, file, out } => {
            let _t = utils::Timer::start(format!("Parse {:?}", file));
            let gym_site =
                sites::by_key(&site).with_context(|| format!("Unknown site {:?}", site))?;
            let html = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {:?}", file))?;
            let (format, path) = resolve_output(&config, out);

            let gym = scraper::aggregate_html(gym_site.as_ref(), &html, None);
            output::emit(&[gym], format, path.as_deref())?;
        }

        Command::Sites => {
            println!("─────────────────────────────────────────────────────────");
            for site in sites::all() {
                let url = config.sites.url_for(site.as_ref());
                let enabled = config
                    .sites
                    .enabled
                    .iter()
                    .any(|k| k.eq_ignore_ascii_case(site.key()));
                println!(
                    "  {:<10} {:<12} {} {}",
                    site.key(),
                    site.name(),
                    url,
                    if enabled { "" } else { "(disabled)" }
                );
            }
            println!("─────────────────────────────────────────────────────────");
        }
    }

    Ok(())
}

/// Directives keyed on this crate's target, which follows the binary name.
fn log_filter(verbose: u8) -> String {
    let krate = env!("CARGO_CRATE_NAME");
    match verbose {
        0 => format!("{}=info,warn", krate),
        1 => format!("{}=debug,info", krate),
        _ => "trace".to_string(),
    }
}

/// CLI flags win over the config file.
fn resolve_output(config: &AppConfig, args: OutputArgs) -> (OutputFormat, Option<PathBuf>) {
    (
        args.format.unwrap_or(config.output.format),
        args.output.or_else(|| config.output.path.clone()),
    )
}
