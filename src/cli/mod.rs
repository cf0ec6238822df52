//! CLI commands implementation.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use crate::config::Settings;
use crate::coordinator::CrawlCoordinator;
use crate::repository::IndexStore;
use crate::server;

#[derive(Parser)]
#[command(name = "sitesearch")]
#[command(about = "Per-site crawling search engine")]
#[command(version)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, global = true, default_value = "sitesearch.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API server
    Serve {
        /// Bind address override
        #[arg(long)]
        host: Option<String>,
        /// Port override
        #[arg(long)]
        port: Option<u16>,
    },

    /// Crawl all configured sites once and print a summary
    Crawl,
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load(&cli.config)?;

    match cli.command {
        Commands::Serve { host, port } => {
            let host = host.unwrap_or_else(|| settings.server.host.clone());
            let port = port.unwrap_or(settings.server.port);
            server::serve(settings, &host, port).await
        }
        Commands::Crawl => crawl_once(settings).await,
    }
}

async fn crawl_once(settings: Settings) -> anyhow::Result<()> {
    if settings.sites.is_empty() {
        anyhow::bail!("no [[sites]] configured, nothing to crawl");
    }

    let store = Arc::new(IndexStore::new());
    let coordinator = CrawlCoordinator::new(settings, Arc::clone(&store));
    coordinator.run_once().await?;

    for site in store.sites().await {
        let pages = store.page_count_for_site(site.id).await;
        let lemmas = store.lemma_count_for_site(site.id).await;
        match site.last_error {
            Some(err) => println!("{}: {} ({} pages)", site.url, err, pages),
            None => println!("{}: {} pages, {} lemmas", site.url, pages, lemmas),
        }
    }
    Ok(())
}
