//! CLI binary for metasearch.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use metasearch::{AppConfig, SearchResponse};
use metasearch_core::engines::StaticBackends;
use metasearch_core::{SearchParams, SearchResult};
use tracing_subscriber::EnvFilter;

/// Metasearch: query many search engines at once and merge their results.
#[derive(Parser)]
#[command(name = "metasearch", version, about)]
struct Cli {
    /// Path to TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Subcommand to run.
    #[command(subcommand)]
    command: Command,
}

/// Available commands.
#[derive(Subcommand)]
enum Command {
    /// Run one search and print the merged results.
    Search {
        /// Query text; `"quoted phrases"` and `site:domain` are understood.
        #[arg(required = true)]
        query: Vec<String>,

        /// Result category: web, images or answers.
        #[arg(short, long, default_value = "web")]
        mode: String,

        /// Result page, starting at 1.
        #[arg(short, long, default_value = "1")]
        page: String,

        /// Explicit query language (ISO 639 code).
        #[arg(short, long)]
        lang: Option<String>,

        /// Accept-Language style preference list used when --lang is absent.
        #[arg(long, default_value = "")]
        accept_language: String,

        /// Print the response as JSON.
        #[arg(long)]
        json: bool,
    },

    /// List the registered engines.
    Engines,

    /// Print the signed image-proxy link for an image URL.
    Sign {
        /// Upstream image URL.
        url: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Users can override with RUST_LOG=debug to see everything.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("metasearch=info,metasearch_core=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config)?;
    // The backend-definition registry is provided by embedding applications.
    let backends = StaticBackends::new();

    match cli.command {
        Command::Search {
            query,
            mode,
            page,
            lang,
            accept_language,
            json,
        } => {
            let joined = query.join(" ");
            let params = SearchParams::parse(Some(&joined), Some(&mode), Some(&page))?;
            let searcher = config.searcher(&backends)?;
            let response = searcher
                .search(&params, lang.as_deref(), &accept_language)
                .await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&response_json(&response))?);
            } else {
                print_response(&response);
            }
        }
        Command::Engines => {
            let registry = config.build_registry(&backends)?;
            for engine in registry.engines() {
                let extensions: Vec<&str> =
                    engine.query_extensions().iter().map(|e| e.as_str()).collect();
                println!(
                    "{:<20} {:<8} {:<10} weight={:<5} extensions=[{}]",
                    engine.name(),
                    engine.mode().as_str(),
                    engine.adapter().kind(),
                    engine.weight(),
                    extensions.join(",")
                );
            }
        }
        Command::Sign { url } => {
            let parsed = url::Url::parse(&url).with_context(|| format!("invalid image URL {url:?}"))?;
            let proxy = config.image_proxy()?;
            println!("{}", proxy.proxied_url(parsed.as_str()));
        }
    }

    Ok(())
}

fn load_config(path: Option<PathBuf>) -> anyhow::Result<AppConfig> {
    match path {
        Some(path) => AppConfig::from_file(&path)
            .with_context(|| format!("failed to load config from {}", path.display())),
        None => {
            let default = AppConfig::default_config_path();
            if default.exists() {
                tracing::info!(path = %default.display(), "loading config");
                AppConfig::from_file(&default)
                    .with_context(|| format!("failed to load config from {}", default.display()))
            } else {
                Ok(AppConfig::default())
            }
        }
    }
}

fn response_json(response: &SearchResponse) -> serde_json::Value {
    let errors: serde_json::Map<String, serde_json::Value> = response
        .errors
        .iter()
        .map(|(engine, err)| (engine.clone(), serde_json::Value::String(err.to_string())))
        .collect();
    serde_json::json!({
        "query": response.query.to_string(),
        "lang": response.query.lang(),
        "mode": response.query.mode(),
        "page": response.query.page(),
        "results": response.results,
        "errors": errors,
    })
}

fn print_response(response: &SearchResponse) {
    if response.results.is_empty() {
        println!("no results for {}", response.query);
    }
    for (i, hit) in response.results.iter().enumerate() {
        match &hit.result {
            SearchResult::Answer(answer) => {
                println!("=> {}", answer.text);
                println!("   {}", answer.url);
            }
            SearchResult::Web(web) => {
                println!("{:>2}. {} [{:.2}]", i + 1, web.title, hit.score);
                println!("    {}", web.url);
                if let Some(snippet) = &web.snippet {
                    println!("    {snippet}");
                }
            }
            SearchResult::Image(image) => {
                println!("{:>2}. {} [{:.2}]", i + 1, image.title, hit.score);
                println!("    {}", image.url);
                println!("    image: {}", image.image_url);
            }
        }
        println!("    via {}", hit.engines.join(", "));
    }
    for (engine, err) in &response.errors {
        eprintln!("{engine}: {err}");
    }
}
