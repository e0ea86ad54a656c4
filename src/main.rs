use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use litmerge::config::{find_config_file, load_config, load_from_env, Config};
use litmerge::utils::{validate_doi, validate_query};
use litmerge::{server, Aggregator};
use serde::Serialize;
use std::io::IsTerminal;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// litmerge - Merge biomedical literature metadata from PubMed, Crossref and bioRxiv
#[derive(Parser, Debug)]
#[command(name = "litmerge")]
#[command(version = litmerge::VERSION)]
#[command(about = "Merge biomedical literature metadata from PubMed, Crossref and bioRxiv", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (can be used multiple times for more verbosity: -v, -vv)
    #[arg(long, short, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(long, short)]
    quiet: bool,

    /// Output format for search and doi results
    #[arg(long, short, value_enum, global = true, default_value_t = OutputFormat::Auto)]
    output: OutputFormat,

    /// Log line format
    #[arg(long, value_enum, global = true, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Upstream request timeout in seconds (overrides configuration)
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Show supported environment variables and exit
    #[arg(long, global = true)]
    env: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Output format for results
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    /// Pretty JSON on a terminal, compact JSON otherwise
    Auto,
    /// Compact JSON
    Json,
    /// Indented JSON
    Pretty,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP service
    Serve {
        /// Address to bind (overrides configuration)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind (overrides configuration)
        #[arg(long, short)]
        port: Option<u16>,
    },

    /// Search by keyword and print the merged result
    Search {
        /// Search keyword
        keyword: String,
    },

    /// Look up metadata for one DOI
    Doi {
        /// DOI, optionally prefixed with `doi:` or a resolver URL
        doi: String,
    },

    /// Print the effective configuration as TOML
    Config,
}

fn print_env_vars() {
    println!("litmerge - Environment Variables");
    println!();
    println!("Logging:");
    println!("  RUST_LOG                             Log filter (overrides -v/-q)");
    println!();
    println!("Configuration overrides (section__key):");
    println!("  LITMERGE_PUBMED__BASE_URL            PubMed E-utilities base URL");
    println!("  LITMERGE_PUBMED__MAX_RESULTS         Identifiers taken per search (default: 5)");
    println!("  LITMERGE_CROSSREF__BASE_URL          Crossref API base URL");
    println!("  LITMERGE_CROSSREF__MAILTO            Contact address for the Crossref polite pool");
    println!("  LITMERGE_BIORXIV__BASE_URL           bioRxiv API base URL");
    println!("  LITMERGE_BIORXIV__SERVER             biorxiv or medrxiv (default: biorxiv)");
    println!("  LITMERGE_BIORXIV__INTERVAL_DAYS      Days covered by one listing (default: 30)");
    println!("  LITMERGE_BIORXIV__MAX_RESULTS        Records kept per listing (default: 10)");
    println!("  LITMERGE_HTTP__TIMEOUT_SECS          Per-request timeout (default: 5)");
    println!("  LITMERGE_HTTP__MAX_CONCURRENT_REQUESTS  In-flight detail fetches (default: 5)");
    println!("  LITMERGE_SERVER__HOST                Bind address (default: 127.0.0.1)");
    println!("  LITMERGE_SERVER__PORT                Bind port (default: 8000)");
    std::process::exit(0);
}

fn init_tracing(cli: &Cli) {
    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let env_filter = if cli.quiet { "error" } else { log_level };

    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| format!("litmerge={}", env_filter)),
    );

    // Logs go to stderr so stdout stays parseable JSON
    let registry = tracing_subscriber::registry().with(filter);
    match cli.log_format {
        LogFormat::Text => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init(),
    }
}

fn resolve_config(cli: &Cli) -> Result<Config> {
    let mut config = if let Some(config_path) = &cli.config {
        load_config(config_path)
            .with_context(|| format!("failed to load {}", config_path.display()))?
    } else if let Some(config_path) = find_config_file() {
        tracing::info!("Using config file: {}", config_path.display());
        load_config(&config_path)
            .with_context(|| format!("failed to load {}", config_path.display()))?
    } else {
        load_from_env().context("failed to read environment configuration")?
    };

    if let Some(timeout) = cli.timeout {
        config.http.timeout_secs = timeout;
    }

    Ok(config)
}

fn print_json<T: Serialize>(value: &T, format: OutputFormat) -> Result<()> {
    let pretty = match format {
        OutputFormat::Auto => std::io::stdout().is_terminal(),
        OutputFormat::Json => false,
        OutputFormat::Pretty => true,
    };

    let rendered = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{}", rendered);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.env {
        print_env_vars();
    }

    init_tracing(&cli);

    let mut config = resolve_config(&cli)?;
    let aggregator = Aggregator::from_config(&config).context("failed to build HTTP clients")?;

    match cli.command {
        Some(Commands::Search { ref keyword }) => {
            let keyword = validate_query("keyword", Some(keyword))?;
            let result = aggregator.search(&keyword).await;
            print_json(&result, cli.output)?;
        }

        Some(Commands::Doi { ref doi }) => {
            let doi = validate_doi(Some(doi))?;
            let metadata = aggregator.lookup_doi(&doi).await;
            print_json(&metadata, cli.output)?;
        }

        Some(Commands::Config) => {
            print!("{}", config.to_toml()?);
        }

        Some(Commands::Serve { host, port }) => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            run_server(&config, aggregator).await?;
        }

        None => run_server(&config, aggregator).await?,
    }

    Ok(())
}

async fn run_server(config: &Config, aggregator: Aggregator) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .with_context(|| {
            format!(
                "invalid bind address {}:{}",
                config.server.host, config.server.port
            )
        })?;

    server::serve(addr, Arc::new(aggregator)).await?;
    Ok(())
}
