//! contest-core command line
//!
//! Renders proposal previews and inspects or exercises the chain transports
//! built from the network registry.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use contest_core::config::AppConfig;
use contest_core::network_config::{encode_selected_chain, selected_chain_from_cookie, NetworkConfig};
use contest_core::preview::{self, Preview, PreviewDocument};
use contest_core::registry::load_registry;
use contest_core::schemas::{EmbedMeta, ProposalContentSpec};
use contest_core::transport::{is_eligible, RpcHttpClient, Transport, TransportResolver};

#[derive(Parser, Debug)]
#[command(name = "contest-core")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Proposal previews and multi-chain RPC transports for contests")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,

    /// Output logs as JSON
    #[arg(long, default_value = "false", global = true)]
    json_logs: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build the preview card content for a proposal
    Preview {
        /// File holding the proposal markup
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Viewport width in logical pixels
        #[arg(short, long)]
        width: Option<u32>,

        /// Content is image-bearing (truncate it)
        #[arg(long, default_value = "false")]
        image: bool,

        /// Render as a social-media embed with this id
        #[arg(long)]
        embed_id: Option<String>,
    },

    /// List registry chains and their resolved transports
    Transports,

    /// Send a JSON-RPC request through a chain's fallback transport
    Rpc {
        /// Chain id
        #[arg(short, long)]
        chain: u64,

        /// JSON-RPC method
        #[arg(short, long, default_value = "eth_blockNumber")]
        method: String,

        /// JSON array of params
        #[arg(short, long, default_value = "[]")]
        params: String,
    },

    /// Encode or decode the persisted chain selection cookie
    Cookie {
        /// Chain id to persist
        #[arg(long, conflicts_with = "header")]
        chain: Option<u64>,

        /// Cookie header to read the selection from
        #[arg(long)]
        header: Option<String>,
    },
}

fn setup_logging(log_level: &str, json_output: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    if json_output {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(&cli.log_level, cli.json_logs);

    let correlation_id = uuid::Uuid::new_v4().to_string();
    info!(
        version = env!("CARGO_PKG_VERSION"),
        correlation_id = %correlation_id,
        "Starting contest-core"
    );

    let config = AppConfig::load()?;
    config.validate()?;

    let result = match cli.command {
        Commands::Preview {
            file,
            width,
            image,
            embed_id,
        } => {
            let width = width.unwrap_or(config.default_viewport_width);
            show_preview(file, width, image, embed_id).await
        }
        Commands::Transports => show_transports(&config).await,
        Commands::Rpc {
            chain,
            method,
            params,
        } => call_rpc(&config, chain, &method, &params).await,
        Commands::Cookie { chain, header } => {
            show_cookie(chain, header.as_deref());
            Ok(())
        }
    };

    if let Err(e) = &result {
        error!(error = %e, "Command failed");
    }
    result
}

async fn build_network_config(config: &AppConfig) -> Result<NetworkConfig> {
    let chains = load_registry(&config.registry_path)
        .await
        .with_context(|| format!("loading registry {}", config.registry_path.display()))?;

    let client = Arc::new(RpcHttpClient::new(config.http_client_config()?)?);
    let resolver = TransportResolver::new(client, config.circuit_breaker_config()?);
    let transports = resolver.resolve(&chains);

    Ok(NetworkConfig::new(chains, transports))
}

async fn show_preview(
    file: Option<PathBuf>,
    width: u32,
    image: bool,
    embed_id: Option<String>,
) -> Result<()> {
    let content = match file {
        Some(path) => tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("reading {}", path.display()))?,
        None => String::new(),
    };

    let spec = ProposalContentSpec {
        content,
        is_content_image: image,
        embed: embed_id.map(EmbedMeta::new),
    };
    let narrow = preview::is_narrow_viewport(width);
    let mode = preview::select_render_mode(&spec);

    println!("\nProposal Preview");
    println!("================");
    println!("Mode:     {mode:?}");
    println!("Viewport: {width}px ({})", if narrow { "narrow" } else { "wide" });

    match preview::build_preview(&spec, narrow) {
        Preview::Embed {
            embed_id,
            fetch_path,
        } => {
            println!("Embed:    {embed_id}");
            println!("Fetch:    {fetch_path}");
        }
        Preview::Markup { document } => {
            if let PreviewDocument::Truncated { text, image_src } = &document {
                println!("Text:     {} chars", text.chars().count());
                println!("Image:    {}", if image_src.is_empty() { "(none)" } else { image_src.as_str() });
            }
            let markup = document.to_markup();
            println!("\nDocument:\n{markup}");
            println!(
                "\nRendered:\n{}",
                preview::to_html(&preview::render_markup(&markup))
            );
        }
    }

    Ok(())
}

async fn show_transports(config: &AppConfig) -> Result<()> {
    let network = build_network_config(config).await?;

    println!("\n{:<10} {:<28} {:<9} Endpoints", "Chain", "Name", "Eligible");
    println!("{}", "-".repeat(90));
    for chain in network.chains() {
        let endpoints = network
            .transport(chain.id)
            .map(|t| t.endpoints().join(" -> "))
            .unwrap_or_default();
        println!(
            "{:<10} {:<28} {:<9} {}",
            chain.id,
            chain.name,
            if is_eligible(chain) { "yes" } else { "no" },
            endpoints
        );
    }
    println!(
        "\nTotal: {} chains, {} transports",
        network.chains().len(),
        network.transports().len()
    );

    Ok(())
}

async fn call_rpc(config: &AppConfig, chain: u64, method: &str, params: &str) -> Result<()> {
    let params: Value = serde_json::from_str(params).context("params must be JSON")?;
    let network = build_network_config(config).await?;
    let transport = network.transport(chain)?;

    info!(chain_id = chain, method, "Sending RPC request");
    let result = transport.request(method, params).await?;
    println!("{}", serde_json::to_string_pretty(&result)?);

    for (endpoint, state) in transport.endpoint_states() {
        info!(endpoint, state = ?state, "Endpoint state");
    }
    Ok(())
}

fn show_cookie(chain: Option<u64>, header: Option<&str>) {
    if let Some(chain_id) = chain {
        println!("Set-Cookie: {}", encode_selected_chain(chain_id));
    }
    if let Some(header) = header {
        match selected_chain_from_cookie(header) {
            Some(chain_id) => println!("Selected chain: {chain_id}"),
            None => println!("No chain selection in cookie"),
        }
    }
}
