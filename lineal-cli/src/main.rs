//! lineal-cli — query frontend for the lineage warehouse HTTP API
//!
//! # Subcommands
//! - `lineage <guid> --scope <scope> [--exclude-processes]` — scoped traversal
//! - `entity <guid>`                — single entity details
//! - `search <query> [-n <limit>]`  — free-text search over vertices
//! - `types`                        — distinct vertex type names
//! - `nodes <value> [--type-name]`  — node-name search
//! - `hierarchy <guid>`             — element-hierarchy traversal
//! - `status`                       — server health

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Deserialize;
use serde_json::json;

const DEFAULT_SERVER: &str = "http://127.0.0.1:8766";
const DEFAULT_LIMIT: usize = 20;

// ============================================================================
// CLI Definition
// ============================================================================

#[derive(Debug, Parser)]
#[command(name = "lineal-cli", version, about = "Lineage warehouse query CLI")]
struct Cli {
    /// Lineal HTTP server URL (overrides LINEAL_HTTP_URL env var)
    #[arg(long, env = "LINEAL_HTTP_URL", default_value = DEFAULT_SERVER)]
    server: String,

    /// Print raw JSON responses instead of summaries
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run a scope-bounded lineage traversal from a GUID
    Lineage {
        guid: String,

        /// Traversal scope: source-and-destination, end-to-end,
        /// ultimate-source, ultimate-destination, glossary
        #[arg(long, default_value = "end-to-end")]
        scope: String,

        /// Elide process vertices (bridged, not disconnected)
        #[arg(long)]
        exclude_processes: bool,
    },

    /// Fetch details for one entity
    Entity { guid: String },

    /// Free-text search over vertex names and properties
    Search {
        query: String,

        #[arg(short = 'n', long, default_value_t = DEFAULT_LIMIT)]
        limit: usize,

        /// Restrict to these vertex type names
        #[arg(long)]
        type_name: Vec<String>,
    },

    /// List distinct vertex type names in the graph
    Types,

    /// Search nodes by display name
    Nodes {
        value: String,

        #[arg(long)]
        type_name: Option<String>,

        #[arg(short = 'n', long, default_value_t = DEFAULT_LIMIT)]
        limit: usize,
    },

    /// Walk structural containment edges from a GUID
    Hierarchy {
        guid: String,

        /// upward, downward, or all
        #[arg(long, default_value = "all")]
        direction: String,
    },

    /// Show warehouse server status
    Status,
}

// ============================================================================
// Response summaries
// ============================================================================

#[derive(Debug, Deserialize)]
struct Subgraph {
    vertices: Vec<VertexSummary>,
    edges: Vec<EdgeSummary>,
}

#[derive(Debug, Deserialize)]
struct VertexSummary {
    guid: String,
    type_name: String,
    display_name: String,
}

#[derive(Debug, Deserialize)]
struct EdgeSummary {
    source: String,
    target: String,
    type_name: String,
}

fn print_subgraph(raw: serde_json::Value, as_json: bool) -> anyhow::Result<()> {
    if as_json {
        println!("{}", serde_json::to_string_pretty(&raw)?);
        return Ok(());
    }
    let subgraph: Subgraph = serde_json::from_value(raw).context("unexpected response shape")?;
    println!(
        "{} vertices, {} edges",
        subgraph.vertices.len(),
        subgraph.edges.len()
    );
    for v in &subgraph.vertices {
        println!("  [{}] {} ({})", v.type_name, v.display_name, v.guid);
    }
    for e in &subgraph.edges {
        println!("  {} -[{}]-> {}", e.source, e.type_name, e.target);
    }
    Ok(())
}

// ============================================================================
// Main
// ============================================================================

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let client = reqwest::blocking::Client::new();
    let base = cli.server.trim_end_matches('/');

    match cli.command {
        Commands::Lineage {
            guid,
            scope,
            exclude_processes,
        } => {
            let resp = client
                .post(format!("{base}/lineage"))
                .json(&json!({
                    "scope": scope,
                    "guid": guid,
                    "include_processes": !exclude_processes,
                }))
                .send()
                .context("request failed — is lineal-server running?")?;
            let raw: serde_json::Value = resp.error_for_status()?.json()?;
            print_subgraph(raw, cli.json)?;
        }
        Commands::Entity { guid } => {
            let resp = client.get(format!("{base}/entities/{guid}")).send()?;
            if resp.status() == reqwest::StatusCode::NOT_FOUND {
                eprintln!("entity {guid} not found");
                std::process::exit(1);
            }
            let raw: serde_json::Value = resp.error_for_status()?.json()?;
            println!("{}", serde_json::to_string_pretty(&raw)?);
        }
        Commands::Search {
            query,
            limit,
            type_name,
        } => {
            let resp = client
                .post(format!("{base}/search"))
                .json(&json!({
                    "query": query,
                    "type_names": type_name,
                    "limit": limit,
                }))
                .send()?;
            let raw: serde_json::Value = resp.error_for_status()?.json()?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&raw)?);
            } else {
                let count = raw["count"].as_u64().unwrap_or(0);
                println!("{count} result(s)");
                for hit in raw["results"].as_array().into_iter().flatten() {
                    println!(
                        "  [{}] {} ({})",
                        hit["type_name"].as_str().unwrap_or("?"),
                        hit["display_name"].as_str().unwrap_or("?"),
                        hit["guid"].as_str().unwrap_or("?"),
                    );
                }
            }
        }
        Commands::Types => {
            let raw: serde_json::Value = client
                .get(format!("{base}/types"))
                .send()?
                .error_for_status()?
                .json()?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&raw)?);
            } else {
                for t in raw["types"].as_array().into_iter().flatten() {
                    println!("{}", t.as_str().unwrap_or("?"));
                }
            }
        }
        Commands::Nodes {
            value,
            type_name,
            limit,
        } => {
            let resp = client
                .post(format!("{base}/nodes"))
                .json(&json!({
                    "type_name": type_name,
                    "search_value": value,
                    "limit": limit,
                }))
                .send()?;
            let raw: serde_json::Value = resp.error_for_status()?.json()?;
            println!("{}", serde_json::to_string_pretty(&raw)?);
        }
        Commands::Hierarchy { guid, direction } => {
            let resp = client
                .post(format!("{base}/hierarchy"))
                .json(&json!({
                    "guid": guid,
                    "direction": direction,
                }))
                .send()?;
            let raw: serde_json::Value = resp.error_for_status()?.json()?;
            print_subgraph(raw, cli.json)?;
        }
        Commands::Status => {
            let raw: serde_json::Value = client
                .get(format!("{base}/health"))
                .send()
                .context("request failed — is lineal-server running?")?
                .error_for_status()?
                .json()?;
            println!(
                "status: {}  vertices: {}  edges: {}",
                raw["status"].as_str().unwrap_or("?"),
                raw["vertices"],
                raw["edges"],
            );
        }
    }

    Ok(())
}
