//! CLI binary for Climate Watch Nets: build and compare municipal plan networks.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use cwn_analysis::pipeline::{analyze_graph, run_batch};
use cwn_core::config::NetsConfig;
use cwn_core::sources::build_graph;
use cwn_core::storage;
use std::path::{Path, PathBuf};

const DEFAULT_CONFIG_FILE: &str = "climate-watch-nets.toml";

#[derive(Parser)]
#[command(
    name = "climate-watch-nets",
    about = "Network analysis of municipal climate plans"
)]
struct Cli {
    /// Configuration file (defaults to ./climate-watch-nets.toml if present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Assemble the network of each tag and save it as an edge list
    Construct {
        /// Municipality tag, `+`-joined for multi-source plans (repeatable;
        /// defaults to the configured tags)
        #[arg(short, long)]
        tag: Vec<String>,

        /// Also write a JSON snapshot that keeps node attributes
        #[arg(long)]
        json: bool,
    },

    /// Analyse every tag and print the cross-municipality summary as JSON
    Analyze {
        /// Municipality tag (repeatable; defaults to the configured tags)
        #[arg(short, long)]
        tag: Vec<String>,

        /// Write the summary to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show node, edge, and type statistics of one tag
    Info {
        /// Municipality tag
        #[arg(short, long)]
        tag: String,
    },
}

fn load_config(cli: &Cli) -> Result<NetsConfig> {
    let path = cli
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
    NetsConfig::load(Some(path.as_path()))
}

/// Tags from the command line, falling back to the configured list.
fn resolve_tags(cli_tags: Vec<String>, config: &NetsConfig) -> Result<Vec<String>> {
    let tags = if cli_tags.is_empty() {
        config.data.municipality_tags.clone()
    } else {
        cli_tags
    };
    if tags.is_empty() {
        anyhow::bail!("no municipality tags given. Pass --tag or set data.municipality_tags.");
    }
    Ok(tags)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;

    match cli.command {
        Commands::Construct { tag, json } => {
            cmd_construct(&resolve_tags(tag, &config)?, json, &config)
        }
        Commands::Analyze { tag, output } => {
            cmd_analyze(&resolve_tags(tag, &config)?, output.as_deref(), &config)
        }
        Commands::Info { tag } => cmd_info(&tag, &config),
    }
}

fn cmd_construct(tags: &[String], json: bool, config: &NetsConfig) -> Result<()> {
    let save_dir = &config.data.save_path;
    let mut failed = 0usize;

    for tag in tags {
        let graph = match build_graph(tag, &config.data, &config.schema) {
            Ok(graph) => graph,
            Err(e) => {
                eprintln!("{}: {}", tag, e);
                failed += 1;
                continue;
            }
        };
        let path = storage::save_edge_list(save_dir, &graph)?;
        println!(
            "{}: {} nodes, {} edges -> {}",
            tag,
            graph.node_count(),
            graph.edge_count(),
            path.display()
        );
        if json {
            let path = storage::save_json(save_dir, &graph)?;
            println!("{}: snapshot -> {}", tag, path.display());
        }
    }

    if failed > 0 {
        anyhow::bail!("{} of {} tags failed", failed, tags.len());
    }
    Ok(())
}

fn cmd_analyze(tags: &[String], output: Option<&Path>, config: &NetsConfig) -> Result<()> {
    use indicatif::{ProgressBar, ProgressStyle};

    let pb = ProgressBar::new(tags.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("  Analysing [{bar:30.cyan/blue}] {pos}/{len} tags {msg}")
            .context("invalid progress bar template")?
            .progress_chars("##-"),
    );

    let summary = run_batch(tags, config, |tag| {
        pb.set_message(tag.to_string());
        pb.inc(1);
    });
    pb.finish_and_clear();

    let json =
        serde_json::to_string_pretty(&summary).context("failed to serialize batch summary")?;
    match output {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("failed to write summary to {}", path.display()))?;
            eprintln!(
                "Analysed {} tags ({} failed) -> {}",
                summary.municipalities.len(),
                summary.failures.len(),
                path.display()
            );
        }
        None => println!("{}", json),
    }

    for failure in &summary.failures {
        eprintln!("  failed: {} ({})", failure.tag, failure.error);
    }
    Ok(())
}

fn cmd_info(tag: &str, config: &NetsConfig) -> Result<()> {
    let graph = build_graph(tag, &config.data, &config.schema)
        .with_context(|| format!("failed to build network for {}", tag))?;
    let stats = analyze_graph(tag, &graph, config)?;

    println!("Municipality: {}", stats.label);
    println!("Nodes: {}", stats.nodes);
    println!("Edges: {}", stats.edges);
    println!("Density: {:.4}", stats.density);
    println!(
        "Density without isolated nodes: {:.4}",
        stats.density_without_isolated
    );

    println!("\nType counts:");
    for (key, count) in stats.type_counts.iter() {
        if count > 0 {
            println!("  {}: {}", key, count);
        }
    }

    if !stats.projections.is_empty() {
        println!("\nProjections:");
        for p in &stats.projections {
            println!(
                "  {}: {} nodes, {} edges, density {:.4}",
                p.spanning_type, p.nodes, p.edges, p.density
            );
        }
    }

    Ok(())
}
