// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! Topolens CLI - offline routing and what-if analysis for link-state topologies

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use std::io::IsTerminal;
use std::path::PathBuf;
use topolens::analysis::Granularity;
use topolens::commands::{self, export::ExportFormat, Globals};
use topolens::config;
use topolens::output::Output;
use topolens::types::LinkIndex;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "topolens")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode (print results and errors only)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Configuration file path
    #[arg(short, long, global = true, env = "TOPOLENS_CONFIG")]
    config: Option<PathBuf>,

    /// Disable colored output (any non-empty `NO_COLOR` counts)
    #[arg(
        long,
        global = true,
        env = "NO_COLOR",
        value_parser = clap::builder::FalseyValueParser::new()
    )]
    no_color: bool,

    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Scenario file with simulated link edits
    #[arg(long, global = true, value_name = "SCENARIO")]
    overrides: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show counts, components and fingerprint of a topology
    Summary {
        /// Topology JSON file
        topology: PathBuf,
    },

    /// Cheapest path between two routers
    Path {
        /// Topology JSON file
        topology: PathBuf,
        /// Source router
        from: String,
        /// Destination router
        to: String,
    },

    /// All simple paths between two routers, cheapest first
    Paths {
        /// Topology JSON file
        topology: PathBuf,
        /// Source router
        from: String,
        /// Destination router
        to: String,
        /// Maximum links per path
        #[arg(long)]
        max_hops: Option<usize>,
        /// Maximum number of paths
        #[arg(long)]
        max_results: Option<usize>,
    },

    /// Best path cost between every ordered country pair
    Matrix {
        /// Topology JSON file
        topology: PathBuf,
        /// How countries are represented
        #[arg(long, value_enum)]
        granularity: Option<Granularity>,
        /// Maximum country pairs to evaluate
        #[arg(long)]
        cap: Option<usize>,
    },

    /// Routers carrying traffic between other countries
    Transit {
        /// Topology JSON file
        topology: PathBuf,
        /// How countries are represented
        #[arg(long, value_enum)]
        granularity: Option<Granularity>,
        /// Maximum country pairs to evaluate
        #[arg(long)]
        cap: Option<usize>,
        /// Show only the most exposed routers
        #[arg(long)]
        top: Option<usize>,
    },

    /// Country pairs rerouted or disconnected by failures
    Impact {
        /// Topology JSON file
        topology: PathBuf,
        /// Link index to fail (repeatable)
        #[arg(long = "fail-link", value_name = "INDEX")]
        fail_links: Vec<LinkIndex>,
        /// Router to fail (repeatable)
        #[arg(long = "fail-node", value_name = "ID")]
        fail_nodes: Vec<String>,
    },

    /// Export the effective topology
    Export {
        /// Topology JSON file
        topology: PathBuf,
        /// Output format
        #[arg(short, long, value_enum, default_value_t = ExportFormat::Json)]
        format: ExportFormat,
        /// Output file (stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Compare simulated edits with the base topology
    Diff {
        /// Topology JSON file
        topology: PathBuf,
    },

    /// Generate shell completions
    Completions {
        /// Shell type (bash, zsh, fish, powershell, elvish)
        shell: clap_complete::Shell,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = config::load(cli.config.as_deref())?;

    // Initialize logging
    let filter = if std::env::var_os("RUST_LOG").is_some() {
        EnvFilter::from_default_env()
    } else {
        let level = match cli.verbose {
            0 if cli.quiet => "error",
            0 => config.log_level.as_str(),
            1 => "debug",
            _ => "trace",
        };
        EnvFilter::new(level)
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let output = Output::new(cli.json, !cli.no_color && std::io::stdout().is_terminal()).quiet(cli.quiet);
    let globals = Globals {
        config,
        output,
        overrides: cli.overrides,
    };

    // Execute command
    match cli.command {
        Commands::Summary { topology } => commands::summary::run(&globals, &topology),
        Commands::Path { topology, from, to } => commands::path::run(&globals, &topology, &from, &to),
        Commands::Paths {
            topology,
            from,
            to,
            max_hops,
            max_results,
        } => commands::paths::run(&globals, &topology, &from, &to, max_hops, max_results),
        Commands::Matrix {
            topology,
            granularity,
            cap,
        } => commands::matrix::run(&globals, &topology, granularity, cap),
        Commands::Transit {
            topology,
            granularity,
            cap,
            top,
        } => commands::transit::run(&globals, &topology, granularity, cap, top),
        Commands::Impact {
            topology,
            fail_links,
            fail_nodes,
        } => commands::impact::run(&globals, &topology, fail_links, fail_nodes),
        Commands::Export {
            topology,
            format,
            output,
        } => commands::export::run(&globals, &topology, format, output),
        Commands::Diff { topology } => commands::diff::run(&globals, &topology),
        Commands::Completions { shell } => commands::completions::run(shell, Cli::command()),
    }
}
