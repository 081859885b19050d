use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use log::{debug, info};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::time::Instant;
use tsdeps_graph::{
    Config, DEFAULT_CONFIG_FILE, DEFAULT_OUTPUT_FILE, DependencyGraph, build_dependency_graph,
};

#[derive(Parser)]
#[command(name = "tsdeps")]
#[command(about = "Map every file of a TypeScript project to the project files it imports", long_about = None)]
struct Cli {
    /// Defaults to `build` with the default paths
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Build the dependency graph and write it as JSON
    Build(BuildArgs),
    /// List files reachable from a file in a previously built graph
    Related(RelatedArgs),
}

#[derive(Debug, Args)]
struct BuildArgs {
    /// YAML configuration with `project_path` and `ignore`
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Where to write the JSON graph
    #[arg(long, default_value = DEFAULT_OUTPUT_FILE)]
    output: PathBuf,
}

impl Default for BuildArgs {
    fn default() -> Self {
        Self { config: PathBuf::from(DEFAULT_CONFIG_FILE), output: PathBuf::from(DEFAULT_OUTPUT_FILE) }
    }
}

#[derive(Debug, Args)]
struct RelatedArgs {
    /// Project-relative path of the starting file
    file: String,

    /// Maximum number of import hops; below one lists nothing
    #[arg(long, default_value = "1", allow_negative_numbers = true)]
    depth: i64,

    /// Graph written by `build`
    #[arg(long, default_value = DEFAULT_OUTPUT_FILE)]
    graph: PathBuf,
}

fn main() -> Result<()> {
    env_logger::init();

    // stdio is blocked by LineWriter, use a BufWriter to reduce syscalls.
    // See https://github.com/rust-lang/rust/issues/60673
    let mut stdout = BufWriter::new(std::io::stdout());

    let cli = Cli::parse();
    debug!("Parsed CLI arguments: {:?}", cli.command);

    match cli.command.unwrap_or_else(|| Commands::Build(BuildArgs::default())) {
        Commands::Build(args) => {
            let start = Instant::now();
            info!(
                "Building dependency graph from {} (using {} threads)",
                args.config.display(),
                rayon::current_num_threads()
            );

            let cfg = Config::load(&args.config)?;
            debug!("Config: {:?}", cfg);

            let graph = build_dependency_graph(&cfg)?;
            let written = graph.write_to(&args.output)?;
            info!("Finished in {}ms on {} files", start.elapsed().as_millis(), graph.len());

            writeln!(
                stdout,
                "{} Dependency graph written to {}",
                "✓".green().bold(),
                written.display().to_string().cyan()
            )?;
        }
        Commands::Related(args) => {
            let graph = DependencyGraph::load(&args.graph)?;
            let related = graph.related_files(&args.file, args.depth);
            debug!("{} files related to {} within depth {}", related.len(), args.file, args.depth);

            for file in related {
                writeln!(stdout, "{}", file)?;
            }
        }
    }

    stdout.flush()?;
    Ok(())
}
