// Command-line entry point for Codegraph.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use codegraph::api::ApiServer;
use codegraph::application::CodegraphService;
use codegraph::config::CodegraphConfig;
use codegraph::domain::{Language, Project};
use codegraph::infrastructure::concurrency::init_thread_pool;
use codegraph::infrastructure::{DotExporter, JsonExporter};
use codegraph::ports::OutputExporter;
use tracing::warn;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract the declaration graph of one source file
    Graph {
        file: PathBuf,

        #[arg(short, long, value_enum, default_value = "json")]
        format: Format,

        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List a directory as a source tree
    Tree {
        dir: Option<PathBuf>,

        #[arg(short, long)]
        lang: Option<Language>,

        /// List the root of this project instead of DIR
        #[arg(short, long)]
        project: Option<String>,
    },
    /// Extract every supported file under a directory
    Index {
        dir: PathBuf,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Run the line-delimited JSON server
    Serve {
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Format {
    Json,
    Dot,
}

fn init_tracing(verbose: u8) {
    use tracing_subscriber::EnvFilter;

    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn emit(content: &str, output: Option<&PathBuf>) -> Result<()> {
    match output {
        Some(path) => std::fs::write(path, content)
            .with_context(|| format!("Cannot write {}", path.display())),
        None => {
            println!("{content}");
            Ok(())
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = CodegraphConfig::load_or_default(cli.config.as_deref())
        .context("Failed to load configuration")?;
    let service = CodegraphService::new(&config);

    match cli.command {
        Command::Graph {
            file,
            format,
            output,
        } => {
            let graph = service
                .graph(&file)
                .with_context(|| format!("Cannot build graph for {}", file.display()))?;
            let rendered = match format {
                Format::Json => JsonExporter::default().render(&graph)?,
                Format::Dot => DotExporter.render(&graph)?,
            };
            emit(&rendered, output.as_ref())?;
        }
        Command::Tree { dir, lang, project } => {
            let tree = match (project, dir) {
                (Some(name), _) => {
                    service.projects().set_current(Project::new(0, name, ""));
                    service.tree(lang)?
                }
                (None, Some(dir)) => service.tree_at(&dir, lang)?,
                (None, None) => service.tree_at(&PathBuf::from("."), lang)?,
            };
            emit(&serde_json::to_string_pretty(&tree)?, None)?;
        }
        Command::Index { dir, output } => {
            if let Err(e) = init_thread_pool() {
                warn!(error = %e, "using default thread pool");
            }
            let index = service.index(&dir)?;
            let report = serde_json::to_string_pretty(&index.report())?;
            emit(&report, output.as_ref())?;
            if index.failure_count() > 0 {
                eprintln!(
                    "{} file(s) extracted, {} skipped",
                    index.len(),
                    index.failure_count()
                );
            }
        }
        Command::Serve { port } => {
            let mut server_config = config.server.clone();
            if let Some(port) = port {
                server_config.port = port;
            }
            let server = ApiServer::bind(&server_config.address(), Arc::new(service))?;
            server.run()?;
        }
    }

    Ok(())
}
