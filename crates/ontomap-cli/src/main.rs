//! Ontomap CLI
//!
//! Command-line tooling around exported models:
//! - Converting between the textual formats (N-Triples ↔ Turtle, → DOT)
//! - Rendering a model as a Graphviz DOT graph
//! - Inspecting a model (classes, properties, individuals)
//!
//! The mapping engine itself is a library concern; this binary only works on
//! models that have already crossed the textual boundary.

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::fs;
use std::path::{Path, PathBuf};

use ontomap_io::{deserialize, serialize, ModelFormat};
use ontomap_model::{GraphModel, SchemaPropertyKind};

#[derive(Parser)]
#[command(name = "ontomap")]
#[command(
    author,
    version,
    about = "Ontomap: bidirectional object graph / semantic graph mapping"
)]
struct Cli {
    /// Log filter (e.g. `warn`, `ontomap_engine=debug`)
    #[arg(long, default_value = "warn")]
    log: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a model between formats (format inferred from extensions).
    Convert {
        /// Input model file (.nt or .ttl)
        input: PathBuf,
        /// Output model file (.nt, .ttl or .dot)
        #[arg(short, long)]
        out: PathBuf,
        /// Override the input format
        #[arg(long)]
        from: Option<String>,
        /// Override the output format
        #[arg(long)]
        to: Option<String>,
    },

    /// Render a model as a Graphviz DOT graph.
    Viz {
        /// Input model file (.nt or .ttl)
        input: PathBuf,
        /// Output DOT file
        #[arg(short, long)]
        out: PathBuf,
    },

    /// Print a summary of a model's classes and individuals.
    Inspect {
        /// Input model file (.nt or .ttl)
        input: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&cli.log))
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Convert {
            input,
            out,
            from,
            to,
        } => cmd_convert(&input, &out, from.as_deref(), to.as_deref()),
        Commands::Viz { input, out } => cmd_convert(&input, &out, None, Some("dot")),
        Commands::Inspect { input } => cmd_inspect(&input),
    }
}

fn resolve_format(path: &Path, explicit: Option<&str>) -> Result<ModelFormat> {
    match explicit {
        Some(name) => Ok(ModelFormat::parse(name)?),
        None => ModelFormat::from_path(path)
            .ok_or_else(|| anyhow!("cannot infer model format from `{}`", path.display())),
    }
}

fn load_model(path: &Path, explicit: Option<&str>) -> Result<GraphModel> {
    let format = resolve_format(path, explicit)?;
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read `{}`", path.display()))?;
    let model = deserialize(&text, format)
        .with_context(|| format!("failed to parse `{}`", path.display()))?;
    Ok(model)
}

fn cmd_convert(input: &Path, out: &Path, from: Option<&str>, to: Option<&str>) -> Result<()> {
    let model = load_model(input, from)?;
    let target = resolve_format(out, to)?;
    let text = serialize(&model, target)?;
    fs::write(out, text).with_context(|| format!("failed to write `{}`", out.display()))?;
    println!(
        "{} {} -> {} ({} classes, {} individuals)",
        "✓".green(),
        input.display(),
        out.display(),
        model.class_count(),
        model.individual_count()
    );
    Ok(())
}

fn cmd_inspect(input: &Path) -> Result<()> {
    let model = load_model(input, None)?;

    println!("{}", "Model".bold());
    println!("  base: {}", model.base().to_string().cyan());
    println!(
        "  {} classes, {} individuals, {} disjoint pairs",
        model.class_count(),
        model.individual_count(),
        model.disjoints().count()
    );

    for class in model.classes() {
        println!();
        println!("{} {}", "class".blue().bold(), class.label.bold());
        if !class.comment.is_empty() {
            println!("  source type: {}", class.comment);
        }
        if let Some(superclass) = &class.superclass {
            println!("  superclass: {}", superclass.local_name());
        }
        for prop in &class.properties {
            let kind = match &prop.kind {
                SchemaPropertyKind::Datatype { range } => format!("{range:?}").to_lowercase(),
                SchemaPropertyKind::Object { range } => range.local_name().to_string(),
                SchemaPropertyKind::List { range } => format!("[{}]", range.local_name()),
            };
            println!("  {} : {}", prop.name, kind.dimmed());
        }
        let count = model.individuals_of(&class.iri).count();
        if count > 0 {
            println!("  {} {count}", "individuals:".dimmed());
        }
    }

    Ok(())
}
