//! schema-gen - glTF schema flattener
//!
//! Resolves every `$ref` in a glTF JSON-Schema directory and writes the
//! result as JSON or as C source for embedding.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use schema_gen::{check_output, generate, write_output, GenConfig, OutputFormat};

#[derive(Parser)]
#[command(name = "schema-gen")]
#[command(about = "Resolve a glTF JSON-Schema directory and embed it in C source")]
#[command(version)]
struct Cli {
    /// Directory holding the schema files
    schema_dir: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format (overrides config)
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Root schema file name inside SCHEMA_DIR
    #[arg(long)]
    root: Option<String>,

    /// C symbol name
    #[arg(long)]
    symbol: Option<String>,

    /// Maximum bytes per C string literal
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Path to schema-gen.toml
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Never fetch http/https references
    #[arg(long)]
    offline: bool,

    /// Accept output that still contains cyclic `$ref` nodes
    #[arg(long)]
    allow_cycles: bool,

    /// Compare against an existing file instead of writing
    #[arg(long, value_name = "FILE", conflicts_with = "output")]
    check: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn config(&self) -> Result<GenConfig> {
        let mut config = GenConfig::load(self.config.as_deref())?;
        if let Some(format) = self.format {
            config.output.format = format;
        }
        if let Some(root) = &self.root {
            config.output.root = root.clone();
        }
        if let Some(symbol) = &self.symbol {
            config.output.symbol = symbol.clone();
        }
        if let Some(chunk_size) = self.chunk_size {
            config.output.chunk_size = chunk_size;
        }
        if self.offline {
            config.resolver.allow_remote = false;
        }
        if self.allow_cycles {
            config.output.allow_cycles = true;
        }
        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout may carry the generated artifact
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = cli.config()?;
    let text = generate(&cli.schema_dir, &config)?;

    if let Some(check) = &cli.check {
        if !check_output(check, &text)? {
            anyhow::bail!(
                "{} is out of date; regenerate it with schema-gen",
                check.display()
            );
        }
        tracing::info!("{} is in sync", check.display());
        return Ok(());
    }

    match &cli.output {
        Some(path) => {
            write_output(path, &text)?;
            tracing::info!("Wrote {}", path.display());
        }
        None => print!("{}", text),
    }
    Ok(())
}
