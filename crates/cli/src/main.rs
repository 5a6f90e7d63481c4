//! protoshift CLI: convert classes to constructor functions in place.
//!
//! Calls `protoshift-core` directly; the file is only rewritten when the
//! whole document converts.

use clap::Parser;
use std::path::{Path, PathBuf};

use protoshift_core::config::CONFIG_FILE_NAME;
use protoshift_core::{convert_file, convert_source, load_config, load_config_file, ConvertConfig, DONE_MESSAGE};

/// Rewrite class declarations into constructor functions plus prototype methods.
#[derive(Parser)]
#[command(name = "protoshift", version, about)]
struct Cli {
    /// Document to convert in place
    #[arg(default_value = "ConsolidatedDashboard.gs")]
    path: PathBuf,

    /// Config file (default: .protoshift.toml next to the document)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Only convert these classes (repeatable)
    #[arg(long = "class", value_name = "NAME")]
    classes: Vec<String>,

    /// Convert every class found, not only configured ones
    #[arg(long)]
    all: bool,

    /// Also rewrite array-destructured callback parameters
    #[arg(long)]
    fix_destructuring: bool,

    /// Print the converted document instead of writing it
    #[arg(long)]
    stdout: bool,

    /// Print the conversion report as JSON
    #[arg(long)]
    json: bool,
}

fn resolve_config(cli: &Cli) -> Result<ConvertConfig, protoshift_core::ConvertError> {
    let mut config = match &cli.config {
        Some(path) => load_config_file(path)?,
        None => {
            let dir = cli.path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
            tracing::debug!(dir = %dir.display(), "Looking for {CONFIG_FILE_NAME}");
            load_config(dir)
        }
    };

    if !cli.classes.is_empty() {
        config.restrict_to(&cli.classes);
    }
    if cli.all {
        config.convert_all = true;
    }
    if cli.fix_destructuring {
        config.fix_destructuring = true;
    }
    Ok(config)
}

fn run(cli: &Cli) -> Result<(), protoshift_core::ConvertError> {
    let config = resolve_config(cli)?;

    let report = if cli.stdout {
        let source = std::fs::read_to_string(&cli.path)
            .map_err(|e| protoshift_core::ConvertError::Io { path: cli.path.clone(), source: e })?;
        let converted = convert_source(&source, &config)?;
        print!("{}", converted.text);
        converted.report
    } else {
        convert_file(&cli.path, &config)?
    };

    if cli.json {
        match serde_json::to_string_pretty(&report) {
            // Keep stdout clean for the document itself.
            Ok(json) if cli.stdout => eprintln!("{json}"),
            Ok(json) => println!("{json}"),
            Err(e) => tracing::warn!("Could not serialize report: {e}"),
        }
    } else if !cli.stdout {
        println!("{DONE_MESSAGE}");
    }
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("protoshift=warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(&cli) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
