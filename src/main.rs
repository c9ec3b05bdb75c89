use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use cfgml_core::{translate_with, ParseOptions, Translation};
use clap::{Parser, ValueEnum};
use miette::{Context, IntoDiagnostic, Result};
use tempfile::NamedTempFile;

/// Translates the educational configuration language into XML.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Where to write the translated document.
    #[arg(short, long)]
    output: PathBuf,

    /// Source file to read. Reads standard input when omitted.
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Fail on dictionary keys that are not valid names instead of skipping them.
    #[arg(long)]
    strict: bool,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = Format::Xml)]
    format: Format,

    /// Log more (-v for info, -vv for debug). `RUST_LOG` overrides this.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Xml,
    Json,
    Yaml,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let (source, name) = read_source(args.input.as_deref())?;
    let options = ParseOptions::new().strict_keys(args.strict);
    let translation = translate_with(&source, &name, options)?;
    let rendered = render(&translation, args.format)?;

    write_atomically(&args.output, &rendered)?;
    eprintln!("converted to {}", args.output.display());
    Ok(())
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn read_source(input: Option<&Path>) -> Result<(String, String)> {
    match input {
        Some(path) => {
            let source = fs::read_to_string(path)
                .into_diagnostic()
                .wrap_err_with(|| format!("failed to read '{}'", path.display()))?;
            Ok((source, path.display().to_string()))
        }
        None => {
            let mut source = String::new();
            io::stdin()
                .read_to_string(&mut source)
                .into_diagnostic()
                .wrap_err("failed to read standard input")?;
            Ok((source, "<stdin>".to_string()))
        }
    }
}

fn render(translation: &Translation, format: Format) -> Result<String> {
    match format {
        Format::Xml => Ok(translation.to_xml()),
        Format::Json => translation.to_json().into_diagnostic(),
        Format::Yaml => translation.to_yaml().into_diagnostic(),
    }
}

/// Writes through a temporary file in the destination directory, so a failed
/// write never leaves a partial destination behind.
fn write_atomically(path: &Path, contents: &str) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut file = NamedTempFile::new_in(dir)
        .into_diagnostic()
        .wrap_err_with(|| format!("failed to create a file in '{}'", dir.display()))?;
    file.write_all(contents.as_bytes()).into_diagnostic()?;
    file.persist(path)
        .into_diagnostic()
        .wrap_err_with(|| format!("failed to write '{}'", path.display()))?;
    log::debug!("wrote {} bytes to {}", contents.len(), path.display());
    Ok(())
}
