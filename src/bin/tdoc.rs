//! Tabledoc CLI - parse AsciiDoc tables and their nested cell documents

#[cfg(feature = "cli")]
use clap::Parser;
use std::fs;
use std::io::{self, Read};
use std::path::Path;
use std::process::ExitCode;
use tabledoc::{
    diagnostics::format_diagnostics, parse_document_with_resolver, CallerAttribute,
    ParseOptions, StdFileResolver,
};

#[cfg(feature = "cli")]
#[derive(Parser)]
#[command(name = "tdoc")]
#[command(version)]
#[command(about = "Tabledoc - AsciiDoc table and nested cell document parser", long_about = None)]
struct Cli {
    /// Input file path (reads from stdin if not provided)
    input_file: Option<String>,

    /// Set a hard attribute: NAME, NAME=VALUE, or NAME! to unset
    #[arg(short = 'a', long = "attribute", value_name = "NAME[=VALUE]")]
    attributes: Vec<String>,

    /// Extra directory searched for include targets
    #[arg(short = 'I', long = "include-dir", value_name = "DIR")]
    include_dirs: Vec<String>,

    /// Lock an attribute against the document text
    #[arg(long = "lock", value_name = "NAME")]
    locked: Vec<String>,

    /// Secure mode: lock attributes exposing the environment
    #[arg(long)]
    secure: bool,

    /// Strict mode: fail on the first table cell that cannot be parsed
    #[arg(long)]
    strict: bool,

    /// Print the document tree as JSON
    #[arg(long)]
    json: bool,

    /// Check mode - only report diagnostics
    #[arg(long)]
    check: bool,

    /// Disable colored diagnostics
    #[arg(long)]
    no_color: bool,
}

#[cfg(feature = "cli")]
fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("TABLEDOC_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    match run(&cli) {
        Ok(code) => code,
        Err(message) => {
            eprintln!("error: {}", message);
            ExitCode::FAILURE
        }
    }
}

#[cfg(feature = "cli")]
fn run(cli: &Cli) -> Result<ExitCode, String> {
    let options = build_options(cli)?;

    // Read input
    let (input, mut resolver) = match cli.input_file {
        Some(ref path) => {
            let input = fs::read_to_string(path).map_err(|e| format!("{}: {}", path, e))?;
            let base = Path::new(path)
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            (input, StdFileResolver::with_base_dir(base))
        }
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .map_err(|e| e.to_string())?;
            (buffer, StdFileResolver::with_base_dir("."))
        }
    };
    for dir in &cli.include_dirs {
        resolver.add_search_path(dir);
    }

    let output =
        parse_document_with_resolver(&input, &resolver, options).map_err(|e| e.to_string())?;

    if cli.check {
        println!("{}", format_diagnostics(&output.diagnostics, !cli.no_color));
    } else {
        if !output.diagnostics.is_empty() {
            eprintln!("{}", format_diagnostics(&output.diagnostics, !cli.no_color));
        }
        if cli.json {
            let json = serde_json::to_string_pretty(&output.document).map_err(|e| e.to_string())?;
            println!("{}", json);
        } else {
            println!("{:#?}", output.document);
        }
    }

    if let Some(fatal) = &output.fatal {
        eprintln!("error: {}", fatal);
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

#[cfg(feature = "cli")]
fn build_options(cli: &Cli) -> Result<ParseOptions, String> {
    let mut options = if cli.secure {
        ParseOptions::secure()
    } else {
        ParseOptions::new()
    };
    options.abort_on_cell_failure = cli.strict;
    if let Some(path) = &cli.input_file {
        options.file_name = Some(path.clone());
    }

    for spec in &cli.attributes {
        let (name, attr) = CallerAttribute::parse(spec)
            .ok_or_else(|| format!("invalid attribute: {}", spec))?;
        options.attributes.insert(name, attr);
    }
    for name in &cli.locked {
        options = options.lock_attribute(name);
    }
    Ok(options)
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI feature not enabled. Rebuild with --features cli");
}
