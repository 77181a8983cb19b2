/* 📖 # The commentary command

`commentary scan` extracts comments from files on disk and prints them as
JSON (the same document the HTTP API returns) or as a plain listing.
Without path arguments it scans the `[[directory]]` roots of
`commentary.toml`. A directory argument is walked for every supported
extension.

`commentary serve` runs the HTTP API until the process is stopped.

Exit codes:
- 0: at least one file was scanned (or the server shut down cleanly)
- 1: nothing could be scanned, or a fatal error such as a broken config
*/

mod output;

use std::env;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand, ValueEnum};
use commentary_base::pal::http::HttpServerConfig;
use commentary_base::tracing::init_tracing;
use commentary_base::{CommentaryResult, FilePath, PalHandle, RealPal, err};
use commentary_engine::{
    ApiService, CommentFilter, Config, SyntaxTable, extract_files, load_config, scan_files,
};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "commentary", version, about = "Extract comments from source files")]
struct Cli {
    /// Configuration file
    #[arg(long, global = true, default_value = "commentary.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract comments from files and print them
    Scan(ScanArgs),
    /// Serve the HTTP API
    Serve(ServeArgs),
}

#[derive(Args, Debug)]
struct ScanArgs {
    /// Files or directories to scan (default: configured directories)
    paths: Vec<PathBuf>,

    /// Which comments to report: all, todo or doc
    #[arg(long, value_parser = parse_filter)]
    filter: Option<CommentFilter>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// Address to bind (overrides the configuration)
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on (overrides the configuration)
    #[arg(long)]
    port: Option<u16>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Text,
}

fn parse_filter(value: &str) -> Result<CommentFilter, String> {
    value.parse::<CommentFilter>().map_err(|e| e.to_string())
}

fn main() -> ExitCode {
    if let Err(e) = init_tracing() {
        eprintln!("Warning: {}", e);
    }

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Scan(args) => run_scan(&cli.config, args),
        Command::Serve(args) => run_serve(&cli.config, args),
    };

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn open_workspace(config_path: &Path) -> CommentaryResult<(PalHandle, Config)> {
    let current_dir =
        env::current_dir().map_err(|e| err!("Failed to get current directory: {}", e))?;
    let pal = PalHandle::new(RealPal::new(current_dir));
    let config = load_config(&pal, &FilePath::from(config_path))?;
    Ok((pal, config))
}

/// Returns whether any file was scanned.
fn run_scan(config_path: &Path, args: ScanArgs) -> CommentaryResult<bool> {
    let (pal, config) = open_workspace(config_path)?;
    let table = config.syntax_table()?;
    let filter = args.filter.unwrap_or(config.default_filter);

    let paths = if args.paths.is_empty() {
        let scan = scan_files(&pal, &config);
        for error in &scan.errors {
            eprintln!("  - {}", error);
        }
        scan.files
    } else {
        let requested: Vec<FilePath> = args
            .paths
            .iter()
            .map(|path| FilePath::from(path.as_path()))
            .collect();
        expand_paths(&pal, &table, &requested)
    };
    info!(files = paths.len(), %filter, "scanning");

    let report = extract_files(&pal, &table, &paths, filter);
    for error in &report.errors {
        eprintln!("  - {}", error);
    }

    let rendered = match args.format {
        OutputFormat::Json => output::render_json(&report)?,
        OutputFormat::Text => output::render_text(&report),
    };
    print!("{}", rendered);

    if report.is_empty() {
        eprintln!("No comments found: no file could be scanned.");
        return Ok(false);
    }
    Ok(true)
}

/// Replace directory arguments by the supported files below them.
///
/// Anything that is neither a file nor a walkable directory is kept as is,
/// so reading it reports the error for that path.
fn expand_paths(pal: &PalHandle, table: &SyntaxTable, requested: &[FilePath]) -> Vec<FilePath> {
    let globs: Vec<String> = table
        .iter()
        .map(|(extension, _)| format!("**/*.{}", extension))
        .collect();
    let mut files = Vec::new();
    for path in requested {
        if pal.file_exists(path).unwrap_or(false) {
            files.push(path.clone());
            continue;
        }
        match pal.walk_directory(path, &globs) {
            Ok(walk) => {
                for entry in walk {
                    match entry {
                        Ok(file) => files.push(file),
                        Err(e) => warn!("skipping entry below {}: {}", path, e),
                    }
                }
            }
            Err(_) => files.push(path.clone()),
        }
    }
    files
}

fn run_serve(config_path: &Path, args: ServeArgs) -> CommentaryResult<bool> {
    let (pal, config) = open_workspace(config_path)?;
    let service = ApiService::from_config(&config)?;

    let host = args.host.unwrap_or_else(|| config.server.host.clone());
    let port = args.port.unwrap_or(config.server.port);
    let server_config = HttpServerConfig::new(host.clone())
        .with_port(port)
        .with_max_body_bytes(config.server.max_upload_bytes);

    let handle = pal.start_http_server(Box::new(service), server_config)?;
    println!("Serving on http://{}", handle.address(&host));
    handle.wait();
    Ok(true)
}
