// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Drawing Renamer CLI
//!
//! Serves the interactive web UI, or drives the same session operations
//! in batch: export a rename sheet for a set of drawings, or apply a
//! completed sheet and write the renamed-files archive.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use drawing_renamer::config::AppConfig;
use drawing_renamer::materialize::output_name;
use drawing_renamer::{RenamerError, Result, Session, UploadedFile};

/// Drawing Renamer CLI - batch rename drawings via spreadsheet
#[derive(Parser, Debug)]
#[command(name = "drawing-renamer")]
#[command(author = "Jonathan D. A. Jewell <hyperpolymath>")]
#[command(version = "1.0.0")]
#[command(about = "Batch renamer for drawing files", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (JSON format)
    #[arg(short, long, default_value = "config.json", global = true)]
    config: PathBuf,

    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable trace logging (most verbose)
    #[arg(long, global = true)]
    trace: bool,

    /// Output format for results
    #[arg(long, global = true, default_value = "text", value_parser = ["text", "json"])]
    format: String,

    /// Suppress non-essential output (quiet mode)
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the interactive web UI
    Serve {
        /// Host to bind to
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Write a blank rename sheet listing the given drawings
    Export {
        /// Drawing files or directories containing them
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Output spreadsheet (default: configured export file name)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Rename drawings and write them to a zip archive
    Process {
        /// Drawing files or directories containing them
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Completed rename sheet to apply
        #[arg(short, long)]
        sheet: Option<PathBuf>,

        /// Output archive (default: configured archive file name)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Show the final names without writing the archive
        #[arg(long)]
        dry_run: bool,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Generate default configuration file
    Generate {
        /// Output file path
        #[arg(short, long, default_value = "config.json")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else if cli.quiet {
        "warn"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let config = AppConfig::load(&cli.config)?;

    match cli.command {
        Some(Commands::Serve { host, port }) => run_serve(config, host, port).await,
        Some(Commands::Export { files, output }) => run_export(config, &files, output),
        Some(Commands::Process { files, sheet, output, dry_run }) => {
            run_process(config, &files, sheet, output, dry_run, &cli.format)
        }
        Some(Commands::Config { action }) => run_config_command(config, action),
        None => run_serve(config, None, None).await,
    }
}

/// Run the web UI
async fn run_serve(mut config: AppConfig, host: Option<String>, port: Option<u16>) -> Result<()> {
    if let Some(host) = host {
        config.web.host = host;
    }
    if let Some(port) = port {
        config.web.port = port;
    }
    drawing_renamer::web::start_server(config).await
}

/// Expand directories (one level) into the drawings they contain
fn collect_drawings(paths: &[PathBuf], config: &AppConfig) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for path in paths {
        if path.is_dir() {
            let mut found: Vec<PathBuf> = std::fs::read_dir(path)?
                .filter_map(|e| e.ok())
                .map(|e| e.path())
                .filter(|p| p.is_file())
                .filter(|p| {
                    let name = p.file_name().and_then(|n| n.to_str()).unwrap_or("");
                    let keep = config.uploads.accepts(name);
                    if !keep {
                        warn!("Skipping unsupported file: {:?}", p);
                    }
                    keep
                })
                .collect();
            found.sort();
            files.extend(found);
        } else {
            files.push(path.clone());
        }
    }

    Ok(files)
}

/// Start a session with the given drawings uploaded
fn load_session(config: AppConfig, paths: &[PathBuf]) -> Result<Session> {
    let uploads = collect_drawings(paths, &config)?
        .iter()
        .map(|p| UploadedFile::from_path(p))
        .collect::<Result<Vec<_>>>()?;

    let mut session = Session::new(config);
    session.upload(uploads)?;
    Ok(session)
}

fn run_export(config: AppConfig, files: &[PathBuf], output: Option<PathBuf>) -> Result<()> {
    let session = load_session(config, files)?;
    let download = session.export_spreadsheet()?;

    let output = output.unwrap_or_else(|| PathBuf::from(&download.file_name));
    std::fs::write(&output, &download.bytes)?;
    println!("Exported {} file names to {}", session.table().len(), output.display());
    Ok(())
}

fn run_process(
    config: AppConfig,
    files: &[PathBuf],
    sheet: Option<PathBuf>,
    output: Option<PathBuf>,
    dry_run: bool,
    format: &str,
) -> Result<()> {
    let mut session = load_session(config, files)?;

    if let Some(sheet) = sheet {
        let bytes = std::fs::read(&sheet)?;
        session.import_spreadsheet(&bytes)?;
        info!("Applied rename sheet {:?}", sheet);
    }

    if dry_run {
        for entry in session.table() {
            println!("{} -> {}", entry.original_name, output_name(entry));
        }
        return Ok(());
    }

    let archive = session.process()?;
    let output = output.unwrap_or_else(|| PathBuf::from(&archive.file_name));
    write_archive(&output, &archive.bytes)?;

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&archive.report)?),
        _ => {
            for file in &archive.report.written {
                println!("{} -> {}", file.original_name, file.output_name);
            }
            for name in &archive.report.skipped {
                println!("skipped: {}", name);
            }
            println!("\nWrote {}", output.display());
        }
    }

    Ok(())
}

fn write_archive(path: &Path, bytes: &[u8]) -> Result<()> {
    if path.is_dir() {
        return Err(RenamerError::Config(format!(
            "{} is a directory; pass a file name for the archive",
            path.display()
        )));
    }
    std::fs::write(path, bytes)?;
    Ok(())
}

/// Run config commands
fn run_config_command(config: AppConfig, action: ConfigCommands) -> Result<()> {
    match action {
        ConfigCommands::Show => {
            let json = serde_json::to_string_pretty(&config)?;
            println!("{}", json);
        }
        ConfigCommands::Generate { output } => {
            AppConfig::default().save(&output)?;
            println!("Generated config at {:?}", output);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::try_parse_from(["drawing-renamer"]).unwrap();
        assert!(!cli.verbose);
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_cli_process_command() {
        let cli = Cli::try_parse_from([
            "drawing-renamer", "process", "a.pdf", "b.pdf", "--sheet", "names.xlsx", "--dry-run",
        ])
        .unwrap();

        match cli.command {
            Some(Commands::Process { files, sheet, dry_run, .. }) => {
                assert_eq!(files, vec![PathBuf::from("a.pdf"), PathBuf::from("b.pdf")]);
                assert_eq!(sheet, Some(PathBuf::from("names.xlsx")));
                assert!(dry_run);
            }
            _ => panic!("Expected Process command"),
        }
    }

    #[test]
    fn test_cli_export_requires_files() {
        assert!(Cli::try_parse_from(["drawing-renamer", "export"]).is_err());
    }

    #[test]
    fn test_collect_drawings_filters_directories() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.pdf"), b"b").unwrap();
        std::fs::write(dir.path().join("a.png"), b"a").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"n").unwrap();

        let files = collect_drawings(&[dir.path().to_path_buf()], &AppConfig::default()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["a.png", "b.pdf"]);
    }
}
