//! Ridefare CLI - Clean ride-share expense exports into billing workbooks
//!
//! # Main Commands
//!
//! ```bash
//! ridefare serve                          # Start HTTP server (port 3000)
//! ridefare clean rides.csv                # Cleaned report with rider subtotals
//! ridefare merge uber.csv lyft.xlsx       # Two exports in one report
//! ridefare split cleaned_report.xlsx      # One workbook per county code
//! ```
//!
//! # Debug Commands
//!
//! ```bash
//! ridefare inspect rides.csv              # Detected layout + canonical rows as JSON
//! ```

use clap::{Parser, Subcommand};
use ridefare::{
    inspect, merge, normalize_and_aggregate, split_source, Report, ServerConfig, SourceFile,
};
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "ridefare")]
#[command(about = "Clean, merge and split ride-share expense exports", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Normalize one export and add per-rider subtotals
    Clean {
        /// Input CSV or XLSX file
        input: PathBuf,

        /// Output workbook
        #[arg(short, long, default_value = "cleaned_report.xlsx")]
        output: PathBuf,
    },

    /// Clean two exports and combine them into one report
    Merge {
        /// First input file
        first: PathBuf,

        /// Second input file
        second: PathBuf,

        /// Output workbook
        #[arg(short, long, default_value = "merged_report.xlsx")]
        output: PathBuf,
    },

    /// Split a cleaned report into one workbook per category
    Split {
        /// Cleaned or merged report
        input: PathBuf,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        dir: PathBuf,
    },

    /// Show the detected layout and the canonical rows as JSON
    Inspect {
        /// Input CSV or XLSX file
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Start HTTP server
    Serve {
        /// Port to listen on (default: RIDEFARE_PORT or 3000)
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Clean { input, output } => cmd_clean(&input, &output),
        Commands::Merge {
            first,
            second,
            output,
        } => cmd_merge(&first, &second, &output),
        Commands::Split { input, dir } => cmd_split(&input, &dir),
        Commands::Inspect { input, output } => cmd_inspect(&input, output.as_deref()),
        Commands::Serve { port } => cmd_serve(port).await,
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn cmd_clean(input: &Path, output: &Path) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Cleaning: {}", input.display());

    let report = normalize_and_aggregate(&SourceFile::from_path(input)?)?;
    save_report(&report, output)?;

    eprintln!("\n✨ Done!");
    Ok(())
}

fn cmd_merge(first: &Path, second: &Path, output: &Path) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Merging: {} + {}", first.display(), second.display());

    let report = merge(&SourceFile::from_path(first)?, &SourceFile::from_path(second)?)?;
    save_report(&report, output)?;

    eprintln!("\n✨ Done!");
    Ok(())
}

fn cmd_split(input: &Path, dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("✂️  Splitting: {}", input.display());

    let reports = split_source(&SourceFile::from_path(input)?)?;
    if reports.is_empty() {
        return Err("Could not split: 'Internal Note' missing or empty".into());
    }

    fs::create_dir_all(dir)?;
    for (category, report) in &reports {
        save_report(report, &dir.join(format!("{}.xlsx", category)))?;
    }

    eprintln!("\n✨ Done! {} report(s) in {}", reports.len(), dir.display());
    Ok(())
}

fn cmd_inspect(input: &Path, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("🔍 Inspecting: {}", input.display());

    let (info, table) = inspect(&SourceFile::from_path(input)?)?;
    eprintln!("   Layout: {}", info.layout);
    eprintln!("   Rows: {}", info.row_count);

    let json = serde_json::to_string_pretty(&json!({
        "layout": info,
        "columns": table.columns(),
        "records": table.to_records(),
    }))?;
    write_output(&json, output)?;

    Ok(())
}

async fn cmd_serve(port: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = ServerConfig::from_env();
    if let Some(port) = port {
        config = config.with_port(port);
    }
    ridefare::server::start_server(config).await
}

fn save_report(report: &Report, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    fs::write(path, &report.workbook)?;

    let summary = &report.summary;
    eprintln!(
        "   💾 {}: {} rows, {} riders, total {:.2}",
        path.display(),
        summary.data_rows,
        summary.groups,
        summary.grand_total
    );
    Ok(())
}

fn write_output(content: &str, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("   💾 Saved to: {}", p.display());
        }
        None => println!("{}", content),
    }
    Ok(())
}
