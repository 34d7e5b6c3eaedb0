//! Factorygen CLI - Console Front End
//!
//! Commands: scan, generate, demo
//! Outputs JSON to stdout
//! Returns non-zero on round failure

use clap::{Parser, Subcommand};
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use factorygen_core::{
    demo::PizzaStore,
    diagnostics::CollectingSink,
    emitter::{FsSink, MemorySink},
    BuildUnit, RoundProcessor,
};

#[derive(Parser)]
#[command(name = "factorygen-cli")]
#[command(about = "Factorygen CLI - Annotation-Driven Factory Generator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a round without writing sources; print the factory models
    Scan {
        /// Path to a build-unit JSON file
        #[arg(short, long)]
        unit: PathBuf,
    },

    /// Run a round and write one .rs file per generated factory
    Generate {
        /// Path to a build-unit JSON file
        #[arg(short, long)]
        unit: PathBuf,

        /// Output directory for generated sources
        #[arg(short, long, default_value = "generated")]
        out: PathBuf,
    },

    /// Run the pizza-store example and take an order
    Demo {
        /// Meal id to order; omit for an interactive prompt
        #[arg(short, long)]
        order: Option<String>,
    },
}

fn load_unit(path: &PathBuf) -> Result<BuildUnit, String> {
    let content =
        fs::read_to_string(path).map_err(|e| format!("failed to read {}: {}", path.display(), e))?;
    serde_json::from_str(&content).map_err(|e| format!("invalid build unit: {}", e))
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Commands::Scan { unit } => {
            let unit = match load_unit(&unit) {
                Ok(u) => u,
                Err(e) => {
                    eprintln!(r#"{{"error": "{}"}}"#, e);
                    return ExitCode::FAILURE;
                }
            };

            let mut processor = RoundProcessor::new();
            let mut sink = MemorySink::new();
            let mut diagnostics = CollectingSink::new();

            match processor.process(&unit, &mut sink, &mut diagnostics) {
                Ok(report) => {
                    let output = serde_json::json!({
                        "report": report,
                        "factories": sink.artifacts,
                    });
                    println!("{}", serde_json::to_string_pretty(&output).unwrap());
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    let output = serde_json::json!({
                        "error": e.to_string(),
                        "diagnostics": diagnostics.diagnostics,
                    });
                    println!("{}", serde_json::to_string_pretty(&output).unwrap());
                    ExitCode::from(2) // Round aborted
                }
            }
        }

        Commands::Generate { unit, out } => {
            let unit = match load_unit(&unit) {
                Ok(u) => u,
                Err(e) => {
                    eprintln!(r#"{{"error": "{}"}}"#, e);
                    return ExitCode::FAILURE;
                }
            };

            let mut processor = RoundProcessor::new();
            let mut sink = FsSink::new(&out);
            let mut diagnostics = CollectingSink::new();

            match processor.process(&unit, &mut sink, &mut diagnostics) {
                Ok(report) => {
                    println!("{}", serde_json::to_string_pretty(&report).unwrap());
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    let output = serde_json::json!({
                        "error": e.to_string(),
                        "diagnostics": diagnostics.diagnostics,
                    });
                    println!("{}", serde_json::to_string_pretty(&output).unwrap());
                    ExitCode::from(2)
                }
            }
        }

        Commands::Demo { order } => {
            let store = match PizzaStore::open() {
                Ok(s) => s,
                Err(e) => {
                    eprintln!("failed to open the pizza store: {}", e);
                    return ExitCode::FAILURE;
                }
            };

            let meal_name = match order {
                Some(name) => name,
                None => match read_console(&store) {
                    Ok(name) => name,
                    Err(e) => {
                        eprintln!("failed to read order: {}", e);
                        return ExitCode::FAILURE;
                    }
                },
            };

            match store.order(Some(meal_name.trim())) {
                Ok(meal) => {
                    println!("Bill: ${}", meal.price());
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    eprintln!("{}", e);
                    ExitCode::from(2)
                }
            }
        }
    }
}

fn read_console(store: &PizzaStore) -> io::Result<String> {
    println!("What do you like? ({})", store.menu().join(", "));
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().lock().read_line(&mut input)?;
    Ok(input)
}
