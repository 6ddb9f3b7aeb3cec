//! ProcessForge CLI - Bridge interface for the chat backend
//!
//! Commands: types, validate, serialize
//! Outputs JSON (or the raw document) to stdout, logs to stderr
//! Returns 2 on a rejected graph, 1 on I/O or usage problems

use clap::{Parser, Subcommand};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use processforge_core::{
    export, ElementKind, FailureMode, GraphSerializer, Linter, SerializeError, SerializerConfig,
};

#[derive(Parser)]
#[command(name = "processforge-cli")]
#[command(about = "ProcessForge CLI - Process Graph to BPMN Serializer")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to a serializer config file (JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log stage progress to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List recognized node types
    Types,

    /// Validate a process graph
    Validate {
        /// Graph JSON file, or `-` for stdin
        #[arg(short, long, default_value = "-")]
        input: String,

        /// Treat lint warnings as failures
        #[arg(long)]
        strict: bool,
    },

    /// Serialize a process graph to BPMN
    Serialize {
        /// Graph JSON file, or `-` for stdin
        #[arg(short, long, default_value = "-")]
        input: String,

        /// Write the document into this directory instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Print an export descriptor with the document base64-encoded
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = match &cli.config {
        Some(path) => match SerializerConfig::load(path) {
            Ok(c) => c,
            Err(e) => {
                print_json(&serde_json::json!({ "error": e.to_string() }));
                return ExitCode::FAILURE;
            }
        },
        None => SerializerConfig::default(),
    };

    let serializer = GraphSerializer::new(config);

    match cli.command {
        Commands::Types => {
            let types: Vec<_> = ElementKind::ALL
                .iter()
                .map(|k| serde_json::json!({
                    "type": k.type_tag(),
                    "element": k.element_name(),
                }))
                .collect();

            print_json(&serde_json::json!(types));
            ExitCode::SUCCESS
        }

        Commands::Validate { input, strict } => {
            let value = match read_input(&input) {
                Ok(v) => v,
                Err(e) => {
                    print_json(&serde_json::json!({ "valid": false, "error": e }));
                    return ExitCode::FAILURE;
                }
            };

            let checked = serializer.decode(&value).and_then(|graph| {
                serializer.validate(&graph)?;
                Ok(graph)
            });

            match checked {
                Ok(graph) => {
                    let mode = if strict { FailureMode::Block } else { FailureMode::Warn };
                    let report = Linter::new(mode).lint(&graph);
                    print_json(&serde_json::json!(report));
                    if report.valid {
                        ExitCode::SUCCESS
                    } else {
                        ExitCode::from(2)  // Blocking lint findings
                    }
                }
                Err(e) => {
                    print_json(&rejection("valid", &e));
                    ExitCode::from(2)
                }
            }
        }

        Commands::Serialize { input, out, json } => {
            let value = match read_input(&input) {
                Ok(v) => v,
                Err(e) => {
                    print_json(&serde_json::json!({ "success": false, "error": e }));
                    return ExitCode::FAILURE;
                }
            };

            let graph = match serializer.decode(&value) {
                Ok(g) => g,
                Err(e) => {
                    print_json(&rejection("success", &e));
                    return ExitCode::from(2);
                }
            };

            if let Some(dir) = out {
                return match export::write_to_dir(&serializer, &graph, &dir) {
                    Ok(exported) => {
                        print_json(&serde_json::json!({ "success": true, "document": exported }));
                        ExitCode::SUCCESS
                    }
                    Err(export::ExportError::Serialize(e)) => {
                        print_json(&rejection("success", &e));
                        ExitCode::from(2)
                    }
                    Err(e) => {
                        print_json(&serde_json::json!({ "success": false, "error": e.to_string() }));
                        ExitCode::FAILURE
                    }
                };
            }

            if json {
                return match export::package(&serializer, &graph) {
                    Ok((exported, _)) => {
                        print_json(&serde_json::json!({ "success": true, "document": exported }));
                        ExitCode::SUCCESS
                    }
                    Err(export::ExportError::Serialize(e)) => {
                        print_json(&rejection("success", &e));
                        ExitCode::from(2)
                    }
                    Err(e) => {
                        print_json(&serde_json::json!({ "success": false, "error": e.to_string() }));
                        ExitCode::FAILURE
                    }
                };
            }

            match serializer.serialize(&graph) {
                Ok(document) => {
                    // Raw bytes, no trailing newline
                    print!("{}", document);
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    print_json(&rejection("success", &e));
                    ExitCode::from(2)
                }
            }
        }
    }
}

fn read_input(input: &str) -> Result<serde_json::Value, String> {
    let content = if input == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .map_err(|e| format!("Failed to read stdin: {}", e))?;
        buf
    } else {
        std::fs::read_to_string(Path::new(input))
            .map_err(|e| format!("Failed to read {}: {}", input, e))?
    };

    serde_json::from_str(&content).map_err(|e| format!("Invalid JSON: {}", e))
}

fn rejection(status_key: &str, e: &SerializeError) -> serde_json::Value {
    serde_json::json!({
        status_key: false,
        "kind": e.kind(),
        "error": e.to_string(),
    })
}

fn print_json(value: &serde_json::Value) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{}", s),
        Err(_) => println!("{}", value),
    }
}
