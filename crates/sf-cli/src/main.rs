//! Steadfast CLI
//!
//! Offline tools: normalize user input, compile lists into a dynamic-rule
//! file, drive the message router against a file-backed store, and export
//! the TypeScript message types.

mod compile;
mod files;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use serde_json::Value;
use ts_rs::TS;

use sf_core::config::FilterConfig;
use sf_core::{normalize_domain, normalize_keyword};
use sf_worker::messages::{
    BlockedData, KeywordsData, NotesData, SiteAdded, SiteRemoved, StateData, ToggleData,
};
use sf_worker::{MessageRouter, Request, Response};

use crate::compile::{compile_rules, write_rules, CompileInputs};
use crate::files::{FileRuleApi, FileSeeds, FileStore};

#[derive(Parser)]
#[command(name = "sf-cli")]
#[command(about = "Steadfast blocklist compiler and tools")]
struct Cli {
    /// Filter config JSON (defaults match the packaged extension)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Normalize domains or keywords the way the popup does
    Normalize {
        /// Values to normalize
        #[arg(required = true)]
        values: Vec<String>,

        /// Treat values as keywords instead of domains
        #[arg(short, long)]
        keyword: bool,
    },

    /// Compile lists into a dynamic rule JSON file
    Compile {
        /// JSON seed domain arrays
        #[arg(short, long)]
        seed: Vec<String>,

        /// Plain-text, hosts-file or `||domain^` lists
        #[arg(short, long)]
        list: Vec<String>,

        /// Keyword lists (JSON array or one per line)
        #[arg(short, long)]
        keywords: Vec<String>,

        /// Output rule file
        #[arg(short, long, default_value = "rules.json")]
        output: String,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Send one message to the router over a file-backed store
    Send {
        /// Message JSON, e.g. '{"type":"addSite","domain":"example.com"}'
        message: String,

        /// Directory holding storage.json and rules.json
        #[arg(long, default_value = ".steadfast")]
        state: PathBuf,

        /// Unpacked extension directory the seed paths are relative to
        #[arg(long, default_value = ".")]
        extension: PathBuf,
    },

    /// Reconcile rules and the counter with storage
    Init {
        #[arg(long, default_value = ".steadfast")]
        state: PathBuf,

        #[arg(long, default_value = ".")]
        extension: PathBuf,
    },

    /// Export TypeScript declarations for the message types
    Types {
        #[arg(short, long, default_value = "bindings")]
        output: PathBuf,
    },
}

fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_logging();
    let cli = Cli::parse();

    let result = load_config(cli.config.as_deref()).and_then(|config| match cli.command {
        Commands::Normalize { values, keyword } => cmd_normalize(&values, keyword),
        Commands::Compile {
            seed,
            list,
            keywords,
            output,
            verbose,
        } => cmd_compile(
            &CompileInputs {
                seeds: seed,
                lists: list,
                keywords,
            },
            &output,
            &config,
            verbose,
        ),
        Commands::Send {
            message,
            state,
            extension,
        } => cmd_send(&message, &state, &extension, config),
        Commands::Init { state, extension } => cmd_init(&state, &extension, config),
        Commands::Types { output } => cmd_types(&output),
    });

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn load_config(path: Option<&Path>) -> Result<FilterConfig, String> {
    match path {
        Some(path) => FilterConfig::load(path).map_err(|e| e.to_string()),
        None => Ok(FilterConfig::default()),
    }
}

fn file_router(state: &Path, extension: &Path, config: FilterConfig) -> MessageRouter<FileStore, FileRuleApi, FileSeeds> {
    let seeds = FileSeeds::new(extension, &config);
    MessageRouter::new(FileStore::new(state), FileRuleApi::new(state), seeds, config)
}

fn runtime() -> Result<tokio::runtime::Runtime, String> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("Failed to start runtime: {}", e))
}

fn cmd_normalize(values: &[String], keyword: bool) -> Result<(), String> {
    for value in values {
        let normalized = if keyword {
            normalize_keyword(value)
        } else {
            normalize_domain(value)
        };
        match normalized {
            Some(normalized) => println!("{}\t{}", value, normalized),
            None => println!("{}\t(invalid)", value),
        }
    }
    Ok(())
}

fn cmd_compile(inputs: &CompileInputs, output: &str, config: &FilterConfig, verbose: bool) -> Result<(), String> {
    let (rule_set, stats) = compile_rules(inputs, config, verbose)?;
    write_rules(Path::new(output), &rule_set)?;

    println!("Compiled {} rules to '{}'", rule_set.len(), output);
    println!("  Lines:    {} ({} rejected)", stats.lines, stats.rejected);
    println!("  Domains:  {} (duplicates removed {})", stats.domains, stats.duplicates);
    println!("  Keywords: {}", stats.keywords);
    println!("  Time:     {:.1}ms", stats.total_ms);

    Ok(())
}

fn cmd_send(message: &str, state: &Path, extension: &Path, config: FilterConfig) -> Result<(), String> {
    let message: Value = serde_json::from_str(message).map_err(|e| format!("Message is not JSON: {}", e))?;
    let router = file_router(state, extension, config);

    let response: Response = runtime()?.block_on(router.handle(&message));
    let text = serde_json::to_string_pretty(&response.to_value()).map_err(|e| e.to_string())?;
    println!("{}", text);

    if response.ok {
        Ok(())
    } else {
        Err(response.error.unwrap_or_default())
    }
}

fn cmd_init(state: &Path, extension: &Path, config: FilterConfig) -> Result<(), String> {
    let router = file_router(state, extension, config);
    let report = runtime()?
        .block_on(router.ensure_initialized())
        .map_err(|e| e.to_string())?;

    println!(
        "Installed {} rules ({} domain, {} keyword), removed {}",
        report.added, report.domain_rules, report.keyword_rules, report.removed
    );
    Ok(())
}

fn cmd_types(output: &Path) -> Result<(), String> {
    let export = |result: Result<(), ts_rs::ExportError>| result.map_err(|e| format!("Failed to export types: {}", e));

    export(Request::export_all_to(output))?;
    export(Response::export_all_to(output))?;
    export(StateData::export_all_to(output))?;
    export(SiteAdded::export_all_to(output))?;
    export(SiteRemoved::export_all_to(output))?;
    export(ToggleData::export_all_to(output))?;
    export(KeywordsData::export_all_to(output))?;
    export(BlockedData::export_all_to(output))?;
    export(NotesData::export_all_to(output))?;

    println!("Exported message types to '{}'", output.display());
    Ok(())
}
