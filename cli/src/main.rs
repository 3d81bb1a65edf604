//! unquote CLI - translation passage extraction tool

mod store;

use std::path::{Path, PathBuf};

use clap::{Args, Parser, ValueEnum};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use unquote::markup::DEFAULT_BODY_FONT;
use unquote::pipeline::{extract_document, resolve_pages, DocumentPassages, RunStats};
use unquote::{
    discover_documents, Automation, DocumentFilter, ExtractOptions, PageResolver, Passage,
};

use store::{DbConfig, Store};

const PREVIEW_CHARS: usize = 100;

#[derive(Parser)]
#[command(name = "unquote")]
#[command(version)]
#[command(about = "Extract translations from Word documents to PostgreSQL", long_about = None)]
struct Cli {
    /// Directory containing the .docx files
    #[arg(short, long, value_name = "DIR", env = "UNQUOTE_DIR")]
    directory: PathBuf,

    /// Preview extractions without paginating or saving to the database
    #[arg(long)]
    dry_run: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Print dry-run output as JSON
    #[arg(long, requires = "dry_run")]
    json: bool,

    /// File name prefix of source documents
    #[arg(long, default_value = "YY")]
    prefix: String,

    /// Additional file name prefix to skip (repeatable)
    #[arg(long, value_name = "PREFIX")]
    exclude: Vec<String>,

    /// Body font of the documents; other fonts are kept as spans
    #[arg(long, default_value = DEFAULT_BODY_FONT)]
    default_font: String,

    /// How page numbers are looked up
    #[arg(long, value_enum, default_value = "word")]
    pager: Pager,

    /// Helper program for --pager helper
    #[arg(long, value_name = "PATH", required_if_eq("pager", "helper"))]
    helper: Option<PathBuf>,

    #[command(flatten)]
    db: DbArgs,
}

#[derive(Args)]
struct DbArgs {
    /// Database host
    #[arg(long = "db-host", env = "POSTGRES_HOST", default_value = "localhost")]
    host: String,

    /// Database port
    #[arg(long = "db-port", env = "POSTGRES_PORT", default_value_t = 5432)]
    port: u16,

    /// Database user
    #[arg(long = "db-user", env = "POSTGRES_USER", default_value = "postgres")]
    user: String,

    /// Database password (required unless --dry-run)
    #[arg(long = "db-password", env = "POSTGRES_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Database name, created if missing
    #[arg(long = "db-name", env = "POSTGRES_DB", default_value = "yada")]
    name: String,
}

impl DbArgs {
    fn config(&self) -> Option<DbConfig> {
        let password = self.password.clone().filter(|p| !p.is_empty())?;
        Some(DbConfig {
            host: self.host.clone(),
            port: self.port,
            user: self.user.clone(),
            password,
            database: self.name.clone(),
        })
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Pager {
    /// Search the documents in Microsoft Word
    Word,
    /// Search with an external helper program
    Helper,
    /// Estimate pages from rendered page breaks only
    Layout,
}

fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();

    if let Err(e) = cmd_run(cli) {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn cmd_run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    log::info!("unquote {}", env!("CARGO_PKG_VERSION"));

    if !cli.directory.is_dir() {
        return Err(format!("Directory does not exist: {}", cli.directory.display()).into());
    }
    log::info!("Target directory: {}", cli.directory.display());
    log::info!("Dry run mode: {}", cli.dry_run);

    let config = if cli.dry_run {
        None
    } else {
        let config = cli.db.config().ok_or(
            "POSTGRES_PASSWORD is not set (use --db-password or the POSTGRES_PASSWORD variable)",
        )?;
        Some(config)
    };
    let resolver = build_resolver(cli.pager, cli.helper.as_deref())?;

    let runtime = tokio::runtime::Runtime::new()?;
    let store = match &config {
        Some(config) => Some(runtime.block_on(Store::open(config))?),
        None => {
            log::info!("Skipping database connection (dry run mode)");
            None
        }
    };

    let mut filter = DocumentFilter::new().with_prefix(&cli.prefix);
    for prefix in &cli.exclude {
        filter = filter.exclude(prefix);
    }
    let options = ExtractOptions::new().with_default_font(&cli.default_font);

    let paths = discover_documents(&cli.directory, &filter)?;
    if paths.is_empty() {
        log::warn!("No .docx files found in {}", cli.directory.display());
        return Ok(());
    }
    log::info!("Found {} document(s) to process", paths.len());

    let mut documents = extract_all(&paths, &options);
    let mut stats = RunStats::from_documents(&documents);

    if cli.dry_run {
        if cli.json {
            print_json(&documents)?;
        } else {
            print_dry_run(&documents);
        }
    } else if let Some(store) = store {
        let by_strategy = resolve_pages(&mut documents, &resolver);
        stats = stats.with_pages_by_strategy(by_strategy);

        stats.passages_saved = runtime.block_on(async {
            let saved = save_all(&store, &documents).await;
            store.populate_cite_table().await;
            store.update_cite_book_ids().await;
            store.close().await;
            saved
        });
    }

    print_summary(&stats, cli.dry_run);
    Ok(())
}

fn build_resolver(
    pager: Pager,
    helper: Option<&Path>,
) -> Result<PageResolver, Box<dyn std::error::Error>> {
    Ok(match pager {
        Pager::Word => PageResolver::with_automation(Automation::word()),
        Pager::Helper => {
            let program = helper.ok_or("--helper is required with --pager helper")?;
            PageResolver::with_automation(Automation::helper(program))
        }
        Pager::Layout => PageResolver::layout_only(),
    })
}

fn extract_all(paths: &[PathBuf], options: &ExtractOptions) -> Vec<DocumentPassages> {
    let pb = ProgressBar::new(paths.len() as u64);
    if let Ok(style) = ProgressStyle::default_bar().template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}") {
        pb.set_style(style.progress_chars("#>-"));
    }

    let mut documents = Vec::with_capacity(paths.len());
    for path in paths {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        pb.set_message(name);
        documents.push(extract_document(path, options));
        pb.inc(1);
    }
    pb.finish_with_message("Extracted");

    documents
}

async fn save_all(store: &Store, documents: &[DocumentPassages]) -> usize {
    let mut saved = 0;
    for passage in documents.iter().flat_map(|d| d.passages.iter()) {
        match store.save_passage(passage).await {
            Ok(()) => saved += 1,
            Err(e) => log::error!(
                "Database insertion failed for {} ({}): {}",
                passage.book,
                passage.citation.reference(),
                e
            ),
        }
    }
    saved
}

fn print_json(documents: &[DocumentPassages]) -> Result<(), Box<dyn std::error::Error>> {
    let passages: Vec<&Passage> = documents.iter().flat_map(|d| d.passages.iter()).collect();
    println!("{}", serde_json::to_string_pretty(&passages)?);
    Ok(())
}

fn print_dry_run(documents: &[DocumentPassages]) {
    for document in documents {
        println!(
            "{} Would save {} translation(s) from {}",
            "[DRY RUN]".yellow(),
            document.passages.len(),
            document.name.bold()
        );
        for (i, passage) in document.passages.iter().enumerate() {
            println!("  {} {}:", "Translation".cyan(), i + 1);
            println!("    {}: {}", "Book".bold(), passage.book);
            match passage.page {
                Some(page) => println!("    {}: {}", "Page".bold(), page),
                None => println!("    {}: {}", "Page".bold(), "-".dimmed()),
            }
            println!(
                "    {}: {}",
                "Cite".bold(),
                passage.citation.label.as_deref().unwrap_or("")
            );
            println!("    {}: {}", "Text".bold(), passage.preview(PREVIEW_CHARS));
        }
    }
}

fn print_summary(stats: &RunStats, dry_run: bool) {
    println!();
    println!("{}", "Summary".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!("{}: {}", "Files processed".bold(), stats.files_processed);
    if stats.files_failed > 0 {
        println!("{}: {}", "Files failed".bold(), stats.files_failed.to_string().red());
    }
    println!("{}: {}", "Translations found".bold(), stats.passages_found);
    println!(
        "{}: {}",
        "Discarded (no citation)".bold(),
        stats.passages_discarded
    );
    println!("{}: {}", "Unclosed".bold(), stats.passages_unclosed);
    println!("{}: {}", "Implicitly closed".bold(), stats.implicit_closes);

    if dry_run {
        return;
    }

    if !stats.pages_by_strategy.is_empty() {
        let pages: Vec<String> = stats
            .pages_by_strategy
            .iter()
            .map(|(name, count)| format!("{} via {}", count, name))
            .collect();
        println!("{}: {}", "Page numbers".bold(), pages.join(", "));
    }
    println!("{}: {}", "Translations saved".bold(), stats.passages_saved);

    if stats.passages_found > 0 {
        if stats.passages_lost() == 0 {
            println!("{}", "All translations saved successfully".green().bold());
        } else {
            log::warn!("{} translation(s) failed to save", stats.passages_lost());
            println!(
                "{}",
                format!("{} translation(s) failed to save", stats.passages_lost()).yellow()
            );
        }
    }
}
