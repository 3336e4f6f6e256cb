mod config;
mod files;
mod test_runner;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use fencekit::Document;
use renderer::Report;

use crate::config::{Config, OutputFormat};

#[derive(Parser)]
#[command(
    name = "fencekit",
    version,
    about = "Validate and render interactive lesson blocks in Markdown"
)]
struct Cli {
    /// Disable colored error output
    #[arg(long, global = true)]
    no_color: bool,

    /// Log pipeline progress to stderr (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file (defaults to ./fencekit.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Validate files or directories, exit 1 on any error
    Check(CheckArgs),

    /// Print the rendered output of one page
    Render(RenderArgs),

    /// List the blocks found in one page
    List(ListArgs),

    /// Run .test.md fixture files
    Test(TestArgs),
}

#[derive(clap::Args)]
struct CheckArgs {
    /// Markdown files or directories to scan
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// Only print the summary line
    #[arg(short, long)]
    quiet: bool,
}

#[derive(clap::Args)]
struct RenderArgs {
    /// Markdown page to render
    file: PathBuf,

    /// Output format (defaults to the config's render.format)
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Pretty-print JSON output
    #[arg(long)]
    pretty: bool,
}

#[derive(clap::Args)]
struct ListArgs {
    /// Markdown page to inspect
    file: PathBuf,
}

#[derive(clap::Args)]
struct TestArgs {
    /// Path to a .test.md file or directory containing them
    path: PathBuf,

    /// Run only tests in these categories (subfolder names). Repeatable.
    #[arg(short, long)]
    category: Vec<String>,

    /// List available categories and exit
    #[arg(long)]
    list_categories: bool,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(1);
        }
    };

    let color_choice = if cli.no_color {
        ColorChoice::Never
    } else {
        ColorChoice::Auto
    };

    let exit_code = match cli.command {
        Command::Check(args) => do_check(args, &config, color_choice),
        Command::Render(args) => do_render(args, &config, color_choice),
        Command::List(args) => do_list(args),
        Command::Test(args) => {
            if args.list_categories {
                test_runner::list_categories(&args.path);
                0
            } else {
                test_runner::run_tests(&args.path, cli.no_color, &args.category)
            }
        }
    };
    process::exit(exit_code);
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Read every path into the codespan file database, keeping ids aligned with document ids.
fn load_documents(paths: &[PathBuf], files: &mut SimpleFiles<String, String>) -> (Vec<Document>, usize) {
    let mut documents = Vec::new();
    let mut failures = 0;
    for path in paths {
        match std::fs::read_to_string(path) {
            Ok(source) => {
                let id = files.add(path.display().to_string(), source.clone());
                documents.push(Document::new(id, path, source));
            }
            Err(e) => {
                warn!(path = %path.display(), "cannot read file");
                eprintln!("error: cannot read '{}': {}", path.display(), e);
                failures += 1;
            }
        }
    }
    (documents, failures)
}

fn do_check(args: CheckArgs, config: &Config, color_choice: ColorChoice) -> i32 {
    let paths = files::collect(&args.paths, config);
    let mut files = SimpleFiles::new();
    let (documents, unreadable) = load_documents(&paths, &mut files);

    let reports = renderer::process_documents(&documents);
    if !args.quiet {
        emit_reports(&reports, &files, color_choice);
    }

    let blocks: usize = reports.iter().map(|r| r.descriptors.len()).sum();
    let errors: usize = reports.iter().map(|r| r.errors.len()).sum::<usize>() + unreadable;
    info!(files = documents.len(), blocks, errors, "check finished");

    eprintln!(
        "{}: {} file(s), {} valid block(s), {} error(s)",
        if errors == 0 { "ok" } else { "failed" },
        documents.len(),
        blocks,
        errors
    );
    if errors == 0 { 0 } else { 1 }
}

fn do_render(args: RenderArgs, config: &Config, color_choice: ColorChoice) -> i32 {
    let mut files = SimpleFiles::new();
    let (documents, unreadable) = load_documents(std::slice::from_ref(&args.file), &mut files);
    let Some(document) = documents.first() else {
        return unreadable.min(1) as i32;
    };

    let report = renderer::process_document(document);
    emit_reports(std::slice::from_ref(&report), &files, color_choice);

    let format = args.format.unwrap_or(config.render.format);
    match format {
        OutputFormat::Html => print!("{}", renderer::html::transform_page(document)),
        OutputFormat::Json => {
            let json = if args.pretty || config.render.pretty {
                serde_json::to_string_pretty(&report)
            } else {
                serde_json::to_string(&report)
            };
            match json {
                Ok(json) => println!("{}", json),
                Err(e) => {
                    eprintln!("error: cannot serialize report: {}", e);
                    return 1;
                }
            }
        }
    }

    if report.is_clean() { 0 } else { 1 }
}

fn do_list(args: ListArgs) -> i32 {
    let document = match Document::load(0, &args.file) {
        Ok(document) => document,
        Err(e) => {
            eprintln!("error: cannot read '{}': {}", args.file.display(), e);
            return 1;
        }
    };

    let mut status = 0;
    for extracted in document.blocks() {
        match extracted {
            Ok(block) => println!(
                "{:<6} {:<18} lines {}-{}",
                block.id.index, block.kind, block.span.start_line, block.span.end_line
            ),
            Err(e) => {
                println!("{:<6} {:<18} {}", e.location.block.map_or(0, |b| b.index), "(malformed)", e);
                status = 1;
            }
        }
    }
    status
}

fn emit_reports(reports: &[Report], files: &SimpleFiles<String, String>, color_choice: ColorChoice) {
    let writer = StandardStream::stderr(color_choice);
    let config = term::Config::default();
    for error in reports.iter().flat_map(|r| &r.errors) {
        let diagnostic = error.to_diagnostic();
        let _ = term::emit_to_write_style(&mut writer.lock(), &config, files, &diagnostic);
    }
}
