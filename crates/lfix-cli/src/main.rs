//! lfix CLI - Command line interface for the linker migration tool

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use ariadne::{Color, Label, Report, ReportKind, Source};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use walkdir::WalkDir;

use lfix_ast::{Forest, Frontend, SourceFile};
use lfix_emit::{snapshot_name, write_diffs, Emitter};
use lfix_parser::{CFrontend, ParseError};
use lfix_refactor::{closure, MigrationPlan, Pipeline};
use lfix_symbols::Program;

#[derive(Parser)]
#[command(name = "lfix")]
#[command(about = "Extract, rewrite and re-emit linker sources as a library", long_about = None)]
struct Cli {
    /// Log stage summaries (LFIX_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full migration, writing snapshots l.0 to l.4 and patches
    Run {
        /// Plan file (JSON); defaults to the built-in arm64 plan
        #[arg(short, long)]
        plan: Option<PathBuf>,
        /// Go source tree
        #[arg(short, long, env = "GOROOT")]
        goroot: PathBuf,
        /// Output directory
        #[arg(short, long, default_value = ".")]
        out: PathBuf,
        /// Skip writing patches between snapshots
        #[arg(long)]
        no_diff: bool,
    },
    /// List the dependency closure of some roots
    Deps {
        /// Root symbol (repeatable)
        #[arg(short, long = "root")]
        roots: Vec<String>,
        /// Extra typedef name (repeatable)
        #[arg(short, long = "typedef")]
        typedefs: Vec<String>,
        /// Files or directories
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Parse a file and output the resolved forest as JSON
    Parse {
        /// Input file
        file: PathBuf,
        /// Pretty print the output
        #[arg(short, long)]
        pretty: bool,
    },
    /// Print the built-in plan as JSON
    Plan,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Run {
            plan,
            goroot,
            out,
            no_diff,
        } => cmd_run(plan.as_deref(), &goroot, &out, no_diff),
        Commands::Deps {
            roots,
            typedefs,
            paths,
        } => cmd_deps(roots, typedefs, &paths),
        Commands::Parse { file, pretty } => cmd_parse(&file, pretty),
        Commands::Plan => cmd_plan(),
    }
}

fn init_tracing(verbose: bool) {
    let level = if verbose { "info" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_env("LFIX_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("Error: {}", message);
    process::exit(1);
}

fn cmd_run(plan_path: Option<&Path>, goroot: &Path, out: &Path, no_diff: bool) {
    let plan = match plan_path {
        Some(path) => MigrationPlan::load(path).unwrap_or_else(|e| fail(e)),
        None => MigrationPlan::default(),
    };
    info!(plan = %plan.name, goroot = %goroot.display(), "starting migration");

    let frontend = CFrontend::default().with_typedefs(plan.typedefs.iter().cloned());

    let paths = plan.source_paths(goroot).unwrap_or_else(|e| fail(e));
    let sources = read_sources(&paths);
    let forest = parse_or_exit(&frontend, &sources);

    let header = read_sources(&[goroot.join(&plan.ctxt.header)]);
    let fields = parse_or_exit(&frontend, &header)
        .aggregate_fields(&plan.ctxt.aggregate)
        .unwrap_or_else(|| {
            warn!(aggregate = %plan.ctxt.aggregate, "context aggregate not found");
            Vec::new()
        });

    let mut program = Program::build(forest);
    let emitter = Emitter::new(plan.output_map(), plan.filter.clone(), plan.include_block());
    let pipeline = Pipeline::from_plan(&plan, fields);

    let result = pipeline.run::<Box<dyn std::error::Error>, _>(&mut program, |stage, _, program| {
        emitter.emit(program, &out.join(snapshot_name(stage)))?;
        Ok(())
    });
    if let Err(e) = result {
        fail(e);
    }

    if !no_diff {
        if let Err(e) = write_diffs(out) {
            fail(e);
        }
    }
    println!("{} symbols in {}", program.len(), out.display());
}

fn cmd_deps(roots: Vec<String>, typedefs: Vec<String>, paths: &[PathBuf]) {
    let roots = if roots.is_empty() {
        vec!["span".to_string(), "asmb".to_string()]
    } else {
        roots
    };

    let files: BTreeSet<PathBuf> = paths.iter().flat_map(|p| expand(p)).collect();
    let files: Vec<PathBuf> = files.into_iter().collect();
    let sources = read_sources(&files);
    let frontend = CFrontend::default().with_typedefs(typedefs);
    let program = Program::build(parse_or_exit(&frontend, &sources));

    let ids = roots.iter().filter_map(|name| {
        let id = program.lookup(name);
        if id.is_none() {
            warn!(root = %name, "root not found");
        }
        id
    });
    let deps = closure(&program, ids);

    for &id in program.symbols() {
        if deps.contains(&id) {
            println!(
                "{}\t{}:{}",
                program.name(id),
                program.file_of(id),
                program.decl(id).span.line
            );
        }
    }
}

/// A directory becomes every `.c` and `.h` file under it
fn expand(path: &Path) -> Vec<PathBuf> {
    if !path.is_dir() {
        return vec![path.to_path_buf()];
    }
    WalkDir::new(path)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|p| matches!(p.extension().and_then(|e| e.to_str()), Some("c" | "h")))
        .collect()
}

fn cmd_parse(file: &Path, pretty: bool) {
    let sources = read_sources(&[file.to_path_buf()]);
    let forest = parse_or_exit(&CFrontend::default(), &sources);
    print_json(&forest, pretty);
}

fn cmd_plan() {
    print_json(&MigrationPlan::default(), true);
}

fn print_json(value: &impl serde::Serialize, pretty: bool) {
    let json = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    match json {
        Ok(json) => println!("{}", json),
        Err(e) => fail(e),
    }
}

fn read_sources(paths: &[PathBuf]) -> Vec<SourceFile> {
    paths
        .iter()
        .map(|path| match fs::read_to_string(path) {
            Ok(text) => SourceFile::new(path.to_string_lossy(), text),
            Err(e) => fail(format!("reading {}: {}", path.display(), e)),
        })
        .collect()
}

fn parse_or_exit(frontend: &CFrontend, sources: &[SourceFile]) -> Forest {
    match frontend.read_many(sources) {
        Ok(forest) => forest,
        Err(e) => {
            match sources.get(e.span().file.0 as usize) {
                Some(source) => report_parse_error(source, &e),
                None => eprintln!("Error: {}", e),
            }
            process::exit(1);
        }
    }
}

fn report_parse_error(source: &SourceFile, error: &ParseError) {
    let span = error.span();
    let _ = Report::build(ReportKind::Error, source.path.clone(), span.start)
        .with_message(error.to_string())
        .with_label(
            Label::new((source.path.clone(), span.start..span.end))
                .with_message(error.to_string())
                .with_color(Color::Red),
        )
        .finish()
        .eprint((source.path.clone(), Source::from(source.text.as_str())));
}
