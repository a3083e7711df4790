use std::{fs::File, io::BufWriter, path::PathBuf, process::ExitCode};

use anyhow::{anyhow, Context};
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use hookpatch::{
    class::{collect_class_files, process_files, ProcessOptions},
    hook::{ConsoleDiagnostics, DiagnoseOnly, Diagnostics, RewritePolicy, StaticFactory},
    MatchReport,
};

/// Finds `lombok.patcher.Hook` constructions in compiled classes and optionally rewrites them
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Paths to class files to be processed. Directories are processed recursively
    #[arg(required = true)]
    class_files: Vec<PathBuf>,

    /// Prints lots of status information as the hook converter runs
    #[arg(short, long)]
    verbose: bool,

    /// Do not print every hook that is found
    #[arg(short, long)]
    quiet: bool,

    /// What to do with a recognized hook construction
    #[arg(long, value_enum, default_value_t = Mode::Diagnose)]
    mode: Mode,

    /// Class declaring the factory method, e.g. `lombok/patcher/Hooks`
    #[arg(long, required_if_eq("mode", "factory"))]
    factory_owner: Option<String>,

    /// Name of the static factory method
    #[arg(long, required_if_eq("mode", "factory"))]
    factory_name: Option<String>,

    /// Write every match as JSON to this file
    #[arg(long)]
    report: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Report matches, change nothing
    Diagnose,
    /// Replace `new Hook(...)` with a static factory call
    Factory,
}

/// Console output plus collection for the JSON report
struct Reporter {
    console: bool,
    collected: Vec<MatchReport>,
}

impl Diagnostics for Reporter {
    fn report(&mut self, report: &MatchReport) {
        if self.console {
            ConsoleDiagnostics.report(report);
        }
        self.collected.report(report);
    }
}

fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let policy: Box<dyn RewritePolicy> = match args.mode {
        Mode::Diagnose => Box::new(DiagnoseOnly),
        Mode::Factory => {
            let owner = args
                .factory_owner
                .clone()
                .ok_or_else(|| anyhow!("--factory-owner is required with --mode factory"))?;
            let name = args
                .factory_name
                .clone()
                .ok_or_else(|| anyhow!("--factory-name is required with --mode factory"))?;
            Box::new(StaticFactory::new(owner, name))
        }
    };

    let files = collect_class_files(&args.class_files);
    let options = ProcessOptions {
        verbose: args.verbose,
        show_progress: !args.verbose && files.len() > 1,
    };
    let mut reporter = Reporter {
        console: !args.quiet,
        collected: Vec::new(),
    };

    let summary = process_files(&files, options, policy.as_ref(), &mut reporter);

    if let Some(path) = &args.report {
        let file = File::create(path)
            .with_context(|| format!("Unable to create report {}", path.display()))?;
        serde_json::to_writer_pretty(BufWriter::new(file), &reporter.collected)?;
    }

    if summary.failed > 0 {
        tracing::warn!("{} file(s) could not be processed", summary.failed);
    }

    Ok(if summary.visited == 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}
