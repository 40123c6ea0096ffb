use anyhow::Context;
use clap::{Parser, Subcommand};
use lru_bench::config::messages;
use lru_bench::report::Summary;
use lru_bench::tasks::{self, Pipeline, ProcessRunner};
use lru_bench::{BenchConfig, Calibration, WorkloadGenerator};
use std::path::PathBuf;
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(name = "lru-bench", version, about = "Cache comparison benchmark tooling")]
struct Cli {
    /// Project root; defaults to the nearest directory with a Cargo.toml
    #[arg(long, global = true, env = "LRU_BENCH_ROOT")]
    root: Option<PathBuf>,

    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Commit tracked changes, then run clippy with --fix
    Clippy,
    /// Run the cache_comparison bench and write reports/summary.txt
    Bench {
        /// Open the HTML report afterwards
        #[arg(long)]
        open: bool,
        /// Skip cargo and only rebuild reports from existing criterion output
        #[arg(long)]
        skip_run: bool,
    },
    /// clippy, cargo test, then bench
    Test {
        #[arg(long)]
        open: bool,
    },
    /// Rebuild reports/ from existing criterion output without running anything
    Summary {
        #[arg(long)]
        open: bool,
    },
    /// Print per-backend hit rates for the configured workload
    Calibrate,
}

fn finish(summary: &Summary, open: bool) {
    print!("{summary}");
    if open {
        summary.open_html();
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    lru_bench::telemetry::init_tracing(cli.verbose);

    let cwd = std::env::current_dir().context("reading current directory")?;
    let root = tasks::resolve_root(cli.root, &cwd)?;
    let config = BenchConfig::from_env().context(messages::CONFIG_LOAD_FAILED)?;
    debug!(root = %root.display(), ?config, "resolved configuration");

    let mut runner = ProcessRunner;
    let mut pipeline = Pipeline::new(&root, &config, &mut runner);

    match cli.command {
        Commands::Clippy => pipeline.clippy()?,
        Commands::Bench { open, skip_run } => {
            let summary = if skip_run {
                pipeline.report().context(messages::REPORT_FAILED)?
            } else {
                pipeline.bench()?
            };
            finish(&summary, open);
        }
        Commands::Test { open } => {
            let summary = pipeline.test()?;
            finish(&summary, open);
        }
        Commands::Summary { open } => {
            let summary = pipeline.report().context(messages::REPORT_FAILED)?;
            finish(&summary, open);
        }
        Commands::Calibrate => {
            let ops = WorkloadGenerator::new(config.workload_seed)
                .generate(&config)
                .context(messages::WORKLOAD_GEN_FAILED)?;
            info!(ops = ops.len(), "running calibration");
            let calibration = Calibration::run(&config, &ops)?;
            println!("{calibration}");
        }
    }

    Ok(())
}
