use anyhow::Result;
use benchy::{
    benchmarks::{GnuTime, HookRunner, RunOptions, SuiteRunner},
    init::init_suite,
    path_utils::expand_path_buf,
    results::{
        extract::{extract_series, write_table},
        ColumnSpec,
    },
};

use clap::{Parser, Subcommand, ValueEnum};
use env_logger::Env;
use log::info;
use std::io;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    version,
    about,
    long_about = "Run directory-structured benchmark suites driven by shell hooks in benchy.yml"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run every group of a suite
    Run {
        /// Suite directory
        suite: PathBuf,

        /// Directory receiving the timestamped results directory
        #[arg(short, long, env = "BENCHY_RESULTS_ROOT", default_value = ".")]
        results_dir: PathBuf,

        /// GNU time binary used to measure each repetition
        #[arg(long, env = "BENCHY_TIME_COMMAND", default_value = GnuTime::DEFAULT_COMMAND)]
        time_command: String,

        /// Show a progress bar per benchmark
        #[arg(short, long)]
        progress: bool,

        /// Do not write system_info into the results directory
        #[arg(long)]
        no_system_info: bool,
    },
    /// Create a suite directory with a template benchy.yml
    Init {
        /// Suite directory
        suite: PathBuf,
    },
    /// Extract columns from results CSVs
    Extract {
        /// Comma separated results CSV files
        #[arg(short, long, value_delimiter = ',', required = true)]
        files: Vec<PathBuf>,

        /// Columns as measurement[:stat],... or all[:stat]
        #[arg(short, long, default_value = "time")]
        columns: String,

        #[arg(long, value_enum, default_value_t = OutputFormat::Csv)]
        format: OutputFormat,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Csv,
    Json,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            suite,
            results_dir,
            time_command,
            progress,
            no_system_info,
        } => {
            let time_command = expand_path_buf(&PathBuf::from(time_command));
            let hooks = HookRunner::new(Box::new(GnuTime::new(
                time_command.to_string_lossy().into_owned(),
            )));
            let runner = SuiteRunner::new(
                hooks,
                RunOptions {
                    results_root: expand_path_buf(&results_dir),
                    show_progress: progress,
                    system_info: !no_system_info,
                },
            );
            let report = runner.run_suite(&expand_path_buf(&suite))?;
            info!(
                "Suite {} completed: mean time {:.2}s over {} groups",
                report.suite,
                report.total.time.mean,
                report.groups.len()
            );
            println!("{}", report.results_dir.display());
        }
        Commands::Init { suite } => {
            init_suite(&expand_path_buf(&suite))?;
        }
        Commands::Extract {
            files,
            columns,
            format,
        } => {
            let specs = ColumnSpec::parse_list(&columns)?;
            let mut series = Vec::new();
            for file in &files {
                series.extend(extract_series(&expand_path_buf(file), &specs)?);
            }
            match format {
                OutputFormat::Csv => write_table(&series, io::stdout().lock())?,
                OutputFormat::Json => {
                    serde_json::to_writer_pretty(io::stdout().lock(), &series)?;
                    println!();
                }
            }
        }
    }

    Ok(())
}
