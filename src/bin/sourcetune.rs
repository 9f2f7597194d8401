use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::Parser;
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use sourcetune::app::App;
use sourcetune::config::TuneConfig;
use sourcetune::coverm::{FilterToolStatus, SystemCovermClient};
use sourcetune::error::TuneError;
use sourcetune::output::{ConsoleOutput, JsonOutput, OutputMode};

#[derive(Parser)]
#[command(name = "sourcetune")]
#[command(
    about = "Sweep read-mapping filter parameters and tabulate per-source abundance at every grid point"
)]
#[command(version, author)]
struct Cli {
    /// Output directory of a completed source-apportionment run (holds mappings.bam)
    #[arg(short = 'i', long)]
    outdir: Utf8PathBuf,

    /// Directory containing the formatted reference database
    #[arg(short = 'd', long)]
    database: Utf8PathBuf,

    /// Path the consolidated matrix is written to (".tune.csv" is appended)
    #[arg(short = 'o', long)]
    out_file: Utf8PathBuf,

    /// Threads forwarded to the filtering tool
    #[arg(short = 't', long, default_value_t = 1)]
    threads: usize,

    /// Normalize portions to genome equivalents (pass only if the original run did)
    #[arg(long)]
    use_geq: bool,

    /// Substitute the quantification limit for detected-but-unquantifiable genomes
    #[arg(long)]
    correct_loq: bool,

    #[arg(long, global = true)]
    non_interactive: bool,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(tune) = report.downcast_ref::<TuneError>() {
            return ExitCode::from(map_exit_code(tune));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &TuneError) -> u8 {
    match error {
        TuneError::SourceMapRead(_)
        | TuneError::SourceMapParse(_)
        | TuneError::EmptySourceMap(_)
        | TuneError::CensusRead(_)
        | TuneError::CensusParse(_)
        | TuneError::AbundanceRead(_)
        | TuneError::AbundanceParse(_) => 2,
        TuneError::MissingTool(_) | TuneError::FilterFailed(_) => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output_mode = if cli.non_interactive {
        OutputMode::NonInteractive
    } else {
        OutputMode::Interactive
    };

    let config = TuneConfig {
        outdir: strip_trailing_slash(cli.outdir),
        database: strip_trailing_slash(cli.database),
        threads: cli.threads,
        use_geq: cli.use_geq,
        correct_loq: cli.correct_loq,
        out_file: cli.out_file,
    };

    let filter = SystemCovermClient::new();
    if let FilterToolStatus::Missing { message } = filter.tool_status() {
        return Err(miette::Report::new(TuneError::MissingTool(message)));
    }

    let app = App::new(config, filter);

    match output_mode {
        OutputMode::NonInteractive => {
            let result = app.tune(&JsonOutput).map_err(miette::Report::new)?;
            JsonOutput::print_tune(&result).into_diagnostic()?;
        }
        OutputMode::Interactive => {
            println!("Beginning tuning sweep");
            let result = app.tune(&ConsoleOutput).map_err(miette::Report::new)?;
            print_tune_summary(&result);
        }
    }

    Ok(())
}

fn strip_trailing_slash(path: Utf8PathBuf) -> Utf8PathBuf {
    let trimmed = path.as_str().trim_end_matches('/');
    if trimmed.is_empty() || trimmed.len() == path.as_str().len() {
        path
    } else {
        Utf8PathBuf::from(trimmed)
    }
}

fn print_tune_summary(result: &sourcetune::app::TuneResult) {
    let green = "\x1b[32m";
    let yellow = "\x1b[33m";
    let cyan = "\x1b[36m";
    let reset = "\x1b[0m";

    println!("{cyan}Tuning sweep complete{reset}");
    println!(
        "{green}{} iterations across {} sources{reset}",
        result.iterations,
        result.sources.len()
    );
    if result.rescaled_points > 0 {
        println!(
            "{yellow}{} iterations required rescaling of genome-equivalent portions{reset}",
            result.rescaled_points
        );
    }
    println!("{green}Matrix written to {}{reset}", result.output_path);
}
