use clap::{Args, Parser, Subcommand, ValueEnum};
use fenster::{
    Anchor, Batch, EmptyWindowPolicy, Job, Manifest, Outcome, Reducer, Resampler, Window,
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "fenster")]
#[command(about = "Resample irregular sensor data into regular time windows", version)]
struct Cli {
    /// Increase verbosity
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resample a single delimited text file
    Window(WindowArgs),

    /// Resample every file listed in a TOML manifest
    Batch {
        /// Path to the manifest
        manifest: PathBuf,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
enum WindowKind {
    /// Fixed-width time windows
    Resample,
}

#[derive(Args)]
struct WindowArgs {
    /// Kind of windowing
    #[arg(long = "type", value_enum, default_value_t = WindowKind::Resample)]
    kind: WindowKind,

    /// Input has a header row (always required, accepted for compatibility)
    #[arg(long)]
    header: bool,

    /// Input file
    #[arg(short, long)]
    input: PathBuf,

    /// Output file
    #[arg(short, long)]
    output: PathBuf,

    /// Name of the time column
    #[arg(long)]
    time_column: String,

    /// Value columns to aggregate (comma separated); all others if omitted
    #[arg(long, value_delimiter = ',')]
    columns: Vec<String>,

    /// Window duration, e.g. 5T, 30s, 1h
    #[arg(short, long, value_parser = Window::parse)]
    window: Window,

    /// Reducer: mean, sum, min, max, count, first, last
    #[arg(short, long, default_value = "mean")]
    method: Reducer,

    /// Window anchor: epoch, start, or a timestamp
    #[arg(long, default_value = "epoch")]
    anchor: Anchor,

    /// What to do with windows without observations: emit, omit
    #[arg(long, default_value = "emit")]
    empty: EmptyWindowPolicy,

    /// Text written for empty aggregates
    #[arg(long, default_value = "")]
    marker: String,

    /// Field delimiter
    #[arg(short, long, default_value_t = ',')]
    delimiter: char,
}

fn group_thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);

    for (idx, c) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }

    out
}

/// Prints per-job results, returns `true` if no job failed.
fn print_outcomes(jobs: &[Job], outcomes: &[Outcome]) -> bool {
    let mut ok = true;

    for (job, outcome) in jobs.iter().zip(outcomes) {
        println!("Processing {}...", job.input.display());
        println!("  Input:  {}", job.input.display());
        println!("  Output: {}", job.output.display());

        match outcome {
            Outcome::Done(report) => {
                println!("  ✓ Successfully processed");
                println!(
                    "  Rows: {} → {} ({:.1}% reduction)",
                    group_thousands(report.input_rows),
                    group_thousands(report.output_rows),
                    report.reduction_percent(),
                );
                if report.skipped_values > 0 {
                    println!("  Skipped values: {}", group_thousands(report.skipped_values));
                }
            }
            Outcome::Skipped => {
                println!("  ⚠ Input file not found, skipping...");
            }
            Outcome::Failed(e) => {
                println!("  ✗ Processing failed");
                println!("  Error: {e}");
                ok = false;
            }
        }

        println!();
    }

    ok
}

fn delimiter_byte(delimiter: char) -> fenster::Result<u8> {
    u8::try_from(delimiter)
        .ok()
        .filter(u8::is_ascii)
        .ok_or_else(|| fenster::Error::Config(format!("delimiter {delimiter:?} is not ASCII")))
}

fn run(command: Command) -> fenster::Result<bool> {
    let (batch, jobs) = match command {
        Command::Window(args) => {
            let WindowKind::Resample = args.kind;

            if !args.header {
                log::debug!("reading first row of {} as header", args.input.display());
            }

            // a single explicit input must exist, only batches skip missing files
            if !args.input.exists() {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("input file {} not found", args.input.display()),
                )
                .into());
            }

            let resampler = Resampler::new(args.time_column, args.window)
                .columns(args.columns)
                .reducer(args.method)
                .anchor(args.anchor)
                .empty_windows(args.empty);

            let batch = Batch::new(resampler)
                .delimiter(delimiter_byte(args.delimiter)?)
                .marker(args.marker)
                .concurrency(1);

            (batch, vec![Job::new(args.input, args.output)])
        }
        Command::Batch { manifest } => {
            log::info!("loading manifest {}", manifest.display());
            let manifest = Manifest::from_path(&manifest)?;
            (manifest.batch()?, manifest.jobs())
        }
    };

    let start = Instant::now();
    let outcomes = batch.run(&jobs)?;
    log::info!("processed {} file(s) in {:?}", jobs.len(), start.elapsed());

    Ok(print_outcomes(&jobs, &outcomes))
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    env_logger::builder()
        .filter_module(
            "fenster",
            match cli.verbose {
                0 => log::LevelFilter::Warn,
                1 => log::LevelFilter::Info,
                2 => log::LevelFilter::Debug,
                _ => log::LevelFilter::Trace,
            },
        )
        .parse_default_env()
        .init();

    match run(cli.command) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            log::error!("{e}");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    fn window_cli(input: &std::path::Path, output: &std::path::Path) -> Cli {
        Cli::try_parse_from([
            "fenster",
            "window",
            "-i",
            input.to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
            "--time-column",
            "Time_s[s]",
            "--window",
            "5T",
        ])
        .unwrap()
    }

    #[test]
    fn thousands() {
        assert_eq!("0", group_thousands(0));
        assert_eq!("999", group_thousands(999));
        assert_eq!("1,000", group_thousands(1_000));
        assert_eq!("1,234,567", group_thousands(1_234_567));
    }

    #[test]
    fn cli_window_args() {
        let cli = Cli::try_parse_from([
            "fenster",
            "window",
            "-i",
            "press1.csv",
            "-o",
            "press1_5min.csv",
            "--type",
            "resample",
            "--method",
            "mean",
            "--columns",
            "RMS[A]",
            "--time-column",
            "Time_s[s]",
            "--window",
            "5T",
            "--header",
        ])
        .unwrap();

        let Command::Window(args) = cli.command else {
            panic!("expected window command");
        };
        assert_eq!(WindowKind::Resample, args.kind);
        assert!(args.header);
        assert_eq!(vec!["RMS[A]".to_owned()], args.columns);
        assert_eq!(Reducer::Mean, args.method);
        assert_eq!(Anchor::Epoch, args.anchor);
        assert_eq!(300_000_000_000, args.window.width());
    }

    #[test]
    fn cli_rejects_other_window_type() {
        assert!(Cli::try_parse_from([
            "fenster",
            "window",
            "-i",
            "a.csv",
            "-o",
            "b.csv",
            "--type",
            "rolling",
            "--time-column",
            "t",
            "--window",
            "5T",
        ])
        .is_err());
    }

    #[test]
    fn window_fails_on_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("press1.csv");
        let output = dir.path().join("press1_5min.csv");

        let cli = window_cli(&input, &output);

        assert!(matches!(
            run(cli.command),
            Err(fenster::Error::Io(e)) if e.kind() == std::io::ErrorKind::NotFound
        ));
        assert!(!output.exists());
    }

    #[test]
    fn window_single_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("press1.csv");
        let output = dir.path().join("processed/press1_5min.csv");
        std::fs::write(&input, "Time_s[s],RMS[A]\n0,2\n60,4\n720,1\n").unwrap();

        let cli = window_cli(&input, &output);

        assert!(run(cli.command).unwrap());
        assert_eq!(
            "Time_s[s],RMS[A]\n0,3\n300,\n600,1\n",
            std::fs::read_to_string(output).unwrap()
        );
    }

    #[test]
    fn cli_rejects_bad_window() {
        assert!(Cli::try_parse_from([
            "fenster",
            "window",
            "-i",
            "a.csv",
            "-o",
            "b.csv",
            "--time-column",
            "t",
            "--window",
            "0T",
        ])
        .is_err());
    }
}
