use bandcheck::analyzer::spectral::{Taper, WindowLength};
use bandcheck::report::{self, FileReport, Status, Summary};
use bandcheck::{audio_files, AnalysisConfig, Analyzer};
use clap::{Parser, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use log::LevelFilter;
use rayon::prelude::*;
use std::path::PathBuf;

/// Tukey taper fraction used when `--taper tukey` is given on the command line
const CLI_TUKEY_ALPHA: f64 = 0.25;

#[derive(Parser, Debug)]
#[command(name = "bandcheck")]
#[command(author, version, about = "Check whether audio files really contain the bandwidth their format promises")]
struct Args {
    /// File or directory to analyze
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Analysis window length in seconds (default: 0.05)
    #[arg(short, long, conflicts_with = "default_window")]
    window: Option<f64>,

    /// Use a fixed 256-sample window instead of a length in seconds
    #[arg(long)]
    default_window: bool,

    /// Channel to analyze, starting at 0
    #[arg(short, long)]
    channel: Option<usize>,

    /// Segment taper
    #[arg(long, value_enum)]
    taper: Option<TaperArg>,

    /// JSON file with analysis settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output report file (.csv, .json)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Number of parallel workers (default: number of CPUs)
    #[arg(short, long)]
    jobs: Option<usize>,

    /// More diagnostics on stderr (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only print failures and errors
    #[arg(short, long)]
    quiet: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum TaperArg {
    Hann,
    Tukey,
}

impl Args {
    /// Settings from `--config` (or defaults) with command line flags on top.
    fn analysis_config(&self) -> Result<AnalysisConfig, bandcheck::ConfigError> {
        let mut config = match &self.config {
            Some(path) => AnalysisConfig::from_file(path)?,
            None => AnalysisConfig::default(),
        };

        if let Some(secs) = self.window {
            config.window = WindowLength::Seconds(secs);
        }
        if self.default_window {
            config.window = WindowLength::Default;
        }
        if let Some(channel) = self.channel {
            config.channel = channel;
        }
        match self.taper {
            Some(TaperArg::Hann) => config.taper = Taper::Hann,
            Some(TaperArg::Tukey) => config.taper = Taper::Tukey { alpha: CLI_TUKEY_ALPHA },
            None => {}
        }

        config.validate()?;
        Ok(config)
    }
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level.as_str()))
        .format_timestamp(None)
        .init();
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = match args.analysis_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    // Set up thread pool
    if let Some(jobs) = args.jobs {
        if let Err(e) = rayon::ThreadPoolBuilder::new().num_threads(jobs).build_global() {
            log::warn!("could not size worker pool: {}", e);
        }
    }

    let files: Vec<PathBuf> = audio_files(&args.path).collect();

    if files.is_empty() {
        eprintln!("No audio files found under {} (supported: mp3, wav, flac)", args.path.display());
        std::process::exit(1);
    }

    // Set up progress bar
    let pb = if !args.quiet && files.len() > 1 {
        let pb = ProgressBar::new(files.len() as u64);
        if let Ok(style) = ProgressStyle::default_bar().template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}") {
            pb.set_style(style.progress_chars("=>-"));
        }
        Some(pb)
    } else {
        None
    };

    let analyzer = Analyzer::new().with_config(&config);

    // Analyze files in parallel, keeping walk order for output
    let results: Vec<_> = files
        .par_iter()
        .map(|path| {
            let result = analyzer.analyze(path);
            if let Some(ref pb) = pb {
                pb.inc(1);
                if let Some(name) = path.file_name() {
                    pb.set_message(name.to_string_lossy().into_owned());
                }
            }
            (path, result)
        })
        .collect();

    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    let mut reports = Vec::with_capacity(results.len());
    for (path, result) in &results {
        match result {
            Ok(verdict) => {
                if !args.quiet || verdict.is_fail() {
                    println!("{}", verdict);
                }
            }
            Err(e) => eprintln!("{}: {}", path.display(), e),
        }
        reports.push(FileReport::new(path, result));
    }

    let summary = Summary::from_reports(&reports);
    if !args.quiet && summary.total > 1 {
        eprintln!(
            "\n{} file(s): {} good, {} below expectation, {} unknown, {} error(s)",
            summary.total, summary.pass, summary.fail, summary.unknown, summary.error
        );
    }

    if let Some(ref output_path) = args.output {
        if let Err(e) = report::generate(output_path, &reports) {
            eprintln!("Failed to write report: {}", e);
            std::process::exit(1);
        }
        if !args.quiet {
            eprintln!("Report saved: {}", output_path.display());
        }
    }

    // Exit with appropriate code
    if reports.iter().any(|r| r.status == Status::Fail) {
        std::process::exit(2);
    } else if summary.error > 0 {
        std::process::exit(1);
    }
}
