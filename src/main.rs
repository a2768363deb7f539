use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::Context;
use clap::{ArgAction, Parser};
use indicatif::{ProgressBar, ProgressStyle};
use layout_core::{ProcessOptions, ProcessResult};

#[derive(Parser)]
#[command(
    name = "takeout-layout",
    version,
    about = "Google Photos Takeout layout - hardlink an extracted export into YYYY/MM folders"
)]
struct Cli {
    /// Extracted takeout directory (the one holding "Photos from YYYY" and album folders)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Output directory for the YYYY/MM tree
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Only scan top-level folders matching this glob, e.g. "Photos from *"
    #[arg(long)]
    filter: Option<String>,

    /// Keep the takeout's file name casing instead of lowercasing
    #[arg(long)]
    keep_case: bool,

    /// Name whose collisions are not reported (repeatable, replaces the default list)
    #[arg(long = "quiet-name", value_name = "NAME")]
    quiet_names: Vec<String>,

    /// JSON options file; flags given on the command line take precedence
    #[arg(long)]
    config: Option<PathBuf>,

    /// Increase verbosity (-v=DEBUG, -vv=TRACE)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn options(&self) -> anyhow::Result<ProcessOptions> {
        let mut options = match &self.config {
            Some(path) => ProcessOptions::from_json_file(path)
                .with_context(|| format!("loading options from {}", path.display()))?,
            None => ProcessOptions::default(),
        };

        if let Some(input) = &self.input {
            options.input = input.clone();
        }
        if let Some(output) = &self.output {
            options.output = output.clone();
        }
        if self.filter.is_some() {
            options.dir_filter = self.filter.clone();
        }
        if self.keep_case {
            options.lowercase_names = false;
        }
        if !self.quiet_names.is_empty() {
            options.quiet_collision_names = self.quiet_names.clone();
        }
        Ok(options)
    }
}

fn setup_logging(verbosity: u8) {
    let level = match verbosity {
        0 => log::LevelFilter::Info,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::from_default_env()
        .filter_level(level)
        .format_timestamp(None)
        .init();
}

fn run(cli: &Cli) -> anyhow::Result<ProcessResult> {
    let options = cli.options()?;

    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{prefix:>6} [{bar:40}] {pos}/{len} {msg}")
            .unwrap(),
    );
    let stage_seen = Mutex::new(String::new());

    let result = layout_core::process(&options, &|stage, current, total, message| {
        if let Ok(mut seen) = stage_seen.lock() {
            if *seen != stage {
                *seen = stage.to_string();
                pb.reset();
                pb.set_prefix(stage.to_string());
            }
        }
        pb.set_length(total);
        pb.set_position(current);
        pb.set_message(message.to_string());
    });
    pb.finish_and_clear();

    Ok(result?)
}

fn main() {
    let cli = Cli::parse();
    setup_logging(cli.verbose);
    let t_total = std::time::Instant::now();

    match run(&cli) {
        Ok(result) => {
            for warning in &result.warnings {
                log::debug!("warning: {}", warning);
            }
            eprintln!(
                "Done! {} records, {} duplicates removed, {} linked, {} already present, \
                 {} renamed, {} unresolved ({:.2}s)",
                result.total_records,
                result.duplicates_removed,
                result.media_linked,
                result.already_present,
                result.collisions,
                result.unresolved,
                t_total.elapsed().as_secs_f64()
            );
        }
        Err(e) => {
            log::error!("{:#}", e);
            std::process::exit(1);
        }
    }
}
