// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Command-line interface code. More specific options for `niscaler`
//! subcommands are contained in modules.
//!
//! All booleans must have `#[serde(default)]` annotated, and anything that
//! isn't a boolean must be optional. This allows all arguments to be optional
//! *and* usable in an arguments file.
//!
//! Only 3 things should be public in this module: `Niscaler`,
//! `Niscaler::run`, and `NiscalerError`.

#[macro_use]
mod common;
mod apply;
mod cal_list;
mod create_cal;
mod error;

pub use error::NiscalerError;

use std::{
    fs::{File, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

use clap::{AppSettings, Args, Parser, Subcommand};
use log::info;

use crate::PROGRESS_BARS;

// Add build-time information from the "built" crate.
include!(concat!(env!("OUT_DIR"), "/built.rs"));

#[derive(Debug, Parser)]
#[clap(
    version,
    author,
    about = r#"Retroactively apply ADC calibration polynomials to multiplexed analog recordings.
Recordings are read from one directory and corrected copies are written to another."#
)]
#[clap(global_setting(AppSettings::DeriveDisplayOrder))]
#[clap(disable_help_subcommand = true)]
#[clap(infer_subcommands = true)]
#[clap(propagate_version = true)]
#[clap(infer_long_args = true)]
pub struct Niscaler {
    #[clap(flatten)]
    global_opts: GlobalArgs,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Debug, Args)]
struct GlobalArgs {
    /// Don't draw progress bars.
    #[clap(long)]
    #[clap(global = true)]
    no_progress_bars: bool,

    /// The verbosity of the program. Increase by specifying multiple times
    /// (e.g. -vv). The default is to print only high-level information.
    #[clap(short, long, parse(from_occurrences))]
    #[clap(global = true)]
    verbosity: u8,

    /// Only verify that arguments were correctly ingested and print out
    /// high-level information. Nothing is written.
    #[clap(long)]
    #[clap(global = true)]
    dry_run: bool,

    /// Save the input arguments into a new TOML file that can be used to
    /// reproduce this run.
    #[clap(long)]
    #[clap(global = true)]
    save_toml: Option<PathBuf>,

    /// Also append all log messages to this file.
    #[clap(long)]
    #[clap(global = true)]
    log_file: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
#[clap(arg_required_else_help = true)]
enum Command {
    #[clap(about = r#"Measure the installed acquisition devices and write their calibration tables.
Only possible on the acquisition machine, with a hardware driver."#)]
    CreateCal(create_cal::CreateCalArgs),

    #[clap(alias = "correct")]
    #[clap(about = "Correct every recording in a directory using stored calibration tables.")]
    Apply(apply::ApplyArgs),

    CalList(cal_list::CalListArgs),
}

impl Niscaler {
    pub fn run(self) -> Result<(), NiscalerError> {
        // Set up logging.
        let GlobalArgs {
            verbosity,
            dry_run,
            no_progress_bars,
            save_toml,
            log_file,
        } = self.global_opts;
        setup_logging(verbosity, log_file.as_deref())?;
        // Enable progress bars if the user didn't say "no progress bars".
        if !no_progress_bars {
            PROGRESS_BARS.store(true);
        }

        // Print the version of niscaler and its build-time information.
        let sub_command = match &self.command {
            Command::CreateCal(_) => "create-cal",
            Command::Apply(_) => "apply",
            Command::CalList(_) => "cal-list",
        };
        info!("niscaler {} {}", sub_command, env!("CARGO_PKG_VERSION"));
        display_build_info();

        macro_rules! merge_save_run {
            ($args:expr) => {{
                let args = $args.merge()?;
                if let Some(toml) = save_toml {
                    use std::io::BufWriter;

                    let mut f = BufWriter::new(File::create(toml)?);
                    let toml_str = toml::to_string(&args).map_err(|e| {
                        NiscalerError::ArgFile(format!("Couldn't serialise the arguments: {e}"))
                    })?;
                    f.write_all(toml_str.as_bytes())?;
                }
                args.run(dry_run)?;
            }};
        }

        match self.command {
            Command::CreateCal(args) => {
                merge_save_run!(args)
            }

            Command::Apply(args) => {
                merge_save_run!(args)
            }

            Command::CalList(args) => args.run()?,
        }

        info!("niscaler {} complete.", sub_command);
        Ok(())
    }
}

/// Everything written to this goes to both stdout and a log file.
struct Tee {
    file: File,
}

impl Write for Tee {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        std::io::stdout().write_all(buf)?;
        self.file.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        std::io::stdout().flush()?;
        self.file.flush()
    }
}

/// Activate a logger. All log messages are put onto `stdout` (and appended to
/// `log_file`, if given). `env_logger` automatically only uses colours and
/// fancy symbols if we're on a tty (e.g. a terminal); piped output will be
/// formatted sensibly. Source code lines are displayed in log messages when
/// verbosity >= 3.
fn setup_logging(verbosity: u8, log_file: Option<&Path>) -> Result<(), std::io::Error> {
    let mut builder = env_logger::Builder::from_default_env();
    match log_file {
        Some(file) => {
            let file = OpenOptions::new().create(true).append(true).open(file)?;
            builder.target(env_logger::Target::Pipe(Box::new(Tee { file })));
        }
        None => {
            builder.target(env_logger::Target::Stdout);
        }
    }
    builder.format_target(false);
    match verbosity {
        0 => builder.filter_level(log::LevelFilter::Info),
        1 => builder.filter_level(log::LevelFilter::Debug),
        2 => builder.filter_level(log::LevelFilter::Trace),
        _ => {
            builder.filter_level(log::LevelFilter::Trace);
            builder.format(|buf, record| {
                let timestamp = buf.timestamp();
                let level = record.level();
                let target = record.target();
                let line = record.line().unwrap_or(0);
                let message = record.args();

                writeln!(buf, "[{timestamp} {level} {target}:{line}] {message}")
            })
        }
    };
    builder.init();

    Ok(())
}

/// Write many info-level log lines of how this executable was compiled.
fn display_build_info() {
    let dirty = match GIT_DIRTY {
        Some(true) => " (dirty)",
        _ => "",
    };
    match GIT_COMMIT_HASH_SHORT {
        Some(hash) => {
            info!("Compiled on git commit hash: {hash}{dirty}");
        }
        None => info!("Compiled on git commit hash: <no git info>"),
    }
    if let Some(hr) = GIT_HEAD_REF {
        info!("            git head ref: {}", hr);
    }
    info!("            {}", BUILT_TIME_UTC);
    info!("         with compiler {}", RUSTC_VERSION);
    info!("");
}
