// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.


use std::{borrow::Cow, path::PathBuf};

use clap::Parser;
use log::{debug, info, trace};
use serde::{Deserialize, Serialize};

use super::common::{display_warnings, non_blank, normalise_dir, InfoPrinter, Warn, ARG_FILE_HELP};
use crate::{
    calibration::CAL_STORE_FILENAME,
    params::{ApplyParams, BatchSummary, DeviceOverrides},
    NiscalerError,
};

lazy_static::lazy_static! {
    static ref CAL_DIR_HELP: String =
        format!("The directory containing the calibration store ({CAL_STORE_FILENAME})");
}

#[derive(Parser, Debug, Clone, Default, Serialize, Deserialize)]
pub(super) struct ApplyArgs {
    #[clap(name = "ARGUMENTS_FILE", help = ARG_FILE_HELP.as_str(), parse(from_os_str))]
    pub(super) args_file: Option<PathBuf>,

    #[clap(short, long, help = CAL_DIR_HELP.as_str(), help_heading = "DIRECTORIES")]
    pub(super) cal_dir: Option<String>,

    /// The directory containing the recordings (*.meta and *.bin pairs) to be
    /// corrected. Nothing in it is modified.
    #[clap(short, long, help_heading = "DIRECTORIES")]
    pub(super) src_dir: Option<String>,

    /// The directory to write corrected recordings into. Recordings with the
    /// same names are overwritten.
    #[clap(short, long, help_heading = "DIRECTORIES")]
    pub(super) dst_dir: Option<String>,

    /// Use this name for the primary acquisition device when looking up
    /// calibration tables, instead of the name in each recording's metadata.
    /// Useful if the device was renamed after recording.
    #[clap(long, help_heading = "DEVICES")]
    pub(super) dev1: Option<String>,

    /// As with --dev1, but for the secondary device of dual-device
    /// recordings.
    #[clap(long, help_heading = "DEVICES")]
    pub(super) dev2: Option<String>,
}

impl ApplyArgs {
    /// Both command-line and file arguments overlap in terms of what is
    /// available; this function consolidates everything that was specified into
    /// a single struct. Where applicable, it will prefer CLI parameters over
    /// those in the file.
    ///
    /// This function should only ever merge arguments, and not try to make
    /// sense of them.
    pub(super) fn merge(self) -> Result<ApplyArgs, NiscalerError> {
        debug!("Merging command-line arguments with the argument file");

        let cli_args = self;

        if let Some(arg_file) = cli_args.args_file {
            // Read in the file arguments. Ensure all of the file args are
            // accounted for by pattern matching.
            let ApplyArgs {
                args_file: _,
                cal_dir,
                src_dir,
                dst_dir,
                dev1,
                dev2,
            } = unpack_arg_file!(arg_file);

            // Merge all the arguments, preferring the CLI args when available.
            Ok(ApplyArgs {
                args_file: None,
                cal_dir: cli_args.cal_dir.or(cal_dir),
                src_dir: cli_args.src_dir.or(src_dir),
                dst_dir: cli_args.dst_dir.or(dst_dir),
                dev1: cli_args.dev1.or(dev1),
                dev2: cli_args.dev2.or(dev2),
            })
        } else {
            Ok(cli_args)
        }
    }

    pub(super) fn parse(self) -> Result<ApplyParams, NiscalerError> {
        debug!("{:#?}", self);

        let Self {
            args_file: _,
            cal_dir,
            src_dir,
            dst_dir,
            dev1,
            dev2,
        } = self;

        let cal_dir = cal_dir
            .as_deref()
            .and_then(normalise_dir)
            .ok_or(ApplyArgsError::NoCalDir)?;
        let src_dir = src_dir
            .as_deref()
            .and_then(normalise_dir)
            .ok_or(ApplyArgsError::NoSrcDir)?;
        let dst_dir = dst_dir
            .as_deref()
            .and_then(normalise_dir)
            .ok_or(ApplyArgsError::NoDstDir)?;
        let device_overrides = DeviceOverrides {
            dev1: non_blank(dev1),
            dev2: non_blank(dev2),
        };

        let params = ApplyParams::new(src_dir, dst_dir, &cal_dir, device_overrides)?;

        let mut printer = InfoPrinter::new("Correcting recordings".into());
        printer.push_block(vec![
            format!("Source:            {}", params.src_dir.display()).into(),
            format!("Destination:       {}", params.dst_dir.display()).into(),
        ]);
        let num_groups = params.cal_store().group_names().count();
        printer.push_line(
            format!(
                "Calibration store: {} ({num_groups} groups)",
                params.cal_store_file.display()
            )
            .into(),
        );
        let mut overrides: Vec<Cow<'static, str>> = vec![];
        if let Some(d) = &params.device_overrides.dev1 {
            overrides.push(format!("Primary device is named '{d}'").into());
        }
        if let Some(d) = &params.device_overrides.dev2 {
            overrides.push(format!("Secondary device is named '{d}'").into());
        }
        if !overrides.is_empty() {
            printer.push_block(overrides);
        }
        printer.push_line(format!("{} recordings found", params.recordings.len()).into());
        printer.display();

        if params.device_overrides.dev2.is_some() && params.device_overrides.dev1.is_none() {
            "--dev2 was given without --dev1; primary devices are named by each recording's metadata"
                .warn();
        }
        display_warnings();

        Ok(params)
    }

    pub(super) fn run(self, dry_run: bool) -> Result<(), NiscalerError> {
        debug!("Converting arguments into parameters");
        trace!("{:#?}", self);
        let params = self.parse()?;

        if dry_run {
            info!("Dry run -- checking recordings without writing anything.");
        }
        let summary = params.run(dry_run);
        display_summary(&summary, dry_run);
        Ok(())
    }
}

fn display_summary(summary: &BatchSummary, dry_run: bool) {
    for name in &summary.truncated {
        format!("{name}: the binary file ended with a partial frame, which wasn't copied").warn();
    }
    display_warnings();

    let mut printer = InfoPrinter::new("Summary".into());
    if dry_run {
        printer.push_line(format!("{} recordings can be corrected", summary.ready.len()).into());
    } else {
        printer.push_line(format!("{} recordings corrected", summary.corrected.len()).into());
    }
    for (kind, list) in [("skipped", &summary.skipped), ("failed", &summary.failed)] {
        let mut block: Vec<Cow<'static, str>> = vec![format!("{} recordings {kind}", list.len()).into()];
        block.extend(
            list.iter()
                .map(|(name, reason)| format!("  {name}: {reason}").into()),
        );
        printer.push_block(block);
    }
    printer.display();
}

#[derive(thiserror::Error, Debug)]
pub(super) enum ApplyArgsError {
    #[error("No calibration directory was specified")]
    NoCalDir,

    #[error("No source directory was specified")]
    NoSrcDir,

    #[error("No destination directory was specified")]
    NoDstDir,
}
