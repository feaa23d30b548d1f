// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::{borrow::Cow, path::PathBuf};

use clap::Parser;
use log::{debug, info, trace};
use serde::{Deserialize, Serialize};

use super::common::{display_warnings, normalise_dir, InfoPrinter, Warn, ARG_FILE_HELP};
use crate::{
    calibration::{CalibrationProvider, NoHardware, CAL_STORE_FILENAME},
    params::CreateCalParams,
    NiscalerError,
};

#[derive(Parser, Debug, Clone, Default, Serialize, Deserialize)]
pub(super) struct CreateCalArgs {
    #[clap(name = "ARGUMENTS_FILE", help = ARG_FILE_HELP.as_str(), parse(from_os_str))]
    pub(super) args_file: Option<PathBuf>,

    /// The directory in which to create (or update) the calibration store.
    /// Tables for devices that aren't installed are kept.
    #[clap(short, long)]
    pub(super) cal_dir: Option<String>,
}

impl CreateCalArgs {
    pub(super) fn merge(self) -> Result<CreateCalArgs, NiscalerError> {
        debug!("Merging command-line arguments with the argument file");

        let cli_args = self;

        if let Some(arg_file) = cli_args.args_file {
            let CreateCalArgs {
                args_file: _,
                cal_dir,
            } = unpack_arg_file!(arg_file);

            Ok(CreateCalArgs {
                args_file: None,
                cal_dir: cli_args.cal_dir.or(cal_dir),
            })
        } else {
            Ok(cli_args)
        }
    }

    pub(super) fn parse(self) -> Result<CreateCalParams, NiscalerError> {
        debug!("{:#?}", self);

        let cal_dir = self
            .cal_dir
            .as_deref()
            .and_then(normalise_dir)
            .ok_or(CreateCalArgsError::NoCalDir)?;

        let params = CreateCalParams { cal_dir };
        let mut printer = InfoPrinter::new("Creating calibration tables".into());
        printer.push_line(format!("Calibration store: {}", params.cal_store_file().display()).into());
        printer.display();
        display_warnings();

        Ok(params)
    }

    pub(super) fn run(self, dry_run: bool) -> Result<(), NiscalerError> {
        debug!("Converting arguments into parameters");
        trace!("{:#?}", self);
        let params = self.parse()?;
        run_with_provider(&params, &NoHardware, dry_run)
    }
}

fn run_with_provider(
    params: &CreateCalParams,
    provider: &dyn CalibrationProvider,
    dry_run: bool,
) -> Result<(), NiscalerError> {
    let summary = params.run(provider, dry_run)?;

    for group in &summary.groups_failed {
        format!("Calibration table '{group}' couldn't be measured and was removed from {CAL_STORE_FILENAME}").warn();
    }
    display_warnings();

    if summary.num_ai_devices > 0 {
        let mut printer = InfoPrinter::new("Summary".into());
        printer.push_line(format!("{} analog input devices", summary.num_ai_devices).into());
        let mut written: Vec<Cow<'static, str>> =
            vec![format!("{} tables written", summary.groups_written.len()).into()];
        written.extend(
            summary
                .groups_written
                .iter()
                .map(|g| format!("  {g}").into()),
        );
        printer.push_block(written);
        printer.display();
    }
    if !dry_run {
        info!("Calibration tables are up to date.");
    }

    Ok(())
}

#[derive(thiserror::Error, Debug)]
pub(super) enum CreateCalArgsError {
    #[error("No calibration directory was specified")]
    NoCalDir,
}
