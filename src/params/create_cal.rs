// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::path::PathBuf;

use log::{debug, info};
use thiserror::Error;

use crate::calibration::{
    create_calibration, CalStore, CalStoreError, CalibrationProvider, CreateCalSummary,
    ProviderError, CAL_STORE_FILENAME,
};

pub(crate) struct CreateCalParams {
    pub(crate) cal_dir: PathBuf,
}

impl CreateCalParams {
    pub(crate) fn cal_store_file(&self) -> PathBuf {
        self.cal_dir.join(CAL_STORE_FILENAME)
    }

    /// Query the provider and merge its tables into the calibration store.
    /// Groups the provider doesn't know about are kept. With `dry_run`,
    /// nothing is written.
    pub(crate) fn run(
        &self,
        provider: &dyn CalibrationProvider,
        dry_run: bool,
    ) -> Result<CreateCalSummary, CreateCalError> {
        if !self.cal_dir.is_dir() {
            return Err(CreateCalError::NoCalDir(self.cal_dir.clone()));
        }

        let store_file = self.cal_store_file();
        let mut store = if store_file.is_file() {
            debug!("Updating existing calibration store {}", store_file.display());
            CalStore::read(&store_file)?
        } else {
            CalStore::new()
        };

        let summary = create_calibration(provider, &mut store)?;

        if dry_run {
            info!("Dry run -- not writing {}", store_file.display());
        } else if summary.groups_written.is_empty() && summary.groups_failed.is_empty() {
            debug!("Nothing changed; not writing {}", store_file.display());
        } else {
            store.write(&store_file)?;
            info!("Wrote {}", store_file.display());
        }

        Ok(summary)
    }
}

#[derive(Error, Debug)]
pub(crate) enum CreateCalError {
    #[error("The calibration directory {} doesn't exist", .0.display())]
    NoCalDir(PathBuf),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    CalStore(#[from] CalStoreError),

    #[error(transparent)]
    IO(#[from] std::io::Error),
}
