// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use thiserror::Error;

use super::job::{CorrectionJob, DeviceOverrides, JobOutcome};
use crate::{
    calibration::{CalStore, CalStoreError, CoefficientCache, CAL_STORE_FILENAME},
    constants::META_EXTENSION,
    io::{get_all_matches_from_glob, GlobError},
};

/// Everything needed to correct a directory of recordings.
pub(crate) struct ApplyParams {
    pub(crate) src_dir: PathBuf,
    pub(crate) dst_dir: PathBuf,
    pub(crate) cal_store_file: PathBuf,
    pub(crate) device_overrides: DeviceOverrides,
    /// Metadata files of the recordings to correct, sorted by name.
    pub(crate) recordings: Vec<PathBuf>,
    cal_store: CalStore,
}

impl ApplyParams {
    /// Check the directories and read the calibration store. Any problem here
    /// stops the whole batch.
    pub(crate) fn new(
        src_dir: PathBuf,
        dst_dir: PathBuf,
        cal_dir: &Path,
        device_overrides: DeviceOverrides,
    ) -> Result<ApplyParams, ApplyError> {
        if !src_dir.is_dir() {
            return Err(ApplyError::NoSuchDirectory {
                what: "source",
                dir: src_dir,
            });
        }
        if !dst_dir.is_dir() {
            return Err(ApplyError::NoSuchDirectory {
                what: "destination",
                dir: dst_dir,
            });
        }
        if src_dir.canonicalize()? == dst_dir.canonicalize()? {
            return Err(ApplyError::SameDirectory(src_dir));
        }

        let cal_store_file = cal_dir.join(CAL_STORE_FILENAME);
        if !cal_store_file.is_file() {
            return Err(ApplyError::NoCalStore(cal_store_file));
        }
        let cal_store = CalStore::read(&cal_store_file)?;
        if cal_store.is_empty() {
            warn!(
                "The calibration store {} has no groups; no recording can be corrected",
                cal_store_file.display()
            );
        }

        let recordings = enumerate_recordings(&src_dir)?;

        Ok(ApplyParams {
            src_dir,
            dst_dir,
            cal_store_file,
            device_overrides,
            recordings,
            cal_store,
        })
    }

    pub(crate) fn cal_store(&self) -> &CalStore {
        &self.cal_store
    }

    /// Correct every recording in turn. A recording that can't be corrected
    /// is reported and the batch carries on.
    pub(crate) fn run(&self, dry_run: bool) -> BatchSummary {
        let mut cache = CoefficientCache::new(self.cal_store.clone());
        let mut summary = BatchSummary::default();

        if self.recordings.is_empty() {
            info!(
                "No recordings (*.{META_EXTENSION}) were found in {}",
                self.src_dir.display()
            );
            return summary;
        }

        for meta_file in &self.recordings {
            let mut job = CorrectionJob::new(meta_file, &self.dst_dir);
            info!("Processing {}", job.name());
            let timestamp = chrono::Local::now()
                .format("%Y-%m-%dT%H:%M:%S")
                .to_string();
            match job.run(&mut cache, &self.device_overrides, &timestamp, dry_run) {
                JobOutcome::Corrected(stats) => {
                    info!("{}: corrected {} frames", job.name(), stats.num_frames);
                    if stats.num_truncated_bytes != 0 {
                        summary.truncated.push(job.name().to_string());
                    }
                    summary.corrected.push(job.name().to_string());
                }
                JobOutcome::Ready => {
                    info!("{}: would be corrected", job.name());
                    summary.ready.push(job.name().to_string());
                }
                JobOutcome::Skipped(e) => {
                    warn!("{}: skipped: {e}", job.name());
                    summary.skipped.push((job.name().to_string(), e.to_string()));
                }
                JobOutcome::Failed(e) => {
                    warn!(
                        "{}: failed after writing had started ({}): {e}",
                        job.name(),
                        job.state()
                    );
                    summary.failed.push((job.name().to_string(), e.to_string()));
                }
            }
        }
        debug!("{} calibration tables were loaded", cache.num_loaded());

        summary
    }
}

/// Every `*.meta` regular file directly inside `dir`, sorted by name.
pub(crate) fn enumerate_recordings(dir: &Path) -> Result<Vec<PathBuf>, GlobError> {
    let pattern = format!(
        "{}/*.{META_EXTENSION}",
        glob::Pattern::escape(&dir.display().to_string())
    );
    let mut recordings: Vec<PathBuf> = get_all_matches_from_glob(&pattern)?
        .into_iter()
        .filter(|p| p.is_file())
        .collect();
    recordings.sort();
    for r in &recordings {
        debug!("Found {}", r.display());
    }
    Ok(recordings)
}

/// The fate of each recording in a batch, by name.
#[derive(Debug, Default)]
pub(crate) struct BatchSummary {
    pub(crate) corrected: Vec<String>,
    /// Dry run only.
    pub(crate) ready: Vec<String>,
    pub(crate) skipped: Vec<(String, String)>,
    pub(crate) failed: Vec<(String, String)>,
    /// Corrected recordings whose binary file ended in a partial frame.
    pub(crate) truncated: Vec<String>,
}

impl BatchSummary {
    pub(crate) fn num_recordings(&self) -> usize {
        self.corrected.len() + self.ready.len() + self.skipped.len() + self.failed.len()
    }
}

#[derive(Error, Debug)]
pub(crate) enum ApplyError {
    #[error("The {what} directory {} doesn't exist", dir.display())]
    NoSuchDirectory { what: &'static str, dir: PathBuf },

    #[error("The source and destination directories are the same ({}); the source recordings would be overwritten", .0.display())]
    SameDirectory(PathBuf),

    #[error("No calibration store was found at {}; run 'niscaler create-cal' first", .0.display())]
    NoCalStore(PathBuf),

    #[error(transparent)]
    CalStore(#[from] CalStoreError),

    #[error(transparent)]
    Glob(#[from] GlobError),

    #[error(transparent)]
    IO(#[from] std::io::Error),
}
