// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The correction of a single recording.

use std::{
    fs::File,
    io::{BufReader, BufWriter, Read, Write},
    path::{Path, PathBuf},
    rc::Rc,
};

use byteorder::{ByteOrder, LittleEndian};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use log::{debug, trace, warn};
use strum_macros::Display;
use thiserror::Error;

use crate::{
    calibration::{CalibrationError, CoefficientCache, CoefficientTable, DeviceGroupKey},
    constants::{APP_VERSION_CUTOFF, BIN_EXTENSION, BLOCK_BYTES, META_EXTENSION},
    correct::SampleCorrector,
    metadata::{self, MetaFile, MetadataError},
    plan::{AcquisitionGeometry, ChannelPlan, PlanError},
    PROGRESS_BARS,
};

/// Device names to use instead of the ones in a recording's metadata, for
/// recordings made before a device was renamed or moved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct DeviceOverrides {
    pub(crate) dev1: Option<String>,
    pub(crate) dev2: Option<String>,
}

/// How far a [`CorrectionJob`] has got. Later states compare greater.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Display)]
pub(crate) enum JobState {
    Discovered,
    MetaValidated,
    CalibrationResolved,
    Planned,
    /// The destination binary file is being written.
    Streaming,
    DataStreamed,
    MetaWritten,
    Done,
}

#[derive(Error, Debug)]
pub(crate) enum RecordingError {
    #[error("The binary file {} doesn't exist", .0.display())]
    BinaryMissing(PathBuf),

    #[error("The metadata is unusable: {0}")]
    MetadataCorrupt(#[from] MetadataError),

    #[error("Recorded by application version {0}, which already applies the device calibration")]
    VersionTooNew(String),

    #[error("Already corrected on {0}")]
    AlreadyCorrected(String),

    #[error(transparent)]
    MissingCalibration(CalibrationError),

    #[error(transparent)]
    CorruptCalibration(CalibrationError),

    #[error("Invalid channel geometry: {0}")]
    InvalidGeometry(#[from] PlanError),

    #[error("Couldn't read {}: {source}", file.display())]
    Read {
        file: PathBuf,
        source: std::io::Error,
    },

    #[error("Couldn't write {}: {source}", file.display())]
    Write {
        file: PathBuf,
        source: std::io::Error,
    },
}

impl From<CalibrationError> for RecordingError {
    fn from(e: CalibrationError) -> Self {
        if e.is_missing() {
            RecordingError::MissingCalibration(e)
        } else {
            RecordingError::CorruptCalibration(e)
        }
    }
}

/// What happened to a recording.
#[derive(Debug)]
pub(crate) enum JobOutcome {
    Corrected(StreamStats),

    /// Everything checked out, but this was a dry run.
    Ready,

    /// Nothing was written.
    Skipped(RecordingError),

    /// Output was (possibly partially) written before the error.
    Failed(RecordingError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct StreamStats {
    pub(crate) num_frames: u64,
    /// Bytes at the end of the binary file that didn't form a whole frame, and
    /// so weren't copied.
    pub(crate) num_truncated_bytes: u64,
}

/// The binary file paired with a metadata file: a trailing "meta" (in any
/// case) is replaced by "bin".
pub(crate) fn meta_to_bin(meta: &Path) -> PathBuf {
    let stem = meta
        .file_name()
        .and_then(|n| n.to_str())
        .and_then(|n| {
            let split = n.len().checked_sub(META_EXTENSION.len())?;
            let (stem, ext) = (n.get(..split)?, n.get(split..)?);
            ext.eq_ignore_ascii_case(META_EXTENSION).then_some(stem)
        })
        .map(|stem| stem.to_string());
    match stem {
        Some(stem) => meta.with_file_name(format!("{stem}{BIN_EXTENSION}")),
        None => meta.with_extension(BIN_EXTENSION),
    }
}

/// One recording (a metadata file and its binary file) being corrected into
/// the destination directory.
pub(crate) struct CorrectionJob {
    name: String,
    src_meta: PathBuf,
    src_bin: PathBuf,
    dst_meta: PathBuf,
    dst_bin: PathBuf,
    state: JobState,
}

impl CorrectionJob {
    pub(crate) fn new(src_meta: &Path, dst_dir: &Path) -> CorrectionJob {
        let src_bin = meta_to_bin(src_meta);
        // Enumeration only ever yields file paths, so there's always a name.
        let meta_name = src_meta.file_name().unwrap_or_default();
        let bin_name = src_bin.file_name().unwrap_or_default();
        CorrectionJob {
            name: src_meta
                .file_stem()
                .unwrap_or_default()
                .to_string_lossy()
                .into_owned(),
            dst_meta: dst_dir.join(meta_name),
            dst_bin: dst_dir.join(bin_name),
            src_meta: src_meta.to_path_buf(),
            src_bin,
            state: JobState::Discovered,
        }
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn state(&self) -> JobState {
        self.state
    }

    /// Run the job as far as it will go. `timestamp` is recorded in the
    /// destination metadata to mark the recording as corrected. With
    /// `dry_run`, the job stops once the recording is known to be correctable.
    pub(crate) fn run(
        &mut self,
        cache: &mut CoefficientCache,
        overrides: &DeviceOverrides,
        timestamp: &str,
        dry_run: bool,
    ) -> JobOutcome {
        match self.prepare(cache, overrides) {
            Ok(_) if dry_run => JobOutcome::Ready,
            Ok(prepared) => self.finish(prepared, timestamp),
            Err(e) => self.outcome(Err(e)),
        }
    }

    /// Check the recording and work out how to correct it. Nothing is
    /// written.
    pub(crate) fn prepare(
        &mut self,
        cache: &mut CoefficientCache,
        overrides: &DeviceOverrides,
    ) -> Result<PreparedJob, RecordingError> {
        let meta = self.validate()?;
        self.advance(JobState::MetaValidated);

        let geometry = AcquisitionGeometry::from_meta(&meta)?;
        let (primary, secondary) = resolve_calibration(&meta, &geometry, cache, overrides)?;
        self.advance(JobState::CalibrationResolved);

        let file_len = self
            .src_bin
            .metadata()
            .map_err(|source| RecordingError::Read {
                file: self.src_bin.clone(),
                source,
            })?
            .len();
        let frame_bytes = geometry.frame_bytes_within(file_len)?;
        let plan = ChannelPlan::new(&geometry)?;
        // Only done here to check that every planned channel is calibrated.
        SampleCorrector::new(&plan, &primary, secondary.as_deref())?;
        debug!(
            "{}: {} of {} words per timepoint are calibrated",
            self.name,
            plan.len(),
            plan.words_per_timepoint()
        );
        self.advance(JobState::Planned);

        Ok(PreparedJob {
            meta,
            plan,
            primary,
            secondary,
            num_frames: file_len / frame_bytes as u64,
            num_truncated_bytes: file_len % frame_bytes as u64,
        })
    }

    /// Write the corrected recording. The size of the binary file is taken
    /// to be what it was when the job was prepared.
    pub(crate) fn finish(&mut self, prepared: PreparedJob, timestamp: &str) -> JobOutcome {
        let result = self.correct(prepared, timestamp);
        self.outcome(result)
    }

    fn outcome(&self, result: Result<StreamStats, RecordingError>) -> JobOutcome {
        match result {
            Ok(stats) => JobOutcome::Corrected(stats),
            // Once the destination has been written to, it may hold partial
            // output.
            Err(e) if self.state >= JobState::Streaming => JobOutcome::Failed(e),
            Err(e) => JobOutcome::Skipped(e),
        }
    }

    fn correct(
        &mut self,
        prepared: PreparedJob,
        timestamp: &str,
    ) -> Result<StreamStats, RecordingError> {
        let PreparedJob {
            mut meta,
            plan,
            primary,
            secondary,
            num_frames,
            num_truncated_bytes,
        } = prepared;
        let corrector = SampleCorrector::new(&plan, &primary, secondary.as_deref())?;

        self.stream(&corrector, num_frames)?;
        self.advance(JobState::DataStreamed);
        if num_truncated_bytes != 0 {
            warn!(
                "{}: the last {num_truncated_bytes} bytes of {} don't form a whole frame; they weren't copied",
                self.name,
                self.src_bin.display()
            );
        }

        meta.set(metadata::KEY_CORRECTED, timestamp.to_string());
        meta.write(&self.dst_meta)
            .map_err(|source| RecordingError::Write {
                file: self.dst_meta.clone(),
                source,
            })?;
        self.advance(JobState::MetaWritten);

        self.advance(JobState::Done);
        Ok(StreamStats {
            num_frames,
            num_truncated_bytes,
        })
    }

    fn advance(&mut self, state: JobState) {
        trace!("{}: {} -> {}", self.name, self.state, state);
        self.state = state;
    }

    fn validate(&self) -> Result<MetaFile, RecordingError> {
        if !self.src_bin.is_file() {
            return Err(RecordingError::BinaryMissing(self.src_bin.clone()));
        }

        let meta = MetaFile::read(&self.src_meta)?;
        // Versions are dates (yyyymmdd); recordings without one predate the
        // key.
        if let Some(version) = meta.get(metadata::KEY_APP_VERSION) {
            if version >= APP_VERSION_CUTOFF {
                return Err(RecordingError::VersionTooNew(version.to_string()));
            }
        }
        if let Some(corrected) = meta.get(metadata::KEY_CORRECTED) {
            return Err(RecordingError::AlreadyCorrected(corrected.to_string()));
        }

        Ok(meta)
    }

    /// Copy the first `num_frames` frames of the binary file to the
    /// destination, correcting each one.
    fn stream(&mut self, corrector: &SampleCorrector, num_frames: u64) -> Result<(), RecordingError> {
        let src_bin = self.src_bin.clone();
        let dst_bin = self.dst_bin.clone();
        let read_err = |source| RecordingError::Read {
            file: src_bin.clone(),
            source,
        };
        let write_err = |source| RecordingError::Write {
            file: dst_bin.clone(),
            source,
        };

        let words = corrector.words_per_timepoint();
        // Preparation checked that a whole frame fits in the file, so this
        // fits in memory.
        let frame_bytes = 2 * words;
        let block_frames_max = (BLOCK_BYTES / frame_bytes)
            .max(1)
            .min(usize::try_from(num_frames).unwrap_or(usize::MAX));

        let mut reader = BufReader::new(File::open(&self.src_bin).map_err(read_err)?);
        self.advance(JobState::Streaming);
        let mut writer = BufWriter::new(File::create(&self.dst_bin).map_err(write_err)?);
        if num_frames == 0 {
            return writer.flush().map_err(write_err);
        }

        let progress = ProgressBar::with_draw_target(
            Some(num_frames),
            if PROGRESS_BARS.load() {
                ProgressDrawTarget::stdout()
            } else {
                ProgressDrawTarget::hidden()
            },
        )
        .with_style(
            ProgressStyle::default_bar()
                .template("{msg:18}: [{wide_bar:.blue}] {pos}/{len} frames ({elapsed_precise}<{eta_precise})")
                .expect("progress bar template is valid")
                .progress_chars("=> "),
        )
        .with_message(self.name.clone());

        let mut bytes = vec![0_u8; block_frames_max * frame_bytes];
        let mut samples = vec![0_i16; block_frames_max * words];
        let mut frames_left = num_frames;
        while frames_left > 0 {
            let block_frames = frames_left.min(block_frames_max as u64) as usize;
            let bytes = &mut bytes[..block_frames * frame_bytes];
            let samples = &mut samples[..block_frames * words];

            reader.read_exact(bytes).map_err(read_err)?;
            LittleEndian::read_i16_into(bytes, samples);
            corrector.apply_interleaved(samples);
            LittleEndian::write_i16_into(samples, bytes);
            writer.write_all(bytes).map_err(write_err)?;

            frames_left -= block_frames as u64;
            progress.inc(block_frames as u64);
        }
        writer.flush().map_err(write_err)?;
        progress.finish_and_clear();

        Ok(())
    }
}

/// Everything needed to write a corrected recording, worked out by
/// [`CorrectionJob::prepare`].
pub(crate) struct PreparedJob {
    meta: MetaFile,
    plan: ChannelPlan,
    primary: Rc<CoefficientTable>,
    secondary: Option<Rc<CoefficientTable>>,
    num_frames: u64,
    num_truncated_bytes: u64,
}

type ResolvedTables = (Rc<CoefficientTable>, Option<Rc<CoefficientTable>>);

/// Find the calibration tables for the recording's device(s) at its voltage
/// range. The secondary table is only needed in dual-device recordings.
fn resolve_calibration(
    meta: &MetaFile,
    geometry: &AcquisitionGeometry,
    cache: &mut CoefficientCache,
    overrides: &DeviceOverrides,
) -> Result<ResolvedTables, RecordingError> {
    let key = |name_key, product_key, name_override: &Option<String>| {
        let device = match name_override {
            Some(d) => d.clone(),
            None => meta.require(name_key)?.to_string(),
        };
        Ok::<_, MetadataError>(DeviceGroupKey {
            device,
            product: meta.require(product_key)?.to_string(),
            voltage_max: geometry.range_max,
        })
    };

    let primary_key = key(metadata::KEY_DEV1, metadata::KEY_DEV1_PRODUCT, &overrides.dev1)?;
    debug!("Primary calibration group: {primary_key}");
    let primary = cache.get(&primary_key)?;

    let secondary = if geometry.dual_device {
        let secondary_key = key(metadata::KEY_DEV2, metadata::KEY_DEV2_PRODUCT, &overrides.dev2)?;
        debug!("Secondary calibration group: {secondary_key}");
        Some(cache.get(&secondary_key)?)
    } else {
        None
    };

    Ok((primary, secondary))
}
