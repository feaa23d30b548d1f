// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors that make a recording's channel geometry unusable.

use thiserror::Error;

use super::Device;
use crate::subset::SubsetError;

#[derive(Error, Debug)]
pub enum PlanError {
    #[error("Bad channel range for '{key}': {source}")]
    Range {
        key: &'static str,
        source: SubsetError,
    },

    #[error("Bad save-channel subset: {0}")]
    SaveSubset(SubsetError),

    #[error("The save-channel subset refers to channel {index}, but only {num_acquired} channels were acquired")]
    SaveSubsetOutOfRange { index: usize, num_acquired: usize },

    #[error("The channel ranges describe more acquired channels than can be counted")]
    TooManyAcquired,

    #[error("The multiplexing factor is 0")]
    ZeroMuxFactor,

    #[error("The nominal voltage range maximum ({0}) must be a positive number")]
    BadVoltageRange(f64),

    #[error("The recording has no words per timepoint")]
    NoWords,

    #[error("A frame of {words_per_timepoint} words doesn't fit in the {file_len}-byte binary file")]
    FrameLargerThanFile {
        words_per_timepoint: usize,
        file_len: u64,
    },

    #[error("{num_saved} analog channels were saved, but each timepoint only has {words_per_timepoint} words")]
    TooManyChannels {
        num_saved: usize,
        words_per_timepoint: usize,
    },

    #[error("{device} device channel {channel} has no calibration; the table only has {num_channels} channels")]
    UnknownChannel {
        device: Device,
        channel: usize,
        num_channels: usize,
    },

    #[error("Channels from the secondary device were saved, but no secondary calibration table was given")]
    NoSecondaryTable,
}
