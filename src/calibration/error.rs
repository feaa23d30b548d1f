// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors associated with reading, writing or creating calibration tables.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CalStoreError {
    #[error("Calibration store line {line_num} is neither a '[group]' header nor a 'key=value' pair: '{line}'")]
    BadLine { line_num: usize, line: String },

    #[error(transparent)]
    IO(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum CalibrationError {
    #[error("No calibration table '{group}' in the calibration store")]
    MissingGroup { group: String },

    #[error("Calibration table '{group}' has no channels")]
    NoChannels { group: String },

    #[error("Calibration table '{group}' has a bad channel count '{value}'")]
    BadChannelCount { group: String, value: String },

    #[error("Calibration table '{group}' is missing key '{key}'")]
    MissingRow { group: String, key: String },

    #[error("Calibration table '{group}' key '{key}' has no coefficients")]
    EmptyRow { group: String, key: String },

    #[error("Calibration table '{group}' key '{key}' contains '{value}', which isn't a number")]
    BadCoefficient {
        group: String,
        key: String,
        value: String,
    },

    #[error("Calibration table '{group}' channel {channel} has {got} coefficients, but channel 0 has {expected}")]
    InconsistentOrder {
        group: String,
        channel: usize,
        expected: usize,
        got: usize,
    },
}

impl CalibrationError {
    /// A missing table only means a recording can't be corrected yet; every
    /// other variant means the table itself is damaged.
    pub fn is_missing(&self) -> bool {
        matches!(self, CalibrationError::MissingGroup { .. })
    }
}

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Creating calibration tables needs acquisition hardware support, which isn't available in this build")]
    Unavailable,

    #[error("Hardware query failed for device {device}: {message}")]
    Driver { device: String, message: String },
}
