// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Error type for all niscaler-related errors. This should be the *only*
//! error enum that is publicly visible.

use thiserror::Error;

use super::{apply::ApplyArgsError, create_cal::CreateCalArgsError};
use crate::{
    calibration::CalStoreError,
    params::{ApplyError, CreateCalError},
};

/// The *only* publicly visible error from niscaler. Each error message should
/// include a hint, unless it's "generic".
#[derive(Error, Debug)]
pub enum NiscalerError {
    /// An error related to create-cal.
    #[error("{0}\n\nCalibration tables can only be made on the acquisition machine itself. See: niscaler create-cal --help")]
    CreateCal(String),

    /// An error related to apply.
    #[error("{0}\n\nSee: niscaler apply --help")]
    Apply(String),

    /// An error reading or writing the calibration store.
    #[error("{0}\n\nThe calibration store is written by 'niscaler create-cal'; 'niscaler cal-list' shows what it holds.")]
    CalStore(String),

    /// An error related to argument files.
    #[error("{0}\n\nArgument files use the long names of the command-line arguments as keys, e.g. src_dir = \"/data/raw\"")]
    ArgFile(String),

    /// A generic error that can't be clarified further with a hint, e.g. IO
    /// errors.
    #[error("{0}")]
    Generic(String),
}

// When changing the error propagation below, ensure `Self::from(e)` uses the
// correct `e`!

impl From<ApplyArgsError> for NiscalerError {
    fn from(e: ApplyArgsError) -> Self {
        Self::Apply(e.to_string())
    }
}

impl From<CreateCalArgsError> for NiscalerError {
    fn from(e: CreateCalArgsError) -> Self {
        Self::CreateCal(e.to_string())
    }
}

impl From<ApplyError> for NiscalerError {
    fn from(e: ApplyError) -> Self {
        let s = e.to_string();
        match e {
            ApplyError::NoSuchDirectory { .. }
            | ApplyError::SameDirectory(_)
            | ApplyError::Glob(_) => Self::Apply(s),
            ApplyError::NoCalStore(_) | ApplyError::CalStore(_) => Self::CalStore(s),
            ApplyError::IO(_) => Self::Generic(s),
        }
    }
}

impl From<CreateCalError> for NiscalerError {
    fn from(e: CreateCalError) -> Self {
        let s = e.to_string();
        match e {
            CreateCalError::NoCalDir(_) | CreateCalError::Provider(_) => Self::CreateCal(s),
            CreateCalError::CalStore(_) => Self::CalStore(s),
            CreateCalError::IO(_) => Self::Generic(s),
        }
    }
}

impl From<CalStoreError> for NiscalerError {
    fn from(e: CalStoreError) -> Self {
        let s = e.to_string();
        match e {
            CalStoreError::BadLine { .. } => Self::CalStore(s),
            CalStoreError::IO(_) => Self::Generic(s),
        }
    }
}

impl From<std::io::Error> for NiscalerError {
    fn from(e: std::io::Error) -> Self {
        Self::Generic(e.to_string())
    }
}
