// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Retroactive calibration of multiplexed analog acquisition recordings.

Raw 16-bit samples are mapped to volts with per-channel polynomials measured
for the acquisition device, then re-quantised with the nominal voltage range.
 */

pub mod calibration;
mod cli;
pub mod constants;
pub mod correct;
mod io;
pub mod metadata;
mod params;
pub mod plan;
pub mod subset;

// Re-exports.
pub use cli::{Niscaler, NiscalerError};

use crossbeam_utils::atomic::AtomicCell;

/// Should progress bars be drawn? This is only ever enabled by the CLI.
static PROGRESS_BARS: AtomicCell<bool> = AtomicCell::new(false);
