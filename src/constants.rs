// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Useful constants.

All scaling constants *must* be double precision; samples are only converted
back to 16 bits at the very end of a correction.
 */

/// The magnitude of the most negative 16-bit sample; a sample of this size
/// corresponds to the nominal voltage range maximum.
pub const FIXED_POINT_FULL_SCALE: f64 = 32768.0;

/// Recordings made by application versions at or after this one already
/// applied the device calibration when acquiring.
pub const APP_VERSION_CUTOFF: &str = "20220101";

/// The approximate size of each block read from a binary file during a
/// correction.
pub const BLOCK_BYTES: usize = 128 * 1024;

/// The file extension of recording metadata.
pub const META_EXTENSION: &str = "meta";

/// The file extension of recording binary data.
pub const BIN_EXTENSION: &str = "bin";
