// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("Line {line_num} isn't a 'key=value' pair: '{line}'")]
    BadLine { line_num: usize, line: String },

    #[error("Required key '{key}' is missing")]
    MissingKey { key: String },

    #[error("Couldn't parse '{value}' for key '{key}' (expected a {expected})")]
    BadValue {
        key: String,
        value: String,
        expected: &'static str,
    },

    #[error(transparent)]
    IO(#[from] std::io::Error),
}
