// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Error type for all range-expression parsing.

use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SubsetError {
    #[error("Range expression '{input}' contains an empty term")]
    EmptyTerm { input: String },

    #[error("Range expression '{input}' contains '{term}', which isn't a channel index or a 'first:last' range")]
    BadTerm { input: String, term: String },

    #[error("Range expression '{input}' contains the descending range {first}:{last}")]
    Descending {
        input: String,
        first: usize,
        last: usize,
    },

    #[error("Range expression '{input}' refers to index {index}, but only {limit} are available")]
    OutOfRange {
        input: String,
        index: usize,
        limit: usize,
    },
}
