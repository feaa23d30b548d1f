// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Code to read and write recording metadata (".meta") files.
//!
//! These are flat text files with one `key=value` pair per line. Keys are
//! kept in file order so that a re-written file only differs from its source
//! where a key was actually changed.

mod error;

pub use error::MetadataError;

use std::{
    fs::File,
    io::{BufRead, BufReader, BufWriter, Write},
    path::Path,
    str::FromStr,
};

use indexmap::IndexMap;
use log::trace;

/// The application version that wrote a recording.
pub const KEY_APP_VERSION: &str = "appVersion";
/// Present (with a timestamp) once a recording has been corrected.
pub const KEY_CORRECTED: &str = "NIScaler";
pub const KEY_MUX_FACTOR: &str = "niMuxFactor";
pub const KEY_DUAL_DEVICE: &str = "niDualDevMode";
pub const KEY_RANGE_MAX: &str = "niAiRangeMax";
pub const KEY_SAVED_CHANS: &str = "nSavedChans";
pub const KEY_SAVE_SUBSET: &str = "snsSaveChanSubset";
pub const KEY_DEV1: &str = "niDev1";
pub const KEY_DEV2: &str = "niDev2";
pub const KEY_DEV1_PRODUCT: &str = "niDev1ProductName";
pub const KEY_DEV2_PRODUCT: &str = "niDev2ProductName";

/// An ordered set of metadata key/value pairs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetaFile {
    entries: IndexMap<String, String>,
}

impl MetaFile {
    pub fn read(file: &Path) -> Result<MetaFile, MetadataError> {
        trace!("Reading metadata from {}", file.display());
        let f = BufReader::new(File::open(file)?);
        let mut lines = Vec::new();
        for line in f.lines() {
            lines.push(line?);
        }
        Self::parse_lines(lines.iter().map(String::as_str))
    }

    pub fn parse(s: &str) -> Result<MetaFile, MetadataError> {
        Self::parse_lines(s.lines())
    }

    fn parse_lines<'a, I>(lines: I) -> Result<MetaFile, MetadataError>
    where
        I: Iterator<Item = &'a str>,
    {
        let mut entries = IndexMap::new();
        for (i_line, line) in lines.enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            match trimmed.split_once('=') {
                Some((key, value)) if !key.trim().is_empty() => {
                    entries.insert(key.trim().to_string(), value.trim().to_string());
                }
                _ => {
                    return Err(MetadataError::BadLine {
                        line_num: i_line + 1,
                        line: line.to_string(),
                    })
                }
            }
        }

        Ok(MetaFile { entries })
    }

    /// Write all entries to a file, in order. Any existing file is replaced.
    pub fn write(&self, file: &Path) -> Result<(), std::io::Error> {
        trace!("Writing metadata to {}", file.display());
        let mut f = BufWriter::new(File::create(file)?);
        for (key, value) in &self.entries {
            writeln!(f, "{key}={value}")?;
        }
        f.flush()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Get the value of a key, or the empty string if it's absent. Channel
    /// range keys are routinely left out when a role has no channels.
    pub fn get_or_empty(&self, key: &str) -> &str {
        self.get(key).unwrap_or("")
    }

    pub fn require(&self, key: &str) -> Result<&str, MetadataError> {
        self.get(key).ok_or_else(|| MetadataError::MissingKey {
            key: key.to_string(),
        })
    }

    /// Parse the value of a required key.
    pub fn parse_key<T: FromStr>(&self, key: &str) -> Result<T, MetadataError> {
        let value = self.require(key)?;
        value.parse().map_err(|_| MetadataError::BadValue {
            key: key.to_string(),
            value: value.to_string(),
            expected: std::any::type_name::<T>(),
        })
    }

    /// Interpret the value of a key as a boolean. Absent keys, empty values,
    /// "false" and "0" are all false; anything else is true.
    pub fn get_bool(&self, key: &str) -> bool {
        match self.get(key) {
            None => false,
            Some(v) => !(v.is_empty() || v.eq_ignore_ascii_case("false") || v == "0"),
        }
    }

    /// Set a key. An existing key keeps its position in the file; a new key is
    /// appended.
    pub fn set(&mut self, key: &str, value: String) {
        self.entries.insert(key.to_string(), value);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
