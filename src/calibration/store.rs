// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The persisted calibration store: an INI-style text file of named groups,
//! each holding `key=value` pairs.
//!
//! ```text
//! [Dev1_PCIe-6341_V5]
//! nai=2
//! ai0=0.00012, 0.000305, 1.2e-15
//! ai1=-0.0003, 0.000305, 1.1e-15
//! ```

use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use indexmap::IndexMap;
use log::trace;

use super::CalStoreError;

/// Keys that appear before any group header land in this group.
const DEFAULT_GROUP: &str = "General";

pub type CalGroup = IndexMap<String, String>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CalStore {
    groups: IndexMap<String, CalGroup>,
}

impl CalStore {
    pub fn new() -> CalStore {
        CalStore::default()
    }

    pub fn read(file: &Path) -> Result<CalStore, CalStoreError> {
        trace!("Reading calibration store {}", file.display());
        let contents = std::fs::read_to_string(file)?;
        Self::parse(&contents)
    }

    pub fn parse(s: &str) -> Result<CalStore, CalStoreError> {
        let mut groups: IndexMap<String, CalGroup> = IndexMap::new();
        let mut current = DEFAULT_GROUP.to_string();

        for (i_line, line) in s.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
                continue;
            }

            if let Some(header) = line.strip_prefix('[') {
                match header.strip_suffix(']') {
                    Some(name) if !name.trim().is_empty() => {
                        current = name.trim().to_string();
                        groups.entry(current.clone()).or_default();
                    }
                    _ => {
                        return Err(CalStoreError::BadLine {
                            line_num: i_line + 1,
                            line: line.to_string(),
                        })
                    }
                }
                continue;
            }

            match line.split_once('=') {
                Some((key, value)) if !key.trim().is_empty() => {
                    groups
                        .entry(current.clone())
                        .or_default()
                        .insert(key.trim().to_string(), value.trim().to_string());
                }
                _ => {
                    return Err(CalStoreError::BadLine {
                        line_num: i_line + 1,
                        line: line.to_string(),
                    })
                }
            }
        }

        Ok(CalStore { groups })
    }

    pub fn write(&self, file: &Path) -> Result<(), std::io::Error> {
        trace!("Writing calibration store {}", file.display());
        let mut f = BufWriter::new(File::create(file)?);
        for (i_group, (name, group)) in self.groups.iter().enumerate() {
            if i_group > 0 {
                writeln!(f)?;
            }
            writeln!(f, "[{name}]")?;
            for (key, value) in group {
                writeln!(f, "{key}={value}")?;
            }
        }
        f.flush()
    }

    pub fn group(&self, name: &str) -> Option<&CalGroup> {
        self.groups.get(name)
    }

    pub fn group_names(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    /// Replace a whole group. Groups are never merged key-by-key.
    pub fn set_group(&mut self, name: &str, group: CalGroup) {
        self.groups.insert(name.to_string(), group);
    }

    pub fn remove_group(&mut self, name: &str) -> bool {
        self.groups.shift_remove(name).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}
