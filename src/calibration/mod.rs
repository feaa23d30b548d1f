// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Per-channel polynomial calibration tables.
//!
//! Each acquisition device, at each of its voltage ranges, has one table. Row
//! `i` of a table holds the coefficients `[c0, c1, ..., cn]` of the polynomial
//! that maps a raw sample from physical input channel `i` to volts. Tables
//! are identified by a [`DeviceGroupKey`] and persisted in a [`CalStore`].

mod error;
mod provider;
mod store;

pub use error::{CalStoreError, CalibrationError, ProviderError};
pub use provider::{
    create_calibration, CalibrationProvider, CreateCalSummary, DeviceInfo, NoHardware,
};
pub use store::{CalGroup, CalStore};

use std::{collections::HashMap, fmt::Display, rc::Rc};

use itertools::Itertools;
use log::debug;

/// The name of the calibration store file inside the calibration directory.
pub const CAL_STORE_FILENAME: &str = "niscaler_cal.ini";

const KEY_NUM_CHANNELS: &str = "nai";

fn row_key(channel: usize) -> String {
    format!("ai{channel}")
}

/// The composite identity of a calibration table.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceGroupKey {
    pub device: String,
    pub product: String,
    pub voltage_max: f64,
}

impl Display for DeviceGroupKey {
    /// The calibration store group name, e.g. "Dev1_PCIe-6341_V5". The voltage
    /// is written in its shortest form, so 5.0 becomes "5".
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}_{}_V{}", self.device, self.product, self.voltage_max)
    }
}

/// Polynomial coefficients for every physical channel of one device at one
/// voltage range. Every row has the same number of coefficients.
#[derive(Debug, Clone, PartialEq)]
pub struct CoefficientTable {
    num_coeffs: usize,
    /// Row-major; channel `i` occupies `[i * num_coeffs, (i + 1) * num_coeffs)`.
    coeffs: Vec<f64>,
}

impl CoefficientTable {
    /// Build a table from per-channel rows, checking that the rows are
    /// consistent. `group` is only used for error messages.
    pub fn from_rows(group: &str, rows: Vec<Vec<f64>>) -> Result<Self, CalibrationError> {
        let num_coeffs = match rows.first() {
            None => {
                return Err(CalibrationError::NoChannels {
                    group: group.to_string(),
                })
            }
            Some(r) if r.is_empty() => {
                return Err(CalibrationError::EmptyRow {
                    group: group.to_string(),
                    key: row_key(0),
                })
            }
            Some(r) => r.len(),
        };

        let mut coeffs = Vec::with_capacity(rows.len() * num_coeffs);
        for (channel, row) in rows.into_iter().enumerate() {
            if row.len() != num_coeffs {
                return Err(CalibrationError::InconsistentOrder {
                    group: group.to_string(),
                    channel,
                    expected: num_coeffs,
                    got: row.len(),
                });
            }
            coeffs.extend(row);
        }

        Ok(CoefficientTable { num_coeffs, coeffs })
    }

    /// Read the table for `key` from the store.
    pub fn load(store: &CalStore, key: &DeviceGroupKey) -> Result<Self, CalibrationError> {
        let group_name = key.to_string();
        Self::load_group(store, &group_name)
    }

    pub(crate) fn load_group(store: &CalStore, group_name: &str) -> Result<Self, CalibrationError> {
        let group = match store.group(group_name) {
            Some(g) if g.contains_key(KEY_NUM_CHANNELS) => g,
            _ => {
                return Err(CalibrationError::MissingGroup {
                    group: group_name.to_string(),
                })
            }
        };

        let nai = &group[KEY_NUM_CHANNELS];
        let num_channels: usize =
            nai.trim().parse().map_err(|_| CalibrationError::BadChannelCount {
                group: group_name.to_string(),
                value: nai.clone(),
            })?;

        let rows = (0..num_channels)
            .map(|channel| {
                let key = row_key(channel);
                let value = group.get(&key).ok_or_else(|| CalibrationError::MissingRow {
                    group: group_name.to_string(),
                    key: key.clone(),
                })?;
                parse_row(group_name, &key, value)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let table = Self::from_rows(group_name, rows)?;
        debug!(
            "Loaded calibration table '{group_name}': {} channels, {} coefficients each",
            table.num_channels(),
            table.num_coeffs()
        );
        Ok(table)
    }

    /// The store representation of this table.
    pub fn to_group(&self) -> CalGroup {
        let mut group = CalGroup::new();
        group.insert(KEY_NUM_CHANNELS.to_string(), self.num_channels().to_string());
        for (channel, row) in self.rows().enumerate() {
            group.insert(row_key(channel), row.iter().join(", "));
        }
        group
    }

    pub fn num_channels(&self) -> usize {
        self.coeffs.len() / self.num_coeffs
    }

    pub fn num_coeffs(&self) -> usize {
        self.num_coeffs
    }

    /// The coefficients of a physical channel, lowest order first.
    pub fn row(&self, channel: usize) -> Option<&[f64]> {
        let start = channel.checked_mul(self.num_coeffs)?;
        self.coeffs.get(start..start + self.num_coeffs)
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        self.coeffs.chunks_exact(self.num_coeffs)
    }
}

/// Coefficient lists are comma separated, optionally with spaces and quotes
/// around each number.
fn parse_row(group: &str, key: &str, value: &str) -> Result<Vec<f64>, CalibrationError> {
    if value.trim().is_empty() {
        return Err(CalibrationError::EmptyRow {
            group: group.to_string(),
            key: key.to_string(),
        });
    }

    value
        .split(',')
        .map(|s| {
            let s = s.trim().trim_matches('"').trim();
            s.parse().map_err(|_| CalibrationError::BadCoefficient {
                group: group.to_string(),
                key: key.to_string(),
                value: s.to_string(),
            })
        })
        .collect()
}

/// A read-through cache of calibration tables. Tables are loaded at most once
/// and are immutable afterwards, so recordings sharing a device/range share
/// the same table.
pub struct CoefficientCache {
    store: CalStore,
    tables: HashMap<String, Rc<CoefficientTable>>,
}

impl CoefficientCache {
    pub fn new(store: CalStore) -> CoefficientCache {
        CoefficientCache {
            store,
            tables: HashMap::new(),
        }
    }

    pub fn get(&mut self, key: &DeviceGroupKey) -> Result<Rc<CoefficientTable>, CalibrationError> {
        let group_name = key.to_string();
        if let Some(table) = self.tables.get(&group_name) {
            return Ok(Rc::clone(table));
        }

        let table = Rc::new(CoefficientTable::load_group(&self.store, &group_name)?);
        self.tables.insert(group_name, Rc::clone(&table));
        Ok(table)
    }

    pub fn store(&self) -> &CalStore {
        &self.store
    }

    /// How many distinct tables have been loaded so far.
    pub fn num_loaded(&self) -> usize {
        self.tables.len()
    }
}
