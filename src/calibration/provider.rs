// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Creating calibration tables from acquisition hardware.
//!
//! Talking to the hardware is the job of a [`CalibrationProvider`]; this
//! module only turns what a provider reports into calibration store groups.

use log::{debug, info, warn};

use super::{CalStore, CoefficientTable, DeviceGroupKey, ProviderError};

/// What a provider knows about one installed acquisition device.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceInfo {
    pub name: String,
    pub product: String,
    /// The maximum of each supported (symmetric) analog input voltage range.
    pub range_maxima: Vec<f64>,
    pub num_ai_channels: usize,
}

pub trait CalibrationProvider {
    /// All installed devices. Devices without analog inputs may be included;
    /// they are ignored.
    fn devices(&self) -> Result<Vec<DeviceInfo>, ProviderError>;

    /// The device's own scaling polynomial for one analog input channel when
    /// acquiring at `±voltage_max`, lowest order first.
    fn scaling_coefficients(
        &self,
        device: &DeviceInfo,
        voltage_max: f64,
        channel: usize,
    ) -> Result<Vec<f64>, ProviderError>;
}

/// The provider used when no hardware driver was compiled in.
pub struct NoHardware;

impl CalibrationProvider for NoHardware {
    fn devices(&self) -> Result<Vec<DeviceInfo>, ProviderError> {
        Err(ProviderError::Unavailable)
    }

    fn scaling_coefficients(
        &self,
        _: &DeviceInfo,
        _: f64,
        _: usize,
    ) -> Result<Vec<f64>, ProviderError> {
        Err(ProviderError::Unavailable)
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct CreateCalSummary {
    pub num_ai_devices: usize,
    pub groups_written: Vec<String>,
    pub groups_failed: Vec<String>,
}

/// Measure every analog input device at every voltage range and put the
/// resulting tables into `store`. A table is written whole or not at all; if
/// any channel can't be queried, the group is removed from the store.
pub fn create_calibration(
    provider: &dyn CalibrationProvider,
    store: &mut CalStore,
) -> Result<CreateCalSummary, ProviderError> {
    let devices = provider.devices()?;
    if devices.is_empty() {
        info!("No acquisition hardware detected.");
        return Ok(CreateCalSummary::default());
    }

    let mut summary = CreateCalSummary::default();
    for device in &devices {
        if device.range_maxima.is_empty() || device.num_ai_channels == 0 {
            debug!("Device {} has no analog inputs; ignoring", device.name);
            continue;
        }
        summary.num_ai_devices += 1;

        for &voltage_max in &device.range_maxima {
            let key = DeviceGroupKey {
                device: device.name.clone(),
                product: device.product.clone(),
                voltage_max,
            };
            let group_name = key.to_string();
            store.remove_group(&group_name);

            let rows = (0..device.num_ai_channels)
                .map(|channel| provider.scaling_coefficients(device, voltage_max, channel))
                .collect::<Result<Vec<_>, _>>();
            let table = match rows {
                Ok(rows) => CoefficientTable::from_rows(&group_name, rows)
                    .map_err(|e| e.to_string()),
                Err(e) => Err(e.to_string()),
            };

            match table {
                Ok(table) => {
                    info!(
                        "Measured '{group_name}': {} channels, {} coefficients each",
                        table.num_channels(),
                        table.num_coeffs()
                    );
                    store.set_group(&group_name, table.to_group());
                    summary.groups_written.push(group_name);
                }
                Err(e) => {
                    warn!("Couldn't create calibration table '{group_name}': {e}");
                    summary.groups_failed.push(group_name);
                }
            }
        }
    }

    if summary.num_ai_devices == 0 {
        info!("No analog input devices detected.");
    }

    Ok(summary)
}
