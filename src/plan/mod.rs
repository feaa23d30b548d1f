// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Work out which calibration polynomial applies to each saved channel of a
//! recording.
//!
//! The acquisition front end interleaves channels in a fixed order of roles
//! and devices (see [`ROLE_ORDER`]). Muxed roles occupy `mux_factor`
//! consecutive acquisition slots per physical input. The recording may then
//! save only a subset of the acquired channels; the plan follows the channels
//! that actually landed in the binary file, in file order.

mod error;

pub use error::PlanError;

use std::ops::RangeInclusive;

use log::trace;
use strum_macros::Display;

use crate::{
    constants::FIXED_POINT_FULL_SCALE,
    metadata::{self, MetaFile, MetadataError},
    subset,
};

/// Which of (at most) two acquisition devices produced a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum Device {
    Primary,
    Secondary,
}

/// The kinds of analog channel the front end acquires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum ChannelRole {
    /// Multiplexed neural channels ("MN").
    Main,

    /// Multiplexed auxiliary analog channels ("MA").
    AuxMuxed,

    /// Unmultiplexed extra analog channels ("XA").
    Extra,
}

impl ChannelRole {
    pub fn is_muxed(self) -> bool {
        matches!(self, ChannelRole::Main | ChannelRole::AuxMuxed)
    }

    /// The metadata key holding this role's range expression for a device.
    pub fn meta_key(self, device: Device) -> &'static str {
        match (self, device) {
            (ChannelRole::Main, Device::Primary) => "niMNChans1",
            (ChannelRole::Main, Device::Secondary) => "niMNChans2",
            (ChannelRole::AuxMuxed, Device::Primary) => "niMAChans1",
            (ChannelRole::AuxMuxed, Device::Secondary) => "niMAChans2",
            (ChannelRole::Extra, Device::Primary) => "niXAChans1",
            (ChannelRole::Extra, Device::Secondary) => "niXAChans2",
        }
    }
}

/// The order in which the hardware interleaves channels. Secondary-device
/// entries only exist in dual-device recordings.
pub const ROLE_ORDER: [(ChannelRole, Device); 6] = [
    (ChannelRole::Main, Device::Primary),
    (ChannelRole::Main, Device::Secondary),
    (ChannelRole::AuxMuxed, Device::Primary),
    (ChannelRole::AuxMuxed, Device::Secondary),
    (ChannelRole::Extra, Device::Primary),
    (ChannelRole::Extra, Device::Secondary),
];

/// Everything about a recording's channel layout that's needed to build a
/// [`ChannelPlan`].
#[derive(Debug, Clone, PartialEq)]
pub struct AcquisitionGeometry {
    pub mux_factor: usize,
    pub dual_device: bool,
    /// The nominal (symmetric) voltage range maximum.
    pub range_max: f64,
    /// The number of 16-bit words in each frame of the binary file.
    pub words_per_timepoint: usize,
    pub save_subset: String,
    /// Range expressions, indexed by `[role][device]`.
    channel_ranges: [[String; 2]; 3],
}

impl AcquisitionGeometry {
    /// A geometry with no channels, saving "all" of them.
    pub fn new(mux_factor: usize, range_max: f64, words_per_timepoint: usize) -> Self {
        AcquisitionGeometry {
            mux_factor,
            dual_device: false,
            range_max,
            words_per_timepoint,
            save_subset: subset::ALL_CHANNELS.to_string(),
            channel_ranges: Default::default(),
        }
    }

    pub fn from_meta(meta: &MetaFile) -> Result<Self, MetadataError> {
        let mut geometry = AcquisitionGeometry::new(
            meta.parse_key(metadata::KEY_MUX_FACTOR)?,
            meta.parse_key(metadata::KEY_RANGE_MAX)?,
            meta.parse_key(metadata::KEY_SAVED_CHANS)?,
        );
        geometry.dual_device = meta.get_bool(metadata::KEY_DUAL_DEVICE);
        geometry.save_subset = meta.get_or_empty(metadata::KEY_SAVE_SUBSET).to_string();
        for (role, device) in ROLE_ORDER {
            geometry.set_channel_range(role, device, meta.get_or_empty(role.meta_key(device)));
        }
        Ok(geometry)
    }

    pub fn channel_range(&self, role: ChannelRole, device: Device) -> &str {
        &self.channel_ranges[role as usize][device as usize]
    }

    pub fn set_channel_range(&mut self, role: ChannelRole, device: Device, range: &str) {
        self.channel_ranges[role as usize][device as usize] = range.to_string();
    }

    pub fn with_channel_range(mut self, role: ChannelRole, device: Device, range: &str) -> Self {
        self.set_channel_range(role, device, range);
        self
    }

    pub fn with_save_subset(mut self, save_subset: &str) -> Self {
        self.save_subset = save_subset.to_string();
        self
    }

    pub fn with_dual_device(mut self, dual_device: bool) -> Self {
        self.dual_device = dual_device;
        self
    }

    /// The number of bytes in one frame of 16-bit words. A binary file of
    /// `file_len` bytes must hold at least one whole frame.
    pub fn frame_bytes_within(&self, file_len: u64) -> Result<usize, PlanError> {
        if self.words_per_timepoint == 0 {
            return Err(PlanError::NoWords);
        }
        match self.words_per_timepoint.checked_mul(2) {
            Some(frame_bytes) if frame_bytes as u64 <= file_len => Ok(frame_bytes),
            _ => Err(PlanError::FrameLargerThanFile {
                words_per_timepoint: self.words_per_timepoint,
                file_len,
            }),
        }
    }
}

/// Where one saved channel's calibration comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelEntry {
    pub device: Device,
    /// The row of the device's calibration table.
    pub physical_channel: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChannelPlan {
    entries: Vec<ChannelEntry>,
    voltage_to_int_scale: f64,
    words_per_timepoint: usize,
}

impl ChannelPlan {
    pub fn new(geometry: &AcquisitionGeometry) -> Result<ChannelPlan, PlanError> {
        let range_max = geometry.range_max;
        if !range_max.is_finite() || range_max <= 0.0 {
            return Err(PlanError::BadVoltageRange(range_max));
        }
        if geometry.words_per_timepoint == 0 {
            return Err(PlanError::NoWords);
        }

        let (runs, num_acquired) = acquired_runs(geometry)?;
        // Positions in the acquired list that were saved.
        let saved = if subset::is_all_channels(&geometry.save_subset) {
            if num_acquired == 0 {
                vec![]
            } else {
                vec![0..=num_acquired - 1]
            }
        } else {
            let ranges =
                subset::parse_ranges(&geometry.save_subset).map_err(PlanError::SaveSubset)?;
            if let Some(last) = ranges.last() {
                if *last.end() >= num_acquired {
                    return Err(PlanError::SaveSubsetOutOfRange {
                        index: *last.end(),
                        num_acquired,
                    });
                }
            }
            ranges
        };

        // The saved positions are all below `num_acquired`, so this can't
        // overflow.
        let num_saved = subset::count_indices(&saved).unwrap_or(usize::MAX);
        if num_saved > geometry.words_per_timepoint {
            return Err(PlanError::TooManyChannels {
                num_saved,
                words_per_timepoint: geometry.words_per_timepoint,
            });
        }

        let mut entries = Vec::with_capacity(num_saved);
        let mut runs = runs.iter().peekable();
        for position in saved.into_iter().flatten() {
            while let Some(run) = runs.peek() {
                if position < run.end() {
                    entries.push(run.entry_at(position));
                    break;
                }
                runs.next();
            }
        }

        trace!("Channel plan: {entries:?}");
        Ok(ChannelPlan {
            entries,
            voltage_to_int_scale: FIXED_POINT_FULL_SCALE / range_max,
            words_per_timepoint: geometry.words_per_timepoint,
        })
    }

    pub fn entries(&self) -> &[ChannelEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Multiply volts by this to get back to the fixed-point sample domain.
    pub fn voltage_to_int_scale(&self) -> f64 {
        self.voltage_to_int_scale
    }

    pub fn words_per_timepoint(&self) -> usize {
        self.words_per_timepoint
    }

    pub fn uses_secondary(&self) -> bool {
        self.entries.iter().any(|e| e.device == Device::Secondary)
    }
}

/// Consecutive acquisition slots filled by one run of physical channels.
#[derive(Debug)]
struct AcquiredRun {
    device: Device,
    channels: RangeInclusive<usize>,
    slots_per_channel: usize,
    /// The acquired-list position of this run's first slot.
    start: usize,
    len: usize,
}

impl AcquiredRun {
    fn end(&self) -> usize {
        self.start + self.len
    }

    fn entry_at(&self, position: usize) -> ChannelEntry {
        ChannelEntry {
            device: self.device,
            physical_channel: self.channels.start()
                + (position - self.start) / self.slots_per_channel,
        }
    }
}

/// Every analog channel the front end acquired, in interleave order, before
/// any save-subset filtering. Nothing is expanded; the acquired list is
/// described by runs, along with its total length.
fn acquired_runs(geometry: &AcquisitionGeometry) -> Result<(Vec<AcquiredRun>, usize), PlanError> {
    if geometry.mux_factor == 0 {
        return Err(PlanError::ZeroMuxFactor);
    }

    let mut runs = vec![];
    let mut num_acquired: usize = 0;
    for (role, device) in ROLE_ORDER {
        if device == Device::Secondary && !geometry.dual_device {
            continue;
        }

        let key = role.meta_key(device);
        let ranges = subset::parse_ranges(geometry.channel_range(role, device))
            .map_err(|source| PlanError::Range { key, source })?;
        let slots_per_channel = if role.is_muxed() {
            geometry.mux_factor
        } else {
            1
        };
        for channels in ranges {
            let len = subset::count_indices(std::slice::from_ref(&channels))
                .and_then(|n| n.checked_mul(slots_per_channel))
                .ok_or(PlanError::TooManyAcquired)?;
            runs.push(AcquiredRun {
                device,
                channels,
                slots_per_channel,
                start: num_acquired,
                len,
            });
            num_acquired = num_acquired
                .checked_add(len)
                .ok_or(PlanError::TooManyAcquired)?;
        }
    }

    Ok((runs, num_acquired))
}
