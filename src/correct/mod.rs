// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Apply calibration polynomials to blocks of interleaved 16-bit samples.

#[cfg(test)]
mod tests;

use ndarray::prelude::*;

use crate::{
    calibration::CoefficientTable,
    plan::{ChannelPlan, Device, PlanError},
};

/// Evaluate `c0 + x*(c1 + x*(c2 + ...))` by Horner's method; the constant term
/// is added last. `coeffs` must not be empty.
#[inline]
pub fn evaluate_polynomial(coeffs: &[f64], x: f64) -> f64 {
    let higher = coeffs[1..]
        .iter()
        .rev()
        .fold(0.0, |acc, &c| (acc + c) * x);
    higher + coeffs[0]
}

/// Convert volts back to a 16-bit sample, rounding to nearest and saturating
/// at the ends of the range.
#[inline]
pub fn requantise(volts: f64, voltage_to_int_scale: f64) -> i16 {
    let v = (volts * voltage_to_int_scale).round();
    // NaN survives the clamp and is cast to 0.
    v.clamp(i16::MIN as f64, i16::MAX as f64) as i16
}

/// A [`ChannelPlan`] with every entry resolved to its coefficient row.
/// Constructing one checks that every planned channel is actually calibrated,
/// so applying it can't fail.
pub struct SampleCorrector<'a> {
    rows: Vec<&'a [f64]>,
    voltage_to_int_scale: f64,
    words_per_timepoint: usize,
}

impl<'a> SampleCorrector<'a> {
    pub fn new(
        plan: &ChannelPlan,
        primary: &'a CoefficientTable,
        secondary: Option<&'a CoefficientTable>,
    ) -> Result<SampleCorrector<'a>, PlanError> {
        let rows = plan
            .entries()
            .iter()
            .map(|entry| {
                let table = match entry.device {
                    Device::Primary => primary,
                    Device::Secondary => secondary.ok_or(PlanError::NoSecondaryTable)?,
                };
                table
                    .row(entry.physical_channel)
                    .ok_or(PlanError::UnknownChannel {
                        device: entry.device,
                        channel: entry.physical_channel,
                        num_channels: table.num_channels(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(SampleCorrector {
            rows,
            voltage_to_int_scale: plan.voltage_to_int_scale(),
            words_per_timepoint: plan.words_per_timepoint(),
        })
    }

    pub fn words_per_timepoint(&self) -> usize {
        self.words_per_timepoint
    }

    /// Correct a block of frames in place. The block's shape must be
    /// (num frames, words per timepoint). Words beyond the planned channels
    /// (e.g. digital words) are left alone.
    ///
    /// # Panics
    ///
    /// Panics if the block's second dimension isn't the plan's words per
    /// timepoint.
    pub fn apply_block(&self, mut samples: ArrayViewMut2<i16>) {
        assert_eq!(
            samples.len_of(Axis(1)),
            self.words_per_timepoint,
            "Sample block width doesn't match the channel plan"
        );

        for mut frame in samples.outer_iter_mut() {
            for (sample, coeffs) in frame.iter_mut().zip(self.rows.iter()) {
                let volts = evaluate_polynomial(coeffs, f64::from(*sample));
                *sample = requantise(volts, self.voltage_to_int_scale);
            }
        }
    }

    /// Correct a flat slice of interleaved samples in place. Any trailing
    /// partial frame is left alone.
    pub fn apply_interleaved(&self, samples: &mut [i16]) {
        let num_frames = samples.len() / self.words_per_timepoint;
        let whole_frames = &mut samples[..num_frames * self.words_per_timepoint];
        let block = ArrayViewMut2::from_shape((num_frames, self.words_per_timepoint), whole_frames)
            .expect("slice length is a whole number of frames");
        self.apply_block(block);
    }
}
