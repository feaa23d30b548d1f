// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use approx::assert_abs_diff_eq;

use super::*;
use crate::plan::{AcquisitionGeometry, ChannelRole};

fn table(rows: Vec<Vec<f64>>) -> CoefficientTable {
    CoefficientTable::from_rows("test", rows).unwrap()
}

#[test]
fn test_horner() {
    let coeffs = [0.25, -0.5, 0.125];
    for x in [-32768.0, -100.0, 0.0, 1.0, 3.0, 12345.0] {
        assert_abs_diff_eq!(
            evaluate_polynomial(&coeffs, x),
            0.25 - 0.5 * x + 0.125 * x * x,
            epsilon = 1e-9
        );
    }

    // A lone constant.
    assert_abs_diff_eq!(evaluate_polynomial(&[1.5], 1000.0), 1.5);
    // Cubic.
    assert_abs_diff_eq!(
        evaluate_polynomial(&[1.0, 2.0, 3.0, 4.0], 2.0),
        1.0 + 4.0 + 12.0 + 32.0
    );
}

#[test]
fn test_requantise_rounds_and_saturates() {
    // Round to nearest, not truncation.
    assert_eq!(requantise(0.1, 3276.8), 328);
    assert_eq!(requantise(-0.1, 3276.8), -328);
    assert_eq!(requantise(1.4, 1.0), 1);
    assert_eq!(requantise(1.6, 1.0), 2);

    assert_eq!(requantise(100.0, 3276.8), i16::MAX);
    assert_eq!(requantise(-100.0, 3276.8), i16::MIN);
    assert_eq!(requantise(32767.4, 1.0), 32767);
    assert_eq!(requantise(32767.6, 1.0), 32767);
    assert_eq!(requantise(-32768.0, 1.0), -32768);
    assert_eq!(requantise(-32769.0, 1.0), -32768);
}

#[test]
fn test_single_sample_scenario() {
    // 1 frame, 1 channel, raw sample 100, V = 0.001 * x, +-10 V.
    let geometry = AcquisitionGeometry::new(1, 10.0, 1).with_channel_range(
        ChannelRole::Main,
        Device::Primary,
        "0",
    );
    let plan = ChannelPlan::new(&geometry).unwrap();
    let primary = table(vec![vec![0.0, 0.001]]);
    let corrector = SampleCorrector::new(&plan, &primary, None).unwrap();

    let mut samples = array![[100_i16]];
    corrector.apply_block(samples.view_mut());
    assert_eq!(samples, array![[328_i16]]);
}

#[test]
fn test_uncovered_words_pass_through() {
    // 2 analog channels in a 4-word frame.
    let geometry = AcquisitionGeometry::new(1, 5.0, 4).with_channel_range(
        ChannelRole::Main,
        Device::Primary,
        "0:1",
    );
    let plan = ChannelPlan::new(&geometry).unwrap();
    // Channel 0 is doubled, channel 1 is negated (in the integer domain).
    let scale = plan.voltage_to_int_scale();
    let primary = table(vec![vec![0.0, 2.0 / scale], vec![0.0, -1.0 / scale]]);
    let corrector = SampleCorrector::new(&plan, &primary, None).unwrap();

    let mut samples = array![[10, 20, -1, 0x7fff], [-30, 40, 0x5555, -32768]];
    corrector.apply_block(samples.view_mut());
    assert_eq!(samples, array![[20, -20, -1, 0x7fff], [-60, -40, 0x5555, -32768]]);
}

#[test]
fn test_devices_use_their_own_tables() {
    let geometry = AcquisitionGeometry::new(1, 5.0, 2)
        .with_dual_device(true)
        .with_channel_range(ChannelRole::Main, Device::Primary, "1")
        .with_channel_range(ChannelRole::Main, Device::Secondary, "0");
    let plan = ChannelPlan::new(&geometry).unwrap();
    let scale = plan.voltage_to_int_scale();
    let primary = table(vec![vec![0.0, 0.0], vec![100.0 / scale, 1.0 / scale]]);
    let secondary = table(vec![vec![-100.0 / scale, 1.0 / scale]]);
    let corrector = SampleCorrector::new(&plan, &primary, Some(&secondary)).unwrap();

    let mut samples = vec![5_i16, 5, 7, 7];
    corrector.apply_interleaved(&mut samples);
    assert_eq!(samples, vec![105, -95, 107, -93]);
}

#[test]
fn test_partial_frame_left_alone() {
    let geometry = AcquisitionGeometry::new(1, 5.0, 2).with_channel_range(
        ChannelRole::Main,
        Device::Primary,
        "0",
    );
    let plan = ChannelPlan::new(&geometry).unwrap();
    let primary = table(vec![vec![1.0 / plan.voltage_to_int_scale(), 1.0 / plan.voltage_to_int_scale()]]);
    let corrector = SampleCorrector::new(&plan, &primary, None).unwrap();

    let mut samples = vec![1_i16, 9, 2];
    corrector.apply_interleaved(&mut samples);
    assert_eq!(samples, vec![2, 9, 2]);
}

#[test]
#[should_panic(expected = "Sample block width doesn't match the channel plan")]
fn test_block_width_must_match_plan() {
    let plan = ChannelPlan::new(&AcquisitionGeometry::new(1, 5.0, 2)).unwrap();
    let primary = table(vec![vec![0.0, 1.0]]);
    let corrector = SampleCorrector::new(&plan, &primary, None).unwrap();

    let mut samples = vec![0_i16; 6];
    let block = ArrayViewMut2::from_shape((2, 3), samples.as_mut_slice()).unwrap();
    corrector.apply_block(block);
}

#[test]
fn test_unresolvable_plans() {
    let geometry = AcquisitionGeometry::new(1, 5.0, 4).with_channel_range(
        ChannelRole::Main,
        Device::Primary,
        "0:2",
    );
    let plan = ChannelPlan::new(&geometry).unwrap();
    let primary = table(vec![vec![0.0, 1.0], vec![0.0, 1.0]]);
    let result = SampleCorrector::new(&plan, &primary, None);
    assert!(matches!(
        result,
        Err(PlanError::UnknownChannel {
            device: Device::Primary,
            channel: 2,
            num_channels: 2
        })
    ));

    let geometry = AcquisitionGeometry::new(1, 5.0, 4)
        .with_dual_device(true)
        .with_channel_range(ChannelRole::Extra, Device::Secondary, "0");
    let plan = ChannelPlan::new(&geometry).unwrap();
    let result = SampleCorrector::new(&plan, &primary, None);
    assert!(matches!(result, Err(PlanError::NoSecondaryTable)));
}
