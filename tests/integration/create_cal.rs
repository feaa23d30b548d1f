// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::fs;

use crate::{get_cmd_output, niscaler, path_arg, Workspace};

#[test]
fn test_create_cal_without_hardware() {
    let ws = Workspace::new();
    let before = fs::read_to_string(ws.cal.join("niscaler_cal.ini")).unwrap();

    let cmd = niscaler()
        .args(["create-cal", "--cal-dir", &path_arg(&ws.cal)])
        .ok();
    assert!(cmd.is_err());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.contains("isn't available in this build"), "{stderr}");

    // The store is untouched.
    let after = fs::read_to_string(ws.cal.join("niscaler_cal.ini")).unwrap();
    assert_eq!(before, after);
}

#[test]
fn test_cal_list() {
    let ws = Workspace::new();

    let cmd = niscaler()
        .args(["cal-list", "--cal-dir", &path_arg(&ws.cal)])
        .ok();
    assert!(cmd.is_ok(), "cal-list failed: {}", cmd.err().unwrap());
    let (stdout, _) = get_cmd_output(cmd);
    assert!(
        stdout.contains("Dev1_PCIe-6341_V10: 1 channels, polynomial order 1"),
        "{stdout}"
    );

    let cmd = niscaler()
        .args(["cal-list", "--cal-dir", &path_arg(&ws.src)])
        .ok();
    assert!(cmd.is_err());
}

#[test]
fn test_no_subcommand() {
    let cmd = niscaler().ok();
    assert!(cmd.is_err());
}
