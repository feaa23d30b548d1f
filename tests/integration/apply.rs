// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::fs;

use crate::{get_cmd_output, niscaler, path_arg, read_samples, Workspace};

#[test]
fn test_apply_corrects_recordings() {
    let ws = Workspace::new();
    ws.add_recording("run_g0_t0.nidq", "", &[100, 3, -100, 4]);

    let cmd = niscaler()
        .arg("apply")
        .args(ws.dir_args())
        .arg("--no-progress-bars")
        .ok();
    assert!(cmd.is_ok(), "apply failed: {}", cmd.err().unwrap());
    let (stdout, stderr) = get_cmd_output(cmd);
    assert!(stderr.is_empty(), "stderr wasn't empty: {stderr}");
    assert!(stdout.contains("1 recordings corrected"), "{stdout}");

    assert_eq!(
        read_samples(&ws.dst.join("run_g0_t0.nidq.bin")),
        vec![328, 3, -328, 4]
    );
    let meta = fs::read_to_string(ws.dst.join("run_g0_t0.nidq.meta")).unwrap();
    assert!(meta.lines().any(|l| l.starts_with("NIScaler=")), "{meta}");

    // Correcting the corrected output again does nothing.
    let out_dir = ws.src.join("again");
    fs::create_dir(&out_dir).unwrap();
    #[rustfmt::skip]
    let cmd = niscaler()
        .args([
            "apply",
            "--cal-dir", &path_arg(&ws.cal),
            "--src-dir", &path_arg(&ws.dst),
            "--dst-dir", &path_arg(&out_dir),
        ])
        .ok();
    let (stdout, _) = get_cmd_output(cmd);
    assert!(stdout.contains("1 recordings skipped"), "{stdout}");
    assert!(fs::read_dir(&out_dir).unwrap().next().is_none());
}

#[test]
fn test_apply_dry_run_writes_nothing() {
    let ws = Workspace::new();
    ws.add_recording("a", "", &[1, 2]);

    let cmd = niscaler()
        .arg("apply")
        .args(ws.dir_args())
        .arg("--dry-run")
        .ok();
    assert!(cmd.is_ok(), "apply --dry-run failed: {}", cmd.err().unwrap());
    let (stdout, _) = get_cmd_output(cmd);
    assert!(stdout.contains("1 recordings can be corrected"), "{stdout}");
    assert!(fs::read_dir(&ws.dst).unwrap().next().is_none());
}

#[test]
fn test_apply_args_file() {
    let ws = Workspace::new();
    ws.add_recording("a", "", &[100, 0]);
    let args_file = ws.cal.join("args.toml");
    fs::write(
        &args_file,
        format!(
            "cal_dir = {:?}\nsrc_dir = {:?}\ndst_dir = {:?}\n",
            path_arg(&ws.cal),
            path_arg(&ws.src),
            path_arg(&ws.dst)
        ),
    )
    .unwrap();

    let cmd = niscaler()
        .args(["apply", &path_arg(&args_file)])
        .ok();
    assert!(cmd.is_ok(), "apply failed: {}", cmd.err().unwrap());
    assert_eq!(read_samples(&ws.dst.join("a.bin")), vec![328, 0]);
}

#[test]
fn test_apply_skips_uncalibrated_recordings() {
    let ws = Workspace::new();
    ws.add_recording("good", "", &[100, 0]);
    ws.add_recording("other_range", "niAiRangeMax=5\n", &[100, 0]);

    let cmd = niscaler().arg("apply").args(ws.dir_args()).ok();
    assert!(cmd.is_ok(), "apply failed: {}", cmd.err().unwrap());
    let (stdout, _) = get_cmd_output(cmd);
    assert!(stdout.contains("Dev1_PCIe-6341_V5"), "{stdout}");
    assert!(ws.dst.join("good.bin").exists());
    assert!(!ws.dst.join("other_range.bin").exists());
}

#[test]
fn test_apply_missing_args() {
    let ws = Workspace::new();

    #[rustfmt::skip]
    let cmd = niscaler()
        .args([
            "apply",
            "--cal-dir", &path_arg(&ws.cal),
            "--src-dir", &path_arg(&ws.src),
        ])
        .ok();
    assert!(cmd.is_err());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.contains("No destination directory"), "{stderr}");
}

#[test]
fn test_apply_same_directory() {
    let ws = Workspace::new();

    #[rustfmt::skip]
    let cmd = niscaler()
        .args([
            "apply",
            "--cal-dir", &path_arg(&ws.cal),
            "--src-dir", &path_arg(&ws.src),
            "--dst-dir", &format!("{}/", path_arg(&ws.src)),
        ])
        .ok();
    assert!(cmd.is_err());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.contains("are the same"), "{stderr}");
}
