// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Integration tests.
//!
//! Some help for laying out these tests was taken from:
//! https://matklad.github.io/2021/02/27/delete-cargo-integration-tests.html

mod apply;
mod create_cal;

use std::{
    fs,
    path::{Path, PathBuf},
    process::Output,
    str::from_utf8,
};

use assert_cmd::{output::OutputError, Command};
use tempfile::TempDir;

fn niscaler() -> Command {
    Command::cargo_bin("niscaler").unwrap()
}

fn get_cmd_output(result: Result<Output, OutputError>) -> (String, String) {
    let output = match result {
        Ok(o) => o,
        Err(o) => o.as_output().unwrap().clone(),
    };
    (
        from_utf8(&output.stdout).unwrap().to_string(),
        from_utf8(&output.stderr).unwrap().to_string(),
    )
}

/// A scratch area with a calibration directory holding one table, and empty
/// source and destination directories.
struct Workspace {
    _tmp_dir: TempDir,
    cal: PathBuf,
    src: PathBuf,
    dst: PathBuf,
}

impl Workspace {
    fn new() -> Workspace {
        let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
        let cal = tmp_dir.path().join("cal");
        let src = tmp_dir.path().join("src");
        let dst = tmp_dir.path().join("dst");
        for d in [&cal, &src, &dst] {
            fs::create_dir(d).unwrap();
        }
        fs::write(
            cal.join("niscaler_cal.ini"),
            "[Dev1_PCIe-6341_V10]\nnai=1\nai0=0, 0.001\n",
        )
        .unwrap();
        Workspace {
            _tmp_dir: tmp_dir,
            cal,
            src,
            dst,
        }
    }

    /// Write a single-device recording with one calibrated channel and one
    /// digital word per frame.
    fn add_recording(&self, name: &str, extra_meta: &str, samples: &[i16]) {
        fs::write(
            self.src.join(format!("{name}.meta")),
            format!(
                "appVersion=20200101\nniAiRangeMax=10\nniMuxFactor=1\nnSavedChans=2\n\
                 niMNChans1=0\nniDev1=Dev1\nniDev1ProductName=PCIe-6341\n{extra_meta}"
            ),
        )
        .unwrap();
        let bytes: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
        fs::write(self.src.join(format!("{name}.bin")), bytes).unwrap();
    }

    fn dir_args(&self) -> Vec<String> {
        vec![
            "--cal-dir".to_string(),
            path_arg(&self.cal),
            "--src-dir".to_string(),
            path_arg(&self.src),
            "--dst-dir".to_string(),
            path_arg(&self.dst),
        ]
    }
}

fn path_arg(p: &Path) -> String {
    p.display().to_string()
}

fn read_samples(file: &Path) -> Vec<i16> {
    fs::read(file)
        .unwrap()
        .chunks_exact(2)
        .map(|b| i16::from_le_bytes([b[0], b[1]]))
        .collect()
}
