// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Tests against command-line interfaces that aren't big enough to go in their
//! own modules.

use std::{path::PathBuf, str::FromStr};

use super::*;

#[test]
fn test_normalise_dir() {
    let n = |s| normalise_dir(s);
    assert_eq!(n("/data/raw"), Some(PathBuf::from("/data/raw")));
    assert_eq!(n("  /data/raw/  "), Some(PathBuf::from("/data/raw")));
    assert_eq!(n("/data/raw///"), Some(PathBuf::from("/data/raw")));
    assert_eq!(n(r"D:\rec\day1\"), Some(PathBuf::from("D:/rec/day1")));
    assert_eq!(n("relative/dir/"), Some(PathBuf::from("relative/dir")));
    assert_eq!(n("/"), Some(PathBuf::from("/")));
    assert_eq!(n("//"), Some(PathBuf::from("/")));
    assert_eq!(n(""), None);
    assert_eq!(n(" \t"), None);
}

#[test]
fn test_non_blank() {
    assert_eq!(non_blank(None), None);
    assert_eq!(non_blank(Some("  ".to_string())), None);
    assert_eq!(non_blank(Some(" Dev1 ".to_string())), Some("Dev1".to_string()));
}

#[test]
fn test_arg_file_types() {
    assert!(matches!(ArgFileTypes::from_str("toml"), Ok(ArgFileTypes::Toml)));
    assert!(matches!(ArgFileTypes::from_str("json"), Ok(ArgFileTypes::Json)));
    assert!(ArgFileTypes::from_str("yaml").is_err());
    assert!(ARG_FILE_HELP.ends_with("toml, json"));
}
