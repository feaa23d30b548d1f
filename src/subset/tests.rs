// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use super::*;

#[test]
fn test_range_to_vec() {
    let result = range_to_vec("0:3,7", 100);
    assert!(result.is_ok(), "{:?}", result.unwrap_err());
    assert_eq!(result.unwrap(), vec![0, 1, 2, 3, 7]);

    let result = range_to_vec(" 0 : 1 , 5 ", 100);
    assert!(result.is_ok(), "{:?}", result.unwrap_err());
    assert_eq!(result.unwrap(), vec![0, 1, 5]);

    // Single-element ranges are fine.
    assert_eq!(range_to_vec("4:4", 100).unwrap(), vec![4]);
}

#[test]
fn test_range_to_vec_sorts_and_dedups() {
    assert_eq!(range_to_vec("7,0:2,1", 100).unwrap(), vec![0, 1, 2, 7]);
}

#[test]
fn test_empty_range_is_no_channels() {
    assert!(range_to_vec("", 100).unwrap().is_empty());
    assert!(range_to_vec("   ", 100).unwrap().is_empty());
    assert!(range_to_bits("", 0).unwrap().is_empty());
}

#[test]
fn test_range_to_bits() {
    let bits = range_to_bits("0,2,4", 6).unwrap();
    assert_eq!(bits, vec![true, false, true, false, true, false]);
    assert!(range_to_bits("", 3).unwrap().iter().all(|b| !b));
}

#[test]
fn test_indices_past_the_limit() {
    assert_eq!(
        range_to_bits("0,6", 6),
        Err(SubsetError::OutOfRange {
            input: "0,6".to_string(),
            index: 6,
            limit: 6
        })
    );
    // Huge indices are rejected without expanding anything.
    assert!(matches!(
        range_to_bits("0,1000000000000", 4),
        Err(SubsetError::OutOfRange {
            index: 1_000_000_000_000,
            limit: 4,
            ..
        })
    ));
    assert!(matches!(
        range_to_vec("0:18446744073709551615", 64),
        Err(SubsetError::OutOfRange { limit: 64, .. })
    ));
}

#[test]
fn test_parse_ranges_merges() {
    assert_eq!(parse_ranges("7,0:2,1,3").unwrap(), vec![0..=3, 7..=7]);
    assert_eq!(parse_ranges("5:9,0,6:7").unwrap(), vec![0..=0, 5..=9]);
    assert!(parse_ranges("").unwrap().is_empty());
}

#[test]
fn test_count_indices() {
    let ranges = parse_ranges("0:3,10,20:29").unwrap();
    assert_eq!(count_indices(&ranges), Some(15));
    assert_eq!(count_indices(&[]), Some(0));

    let ranges = parse_ranges("0:18446744073709551615").unwrap();
    assert_eq!(count_indices(&ranges), None);
}

#[test]
fn test_malformed_ranges() {
    assert!(matches!(
        range_to_vec("0,,1", 100),
        Err(SubsetError::EmptyTerm { .. })
    ));
    assert!(matches!(
        range_to_vec("0,a", 100),
        Err(SubsetError::BadTerm { term, .. }) if term == "a"
    ));
    assert!(matches!(
        range_to_vec("-1", 100),
        Err(SubsetError::BadTerm { .. })
    ));
    assert!(matches!(
        range_to_vec("+1", 100),
        Err(SubsetError::BadTerm { .. })
    ));
    assert!(matches!(
        range_to_vec("1:", 100),
        Err(SubsetError::BadTerm { .. })
    ));
    assert_eq!(
        range_to_vec("5:2", 100),
        Err(SubsetError::Descending {
            input: "5:2".to_string(),
            first: 5,
            last: 2
        })
    );
}

#[test]
fn test_is_all_channels() {
    assert!(is_all_channels("all"));
    assert!(is_all_channels("ALL"));
    assert!(is_all_channels(" all "));
    assert!(is_all_channels(""));
    assert!(!is_all_channels("0:3"));
}
