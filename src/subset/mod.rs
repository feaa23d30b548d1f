// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Code to parse channel range expressions, e.g. "0:3,7,10:11".
//!
//! A range expression is a comma-separated list of terms. Each term is either
//! a single non-negative integer or an inclusive range "first:last". The
//! expanded result always has bit-set semantics; indices come out ascending
//! and duplicates are collapsed.

mod error;
#[cfg(test)]
mod tests;

pub use error::SubsetError;

use std::ops::RangeInclusive;

/// The special save-subset string meaning "every acquired channel was saved".
pub const ALL_CHANNELS: &str = "all";

/// Does this save-subset string select all channels? Empty strings are treated
/// the same as "all".
pub fn is_all_channels(s: &str) -> bool {
    let s = s.trim();
    s.is_empty() || s.eq_ignore_ascii_case(ALL_CHANNELS)
}

/// Parse a range expression into ascending, disjoint, inclusive ranges.
/// Overlapping and adjacent terms are merged. Nothing is expanded, so this is
/// safe to call on untrusted input with enormous indices.
pub fn parse_ranges(s: &str) -> Result<Vec<RangeInclusive<usize>>, SubsetError> {
    let mut ranges = parse_terms(s)?;
    ranges.sort_unstable_by_key(|r| *r.start());

    let mut merged: Vec<RangeInclusive<usize>> = Vec::with_capacity(ranges.len());
    for range in ranges {
        match merged.last_mut() {
            Some(prev) if *range.start() <= prev.end().saturating_add(1) => {
                if range.end() > prev.end() {
                    *prev = *prev.start()..=*range.end();
                }
            }
            _ => merged.push(range),
        }
    }
    Ok(merged)
}

/// The number of indices covered by disjoint ranges, or `None` if that
/// doesn't fit in a `usize`.
pub fn count_indices(ranges: &[RangeInclusive<usize>]) -> Option<usize> {
    ranges.iter().try_fold(0_usize, |acc, r| {
        (r.end() - r.start())
            .checked_add(1)
            .and_then(|n| acc.checked_add(n))
    })
}

/// Expand a range expression into ascending, unique indices, all of which
/// must be less than `limit`. An empty (or whitespace-only) expression yields
/// no indices.
pub fn range_to_vec(s: &str, limit: usize) -> Result<Vec<usize>, SubsetError> {
    let ranges = parse_ranges(s)?;
    check_limit(s, &ranges, limit)?;
    Ok(ranges.into_iter().flatten().collect())
}

/// Expand a range expression into a bit mask of exactly `len` bits. Every
/// index must be less than `len`.
pub fn range_to_bits(s: &str, len: usize) -> Result<Vec<bool>, SubsetError> {
    let ranges = parse_ranges(s)?;
    check_limit(s, &ranges, len)?;
    let mut bits = vec![false; len];
    for i in ranges.into_iter().flatten() {
        bits[i] = true;
    }
    Ok(bits)
}

fn check_limit(
    input: &str,
    ranges: &[RangeInclusive<usize>],
    limit: usize,
) -> Result<(), SubsetError> {
    match ranges.last() {
        Some(last) if *last.end() >= limit => Err(SubsetError::OutOfRange {
            input: input.to_string(),
            index: *last.end(),
            limit,
        }),
        _ => Ok(()),
    }
}

fn parse_terms(s: &str) -> Result<Vec<RangeInclusive<usize>>, SubsetError> {
    let mut ranges = vec![];
    if s.trim().is_empty() {
        return Ok(ranges);
    }

    for term in s.split(',') {
        let term = term.trim();
        if term.is_empty() {
            return Err(SubsetError::EmptyTerm {
                input: s.to_string(),
            });
        }

        match term.split_once(':') {
            None => {
                let index = parse_index(s, term)?;
                ranges.push(index..=index);
            }

            Some((first, last)) => {
                let first = parse_index(s, first.trim())?;
                let last = parse_index(s, last.trim())?;
                if first > last {
                    return Err(SubsetError::Descending {
                        input: s.to_string(),
                        first,
                        last,
                    });
                }
                ranges.push(first..=last);
            }
        }
    }

    Ok(ranges)
}

fn parse_index(input: &str, term: &str) -> Result<usize, SubsetError> {
    // `usize::from_str` would accept a leading '+'; channel indices never have
    // one.
    if term.is_empty() || !term.bytes().all(|b| b.is_ascii_digit()) {
        return Err(SubsetError::BadTerm {
            input: input.to_string(),
            term: term.to_string(),
        });
    }
    term.parse().map_err(|_| SubsetError::BadTerm {
        input: input.to_string(),
        term: term.to_string(),
    })
}
