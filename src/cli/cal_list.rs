// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::borrow::Cow;

use clap::Parser;
use log::info;

use super::common::{display_warnings, normalise_dir, InfoPrinter, Warn};
use crate::{
    calibration::{CalStore, CoefficientTable, CAL_STORE_FILENAME},
    NiscalerError,
};

/// List the calibration tables in a calibration store.
#[derive(Parser, Debug, Default)]
pub(super) struct CalListArgs {
    /// The directory containing the calibration store.
    #[clap(short, long)]
    cal_dir: String,
}

impl CalListArgs {
    pub(super) fn run(&self) -> Result<(), NiscalerError> {
        let store_file = normalise_dir(&self.cal_dir)
            .ok_or_else(|| NiscalerError::Generic("No calibration directory was specified".to_string()))?
            .join(CAL_STORE_FILENAME);
        if !store_file.is_file() {
            return Err(NiscalerError::CalStore(format!(
                "No calibration store was found at {}",
                store_file.display()
            )));
        }
        let store = CalStore::read(&store_file)?;

        let lines = table_summaries(&store);
        if lines.is_empty() {
            info!("{} has no calibration tables", store_file.display());
            return Ok(());
        }
        let mut printer = InfoPrinter::new(format!("{}", store_file.display()).into());
        printer.push_block(lines);
        printer.display();
        display_warnings();

        Ok(())
    }
}

/// One line per table in the store. Tables that can't be used are noted as
/// warnings.
fn table_summaries(store: &CalStore) -> Vec<Cow<'static, str>> {
    let mut lines = vec![];
    for name in store.group_names() {
        match CoefficientTable::load_group(store, name) {
            Ok(table) => lines.push(
                format!(
                    "{name}: {} channels, polynomial order {}",
                    table.num_channels(),
                    table.num_coeffs() - 1
                )
                .into(),
            ),
            Err(e) if e.is_missing() => (),
            Err(e) => {
                lines.push(format!("{name}: unusable").into());
                e.to_string().warn();
            }
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use super::*;

    #[test]
    fn test_table_summaries() {
        let store = CalStore::parse(indoc! {"
            [General]
            version=1

            [Dev1_PCIe-6341_V5]
            nai=2
            ai0=0, 1, 2
            ai1=0, 1, 2

            [Dev1_PCIe-6341_V10]
            nai=1
            ai0=0, 1, oops
        "})
        .unwrap();
        assert_eq!(
            table_summaries(&store),
            vec![
                "Dev1_PCIe-6341_V5: 2 channels, polynomial order 2",
                "Dev1_PCIe-6341_V10: unusable"
            ]
        );
    }
}
