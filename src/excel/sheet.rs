// SPDX-FileCopyrightText: 2026 Joshua Goins <josh@redstrate.com>
// SPDX-License-Identifier: GPL-3.0-or-later

use crate::common::Language;
use crate::excel::header::ExcelHeader;
use crate::excel::page::{ExcelPage, Row};

/// A named sheet materialised for one language: its header plus every page
/// covering that language's row data.
///
/// Sheets are produced by [crate::Archive::get_sheet]; row lookups scan the
/// header's page ranges for the one covering a key and then consult that
/// page's index segment, per the on-disk ordering guarantee (rows within a
/// page are stored in ascending key order, and pages themselves never overlap).
#[derive(Debug, Clone)]
pub struct Sheet {
    pub name: String,
    pub language: Language,
    pub header: ExcelHeader,
    pub pages: Vec<ExcelPage>,
}

impl Sheet {
    /// Looks up the single row (or, for sub-row sheets, sub-row zero) at `key`.
    pub fn row(&self, key: u32) -> Option<&Row> {
        let page_index = self.header.page_for(key)?;
        self.pages.get(page_index)?.row(key)
    }

    /// Looks up a specific sub-row. Always `None` for single-row sheets.
    pub fn subrow(&self, key: u32, subrow_id: u16) -> Option<&Row> {
        let page_index = self.header.page_for(key)?;
        self.pages.get(page_index)?.subrow(key, subrow_id)
    }

    pub fn contains(&self, key: u32) -> bool {
        self.row(key).is_some()
    }

    /// Iterates every row in the sheet in ascending key order, across pages in
    /// the order the header declares them.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &Row)> {
        self.pages.iter().flat_map(|page| {
            page.rows.iter().filter_map(|(key, set)| match set {
                crate::excel::page::RowSet::Single(row) => Some((*key, row)),
                crate::excel::page::RowSet::SubRows(subrows) => {
                    subrows.first().map(|(_, row)| (*key, row))
                }
            })
        })
    }

    pub fn keys(&self) -> impl Iterator<Item = u32> + '_ {
        self.iter().map(|(key, _)| key)
    }
}
