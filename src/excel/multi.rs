// SPDX-FileCopyrightText: 2026 Joshua Goins <josh@redstrate.com>
// SPDX-License-Identifier: GPL-3.0-or-later

//! Multiplexes a sheet's rows across every language its header carries,
//! falling back to the language-agnostic variant when a requested language
//! isn't one of them.

use std::collections::HashMap;

use crate::Error;
use crate::common::Language;
use crate::excel::header::ExcelHeader;
use crate::excel::page::Row;
use crate::excel::sheet::Sheet;

/// A sheet materialised once per language, as loaded by [crate::Archive::get_sheet].
#[derive(Debug, Clone)]
pub struct MultiSheet {
    pub name: String,
    pub header: ExcelHeader,
    pub sheets: HashMap<Language, Sheet>,
}

impl MultiSheet {
    fn sheet_for(&self, language: Language) -> Result<&Sheet, Error> {
        self.sheets
            .get(&language)
            .or_else(|| self.sheets.get(&Language::None))
            .ok_or_else(|| Error::LanguageUnavailable {
                sheet: self.name.clone(),
            })
    }

    /// Looks up a row in `language`, transparently falling back to the
    /// language-agnostic variant if `language` isn't carried by this sheet.
    pub fn row(&self, key: u32, language: Language) -> Result<&Row, Error> {
        self.sheet_for(language)?.row(key).ok_or_else(|| Error::NotFound {
            what: format!("row {key} in sheet '{}'", self.name),
        })
    }

    /// Looks up a specific sub-row in `language`. Only meaningful for sub-row sheets.
    pub fn subrow(&self, key: u32, subrow_id: u16, language: Language) -> Result<&Row, Error> {
        self.sheet_for(language)?
            .subrow(key, subrow_id)
            .ok_or_else(|| Error::NotFound {
                what: format!("subrow {key}:{subrow_id} in sheet '{}'", self.name),
            })
    }

    pub fn contains(&self, key: u32, language: Language) -> bool {
        self.row(key, language).is_ok()
    }

    /// Iterates every row in `language` in ascending key order (spec §5: row
    /// iteration order is identical across languages).
    pub fn iter(&self, language: Language) -> Result<impl Iterator<Item = (u32, &Row)>, Error> {
        Ok(self.sheet_for(language)?.iter())
    }

    pub fn keys(&self, language: Language) -> Result<impl Iterator<Item = u32> + '_, Error> {
        Ok(self.sheet_for(language)?.keys())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::excel::header::ExcelHeader;
    use crate::excel::page::{ExcelPage, RowSet};
    use crate::excel::value::RawValue;

    fn header_bytes() -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(b"EXHF");
        buf.extend_from_slice(&3u16.to_be_bytes());
        buf.extend_from_slice(&4u16.to_be_bytes());
        buf.extend_from_slice(&1u16.to_be_bytes());
        buf.extend_from_slice(&1u16.to_be_bytes());
        buf.extend_from_slice(&2u16.to_be_bytes()); // two languages: none + english
        buf.extend_from_slice(&0u16.to_be_bytes());
        buf.push(0);
        buf.push(1); // SingleRow
        buf.extend_from_slice(&0u16.to_be_bytes());
        buf.extend_from_slice(&1u32.to_be_bytes());
        buf.extend_from_slice(&[0u8; 8]);
        buf.extend_from_slice(&0x2u16.to_be_bytes()); // Int8 column
        buf.extend_from_slice(&0u16.to_be_bytes());
        buf.extend_from_slice(&0u32.to_be_bytes()); // page start
        buf.extend_from_slice(&1u32.to_be_bytes()); // page row count
        buf.push(0); // None
        buf.push(2); // English
        buf.push(0);
        buf
    }

    fn page(value: i8) -> ExcelPage {
        ExcelPage {
            rows: vec![(
                0,
                RowSet::Single(Row {
                    columns: vec![RawValue::Int8(value)],
                }),
            )],
        }
    }

    fn multi_sheet() -> MultiSheet {
        let header = ExcelHeader::parse(&header_bytes(), "test.exh").unwrap();
        let mut sheets = HashMap::new();
        sheets.insert(
            Language::None,
            Sheet {
                name: "Test".to_string(),
                language: Language::None,
                header: header.clone(),
                pages: vec![page(1)],
            },
        );
        sheets.insert(
            Language::English,
            Sheet {
                name: "Test".to_string(),
                language: Language::English,
                header: header.clone(),
                pages: vec![page(2)],
            },
        );
        MultiSheet {
            name: "Test".to_string(),
            header,
            sheets,
        }
    }

    #[test]
    fn reads_the_requested_language() {
        let multi = multi_sheet();
        assert_eq!(
            multi.row(0, Language::English).unwrap().columns[0],
            RawValue::Int8(2)
        );
    }

    #[test]
    fn falls_back_to_neutral_when_language_missing() {
        let multi = multi_sheet();
        assert_eq!(
            multi.row(0, Language::German).unwrap().columns[0],
            RawValue::Int8(1)
        );
    }

    #[test]
    fn reports_unavailable_without_neutral_fallback() {
        let mut multi = multi_sheet();
        multi.sheets.remove(&Language::None);
        assert!(matches!(
            multi.row(0, Language::German),
            Err(Error::LanguageUnavailable { .. })
        ));
    }
}
