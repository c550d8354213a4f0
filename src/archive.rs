// SPDX-FileCopyrightText: 2026 Joshua Goins <josh@redstrate.com>
// SPDX-License-Identifier: GPL-3.0-or-later

//! The single entry point tying the pack, Excel, and definition layers
//! together. Everything here is owned by the [Archive] the caller constructs;
//! there is no process-wide singleton (spec §9).

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use tracing::instrument;

use crate::Error;
use crate::common::Language;
use crate::definition::{ConverterContext, ConvertedValue, RelationDefinition};
use crate::excel::{ExcelHeader, ExcelPage, MultiSheet, RawValue, Row, Sheet};
use crate::pack::{File, PackCollection};

/// A row's columns, read through the relation definition: logical column name
/// (or a generic `ColumnN` name for undeclared columns) to converted value.
pub type NamedRow = HashMap<String, ConvertedValue>;

/// Opens a directory of SqPack shards plus a relational definition, and serves
/// sheets and converted rows by name.
///
/// Sheets and their pages are parsed lazily on first access and cached for the
/// archive's lifetime (spec §3: weak caches are modelled here as caches that
/// are simply never evicted, since re-parsing is a pure function of immutable
/// bytes either way).
pub struct Archive {
    packs: PackCollection,
    definitions: Mutex<RelationDefinition>,
    language: Language,
    sheets: Mutex<HashMap<String, Arc<MultiSheet>>>,
}

impl Archive {
    /// Opens `root` as a SqPack game installation's `sqpack` directory,
    /// with `definitions` as the relational schema and `language` as the
    /// default for language-aware reads.
    pub fn new(
        root: impl AsRef<Path>,
        definitions: RelationDefinition,
        language: Language,
    ) -> Result<Archive, Error> {
        Ok(Archive {
            packs: PackCollection::new(root)?,
            definitions: Mutex::new(definitions),
            language,
            sheets: Mutex::new(HashMap::new()),
        })
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// Resolves a virtual path to a decoded [File], going straight through the
    /// pack layer without any Excel interpretation.
    pub fn file(&self, path: &str) -> Result<File, Error> {
        self.packs.get_file(path)
    }

    pub fn file_exists(&self, path: &str) -> bool {
        self.packs.file_exists(path)
    }

    /// Loads (or returns the cached) [MultiSheet] for `name`.
    ///
    /// Compiles the sheet's [crate::definition::SheetDefinition] against the
    /// physical header's column count on first load, if one is declared.
    #[instrument(skip(self))]
    pub fn get_sheet(&self, name: &str) -> Result<Arc<MultiSheet>, Error> {
        if let Some(sheet) = self.sheets.lock().unwrap().get(name) {
            return Ok(sheet.clone());
        }

        let header_path = format!("exd/{}.exh", name.to_lowercase());
        let header_file = self.packs.get_file(&header_path)?;
        let header = ExcelHeader::parse(header_file.bytes(), &header_path)?;

        {
            let mut definitions = self.definitions.lock().unwrap();
            if let Some(definition) = definitions.get_sheet_mut(name) {
                if !definition.is_compiled() {
                    definition.compile(header.columns.len() as u32)?;
                }
            }
        }

        let mut sheets = HashMap::with_capacity(header.languages.len());
        for &language in &header.languages {
            let mut pages = Vec::with_capacity(header.pages.len());
            for page in &header.pages {
                let filename = match language {
                    Language::None => format!("{name}_{}.exd", page.start_id),
                    lang => format!("{name}_{}_{}.exd", page.start_id, lang.shortname()),
                };
                let path = format!("exd/{filename}");
                let file = self.packs.get_file(&path)?;
                pages.push(ExcelPage::parse(file.bytes(), &header, &path)?);
            }
            sheets.insert(
                language,
                Sheet {
                    name: name.to_string(),
                    language,
                    header: header.clone(),
                    pages,
                },
            );
        }

        let sheet = Arc::new(MultiSheet {
            name: name.to_string(),
            header,
            sheets,
        });

        self.sheets
            .lock()
            .unwrap()
            .insert(name.to_string(), sheet.clone());

        Ok(sheet)
    }

    /// Reads a single row by key, applying the sheet's declared converters.
    /// Columns without a definition are returned raw under a generic name
    /// (spec §4.7's lookup policy).
    pub fn get_row(&self, sheet: &str, key: u32) -> Result<NamedRow, Error> {
        let multi = self.get_sheet(sheet)?;
        let row = multi.row(key, self.language)?.clone();
        Ok(self.convert_row(sheet, &row))
    }

    /// Reads a single sub-row by (parent, sub) key. Only meaningful for
    /// variant-2 sheets.
    pub fn get_subrow(&self, sheet: &str, key: u32, subrow_id: u16) -> Result<NamedRow, Error> {
        let multi = self.get_sheet(sheet)?;
        let row = multi.subrow(key, subrow_id, self.language)?.clone();
        Ok(self.convert_row(sheet, &row))
    }

    fn convert_row(&self, sheet: &str, row: &Row) -> NamedRow {
        let definition = {
            let definitions = self.definitions.lock().unwrap();
            definitions.get_sheet(sheet).cloned()
        };

        let mut result = HashMap::with_capacity(row.columns.len());
        for (index, raw) in row.columns.iter().enumerate() {
            let index = index as u32;
            let (name, converter) = match &definition {
                Some(definition) => (
                    definition.column_name(index).map(str::to_string),
                    definition.converter_for(index),
                ),
                None => (None, None),
            };
            let name = name.unwrap_or_else(|| format!("Column{index}"));
            let converted = match converter {
                Some(converter) => converter.apply(raw, sheet, row, self),
                None => ConvertedValue::Raw(raw.clone()),
            };
            result.insert(name, converted);
        }
        result
    }
}

impl ConverterContext for Archive {
    fn column_value(&self, sheet: &str, row: &Row, column: &str) -> Option<RawValue> {
        let definitions = self.definitions.lock().unwrap();
        let index = definitions.get_sheet(sheet)?.column_index(column).ok()?;
        row.columns.get(index as usize).cloned()
    }

    fn resolve_row(&self, sheet: &str, key: u32) -> Option<Row> {
        self.get_sheet(sheet).ok()?.row(key, self.language).ok().cloned()
    }

    fn find_row_by_column(&self, sheet: &str, column: &str, value: i64) -> Option<(u32, Row)> {
        let multi = self.get_sheet(sheet).ok()?;
        let index = {
            let definitions = self.definitions.lock().unwrap();
            definitions.get_sheet(sheet)?.column_index(column).ok()?
        };
        multi.iter(self.language).ok()?.find_map(|(key, row)| {
            let matches = row
                .columns
                .get(index as usize)
                .and_then(RawValue::as_i64)
                .is_some_and(|v| v == value);
            matches.then(|| (key, row.clone()))
        })
    }

    fn generic_reference_targets(&self) -> Vec<String> {
        let definitions = self.definitions.lock().unwrap();
        definitions
            .generic_reference_targets()
            .map(|sheet| sheet.name.clone())
            .collect()
    }

    fn sheet_contains_key(&self, sheet: &str, key: u32) -> bool {
        self.get_sheet(sheet)
            .map(|multi| multi.header.page_for(key).is_some())
            .unwrap_or(false)
    }

    fn column_index(&self, sheet: &str, column: &str) -> Option<u32> {
        let definitions = self.definitions.lock().unwrap();
        definitions.get_sheet(sheet)?.column_index(column).ok()
    }
}
