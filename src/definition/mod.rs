// SPDX-FileCopyrightText: 2026 Joshua Goins <josh@redstrate.com>
// SPDX-License-Identifier: GPL-3.0-or-later

//! The relational definition layer: a composable column schema loaded from JSON
//! that gives a sheet's physical columns logical names, and declares the value
//! converters (cross-sheet links, icons, colors) applied on read.

mod converter;
mod json;

pub use converter::{ConditionalLink, Converter, ConverterContext, ConvertedValue, ResolvedLink};
pub use json::parse_relation_definition;

use std::collections::HashMap;

use crate::Error;

/// A column schema node: a single named column, a fixed group of members, or a
/// member repeated `count` times with an indexed name suffix.
#[derive(Debug, Clone)]
pub enum DataDefinition {
    Single {
        name: Option<String>,
        converter: Option<Converter>,
    },
    Group {
        members: Vec<DataDefinition>,
    },
    Repeat {
        count: u32,
        inner: Box<DataDefinition>,
        naming_offset: u32,
    },
}

impl DataDefinition {
    /// The number of physical columns this node spans.
    pub fn len(&self) -> u32 {
        match self {
            DataDefinition::Single { .. } => 1,
            DataDefinition::Group { members } => members.iter().map(|m| m.len()).sum(),
            DataDefinition::Repeat { count, inner, .. } => count * inner.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The logical name of the column at local index `i`, or `None` if `i` is
    /// out of range or the slot has no name (an unnamed `Single`).
    pub fn get_name(&self, i: u32) -> Option<String> {
        if i >= self.len() {
            return None;
        }
        match self {
            DataDefinition::Single { name, .. } => name.clone(),
            DataDefinition::Group { members } => {
                let mut base = 0;
                for member in members {
                    let member_len = member.len();
                    if i < base + member_len {
                        return member.get_name(i - base);
                    }
                    base += member_len;
                }
                None
            }
            DataDefinition::Repeat {
                inner,
                naming_offset,
                ..
            } => {
                let inner_len = inner.len();
                let repetition = i / inner_len;
                let local = i % inner_len;
                let inner_name = inner.get_name(local)?;
                Some(format!("{inner_name}[{}]", repetition + naming_offset))
            }
        }
    }

    /// The converter that applies at local index `i`, if any.
    pub fn get_converter(&self, i: u32) -> Option<&Converter> {
        if i >= self.len() {
            return None;
        }
        match self {
            DataDefinition::Single { converter, .. } => converter.as_ref(),
            DataDefinition::Group { members } => {
                let mut base = 0;
                for member in members {
                    let member_len = member.len();
                    if i < base + member_len {
                        return member.get_converter(i - base);
                    }
                    base += member_len;
                }
                None
            }
            DataDefinition::Repeat { inner, .. } => {
                let inner_len = inner.len();
                inner.get_converter(i % inner_len)
            }
        }
    }
}

/// A [DataDefinition] anchored at a physical column index.
#[derive(Debug, Clone)]
pub struct Positioned {
    pub index: u32,
    pub inner: DataDefinition,
}

/// A compiled column lookup: total maps between physical index and logical name
/// for every column a [SheetDefinition] declares.
#[derive(Debug, Clone, Default)]
pub struct CompiledColumns {
    pub index_to_name: HashMap<u32, String>,
    pub name_to_index: HashMap<String, u32>,
}

/// A sheet's column schema: a list of [Positioned] definitions, a default
/// column, and whether the sheet is a candidate for generic-reference resolution.
#[derive(Debug, Clone)]
pub struct SheetDefinition {
    pub name: String,
    pub default_column: Option<String>,
    pub is_generic_reference_target: bool,
    pub data_definitions: Vec<Positioned>,
    compiled: Option<CompiledColumns>,
}

impl SheetDefinition {
    pub fn new(
        name: String,
        default_column: Option<String>,
        is_generic_reference_target: bool,
        data_definitions: Vec<Positioned>,
    ) -> SheetDefinition {
        SheetDefinition {
            name,
            default_column,
            is_generic_reference_target,
            data_definitions,
            compiled: None,
        }
    }

    /// Materialises the index↔name lookup maps. Definitions whose physical index
    /// lands outside `header_column_count` are dropped with a diagnostic; reads
    /// through them by name will fail with [Error::ColumnMismatch] but raw
    /// positional reads still work. Idempotent: calling twice yields identical maps.
    pub fn compile(&mut self, header_column_count: u32) -> Result<(), Error> {
        let mut index_to_name = HashMap::new();
        let mut name_to_index = HashMap::new();

        for positioned in &self.data_definitions {
            let span = positioned.inner.len();
            for i in 0..span {
                let offset = positioned.index + i;
                if offset >= header_column_count {
                    tracing::warn!(
                        sheet = %self.name,
                        index = offset,
                        "definition column is out of range for the sheet's header; dropping"
                    );
                    continue;
                }
                if let Some(name) = positioned.inner.get_name(i) {
                    index_to_name.insert(offset, name.clone());
                    name_to_index.insert(name, offset);
                }
            }
        }

        self.compiled = Some(CompiledColumns {
            index_to_name,
            name_to_index,
        });
        Ok(())
    }

    pub fn is_compiled(&self) -> bool {
        self.compiled.is_some()
    }

    pub fn column_index(&self, name: &str) -> Result<u32, Error> {
        self.compiled
            .as_ref()
            .and_then(|c| c.name_to_index.get(name).copied())
            .ok_or_else(|| Error::NotFound {
                what: format!("column '{name}' on sheet '{}'", self.name),
            })
    }

    pub fn column_name(&self, index: u32) -> Option<&str> {
        self.compiled
            .as_ref()
            .and_then(|c| c.index_to_name.get(&index))
            .map(|s| s.as_str())
    }

    /// The converter declared for the column at physical `index`, if any definition covers it.
    pub fn converter_for(&self, index: u32) -> Option<&Converter> {
        self.data_definitions.iter().find_map(|positioned| {
            if index < positioned.index {
                return None;
            }
            let local = index - positioned.index;
            positioned.inner.get_converter(local)
        })
    }
}

/// Top-level container of every sheet's definition, as loaded from the schema
/// JSON (§6 of the archive's external interface).
///
/// Sheets are looked up by name through `sheets`, but `order` keeps the
/// original declaration order so [RelationDefinition::generic_reference_targets]
/// stays deterministic (spec §4.8) rather than following the `HashMap`'s
/// arbitrary iteration order.
#[derive(Debug, Clone)]
pub struct RelationDefinition {
    pub version: String,
    sheets: HashMap<String, SheetDefinition>,
    order: Vec<String>,
}

impl RelationDefinition {
    pub fn new(version: String, sheets: Vec<SheetDefinition>) -> Result<RelationDefinition, Error> {
        let mut map = HashMap::with_capacity(sheets.len());
        let mut order = Vec::with_capacity(sheets.len());
        for sheet in sheets {
            if map.contains_key(&sheet.name) {
                return Err(Error::BadDefinition {
                    reason: format!("duplicate sheet name '{}'", sheet.name),
                });
            }
            order.push(sheet.name.clone());
            map.insert(sheet.name.clone(), sheet);
        }
        Ok(RelationDefinition {
            version,
            sheets: map,
            order,
        })
    }

    pub fn get_sheet(&self, name: &str) -> Option<&SheetDefinition> {
        self.sheets.get(name)
    }

    pub fn get_sheet_mut(&mut self, name: &str) -> Option<&mut SheetDefinition> {
        self.sheets.get_mut(name)
    }

    /// Every sheet flagged as a destination for untyped key → row resolution,
    /// in declaration order (deterministic, per [Converter::GenericReference]).
    pub fn generic_reference_targets(&self) -> impl Iterator<Item = &SheetDefinition> {
        self.order
            .iter()
            .filter_map(|name| self.sheets.get(name))
            .filter(|s| s.is_generic_reference_target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single(name: &str) -> DataDefinition {
        DataDefinition::Single {
            name: Some(name.to_string()),
            converter: None,
        }
    }

    #[test]
    fn lengths_match_spec_formulas() {
        let group = DataDefinition::Group {
            members: vec![single("A"), single("B"), single("C")],
        };
        assert_eq!(group.len(), 3);

        let repeat = DataDefinition::Repeat {
            count: 3,
            inner: Box::new(single("Weather")),
            naming_offset: 0,
        };
        assert_eq!(repeat.len(), 3);
        assert_eq!(repeat.get_name(0).as_deref(), Some("Weather[0]"));
        assert_eq!(repeat.get_name(2).as_deref(), Some("Weather[2]"));
        assert_eq!(repeat.get_name(3), None);
    }

    #[test]
    fn group_then_repeat_names_follow_cumulative_offsets() {
        // Group{ Single{"A"}, Repeat{2, Single{"B"}} } at index 10: names at
        // 10,11,12 are A, B[0], B[1].
        let def = DataDefinition::Group {
            members: vec![
                single("A"),
                DataDefinition::Repeat {
                    count: 2,
                    inner: Box::new(single("B")),
                    naming_offset: 0,
                },
            ],
        };
        assert_eq!(def.get_name(0).as_deref(), Some("A"));
        assert_eq!(def.get_name(1).as_deref(), Some("B[0]"));
        assert_eq!(def.get_name(2).as_deref(), Some("B[1]"));
    }

    #[test]
    fn compile_is_idempotent_and_uses_fixed_offset_formula() {
        let mut sheet = SheetDefinition::new(
            "Test".to_string(),
            None,
            false,
            vec![Positioned {
                index: 3,
                inner: DataDefinition::Repeat {
                    count: 2,
                    inner: Box::new(single("Weather")),
                    naming_offset: 0,
                },
            }],
        );

        sheet.compile(10).unwrap();
        let first = (
            sheet.column_index("Weather[0]").unwrap(),
            sheet.column_index("Weather[1]").unwrap(),
        );
        assert_eq!(first, (3, 4));

        sheet.compile(10).unwrap();
        let second = (
            sheet.column_index("Weather[0]").unwrap(),
            sheet.column_index("Weather[1]").unwrap(),
        );
        assert_eq!(first, second);
    }

    #[test]
    fn out_of_range_definition_is_dropped_not_fatal() {
        let mut sheet = SheetDefinition::new(
            "Test".to_string(),
            None,
            false,
            vec![Positioned {
                index: 8,
                inner: single("TooFar"),
            }],
        );
        sheet.compile(4).unwrap();
        assert!(sheet.column_index("TooFar").is_err());
    }

    #[test]
    fn duplicate_sheet_names_are_bad_definition() {
        let sheets = vec![
            SheetDefinition::new("Item".to_string(), None, false, vec![]),
            SheetDefinition::new("Item".to_string(), None, false, vec![]),
        ];
        assert!(matches!(
            RelationDefinition::new("1".to_string(), sheets),
            Err(Error::BadDefinition { .. })
        ));
    }
}
