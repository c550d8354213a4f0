// SPDX-FileCopyrightText: 2026 Joshua Goins <josh@redstrate.com>
// SPDX-License-Identifier: GPL-3.0-or-later

use crate::excel::{RawValue, Row};

/// A link target resolved by a converter: the sheet and key it came from, and
/// either the whole row or one projected column.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedLink {
    Row { sheet: String, key: u32, row: Row },
    Column { sheet: String, key: u32, value: RawValue },
}

/// What a converter produced from a raw column value.
#[derive(Debug, Clone, PartialEq)]
pub enum ConvertedValue {
    Raw(RawValue),
    Color { a: u8, r: u8, g: u8, b: u8 },
    IconPath(Option<String>),
    Link(Option<ResolvedLink>),
}

/// The collaborator a [Converter] calls back into to resolve cross-sheet links.
/// Implemented by [crate::Archive]; kept as a trait so the definition layer
/// never holds an owning reference back to the archive (see the cyclic
/// reference note this crate's design follows).
pub trait ConverterContext {
    /// Reads the named column's raw value out of `row`, which belongs to `sheet`.
    fn column_value(&self, sheet: &str, row: &Row, column: &str) -> Option<RawValue>;
    /// Primary-key lookup: the row in `sheet` whose key is `key`.
    fn resolve_row(&self, sheet: &str, key: u32) -> Option<Row>;
    /// Indexed lookup: the first row in `sheet` whose named column equals `value`.
    fn find_row_by_column(&self, sheet: &str, column: &str, value: i64) -> Option<(u32, Row)>;
    /// Every sheet flagged `isGenericReferenceTarget`, in declaration order.
    fn generic_reference_targets(&self) -> Vec<String>;
    /// Whether `sheet`'s header has a page range covering `key`.
    fn sheet_contains_key(&self, sheet: &str, key: u32) -> bool;
    /// The compiled physical column index for `column` on `sheet`, used to
    /// project a single field out of a resolved link row.
    fn column_index(&self, sheet: &str, column: &str) -> Option<u32>;
}

/// One link clause of a [Converter::ComplexLink].
#[derive(Debug, Clone)]
pub struct ConditionalLink {
    pub sheet: String,
    pub project: Option<String>,
    pub key: Option<String>,
    pub when: Option<(String, i64)>,
}

impl ConditionalLink {
    fn guard_passes(&self, current_sheet: &str, current_row: &Row, ctx: &dyn ConverterContext) -> bool {
        let Some((column, expected)) = &self.when else {
            return true;
        };
        let Some(value) = ctx.column_value(current_sheet, current_row, column) else {
            return false;
        };
        value.as_i64() == Some(*expected)
    }

    fn resolve(&self, key: u32, ctx: &dyn ConverterContext) -> Option<ResolvedLink> {
        let (resolved_key, row) = match &self.key {
            None => (key, ctx.resolve_row(&self.sheet, key)?),
            Some(column) => ctx.find_row_by_column(&self.sheet, column, key as i64)?,
        };

        match &self.project {
            None => Some(ResolvedLink::Row {
                sheet: self.sheet.clone(),
                key: resolved_key,
                row,
            }),
            Some(column) => {
                let index = ctx.column_index(&self.sheet, column)?;
                let value = row.columns.get(index as usize)?.clone();
                Some(ResolvedLink::Column {
                    sheet: self.sheet.clone(),
                    key: resolved_key,
                    value,
                })
            }
        }
    }
}

/// A post-read transform applied to a column's raw value.
#[derive(Debug, Clone)]
pub enum Converter {
    Color,
    Icon,
    SheetLink {
        target_sheet: String,
    },
    GenericReference,
    MultiReference {
        target_sheets: Vec<String>,
    },
    ComplexLink {
        links: Vec<ConditionalLink>,
    },
    TomestoneOrItem {
        threshold: i64,
        tomestone_sheet: String,
        item_sheet: String,
    },
}

impl Converter {
    pub fn target_type_name(&self) -> &'static str {
        match self {
            Converter::Color => "Color",
            Converter::Icon => "Icon",
            Converter::SheetLink { .. } => "SheetLink",
            Converter::GenericReference => "GenericReference",
            Converter::MultiReference { .. } => "MultiReference",
            Converter::ComplexLink { .. } => "ComplexLink",
            Converter::TomestoneOrItem { .. } => "TomestoneOrItem",
        }
    }

    /// Applies this converter to a raw column value read from `current_row` in
    /// `current_sheet`. Link converters return `None` for `raw == 0` without
    /// performing any lookup (the null rule, spec §8 property 8).
    pub fn apply(
        &self,
        raw: &RawValue,
        current_sheet: &str,
        current_row: &Row,
        ctx: &dyn ConverterContext,
    ) -> ConvertedValue {
        match self {
            Converter::Color => {
                let bits = raw.as_u32().unwrap_or(0);
                ConvertedValue::Color {
                    a: (bits >> 24) as u8,
                    r: (bits >> 16) as u8,
                    g: (bits >> 8) as u8,
                    b: bits as u8,
                }
            }
            Converter::Icon => {
                let id = raw.as_u32().unwrap_or(0);
                let bucket = (id / 1000) * 1000;
                ConvertedValue::IconPath(Some(format!("ui/icon/{bucket:06}/{id:06}.tex")))
            }
            Converter::SheetLink { target_sheet } => {
                let key = raw.as_u32().unwrap_or(0);
                if key == 0 {
                    return ConvertedValue::Link(None);
                }
                ConvertedValue::Link(ctx.resolve_row(target_sheet, key).map(|row| ResolvedLink::Row {
                    sheet: target_sheet.clone(),
                    key,
                    row,
                }))
            }
            Converter::MultiReference { target_sheets } => {
                let key = raw.as_u32().unwrap_or(0);
                if key == 0 {
                    return ConvertedValue::Link(None);
                }
                for sheet in target_sheets {
                    if let Some(row) = ctx.resolve_row(sheet, key) {
                        return ConvertedValue::Link(Some(ResolvedLink::Row {
                            sheet: sheet.clone(),
                            key,
                            row,
                        }));
                    }
                }
                ConvertedValue::Link(None)
            }
            Converter::GenericReference => {
                let key = raw.as_u32().unwrap_or(0);
                if key == 0 {
                    return ConvertedValue::Link(None);
                }
                for sheet in ctx.generic_reference_targets() {
                    if ctx.sheet_contains_key(&sheet, key) {
                        if let Some(row) = ctx.resolve_row(&sheet, key) {
                            return ConvertedValue::Link(Some(ResolvedLink::Row { sheet, key, row }));
                        }
                    }
                }
                ConvertedValue::Link(None)
            }
            Converter::ComplexLink { links } => {
                let key = raw.as_u32().unwrap_or(0);
                if key == 0 {
                    return ConvertedValue::Link(None);
                }
                for link in links {
                    if !link.guard_passes(current_sheet, current_row, ctx) {
                        continue;
                    }
                    if let Some(resolved) = link.resolve(key, ctx) {
                        return ConvertedValue::Link(Some(resolved));
                    }
                }
                ConvertedValue::Link(None)
            }
            Converter::TomestoneOrItem {
                threshold,
                tomestone_sheet,
                item_sheet,
            } => {
                let key = raw.as_u32().unwrap_or(0);
                if key == 0 {
                    return ConvertedValue::Link(None);
                }
                let sheet = if (key as i64) < *threshold {
                    tomestone_sheet
                } else {
                    item_sheet
                };
                ConvertedValue::Link(ctx.resolve_row(sheet, key).map(|row| ResolvedLink::Row {
                    sheet: sheet.clone(),
                    key,
                    row,
                }))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StubContext;

    impl ConverterContext for StubContext {
        fn column_value(&self, _sheet: &str, _row: &Row, column: &str) -> Option<RawValue> {
            if column == "Kind" {
                Some(RawValue::UInt32(1))
            } else {
                None
            }
        }

        fn resolve_row(&self, sheet: &str, key: u32) -> Option<Row> {
            match (sheet, key) {
                ("Item", 42) => Some(Row {
                    columns: vec![RawValue::UInt32(42)],
                }),
                ("TomestoneA", 7) => Some(Row {
                    columns: vec![RawValue::UInt32(7)],
                }),
                _ => None,
            }
        }

        fn find_row_by_column(&self, _sheet: &str, _column: &str, _value: i64) -> Option<(u32, Row)> {
            None
        }

        fn generic_reference_targets(&self) -> Vec<String> {
            vec![]
        }

        fn sheet_contains_key(&self, _sheet: &str, _key: u32) -> bool {
            false
        }

        fn column_index(&self, _sheet: &str, _column: &str) -> Option<u32> {
            None
        }
    }

    fn empty_row() -> Row {
        Row { columns: vec![] }
    }

    #[test]
    fn color_reads_aarrggbb() {
        let converted = Converter::Color.apply(&RawValue::UInt32(0xFF112233), "Sheet", &empty_row(), &StubContext);
        assert_eq!(
            converted,
            ConvertedValue::Color {
                a: 0xFF,
                r: 0x11,
                g: 0x22,
                b: 0x33
            }
        );
    }

    #[test]
    fn icon_formula_buckets_by_thousand() {
        let converted = Converter::Icon.apply(&RawValue::UInt32(1234), "Sheet", &empty_row(), &StubContext);
        assert_eq!(
            converted,
            ConvertedValue::IconPath(Some("ui/icon/001000/001234.tex".to_string()))
        );
    }

    #[test]
    fn sheet_link_null_rule() {
        let converter = Converter::SheetLink {
            target_sheet: "Item".to_string(),
        };
        let converted = converter.apply(&RawValue::UInt32(0), "Sheet", &empty_row(), &StubContext);
        assert_eq!(converted, ConvertedValue::Link(None));
    }

    #[test]
    fn sheet_link_resolves_existing_row() {
        let converter = Converter::SheetLink {
            target_sheet: "Item".to_string(),
        };
        let converted = converter.apply(&RawValue::UInt32(42), "Sheet", &empty_row(), &StubContext);
        assert_eq!(
            converted,
            ConvertedValue::Link(Some(ResolvedLink::Row {
                sheet: "Item".to_string(),
                key: 42,
                row: Row {
                    columns: vec![RawValue::UInt32(42)]
                }
            }))
        );
    }

    #[test]
    fn complex_link_when_guard_picks_tomestone_branch() {
        let converter = Converter::ComplexLink {
            links: vec![
                ConditionalLink {
                    sheet: "TomestoneA".to_string(),
                    project: None,
                    key: None,
                    when: Some(("Kind".to_string(), 1)),
                },
                ConditionalLink {
                    sheet: "Item".to_string(),
                    project: None,
                    key: None,
                    when: None,
                },
            ],
        };

        let converted = converter.apply(&RawValue::UInt32(7), "AnySheet", &empty_row(), &StubContext);
        assert_eq!(
            converted,
            ConvertedValue::Link(Some(ResolvedLink::Row {
                sheet: "TomestoneA".to_string(),
                key: 7,
                row: Row {
                    columns: vec![RawValue::UInt32(7)]
                }
            }))
        );
    }
}
