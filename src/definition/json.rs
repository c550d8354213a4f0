// SPDX-FileCopyrightText: 2026 Joshua Goins <josh@redstrate.com>
// SPDX-License-Identifier: GPL-3.0-or-later

//! Loads the relational definition schema (spec §6) from JSON.
//!
//! The envelope (`version`, `sheets`, `sheet`, `defaultColumn`,
//! `isGenericReferenceTarget`) is plain enough for `serde` to derive, but the
//! recursive `Single`/`Group`/`Repeat` shape is discriminated by an optional
//! `type` field rather than a fixed tag on every variant, so it's walked by
//! hand over [serde_json::Value] instead of fighting an untagged enum.

use serde::Deserialize;
use serde_json::Value;

use super::converter::ConditionalLink;
use super::{Converter, DataDefinition, Positioned, RelationDefinition, SheetDefinition};
use crate::Error;

#[derive(Deserialize)]
struct WireRoot {
    version: String,
    #[serde(default)]
    sheets: Vec<WireSheet>,
}

#[derive(Deserialize)]
struct WireSheet {
    sheet: String,
    #[serde(rename = "defaultColumn", default)]
    default_column: Option<String>,
    #[serde(rename = "isGenericReferenceTarget", default)]
    is_generic_reference_target: bool,
    #[serde(default)]
    definitions: Vec<Value>,
}

fn bad(reason: impl Into<String>) -> Error {
    Error::BadDefinition {
        reason: reason.into(),
    }
}

fn object<'a>(value: &'a Value, context: &str) -> Result<&'a serde_json::Map<String, Value>, Error> {
    value
        .as_object()
        .ok_or_else(|| bad(format!("{context} must be a JSON object")))
}

fn string_field(obj: &serde_json::Map<String, Value>, field: &str) -> Result<String, Error> {
    obj.get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| bad(format!("missing required field '{field}'")))
}

fn parse_positioned(value: &Value) -> Result<Positioned, Error> {
    let obj = object(value, "a definition entry")?;
    let index = obj.get("index").and_then(Value::as_u64).unwrap_or(0) as u32;
    Ok(Positioned {
        index,
        inner: parse_inner(value)?,
    })
}

fn parse_inner(value: &Value) -> Result<DataDefinition, Error> {
    let obj = object(value, "a definition")?;
    match obj.get("type").and_then(Value::as_str) {
        Some("group") => {
            let members = obj
                .get("members")
                .and_then(Value::as_array)
                .ok_or_else(|| bad("group definition missing 'members'"))?;
            let members = members.iter().map(parse_inner).collect::<Result<Vec<_>, _>>()?;
            Ok(DataDefinition::Group { members })
        }
        Some("repeat") => {
            let count = obj
                .get("count")
                .and_then(Value::as_u64)
                .ok_or_else(|| bad("repeat definition missing 'count'"))? as u32;
            let inner = obj
                .get("definition")
                .ok_or_else(|| bad("repeat definition missing 'definition'"))?;
            let naming_offset = obj.get("namingOffset").and_then(Value::as_u64).unwrap_or(0) as u32;
            Ok(DataDefinition::Repeat {
                count,
                inner: Box::new(parse_inner(inner)?),
                naming_offset,
            })
        }
        Some(other) => Err(bad(format!("unknown definition type '{other}'"))),
        None => {
            let name = obj.get("name").and_then(Value::as_str).map(str::to_string);
            let converter = match obj.get("converter") {
                None | Some(Value::Null) => None,
                Some(value) => Some(parse_converter(value)?),
            };
            Ok(DataDefinition::Single { name, converter })
        }
    }
}

fn parse_converter(value: &Value) -> Result<Converter, Error> {
    let obj = object(value, "a converter")?;
    let converter_type = obj
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| bad("converter missing 'type'"))?;

    Ok(match converter_type {
        "color" => Converter::Color,
        "icon" => Converter::Icon,
        "generic" => Converter::GenericReference,
        "link" => Converter::SheetLink {
            target_sheet: string_field(obj, "sheet")?,
        },
        "multiref" => {
            let sheets = obj
                .get("sheets")
                .and_then(Value::as_array)
                .ok_or_else(|| bad("multiref converter missing 'sheets'"))?;
            let target_sheets = sheets
                .iter()
                .map(|s| {
                    s.as_str()
                        .map(str::to_string)
                        .ok_or_else(|| bad("multiref 'sheets' entries must be strings"))
                })
                .collect::<Result<Vec<_>, _>>()?;
            Converter::MultiReference { target_sheets }
        }
        "complexlink" => {
            let links = obj
                .get("links")
                .and_then(Value::as_array)
                .ok_or_else(|| bad("complexlink converter missing 'links'"))?;
            let links = links
                .iter()
                .map(parse_conditional_link)
                .collect::<Result<Vec<_>, _>>()?;
            Converter::ComplexLink { links }
        }
        "tomestone" => Converter::TomestoneOrItem {
            threshold: obj.get("threshold").and_then(Value::as_i64).unwrap_or(0x270F),
            tomestone_sheet: obj
                .get("tomestoneSheet")
                .and_then(Value::as_str)
                .unwrap_or("TomestonesItem")
                .to_string(),
            item_sheet: obj
                .get("itemSheet")
                .and_then(Value::as_str)
                .unwrap_or("Item")
                .to_string(),
        },
        other => return Err(bad(format!("unknown converter type '{other}'"))),
    })
}

fn parse_conditional_link(value: &Value) -> Result<ConditionalLink, Error> {
    let obj = object(value, "a complexlink entry")?;
    let sheet = string_field(obj, "sheet")?;
    let project = obj.get("project").and_then(Value::as_str).map(str::to_string);
    let key = obj.get("key").and_then(Value::as_str).map(str::to_string);
    let when = match obj.get("when") {
        Some(value) => {
            let when_obj = object(value, "a 'when' guard")?;
            let key_column = string_field(when_obj, "key")?;
            let expected = when_obj
                .get("value")
                .and_then(Value::as_i64)
                .ok_or_else(|| bad("'when' guard missing integer 'value'"))?;
            Some((key_column, expected))
        }
        None => None,
    };
    Ok(ConditionalLink {
        sheet,
        project,
        key,
        when,
    })
}

/// Rejects a sheet whose Positioned ranges physically overlap. Checked at
/// load time, not in [SheetDefinition::new], so hand-built definitions (tests,
/// callers assembling a schema programmatically) aren't forced through it.
fn check_no_overlaps(sheet_name: &str, data_definitions: &[Positioned]) -> Result<(), Error> {
    let mut ranges: Vec<(u32, u32)> = data_definitions
        .iter()
        .map(|p| (p.index, p.index + p.inner.len()))
        .collect();
    ranges.sort_by_key(|&(start, _)| start);

    for pair in ranges.windows(2) {
        let (_, prev_end) = pair[0];
        let (next_start, _) = pair[1];
        if next_start < prev_end {
            return Err(bad(format!(
                "overlapping definitions in sheet '{sheet_name}'"
            )));
        }
    }
    Ok(())
}

/// Parses the relational definition JSON schema (spec §6) into a [RelationDefinition].
pub fn parse_relation_definition(bytes: &[u8]) -> Result<RelationDefinition, Error> {
    let root: WireRoot =
        serde_json::from_slice(bytes).map_err(|e| bad(format!("invalid definition JSON: {e}")))?;

    let mut sheets = Vec::with_capacity(root.sheets.len());
    for sheet in root.sheets {
        let mut data_definitions = Vec::with_capacity(sheet.definitions.len());
        for definition in &sheet.definitions {
            data_definitions.push(parse_positioned(definition)?);
        }
        check_no_overlaps(&sheet.sheet, &data_definitions)?;

        sheets.push(SheetDefinition::new(
            sheet.sheet,
            sheet.default_column,
            sheet.is_generic_reference_target,
            data_definitions,
        ));
    }

    RelationDefinition::new(root.version, sheets)
}
