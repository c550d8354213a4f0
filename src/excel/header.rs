// SPDX-FileCopyrightText: 2026 Joshua Goins <josh@redstrate.com>
// SPDX-License-Identifier: GPL-3.0-or-later

use std::io::Cursor;

use binrw::{BinRead, binrw};

use crate::Error;
use crate::common::Language;

/// What kind of rows this sheet has.
#[binrw]
#[brw(repr(u8))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetRowKind {
    /// One row per key.
    SingleRow = 1,
    /// Multiple sub-rows per key.
    SubRows = 2,
}

#[binrw]
#[brw(big)]
#[derive(Debug, Clone)]
struct RawHeader {
    version: u16,
    row_size: u16,
    column_count: u16,
    page_count: u16,
    language_count: u16,
    unk1: u16,
    unk2: u8,
    row_kind: SheetRowKind,
    unk3: u16,
    #[brw(pad_after = 8)]
    row_count: u32,
}

/// A column's physical data type and byte offset within a row.
#[binrw]
#[brw(big)]
#[derive(Debug, Clone, Copy)]
pub struct ColumnDefinition {
    pub data_type: ColumnDataType,
    pub offset: u16,
}

/// The compact type tag stored per column, and how its decoder reads it.
#[binrw]
#[brw(repr(u16))]
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnDataType {
    String = 0x0,
    Bool = 0x1,
    Int8 = 0x2,
    UInt8 = 0x3,
    Int16 = 0x4,
    UInt16 = 0x5,
    Int32 = 0x6,
    UInt32 = 0x7,
    Float32 = 0x9,
    Int64 = 0xA,
    UInt64 = 0xB,
    PackedBool0 = 0x19,
    PackedBool1 = 0x1A,
    PackedBool2 = 0x1B,
    PackedBool3 = 0x1C,
    PackedBool4 = 0x1D,
    PackedBool5 = 0x1E,
    PackedBool6 = 0x1F,
    PackedBool7 = 0x20,
}

impl ColumnDataType {
    /// The bit index within a packed byte this type reads, if it's a packed bool.
    pub fn packed_bit(&self) -> Option<u8> {
        use ColumnDataType::*;
        match self {
            PackedBool0 => Some(0),
            PackedBool1 => Some(1),
            PackedBool2 => Some(2),
            PackedBool3 => Some(3),
            PackedBool4 => Some(4),
            PackedBool5 => Some(5),
            PackedBool6 => Some(6),
            PackedBool7 => Some(7),
            _ => None,
        }
    }
}

/// A contiguous range of row keys backed by one `.exd` page.
#[binrw]
#[brw(big)]
#[derive(Debug, Clone, Copy)]
pub struct PageRange {
    pub start_id: u32,
    pub row_count: u32,
}

impl PageRange {
    pub fn contains(&self, key: u32) -> bool {
        key >= self.start_id && key < self.start_id + self.row_count
    }
}

/// Parsed `.exh` sheet header: column layout, page ranges, and supported languages.
#[binrw]
#[brw(magic = b"EXHF")]
#[brw(big)]
#[derive(Debug, Clone)]
pub struct ExcelHeader {
    header: RawHeader,

    #[br(count = header.column_count)]
    pub columns: Vec<ColumnDefinition>,

    #[br(count = header.page_count)]
    pub pages: Vec<PageRange>,

    #[br(count = header.language_count)]
    #[brw(pad_after = 1)]
    pub languages: Vec<Language>,
}

impl ExcelHeader {
    pub fn parse(bytes: &[u8], path: &str) -> Result<ExcelHeader, Error> {
        ExcelHeader::read(&mut Cursor::new(bytes)).map_err(|_| Error::MalformedArchive {
            path: path.to_string(),
        })
    }

    pub fn row_kind(&self) -> SheetRowKind {
        self.header.row_kind
    }

    pub fn row_size(&self) -> u16 {
        self.header.row_size
    }

    pub fn row_count(&self) -> u32 {
        self.header.row_count
    }

    /// Returns the index of the page range that covers `key`, if any.
    pub fn page_for(&self, key: u32) -> Option<usize> {
        self.pages.iter().position(|page| page.contains(key))
    }

    pub fn supports_language(&self, language: Language) -> bool {
        self.languages.contains(&language)
    }
}
