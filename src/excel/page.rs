// SPDX-FileCopyrightText: 2026 Joshua Goins <josh@redstrate.com>
// SPDX-License-Identifier: GPL-3.0-or-later

use std::io::{Cursor, Read, Seek, SeekFrom};

use binrw::{BinRead, Endian, binrw};

use crate::Error;
use crate::excel::header::{ColumnDataType, ExcelHeader, SheetRowKind};
use crate::excel::value::RawValue;

#[binrw]
#[brw(magic = b"EXDF")]
#[brw(big)]
#[derive(Debug)]
struct ExdHeader {
    version: u16,
    unk1: u16,
    index_size: u32,
    #[brw(pad_after = 16)]
    data_size: u32,
}

#[binrw]
#[brw(big)]
#[derive(Debug, Clone, Copy)]
struct IndexEntry {
    key: u32,
    offset: u32,
}

/// A single row's columns.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub columns: Vec<RawValue>,
}

/// One key's worth of data: a single row, or (for sub-row sheets) several,
/// each tagged with its sub-key.
#[derive(Debug, Clone, PartialEq)]
pub enum RowSet {
    Single(Row),
    SubRows(Vec<(u16, Row)>),
}

/// A parsed `.exd` page: every row/sub-row keyed by its row id, in file order.
#[derive(Debug, Clone)]
pub struct ExcelPage {
    pub rows: Vec<(u32, RowSet)>,
}

fn malformed(path: &str) -> Error {
    Error::MalformedArchive {
        path: path.to_string(),
    }
}

fn read_column<T: Read + Seek>(
    reader: &mut T,
    header: &ExcelHeader,
    row_offset: u64,
    column_offset: u64,
    data_type: ColumnDataType,
    path: &str,
) -> Result<RawValue, Error> {
    reader
        .seek(SeekFrom::Start(row_offset + column_offset))
        .map_err(|_| malformed(path))?;

    let value = if let Some(bit) = data_type.packed_bit() {
        let byte = u8::read_options(reader, Endian::Big, ()).map_err(|_| malformed(path))?;
        RawValue::Bool((byte & (1 << bit)) != 0)
    } else {
        match data_type {
            ColumnDataType::String => {
                let string_offset =
                    u32::read_options(reader, Endian::Big, ()).map_err(|_| malformed(path))?;
                reader
                    .seek(SeekFrom::Start(
                        row_offset + header.row_size() as u64 + string_offset as u64,
                    ))
                    .map_err(|_| malformed(path))?;

                let mut bytes = Vec::new();
                loop {
                    let mut byte = [0u8; 1];
                    reader.read_exact(&mut byte).map_err(|_| malformed(path))?;
                    if byte[0] == 0 {
                        break;
                    }
                    bytes.push(byte[0]);
                }
                RawValue::String(String::from_utf8_lossy(&bytes).into_owned())
            }
            ColumnDataType::Bool => {
                let raw = u8::read_options(reader, Endian::Big, ()).map_err(|_| malformed(path))?;
                RawValue::Bool(raw != 0)
            }
            ColumnDataType::Int8 => RawValue::Int8(
                i8::read_options(reader, Endian::Big, ()).map_err(|_| malformed(path))?,
            ),
            ColumnDataType::UInt8 => RawValue::UInt8(
                u8::read_options(reader, Endian::Big, ()).map_err(|_| malformed(path))?,
            ),
            ColumnDataType::Int16 => RawValue::Int16(
                i16::read_options(reader, Endian::Big, ()).map_err(|_| malformed(path))?,
            ),
            ColumnDataType::UInt16 => RawValue::UInt16(
                u16::read_options(reader, Endian::Big, ()).map_err(|_| malformed(path))?,
            ),
            ColumnDataType::Int32 => RawValue::Int32(
                i32::read_options(reader, Endian::Big, ()).map_err(|_| malformed(path))?,
            ),
            ColumnDataType::UInt32 => RawValue::UInt32(
                u32::read_options(reader, Endian::Big, ()).map_err(|_| malformed(path))?,
            ),
            ColumnDataType::Float32 => RawValue::Float32(
                f32::read_options(reader, Endian::Big, ()).map_err(|_| malformed(path))?,
            ),
            ColumnDataType::Int64 => RawValue::Int64(
                i64::read_options(reader, Endian::Big, ()).map_err(|_| malformed(path))?,
            ),
            ColumnDataType::UInt64 => RawValue::UInt64(
                u64::read_options(reader, Endian::Big, ()).map_err(|_| malformed(path))?,
            ),
            _ => unreachable!("packed bool handled above"),
        }
    };

    Ok(value)
}

fn read_row<T: Read + Seek>(
    reader: &mut T,
    header: &ExcelHeader,
    row_offset: u64,
    path: &str,
) -> Result<Row, Error> {
    let mut columns = Vec::with_capacity(header.columns.len());
    for column in &header.columns {
        columns.push(read_column(
            reader,
            header,
            row_offset,
            column.offset as u64,
            column.data_type,
            path,
        )?);
    }
    Ok(Row { columns })
}

impl ExcelPage {
    /// Parses one `.exd` page's bytes against its sheet's header.
    pub fn parse(bytes: &[u8], header: &ExcelHeader, path: &str) -> Result<ExcelPage, Error> {
        let mut cursor = Cursor::new(bytes);
        let exd_header = ExdHeader::read(&mut cursor).map_err(|_| malformed(path))?;

        let entry_count = exd_header.index_size as usize / 8;
        let mut entries = Vec::with_capacity(entry_count);
        for _ in 0..entry_count {
            entries.push(IndexEntry::read(&mut cursor).map_err(|_| malformed(path))?);
        }

        let mut rows = Vec::with_capacity(entries.len());
        for entry in &entries {
            cursor
                .seek(SeekFrom::Start(entry.offset as u64))
                .map_err(|_| malformed(path))?;

            let data_length =
                u32::read_options(&mut cursor, Endian::Big, ()).map_err(|_| malformed(path))?;
            let row_count =
                u16::read_options(&mut cursor, Endian::Big, ()).map_err(|_| malformed(path))?;
            let _ = data_length;

            let data_offset = cursor.stream_position().map_err(|_| malformed(path))?;

            let row_set = if header.row_kind() == SheetRowKind::SubRows {
                let mut subrows = Vec::with_capacity(row_count as usize);
                for i in 0..row_count {
                    let subrow_offset = data_offset + i as u64 * (2 + header.row_size() as u64);
                    cursor
                        .seek(SeekFrom::Start(subrow_offset))
                        .map_err(|_| malformed(path))?;
                    let subrow_id = u16::read_options(&mut cursor, Endian::Big, ())
                        .map_err(|_| malformed(path))?;
                    subrows.push((
                        subrow_id,
                        read_row(&mut cursor, header, subrow_offset + 2, path)?,
                    ));
                }
                RowSet::SubRows(subrows)
            } else {
                RowSet::Single(read_row(&mut cursor, header, data_offset, path)?)
            };

            rows.push((entry.key, row_set));
        }

        Ok(ExcelPage { rows })
    }

    pub fn row(&self, key: u32) -> Option<&Row> {
        self.rows.iter().find(|(k, _)| *k == key).and_then(|(_, set)| match set {
            RowSet::Single(row) => Some(row),
            RowSet::SubRows(subrows) => subrows.first().map(|(_, row)| row),
        })
    }

    pub fn subrow(&self, key: u32, subrow_id: u16) -> Option<&Row> {
        let (_, set) = self.rows.iter().find(|(k, _)| *k == key)?;
        match set {
            RowSet::SubRows(subrows) => subrows.iter().find(|(id, _)| *id == subrow_id).map(|(_, row)| row),
            RowSet::Single(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::excel::header::ExcelHeader;

    fn single_row_header_bytes() -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(b"EXHF");
        buf.extend_from_slice(&3u16.to_be_bytes());
        buf.extend_from_slice(&4u16.to_be_bytes()); // row_size
        buf.extend_from_slice(&1u16.to_be_bytes()); // column_count
        buf.extend_from_slice(&1u16.to_be_bytes()); // page_count
        buf.extend_from_slice(&1u16.to_be_bytes()); // language_count
        buf.extend_from_slice(&0u16.to_be_bytes());
        buf.push(0);
        buf.push(1); // SingleRow
        buf.extend_from_slice(&0u16.to_be_bytes());
        buf.extend_from_slice(&2u32.to_be_bytes()); // row_count
        buf.extend_from_slice(&[0u8; 8]);
        buf.extend_from_slice(&0x2u16.to_be_bytes()); // Int8
        buf.extend_from_slice(&0u16.to_be_bytes()); // offset 0
        buf.extend_from_slice(&0u32.to_be_bytes()); // page start
        buf.extend_from_slice(&2u32.to_be_bytes()); // page row count
        buf.push(0); // language None
        buf.push(0);
        buf
    }

    fn build_exd(entries: &[(u32, i8)]) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(b"EXDF");
        buf.extend_from_slice(&2u16.to_be_bytes());
        buf.extend_from_slice(&0u16.to_be_bytes());
        let index_size = (entries.len() * 8) as u32;
        buf.extend_from_slice(&index_size.to_be_bytes());

        let header_size = 0x20u64;
        let index_end = header_size + index_size as u64;

        // row layout: 4 (data_length) + 2 (row_count) + 4 (column, aligned) each
        let row_stride = 10u64;
        let mut data = Vec::new();
        let mut offsets = Vec::new();
        for (_, value) in entries {
            offsets.push(index_end + data.len() as u64);
            data.extend_from_slice(&4u32.to_be_bytes()); // data_length
            data.extend_from_slice(&1u16.to_be_bytes()); // row_count
            data.push(*value as u8);
            data.extend_from_slice(&[0u8; 3]); // pad to row_stride
        }
        let _ = row_stride;

        buf.extend_from_slice(&(data.len() as u32).to_be_bytes()); // data_size
        buf.extend_from_slice(&[0u8; 16]); // padding to 0x20

        for ((key, _), offset) in entries.iter().zip(offsets.iter()) {
            buf.extend_from_slice(&key.to_be_bytes());
            buf.extend_from_slice(&(*offset as u32).to_be_bytes());
        }

        buf.extend_from_slice(&data);
        buf
    }

    #[test]
    fn parses_rows_in_key_order() {
        let header = ExcelHeader::parse(&single_row_header_bytes(), "test.exh").unwrap();
        let exd_bytes = build_exd(&[(1441792, 0), (1441793, 1)]);
        let page = ExcelPage::parse(&exd_bytes, &header, "test.exd").unwrap();

        assert_eq!(page.rows.len(), 2);
        assert_eq!(page.rows[0].0, 1441792);
        assert_eq!(page.rows[1].0, 1441793);

        let row = page.row(1441793).unwrap();
        assert_eq!(row.columns[0], RawValue::Int8(1));
        assert!(page.row(999).is_none());
    }
}
