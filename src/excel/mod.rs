// SPDX-FileCopyrightText: 2026 Joshua Goins <josh@redstrate.com>
// SPDX-License-Identifier: GPL-3.0-or-later

//! The Excel columnar dataset layer: sheet headers (`.exh`), sheet pages (`.exd`),
//! and the [Sheet] view that multiplexes pages by language.

mod header;
mod multi;
mod page;
mod sheet;
mod value;

pub use header::{ColumnDataType, ColumnDefinition, ExcelHeader, PageRange, SheetRowKind};
pub use multi::MultiSheet;
pub use page::{ExcelPage, Row, RowSet};
pub use sheet::Sheet;
pub use value::RawValue;
