// SPDX-FileCopyrightText: 2026 Joshua Goins <josh@redstrate.com>
// SPDX-License-Identifier: GPL-3.0-or-later

//! `SqPack` archive access: shard discovery, index parsing, and per-block decompression.

mod collection;
mod compression;
mod dat;
mod id;
mod index;

pub use collection::PackCollection;
pub use dat::File;
pub use id::{Category, PackId};
pub use index::{FileLocation, Index, Index2, hash_path};
