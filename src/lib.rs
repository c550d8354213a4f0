// SPDX-FileCopyrightText: 2026 Joshua Goins <josh@redstrate.com>
// SPDX-License-Identifier: GPL-3.0-or-later

#![doc = include_str!("../README.md")]

#[doc(hidden)]
pub const AETHERPACK_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Algorithms used everywhere: the JAMCRC variant SqPack hashes paths with.
mod crc;

// NOTE: brought up to the top-level because these are the most used types.
mod common;
pub use common::Language;

/// Basic error type shared by every layer.
mod error;
pub use error::Error;

/// `SqPack` archive access: shard discovery, index parsing, and per-block decompression.
pub mod pack;

/// The Excel columnar dataset layer: sheet headers (`.exh`), sheet pages (`.exd`),
/// and the [excel::Sheet] / [excel::MultiSheet] views over them.
pub mod excel;

/// The relational definition layer: a composable column schema loaded from JSON
/// that gives a sheet's physical columns logical names, and declares the value
/// converters applied on read.
pub mod definition;

/// The top-level [Archive] tying the pack, Excel, and definition layers together.
mod archive;
pub use archive::{Archive, NamedRow};
