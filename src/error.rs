// SPDX-FileCopyrightText: 2025 Joshua Goins <josh@redstrate.com>
// SPDX-License-Identifier: GPL-3.0-or-later

/// Errors produced while reading archives, sheets, and definitions.
#[derive(Debug, Clone)]
pub enum Error {
    /// A virtual path, sheet name, or row key was not present.
    NotFound {
        /// What was being looked up, for diagnostics.
        what: String,
    },
    /// An index, dat, exh, or exd file was truncated or had the wrong magic.
    MalformedArchive {
        /// Which file or shard failed to parse.
        path: String,
    },
    /// A block's DEFLATE payload failed to decompress.
    DecompressionError {
        /// The file being decompressed.
        path: String,
    },
    /// The definition JSON violated the schema (unknown converter type, duplicate
    /// sheet name, overlapping Positioned ranges).
    BadDefinition {
        /// Human-readable description of the violation.
        reason: String,
    },
    /// A definition referenced a column index beyond the sheet's physical header.
    ColumnMismatch {
        /// The sheet whose definition disagreed with its header.
        sheet: String,
        /// The offending column index.
        index: u32,
    },
    /// The requested language isn't carried by this sheet, and no neutral
    /// variant exists to fall back to.
    LanguageUnavailable {
        /// The sheet that was asked for a language it doesn't have.
        sheet: String,
    },
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::NotFound { what } => write!(f, "not found: {what}"),
            Error::MalformedArchive { path } => write!(f, "malformed archive: {path}"),
            Error::DecompressionError { path } => write!(f, "decompression failed: {path}"),
            Error::BadDefinition { reason } => write!(f, "bad definition: {reason}"),
            Error::ColumnMismatch { sheet, index } => {
                write!(f, "column {index} out of range for sheet '{sheet}'")
            }
            Error::LanguageUnavailable { sheet } => {
                write!(f, "requested language unavailable for sheet '{sheet}'")
            }
        }
    }
}

impl std::error::Error for Error {}
