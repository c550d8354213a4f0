// SPDX-FileCopyrightText: 2026 Joshua Goins <josh@redstrate.com>
// SPDX-License-Identifier: GPL-3.0-or-later

use std::io::{Read, Seek, SeekFrom};

use binrw::{BinRead, Endian};
use tracing::instrument;

use crate::Error;

const UNCOMPRESSED_SENTINEL: u32 = 32000;

fn read_u32le<T: Read>(reader: &mut T, path: &str) -> Result<u32, Error> {
    u32::read_options(reader, Endian::Little, ()).map_err(|_| Error::MalformedArchive {
        path: path.to_string(),
    })
}

struct BlockDescriptor {
    offset: u32,
}

/// A decoded file's header: how many blocks make up its payload and where they live.
struct FileHeader {
    header_length: u32,
    file_size: u32,
    block_count: u32,
    blocks: Vec<BlockDescriptor>,
}

fn read_header<T: Read + Seek>(reader: &mut T, path: &str) -> Result<FileHeader, Error> {
    let header_length = read_u32le(reader, path)?;
    let _content_type = read_u32le(reader, path)?;
    let file_size = read_u32le(reader, path)?;
    let _unknown = read_u32le(reader, path)?;
    let _block_buffer_size = read_u32le(reader, path)?;
    let block_count = read_u32le(reader, path)?;

    let mut blocks = Vec::with_capacity(block_count as usize);
    for _ in 0..block_count {
        let offset = read_u32le(reader, path)?;
        let _compressed_size_bound = read_u32le(reader, path)?; // u16 size + u16 padded count in practice, read as one u32
        blocks.push(BlockDescriptor { offset });
    }

    Ok(FileHeader {
        header_length,
        file_size,
        block_count,
        blocks,
    })
}

/// Reads and decompresses a single 16-byte-prefixed block at the reader's current position.
fn read_block<T: Read + Seek>(reader: &mut T, path: &str) -> Result<Vec<u8>, Error> {
    let malformed = || Error::MalformedArchive {
        path: path.to_string(),
    };

    let _block_header_size = read_u32le(reader, path)?;
    let _unknown = read_u32le(reader, path)?;
    let compressed_size = read_u32le(reader, path)?;
    let uncompressed_size = read_u32le(reader, path)?;

    if compressed_size == UNCOMPRESSED_SENTINEL {
        let mut data = vec![0u8; uncompressed_size as usize];
        reader.read_exact(&mut data).map_err(|_| malformed())?;
        Ok(data)
    } else {
        let mut compressed = vec![0u8; compressed_size as usize];
        reader.read_exact(&mut compressed).map_err(|_| malformed())?;

        let mut decompressed = vec![0u8; uncompressed_size as usize];
        crate::pack::compression::inflate_raw(&mut compressed, &mut decompressed).map_err(
            |_| Error::DecompressionError {
                path: path.to_string(),
            },
        )?;
        Ok(decompressed)
    }
}

/// A single file's decompressed bytes, read from a shard's `.dat` at a fixed offset.
///
/// Construction reads the header and every block eagerly; `bytes()` is then a
/// cheap clone of already-decompressed data.
#[derive(Debug, Clone)]
pub struct File {
    data: Vec<u8>,
}

impl File {
    /// Parses the file header at `byte_offset` in `reader` and decompresses every block.
    #[instrument(skip(reader), fields(byte_offset))]
    pub fn read<T: Read + Seek>(
        mut reader: T,
        byte_offset: u64,
        path: &str,
    ) -> Result<File, Error> {
        reader
            .seek(SeekFrom::Start(byte_offset))
            .map_err(|_| Error::MalformedArchive {
                path: path.to_string(),
            })?;

        let header = read_header(&mut reader, path)?;
        let mut data = Vec::with_capacity(header.file_size as usize);

        for block in &header.blocks {
            reader
                .seek(SeekFrom::Start(
                    byte_offset + header.header_length as u64 + block.offset as u64,
                ))
                .map_err(|_| Error::MalformedArchive {
                    path: path.to_string(),
                })?;
            data.extend(read_block(&mut reader, path)?);
        }

        tracing::debug!(blocks = header.block_count, bytes = data.len(), "decoded file");

        Ok(File { data })
    }

    /// Returns the decompressed bytes. Cheap and idempotent: the data is already
    /// materialised at construction time.
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }
}
