// SPDX-FileCopyrightText: 2026 Joshua Goins <josh@redstrate.com>
// SPDX-License-Identifier: GPL-3.0-or-later

use std::collections::HashMap;
use std::io::{Read, Seek, SeekFrom};

use binrw::{BinRead, Endian};
use tracing::instrument;

use crate::Error;
use crate::crc::Jamcrc;

const SQPACK_MAGIC: [u8; 8] = *b"SqPack\0\0";
const HEADER_OFFSET_OFFSET: u64 = 0x0C;
const FILE_DATA_OFFSET: u64 = 0x08;
const DIRECTORY_DATA_OFFSET: u64 = 0xE4;

/// Lowercases `path` and returns `!crc32(path) & 0xFFFFFFFF`.
///
/// This is the hash used for both directory and file segments, and for Index2's
/// flat path hashing. The bitwise complement is deliberate: this project's CRC
/// convention always hands back the inverted checksum.
pub fn hash_path(path: &str) -> u32 {
    const TABLE: Jamcrc = Jamcrc::new();
    TABLE.checksum(path.to_ascii_lowercase().as_bytes())
}

fn hash_segments(path: &str) -> Option<(u32, u32)> {
    let last_separator = path.rfind('/')?;
    let dir_hash = hash_path(&path[..last_separator]);
    let file_hash = hash_path(&path[last_separator + 1..]);
    Some((dir_hash, file_hash))
}

fn unpack_offset(raw: u32) -> (u8, u64) {
    let dat_file = ((raw & 0x7) >> 1) as u8;
    let byte_offset = ((raw & 0xFFFFFFF8) as u64) << 3;
    (dat_file, byte_offset)
}

/// A resolved location inside a shard's `.dat` files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileLocation {
    pub dat_file: u8,
    pub byte_offset: u64,
}

fn read_u32le<T: Read>(reader: &mut T) -> Result<u32, Error> {
    u32::read_options(reader, Endian::Little, ()).map_err(|_| malformed())
}

fn read_i32le<T: Read>(reader: &mut T) -> Result<i32, Error> {
    i32::read_options(reader, Endian::Little, ()).map_err(|_| malformed())
}

fn malformed() -> Error {
    Error::MalformedArchive {
        path: "index".to_string(),
    }
}

fn check_magic<T: Read>(reader: &mut T) -> Result<(), Error> {
    let mut magic = [0u8; 8];
    reader.read_exact(&mut magic).map_err(|_| malformed())?;
    if magic != SQPACK_MAGIC {
        return Err(malformed());
    }
    Ok(())
}

fn seek_to_header<T: Read + Seek>(reader: &mut T) -> Result<u64, Error> {
    reader
        .seek(SeekFrom::Start(HEADER_OFFSET_OFFSET))
        .map_err(|_| malformed())?;
    let header_offset = read_i32le(reader)?;
    Ok(header_offset as u64)
}

#[derive(Debug, Clone, Copy)]
struct IndexFileEntry {
    file_hash: u32,
    dir_hash: u32,
    location: FileLocation,
}

/// A directory's worth of file entries, keyed by file hash.
#[derive(Debug, Clone)]
pub struct IndexDirectory {
    pub dir_hash: u32,
    pub files: HashMap<u32, FileLocation>,
}

/// Variant-1 SqPack index: directories of files, each hashed separately.
#[derive(Debug, Clone)]
pub struct Index {
    pub directories: HashMap<u32, IndexDirectory>,
}

impl Index {
    /// Parses a complete `.index` file from a seekable reader.
    #[instrument(skip(reader))]
    pub fn parse<T: Read + Seek>(mut reader: T) -> Result<Index, Error> {
        check_magic(&mut reader)?;

        let header_offset = seek_to_header(&mut reader)?;

        reader
            .seek(SeekFrom::Start(header_offset + FILE_DATA_OFFSET))
            .map_err(|_| malformed())?;
        let files_offset = read_i32le(&mut reader)? as u64;
        let files_length = read_i32le(&mut reader)?;
        if files_length < 0 {
            return Err(malformed());
        }
        let file_count = files_length as usize / 0x10;

        reader
            .seek(SeekFrom::Start(header_offset + DIRECTORY_DATA_OFFSET))
            .map_err(|_| malformed())?;
        let directories_offset = read_i32le(&mut reader)? as u64;
        let directories_length = read_i32le(&mut reader)?;
        if directories_length < 0 {
            return Err(malformed());
        }
        let directory_count = directories_length as usize / 0x10;

        reader
            .seek(SeekFrom::Start(files_offset))
            .map_err(|_| malformed())?;
        let mut entries = Vec::with_capacity(file_count);
        for _ in 0..file_count {
            let file_hash = read_u32le(&mut reader)?;
            let dir_hash = read_u32le(&mut reader)?;
            let packed_offset = read_u32le(&mut reader)?;
            let _reserved = read_u32le(&mut reader)?;

            let (dat_file, byte_offset) = unpack_offset(packed_offset);
            entries.push(IndexFileEntry {
                file_hash,
                dir_hash,
                location: FileLocation {
                    dat_file,
                    byte_offset,
                },
            });
        }

        reader
            .seek(SeekFrom::Start(directories_offset))
            .map_err(|_| malformed())?;
        let mut directories = HashMap::with_capacity(directory_count);
        for _ in 0..directory_count {
            let dir_hash = read_u32le(&mut reader)?;
            let file_segment_offset = read_i32le(&mut reader)?;
            let file_segment_length = read_i32le(&mut reader)?;
            let _reserved = read_u32le(&mut reader)?;
            if file_segment_offset < 0 || file_segment_length < 0 {
                return Err(malformed());
            }
            let count = file_segment_length as usize / 0x10;

            // file_segment_offset is an absolute byte position into the file
            // segment we already read into `entries`; recover the starting
            // entry index from it rather than filtering by dir_hash.
            let start_index = (file_segment_offset as u64)
                .checked_sub(files_offset)
                .ok_or_else(malformed)? as usize
                / 0x10;
            let end_index = start_index
                .checked_add(count)
                .filter(|&end| end <= entries.len())
                .ok_or_else(malformed)?;

            let mut files = HashMap::with_capacity(count);
            for entry in &entries[start_index..end_index] {
                files.insert(entry.file_hash, entry.location);
            }

            directories.insert(dir_hash, IndexDirectory { dir_hash, files });
        }

        Ok(Index { directories })
    }

    /// Looks up a file by its already-lowercased virtual path.
    pub fn get_file(&self, path: &str) -> Result<FileLocation, Error> {
        let (dir_hash, file_hash) = hash_segments(path).ok_or_else(|| Error::NotFound {
            what: path.to_string(),
        })?;
        self.get_file_from_keys(dir_hash, file_hash)
    }

    /// Looks up a file by its pre-computed (directory, file) hash pair.
    pub fn get_file_from_keys(&self, dir_hash: u32, file_hash: u32) -> Result<FileLocation, Error> {
        self.directories
            .get(&dir_hash)
            .and_then(|dir| dir.files.get(&file_hash))
            .copied()
            .ok_or_else(|| Error::NotFound {
                what: format!("{dir_hash:08x}/{file_hash:08x}"),
            })
    }

    pub fn file_exists(&self, path: &str) -> bool {
        self.get_file(path).is_ok()
    }
}

/// Variant-2 SqPack index: a single flat table hashed over the whole path.
#[derive(Debug, Clone)]
pub struct Index2 {
    pub files: HashMap<u32, FileLocation>,
}

impl Index2 {
    #[instrument(skip(reader))]
    pub fn parse<T: Read + Seek>(mut reader: T) -> Result<Index2, Error> {
        check_magic(&mut reader)?;

        let header_offset = seek_to_header(&mut reader)?;

        reader
            .seek(SeekFrom::Start(header_offset + FILE_DATA_OFFSET))
            .map_err(|_| malformed())?;
        let files_offset = read_i32le(&mut reader)? as u64;
        let files_length = read_i32le(&mut reader)?;
        if files_length < 0 {
            return Err(malformed());
        }
        let file_count = files_length as usize / 0x08;

        reader
            .seek(SeekFrom::Start(files_offset))
            .map_err(|_| malformed())?;

        let mut files = HashMap::with_capacity(file_count);
        for _ in 0..file_count {
            let path_hash = read_u32le(&mut reader)?;
            let packed_offset = read_u32le(&mut reader)?;
            let (dat_file, byte_offset) = unpack_offset(packed_offset);
            files.insert(
                path_hash,
                FileLocation {
                    dat_file,
                    byte_offset,
                },
            );
        }

        Ok(Index2 { files })
    }

    pub fn get_file(&self, path: &str) -> Result<FileLocation, Error> {
        let hash = hash_path(path);
        self.files.get(&hash).copied().ok_or_else(|| Error::NotFound {
            what: path.to_string(),
        })
    }

    pub fn file_exists(&self, path: &str) -> bool {
        self.get_file(path).is_ok()
    }
}
