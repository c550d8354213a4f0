// SPDX-FileCopyrightText: 2026 Joshua Goins <josh@redstrate.com>
// SPDX-License-Identifier: GPL-3.0-or-later

use std::collections::HashMap;
use std::fs;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{instrument, warn};

use crate::Error;
use crate::pack::dat::File;
use crate::pack::id::PackId;
use crate::pack::index::{Index, Index2};

enum Shard {
    V1(Index),
    V2(Index2),
}

impl Shard {
    fn get_file(&self, path: &str) -> Result<crate::pack::index::FileLocation, Error> {
        match self {
            Shard::V1(index) => index.get_file(path),
            Shard::V2(index) => index.get_file(path),
        }
    }
}

/// Opens a directory of SqPack shards and serves files by virtual path.
///
/// Shards are discovered once at construction and held open for the collection's
/// lifetime; decoded [File]s are cached by `(pack id, dat file, byte offset)` so a
/// repeated read of the same path never re-parses the block structure.
pub struct PackCollection {
    root: PathBuf,
    shards: HashMap<PackId, Shard>,
    file_cache: Mutex<HashMap<(PackId, u8, u64), File>>,
}

impl PackCollection {
    /// Scans `root` recursively for `*.index`/`*.index2` shards and parses each one.
    #[instrument(skip_all, fields(root = %root.as_ref().display()))]
    pub fn new(root: impl AsRef<Path>) -> Result<PackCollection, Error> {
        let root = root.as_ref().to_path_buf();
        let mut shards = HashMap::new();

        for entry in walk(&root)? {
            let Some(pack_id) = PackId::from_filename(&entry) else {
                continue;
            };

            let extension = entry.extension().and_then(|e| e.to_str());
            let shard = match extension {
                Some("index") => {
                    let reader = open(&entry)?;
                    Shard::V1(Index::parse(reader)?)
                }
                Some("index2") => {
                    let reader = open(&entry)?;
                    Shard::V2(Index2::parse(reader)?)
                }
                _ => continue,
            };

            shards.insert(pack_id, shard);
        }

        Ok(PackCollection {
            root,
            shards,
            file_cache: Mutex::new(HashMap::new()),
        })
    }

    fn pack_id_for(&self, path: &str) -> Option<PackId> {
        let (expansion, category) = PackId::category_for_path(path)?;
        self.shards
            .keys()
            .filter(|id| id.expansion == expansion && id.category == category)
            .min_by_key(|id| id.chunk)
            .copied()
    }

    fn dat_path(&self, pack_id: PackId, dat_file: u8) -> PathBuf {
        self.root.join(format!(
            "{:02x}{:02x}{:02x}.win32.dat{dat_file}",
            pack_id.category as u8, pack_id.expansion, pack_id.chunk
        ))
    }

    /// Resolves `path` to a decoded file, decompressing it on first access.
    pub fn get_file(&self, path: &str) -> Result<File, Error> {
        let pack_id = self.pack_id_for(path).ok_or_else(|| Error::NotFound {
            what: path.to_string(),
        })?;
        let shard = self.shards.get(&pack_id).ok_or_else(|| Error::NotFound {
            what: path.to_string(),
        })?;

        let location = shard.get_file(path)?;
        let cache_key = (pack_id, location.dat_file, location.byte_offset);

        if let Some(file) = self.file_cache.lock().unwrap().get(&cache_key) {
            return Ok(file.clone());
        }

        let dat_path = self.dat_path(pack_id, location.dat_file);
        let reader = open(&dat_path)?;
        let file = File::read(reader, location.byte_offset, path)?;

        self.file_cache
            .lock()
            .unwrap()
            .insert(cache_key, file.clone());

        Ok(file)
    }

    pub fn file_exists(&self, path: &str) -> bool {
        match self.pack_id_for(path).and_then(|id| self.shards.get(&id)) {
            Some(shard) => shard.get_file(path).is_ok(),
            None => false,
        }
    }
}

fn open(path: &Path) -> Result<BufReader<fs::File>, Error> {
    fs::File::open(path)
        .map(BufReader::new)
        .map_err(|_| Error::MalformedArchive {
            path: path.display().to_string(),
        })
}

fn walk(root: &Path) -> Result<Vec<PathBuf>, Error> {
    let mut found = Vec::new();
    let mut stack = vec![root.to_path_buf()];

    while let Some(dir) = stack.pop() {
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(_) => {
                warn!(dir = %dir.display(), "could not read directory while scanning for shards");
                continue;
            }
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
            } else {
                found.push(path);
            }
        }
    }

    Ok(found)
}
