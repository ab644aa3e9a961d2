/// # File-backed table store
///
/// Each entity is one file:
///
/// ```text
/// <root>/<hex(partition_key)>/<hex(row_key)>.entity
/// ```
///
/// ## File Format
///
/// ```text
/// [body_len: u32 LE][crc32: u32 LE][body: JSON-serialized StorageEntity]
/// ```
///
/// The CRC covers the body and is verified on every read. Keys are
/// hex-encoded so any string is a valid key on any filesystem. A key whose
/// hex form is longer than [`MAX_HEX_NAME`] bytes is named `h<sha256>`
/// instead, keeping every path component under common name limits. `h` is
/// not a hex digit, so the two forms never collide. Reads check the keys
/// stored in the body against the ones requested.
///
/// ## Crash Safety
///
/// Writes go to `<name>.entity.tmp`, are fsynced, then renamed over the
/// final path, so a reader never sees a half-written entity. Temp files left
/// by an interrupted write are removed by [`FileTableStore::open`].
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use config::StoreLimits;
use crc32fast::Hasher as Crc32;
use log::debug;
use sha2::{Digest, Sha256};
use std::fs::{self, OpenOptions};
use std::io::{self, Cursor, Read, Write};
use std::path::{Path, PathBuf};

use crate::{enforce, StorageEntity, StorageGateway, StoreError};

const ENTITY_EXT: &str = "entity";
const TMP_EXT: &str = "entity.tmp";

/// Frame header: body length + CRC32.
const HEADER_BYTES: usize = 4 + 4;

/// Longest hex key used verbatim as a file or directory name.
pub const MAX_HEX_NAME: usize = 200;

#[derive(Debug)]
pub struct FileTableStore {
    root: PathBuf,
    limits: StoreLimits,
}

fn hex_bytes(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

fn key_name(key: &str) -> String {
    let hex = hex_bytes(key.as_bytes());
    if hex.len() <= MAX_HEX_NAME {
        return hex;
    }
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    format!("h{}", hex_bytes(&hasher.finalize()))
}

impl FileTableStore {
    /// Opens (creating if needed) a store rooted at `root`.
    ///
    /// # Errors
    ///
    /// Returns an error if the root directory cannot be created or listed.
    pub fn open<P: AsRef<Path>>(root: P, limits: StoreLimits) -> Result<Self, StoreError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Self::cleanup_tmp_files(&root)?;
        Ok(Self { root, limits })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn limits(&self) -> &StoreLimits {
        &self.limits
    }

    /// Counts stored entities by walking the partition directories.
    pub fn entity_count(&self) -> Result<usize, StoreError> {
        let mut count = 0;
        for partition in fs::read_dir(&self.root)? {
            let partition = partition?.path();
            if !partition.is_dir() {
                continue;
            }
            for entry in fs::read_dir(&partition)? {
                let path = entry?.path();
                if path.extension().map(|e| e == ENTITY_EXT).unwrap_or(false) {
                    count += 1;
                }
            }
        }
        Ok(count)
    }

    fn entity_path(&self, partition_key: &str, row_key: &str) -> PathBuf {
        self.root
            .join(key_name(partition_key))
            .join(format!("{}.{}", key_name(row_key), ENTITY_EXT))
    }

    /// Removes `*.entity.tmp` files left behind by interrupted writes.
    fn cleanup_tmp_files(root: &Path) -> Result<(), StoreError> {
        for partition in fs::read_dir(root)? {
            let partition = partition?.path();
            if !partition.is_dir() {
                continue;
            }
            for entry in fs::read_dir(&partition)?.flatten() {
                let p = entry.path();
                if let Some(name) = p.file_name().and_then(|n| n.to_str()) {
                    if name.ends_with(TMP_EXT) {
                        debug!("file store: removing leftover {}", p.display());
                        let _ = fs::remove_file(&p);
                    }
                }
            }
        }
        Ok(())
    }

    fn encode_frame(entity: &StorageEntity) -> Result<Vec<u8>, StoreError> {
        let body = serde_json::to_vec(entity)?;
        let body_len = u32::try_from(body.len()).map_err(|_| StoreError::SizeLimit {
            code: "EntityTooLarge",
            message: format!("entity body is {} bytes (exceeds u32::MAX)", body.len()),
        })?;

        let mut hasher = Crc32::new();
        hasher.update(&body);

        let mut frame = Vec::with_capacity(HEADER_BYTES + body.len());
        frame.write_u32::<LittleEndian>(body_len)?;
        frame.write_u32::<LittleEndian>(hasher.finalize())?;
        frame.extend_from_slice(&body);
        Ok(frame)
    }

    fn decode_frame(path: &Path, bytes: &[u8]) -> Result<StorageEntity, StoreError> {
        let corrupt = |reason: &str| StoreError::Corrupt(format!("{}: {}", path.display(), reason));

        if bytes.len() < HEADER_BYTES {
            return Err(corrupt("truncated header"));
        }
        let mut rdr = Cursor::new(bytes);
        let body_len = rdr.read_u32::<LittleEndian>()? as usize;
        let expected_crc = rdr.read_u32::<LittleEndian>()?;

        let body = &bytes[HEADER_BYTES..];
        if body.len() != body_len {
            return Err(corrupt("body length mismatch"));
        }

        let mut hasher = Crc32::new();
        hasher.update(body);
        if hasher.finalize() != expected_crc {
            return Err(corrupt("checksum mismatch"));
        }

        serde_json::from_slice(body).map_err(|e| corrupt(&e.to_string()))
    }

    /// Writes the frame to a temp file, fsyncs, then renames into place.
    fn write_atomic(&self, path: &Path, entity: &StorageEntity) -> Result<(), StoreError> {
        let frame = Self::encode_frame(entity)?;
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let tmp_path = path.with_extension(TMP_EXT);
        {
            let mut f = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&tmp_path)?;
            f.write_all(&frame)?;
            f.flush()?;
            f.sync_all()?;
        }
        fs::rename(&tmp_path, path)?;
        Ok(())
    }
}

impl StorageGateway for FileTableStore {
    fn create(&mut self, entity: StorageEntity) -> Result<(), StoreError> {
        enforce(&self.limits, &entity)?;
        let path = self.entity_path(&entity.partition_key, &entity.row_key);
        if path.exists() {
            return Err(StoreError::duplicate(&entity.partition_key, &entity.row_key));
        }
        self.write_atomic(&path, &entity)
    }

    fn replace(&mut self, entity: StorageEntity) -> Result<(), StoreError> {
        enforce(&self.limits, &entity)?;
        let path = self.entity_path(&entity.partition_key, &entity.row_key);
        if !path.exists() {
            return Err(StoreError::not_found(&entity.partition_key, &entity.row_key));
        }
        self.write_atomic(&path, &entity)
    }

    fn read(&self, partition_key: &str, row_key: &str) -> Result<StorageEntity, StoreError> {
        let path = self.entity_path(partition_key, row_key);
        let mut bytes = Vec::new();
        match fs::File::open(&path) {
            Ok(mut f) => {
                f.read_to_end(&mut bytes)?;
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StoreError::not_found(partition_key, row_key));
            }
            Err(e) => return Err(e.into()),
        }
        let entity = Self::decode_frame(&path, &bytes)?;
        if entity.partition_key != partition_key || entity.row_key != row_key {
            return Err(StoreError::Corrupt(format!(
                "{}: holds keys ({}, {})",
                path.display(),
                entity.partition_key,
                entity.row_key
            )));
        }
        Ok(entity)
    }

    fn delete(&mut self, partition_key: &str, row_key: &str) -> Result<(), StoreError> {
        let path = self.entity_path(partition_key, row_key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(StoreError::not_found(partition_key, row_key))
            }
            Err(e) => Err(e.into()),
        }
    }
}
