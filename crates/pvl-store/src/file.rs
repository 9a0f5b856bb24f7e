use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

use pvl_types::{Digest, Position, Record};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{StoreError, StoreResult};
use crate::index::RecordIndex;
use crate::traits::RecordStore;

/// Header size: 4 bytes length + 4 bytes CRC.
const HEADER_SIZE: usize = 8;

/// Largest payload a frame may declare. Anything longer is corruption.
const MAX_FRAME_LEN: u32 = 64 * 1024 * 1024;

/// Flush/sync strategy for the record log.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    /// `fsync` after every record (safest, highest latency).
    #[default]
    EveryWrite,
    /// Rely on OS page-cache buffering (fastest, least durable).
    OsDefault,
}

/// Configuration for [`FileRecordStore`].
#[derive(Clone, Debug, Default)]
pub struct FileStoreConfig {
    pub sync_mode: SyncMode,
}

/// What [`FileRecordStore::open`] found while replaying the log.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RecoveryStats {
    /// Records loaded into the index.
    pub recovered: u64,
    /// Entries dropped for a CRC or decode failure.
    pub skipped: u64,
    /// Bytes cut from a torn tail.
    pub truncated_bytes: u64,
}

struct LogWriter {
    file: File,
    /// Current end of the log; every frame starts here.
    offset: u64,
}

/// Durable record store backed by a single append-only log file.
///
/// On-disk format, one frame per record:
/// ```text
/// [4 bytes: payload length (little-endian u32)]
/// [4 bytes: CRC32 of payload (little-endian u32)]
/// [N bytes: payload (bincode-serialized Record)]
/// ```
///
/// The whole log is replayed into memory on open. Frames that fail the CRC
/// check are logged and skipped; the resulting gap is visible to chain
/// validation. A torn final frame (crash mid-write) is truncated away so new
/// frames start on a clean boundary. A damaged length header anywhere else
/// makes [`open`](Self::open) fail with [`StoreError::Corrupt`] instead. An insert writes and flushes its frame
/// before the record is published to readers.
pub struct FileRecordStore {
    path: PathBuf,
    config: FileStoreConfig,
    writer: Mutex<LogWriter>,
    index: RwLock<RecordIndex>,
    recovery: RecoveryStats,
}

impl FileRecordStore {
    /// Open (or create) a record log at the given path.
    pub fn open(path: &Path, config: FileStoreConfig) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(path)?;

        let (index, valid_len, mut recovery) = replay(path)?;
        let file_len = file.metadata()?.len();
        if valid_len < file_len {
            warn!(
                path = %path.display(),
                valid_len,
                file_len,
                "truncating torn tail of record log"
            );
            file.set_len(valid_len)?;
            recovery.truncated_bytes = file_len - valid_len;
        }

        debug!(
            path = %path.display(),
            recovered = recovery.recovered,
            skipped = recovery.skipped,
            "record log opened"
        );

        Ok(Self {
            path: path.to_path_buf(),
            config,
            writer: Mutex::new(LogWriter {
                file,
                offset: valid_len,
            }),
            index: RwLock::new(index),
            recovery,
        })
    }

    /// Path to the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Outcome of the replay performed by [`open`](Self::open).
    pub fn recovery_stats(&self) -> &RecoveryStats {
        &self.recovery
    }

    /// Current end-of-log offset.
    pub fn offset(&self) -> StoreResult<u64> {
        Ok(self.writer_guard()?.offset)
    }

    fn writer_guard(&self) -> StoreResult<MutexGuard<'_, LogWriter>> {
        self.writer
            .lock()
            .map_err(|_| StoreError::Unavailable("record log mutex poisoned".into()))
    }

    fn read_guard(&self) -> StoreResult<RwLockReadGuard<'_, RecordIndex>> {
        self.index
            .read()
            .map_err(|_| StoreError::Unavailable("record index read lock poisoned".into()))
    }

    fn write_guard(&self) -> StoreResult<RwLockWriteGuard<'_, RecordIndex>> {
        self.index
            .write()
            .map_err(|_| StoreError::Unavailable("record index write lock poisoned".into()))
    }
}

impl RecordStore for FileRecordStore {
    fn tail(&self) -> StoreResult<Option<Record>> {
        Ok(self.read_guard()?.tail().cloned())
    }

    fn get(&self, position: Position) -> StoreResult<Option<Record>> {
        Ok(self.read_guard()?.get(position).cloned())
    }

    fn get_by_digest(&self, digest: &Digest) -> StoreResult<Option<Record>> {
        Ok(self.read_guard()?.get_by_digest(digest).cloned())
    }

    fn insert(&self, record: &Record) -> StoreResult<()> {
        // The writer mutex serializes inserts; the index lock is only held
        // briefly so readers are not blocked behind disk I/O.
        let mut w = self.writer_guard()?;
        self.read_guard()?.check_insert(record)?;

        let frame = encode_frame(record)?;
        let entry_offset = w.offset;
        if let Err(e) = write_frame(&mut w.file, &frame, self.config.sync_mode) {
            // Drop whatever part of the frame reached the file.
            if let Err(trunc) = w.file.set_len(entry_offset) {
                warn!(error = %trunc, offset = entry_offset, "failed to roll back partial frame");
            }
            return Err(e.into());
        }
        w.offset += frame.len() as u64;

        self.write_guard()?.insert_checked(record.clone());
        debug!(
            position = record.position,
            offset = entry_offset,
            len = frame.len(),
            "record log append"
        );
        Ok(())
    }

    fn scan(&self) -> StoreResult<Vec<Record>> {
        Ok(self.read_guard()?.records().cloned().collect())
    }

    fn len(&self) -> StoreResult<u64> {
        Ok(self.read_guard()?.len() as u64)
    }
}

impl std::fmt::Debug for FileRecordStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileRecordStore")
            .field("path", &self.path)
            .field("sync_mode", &self.config.sync_mode)
            .finish()
    }
}

fn encode_frame(record: &Record) -> StoreResult<Vec<u8>> {
    let payload =
        bincode::serialize(record).map_err(|e| StoreError::Serialization(e.to_string()))?;
    let length = u32::try_from(payload.len())
        .ok()
        .filter(|len| *len <= MAX_FRAME_LEN)
        .ok_or_else(|| StoreError::Serialization("record exceeds 64 MiB frame limit".into()))?;
    let crc = crc32fast::hash(&payload);

    let mut frame = Vec::with_capacity(HEADER_SIZE + payload.len());
    frame.extend_from_slice(&length.to_le_bytes());
    frame.extend_from_slice(&crc.to_le_bytes());
    frame.extend_from_slice(&payload);
    Ok(frame)
}

fn write_frame(file: &mut File, frame: &[u8], sync_mode: SyncMode) -> io::Result<()> {
    file.write_all(frame)?;
    file.flush()?;
    if sync_mode == SyncMode::EveryWrite {
        file.sync_data()?;
    }
    Ok(())
}

/// Replay the log front-to-back. Returns the rebuilt index and the length of
/// the well-formed prefix of the file.
///
/// Only a frame that runs past end-of-file with nothing recoverable after it
/// counts as a torn tail. A bad length anywhere else is reported as
/// [`StoreError::Corrupt`] and the file is left as found.
fn replay(path: &Path) -> StoreResult<(RecordIndex, u64, RecoveryStats)> {
    let mut file = BufReader::new(File::open(path)?);
    let file_len = file.get_ref().metadata()?.len();
    let mut index = RecordIndex::default();
    let mut stats = RecoveryStats::default();
    let mut offset: u64 = 0;

    while offset + HEADER_SIZE as u64 <= file_len {
        file.seek(SeekFrom::Start(offset))?;

        let mut header_buf = [0u8; HEADER_SIZE];
        file.read_exact(&mut header_buf)?;
        let (length, expected_crc) = parse_header(&header_buf);

        if length == 0 || length > MAX_FRAME_LEN {
            return Err(StoreError::Corrupt {
                offset,
                reason: format!("invalid frame length {length}"),
            });
        }

        let frame_end = offset + HEADER_SIZE as u64 + length as u64;
        if frame_end > file_len {
            let mut rest = Vec::new();
            file.read_to_end(&mut rest)?;
            if contains_frame(&rest) {
                return Err(StoreError::Corrupt {
                    offset,
                    reason: format!(
                        "frame length {length} overruns the log but complete frames follow"
                    ),
                });
            }
            warn!(offset, length, file_len, "torn final frame; stopping replay");
            break;
        }

        let mut payload = vec![0u8; length as usize];
        file.read_exact(&mut payload)?;

        let actual_crc = crc32fast::hash(&payload);
        if actual_crc != expected_crc {
            warn!(
                offset,
                expected = expected_crc,
                actual = actual_crc,
                "CRC mismatch; skipping record"
            );
            stats.skipped += 1;
            offset = frame_end;
            continue;
        }

        match bincode::deserialize::<Record>(&payload) {
            Ok(record) => {
                let position = record.position;
                if let Err(e) = index.insert_recovered(record) {
                    warn!(offset, position, error = %e, "duplicate record in log; skipping");
                    stats.skipped += 1;
                } else {
                    stats.recovered += 1;
                }
            }
            Err(e) => {
                warn!(offset, error = %e, "failed to deserialize record; skipping");
                stats.skipped += 1;
            }
        }

        offset = frame_end;
    }

    Ok((index, offset, stats))
}

fn parse_header(header: &[u8]) -> (u32, u32) {
    let length = u32::from_le_bytes([header[0], header[1], header[2], header[3]]);
    let crc = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);
    (length, crc)
}

/// Whether a complete frame with a matching CRC starts anywhere in `bytes`.
fn contains_frame(bytes: &[u8]) -> bool {
    (0..bytes.len()).any(|start| {
        let rest = &bytes[start..];
        if rest.len() <= HEADER_SIZE {
            return false;
        }
        let (length, crc) = parse_header(&rest[..HEADER_SIZE]);
        let end = HEADER_SIZE + length as usize;
        length != 0
            && length <= MAX_FRAME_LEN
            && end <= rest.len()
            && crc32fast::hash(&rest[HEADER_SIZE..end]) == crc
    })
}
