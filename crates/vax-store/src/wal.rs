use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{StoreError, StoreResult};
use crate::tables::Mutation;

/// One committed transaction as recorded in the log.
///
/// Frame layout:
/// ```text
/// [u32 LE payload length][u32 LE CRC32 of payload][bincode(WalEntry)]
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalEntry {
    /// Commit sequence number, starting at 1.
    pub seq: u64,
    /// Mutations in application order.
    pub mutations: Vec<Mutation>,
}

/// When appended frames are forced to disk.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SyncMode {
    /// `fsync` every frame before the commit is acknowledged.
    EveryWrite,
    /// Leave flushing to the OS page cache.
    #[default]
    OsDefault,
}

const HEADER_SIZE: usize = 8;

struct LogTail {
    file: File,
    len: u64,
}

/// Append-only log of committed transactions.
pub struct WriteAheadLog {
    path: PathBuf,
    tail: Mutex<LogTail>,
    sync_mode: SyncMode,
}

impl WriteAheadLog {
    /// Open the log at `path`, creating it and its directory if needed.
    ///
    /// A torn frame at the end of the file is cut off so new frames start on
    /// a frame boundary.
    pub fn open(path: &Path, sync_mode: SyncMode) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = open_for_append(path)?;
        let file_len = file.metadata()?.len();
        let len = decode_frames(&fs::read(path)?).valid_len as u64;
        if len < file_len {
            warn!(
                path = %path.display(),
                kept = len,
                dropped = file_len - len,
                "truncating torn log tail"
            );
            file.set_len(len)?;
            file.sync_all()?;
        }
        Ok(Self {
            path: path.to_path_buf(),
            tail: Mutex::new(LogTail { file, len }),
            sync_mode,
        })
    }

    /// Append `entry` and return the byte offset of its frame.
    pub fn append(&self, entry: &WalEntry) -> StoreResult<u64> {
        let frame = encode_frame(entry)?;
        let mut tail = self.lock_tail()?;
        let at = tail.len;

        tail.file.write_all(&frame)?;
        if self.sync_mode == SyncMode::EveryWrite {
            tail.file.sync_data()?;
        }
        tail.len += frame.len() as u64;

        debug!(seq = entry.seq, mutations = entry.mutations.len(), at, "transaction logged");
        Ok(at)
    }

    /// Read back every intact entry, oldest first.
    pub fn recover(&self) -> StoreResult<Vec<WalEntry>> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let entries = decode_frames(&bytes).entries;
        debug!(entries = entries.len(), bytes = bytes.len(), "log read back");
        Ok(entries)
    }

    /// Replace the whole log with `entries`.
    ///
    /// Frames go to a temporary file beside the log, which is then renamed
    /// over it, so a crash leaves either the old or the new log.
    pub fn rewrite(&self, entries: &[WalEntry]) -> StoreResult<()> {
        let mut tail = self.lock_tail()?;
        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));

        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        let mut len = 0u64;
        for entry in entries {
            let frame = encode_frame(entry)?;
            tmp.write_all(&frame)?;
            len += frame.len() as u64;
        }
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| StoreError::Io(e.error))?;

        *tail = LogTail {
            file: open_for_append(&self.path)?,
            len,
        };
        debug!(entries = entries.len(), bytes = len, "log rewritten");
        Ok(())
    }

    /// Bytes currently in the log.
    pub fn len(&self) -> StoreResult<u64> {
        Ok(self.lock_tail()?.len)
    }

    pub fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len()? == 0)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_tail(&self) -> StoreResult<MutexGuard<'_, LogTail>> {
        self.tail.lock().map_err(|_| StoreError::LockPoisoned)
    }
}

fn open_for_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).read(true).append(true).open(path)
}

fn encode_frame(entry: &WalEntry) -> StoreResult<Vec<u8>> {
    let payload = bincode::serialize(entry).map_err(|e| StoreError::Serialization(e.to_string()))?;
    let length = u32::try_from(payload.len())
        .map_err(|_| StoreError::Serialization("log entry exceeds 4 GiB".into()))?;

    let mut frame = Vec::with_capacity(HEADER_SIZE + payload.len());
    frame.extend_from_slice(&length.to_le_bytes());
    frame.extend_from_slice(&crc32fast::hash(&payload).to_le_bytes());
    frame.extend_from_slice(&payload);
    Ok(frame)
}

struct Decoded {
    entries: Vec<WalEntry>,
    /// End of the last complete frame.
    valid_len: usize,
}

/// Decode frames front to back.
///
/// A frame whose checksum or payload is bad is skipped; a frame that runs
/// past the end of `bytes` is a torn write and ends decoding.
fn decode_frames(bytes: &[u8]) -> Decoded {
    let mut entries = Vec::new();
    let mut rest = bytes;

    while !rest.is_empty() {
        let offset = bytes.len() - rest.len();
        let Some((header, body)) = rest.split_first_chunk::<HEADER_SIZE>() else {
            warn!(offset, "torn frame header; stopping replay");
            break;
        };
        let [l0, l1, l2, l3, c0, c1, c2, c3] = *header;
        let length = u32::from_le_bytes([l0, l1, l2, l3]) as usize;
        let crc = u32::from_le_bytes([c0, c1, c2, c3]);
        if length == 0 || body.len() < length {
            warn!(offset, length, "torn or empty frame; stopping replay");
            break;
        }

        let (payload, next) = body.split_at(length);
        if crc32fast::hash(payload) != crc {
            warn!(offset, "frame checksum mismatch; skipping");
        } else {
            match bincode::deserialize::<WalEntry>(payload) {
                Ok(entry) => entries.push(entry),
                Err(e) => warn!(offset, error = %e, "undecodable frame; skipping"),
            }
        }
        rest = next;
    }
    Decoded {
        entries,
        valid_len: bytes.len() - rest.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::AvailabilitySlot;
    use vax_types::{AppointmentId, SlotDate, Username};

    fn opened(day: u64) -> WalEntry {
        WalEntry {
            seq: day,
            mutations: vec![
                Mutation::InsertSlot(AvailabilitySlot::new(
                    SlotDate::from_ymd(2021, 5, day as u32).unwrap(),
                    Username::new("p1").unwrap(),
                )),
                Mutation::SetNextAppointmentId(AppointmentId::new(day + 1)),
            ],
        }
    }

    fn log_in(dir: &tempfile::TempDir) -> WriteAheadLog {
        WriteAheadLog::open(&dir.path().join("scheduler.wal"), SyncMode::default()).unwrap()
    }

    #[test]
    fn entries_come_back_in_commit_order() {
        let dir = tempfile::tempdir().unwrap();
        let wal = log_in(&dir);
        for day in 1..=3 {
            wal.append(&opened(day)).unwrap();
        }
        assert_eq!(wal.recover().unwrap(), vec![opened(1), opened(2), opened(3)]);
    }

    #[test]
    fn fresh_log_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let wal = WriteAheadLog::open(&dir.path().join("nested/dir/x.wal"), SyncMode::default())
            .unwrap();
        assert!(wal.is_empty().unwrap());
        assert!(wal.recover().unwrap().is_empty());
    }

    #[test]
    fn corrupt_payload_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let wal = log_in(&dir);
        wal.append(&opened(1)).unwrap();
        wal.append(&opened(2)).unwrap();

        let mut bytes = fs::read(wal.path()).unwrap();
        bytes[HEADER_SIZE] ^= 0xFF;
        fs::write(wal.path(), &bytes).unwrap();

        assert_eq!(wal.recover().unwrap(), vec![opened(2)]);
    }

    #[test]
    fn torn_tail_ends_replay() {
        let dir = tempfile::tempdir().unwrap();
        let wal = log_in(&dir);
        wal.append(&opened(1)).unwrap();
        wal.append(&opened(2)).unwrap();
        let len = wal.len().unwrap();
        drop(wal);

        let file = OpenOptions::new()
            .write(true)
            .open(dir.path().join("scheduler.wal"))
            .unwrap();
        file.set_len(len - 3).unwrap();

        assert_eq!(log_in(&dir).recover().unwrap(), vec![opened(1)]);
    }

    #[test]
    fn rewrite_then_append() {
        let dir = tempfile::tempdir().unwrap();
        let wal = log_in(&dir);
        for day in 1..=3 {
            wal.append(&opened(day)).unwrap();
        }

        wal.rewrite(&[opened(7)]).unwrap();
        assert_eq!(wal.recover().unwrap(), vec![opened(7)]);

        wal.append(&opened(8)).unwrap();
        assert_eq!(wal.recover().unwrap(), vec![opened(7), opened(8)]);
    }

    #[test]
    fn synced_appends_report_offsets() {
        let dir = tempfile::tempdir().unwrap();
        let wal = WriteAheadLog::open(&dir.path().join("sync.wal"), SyncMode::EveryWrite).unwrap();
        let first = wal.append(&opened(1)).unwrap();
        let second = wal.append(&opened(2)).unwrap();
        assert_eq!(first, 0);
        assert!(second > first);
        assert_eq!(wal.recover().unwrap().len(), 2);
    }

    #[test]
    fn appends_after_torn_tail_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let wal = log_in(&dir);
        wal.append(&opened(1)).unwrap();
        let good_len = wal.len().unwrap();
        drop(wal);

        let mut file = OpenOptions::new()
            .append(true)
            .open(dir.path().join("scheduler.wal"))
            .unwrap();
        file.write_all(&[100, 0, 0, 0, 1, 2, 3, 4, 9, 9, 9]).unwrap();
        drop(file);

        let wal = log_in(&dir);
        assert_eq!(wal.len().unwrap(), good_len);
        wal.append(&opened(2)).unwrap();
        drop(wal);

        assert_eq!(log_in(&dir).recover().unwrap(), vec![opened(1), opened(2)]);
    }

    #[test]
    fn corrupt_frame_in_the_middle_is_not_truncated() {
        let dir = tempfile::tempdir().unwrap();
        let wal = log_in(&dir);
        wal.append(&opened(1)).unwrap();
        wal.append(&opened(2)).unwrap();
        let len = wal.len().unwrap();

        let mut bytes = fs::read(wal.path()).unwrap();
        bytes[HEADER_SIZE] ^= 0xFF;
        fs::write(wal.path(), &bytes).unwrap();
        drop(wal);

        let wal = log_in(&dir);
        assert_eq!(wal.len().unwrap(), len);
        assert_eq!(wal.recover().unwrap(), vec![opened(2)]);
    }
}
