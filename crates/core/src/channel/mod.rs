//! Rendezvous named channels backed by POSIX FIFOs.
//!
//! A channel is created once per run and then used in one direction by each
//! party: a [`ChannelWriter`] pushes one terminated payload, a
//! [`ChannelReader`] pulls it. Opening either end blocks until the other end
//! is present.
//!
//! Payloads are at most a few hundred bytes and always written in a single
//! call, so one read returns the whole message. The NUL byte marks the end of
//! the payload on the wire.

pub mod error;

pub use error::{ChannelError, ChannelResult};

use nix::errno::Errno;
use nix::fcntl::{fcntl, FcntlArg, OFlag};
use nix::sys::stat::Mode;
use nix::unistd::mkfifo;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Read, Write};
use std::os::unix::fs::{FileTypeExt, OpenOptionsExt};
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Byte that terminates a payload on the wire.
pub const TERMINATOR: u8 = 0;

/// Create the channel at `path`.
///
/// Succeeds without touching anything if a FIFO already sits at `path`, so a
/// channel left behind by an aborted run is simply reused.
///
/// # Errors
///
/// Returns [`ChannelError::AlreadyExists`] if a non-FIFO entry occupies the
/// name, or [`ChannelError::Create`] for any other failure.
pub fn create(path: &Path) -> ChannelResult<()> {
    let mode = Mode::S_IRUSR
        | Mode::S_IWUSR
        | Mode::S_IRGRP
        | Mode::S_IWGRP
        | Mode::S_IROTH
        | Mode::S_IWOTH;

    match mkfifo(path, mode) {
        Ok(()) => {
            debug!(channel = %path.display(), "created channel");
            Ok(())
        }
        Err(Errno::EEXIST) => {
            let metadata = fs::symlink_metadata(path).map_err(|source| ChannelError::Create {
                path: path.to_path_buf(),
                source,
            })?;
            if metadata.file_type().is_fifo() {
                debug!(channel = %path.display(), "reusing existing channel");
                Ok(())
            } else {
                Err(ChannelError::AlreadyExists {
                    path: path.to_path_buf(),
                })
            }
        }
        Err(errno) => Err(ChannelError::Create {
            path: path.to_path_buf(),
            source: errno.into(),
        }),
    }
}

/// Remove the channel at `path`.
///
/// Failure is logged and otherwise ignored. Returns whether the channel was
/// removed.
pub fn remove(path: &Path) -> bool {
    match fs::remove_file(path) {
        Ok(()) => {
            debug!(channel = %path.display(), "removed channel");
            true
        }
        Err(e) => {
            warn!(channel = %path.display(), error = %e, "failed to remove channel");
            false
        }
    }
}

/// Truncate `payload` at its first terminator byte, if any.
fn strip_terminator(payload: &mut Vec<u8>) {
    if let Some(end) = payload.iter().position(|b| *b == TERMINATOR) {
        payload.truncate(end);
    }
}

/// Write end of a channel.
#[derive(Debug)]
pub struct ChannelWriter {
    path: PathBuf,
    file: File,
}

impl ChannelWriter {
    /// Open `path` for writing, blocking until a reader is present.
    pub fn open(path: &Path) -> ChannelResult<Self> {
        let file = OpenOptions::new()
            .write(true)
            .open(path)
            .map_err(|source| ChannelError::Open {
                path: path.to_path_buf(),
                direction: "writing",
                source,
            })?;

        debug!(channel = %path.display(), "opened channel for writing");
        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    /// Write `payload` followed by its terminator in one operation.
    pub fn write_payload(&mut self, payload: &[u8]) -> ChannelResult<()> {
        let mut frame = Vec::with_capacity(payload.len() + 1);
        frame.extend_from_slice(payload);
        frame.push(TERMINATOR);

        self.file
            .write_all(&frame)
            .map_err(|source| ChannelError::Write {
                path: self.path.clone(),
                source,
            })?;

        debug!(channel = %self.path.display(), bytes = frame.len(), "wrote payload");
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Read end of a channel.
#[derive(Debug)]
pub struct ChannelReader {
    path: PathBuf,
    file: File,
}

impl ChannelReader {
    /// Open `path` for reading, blocking until a writer is present.
    pub fn open(path: &Path) -> ChannelResult<Self> {
        let file = OpenOptions::new()
            .read(true)
            .open(path)
            .map_err(|source| Self::open_error(path, source))?;

        debug!(channel = %path.display(), "opened channel for reading");
        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    /// Register as the reader of `path` without waiting for a writer.
    ///
    /// The open itself does not block, so a writer's blocking open can
    /// complete before this party is ready to consume. Once attached the
    /// handle is switched back to blocking reads, and whatever a writer
    /// pushes stays buffered in the channel until [`read_payload`] is called.
    ///
    /// [`read_payload`]: ChannelReader::read_payload
    pub fn attach(path: &Path) -> ChannelResult<Self> {
        let file = OpenOptions::new()
            .read(true)
            .custom_flags(OFlag::O_NONBLOCK.bits())
            .open(path)
            .map_err(|source| Self::open_error(path, source))?;

        fcntl(file.as_raw_fd(), FcntlArg::F_SETFL(OFlag::empty()))
            .map_err(|errno| Self::open_error(path, errno.into()))?;

        debug!(channel = %path.display(), "attached to channel for reading");
        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    /// Read one payload of at most `max_len` bytes.
    ///
    /// The terminator and anything after it are dropped. An empty result
    /// means the writer sent an empty payload or no writer ever connected.
    pub fn read_payload(&mut self, max_len: usize) -> ChannelResult<Vec<u8>> {
        let mut buffer = vec![0; max_len];
        let read = loop {
            match self.file.read(&mut buffer) {
                Ok(read) => break read,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(source) => {
                    return Err(ChannelError::Read {
                        path: self.path.clone(),
                        source,
                    })
                }
            }
        };

        buffer.truncate(read);
        strip_terminator(&mut buffer);
        debug!(channel = %self.path.display(), bytes = read, "read payload");
        Ok(buffer)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open_error(path: &Path, source: std::io::Error) -> ChannelError {
        ChannelError::Open {
            path: path.to_path_buf(),
            direction: "reading",
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use tempfile::tempdir;

    #[test]
    fn test_create_is_idempotent_for_fifos() {
        let dir = tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("fifo_message");

        create(&path).expect("first create should succeed");
        create(&path).expect("second create should reuse the FIFO");

        let metadata = fs::symlink_metadata(&path).expect("channel should exist");
        assert!(metadata.file_type().is_fifo());
    }

    #[test]
    fn test_create_rejects_regular_file() {
        let dir = tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("fifo_message");
        fs::write(&path, "not a fifo").expect("Failed to write file");

        let result = create(&path);
        assert!(matches!(result, Err(ChannelError::AlreadyExists { .. })));
    }

    #[test]
    fn test_create_in_missing_directory_fails() {
        let dir = tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("missing").join("fifo_message");

        let result = create(&path);
        assert!(matches!(result, Err(ChannelError::Create { .. })));
    }

    #[test]
    fn test_remove_reports_outcome() {
        let dir = tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("fifo_result");
        create(&path).expect("create should succeed");

        assert!(remove(&path));
        assert!(!path.exists());
        assert!(!remove(&path));
    }

    #[test]
    fn test_blocking_open_rendezvous() {
        let dir = tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("fifo_encrypt");
        create(&path).expect("create should succeed");

        let writer_path = path.clone();
        let writer = thread::spawn(move || {
            let mut writer = ChannelWriter::open(&writer_path).expect("writer open");
            writer.write_payload(b"Krod").expect("write");
        });

        let mut reader = ChannelReader::open(&path).expect("reader open");
        writer.join().expect("writer thread panicked");

        assert_eq!(reader.read_payload(256).expect("read"), b"Krod");
    }

    #[test]
    fn test_attached_reader_keeps_payload_until_read() {
        let dir = tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("fifo_decrypt");
        create(&path).expect("create should succeed");

        let mut reader = ChannelReader::attach(&path).expect("attach");

        // The writer completes and closes before the reader consumes anything.
        let mut writer = ChannelWriter::open(&path).expect("writer open");
        writer.write_payload(b"dorK").expect("write");
        drop(writer);

        assert_eq!(reader.read_payload(256).expect("read"), b"dorK");
    }

    #[test]
    fn test_empty_payload_reads_as_empty() {
        let dir = tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("fifo_message");
        create(&path).expect("create should succeed");

        let mut reader = ChannelReader::attach(&path).expect("attach");
        ChannelWriter::open(&path)
            .expect("writer open")
            .write_payload(b"")
            .expect("write");

        assert!(reader.read_payload(256).expect("read").is_empty());
    }

    #[test]
    fn test_read_is_bounded_by_max_len() {
        let dir = tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("fifo_message");
        create(&path).expect("create should succeed");

        let mut reader = ChannelReader::attach(&path).expect("attach");
        ChannelWriter::open(&path)
            .expect("writer open")
            .write_payload(b"abcdefgh")
            .expect("write");

        assert_eq!(reader.read_payload(4).expect("read"), b"abcd");
    }
}
