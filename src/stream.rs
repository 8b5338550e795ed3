//! Tagged block stream over a shared file.
//!
//! The film file is a consecutive sequence of blocks. Every block starts
//! with an 8-byte header carrying a magic value, an identity tag, and the
//! size of the whole block (header, any extended header fields, and
//! payload). The file itself opens with a fixed 10-byte file header block.
//! Cursor movement and byte transfer are only possible through the guard
//! returned by [`DataStream::sync`], so every compound read or write holds
//! the file lock for its full duration.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// Magic value opening every block ("ST" on disk).
pub const BLOCK_MAGIC: u16 = 0x5453;
/// Identity tag of the file header block.
pub const FILE_IDENT: u16 = 0;
/// File format major version.
pub const VERSION_MAJOR: u8 = 1;
/// File format minor version.
pub const VERSION_MINOR: u8 = 1;

/// Size of the file header block in bytes.
pub const FILE_HEADER_SIZE: u32 = 10;
/// Size of the bare block header in bytes.
pub const BLOCK_HEADER_SIZE: u32 = 8;

fn invalid(message: &'static str) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, message)
}

/// The 8-byte header opening every block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockHeader {
    /// Magic value, always [`BLOCK_MAGIC`] in a valid file.
    pub magic: u16,
    /// Block type identifier.
    pub ident: u16,
    /// Size of the whole block in bytes, this header included.
    pub size: u32,
}

impl BlockHeader {
    /// A header for a new block of `size` total bytes.
    pub fn new(ident: u16, size: u32) -> Self {
        BlockHeader {
            magic: BLOCK_MAGIC,
            ident,
            size,
        }
    }

    /// Check the magic and that the size can cover the header itself.
    pub fn validate(&self) -> io::Result<()> {
        if self.magic != BLOCK_MAGIC {
            return Err(invalid("bad block magic"));
        }
        if self.size < BLOCK_HEADER_SIZE {
            return Err(invalid("block size smaller than its header"));
        }
        Ok(())
    }

    /// Validate and require an exact identity tag and size.
    pub fn expect(&self, ident: u16, size: u32) -> io::Result<()> {
        self.validate()?;
        if self.ident != ident {
            return Err(invalid("unexpected block tag"));
        }
        if self.size != size {
            return Err(invalid("unexpected block size"));
        }
        Ok(())
    }

    /// Little-endian wire form.
    pub fn to_bytes(&self) -> [u8; 8] {
        let mut bytes = [0u8; 8];
        bytes[0..2].copy_from_slice(&self.magic.to_le_bytes());
        bytes[2..4].copy_from_slice(&self.ident.to_le_bytes());
        bytes[4..8].copy_from_slice(&self.size.to_le_bytes());
        bytes
    }

    /// Rebuild from the little-endian wire form.
    pub fn from_bytes(bytes: [u8; 8]) -> Self {
        BlockHeader {
            magic: u16::from_le_bytes([bytes[0], bytes[1]]),
            ident: u16::from_le_bytes([bytes[2], bytes[3]]),
            size: u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
        }
    }
}

fn file_header_bytes() -> [u8; 10] {
    let mut bytes = [0u8; 10];
    bytes[0..8].copy_from_slice(&BlockHeader::new(FILE_IDENT, FILE_HEADER_SIZE).to_bytes());
    bytes[8] = VERSION_MAJOR;
    bytes[9] = VERSION_MINOR;
    bytes
}

/// A film file shared between workers.
///
/// The stream owns the file handle behind a mutex; all block operations
/// live on [`BlockCursor`] and are reached through [`DataStream::sync`].
pub struct DataStream {
    cursor: Mutex<BlockCursor>,
    read_only: bool,
}

/// Exclusive access to the file cursor while the lock is held.
pub struct BlockCursor {
    file: File,
}

impl DataStream {
    /// Create or truncate a film file and write its file header.
    pub fn create(path: &Path) -> io::Result<Self> {
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        file.write_all(&file_header_bytes())?;
        Ok(DataStream {
            cursor: Mutex::new(BlockCursor { file }),
            read_only: false,
        })
    }

    /// Open an existing film file and validate its file header.
    pub fn open(path: &Path, read_only: bool) -> io::Result<Self> {
        let mut file = OpenOptions::new()
            .read(true)
            .write(!read_only)
            .open(path)?;
        let mut bytes = [0u8; 10];
        file.read_exact(&mut bytes)?;

        let mut header = [0u8; 8];
        header.copy_from_slice(&bytes[0..8]);
        BlockHeader::from_bytes(header).expect(FILE_IDENT, FILE_HEADER_SIZE)?;
        if bytes[8] != VERSION_MAJOR || bytes[9] != VERSION_MINOR {
            return Err(invalid("unsupported film version"));
        }

        Ok(DataStream {
            cursor: Mutex::new(BlockCursor { file }),
            read_only,
        })
    }

    /// Open an existing film file for writing and seek to its tail.
    pub fn append(path: &Path) -> io::Result<Self> {
        let stream = Self::open(path, false)?;
        stream.sync().seek_tail()?;
        Ok(stream)
    }

    /// Acquire the file lock; block operations live on the guard.
    pub fn sync(&self) -> MutexGuard<'_, BlockCursor> {
        self.cursor.lock().expect("film stream lock poisoned")
    }

    /// Flush the file to disk and report any pending stream failure.
    pub fn close(&self) -> io::Result<()> {
        if self.read_only {
            return Ok(());
        }
        self.sync().file.sync_all()
    }
}

impl BlockCursor {
    /// Move the cursor to the first block after the file header.
    pub fn rewind(&mut self) -> io::Result<()> {
        self.file
            .seek(SeekFrom::Start(u64::from(FILE_HEADER_SIZE)))?;
        Ok(())
    }

    /// The current cursor offset from the start of the file.
    pub fn position(&mut self) -> io::Result<u64> {
        self.file.stream_position()
    }

    /// Read and validate the block header under the cursor.
    ///
    /// Leaves the cursor just past the 8 header bytes.
    pub fn read_header(&mut self) -> io::Result<BlockHeader> {
        let mut bytes = [0u8; 8];
        self.file.read_exact(&mut bytes)?;
        let header = BlockHeader::from_bytes(bytes);
        header.validate()?;
        Ok(header)
    }

    /// Advance the cursor over the block it points at.
    ///
    /// On failure the cursor is restored to where the step began.
    pub fn step(&mut self) -> io::Result<BlockHeader> {
        let start = self.position()?;
        match self.read_header() {
            Ok(header) => {
                self.file
                    .seek(SeekFrom::Start(start + u64::from(header.size)))?;
                Ok(header)
            }
            Err(error) => {
                self.file.seek(SeekFrom::Start(start))?;
                Err(error)
            }
        }
    }

    /// Scan forward for the next block bearing `ident`.
    ///
    /// On success the cursor is left at the block's header so the caller
    /// reads it again. On end-of-file or a read failure the cursor is
    /// restored to the last position it validly pointed at.
    pub fn seek(&mut self, ident: u16) -> io::Result<()> {
        loop {
            let start = self.position()?;
            let header = match self.read_header() {
                Ok(header) => header,
                Err(error) => {
                    self.file.seek(SeekFrom::Start(start))?;
                    return Err(error);
                }
            };
            if header.ident == ident {
                self.file.seek(SeekFrom::Start(start))?;
                return Ok(());
            }
            self.file
                .seek(SeekFrom::Start(start + u64::from(header.size)))?;
        }
    }

    /// Move the cursor past the last valid block in the file.
    pub fn seek_tail(&mut self) -> io::Result<()> {
        self.rewind()?;
        loop {
            let start = self.position()?;
            match self.read_header() {
                Ok(header) => {
                    self.file
                        .seek(SeekFrom::Start(start + u64::from(header.size)))?;
                }
                Err(_) => {
                    self.file.seek(SeekFrom::Start(start))?;
                    return Ok(());
                }
            }
        }
    }

    /// Write a block header at the cursor.
    pub fn write_header(&mut self, header: &BlockHeader) -> io::Result<()> {
        self.write_bytes(&header.to_bytes())
    }

    /// Write raw bytes at the cursor.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.file.write_all(bytes)
    }

    /// Fill `buffer` with raw bytes from the cursor.
    pub fn read_bytes(&mut self, buffer: &mut [u8]) -> io::Result<()> {
        self.file.read_exact(buffer)
    }
}
