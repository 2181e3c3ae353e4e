//! Bit-granular I/O over byte-granular storage.
//!
//! A `BitChannel` is opened for exactly one direction. Writing packs bits into
//! a one-byte buffer from the most significant position down and only hands
//! the byte to storage once it is full and another bit arrives (or on
//! alignment/close). Reading pulls one byte at a time and hands its bits out
//! most significant first.
//!
//! The free/remaining bit counter starts at 8 for writing and 0 for reading,
//! so the first operation in either direction triggers the first byte
//! transfer without a separate initialisation path.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

use log::{trace, warn};

use crate::error::{HuffError, Result};

const BYTE_BITS: u8 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Read,
    Write,
}

enum Storage {
    Reader(BufReader<Box<dyn Read>>),
    Writer(BufWriter<Box<dyn Write>>),
}

pub struct BitChannel {
    storage: Option<Storage>,
    mode: Mode,
    byte: u8,      // partially filled (write) or partially consumed (read) byte
    bits_left: u8, // free slots in `byte` when writing, unread bits when reading
    num_bytes: u64,
}

impl BitChannel {
    /// Opens `path` for bit-level reading or writing. Write mode creates or
    /// truncates the file.
    pub fn open<P: AsRef<Path>>(path: P, mode: Mode) -> Result<Self> {
        let path = path.as_ref();
        let opened = match mode {
            Mode::Write => File::create(path).map(Self::from_writer),
            Mode::Read => File::open(path).map(Self::from_reader),
        };
        let channel = opened.map_err(|source| HuffError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        trace!("opened {} for {:?}", path.display(), mode);
        Ok(channel)
    }

    pub fn from_writer<W: Write + 'static>(writer: W) -> Self {
        let writer: Box<dyn Write> = Box::new(writer);
        Self::with_storage(Storage::Writer(BufWriter::new(writer)), Mode::Write)
    }

    pub fn from_reader<R: Read + 'static>(reader: R) -> Self {
        let reader: Box<dyn Read> = Box::new(reader);
        Self::with_storage(Storage::Reader(BufReader::new(reader)), Mode::Read)
    }

    fn with_storage(storage: Storage, mode: Mode) -> Self {
        BitChannel {
            storage: Some(storage),
            mode,
            byte: 0,
            bits_left: match mode {
                Mode::Write => BYTE_BITS,
                Mode::Read => 0,
            },
            num_bytes: 0,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Whole bytes handed to (write) or taken from (read) storage so far.
    /// In write mode a full buffered byte is not counted until it is flushed.
    pub fn bytes_transferred(&self) -> u64 {
        self.num_bytes
    }

    /// Writes one bit and returns it.
    pub fn write_bit(&mut self, bit: bool) -> Result<bool> {
        self.expect_mode(Mode::Write)?;
        if self.bits_left == 0 {
            self.put_byte(self.byte)?;
            self.byte = 0;
            self.bits_left = BYTE_BITS;
        }
        self.bits_left -= 1;
        self.byte |= u8::from(bit) << self.bits_left;
        Ok(bit)
    }

    /// Reads one bit. `Ok(None)` means storage is exhausted.
    pub fn read_bit(&mut self) -> Result<Option<bool>> {
        self.expect_mode(Mode::Read)?;
        if self.bits_left == 0 {
            match self.fetch_byte()? {
                Some(byte) => {
                    self.byte = byte;
                    self.bits_left = BYTE_BITS;
                }
                None => return Ok(None),
            }
        }
        let bit = self.byte & 0x80 != 0;
        self.byte <<= 1;
        self.bits_left -= 1;
        Ok(Some(bit))
    }

    /// Writes the low `count` bits of `value`, most significant first.
    pub fn write_bits(&mut self, value: u32, count: u8) -> Result<()> {
        debug_assert!(count <= 32);
        for shift in (0..count).rev() {
            self.write_bit((value >> shift) & 1 == 1)?;
        }
        Ok(())
    }

    /// Reads `count` bits into the low end of a `u32`, most significant first.
    /// `Ok(None)` if storage runs out part way.
    pub fn read_bits(&mut self, count: u8) -> Result<Option<u32>> {
        debug_assert!(count <= 32);
        let mut value = 0u32;
        for _ in 0..count {
            match self.read_bit()? {
                Some(bit) => value = (value << 1) | u32::from(bit),
                None => return Ok(None),
            }
        }
        Ok(Some(value))
    }

    /// Writes `length` as four big-endian bytes at the next byte boundary.
    /// Bits already buffered are zero padded and flushed first.
    pub fn write_length(&mut self, length: u32) -> Result<()> {
        self.expect_mode(Mode::Write)?;
        self.flush_partial()?;
        for byte in length.to_be_bytes() {
            self.put_byte(byte)?;
        }
        Ok(())
    }

    /// Reads a four byte big-endian length from the next byte boundary,
    /// discarding any unread bits of the current byte.
    pub fn read_length(&mut self) -> Result<u32> {
        self.expect_mode(Mode::Read)?;
        self.byte = 0;
        self.bits_left = 0;
        let mut bytes = [0u8; 4];
        for slot in bytes.iter_mut() {
            *slot = self.fetch_byte()?.ok_or(HuffError::TruncatedStream {
                context: "length header",
            })?;
        }
        Ok(u32::from_be_bytes(bytes))
    }

    /// Flushes any partial byte (write mode), flushes storage and releases it.
    /// Returns the final number of bytes transferred.
    pub fn close(mut self) -> Result<u64> {
        self.finish()?;
        Ok(self.num_bytes)
    }

    fn finish(&mut self) -> Result<()> {
        if self.mode == Mode::Write && self.storage.is_some() {
            self.flush_partial()?;
        }
        if let Some(Storage::Writer(mut writer)) = self.storage.take() {
            writer.flush().map_err(HuffError::Write)?;
        }
        Ok(())
    }

    fn flush_partial(&mut self) -> Result<()> {
        if self.bits_left != BYTE_BITS {
            self.put_byte(self.byte)?;
            self.byte = 0;
            self.bits_left = BYTE_BITS;
        }
        Ok(())
    }

    fn expect_mode(&self, expected: Mode) -> Result<()> {
        if self.mode == expected {
            Ok(())
        } else {
            Err(HuffError::WrongMode { expected })
        }
    }

    fn put_byte(&mut self, byte: u8) -> Result<()> {
        match self.storage.as_mut() {
            Some(Storage::Writer(writer)) => writer.write_all(&[byte]).map_err(HuffError::Write)?,
            _ => return Err(HuffError::WrongMode { expected: Mode::Write }),
        }
        self.num_bytes += 1;
        Ok(())
    }

    fn fetch_byte(&mut self) -> Result<Option<u8>> {
        let reader = match self.storage.as_mut() {
            Some(Storage::Reader(reader)) => reader,
            _ => return Err(HuffError::WrongMode { expected: Mode::Read }),
        };
        let mut buf = [0u8; 1];
        loop {
            match reader.read(&mut buf) {
                Ok(0) => return Ok(None),
                Ok(_) => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(HuffError::Read(e)),
            }
        }
        self.num_bytes += 1;
        Ok(Some(buf[0]))
    }
}

impl Drop for BitChannel {
    fn drop(&mut self) {
        if self.storage.is_none() {
            return;
        }
        if let Err(e) = self.finish() {
            warn!("bit channel dropped without close, final flush failed: {}", e);
        }
    }
}
