//! Compression and decompression pipelines.
//!
//! Compressed layout: the serialized code tree (zero padded to a byte
//! boundary), the original symbol count as a big-endian `u32`, then the code
//! of every input symbol in order, packed most significant bit first with the
//! final byte zero padded.

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;

use log::{debug, trace};

use crate::bit_channel::{BitChannel, Mode};
use crate::code_table::CodeTable;
use crate::code_tree::{CodeNode, CodeTree};
use crate::error::{HuffError, Result};
use crate::frequency::FrequencyTable;

/// Figures from one compression or decompression run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    /// Original (uncompressed) symbol count.
    pub symbols: u64,
    /// Bits taken by the serialized tree.
    pub tree_bits: u64,
    /// Size of the compressed stream in bytes.
    pub compressed_bytes: u64,
}

impl Summary {
    /// Compressed size divided by original size; 0 for empty inputs.
    pub fn ratio(&self) -> f64 {
        if self.symbols == 0 {
            0.0
        } else {
            self.compressed_bytes as f64 / self.symbols as f64
        }
    }
}

/// Compresses everything `input` yields from its current position into
/// `channel`, closing the channel on success.
///
/// The input is read twice: once to count symbols and once to encode them.
pub fn compress<R: Read + Seek>(mut input: R, mut channel: BitChannel) -> Result<Summary> {
    let start = input.stream_position().map_err(HuffError::Read)?;
    let frequencies = FrequencyTable::from_reader(&mut input).map_err(HuffError::Read)?;
    let total = frequencies.total();
    let symbols = u32::try_from(total).map_err(|_| HuffError::InputTooLarge { len: total })?;

    let tree = CodeTree::from_frequencies(&frequencies);
    let tree_bits = tree.serialize(&mut channel)?;
    channel.write_length(symbols)?;
    debug!("header: {} tree bits, {} symbols", tree_bits, symbols);

    let table = tree.code_table();
    input.seek(SeekFrom::Start(start)).map_err(HuffError::Read)?;
    let mut written = 0u64;
    for byte in BufReader::new(&mut input).bytes() {
        let byte = byte.map_err(HuffError::Read)?;
        let code = table.get(byte).ok_or_else(|| input_changed(format!("byte {:#04x} was not counted", byte)))?;
        for &bit in code.bits() {
            channel.write_bit(bit)?;
        }
        written += 1;
    }
    if written != total {
        return Err(input_changed(format!("counted {} bytes, encoded {}", total, written)));
    }

    let compressed_bytes = channel.close()?;
    trace!("compressed {} symbols into {} bytes", total, compressed_bytes);
    Ok(Summary {
        symbols: total,
        tree_bits,
        compressed_bytes,
    })
}

fn input_changed(detail: String) -> HuffError {
    HuffError::Read(io::Error::new(
        io::ErrorKind::InvalidData,
        format!("input changed between passes: {}", detail),
    ))
}

/// Decodes the stream in `channel` into `output`, closing the channel on success.
///
/// Exactly as many symbols as the length header records are decoded; padding
/// bits after the last code are never read.
pub fn decompress<W: Write>(mut channel: BitChannel, output: W) -> Result<Summary> {
    let tree = CodeTree::deserialize(&mut channel)?;
    let symbols = channel.read_length()?;
    debug!("header: {} tree bits, {} symbols", tree.size(), symbols);

    let mut writer = BufWriter::new(output);
    for _ in 0..symbols {
        let symbol = decode_symbol(tree.root(), &mut channel)?;
        writer.write_all(&[symbol]).map_err(HuffError::Write)?;
    }
    writer.flush().map_err(HuffError::Write)?;

    let compressed_bytes = channel.close()?;
    Ok(Summary {
        symbols: u64::from(symbols),
        tree_bits: tree.size(),
        compressed_bytes,
    })
}

/// Walks from `root` one bit at a time until a leaf is reached.
fn decode_symbol(root: &CodeNode, channel: &mut BitChannel) -> Result<u8> {
    let mut node = root;
    loop {
        match node {
            CodeNode::Leaf { symbol, .. } => return Ok(*symbol),
            CodeNode::Internal { left, right, .. } => {
                let bit = channel.read_bit()?.ok_or(HuffError::TruncatedStream {
                    context: "encoded symbols",
                })?;
                node = if bit { right } else { left };
            }
        }
    }
}

/// Code table the compressor would use for `input`.
pub fn code_table_for<R: Read>(input: R) -> Result<CodeTable> {
    let frequencies = FrequencyTable::from_reader(input).map_err(HuffError::Read)?;
    Ok(CodeTree::from_frequencies(&frequencies).code_table())
}

/// Fails with [`HuffError::SamePath`] when `src` and `dst` name one file.
/// Opening the output for writing would otherwise truncate the input.
pub fn ensure_distinct(src: &Path, dst: &Path) -> Result<()> {
    match (fs::canonicalize(src), fs::canonicalize(dst)) {
        (Ok(src), Ok(dst)) if src == dst => Err(HuffError::SamePath { path: src }),
        _ => Ok(()),
    }
}

pub fn compress_file<P: AsRef<Path>, Q: AsRef<Path>>(src: P, dst: Q) -> Result<Summary> {
    ensure_distinct(src.as_ref(), dst.as_ref())?;
    let input = open_input(src.as_ref())?;
    let channel = BitChannel::open(dst, Mode::Write)?;
    compress(input, channel)
}

pub fn decompress_file<P: AsRef<Path>, Q: AsRef<Path>>(src: P, dst: Q) -> Result<Summary> {
    ensure_distinct(src.as_ref(), dst.as_ref())?;
    let channel = BitChannel::open(src, Mode::Read)?;
    decompress(channel, create_output(dst.as_ref())?)
}

pub fn open_input(path: &Path) -> Result<File> {
    File::open(path).map_err(|source| HuffError::Open {
        path: path.to_path_buf(),
        source,
    })
}

pub fn create_output(path: &Path) -> Result<File> {
    File::create(path).map_err(|source| HuffError::Open {
        path: path.to_path_buf(),
        source,
    })
}
