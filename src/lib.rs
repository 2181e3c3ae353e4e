//! # huffzip
//!
//! Static Huffman file compression with a self-describing, bit-exact format.
//!
//! ```no_run
//! use huffzip::codec;
//!
//! let summary = codec::compress_file("book.txt", "book.hz")?;
//! println!("{} bytes -> {} bytes", summary.symbols, summary.compressed_bytes);
//! codec::decompress_file("book.hz", "book.out")?;
//! # Ok::<(), huffzip::HuffError>(())
//! ```

pub mod bit_channel;
pub mod code_table;
pub mod code_tree;
pub mod codec;
pub mod error;
pub mod frequency;

#[cfg(test)]
mod test_util;

pub use bit_channel::{BitChannel, Mode};
pub use code_table::{Code, CodeTable};
pub use code_tree::{CodeNode, CodeTree};
pub use codec::{compress, compress_file, decompress, decompress_file, Summary};
pub use error::{HuffError, Result};
pub use frequency::FrequencyTable;
