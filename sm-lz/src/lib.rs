//! SM-LZ: the LZ-style compression format used by Super Metroid graphics
//!
//! **This is a pure codec** - it works on byte slices only. Address
//! translation (LoROM bank mapping, copier headers) is handled by the caller
//! (sm-common's `RomAccessor`), which hands over the ROM tail starting at the
//! physical offset of the compressed block. LoROM banks are contiguous in
//! physical space, so reading linearly from there follows the stream across
//! bank boundaries.
//!
//! # Stream Format
//!
//! ```text
//! Control byte:
//!   0xFF            end of stream
//!   CCCL_LLLL       command C (0-6), length L+1 (1-32)
//!   111C_CCLL LLLL_LLLL
//!                   command C (0-7), length L+1 (1-1024)
//! ```
//!
//! | Command | Operand | Output |
//! |---------|---------|--------|
//! | 0 | `size` bytes | copied verbatim |
//! | 1 | byte `b` | `b` repeated `size` times |
//! | 2 | bytes `b0 b1` | `b0 b1` repeated, odd sizes end with `b0` |
//! | 3 | byte `b` | `b, b+1, b+2, ...` (wrapping) |
//! | 4 | u16 LE offset | copy from `output[offset..]` |
//! | 5 | u16 LE offset | as 4, each byte XOR 0xFF |
//! | 6 | byte `d` | copy from `output[len - d..]` |
//! | 7 | byte `d` | as 6, each byte XOR 0xFF |
//!
//! Back-references index the output built so far and are copied one byte at
//! a time, so a copy may read bytes it has just written (run-length expansion).
//!
//! # Usage
//!
//! ```
//! use sm_lz::{compress, decompress};
//!
//! let tiles = vec![0u8; 0x800];
//! let packed = compress(&tiles);
//! assert!(packed.len() < tiles.len());
//!
//! let unpacked = decompress(&packed).unwrap();
//! assert_eq!(unpacked, tiles);
//! ```

mod decode;
mod encode;
mod error;

pub use decode::{DecodeOptions, Decoded, decompress, decompress_with};
pub use encode::compress;
pub use error::LzError;

// =============================================================================
// Constants
// =============================================================================

/// Control byte that ends a compressed stream
pub const TERMINATOR: u8 = 0xFF;

/// Command number that marks the two-byte (extended length) control form
pub const EXTENDED_COMMAND: u8 = 7;

/// Longest run expressible with a single control byte
pub const MAX_SHORT_LEN: usize = 32;

/// Longest run expressible with the extended control form
pub const MAX_LEN: usize = 1024;

/// Default ceiling on decompressed output (1 MiB)
///
/// Real blocks are a few KiB; the ceiling only exists so a stream without a
/// terminator fails instead of growing until memory runs out.
pub const DEFAULT_MAX_OUTPUT: usize = 0x10_0000;

/// Compression commands (the 3-bit command field)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    DirectCopy,
    ByteFill,
    WordFill,
    Increment,
    Copy,
    XorCopy,
    RelativeCopy,
    RelativeXorCopy,
}

impl Command {
    /// Decode the 3-bit command field (higher bits are ignored)
    pub fn from_bits(bits: u8) -> Self {
        match bits & 7 {
            0 => Command::DirectCopy,
            1 => Command::ByteFill,
            2 => Command::WordFill,
            3 => Command::Increment,
            4 => Command::Copy,
            5 => Command::XorCopy,
            6 => Command::RelativeCopy,
            _ => Command::RelativeXorCopy,
        }
    }

    /// The 3-bit command field
    pub fn bits(self) -> u8 {
        self as u8
    }

    /// Mask applied to every byte copied by a back-reference command
    pub(crate) fn xor_mask(self) -> u8 {
        match self {
            Command::XorCopy | Command::RelativeXorCopy => 0xFF,
            _ => 0x00,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
