//! SM-LZ decoder implementation
//!
//! Single pass over the compressed stream. Every command appends to the output
//! vector; back-reference commands read from that same vector by index while
//! it grows, which is what makes overlapping copies expand runs.

use crate::{Command, DEFAULT_MAX_OUTPUT, EXTENDED_COMMAND, LzError, TERMINATOR};

/// Decoder settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Maximum number of decompressed bytes, `None` for no ceiling
    pub max_output: Option<usize>,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            max_output: Some(DEFAULT_MAX_OUTPUT),
        }
    }
}

impl DecodeOptions {
    /// No output ceiling: a stream without terminator only stops at the end
    /// of the input.
    pub fn unbounded() -> Self {
        Self { max_output: None }
    }

    pub fn with_max_output(max_output: usize) -> Self {
        Self {
            max_output: Some(max_output),
        }
    }
}

/// Result of a decode: the data plus how much of the input it occupied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    pub data: Vec<u8>,
    /// Compressed size in bytes, terminator included
    pub consumed: usize,
}

/// Cursor over the compressed input
struct Stream<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Stream<'a> {
    fn byte(&mut self) -> Result<u8, LzError> {
        let byte = *self
            .input
            .get(self.pos)
            .ok_or(LzError::UnexpectedEnd { offset: self.pos })?;
        self.pos += 1;
        Ok(byte)
    }

    fn bytes(&mut self, len: usize) -> Result<&'a [u8], LzError> {
        let end = self.pos + len;
        let bytes = self.input.get(self.pos..end).ok_or(LzError::UnexpectedEnd {
            offset: self.input.len(),
        })?;
        self.pos = end;
        Ok(bytes)
    }

    fn word(&mut self) -> Result<u16, LzError> {
        let lo = self.byte()?;
        let hi = self.byte()?;
        Ok(u16::from_le_bytes([lo, hi]))
    }
}

/// Decompress a stream with the default options
///
/// # Arguments
/// * `input` - Compressed data, starting at the first control byte. Trailing
///   bytes after the terminator are ignored.
///
/// # Errors
/// Returns `LzError` if the stream is truncated, references output that does
/// not exist, or grows past [`DEFAULT_MAX_OUTPUT`](crate::DEFAULT_MAX_OUTPUT).
pub fn decompress(input: &[u8]) -> Result<Vec<u8>, LzError> {
    decompress_with(input, &DecodeOptions::default()).map(|decoded| decoded.data)
}

/// Decompress a stream with explicit options
///
/// Also reports how many input bytes the stream occupied.
pub fn decompress_with(input: &[u8], options: &DecodeOptions) -> Result<Decoded, LzError> {
    let mut stream = Stream { input, pos: 0 };
    let mut output: Vec<u8> = Vec::new();

    loop {
        let control = stream.byte()?;
        if control == TERMINATOR {
            break;
        }

        let (command, size) = if control >> 5 == EXTENDED_COMMAND {
            let low = stream.byte()?;
            let size = ((usize::from(control & 0x03) << 8) | usize::from(low)) + 1;
            (Command::from_bits(control >> 2), size)
        } else {
            (Command::from_bits(control >> 5), usize::from(control & 0x1F) + 1)
        };

        if let Some(limit) = options
            .max_output
            .filter(|&limit| output.len() + size > limit)
        {
            return Err(LzError::OutputLimit { limit });
        }

        match command {
            Command::DirectCopy => {
                output.extend_from_slice(stream.bytes(size)?);
            }
            Command::ByteFill => {
                let value = stream.byte()?;
                output.resize(output.len() + size, value);
            }
            Command::WordFill => {
                let first = stream.byte()?;
                let second = stream.byte()?;
                for _ in 0..size / 2 {
                    output.push(first);
                    output.push(second);
                }
                if size & 1 != 0 {
                    output.push(first);
                }
            }
            Command::Increment => {
                let start = stream.byte()?;
                output.extend((0..size).map(|i| start.wrapping_add(i as u8)));
            }
            Command::Copy | Command::XorCopy => {
                let offset = usize::from(stream.word()?);
                copy_from_output(&mut output, offset, size, command.xor_mask())?;
            }
            Command::RelativeCopy | Command::RelativeXorCopy => {
                let distance = usize::from(stream.byte()?);
                // Relative to the length before this command writes anything
                let offset = output
                    .len()
                    .checked_sub(distance)
                    .ok_or(LzError::InvalidBackReference {
                        offset: 0,
                        len: output.len(),
                    })?;
                copy_from_output(&mut output, offset, size, command.xor_mask())?;
            }
        }
    }

    Ok(Decoded {
        data: output,
        consumed: stream.pos,
    })
}

/// Append `size` bytes read from `output[offset..]`, one at a time
///
/// The source index may run into bytes appended by this same call.
fn copy_from_output(
    output: &mut Vec<u8>,
    offset: usize,
    size: usize,
    mask: u8,
) -> Result<(), LzError> {
    for index in offset..offset + size {
        let byte = *output.get(index).ok_or(LzError::InvalidBackReference {
            offset: index,
            len: output.len(),
        })?;
        output.push(byte ^ mask);
    }
    Ok(())
}
