//! SM-LZ encoder implementation
//!
//! Greedy reference compressor. At each position it measures the longest run
//! every command can produce and takes the one that saves the most bytes;
//! positions where nothing pays off are collected into direct copies.
//!
//! Only commands 0-4 and 6 are emitted. Control bytes are at most `0xFB`, so
//! the encoder can never produce a premature terminator.

use crate::{Command, EXTENDED_COMMAND, MAX_LEN, MAX_SHORT_LEN, TERMINATOR};

/// How far back the back-reference search looks
const SEARCH_WINDOW: usize = 0x800;

/// A candidate command with its operand bytes
#[derive(Debug, Clone, Copy)]
struct Run {
    command: Command,
    len: usize,
    operand: [u8; 2],
    operand_len: usize,
}

impl Run {
    fn new(command: Command, len: usize, operand: &[u8]) -> Self {
        let mut bytes = [0u8; 2];
        bytes[..operand.len()].copy_from_slice(operand);
        Self {
            command,
            len,
            operand: bytes,
            operand_len: operand.len(),
        }
    }

    /// Bytes saved compared to storing the run verbatim
    fn savings(&self) -> isize {
        self.len as isize - (header_len(self.len) + self.operand_len) as isize
    }
}

fn header_len(len: usize) -> usize {
    if len <= MAX_SHORT_LEN { 1 } else { 2 }
}

/// Write the control byte(s) for `command` with run length `len` (1..=1024)
fn write_header(output: &mut Vec<u8>, command: Command, len: usize) {
    debug_assert!((1..=MAX_LEN).contains(&len));
    let stored = len - 1;
    if len <= MAX_SHORT_LEN {
        output.push((command.bits() << 5) | stored as u8);
    } else {
        output.push((EXTENDED_COMMAND << 5) | (command.bits() << 2) | (stored >> 8) as u8);
        output.push((stored & 0xFF) as u8);
    }
}

/// Emit pending literal bytes as direct copies
fn write_literals(output: &mut Vec<u8>, literals: &[u8]) {
    for chunk in literals.chunks(MAX_LEN) {
        write_header(output, Command::DirectCopy, chunk.len());
        output.extend_from_slice(chunk);
    }
}

/// Length of the prefix of `data[pos..]` matching `expected(i)`
fn run_len(data: &[u8], pos: usize, expected: impl Fn(usize) -> u8) -> usize {
    data[pos..]
        .iter()
        .take(MAX_LEN)
        .enumerate()
        .take_while(|&(i, &byte)| byte == expected(i))
        .count()
}

/// Longest match for `data[pos..]` starting at an earlier position
///
/// Matches may overlap `pos`, which the decoder reproduces because it copies
/// byte by byte.
fn longest_match(data: &[u8], pos: usize) -> Option<(usize, usize)> {
    let start = pos.saturating_sub(SEARCH_WINDOW);
    let mut best: Option<(usize, usize)> = None;

    for source in start..pos {
        let len = run_len(data, pos, |i| data[source + i]);
        if len > best.map_or(0, |(_, best_len)| best_len) {
            best = Some((source, len));
            if len == MAX_LEN {
                break;
            }
        }
    }

    best
}

/// Best command for the data at `pos`, if any beats a direct copy
fn best_run(data: &[u8], pos: usize) -> Option<Run> {
    let first = data[pos];
    let mut candidates = Vec::with_capacity(4);

    candidates.push(Run::new(
        Command::ByteFill,
        run_len(data, pos, |_| first),
        &[first],
    ));

    candidates.push(Run::new(
        Command::Increment,
        run_len(data, pos, |i| first.wrapping_add(i as u8)),
        &[first],
    ));

    if let Some(&second) = data.get(pos + 1) {
        candidates.push(Run::new(
            Command::WordFill,
            run_len(data, pos, |i| if i % 2 == 0 { first } else { second }),
            &[first, second],
        ));
    }

    if let Some((source, len)) = longest_match(data, pos) {
        let distance = pos - source;
        if distance <= usize::from(u8::MAX) {
            candidates.push(Run::new(Command::RelativeCopy, len, &[distance as u8]));
        } else if let Ok(offset) = u16::try_from(source) {
            candidates.push(Run::new(Command::Copy, len, &offset.to_le_bytes()));
        }
    }

    candidates
        .into_iter()
        .filter(|run| run.savings() > 0)
        .max_by_key(|run| run.savings())
}

/// Compress bytes into an SM-LZ stream (terminator included)
///
/// # Arguments
/// * `data` - Raw bytes, e.g. a 4bpp tile sheet
///
/// # Returns
/// Compressed stream that [`decompress`](crate::decompress) turns back into
/// `data`
pub fn compress(data: &[u8]) -> Vec<u8> {
    let mut output = Vec::with_capacity(data.len() / 2 + 1);
    let mut literal_start = 0;
    let mut pos = 0;

    while pos < data.len() {
        match best_run(data, pos) {
            Some(run) => {
                write_literals(&mut output, &data[literal_start..pos]);
                write_header(&mut output, run.command, run.len);
                output.extend_from_slice(&run.operand[..run.operand_len]);
                pos += run.len;
                literal_start = pos;
            }
            None => pos += 1,
        }
    }

    write_literals(&mut output, &data[literal_start..]);
    output.push(TERMINATOR);
    output
}
