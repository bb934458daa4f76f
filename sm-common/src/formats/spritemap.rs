//! Spritemaps: ordered lists of OAM tile placements
//!
//! Entry layout (5 bytes):
//! ```text
//! b0: XXXX_XXXX   x, low 8 bits
//! b1: S--- ---X   S = 16x16 tile, X = x bit 8 (sign)
//! b2: YYYY_YYYY   y, signed
//! b3: TTTT_TTTT   tile, low 8 bits
//! b4: VHPP_CCCT   V/H = flips, P = priority, C = palette row, T = tile bit 8
//! ```

use serde::{Deserialize, Serialize};

use crate::gfx::Placement;

/// OAM holds at most 128 sprites, so a longer table is not a spritemap
pub const SPRITEMAP_MAX_ENTRIES: usize = 128;

/// One tile placement inside a spritemap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SpriteTileEntry {
    /// Horizontal offset, 9-bit signed (-256..=255)
    pub x: i16,
    pub y: i8,
    /// 16x16 (four tiles) instead of 8x8
    pub big: bool,
    /// Tile number, 9 bits
    pub tile: u16,
    /// Palette row, 3 bits
    pub palette: u8,
    pub bg_priority: u8,
    pub h_flip: bool,
    pub v_flip: bool,
}

impl SpriteTileEntry {
    pub const SIZE: usize = 5;

    /// Decode one entry, `None` if fewer than 5 bytes
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let &[b0, b1, b2, b3, b4] = bytes.get(..Self::SIZE)? else {
            return None;
        };
        let x = if b1 & 0x01 != 0 {
            i16::from(b0) - 0x100
        } else {
            i16::from(b0)
        };
        Some(Self {
            x,
            y: b2 as i8,
            big: b1 & 0x80 != 0,
            tile: u16::from(b3) | (u16::from(b4 & 0x01) << 8),
            palette: (b4 >> 1) & 0x07,
            bg_priority: (b4 >> 4) & 0x03,
            h_flip: b4 & 0x40 != 0,
            v_flip: b4 & 0x80 != 0,
        })
    }

    /// Encode to the 5-byte wire form (fields are masked to their widths)
    pub fn to_bytes(&self) -> [u8; 5] {
        let x = self.x as u16;
        [
            (x & 0xFF) as u8,
            ((x >> 8) & 0x01) as u8 | if self.big { 0x80 } else { 0 },
            self.y as u8,
            (self.tile & 0xFF) as u8,
            ((self.tile >> 8) & 0x01) as u8
                | ((self.palette & 0x07) << 1)
                | ((self.bg_priority & 0x03) << 4)
                | if self.h_flip { 0x40 } else { 0 }
                | if self.v_flip { 0x80 } else { 0 },
        ]
    }

    /// Placement on a canvas
    ///
    /// `gfx_offset` is the tile number of the first tile in the loaded sheet;
    /// `(dx, dy)` shifts the entry (extended spritemap link offset).
    pub fn placement(&self, gfx_offset: u16, dx: i32, dy: i32) -> Placement {
        Placement {
            x: i32::from(self.x) + dx,
            y: i32::from(self.y) + dy,
            big: self.big,
            tile: i32::from(self.tile) - i32::from(gfx_offset),
            palette: self.palette,
            priority: self.bg_priority,
            h_flip: self.h_flip,
            v_flip: self.v_flip,
        }
    }
}

/// A named spritemap
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Spritemap {
    pub name: String,
    #[serde(rename = "spritemap")]
    pub entries: Vec<SpriteTileEntry>,
}

impl Spritemap {
    /// Bytes occupied in the ROM (count word plus entries)
    pub fn encoded_len(&self) -> usize {
        2 + self.entries.len() * SpriteTileEntry::SIZE
    }
}
