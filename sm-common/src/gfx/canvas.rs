//! Sparse canvas and sprite compositor
//!
//! Sprites are drawn around an origin, so coordinates are signed and the
//! canvas only stores opaque pixels. Each pixel holds `row * 16 + index`,
//! i.e. an index into the full sprite palette.

use hashbrown::HashMap;

use super::palette::COLORS_PER_ROW;
use super::tile::{TilePixels, decode_tile};

/// A tile to draw, already resolved against the loaded sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Placement {
    pub x: i32,
    pub y: i32,
    /// 16x16: tiles `tile`, `tile+1`, `tile+16`, `tile+17`
    pub big: bool,
    /// Index into the sheet; negative or past the end draws nothing
    pub tile: i32,
    pub palette: u8,
    pub priority: u8,
    pub h_flip: bool,
    pub v_flip: bool,
}

/// Sparse `(x, y) -> palette index` map; index 0 is never stored
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Canvas {
    pixels: HashMap<(i32, i32), u8>,
}

impl Canvas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, x: i32, y: i32) -> Option<u8> {
        self.pixels.get(&(x, y)).copied()
    }

    /// Store an opaque pixel (0 is ignored)
    pub fn plot(&mut self, x: i32, y: i32, value: u8) {
        if value != 0 {
            self.pixels.insert((x, y), value);
        }
    }

    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = ((i32, i32), u8)> + '_ {
        self.pixels.iter().map(|(&point, &value)| (point, value))
    }

    /// Half extents of the smallest origin-centred box holding every pixel
    ///
    /// `(max(|min_x|, |max_x + 1|), max(|min_y|, |max_y + 1|))`, or `(0, 0)`
    /// when nothing was drawn.
    pub fn bounding_box(&self) -> (u32, u32) {
        let mut keys = self.pixels.keys();
        let Some(&(x0, y0)) = keys.next() else {
            return (0, 0);
        };
        let (mut min_x, mut max_x, mut min_y, mut max_y) = (x0, x0, y0, y0);
        for &(x, y) in keys {
            min_x = min_x.min(x);
            max_x = max_x.max(x);
            min_y = min_y.min(y);
            max_y = max_y.max(y);
        }
        (
            min_x.unsigned_abs().max((max_x + 1).unsigned_abs()),
            min_y.unsigned_abs().max((max_y + 1).unsigned_abs()),
        )
    }

    /// Row-major pixels of the rectangle `[left, right) x [top, bottom)`
    ///
    /// Undrawn pixels are 0. An inverted rectangle yields an empty buffer.
    pub fn crop(&self, left: i32, top: i32, right: i32, bottom: i32) -> Vec<u8> {
        let width = (right - left).max(0) as usize;
        let height = (bottom - top).max(0) as usize;
        let mut out = vec![0u8; width * height];
        for (&(x, y), &value) in &self.pixels {
            if (left..right).contains(&x) && (top..bottom).contains(&y) {
                out[(y - top) as usize * width + (x - left) as usize] = value;
            }
        }
        out
    }
}

/// Draw placements onto a canvas
///
/// Placements are drawn last to first, so an earlier entry ends up on top of
/// a later one. With `priority_filter`, drawing stops at the first entry
/// (in that reverse order) whose priority differs.
pub fn compose(
    canvas: &mut Canvas,
    placements: &[Placement],
    sheet: &[u8],
    priority_filter: Option<u8>,
) {
    for placement in placements.iter().rev() {
        if priority_filter.is_some_and(|priority| priority != placement.priority) {
            break;
        }

        if placement.big {
            let (left, right) = if placement.h_flip { (8, 0) } else { (0, 8) };
            let (top, bottom) = if placement.v_flip { (8, 0) } else { (0, 8) };
            for (dx, dy, offset) in [
                (left, top, 0x00),
                (right, top, 0x01),
                (left, bottom, 0x10),
                (right, bottom, 0x11),
            ] {
                draw_tile(
                    canvas,
                    placement,
                    (placement.x + dx, placement.y + dy),
                    placement.tile + offset,
                    sheet,
                );
            }
        } else {
            draw_tile(
                canvas,
                placement,
                (placement.x, placement.y),
                placement.tile,
                sheet,
            );
        }
    }
}

fn draw_tile(
    canvas: &mut Canvas,
    placement: &Placement,
    (x, y): (i32, i32),
    index: i32,
    sheet: &[u8],
) {
    let Some(pixels) = usize::try_from(index)
        .ok()
        .and_then(|index| decode_tile(sheet, index))
    else {
        return;
    };
    let pixels = flip(pixels, placement.h_flip, placement.v_flip);
    let base = (placement.palette as usize * COLORS_PER_ROW) as u8;

    for (row, line) in pixels.iter().enumerate() {
        for (col, &value) in line.iter().enumerate() {
            if value != 0 {
                canvas.plot(x + col as i32, y + row as i32, base.wrapping_add(value));
            }
        }
    }
}

fn flip(mut pixels: TilePixels, h_flip: bool, v_flip: bool) -> TilePixels {
    if h_flip {
        for line in pixels.iter_mut() {
            line.reverse();
        }
    }
    if v_flip {
        pixels.reverse();
    }
    pixels
}
