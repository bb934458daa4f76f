//! SNES 4bpp planar tile codec
//!
//! A tile is 8x8 pixels in 32 bytes. Bitplanes 0 and 1 are interleaved per
//! row in the first 16 bytes, bitplanes 2 and 3 in the last 16:
//!
//! ```text
//! byte 2r, 2r+1       row r, planes 0/1
//! byte 16+2r, 17+2r   row r, planes 2/3
//! ```
//!
//! Bit 7 of a plane byte is the leftmost pixel.

use thiserror::Error;

use super::raster::{PixelData, RasterImage};

/// Pixels along one side of a tile
pub const TILE_SIZE: usize = 8;

/// Encoded size of one 4bpp tile
pub const TILE_BYTES: usize = 32;

/// One decoded tile, `pixels[row][col]`, values 0..=15
pub type TilePixels = [[u8; TILE_SIZE]; TILE_SIZE];

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TileError {
    #[error("Image must use indexed color (found {found})")]
    FormatMismatch { found: &'static str },

    #[error("Image is {width}x{height} but holds {len} pixels")]
    SizeMismatch { width: u32, height: u32, len: usize },
}

/// Decode one 32-byte planar tile into palette indices
pub fn planar_to_indexed(raw: &[u8; TILE_BYTES]) -> TilePixels {
    let mut pixels = [[0u8; TILE_SIZE]; TILE_SIZE];
    for (row, line) in pixels.iter_mut().enumerate() {
        let planes = [
            raw[row * 2],
            raw[row * 2 + 1],
            raw[16 + row * 2],
            raw[17 + row * 2],
        ];
        for (col, pixel) in line.iter_mut().enumerate() {
            let bit = 7 - col;
            *pixel = planes
                .iter()
                .enumerate()
                .fold(0, |acc, (plane, &byte)| acc | (((byte >> bit) & 1) << plane));
        }
    }
    pixels
}

/// Encode palette indices into a 32-byte planar tile (values are masked to 4 bits)
pub fn indexed_to_planar(pixels: &TilePixels) -> [u8; TILE_BYTES] {
    let mut raw = [0u8; TILE_BYTES];
    for (row, line) in pixels.iter().enumerate() {
        for (col, &pixel) in line.iter().enumerate() {
            let bit = 7 - col;
            let value = pixel & 0x0F;
            raw[row * 2] |= (value & 1) << bit;
            raw[row * 2 + 1] |= ((value >> 1) & 1) << bit;
            raw[16 + row * 2] |= ((value >> 2) & 1) << bit;
            raw[17 + row * 2] |= ((value >> 3) & 1) << bit;
        }
    }
    raw
}

/// Decode tile `index` of a sheet, `None` if the sheet has no complete tile there
pub fn decode_tile(sheet: &[u8], index: usize) -> Option<TilePixels> {
    let start = index.checked_mul(TILE_BYTES)?;
    let end = start.checked_add(TILE_BYTES)?;
    let raw: &[u8; TILE_BYTES] = sheet.get(start..end)?.try_into().ok()?;
    Some(planar_to_indexed(raw))
}

/// Decode every complete tile of a sheet (a trailing partial tile is ignored)
pub fn decode_tiles(sheet: &[u8]) -> Vec<TilePixels> {
    sheet
        .chunks_exact(TILE_BYTES)
        .map(|chunk| {
            let mut raw = [0u8; TILE_BYTES];
            raw.copy_from_slice(chunk);
            planar_to_indexed(&raw)
        })
        .collect()
}

/// Convert an indexed image to a tile sheet
///
/// The image is cut into 8x8 blocks in raster order. Blocks hanging over the
/// right or bottom edge are padded with index 0.
///
/// # Errors
/// `TileError::FormatMismatch` for direct-color images, checked before any
/// conversion happens.
pub fn encode_image(image: &RasterImage) -> Result<Vec<u8>, TileError> {
    let pixels = match &image.data {
        PixelData::Indexed { pixels, .. } => pixels,
        PixelData::Direct { .. } => {
            return Err(TileError::FormatMismatch {
                found: image.format_name(),
            });
        }
    };

    let width = image.width as usize;
    let height = image.height as usize;
    if pixels.len() != width * height {
        return Err(TileError::SizeMismatch {
            width: image.width,
            height: image.height,
            len: pixels.len(),
        });
    }

    let tiles_x = width.div_ceil(TILE_SIZE);
    let tiles_y = height.div_ceil(TILE_SIZE);
    let mut sheet = Vec::with_capacity(tiles_x * tiles_y * TILE_BYTES);

    for tile_y in 0..tiles_y {
        for tile_x in 0..tiles_x {
            let mut tile = [[0u8; TILE_SIZE]; TILE_SIZE];
            for (row, line) in tile.iter_mut().enumerate() {
                let y = tile_y * TILE_SIZE + row;
                if y >= height {
                    break;
                }
                for (col, pixel) in line.iter_mut().enumerate() {
                    let x = tile_x * TILE_SIZE + col;
                    if x < width {
                        *pixel = pixels[y * width + x];
                    }
                }
            }
            sheet.extend_from_slice(&indexed_to_planar(&tile));
        }
    }

    Ok(sheet)
}

/// Lay a tile sheet out as an indexed image, `tiles_per_row` tiles wide
///
/// Pixels use palette row 0; the palette is attached as given.
pub fn sheet_image(sheet: &[u8], tiles_per_row: usize, palette: Vec<u32>) -> RasterImage {
    let tiles = decode_tiles(sheet);
    let tiles_per_row = tiles_per_row.max(1);
    let rows = tiles.len().div_ceil(tiles_per_row);
    let width = tiles_per_row * TILE_SIZE;
    let height = rows * TILE_SIZE;

    let mut pixels = vec![0u8; width * height];
    for (index, tile) in tiles.iter().enumerate() {
        let origin_x = (index % tiles_per_row) * TILE_SIZE;
        let origin_y = (index / tiles_per_row) * TILE_SIZE;
        for (row, line) in tile.iter().enumerate() {
            let start = (origin_y + row) * width + origin_x;
            pixels[start..start + TILE_SIZE].copy_from_slice(line);
        }
    }

    RasterImage::indexed(width as u32, height as u32, pixels, palette)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient_tile() -> TilePixels {
        let mut tile = [[0u8; TILE_SIZE]; TILE_SIZE];
        for (row, line) in tile.iter_mut().enumerate() {
            for (col, pixel) in line.iter_mut().enumerate() {
                *pixel = ((row * 8 + col) % 16) as u8;
            }
        }
        tile
    }

    #[test]
    fn test_single_plane_bits() {
        let mut raw = [0u8; TILE_BYTES];
        raw[0] = 0x80; // row 0, plane 0, leftmost
        raw[3] = 0x01; // row 1, plane 1, rightmost
        raw[16 + 4] = 0x40; // row 2, plane 2, second pixel
        raw[17 + 14] = 0x80; // row 7, plane 3, leftmost

        let pixels = planar_to_indexed(&raw);
        assert_eq!(pixels[0][0], 1);
        assert_eq!(pixels[1][7], 2);
        assert_eq!(pixels[2][1], 4);
        assert_eq!(pixels[7][0], 8);
        assert_eq!(pixels.iter().flatten().filter(|&&p| p != 0).count(), 4);
    }

    #[test]
    fn test_all_planes_set() {
        let pixels = planar_to_indexed(&[0xFF; TILE_BYTES]);
        assert!(pixels.iter().flatten().all(|&p| p == 15));
    }

    #[test]
    fn test_codec_inverse_both_ways() {
        let tile = gradient_tile();
        assert_eq!(planar_to_indexed(&indexed_to_planar(&tile)), tile);

        let mut raw = [0u8; TILE_BYTES];
        for (i, byte) in raw.iter_mut().enumerate() {
            *byte = (i as u8).wrapping_mul(37) ^ 0x5A;
        }
        assert_eq!(indexed_to_planar(&planar_to_indexed(&raw)), raw);
    }

    #[test]
    fn test_encode_masks_high_bits() {
        let tile = [[0x13u8; TILE_SIZE]; TILE_SIZE];
        let decoded = planar_to_indexed(&indexed_to_planar(&tile));
        assert!(decoded.iter().flatten().all(|&p| p == 3));
    }

    #[test]
    fn test_decode_tiles_ignores_partial_tile() {
        let mut sheet = vec![0u8; TILE_BYTES * 2 + 5];
        sheet[TILE_BYTES] = 0xFF;
        let tiles = decode_tiles(&sheet);
        assert_eq!(tiles.len(), 2);
        assert_eq!(tiles[1][0], [1; 8]);
        assert!(decode_tile(&sheet, 1).is_some());
        assert!(decode_tile(&sheet, 2).is_none());
        assert!(decode_tile(&sheet, usize::MAX).is_none());
    }

    #[test]
    fn test_encode_image_raster_order() {
        // 16x8 image: left tile all 1, right tile all 2
        let mut pixels = vec![0u8; 16 * 8];
        for (i, pixel) in pixels.iter_mut().enumerate() {
            *pixel = if i % 16 < 8 { 1 } else { 2 };
        }
        let image = RasterImage::indexed(16, 8, pixels, Vec::new());
        let sheet = encode_image(&image).unwrap();
        assert_eq!(sheet.len(), 2 * TILE_BYTES);

        let tiles = decode_tiles(&sheet);
        assert!(tiles[0].iter().flatten().all(|&p| p == 1));
        assert!(tiles[1].iter().flatten().all(|&p| p == 2));
    }

    #[test]
    fn test_encode_image_pads_partial_blocks() {
        let image = RasterImage::indexed(10, 3, vec![5; 30], Vec::new());
        let sheet = encode_image(&image).unwrap();
        assert_eq!(sheet.len(), 2 * TILE_BYTES);

        let tiles = decode_tiles(&sheet);
        assert_eq!(tiles[0][2], [5; 8]);
        assert_eq!(tiles[0][3], [0; 8]);
        assert_eq!(tiles[1][0], [5, 5, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_encode_rejects_direct_color() {
        let image = RasterImage {
            width: 8,
            height: 8,
            data: PixelData::Direct {
                channels: 4,
                samples: vec![0; 8 * 8 * 4],
            },
        };
        assert_eq!(
            encode_image(&image),
            Err(TileError::FormatMismatch { found: "RGBA" })
        );
    }

    #[test]
    fn test_encode_rejects_wrong_pixel_count() {
        let image = RasterImage::indexed(8, 8, vec![0; 10], Vec::new());
        assert!(matches!(
            encode_image(&image),
            Err(TileError::SizeMismatch { len: 10, .. })
        ));
    }

    #[test]
    fn test_sheet_image_layout() {
        let mut sheet = indexed_to_planar(&[[1; 8]; 8]).to_vec();
        sheet.extend_from_slice(&indexed_to_planar(&[[2; 8]; 8]));
        sheet.extend_from_slice(&indexed_to_planar(&[[3; 8]; 8]));

        let image = sheet_image(&sheet, 2, vec![0; 16]);
        assert_eq!((image.width, image.height), (16, 16));
        assert_eq!(image.index_at(0, 0), Some(1));
        assert_eq!(image.index_at(8, 7), Some(2));
        assert_eq!(image.index_at(0, 8), Some(3));
        assert_eq!(image.index_at(8, 8), Some(0));

        // And back again
        let reencoded = encode_image(&image).unwrap();
        assert_eq!(&reencoded[..sheet.len()], &sheet[..]);
    }
}
