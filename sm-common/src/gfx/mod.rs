//! Sprite graphics: 4bpp tiles, palettes and the sprite compositor

mod canvas;
pub mod palette;
mod raster;
mod tile;

pub use canvas::{Canvas, Placement, compose};
pub use palette::{
    COLORS_PER_ROW, DISPLAY_ROWS, argb_to_bgr555, bgr555_to_argb, decode_palette,
    display_palette, encode_palette,
};
pub use raster::{PixelData, RasterImage};
pub use tile::{
    TILE_BYTES, TILE_SIZE, TileError, TilePixels, decode_tile, decode_tiles, encode_image,
    indexed_to_planar, planar_to_indexed, sheet_image,
};
