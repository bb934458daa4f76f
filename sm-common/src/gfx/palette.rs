//! SNES palettes: 15-bit BGR colors, 16 per row

/// Colors in one palette row
pub const COLORS_PER_ROW: usize = 16;

/// Sprite palette rows available to OAM
pub const DISPLAY_ROWS: usize = 8;

/// Filler for rows and entries nothing was loaded into
pub const OPAQUE_BLACK: u32 = 0xFF00_0000;

/// Display value of index 0 in every row
pub const TRANSPARENT: u32 = 0x0000_0000;

/// Expand a `0bbbbbgg_gggrrrrr` color to `0xFFRRGGBB`
pub fn bgr555_to_argb(color: u16) -> u32 {
    let r = u32::from(color & 0x1F) << 3;
    let g = u32::from((color >> 5) & 0x1F) << 3;
    let b = u32::from((color >> 10) & 0x1F) << 3;
    0xFF00_0000 | (r << 16) | (g << 8) | b
}

/// Reduce `0xAARRGGBB` to 15-bit BGR (alpha and low channel bits are dropped)
pub fn argb_to_bgr555(color: u32) -> u16 {
    let r = ((color >> 16) & 0xFF) >> 3;
    let g = ((color >> 8) & 0xFF) >> 3;
    let b = (color & 0xFF) >> 3;
    (r | (g << 5) | (b << 10)) as u16
}

pub fn decode_palette(words: &[u16]) -> Vec<u32> {
    words.iter().map(|&word| bgr555_to_argb(word)).collect()
}

/// Palette as little-endian 15-bit words, the layout of a `.pal` file
pub fn encode_palette(colors: &[u32]) -> Vec<u8> {
    colors
        .iter()
        .flat_map(|&color| argb_to_bgr555(color).to_le_bytes())
        .collect()
}

/// Pad with opaque black up to a whole number of rows
pub fn pad_to_rows(colors: &mut Vec<u32>) {
    let padded = colors.len().div_ceil(COLORS_PER_ROW) * COLORS_PER_ROW;
    colors.resize(padded, OPAQUE_BLACK);
}

/// Palette for displaying sprites
///
/// At least [`DISPLAY_ROWS`] rows. `colors` is loaded starting at row
/// `row_offset`, the rest is opaque black, and entry 0 of every row is
/// transparent.
pub fn display_palette(colors: &[u32], row_offset: u8) -> Vec<u32> {
    let start = usize::from(row_offset) * COLORS_PER_ROW;
    let rows = DISPLAY_ROWS.max((start + colors.len()).div_ceil(COLORS_PER_ROW));

    let mut table = vec![OPAQUE_BLACK; rows * COLORS_PER_ROW];
    table[start..start + colors.len()].copy_from_slice(colors);
    for row in table.chunks_exact_mut(COLORS_PER_ROW) {
        row[0] = TRANSPARENT;
    }
    table
}
