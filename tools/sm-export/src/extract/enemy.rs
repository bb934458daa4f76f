//! Enemy sprite sets located through the enemy header table

use sm_common::{ExtractionResult, RomAccessor};
use sm_lz::DecodeOptions;

use super::{ExtractError, GenericParams, Tables, extract_generic};

/// Bank holding the enemy headers; an enemy id is the offset into it
pub const ENEMY_HEADER_BANK: u32 = 0xA0_0000;

/// Enemy tiles are loaded at tile $100 in sprite VRAM
pub const ENEMY_GFX_OFFSET: u16 = 0x100;

// Header field offsets
const TILE_DATA_SIZE: u32 = 0x00;
const PALETTE: u32 = 0x02;
const PALETTE_BANK: u32 = 0x0C;
const TILE_DATA: u32 = 0x36;

/// Extract an enemy's sprite set
///
/// Graphics size, palette and tile data address come from the header at
/// `$A0:id`; the graphics are uncompressed and the single palette row is
/// loaded at row 0.
pub fn extract_enemy<R: RomAccessor + ?Sized>(
    rom: &R,
    id: u16,
    tables: Tables,
    name: &str,
) -> Result<ExtractionResult, ExtractError> {
    let header = ENEMY_HEADER_BANK + u32::from(id);

    let gfx_size = usize::from(rom.read_u16(header + TILE_DATA_SIZE)? & 0x7FFF) / 32;
    let palette_bank = u32::from(rom.read_u8(header + PALETTE_BANK)?);
    let palette = (palette_bank << 16) | u32::from(rom.read_u16(header + PALETTE)?);
    let gfx = rom.read_u24(header + TILE_DATA)?;

    tracing::debug!(
        "Enemy ${:04X}: {} tiles at ${:06X}, palette at ${:06X}",
        id,
        gfx_size,
        gfx,
        palette
    );

    extract_generic(
        rom,
        &GenericParams {
            name: name.to_string(),
            gfx,
            gfx_size,
            gfx_offset: ENEMY_GFX_OFFSET,
            compressed: false,
            palette,
            palette_count: 1,
            palette_offset: 0,
            tables,
            decode: DecodeOptions::default(),
        },
    )
}
