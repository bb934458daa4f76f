//! Structural extraction of sprite data from the ROM
//!
//! Tables are walked from a start address until a sentinel says the data has
//! ended (count too large, bank crossing, pointer outside ROM). References
//! between the tables are resolved in a second pass.

mod enemy;
mod resolve;
mod tables;

pub use enemy::{ENEMY_GFX_OFFSET, ENEMY_HEADER_BANK, extract_enemy};
pub use resolve::{ResolveStats, resolve_references};
pub use tables::{Located, TableStop, extract_ext_spritemaps, extract_hitboxes, extract_spritemaps};

use serde::Deserialize;
use sm_common::gfx::{TILE_BYTES, decode_palette};
use sm_common::rom::{ADDRESS_BANK_SIZE, bank_start};
use sm_common::{ExtractionResult, Project, RomAccessor, RomError};
use sm_lz::{DecodeOptions, LzError};
use thiserror::Error;

/// Where a chain of tables starts, and optionally where it must end
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct TableRange {
    pub start: u32,
    #[serde(default)]
    pub end: Option<u32>,
}

impl TableRange {
    pub fn new(start: u32) -> Self {
        Self { start, end: None }
    }

    pub fn bounded(start: u32, end: u32) -> Self {
        Self {
            start,
            end: Some(end),
        }
    }

    /// Bank of the start address; table pointers are relative to it
    pub fn bank(&self) -> u32 {
        bank_start(self.start)
    }

    /// First address past the start's bank; no table may extend beyond it
    pub fn bank_end(&self) -> u32 {
        self.bank() + ADDRESS_BANK_SIZE
    }
}

/// The three table chains of one sprite set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tables {
    pub spritemaps: TableRange,
    pub hitboxes: Option<TableRange>,
    pub ext_spritemaps: Option<TableRange>,
}

impl Tables {
    pub fn spritemaps_only(spritemaps: TableRange) -> Self {
        Self {
            spritemaps,
            hitboxes: None,
            ext_spritemaps: None,
        }
    }
}

/// Everything needed to extract a sprite set with explicit addresses
#[derive(Debug, Clone)]
pub struct GenericParams {
    pub name: String,
    /// Address of the tile data
    pub gfx: u32,
    /// Number of 8x8 tiles (ignored for compressed graphics)
    pub gfx_size: usize,
    /// Tile number the sheet is loaded at
    pub gfx_offset: u16,
    pub compressed: bool,
    pub palette: u32,
    /// Number of 16-color rows
    pub palette_count: usize,
    pub palette_offset: u8,
    pub tables: Tables,
    pub decode: DecodeOptions,
}

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error(transparent)]
    Rom(#[from] RomError),

    #[error("Failed to decompress graphics at ${address:06X}")]
    Decompress {
        address: u32,
        #[source]
        source: LzError,
    },
}

/// Extract graphics, palette and all tables of a sprite set
///
/// # Errors
/// Fails when a read leaves the ROM or the compressed graphics are corrupt.
/// Table data that merely looks wrong ends the table walk instead.
pub fn extract_generic<R: RomAccessor + ?Sized>(
    rom: &R,
    params: &GenericParams,
) -> Result<ExtractionResult, ExtractError> {
    let gfx = if params.compressed {
        let stream = rom.tail(params.gfx)?;
        let decoded = sm_lz::decompress_with(stream, &params.decode).map_err(|source| {
            ExtractError::Decompress {
                address: params.gfx,
                source,
            }
        })?;
        tracing::debug!(
            "Decompressed ${:06X}: {} -> {} bytes",
            params.gfx,
            decoded.consumed,
            decoded.data.len()
        );
        decoded.data
    } else {
        rom.read_bytes(params.gfx, params.gfx_size * TILE_BYTES)?.to_vec()
    };

    let palette_words = rom.read_words(params.palette, 16 * params.palette_count)?;
    let mut project = Project::new(
        params.name.clone(),
        gfx,
        decode_palette(&palette_words),
        params.gfx_offset,
        params.palette_offset,
    );

    let tables = &params.tables;
    let spritemaps = extract_spritemaps(rom, tables.spritemaps, &params.name)?;
    let mut hitboxes = match tables.hitboxes {
        Some(range) => extract_hitboxes(rom, range, &params.name)?,
        None => Vec::new(),
    };
    let mut ext_spritemaps = match tables.ext_spritemaps {
        Some(range) => extract_ext_spritemaps(rom, range, &params.name)?,
        None => Vec::new(),
    };

    let stats = resolve_references(
        &spritemaps,
        tables.spritemaps,
        &mut hitboxes,
        tables.hitboxes,
        &mut ext_spritemaps,
    );

    project.spritemaps = spritemaps.into_iter().map(|s| s.record).collect();
    project.ext_hitboxes = hitboxes.into_iter().map(|h| h.record).collect();
    project.ext_spritemaps = ext_spritemaps.into_iter().map(|e| e.record).collect();

    tracing::info!(
        "Extracted {}: {} tiles, {} colors, {} spritemaps, {} hitboxes, {} extended spritemaps ({} references resolved, {} unresolved)",
        project.name,
        project.tile_count(),
        project.palette.len(),
        project.spritemaps.len(),
        project.ext_hitboxes.len(),
        project.ext_spritemaps.len(),
        stats.resolved,
        stats.unresolved
    );

    Ok(project)
}
