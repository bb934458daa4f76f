//! Shared types for Super Metroid sprite tooling
//!
//! This crate provides the pieces shared between the extractor and the
//! exporters in `sm-export`:
//!
//! # Modules
//!
//! - [`rom`] - ROM image access with LoROM address translation
//! - [`gfx`] - 4bpp tile codec, palettes, sprite compositor
//! - [`formats`] - Spritemap/hitbox records and the JSON project file

pub mod formats;
pub mod gfx;
pub mod rom;

// Re-export the ROM accessor
pub use rom::{LoRom, RomAccessor, RomError};

// Re-export commonly used format items
pub use formats::{
    BinarySerializable, ExtendedHitbox, ExtendedSpritemap, ExtractionResult, HitboxBox, Project,
    ProjectError, RawLink, Reference, SpriteTileEntry, Spritemap, SpritemapLink,
};
