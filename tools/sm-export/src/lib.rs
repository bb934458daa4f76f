//! sm-export library
//!
//! Extraction of Super Metroid sprite sets (tiles, palettes, spritemaps,
//! hitboxes and extended spritemaps) and their export as project JSON,
//! assembly and PNG.

pub mod address;
pub mod asm;
pub mod export;
pub mod extract;
pub mod indexed_png;
pub mod manifest;
pub mod render;

pub use address::{AddressError, parse_address, parse_range, parse_word};
pub use export::{ExportKind, write_exports};
pub use extract::{
    ExtractError, GenericParams, TableRange, Tables, extract_enemy, extract_generic,
};
pub use manifest::{MANIFEST_FILE, Manifest, build_all};
