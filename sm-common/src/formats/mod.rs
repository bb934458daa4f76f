//! Record types stored in the ROM and the project file that collects them
//!
//! Shared between the extractor (`sm-export extract`), the exporters and any
//! tool that loads a saved project.

mod ext_spritemap;
mod hitbox;
mod project;
mod serialization;
mod spritemap;

pub use ext_spritemap::{
    EXT_SPRITEMAP_MAX_ENTRIES, ExtendedSpritemap, RawLink, Reference, SpritemapLink,
};
pub use hitbox::{ExtendedHitbox, HitboxBox};
pub use project::{ExtractionResult, GAME_TAG, Project, ProjectError};
pub use serialization::BinarySerializable;
pub use spritemap::{SPRITEMAP_MAX_ENTRIES, SpriteTileEntry, Spritemap};

/// Routine and table pointers below this are outside ROM (bank-relative)
pub const ROM_POINTER_MIN: u16 = 0x8000;

/// Parse a 16-bit hex value written as `$XXXX`, `0xXXXX` or bare hex digits
pub fn parse_hex_word(text: &str) -> Option<u16> {
    let digits = text
        .strip_prefix('$')
        .or_else(|| text.strip_prefix("0x"))
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    u16::from_str_radix(digits, 16).ok()
}

/// Serde adapter writing a `u16` as `"$XXXX"`
pub(crate) mod hex_word {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &u16, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&format_args!("${:04X}", value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u16, D::Error> {
        let text = String::deserialize(deserializer)?;
        super::parse_hex_word(&text)
            .ok_or_else(|| D::Error::custom(format!("invalid hex word '{}'", text)))
    }
}
