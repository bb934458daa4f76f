//! Extended spritemaps: spritemap + hitbox pairs placed at an offset

use std::fmt;

use serde::{Deserialize, Serialize};

use super::serialization::{le_words, put_le_words};
use super::{ROM_POINTER_MIN, parse_hex_word};

/// The extractor gives up on tables claiming more links than this
pub const EXT_SPRITEMAP_MAX_ENTRIES: usize = 255;

/// A link target: the name of an extracted record, or the raw bank-relative
/// pointer when nothing extracted lives there
///
/// Serialized as a plain string, `$XXXX` for raw pointers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Reference {
    Name(String),
    Raw(u16),
}

impl Reference {
    pub fn name(&self) -> Option<&str> {
        match self {
            Reference::Name(name) => Some(name),
            Reference::Raw(_) => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Reference::Name(_))
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reference::Name(name) => f.write_str(name),
            Reference::Raw(value) => write!(f, "${:04X}", value),
        }
    }
}

impl From<String> for Reference {
    fn from(text: String) -> Self {
        // Only the canonical `$XXXX` form is a raw pointer; anything else is a label
        let raw = text
            .strip_prefix('$')
            .filter(|digits| digits.len() == 4)
            .and_then(parse_hex_word);
        match raw {
            Some(value) => Reference::Raw(value),
            None => Reference::Name(text),
        }
    }
}

impl From<Reference> for String {
    fn from(reference: Reference) -> Self {
        match reference {
            Reference::Name(name) => name,
            raw @ Reference::Raw(_) => raw.to_string(),
        }
    }
}

/// One link as stored in the ROM: four little-endian words
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RawLink {
    pub x: i16,
    pub y: i16,
    /// Bank-relative pointer to a spritemap
    pub spritemap: u16,
    /// Bank-relative pointer to an extended hitbox
    pub hitbox: u16,
}

impl RawLink {
    pub const SIZE: usize = 8;

    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let [x, y, spritemap, hitbox] = le_words::<4>(bytes)?;
        Some(Self {
            x: x as i16,
            y: y as i16,
            spritemap,
            hitbox,
        })
    }

    pub fn to_bytes(&self) -> [u8; 8] {
        put_le_words(&[self.x as u16, self.y as u16, self.spritemap, self.hitbox])
    }

    pub fn has_valid_pointers(&self) -> bool {
        self.spritemap >= ROM_POINTER_MIN && self.hitbox >= ROM_POINTER_MIN
    }
}

/// A link with its targets resolved where possible
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpritemapLink {
    pub x: i16,
    pub y: i16,
    pub spritemap: Reference,
    pub hitbox: Reference,
}

impl From<RawLink> for SpritemapLink {
    fn from(raw: RawLink) -> Self {
        Self {
            x: raw.x,
            y: raw.y,
            spritemap: Reference::Raw(raw.spritemap),
            hitbox: Reference::Raw(raw.hitbox),
        }
    }
}

/// A named extended spritemap
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtendedSpritemap {
    pub name: String,
    #[serde(rename = "ext_spritemap")]
    pub links: Vec<SpritemapLink>,
}
