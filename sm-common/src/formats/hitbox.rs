//! Extended hitboxes: lists of collision boxes with their AI pointers

use serde::{Deserialize, Serialize};

use super::hex_word;
use super::serialization::{le_words, put_le_words};

/// A single box, six little-endian words on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HitboxBox {
    pub left: i16,
    pub top: i16,
    pub right: i16,
    pub bottom: i16,
    /// Pointer to the enemy-touch routine
    #[serde(with = "hex_word")]
    pub touch: u16,
    /// Pointer to the enemy-shot routine
    #[serde(with = "hex_word")]
    pub shot: u16,
}

impl HitboxBox {
    pub const SIZE: usize = 12;

    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let [left, top, right, bottom, touch, shot] = le_words::<6>(bytes)?;
        Some(Self {
            left: left as i16,
            top: top as i16,
            right: right as i16,
            bottom: bottom as i16,
            touch,
            shot,
        })
    }

    pub fn to_bytes(&self) -> [u8; 12] {
        put_le_words(&[
            self.left as u16,
            self.top as u16,
            self.right as u16,
            self.bottom as u16,
            self.touch,
            self.shot,
        ])
    }

    /// Both routine pointers point into ROM
    ///
    /// A box failing this is the sign that the walk has left the table.
    pub fn has_valid_pointers(&self) -> bool {
        self.touch >= super::ROM_POINTER_MIN && self.shot >= super::ROM_POINTER_MIN
    }
}

/// A named hitbox, optionally linked to the spritemap drawn with it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtendedHitbox {
    pub name: String,
    pub spritemap: Option<String>,
    #[serde(rename = "hitbox")]
    pub boxes: Vec<HitboxBox>,
}
