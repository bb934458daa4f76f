//! Binary serialization trait for fixed-size ROM records.
//!
//! Spritemap entries, hitbox boxes and extended spritemap links are all
//! stored in the ROM as a 2-byte count followed by `count` records of a fixed
//! size. The table readers are generic over this trait, so one reader handles
//! all three record kinds.
//!
//! # Example
//!
//! ```
//! use sm_common::formats::{BinarySerializable, SpriteTileEntry};
//!
//! let entry = SpriteTileEntry::from_bytes(&[0xF8, 0x01, 0xF0, 0x20, 0x02]).unwrap();
//! assert_eq!(entry.x, -8);
//!
//! // Using the trait (returns Vec<u8>)
//! let bytes = entry.serialize();
//! assert_eq!(SpriteTileEntry::deserialize(&bytes), Some(entry));
//!
//! // Using the type-specific method (returns [u8; 5])
//! let bytes_array = entry.to_bytes();
//! assert_eq!(bytes_array.len(), SpriteTileEntry::SIZE);
//! ```

/// A record with a fixed wire size.
///
/// The trait uses `Vec<u8>` for the return type because associated const
/// generics in return types (`[u8; Self::SIZE]`) are not yet stable in Rust.
/// Each record also has a type-specific `to_bytes()` returning an array.
pub trait BinarySerializable: Sized {
    /// Size of one serialized record in bytes.
    const SIZE: usize;

    /// Serialize to bytes.
    fn serialize(&self) -> Vec<u8>;

    /// Deserialize from bytes.
    ///
    /// Returns `None` if the byte slice is too short.
    fn deserialize(bytes: &[u8]) -> Option<Self>;
}

// Implementation for SpriteTileEntry
impl BinarySerializable for super::SpriteTileEntry {
    const SIZE: usize = Self::SIZE;

    fn serialize(&self) -> Vec<u8> {
        self.to_bytes().to_vec()
    }

    fn deserialize(bytes: &[u8]) -> Option<Self> {
        Self::from_bytes(bytes)
    }
}

// Implementation for HitboxBox
impl BinarySerializable for super::HitboxBox {
    const SIZE: usize = Self::SIZE;

    fn serialize(&self) -> Vec<u8> {
        self.to_bytes().to_vec()
    }

    fn deserialize(bytes: &[u8]) -> Option<Self> {
        Self::from_bytes(bytes)
    }
}

// Implementation for RawLink
impl BinarySerializable for super::RawLink {
    const SIZE: usize = Self::SIZE;

    fn serialize(&self) -> Vec<u8> {
        self.to_bytes().to_vec()
    }

    fn deserialize(bytes: &[u8]) -> Option<Self> {
        Self::from_bytes(bytes)
    }
}

/// Read consecutive little-endian words out of a record
pub(crate) fn le_words<const N: usize>(bytes: &[u8]) -> Option<[u16; N]> {
    let bytes = bytes.get(..N * 2)?;
    let mut words = [0u16; N];
    for (word, pair) in words.iter_mut().zip(bytes.chunks_exact(2)) {
        *word = u16::from_le_bytes([pair[0], pair[1]]);
    }
    Some(words)
}

/// Write words as little-endian bytes into a fixed-size record
pub(crate) fn put_le_words<const B: usize>(words: &[u16]) -> [u8; B] {
    let mut bytes = [0u8; B];
    for (chunk, word) in bytes.chunks_exact_mut(2).zip(words) {
        chunk.copy_from_slice(&word.to_le_bytes());
    }
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::{HitboxBox, RawLink, SpriteTileEntry};

    fn roundtrip<T: BinarySerializable + PartialEq + std::fmt::Debug>(value: T) {
        let bytes = value.serialize();
        assert_eq!(bytes.len(), T::SIZE);
        assert_eq!(T::deserialize(&bytes), Some(value));
    }

    #[test]
    fn test_record_sizes() {
        assert_eq!(<SpriteTileEntry as BinarySerializable>::SIZE, 5);
        assert_eq!(<HitboxBox as BinarySerializable>::SIZE, 12);
        assert_eq!(<RawLink as BinarySerializable>::SIZE, 8);
    }

    #[test]
    fn test_trait_roundtrips() {
        roundtrip(SpriteTileEntry::from_bytes(&[0x10, 0x80, 0xFC, 0x44, 0x6B]).unwrap());
        roundtrip(HitboxBox::from_bytes(&[0xF8, 0xFF, 0xF0, 0xFF, 8, 0, 16, 0, 0x00, 0x80, 0x34, 0x92]).unwrap());
        roundtrip(RawLink::from_bytes(&[0xFC, 0xFF, 0x04, 0x00, 0x00, 0x90, 0x10, 0x91]).unwrap());
    }

    #[test]
    fn test_short_input_rejected() {
        assert!(SpriteTileEntry::deserialize(&[0; 4]).is_none());
        assert!(HitboxBox::deserialize(&[0; 11]).is_none());
        assert!(RawLink::deserialize(&[0; 7]).is_none());
    }

    #[test]
    fn test_le_word_helpers() {
        let words: [u16; 2] = le_words(&[0x34, 0x12, 0xCD, 0xAB, 0xFF]).unwrap();
        assert_eq!(words, [0x1234, 0xABCD]);
        assert_eq!(put_le_words::<4>(&words), [0x34, 0x12, 0xCD, 0xAB]);
        assert!(le_words::<3>(&[0; 5]).is_none());
    }
}
