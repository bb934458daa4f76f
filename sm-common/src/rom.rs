//! ROM image access with LoROM address translation
//!
//! Super Metroid is a LoROM cartridge: each 64 KiB bank of the SNES address
//! space maps its upper half (`$8000-$FFFF`) onto a 32 KiB slice of the ROM
//! file. Consecutive banks are consecutive in the file, so a run of bytes
//! that crosses a bank boundary in SNES space is still contiguous on disk.
//!
//! ```text
//! $A2:88DA  ->  ((0xA2 & 0x7F) << 15) | (0x88DA & 0x7FFF)  =  0x1108DA
//! ```

use std::path::Path;

use thiserror::Error;

/// Size of the optional copier header in front of some dumps (.smc)
pub const COPIER_HEADER_SIZE: usize = 0x200;

/// Bytes of ROM mapped into one LoROM bank
pub const LOROM_BANK_SIZE: usize = 0x8000;

/// Size of one bank of the SNES address space
pub const ADDRESS_BANK_SIZE: u32 = 0x1_0000;

/// Start of the given address's 64 KiB bank
pub fn bank_start(address: u32) -> u32 {
    address & 0xFF_0000
}

/// ROM access errors
#[derive(Debug, Error)]
pub enum RomError {
    #[error("Address ${address:06X} is not mapped to ROM")]
    Unmapped { address: u32 },

    #[error("Read of {len} bytes at offset 0x{offset:X} is past the end of the ROM (0x{size:X} bytes)")]
    OutOfRange {
        offset: usize,
        len: usize,
        size: usize,
    },

    #[error("Read of {len} bytes at ${address:06X} is past the end of the ROM (0x{size:X} bytes)")]
    AddressOutOfRange { address: u32, len: usize, size: usize },

    #[error("Failed to read ROM file: {0}")]
    Io(#[from] std::io::Error),
}

/// Random access reads from a ROM image, by file offset or by SNES address
///
/// Implementors provide the image and the address translation; every read is
/// bounds-checked and fails with [`RomError`] instead of panicking.
pub trait RomAccessor {
    /// The ROM image (without copier header)
    fn image(&self) -> &[u8];

    /// Translate a bank-mapped SNES address to an offset into [`image`](Self::image)
    fn to_offset(&self, address: u32) -> Result<usize, RomError>;

    /// `len` bytes at a file offset
    fn bytes_at(&self, offset: usize, len: usize) -> Result<&[u8], RomError> {
        let image = self.image();
        offset
            .checked_add(len)
            .and_then(|end| image.get(offset..end))
            .ok_or(RomError::OutOfRange {
                offset,
                len,
                size: image.len(),
            })
    }

    fn byte_at(&self, offset: usize) -> Result<u8, RomError> {
        Ok(self.bytes_at(offset, 1)?[0])
    }

    /// Little-endian word at a file offset
    fn word_at(&self, offset: usize) -> Result<u16, RomError> {
        let bytes = self.bytes_at(offset, 2)?;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    /// Little-endian 24-bit value at a file offset
    fn long_at(&self, offset: usize) -> Result<u32, RomError> {
        let bytes = self.bytes_at(offset, 3)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], 0]))
    }

    /// `len` bytes at a SNES address
    fn read_bytes(&self, address: u32, len: usize) -> Result<&[u8], RomError> {
        let offset = self.to_offset(address)?;
        self.bytes_at(offset, len)
            .map_err(|_| RomError::AddressOutOfRange {
                address,
                len,
                size: self.image().len(),
            })
    }

    fn read_u8(&self, address: u32) -> Result<u8, RomError> {
        Ok(self.read_bytes(address, 1)?[0])
    }

    fn read_u16(&self, address: u32) -> Result<u16, RomError> {
        let bytes = self.read_bytes(address, 2)?;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    fn read_u24(&self, address: u32) -> Result<u32, RomError> {
        let bytes = self.read_bytes(address, 3)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], 0]))
    }

    /// `count` consecutive little-endian words at a SNES address
    fn read_words(&self, address: u32, count: usize) -> Result<Vec<u16>, RomError> {
        let bytes = self.read_bytes(address, count * 2)?;
        Ok(bytes
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect())
    }

    /// Everything from a SNES address to the end of the image
    ///
    /// Used for streams of unknown length (compressed data).
    fn tail(&self, address: u32) -> Result<&[u8], RomError> {
        let offset = self.to_offset(address)?;
        let image = self.image();
        image.get(offset..).ok_or(RomError::AddressOutOfRange {
            address,
            len: 1,
            size: image.len(),
        })
    }
}

/// A LoROM-mapped ROM image held in memory
#[derive(Debug, Clone)]
pub struct LoRom {
    data: Vec<u8>,
    had_header: bool,
}

impl LoRom {
    /// Wrap a ROM dump, dropping a copier header if one is present
    ///
    /// A header is assumed when the size is 0x200 bytes past a multiple of
    /// 32 KiB.
    pub fn new(mut data: Vec<u8>) -> Self {
        let had_header = data.len() % LOROM_BANK_SIZE == COPIER_HEADER_SIZE;
        if had_header {
            data.drain(..COPIER_HEADER_SIZE);
        }
        Self { data, had_header }
    }

    /// Load a ROM dump from disk
    pub fn open(path: impl AsRef<Path>) -> Result<Self, RomError> {
        Ok(Self::new(std::fs::read(path)?))
    }

    /// Whether a copier header was stripped on load
    pub fn had_header(&self) -> bool {
        self.had_header
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl RomAccessor for LoRom {
    fn image(&self) -> &[u8] {
        &self.data
    }

    fn to_offset(&self, address: u32) -> Result<usize, RomError> {
        let bank = address >> 16;
        let low = address & 0xFFFF;
        // $7E/$7F are WRAM; the lower half of every bank is RAM/IO/SRAM
        if bank > 0xFF || bank & 0x7E == 0x7E || low < 0x8000 {
            return Err(RomError::Unmapped { address });
        }
        Ok((((bank & 0x7F) << 15) | (low & 0x7FFF)) as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rom_with(offset: usize, bytes: &[u8]) -> LoRom {
        let mut data = vec![0u8; 0x20_0000];
        data[offset..offset + bytes.len()].copy_from_slice(bytes);
        LoRom::new(data)
    }

    #[test]
    fn test_lorom_translation() {
        let rom = rom_with(0, &[]);
        assert_eq!(rom.to_offset(0x80_8000).unwrap(), 0);
        assert_eq!(rom.to_offset(0x00_8000).unwrap(), 0);
        assert_eq!(rom.to_offset(0xA2_88DA).unwrap(), 0x11_08DA);
        assert_eq!(rom.to_offset(0xA0_CEBF).unwrap(), 0x10_4EBF);
        assert_eq!(rom.to_offset(0x81_8000).unwrap(), 0x8000);
    }

    #[test]
    fn test_unmapped_addresses() {
        let rom = rom_with(0, &[]);
        assert!(matches!(
            rom.to_offset(0x7E_8000),
            Err(RomError::Unmapped { address: 0x7E_8000 })
        ));
        assert!(matches!(rom.to_offset(0x80_2100), Err(RomError::Unmapped { .. })));
        assert!(matches!(rom.to_offset(0x0100_8000), Err(RomError::Unmapped { .. })));
    }

    #[test]
    fn test_little_endian_reads() {
        let rom = rom_with(0x11_08DA, &[0x34, 0x12, 0x56]);
        assert_eq!(rom.read_u8(0xA2_88DA).unwrap(), 0x34);
        assert_eq!(rom.read_u16(0xA2_88DA).unwrap(), 0x1234);
        assert_eq!(rom.read_u24(0xA2_88DA).unwrap(), 0x56_1234);
        assert_eq!(rom.word_at(0x11_08DA).unwrap(), 0x1234);
        assert_eq!(rom.long_at(0x11_08DA).unwrap(), 0x56_1234);
    }

    #[test]
    fn test_read_across_bank_boundary() {
        // Last byte of bank $80 and first byte of bank $81 are adjacent
        let rom = rom_with(0x7FFF, &[0xAA, 0xBB]);
        assert_eq!(rom.read_u16(0x80_FFFF).unwrap(), 0xBBAA);
        assert_eq!(rom.read_bytes(0x80_FFFF, 2).unwrap(), &[0xAA, 0xBB]);
    }

    #[test]
    fn test_read_words() {
        let rom = rom_with(0x10, &[0x01, 0x00, 0xFF, 0x7F]);
        assert_eq!(rom.read_words(0x80_8010, 2).unwrap(), vec![0x0001, 0x7FFF]);
    }

    #[test]
    fn test_out_of_range() {
        let rom = LoRom::new(vec![0u8; 0x8000]);
        assert!(matches!(
            rom.read_u16(0x80_FFFF),
            Err(RomError::AddressOutOfRange { address: 0x80_FFFF, len: 2, .. })
        ));
        assert!(matches!(
            rom.read_u8(0x81_8000),
            Err(RomError::AddressOutOfRange { .. })
        ));
        assert!(matches!(
            rom.bytes_at(usize::MAX, 2),
            Err(RomError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_copier_header_stripped() {
        let mut data = vec![0xEEu8; COPIER_HEADER_SIZE];
        data.extend(std::iter::repeat_n(0x11u8, LOROM_BANK_SIZE));
        let rom = LoRom::new(data);
        assert!(rom.had_header());
        assert_eq!(rom.len(), LOROM_BANK_SIZE);
        assert_eq!(rom.read_u8(0x80_8000).unwrap(), 0x11);
    }

    #[test]
    fn test_tail() {
        let rom = rom_with(0x8000, &[1, 2, 3]);
        let tail = rom.tail(0x81_8000).unwrap();
        assert_eq!(&tail[..3], &[1, 2, 3]);
        assert_eq!(tail.len(), 0x20_0000 - 0x8000);
    }

    #[test]
    fn test_bank_start() {
        assert_eq!(bank_start(0xA2_88DA), 0xA2_0000);
    }

    #[test]
    fn test_open_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.sfc");
        std::fs::write(&path, vec![0x42u8; LOROM_BANK_SIZE]).unwrap();

        let rom = LoRom::open(&path).unwrap();
        assert!(!rom.had_header());
        assert_eq!(rom.read_u8(0x80_FFFF).unwrap(), 0x42);

        assert!(matches!(
            LoRom::open(dir.path().join("missing.sfc")),
            Err(RomError::Io(_))
        ));
    }
}
