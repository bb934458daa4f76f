//! Table walking
//!
//! Every table is a little-endian entry count followed by fixed-size
//! entries, and tables of one kind are packed back to back. Nothing marks
//! the end of a chain, so the walk stops at the first table that cannot be
//! real data.

use std::fmt;

use sm_common::formats::{EXT_SPRITEMAP_MAX_ENTRIES, SPRITEMAP_MAX_ENTRIES};
use sm_common::{
    BinarySerializable, ExtendedHitbox, ExtendedSpritemap, HitboxBox, RawLink, RomAccessor,
    RomError, SpriteTileEntry, Spritemap, SpritemapLink,
};

use super::TableRange;

/// Why a table walk ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableStop {
    /// The walk reached the end address of its range
    RangeEnd,
    /// The count is above what the format allows
    TooManyEntries { count: usize, max: usize },
    /// The table would run past the end of the start address's bank
    BankCross { count: usize },
    /// An entry holds a pointer outside ROM
    InvalidPointer { entry: usize },
}

impl fmt::Display for TableStop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableStop::RangeEnd => write!(f, "end of range"),
            TableStop::TooManyEntries { count, max } => {
                write!(f, "count {} exceeds maximum of {}", count, max)
            }
            TableStop::BankCross { count } => {
                write!(f, "{} entries would cross the bank boundary", count)
            }
            TableStop::InvalidPointer { entry } => {
                write!(f, "entry {} points outside ROM", entry)
            }
        }
    }
}

/// A record and the address it was read from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Located<T> {
    pub address: u32,
    pub record: T,
}

struct Walk<T> {
    tables: Vec<Located<Vec<T>>>,
    stop: TableStop,
    stop_address: u32,
}

fn walk<T, R>(
    rom: &R,
    range: TableRange,
    max_entries: Option<usize>,
    is_valid: impl Fn(&T) -> bool,
) -> Result<Walk<T>, RomError>
where
    T: BinarySerializable,
    R: RomAccessor + ?Sized,
{
    let bank_end = range.bank_end() as usize;
    let mut tables = Vec::new();
    let mut address = range.start;

    let stop = loop {
        if range.end.is_some_and(|end| address >= end) {
            break TableStop::RangeEnd;
        }
        // Not even room for the count word
        if address as usize + 2 > bank_end {
            break TableStop::BankCross { count: 0 };
        }

        let count = usize::from(rom.read_u16(address)?);
        if let Some(max) = max_entries.filter(|&max| count > max) {
            break TableStop::TooManyEntries { count, max };
        }

        let len = count * T::SIZE;
        if address as usize + 2 + len > bank_end {
            break TableStop::BankCross { count };
        }

        // An empty table may end exactly at the bank boundary
        let records: Vec<T> = if len == 0 {
            Vec::new()
        } else {
            rom.read_bytes(address + 2, len)?
                .chunks_exact(T::SIZE)
                .filter_map(T::deserialize)
                .collect()
        };

        if let Some(entry) = records.iter().position(|record| !is_valid(record)) {
            break TableStop::InvalidPointer { entry };
        }

        tables.push(Located {
            address,
            record: records,
        });
        address += 2 + len as u32;
    };

    Ok(Walk {
        tables,
        stop,
        stop_address: address,
    })
}

fn log_stop<T>(kind: &str, walk: &Walk<T>) {
    tracing::debug!(
        "{} walk stopped at ${:06X} after {} tables: {}",
        kind,
        walk.stop_address,
        walk.tables.len(),
        walk.stop
    );
}

/// Walk a chain of spritemaps
///
/// Records are named `{name}Spritemap_{index:X}_{address:06X}`.
pub fn extract_spritemaps<R: RomAccessor + ?Sized>(
    rom: &R,
    range: TableRange,
    name: &str,
) -> Result<Vec<Located<Spritemap>>, RomError> {
    let walk = walk::<SpriteTileEntry, _>(rom, range, Some(SPRITEMAP_MAX_ENTRIES), |_| true)?;
    log_stop("Spritemap", &walk);

    Ok(walk
        .tables
        .into_iter()
        .enumerate()
        .map(|(i, table)| Located {
            address: table.address,
            record: Spritemap {
                name: format!("{}Spritemap_{:X}_{:06X}", name, i, table.address),
                entries: table.record,
            },
        })
        .collect())
}

/// Walk a chain of extended hitboxes
///
/// A box whose touch or shot routine lies outside ROM ends the walk.
pub fn extract_hitboxes<R: RomAccessor + ?Sized>(
    rom: &R,
    range: TableRange,
    name: &str,
) -> Result<Vec<Located<ExtendedHitbox>>, RomError> {
    let walk = walk::<HitboxBox, _>(rom, range, None, HitboxBox::has_valid_pointers)?;
    log_stop("Hitbox", &walk);

    Ok(walk
        .tables
        .into_iter()
        .enumerate()
        .map(|(i, table)| Located {
            address: table.address,
            record: ExtendedHitbox {
                name: format!("{}Hitbox_{:X}_{:06X}", name, i, table.address),
                spritemap: None,
                boxes: table.record,
            },
        })
        .collect())
}

/// Walk a chain of extended spritemaps
///
/// Links are left unresolved; see [`resolve_references`](super::resolve_references).
pub fn extract_ext_spritemaps<R: RomAccessor + ?Sized>(
    rom: &R,
    range: TableRange,
    name: &str,
) -> Result<Vec<Located<ExtendedSpritemap>>, RomError> {
    let walk = walk::<RawLink, _>(
        rom,
        range,
        Some(EXT_SPRITEMAP_MAX_ENTRIES),
        RawLink::has_valid_pointers,
    )?;
    log_stop("Extended spritemap", &walk);

    Ok(walk
        .tables
        .into_iter()
        .enumerate()
        .map(|(i, table)| Located {
            address: table.address,
            record: ExtendedSpritemap {
                name: format!("{}ExtSpritemap_{:X}_{:06X}", name, i, table.address),
                links: table.record.into_iter().map(SpritemapLink::from).collect(),
            },
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::test_rom::RomBuilder;
    use sm_common::Reference;

    #[test]
    fn test_spritemap_chain() {
        let mut builder = RomBuilder::new();
        builder
            .word(0xA2_88DA, 2)
            .put(0xA2_88DC, &[0xF8, 0x01, 0xF8, 0x00, 0x20])
            .put(0xA2_88E1, &[0x00, 0x80, 0xF0, 0x02, 0x6E])
            .word(0xA2_88E6, 1)
            .put(0xA2_88E8, &[0x04, 0x00, 0x04, 0x10, 0x00])
            .word(0xA2_88ED, 0x300);
        let rom = builder.build();

        let spritemaps = extract_spritemaps(&rom, TableRange::new(0xA2_88DA), "Boyon").unwrap();
        assert_eq!(spritemaps.len(), 2);
        assert_eq!(spritemaps[0].address, 0xA2_88DA);
        assert_eq!(spritemaps[0].record.name, "BoyonSpritemap_0_A288DA");
        assert_eq!(spritemaps[1].record.name, "BoyonSpritemap_1_A288E6");

        let first = &spritemaps[0].record.entries;
        assert_eq!(first.len(), 2);
        assert_eq!((first[0].x, first[0].y), (-8, -8));
        assert_eq!(first[0].bg_priority, 2);
        assert!(first[1].big);
        assert_eq!(first[1].palette, 7);
        assert!(first[1].h_flip);
    }

    #[test]
    fn test_names_use_hex_index() {
        let mut builder = RomBuilder::new();
        // Twelve empty spritemaps back to back
        for i in 0..12 {
            builder.word(0xA0_8000 + i * 2, 0);
        }
        builder.word(0xA0_8018, 0xFFFF);
        let rom = builder.build();

        let spritemaps = extract_spritemaps(&rom, TableRange::new(0xA0_8000), "E").unwrap();
        assert_eq!(spritemaps.len(), 12);
        assert_eq!(spritemaps[10].record.name, "ESpritemap_A_A08014");
    }

    #[test]
    fn test_count_over_limit_yields_nothing() {
        let mut builder = RomBuilder::new();
        builder.word(0xA0_8000, 200);
        let rom = builder.build();

        let spritemaps = extract_spritemaps(&rom, TableRange::new(0xA0_8000), "X").unwrap();
        assert!(spritemaps.is_empty());
    }

    #[test]
    fn test_count_limits_are_inclusive() {
        let mut builder = RomBuilder::new();
        builder.word(0xA0_8000, 128).word(0xA0_8000 + 2 + 128 * 5, 129);
        let rom = builder.build();
        let spritemaps = extract_spritemaps(&rom, TableRange::new(0xA0_8000), "X").unwrap();
        assert_eq!(spritemaps.len(), 1);
        assert_eq!(spritemaps[0].record.entries.len(), 128);

        let mut builder = RomBuilder::new();
        builder
            .word(0xA0_8000, 255)
            .put(0xA0_8002, &[0x00, 0x00, 0x00, 0x00, 0x00, 0x80, 0x00, 0x80].repeat(255))
            .word(0xA0_8000 + 2 + 255 * 8, 256);
        let rom = builder.build();
        let ext = extract_ext_spritemaps(&rom, TableRange::new(0xA0_8000), "X").unwrap();
        assert_eq!(ext.len(), 1);
        assert_eq!(ext[0].record.links.len(), 255);
    }

    #[test]
    fn test_range_end_stops_walk() {
        let mut builder = RomBuilder::new();
        builder.word(0xA0_8000, 0).word(0xA0_8002, 0).word(0xA0_8004, 0);
        let rom = builder.build();

        let spritemaps =
            extract_spritemaps(&rom, TableRange::bounded(0xA0_8000, 0xA0_8004), "X").unwrap();
        assert_eq!(spritemaps.len(), 2);

        // A range whose end is at the start yields nothing
        let spritemaps =
            extract_spritemaps(&rom, TableRange::bounded(0xA0_8000, 0xA0_8000), "X").unwrap();
        assert!(spritemaps.is_empty());
    }

    #[test]
    fn test_bank_cross_stops_walk() {
        let mut builder = RomBuilder::new();
        // One entry needs 7 bytes, only 6 remain in the bank
        builder.word(0xA0_FFFA, 1);
        let rom = builder.build();

        let spritemaps = extract_spritemaps(&rom, TableRange::new(0xA0_FFFA), "X").unwrap();
        assert!(spritemaps.is_empty());
    }

    #[test]
    fn test_walk_runs_to_bank_end() {
        // A zero-filled bank is an endless chain of empty tables until the
        // count word no longer fits
        let rom = RomBuilder::new().build();
        let spritemaps = extract_spritemaps(&rom, TableRange::new(0xA0_FFF0), "X").unwrap();
        assert_eq!(spritemaps.len(), 8);
        assert_eq!(spritemaps[7].address, 0xA0_FFFE);
    }

    #[test]
    fn test_table_exactly_filling_bank() {
        let mut builder = RomBuilder::new();
        builder.word(0xA0_FFF9, 1);
        let rom = builder.build();
        let spritemaps = extract_spritemaps(&rom, TableRange::new(0xA0_FFF9), "X").unwrap();
        assert_eq!(spritemaps.len(), 1);
    }

    #[test]
    fn test_hitbox_sentinel() {
        let mut builder = RomBuilder::new();
        builder
            .words(0xA0_9000, &[2, 0xFFF0, 0xFFF0, 0, 0, 0x8000, 0x8000])
            .words(0xA0_900E, &[0, 0, 0x10, 0x10, 0x9000, 0x9100])
            // Second table: first box fine, second has shot < $8000
            .words(0xA0_901A, &[2, 0, 0, 1, 1, 0x8000, 0x8000])
            .words(0xA0_9028, &[0, 0, 1, 1, 0x8000, 0x7FFF]);
        let rom = builder.build();

        let hitboxes = extract_hitboxes(&rom, TableRange::new(0xA0_9000), "H").unwrap();
        assert_eq!(hitboxes.len(), 1);
        let record = &hitboxes[0].record;
        assert_eq!(record.name, "HHitbox_0_A09000");
        assert_eq!(record.spritemap, None);
        assert_eq!(record.boxes.len(), 2);
        assert_eq!(record.boxes[0].left, -16);
        assert_eq!(record.boxes[1].shot, 0x9100);
    }

    #[test]
    fn test_hitbox_has_no_count_limit() {
        let mut builder = RomBuilder::new();
        let mut words = vec![300u16];
        for _ in 0..300 {
            words.extend_from_slice(&[0, 0, 1, 1, 0x8000, 0x8000]);
        }
        builder.words(0xA0_8000, &words).word(0xA0_8000 + 2 + 300 * 12, 0xFFFF);
        let rom = builder.build();

        let hitboxes = extract_hitboxes(&rom, TableRange::new(0xA0_8000), "H").unwrap();
        assert_eq!(hitboxes.len(), 1);
        assert_eq!(hitboxes[0].record.boxes.len(), 300);
    }

    #[test]
    fn test_ext_spritemap_links_start_unresolved() {
        let mut builder = RomBuilder::new();
        builder
            .words(0xA0_A000, &[1, 0xFFFE, 2, 0x8800, 0x8900])
            .words(0xA0_A00A, &[1, 0, 0, 0x8800, 0x0010]);
        let rom = builder.build();

        let ext = extract_ext_spritemaps(&rom, TableRange::new(0xA0_A000), "Z").unwrap();
        assert_eq!(ext.len(), 1);
        let link = &ext[0].record.links[0];
        assert_eq!((link.x, link.y), (-2, 2));
        assert_eq!(link.spritemap, Reference::Raw(0x8800));
        assert_eq!(link.hitbox, Reference::Raw(0x8900));
        assert_eq!(ext[0].record.name, "ZExtSpritemap_0_A0A000");
    }

    #[test]
    fn test_read_outside_rom_is_error() {
        let rom = RomBuilder::new().build();
        assert!(extract_spritemaps(&rom, TableRange::new(0x7E_8000), "X").is_err());
    }

    #[test]
    fn test_stop_display() {
        assert_eq!(
            TableStop::TooManyEntries { count: 200, max: 128 }.to_string(),
            "count 200 exceeds maximum of 128"
        );
        assert_eq!(
            TableStop::InvalidPointer { entry: 3 }.to_string(),
            "entry 3 points outside ROM"
        );
    }
}
